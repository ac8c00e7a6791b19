// Copyright (c) 2016-2021 Fabian Schuiki

//! The symbols and scopes the binder consumes.
//!
//! Scopes form a tree that is walked bottom-up to resolve names, much like
//! the rib chain used for name resolution elsewhere in the compiler. The
//! scope graph is populated by the declaration passes ahead of binding and is
//! read-only while the binder runs, with one exception: binding a `for` loop
//! synthesizes an implicit block scope holding the loop variable.

use crate::name::Name;
use crate::source::Spanned;
use crate::ty::Type;
use crate::value::ValueData;
use std::cell::RefCell;

/// A named entity declared in a scope.
#[derive(Debug)]
pub struct Symbol<'a> {
    pub name: Spanned<Name>,
    pub kind: SymbolKind<'a>,
}

/// The different kinds of symbols the binder consumes.
#[derive(Debug)]
pub enum SymbolKind<'a> {
    /// A variable declaration.
    Variable { ty: Type<'a> },
    /// A formal argument of a subroutine.
    FormalArgument { ty: Type<'a> },
    /// A parameter, together with its elaborated value if known.
    Parameter {
        ty: Type<'a>,
        value: Option<ValueData<'a>>,
    },
    /// A function or task. Tasks carry a `void` return type.
    Subroutine {
        args: Vec<&'a Symbol<'a>>,
        return_type: Type<'a>,
    },
    /// A package.
    Package,
    /// An implicit or explicit sequential block.
    Block,
    /// The compilation root.
    Root,
}

/// A discriminant for [`SymbolKind`], used to search the scope tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolTag {
    Variable,
    FormalArgument,
    Parameter,
    Subroutine,
    Package,
    Block,
    Root,
}

impl<'a> Symbol<'a> {
    /// Create a new symbol.
    pub fn new(name: Spanned<Name>, kind: SymbolKind<'a>) -> Symbol<'a> {
        Symbol { name, kind }
    }

    /// The discriminant of this symbol's kind.
    pub fn tag(&self) -> SymbolTag {
        match self.kind {
            SymbolKind::Variable { .. } => SymbolTag::Variable,
            SymbolKind::FormalArgument { .. } => SymbolTag::FormalArgument,
            SymbolKind::Parameter { .. } => SymbolTag::Parameter,
            SymbolKind::Subroutine { .. } => SymbolTag::Subroutine,
            SymbolKind::Package => SymbolTag::Package,
            SymbolKind::Block => SymbolTag::Block,
            SymbolKind::Root => SymbolTag::Root,
        }
    }

    /// The type of the value this symbol carries, if it carries one.
    pub fn ty(&self) -> Option<Type<'a>> {
        match self.kind {
            SymbolKind::Variable { ty }
            | SymbolKind::FormalArgument { ty }
            | SymbolKind::Parameter { ty, .. } => Some(ty),
            _ => None,
        }
    }
}

/// The different ways a name may be looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    /// A value reference; matches variables, formal arguments, and
    /// parameters.
    Default,
    /// A call target; matches subroutines.
    Callable,
    /// A type reference. No type symbols flow through the binder yet, so
    /// this never matches.
    Type,
}

/// The outcome of a name lookup.
#[derive(Debug, Clone, Copy)]
pub enum LookupResult<'a> {
    /// The name resolved to exactly one symbol.
    Found(&'a Symbol<'a>),
    /// The name did not resolve.
    NotFound,
    /// The name matched more than one symbol in the same scope.
    Ambiguous,
}

/// One lexical scope.
///
/// Scopes are chained through their parents and walked bottom-up during
/// lookup. Each scope is defined by a symbol, which is how `return` finds its
/// enclosing subroutine and scoped names find packages.
pub struct Scope<'a> {
    parent: Option<&'a Scope<'a>>,
    symbol: &'a Symbol<'a>,
    members: RefCell<Vec<&'a Symbol<'a>>>,
    children: RefCell<Vec<&'a Scope<'a>>>,
}

impl std::fmt::Debug for Scope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Scope({:?} `{}`)", self.symbol.tag(), self.symbol.name)
    }
}

impl<'a> Scope<'a> {
    /// Create a new scope defined by `symbol`. Use
    /// [`Compilation::alloc_scope`](crate::Compilation::alloc_scope) to
    /// allocate it and register it with its parent.
    pub fn new(parent: Option<&'a Scope<'a>>, symbol: &'a Symbol<'a>) -> Scope<'a> {
        Scope {
            parent,
            symbol,
            members: RefCell::new(Vec::new()),
            children: RefCell::new(Vec::new()),
        }
    }

    /// The symbol this scope is defined by.
    pub fn symbol(&self) -> &'a Symbol<'a> {
        self.symbol
    }

    /// The parent scope.
    pub fn parent(&self) -> Option<&'a Scope<'a>> {
        self.parent
    }

    /// Declare a member in this scope. Members keep their declaration order.
    pub fn add_member(&self, symbol: &'a Symbol<'a>) {
        self.members.borrow_mut().push(symbol);
    }

    /// Register a child scope.
    pub fn add_child(&self, child: &'a Scope<'a>) {
        self.children.borrow_mut().push(child);
    }

    /// The members declared in this scope, in declaration order.
    pub fn members(&self) -> Vec<&'a Symbol<'a>> {
        self.members.borrow().clone()
    }

    /// Resolve a name by walking this scope and its ancestors.
    pub fn lookup(&self, name: Name, kind: LookupKind) -> LookupResult<'a> {
        let mut scope = Some(self);
        while let Some(s) = scope {
            let members = s.members.borrow();
            let mut matches = members
                .iter()
                .filter(|m| m.name.value == name && kind_matches(kind, m.tag()));
            match (matches.next(), matches.next()) {
                (Some(&m), None) => return LookupResult::Found(m),
                (Some(_), Some(_)) => return LookupResult::Ambiguous,
                (None, _) => (),
            }
            scope = s.parent;
        }
        LookupResult::NotFound
    }

    /// Find the nearest enclosing symbol of the given kind, including this
    /// scope's own symbol.
    pub fn find_ancestor(&self, tag: SymbolTag) -> Option<&'a Symbol<'a>> {
        if self.symbol.tag() == tag {
            return Some(self.symbol);
        }
        self.parent.and_then(|p| p.find_ancestor(tag))
    }

    /// Find a package by name, starting from the compilation root.
    pub fn find_package(&self, name: Name) -> Option<&'a Scope<'a>> {
        let mut root = self;
        while let Some(p) = root.parent {
            root = p;
        }
        root.children
            .borrow()
            .iter()
            .find(|s| s.symbol.tag() == SymbolTag::Package && s.symbol.name.value == name)
            .cloned()
    }
}

fn kind_matches(kind: LookupKind, tag: SymbolTag) -> bool {
    match kind {
        LookupKind::Default => match tag {
            SymbolTag::Variable | SymbolTag::FormalArgument | SymbolTag::Parameter => true,
            _ => false,
        },
        LookupKind::Callable => tag == SymbolTag::Subroutine,
        LookupKind::Type => false,
    }
}

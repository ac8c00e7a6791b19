// Copyright (c) 2016-2021 Fabian Schuiki

//! The central data structure of the binder.
//!
//! The [`Compilation`] owns the diagnostic sink and the type interner, and
//! hands out references into the [`Arenas`] which own everything allocated
//! during binding. All bound nodes, synthesized syntax, symbols, and scopes
//! live for the lifetime of the arenas.

use crate::ast;
use crate::bound;
use crate::errors::{DiagBuilder, DiagCode, DiagEmitter, Diagnostic, Severity};
use crate::source::Location;
use crate::symbols::{Scope, Symbol};
use crate::ty::{self, Domain, IntegralType, Range, Sign, Type, TypeKind};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use typed_arena::Arena;

/// The arenas that own everything allocated during binding.
pub struct Arenas<'a> {
    types: Arena<TypeKind>,
    ast_exprs: Arena<ast::Expr<'a>>,
    ast_stmts: Arena<ast::Stmt<'a>>,
    exprs: Arena<bound::Expr<'a>>,
    stmts: Arena<bound::Stmt<'a>>,
    symbols: Arena<Symbol<'a>>,
    scopes: Arena<Scope<'a>>,
}

impl<'a> Arenas<'a> {
    /// Create a new set of arenas.
    pub fn new() -> Arenas<'a> {
        Arenas {
            types: Arena::new(),
            ast_exprs: Arena::new(),
            ast_stmts: Arena::new(),
            exprs: Arena::new(),
            stmts: Arena::new(),
            symbols: Arena::new(),
            scopes: Arena::new(),
        }
    }
}

impl Default for Arenas<'_> {
    fn default() -> Self {
        Arenas::new()
    }
}

bitflags! {
    /// A set of verbosity options controlling how much tracing the binder
    /// emits through the `log` crate.
    #[derive(Default)]
    pub struct Verbosity: u8 {
        const TYPES  = 0b001;
        const EXPRS  = 0b010;
        const CONSTS = 0b100;
    }
}

/// A set of options for a binding session.
#[derive(Debug, Default)]
pub struct Options {
    /// The verbosity options.
    pub verbosity: Verbosity,
}

/// The context within which binding takes place.
///
/// Holds the diagnostic sink, the type interner, and a reference to the
/// arenas into which all nodes are allocated.
pub struct Compilation<'a> {
    /// The arena that owns all references.
    pub arena: &'a Arenas<'a>,
    /// The session options.
    pub options: Options,
    /// Whether any error diagnostics were produced.
    pub failed: Cell<bool>,
    interned_types: RefCell<HashSet<Type<'a>>>,
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl<'a> Compilation<'a> {
    /// Create a new compilation with default options.
    pub fn new(arena: &'a Arenas<'a>) -> Compilation<'a> {
        Compilation::with_options(arena, Options::default())
    }

    /// Create a new compilation.
    pub fn with_options(arena: &'a Arenas<'a>, options: Options) -> Compilation<'a> {
        Compilation {
            arena,
            options,
            failed: Cell::new(false),
            interned_types: RefCell::new(HashSet::new()),
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    /// Check whether the given verbosity is enabled.
    pub fn has_verbosity(&self, verb: Verbosity) -> bool {
        self.options.verbosity.contains(verb)
    }

    // ----- Diagnostics ------------------------------------------------------

    /// Start an error diagnostic at the given location. The returned builder
    /// collects ranges and message arguments and emits into this
    /// compilation's sink when dropped.
    pub fn add_error(&self, code: DiagCode, location: Location) -> DiagBuilder<'_> {
        DiagBuilder::new(self, Severity::Error, code, location)
    }

    /// The diagnostics emitted so far, in emission order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Check whether any error diagnostics were emitted.
    pub fn has_errors(&self) -> bool {
        self.failed.get()
    }

    // ----- Types ------------------------------------------------------------

    /// Internalize a type.
    pub fn intern_type(&self, ty: TypeKind) -> Type<'a> {
        if let Some(&x) = self.interned_types.borrow().get(&ty) {
            return x;
        }
        let ty: Type<'a> = self.arena.types.alloc(ty);
        self.interned_types.borrow_mut().insert(ty);
        ty
    }

    /// Get an integral type of the given width. Types of width 1 are
    /// scalars; wider types carry an implicit `[width-1:0]` dimension.
    pub fn get_type(&self, width: usize, sign: Sign, domain: Domain) -> Type<'a> {
        assert!(width >= 1, "integral types have a width of at least 1");
        let dims = if width == 1 {
            vec![]
        } else {
            vec![Range {
                msb: width as isize - 1,
                lsb: 0,
            }]
        };
        self.get_dimensioned_type(width, sign, domain, dims)
    }

    /// Get an integral type with explicit packed dimensions, as written in a
    /// declaration such as `logic [0:7]`.
    pub fn get_dimensioned_type(
        &self,
        width: usize,
        sign: Sign,
        domain: Domain,
        dims: Vec<Range>,
    ) -> Type<'a> {
        self.intern_type(TypeKind::Integral(IntegralType {
            width,
            sign,
            domain,
            dims,
        }))
    }

    /// Get the `int` type.
    pub fn get_int_type(&self) -> Type<'a> {
        self.get_type(32, Sign::Signed, Domain::TwoValued)
    }

    /// Get the `integer` type.
    pub fn get_integer_type(&self) -> Type<'a> {
        self.get_type(32, Sign::Signed, Domain::FourValued)
    }

    /// Get the single-bit `logic` type.
    pub fn get_logic_type(&self) -> Type<'a> {
        self.get_type(1, Sign::Unsigned, Domain::FourValued)
    }

    /// Get the `real` type.
    pub fn get_real_type(&self) -> Type<'a> {
        &ty::REAL_TYPE
    }

    /// Get the `shortreal` type.
    pub fn get_short_real_type(&self) -> Type<'a> {
        &ty::SHORTREAL_TYPE
    }

    /// Get the `void` type.
    pub fn get_void_type(&self) -> Type<'a> {
        &ty::VOID_TYPE
    }

    /// Get the error type.
    pub fn get_error_type(&self) -> Type<'a> {
        &ty::ERROR_TYPE
    }

    // ----- Allocation -------------------------------------------------------

    /// Allocate a syntax expression. Used by the binder to desugar
    /// identifier-select names, and by drivers to build trees.
    pub fn alloc_ast_expr(&self, expr: ast::Expr<'a>) -> &'a ast::Expr<'a> {
        self.arena.ast_exprs.alloc(expr)
    }

    /// Allocate a syntax statement.
    pub fn alloc_ast_stmt(&self, stmt: ast::Stmt<'a>) -> &'a ast::Stmt<'a> {
        self.arena.ast_stmts.alloc(stmt)
    }

    /// Allocate a bound expression.
    pub fn alloc_expr(&self, expr: bound::Expr<'a>) -> &'a bound::Expr<'a> {
        self.arena.exprs.alloc(expr)
    }

    /// Allocate a bound statement.
    pub fn alloc_stmt(&self, stmt: bound::Stmt<'a>) -> &'a bound::Stmt<'a> {
        self.arena.stmts.alloc(stmt)
    }

    /// Allocate a symbol.
    pub fn alloc_symbol(&self, symbol: Symbol<'a>) -> &'a Symbol<'a> {
        self.arena.symbols.alloc(symbol)
    }

    /// Allocate a scope and register it with its parent.
    pub fn alloc_scope(
        &self,
        parent: Option<&'a Scope<'a>>,
        symbol: &'a Symbol<'a>,
    ) -> &'a Scope<'a> {
        let scope: &'a Scope<'a> = self.arena.scopes.alloc(Scope::new(parent, symbol));
        if let Some(parent) = parent {
            parent.add_child(scope);
        }
        scope
    }
}

impl DiagEmitter for Compilation<'_> {
    fn emit(&self, diag: Diagnostic) {
        if diag.severity >= Severity::Error {
            self.failed.set(true);
        }
        debug!("{}", diag);
        self.diagnostics.borrow_mut().push(diag);
    }
}

// Copyright (c) 2016-2021 Fabian Schuiki

//! The bound expression and statement trees.
//!
//! A bound node pairs a syntax node with its resolved type and the payload
//! of its kind. Nodes are allocated in the compilation arenas and referenced
//! by `&'a` handles; children are never copied. The `ty` field is a `Cell`
//! because the second binding pass revisits the tree to apply context-driven
//! widening; once the root's propagation completes, the tree is immutable.

use crate::ast::{self, BinaryGroup, BinaryOp, UnaryOp};
use crate::source::Span;
use crate::symbols::{Symbol, SymbolKind};
use crate::ty::Type;
use crate::value::{Bit, IntVal};
use std::cell::Cell;

/// A bound expression.
#[derive(Debug)]
pub struct Expr<'a> {
    /// The syntax node this expression was bound from.
    pub syntax: &'a ast::Expr<'a>,
    /// The span in the source file where the expression originates from.
    pub span: Span,
    /// The type of the expression. Mutated only by type propagation.
    pub ty: Cell<Type<'a>>,
    /// The expression data.
    pub kind: ExprKind<'a>,
}

/// The different forms a bound expression may take.
#[derive(Debug)]
pub enum ExprKind<'a> {
    /// An integer literal.
    IntLiteral(IntVal),
    /// A real literal.
    RealLiteral(f64),
    /// An unbased unsized literal. Starts out one bit wide and grows under
    /// context propagation.
    UnbasedUnsizedLiteral(Bit),
    /// A reference to a variable or formal argument.
    Var(&'a Symbol<'a>),
    /// A reference to a parameter.
    Param(&'a Symbol<'a>),
    /// A unary operator.
    Unary { op: UnaryOp, arg: &'a Expr<'a> },
    /// A binary operator.
    Binary {
        op: BinaryOp,
        lhs: &'a Expr<'a>,
        rhs: &'a Expr<'a>,
    },
    /// An assignment, plain or compound.
    Assign {
        op: Option<BinaryOp>,
        lhs: &'a Expr<'a>,
        rhs: &'a Expr<'a>,
    },
    /// The ternary conditional.
    Ternary {
        cond: &'a Expr<'a>,
        true_value: &'a Expr<'a>,
        false_value: &'a Expr<'a>,
    },
    /// A concatenation.
    Concat(Vec<&'a Expr<'a>>),
    /// A replication, with the count already evaluated.
    Replicate {
        count: &'a Expr<'a>,
        times: usize,
        value: &'a Expr<'a>,
    },
    /// A bit or range select. For bit selects, `left` and `right` are the
    /// same index expression.
    Select {
        base: &'a Expr<'a>,
        mode: SelectMode,
        left: &'a Expr<'a>,
        right: &'a Expr<'a>,
    },
    /// A subroutine call with positional arguments.
    Call {
        subroutine: &'a Symbol<'a>,
        args: Vec<&'a Expr<'a>>,
    },
    /// A binding error tombstone, wrapping whatever was bound before the
    /// error was discovered.
    Invalid(Vec<&'a Expr<'a>>),
}

/// The selector kind of a bound select expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
    /// `base[i]`
    Bit,
    /// `base[msb:lsb]`
    Range,
    /// `base[base +: width]`
    PlusRange,
    /// `base[base -: width]`
    MinusRange,
}

impl<'a> Expr<'a> {
    /// The type of the expression.
    pub fn ty(&self) -> Type<'a> {
        self.ty.get()
    }

    /// Check whether this expression failed to bind.
    pub fn bad(&self) -> bool {
        self.ty().is_error()
    }

    /// Check whether this expression may appear on the left-hand side of an
    /// assignment. True for variable and formal argument references, and for
    /// selects into such references.
    pub fn is_assignable(&self) -> bool {
        match self.kind {
            ExprKind::Var(sym) => match sym.kind {
                SymbolKind::Variable { .. } | SymbolKind::FormalArgument { .. } => true,
                _ => false,
            },
            ExprKind::Select { base, .. } => base.is_assignable(),
            _ => false,
        }
    }

    /// Re-canonicalize the type of this expression given that its context
    /// requests `ty`, and push the context down into the operands that are
    /// sized by it.
    ///
    /// Leaves adopt the context type outright; this is what lets literals
    /// and references widen at their point of use. Arithmetic operators pass
    /// the context to both operands, shifts only to their left operand, and
    /// the self-determined kinds (reductions, comparisons, concatenations,
    /// selects, calls) stop the descent.
    pub fn propagate_type(&self, ty: Type<'a>) {
        if self.bad() || ty.is_error() {
            return;
        }
        match self.kind {
            ExprKind::IntLiteral(..)
            | ExprKind::RealLiteral(..)
            | ExprKind::UnbasedUnsizedLiteral(..)
            | ExprKind::Var(..)
            | ExprKind::Param(..) => self.ty.set(ty),
            ExprKind::Unary { op, arg } => {
                if !op.is_reduction() {
                    self.ty.set(ty);
                    arg.propagate_type(ty);
                }
            }
            ExprKind::Binary { op, lhs, rhs } => match op.group() {
                BinaryGroup::Arithmetic => {
                    self.ty.set(ty);
                    lhs.propagate_type(ty);
                    rhs.propagate_type(ty);
                }
                // Comparison operands were sized against each other at bind
                // time; the single-bit result does not widen from above.
                BinaryGroup::Comparison | BinaryGroup::Logical => (),
                // The right operand of shifts and power is self-determined.
                BinaryGroup::ShiftOrPower => {
                    self.ty.set(ty);
                    lhs.propagate_type(ty);
                }
            },
            // An assignment's result keeps the type of its left-hand side.
            ExprKind::Assign { .. } => (),
            ExprKind::Ternary {
                true_value,
                false_value,
                ..
            } => {
                self.ty.set(ty);
                true_value.propagate_type(ty);
                false_value.propagate_type(ty);
            }
            ExprKind::Concat(..)
            | ExprKind::Replicate { .. }
            | ExprKind::Select { .. }
            | ExprKind::Call { .. }
            | ExprKind::Invalid(..) => (),
        }
    }
}

/// A bound statement.
#[derive(Debug)]
pub struct Stmt<'a> {
    /// The span in the source file where the statement originates from.
    pub span: Span,
    /// The statement data.
    pub kind: StmtKind<'a>,
}

/// The different forms a bound statement may take.
#[derive(Debug)]
pub enum StmtKind<'a> {
    /// A `return` statement.
    Return { value: Option<&'a Expr<'a>> },
    /// An `if`/`else` statement.
    Conditional {
        cond: &'a Expr<'a>,
        then_stmt: &'a Stmt<'a>,
        else_stmt: Option<&'a Stmt<'a>>,
    },
    /// A `for` loop. The loop variable declaration lives in the statement
    /// list wrapping this node; `init` is its initial value, bound in the
    /// assignment-like context of the variable's type.
    For {
        init: &'a Expr<'a>,
        stop: &'a Expr<'a>,
        steps: Vec<&'a Expr<'a>>,
        body: &'a Stmt<'a>,
    },
    /// An expression evaluated for its side effect.
    Expr(&'a Expr<'a>),
    /// The declaration point of a local variable.
    VariableDecl(&'a Symbol<'a>),
    /// A sequence of statements.
    List(Vec<&'a Stmt<'a>>),
    /// A binding error tombstone.
    Invalid,
}

impl<'a> Stmt<'a> {
    /// Check whether this statement failed to bind.
    pub fn bad(&self) -> bool {
        match self.kind {
            StmtKind::Invalid => true,
            _ => false,
        }
    }
}

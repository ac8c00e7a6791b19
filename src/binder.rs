// Copyright (c) 2016-2021 Fabian Schuiki

//! Binding of expressions and statements.
//!
//! The binder converts syntax trees into typed bound trees. It resolves
//! names against a scope, checks which types each operator admits, computes
//! result types, and evaluates the constants that determine select widths
//! and replication counts. Binding happens in two passes: the first pass
//! types every node from its subexpressions, the second pass revisits the
//! tree and widens operands from their context. Failures are encoded as
//! `Invalid` nodes of error type and never abort the traversal.

use crate::ast::{self, BinaryGroup, BinaryOp, ScopeSep, Selector, TypeSyntax, UnaryOp};
use crate::bound::{Expr, ExprKind, SelectMode, Stmt, StmtKind};
use crate::context::{Compilation, Verbosity};
use crate::errors::DiagCode;
use crate::name::Name;
use crate::source::{Location, Span, Spanned};
use crate::symbols::{LookupKind, LookupResult, Scope, Symbol, SymbolKind, SymbolTag};
use crate::ty::{self, Domain, Range, Sign, Type};
use num::ToPrimitive;
use std::cell::Cell;

/// A binder for expressions and statements.
///
/// Binders are lightweight values parameterized by the scope names resolve
/// in. Scoped names construct a fresh binder rooted at the target package;
/// `for` loops construct one rooted at the implicit block holding the loop
/// variable.
#[derive(Clone, Copy)]
pub struct Binder<'c, 'a> {
    cx: &'c Compilation<'a>,
    scope: &'a Scope<'a>,
}

impl<'c, 'a> Binder<'c, 'a> {
    /// Create a new binder resolving names in `scope`.
    pub fn new(cx: &'c Compilation<'a>, scope: &'a Scope<'a>) -> Binder<'c, 'a> {
        Binder { cx, scope }
    }

    // ----- Entry points -----------------------------------------------------

    /// Bind an expression the caller requires to be constant-evaluable.
    pub fn bind_constant_expr(&self, syntax: &'a ast::Expr<'a>) -> &'a Expr<'a> {
        self.bind_and_propagate(syntax)
    }

    /// Bind an expression whose type is fully determined by its own
    /// subexpressions.
    pub fn bind_self_determined_expr(&self, syntax: &'a ast::Expr<'a>) -> &'a Expr<'a> {
        self.bind_and_propagate(syntax)
    }

    /// Bind an expression that is assigned into a value of type
    /// `assignment_ty`, widening it to match if necessary.
    pub fn bind_assignment_like(
        &self,
        syntax: &'a ast::Expr<'a>,
        location: Location,
        assignment_ty: Type<'a>,
    ) -> &'a Expr<'a> {
        let expr = self.bind_and_propagate(syntax);
        if expr.bad() {
            return expr;
        }

        let ty = expr.ty();
        if !assignment_ty.is_assignment_compatible_from(ty) {
            let code = if assignment_ty.is_cast_compatible_from(ty) {
                DiagCode::NoImplicitConversion
            } else {
                DiagCode::BadAssignment
            };
            self.cx
                .add_error(code, location)
                .arg(ty)
                .arg(assignment_ty)
                .span(syntax.span);
            return self.bad_expr(syntax, vec![expr]);
        }

        if !self.propagate_assignment_like(expr, assignment_ty) {
            expr.propagate_type(expr.ty());
        }
        expr
    }

    // ----- Expressions ------------------------------------------------------

    fn bind_and_propagate(&self, syntax: &'a ast::Expr<'a>) -> &'a Expr<'a> {
        let expr = self.bind_expr(syntax);
        expr.propagate_type(expr.ty());
        if self.cx.has_verbosity(Verbosity::TYPES) {
            debug!("bound expression at {:?} : {}", expr.span, expr.ty());
        }
        expr
    }

    fn bind_expr(&self, syntax: &'a ast::Expr<'a>) -> &'a Expr<'a> {
        trace!("binding expression at {:?}", syntax.span);
        match syntax.kind {
            ast::ExprKind::IntLiteral(..)
            | ast::ExprKind::RealLiteral(..)
            | ast::ExprKind::UnbasedUnsizedLiteral(..) => self.bind_literal(syntax),
            ast::ExprKind::Ident(..)
            | ast::ExprKind::IdentSelect { .. }
            | ast::ExprKind::Scoped { .. } => self.bind_name(syntax),
            ast::ExprKind::Paren(inner) => self.bind_expr(inner),
            ast::ExprKind::Unary { op, op_span, arg } => {
                if op.is_reduction() {
                    self.bind_unary_reduction(syntax, op, op_span, arg)
                } else {
                    self.bind_unary_arithmetic(syntax, op, op_span, arg)
                }
            }
            ast::ExprKind::Binary {
                op,
                op_span,
                lhs,
                rhs,
            } => match op.group() {
                BinaryGroup::Arithmetic => self.bind_arithmetic(syntax, op, op_span, lhs, rhs),
                BinaryGroup::Comparison => self.bind_comparison(syntax, op, op_span, lhs, rhs),
                BinaryGroup::Logical => self.bind_relational(syntax, op, op_span, lhs, rhs),
                BinaryGroup::ShiftOrPower => {
                    self.bind_shift_or_power(syntax, op, op_span, lhs, rhs)
                }
            },
            ast::ExprKind::Assign {
                op,
                op_span,
                lhs,
                rhs,
            } => self.bind_assignment(syntax, op, op_span, lhs, rhs),
            ast::ExprKind::Ternary {
                cond,
                true_expr,
                false_expr,
            } => self.bind_ternary(syntax, cond, true_expr, false_expr),
            ast::ExprKind::Concat(ref exprs) => self.bind_concatenation(syntax, exprs),
            ast::ExprKind::Replicate { count, concat } => {
                self.bind_replication(syntax, count, concat)
            }
            ast::ExprKind::Select { base, selector } => {
                self.bind_select_expr(syntax, base, selector)
            }
            ast::ExprKind::Call { callee, ref args } => self.bind_call(syntax, callee, args),
        }
    }

    fn bind_literal(&self, syntax: &'a ast::Expr<'a>) -> &'a Expr<'a> {
        match syntax.kind {
            ast::ExprKind::IntLiteral(Some(ref value)) => {
                let domain = if value.has_unknown() {
                    Domain::FourValued
                } else {
                    Domain::TwoValued
                };
                let ty = self.cx.get_type(value.width, value.sign, domain);
                self.build(syntax, ty, ExprKind::IntLiteral(value.clone()))
            }
            // The parser recovered from a malformed vector literal.
            ast::ExprKind::IntLiteral(None) => self.bad_expr(syntax, vec![]),
            ast::ExprKind::RealLiteral(value) => self.build(
                syntax,
                self.cx.get_real_type(),
                ExprKind::RealLiteral(value),
            ),
            // Unbased unsized literals default to a size of 1 in an
            // undetermined context, but can grow.
            ast::ExprKind::UnbasedUnsizedLiteral(bit) => {
                let domain = if bit.is_unknown() {
                    Domain::FourValued
                } else {
                    Domain::TwoValued
                };
                let ty = self.cx.get_type(1, Sign::Unsigned, domain);
                self.build(syntax, ty, ExprKind::UnbasedUnsizedLiteral(bit))
            }
            _ => unreachable!("not a literal"),
        }
    }

    // ----- Names ------------------------------------------------------------

    fn bind_name(&self, syntax: &'a ast::Expr<'a>) -> &'a Expr<'a> {
        match syntax.kind {
            ast::ExprKind::Ident(name) => self.bind_simple_name(syntax, name),
            ast::ExprKind::IdentSelect { name, ref selectors } => {
                self.bind_select_name(syntax, name, selectors)
            }
            ast::ExprKind::Scoped {
                lhs,
                separator,
                rhs,
            } => self.bind_scoped_name(syntax, lhs, separator, rhs),
            _ => unreachable!("not a name"),
        }
    }

    fn bind_simple_name(&self, syntax: &'a ast::Expr<'a>, name: Spanned<Name>) -> &'a Expr<'a> {
        let symbol = match self.lookup_name(name, LookupKind::Default) {
            Ok(symbol) => symbol,
            Err(()) => return self.bad_expr(syntax, vec![]),
        };
        match symbol.kind {
            SymbolKind::Variable { ty } | SymbolKind::FormalArgument { ty } => {
                self.build(syntax, ty, ExprKind::Var(symbol))
            }
            SymbolKind::Parameter { ty, .. } => self.build(syntax, ty, ExprKind::Param(symbol)),
            _ => unreachable!("value lookup resolved to {:?}", symbol.tag()),
        }
    }

    fn bind_select_name(
        &self,
        syntax: &'a ast::Expr<'a>,
        name: Spanned<Name>,
        selectors: &[Selector<'a>],
    ) -> &'a Expr<'a> {
        // Spoof this being just a simple element select: desugar the name
        // into a plain identifier and apply the selects one by one, each to
        // the integral result of the previous one.
        let name_syntax = self.cx.alloc_ast_expr(ast::Expr {
            span: name.span,
            kind: ast::ExprKind::Ident(name),
        });
        let mut expr = self.bind_name(name_syntax);
        for &selector in selectors {
            expr = self.bind_select(syntax, expr, selector);
        }
        expr
    }

    fn bind_scoped_name(
        &self,
        syntax: &'a ast::Expr<'a>,
        lhs: &'a ast::Expr<'a>,
        separator: ScopeSep,
        rhs: &'a ast::Expr<'a>,
    ) -> &'a Expr<'a> {
        // Hierarchical names are not supported; only package scoping with a
        // simple name on the left.
        if separator != ScopeSep::DoubleColon {
            return self.bad_expr(syntax, vec![]);
        }
        let name = match lhs.kind {
            ast::ExprKind::Ident(name) => name,
            _ => return self.bad_expr(syntax, vec![]),
        };
        match self.scope.find_package(name.value) {
            Some(package) => Binder::new(self.cx, package).bind_name(rhs),
            None => {
                self.cx
                    .add_error(DiagCode::UndeclaredIdentifier, name.span.begin())
                    .arg(name.value)
                    .span(name.span);
                self.bad_expr(syntax, vec![])
            }
        }
    }

    fn lookup_name(&self, name: Spanned<Name>, kind: LookupKind) -> crate::Result<&'a Symbol<'a>> {
        match self.scope.lookup(name.value, kind) {
            LookupResult::Found(symbol) => Ok(symbol),
            LookupResult::NotFound => {
                self.cx
                    .add_error(DiagCode::UndeclaredIdentifier, name.span.begin())
                    .arg(name.value)
                    .span(name.span);
                Err(())
            }
            LookupResult::Ambiguous => {
                self.cx
                    .add_error(DiagCode::AmbiguousIdentifier, name.span.begin())
                    .arg(name.value)
                    .span(name.span);
                Err(())
            }
        }
    }

    // ----- Operators --------------------------------------------------------

    /// Bind `+`, `-`, or `~`. Supported for both integral and real types;
    /// the result keeps the operand's type.
    fn bind_unary_arithmetic(
        &self,
        syntax: &'a ast::Expr<'a>,
        op: UnaryOp,
        op_span: Span,
        arg: &'a ast::Expr<'a>,
    ) -> &'a Expr<'a> {
        let arg = self.bind_and_propagate(arg);
        if !self.check_unary_applicability(op, op_span.begin(), arg) {
            let inner = self.build(syntax, self.cx.get_error_type(), ExprKind::Unary { op, arg });
            return self.bad_expr(syntax, vec![inner]);
        }
        self.build(syntax, arg.ty(), ExprKind::Unary { op, arg })
    }

    /// Bind a reduction operator or logical not. The result is always a
    /// single bit; supported on integral types.
    fn bind_unary_reduction(
        &self,
        syntax: &'a ast::Expr<'a>,
        op: UnaryOp,
        op_span: Span,
        arg: &'a ast::Expr<'a>,
    ) -> &'a Expr<'a> {
        let arg = self.bind_and_propagate(arg);
        if !self.check_unary_applicability(op, op_span.begin(), arg) {
            let inner = self.build(syntax, self.cx.get_error_type(), ExprKind::Unary { op, arg });
            return self.bad_expr(syntax, vec![inner]);
        }
        self.build(syntax, self.cx.get_logic_type(), ExprKind::Unary { op, arg })
    }

    fn bind_arithmetic(
        &self,
        syntax: &'a ast::Expr<'a>,
        op: BinaryOp,
        op_span: Span,
        lhs: &'a ast::Expr<'a>,
        rhs: &'a ast::Expr<'a>,
    ) -> &'a Expr<'a> {
        let lhs = self.bind_and_propagate(lhs);
        let rhs = self.bind_and_propagate(rhs);
        if !self.check_binary_applicability(op, op_span.begin(), lhs, rhs) {
            return self.bad_binary(syntax, op, lhs, rhs);
        }

        // Division can make a four-state output out of two-state inputs.
        let ty = ty::result_type_of_binary(self.cx, lhs.ty(), rhs.ty(), op == BinaryOp::Div);
        self.build(syntax, ty, ExprKind::Binary { op, lhs, rhs })
    }

    fn bind_comparison(
        &self,
        syntax: &'a ast::Expr<'a>,
        op: BinaryOp,
        op_span: Span,
        lhs: &'a ast::Expr<'a>,
        rhs: &'a ast::Expr<'a>,
    ) -> &'a Expr<'a> {
        let lhs = self.bind_and_propagate(lhs);
        let rhs = self.bind_and_propagate(rhs);
        if !self.check_binary_applicability(op, op_span.begin(), lhs, rhs) {
            return self.bad_binary(syntax, op, lhs, rhs);
        }

        // The result of a comparison is always a single bit.
        self.build(
            syntax,
            self.cx.get_logic_type(),
            ExprKind::Binary { op, lhs, rhs },
        )
    }

    /// Bind `&&`, `||`, `->`, or `<->`. The operands are sized to the larger
    /// of the two and the result is a single bit; propagations from above
    /// have no effect on the subexpressions. This mirrors the assignment
    /// operators, except for the reciprocality.
    fn bind_relational(
        &self,
        syntax: &'a ast::Expr<'a>,
        op: BinaryOp,
        op_span: Span,
        lhs: &'a ast::Expr<'a>,
        rhs: &'a ast::Expr<'a>,
    ) -> &'a Expr<'a> {
        let lhs = self.bind_and_propagate(lhs);
        let rhs = self.bind_and_propagate(rhs);
        if !self.check_binary_applicability(op, op_span.begin(), lhs, rhs) {
            return self.bad_binary(syntax, op, lhs, rhs);
        }

        if !self.propagate_assignment_like(rhs, lhs.ty()) {
            self.propagate_assignment_like(lhs, rhs.ty());
        }
        self.build(
            syntax,
            self.cx.get_logic_type(),
            ExprKind::Binary { op, lhs, rhs },
        )
    }

    /// Bind a shift or power operator. These are handled together because in
    /// both cases the second operand is evaluated in a self-determined
    /// context.
    fn bind_shift_or_power(
        &self,
        syntax: &'a ast::Expr<'a>,
        op: BinaryOp,
        op_span: Span,
        lhs: &'a ast::Expr<'a>,
        rhs: &'a ast::Expr<'a>,
    ) -> &'a Expr<'a> {
        let lhs = self.bind_and_propagate(lhs);
        let rhs = self.bind_and_propagate(rhs);
        if !self.check_binary_applicability(op, op_span.begin(), lhs, rhs) {
            return self.bad_binary(syntax, op, lhs, rhs);
        }

        // The power operator can result in a division by zero 'x.
        let ty = ty::result_type_of_binary(self.cx, lhs.ty(), rhs.ty(), op == BinaryOp::Pow);
        self.build(syntax, ty, ExprKind::Binary { op, lhs, rhs })
    }

    fn bind_assignment(
        &self,
        syntax: &'a ast::Expr<'a>,
        op: Option<BinaryOp>,
        op_span: Span,
        lhs: &'a ast::Expr<'a>,
        rhs: &'a ast::Expr<'a>,
    ) -> &'a Expr<'a> {
        let lhs = self.bind_and_propagate(lhs);
        let rhs = self.bind_and_propagate(rhs);

        // Basic assignment (=) is always applicable, but operators like +=
        // are applicable iff the associated binary operator is applicable.
        let good = match op {
            Some(binop) => self.check_binary_applicability(binop, op_span.begin(), lhs, rhs),
            None => !lhs.bad() && !rhs.bad(),
        };
        if !good {
            let inner = self.build(
                syntax,
                self.cx.get_error_type(),
                ExprKind::Assign { op, lhs, rhs },
            );
            return self.bad_expr(syntax, vec![inner]);
        }

        if !lhs.is_assignable() {
            self.cx
                .add_error(DiagCode::ExpressionNotAssignable, op_span.begin())
                .span(lhs.span);
            let inner = self.build(
                syntax,
                self.cx.get_error_type(),
                ExprKind::Assign { op, lhs, rhs },
            );
            return self.bad_expr(syntax, vec![inner]);
        }

        // The operands of an assignment are themselves self determined, but
        // the RHS grows to the size of the LHS if it is larger, and that
        // information propagates down.
        self.propagate_assignment_like(rhs, lhs.ty());

        // The result type is always the type of the left hand side.
        self.build(syntax, lhs.ty(), ExprKind::Assign { op, lhs, rhs })
    }

    fn bind_ternary(
        &self,
        syntax: &'a ast::Expr<'a>,
        cond: &'a ast::Expr<'a>,
        true_expr: &'a ast::Expr<'a>,
        false_expr: &'a ast::Expr<'a>,
    ) -> &'a Expr<'a> {
        let cond = self.bind_and_propagate(cond);
        let true_value = self.bind_and_propagate(true_expr);
        let false_value = self.bind_and_propagate(false_expr);
        if cond.bad() || true_value.bad() || false_value.bad() {
            return self.bad_expr(syntax, vec![cond, true_value, false_value]);
        }

        // Force a four-state return type for the ambiguous condition case.
        let ty = ty::result_type_of_binary(self.cx, true_value.ty(), false_value.ty(), true);
        self.build(
            syntax,
            ty,
            ExprKind::Ternary {
                cond,
                true_value,
                false_value,
            },
        )
    }

    fn bind_concatenation(
        &self,
        syntax: &'a ast::Expr<'a>,
        exprs: &[&'a ast::Expr<'a>],
    ) -> &'a Expr<'a> {
        let mut values = Vec::with_capacity(exprs.len());
        let mut total_width = 0;
        let mut domain = Domain::TwoValued;
        let mut good = true;
        for expr in exprs {
            let value = self.bind_and_propagate(expr);
            good &= value.ty().is_integral();
            if value.ty().is_four_state() {
                domain = Domain::FourValued;
            }
            total_width += value.ty().width();
            values.push(value);
        }
        if !good {
            return self.bad_expr(syntax, values);
        }
        let ty = self.cx.get_type(total_width, Sign::Unsigned, domain);
        self.build(syntax, ty, ExprKind::Concat(values))
    }

    fn bind_replication(
        &self,
        syntax: &'a ast::Expr<'a>,
        count: &'a ast::Expr<'a>,
        concat: &'a ast::Expr<'a>,
    ) -> &'a Expr<'a> {
        let count = self.bind_and_propagate(count);
        let value = self.bind_and_propagate(concat);
        if count.bad() || value.bad() || !value.ty().is_integral() {
            return self.bad_expr(syntax, vec![count, value]);
        }

        // The replication count must be known to compute the type.
        let times = match self.require_constant_int(count) {
            Ok(times) => times,
            Err(()) => return self.bad_expr(syntax, vec![count, value]),
        };
        let times = match times.to_usize() {
            Some(times) if times > 0 => times,
            _ => return self.bad_expr(syntax, vec![count, value]),
        };

        let domain = value.ty().get_domain().unwrap_or(Domain::TwoValued);
        let ty = self
            .cx
            .get_type(times * value.ty().width(), Sign::Unsigned, domain);
        self.build(
            syntax,
            ty,
            ExprKind::Replicate {
                count,
                times,
                value,
            },
        )
    }

    // ----- Selects ----------------------------------------------------------

    fn bind_select_expr(
        &self,
        syntax: &'a ast::Expr<'a>,
        base: &'a ast::Expr<'a>,
        selector: Option<Selector<'a>>,
    ) -> &'a Expr<'a> {
        let base = self.bind_and_propagate(base);
        match selector {
            Some(selector) => self.bind_select(syntax, base, selector),
            // The parser recovered from a malformed select; it has already
            // complained about it.
            None => self.bad_expr(syntax, vec![base]),
        }
    }

    fn bind_select(
        &self,
        syntax: &'a ast::Expr<'a>,
        expr: &'a Expr<'a>,
        selector: Selector<'a>,
    ) -> &'a Expr<'a> {
        if expr.bad() {
            return self.bad_expr(syntax, vec![expr]);
        }
        let base_ty = expr.ty();
        if !base_ty.is_integral() {
            self.cx
                .add_error(DiagCode::BadSelectExpression, syntax.span.begin())
                .arg(base_ty)
                .span(expr.span);
            return self.bad_expr(syntax, vec![expr]);
        }

        // The declared bound ordering determines whether indices descend,
        // [15:0], or ascend, [0:15]. Types without an explicit dimension
        // count as descending.
        let down = base_ty
            .packed_dims()
            .first()
            .map(|dim| dim.is_down())
            .unwrap_or(true);

        let (mode, left, right, width) = match selector {
            Selector::Bit(index) => {
                let index = self.bind_and_propagate(index);
                if index.bad() {
                    return self.bad_expr(syntax, vec![expr, index]);
                }
                (SelectMode::Bit, index, index, 1)
            }
            Selector::Range(msb, lsb) => {
                let left = self.bind_and_propagate(msb);
                let right = self.bind_and_propagate(lsb);
                if left.bad() || right.bad() {
                    return self.bad_expr(syntax, vec![expr, left, right]);
                }
                let (msb, lsb) =
                    match (self.require_constant_int(left), self.require_constant_int(right)) {
                        (Ok(msb), Ok(lsb)) => (msb, lsb),
                        _ => return self.bad_expr(syntax, vec![expr, left, right]),
                    };
                let width = if down { msb - lsb + 1 } else { lsb - msb + 1 };
                if width <= 0 {
                    self.cx
                        .add_error(DiagCode::BadSelectExpression, syntax.span.begin())
                        .arg(base_ty)
                        .span(syntax.span)
                        .add_note("range direction conflicts with the declaration");
                    return self.bad_expr(syntax, vec![expr, left, right]);
                }
                (SelectMode::Range, left, right, width as usize)
            }
            Selector::PlusRange(base, width) | Selector::MinusRange(base, width) => {
                let mode = match selector {
                    Selector::PlusRange(..) => SelectMode::PlusRange,
                    _ => SelectMode::MinusRange,
                };
                let left = self.bind_and_propagate(base);
                let right = self.bind_and_propagate(width);
                if left.bad() || right.bad() {
                    return self.bad_expr(syntax, vec![expr, left, right]);
                }
                let width = match self.require_constant_int(right) {
                    Ok(width) => width,
                    Err(()) => return self.bad_expr(syntax, vec![expr, left, right]),
                };
                if width <= 0 {
                    self.cx
                        .add_error(DiagCode::BadSelectExpression, syntax.span.begin())
                        .arg(base_ty)
                        .span(syntax.span);
                    return self.bad_expr(syntax, vec![expr, left, right]);
                }
                (mode, left, right, width as usize)
            }
        };

        // Signedness and the value domain carry over from the base.
        let sign = base_ty.get_sign().unwrap_or(Sign::Unsigned);
        let domain = base_ty.get_domain().unwrap_or(Domain::TwoValued);
        let ty = self.cx.get_type(width, sign, domain);
        self.build(
            syntax,
            ty,
            ExprKind::Select {
                base: expr,
                mode,
                left,
                right,
            },
        )
    }

    /// Evaluate a bound expression that is required to be a compile-time
    /// integer, diagnosing failure.
    fn require_constant_int(&self, expr: &'a Expr<'a>) -> crate::Result<i64> {
        let value = expr
            .eval()
            .ok()
            .and_then(|v| v.integer())
            .and_then(|v| v.to_i64());
        match value {
            Some(value) => {
                if self.cx.has_verbosity(Verbosity::CONSTS) {
                    debug!("constant at {:?} evaluates to {}", expr.span, value);
                }
                Ok(value)
            }
            None => {
                self.cx
                    .add_error(DiagCode::ExpressionNotConstant, expr.span.begin())
                    .span(expr.span);
                Err(())
            }
        }
    }

    // ----- Calls ------------------------------------------------------------

    fn bind_call(
        &self,
        syntax: &'a ast::Expr<'a>,
        callee: Spanned<Name>,
        args: &[&'a ast::Expr<'a>],
    ) -> &'a Expr<'a> {
        let symbol = match self.lookup_name(callee, LookupKind::Callable) {
            Ok(symbol) => symbol,
            Err(()) => return self.bad_expr(syntax, vec![]),
        };
        let (formals, return_type) = match symbol.kind {
            SymbolKind::Subroutine {
                ref args,
                return_type,
            } => (args, return_type),
            _ => unreachable!("callable lookup resolved to {:?}", symbol.tag()),
        };

        if args.len() > formals.len() {
            self.cx
                .add_error(DiagCode::TooManyArguments, callee.span.begin())
                .arg(formals.len())
                .arg(args.len())
                .span(syntax.span);
            return self.bad_expr(syntax, vec![]);
        }
        if args.len() < formals.len() {
            self.cx
                .add_error(DiagCode::TooFewArguments, callee.span.begin())
                .arg(formals.len())
                .arg(args.len())
                .span(syntax.span);
            return self.bad_expr(syntax, vec![]);
        }

        // Arguments are matched up positionally and each is bound in the
        // assignment-like context of its formal's type.
        let mut bound_args = Vec::with_capacity(args.len());
        for (arg, formal) in args.iter().zip(formals.iter()) {
            let ty = match formal.ty() {
                Some(ty) => ty,
                None => unreachable!("formal argument {} has no type", formal.name),
            };
            bound_args.push(self.bind_assignment_like(arg, arg.span.begin(), ty));
        }
        if bound_args.iter().any(|a| a.bad()) {
            return self.bad_expr(syntax, bound_args);
        }

        self.build(
            syntax,
            return_type,
            ExprKind::Call {
                subroutine: symbol,
                args: bound_args,
            },
        )
    }

    // ----- Applicability ----------------------------------------------------

    fn check_unary_applicability(
        &self,
        op: UnaryOp,
        location: Location,
        arg: &'a Expr<'a>,
    ) -> bool {
        if arg.bad() {
            return false;
        }
        let ty = arg.ty();
        let good = match op {
            // Supported for both integral and real types.
            UnaryOp::Pos | UnaryOp::Neg | UnaryOp::BitNot => ty.is_integral() || ty.is_real(),
            // The reductions and logical not admit only integral operands.
            _ => ty.is_integral(),
        };
        if good {
            return true;
        }
        self.cx
            .add_error(DiagCode::BadUnaryExpression, location)
            .arg(ty)
            .span(arg.span);
        false
    }

    fn check_binary_applicability(
        &self,
        op: BinaryOp,
        location: Location,
        lhs: &'a Expr<'a>,
        rhs: &'a Expr<'a>,
    ) -> bool {
        if lhs.bad() || rhs.bad() {
            return false;
        }
        let lt = lhs.ty();
        let rt = rhs.ty();
        let good = if op.admits_real() {
            (lt.is_integral() || lt.is_real()) && (rt.is_integral() || rt.is_real())
        } else {
            lt.is_integral() && rt.is_integral()
        };
        if good {
            return true;
        }
        self.cx
            .add_error(DiagCode::BadBinaryExpression, location)
            .arg(lt)
            .arg(rt)
            .span(lhs.span)
            .span(rhs.span);
        false
    }

    // ----- Propagation ------------------------------------------------------

    /// Widen `rhs` to the width of `lhs_ty` if the latter is larger, and
    /// push the new type down into the expression. Returns whether anything
    /// changed.
    ///
    /// Widening preserves the expression's own signedness and value domain;
    /// the data still carries its own value-set character even when it grows
    /// to fit its destination.
    fn propagate_assignment_like(&self, rhs: &'a Expr<'a>, lhs_ty: Type<'a>) -> bool {
        if rhs.bad() || lhs_ty.is_error() {
            return false;
        }
        if lhs_ty.width() > rhs.ty().width() {
            if !lhs_ty.is_real() && !rhs.ty().is_real() {
                let sign = rhs.ty().get_sign().unwrap_or(Sign::Unsigned);
                let domain = rhs.ty().get_domain().unwrap_or(Domain::TwoValued);
                rhs.ty.set(self.cx.get_type(lhs_ty.width(), sign, domain));
            } else if lhs_ty.width() > 32 {
                rhs.ty.set(self.cx.get_real_type());
            } else {
                rhs.ty.set(self.cx.get_short_real_type());
            }
            rhs.propagate_type(rhs.ty());
            true
        } else {
            false
        }
    }

    // ----- Statements -------------------------------------------------------

    /// Bind a statement.
    pub fn bind_stmt(&self, syntax: &'a ast::Stmt<'a>) -> &'a Stmt<'a> {
        trace!("binding statement at {:?}", syntax.span);
        match syntax.kind {
            ast::StmtKind::Return { keyword, value } => {
                self.bind_return_stmt(syntax, keyword, value)
            }
            ast::StmtKind::If {
                cond,
                then_stmt,
                else_stmt,
            } => self.bind_conditional_stmt(syntax, cond, then_stmt, else_stmt),
            ast::StmtKind::For {
                ref init,
                stop,
                ref steps,
                body,
            } => self.bind_for_stmt(syntax, init, stop, steps, body),
            ast::StmtKind::Expr(expr) => self.bind_expr_stmt(syntax, expr),
        }
    }

    /// Bind a list of statements, prefixed by the declarations of the
    /// variables local to the current scope, in declaration order.
    pub fn bind_stmt_list(&self, span: Span, items: &[&'a ast::Stmt<'a>]) -> &'a Stmt<'a> {
        let mut list = Vec::new();
        for member in self.scope.members() {
            if member.tag() == SymbolTag::Variable {
                list.push(self.cx.alloc_stmt(Stmt {
                    span: member.name.span,
                    kind: StmtKind::VariableDecl(member),
                }));
            }
        }
        for item in items {
            list.push(self.bind_stmt(item));
        }
        self.cx.alloc_stmt(Stmt {
            span,
            kind: StmtKind::List(list),
        })
    }

    fn bind_return_stmt(
        &self,
        syntax: &'a ast::Stmt<'a>,
        keyword: Span,
        value: Option<&'a ast::Expr<'a>>,
    ) -> &'a Stmt<'a> {
        let location = keyword.begin();
        let subroutine = match self.scope.find_ancestor(SymbolTag::Subroutine) {
            Some(subroutine) => subroutine,
            None => {
                self.cx
                    .add_error(DiagCode::ReturnNotInSubroutine, location)
                    .span(keyword);
                return self.bad_stmt(syntax);
            }
        };
        let return_type = match subroutine.kind {
            SymbolKind::Subroutine { return_type, .. } => return_type,
            _ => unreachable!(),
        };
        let value = value.map(|value| self.bind_assignment_like(value, location, return_type));
        self.cx.alloc_stmt(Stmt {
            span: syntax.span,
            kind: StmtKind::Return { value },
        })
    }

    fn bind_conditional_stmt(
        &self,
        syntax: &'a ast::Stmt<'a>,
        cond: &'a ast::Expr<'a>,
        then_stmt: &'a ast::Stmt<'a>,
        else_stmt: Option<&'a ast::Stmt<'a>>,
    ) -> &'a Stmt<'a> {
        let cond = self.bind_self_determined_expr(cond);
        let then_stmt = self.bind_stmt(then_stmt);
        let else_stmt = else_stmt.map(|stmt| self.bind_stmt(stmt));
        self.cx.alloc_stmt(Stmt {
            span: syntax.span,
            kind: StmtKind::Conditional {
                cond,
                then_stmt,
                else_stmt,
            },
        })
    }

    /// Bind a `for` loop.
    ///
    /// The initializer declares the loop variable, so an implicit sequential
    /// block is created around the loop and the declaration happens there.
    /// The bound result is the block's statement list, holding the variable
    /// declaration followed by the loop itself.
    fn bind_for_stmt(
        &self,
        syntax: &'a ast::Stmt<'a>,
        init: &ast::ForInit<'a>,
        stop: &'a ast::Expr<'a>,
        steps: &[&'a ast::Expr<'a>],
        body: &'a ast::Stmt<'a>,
    ) -> &'a Stmt<'a> {
        let var_ty = self.map_type(init.ty);
        let loop_var = self
            .cx
            .alloc_symbol(Symbol::new(init.name, SymbolKind::Variable { ty: var_ty }));
        let block = self
            .cx
            .alloc_symbol(Symbol::new(init.name, SymbolKind::Block));
        let block_scope = self.cx.alloc_scope(Some(self.scope), block);
        block_scope.add_member(loop_var);

        let binder = Binder::new(self.cx, block_scope);
        let init_expr =
            binder.bind_assignment_like(init.init, init.name.span.begin(), var_ty);
        let stop = binder.bind_self_determined_expr(stop);
        let steps = steps
            .iter()
            .map(|step| binder.bind_self_determined_expr(step))
            .collect();
        let body = binder.bind_stmt(body);

        let decl = self.cx.alloc_stmt(Stmt {
            span: init.name.span,
            kind: StmtKind::VariableDecl(loop_var),
        });
        let loop_stmt = self.cx.alloc_stmt(Stmt {
            span: syntax.span,
            kind: StmtKind::For {
                init: init_expr,
                stop,
                steps,
                body,
            },
        });
        self.cx.alloc_stmt(Stmt {
            span: syntax.span,
            kind: StmtKind::List(vec![decl, loop_stmt]),
        })
    }

    fn bind_expr_stmt(&self, syntax: &'a ast::Stmt<'a>, expr: &'a ast::Expr<'a>) -> &'a Stmt<'a> {
        let expr = self.bind_self_determined_expr(expr);
        self.cx.alloc_stmt(Stmt {
            span: syntax.span,
            kind: StmtKind::Expr(expr),
        })
    }

    /// Map the type syntax of a loop variable declaration to a type.
    fn map_type(&self, syntax: TypeSyntax) -> Type<'a> {
        match syntax {
            TypeSyntax::Int => self.cx.get_int_type(),
            TypeSyntax::Integer => self.cx.get_integer_type(),
            TypeSyntax::Bit { msb, lsb } => self.map_vector_type(Domain::TwoValued, msb, lsb),
            TypeSyntax::Logic { msb, lsb } => self.map_vector_type(Domain::FourValued, msb, lsb),
        }
    }

    fn map_vector_type(&self, domain: Domain, msb: isize, lsb: isize) -> Type<'a> {
        let range = Range { msb, lsb };
        self.cx
            .get_dimensioned_type(range.size(), Sign::Unsigned, domain, vec![range])
    }

    // ----- Tombstones -------------------------------------------------------

    fn build(
        &self,
        syntax: &'a ast::Expr<'a>,
        ty: Type<'a>,
        kind: ExprKind<'a>,
    ) -> &'a Expr<'a> {
        self.cx.alloc_expr(Expr {
            syntax,
            span: syntax.span,
            ty: Cell::new(ty),
            kind,
        })
    }

    /// Create an error tombstone, wrapping whatever was bound before the
    /// error was discovered.
    fn bad_expr(&self, syntax: &'a ast::Expr<'a>, wrapped: Vec<&'a Expr<'a>>) -> &'a Expr<'a> {
        self.build(syntax, self.cx.get_error_type(), ExprKind::Invalid(wrapped))
    }

    fn bad_binary(
        &self,
        syntax: &'a ast::Expr<'a>,
        op: BinaryOp,
        lhs: &'a Expr<'a>,
        rhs: &'a Expr<'a>,
    ) -> &'a Expr<'a> {
        let inner = self.build(
            syntax,
            self.cx.get_error_type(),
            ExprKind::Binary { op, lhs, rhs },
        );
        self.bad_expr(syntax, vec![inner])
    }

    fn bad_stmt(&self, syntax: &'a ast::Stmt<'a>) -> &'a Stmt<'a> {
        self.cx.alloc_stmt(Stmt {
            span: syntax.span,
            kind: StmtKind::Invalid,
        })
    }
}

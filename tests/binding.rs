// Copyright (c) 2016-2021 Fabian Schuiki

//! End-to-end binding scenarios.
//!
//! These tests drive the public binder surface the way the elaboration
//! passes do: build a scope, hand the binder a syntax tree, and check the
//! types and diagnostics that come out.

use num::BigInt;
use svbind::ast::{self, BinaryOp, ScopeSep, Selector, TypeSyntax, UnaryOp};
use svbind::bound::{ExprKind, SelectMode, StmtKind};
use svbind::errors::DiagCode;
use svbind::name::{get_name_table, Name};
use svbind::source::{Spanned, INVALID_SPAN};
use svbind::symbols::{Scope, Symbol, SymbolKind};
use svbind::ty::{Domain, Range, Sign, Type};
use svbind::value::{make_int, Bit, IntVal};
use svbind::{Arenas, Binder, Compilation};

fn n(name: &str) -> Spanned<Name> {
    Spanned::new(get_name_table().intern(name), INVALID_SPAN)
}

fn root_scope<'a>(cx: &Compilation<'a>) -> &'a Scope<'a> {
    let root = cx.alloc_symbol(Symbol::new(n("$root"), SymbolKind::Root));
    cx.alloc_scope(None, root)
}

fn block_scope<'a>(cx: &Compilation<'a>, parent: &'a Scope<'a>) -> &'a Scope<'a> {
    let sym = cx.alloc_symbol(Symbol::new(n("blk"), SymbolKind::Block));
    cx.alloc_scope(Some(parent), sym)
}

fn add_var<'a>(cx: &Compilation<'a>, scope: &'a Scope<'a>, name: &str, ty: Type<'a>) {
    scope.add_member(cx.alloc_symbol(Symbol::new(n(name), SymbolKind::Variable { ty })));
}

fn logic_ty<'a>(cx: &Compilation<'a>, msb: isize, lsb: isize) -> Type<'a> {
    let range = Range { msb, lsb };
    cx.get_dimensioned_type(range.size(), Sign::Unsigned, Domain::FourValued, vec![range])
}

fn ex<'a>(cx: &Compilation<'a>, kind: ast::ExprKind<'a>) -> &'a ast::Expr<'a> {
    cx.alloc_ast_expr(ast::Expr {
        span: INVALID_SPAN,
        kind,
    })
}

fn ident<'a>(cx: &Compilation<'a>, name: &str) -> &'a ast::Expr<'a> {
    ex(cx, ast::ExprKind::Ident(n(name)))
}

fn dec<'a>(cx: &Compilation<'a>, value: i32) -> &'a ast::Expr<'a> {
    ex(cx, ast::ExprKind::IntLiteral(Some(IntVal::from_i32(value))))
}

fn sized<'a>(cx: &Compilation<'a>, width: usize, value: u64) -> &'a ast::Expr<'a> {
    ex(
        cx,
        ast::ExprKind::IntLiteral(Some(IntVal::from_u64(width, Sign::Unsigned, value))),
    )
}

fn binary<'a>(
    cx: &Compilation<'a>,
    op: BinaryOp,
    lhs: &'a ast::Expr<'a>,
    rhs: &'a ast::Expr<'a>,
) -> &'a ast::Expr<'a> {
    ex(
        cx,
        ast::ExprKind::Binary {
            op,
            op_span: INVALID_SPAN,
            lhs,
            rhs,
        },
    )
}

fn unary<'a>(cx: &Compilation<'a>, op: UnaryOp, arg: &'a ast::Expr<'a>) -> &'a ast::Expr<'a> {
    ex(
        cx,
        ast::ExprKind::Unary {
            op,
            op_span: INVALID_SPAN,
            arg,
        },
    )
}

fn assign<'a>(
    cx: &Compilation<'a>,
    op: Option<BinaryOp>,
    lhs: &'a ast::Expr<'a>,
    rhs: &'a ast::Expr<'a>,
) -> &'a ast::Expr<'a> {
    ex(
        cx,
        ast::ExprKind::Assign {
            op,
            op_span: INVALID_SPAN,
            lhs,
            rhs,
        },
    )
}

fn select<'a>(
    cx: &Compilation<'a>,
    base: &'a ast::Expr<'a>,
    selector: Selector<'a>,
) -> &'a ast::Expr<'a> {
    ex(
        cx,
        ast::ExprKind::Select {
            base,
            selector: Some(selector),
        },
    )
}

fn codes(cx: &Compilation) -> Vec<DiagCode> {
    cx.diagnostics().iter().map(|d| d.code).collect()
}

// ----- Scenarios ------------------------------------------------------------

#[test]
fn binary_addition_widens_to_larger_operand() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    add_var(&cx, scope, "a", logic_ty(&cx, 7, 0));
    add_var(&cx, scope, "b", logic_ty(&cx, 3, 0));

    let expr = Binder::new(&cx, scope)
        .bind_self_determined_expr(binary(&cx, BinaryOp::Add, ident(&cx, "a"), ident(&cx, "b")));
    assert!(!expr.bad());
    assert_eq!(expr.ty().width(), 8);
    assert!(!expr.ty().is_signed());
    assert!(expr.ty().is_four_state());
    assert!(cx.diagnostics().is_empty());

    // The narrower operand was widened to the result width by the second
    // pass.
    match expr.kind {
        ExprKind::Binary { rhs, .. } => assert_eq!(rhs.ty().width(), 8),
        _ => panic!("expected a binary node"),
    }
}

#[test]
fn mixed_int_real_arithmetic() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    add_var(&cx, scope, "x", cx.get_int_type());
    add_var(&cx, scope, "y", cx.get_short_real_type());
    add_var(&cx, scope, "z", cx.get_real_type());

    // int + shortreal stays 32 bits wide and becomes a shortreal.
    let expr = Binder::new(&cx, scope)
        .bind_self_determined_expr(binary(&cx, BinaryOp::Add, ident(&cx, "x"), ident(&cx, "y")));
    assert!(std::ptr::eq(expr.ty(), cx.get_short_real_type()));
    assert_eq!(expr.ty().width(), 32);

    // int + real reaches 64 bits and becomes a real.
    let expr = Binder::new(&cx, scope)
        .bind_self_determined_expr(binary(&cx, BinaryOp::Add, ident(&cx, "x"), ident(&cx, "z")));
    assert!(std::ptr::eq(expr.ty(), cx.get_real_type()));
    assert!(cx.diagnostics().is_empty());
}

#[test]
fn division_forces_four_state() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    add_var(&cx, scope, "a", logic_ty(&cx, 7, 0));

    let expr = Binder::new(&cx, scope)
        .bind_self_determined_expr(binary(&cx, BinaryOp::Div, ident(&cx, "a"), sized(&cx, 3, 2)));
    assert_eq!(expr.ty().width(), 8);
    assert!(!expr.ty().is_signed());
    assert!(expr.ty().is_four_state());
    assert!(cx.diagnostics().is_empty());

    // Same on two-state operands: the division itself introduces x.
    let scope2 = block_scope(&cx, scope);
    add_var(&cx, scope2, "c", cx.get_type(8, Sign::Unsigned, Domain::TwoValued));
    let expr = Binder::new(&cx, scope2)
        .bind_self_determined_expr(binary(&cx, BinaryOp::Div, ident(&cx, "c"), sized(&cx, 3, 2)));
    assert!(expr.ty().is_four_state());
}

#[test]
fn undeclared_identifier_poisons_expression() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);

    let expr = Binder::new(&cx, scope)
        .bind_self_determined_expr(binary(&cx, BinaryOp::Add, ident(&cx, "z"), dec(&cx, 1)));
    assert!(expr.bad());
    assert_eq!(codes(&cx), vec![DiagCode::UndeclaredIdentifier]);
    assert!(cx.diagnostics()[0].message.contains("`z`"));
}

#[test]
fn invalid_operands_do_not_cascade() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    add_var(&cx, scope, "a", logic_ty(&cx, 7, 0));

    // (z + 1) + a: the inner lookup failure is the only diagnostic; the
    // outer addition absorbs the poisoned operand silently.
    let inner = binary(&cx, BinaryOp::Add, ident(&cx, "z"), dec(&cx, 1));
    let outer = binary(&cx, BinaryOp::Add, inner, ident(&cx, "a"));
    let expr = Binder::new(&cx, scope).bind_self_determined_expr(outer);
    assert!(expr.bad());
    assert_eq!(codes(&cx), vec![DiagCode::UndeclaredIdentifier]);
}

#[test]
fn call_with_too_many_arguments() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    let a = cx.alloc_symbol(Symbol::new(
        n("a"),
        SymbolKind::FormalArgument {
            ty: cx.get_int_type(),
        },
    ));
    let b = cx.alloc_symbol(Symbol::new(
        n("b"),
        SymbolKind::FormalArgument {
            ty: cx.get_int_type(),
        },
    ));
    scope.add_member(cx.alloc_symbol(Symbol::new(
        n("f"),
        SymbolKind::Subroutine {
            args: vec![a, b],
            return_type: cx.get_int_type(),
        },
    )));

    let call = ex(
        &cx,
        ast::ExprKind::Call {
            callee: n("f"),
            args: vec![dec(&cx, 1), dec(&cx, 2), dec(&cx, 3)],
        },
    );
    let expr = Binder::new(&cx, scope).bind_self_determined_expr(call);
    assert!(expr.bad());
    assert_eq!(codes(&cx), vec![DiagCode::TooManyArguments]);
    assert!(cx.diagnostics()[0].message.contains("expected 2, found 3"));
}

#[test]
fn call_with_too_few_arguments() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    let a = cx.alloc_symbol(Symbol::new(
        n("a"),
        SymbolKind::FormalArgument {
            ty: cx.get_int_type(),
        },
    ));
    scope.add_member(cx.alloc_symbol(Symbol::new(
        n("f"),
        SymbolKind::Subroutine {
            args: vec![a],
            return_type: cx.get_int_type(),
        },
    )));

    let call = ex(
        &cx,
        ast::ExprKind::Call {
            callee: n("f"),
            args: vec![],
        },
    );
    let expr = Binder::new(&cx, scope).bind_self_determined_expr(call);
    assert!(expr.bad());
    assert_eq!(codes(&cx), vec![DiagCode::TooFewArguments]);
}

#[test]
fn call_arguments_widen_to_formal_types() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    add_var(&cx, scope, "v", logic_ty(&cx, 3, 0));
    let a = cx.alloc_symbol(Symbol::new(
        n("a"),
        SymbolKind::FormalArgument {
            ty: cx.get_int_type(),
        },
    ));
    let f = cx.alloc_symbol(Symbol::new(
        n("f"),
        SymbolKind::Subroutine {
            args: vec![a],
            return_type: cx.get_logic_type(),
        },
    ));
    scope.add_member(f);

    let call = ex(
        &cx,
        ast::ExprKind::Call {
            callee: n("f"),
            args: vec![ident(&cx, "v")],
        },
    );
    let expr = Binder::new(&cx, scope).bind_self_determined_expr(call);
    assert!(!expr.bad());
    assert!(std::ptr::eq(expr.ty(), cx.get_logic_type()));
    match expr.kind {
        ExprKind::Call { ref args, .. } => {
            // The 4 bit argument grew to the 32 bit formal, keeping its own
            // sign and domain.
            assert_eq!(args[0].ty().width(), 32);
            assert!(!args[0].ty().is_signed());
            assert!(args[0].ty().is_four_state());
        }
        _ => panic!("expected a call node"),
    }
}

#[test]
fn range_select_inherits_sign_and_domain() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    add_var(&cx, scope, "v", logic_ty(&cx, 15, 0));

    let expr = Binder::new(&cx, scope).bind_self_determined_expr(select(
        &cx,
        ident(&cx, "v"),
        Selector::Range(dec(&cx, 7), dec(&cx, 0)),
    ));
    assert!(!expr.bad());
    assert_eq!(expr.ty().width(), 8);
    assert!(!expr.ty().is_signed());
    assert!(expr.ty().is_four_state());
    assert!(cx.diagnostics().is_empty());
    match expr.kind {
        ExprKind::Select { mode, .. } => assert_eq!(mode, SelectMode::Range),
        _ => panic!("expected a select node"),
    }
}

#[test]
fn indexed_part_selects_take_width_operand() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    add_var(&cx, scope, "v", logic_ty(&cx, 15, 0));
    add_var(&cx, scope, "i", cx.get_int_type());

    // The base of `[base +: width]` need not be constant, only the width.
    let up = Binder::new(&cx, scope).bind_self_determined_expr(select(
        &cx,
        ident(&cx, "v"),
        Selector::PlusRange(ident(&cx, "i"), dec(&cx, 4)),
    ));
    assert_eq!(up.ty().width(), 4);

    let down = Binder::new(&cx, scope).bind_self_determined_expr(select(
        &cx,
        ident(&cx, "v"),
        Selector::MinusRange(ident(&cx, "i"), dec(&cx, 3)),
    ));
    assert_eq!(down.ty().width(), 3);
    assert!(cx.diagnostics().is_empty());
}

#[test]
fn bit_select_may_use_dynamic_index() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    add_var(&cx, scope, "v", logic_ty(&cx, 15, 0));
    add_var(&cx, scope, "i", cx.get_int_type());

    let expr = Binder::new(&cx, scope).bind_self_determined_expr(select(
        &cx,
        ident(&cx, "v"),
        Selector::Bit(ident(&cx, "i")),
    ));
    assert!(!expr.bad());
    assert_eq!(expr.ty().width(), 1);
    assert!(cx.diagnostics().is_empty());
}

#[test]
fn ascending_declaration_flips_range_order() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    // v: logic [0:15]
    add_var(&cx, scope, "v", logic_ty(&cx, 0, 15));

    let expr = Binder::new(&cx, scope).bind_self_determined_expr(select(
        &cx,
        ident(&cx, "v"),
        Selector::Range(dec(&cx, 2), dec(&cx, 9)),
    ));
    assert!(!expr.bad());
    assert_eq!(expr.ty().width(), 8);

    // A descending range on an ascending declaration is diagnosed.
    let expr = Binder::new(&cx, scope).bind_self_determined_expr(select(
        &cx,
        ident(&cx, "v"),
        Selector::Range(dec(&cx, 9), dec(&cx, 2)),
    ));
    assert!(expr.bad());
    assert_eq!(codes(&cx), vec![DiagCode::BadSelectExpression]);
}

#[test]
fn select_bounds_must_be_constant() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    add_var(&cx, scope, "v", logic_ty(&cx, 15, 0));
    add_var(&cx, scope, "i", cx.get_int_type());

    let expr = Binder::new(&cx, scope).bind_self_determined_expr(select(
        &cx,
        ident(&cx, "v"),
        Selector::Range(ident(&cx, "i"), dec(&cx, 0)),
    ));
    assert!(expr.bad());
    assert_eq!(codes(&cx), vec![DiagCode::ExpressionNotConstant]);
}

#[test]
fn select_bounds_may_use_parameters() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    add_var(&cx, scope, "v", logic_ty(&cx, 15, 0));
    let int = cx.get_int_type();
    scope.add_member(cx.alloc_symbol(Symbol::new(
        n("P"),
        SymbolKind::Parameter {
            ty: int,
            value: Some(make_int(int, BigInt::from(11))),
        },
    )));

    let expr = Binder::new(&cx, scope).bind_self_determined_expr(select(
        &cx,
        ident(&cx, "v"),
        Selector::Range(ident(&cx, "P"), dec(&cx, 4)),
    ));
    assert!(!expr.bad());
    assert_eq!(expr.ty().width(), 8);
    assert!(cx.diagnostics().is_empty());
}

#[test]
fn select_of_non_integral_base() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    add_var(&cx, scope, "r", cx.get_real_type());

    let expr = Binder::new(&cx, scope).bind_self_determined_expr(select(
        &cx,
        ident(&cx, "r"),
        Selector::Bit(dec(&cx, 0)),
    ));
    assert!(expr.bad());
    assert_eq!(codes(&cx), vec![DiagCode::BadSelectExpression]);
}

// ----- Operators ------------------------------------------------------------

#[test]
fn reductions_and_comparisons_are_single_bit() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    add_var(&cx, scope, "a", logic_ty(&cx, 7, 0));
    add_var(&cx, scope, "b", logic_ty(&cx, 3, 0));
    let binder = Binder::new(&cx, scope);
    let logic = cx.get_logic_type();

    let red = binder.bind_self_determined_expr(unary(&cx, UnaryOp::RedAnd, ident(&cx, "a")));
    assert!(std::ptr::eq(red.ty(), logic));

    let not = binder.bind_self_determined_expr(unary(&cx, UnaryOp::LogicNot, ident(&cx, "a")));
    assert!(std::ptr::eq(not.ty(), logic));

    let cmp = binder.bind_self_determined_expr(binary(
        &cx,
        BinaryOp::Lt,
        ident(&cx, "a"),
        ident(&cx, "b"),
    ));
    assert!(std::ptr::eq(cmp.ty(), logic));

    let eq = binder.bind_self_determined_expr(binary(
        &cx,
        BinaryOp::CaseEq,
        ident(&cx, "a"),
        ident(&cx, "b"),
    ));
    assert!(std::ptr::eq(eq.ty(), logic));
    assert!(cx.diagnostics().is_empty());
}

#[test]
fn logical_operators_size_operands_reciprocally() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    add_var(&cx, scope, "a", logic_ty(&cx, 7, 0));
    add_var(&cx, scope, "b", logic_ty(&cx, 3, 0));

    let expr = Binder::new(&cx, scope).bind_self_determined_expr(binary(
        &cx,
        BinaryOp::LogicAnd,
        ident(&cx, "a"),
        ident(&cx, "b"),
    ));
    assert!(std::ptr::eq(expr.ty(), cx.get_logic_type()));
    match expr.kind {
        ExprKind::Binary { lhs, rhs, .. } => {
            assert_eq!(lhs.ty().width(), 8);
            assert_eq!(rhs.ty().width(), 8);
        }
        _ => panic!("expected a binary node"),
    }
}

#[test]
fn shift_rhs_is_self_determined() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    add_var(&cx, scope, "a", logic_ty(&cx, 7, 0));

    let expr = Binder::new(&cx, scope).bind_self_determined_expr(binary(
        &cx,
        BinaryOp::LogicShL,
        ident(&cx, "a"),
        sized(&cx, 3, 2),
    ));
    assert_eq!(expr.ty().width(), 8);
    match expr.kind {
        ExprKind::Binary { rhs, .. } => {
            // The shift amount keeps its own 3 bit type.
            assert_eq!(rhs.ty().width(), 3);
        }
        _ => panic!("expected a binary node"),
    }

    // Power can produce x out of well-defined inputs.
    let expr = Binder::new(&cx, scope).bind_self_determined_expr(binary(
        &cx,
        BinaryOp::Pow,
        ident(&cx, "a"),
        sized(&cx, 3, 2),
    ));
    assert!(expr.ty().is_four_state());
}

#[test]
fn bitwise_operators_reject_real_operands() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    add_var(&cx, scope, "a", logic_ty(&cx, 7, 0));
    add_var(&cx, scope, "r", cx.get_real_type());

    let expr = Binder::new(&cx, scope).bind_self_determined_expr(binary(
        &cx,
        BinaryOp::BitAnd,
        ident(&cx, "a"),
        ident(&cx, "r"),
    ));
    assert!(expr.bad());
    assert_eq!(codes(&cx), vec![DiagCode::BadBinaryExpression]);
    assert!(cx.diagnostics()[0].message.contains("real"));
}

#[test]
fn reduction_of_real_operand_is_diagnosed() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    add_var(&cx, scope, "r", cx.get_real_type());
    let binder = Binder::new(&cx, scope);

    // Unary minus admits reals...
    let neg = binder.bind_self_determined_expr(unary(&cx, UnaryOp::Neg, ident(&cx, "r")));
    assert!(!neg.bad());
    assert!(neg.ty().is_real());

    // ...but the reduction group, including logical not, does not.
    let not = binder.bind_self_determined_expr(unary(&cx, UnaryOp::LogicNot, ident(&cx, "r")));
    assert!(not.bad());
    assert_eq!(codes(&cx), vec![DiagCode::BadUnaryExpression]);
}

#[test]
fn concatenation_sums_widths() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    add_var(&cx, scope, "a", logic_ty(&cx, 7, 0));
    add_var(&cx, scope, "b", cx.get_type(4, Sign::Signed, Domain::TwoValued));

    let expr = Binder::new(&cx, scope).bind_self_determined_expr(ex(
        &cx,
        ast::ExprKind::Concat(vec![ident(&cx, "a"), ident(&cx, "b")]),
    ));
    assert!(!expr.bad());
    assert_eq!(expr.ty().width(), 12);
    assert!(!expr.ty().is_signed());
    // One four-state element makes the whole concatenation four-state.
    assert!(expr.ty().is_four_state());

    // Two-state only when every element is two-state.
    let scope2 = block_scope(&cx, scope);
    add_var(&cx, scope2, "c", cx.get_type(4, Sign::Unsigned, Domain::TwoValued));
    let expr = Binder::new(&cx, scope2).bind_self_determined_expr(ex(
        &cx,
        ast::ExprKind::Concat(vec![ident(&cx, "b"), ident(&cx, "c")]),
    ));
    assert!(!expr.ty().is_four_state());
    assert!(cx.diagnostics().is_empty());
}

#[test]
fn concatenation_of_real_element_is_invalid() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    add_var(&cx, scope, "a", logic_ty(&cx, 7, 0));
    add_var(&cx, scope, "r", cx.get_real_type());

    let expr = Binder::new(&cx, scope).bind_self_determined_expr(ex(
        &cx,
        ast::ExprKind::Concat(vec![ident(&cx, "a"), ident(&cx, "r")]),
    ));
    assert!(expr.bad());
    match expr.kind {
        ExprKind::Invalid(ref wrapped) => assert_eq!(wrapped.len(), 2),
        _ => panic!("expected an invalid node"),
    }
}

#[test]
fn replication_multiplies_width() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    add_var(&cx, scope, "a", logic_ty(&cx, 3, 0));

    let expr = Binder::new(&cx, scope).bind_self_determined_expr(ex(
        &cx,
        ast::ExprKind::Replicate {
            count: dec(&cx, 3),
            concat: ident(&cx, "a"),
        },
    ));
    assert!(!expr.bad());
    assert_eq!(expr.ty().width(), 12);
    assert!(!expr.ty().is_signed());
    match expr.kind {
        ExprKind::Replicate { times, .. } => assert_eq!(times, 3),
        _ => panic!("expected a replication node"),
    }
}

#[test]
fn replication_count_must_be_constant() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    add_var(&cx, scope, "a", logic_ty(&cx, 3, 0));
    add_var(&cx, scope, "i", cx.get_int_type());

    let expr = Binder::new(&cx, scope).bind_self_determined_expr(ex(
        &cx,
        ast::ExprKind::Replicate {
            count: ident(&cx, "i"),
            concat: ident(&cx, "a"),
        },
    ));
    assert!(expr.bad());
    assert_eq!(codes(&cx), vec![DiagCode::ExpressionNotConstant]);
}

#[test]
fn ternary_forces_four_state_result() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    add_var(&cx, scope, "c", cx.get_logic_type());
    add_var(&cx, scope, "t", cx.get_type(8, Sign::Unsigned, Domain::TwoValued));
    add_var(&cx, scope, "f", cx.get_type(4, Sign::Unsigned, Domain::TwoValued));

    let expr = Binder::new(&cx, scope).bind_self_determined_expr(ex(
        &cx,
        ast::ExprKind::Ternary {
            cond: ident(&cx, "c"),
            true_expr: ident(&cx, "t"),
            false_expr: ident(&cx, "f"),
        },
    ));
    assert!(!expr.bad());
    assert_eq!(expr.ty().width(), 8);
    assert!(expr.ty().is_four_state());
    match expr.kind {
        ExprKind::Ternary { false_value, .. } => assert_eq!(false_value.ty().width(), 8),
        _ => panic!("expected a ternary node"),
    }
}

// ----- Assignment-like contexts ---------------------------------------------

#[test]
fn assignment_like_widening_preserves_value_character() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    // b: bit signed [3:0], two-state.
    add_var(&cx, scope, "b", cx.get_type(4, Sign::Signed, Domain::TwoValued));

    let dst = logic_ty(&cx, 15, 0);
    let expr = Binder::new(&cx, scope).bind_assignment_like(
        ident(&cx, "b"),
        INVALID_SPAN.begin(),
        dst,
    );
    assert!(!expr.bad());
    // Widened to the destination width, but keeping its own sign and
    // two-state domain.
    assert_eq!(expr.ty().width(), 16);
    assert!(expr.ty().is_signed());
    assert!(!expr.ty().is_four_state());

    // Widening is idempotent: re-propagating the settled type changes
    // nothing.
    let settled = expr.ty();
    expr.propagate_type(settled);
    assert!(std::ptr::eq(expr.ty(), settled));
}

#[test]
fn unbased_unsized_literal_grows_to_context() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);

    let lit = ex(&cx, ast::ExprKind::UnbasedUnsizedLiteral(Bit::One));
    let expr =
        Binder::new(&cx, scope).bind_assignment_like(lit, INVALID_SPAN.begin(), logic_ty(&cx, 7, 0));
    assert!(!expr.bad());
    assert_eq!(expr.ty().width(), 8);

    // 'x is four-state from the start.
    let lit = ex(&cx, ast::ExprKind::UnbasedUnsizedLiteral(Bit::X));
    let expr = Binder::new(&cx, scope).bind_self_determined_expr(lit);
    assert_eq!(expr.ty().width(), 1);
    assert!(expr.ty().is_four_state());
}

#[test]
fn real_into_integral_requires_cast() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);

    let lit = ex(&cx, ast::ExprKind::RealLiteral(3.14));
    let expr =
        Binder::new(&cx, scope).bind_assignment_like(lit, INVALID_SPAN.begin(), cx.get_int_type());
    assert!(expr.bad());
    assert_eq!(codes(&cx), vec![DiagCode::NoImplicitConversion]);
}

#[test]
fn void_into_integral_is_a_bad_assignment() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    scope.add_member(cx.alloc_symbol(Symbol::new(
        n("t"),
        SymbolKind::Subroutine {
            args: vec![],
            return_type: cx.get_void_type(),
        },
    )));

    let call = ex(
        &cx,
        ast::ExprKind::Call {
            callee: n("t"),
            args: vec![],
        },
    );
    let expr =
        Binder::new(&cx, scope).bind_assignment_like(call, INVALID_SPAN.begin(), cx.get_int_type());
    assert!(expr.bad());
    assert_eq!(codes(&cx), vec![DiagCode::BadAssignment]);
}

#[test]
fn assignment_takes_lhs_type_and_widens_rhs() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    add_var(&cx, scope, "a", logic_ty(&cx, 15, 0));
    add_var(&cx, scope, "b", logic_ty(&cx, 3, 0));

    let expr = Binder::new(&cx, scope).bind_self_determined_expr(assign(
        &cx,
        None,
        ident(&cx, "a"),
        ident(&cx, "b"),
    ));
    assert!(!expr.bad());
    assert_eq!(expr.ty().width(), 16);
    match expr.kind {
        ExprKind::Assign { rhs, .. } => assert_eq!(rhs.ty().width(), 16),
        _ => panic!("expected an assignment node"),
    }

    // Compound assignment follows the underlying operator's rules.
    let expr = Binder::new(&cx, scope).bind_self_determined_expr(assign(
        &cx,
        Some(BinaryOp::Add),
        ident(&cx, "a"),
        ident(&cx, "b"),
    ));
    assert!(!expr.bad());
    assert_eq!(expr.ty().width(), 16);
    assert!(cx.diagnostics().is_empty());
}

#[test]
fn assignment_to_non_lvalue_is_diagnosed() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    add_var(&cx, scope, "a", logic_ty(&cx, 7, 0));

    let lhs = binary(&cx, BinaryOp::Add, ident(&cx, "a"), dec(&cx, 1));
    let expr =
        Binder::new(&cx, scope).bind_self_determined_expr(assign(&cx, None, lhs, dec(&cx, 2)));
    assert!(expr.bad());
    assert_eq!(codes(&cx), vec![DiagCode::ExpressionNotAssignable]);

    // A select of a variable is assignable.
    let lhs = select(&cx, ident(&cx, "a"), Selector::Range(dec(&cx, 3), dec(&cx, 0)));
    let expr =
        Binder::new(&cx, scope).bind_self_determined_expr(assign(&cx, None, lhs, dec(&cx, 2)));
    assert!(!expr.bad());
}

#[test]
fn compound_assignment_checks_operator_applicability() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    add_var(&cx, scope, "a", logic_ty(&cx, 7, 0));
    add_var(&cx, scope, "r", cx.get_real_type());

    // a %= r: modulo admits only integral operands.
    let expr = Binder::new(&cx, scope).bind_self_determined_expr(assign(
        &cx,
        Some(BinaryOp::Mod),
        ident(&cx, "a"),
        ident(&cx, "r"),
    ));
    assert!(expr.bad());
    assert_eq!(codes(&cx), vec![DiagCode::BadBinaryExpression]);
}

// ----- Names ----------------------------------------------------------------

#[test]
fn identifier_select_desugars_to_element_select() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    add_var(&cx, scope, "v", logic_ty(&cx, 15, 0));

    let expr = Binder::new(&cx, scope).bind_self_determined_expr(ex(
        &cx,
        ast::ExprKind::IdentSelect {
            name: n("v"),
            selectors: vec![Selector::Range(dec(&cx, 11), dec(&cx, 4))],
        },
    ));
    assert!(!expr.bad());
    assert_eq!(expr.ty().width(), 8);

    // Chained selectors apply one after another.
    let expr = Binder::new(&cx, scope).bind_self_determined_expr(ex(
        &cx,
        ast::ExprKind::IdentSelect {
            name: n("v"),
            selectors: vec![
                Selector::Range(dec(&cx, 11), dec(&cx, 4)),
                Selector::Range(dec(&cx, 3), dec(&cx, 0)),
            ],
        },
    ));
    assert!(!expr.bad());
    assert_eq!(expr.ty().width(), 4);
    assert!(cx.diagnostics().is_empty());
}

#[test]
fn scoped_names_resolve_in_packages() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let root = root_scope(&cx);
    let pkg = cx.alloc_symbol(Symbol::new(n("pkg"), SymbolKind::Package));
    let pkg_scope = cx.alloc_scope(Some(root), pkg);
    let int = cx.get_int_type();
    pkg_scope.add_member(cx.alloc_symbol(Symbol::new(
        n("P"),
        SymbolKind::Parameter {
            ty: int,
            value: Some(make_int(int, BigInt::from(7))),
        },
    )));
    let module = block_scope(&cx, root);

    let scoped = ex(
        &cx,
        ast::ExprKind::Scoped {
            lhs: ident(&cx, "pkg"),
            separator: ScopeSep::DoubleColon,
            rhs: ident(&cx, "P"),
        },
    );
    let expr = Binder::new(&cx, module).bind_self_determined_expr(scoped);
    assert!(!expr.bad());
    assert!(std::ptr::eq(expr.ty(), int));
    match expr.kind {
        ExprKind::Param(sym) => assert_eq!(sym.name.value, n("P").value),
        _ => panic!("expected a parameter reference"),
    }

    // An unknown package is diagnosed.
    let scoped = ex(
        &cx,
        ast::ExprKind::Scoped {
            lhs: ident(&cx, "nopkg"),
            separator: ScopeSep::DoubleColon,
            rhs: ident(&cx, "P"),
        },
    );
    let expr = Binder::new(&cx, module).bind_self_determined_expr(scoped);
    assert!(expr.bad());
    assert_eq!(codes(&cx), vec![DiagCode::UndeclaredIdentifier]);
}

#[test]
fn parenthesized_expressions_unwrap() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    add_var(&cx, scope, "a", logic_ty(&cx, 7, 0));

    let expr = Binder::new(&cx, scope)
        .bind_self_determined_expr(ex(&cx, ast::ExprKind::Paren(ident(&cx, "a"))));
    assert!(!expr.bad());
    assert_eq!(expr.ty().width(), 8);
    match expr.kind {
        ExprKind::Var(..) => (),
        _ => panic!("expected the inner variable reference"),
    }
}

// ----- Statements -----------------------------------------------------------

fn stmt<'a>(cx: &Compilation<'a>, kind: ast::StmtKind<'a>) -> &'a ast::Stmt<'a> {
    cx.alloc_ast_stmt(ast::Stmt {
        span: INVALID_SPAN,
        kind,
    })
}

#[test]
fn return_outside_subroutine_is_diagnosed() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);

    let ret = stmt(
        &cx,
        ast::StmtKind::Return {
            keyword: INVALID_SPAN,
            value: Some(dec(&cx, 1)),
        },
    );
    let bound = Binder::new(&cx, scope).bind_stmt(ret);
    assert!(bound.bad());
    assert_eq!(codes(&cx), vec![DiagCode::ReturnNotInSubroutine]);
}

#[test]
fn return_value_widens_to_declared_return_type() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let root = root_scope(&cx);
    let func = cx.alloc_symbol(Symbol::new(
        n("f"),
        SymbolKind::Subroutine {
            args: vec![],
            return_type: cx.get_int_type(),
        },
    ));
    let body = cx.alloc_scope(Some(root), func);

    let ret = stmt(
        &cx,
        ast::StmtKind::Return {
            keyword: INVALID_SPAN,
            value: Some(sized(&cx, 8, 4)),
        },
    );
    let bound = Binder::new(&cx, body).bind_stmt(ret);
    assert!(!bound.bad());
    match bound.kind {
        StmtKind::Return { value: Some(value) } => assert_eq!(value.ty().width(), 32),
        _ => panic!("expected a return statement"),
    }
    assert!(cx.diagnostics().is_empty());
}

#[test]
fn conditional_statement_binds_both_arms() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    add_var(&cx, scope, "a", logic_ty(&cx, 7, 0));
    add_var(&cx, scope, "b", logic_ty(&cx, 7, 0));

    let cond = stmt(
        &cx,
        ast::StmtKind::If {
            cond: binary(&cx, BinaryOp::Lt, ident(&cx, "a"), ident(&cx, "b")),
            then_stmt: stmt(
                &cx,
                ast::StmtKind::Expr(assign(&cx, None, ident(&cx, "a"), dec(&cx, 0))),
            ),
            else_stmt: Some(stmt(
                &cx,
                ast::StmtKind::Expr(assign(&cx, None, ident(&cx, "b"), dec(&cx, 0))),
            )),
        },
    );
    let bound = Binder::new(&cx, scope).bind_stmt(cond);
    match bound.kind {
        StmtKind::Conditional {
            cond, else_stmt, ..
        } => {
            assert!(std::ptr::eq(cond.ty(), cx.get_logic_type()));
            assert!(else_stmt.is_some());
        }
        _ => panic!("expected a conditional statement"),
    }
    assert!(cx.diagnostics().is_empty());
}

#[test]
fn statement_lists_declare_locals_first() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let root = root_scope(&cx);
    let scope = block_scope(&cx, root);
    add_var(&cx, scope, "a", logic_ty(&cx, 7, 0));
    add_var(&cx, scope, "b", logic_ty(&cx, 3, 0));

    let items = [stmt(
        &cx,
        ast::StmtKind::Expr(assign(&cx, None, ident(&cx, "a"), ident(&cx, "b"))),
    )];
    let bound = Binder::new(&cx, scope).bind_stmt_list(INVALID_SPAN, &items);
    match bound.kind {
        StmtKind::List(ref stmts) => {
            assert_eq!(stmts.len(), 3);
            match stmts[0].kind {
                StmtKind::VariableDecl(sym) => assert_eq!(sym.name.value, n("a").value),
                _ => panic!("expected a variable declaration"),
            }
            match stmts[1].kind {
                StmtKind::VariableDecl(sym) => assert_eq!(sym.name.value, n("b").value),
                _ => panic!("expected a variable declaration"),
            }
            match stmts[2].kind {
                StmtKind::Expr(..) => (),
                _ => panic!("expected an expression statement"),
            }
        }
        _ => panic!("expected a statement list"),
    }
}

#[test]
fn for_loop_synthesizes_implicit_block() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    add_var(&cx, scope, "acc", cx.get_int_type());

    // for (int i = 0; i < 10; i += 1) acc = i;
    let body = stmt(
        &cx,
        ast::StmtKind::Expr(assign(&cx, None, ident(&cx, "acc"), ident(&cx, "i"))),
    );
    let for_stmt = stmt(
        &cx,
        ast::StmtKind::For {
            init: ast::ForInit {
                name: n("i"),
                ty: TypeSyntax::Int,
                init: dec(&cx, 0),
            },
            stop: binary(&cx, BinaryOp::Lt, ident(&cx, "i"), dec(&cx, 10)),
            steps: vec![assign(&cx, Some(BinaryOp::Add), ident(&cx, "i"), dec(&cx, 1))],
            body,
        },
    );
    let bound = Binder::new(&cx, scope).bind_stmt(for_stmt);
    assert!(cx.diagnostics().is_empty());

    // The loop variable declaration and the loop live in an implicit
    // sequential block.
    match bound.kind {
        StmtKind::List(ref stmts) => {
            assert_eq!(stmts.len(), 2);
            match stmts[0].kind {
                StmtKind::VariableDecl(sym) => {
                    assert_eq!(sym.name.value, n("i").value);
                    assert!(std::ptr::eq(sym.ty().unwrap(), cx.get_int_type()));
                }
                _ => panic!("expected the loop variable declaration"),
            }
            match stmts[1].kind {
                StmtKind::For { stop, .. } => {
                    assert!(std::ptr::eq(stop.ty(), cx.get_logic_type()))
                }
                _ => panic!("expected the loop"),
            }
        }
        _ => panic!("expected an implicit block"),
    }
}

// ----- Constant folding -----------------------------------------------------

#[test]
fn select_bounds_fold_arithmetic() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    add_var(&cx, scope, "v", logic_ty(&cx, 15, 0));

    // v[2*4-1 : 4/2-2]
    let msb = binary(
        &cx,
        BinaryOp::Sub,
        binary(&cx, BinaryOp::Mul, dec(&cx, 2), dec(&cx, 4)),
        dec(&cx, 1),
    );
    let lsb = binary(
        &cx,
        BinaryOp::Sub,
        binary(&cx, BinaryOp::Div, dec(&cx, 4), dec(&cx, 2)),
        dec(&cx, 2),
    );
    let expr = Binder::new(&cx, scope)
        .bind_self_determined_expr(select(&cx, ident(&cx, "v"), Selector::Range(msb, lsb)));
    assert!(!expr.bad());
    assert_eq!(expr.ty().width(), 8);
    assert!(cx.diagnostics().is_empty());
}

#[test]
fn eval_of_bound_expressions() {
    let arena = Arenas::new();
    let cx = Compilation::new(&arena);
    let scope = root_scope(&cx);
    let binder = Binder::new(&cx, scope);

    let expr = binder.bind_constant_expr(binary(
        &cx,
        BinaryOp::LogicShL,
        dec(&cx, 3),
        dec(&cx, 4),
    ));
    assert_eq!(expr.eval().unwrap().integer(), Some(BigInt::from(48)));

    let expr = binder.bind_constant_expr(unary(&cx, UnaryOp::Neg, dec(&cx, 5)));
    assert_eq!(expr.eval().unwrap().integer(), Some(BigInt::from(-5)));

    let expr = binder.bind_constant_expr(ex(
        &cx,
        ast::ExprKind::Ternary {
            cond: binary(&cx, BinaryOp::Gt, dec(&cx, 2), dec(&cx, 1)),
            true_expr: dec(&cx, 10),
            false_expr: dec(&cx, 20),
        },
    ));
    assert_eq!(expr.eval().unwrap().integer(), Some(BigInt::from(10)));

    // An 'x literal has no usable constant value.
    let expr = binder.bind_constant_expr(ex(&cx, ast::ExprKind::UnbasedUnsizedLiteral(Bit::X)));
    assert!(expr.eval().unwrap().get_int().is_none());
}

// Copyright (c) 2016-2021 Fabian Schuiki

//! Representation of constant values and their operations.
//!
//! This module implements the value representation behind the `eval()`
//! facade on bound expressions. The binder itself needs constant values in
//! two places: the bounds of range selects and the count of a replication,
//! both of which are evaluated eagerly at bind time. The folding implemented
//! here covers literals, parameters, and the operators that commonly appear
//! in such positions; anything else reports failure and lets the binder
//! diagnose a non-constant expression.

use crate::ast::{BinaryOp, UnaryOp};
use crate::bound::{Expr, ExprKind};
use crate::symbols::SymbolKind;
use crate::ty::{Sign, Type};
use crate::Result;
use bit_vec::BitVec;
use num::{BigInt, Integer, One, Signed, ToPrimitive, Zero};

/// A single four-valued bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bit {
    Zero,
    One,
    X,
    Z,
}

impl Bit {
    /// Check whether this bit is `x` or `z`.
    pub fn is_unknown(self) -> bool {
        match self {
            Bit::Zero | Bit::One => false,
            Bit::X | Bit::Z => true,
        }
    }
}

/// A lexed integer literal value.
///
/// Carries the value bits together with the masks of special (`x`/`z`) bits,
/// plus the width and sign the literal was written with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntVal {
    /// The number of bits in the literal.
    pub width: usize,
    /// Whether the literal was marked signed.
    pub sign: Sign,
    /// The value bits.
    pub value: BigInt,
    /// The bits which carry `x` or `z`.
    pub special_bits: BitVec,
    /// Which of the special bits are `x`.
    pub x_bits: BitVec,
}

impl IntVal {
    /// Create a new integer literal value without unknown bits.
    pub fn new(width: usize, sign: Sign, value: BigInt) -> IntVal {
        IntVal {
            width,
            sign,
            value,
            special_bits: BitVec::from_elem(width, false),
            x_bits: BitVec::from_elem(width, false),
        }
    }

    /// Create the value of a bare decimal literal such as `42`, which is a
    /// 32 bit signed two-state number.
    pub fn from_i32(value: i32) -> IntVal {
        IntVal::new(32, Sign::Signed, BigInt::from(value))
    }

    /// Create the value of a sized literal such as `8'hff`.
    pub fn from_u64(width: usize, sign: Sign, value: u64) -> IntVal {
        IntVal::new(width, sign, BigInt::from(value))
    }

    /// Check whether any bit of the value is `x` or `z`.
    pub fn has_unknown(&self) -> bool {
        self.special_bits.any()
    }
}

/// The data associated with a constant value.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueData<'a> {
    /// The type of the value.
    pub ty: Type<'a>,
    /// The actual value.
    pub kind: ValueKind,
}

/// The different forms a constant value can assume.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    /// The `void` value.
    Void,
    /// An integer, kept as its canonical unsigned bit pattern. The two bit
    /// vectors indicate the special bits (x or z), and the x bits.
    Int(BigInt, BitVec, BitVec),
    /// A floating-point number.
    Real(f64),
}

impl<'a> ValueData<'a> {
    /// Check if this value evaluates to false.
    pub fn is_false(&self) -> bool {
        match self.kind {
            ValueKind::Void => true,
            ValueKind::Int(ref v, ..) => v.is_zero(),
            ValueKind::Real(v) => v == 0.0,
        }
    }

    /// Check if this value evaluates to true.
    pub fn is_true(&self) -> bool {
        !self.is_false()
    }

    /// Get the raw integer bit pattern, unless any bit is unknown.
    pub fn get_int(&self) -> Option<&BigInt> {
        match self.kind {
            ValueKind::Int(ref v, ref special, _) if !special.any() => Some(v),
            _ => None,
        }
    }

    /// Interpret the value as an integer, honoring the sign of its type.
    pub fn integer(&self) -> Option<BigInt> {
        let raw = self.get_int()?;
        let w = self.ty.width();
        if self.ty.is_signed() && raw.bits() as usize == w && w > 0 {
            Some(raw - (BigInt::one() << w))
        } else {
            Some(raw.clone())
        }
    }

    /// Interpret the value as a float.
    pub fn to_f64(&self) -> Option<f64> {
        match self.kind {
            ValueKind::Real(v) => Some(v),
            ValueKind::Int(..) => self.integer()?.to_f64(),
            ValueKind::Void => None,
        }
    }
}

/// Create a new integer value. Truncates the value to the width of `ty` and
/// canonicalizes it to an unsigned bit pattern.
pub fn make_int(ty: Type, value: BigInt) -> ValueData {
    let w = ty.width();
    make_int_special(
        ty,
        value,
        BitVec::from_elem(w, false),
        BitVec::from_elem(w, false),
    )
}

/// Create a new integer value with special bits.
pub fn make_int_special(
    ty: Type,
    value: BigInt,
    special_bits: BitVec,
    x_bits: BitVec,
) -> ValueData {
    let value = value.mod_floor(&(BigInt::one() << ty.width()));
    ValueData {
        ty,
        kind: ValueKind::Int(value, special_bits, x_bits),
    }
}

/// Create a new real value.
pub fn make_real(ty: Type, value: f64) -> ValueData {
    ValueData {
        ty,
        kind: ValueKind::Real(value),
    }
}

impl<'a> Expr<'a> {
    /// Evaluate the constant value of this expression.
    ///
    /// Returns `Err` if the expression is not constant or contains unknown
    /// bits; callers report the failure through their own diagnostics.
    pub fn eval(&self) -> Result<ValueData<'a>> {
        let ty = self.ty();
        if ty.is_error() {
            return Err(());
        }
        match self.kind {
            ExprKind::IntLiteral(ref lit) => Ok(make_int_special(
                ty,
                lit.value.clone(),
                lit.special_bits.clone(),
                lit.x_bits.clone(),
            )),
            ExprKind::RealLiteral(v) => Ok(make_real(ty, v)),
            ExprKind::UnbasedUnsizedLiteral(bit) => {
                let w = ty.width();
                match bit {
                    Bit::Zero => Ok(make_int(ty, BigInt::zero())),
                    Bit::One => Ok(make_int(ty, (BigInt::one() << w) - 1)),
                    Bit::X => Ok(make_int_special(
                        ty,
                        BigInt::zero(),
                        BitVec::from_elem(w, true),
                        BitVec::from_elem(w, true),
                    )),
                    Bit::Z => Ok(make_int_special(
                        ty,
                        BigInt::zero(),
                        BitVec::from_elem(w, true),
                        BitVec::from_elem(w, false),
                    )),
                }
            }
            ExprKind::Param(sym) => match sym.kind {
                SymbolKind::Parameter {
                    value: Some(ref v), ..
                } => Ok(v.clone()),
                SymbolKind::Parameter { value: None, .. } => Err(()),
                _ => unreachable!("parameter reference to non-parameter symbol"),
            },
            ExprKind::Unary { op, arg } => eval_unary(self, op, arg),
            ExprKind::Binary { op, lhs, rhs } => eval_binary(self, op, lhs, rhs),
            ExprKind::Ternary {
                cond,
                true_value,
                false_value,
            } => {
                let c = cond.eval()?;
                if let ValueKind::Int(_, ref special, _) = c.kind {
                    if special.any() {
                        return Err(());
                    }
                }
                if c.is_true() {
                    true_value.eval()
                } else {
                    false_value.eval()
                }
            }
            ExprKind::Concat(ref values) => {
                let mut acc = BigInt::zero();
                for value in values {
                    let v = value.eval()?;
                    let bits = v.get_int().ok_or(())?;
                    acc = (acc << value.ty().width()) | bits;
                }
                Ok(make_int(ty, acc))
            }
            ExprKind::Replicate { times, value, .. } => {
                let v = value.eval()?;
                let bits = v.get_int().ok_or(())?;
                let w = value.ty().width();
                let mut acc = BigInt::zero();
                for _ in 0..times {
                    acc = (acc << w) | bits;
                }
                Ok(make_int(ty, acc))
            }
            ExprKind::Var(..)
            | ExprKind::Assign { .. }
            | ExprKind::Select { .. }
            | ExprKind::Call { .. }
            | ExprKind::Invalid(..) => Err(()),
        }
    }
}

fn eval_unary<'a>(expr: &Expr<'a>, op: UnaryOp, arg: &Expr<'a>) -> Result<ValueData<'a>> {
    let ty = expr.ty();
    let v = arg.eval()?;
    if v.ty.is_real() {
        let x = v.to_f64().ok_or(())?;
        return match op {
            UnaryOp::Pos => Ok(make_real(ty, x)),
            UnaryOp::Neg => Ok(make_real(ty, -x)),
            _ => Err(()),
        };
    }
    let raw = v.get_int().ok_or(())?.clone();
    let w = v.ty.width();
    let mask = (BigInt::one() << w) - 1;
    match op {
        UnaryOp::Pos => Ok(make_int(ty, raw)),
        UnaryOp::Neg => Ok(make_int(ty, -raw)),
        UnaryOp::BitNot => Ok(make_int(ty, raw ^ mask)),
        UnaryOp::LogicNot => Ok(make_int(ty, bool_to_int(raw.is_zero()))),
        UnaryOp::RedAnd => Ok(make_int(ty, bool_to_int(raw == mask))),
        UnaryOp::RedNand => Ok(make_int(ty, bool_to_int(raw != mask))),
        UnaryOp::RedOr => Ok(make_int(ty, bool_to_int(!raw.is_zero()))),
        UnaryOp::RedNor => Ok(make_int(ty, bool_to_int(raw.is_zero()))),
        UnaryOp::RedXor => Ok(make_int(ty, bool_to_int(parity(&raw)))),
        UnaryOp::RedXnor => Ok(make_int(ty, bool_to_int(!parity(&raw)))),
    }
}

fn eval_binary<'a>(
    expr: &Expr<'a>,
    op: BinaryOp,
    lhs: &Expr<'a>,
    rhs: &Expr<'a>,
) -> Result<ValueData<'a>> {
    let ty = expr.ty();
    let lv = lhs.eval()?;
    let rv = rhs.eval()?;

    // Fold in the real domain if either operand is real.
    if lv.ty.is_real() || rv.ty.is_real() {
        let a = lv.to_f64().ok_or(())?;
        let b = rv.to_f64().ok_or(())?;
        return match op {
            BinaryOp::Add => Ok(make_real(ty, a + b)),
            BinaryOp::Sub => Ok(make_real(ty, a - b)),
            BinaryOp::Mul => Ok(make_real(ty, a * b)),
            BinaryOp::Div => Ok(make_real(ty, a / b)),
            BinaryOp::Pow => Ok(make_real(ty, a.powf(b))),
            BinaryOp::Eq => Ok(make_int(ty, bool_to_int(a == b))),
            BinaryOp::Neq => Ok(make_int(ty, bool_to_int(a != b))),
            BinaryOp::Lt => Ok(make_int(ty, bool_to_int(a < b))),
            BinaryOp::Leq => Ok(make_int(ty, bool_to_int(a <= b))),
            BinaryOp::Gt => Ok(make_int(ty, bool_to_int(a > b))),
            BinaryOp::Geq => Ok(make_int(ty, bool_to_int(a >= b))),
            _ => Err(()),
        };
    }

    let la_raw = lv.get_int().ok_or(())?.clone();
    let ra_raw = rv.get_int().ok_or(())?.clone();
    let a = lv.integer().ok_or(())?;
    let b = rv.integer().ok_or(())?;
    let mask = (BigInt::one() << lv.ty.width().max(rv.ty.width())) - 1;
    match op {
        BinaryOp::Add => Ok(make_int(ty, a + b)),
        BinaryOp::Sub => Ok(make_int(ty, a - b)),
        BinaryOp::Mul => Ok(make_int(ty, a * b)),
        BinaryOp::Div => {
            if b.is_zero() {
                return Err(());
            }
            Ok(make_int(ty, a / b))
        }
        BinaryOp::Mod => {
            if b.is_zero() {
                return Err(());
            }
            Ok(make_int(ty, a % b))
        }
        BinaryOp::Pow => eval_pow(ty, a, b),
        BinaryOp::BitAnd => Ok(make_int(ty, la_raw & ra_raw)),
        BinaryOp::BitOr => Ok(make_int(ty, la_raw | ra_raw)),
        BinaryOp::BitXor => Ok(make_int(ty, la_raw ^ ra_raw)),
        BinaryOp::BitXnor => Ok(make_int(ty, (la_raw ^ ra_raw) ^ mask)),
        BinaryOp::LogicShL | BinaryOp::ArithShL => {
            let sh = b.to_usize().ok_or(())?;
            Ok(make_int(ty, la_raw << sh))
        }
        BinaryOp::LogicShR => {
            let sh = b.to_usize().ok_or(())?;
            Ok(make_int(ty, la_raw >> sh))
        }
        BinaryOp::ArithShR => {
            let sh = b.to_usize().ok_or(())?;
            Ok(make_int(ty, a >> sh))
        }
        BinaryOp::Eq | BinaryOp::CaseEq | BinaryOp::WildcardEq => {
            Ok(make_int(ty, bool_to_int(a == b)))
        }
        BinaryOp::Neq | BinaryOp::CaseNeq | BinaryOp::WildcardNeq => {
            Ok(make_int(ty, bool_to_int(a != b)))
        }
        BinaryOp::Lt => Ok(make_int(ty, bool_to_int(a < b))),
        BinaryOp::Leq => Ok(make_int(ty, bool_to_int(a <= b))),
        BinaryOp::Gt => Ok(make_int(ty, bool_to_int(a > b))),
        BinaryOp::Geq => Ok(make_int(ty, bool_to_int(a >= b))),
        BinaryOp::LogicAnd => Ok(make_int(ty, bool_to_int(!a.is_zero() && !b.is_zero()))),
        BinaryOp::LogicOr => Ok(make_int(ty, bool_to_int(!a.is_zero() || !b.is_zero()))),
        BinaryOp::LogicImpl => Ok(make_int(ty, bool_to_int(a.is_zero() || !b.is_zero()))),
        BinaryOp::LogicEquiv => Ok(make_int(
            ty,
            bool_to_int(a.is_zero() == b.is_zero()),
        )),
    }
}

fn eval_pow<'a>(ty: Type<'a>, base: BigInt, exp: BigInt) -> Result<ValueData<'a>> {
    if exp.is_negative() {
        // Negative exponents only have a defined integer result for a base
        // of magnitude one.
        let r = if base.is_one() {
            BigInt::one()
        } else if base == BigInt::from(-1) {
            if exp.is_even() {
                BigInt::one()
            } else {
                BigInt::from(-1)
            }
        } else {
            BigInt::zero()
        };
        return Ok(make_int(ty, r));
    }
    let exp = exp.to_usize().ok_or(())?;
    Ok(make_int(ty, num::pow(base, exp)))
}

fn bool_to_int(b: bool) -> BigInt {
    if b {
        BigInt::one()
    } else {
        BigInt::zero()
    }
}

/// Compute the parity of the bit pattern, i.e. whether an odd number of bits
/// is set.
fn parity(v: &BigInt) -> bool {
    let (_, bytes) = v.to_bytes_le();
    bytes.iter().map(|b| b.count_ones()).sum::<u32>() % 2 == 1
}

// Copyright (c) 2016-2021 Fabian Schuiki

//! The type algebra of the binder.
//!
//! This module covers the types the binder computes for expressions: packed
//! integral types with a width, sign, value domain, and packed dimensions;
//! the two floating-point types; the `void` type carried by tasks; and the
//! error type used to poison badly-typed expressions.
//!
//! Types are interned by the [`Compilation`](crate::Compilation): two
//! integral types with identical width, sign, domain, and dimensions are
//! represented by the same `Type` reference. This makes type comparisons a
//! pointer check and keeps bound nodes lean.

use crate::context::Compilation;
use itertools::Itertools;
use std::fmt::{self, Display, Formatter};

/// A type computed for an expression.
pub type Type<'a> = &'a TypeKind;

/// An error type.
pub static ERROR_TYPE: TypeKind = TypeKind::Error;

/// A void type.
pub static VOID_TYPE: TypeKind = TypeKind::Void;

/// A `real` type.
pub static REAL_TYPE: TypeKind = TypeKind::Real(RealKind::Real);

/// A `shortreal` type.
pub static SHORTREAL_TYPE: TypeKind = TypeKind::Real(RealKind::ShortReal);

/// Type data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// An error occurred during type computation.
    Error,
    /// The `void` type.
    Void,
    /// A packed integral type.
    Integral(IntegralType),
    /// A floating-point type.
    Real(RealKind),
}

/// A packed integral type, canonicalized to its width, sign, value domain,
/// and packed dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntegralType {
    /// The total number of bits.
    pub width: usize,
    /// The type signing.
    pub sign: Sign,
    /// The value domain of the bits.
    pub domain: Domain,
    /// The packed dimensions, outermost first.
    pub dims: Vec<Range>,
}

/// The floating-point types. `realtime` is interchangeable with `real` and is
/// represented as such.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RealKind {
    /// A 32 bit `shortreal`.
    ShortReal,
    /// A 64 bit `real`.
    Real,
}

impl RealKind {
    /// The number of bits in the representation.
    pub fn width(self) -> usize {
        match self {
            RealKind::ShortReal => 32,
            RealKind::Real => 64,
        }
    }
}

/// The number of values each bit of a type can assume.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Domain {
    /// Two-valued types such as `bit` or `int`.
    TwoValued,
    /// Four-valued types such as `logic` or `integer`.
    FourValued,
}

impl Domain {
    /// The name of the single-bit type in this domain.
    pub fn bit_name(self) -> &'static str {
        match self {
            Domain::TwoValued => "bit",
            Domain::FourValued => "logic",
        }
    }
}

/// Whether a type is signed or unsigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Sign {
    Signed,
    Unsigned,
}

/// The `[a:b]` bounds of one packed dimension.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub msb: isize,
    pub lsb: isize,
}

impl Range {
    /// The total number of bits, given as `|msb-lsb|+1`.
    pub fn size(&self) -> usize {
        (self.msb - self.lsb).abs() as usize + 1
    }

    /// Whether the indices descend, i.e. `msb >= lsb` as in `[15:0]`.
    pub fn is_down(&self) -> bool {
        self.msb >= self.lsb
    }
}

impl fmt::Debug for Range {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}:{}]", self.msb, self.lsb)
    }
}

impl Display for Range {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "[{}:{}]", self.msb, self.lsb)
    }
}

impl TypeKind {
    /// Check if this is the error type.
    pub fn is_error(&self) -> bool {
        match self {
            TypeKind::Error => true,
            _ => false,
        }
    }

    /// Check if this is the void type.
    pub fn is_void(&self) -> bool {
        match self {
            TypeKind::Void => true,
            _ => false,
        }
    }

    /// Check if this is an integral type.
    pub fn is_integral(&self) -> bool {
        match self {
            TypeKind::Integral(..) => true,
            _ => false,
        }
    }

    /// Check if this is a floating-point type.
    pub fn is_real(&self) -> bool {
        match self {
            TypeKind::Real(..) => true,
            _ => false,
        }
    }

    /// Get the width of the type in bits.
    ///
    /// The error and void types have width zero.
    pub fn width(&self) -> usize {
        match self {
            TypeKind::Error | TypeKind::Void => 0,
            TypeKind::Integral(ty) => ty.width,
            TypeKind::Real(kind) => kind.width(),
        }
    }

    /// Return the sign of the type, if it has one. Floating-point types are
    /// always signed.
    pub fn get_sign(&self) -> Option<Sign> {
        match self {
            TypeKind::Error | TypeKind::Void => None,
            TypeKind::Integral(ty) => Some(ty.sign),
            TypeKind::Real(_) => Some(Sign::Signed),
        }
    }

    /// Return the value domain of the type, if it has one.
    pub fn get_domain(&self) -> Option<Domain> {
        match self {
            TypeKind::Integral(ty) => Some(ty.domain),
            _ => None,
        }
    }

    /// Check whether the type is signed.
    ///
    /// Returns false for types which have no sign.
    pub fn is_signed(&self) -> bool {
        self.get_sign() == Some(Sign::Signed)
    }

    /// Check whether each bit of the type can assume four values.
    ///
    /// Returns false for types which have no value domain.
    pub fn is_four_state(&self) -> bool {
        self.get_domain() == Some(Domain::FourValued)
    }

    /// Return the packed dimensions of the type, outermost first. Empty for
    /// non-integral types and integral scalars.
    pub fn packed_dims(&self) -> &[Range] {
        match self {
            TypeKind::Integral(ty) => &ty.dims,
            _ => &[],
        }
    }

    /// Check whether values of type `other` may be assigned to this type
    /// without an explicit cast.
    ///
    /// Integral values convert freely among integral types, and widen into
    /// the floating-point types. Narrowing a floating-point value into an
    /// integral type requires an explicit cast.
    pub fn is_assignment_compatible_from(&self, other: &TypeKind) -> bool {
        match (self, other) {
            (TypeKind::Integral(..), TypeKind::Integral(..)) => true,
            (TypeKind::Real(..), TypeKind::Real(..)) => true,
            (TypeKind::Real(..), TypeKind::Integral(..)) => true,
            _ => false,
        }
    }

    /// Check whether values of type `other` may be cast to this type.
    pub fn is_cast_compatible_from(&self, other: &TypeKind) -> bool {
        let numeric = |ty: &TypeKind| ty.is_integral() || ty.is_real();
        numeric(self) && numeric(other)
    }
}

impl Display for TypeKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            TypeKind::Error => write!(f, "<error>"),
            TypeKind::Void => write!(f, "void"),
            TypeKind::Real(RealKind::Real) => write!(f, "real"),
            TypeKind::Real(RealKind::ShortReal) => write!(f, "shortreal"),
            TypeKind::Integral(ty) => {
                write!(f, "{}", ty.domain.bit_name())?;
                if ty.sign == Sign::Signed {
                    write!(f, " signed")?;
                }
                if !ty.dims.is_empty() {
                    write!(f, " {}", ty.dims.iter().format(""))?;
                }
                Ok(())
            }
        }
    }
}

/// Compute the type of a binary operation.
///
/// The result width is the larger of the two operand widths. If either
/// operand is a floating-point type, the result is `real` for widths of 64
/// bits and up, and `shortreal` otherwise. For integral operands the result
/// is signed iff both operands are signed, and four-valued if either operand
/// is, or if `force_four_state` is set. The latter is used by operators which
/// can produce `x` from well-defined inputs, such as division.
pub fn result_type_of_binary<'a>(
    cx: &Compilation<'a>,
    lhs: Type<'a>,
    rhs: Type<'a>,
    force_four_state: bool,
) -> Type<'a> {
    let width = std::cmp::max(lhs.width(), rhs.width());
    if lhs.is_real() || rhs.is_real() {
        if width >= 64 {
            cx.get_real_type()
        } else {
            cx.get_short_real_type()
        }
    } else {
        let sign = if lhs.is_signed() && rhs.is_signed() {
            Sign::Signed
        } else {
            Sign::Unsigned
        };
        let domain = if force_four_state || lhs.is_four_state() || rhs.is_four_state() {
            Domain::FourValued
        } else {
            Domain::TwoValued
        };
        cx.get_type(width, sign, domain)
    }
}

// Copyright (c) 2016-2021 Fabian Schuiki

//! Utilities to implement diagnostics and error reporting facilities.
//!
//! Every user-visible error the binder can produce is identified by a
//! [`DiagCode`]. Diagnostics are assembled through a builder which attaches
//! source ranges, notes, and message arguments, and are handed to a
//! [`DiagEmitter`] once complete. Rendering the collected diagnostics with
//! source excerpts is left to the driver.

use crate::source::{Location, Span};
use std::fmt;

/// The severity of a diagnostic.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Severity {
    Note,
    Warning,
    Error,
    Fatal,
    Bug,
}

impl Severity {
    pub fn to_str(self) -> &'static str {
        match self {
            Severity::Fatal => "fatal",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
            Severity::Bug => "compiler bug",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// The distinct errors the binder can diagnose.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum DiagCode {
    /// A name did not resolve to any symbol.
    UndeclaredIdentifier,
    /// A name resolved to more than one symbol.
    AmbiguousIdentifier,
    /// A unary operator applied to an operand of unsupported type.
    BadUnaryExpression,
    /// A binary operator applied to operands of unsupported type.
    BadBinaryExpression,
    /// The source type cannot be assigned to the destination type.
    BadAssignment,
    /// The types are cast compatible but not implicitly assignable.
    NoImplicitConversion,
    /// A subroutine call with more actual than formal arguments.
    TooManyArguments,
    /// A subroutine call with fewer actual than formal arguments.
    TooFewArguments,
    /// A `return` statement outside of any subroutine.
    ReturnNotInSubroutine,
    /// The left-hand side of an assignment is not assignable.
    ExpressionNotAssignable,
    /// An expression required to be constant could not be evaluated.
    ExpressionNotConstant,
    /// A select applied to a non-integral base, or with a malformed range.
    BadSelectExpression,
}

impl DiagCode {
    /// The message template for this code. Occurrences of `{}` are replaced
    /// by the builder's arguments in order.
    pub fn template(self) -> &'static str {
        match self {
            DiagCode::UndeclaredIdentifier => "use of undeclared identifier `{}`",
            DiagCode::AmbiguousIdentifier => "`{}` is ambiguous in this scope",
            DiagCode::BadUnaryExpression => "invalid operand type `{}` for unary operator",
            DiagCode::BadBinaryExpression => {
                "invalid operand types `{}` and `{}` for binary operator"
            }
            DiagCode::BadAssignment => "value of type `{}` cannot be assigned to type `{}`",
            DiagCode::NoImplicitConversion => {
                "no implicit conversion from `{}` to `{}`; an explicit cast is required"
            }
            DiagCode::TooManyArguments => "too many arguments; expected {}, found {}",
            DiagCode::TooFewArguments => "too few arguments; expected {}, found {}",
            DiagCode::ReturnNotInSubroutine => {
                "`return` may only be used inside a function or task"
            }
            DiagCode::ExpressionNotAssignable => "expression is not assignable",
            DiagCode::ExpressionNotConstant => "expression is not a constant",
            DiagCode::BadSelectExpression => "invalid select of type `{}`",
        }
    }
}

/// An additional piece of information attached to a diagnostic.
#[derive(Clone, Debug)]
pub enum DiagSegment {
    /// A source range the diagnostic refers to.
    Span(Span),
    /// A free-form note.
    Note(String),
}

/// A fully assembled diagnostic message.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub code: DiagCode,
    pub severity: Severity,
    pub location: Location,
    pub message: String,
    pub segments: Vec<DiagSegment>,
}

impl Diagnostic {
    /// Return the source ranges attached to this diagnostic, in order.
    pub fn spans<'a>(&'a self) -> impl Iterator<Item = Span> + 'a {
        self.segments.iter().filter_map(|s| match s {
            DiagSegment::Span(sp) => Some(*sp),
            DiagSegment::Note(_) => None,
        })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;
        for segment in &self.segments {
            if let DiagSegment::Note(note) = segment {
                write!(f, "\nnote: {}", note)?;
            }
        }
        Ok(())
    }
}

/// Emits diagnostic messages.
pub trait DiagEmitter {
    /// Emit a diagnostic message.
    fn emit(&self, diag: Diagnostic);
}

impl<'a, T> DiagEmitter for &'a T
where
    T: DiagEmitter + ?Sized,
{
    fn emit(&self, diag: Diagnostic) {
        (*self).emit(diag)
    }
}

/// Used to assemble a diagnostic message.
///
/// The builder emits the finished diagnostic into its sink when dropped, which
/// allows call sites to attach ranges and arguments without an explicit
/// terminator.
pub struct DiagBuilder<'c> {
    sink: &'c dyn DiagEmitter,
    code: DiagCode,
    severity: Severity,
    location: Location,
    args: Vec<String>,
    segments: Vec<DiagSegment>,
}

impl<'c> DiagBuilder<'c> {
    /// Start a new diagnostic of the given code and severity.
    pub fn new(
        sink: &'c dyn DiagEmitter,
        severity: Severity,
        code: DiagCode,
        location: Location,
    ) -> DiagBuilder<'c> {
        DiagBuilder {
            sink,
            code,
            severity,
            location,
            args: Vec::new(),
            segments: Vec::new(),
        }
    }

    /// Attach a source range.
    pub fn span<S: Into<Span>>(mut self, span: S) -> Self {
        self.segments.push(DiagSegment::Span(span.into()));
        self
    }

    /// Attach a message argument, substituted for the next `{}` in the
    /// code's message template.
    pub fn arg(mut self, arg: impl fmt::Display) -> Self {
        self.args.push(arg.to_string());
        self
    }

    /// Attach a free-form note.
    pub fn add_note(mut self, message: impl Into<String>) -> Self {
        self.segments.push(DiagSegment::Note(message.into()));
        self
    }
}

impl Drop for DiagBuilder<'_> {
    fn drop(&mut self) {
        let message = expand(self.code.template(), &self.args);
        self.sink.emit(Diagnostic {
            code: self.code,
            severity: self.severity,
            location: self.location,
            message,
            segments: std::mem::replace(&mut self.segments, Vec::new()),
        });
    }
}

/// Substitute `{}` placeholders in a message template with arguments, in
/// order. Surplus placeholders are kept verbatim.
fn expand(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut args = args.iter();
    while let Some(pos) = rest.find("{}") {
        out.push_str(&rest[..pos]);
        match args.next() {
            Some(arg) => out.push_str(arg),
            None => out.push_str("{}"),
        }
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
    out
}

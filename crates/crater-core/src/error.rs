//! Tagged error values with type-erased aggregation.
//!
//! [`ErrorValue<D>`] pairs an [`ErrorCode`] with optional typed context `D`.
//! [`AnyError`] hides `D` behind [`ErrorBase`] so functions calling into
//! several subsystems can return one error type, and callers that know what
//! they are looking for can get the typed value back with
//! [`AnyError::downcast_ref`].
//!
//! `?` forwards an `ErrorValue<D>` unchanged when the caller returns the
//! same type, and aggregates it into an `AnyError` when the caller returns
//! [`AnyExpected`].

use std::any::{Any, TypeId};
use std::fmt;

/// Error codes shared across flight software subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    InvalidArgument = 1,
    OutOfRange = 2,
    NotReady = 3,
    SensorFault = 4,
    Timeout = 5,
    InvalidConfig = 6,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidArgument => "InvalidArgument",
            ErrorCode::OutOfRange => "OutOfRange",
            ErrorCode::NotReady => "NotReady",
            ErrorCode::SensorFault => "SensorFault",
            ErrorCode::Timeout => "Timeout",
            ErrorCode::InvalidConfig => "InvalidConfig",
        }
    }

    pub fn value(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Context data that can ride along with an [`ErrorCode`].
///
/// `data_string` returns `None` for payload-free errors, which drops the
/// trailing detail from [`ErrorValue::message`].
pub trait ErrorData: fmt::Debug + Send + Sync + 'static {
    fn data_string(&self) -> Option<String>;
}

impl ErrorData for () {
    fn data_string(&self) -> Option<String> {
        None
    }
}

impl ErrorData for String {
    fn data_string(&self) -> Option<String> {
        Some(self.clone())
    }
}

impl ErrorData for &'static str {
    fn data_string(&self) -> Option<String> {
        Some((*self).to_string())
    }
}

/// Behavior common to every error value, typed or erased.
pub trait ErrorBase: fmt::Debug + Send + Sync + 'static {
    fn code(&self) -> ErrorCode;

    fn message(&self) -> String;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// An error code plus typed context.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorValue<D = ()> {
    code: ErrorCode,
    data: D,
}

impl<D: ErrorData> ErrorValue<D> {
    pub fn new(code: ErrorCode, data: D) -> Self {
        Self { code, data }
    }

    pub fn data(&self) -> &D {
        &self.data
    }

    pub fn into_data(self) -> D {
        self.data
    }
}

impl ErrorValue<()> {
    /// An error that carries nothing but its code.
    pub fn bare(code: ErrorCode) -> Self {
        Self { code, data: () }
    }
}

impl<D: ErrorData> ErrorBase for ErrorValue<D> {
    fn code(&self) -> ErrorCode {
        self.code
    }

    fn message(&self) -> String {
        match self.data.data_string() {
            Some(detail) => format!(
                "Error {}:{}. {}",
                self.code.as_str(),
                self.code.value(),
                detail
            ),
            None => format!("Error {}:{}", self.code.as_str(), self.code.value()),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl<D: ErrorData> fmt::Display for ErrorValue<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl<D: ErrorData> std::error::Error for ErrorValue<D> {}

/// Type-erased error that remembers the concrete type it was built from.
pub struct AnyError {
    inner: Box<dyn ErrorBase>,
}

impl AnyError {
    pub fn new<E: ErrorBase>(error: E) -> Self {
        Self {
            inner: Box::new(error),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.inner.code()
    }

    pub fn message(&self) -> String {
        self.inner.message()
    }

    /// True if the erased value is exactly an `E`.
    pub fn is<E: ErrorBase>(&self) -> bool {
        self.inner.as_any().type_id() == TypeId::of::<E>()
    }

    /// Borrow the erased value as an `E`, or `None` if it is some other type.
    pub fn downcast_ref<E: ErrorBase>(&self) -> Option<&E> {
        self.inner.as_any().downcast_ref::<E>()
    }

    /// Recover the erased value by value, handing `self` back on mismatch.
    pub fn downcast<E: ErrorBase>(self) -> Result<E, Self> {
        if !self.is::<E>() {
            return Err(self);
        }
        match self.inner.into_any().downcast::<E>() {
            Ok(boxed) => Ok(*boxed),
            Err(_) => unreachable!("type id was checked above"),
        }
    }
}

impl<D: ErrorData> From<ErrorValue<D>> for AnyError {
    fn from(error: ErrorValue<D>) -> Self {
        Self::new(error)
    }
}

impl fmt::Debug for AnyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AnyError").field(&self.inner).finish()
    }
}

impl fmt::Display for AnyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.message())
    }
}

impl std::error::Error for AnyError {}

/// Result carrying a typed error.
pub type Expected<T, D = ()> = std::result::Result<T, ErrorValue<D>>;

/// Result carrying an aggregated error.
pub type AnyExpected<T> = std::result::Result<T, AnyError>;

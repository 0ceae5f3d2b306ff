// Copyright 2025 Simo Sorce
// See LICENSE.txt file for terms

//! Error type shared by all conversion routines

use std::error;
use std::fmt;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// The error returned by all fallible operations in this crate
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    errmsg: Option<String>,
    origin: Option<Box<dyn error::Error>>,
}

/// Broad classification of errors
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[non_exhaustive]
pub enum ErrorKind {
    /// An encode/decode input did not match the transform domain,
    /// see errmsg
    TypeConversion,
    /// Other error, see origin
    Nested,
}

impl Error {
    /// A value of the wrong form was passed to a transform
    pub fn type_conversion(errmsg: String) -> Error {
        Error {
            kind: ErrorKind::TypeConversion,
            errmsg: Some(errmsg),
            origin: None,
        }
    }

    /// Wraps any other error
    pub fn other_error<E>(error: E) -> Error
    where
        E: Into<Box<dyn error::Error>>,
    {
        Error {
            kind: ErrorKind::Nested,
            errmsg: None,
            origin: Some(error.into()),
        }
    }

    /// Returns the error classification
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            ErrorKind::TypeConversion => {
                write!(f, "{}", self.errmsg.as_deref().unwrap_or("invalid conversion"))
            }
            ErrorKind::Nested => self.origin.as_ref().unwrap().fmt(f),
        }
    }
}

impl error::Error for Error {}

impl From<std::num::TryFromIntError> for Error {
    fn from(error: std::num::TryFromIntError) -> Error {
        Error::other_error(error)
    }
}

impl From<std::convert::Infallible> for Error {
    fn from(error: std::convert::Infallible) -> Error {
        Error::other_error(error)
    }
}

impl From<std::array::TryFromSliceError> for Error {
    fn from(error: std::array::TryFromSliceError) -> Error {
        Error::other_error(error)
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(error: std::string::FromUtf8Error) -> Error {
        Error::type_conversion(format!("invalid UTF-8 in value: {}", error))
    }
}

/// Shorthand to construct a TypeConversion error with the same message
/// format the transforms use
#[macro_export]
macro_rules! conv_err {
    ($val:expr => $target:expr) => {
        $crate::error::Error::type_conversion(format!(
            "invalid conversion of {} to {}!",
            $val.type_name(),
            $target
        ))
    };
}

// Copyright 2025 Simo Sorce
// See LICENSE.txt file for terms

//! Native representation of attribute values
//!
//! A [Value] is the host side of the marshalling bridge. Which variant
//! an attribute uses is decided by the attribute type through the
//! transform registry, not by the value itself, so most variants are
//! accepted by more than one transform.

use num_bigint::BigUint;

use crate::conv_err;
use crate::error::{Error, Result};
use crate::pkcs11::{CK_DATE, CK_ULONG};
use crate::template::Template;

/// A typed attribute value
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// No value; assembles into a size-query record (null pointer,
    /// zero length)
    Absent,
    /// Boolean flag
    Bool(bool),
    /// Native unsigned long
    Ulong(CK_ULONG),
    /// Arbitrary precision unsigned integer
    Bignum(BigUint),
    /// Text, marshalled as an unterminated character buffer
    Text(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Calendar date
    Date(CK_DATE),
    /// Nested attribute template
    Template(Template),
}

impl Value {
    /// Short name of the variant, used in conversion error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Absent => "absent",
            Value::Bool(_) => "bool",
            Value::Ulong(_) => "ulong",
            Value::Bignum(_) => "bignum",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Date(_) => "date",
            Value::Template(_) => "template",
        }
    }

    /// Builds a date value from its year/month/day parts.
    ///
    /// Parts must be 4, 2 and 2 characters long respectively, as in
    /// the CK_DATE wire format.
    pub fn date(year: &str, month: &str, day: &str) -> Result<Value> {
        if year.len() != 4 || month.len() != 2 || day.len() != 2 {
            return Err(Error::type_conversion(format!(
                "invalid date parts {}/{}/{}, expected YYYY/MM/DD",
                year, month, day
            )));
        }
        let mut date = CK_DATE {
            year: [0u8; 4],
            month: [0u8; 2],
            day: [0u8; 2],
        };
        date.year.copy_from_slice(year.as_bytes());
        date.month.copy_from_slice(month.as_bytes());
        date.day.copy_from_slice(day.as_bytes());
        Ok(Value::Date(date))
    }

    /// Returns the boolean held by this value
    pub fn to_bool(&self) -> Result<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            _ => Err(conv_err!(self => "bool")),
        }
    }

    /// Returns the unsigned long held by this value
    pub fn to_ulong(&self) -> Result<CK_ULONG> {
        match self {
            Value::Ulong(u) => Ok(*u),
            _ => Err(conv_err!(self => "CK_ULONG")),
        }
    }

    /// Returns a reference to the text held by this value
    pub fn to_text(&self) -> Result<&str> {
        match self {
            Value::Text(s) => Ok(s.as_str()),
            _ => Err(conv_err!(self => "text")),
        }
    }

    /// Returns a reference to the bytes held by this value
    pub fn to_bytes(&self) -> Result<&Vec<u8>> {
        match self {
            Value::Bytes(v) => Ok(v),
            _ => Err(conv_err!(self => "bytes")),
        }
    }

    /// Returns a reference to the nested template held by this value
    pub fn to_template(&self) -> Result<&Template> {
        match self {
            Value::Template(t) => Ok(t),
            _ => Err(conv_err!(self => "template")),
        }
    }
}

impl From<bool> for Value {
    fn from(val: bool) -> Value {
        Value::Bool(val)
    }
}

impl From<CK_ULONG> for Value {
    fn from(val: CK_ULONG) -> Value {
        Value::Ulong(val)
    }
}

impl From<BigUint> for Value {
    fn from(val: BigUint) -> Value {
        Value::Bignum(val)
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Value {
        Value::Text(val.to_string())
    }
}

impl From<String> for Value {
    fn from(val: String) -> Value {
        Value::Text(val)
    }
}

impl From<Vec<u8>> for Value {
    fn from(val: Vec<u8>) -> Value {
        Value::Bytes(val)
    }
}

impl From<&[u8]> for Value {
    fn from(val: &[u8]) -> Value {
        Value::Bytes(val.to_vec())
    }
}

impl From<CK_DATE> for Value {
    fn from(val: CK_DATE) -> Value {
        Value::Date(val)
    }
}

impl From<Template> for Value {
    fn from(val: Template) -> Value {
        Value::Template(val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn date_parts() {
        let d = Value::date("2024", "01", "31").unwrap();
        match d {
            Value::Date(date) => {
                assert_eq!(&date.year, b"2024");
                assert_eq!(&date.month, b"01");
                assert_eq!(&date.day, b"31");
            }
            _ => panic!("expected a date value"),
        }
    }

    #[test]
    fn date_parts_invalid() {
        let e = Value::date("24", "01", "31").unwrap_err();
        assert_eq!(e.kind(), ErrorKind::TypeConversion);
    }

    #[test]
    fn typed_accessors() {
        assert_eq!(Value::Bool(true).to_bool().unwrap(), true);
        assert_eq!(Value::Ulong(42).to_ulong().unwrap(), 42);
        assert_eq!(Value::from("abc").to_text().unwrap(), "abc");
        assert!(Value::Bool(true).to_ulong().is_err());
        assert!(Value::Absent.to_bool().is_err());
    }
}

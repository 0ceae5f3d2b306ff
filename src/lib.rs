// Copyright 2025 Simo Sorce
// See LICENSE.txt file for terms

#![warn(missing_docs)]

//! This is ckattrs
//!
//! A marshalling layer between native Rust attribute values and the
//! CK_ATTRIBUTE arrays PKCS#11 modules consume and produce. Build a
//! [Template] from typed [Value]s, [assemble](Template::assemble) it
//! into an [AttrArray] for an outbound native call, or
//! [disassemble](Template::disassemble) an array a module filled in
//! back into typed values.

pub mod error;
pub mod log;
pub mod misc;
pub mod pkcs11;
pub mod template;
pub mod transform;
pub mod value;

pub use error::{Error, ErrorKind, Result};
pub use template::{AttrArray, Encoded, Template};
pub use transform::{
    NativeType, Transform, BOOL_TRANSFORM, BYTES_TRANSFORM, CHAR_TRANSFORM,
    DATE_TRANSFORM, DEFAULT_TRANSFORM, TEMPLATE_TRANSFORM, ULONG_TRANSFORM,
};
pub use value::Value;

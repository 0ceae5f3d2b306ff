// Copyright 2025 Simo Sorce
// See LICENSE.txt file for terms

//! PKCS#11 types and attribute constants
//!
//! Only the subset of the Cryptoki interface this crate marshals for is
//! defined here; names and values match the OASIS PKCS#11 3.x header
//! bit for bit.

#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(missing_docs)]

use crate::bytes_to_vec;
use crate::error::{Error, Result};
use crate::misc::CK_ULONG_SIZE;

pub mod vendor;

pub type CK_BYTE = u8;
pub type CK_CHAR = CK_BYTE;
pub type CK_BBOOL = CK_BYTE;
pub type CK_ULONG = std::os::raw::c_ulong;
pub type CK_ATTRIBUTE_TYPE = CK_ULONG;
pub type CK_OBJECT_CLASS = CK_ULONG;
pub type CK_VOID_PTR = *mut std::ffi::c_void;
pub type CK_BYTE_PTR = *mut CK_BYTE;
pub type CK_ATTRIBUTE_PTR = *mut CK_ATTRIBUTE;

pub const CK_FALSE: CK_BBOOL = 0;
pub const CK_TRUE: CK_BBOOL = 1;

/// Returned by modules in ulValueLen for attributes they cannot provide
pub const CK_UNAVAILABLE_INFORMATION: CK_ULONG = CK_ULONG::MAX;

/// Defines type, value and length of an attribute
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct CK_ATTRIBUTE {
    pub type_: CK_ATTRIBUTE_TYPE,
    pub pValue: CK_VOID_PTR,
    pub ulValueLen: CK_ULONG,
}

/// The PKCS#11 date type, three unterminated ASCII character fields
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CK_DATE {
    pub year: [CK_CHAR; 4],
    pub month: [CK_CHAR; 2],
    pub day: [CK_CHAR; 2],
}

impl CK_ATTRIBUTE {
    /// Copies the value into an owned byte vector.
    ///
    /// An empty vector is returned when the value pointer is null.
    pub fn to_buf(&self) -> Result<Vec<u8>> {
        Ok(bytes_to_vec!(self.pValue, self.ulValueLen))
    }

    /// Reads the value as a CK_BBOOL.
    ///
    /// Fails if the stored length is not exactly one byte.
    pub fn to_bool(&self) -> Result<bool> {
        let buf = self.to_buf()?;
        if buf.len() != 1 {
            return Err(Error::type_conversion(format!(
                "invalid length {} for a CK_BBOOL value",
                buf.len()
            )));
        }
        Ok(buf[0] != CK_FALSE)
    }

    /// Reads the value as a native-endian CK_ULONG.
    ///
    /// Fails if the stored length is not the platform ulong size.
    pub fn to_ulong(&self) -> Result<CK_ULONG> {
        let buf = self.to_buf()?;
        if buf.len() != CK_ULONG_SIZE {
            return Err(Error::type_conversion(format!(
                "invalid length {} for a CK_ULONG value",
                buf.len()
            )));
        }
        Ok(CK_ULONG::from_ne_bytes(buf.as_slice().try_into()?))
    }

    /// Reads exactly ulValueLen bytes as a UTF-8 string.
    ///
    /// Native buffers are not guaranteed to be null terminated so the
    /// length field is authoritative.
    pub fn to_string(&self) -> Result<String> {
        Ok(String::from_utf8(self.to_buf()?)?)
    }
}

/* Attribute types */
pub const CKA_CLASS: CK_ATTRIBUTE_TYPE = 0x00000000;
pub const CKA_TOKEN: CK_ATTRIBUTE_TYPE = 0x00000001;
pub const CKA_PRIVATE: CK_ATTRIBUTE_TYPE = 0x00000002;
pub const CKA_LABEL: CK_ATTRIBUTE_TYPE = 0x00000003;
pub const CKA_APPLICATION: CK_ATTRIBUTE_TYPE = 0x00000010;
pub const CKA_VALUE: CK_ATTRIBUTE_TYPE = 0x00000011;
pub const CKA_CERTIFICATE_TYPE: CK_ATTRIBUTE_TYPE = 0x00000080;
pub const CKA_ISSUER: CK_ATTRIBUTE_TYPE = 0x00000081;
pub const CKA_SERIAL_NUMBER: CK_ATTRIBUTE_TYPE = 0x00000082;
pub const CKA_KEY_TYPE: CK_ATTRIBUTE_TYPE = 0x00000100;
pub const CKA_SUBJECT: CK_ATTRIBUTE_TYPE = 0x00000101;
pub const CKA_ID: CK_ATTRIBUTE_TYPE = 0x00000102;
pub const CKA_SENSITIVE: CK_ATTRIBUTE_TYPE = 0x00000103;
pub const CKA_ENCRYPT: CK_ATTRIBUTE_TYPE = 0x00000104;
pub const CKA_DECRYPT: CK_ATTRIBUTE_TYPE = 0x00000105;
pub const CKA_WRAP: CK_ATTRIBUTE_TYPE = 0x00000106;
pub const CKA_UNWRAP: CK_ATTRIBUTE_TYPE = 0x00000107;
pub const CKA_SIGN: CK_ATTRIBUTE_TYPE = 0x00000108;
pub const CKA_SIGN_RECOVER: CK_ATTRIBUTE_TYPE = 0x00000109;
pub const CKA_VERIFY: CK_ATTRIBUTE_TYPE = 0x0000010a;
pub const CKA_VERIFY_RECOVER: CK_ATTRIBUTE_TYPE = 0x0000010b;
pub const CKA_DERIVE: CK_ATTRIBUTE_TYPE = 0x0000010c;
pub const CKA_START_DATE: CK_ATTRIBUTE_TYPE = 0x00000110;
pub const CKA_END_DATE: CK_ATTRIBUTE_TYPE = 0x00000111;
pub const CKA_MODULUS: CK_ATTRIBUTE_TYPE = 0x00000120;
pub const CKA_MODULUS_BITS: CK_ATTRIBUTE_TYPE = 0x00000121;
pub const CKA_PUBLIC_EXPONENT: CK_ATTRIBUTE_TYPE = 0x00000122;
pub const CKA_PRIVATE_EXPONENT: CK_ATTRIBUTE_TYPE = 0x00000123;
pub const CKA_PRIME_1: CK_ATTRIBUTE_TYPE = 0x00000124;
pub const CKA_PRIME_2: CK_ATTRIBUTE_TYPE = 0x00000125;
pub const CKA_EXPONENT_1: CK_ATTRIBUTE_TYPE = 0x00000126;
pub const CKA_EXPONENT_2: CK_ATTRIBUTE_TYPE = 0x00000127;
pub const CKA_COEFFICIENT: CK_ATTRIBUTE_TYPE = 0x00000128;
pub const CKA_PRIME: CK_ATTRIBUTE_TYPE = 0x00000130;
pub const CKA_SUBPRIME: CK_ATTRIBUTE_TYPE = 0x00000131;
pub const CKA_BASE: CK_ATTRIBUTE_TYPE = 0x00000132;
pub const CKA_PRIME_BITS: CK_ATTRIBUTE_TYPE = 0x00000133;
pub const CKA_SUBPRIME_BITS: CK_ATTRIBUTE_TYPE = 0x00000134;
pub const CKA_VALUE_BITS: CK_ATTRIBUTE_TYPE = 0x00000160;
pub const CKA_VALUE_LEN: CK_ATTRIBUTE_TYPE = 0x00000161;
pub const CKA_EXTRACTABLE: CK_ATTRIBUTE_TYPE = 0x00000162;
pub const CKA_LOCAL: CK_ATTRIBUTE_TYPE = 0x00000163;
pub const CKA_NEVER_EXTRACTABLE: CK_ATTRIBUTE_TYPE = 0x00000164;
pub const CKA_ALWAYS_SENSITIVE: CK_ATTRIBUTE_TYPE = 0x00000165;
pub const CKA_MODIFIABLE: CK_ATTRIBUTE_TYPE = 0x00000170;

pub const CKF_ARRAY_ATTRIBUTE: CK_ATTRIBUTE_TYPE = 0x40000000;
pub const CKA_WRAP_TEMPLATE: CK_ATTRIBUTE_TYPE =
    CKF_ARRAY_ATTRIBUTE | 0x00000211;
pub const CKA_UNWRAP_TEMPLATE: CK_ATTRIBUTE_TYPE =
    CKF_ARRAY_ATTRIBUTE | 0x00000212;
pub const CKA_DERIVE_TEMPLATE: CK_ATTRIBUTE_TYPE =
    CKF_ARRAY_ATTRIBUTE | 0x00000213;

pub const CKA_VENDOR_DEFINED: CK_ATTRIBUTE_TYPE = 0x80000000;

/* Object classes */
pub const CKO_DATA: CK_OBJECT_CLASS = 0x00000000;
pub const CKO_CERTIFICATE: CK_OBJECT_CLASS = 0x00000001;
pub const CKO_PUBLIC_KEY: CK_OBJECT_CLASS = 0x00000002;
pub const CKO_PRIVATE_KEY: CK_OBJECT_CLASS = 0x00000003;
pub const CKO_SECRET_KEY: CK_OBJECT_CLASS = 0x00000004;

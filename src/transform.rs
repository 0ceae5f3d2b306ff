// Copyright 2025 Simo Sorce
// See LICENSE.txt file for terms

//! Bidirectional codecs between [Value](crate::value::Value) variants
//! and the binary layout PKCS#11 modules expect, plus the registry
//! mapping each attribute type to its codec.
//!
//! Each codec is one [Transform]: `encode` produces the owned binary
//! buffer and its length field, `decode` reads a `CK_ATTRIBUTE`
//! returned by a module. The two directions share the same byte layout
//! and must be kept paired.

use std::cmp::min;

use num_bigint::BigUint;

use crate::conv_err;
use crate::error::{Error, Result};
use crate::pkcs11::vendor::*;
use crate::pkcs11::*;
use crate::template::{Encoded, Template};
use crate::value::Value;

/// The native element type a transform produces, the equivalent of
/// the C type a caller would use to allocate a receiving array
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum NativeType {
    /// CK_BBOOL
    Bbool,
    /// CK_ULONG
    Ulong,
    /// CK_BYTE
    Byte,
    /// CK_CHAR
    Char,
    /// CK_ATTRIBUTE
    Attribute,
}

impl NativeType {
    /// Width in bytes of one element of this type
    pub fn size(&self) -> usize {
        match self {
            NativeType::Bbool => std::mem::size_of::<CK_BBOOL>(),
            NativeType::Ulong => std::mem::size_of::<CK_ULONG>(),
            NativeType::Byte => std::mem::size_of::<CK_BYTE>(),
            NativeType::Char => std::mem::size_of::<CK_CHAR>(),
            NativeType::Attribute => std::mem::size_of::<CK_ATTRIBUTE>(),
        }
    }
}

/// A bidirectional value codec for one attribute domain
pub trait Transform: std::fmt::Debug + Sync {
    /// The declared native element type of the encoded buffer
    fn native_type(&self) -> NativeType;

    /// Converts a native value into an owned binary buffer and the
    /// length to report in the attribute record
    fn encode(&self, val: &Value) -> Result<Encoded>;

    /// Converts a module-provided attribute record back into a value
    fn decode(&self, attr: &CK_ATTRIBUTE) -> Result<Value>;
}

/// Codec for CK_ULONG attributes (classes, key types, sizes, counts)
#[derive(Debug)]
pub struct UlongTransform;

impl Transform for UlongTransform {
    fn native_type(&self) -> NativeType {
        NativeType::Ulong
    }

    fn encode(&self, val: &Value) -> Result<Encoded> {
        match val {
            Value::Ulong(u) => Encoded::bytes(u.to_ne_bytes().to_vec()),
            Value::Bignum(n) => {
                let u = CK_ULONG::try_from(n)
                    .map_err(|_| conv_err!(val => "CK_ULONG"))?;
                Encoded::bytes(u.to_ne_bytes().to_vec())
            }
            _ => Err(conv_err!(val => "CK_ULONG")),
        }
    }

    fn decode(&self, attr: &CK_ATTRIBUTE) -> Result<Value> {
        Ok(Value::Ulong(attr.to_ulong()?))
    }
}

/// Codec for CK_BBOOL attributes (capability flags)
#[derive(Debug)]
pub struct BoolTransform;

impl Transform for BoolTransform {
    fn native_type(&self) -> NativeType {
        NativeType::Bbool
    }

    fn encode(&self, val: &Value) -> Result<Encoded> {
        /* integers are accepted and normalized to 0 | 1 */
        let b = match val {
            Value::Bool(b) => *b,
            Value::Ulong(u) => *u != 0,
            _ => return Err(conv_err!(val => "CK_BBOOL")),
        };
        Encoded::bytes(vec![if b { CK_TRUE } else { CK_FALSE }])
    }

    fn decode(&self, attr: &CK_ATTRIBUTE) -> Result<Value> {
        Ok(Value::Bool(attr.to_bool()?))
    }
}

/// Codec for character buffer attributes (labels, identifiers)
///
/// The encoded buffer is null terminated for the benefit of C
/// consumers but the terminator is not counted in the reported
/// length. Decoding never relies on termination, only on the length
/// field.
#[derive(Debug)]
pub struct CharTransform;

impl Transform for CharTransform {
    fn native_type(&self) -> NativeType {
        NativeType::Char
    }

    fn encode(&self, val: &Value) -> Result<Encoded> {
        match val {
            Value::Text(s) => {
                let mut buf = Vec::with_capacity(s.len() + 1);
                buf.extend_from_slice(s.as_bytes());
                buf.push(0);
                Ok(Encoded::bytes_with_len(
                    buf,
                    CK_ULONG::try_from(s.len())?,
                ))
            }
            Value::Bytes(v) => Encoded::bytes(v.clone()),
            _ => Err(conv_err!(val => "CK_CHAR*")),
        }
    }

    fn decode(&self, attr: &CK_ATTRIBUTE) -> Result<Value> {
        Ok(Value::Text(attr.to_string()?))
    }
}

/// Codec for CK_DATE attributes, always an 8 byte YYYYMMDD buffer
#[derive(Debug)]
pub struct DateTransform;

impl Transform for DateTransform {
    fn native_type(&self) -> NativeType {
        NativeType::Char
    }

    fn encode(&self, val: &Value) -> Result<Encoded> {
        match val {
            Value::Text(s) => {
                if s.len() != 8 {
                    return Err(Error::type_conversion(format!(
                        "invalid date string '{}', expected YYYYMMDD",
                        s
                    )));
                }
                Encoded::bytes(s.as_bytes().to_vec())
            }
            Value::Date(d) => {
                let mut buf = Vec::with_capacity(8);
                buf.extend_from_slice(&d.year);
                buf.extend_from_slice(&d.month);
                buf.extend_from_slice(&d.day);
                Encoded::bytes(buf)
            }
            _ => Err(conv_err!(val => "CK_DATE")),
        }
    }

    fn decode(&self, attr: &CK_ATTRIBUTE) -> Result<Value> {
        Ok(Value::Text(attr.to_string()?))
    }
}

/// Codec for byte array attributes (key material, digests); also the
/// default for attribute types missing from the registry
///
/// Encoding accepts several value forms, all normalized to the same
/// byte sequence: raw bytes pass through, integers become their
/// minimal big-endian representation, text is first probed as a hex
/// digit string and falls back to its raw bytes when any pair is not
/// valid hex. Decoding always returns the raw bytes; the caller knows
/// which form to expect back.
#[derive(Debug)]
pub struct BytesTransform;

/// Consumes a string two characters at a time into byte values.
/// A trailing odd character parses as its own hex digit. Returns
/// None on the first non-hex chunk.
fn probe_hex(s: &str) -> Option<Vec<u8>> {
    let raw = s.as_bytes();
    let mut out = Vec::with_capacity((raw.len() + 1) / 2);
    let mut i = 0;
    while i < raw.len() {
        let end = min(i + 2, raw.len());
        let chunk = std::str::from_utf8(&raw[i..end]).ok()?;
        out.push(u8::from_str_radix(chunk, 16).ok()?);
        i = end;
    }
    Some(out)
}

impl Transform for BytesTransform {
    fn native_type(&self) -> NativeType {
        NativeType::Byte
    }

    fn encode(&self, val: &Value) -> Result<Encoded> {
        match val {
            Value::Bytes(v) => Encoded::bytes(v.clone()),
            Value::Ulong(u) => {
                Encoded::bytes(BigUint::from(*u).to_bytes_be())
            }
            Value::Bignum(n) => Encoded::bytes(n.to_bytes_be()),
            Value::Text(s) => match probe_hex(s) {
                Some(v) => Encoded::bytes(v),
                None => Encoded::bytes(s.as_bytes().to_vec()),
            },
            _ => Err(conv_err!(val => "byte array")),
        }
    }

    fn decode(&self, attr: &CK_ATTRIBUTE) -> Result<Value> {
        Ok(Value::Bytes(attr.to_buf()?))
    }
}

/// Codec for template-valued attributes
///
/// The reported length counts records, not bytes, matching what
/// modules expect for CKF_ARRAY_ATTRIBUTE attributes.
#[derive(Debug)]
pub struct TemplateTransform;

impl Transform for TemplateTransform {
    fn native_type(&self) -> NativeType {
        NativeType::Attribute
    }

    fn encode(&self, val: &Value) -> Result<Encoded> {
        match val {
            Value::Template(t) => Encoded::records(t.assemble()?),
            _ => Err(conv_err!(val => "template")),
        }
    }

    fn decode(&self, attr: &CK_ATTRIBUTE) -> Result<Value> {
        if attr.pValue.is_null() || attr.ulValueLen == 0 {
            return Ok(Value::Template(Template::new()));
        }
        let attrs = unsafe {
            std::slice::from_raw_parts(
                attr.pValue as *const CK_ATTRIBUTE,
                usize::try_from(attr.ulValueLen)?,
            )
        };
        Ok(Value::Template(Template::disassemble(attrs)?))
    }
}

pub static ULONG_TRANSFORM: UlongTransform = UlongTransform;
pub static BOOL_TRANSFORM: BoolTransform = BoolTransform;
pub static CHAR_TRANSFORM: CharTransform = CharTransform;
pub static DATE_TRANSFORM: DateTransform = DateTransform;
pub static BYTES_TRANSFORM: BytesTransform = BytesTransform;
pub static TEMPLATE_TRANSFORM: TemplateTransform = TemplateTransform;

/// Transform used for attribute types missing from the registry
pub static DEFAULT_TRANSFORM: &dyn Transform = &BYTES_TRANSFORM;

/// Maps a PKCS#11 attribute type to its codec and a printable name
struct TransformMap {
    id: CK_ATTRIBUTE_TYPE,
    name: &'static str,
    transform: &'static dyn Transform,
}

/// Helper macro to populate the static transform map
macro_rules! transform_element {
    ($id:expr; as $transform:ident) => {
        TransformMap {
            id: $id,
            name: stringify!($id),
            transform: &$transform,
        }
    };
}

/// The registry, one entry per known attribute type.
/// Must be kept sorted by id, lookups use a binary search.
static TRANSFORM_MAP: [TransformMap; 58] = [
    transform_element!(CKA_CLASS; as ULONG_TRANSFORM),
    transform_element!(CKA_TOKEN; as BOOL_TRANSFORM),
    transform_element!(CKA_PRIVATE; as BOOL_TRANSFORM),
    transform_element!(CKA_LABEL; as CHAR_TRANSFORM),
    transform_element!(CKA_APPLICATION; as CHAR_TRANSFORM),
    transform_element!(CKA_VALUE; as BYTES_TRANSFORM),
    transform_element!(CKA_CERTIFICATE_TYPE; as ULONG_TRANSFORM),
    transform_element!(CKA_ISSUER; as CHAR_TRANSFORM),
    transform_element!(CKA_SERIAL_NUMBER; as BYTES_TRANSFORM),
    transform_element!(CKA_KEY_TYPE; as ULONG_TRANSFORM),
    transform_element!(CKA_SUBJECT; as CHAR_TRANSFORM),
    transform_element!(CKA_ID; as CHAR_TRANSFORM),
    transform_element!(CKA_SENSITIVE; as BOOL_TRANSFORM),
    transform_element!(CKA_ENCRYPT; as BOOL_TRANSFORM),
    transform_element!(CKA_DECRYPT; as BOOL_TRANSFORM),
    transform_element!(CKA_WRAP; as BOOL_TRANSFORM),
    transform_element!(CKA_UNWRAP; as BOOL_TRANSFORM),
    transform_element!(CKA_SIGN; as BOOL_TRANSFORM),
    transform_element!(CKA_SIGN_RECOVER; as BOOL_TRANSFORM),
    transform_element!(CKA_VERIFY; as BOOL_TRANSFORM),
    transform_element!(CKA_VERIFY_RECOVER; as BOOL_TRANSFORM),
    transform_element!(CKA_DERIVE; as BOOL_TRANSFORM),
    transform_element!(CKA_START_DATE; as DATE_TRANSFORM),
    transform_element!(CKA_END_DATE; as DATE_TRANSFORM),
    transform_element!(CKA_MODULUS; as BYTES_TRANSFORM),
    transform_element!(CKA_MODULUS_BITS; as ULONG_TRANSFORM),
    transform_element!(CKA_PUBLIC_EXPONENT; as BYTES_TRANSFORM),
    transform_element!(CKA_PRIVATE_EXPONENT; as BYTES_TRANSFORM),
    transform_element!(CKA_PRIME_1; as BYTES_TRANSFORM),
    transform_element!(CKA_PRIME_2; as BYTES_TRANSFORM),
    transform_element!(CKA_EXPONENT_1; as BYTES_TRANSFORM),
    transform_element!(CKA_EXPONENT_2; as BYTES_TRANSFORM),
    transform_element!(CKA_COEFFICIENT; as BYTES_TRANSFORM),
    transform_element!(CKA_PRIME; as BYTES_TRANSFORM),
    transform_element!(CKA_SUBPRIME; as BYTES_TRANSFORM),
    transform_element!(CKA_BASE; as BYTES_TRANSFORM),
    transform_element!(CKA_PRIME_BITS; as ULONG_TRANSFORM),
    transform_element!(CKA_SUBPRIME_BITS; as ULONG_TRANSFORM),
    transform_element!(CKA_VALUE_BITS; as ULONG_TRANSFORM),
    transform_element!(CKA_VALUE_LEN; as ULONG_TRANSFORM),
    transform_element!(CKA_EXTRACTABLE; as BOOL_TRANSFORM),
    transform_element!(CKA_LOCAL; as BOOL_TRANSFORM),
    transform_element!(CKA_NEVER_EXTRACTABLE; as BOOL_TRANSFORM),
    transform_element!(CKA_ALWAYS_SENSITIVE; as BOOL_TRANSFORM),
    transform_element!(CKA_MODIFIABLE; as BOOL_TRANSFORM),
    transform_element!(CKA_UNWRAP_TEMPLATE; as TEMPLATE_TRANSFORM),
    transform_element!(CKA_DERIVE_TEMPLATE; as TEMPLATE_TRANSFORM),
    /* Vendor defined attributes */
    transform_element!(CKA_CCM_PRIVATE; as BOOL_TRANSFORM),
    transform_element!(CKA_X9_31_GENERATED; as BOOL_TRANSFORM),
    transform_element!(CKA_OUID; as BYTES_TRANSFORM),
    transform_element!(CKA_FINGERPRINT_SHA1; as BYTES_TRANSFORM),
    transform_element!(CKA_FINGERPRINT_SHA256; as BYTES_TRANSFORM),
    transform_element!(CKA_USAGE_COUNT; as BYTES_TRANSFORM),
    transform_element!(CKA_USAGE_LIMIT; as BYTES_TRANSFORM),
    transform_element!(CKA_EKM_UID; as CHAR_TRANSFORM),
    transform_element!(CKA_GENERIC_1; as CHAR_TRANSFORM),
    transform_element!(CKA_GENERIC_2; as CHAR_TRANSFORM),
    transform_element!(CKA_GENERIC_3; as CHAR_TRANSFORM),
];

/// Returns the registered transform for an attribute type, None when
/// the type is unknown (callers decide whether to fall back to
/// [DEFAULT_TRANSFORM])
pub fn lookup(id: CK_ATTRIBUTE_TYPE) -> Option<&'static dyn Transform> {
    match TRANSFORM_MAP.binary_search_by_key(&id, |e| e.id) {
        Ok(i) => Some(TRANSFORM_MAP[i].transform),
        Err(_) => None,
    }
}

/// Returns the printable name of an attribute type, or its numeric id
/// when unknown
pub fn attr_name(id: CK_ATTRIBUTE_TYPE) -> String {
    match TRANSFORM_MAP.binary_search_by_key(&id, |e| e.id) {
        Ok(i) => TRANSFORM_MAP[i].name.to_string(),
        Err(_) => id.to_string(),
    }
}

/// Finds an attribute type and its transform by printable name
#[allow(dead_code)]
pub fn find_by_name(
    name: &str,
) -> Option<(CK_ATTRIBUTE_TYPE, &'static dyn Transform)> {
    for e in &TRANSFORM_MAP {
        if e.name == name {
            return Some((e.id, e.transform));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::misc::CK_ULONG_SIZE;
    use crate::sizeof;

    macro_rules! make_attribute {
        ($type:expr, $value:expr, $length:expr) => {
            CK_ATTRIBUTE {
                type_: $type,
                pValue: $value as CK_VOID_PTR,
                ulValueLen: $length as CK_ULONG,
            }
        };
    }

    #[test]
    fn check_order_of_transform_map() {
        for w in TRANSFORM_MAP.windows(2) {
            assert!(
                w[0].id < w[1].id,
                "entry {} out of order",
                w[1].name
            );
        }
    }

    #[test]
    fn lookup_known_and_unknown() {
        assert!(lookup(CKA_CLASS).is_some());
        assert!(lookup(CKA_UNWRAP_TEMPLATE).is_some());
        assert!(lookup(0x0000007f).is_none());
        assert_eq!(attr_name(CKA_LABEL), "CKA_LABEL");
        assert_eq!(attr_name(0x7f), "127");
        let (id, _) = find_by_name("CKA_MODULUS").unwrap();
        assert_eq!(id, CKA_MODULUS);
    }

    #[test]
    fn ulong_roundtrip() {
        let enc = ULONG_TRANSFORM.encode(&Value::Ulong(3)).unwrap();
        assert_eq!(enc.len(), sizeof!(CK_ULONG));
        let attr =
            make_attribute!(CKA_CLASS, enc.as_void_ptr(), enc.len());
        assert_eq!(
            ULONG_TRANSFORM.decode(&attr).unwrap(),
            Value::Ulong(3)
        );
    }

    #[test]
    fn ulong_rejects_wrong_types() {
        for v in [
            Value::Bool(true),
            Value::Text("3".to_string()),
            Value::Bytes(vec![3]),
        ] {
            assert!(ULONG_TRANSFORM.encode(&v).is_err());
        }
    }

    #[test]
    fn ulong_accepts_fitting_bignum() {
        let enc = ULONG_TRANSFORM
            .encode(&Value::Bignum(BigUint::from(7u32)))
            .unwrap();
        assert_eq!(enc.as_bytes().unwrap(), &(7 as CK_ULONG).to_ne_bytes());

        let big = BigUint::from(1u8) << 200;
        assert!(ULONG_TRANSFORM.encode(&Value::Bignum(big)).is_err());
    }

    #[test]
    fn bool_normalization() {
        let t = BOOL_TRANSFORM.encode(&Value::Bool(true)).unwrap();
        let five = BOOL_TRANSFORM.encode(&Value::Ulong(5)).unwrap();
        assert_eq!(t.as_bytes(), five.as_bytes());
        assert_eq!(t.as_bytes().unwrap(), &[CK_TRUE]);

        let f = BOOL_TRANSFORM.encode(&Value::Bool(false)).unwrap();
        let zero = BOOL_TRANSFORM.encode(&Value::Ulong(0)).unwrap();
        assert_eq!(f.as_bytes(), zero.as_bytes());
        assert_eq!(f.as_bytes().unwrap(), &[CK_FALSE]);

        assert!(BOOL_TRANSFORM
            .encode(&Value::Text("yes".to_string()))
            .is_err());
    }

    #[test]
    fn char_terminator_not_counted() {
        let enc = CHAR_TRANSFORM.encode(&Value::from("mykey")).unwrap();
        assert_eq!(enc.len(), 5);
        assert_eq!(enc.as_bytes().unwrap(), b"mykey\0");

        let attr = make_attribute!(CKA_LABEL, enc.as_void_ptr(), enc.len());
        assert_eq!(
            CHAR_TRANSFORM.decode(&attr).unwrap(),
            Value::from("mykey")
        );
    }

    #[test]
    fn char_decode_ignores_missing_terminator() {
        /* a buffer with no NUL at all, only the length counts */
        let buf = b"label!";
        let attr = make_attribute!(CKA_LABEL, buf.as_ptr(), buf.len());
        assert_eq!(
            CHAR_TRANSFORM.decode(&attr).unwrap(),
            Value::from("label!")
        );
    }

    #[test]
    fn date_validation() {
        assert!(DATE_TRANSFORM.encode(&Value::from("2024010")).is_err());
        assert!(DATE_TRANSFORM.encode(&Value::Ulong(20240101)).is_err());

        let enc = DATE_TRANSFORM.encode(&Value::from("20240101")).unwrap();
        assert_eq!(enc.len(), 8);
        assert_eq!(enc.as_bytes().unwrap(), b"20240101");

        let d = Value::date("2024", "01", "01").unwrap();
        let enc2 = DATE_TRANSFORM.encode(&d).unwrap();
        assert_eq!(enc.as_bytes(), enc2.as_bytes());
    }

    #[test]
    fn bytes_bit_width_rounding() {
        let one = BYTES_TRANSFORM.encode(&Value::Ulong(255)).unwrap();
        assert_eq!(one.as_bytes().unwrap(), &[0xff]);

        let two = BYTES_TRANSFORM.encode(&Value::Ulong(256)).unwrap();
        assert_eq!(two.as_bytes().unwrap(), &[0x01, 0x00]);

        let zero = BYTES_TRANSFORM.encode(&Value::Ulong(0)).unwrap();
        assert_eq!(zero.as_bytes().unwrap(), &[0x00]);

        let big = BYTES_TRANSFORM
            .encode(&Value::Bignum(BigUint::from(0x010203u32)))
            .unwrap();
        assert_eq!(big.as_bytes().unwrap(), &[0x01, 0x02, 0x03]);
    }

    #[test]
    fn bytes_hex_and_list_equivalence() {
        let hex = BYTES_TRANSFORM.encode(&Value::from("0a")).unwrap();
        let list = BYTES_TRANSFORM.encode(&Value::Bytes(vec![10])).unwrap();
        assert_eq!(hex.as_bytes(), list.as_bytes());
        assert_eq!(hex.len(), list.len());
    }

    #[test]
    fn bytes_odd_hex_string() {
        let enc = BYTES_TRANSFORM.encode(&Value::from("abc")).unwrap();
        assert_eq!(enc.as_bytes().unwrap(), &[0xab, 0x0c]);
    }

    #[test]
    fn bytes_raw_text_fallback() {
        let enc = BYTES_TRANSFORM.encode(&Value::from("zz raw")).unwrap();
        assert_eq!(enc.as_bytes().unwrap(), b"zz raw");

        /* whitespace is not hex */
        let sp = BYTES_TRANSFORM.encode(&Value::from("  ")).unwrap();
        assert_eq!(sp.as_bytes().unwrap(), b"  ");
    }

    #[test]
    fn bytes_decode_returns_raw() {
        let buf = [0x0au8, 0x0b];
        let attr = make_attribute!(CKA_MODULUS, buf.as_ptr(), buf.len());
        assert_eq!(
            BYTES_TRANSFORM.decode(&attr).unwrap(),
            Value::Bytes(vec![0x0a, 0x0b])
        );
    }

    #[test]
    fn bytes_rejects_wrong_types() {
        assert!(BYTES_TRANSFORM.encode(&Value::Bool(true)).is_err());
        assert!(BYTES_TRANSFORM.encode(&Value::Absent).is_err());
    }

    #[test]
    fn native_types() {
        assert_eq!(ULONG_TRANSFORM.native_type(), NativeType::Ulong);
        assert_eq!(ULONG_TRANSFORM.native_type().size(), CK_ULONG_SIZE);
        assert_eq!(BOOL_TRANSFORM.native_type().size(), 1);
        assert_eq!(BYTES_TRANSFORM.native_type(), NativeType::Byte);
        assert_eq!(DATE_TRANSFORM.native_type(), NativeType::Char);
        assert_eq!(
            TEMPLATE_TRANSFORM.native_type().size(),
            std::mem::size_of::<CK_ATTRIBUTE>()
        );
    }
}

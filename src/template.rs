// Copyright 2025 Simo Sorce
// See LICENSE.txt file for terms

//! Attribute templates and their binary record form
//!
//! A [Template] is the host-side, insertion-ordered mapping of
//! attribute type to [Value]. [Template::assemble] marshals it into an
//! [AttrArray], the `CK_ATTRIBUTE` array shape native get/set
//! attribute entry points consume; [Template::disassemble] rebuilds a
//! template from an array a module filled in.

use std::fmt;

use log::warn;

use crate::error::{Error, Result};
use crate::misc::zeromem;
use crate::pkcs11::*;
use crate::transform::{attr_name, lookup, Transform, DEFAULT_TRANSFORM};
use crate::value::Value;
use crate::void_ptr;

/// The owned result of one value encoding
///
/// Holds the backing buffer an attribute record points into, so its
/// lifetime bounds the validity of that record. The reported length is
/// a byte count for scalar encodings and a record count for nested
/// template encodings.
#[derive(Debug)]
pub struct Encoded {
    data: EncodedData,
    len: CK_ULONG,
}

#[derive(Debug)]
enum EncodedData {
    Bytes(Vec<u8>),
    Records(AttrArray),
}

impl Encoded {
    /// Wraps an owned buffer, reporting its full length
    pub fn bytes(buf: Vec<u8>) -> Result<Encoded> {
        let len = CK_ULONG::try_from(buf.len())?;
        Ok(Encoded {
            data: EncodedData::Bytes(buf),
            len: len,
        })
    }

    /// Wraps an owned buffer with an explicit reported length, for
    /// encodings whose buffer carries bytes the length field must not
    /// count (the character codec's terminator)
    pub fn bytes_with_len(buf: Vec<u8>, len: CK_ULONG) -> Encoded {
        Encoded {
            data: EncodedData::Bytes(buf),
            len: len,
        }
    }

    /// Wraps a nested record array, reporting its record count
    pub fn records(attrs: AttrArray) -> Result<Encoded> {
        let len = CK_ULONG::try_from(attrs.len())?;
        Ok(Encoded {
            data: EncodedData::Records(attrs),
            len: len,
        })
    }

    /// The length to store in the attribute record
    pub fn len(&self) -> CK_ULONG {
        self.len
    }

    /// Pointer to the encoded data, valid for as long as this object
    /// is alive
    pub fn as_void_ptr(&self) -> CK_VOID_PTR {
        match &self.data {
            EncodedData::Bytes(v) => void_ptr!(v.as_ptr()),
            EncodedData::Records(a) => void_ptr!(a.as_ptr()),
        }
    }

    /// The raw encoded bytes, None for nested record encodings
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.data {
            EncodedData::Bytes(v) => Some(v.as_slice()),
            EncodedData::Records(_) => None,
        }
    }
}

/// An owned array of CK_ATTRIBUTE records together with the buffers
/// their value pointers reference
///
/// The array must outlive any native call reading from it; dropping it
/// releases every buffer exactly once. Setting `zeroize` clears all
/// owned buffers on drop, key material routinely flows through them.
#[derive(Debug)]
pub struct AttrArray {
    /// Backing storage for the record values
    v: Vec<Encoded>,
    /// The actual CK_ATTRIBUTE array handed to native calls
    p: Vec<CK_ATTRIBUTE>,
    /// When set, owned buffers are cleared before release
    pub zeroize: bool,
}

impl Drop for AttrArray {
    fn drop(&mut self) {
        if self.zeroize {
            while let Some(mut e) = self.v.pop() {
                match &mut e.data {
                    EncodedData::Bytes(b) => zeromem(b.as_mut_slice()),
                    EncodedData::Records(a) => a.zeroize = true,
                }
            }
        }
    }
}

impl AttrArray {
    /// Creates an empty array
    pub fn new() -> AttrArray {
        Self::with_capacity(0)
    }

    /// Creates an empty array with the specified capacity
    pub fn with_capacity(capacity: usize) -> AttrArray {
        AttrArray {
            v: Vec::with_capacity(capacity),
            p: Vec::with_capacity(capacity),
            zeroize: false,
        }
    }

    /// Appends a record pointing at an encoded value, taking
    /// ownership of its buffer
    pub fn push_encoded(&mut self, typ: CK_ATTRIBUTE_TYPE, enc: Encoded) {
        let attr = CK_ATTRIBUTE {
            type_: typ,
            pValue: enc.as_void_ptr(),
            ulValueLen: enc.len(),
        };
        self.v.push(enc);
        self.p.push(attr);
    }

    /// Appends a size-query record: null pointer, zero length. The
    /// native side fills in the required size on the first pass of a
    /// get-attribute call.
    pub fn push_absent(&mut self, typ: CK_ATTRIBUTE_TYPE) {
        self.p.push(CK_ATTRIBUTE {
            type_: typ,
            pValue: std::ptr::null_mut(),
            ulValueLen: 0,
        });
    }

    /// Allocates zeroed buffers for records still carrying a null
    /// pointer after a size-query pass, using the lengths the module
    /// reported. Records whose length is zero or
    /// CK_UNAVAILABLE_INFORMATION are left untouched.
    pub fn allocate_missing(&mut self) -> Result<()> {
        for i in 0..self.p.len() {
            let attr = self.p[i];
            if !attr.pValue.is_null()
                || attr.ulValueLen == 0
                || attr.ulValueLen == CK_UNAVAILABLE_INFORMATION
            {
                continue;
            }
            let enc =
                Encoded::bytes(vec![0u8; usize::try_from(attr.ulValueLen)?])?;
            self.p[i].pValue = enc.as_void_ptr();
            self.v.push(enc);
        }
        Ok(())
    }

    /// Returns the number of records
    pub fn len(&self) -> usize {
        self.p.len()
    }

    /// True when the array holds no records
    pub fn is_empty(&self) -> bool {
        self.p.is_empty()
    }

    /// Returns a pointer to the CK_ATTRIBUTE array
    pub fn as_ptr(&self) -> *const CK_ATTRIBUTE {
        self.p.as_ptr()
    }

    /// Returns a mutable pointer to the CK_ATTRIBUTE array, for calls
    /// that write lengths back
    pub fn as_mut_ptr(&mut self) -> *mut CK_ATTRIBUTE {
        self.p.as_mut_ptr()
    }

    /// Returns the records as a slice
    pub fn as_slice(&self) -> &[CK_ATTRIBUTE] {
        self.p.as_slice()
    }

    /// Finds a record by attribute type
    pub fn find_attr(&self, typ: CK_ATTRIBUTE_TYPE) -> Option<&CK_ATTRIBUTE> {
        self.p.iter().find(|a| a.type_ == typ)
    }
}

/// An insertion-ordered attribute type to value mapping
///
/// Entry order is preserved through assembly for reproducible record
/// layout. A template can carry per-instance transform overrides that
/// take precedence over the registry when assembling; they are never
/// consulted when disassembling.
#[derive(Clone, Default)]
pub struct Template {
    entries: Vec<(CK_ATTRIBUTE_TYPE, Value)>,
    overrides: Vec<(CK_ATTRIBUTE_TYPE, &'static dyn Transform)>,
}

impl PartialEq for Template {
    /* overrides are marshalling machinery, not content */
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(t, v)| (attr_name(*t), v)))
            .finish()
    }
}

impl Template {
    /// Creates an empty template
    pub fn new() -> Template {
        Template {
            entries: Vec::new(),
            overrides: Vec::new(),
        }
    }

    /// Sets an attribute value. A value already present for the same
    /// attribute type is replaced in place, keeping its position.
    pub fn set(&mut self, typ: CK_ATTRIBUTE_TYPE, val: Value) {
        match self.entries.iter().position(|(t, _)| *t == typ) {
            Some(idx) => self.entries[idx] = (typ, val),
            None => self.entries.push((typ, val)),
        }
    }

    /// Returns the value set for an attribute type, if any
    pub fn get(&self, typ: CK_ATTRIBUTE_TYPE) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(t, _)| *t == typ)
            .map(|(_, v)| v)
    }

    /// Registers a transform for an attribute type on this template
    /// only, preferred over the registry during assembly
    pub fn set_transform(
        &mut self,
        typ: CK_ATTRIBUTE_TYPE,
        transform: &'static dyn Transform,
    ) {
        match self.overrides.iter().position(|(t, _)| *t == typ) {
            Some(idx) => self.overrides[idx] = (typ, transform),
            None => self.overrides.push((typ, transform)),
        }
    }

    /// Number of attribute entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no attribute is set
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, (CK_ATTRIBUTE_TYPE, Value)> {
        self.entries.iter()
    }

    fn find_override(
        &self,
        typ: CK_ATTRIBUTE_TYPE,
    ) -> Option<&'static dyn Transform> {
        self.overrides
            .iter()
            .find(|(t, _)| *t == typ)
            .map(|(_, tr)| *tr)
    }

    /// Marshals the template into an attribute record array.
    ///
    /// Entries are emitted in insertion order. Absent values become
    /// size-query records. Attribute types missing from the registry
    /// are encoded with the default byte-array transform and a
    /// warning is logged.
    pub fn assemble(&self) -> Result<AttrArray> {
        let mut arr = AttrArray::with_capacity(self.entries.len());
        for (typ, val) in &self.entries {
            if let Value::Absent = val {
                arr.push_absent(*typ);
                continue;
            }
            let transform = match self.find_override(*typ) {
                Some(t) => t,
                None => match lookup(*typ) {
                    Some(t) => t,
                    None => {
                        warn!(
                            "using default byte-array transform for \
                             attribute {} and data {:?}",
                            attr_name(*typ),
                            val
                        );
                        DEFAULT_TRANSFORM
                    }
                },
            };
            arr.push_encoded(*typ, transform.encode(val)?);
        }
        Ok(arr)
    }

    /// Rebuilds a template from an attribute record array.
    ///
    /// Records with a null value pointer, or whose length is
    /// CK_UNAVAILABLE_INFORMATION, become absent values. Unknown
    /// attribute types decode through the default byte-array
    /// transform.
    pub fn disassemble(attrs: &[CK_ATTRIBUTE]) -> Result<Template> {
        let mut tmpl = Template::new();
        for attr in attrs {
            if attr.pValue.is_null()
                || attr.ulValueLen == CK_UNAVAILABLE_INFORMATION
            {
                tmpl.set(attr.type_, Value::Absent);
                continue;
            }
            let transform = lookup(attr.type_).unwrap_or(DEFAULT_TRANSFORM);
            tmpl.set(attr.type_, transform.decode(attr)?);
        }
        Ok(tmpl)
    }

    /// Rebuilds a template from a raw pointer to a list of
    /// CK_ATTRIBUTE elements in memory and a size "l"
    pub fn from_ptr(a: CK_ATTRIBUTE_PTR, l: CK_ULONG) -> Result<Template> {
        if a.is_null() {
            return Err(Error::type_conversion(
                "null attribute array".to_string(),
            ));
        }
        let attrs =
            unsafe { std::slice::from_raw_parts(a, usize::try_from(l)?) };
        Template::disassemble(attrs)
    }
}

impl FromIterator<(CK_ATTRIBUTE_TYPE, Value)> for Template {
    fn from_iter<I: IntoIterator<Item = (CK_ATTRIBUTE_TYPE, Value)>>(
        iter: I,
    ) -> Template {
        let mut tmpl = Template::new();
        for (typ, val) in iter {
            tmpl.set(typ, val);
        }
        tmpl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_and_replace() {
        let mut tmpl = Template::new();
        tmpl.set(CKA_TOKEN, Value::Bool(true));
        tmpl.set(CKA_CLASS, Value::Ulong(CKO_SECRET_KEY));
        tmpl.set(CKA_TOKEN, Value::Bool(false));

        let types: Vec<CK_ATTRIBUTE_TYPE> =
            tmpl.iter().map(|(t, _)| *t).collect();
        assert_eq!(types, vec![CKA_TOKEN, CKA_CLASS]);
        assert_eq!(tmpl.get(CKA_TOKEN), Some(&Value::Bool(false)));
    }

    #[test]
    fn absent_value_yields_null_record() {
        let mut tmpl = Template::new();
        tmpl.set(CKA_MODULUS, Value::Absent);
        let arr = tmpl.assemble().unwrap();
        assert_eq!(arr.len(), 1);
        let attr = &arr.as_slice()[0];
        assert!(attr.pValue.is_null());
        assert_eq!(attr.ulValueLen, 0);

        let back = Template::disassemble(arr.as_slice()).unwrap();
        assert_eq!(back.get(CKA_MODULUS), Some(&Value::Absent));
    }

    #[test]
    fn allocate_missing_after_size_query() {
        let mut tmpl = Template::new();
        tmpl.set(CKA_ID, Value::Absent);
        tmpl.set(CKA_TOKEN, Value::Bool(true));
        let mut arr = tmpl.assemble().unwrap();

        /* simulate the module reporting a required size */
        unsafe {
            (*arr.as_mut_ptr()).ulValueLen = 4;
        }
        arr.allocate_missing().unwrap();

        let attr = arr.find_attr(CKA_ID).unwrap();
        assert!(!attr.pValue.is_null());
        assert_eq!(attr.ulValueLen, 4);

        /* simulate the module filling the buffer on the second pass */
        unsafe {
            std::ptr::copy_nonoverlapping(
                b"abcd".as_ptr(),
                attr.pValue as *mut u8,
                4,
            );
        }
        let back = Template::disassemble(arr.as_slice()).unwrap();
        assert_eq!(back.get(CKA_ID), Some(&Value::from("abcd")));
    }

    #[test]
    fn unavailable_length_is_absent() {
        let attr = CK_ATTRIBUTE {
            type_: CKA_VALUE,
            pValue: std::ptr::null_mut(),
            ulValueLen: CK_UNAVAILABLE_INFORMATION,
        };
        let tmpl = Template::disassemble(&[attr]).unwrap();
        assert_eq!(tmpl.get(CKA_VALUE), Some(&Value::Absent));
    }

    #[test]
    fn from_ptr_rejects_null() {
        assert!(Template::from_ptr(std::ptr::null_mut(), 3).is_err());
    }

    #[test]
    fn override_applies_on_assemble_only() {
        use crate::transform::CHAR_TRANSFORM;

        /* marshal a normally-bytes attribute as text */
        let mut tmpl = Template::new();
        tmpl.set(CKA_VALUE, Value::from("abc"));
        tmpl.set_transform(CKA_VALUE, &CHAR_TRANSFORM);
        let arr = tmpl.assemble().unwrap();
        let attr = arr.find_attr(CKA_VALUE).unwrap();
        assert_eq!(attr.ulValueLen, 3);

        /* the reverse direction ignores overrides and uses the
         * registry, which says CKA_VALUE is a byte array */
        let back = Template::disassemble(arr.as_slice()).unwrap();
        assert_eq!(back.get(CKA_VALUE), Some(&Value::Bytes(b"abc".to_vec())));
    }

    #[test]
    fn zeroize_on_drop() {
        let mut tmpl = Template::new();
        tmpl.set(CKA_VALUE, Value::Bytes(vec![0xaa; 8]));
        let mut arr = tmpl.assemble().unwrap();
        arr.zeroize = true;
        /* freed memory cannot be inspected safely, this only
         * exercises the drop path */
        drop(arr);
    }
}

// Copyright 2025 Simo Sorce
// See LICENSE.txt file for terms

//! PKCS#11 API Vendor extensions
//!
//! Vendor modules define these attributes in their own headers; the
//! numeric values below are allocated from this crate's vendor range
//! and must be remapped when talking to a module that uses different
//! ones.

use crate::pkcs11::{CK_ATTRIBUTE_TYPE, CKA_VENDOR_DEFINED};

pub const CKV_VENDOR_OFFSET: CK_ATTRIBUTE_TYPE = CKA_VENDOR_DEFINED + 0x1100;

/* Attributes */
pub const CKA_CCM_PRIVATE: CK_ATTRIBUTE_TYPE = CKV_VENDOR_OFFSET + 1;
pub const CKA_X9_31_GENERATED: CK_ATTRIBUTE_TYPE = CKV_VENDOR_OFFSET + 2;
pub const CKA_OUID: CK_ATTRIBUTE_TYPE = CKV_VENDOR_OFFSET + 3;
pub const CKA_FINGERPRINT_SHA1: CK_ATTRIBUTE_TYPE = CKV_VENDOR_OFFSET + 4;
pub const CKA_FINGERPRINT_SHA256: CK_ATTRIBUTE_TYPE = CKV_VENDOR_OFFSET + 5;
pub const CKA_USAGE_COUNT: CK_ATTRIBUTE_TYPE = CKV_VENDOR_OFFSET + 6;
pub const CKA_USAGE_LIMIT: CK_ATTRIBUTE_TYPE = CKV_VENDOR_OFFSET + 7;
pub const CKA_EKM_UID: CK_ATTRIBUTE_TYPE = CKV_VENDOR_OFFSET + 8;
pub const CKA_GENERIC_1: CK_ATTRIBUTE_TYPE = CKV_VENDOR_OFFSET + 9;
pub const CKA_GENERIC_2: CK_ATTRIBUTE_TYPE = CKV_VENDOR_OFFSET + 10;
pub const CKA_GENERIC_3: CK_ATTRIBUTE_TYPE = CKV_VENDOR_OFFSET + 11;

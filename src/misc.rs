// Copyright 2025 Simo Sorce
// See LICENSE.txt file for terms

//! misc utilities that do not really belong in any module

/// Size in bytes of the native CK_ULONG type
pub const CK_ULONG_SIZE: usize =
    std::mem::size_of::<crate::pkcs11::CK_ULONG>();

/// Copies a raw (pointer, length) pair into an owned vector of bytes.
/// A null pointer or a zero length yield an empty vector.
#[macro_export]
macro_rules! bytes_to_vec {
    ($ptr:expr, $len:expr) => {{
        let ptr = $ptr as *const u8;
        let size = usize::try_from($len)?;
        if ptr.is_null() || size == 0 {
            Vec::new()
        } else {
            let mut v = Vec::<u8>::with_capacity(size);
            unsafe {
                std::ptr::copy_nonoverlapping(ptr, v.as_mut_ptr(), size);
                v.set_len(size);
            }
            v
        }
    }};
}

/// Casts any reference to a CK_VOID_PTR
#[macro_export]
macro_rules! void_ptr {
    ($ptr:expr) => {
        $ptr as *const _ as $crate::pkcs11::CK_VOID_PTR
    };
}

/// Returns the size of a type as a CK_ULONG
#[macro_export]
macro_rules! sizeof {
    ($type:ty) => {
        $crate::pkcs11::CK_ULONG::try_from(std::mem::size_of::<$type>())
            .unwrap()
    };
}

/// Zeroizes a buffer; the writes are volatile so they are not elided
/// even when the buffer is freed right after.
pub fn zeromem(mem: &mut [u8]) {
    for b in mem.iter_mut() {
        unsafe {
            std::ptr::write_volatile(b, 0);
        }
    }
}

/// Formats a byte buffer as a lowercase hex string, two digits per
/// byte, no separators.
pub fn to_hex(val: &[u8]) -> String {
    hex::encode(val)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_display() {
        assert_eq!(to_hex(&[0x00, 0x0a, 0xff]), "000aff");
        assert_eq!(to_hex(&[]), "");
    }

    #[test]
    fn zeromem_clears() {
        let mut buf = vec![0xaau8; 16];
        zeromem(buf.as_mut_slice());
        assert_eq!(buf, vec![0u8; 16]);
    }
}

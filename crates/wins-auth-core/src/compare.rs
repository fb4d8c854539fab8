//! Constant-time equality for secrets and MACs.

use subtle::ConstantTimeEq;

/// Compare two byte strings without exiting early on the first mismatch.
///
/// Length is compared in constant time as well; inputs of different length
/// are padded with distinct fill bytes so the content comparison still
/// walks the longer input.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let max_len = a.len().max(b.len());

    let mut a_padded = vec![0u8; max_len];
    let mut b_padded = vec![0xFFu8; max_len];
    a_padded[..a.len()].copy_from_slice(a);
    b_padded[..b.len()].copy_from_slice(b);

    let lengths_equal = (a.len() as u64).ct_eq(&(b.len() as u64));
    let contents_equal = a_padded.ct_eq(&b_padded);

    (lengths_equal & contents_equal).into()
}

/// String form of [`constant_time_eq`].
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    constant_time_eq(a.as_bytes(), b.as_bytes())
}

//! Bucket placement hash
//!
//! Samples three bytes (first, middle, last) plus the byte length, so the
//! cost does not depend on the string length. Collisions are expected and
//! resolved by the bucket scan; the hash is never used for equality.

/// Hash `content` for bucket placement
///
/// ```rust
/// assert_eq!(interned::hash(""), 0);
/// assert_eq!(interned::hash("x"), interned::hash("x"));
/// ```
#[must_use]
#[inline]
pub const fn hash(content: &str) -> u32 {
    let bytes = content.as_bytes();
    let len = bytes.len();
    if len == 0 {
        return 0;
    }

    let first = mix_byte(bytes[0]);
    let middle = mix_byte(bytes[len / 2]);
    let last = mix_byte(bytes[len - 1]);

    let mut h = first;
    h = h.rotate_left(11) ^ middle;
    h = h.rotate_left(11) ^ last;
    finish(h ^ mix_len(len))
}

#[inline(always)]
const fn mix_byte(b: u8) -> u32 {
    let c = b as u32;
    let inv = !c;
    (inv << 16) ^ (c << 5) ^ (inv >> 3) ^ c
}

#[inline(always)]
const fn mix_len(len: usize) -> u32 {
    // Fold the upper half on 64-bit targets
    let wide = len as u64;
    let folded = (wide ^ (wide >> 32)) as u32;
    (folded << 7) ^ (folded >> 2) ^ folded.wrapping_mul(0x9E37_79B9)
}

/// Avalanche so that the low bits used by `% bucket_count` depend on every
/// sampled byte
#[inline(always)]
const fn finish(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x7FEB_352D);
    h ^= h >> 15;
    h = h.wrapping_mul(0x846C_A68B);
    h ^ (h >> 16)
}

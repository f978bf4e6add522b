//! Deterministic hash helpers for guest dict keys and the `hash` built-in.
//!
//! Hashing is deterministic (equivalent to a zeroed hash seed) so programs
//! behave identically across runs. Numeric types hash modulo the Mersenne
//! prime `2^61 - 1` so that equal values across int/float/bool produce the
//! same hash; text hashes with SipHash-1-3 and a zero key.

use num_bigint::BigInt;
use num_traits::{FromPrimitive, Signed, ToPrimitive, Zero};

/// Mersenne prime used for numeric hashing: `2^61 - 1`.
///
/// All numeric values hash modulo this prime so that equal values across
/// types produce identical hashes (`hash(1) == hash(1.0) == hash(True)`).
const MODULUS: i64 = (1 << 61) - 1;

/// Hashes an arbitrary-precision integer.
///
/// The algorithm is `n % MODULUS` with the sign preserved, and a result of
/// `-1` remapped to `-2` (`-1` is reserved as an error sentinel by the
/// reference implementation this mirrors).
#[must_use]
pub(crate) fn hash_int(value: &BigInt) -> i64 {
    if value.is_zero() {
        return 0;
    }
    let modulus = BigInt::from(MODULUS);
    let remainder = (value.abs() % modulus).to_i64().expect("remainder fits i64");
    let result = if value.is_negative() { -remainder } else { remainder };
    if result == -1 { -2 } else { result }
}

/// Hashes an `f64` consistently with [`hash_int`].
///
/// Integral floats delegate to the integer path so `hash(n) == hash(float(n))`
/// holds. Non-integral floats use a frexp-based decomposition accumulated
/// modulo [`MODULUS`].
///
/// Special values: `+inf` hashes to `314159`, `-inf` to `-314159`, NaN to `0`.
#[must_use]
pub(crate) fn hash_float(value: f64) -> i64 {
    if value.is_infinite() {
        return if value > 0.0 { 314_159 } else { -314_159 };
    }
    if value.is_nan() {
        return 0;
    }

    // Integral floats take the integer path for cross-type consistency.
    if value.trunc() == value
        && let Some(int) = BigInt::from_f64(value)
    {
        return hash_int(&int);
    }

    let (frac, exp) = frexp(value);
    let mut m = frac;
    let mut e = exp;

    let sign: i64 = if m < 0.0 {
        m = -m;
        -1
    } else {
        1
    };

    // Fold the mantissa in 28-bit chunks.
    let mut x: u64 = 0;
    while m > 0.0 {
        x = ((x << 28) & (MODULUS as u64)) | (x >> 33);
        m *= 268_435_456.0; // 2^28
        e -= 28;
        let w = m as u64;
        m -= w as f64;
        x = x.wrapping_add(w);
        if x >= MODULUS as u64 {
            x -= MODULUS as u64;
        }
    }

    // Incorporate the exponent.
    e %= 61;
    if e < 0 {
        e += 61;
    }
    x = ((x << e as u32) & (MODULUS as u64)) | (x >> (61 - e) as u32);

    let result = (sign * x as i64) % MODULUS;
    if result == -1 { -2 } else { result }
}

/// Hashes UTF-8 string content with SipHash-1-3 and a zero key.
///
/// Empty input hashes to `0`; a computed hash of `-1` is remapped to `-2`.
#[must_use]
pub(crate) fn hash_str(value: &str) -> i64 {
    let bytes = value.as_bytes();
    if bytes.is_empty() {
        return 0;
    }
    let raw = siphash13(bytes);
    let signed = i64::from_ne_bytes(raw.to_ne_bytes());
    if signed == -1 { -2 } else { signed }
}

/// Returns `(frac, exp)` such that `value == frac * 2^exp` with `0.5 <= |frac| < 1.0`.
fn frexp(value: f64) -> (f64, i32) {
    if value == 0.0 || value.is_nan() || value.is_infinite() {
        return (value, 0);
    }
    let bits = value.to_bits();
    let exponent = ((bits >> 52) & 0x7ff) as i32;
    if exponent == 0 {
        // Subnormal: normalize first, then adjust the exponent.
        let normalized = value * (1u64 << 63) as f64 * 2.0;
        let (frac, exp) = frexp(normalized);
        return (frac, exp - 64);
    }
    let frac_bits = (bits & 0x800F_FFFF_FFFF_FFFF) | 0x3FE0_0000_0000_0000;
    let frac = f64::from_bits(frac_bits);
    (frac, exponent - 1022)
}

/// Computes SipHash-1-3 over `bytes` with a zero key.
fn siphash13(bytes: &[u8]) -> u64 {
    let mut v0 = 0x736f_6d65_7073_6575_u64;
    let mut v1 = 0x646f_7261_6e64_6f6d_u64;
    let mut v2 = 0x6c79_6765_6e65_7261_u64;
    let mut v3 = 0x7465_6462_7974_6573_u64;

    let mut chunks = bytes.chunks_exact(8);
    for chunk in &mut chunks {
        let mut block = [0_u8; 8];
        block.copy_from_slice(chunk);
        let message = u64::from_le_bytes(block);
        v3 ^= message;
        sip_round(&mut v0, &mut v1, &mut v2, &mut v3);
        v0 ^= message;
    }

    let mut tail = (bytes.len() as u64) << 56;
    for (index, byte) in chunks.remainder().iter().copied().enumerate() {
        tail |= u64::from(byte) << (index * 8);
    }

    v3 ^= tail;
    sip_round(&mut v0, &mut v1, &mut v2, &mut v3);
    v0 ^= tail;
    v2 ^= 0xff;
    sip_round(&mut v0, &mut v1, &mut v2, &mut v3);
    sip_round(&mut v0, &mut v1, &mut v2, &mut v3);
    sip_round(&mut v0, &mut v1, &mut v2, &mut v3);

    v0 ^ v1 ^ v2 ^ v3
}

/// Performs one SipHash round.
fn sip_round(v0: &mut u64, v1: &mut u64, v2: &mut u64, v3: &mut u64) {
    *v0 = v0.wrapping_add(*v1);
    *v1 = v1.rotate_left(13);
    *v1 ^= *v0;
    *v0 = v0.rotate_left(32);

    *v2 = v2.wrapping_add(*v3);
    *v3 = v3.rotate_left(16);
    *v3 ^= *v2;

    *v0 = v0.wrapping_add(*v3);
    *v3 = v3.rotate_left(21);
    *v3 ^= *v0;

    *v2 = v2.wrapping_add(*v1);
    *v1 = v1.rotate_left(17);
    *v1 ^= *v2;
    *v2 = v2.rotate_left(32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_and_float_hashes_agree() {
        for n in [-3_i64, -1, 0, 1, 2, 41, 1 << 40] {
            assert_eq!(hash_int(&BigInt::from(n)), hash_float(n as f64));
        }
    }

    #[test]
    fn bool_equivalents_hash_like_ints() {
        assert_eq!(hash_int(&BigInt::from(0)), 0);
        assert_eq!(hash_int(&BigInt::from(1)), 1);
    }

    #[test]
    fn minus_one_is_remapped() {
        assert_eq!(hash_int(&BigInt::from(-1)), -2);
        assert_eq!(hash_float(-1.0), -2);
    }

    #[test]
    fn empty_string_hashes_to_zero() {
        assert_eq!(hash_str(""), 0);
    }

    #[test]
    fn string_hash_is_deterministic() {
        assert_eq!(hash_str("spam"), hash_str("spam"));
        assert_ne!(hash_str("spam"), hash_str("eggs"));
    }
}

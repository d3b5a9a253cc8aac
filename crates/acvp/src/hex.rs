//! Constant time hexadecimal encoding and decoding with explicit
//! capacity bounds.
//!
//! ACVP carries every binary field as a hexadecimal string. The
//! harness always decodes into, and encodes from, buffers whose
//! capacity is fixed by the protocol, so every routine here takes
//! its destination from the caller and fails instead of growing
//! it.

use core::{
    fmt::{self, Write},
    str,
};

use subtle::{Choice, ConditionallySelectable};

/// Returned when a hexadecimal conversion fails.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum HexError {
    /// The hexadecimal string does not have an even length.
    #[error("length not a multiple of two")]
    OddLength,
    /// The hexadecimal string contains a non-hex character.
    #[error("contains invalid hexadecimal characters")]
    InvalidCharacter,
    /// The destination cannot hold the result.
    #[error("needs {need} bytes but capacity is {capacity}")]
    Capacity {
        /// The number of bytes the conversion needs.
        need: usize,
        /// The number of bytes available.
        capacity: usize,
    },
}

/// Returns the number of bytes `src` decodes to.
pub fn decoded_len(src: &str) -> Result<usize, HexError> {
    if src.len() % 2 != 0 {
        return Err(HexError::OddLength);
    }
    Ok(src.len() / 2)
}

/// Decodes the hexadecimal string `src` into `dst` and returns
/// the number of bytes written.
///
/// `dst` must be at least half as long as `src`. Upper and
/// lowercase digits are both accepted.
pub fn hex_to_bin(src: &str, dst: &mut [u8]) -> Result<usize, HexError> {
    let n = decoded_len(src)?;
    if n > dst.len() {
        return Err(HexError::Capacity {
            need: n,
            capacity: dst.len(),
        });
    }
    ct_decode(dst, src.as_bytes())
}

/// Encodes `src` into `dst` as uppercase hexadecimal and returns
/// the encoded string.
///
/// `dst` must be at least twice as long as `src`. Bytes of `dst`
/// past the encoded string are left untouched.
pub fn bin_to_hex<'a>(src: &[u8], dst: &'a mut [u8]) -> Result<&'a str, HexError> {
    let capacity = dst.len();
    let need = src.len().checked_mul(2).ok_or(HexError::Capacity {
        need: usize::MAX,
        capacity,
    })?;
    let dst = dst
        .get_mut(..need)
        .ok_or(HexError::Capacity { need, capacity })?;
    for (v, chunk) in src.iter().zip(dst.chunks_exact_mut(2)) {
        chunk[0] = enc_nibble_upper(v >> 4);
        chunk[1] = enc_nibble_upper(v & 0x0f);
    }
    // Every byte came from `enc_nibble_upper`, so this is ASCII.
    str::from_utf8(dst).map_err(|_| HexError::InvalidCharacter)
}

/// Formats `T` as uppercase hexadecimal in constant time.
///
/// Used for logging binary fields.
#[derive(Copy, Clone)]
pub struct Hex<T>(T);

impl<T> Hex<T> {
    /// Creates a new `Hex`.
    pub const fn new(value: T) -> Self {
        Self(value)
    }
}

impl<T> fmt::Display for Hex<T>
where
    T: AsRef<[u8]>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for v in self.0.as_ref() {
            f.write_char(char::from(enc_nibble_upper(v >> 4)))?;
            f.write_char(char::from(enc_nibble_upper(v & 0x0f)))?;
        }
        Ok(())
    }
}

impl<T> fmt::Debug for Hex<T>
where
    T: AsRef<[u8]>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Decodes `src` into `dst` from hexadecimal in constant time
/// and returns the number of bytes written.
///
/// * The length of `src` must be a multiple of two.
/// * `dst` must be half as long (or longer) as `src`.
fn ct_decode(dst: &mut [u8], src: &[u8]) -> Result<usize, HexError> {
    // The implementation is taken from
    // https://github.com/ericlagergren/subtle/blob/890d697da01053c79157a7fdfbed548317eeb0a6/hex/constant_time.go

    if src.len() % 2 != 0 {
        return Err(HexError::OddLength);
    }
    if src.len() / 2 > dst.len() {
        return Err(HexError::Capacity {
            need: src.len() / 2,
            capacity: dst.len(),
        });
    }

    let mut valid = Choice::from(1u8);
    for (src, dst) in src.chunks_exact(2).zip(dst.iter_mut()) {
        let (hi, hi_ok) = dec_nibble(src[0]);
        let (lo, lo_ok) = dec_nibble(src[1]);

        valid &= hi_ok & lo_ok;

        let val = (hi << 4) | (lo & 0x0f);
        // Do not update `dst` if `valid` is false.
        *dst = u8::conditional_select(dst, &val, valid);
    }
    if bool::from(valid) {
        Ok(src.len() / 2)
    } else {
        Err(HexError::InvalidCharacter)
    }
}

/// Encodes a nibble as lowercase hexadecimal.
#[inline(always)]
const fn enc_nibble_lower(c: u8) -> u8 {
    let c = c as u16;
    c.wrapping_add(87)
        .wrapping_add((c.wrapping_sub(10) >> 8) & !38) as u8
}

/// Encodes a nibble as uppercase hexadecimal.
#[inline(always)]
const fn enc_nibble_upper(c: u8) -> u8 {
    let c = enc_nibble_lower(c);
    c ^ ((c & 0x40) >> 1)
}

/// Decode a nibble from a hexadecimal character.
#[inline(always)]
fn dec_nibble(c: u8) -> (u8, Choice) {
    let c = u16::from(c);
    // Is c in '0' ... '9'?
    //
    // If `num` < 10, subtracting 10 produces the two's
    // complement which flips the bits in [15:4] to all one.
    // Shifting by 8 then leaves 0xff. Otherwise the shift
    // leaves 0x00.
    let num = c ^ u16::from(b'0');
    let num_ok = num.wrapping_sub(10) >> 8;

    // Is c in 'a' ... 'f' or 'A' ... 'F'?
    //
    // Masking off bit #5 folds the lowercase letters into
    // uppercase. Subtracting 55 then makes 'A' = 10, 'B' = 11,
    // etc. `(alpha-10)^(alpha-16)` sets bits [15:4] only when
    // `alpha` is in [10, 15].
    let alpha = (c & !32).wrapping_sub(55);
    let alpha_ok = (alpha.wrapping_sub(10) ^ alpha.wrapping_sub(16)) >> 8;

    // Bits [3:0] are either 0xf or 0x0.
    let ok = Choice::from(((num_ok ^ alpha_ok) & 1) as u8);

    let result = ((num_ok & num) | (alpha_ok & alpha)) & 0xf;

    (result as u8, ok)
}

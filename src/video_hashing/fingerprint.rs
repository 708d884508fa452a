use std::{fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::*;

/// A perceptual fingerprint of a single frame.
///
/// A fingerprint is a fixed-length bit sequence (64 bits when produced by [crate::fingerprint]).
/// Bit `i` is set when the `i`-th low-frequency DCT coefficient of the frame lies strictly above
/// the median coefficient. Fingerprints are plain values: two fingerprints are equal exactly when
/// their bit patterns are equal.
///
/// The textual form is one `'0'` or `'1'` per bit, bit 0 first. That form is also what serde
/// writes, so stored fingerprints stay human-readable.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Fingerprint {
    //bit i lives in bits[i / 64] at position i % 64. Bits past len are always zero.
    bits: Vec<u64>,
    len: u32,
}

impl Fingerprint {
    /// Build a fingerprint from individual bits, bit 0 first.
    pub fn from_bits(bits: impl IntoIterator<Item = bool>) -> Self {
        let mut ret = Self::default();
        for bit in bits {
            ret.push(bit);
        }
        ret
    }

    fn push(&mut self, bit: bool) {
        let idx = self.len as usize;
        if idx % 64 == 0 {
            self.bits.push(0);
        }
        if bit {
            self.bits[idx / 64] |= 1u64 << (idx % 64);
        }
        self.len += 1;
    }

    /// The number of bits in this fingerprint.
    pub fn len(&self) -> u32 {
        self.len
    }

    /// The value of bit `idx`, or None if idx is out of range.
    pub fn bit(&self, idx: u32) -> Option<bool> {
        if idx >= self.len {
            return None;
        }
        let idx = idx as usize;
        Some(self.bits[idx / 64] & (1u64 << (idx % 64)) != 0)
    }

    /// Iterate over all bits, bit 0 first.
    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |idx| self.bits[idx as usize / 64] & (1u64 << (idx % 64)) != 0)
    }

    /// The number of positions at which the two fingerprints differ.
    ///
    /// Fails with [CompareErrorKind::LengthMismatch] if the fingerprints are of different lengths.
    pub fn hamming_distance(&self, other: &Fingerprint) -> Result<u32, CompareErrorKind> {
        if self.len != other.len {
            return Err(CompareErrorKind::LengthMismatch {
                lhs: self.len,
                rhs: other.len,
            });
        }

        Ok(self.bits.iter().zip(other.bits.iter()).fold(0, |acc, (x, y)| {
            let difference = x ^ y;
            acc + difference.count_ones()
        }))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.bits().map(|bit| if bit { '1' } else { '0' }).collect::<String>();
        f.write_str(&s)
    }
}

impl FromStr for Fingerprint {
    type Err = ParseFingerprintErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseFingerprintErrorKind::Empty);
        }

        let bits = s
            .chars()
            .enumerate()
            .map(|(idx, ch)| match ch {
                '0' => Ok(false),
                '1' => Ok(true),
                _ => Err(ParseFingerprintErrorKind::InvalidChar { idx, ch }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from_bits(bits))
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

//Utilities for testing
#[doc(hidden)]
pub mod test_util {
    use rand::{prelude::*, seq::index};

    use super::Fingerprint;
    use crate::definitions::FINGERPRINT_BITS;

    #[doc(hidden)]
    impl Fingerprint {
        pub fn full(len: u32) -> Self {
            Self::from_bits((0..len).map(|_| true))
        }

        pub fn empty(len: u32) -> Self {
            Self::from_bits((0..len).map(|_| false))
        }

        pub fn random(rng: &mut StdRng) -> Self {
            Self::from_bits((0..FINGERPRINT_BITS).map(|_| rng.gen::<bool>()))
        }

        //flip exactly target_distance distinct bits, so the result is at exactly that distance from self.
        pub fn with_distance(&self, target_distance: u32, rng: &mut StdRng) -> Self {
            assert!(target_distance <= self.len);

            let flips = index::sample(rng, self.len as usize, target_distance as usize);
            let mut flipped = self.bits().collect::<Vec<_>>();
            for idx in flips.into_iter() {
                flipped[idx] = !flipped[idx];
            }

            let ret = Self::from_bits(flipped);
            assert_eq!(self.hamming_distance(&ret), Ok(target_distance));
            ret
        }
    }
}

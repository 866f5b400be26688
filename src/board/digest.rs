//! Board digests.
//!
//! A digest is a 64-bit fingerprint of board contents. Every value folded in
//! is keyed by the next word of a fixed-seed ChaCha8 stream and the results
//! are XORed together, so two boards with the same contents in the same
//! layout always hash alike, and a digest never depends on any shared
//! generator state.
//!
//! The seed is a constructor argument. Changing it (or the order in which a
//! board feeds values) invalidates every stored digest.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::PlayerId;

/// Murmur3 64-bit finalizer.
#[inline]
#[must_use]
pub fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51_afd7_ed55_8ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    k ^= k >> 33;
    k
}

/// Accumulates a digest.
#[derive(Clone, Debug)]
pub struct Digester {
    stream: ChaCha8Rng,
    acc: u64,
}

impl Digester {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            stream: ChaCha8Rng::seed_from_u64(seed),
            acc: 0,
        }
    }

    /// Draw the next key from the stream without folding anything.
    pub fn next_key(&mut self) -> u64 {
        self.stream.next_u64()
    }

    /// Fold `value` under a fresh key.
    pub fn mix(&mut self, value: u64) {
        let key = self.next_key();
        self.mix_keyed(key, value);
    }

    /// Fold `value` under a key the caller drew earlier.
    pub fn mix_keyed(&mut self, key: u64, value: u64) {
        self.acc ^= fmix64(key ^ value);
    }

    #[must_use]
    pub fn finish(self) -> u64 {
        self.acc
    }
}

/// Values that can be folded into a digest.
pub trait Digestible {
    fn digest_into(&self, d: &mut Digester);
}

impl Digestible for () {
    fn digest_into(&self, _d: &mut Digester) {}
}

impl Digestible for bool {
    fn digest_into(&self, d: &mut Digester) {
        d.mix(u64::from(*self));
    }
}

macro_rules! digest_as_u64 {
    ($($t:ty),*) => {
        $(impl Digestible for $t {
            fn digest_into(&self, d: &mut Digester) {
                d.mix(*self as u64);
            }
        })*
    };
}

digest_as_u64!(u8, u16, u32, u64, usize, i8, i16, i32, i64);

impl Digestible for PlayerId {
    fn digest_into(&self, d: &mut Digester) {
        d.mix(u64::from(self.0));
    }
}

impl<T: Digestible> Digestible for Option<T> {
    fn digest_into(&self, d: &mut Digester) {
        match self {
            None => d.mix(0),
            Some(v) => {
                d.mix(1);
                v.digest_into(d);
            }
        }
    }
}

impl<T: Digestible> Digestible for [T] {
    fn digest_into(&self, d: &mut Digester) {
        d.mix(self.len() as u64);
        for v in self {
            v.digest_into(d);
        }
    }
}

impl<T: Digestible> Digestible for Vec<T> {
    fn digest_into(&self, d: &mut Digester) {
        self.as_slice().digest_into(d);
    }
}

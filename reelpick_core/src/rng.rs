use hmac::digest::{Key, KeyInit};
use hmac::{Hmac, Mac};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use sha2::{Digest, Sha256};

pub type HmacSha256 = Hmac<Sha256>;

const HMAC_BLOCK: usize = 64;

/// HMAC key block: zero-padded seed, or its SHA-256 when longer than a block.
fn key_block(seed: &[u8]) -> [u8; HMAC_BLOCK] {
    let mut key = [0u8; HMAC_BLOCK];
    if seed.len() > HMAC_BLOCK {
        key[..32].copy_from_slice(&Sha256::digest(seed));
    } else {
        key[..seed.len()].copy_from_slice(seed);
    }
    key
}

/// Source of uniform randomness for winner draws, loop counts and confetti.
pub trait RandomSource {
    fn next_u32(&mut self) -> u32;

    fn next_u64(&mut self) -> u64 {
        (u64::from(self.next_u32()) << 32) | u64::from(self.next_u32())
    }

    /// Float in [0, 1).
    fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / (f64::from(u32::MAX) + 1.0)
    }

    /// Uniform index in `[0, n)` with no modulo bias. `n == 0` yields 0.
    fn pick(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        let n = n as u64;
        // 2^64 mod n; draws below it would over-represent the low residues
        let threshold = n.wrapping_neg() % n;
        loop {
            let v = self.next_u64();
            if v >= threshold {
                return (v % n) as usize;
            }
        }
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_u32(&mut self) -> u32 {
        (**self).next_u32()
    }

    fn pick(&mut self, n: usize) -> usize {
        (**self).pick(n)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn next_u32(&mut self) -> u32 {
        (**self).next_u32()
    }

    fn pick(&mut self, n: usize) -> usize {
        (**self).pick(n)
    }
}

pub fn derive_hash_hex(input: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    hex::encode(hasher.finalize())
}

/// Replayable stream: HMAC-SHA256(seed, "label:nonce") split into big-endian
/// u32 words, extended by re-hashing the previous block once exhausted.
pub struct SeededStream {
    seed: String,
    label: String,
    nonce: u64,
    block: Vec<u8>,
    cursor: usize,
}

impl SeededStream {
    pub fn new(seed: impl Into<String>, label: impl Into<String>, nonce: u64) -> Self {
        let mut stream = Self {
            seed: seed.into(),
            label: label.into(),
            nonce,
            block: Vec::new(),
            cursor: 0,
        };
        stream.block = stream.hmac_bytes().to_vec();
        stream
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn seed_hash_hex(&self) -> String {
        derive_hash_hex(self.seed.as_bytes())
    }

    pub fn hmac_bytes(&self) -> [u8; 32] {
        let key = key_block(self.seed.as_bytes());
        let mut mac = <HmacSha256 as KeyInit>::new(Key::<HmacSha256>::from_slice(&key));
        let msg = format!("{}:{}", self.label, self.nonce);
        mac.update(msg.as_bytes());
        let res = mac.finalize().into_bytes();
        let mut out = [0u8; 32];
        out.copy_from_slice(&res);
        out
    }

    fn extend(&mut self) {
        let mut hasher = Sha256::new();
        hasher.update(&self.block);
        self.block = hasher.finalize().to_vec();
        self.cursor = 0;
    }
}

impl RandomSource for SeededStream {
    fn next_u32(&mut self) -> u32 {
        if self.cursor + 4 > self.block.len() {
            self.extend();
        }
        let c = &self.block[self.cursor..self.cursor + 4];
        self.cursor += 4;
        u32::from_be_bytes([c[0], c[1], c[2], c[3]])
    }
}

/// OS entropy (browser `crypto.getRandomValues` on wasm).
pub struct EntropySource {
    inner: StdRng,
}

impl EntropySource {
    pub fn new() -> Self {
        Self {
            inner: StdRng::from_entropy(),
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for EntropySource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for EntropySource {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }
}

/// Replays a fixed list of `pick` results, cycling. Used to pin winners in
/// demos and tests; every other draw falls through to `fallback`.
pub struct Scripted<R> {
    picks: Vec<usize>,
    next: usize,
    fallback: R,
}

impl<R: RandomSource> Scripted<R> {
    pub fn new(picks: Vec<usize>, fallback: R) -> Self {
        Self {
            picks,
            next: 0,
            fallback,
        }
    }
}

impl<R: RandomSource> RandomSource for Scripted<R> {
    fn next_u32(&mut self) -> u32 {
        self.fallback.next_u32()
    }

    fn pick(&mut self, n: usize) -> usize {
        if self.picks.is_empty() || n == 0 {
            return self.fallback.pick(n);
        }
        let v = self.picks[self.next % self.picks.len()];
        self.next += 1;
        v % n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let mut a = SeededStream::new("server", "client", 1);
        let mut b = SeededStream::new("server", "client", 1);
        assert_eq!(a.seed_hash_hex(), b.seed_hash_hex());
        assert_eq!(a.hmac_bytes(), b.hmac_bytes());
        let xs: Vec<u32> = (0..40).map(|_| a.next_u32()).collect();
        let ys: Vec<u32> = (0..40).map(|_| b.next_u32()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn key_block_matches_hmac_for_any_seed_length() {
        let block = "x".repeat(64);
        let long = "long-seed".repeat(20);
        for seed in ["", "server", block.as_str(), long.as_str()] {
            let stream = SeededStream::new(seed, "client", 3);
            let mut mac = <HmacSha256 as Mac>::new_from_slice(seed.as_bytes()).unwrap();
            mac.update(b"client:3");
            assert_eq!(stream.hmac_bytes()[..], mac.finalize().into_bytes()[..]);
        }
    }

    #[test]
    fn nonce_changes_stream() {
        let mut a = SeededStream::new("server", "client", 1);
        let mut b = SeededStream::new("server", "client", 2);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn stream_extends_past_first_block() {
        // 32-byte block holds 8 words; the 9th comes from the chained hash
        let mut s = SeededStream::new("k", "l", 0);
        let words: Vec<u32> = (0..20).map(|_| s.next_u32()).collect();
        assert_eq!(words.len(), 20);
        assert_ne!(&words[0..8], &words[8..16]);
    }

    #[test]
    fn pick_stays_in_range() {
        let mut rng = EntropySource::from_seed(123);
        for n in 1..10 {
            for _ in 0..200 {
                assert!(rng.pick(n) < n);
            }
        }
        assert_eq!(rng.pick(0), 0);
    }

    #[test]
    fn float_in_unit_interval() {
        let mut rng = SeededStream::new("f", "f", 9);
        for _ in 0..500 {
            let f = rng.next_f64();
            assert!((0.0..1.0).contains(&f));
        }
    }

    #[test]
    fn scripted_cycles_picks() {
        let mut rng = Scripted::new(vec![1, 2], EntropySource::from_seed(1));
        assert_eq!(rng.pick(3), 1);
        assert_eq!(rng.pick(3), 2);
        assert_eq!(rng.pick(3), 1);
        assert_eq!(rng.pick(2), 0);
    }
}

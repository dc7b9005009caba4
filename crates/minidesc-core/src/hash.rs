//! Hash functions for the tables.
//!
//! Strings use WyHash. The seed is not a security measure: it only keeps
//! callers from depending on iteration order.

use std::sync::OnceLock;

const SECRET: [u64; 4] = [
    0xa076_1d64_78bd_642f,
    0xe703_7ed1_a0b4_28db,
    0x8ebc_6af0_9c88_c6e3,
    0x5899_65cc_7537_4cc3,
];

#[inline]
fn mum(a: u64, b: u64) -> (u64, u64) {
    let r = (a as u128) * (b as u128);
    (r as u64, (r >> 64) as u64)
}

#[inline]
fn mix(a: u64, b: u64) -> u64 {
    let (lo, hi) = mum(a, b);
    lo ^ hi
}

#[inline]
fn r8(p: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&p[..8]);
    u64::from_le_bytes(buf)
}

#[inline]
fn r4(p: &[u8]) -> u64 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&p[..4]);
    u32::from_le_bytes(buf) as u64
}

#[inline]
fn r3(p: &[u8], k: usize) -> u64 {
    ((p[0] as u64) << 16) | ((p[k >> 1] as u64) << 8) | p[k - 1] as u64
}

/// WyHash of `key` under `seed`.
pub fn hash_bytes(key: &[u8], seed: u64) -> u64 {
    let len = key.len();
    let mut seed = seed ^ mix(seed ^ SECRET[0], SECRET[1]);
    let (a, b);

    if len <= 16 {
        if len >= 4 {
            let step = (len >> 3) << 2;
            a = (r4(key) << 32) | r4(&key[step..]);
            b = (r4(&key[len - 4..]) << 32) | r4(&key[len - 4 - step..]);
        } else if len > 0 {
            a = r3(key, len);
            b = 0;
        } else {
            a = 0;
            b = 0;
        }
    } else {
        let mut p = key;
        if p.len() > 48 {
            let mut see1 = seed;
            let mut see2 = seed;
            while p.len() > 48 {
                seed = mix(r8(p) ^ SECRET[1], r8(&p[8..]) ^ seed);
                see1 = mix(r8(&p[16..]) ^ SECRET[2], r8(&p[24..]) ^ see1);
                see2 = mix(r8(&p[32..]) ^ SECRET[3], r8(&p[40..]) ^ see2);
                p = &p[48..];
            }
            seed ^= see1 ^ see2;
        }
        while p.len() > 16 {
            seed = mix(r8(p) ^ SECRET[1], r8(&p[8..]) ^ seed);
            p = &p[16..];
        }
        // The final two words may overlap bytes already consumed.
        let tail = &key[len - 16..];
        a = r8(tail);
        b = r8(&tail[8..]);
    }

    let (a, b) = mum(a ^ SECRET[1], b ^ seed);
    mix(a ^ SECRET[0] ^ len as u64, b ^ SECRET[1])
}

/// Hash for integer keys: fold the halves on 64-bit targets.
#[cfg(target_pointer_width = "64")]
#[inline]
pub fn hash_int(key: u64) -> u32 {
    (key as u32) ^ ((key >> 32) as u32)
}

/// Hash for integer keys: identity on 32-bit targets.
#[cfg(not(target_pointer_width = "64"))]
#[inline]
pub fn hash_int(key: u64) -> u32 {
    key as u32
}

/// Seed shared by tables that were not given one explicitly.
///
/// Drawn once per process.
pub fn process_seed() -> u64 {
    static SEED: OnceLock<u64> = OnceLock::new();
    *SEED.get_or_init(rand::random::<u64>)
}

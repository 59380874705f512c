//! The pattern fill loop.
//!
//! `Reference` mode keeps the loop of the historical `iogen` tool:
//! the loop bound is `capacity / step` but the offset still advances by the
//! whole step, so only the leading `capacity / step` bytes (roughly) are
//! touched, in `capacity / step^2` writes. `Full` mode walks the whole region.

use serde::Deserialize;

pub const PATTERN_SIZE: usize = 64;

const PATTERN_WORDS: [u64; 8] = [
    0x1111111111111111,
    0x2222222222222222,
    0x3333333333333333,
    0x4444444444444444,
    0x5555555555555555,
    0x6666666666666666,
    0x7777777777777777,
    0x8888888888888888,
];

/// The 64-byte test pattern, eight words laid out as native u64s.
pub const PATTERN: [u8; PATTERN_SIZE] = pattern_bytes();

const fn pattern_bytes() -> [u8; PATTERN_SIZE] {
    let mut out = [0u8; PATTERN_SIZE];
    let mut w = 0;
    while w < PATTERN_WORDS.len() {
        let bytes = PATTERN_WORDS[w].to_ne_bytes();
        let mut b = 0;
        while b < 8 {
            out[w * 8 + b] = bytes[b];
            b += 1;
        }
        w += 1;
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillMode {
    /// Stop once the offset reaches `capacity / step`.
    Reference,
    /// Write every stride that fits in the region.
    Full,
}

/// Offsets written for a region of `capacity` bytes. `step` must be non-zero.
pub fn fill_offsets(capacity: usize, step: usize, mode: FillMode) -> impl Iterator<Item = usize> {
    (0..loop_bound(capacity, step, mode)).step_by(step)
}

/// Number of writes `fill_offsets` yields, without iterating.
pub fn fill_count(capacity: usize, step: usize, mode: FillMode) -> usize {
    loop_bound(capacity, step, mode).div_ceil(step)
}

fn loop_bound(capacity: usize, step: usize, mode: FillMode) -> usize {
    match mode {
        FillMode::Reference => capacity / step,
        // offsets strictly below this leave room for a whole pattern
        FillMode::Full => capacity.saturating_add(1).saturating_sub(PATTERN_SIZE),
    }
}

/// Copy `PATTERN` into `region` at each planned offset, calling `on_write`
/// after every copy. Returns the number of writes.
///
/// `step` must be a non-zero multiple of `PATTERN_SIZE`; with that, every
/// planned write lies inside `region` in both modes.
pub fn fill_region<F>(region: &mut [u8], step: usize, mode: FillMode, mut on_write: F) -> usize
where
    F: FnMut(usize),
{
    let mut written = 0;
    for offset in fill_offsets(region.len(), step, mode) {
        region[offset..offset + PATTERN_SIZE].copy_from_slice(&PATTERN);
        on_write(offset);
        written += 1;
    }
    written
}

//! # Perlin Noise Implementation
//!
//! Deterministic 2D coherent noise used by every terrain layer.
//!
//! ## Contract
//!
//! - Output is always in `[0, 1]`
//! - Identical inputs produce identical outputs, on any platform
//! - Small input deltas produce small output deltas, so neighbouring
//!   cells sample correlated values instead of independent ones
//!
//! Independent channels are obtained by offsetting the sampled
//! coordinates (see [`NoiseOrigin`]) rather than by building more samplers.

use crate::random::RandomSource;

/// Seed that fixes the lattice shuffle of a [`PerlinNoise`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoiseSeed(u64);

impl NoiseSeed {
    /// Wraps a raw seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// The wrapped integer.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Mixes `purpose` into the seed, so one world seed can feed several
    /// unrelated samplers.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        let mixed = (self.0 ^ purpose).wrapping_mul(0x517c_c1b7_2722_0a95);
        Self(mixed ^ (mixed >> 32))
    }
}

impl Default for NoiseSeed {
    fn default() -> Self {
        Self(0x5EED_7E44_A1D0_0001)
    }
}

/// Anything that can be sampled as a 2D coherent noise field.
///
/// Implementations must be pure: no interior mutation, same input same
/// output. The classifier shares one sampler across every cell.
pub trait NoiseSource {
    /// Samples the field at `(x, y)`, returning a value in `[0, 1]`.
    fn sample(&self, x: f64, y: f64) -> f64;
}

impl<N: NoiseSource + ?Sized> NoiseSource for &N {
    #[inline]
    fn sample(&self, x: f64, y: f64) -> f64 {
        (**self).sample(x, y)
    }
}

const LATTICE: usize = 256;

/// Shuffled lattice hashes, stored twice so `hash(i) + j` never needs a
/// second wrap.
struct Lattice {
    hashes: [u8; LATTICE * 2],
}

impl Lattice {
    fn shuffled(seed: NoiseSeed) -> Self {
        let mut base: [u8; LATTICE] = std::array::from_fn(|i| i as u8);

        // xorshift64 stalls on zero; forcing the low bit keeps it moving.
        let mut state = seed.get() | 1;
        for top in (1..LATTICE).rev() {
            state = xorshift64(state);
            base.swap(top, (state % (top as u64 + 1)) as usize);
        }

        let mut hashes = [0u8; LATTICE * 2];
        hashes[..LATTICE].copy_from_slice(&base);
        hashes[LATTICE..].copy_from_slice(&base);
        Self { hashes }
    }

    #[inline]
    fn hash(&self, index: usize) -> usize {
        usize::from(self.hashes[index % (LATTICE * 2)])
    }
}

#[inline]
const fn xorshift64(mut x: u64) -> u64 {
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x
}

/// Seeded 2D Perlin gradient noise.
///
/// ```rust
/// use terragrid_procedural::noise::{NoiseSeed, NoiseSource, PerlinNoise};
///
/// let noise = PerlinNoise::new(NoiseSeed::new(42));
/// let value = noise.sample(1.25, 3.5);
/// assert!((0.0..=1.0).contains(&value));
/// ```
pub struct PerlinNoise {
    lattice: Lattice,
}

impl PerlinNoise {
    /// Builds the lattice for `seed`.
    #[must_use]
    pub fn new(seed: NoiseSeed) -> Self {
        Self {
            lattice: Lattice::shuffled(seed),
        }
    }

    /// Samples raw lattice noise in `[-1, 1]`.
    #[must_use]
    pub fn sample_signed(&self, x: f64, y: f64) -> f64 {
        let xi = lattice_floor(x);
        let yi = lattice_floor(y);

        // Position inside the lattice cell
        let xf = x - f64::from(xi);
        let yf = y - f64::from(yi);

        let u = fade(xf);
        let v = fade(yf);

        let cx = xi.rem_euclid(LATTICE as i32) as usize;
        let cy = yi.rem_euclid(LATTICE as i32) as usize;

        let l = &self.lattice;
        let corner = |dx: usize, dy: usize| l.hash(l.hash(cx + dx) + cy + dy);
        let (aa, ab, ba, bb) = (corner(0, 0), corner(0, 1), corner(1, 0), corner(1, 1));

        let bottom = lerp(u, gradient(aa, xf, yf), gradient(ba, xf - 1.0, yf));
        let top = lerp(u, gradient(ab, xf, yf - 1.0), gradient(bb, xf - 1.0, yf - 1.0));

        lerp(v, bottom, top)
    }
}

impl Default for PerlinNoise {
    fn default() -> Self {
        Self::new(NoiseSeed::default())
    }
}

impl NoiseSource for PerlinNoise {
    #[inline]
    fn sample(&self, x: f64, y: f64) -> f64 {
        ((self.sample_signed(x, y) + 1.0) * 0.5).clamp(0.0, 1.0)
    }
}

/// Per-generation offset added to every normalized sample coordinate.
///
/// Redrawing the origin between passes decorrelates successive worlds
/// without reseeding the permutation table.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NoiseOrigin {
    /// Offset along X.
    pub x: f64,
    /// Offset along Y (only read by the vertical biome channel).
    pub y: f64,
    /// Offset along Z.
    pub z: f64,
}

impl NoiseOrigin {
    /// Creates an origin from explicit offsets.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Draws a fresh origin with each axis uniform in `[0, 1)`.
    pub fn randomized(rng: &mut dyn RandomSource) -> Self {
        Self {
            x: rng.range(0.0, 1.0),
            y: rng.range(0.0, 1.0),
            z: rng.range(0.0, 1.0),
        }
    }
}

/// Quintic smoothstep: zero first and second derivative at 0 and 1.
#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

/// Dot product with one of eight lattice gradients.
#[inline]
fn gradient(hash: usize, x: f64, y: f64) -> f64 {
    match hash & 7 {
        0 => x + y,
        1 => -x + y,
        2 => x - y,
        3 => -x - y,
        4 => x,
        5 => -x,
        6 => y,
        _ => -y,
    }
}

/// Lattice cell containing `x`. Truncation rounds toward zero, so negative
/// non-integers step down one.
#[inline]
fn lattice_floor(x: f64) -> i32 {
    let truncated = x as i32;
    truncated - i32::from(x < f64::from(truncated))
}

//! # Gradient Noise
//!
//! Seeded, layered gradient noise in two and three dimensions.
//!
//! The generator owns a 256-entry permutation table shuffled from the seed and
//! duplicated to 512 entries so corner lookups never wrap. Every query sums
//! four octaves (frequency doubling, amplitude halving) and normalizes by the
//! total amplitude, so results stay in `[-1, 1]`.
//!
//! The generator is pure: the same seed answers the same query with the same
//! value on every thread, which is what makes chunk regeneration reproducible.

use noise::NoiseFn;

/// Number of octaves layered by every query.
pub const OCTAVES: u32 = 4;
/// Amplitude multiplier between consecutive octaves.
pub const PERSISTENCE: f64 = 0.5;

/// Seeded gradient noise source.
#[derive(Clone)]
pub struct GradientNoise {
    seed: u64,
    permutation: [u8; 512],
}

impl std::fmt::Debug for GradientNoise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GradientNoise").field("seed", &self.seed).finish()
    }
}

impl GradientNoise {
    /// Builds the permutation table for `seed` with a Fisher–Yates shuffle.
    pub fn new(seed: u64) -> Self {
        let mut table: [u8; 256] = std::array::from_fn(|i| i as u8);
        let mut rng = fastrand::Rng::with_seed(seed);
        for i in (1..table.len()).rev() {
            let j = rng.usize(0..=i);
            table.swap(i, j);
        }

        let permutation = std::array::from_fn(|i| table[i & 255]);
        GradientNoise { seed, permutation }
    }

    /// The seed this generator was built from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Layered 2D noise in `[-1, 1]`.
    pub fn noise2d(&self, x: f64, z: f64) -> f64 {
        self.layered(|frequency| self.single_octave_2d(x * frequency, z * frequency))
    }

    /// Layered 3D noise in `[-1, 1]`.
    pub fn noise3d(&self, x: f64, y: f64, z: f64) -> f64 {
        self.layered(|frequency| {
            self.single_octave_3d(x * frequency, y * frequency, z * frequency)
        })
    }

    fn layered(&self, octave: impl Fn(f64) -> f64) -> f64 {
        let mut frequency = 1.0;
        let mut amplitude = 1.0;
        let mut total = 0.0;
        let mut total_amplitude = 0.0;
        for _ in 0..OCTAVES {
            total += amplitude * octave(frequency);
            total_amplitude += amplitude;
            frequency *= 2.0;
            amplitude *= PERSISTENCE;
        }
        (total / total_amplitude).clamp(-1.0, 1.0)
    }

    #[inline]
    fn perm(&self, index: usize) -> usize {
        self.permutation[index] as usize
    }

    /// One octave of 2D gradient noise. Zero on every integer lattice point.
    pub fn single_octave_2d(&self, x: f64, z: f64) -> f64 {
        let (xi, xf) = split_cell(x);
        let (zi, zf) = split_cell(z);
        let u = fade(xf);
        let v = fade(zf);

        let a = self.perm(xi);
        let b = self.perm(xi + 1);
        let aa = self.perm(a + zi);
        let ab = self.perm(a + zi + 1);
        let ba = self.perm(b + zi);
        let bb = self.perm(b + zi + 1);

        lerp(
            v,
            lerp(u, grad2(aa, xf, zf), grad2(ba, xf - 1.0, zf)),
            lerp(u, grad2(ab, xf, zf - 1.0), grad2(bb, xf - 1.0, zf - 1.0)),
        )
    }

    /// One octave of 3D gradient noise. Zero on every integer lattice point.
    pub fn single_octave_3d(&self, x: f64, y: f64, z: f64) -> f64 {
        let (xi, xf) = split_cell(x);
        let (yi, yf) = split_cell(y);
        let (zi, zf) = split_cell(z);
        let u = fade(xf);
        let v = fade(yf);
        let w = fade(zf);

        let a = self.perm(xi) + yi;
        let aa = self.perm(a) + zi;
        let ab = self.perm(a + 1) + zi;
        let b = self.perm(xi + 1) + yi;
        let ba = self.perm(b) + zi;
        let bb = self.perm(b + 1) + zi;

        lerp(
            w,
            lerp(
                v,
                lerp(u, grad3(self.perm(aa), xf, yf, zf), grad3(self.perm(ba), xf - 1.0, yf, zf)),
                lerp(
                    u,
                    grad3(self.perm(ab), xf, yf - 1.0, zf),
                    grad3(self.perm(bb), xf - 1.0, yf - 1.0, zf),
                ),
            ),
            lerp(
                v,
                lerp(
                    u,
                    grad3(self.perm(aa + 1), xf, yf, zf - 1.0),
                    grad3(self.perm(ba + 1), xf - 1.0, yf, zf - 1.0),
                ),
                lerp(
                    u,
                    grad3(self.perm(ab + 1), xf, yf - 1.0, zf - 1.0),
                    grad3(self.perm(bb + 1), xf - 1.0, yf - 1.0, zf - 1.0),
                ),
            ),
        )
    }
}

impl NoiseFn<f64, 2> for GradientNoise {
    fn get(&self, point: [f64; 2]) -> f64 {
        self.noise2d(point[0], point[1])
    }
}

impl NoiseFn<f64, 3> for GradientNoise {
    fn get(&self, point: [f64; 3]) -> f64 {
        self.noise3d(point[0], point[1], point[2])
    }
}

/// Splits a coordinate into its wrapped lattice cell and the offset inside it.
#[inline]
fn split_cell(value: f64) -> (usize, f64) {
    let floor = value.floor();
    ((floor as i64 & 255) as usize, value - floor)
}

/// Quintic fade curve `6t^5 - 15t^4 + 10t^3`.
#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

#[inline]
fn grad2(hash: usize, x: f64, y: f64) -> f64 {
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

#[inline]
fn grad3(hash: usize, x: f64, y: f64, z: f64) -> f64 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };
    (if h & 1 == 0 { u } else { -u }) + (if h & 2 == 0 { v } else { -v })
}

//! Fixed-width lane helpers for the optimized stage kernels.
//!
//! Every optimized kernel walks a row in batches of [`LANES`] adjacent
//! samples held in a `wide::f64x4`, then finishes the `width % LANES` tail
//! with the scalar formula of the matching reference kernel.

use wide::{f64x4, CmpEq, CmpGt, CmpLt};

pub const LANES: usize = 4;

pub type Lane = f64x4;

/// Load `LANES` samples starting at `samples[0]`.
#[inline(always)]
pub fn load(samples: &[f64]) -> Lane {
    f64x4::new([samples[0], samples[1], samples[2], samples[3]])
}

/// Store a lane into `out[0..LANES]`.
#[inline(always)]
pub fn store(lane: Lane, out: &mut [f64]) {
    out[..LANES].copy_from_slice(&lane.to_array());
}

#[inline(always)]
pub fn splat(value: f64) -> Lane {
    f64x4::splat(value)
}

/// Length of the lane-aligned prefix of a run of `len` samples.
#[inline(always)]
pub fn aligned_len(len: usize) -> usize {
    len - len % LANES
}

// Abramowitz & Stegun 4.4.49: atan(t) for t in [0, 1], |error| <= 1.2e-5 rad.
const ATAN_C1: f64 = 0.999_866_0;
const ATAN_C3: f64 = -0.330_299_5;
const ATAN_C5: f64 = 0.180_141_0;
const ATAN_C7: f64 = -0.085_133_0;
const ATAN_C9: f64 = 0.020_835_1;

/// Polynomial `atan2(y, x)` in `(-pi, pi]`.
///
/// The ratio `min(|x|, |y|) / max(|x|, |y|)` keeps the polynomial inside
/// `[0, 1]`; octant and quadrant corrections are applied with lane masks.
/// `atan2(0, 0)` is 0, matching `f64::atan2`.
#[inline]
pub fn atan2_approx(y: Lane, x: Lane) -> Lane {
    let zero = splat(0.0);
    let ax = x.abs();
    let ay = y.abs();
    let hi = ax.max(ay);
    let lo = ax.min(ay);
    let denom = hi.cmp_eq(zero).blend(splat(1.0), hi);
    let t = lo / denom;
    let t2 = t * t;

    let poly = splat(ATAN_C9)
        .mul_add(t2, splat(ATAN_C7))
        .mul_add(t2, splat(ATAN_C5))
        .mul_add(t2, splat(ATAN_C3))
        .mul_add(t2, splat(ATAN_C1))
        * t;

    let octant = ay.cmp_gt(ax).blend(splat(std::f64::consts::FRAC_PI_2) - poly, poly);
    let quadrant = x.cmp_lt(zero).blend(splat(std::f64::consts::PI) - octant, octant);
    y.cmp_lt(zero).blend(zero - quadrant, quadrant)
}

/// Scalar twin of [`atan2_approx`] for row tails.
#[inline]
pub fn atan2_approx_scalar(y: f64, x: f64) -> f64 {
    let ax = x.abs();
    let ay = y.abs();
    let hi = ax.max(ay);
    let lo = ax.min(ay);
    let t = if hi == 0.0 { 0.0 } else { lo / hi };
    let t2 = t * t;
    let poly = ATAN_C9
        .mul_add(t2, ATAN_C7)
        .mul_add(t2, ATAN_C5)
        .mul_add(t2, ATAN_C3)
        .mul_add(t2, ATAN_C1)
        * t;

    let octant = if ay > ax {
        std::f64::consts::FRAC_PI_2 - poly
    } else {
        poly
    };
    let quadrant = if x < 0.0 {
        std::f64::consts::PI - octant
    } else {
        octant
    };
    if y < 0.0 {
        -quadrant
    } else {
        quadrant
    }
}

//! Double threshold: every sample becomes `high`, `low` or 0.

use rayon::prelude::*;
use wide::CmpGe;

use super::lanes::{self, LANES};
use crate::error::{check_thresholds, Result};
use crate::field::Field;

#[inline]
fn classify_sample(value: f64, low: f64, high: f64) -> f64 {
    if value >= high {
        high
    } else if value >= low {
        low
    } else {
        0.0
    }
}

/// Double threshold - reference.
///
/// `v >= high` maps to `high`, `low <= v < high` maps to `low`, anything else
/// to 0. Border samples are classified like any other.
pub fn classify_reference(field: &Field, low: f64, high: f64) -> Result<Field> {
    check_thresholds(low, high)?;
    let data = field
        .as_slice()
        .iter()
        .map(|&v| classify_sample(v, low, high))
        .collect();
    Ok(Field::from_parts(field.width(), field.height(), data))
}

/// Double threshold - row-parallel, lane-vectorized.
pub fn classify(field: &Field, low: f64, high: f64) -> Result<Field> {
    check_thresholds(low, high)?;
    let width = field.width();
    let aligned = lanes::aligned_len(width);
    let zero = lanes::splat(0.0);
    let low_lane = lanes::splat(low);
    let high_lane = lanes::splat(high);

    let mut data = vec![0.0; field.sample_count()];
    data.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let src = field.row(y);
            let mut x = 0;
            while x < aligned {
                let v = lanes::load(&src[x..]);
                let weak = v.cmp_ge(low_lane).blend(low_lane, zero);
                lanes::store(v.cmp_ge(high_lane).blend(high_lane, weak), &mut row[x..]);
                x += LANES;
            }
            for x in aligned..width {
                row[x] = classify_sample(src[x], low, high);
            }
        });

    Ok(Field::from_parts(width, field.height(), data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EdgeError;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_three_levels() {
        let field = Field::new(5, 1, vec![200.0, 150.0, 75.0, 50.0, 10.0]).unwrap();
        for out in [
            classify(&field, 50.0, 150.0).unwrap(),
            classify_reference(&field, 50.0, 150.0).unwrap(),
        ] {
            assert_eq!(out.as_slice(), &[150.0, 150.0, 50.0, 50.0, 0.0]);
        }
    }

    #[test]
    fn test_equal_thresholds() {
        let field = Field::new(3, 1, vec![99.0, 100.0, 101.0]).unwrap();
        let out = classify(&field, 100.0, 100.0).unwrap();
        assert_eq!(out.as_slice(), &[0.0, 100.0, 100.0]);
    }

    #[test]
    fn test_classify_matches_reference() {
        let mut rng = StdRng::seed_from_u64(41);
        for (width, height) in [(7, 3), (8, 8), (13, 2), (1, 5)] {
            let data = (0..width * height).map(|_| rng.gen_range(0.0..300.0)).collect();
            let field = Field::new(width, height, data).unwrap();
            let fast = classify(&field, 60.0, 180.0).unwrap();
            let slow = classify_reference(&field, 60.0, 180.0).unwrap();
            assert_eq!(fast, slow);
        }
    }

    #[test]
    fn test_raising_high_never_adds_strong_pixels() {
        let mut rng = StdRng::seed_from_u64(8);
        let data = (0..64).map(|_| rng.gen_range(0.0..255.0)).collect();
        let field = Field::new(8, 8, data).unwrap();
        let mut previous = usize::MAX;
        for high in [100.0, 140.0, 180.0, 220.0] {
            let out = classify(&field, 50.0, high).unwrap();
            let strong = out.count(high);
            assert!(strong <= previous);
            previous = strong;
        }
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let field = Field::filled(2, 2, 1.0).unwrap();
        assert!(matches!(
            classify(&field, 200.0, 100.0),
            Err(EdgeError::InvalidThresholds { .. })
        ));
        assert!(classify_reference(&field, f64::NAN, 100.0).is_err());
    }
}

//! Dislocations of a sample tiled with periodic images, and the random
//! points the Monte Carlo averages are taken over.

use numlpa_sample::{Region, Sample};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::FieldError;

/// Offsets, in region sides, of the images surrounding the region for
/// `replicate` rings.
///
/// Ring `i` holds the `8i` cells at Chebyshev distance `i`, so `replicate`
/// rings add `(2·replicate + 1)² − 1` images.
#[must_use]
pub fn shift_indexes(replicate: u32) -> Vec<(i64, i64)> {
    let mut indexes = Vec::new();
    for i in 1..=i64::from(replicate) {
        for j in 0..2 * i {
            for k in [1, -1] {
                indexes.push((-i * k, (i - j) * k));
                indexes.push(((i - j) * k, i * k));
            }
        }
    }
    indexes
}

/// Signed dislocation positions, region first, then its images.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub(crate) xs: Vec<f64>,
    pub(crate) ys: Vec<f64>,
    pub(crate) senses: Vec<f64>,
}

impl Scene {
    /// Tiles the dislocations of `sample` with `replicate` rings of images.
    ///
    /// # Errors
    ///
    /// [`FieldError::MalformedSample`] when the sense and position arrays
    /// disagree in length.
    pub fn new(sample: &Sample, replicate: u32) -> Result<Self, FieldError> {
        let dislocations = &sample.dislocations;
        let [xs, ys] = &dislocations.positions;
        let n = dislocations.senses.len();
        if xs.len() != n || ys.len() != n {
            return Err(FieldError::MalformedSample(format!(
                "{n} senses for {} abscissas and {} ordinates",
                xs.len(),
                ys.len()
            )));
        }
        let Region::Square { side } = sample.region;
        let shifts = shift_indexes(replicate);
        let total = n * (shifts.len() + 1);
        let mut scene = Self {
            xs: Vec::with_capacity(total),
            ys: Vec::with_capacity(total),
            senses: Vec::with_capacity(total),
        };
        for (dx, dy) in std::iter::once((0, 0)).chain(shifts) {
            scene.xs.extend(xs.iter().map(|x| x + dx as f64 * side));
            scene.ys.extend(ys.iter().map(|y| y + dy as f64 * side));
            scene.senses.extend(dislocations.senses.iter().map(|&s| f64::from(s)));
        }
        Ok(scene)
    }

    /// Number of dislocations, images included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.senses.len()
    }

    /// Returns true when the scene holds no dislocation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.senses.is_empty()
    }

    /// Iterates over `(sense, x, y)`.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.senses
            .iter()
            .zip(&self.xs)
            .zip(&self.ys)
            .map(|((&s, &x), &y)| (s, x, y))
    }
}

/// Stream of the sample's generator reserved for the random points; the
/// dislocations themselves were drawn from stream 0.
const POINTS_STREAM: u64 = 1;

/// `number` points drawn uniformly in the region of `sample`, seeded with
/// the sample's own seed so that a sample always sees the same points.
#[must_use]
pub fn random_points(sample: &Sample, number: usize) -> Vec<(f64, f64)> {
    let mut rng = ChaCha8Rng::seed_from_u64(sample.distribution.seed);
    rng.set_stream(POINTS_STREAM);
    let Region::Square { side } = sample.region;
    (0..number)
        .map(|_| {
            let x = rng.gen::<f64>() * side;
            let y = rng.gen::<f64>() * side;
            (x, y)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use numlpa_sample::distributions::{Distribution, ParameterSets};

    use super::*;

    #[test]
    fn rings_cover_the_surrounding_cells_once() {
        assert!(shift_indexes(0).is_empty());
        for replicate in 1..4 {
            let shifts = shift_indexes(replicate);
            let r = i64::from(replicate);
            assert_eq!(shifts.len() as i64, (2 * r + 1).pow(2) - 1);
            let unique: BTreeSet<_> = shifts.iter().copied().collect();
            assert_eq!(unique.len(), shifts.len());
            assert!(!unique.contains(&(0, 0)));
            assert!(unique.iter().all(|(a, b)| a.abs() <= r && b.abs() <= r));
        }
    }

    #[test]
    fn images_keep_senses_and_shift_by_the_side() {
        let sample = Distribution::from_name("uniform", &ParameterSets::default())
            .unwrap()
            .draw(4);
        let n = sample.dislocations.len();
        let scene = Scene::new(&sample, 1).unwrap();
        assert_eq!(scene.len(), 9 * n);
        assert_eq!(scene.xs[..n], sample.dislocations.positions[0][..]);
        let (dx, dy) = shift_indexes(1)[0];
        assert!((scene.xs[n] - sample.dislocations.positions[0][0] - dx as f64 * 1e-6).abs() < 1e-18);
        assert!((scene.ys[n] - sample.dislocations.positions[1][0] - dy as f64 * 1e-6).abs() < 1e-18);
        let total: f64 = scene.senses.iter().sum();
        let own: i32 = sample.dislocations.senses.iter().map(|&s| i32::from(s)).sum();
        assert_eq!(total, f64::from(own * 9));
    }

    #[test]
    fn points_are_reproducible_and_inside() {
        let sample = Distribution::from_name("uniform", &ParameterSets::default())
            .unwrap()
            .draw(11);
        let points = random_points(&sample, 50);
        assert_eq!(points, random_points(&sample, 50));
        assert!(points.iter().all(|&(x, y)| (0.0..1e-6).contains(&x) && (0.0..1e-6).contains(&y)));
    }

    #[test]
    fn points_do_not_replay_the_dislocation_draw() {
        let mut sets = ParameterSets::default();
        sets.uniform.number = 20;
        let sample = Distribution::from_name("uniform", &sets).unwrap().draw(3);
        let points = random_points(&sample, 20);
        let [xs, ys] = &sample.dislocations.positions;
        for (x, y) in xs.iter().zip(ys) {
            assert!(!points.contains(&(*x, *y)));
        }
    }

    #[test]
    fn ragged_sample_is_rejected() {
        let mut sample = Distribution::from_name("uniform", &ParameterSets::default())
            .unwrap()
            .draw(0);
        sample.dislocations.senses.pop();
        assert!(matches!(Scene::new(&sample, 0), Err(FieldError::MalformedSample(_))));
    }
}

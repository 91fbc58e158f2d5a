use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng,
};

use crate::{Error, Result};

/// Softmax exploration policy (also known as Boltzmann exploration)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Softmax {
    temperature: f64,
}

impl Softmax {
    /// Initialize softmax policy with temperature `tau`
    ///
    /// Fails unless `tau` is strictly positive and finite
    pub fn new(tau: f64) -> Result<Self> {
        if !(tau > 0.0 && tau.is_finite()) {
            return Err(Error::configuration(format!(
                "invalid value for `temperature`: {tau} must be strictly positive"
            )));
        }
        Ok(Self { temperature: tau })
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Boltzmann distribution over `q_values`
    ///
    /// p(a) = e<sup>Q(a)/τ</sup> / Σ<sub>b</sub> e<sup>Q(b)/τ</sup>
    ///
    /// The maximum value is subtracted before exponentiating so that small temperatures cannot
    /// overflow.
    pub fn distribution(&self, q_values: &[f64]) -> Vec<f64> {
        let Some(max) = q_values.iter().copied().reduce(f64::max) else {
            return Vec::new();
        };
        let exponentials = q_values
            .iter()
            .map(|q| ((q - max) / self.temperature).exp())
            .collect::<Vec<_>>();
        let sum: f64 = exponentials.iter().sum();
        exponentials.into_iter().map(|x| x / sum).collect()
    }

    /// Sample an index into `q_values` from the Boltzmann distribution
    ///
    /// `None` if `q_values` is empty or not finite.
    pub fn choose<R: Rng + ?Sized>(&self, q_values: &[f64], rng: &mut R) -> Option<usize> {
        let dist = WeightedIndex::new(self.distribution(q_values)).ok()?;
        Some(dist.sample(rng))
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn assert_normalized(p: &[f64]) {
        let sum: f64 = p.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9, "sum was {sum}");
    }

    #[test]
    fn rejects_non_positive_temperature() {
        assert!(Softmax::new(0.0).is_err());
        assert!(Softmax::new(-1.0).is_err());
        assert!(Softmax::new(f64::NAN).is_err());
        assert!(Softmax::new(1e-6).is_ok());
    }

    #[test]
    fn distribution_sums_to_one() {
        let q = [-3.5, 0.0, 12.25, 7.0];
        for tau in [1e-4, 0.01, 0.5, 1.0, 10.0, 1e6] {
            let p = Softmax::new(tau).unwrap().distribution(&q);
            assert_eq!(p.len(), q.len());
            assert_normalized(&p);
            assert!(p.iter().all(|x| x.is_finite() && *x >= 0.0));
        }
    }

    #[test]
    fn small_temperature_does_not_overflow() {
        let p = Softmax::new(1e-3).unwrap().distribution(&[1000.0, 999.0]);
        assert_normalized(&p);
        assert!(p[0] > 0.999_999);
    }

    #[test]
    fn matches_unshifted_formula() {
        let q = [0.5, -1.0, 2.0];
        let tau: f64 = 0.7;
        let denominator: f64 = q.iter().map(|x| (x / tau).exp()).sum();
        let expected = q.iter().map(|x| (x / tau).exp() / denominator);
        let p = Softmax::new(tau).unwrap().distribution(&q);
        for (a, b) in p.iter().zip(expected) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn high_temperature_is_nearly_uniform() {
        let p = Softmax::new(1e9).unwrap().distribution(&[1.0, 5.0, -2.0]);
        for x in p {
            assert!((x - 1.0 / 3.0).abs() < 1e-6);
        }
    }

    #[test]
    fn choose_follows_weights() {
        let mut rng = StdRng::seed_from_u64(3);
        let softmax = Softmax::new(0.01).unwrap();
        assert_eq!(softmax.choose(&[], &mut rng), None);
        for _ in 0..100 {
            assert_eq!(softmax.choose(&[0.0, 1.0, 0.5], &mut rng), Some(1));
        }
    }
}

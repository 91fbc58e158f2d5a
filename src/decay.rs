use crate::{Error, Result};

/// An implementation of a time-decaying value
pub trait Decay {
    /// Calculate value at time `t`
    fn evaluate(&self, t: f64) -> f64;
}

fn validate(rate: f64, vi: f64, vf: f64) -> Result<()> {
    ((rate >= 0.0 && vi >= vf) || (rate < 0.0 && vi <= vf))
        .then_some(())
        .ok_or_else(|| Error::configuration("`vi - vf` must have same sign as `rate`"))
}

/// A constant value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constant {
    value: f64,
}

impl Constant {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl Decay for Constant {
    fn evaluate(&self, _t: f64) -> f64 {
        self.value
    }
}

/// v(t) = v<sub>f</sub> + (v<sub>i</sub> - v<sub>f</sub>) * e<sup>-rt</sup>
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Exponential {
    rate: f64,
    vi: f64,
    vf: f64,
}

impl Exponential {
    pub fn new(rate: f64, vi: f64, vf: f64) -> Result<Self> {
        validate(rate, vi, vf)?;
        Ok(Self { rate, vi, vf })
    }
}

impl Decay for Exponential {
    fn evaluate(&self, t: f64) -> f64 {
        let &Self { rate, vi, vf } = self;
        vf + (vi - vf) * (-rate * t).exp()
    }
}

/// v(t) = max(v<sub>i</sub> - rt, v<sub>f</sub>) for a positive rate, min(...) for a negative one
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Linear {
    rate: f64,
    vi: f64,
    vf: f64,
}

impl Linear {
    pub fn new(rate: f64, vi: f64, vf: f64) -> Result<Self> {
        validate(rate, vi, vf)?;
        Ok(Self { rate, vi, vf })
    }

    /// Evenly spaced values from `vi` at `t = 0` to `vf` at `t = steps - 1`
    pub fn spanning(vi: f64, vf: f64, steps: u32) -> Result<Self> {
        if steps == 0 {
            return Err(Error::configuration("`steps` must be positive"));
        }
        let rate = if steps > 1 {
            (vi - vf) / f64::from(steps - 1)
        } else {
            0.0
        };
        Self::new(rate, vi, vf)
    }
}

impl Decay for Linear {
    fn evaluate(&self, t: f64) -> f64 {
        let &Self { rate, vi, vf } = self;
        let v = vi - rate * t;
        if rate >= 0.0 {
            v.max(vf)
        } else {
            v.min(vf)
        }
    }
}

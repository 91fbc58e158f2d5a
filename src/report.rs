use std::{
    collections::BTreeMap,
    ops::{Deref, DerefMut},
};

/// Named running totals for the current episode
///
/// Keys are fixed at construction; [`take`](Report::take) hands the totals out and resets them to
/// zero for the next episode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    data: BTreeMap<&'static str, f64>,
}

impl Report {
    pub fn new(keys: Vec<&'static str>) -> Self {
        Self {
            data: keys.into_iter().map(|k| (k, 0.0)).collect(),
        }
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.data.keys().copied().collect()
    }

    /// Add `value` to the total under `key`, if the key exists
    pub fn add(&mut self, key: &str, value: f64) {
        if let Some(total) = self.data.get_mut(key) {
            *total += value;
        }
    }

    /// Return the totals and reset them to zero
    pub fn take(&mut self) -> BTreeMap<&'static str, f64> {
        let zeroed = self.data.keys().map(|&k| (k, 0.0)).collect();
        std::mem::replace(&mut self.data, zeroed)
    }
}

impl Deref for Report {
    type Target = BTreeMap<&'static str, f64>;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl DerefMut for Report {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}

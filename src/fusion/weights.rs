//! Signal family weight table

use std::collections::BTreeMap;

/// Default family weights; overrides are merged on top at construction
const DEFAULT_WEIGHTS: [(&str, f64); 4] = [
    ("ensemble", 0.40),
    ("sentiment", 0.20),
    ("anomaly", 0.15),
    ("harmonic", 0.25),
];

/// Immutable family weight table
///
/// Built once by merging partial overrides over the defaults; never mutated
/// afterwards. Normalization to a unit sum happens per call over the families
/// actually present, so adding or removing a family never rescales the rest.
#[derive(Debug, Clone)]
pub struct WeightTable {
    weights: BTreeMap<String, f64>,
}

impl WeightTable {
    /// Merge overrides over the default table
    pub fn merged(overrides: &BTreeMap<String, f64>) -> Self {
        let mut weights: BTreeMap<String, f64> = DEFAULT_WEIGHTS
            .iter()
            .map(|(family, weight)| (family.to_string(), *weight))
            .collect();
        for (family, weight) in overrides {
            weights.insert(family.clone(), *weight);
        }
        Self { weights }
    }

    /// Raw weight for a family, if the table knows it
    pub fn get(&self, family: &str) -> Option<f64> {
        self.weights.get(family).copied()
    }

    /// Sum of all raw weights
    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Weights re-normalized to sum 1 over the given families.
    ///
    /// Families unknown to the table are dropped. Returns an empty map when
    /// no present family carries positive weight.
    pub fn normalized_over<'a>(
        &self,
        families: impl Iterator<Item = &'a str>,
    ) -> BTreeMap<String, f64> {
        let present: Vec<(String, f64)> = families
            .filter_map(|family| {
                self.get(family)
                    .filter(|w| *w > 0.0)
                    .map(|w| (family.to_string(), w))
            })
            .collect();
        let total: f64 = present.iter().map(|(_, w)| w).sum();
        if total <= 0.0 {
            return BTreeMap::new();
        }
        present
            .into_iter()
            .map(|(family, weight)| (family, weight / total))
            .collect()
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        Self::merged(&BTreeMap::new())
    }
}

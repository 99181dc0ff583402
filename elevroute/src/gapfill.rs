//! Gap-filling of invalid samples along a route.
//!
//! Every invalid point is resolved from the nearest valid neighbors on each
//! side:
//!
//! | left  | right | result                                        |
//! |-------|-------|-----------------------------------------------|
//! | low   | low   | `0` (open water)                              |
//! | some  | some  | linear interpolation by index                 |
//! | some  | none  | `0` if low, else hold the left value          |
//! | none  | some  | `0` if low, else hold the right value         |
//! | none  | none  | `0`                                           |
//!
//! "Low" means below the sea-level threshold (5 m by default). Interpolation
//! weights by position along the route, not by distance, which assumes
//! roughly even point spacing.

use crate::classify::Classified;

/// Default elevation (meters) below which a neighbor counts as sea level.
pub const DEFAULT_SEA_LEVEL_THRESHOLD: f64 = 5.0;

/// Gap-filling settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapFill {
    /// Neighbors strictly below this elevation are treated as water.
    pub sea_level_threshold: f64,
}

impl Default for GapFill {
    fn default() -> Self {
        Self {
            sea_level_threshold: DEFAULT_SEA_LEVEL_THRESHOLD,
        }
    }
}

impl GapFill {
    /// Produce a fully populated profile, one value per input sample.
    pub fn fill(&self, samples: &[Classified]) -> Vec<f64> {
        let n = samples.len();

        // Nearest valid (index, value) at or left of each position
        let mut left: Vec<Option<(usize, f64)>> = Vec::with_capacity(n);
        let mut last = None;
        for (i, s) in samples.iter().enumerate() {
            if let Some(v) = s.value() {
                last = Some((i, v));
            }
            left.push(last);
        }

        // Nearest valid at or right of each position
        let mut right: Vec<Option<(usize, f64)>> = vec![None; n];
        let mut next = None;
        for (i, s) in samples.iter().enumerate().rev() {
            if let Some(v) = s.value() {
                next = Some((i, v));
            }
            right[i] = next;
        }

        samples
            .iter()
            .enumerate()
            .map(|(i, s)| match s.value() {
                Some(v) => v,
                None => self.resolve(i, left[i], right[i]),
            })
            .collect()
    }

    fn resolve(&self, i: usize, prev: Option<(usize, f64)>, next: Option<(usize, f64)>) -> f64 {
        match (prev, next) {
            (Some((_, p)), Some((_, n))) if self.is_low(p) && self.is_low(n) => 0.0,
            (Some((pi, p)), Some((ni, n))) => {
                let weight = (i - pi) as f64 / (ni - pi) as f64;
                p + (n - p) * weight
            }
            (Some((_, v)), None) | (None, Some((_, v))) => {
                if self.is_low(v) {
                    0.0
                } else {
                    v
                }
            }
            (None, None) => 0.0,
        }
    }

    fn is_low(&self, v: f64) -> bool {
        v < self.sea_level_threshold
    }
}

/// Gap-fill with the default threshold.
pub fn fill(samples: &[Classified]) -> Vec<f64> {
    GapFill::default().fill(samples)
}

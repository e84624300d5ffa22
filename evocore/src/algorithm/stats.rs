use serde::{Deserialize, Serialize};

use crate::data::cluster::EPS;

/// Online summary statistics for one sampled scalar.
///
/// Tracks count, mean, sample variance, extrema, a stuck-chain counter and
/// the summed step size, updated one chain row at a time via Welford's
/// numerically stable recurrence:
///
/// `mean_n = mean_{n-1} + (x_n - mean_{n-1}) / n`
///
/// `M2_n = M2_{n-1} + (x_n - mean_{n-1}) * (x_n - mean_n)`
///
/// `M2_n / (n - 1)` reproduces the Bessel-corrected sample variance a
/// two-pass computation over the same values would yield, modulo
/// floating-point rounding order. Step-size statistics depend on the
/// immediately preceding value, held as an explicit `Option` so the first
/// observation is never compared against anything.
///
/// # Example
///
/// ```rust
/// use evocore::algorithm::stats::RunningStats;
///
/// let mut stats = RunningStats::new();
/// for x in [1.0, 2.0, 3.0] {
///     stats.update(x);
/// }
/// assert_eq!(stats.mean(), 2.0);
/// assert!((stats.sample_variance() - 1.0).abs() < 1e-12);
/// assert_eq!(stats.stuck(), 0);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
    prev: Option<f64>,
    stuck: u64,
    step_sum: f64,
    step_count: u64,
}

impl Default for RunningStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunningStats {
    pub fn new() -> Self {
        RunningStats {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            // seeded so the first observation always wins the comparison
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            prev: None,
            stuck: 0,
            step_sum: 0.0,
            step_count: 0,
        }
    }

    /// Folds one sampled value into the running statistics.
    pub fn update(&mut self, x: f64) {
        self.count += 1;
        let n = self.count as f64;

        let delta = x - self.mean;
        self.mean += delta / n;
        self.m2 += delta * (x - self.mean);

        if x < self.min {
            self.min = x;
        }
        if x > self.max {
            self.max = x;
        }

        if let Some(prev) = self.prev {
            let step = (x - prev).abs();
            if step < EPS {
                self.stuck += 1;
            }
            self.step_sum += step;
            self.step_count += 1;
        }
        self.prev = Some(x);
    }

    /// Number of contributing rows.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Running mean; 0 before the first observation.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Bessel-corrected sample variance; 0 for fewer than two observations.
    pub fn sample_variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn sigma(&self) -> f64 {
        self.sample_variance().abs().sqrt()
    }

    pub fn min(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.min
        }
    }

    pub fn max(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.max
        }
    }

    /// Rows whose value moved by less than `EPS` from the previous row.
    pub fn stuck(&self) -> u64 {
        self.stuck
    }

    /// Summed absolute step size; only divided into a mean at finalization.
    pub fn step_sum(&self) -> f64 {
        self.step_sum
    }

    /// Mean absolute step between consecutive observations.
    ///
    /// The division by the comparison count happens here, once, after the
    /// stream is exhausted; it is never applied incrementally.
    pub fn mean_step(&self) -> f64 {
        if self.step_count == 0 {
            0.0
        } else {
            self.step_sum / self.step_count as f64
        }
    }
}

/// Per-filter photometry accumulation for one star.
///
/// Plain sum and sum-of-squares of the synthesized magnitude across accepted
/// rows; finalized against the member-row count of the owning star.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PhotSums {
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
}

impl PhotSums {
    pub fn new(n_filters: usize) -> Self {
        PhotSums {
            sum: vec![0.0; n_filters],
            sum_sq: vec![0.0; n_filters],
        }
    }

    /// Adds one row's synthesized magnitudes.
    pub fn add(&mut self, mags: &[f64]) {
        for (f, mag) in mags.iter().enumerate() {
            self.sum[f] += mag;
            self.sum_sq[f] += mag * mag;
        }
    }

    pub fn mean(&self, filter: usize, n: u64) -> Option<f64> {
        if n == 0 {
            None
        } else {
            Some(self.sum[filter] / n as f64)
        }
    }

    /// Sample variance over `n` contributing rows; 0 for fewer than two.
    pub fn sample_variance(&self, filter: usize, n: u64) -> f64 {
        if n < 2 {
            return 0.0;
        }
        let n = n as f64;
        (n * self.sum_sq[filter] - self.sum[filter] * self.sum[filter]) / (n * (n - 1.0))
    }
}

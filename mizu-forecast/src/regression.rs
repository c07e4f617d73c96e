use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Eigenvalues of the centered Gram matrix below `TOLERANCE * largest` are treated as zero.
const TOLERANCE: f64 = f64::EPSILON * 1.0e4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub competitor_price: f64,
    pub demand_index: f64,
}

impl FeatureVector {
    pub fn new(competitor_price: f64, demand_index: f64) -> Self {
        Self {
            competitor_price,
            demand_index,
        }
    }

    fn as_array(&self) -> [f64; 2] {
        [self.competitor_price, self.demand_index]
    }
}

/// One observation: features and the tickets actually sold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub features: FeatureVector,
    pub tickets_sold: f64,
}

impl Sample {
    pub fn new(competitor_price: f64, demand_index: f64, tickets_sold: f64) -> Self {
        Self {
            features: FeatureVector::new(competitor_price, demand_index),
            tickets_sold,
        }
    }

    fn is_finite(&self) -> bool {
        self.features.competitor_price.is_finite()
            && self.features.demand_index.is_finite()
            && self.tickets_sold.is_finite()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegressionError {
    #[error("Cannot fit a model on an empty training set")]
    EmptyTrainingSet,

    #[error("Sample {index} contains a non-finite value")]
    NonFinite { index: usize },

    #[error("Test fraction must be strictly between 0 and 1, got {0}")]
    InvalidTestFraction(f64),

    #[error("Cannot split {samples} samples into non-empty train and test sets")]
    TooFewSamples { samples: usize },
}

/// Fitted linear model: `tickets = intercept + c0 * competitor_price + c1 * demand_index`.
///
/// Each column is divided by its largest magnitude before fitting, so the
/// weights live in that scaled space and are converted back on demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    intercept: f64,
    weights: [f64; 2],
    feature_scale: [f64; 2],
    target_scale: f64,
}

impl LinearModel {
    /// Rank-deficient designs (one row, a constant feature, collinear features)
    /// get the minimum-norm least-squares solution instead of an error.
    pub fn fit(samples: &[Sample]) -> Result<Self, RegressionError> {
        if samples.is_empty() {
            return Err(RegressionError::EmptyTrainingSet);
        }
        if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
            return Err(RegressionError::NonFinite { index });
        }

        let feature_scale = [
            max_abs(samples.iter().map(|s| s.features.competitor_price)),
            max_abs(samples.iter().map(|s| s.features.demand_index)),
        ];
        let target_scale = max_abs(samples.iter().map(|s| s.tickets_sold));
        // Every scaled value is in [-1, 1], so none of the sums below can overflow.
        let scaled: Vec<([f64; 2], f64)> = samples
            .iter()
            .map(|s| {
                let x = s.features.as_array();
                (
                    [x[0] / feature_scale[0], x[1] / feature_scale[1]],
                    s.tickets_sold / target_scale,
                )
            })
            .collect();

        let n = samples.len() as f64;
        let mut mean_x = [0.0; 2];
        let mut mean_y = 0.0;
        for (x, y) in &scaled {
            mean_x[0] += x[0];
            mean_x[1] += x[1];
            mean_y += y;
        }
        mean_x = [mean_x[0] / n, mean_x[1] / n];
        mean_y /= n;

        // Centered normal equations: gram * weights = cross
        let mut gram = [[0.0; 2]; 2];
        let mut cross = [0.0; 2];
        for (x, y) in &scaled {
            let dx = [x[0] - mean_x[0], x[1] - mean_x[1]];
            let dy = y - mean_y;
            for i in 0..2 {
                cross[i] += dx[i] * dy;
                for j in 0..2 {
                    gram[i][j] += dx[i] * dx[j];
                }
            }
        }

        let weights = solve_min_norm(gram, cross);
        let intercept = mean_y - weights[0] * mean_x[0] - weights[1] * mean_x[1];

        Ok(Self {
            intercept,
            weights,
            feature_scale,
            target_scale,
        })
    }

    pub fn predict(&self, features: &FeatureVector) -> f64 {
        let x = features.as_array();
        let scaled = self.intercept
            + self.weights[0] * (x[0] / self.feature_scale[0])
            + self.weights[1] * (x[1] / self.feature_scale[1]);
        self.target_scale * scaled
    }

    pub fn predict_samples(&self, samples: &[Sample]) -> Vec<f64> {
        samples.iter().map(|s| self.predict(&s.features)).collect()
    }

    pub fn intercept(&self) -> f64 {
        self.target_scale * self.intercept
    }

    /// `[competitor_price, demand_index]` in the original units.
    pub fn coefficients(&self) -> [f64; 2] {
        [
            self.target_scale * self.weights[0] / self.feature_scale[0],
            self.target_scale * self.weights[1] / self.feature_scale[1],
        ]
    }
}

/// Largest magnitude in a column, or 1 for an all-zero column.
fn max_abs(values: impl Iterator<Item = f64>) -> f64 {
    let largest = values.fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if largest > 0.0 {
        largest
    } else {
        1.0
    }
}

/// Pseudo-inverse solve of a symmetric positive semi-definite 2x2 system.
fn solve_min_norm(gram: [[f64; 2]; 2], cross: [f64; 2]) -> [f64; 2] {
    let (a, b, c) = (gram[0][0], gram[0][1], gram[1][1]);

    let half_gap = (a - c) / 2.0;
    let radius = (half_gap * half_gap + b * b).sqrt();
    let largest = (a + c) / 2.0 + radius;
    if largest <= 0.0 {
        return [0.0, 0.0];
    }
    // det / largest avoids the cancellation in `mid - radius`
    let smallest = ((a * c - b * b) / largest).max(0.0);

    let principal = if b == 0.0 {
        if a >= c {
            [1.0, 0.0]
        } else {
            [0.0, 1.0]
        }
    } else if a >= c {
        normalize([largest - c, b])
    } else {
        normalize([b, largest - a])
    };
    let minor = [-principal[1], principal[0]];

    let mut coefficients = [0.0; 2];
    for (value, vector) in [(largest, principal), (smallest, minor)] {
        if value <= largest * TOLERANCE {
            continue;
        }
        let weight = (vector[0] * cross[0] + vector[1] * cross[1]) / value;
        coefficients[0] += weight * vector[0];
        coefficients[1] += weight * vector[1];
    }
    coefficients
}

fn normalize(v: [f64; 2]) -> [f64; 2] {
    let norm = (v[0] * v[0] + v[1] * v[1]).sqrt();
    [v[0] / norm, v[1] / norm]
}

/// Shuffle with a seeded generator and carve off `ceil(test_fraction * n)` samples
/// for the holdout. Returns `(train, test)`.
pub fn train_test_split(
    samples: &[Sample],
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<Sample>, Vec<Sample>), RegressionError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(RegressionError::InvalidTestFraction(test_fraction));
    }

    let n = samples.len();
    let n_test = (test_fraction * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(RegressionError::TooFewSamples { samples: n });
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test = indices[..n_test].iter().map(|&i| samples[i]).collect();
    let train = indices[n_test..].iter().map(|&i| samples[i]).collect();
    Ok((train, test))
}

/// Mean of squared residuals. An empty input has no error.
pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    let count = actual.len().min(predicted.len());
    if count == 0 {
        return 0.0;
    }
    let total: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p) * (a - p))
        .sum();
    total / count as f64
}

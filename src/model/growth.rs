//! Exponential growth models fitted by log-linear least squares.

use crate::error::{QcError, Result};
use crate::stats::doubling_time;
use serde::{Deserialize, Serialize};

/// Minimum number of valid (positive, finite) points for a fit.
pub const MIN_VALID_POINTS: usize = 3;

/// Exponential growth model `y(t) = a * exp(r * t)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthModel {
    /// Amplitude, the fitted value at t = 0.
    pub a: f64,
    /// Instantaneous growth rate per time unit (signed).
    pub r: f64,
    /// Coefficient of determination in log space, clipped to [0, 1].
    pub r2: f64,
    /// Number of points that entered the fit.
    pub valid_points: usize,
    /// Display form of the fitted equation.
    pub equation: String,
    /// Why the model is degenerate, if it is.
    pub error: Option<String>,
}

impl GrowthModel {
    /// Model returned when no fit could be made.
    fn degenerate(valid_points: usize, error: String) -> Self {
        Self {
            a: 1.0,
            r: 0.0,
            r2: 0.0,
            valid_points,
            equation: "Insufficient data".to_string(),
            error: Some(error),
        }
    }

    /// Whether the fit succeeded.
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// Predicted value at time `t`.
    pub fn predict(&self, t: f64) -> f64 {
        self.a * (self.r * t).exp()
    }

    /// Doubling time for a growing tumor, `ln 2 / r`.
    pub fn doubling_time(&self) -> Option<f64> {
        if self.is_valid() {
            doubling_time(self.r)
        } else {
            None
        }
    }
}

impl std::fmt::Display for GrowthModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Growth Model")?;
        writeln!(f, "  Equation:     {}", self.equation)?;
        writeln!(f, "  R²:           {:.4}", self.r2)?;
        writeln!(f, "  Valid points: {}", self.valid_points)?;
        if let Some(err) = &self.error {
            writeln!(f, "  Error:        {}", err)?;
        }
        Ok(())
    }
}

/// Fit `y = a * exp(r * t)` by ordinary least squares on `ln(y)`.
///
/// Only pairs with a finite time and a finite, strictly positive measurement
/// are used. Fewer than [`MIN_VALID_POINTS`] such pairs, or time points with
/// no spread, yield a degenerate model (`a = 1, r = 0, r2 = 0`) carrying an
/// error message rather than an `Err`.
///
/// # Errors
/// [`QcError::DimensionMismatch`] if the two sequences differ in length.
pub fn fit_growth_model(time_points: &[f64], measurements: &[f64]) -> Result<GrowthModel> {
    if time_points.len() != measurements.len() {
        return Err(QcError::DimensionMismatch {
            expected: time_points.len(),
            actual: measurements.len(),
        });
    }

    let (xs, ys): (Vec<f64>, Vec<f64>) = time_points
        .iter()
        .zip(measurements)
        .filter(|(t, v)| t.is_finite() && v.is_finite() && **v > 0.0)
        .map(|(&t, &v)| (t, v.ln()))
        .unzip();
    let n = xs.len();

    if n < MIN_VALID_POINTS {
        return Ok(GrowthModel::degenerate(
            n,
            format!(
                "Insufficient data: {} valid points (minimum {})",
                n, MIN_VALID_POINTS
            ),
        ));
    }

    let (slope, intercept) = match least_squares(&xs, &ys) {
        Ok(coefficients) => coefficients,
        Err(e) => return Ok(GrowthModel::degenerate(n, e.to_string())),
    };

    let r2 = r_squared(&xs, &ys, slope, intercept);

    let a = intercept.exp();
    let a = if a.is_finite() { a } else { 1.0 };
    let r = if slope.is_finite() { slope } else { 0.0 };

    Ok(GrowthModel {
        a,
        r,
        r2,
        valid_points: n,
        equation: format!("y = {:.2} × e^({:.4}t)", a, r),
        error: None,
    })
}

/// Closed-form simple regression from the sums Σx, Σy, Σxy, Σx².
fn least_squares(xs: &[f64], ys: &[f64]) -> Result<(f64, f64)> {
    let n = xs.len() as f64;
    let sum_x: f64 = xs.iter().sum();
    let sum_y: f64 = ys.iter().sum();
    let sum_xy: f64 = xs.iter().zip(ys).map(|(x, y)| x * y).sum();
    let sum_xx: f64 = xs.iter().map(|x| x * x).sum();

    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator.abs() < f64::EPSILON {
        return Err(QcError::Numerical(
            "Insufficient variation in time points".to_string(),
        ));
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;
    Ok((slope, intercept))
}

fn r_squared(xs: &[f64], ys: &[f64], slope: f64, intercept: f64) -> f64 {
    let y_mean = ys.iter().sum::<f64>() / ys.len() as f64;
    let ss_tot: f64 = ys.iter().map(|y| (y - y_mean).powi(2)).sum();
    if ss_tot < f64::EPSILON {
        return 0.0;
    }
    let ss_res: f64 = xs
        .iter()
        .zip(ys)
        .map(|(x, y)| (y - (intercept + slope * x)).powi(2))
        .sum();
    (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
}

//! Standard normal distribution via the Abramowitz and Stegun error function.

// Abramowitz and Stegun, formula 7.1.26 (|error| <= 1.5e-7).
const ERF_P: f64 = 0.327_591_1;
const ERF_A1: f64 = 0.254_829_592;
const ERF_A2: f64 = -0.284_496_736;
const ERF_A3: f64 = 1.421_413_741;
const ERF_A4: f64 = -1.453_152_027;
const ERF_A5: f64 = 1.061_405_429;

/// Error function approximation.
pub fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + ERF_P * x);
    let poly = t * (ERF_A1 + t * (ERF_A2 + t * (ERF_A3 + t * (ERF_A4 + t * ERF_A5))));
    sign * (1.0 - poly * (-x * x).exp())
}

/// Standard normal CDF, `0.5 * (1 + erf(z / sqrt(2)))`.
pub fn normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

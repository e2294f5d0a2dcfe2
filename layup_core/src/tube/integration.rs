//! Composite Simpson's rule.

use crate::errors::{CalcError, CalcResult};

/// Integrate `f` over `[x0, x1]` with `samples` equally spaced evaluations.
///
/// `samples` must be odd and at least 3. The integrand may fail, in which case
/// the first error is returned.
pub fn simpson<F>(x0: f64, x1: f64, samples: usize, mut f: F) -> CalcResult<f64>
where
    F: FnMut(f64) -> CalcResult<f64>,
{
    if samples < 3 || samples % 2 == 0 {
        return Err(CalcError::invalid_input(
            "simpson_samples",
            samples.to_string(),
            "Sample count must be odd and at least 3",
        ));
    }
    if !(x0.is_finite() && x1.is_finite()) || x1 < x0 {
        return Err(CalcError::invalid_input(
            "x_max",
            x1.to_string(),
            format!("Integration range must be finite and start at or before its end ({x0})"),
        ));
    }
    if x1 == x0 {
        return Ok(0.0);
    }

    let intervals = samples - 1;
    let h = (x1 - x0) / intervals as f64;
    let mut sum = f(x0)? + f(x1)?;
    for i in 1..intervals {
        let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
        sum += weight * f(x0 + h * i as f64)?;
    }
    Ok(sum * h / 3.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exact_for_cubics() {
        let result = simpson(0.0, 2.0, 3, |x| Ok(x * x * x - x + 1.0)).unwrap();
        assert_relative_eq!(result, 4.0, max_relative = 1e-12);
    }

    #[test]
    fn test_converges_for_smooth_functions() {
        let result = simpson(0.0, std::f64::consts::PI, 101, |x| Ok(x.sin())).unwrap();
        assert_relative_eq!(result, 2.0, max_relative = 1e-7);
    }

    #[test]
    fn test_empty_range() {
        assert_eq!(simpson(1.0, 1.0, 5, |_| Ok(3.0)).unwrap(), 0.0);
    }

    #[test]
    fn test_rejects_bad_arguments() {
        assert_eq!(simpson(0.0, 1.0, 4, |_| Ok(1.0)).unwrap_err().field(), Some("simpson_samples"));
        assert_eq!(simpson(0.0, 1.0, 1, |_| Ok(1.0)).unwrap_err().field(), Some("simpson_samples"));
        assert_eq!(simpson(1.0, 0.0, 5, |_| Ok(1.0)).unwrap_err().field(), Some("x_max"));
    }

    #[test]
    fn test_propagates_integrand_error() {
        let err = simpson(0.0, 1.0, 5, |x| {
            if x > 0.5 {
                Err(CalcError::out_of_range("x", x, 0.0, 0.5))
            } else {
                Ok(1.0)
            }
        })
        .unwrap_err();
        assert_eq!(err.error_code(), "OUT_OF_RANGE");
    }
}

//! Least-squares line fitting.
//!
//! Summaries report a per-year trend alongside the endpoint growth figure:
//!
//! ```text
//! minimize Σ (v_i - (a + b * year_i))^2
//! ```
//!
//! Implementation choices:
//! - Years are centered on their mean before building the design matrix;
//!   raw calendar years make the intercept column nearly collinear with the
//!   year column.
//! - The system is solved with SVD so tall (many-year) matrices are fine.

use nalgebra::{DMatrix, DVector};

/// Intercept/slope of a fitted line. The intercept is at the mean year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub intercept: f64,
    pub slope: f64,
}

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);
    for &tol in &[1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }
    None
}

/// Fit `value = a + b * (year - mean_year)`.
///
/// Needs at least two distinct x values; otherwise the slope is undefined.
pub fn fit_line(points: &[(f64, f64)]) -> Option<LineFit> {
    let n = points.len();
    if n < 2 {
        return None;
    }
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n as f64;
    if points.iter().all(|(x, _)| (x - mean_x).abs() < 1e-12) {
        return None;
    }

    let mut design = Vec::with_capacity(n * 2);
    for (x, _) in points {
        design.push(1.0);
        design.push(x - mean_x);
    }
    let x = DMatrix::from_row_slice(n, 2, &design);
    let y = DVector::from_iterator(n, points.iter().map(|(_, v)| *v));

    let beta = solve_least_squares(&x, &y)?;
    Some(LineFit {
        intercept: beta[0],
        slope: beta[1],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_line_is_recovered() {
        // v = 3 * (year - 2000) + 10
        let pts: Vec<(f64, f64)> = (2000..2005)
            .map(|y| (y as f64, 3.0 * (y - 2000) as f64 + 10.0))
            .collect();
        let fit = fit_line(&pts).unwrap();
        assert!((fit.slope - 3.0).abs() < 1e-9);
        // Mean year is 2002 -> 16.
        assert!((fit.intercept - 16.0).abs() < 1e-9);
    }

    #[test]
    fn single_point_or_single_year_has_no_slope() {
        assert!(fit_line(&[(2000.0, 1.0)]).is_none());
        assert!(fit_line(&[(2000.0, 1.0), (2000.0, 2.0)]).is_none());
    }
}

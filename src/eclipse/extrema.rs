//! Local extrema of a sampled signal, refined by three-point quadratic interpolation.
//!
//! An interior sample `i` is a local maximum when it is **strictly** greater than both
//! neighbours; no smoothing or deduplication of plateaus is applied. Each flagged sample is
//! refined by the parabola through `(t[i−1], s[i−1])`, `(t[i], s[i])`, `(t[i+1], s[i+1])`.

use itertools::Itertools;

use crate::syzygy_errors::SyzygyError;

/// A refined local extremum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extremum {
    /// Index of the sample flagged by the neighbour test.
    pub index: usize,
    /// Abscissa of the parabola vertex.
    pub time: f64,
    /// Value of the parabola at its vertex.
    pub value: f64,
}

/// Coefficients `(c0, c1, c2)` of `c0·s² + c1·s + c2` through three points, in the local
/// coordinate `s = t − t_mid`.
///
/// Return
/// ----------
/// * `SyzygyError::DegenerateExtremumFit` when the abscissae are not distinct or the leading
///   coefficient is zero or not finite.
pub fn fit_quadratic(
    t: [f64; 3],
    s: [f64; 3],
) -> Result<(f64, f64, f64), SyzygyError> {
    let degenerate = SyzygyError::DegenerateExtremumFit { time: t[1] };
    let (x0, x2) = (t[0] - t[1], t[2] - t[1]);
    if x0 == 0.0 || x2 == 0.0 || x0 == x2 {
        return Err(degenerate);
    }

    // Divided differences on (x0, 0, x2).
    let d01 = (s[1] - s[0]) / -x0;
    let d12 = (s[2] - s[1]) / x2;
    let c0 = (d12 - d01) / (x2 - x0);
    let c1 = d01 - c0 * x0;
    let c2 = s[1];

    if c0 == 0.0 || !c0.is_finite() || !c1.is_finite() {
        return Err(degenerate);
    }
    Ok((c0, c1, c2))
}

/// Vertex of the parabola through the three samples centred on `i`.
///
/// The vertex abscissa is `−c1 / (2·c0)` and its value the parabola evaluated there.
///
/// Return
/// ----------
/// * `SyzygyError::InvalidConfiguration` unless `1 ≤ i ≤ len − 2` and both slices have the
///   same length,
/// * `SyzygyError::DegenerateExtremumFit` from [`fit_quadratic`].
pub fn refine_extremum(times: &[f64], values: &[f64], i: usize) -> Result<Extremum, SyzygyError> {
    if times.len() != values.len() || i == 0 || i + 1 >= times.len() {
        return Err(SyzygyError::InvalidConfiguration(format!(
            "extremum index {i} is not interior to a signal of {} samples ({} times)",
            values.len(),
            times.len()
        )));
    }
    let (c0, c1, c2) = fit_quadratic(
        [times[i - 1], times[i], times[i + 1]],
        [values[i - 1], values[i], values[i + 1]],
    )?;
    let s_star = -c1 / (2.0 * c0);
    Ok(Extremum {
        index: i,
        time: times[i] + s_star,
        value: (c0 * s_star + c1) * s_star + c2,
    })
}

/// Indices `1 ≤ i ≤ len − 2` where the signal is strictly above both neighbours.
pub fn local_maxima_indices(values: &[f64]) -> Vec<usize> {
    values
        .iter()
        .tuple_windows()
        .enumerate()
        .filter(|(_, (prev, cur, next))| cur > prev && cur > next)
        .map(|(i, _)| i + 1)
        .collect()
}

/// Refined local maxima of `values` sampled at `times`.
///
/// Candidates whose quadratic fit is degenerate are skipped (and logged); they do not abort
/// the scan.
pub fn find_maxima(times: &[f64], values: &[f64]) -> Result<Vec<Extremum>, SyzygyError> {
    if times.len() != values.len() {
        return Err(SyzygyError::InvalidConfiguration(format!(
            "signal has {} samples but {} times",
            values.len(),
            times.len()
        )));
    }

    let mut maxima = Vec::new();
    for i in local_maxima_indices(values) {
        match refine_extremum(times, values, i) {
            Ok(ext) => maxima.push(ext),
            Err(SyzygyError::DegenerateExtremumFit { time }) => {
                log::warn!("skipping extremum candidate at t = {time}: degenerate quadratic fit");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(maxima)
}

/// Refined local minima, found as the maxima of the negated signal.
///
/// The returned values are those of the original (non-negated) signal.
pub fn find_minima(times: &[f64], values: &[f64]) -> Result<Vec<Extremum>, SyzygyError> {
    let negated: Vec<f64> = values.iter().map(|v| -v).collect();
    Ok(find_maxima(times, &negated)?
        .into_iter()
        .map(|ext| Extremum {
            value: -ext.value,
            ..ext
        })
        .collect())
}

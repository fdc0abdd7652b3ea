//! Leave-one-out jackknife.

/// Jackknife mean and error of `data`.
///
/// With fewer than two values the error is reported as zero.
pub fn jackknife(data: &[f64]) -> (f64, f64) {
    let n = data.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    let total: f64 = data.iter().sum();
    let mean = total / n as f64;
    if n < 2 {
        return (mean, 0.0);
    }

    let nf = n as f64;
    let variance = data
        .iter()
        .map(|&x| {
            let leave_one_out = (total - x) / (nf - 1.0);
            (leave_one_out - mean).powi(2)
        })
        .sum::<f64>()
        / nf;

    (mean, ((nf - 1.0) * variance).sqrt())
}

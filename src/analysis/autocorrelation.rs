//! Autocorrelation of a Monte Carlo time series and the corrections it
//! implies for error bars and effective sample counts.

/// Window constant of Sokal's automatic windowing.
const SOKAL_C: f64 = 5.0;

fn mean_and_c0(data: &[f64]) -> (f64, f64) {
    let mean = data.iter().sum::<f64>() / data.len() as f64;
    let c0: f64 = data.iter().map(|&x| (x - mean).powi(2)).sum();
    (mean, c0)
}

/// Unnormalised autocovariance sum at lag `k`.
#[inline]
fn lagged_sum(data: &[f64], mean: f64, k: usize) -> f64 {
    data[..data.len() - k]
        .iter()
        .zip(data[k..].iter())
        .map(|(&x, &y)| (x - mean) * (y - mean))
        .sum()
}

/// Normalised autocorrelation `ρ(k)` for `k = 0..=max_lag`, `ρ(0) = 1`.
///
/// A constant series has `ρ(k) = 1` at every lag. `max_lag` is clamped to
/// `len - 1`.
pub fn autocorrelation(data: &[f64], max_lag: usize) -> Vec<f64> {
    let n = data.len();
    if n == 0 {
        return Vec::new();
    }
    let max_lag = max_lag.min(n - 1);
    let (mean, c0) = mean_and_c0(data);
    if c0 == 0.0 {
        return vec![1.0; max_lag + 1];
    }
    (0..=max_lag).map(|k| lagged_sum(data, mean, k) / c0).collect()
}

/// Integrated autocorrelation time `τ_int = ½ + Σ_{k=1}^{M} ρ(k)`.
///
/// `M` is chosen by Sokal's automatic window (c = 5): the partial sums are
/// accumulated lag by lag up to `min(len - 1, len / 2)` and cut at the first
/// position `m` with `m >= c τ_int`. Independent data gives `τ_int ≈ ½`.
pub fn integrated_autocorr_time(data: &[f64]) -> f64 {
    let n = data.len();
    if n < 2 {
        return 0.5;
    }
    let max_lag = (n - 1).min(n / 2);
    let (mean, c0) = mean_and_c0(data);

    let mut cumulative: Vec<f64> = Vec::new();
    let mut tau = 0.5;
    for lag in 1..=max_lag {
        tau += if c0 == 0.0 { 1.0 } else { lagged_sum(data, mean, lag) / c0 };
        cumulative.push(tau);
        let m = cumulative.len() - 1;
        if m >= 1 && m as f64 >= SOKAL_C * cumulative[m] {
            return cumulative[m - 1];
        }
    }

    // no cut inside the range: fall back to the last full window
    if cumulative.len() >= 2 {
        cumulative[cumulative.len() - 2]
    } else {
        0.5
    }
}

/// Number of effectively independent samples, `N / (2 τ_int)`, at least 1.
pub fn effective_sample_size(data: &[f64]) -> f64 {
    let n = data.len() as f64;
    (n / (2.0 * integrated_autocorr_time(data))).max(1.0)
}

/// Mean and autocorrelation-corrected standard error `σ sqrt(2 τ_int / N)`.
pub fn corrected_error(data: &[f64]) -> (f64, f64) {
    let n = data.len();
    if n < 2 {
        return (data.first().copied().unwrap_or(0.0), 0.0);
    }
    let nf = n as f64;
    let mean = data.iter().sum::<f64>() / nf;
    let var = data.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / (nf - 1.0);
    let tau = integrated_autocorr_time(data);
    (mean, (var * 2.0 * tau / nf).sqrt())
}

/// Window length used by [`detect_thermalization`] when none is given.
pub const THERMALIZATION_WINDOW: usize = 10;

/// Number of leading samples to discard as thermalization.
///
/// The series is cut into windows of `window_size` samples. The second half of
/// the windows is taken as stationary; the first run of
/// `min(3, n_windows / 3)` consecutive windows whose means lie within
/// 3 sigma of the stationary mean marks the end of thermalization. If no such
/// run exists the second half's start is returned. Series shorter than three
/// windows return 0.
pub fn detect_thermalization(data: &[f64], window_size: usize) -> usize {
    let n = data.len();
    if window_size == 0 || n < 2 * window_size {
        return 0;
    }
    let n_windows = n / window_size;
    if n_windows < 3 {
        return 0;
    }

    let window_means: Vec<f64> = data
        .chunks_exact(window_size)
        .map(|w| w.iter().sum::<f64>() / window_size as f64)
        .collect();

    let stationary_start = n_windows / 2;
    let stationary = &window_means[stationary_start..];
    let len = stationary.len() as f64;
    let mean = stationary.iter().sum::<f64>() / len;
    let std = (stationary.iter().map(|&m| (m - mean).powi(2)).sum::<f64>() / len).sqrt();
    let threshold = if std < 1e-15 { 1e-10 } else { 3.0 * std };

    let n_consecutive = 3.min(n_windows / 3);
    window_means
        .windows(n_consecutive)
        .position(|block| block.iter().all(|&m| (m - mean).abs() <= threshold))
        .map_or(stationary_start * window_size, |i| i * window_size)
}

/// Every `interval`-th value; `None` picks `ceil(2 τ_int)`.
pub fn thin(data: &[f64], interval: Option<usize>) -> Vec<f64> {
    let interval = interval
        .unwrap_or_else(|| (2.0 * integrated_autocorr_time(data)).ceil() as usize)
        .max(1);
    data.iter().step_by(interval).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    fn white_noise(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0, 1.0).unwrap();
        (0..n).map(|_| normal.sample(&mut rng)).collect()
    }

    /// AR(1) chain x_{t+1} = phi x_t + noise; τ_int = (1 + phi) / (2 (1 - phi)).
    fn ar1(n: usize, phi: f64, seed: u64) -> Vec<f64> {
        let noise = white_noise(n, seed);
        let mut x = 0.0;
        noise
            .iter()
            .map(|&e| {
                x = phi * x + e;
                x
            })
            .collect()
    }

    #[test]
    fn test_lag_zero_is_one() {
        let data = white_noise(500, 3);
        let rho = autocorrelation(&data, 10);
        assert_eq!(rho.len(), 11);
        assert_relative_eq!(rho[0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_series() {
        assert_eq!(autocorrelation(&[4.0; 6], 3), vec![1.0; 4]);
        assert_eq!(autocorrelation(&[4.0; 3], 10).len(), 3);
    }

    #[test]
    fn test_white_noise_tau_near_half() {
        let data = white_noise(20_000, 17);
        let tau = integrated_autocorr_time(&data);
        assert!((tau - 0.5).abs() < 0.1, "tau = {}", tau);
        let n_eff = effective_sample_size(&data);
        assert!(n_eff > 15_000.0, "n_eff = {}", n_eff);
    }

    #[test]
    fn test_correlated_chain() {
        let phi = 0.8;
        let data = ar1(50_000, phi, 23);
        let expected = (1.0 + phi) / (2.0 * (1.0 - phi));
        let tau = integrated_autocorr_time(&data);
        assert!((tau - expected).abs() / expected < 0.2, "tau = {}, expected {}", tau, expected);
        assert!(effective_sample_size(&data) < 10_000.0);

        let (_, err) = corrected_error(&data);
        let n = data.len() as f64;
        let mean = data.iter().sum::<f64>() / n;
        let naive = (data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0) / n).sqrt();
        assert!(err > 2.0 * naive);
    }

    #[test]
    fn test_thin() {
        let data: Vec<f64> = (0..10).map(|i| i as f64).collect();
        assert_eq!(thin(&data, Some(3)), vec![0.0, 3.0, 6.0, 9.0]);
        assert_eq!(thin(&data, Some(0)), data);
        assert!(thin(&ar1(5_000, 0.9, 5), None).len() < 1_000);
    }

    #[test]
    fn test_stationary_series_skips_little() {
        let data = white_noise(2_000, 31);
        assert!(detect_thermalization(&data, THERMALIZATION_WINDOW) < 50);
        assert_eq!(detect_thermalization(&[1.5; 100], 10), 0);
    }

    #[test]
    fn test_relaxing_series_skips_the_transient() {
        // exponential relaxation from 50 onto unit white noise, decay length 40
        let noise = white_noise(2_000, 37);
        let data: Vec<f64> = noise
            .iter()
            .enumerate()
            .map(|(i, &e)| 50.0 * (-(i as f64) / 40.0).exp() + e)
            .collect();
        let skip = detect_thermalization(&data, THERMALIZATION_WINDOW);
        assert_eq!(skip % THERMALIZATION_WINDOW, 0);
        // the transient is still above 3 sigma of the window means at i = 100
        assert!(skip >= 100, "skip = {}", skip);
        assert!(skip <= 400, "skip = {}", skip);
    }

    #[test]
    fn test_linear_drift_skips_early_windows() {
        let data: Vec<f64> = (0..100).map(|i| i as f64).collect();
        // window means 4.5, 14.5, .. 94.5; stationary half 54.5 .. 94.5 has
        // mean 74.5 and std sqrt(200), so windows from 34.5 on lie within 3 sigma
        assert_eq!(detect_thermalization(&data, 10), 30);
    }

    #[test]
    fn test_thermalization_short_series() {
        assert_eq!(detect_thermalization(&[1.0; 15], 10), 0);
        assert_eq!(detect_thermalization(&[1.0; 25], 10), 0);
        assert_eq!(detect_thermalization(&[1.0; 25], 0), 0);
    }

    #[test]
    fn test_short_series() {
        assert_eq!(integrated_autocorr_time(&[1.0]), 0.5);
        assert_eq!(corrected_error(&[2.0]), (2.0, 0.0));
        assert_eq!(effective_sample_size(&[]), 1.0);
    }
}

//! Spatial correlation `<a_0 a*_x>` estimated from the sample stream.

use crate::io::Sample;
use super::autocorrelation::{
    corrected_error, detect_thermalization, effective_sample_size, integrated_autocorr_time,
    THERMALIZATION_WINDOW,
};
use super::jackknife::jackknife;

/// Per-sample series `Re(a_0 · a*_x)` for every site `x`.
///
/// Entry `[x][i]` belongs to sample `i`. All samples must carry the same
/// number of sites.
pub fn site_correlations(samples: &[Sample]) -> Vec<Vec<f64>> {
    let n_sites = samples.first().map_or(0, |s| s.field.len());
    (0..n_sites)
        .map(|x| {
            samples
                .iter()
                .map(|s| (s.field[0] * s.partner[x]).re)
                .collect()
        })
        .collect()
}

/// Statistics of the correlation at one site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SiteEstimate {
    pub site: usize,
    pub mean: f64,
    pub error: f64,
    pub tau_int: f64,
    pub n_eff: f64,
}

/// Jackknife mean and error plus autocorrelation diagnostics for every site.
pub fn correlation_estimates(samples: &[Sample]) -> Vec<SiteEstimate> {
    site_correlations(samples)
        .iter()
        .enumerate()
        .map(|(site, series)| {
            let (mean, error) = jackknife(series);
            SiteEstimate {
                site,
                mean,
                error,
                tau_int: integrated_autocorr_time(series),
                n_eff: effective_sample_size(series),
            }
        })
        .collect()
}

/// Thermalization and autocorrelation diagnostics of the correlation at the
/// middle site `n_sites / 2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MidpointDiagnostics {
    pub site: usize,
    /// Leading samples to discard
    pub skip: usize,
    /// Corrected mean and error of the kept samples, when enough remain
    pub corrected: Option<(f64, f64)>,
    pub n_eff: Option<f64>,
}

/// Skip detection needs more than this many samples.
const MIN_SAMPLES_FOR_SKIP: usize = 20;
/// Samples that must survive the skip for the corrected estimate.
const MIN_KEPT_SAMPLES: usize = 10;

pub fn midpoint_diagnostics(samples: &[Sample]) -> Option<MidpointDiagnostics> {
    let n_sites = samples.first()?.field.len();
    let site = n_sites / 2;
    let series: Vec<f64> = samples.iter().map(|s| (s.field[0] * s.partner[site]).re).collect();
    let n = series.len();
    if n <= MIN_SAMPLES_FOR_SKIP {
        return Some(MidpointDiagnostics { site, skip: 0, corrected: None, n_eff: None });
    }

    let skip = detect_thermalization(&series, THERMALIZATION_WINDOW);
    let (corrected, n_eff) = if skip + MIN_KEPT_SAMPLES < n {
        let kept = &series[skip..];
        (Some(corrected_error(kept)), Some(effective_sample_size(kept)))
    } else {
        (None, None)
    };
    Some(MidpointDiagnostics { site, skip, corrected, n_eff })
}

//! Analysis module - statistics over the recorded sample stream.

mod jackknife;
mod autocorrelation;
mod correlation;

pub use jackknife::jackknife;
pub use autocorrelation::{
    autocorrelation, corrected_error, detect_thermalization, effective_sample_size, integrated_autocorr_time, thin,
    THERMALIZATION_WINDOW,
};
pub use correlation::{correlation_estimates, midpoint_diagnostics, site_correlations, MidpointDiagnostics, SiteEstimate};

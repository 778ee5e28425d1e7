// =============================================================================
// error.rs — EVERYTHING THAT CAN GO WRONG BETWEEN "WHERE IS IT?" AND AN ANSWER
// =============================================================================

use std::time::Duration;

/// Why a single provider could not produce a record.
///
/// The dispatcher absorbs these: one courier being down never takes the
/// others with it.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} answered with HTTP {status}")]
    Status { provider: String, status: u16 },

    #[error("could not decode {provider} response: {reason}")]
    Decode { provider: String, reason: String },

    #[error("{provider} has no data for {tracking_number}")]
    NoData {
        provider: String,
        tracking_number: String,
    },

    #[error("fetch did not finish within {0:?}")]
    Timeout(Duration),

    #[error("fetch task panicked: {0}")]
    Panicked(String),
}

/// Why a tracking number could not be resolved at all.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Could not find a tracker for tracking number {tracking_number}")]
    NoProviderFound { tracking_number: String },

    #[error(
        "All {count} matching providers failed for {tracking_number}",
        count = .failures.len()
    )]
    AllProvidersFailed {
        tracking_number: String,
        /// `(provider name, error)` in registration order.
        failures: Vec<(String, FetchError)>,
    },
}

pub type ResolveResult<T> = Result<T, ResolveError>;

// =============================================================================
// dispatcher.rs — ASK EVERYONE, WAIT FOR EVERYONE, BELIEVE THE FIRST
// =============================================================================
//
// One call to `resolve` does the whole job:
//
// 1. normalize the tracking number and ask the registry who recognises it
// 2. spawn one tokio task per matching provider (fan-out)
// 3. wait for every task, successes and failures alike (fan-in)
// 4. replace each failed slot with a fresh empty record
// 5. merge the slots in registration order
//
// A courier that errors, panics or blows through its deadline costs us its
// own slot and nothing else. Only when every single one of them falls over
// does the caller get an error instead of a parcel.
//
// Delegation (YunExpress handing off to Speedy, for example) happens inside
// a provider's own task. The dispatcher never hears about it.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{FetchError, ResolveError, ResolveResult};
use crate::merge::merge_parcels;
use crate::metrics::ResolverMetrics;
use crate::models::ParcelInfo;
use crate::provider::{normalize_tracking_number, FetchContext, Provider};
use crate::registry::Registry;

/// Resolves tracking numbers against a fixed registry.
pub struct Dispatcher {
    registry: Arc<Registry>,
    fetch_timeout: Option<Duration>,
    metrics: Arc<ResolverMetrics>,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>, config: &Config) -> Self {
        Self {
            registry,
            fetch_timeout: config.fetch_timeout,
            metrics: Arc::new(ResolverMetrics::new()),
        }
    }

    /// Override the per-fetch deadline. `None` waits forever.
    pub fn with_fetch_timeout(mut self, fetch_timeout: Option<Duration>) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn metrics(&self) -> Arc<ResolverMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Turn a user-supplied identifier into one canonical record.
    ///
    /// The identifier is trimmed and uppercased before matching, so
    /// `" yt2400000000000001 "` resolves the same as `"YT2400000000000001"`.
    ///
    /// Fails with [`ResolveError::NoProviderFound`] when no pattern matches
    /// and with [`ResolveError::AllProvidersFailed`] when every matching
    /// provider errored. A record that comes back empty is still a success.
    /// Check [`ParcelInfo::is_empty`] to tell the two apart.
    pub async fn resolve(&self, identifier: &str) -> ResolveResult<ParcelInfo> {
        let tracking_number = normalize_tracking_number(identifier);
        let span = info_span!(
            "resolve",
            resolution_id = %Uuid::new_v4(),
            tracking_number = %tracking_number
        );
        self.resolve_normalized(tracking_number).instrument(span).await
    }

    async fn resolve_normalized(&self, tracking_number: String) -> ResolveResult<ParcelInfo> {
        self.metrics.increment_resolutions();

        let providers = self.registry.find_matching(&tracking_number);
        if providers.is_empty() {
            self.metrics.increment_unresolved();
            warn!("No registered provider recognises this tracking number");
            return Err(ResolveError::NoProviderFound { tracking_number });
        }

        info!(
            providers = providers.len(),
            names = ?providers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            "Dispatching lookups"
        );

        let ctx = FetchContext::root(Arc::clone(&self.registry))
            .with_metrics(Arc::clone(&self.metrics));

        let handles: Vec<_> = providers
            .iter()
            .map(|provider| {
                self.metrics.increment_provider_fetches();
                let provider = Arc::clone(provider);
                let ctx = ctx.clone();
                let tracking_number = tracking_number.clone();
                let deadline = self.fetch_timeout;
                let span = info_span!("fetch", provider = %provider.name());
                tokio::spawn(
                    async move {
                        fetch_with_deadline(provider.as_ref(), &tracking_number, &ctx, deadline)
                            .await
                    }
                    .instrument(span),
                )
            })
            .collect();

        let outcomes = join_all(handles).await;

        let mut parcels = Vec::with_capacity(providers.len());
        let mut failures = Vec::new();

        for (provider, outcome) in providers.iter().zip(outcomes) {
            let result = outcome.unwrap_or_else(|e| Err(FetchError::Panicked(e.to_string())));
            match result {
                Ok(parcel) => {
                    debug!(
                        provider = %provider.name(),
                        events = parcel.events().len(),
                        empty = parcel.is_empty(),
                        "Provider answered"
                    );
                    parcels.push(parcel);
                }
                Err(e) => {
                    self.metrics.increment_provider_failures();
                    if matches!(e, FetchError::Timeout(_)) {
                        self.metrics.increment_provider_timeouts();
                    }
                    warn!(provider = %provider.name(), error = %e, "Provider fetch failed");
                    parcels.push(ParcelInfo::default());
                    failures.push((provider.name().to_string(), e));
                }
            }
        }

        if failures.len() == providers.len() {
            self.metrics.increment_unresolved();
            warn!(failures = failures.len(), "Every matching provider failed");
            return Err(ResolveError::AllProvidersFailed {
                tracking_number,
                failures,
            });
        }

        let merged = merge_parcels(&parcels);
        self.metrics.add_events_merged(merged.events().len());

        info!(
            answered = providers.len() - failures.len(),
            failed = failures.len(),
            events = merged.events().len(),
            destination = %merged.destination,
            "Resolution complete"
        );

        Ok(merged)
    }
}

async fn fetch_with_deadline(
    provider: &dyn Provider,
    tracking_number: &str,
    ctx: &FetchContext,
    deadline: Option<Duration>,
) -> Result<ParcelInfo, FetchError> {
    let fetch = provider.fetch(tracking_number, ctx);
    match deadline {
        Some(limit) => tokio::time::timeout(limit, fetch)
            .await
            .unwrap_or_else(|_| Err(FetchError::Timeout(limit))),
        None => fetch.await,
    }
}

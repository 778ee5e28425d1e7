// =============================================================================
// provider.rs — WHAT IT TAKES TO BE A COURIER
// =============================================================================
//
// Every courier the engine knows about implements `Provider`. A provider
// declares which tracking numbers it recognises, which website it lives on,
// and how to turn a tracking number into a ParcelInfo.
//
// Adding a courier means writing one more implementation and appending it
// to the registration list in providers/mod.rs. The dispatcher and the merger
// never learn its name.
// =============================================================================

use async_trait::async_trait;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

use crate::error::FetchError;
use crate::metrics::ResolverMetrics;
use crate::models::ParcelInfo;
use crate::registry::{domain_from_url, Registry};

/// How many provider-to-provider hops a single top-level fetch may take.
pub const MAX_DELEGATION_HOPS: u8 = 1;

/// Trim and uppercase a user-supplied tracking number.
pub fn normalize_tracking_number(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// A tracking-number pattern that must match the *whole* identifier.
///
/// The source is wrapped as `^(?:...)$`, so `[0-9]{11}` never matches a
/// twelve-digit number that merely contains eleven digits. The empty
/// pattern matches nothing.
#[derive(Clone)]
pub struct TrackingPattern {
    source: String,
    compiled: Option<Regex>,
}

impl TrackingPattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let compiled = if pattern.is_empty() {
            None
        } else {
            Some(Regex::new(&format!("^(?:{})$", pattern))?)
        };
        Ok(Self {
            source: pattern.to_string(),
            compiled,
        })
    }

    /// A pattern that never matches. Providers registered with it are only
    /// reachable through delegation.
    pub fn none() -> Self {
        Self {
            source: String::new(),
            compiled: None,
        }
    }

    pub fn is_match(&self, tracking_number: &str) -> bool {
        self.compiled
            .as_ref()
            .is_some_and(|re| re.is_match(tracking_number))
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_none()
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for TrackingPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrackingPattern({:?})", self.source)
    }
}

/// One courier or aggregator that can look up a tracking number.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Display name, stamped on every event this provider produces.
    fn name(&self) -> &str;

    /// The site this provider speaks for, e.g. `speedy.bg`. Used to find
    /// delegation targets.
    fn origin_domain(&self) -> &str;

    fn pattern(&self) -> &TrackingPattern;

    /// Whether an already-normalized tracking number belongs to this provider.
    fn accepts(&self, tracking_number: &str) -> bool {
        self.pattern().is_match(tracking_number)
    }

    /// Look the tracking number up.
    ///
    /// Implementations normalize the number and re-check it against their
    /// own pattern, because delegation calls them without going through the
    /// registry. A number that fails the check gets `ParcelInfo::default()`
    /// back, not an error.
    async fn fetch(
        &self,
        tracking_number: &str,
        ctx: &FetchContext,
    ) -> Result<ParcelInfo, FetchError>;
}

/// What a provider may reach while it fetches: the registry, for
/// delegation, how deep in a delegation chain it already is, and which
/// domains that chain has already passed through.
#[derive(Clone)]
pub struct FetchContext {
    registry: Arc<Registry>,
    depth: u8,
    visited: Vec<String>,
    metrics: Option<Arc<ResolverMetrics>>,
}

impl FetchContext {
    /// Context for a top-level fetch started by the dispatcher.
    pub fn root(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            depth: 0,
            visited: Vec::new(),
            metrics: None,
        }
    }

    /// Count delegations into `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<ResolverMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Context that cannot delegate anywhere. Handy for calling a provider
    /// on its own.
    pub fn detached() -> Self {
        Self {
            registry: Arc::new(Registry::default()),
            depth: MAX_DELEGATION_HOPS,
            visited: Vec::new(),
            metrics: None,
        }
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn can_delegate(&self) -> bool {
        self.depth < MAX_DELEGATION_HOPS
    }

    /// Find the provider registered for `domain`, together with the context
    /// its fetch must run under. `from` is the calling provider's own origin
    /// domain.
    ///
    /// Returns `None` when the hop budget is spent, when nobody owns the
    /// domain, or when the domain is the caller's own or was already visited
    /// on this chain. A provider never ends up asking itself.
    pub fn delegate(
        &self,
        from: &str,
        domain: &str,
    ) -> Option<(Arc<dyn Provider>, FetchContext)> {
        let seen = domain == from || self.visited.iter().any(|d| d == domain);
        if !self.can_delegate() || seen {
            return None;
        }
        let provider = self.registry.find_by_domain(domain)?;

        let mut visited = self.visited.clone();
        visited.push(from.to_string());
        visited.push(domain.to_string());
        let nested = FetchContext {
            registry: Arc::clone(&self.registry),
            depth: self.depth + 1,
            visited,
            metrics: self.metrics.clone(),
        };
        if let Some(metrics) = &self.metrics {
            metrics.increment_delegations();
        }
        Some((provider, nested))
    }

    /// Same as [`FetchContext::delegate`], starting from a full URL such as
    /// `https://www.speedy.bg/en/track`.
    pub fn delegate_for_url(
        &self,
        from: &str,
        url: &str,
    ) -> Option<(Arc<dyn Provider>, FetchContext)> {
        let domain = domain_from_url(url)?;
        self.delegate(from, &domain)
    }
}

impl fmt::Debug for FetchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchContext")
            .field("providers", &self.registry.len())
            .field("depth", &self.depth)
            .field("visited", &self.visited)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_is_anchored() {
        let pattern = TrackingPattern::new("[0-9]{11}").unwrap();
        assert!(pattern.is_match("12345678901"));
        assert!(!pattern.is_match("123456789012"));
        assert!(!pattern.is_match("X12345678901"));
    }

    #[test]
    fn test_alternation_is_anchored_on_both_branches() {
        let pattern = TrackingPattern::new(r"\d{12,15}|\d{20,22}").unwrap();
        assert!(pattern.is_match("123456789012"));
        assert!(pattern.is_match("12345678901234567890"));
        assert!(!pattern.is_match("1234567890123456"));
    }

    #[test]
    fn test_already_anchored_pattern_still_works() {
        let pattern = TrackingPattern::new("^[A-Z]{2}[0-9]{16}$").unwrap();
        assert!(pattern.is_match("YT2400000000000001"));
    }

    #[test]
    fn test_empty_pattern_never_matches() {
        let pattern = TrackingPattern::new("").unwrap();
        assert!(pattern.is_empty());
        assert!(!pattern.is_match(""));
        assert!(!TrackingPattern::none().is_match("anything"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_tracking_number("  yt123 \n"), "YT123");
    }

    struct Site {
        domain: &'static str,
        pattern: TrackingPattern,
    }

    #[async_trait]
    impl Provider for Site {
        fn name(&self) -> &str {
            self.domain
        }

        fn origin_domain(&self) -> &str {
            self.domain
        }

        fn pattern(&self) -> &TrackingPattern {
            &self.pattern
        }

        async fn fetch(&self, _: &str, _: &FetchContext) -> Result<ParcelInfo, FetchError> {
            Ok(ParcelInfo::default())
        }
    }

    fn two_sites() -> Arc<Registry> {
        let site = |domain| -> Arc<dyn Provider> {
            Arc::new(Site {
                domain,
                pattern: TrackingPattern::none(),
            })
        };
        Arc::new(
            Registry::builder()
                .register(site("yuntrack.com"))
                .register(site("speedy.bg"))
                .build(),
        )
    }

    #[test]
    fn test_provider_never_delegates_to_itself() {
        let ctx = FetchContext::root(two_sites());
        assert!(ctx.delegate("yuntrack.com", "yuntrack.com").is_none());
        assert!(ctx
            .delegate_for_url("yuntrack.com", "https://www.yuntrack.com/")
            .is_none());
    }

    #[test]
    fn test_nested_context_remembers_the_chain() {
        let ctx = FetchContext::root(two_sites());
        let (target, nested) = ctx
            .delegate_for_url("yuntrack.com", "https://www.speedy.bg/en/")
            .unwrap();
        assert_eq!(target.origin_domain(), "speedy.bg");
        assert_eq!(nested.depth(), 1);
        assert_eq!(nested.visited, vec!["yuntrack.com", "speedy.bg"]);
        assert!(nested.delegate("speedy.bg", "yuntrack.com").is_none());
    }

    #[test]
    fn test_detached_context_cannot_delegate() {
        let ctx = FetchContext::detached();
        assert!(!ctx.can_delegate());
        assert!(ctx.delegate("yuntrack.com", "speedy.bg").is_none());
    }
}

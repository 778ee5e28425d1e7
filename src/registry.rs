// =============================================================================
// registry.rs — THE ROLL CALL OF COURIERS
// =============================================================================
//
// The registry is filled once at startup and never mutated afterwards. It is
// shared as Arc<Registry> between the dispatcher and every fetch task, and
// nothing needs a lock because nothing ever writes to it.
//
// Need a different provider set? `with_provider` hands back a brand new
// Registry and leaves the old one exactly as it was.
// =============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::provider::Provider;

/// The immutable, ordered set of known providers.
///
/// Registration order matters. It decides which provider's scalar fields
/// win when several of them answer for the same tracking number.
#[derive(Clone, Default)]
pub struct Registry {
    providers: Vec<Arc<dyn Provider>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// A copy of this registry with one more provider appended.
    pub fn with_provider(&self, provider: Arc<dyn Provider>) -> Registry {
        let mut providers = self.providers.clone();
        providers.push(provider);
        Registry { providers }
    }

    /// The first provider whose origin domain equals `domain` exactly.
    pub fn find_by_domain(&self, domain: &str) -> Option<Arc<dyn Provider>> {
        self.providers
            .iter()
            .find(|p| p.origin_domain() == domain)
            .cloned()
    }

    /// Every provider whose pattern fully matches `tracking_number`, in
    /// registration order. Providers with an empty pattern are never
    /// returned. An empty result is a normal answer.
    pub fn find_matching(&self, tracking_number: &str) -> Vec<Arc<dyn Provider>> {
        let matched: Vec<Arc<dyn Provider>> = self
            .providers
            .iter()
            .filter(|p| !p.pattern().is_empty() && p.accepts(tracking_number))
            .cloned()
            .collect();

        debug!(
            tracking_number = tracking_number,
            matched = matched.len(),
            registered = self.providers.len(),
            "Registry lookup"
        );

        matched
    }

    pub fn providers(&self) -> impl Iterator<Item = &Arc<dyn Provider>> {
        self.providers.iter()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.providers.iter().map(|p| p.name()))
            .finish()
    }
}

/// Collects providers before the registry is sealed.
#[derive(Default)]
pub struct RegistryBuilder {
    providers: Vec<Arc<dyn Provider>>,
}

impl RegistryBuilder {
    pub fn register(mut self, provider: Arc<dyn Provider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn build(self) -> Registry {
        Registry {
            providers: self.providers,
        }
    }
}

/// Host part of a URL with any leading `www.` removed.
///
/// `https://www.speedy.bg/en/track` becomes `speedy.bg`. Returns `None` for
/// anything that does not parse as an absolute URL with a host.
pub fn domain_from_url(raw: &str) -> Option<String> {
    let parsed = url::Url::parse(raw.trim()).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::models::ParcelInfo;
    use crate::provider::{FetchContext, TrackingPattern};
    use async_trait::async_trait;

    struct Named {
        name: &'static str,
        domain: &'static str,
        pattern: TrackingPattern,
    }

    impl Named {
        fn new(name: &'static str, domain: &'static str, pattern: &str) -> Arc<dyn Provider> {
            Arc::new(Named {
                name,
                domain,
                pattern: TrackingPattern::new(pattern).unwrap(),
            })
        }
    }

    #[async_trait]
    impl Provider for Named {
        fn name(&self) -> &str {
            self.name
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

    fn registry() -> Registry {
        Registry::builder()
            .register(Named::new("Digits", "digits.example", "[0-9]{11}"))
            .register(Named::new("Letters", "letters.example", "[A-Z]{2}[0-9]{16}"))
            .register(Named::new("Silent", "silent.example", ""))
            .register(Named::new("AlsoDigits", "digits2.example", "[0-9]+"))
            .build()
    }

    #[test]
    fn test_find_matching_keeps_registration_order() {
        let names: Vec<String> = registry()
            .find_matching("12345678901")
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["Digits", "AlsoDigits"]);
    }

    #[test]
    fn test_find_matching_is_anchored() {
        let matched = registry().find_matching("YT24000000000000011");
        assert!(matched.is_empty());
    }

    #[test]
    fn test_empty_pattern_provider_never_matches() {
        let matched = registry().find_matching("");
        assert!(matched.is_empty());
    }

    #[test]
    fn test_find_by_domain_exact() {
        let reg = registry();
        assert_eq!(reg.find_by_domain("silent.example").unwrap().name(), "Silent");
        assert!(reg.find_by_domain("example").is_none());
        assert!(reg.find_by_domain("www.silent.example").is_none());
    }

    #[test]
    fn test_with_provider_leaves_original_alone() {
        let reg = registry();
        let bigger = reg.with_provider(Named::new("Extra", "extra.example", "X"));
        assert_eq!(reg.len(), 4);
        assert_eq!(bigger.len(), 5);
        assert!(reg.find_by_domain("extra.example").is_none());
    }

    #[test]
    fn test_domain_from_url() {
        assert_eq!(
            domain_from_url("https://www.speedy.bg/en/track-shipment").as_deref(),
            Some("speedy.bg")
        );
        assert_eq!(domain_from_url("http://yuntrack.com").as_deref(), Some("yuntrack.com"));
        assert_eq!(domain_from_url("not a url"), None);
        assert_eq!(domain_from_url(""), None);
    }
}

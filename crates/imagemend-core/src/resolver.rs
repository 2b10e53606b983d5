use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::classify::{ClassifierInput, classify};
use crate::models::CandidateImage;
use crate::provider::ImageSearchProvider;
use crate::throttle::Throttle;

/// Broken URL to chosen replacement. Entries are never evicted within a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementCache {
    entries: HashMap<String, String>,
}

impl ReplacementCache {
    #[must_use]
    pub fn get(&self, broken_url: &str) -> Option<&str> {
        self.entries.get(broken_url).map(String::as_str)
    }

    fn insert(&mut self, broken_url: &str, replacement_url: &str) {
        self.entries
            .entry(broken_url.to_string())
            .or_insert_with(|| replacement_url.to_string());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn as_map(&self) -> &HashMap<String, String> {
        &self.entries
    }
}

/// Query to provider outcome. A `None` value records a search that found
/// nothing, so it is not repeated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCache {
    entries: HashMap<String, Option<CandidateImage>>,
}

impl SearchCache {
    #[must_use]
    pub fn get(&self, query: &str) -> Option<Option<&CandidateImage>> {
        self.entries.get(query).map(Option::as_ref)
    }

    #[must_use]
    pub fn contains(&self, query: &str) -> bool {
        self.entries.contains_key(query)
    }

    fn insert(&mut self, query: &str, outcome: Option<CandidateImage>) {
        self.entries.insert(query.to_string(), outcome);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunCaches {
    pub replacements: ReplacementCache,
    pub searches: SearchCache,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    ReplacementCache,
    SearchCache,
    Provider,
    ProviderError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub replacement: Option<String>,
    /// `None` only when the replacement cache answered before classification.
    pub query: Option<&'static str>,
    pub source: ResolutionSource,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolverStats {
    pub provider_calls: usize,
    pub provider_errors: usize,
    pub empty_results: usize,
    pub search_cache_hits: usize,
    pub replacement_cache_hits: usize,
}

#[derive(Debug)]
pub struct SearchResolver<P, T> {
    provider: P,
    throttle: T,
    stats: ResolverStats,
}

impl<P, T> SearchResolver<P, T>
where
    P: ImageSearchProvider,
    T: Throttle,
{
    pub fn new(provider: P, throttle: T) -> Self {
        Self {
            provider,
            throttle,
            stats: ResolverStats::default(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn throttle(&self) -> &T {
        &self.throttle
    }

    pub fn stats(&self) -> ResolverStats {
        self.stats
    }

    pub fn resolve_replacement(
        &mut self,
        caches: &mut RunCaches,
        broken_url: &str,
        json_path: &str,
        file_name: &str,
    ) -> Option<String> {
        self.resolve(caches, broken_url, json_path, file_name)
            .replacement
    }

    pub fn resolve(
        &mut self,
        caches: &mut RunCaches,
        broken_url: &str,
        json_path: &str,
        file_name: &str,
    ) -> Resolution {
        if let Some(cached) = caches.replacements.get(broken_url) {
            self.stats.replacement_cache_hits += 1;
            debug!(broken_url, replacement = cached, "replacement cache hit");
            return Resolution {
                replacement: Some(cached.to_string()),
                query: None,
                source: ResolutionSource::ReplacementCache,
                error: None,
            };
        }

        let query = classify(ClassifierInput::new(broken_url, json_path, file_name));
        let (source, error) = if caches.searches.contains(query) {
            self.stats.search_cache_hits += 1;
            debug!(query, "search cache hit");
            (ResolutionSource::SearchCache, None)
        } else {
            self.search_uncached(caches, query)
        };

        let replacement = caches
            .searches
            .get(query)
            .flatten()
            .map(|candidate| candidate.replacement_url().to_string());
        if let Some(url) = &replacement {
            caches.replacements.insert(broken_url, url);
        }

        Resolution {
            replacement,
            query: Some(query),
            source,
            error,
        }
    }

    fn search_uncached(
        &mut self,
        caches: &mut RunCaches,
        query: &'static str,
    ) -> (ResolutionSource, Option<String>) {
        self.stats.provider_calls += 1;
        let outcome = self.provider.search(query);
        self.throttle.after_provider_call();

        match outcome {
            Ok(Some(candidate)) => {
                debug!(query, candidate = %candidate.id, "provider returned candidate");
                caches.searches.insert(query, Some(candidate));
                (ResolutionSource::Provider, None)
            }
            Ok(None) => {
                self.stats.empty_results += 1;
                warn!(query, "provider returned no results");
                caches.searches.insert(query, None);
                (ResolutionSource::Provider, None)
            }
            Err(err) => {
                self.stats.provider_errors += 1;
                warn!(query, error = %err, "provider search failed");
                caches.searches.insert(query, None);
                (ResolutionSource::ProviderError, Some(err.to_string()))
            }
        }
    }
}

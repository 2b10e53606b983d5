use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;

use crate::config::SearchProviderConfig;
use crate::error::{MendError, Result};
use crate::models::{Attribution, CandidateImage, ImageUrls};

/// Source of replacement images. `Ok(None)` means the provider answered but
/// had nothing for the query.
pub trait ImageSearchProvider {
    fn search(&self, query: &str) -> Result<Option<CandidateImage>>;
}

impl<P: ImageSearchProvider + ?Sized> ImageSearchProvider for &P {
    fn search(&self, query: &str) -> Result<Option<CandidateImage>> {
        (**self).search(query)
    }
}

#[derive(Clone)]
pub struct UnsplashProvider {
    config: SearchProviderConfig,
    http: Client,
}

impl std::fmt::Debug for UnsplashProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnsplashProvider")
            .field("endpoint", &self.config.endpoint)
            .finish_non_exhaustive()
    }
}

impl UnsplashProvider {
    pub fn new(config: SearchProviderConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Client-ID {}", config.access_key))
            .map_err(|e| MendError::Validation(format!("invalid search access key: {e}")))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert("Accept-Version", HeaderValue::from_static("v1"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self { config, http })
    }
}

impl ImageSearchProvider for UnsplashProvider {
    fn search(&self, query: &str) -> Result<Option<CandidateImage>> {
        let resp = self
            .http
            .get(&self.config.endpoint)
            .query(&[
                ("query", query),
                ("per_page", "1"),
                ("orientation", "landscape"),
            ])
            .send()?;
        if !resp.status().is_success() {
            return Err(MendError::Provider(format!(
                "photo search for {query:?} failed with status {}",
                resp.status()
            )));
        }
        let body = resp.json::<SearchResponse>()?;
        Ok(first_candidate(body))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<PhotoResult>,
}

#[derive(Debug, Deserialize)]
struct PhotoResult {
    id: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    alt_description: Option<String>,
    urls: ImageUrls,
    #[serde(default)]
    user: Option<PhotoUser>,
}

#[derive(Debug, Deserialize)]
struct PhotoUser {
    name: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    links: Option<PhotoUserLinks>,
}

#[derive(Debug, Deserialize)]
struct PhotoUserLinks {
    #[serde(default)]
    html: Option<String>,
}

fn first_candidate(body: SearchResponse) -> Option<CandidateImage> {
    let photo = body.results.into_iter().next()?;
    let attribution = photo.user.map_or_else(
        || Attribution {
            name: "unknown".to_string(),
            username: None,
            profile_url: None,
        },
        |user| Attribution {
            name: user.name,
            username: user.username,
            profile_url: user.links.and_then(|links| links.html),
        },
    );
    Some(CandidateImage {
        id: photo.id,
        urls: photo.urls,
        attribution,
        description: photo.description.or(photo.alt_description),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(value: serde_json::Value) -> Option<CandidateImage> {
        first_candidate(serde_json::from_value(value).expect("search response"))
    }

    #[test]
    fn first_result_becomes_candidate_with_attribution() {
        let candidate = parse(serde_json::json!({
            "total": 2,
            "total_pages": 2,
            "results": [
                {
                    "id": "abc123",
                    "description": null,
                    "alt_description": "white bathroom with sea view",
                    "urls": {
                        "raw": "https://images.example/abc123?raw",
                        "full": "https://images.example/abc123?full",
                        "regular": "https://images.example/abc123?w=1080",
                        "small": "https://images.example/abc123?w=400",
                        "thumb": "https://images.example/abc123?w=200"
                    },
                    "user": {
                        "name": "Giulia Rossi",
                        "username": "giuliar",
                        "links": { "html": "https://unsplash.com/@giuliar" }
                    }
                },
                {
                    "id": "second",
                    "urls": {
                        "raw": "r", "full": "f", "regular": "g", "small": "s"
                    }
                }
            ]
        }))
        .expect("candidate");

        assert_eq!(candidate.id, "abc123");
        assert_eq!(
            candidate.replacement_url(),
            "https://images.example/abc123?w=1080"
        );
        assert_eq!(candidate.attribution.name, "Giulia Rossi");
        assert_eq!(
            candidate.attribution.profile_url.as_deref(),
            Some("https://unsplash.com/@giuliar")
        );
        assert_eq!(
            candidate.description.as_deref(),
            Some("white bathroom with sea view")
        );
    }

    #[test]
    fn empty_results_yield_no_candidate() {
        assert!(parse(serde_json::json!({ "total": 0, "results": [] })).is_none());
        assert!(parse(serde_json::json!({})).is_none());
    }

    #[test]
    fn provider_rejects_access_key_with_control_characters() {
        let err = UnsplashProvider::new(SearchProviderConfig::new("bad\nkey"))
            .expect_err("invalid header value");
        assert!(matches!(err, MendError::Validation(_)));
    }
}

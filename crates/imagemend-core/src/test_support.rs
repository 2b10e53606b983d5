use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::{MendError, Result};
use crate::models::{Attribution, CandidateImage, ImageUrls};
use crate::provider::ImageSearchProvider;
use crate::throttle::Throttle;

pub(crate) enum Scripted {
    Empty,
    Failure(&'static str),
}

/// Answers every query with a candidate derived from the query text unless a
/// different outcome is scripted for it. Records each call.
#[derive(Default)]
pub(crate) struct ScriptedProvider {
    scripted: HashMap<String, Scripted>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedProvider {
    pub(crate) fn with(mut self, query: &str, outcome: Scripted) -> Self {
        self.scripted.insert(query.to_string(), outcome);
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl ImageSearchProvider for ScriptedProvider {
    fn search(&self, query: &str) -> Result<Option<CandidateImage>> {
        self.calls.borrow_mut().push(query.to_string());
        match self.scripted.get(query) {
            Some(Scripted::Empty) => Ok(None),
            Some(Scripted::Failure(status)) => Err(MendError::Provider(format!(
                "photo search for {query:?} failed with status {status}"
            ))),
            None => Ok(Some(candidate_for(query))),
        }
    }
}

pub(crate) fn regular_url_for(query: &str) -> String {
    format!("https://images.example/{}?w=1080", query.replace(' ', "-"))
}

pub(crate) fn candidate_for(query: &str) -> CandidateImage {
    let slug = query.replace(' ', "-");
    CandidateImage {
        id: slug.clone(),
        urls: ImageUrls {
            raw: format!("https://images.example/{slug}"),
            full: format!("https://images.example/{slug}?q=85"),
            regular: regular_url_for(query),
            small: format!("https://images.example/{slug}?w=400"),
        },
        attribution: Attribution {
            name: "Test Photographer".to_string(),
            username: None,
            profile_url: None,
        },
        description: None,
    }
}

#[derive(Debug, Default)]
pub(crate) struct CountingThrottle {
    pub(crate) pauses: usize,
}

impl Throttle for CountingThrottle {
    fn after_provider_call(&mut self) {
        self.pauses += 1;
    }
}

//! Search query classification for broken image references.
//!
//! A defect is described by three strings: the broken URL, the structural
//! path of the reference inside its document, and the document's file name.
//! [`QUERY_RULES`] is evaluated top to bottom and the first matching rule
//! supplies the query, so the table order is the disambiguation policy.
//! Matching is a case-insensitive substring test. A keyword set may list
//! longer words that contain one of its keywords and must not count as a
//! mention (`review` is not a `view`).

use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierInput<'a> {
    pub url: &'a str,
    pub json_path: &'a str,
    pub file_name: &'a str,
}

impl<'a> ClassifierInput<'a> {
    #[must_use]
    pub fn new(url: &'a str, json_path: &'a str, file_name: &'a str) -> Self {
        Self {
            url,
            json_path,
            file_name,
        }
    }
}

/// Which inputs a keyword set is tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fields {
    FileAndPath,
    PathAndUrl,
    FileAndUrl,
    All,
}

#[derive(Debug, Clone, Copy)]
struct Keywords {
    fields: Fields,
    words: &'static [&'static str],
    except: &'static [&'static str],
}

/// One ordered classification rule. `subject` gates the rule family
/// (lodging, dining); `detail` refines within it. A rule without either
/// always matches.
#[derive(Debug, Clone, Copy)]
pub struct QueryRule {
    pub name: &'static str,
    subject: Option<Keywords>,
    detail: Option<Keywords>,
    pub query: &'static str,
}

const LODGING: Keywords = Keywords {
    fields: Fields::FileAndPath,
    words: &[
        "hotel",
        "accommodation",
        "lodging",
        "b&b",
        "bnb",
        "guesthouse",
        "guest-house",
        "apartment",
        "affittacamere",
    ],
    except: &[],
};

const DINING: Keywords = Keywords {
    fields: Fields::FileAndPath,
    words: &[
        "restaurant",
        "dining",
        "trattoria",
        "osteria",
        "ristorante",
        "enoteca",
    ],
    except: &[],
};

const fn detail(words: &'static [&'static str]) -> Option<Keywords> {
    detail_except(words, &[])
}

const fn detail_except(
    words: &'static [&'static str],
    except: &'static [&'static str],
) -> Option<Keywords> {
    Some(Keywords {
        fields: Fields::PathAndUrl,
        words,
        except,
    })
}

const NOT_A_VIEW: &[&str] = &["review", "preview"];

const fn locale(words: &'static [&'static str]) -> Option<Keywords> {
    Some(Keywords {
        fields: Fields::FileAndUrl,
        words,
        except: &[],
    })
}

const fn topic(words: &'static [&'static str]) -> Option<Keywords> {
    Some(Keywords {
        fields: Fields::All,
        words,
        except: &[],
    })
}

pub const QUERY_RULES: &[QueryRule] = &[
    QueryRule {
        name: "lodging.exterior",
        subject: Some(LODGING),
        detail: detail(&["exterior", "facade", "façade", "building", "outside"]),
        query: "hotel exterior italy",
    },
    // "bathroom" contains "room"; bathroom, view and breakfast are checked first.
    QueryRule {
        name: "lodging.bathroom",
        subject: Some(LODGING),
        detail: detail(&["bathroom", "shower", "bath"]),
        query: "hotel bathroom modern",
    },
    QueryRule {
        name: "lodging.view",
        subject: Some(LODGING),
        detail: detail_except(&["view", "terrace", "balcony"], NOT_A_VIEW),
        query: "hotel terrace sea view",
    },
    QueryRule {
        name: "lodging.breakfast",
        subject: Some(LODGING),
        detail: detail(&["breakfast", "colazione"]),
        query: "hotel breakfast italian",
    },
    QueryRule {
        name: "lodging.room",
        subject: Some(LODGING),
        detail: detail(&["interior", "bedroom", "suite", "room"]),
        query: "hotel room interior",
    },
    QueryRule {
        name: "lodging.generic",
        subject: Some(LODGING),
        detail: None,
        query: "boutique hotel italy",
    },
    QueryRule {
        name: "dining.terrace",
        subject: Some(DINING),
        detail: detail_except(&["terrace", "view", "outdoor"], NOT_A_VIEW),
        query: "restaurant terrace sea view",
    },
    QueryRule {
        name: "dining.wine",
        subject: Some(DINING),
        detail: detail(&["wine", "vino"]),
        query: "italian wine glass",
    },
    QueryRule {
        name: "dining.food",
        subject: Some(DINING),
        detail: detail(&["food", "dish", "plate", "menu", "seafood"]),
        query: "italian seafood dish",
    },
    QueryRule {
        name: "dining.pesto",
        subject: Some(DINING),
        detail: detail(&["pesto", "trofie", "focaccia"]),
        query: "trofie al pesto",
    },
    QueryRule {
        name: "dining.generic",
        subject: Some(DINING),
        detail: None,
        query: "italian restaurant",
    },
    QueryRule {
        name: "locale.riomaggiore",
        subject: None,
        detail: locale(&["riomaggiore"]),
        query: "riomaggiore cinque terre",
    },
    QueryRule {
        name: "locale.manarola",
        subject: None,
        detail: locale(&["manarola"]),
        query: "manarola cinque terre",
    },
    QueryRule {
        name: "locale.corniglia",
        subject: None,
        detail: locale(&["corniglia"]),
        query: "corniglia cinque terre",
    },
    QueryRule {
        name: "locale.vernazza",
        subject: None,
        detail: locale(&["vernazza"]),
        query: "vernazza cinque terre",
    },
    QueryRule {
        name: "locale.monterosso",
        subject: None,
        detail: locale(&["monterosso"]),
        query: "monterosso cinque terre",
    },
    QueryRule {
        name: "topic.aerial",
        subject: None,
        detail: topic(&["aerial", "panorama", "drone"]),
        query: "cinque terre aerial view",
    },
    QueryRule {
        name: "topic.sunset",
        subject: None,
        detail: topic(&["sunset", "tramonto"]),
        query: "cinque terre sunset",
    },
    QueryRule {
        name: "topic.beach",
        subject: None,
        detail: topic(&["beach", "spiaggia"]),
        query: "cinque terre beach",
    },
    QueryRule {
        name: "topic.hiking",
        subject: None,
        detail: topic(&["hiking", "trail", "hike", "sentiero"]),
        query: "cinque terre hiking trail",
    },
    QueryRule {
        name: "fallback",
        subject: None,
        detail: None,
        query: "cinque terre italy coast",
    },
];

struct Haystack {
    url: String,
    json_path: String,
    file_name: String,
}

impl Haystack {
    fn new(input: ClassifierInput<'_>) -> Self {
        Self {
            url: input.url.to_lowercase(),
            json_path: input.json_path.to_lowercase(),
            file_name: input.file_name.to_lowercase(),
        }
    }

    fn fields(&self, fields: Fields) -> [&str; 3] {
        match fields {
            Fields::FileAndPath => [self.file_name.as_str(), self.json_path.as_str(), ""],
            Fields::PathAndUrl => [self.json_path.as_str(), self.url.as_str(), ""],
            Fields::FileAndUrl => [self.file_name.as_str(), self.url.as_str(), ""],
            Fields::All => [
                self.file_name.as_str(),
                self.json_path.as_str(),
                self.url.as_str(),
            ],
        }
    }

    fn mentions(&self, keywords: Keywords) -> bool {
        self.fields(keywords.fields).iter().any(|field| {
            if field.is_empty() {
                return false;
            }
            let field = masked(field, keywords.except);
            keywords.words.iter().any(|word| field.contains(word))
        })
    }
}

/// Blanks out every excluded word so its inner keyword no longer matches.
fn masked<'a>(field: &'a str, except: &[&str]) -> Cow<'a, str> {
    let mut field = Cow::Borrowed(field);
    for word in except {
        if field.contains(word) {
            field = Cow::Owned(field.replace(word, " "));
        }
    }
    field
}

impl QueryRule {
    fn matches(&self, haystack: &Haystack) -> bool {
        self.subject.is_none_or(|keywords| haystack.mentions(keywords))
            && self.detail.is_none_or(|keywords| haystack.mentions(keywords))
    }
}

/// Returns the first rule in [`QUERY_RULES`] that matches `input`.
#[must_use]
pub fn classify_with_rule(input: ClassifierInput<'_>) -> &'static QueryRule {
    let haystack = Haystack::new(input);
    QUERY_RULES
        .iter()
        .find(|rule| rule.matches(&haystack))
        .unwrap_or(&QUERY_RULES[QUERY_RULES.len() - 1])
}

#[must_use]
pub fn classify(input: ClassifierInput<'_>) -> &'static str {
    classify_with_rule(input).query
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_for(url: &str, json_path: &str, file_name: &str) -> &'static str {
        classify_with_rule(ClassifierInput::new(url, json_path, file_name)).name
    }

    #[test]
    fn lodging_bathroom_context_yields_bathroom_query() {
        let query = classify(ClassifierInput::new(
            "https://broken.example/img1.jpg",
            "accommodations[0].bathroom.images[0].url",
            "hotels.json",
        ));
        assert_eq!(query, "hotel bathroom modern");
    }

    #[test]
    fn bathroom_is_not_shadowed_by_room_interior_rule() {
        assert_eq!(
            rule_for("https://x.example/a.jpg", "rooms.bathroom.photo", "hotel-stella.json"),
            "lodging.bathroom"
        );
        assert_eq!(
            rule_for("https://x.example/a.jpg", "rooms.bedroom.photo", "hotel-stella.json"),
            "lodging.room"
        );
    }

    #[test]
    fn room_paths_and_urls_yield_room_query_unless_they_name_a_bathroom() {
        assert_eq!(
            classify(ClassifierInput::new(
                "https://broken.example/a.jpg",
                "hotel.rooms[0].images[0]",
                "hotel-la-torretta.json",
            )),
            "hotel room interior"
        );
        assert_eq!(
            classify(ClassifierInput::new(
                "https://broken.example/a.jpg",
                "hotel.rooms[0].bathroom.images[0]",
                "hotel-la-torretta.json",
            )),
            "hotel bathroom modern"
        );
        assert_eq!(
            rule_for(
                "https://broken.example/manarola-room.jpg",
                "images[0]",
                "hotel-marina-manarola.json"
            ),
            "lodging.room"
        );
    }

    #[test]
    fn review_and_preview_are_not_views() {
        assert_eq!(
            rule_for("https://x.example/a.jpg", "reviews[0].avatar", "hotel-stella.json"),
            "lodging.generic"
        );
        assert_eq!(
            rule_for("https://x.example/preview.jpg", "images[0]", "trattoria.json"),
            "dining.generic"
        );
        assert_eq!(
            rule_for("https://x.example/a.jpg", "reviews[0].view.image", "hotel-stella.json"),
            "lodging.view"
        );
    }

    #[test]
    fn lodging_takes_priority_over_locale() {
        let rule = rule_for(
            "https://broken.example/riomaggiore-harbour.jpg",
            "images[2].url",
            "riomaggiore-hotel-la-torretta.json",
        );
        assert_eq!(rule, "lodging.generic");
    }

    #[test]
    fn lodging_refinements_follow_declared_order() {
        // exterior precedes view even when both are mentioned
        assert_eq!(
            rule_for("https://x.example/facade-view.jpg", "images[0]", "accommodation.json"),
            "lodging.exterior"
        );
        assert_eq!(
            rule_for("https://x.example/a.jpg", "hotel.terrace.images[0]", "stay.json"),
            "lodging.view"
        );
        assert_eq!(
            rule_for("https://x.example/breakfast.jpg", "images[0]", "b&b-mare.json"),
            "lodging.breakfast"
        );
    }

    #[test]
    fn dining_refinements_follow_declared_order() {
        assert_eq!(
            rule_for("https://x.example/a.jpg", "terrace.images[0]", "restaurants.json"),
            "dining.terrace"
        );
        assert_eq!(
            rule_for("https://x.example/wine-list.jpg", "images[0]", "osteria-vino.json"),
            "dining.wine"
        );
        assert_eq!(
            rule_for("https://x.example/a.jpg", "menu.dishes[1].image", "trattoria.json"),
            "dining.food"
        );
        assert_eq!(
            rule_for("https://x.example/trofie.jpg", "images[0]", "ristorante-mare.json"),
            "dining.pesto"
        );
        assert_eq!(
            rule_for("https://x.example/a.jpg", "images[0]", "restaurants.json"),
            "dining.generic"
        );
    }

    #[test]
    fn locale_matches_file_name_or_url_but_not_path() {
        assert_eq!(
            classify(ClassifierInput::new(
                "https://cdn.example/vernazza/harbour.jpg",
                "images[0]",
                "pois.json"
            )),
            "vernazza cinque terre"
        );
        assert_eq!(
            rule_for("https://cdn.example/a.jpg", "images[0]", "Manarola-Guide.json"),
            "locale.manarola"
        );
        assert_eq!(
            rule_for("https://cdn.example/a.jpg", "corniglia.images[0]", "pois.json"),
            "fallback"
        );
    }

    #[test]
    fn topical_checks_run_in_fixed_order() {
        assert_eq!(
            rule_for("https://x.example/sunset-beach.jpg", "images[0]", "pois.json"),
            "topic.sunset"
        );
        assert_eq!(
            rule_for("https://x.example/beach.jpg", "trail.images[0]", "pois.json"),
            "topic.beach"
        );
        assert_eq!(
            rule_for("https://x.example/a.jpg", "sentiero-azzurro.images[0]", "pois.json"),
            "topic.hiking"
        );
        assert_eq!(
            rule_for("https://x.example/PANORAMA.jpg", "images[0]", "pois.json"),
            "topic.aerial"
        );
    }

    #[test]
    fn unmatched_inputs_fall_back_to_regional_query() {
        assert_eq!(
            classify(ClassifierInput::new("https://x.example/1.jpg", "a.b", "events.json")),
            "cinque terre italy coast"
        );
        assert_eq!(classify(ClassifierInput::new("", "", "")), "cinque terre italy coast");
    }

    #[test]
    fn classification_is_case_insensitive_and_deterministic() {
        let upper = ClassifierInput::new("HTTPS://X.EXAMPLE/A.JPG", "ROOMS.BATHROOM", "HOTEL.JSON");
        let lower = ClassifierInput::new("https://x.example/a.jpg", "rooms.bathroom", "hotel.json");
        assert_eq!(classify(upper), classify(lower));
        assert_eq!(classify(upper), classify(upper));
    }

    #[test]
    fn rule_names_are_unique_and_fallback_is_last() {
        let mut names = QUERY_RULES.iter().map(|rule| rule.name).collect::<Vec<_>>();
        assert_eq!(names.last().copied(), Some("fallback"));
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), QUERY_RULES.len());
    }
}

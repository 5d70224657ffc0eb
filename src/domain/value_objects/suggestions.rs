use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_SUGGESTIONS: usize = 4;

pub const FALLBACK_SUGGESTIONS: &[&str] = &["standard_nightly", "standard_weekly"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownPackage {
    pub revenue_cat_id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// The only identifiers a suggestion may carry.
pub const KNOWN_PACKAGES: &[KnownPackage] = &[
    KnownPackage {
        revenue_cat_id: "standard_nightly",
        name: "Standard nightly",
        description: "Pay per night, no minimum stay",
    },
    KnownPackage {
        revenue_cat_id: "standard_weekly",
        name: "Standard weekly",
        description: "Seven nights at a weekly discount",
    },
    KnownPackage {
        revenue_cat_id: "standard_monthly",
        name: "Standard monthly",
        description: "Thirty nights for long stays and remote work",
    },
    KnownPackage {
        revenue_cat_id: "hosted_nightly",
        name: "Hosted nightly",
        description: "Per night with an on-site host and daily check-ins",
    },
    KnownPackage {
        revenue_cat_id: "hosted_weekly",
        name: "Hosted weekly",
        description: "A hosted week with concierge support",
    },
    KnownPackage {
        revenue_cat_id: "addon_cleaning",
        name: "Mid-stay cleaning",
        description: "Extra cleaning and fresh linen during the stay",
    },
    KnownPackage {
        revenue_cat_id: "addon_breakfast",
        name: "Breakfast",
        description: "Daily breakfast basket",
    },
    KnownPackage {
        revenue_cat_id: "addon_airport_transfer",
        name: "Airport transfer",
        description: "Pickup and drop-off at the nearest airport",
    },
    KnownPackage {
        revenue_cat_id: "special_event",
        name: "Special event",
        description: "Celebrations, retreats and other group events",
    },
];

pub fn find_known_package(revenue_cat_id: &str) -> Option<&'static KnownPackage> {
    KNOWN_PACKAGES
        .iter()
        .find(|package| package.revenue_cat_id == revenue_cat_id)
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuggestPackagesModel {
    pub description: String,
    #[serde(default)]
    pub post_id: Option<Uuid>,
}

/// Property details handed to the model along with the request.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyContext {
    pub title: String,
    pub description: Option<String>,
    pub base_rate: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PackageSuggestion {
    pub revenue_cat_id: String,
    pub name: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SuggestionsDto {
    pub suggestions: Vec<PackageSuggestion>,
    pub fallback: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RawRecommendation {
    #[serde(
        default,
        rename = "revenueCatId",
        alias = "revenue_cat_id",
        alias = "id"
    )]
    pub revenue_cat_id: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelReply {
    recommendations: Vec<RawRecommendation>,
}

pub fn build_prompt(description: &str, property: Option<&PropertyContext>) -> String {
    let catalog = KNOWN_PACKAGES
        .iter()
        .map(|package| {
            format!(
                "- {}: {} ({})",
                package.revenue_cat_id, package.name, package.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let property = match property {
        Some(property) => format!(
            "Property: {}\nDescription: {}\nNightly rate: {}\n",
            property.title,
            property.description.as_deref().unwrap_or("n/a"),
            property
                .base_rate
                .map(|rate| format!("{rate:.2}"))
                .unwrap_or_else(|| "n/a".to_string()),
        ),
        None => String::new(),
    };

    format!(
        "You recommend stay packages for a vacation rental.\n\
         Only use identifiers from this catalog:\n{catalog}\n\n\
         {property}Guest request: {description}\n\n\
         Reply with JSON only: {{\"recommendations\":[{{\"revenueCatId\":\"<id>\",\"reason\":\"<short reason>\"}}]}} \
         with at most {MAX_SUGGESTIONS} entries."
    )
}

/// Extracts the outermost JSON object from free-form model output.
pub fn parse_model_reply(text: &str) -> Option<Vec<RawRecommendation>> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }

    serde_json::from_str::<ModelReply>(&text[start..=end])
        .ok()
        .map(|reply| reply.recommendations)
}

/// Keeps catalog identifiers only, first occurrence wins, at most `MAX_SUGGESTIONS`.
pub fn sanitize_recommendations(raw: Vec<RawRecommendation>) -> Vec<PackageSuggestion> {
    let mut seen = HashSet::new();

    raw.into_iter()
        .filter_map(|recommendation| {
            let id = recommendation.revenue_cat_id?.trim().to_string();
            let known = find_known_package(&id)?;
            seen.insert(known.revenue_cat_id).then(|| PackageSuggestion {
                revenue_cat_id: known.revenue_cat_id.to_string(),
                name: known.name.to_string(),
                reason: recommendation
                    .reason
                    .map(|reason| reason.trim().to_string())
                    .filter(|reason| !reason.is_empty()),
            })
        })
        .take(MAX_SUGGESTIONS)
        .collect()
}

pub fn fallback_suggestions() -> Vec<PackageSuggestion> {
    sanitize_recommendations(
        FALLBACK_SUGGESTIONS
            .iter()
            .map(|id| RawRecommendation {
                revenue_cat_id: Some(id.to_string()),
                reason: None,
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str) -> RawRecommendation {
        RawRecommendation {
            revenue_cat_id: Some(id.to_string()),
            reason: Some("fits".to_string()),
        }
    }

    #[test]
    fn parses_json_wrapped_in_prose_and_fences() {
        let reply = "Sure!\n```json\n{\"recommendations\":[{\"revenueCatId\":\"standard_weekly\",\"reason\":\"a week\"}]}\n```";

        let parsed = parse_model_reply(reply).unwrap();
        assert_eq!(parsed, vec![RawRecommendation {
            revenue_cat_id: Some("standard_weekly".to_string()),
            reason: Some("a week".to_string()),
        }]);
    }

    #[test]
    fn unparseable_output_yields_none() {
        assert!(parse_model_reply("no json here").is_none());
        assert!(parse_model_reply("} backwards {").is_none());
        assert!(parse_model_reply("{\"other\": 1}").is_none());
    }

    #[test]
    fn unknown_ids_are_dropped_and_duplicates_collapsed() {
        let suggestions = sanitize_recommendations(vec![
            raw("standard_nightly"),
            raw("free_upgrade_forever"),
            raw("standard_nightly"),
            raw("addon_breakfast"),
        ]);

        let ids: Vec<&str> = suggestions
            .iter()
            .map(|suggestion| suggestion.revenue_cat_id.as_str())
            .collect();
        assert_eq!(ids, vec!["standard_nightly", "addon_breakfast"]);
    }

    #[test]
    fn results_are_capped() {
        let all = KNOWN_PACKAGES
            .iter()
            .map(|package| raw(package.revenue_cat_id))
            .collect();

        assert_eq!(sanitize_recommendations(all).len(), MAX_SUGGESTIONS);
    }

    #[test]
    fn adversarial_output_never_leaves_the_catalog() {
        let reply = r#"{"recommendations":[
            {"revenueCatId":"standard_weekly\u0000"},
            {"revenueCatId":"STANDARD_WEEKLY"},
            {"id":"hosted_weekly"},
            {"revenueCatId":null},
            {"revenueCatId":"<script>"}
        ]}"#;

        let suggestions = sanitize_recommendations(parse_model_reply(reply).unwrap());
        for suggestion in &suggestions {
            assert!(find_known_package(&suggestion.revenue_cat_id).is_some());
        }
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].revenue_cat_id, "hosted_weekly");
    }

    #[test]
    fn fallback_is_standard_nightly_and_weekly() {
        let ids: Vec<String> = fallback_suggestions()
            .into_iter()
            .map(|suggestion| suggestion.revenue_cat_id)
            .collect();

        assert_eq!(ids, vec!["standard_nightly", "standard_weekly"]);
    }

    #[test]
    fn prompt_lists_catalog_and_property() {
        let prompt = build_prompt(
            "quiet week with breakfast",
            Some(&PropertyContext {
                title: "Sea cabin".to_string(),
                description: None,
                base_rate: Some(120.0),
            }),
        );

        assert!(prompt.contains("addon_breakfast"));
        assert!(prompt.contains("Sea cabin"));
        assert!(prompt.contains("120.00"));
        assert!(prompt.contains("quiet week with breakfast"));
    }
}

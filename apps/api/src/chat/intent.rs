//! Intent Classifier: asks the provider what the user wants, then validates the
//! answer field by field before any of it is trusted.
//!
//! A classification failure is never fatal: the orchestrator downgrades it to
//! `general_chat` with empty filters.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::chat::prompts::CLASSIFY_PROMPT_TEMPLATE;
use crate::corpus::filter::JobFilters;
use crate::llm_client::prompts::{fill_template, JSON_ONLY_SYSTEM};
use crate::llm_client::{complete_json, Completion, CompletionProvider, LlmError};
use crate::models::conversation::{render_recent, ChatMessage};

const CLASSIFY_MAX_TOKENS: u32 = 300;
const CLASSIFY_TEMPERATURE: f32 = 0.1;
const CLASSIFY_HISTORY_TURNS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    SearchJobs,
    ShowAllJobs,
    JobRecommendation,
    JobDetails,
    GeneralChat,
}

impl Intent {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "search_jobs" => Some(Intent::SearchJobs),
            "show_all_jobs" => Some(Intent::ShowAllJobs),
            "job_recommendation" => Some(Intent::JobRecommendation),
            "job_details" => Some(Intent::JobDetails),
            "general_chat" => Some(Intent::GeneralChat),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::SearchJobs => "search_jobs",
            Intent::ShowAllJobs => "show_all_jobs",
            Intent::JobRecommendation => "job_recommendation",
            Intent::JobDetails => "job_details",
            Intent::GeneralChat => "general_chat",
        }
    }
}

/// Typed filter payload carried by every classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntentFilters {
    #[serde(flatten)]
    pub search: JobFilters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    /// 1-based position in the list shown previously.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_in_list: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedIntent {
    pub intent: Intent,
    pub filters: IntentFilters,
}

impl ClassifiedIntent {
    /// The fallback used whenever classification is unavailable.
    pub fn general_chat() -> Self {
        Self {
            intent: Intent::GeneralChat,
            filters: IntentFilters::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("classification provider failed: {0}")]
    Provider(#[from] LlmError),

    #[error("classification rejected: {0}")]
    Invalid(String),
}

/// Classifies `message` given the conversation so far.
pub async fn classify(
    provider: &dyn CompletionProvider,
    history: &[ChatMessage],
    message: &str,
) -> Result<ClassifiedIntent, ClassifyError> {
    let prompt = build_classify_prompt(history, message);
    let value = complete_json(
        provider,
        Completion::new(&prompt, CLASSIFY_MAX_TOKENS, CLASSIFY_TEMPERATURE).with_system(JSON_ONLY_SYSTEM),
    )
    .await?;
    parse_classification(&value, message)
}

pub fn build_classify_prompt(history: &[ChatMessage], message: &str) -> String {
    let history = render_recent(history, CLASSIFY_HISTORY_TURNS);
    let history = if history.is_empty() {
        "(aucun)".to_string()
    } else {
        history
    };
    fill_template(
        CLASSIFY_PROMPT_TEMPLATE,
        &[("history", &history), ("message", message)],
    )
}

/// Validates the provider's JSON into a typed classification.
///
/// `intent` must be a known name. Filters are lenient: wrong-typed or blank
/// fields are treated as absent rather than rejecting the whole answer.
pub fn parse_classification(value: &Value, message: &str) -> Result<ClassifiedIntent, ClassifyError> {
    let object = value
        .as_object()
        .ok_or_else(|| ClassifyError::Invalid("expected a JSON object".to_string()))?;

    let raw_intent = object
        .get("intent")
        .and_then(Value::as_str)
        .ok_or_else(|| ClassifyError::Invalid("missing 'intent' field".to_string()))?;

    let intent = Intent::parse(raw_intent)
        .ok_or_else(|| ClassifyError::Invalid(format!("unknown intent '{raw_intent}'")))?;

    let filters = object.get("filters").cloned().unwrap_or(Value::Null);

    let skills: BTreeSet<String> = filters
        .get("skills")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let mut position_in_list = filters
        .get("position_in_list")
        .and_then(Value::as_u64)
        .filter(|&p| p > 0)
        .map(|p| p as usize);

    if intent == Intent::JobDetails && position_in_list.is_none() {
        position_in_list = extract_position(message);
    }

    Ok(ClassifiedIntent {
        intent,
        filters: IntentFilters {
            search: JobFilters {
                skills,
                location: string_field(&filters, "location"),
                job_type: string_field(&filters, "type"),
            },
            job_id: string_field(&filters, "job_id"),
            position_in_list,
        },
    })
}

fn string_field(filters: &Value, key: &str) -> Option<String> {
    filters
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

// ────────────────────────────────────────────────────────────────────────────
// Ordinal extraction
// ────────────────────────────────────────────────────────────────────────────

static WORD_ORDINAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(premier|première|deuxième|second|seconde|troisième|quatrième|cinquième|sixième|septième|huitième|neuvième|dixième)\b",
    )
    .expect("static ordinal pattern")
});

static NUMERIC_ORDINAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})\s*(?:er|ère|re|ème|eme|e)\b").expect("static ordinal pattern")
});

static NUMBERED_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\b(?:offre|annonce|poste|numéro|numero|num|le|la)|n°|#)\s*(\d{1,2})\b")
        .expect("static ordinal pattern")
});

fn word_ordinal(word: &str) -> Option<usize> {
    Some(match word.to_lowercase().as_str() {
        "premier" | "première" => 1,
        "deuxième" | "second" | "seconde" => 2,
        "troisième" => 3,
        "quatrième" => 4,
        "cinquième" => 5,
        "sixième" => 6,
        "septième" => 7,
        "huitième" => 8,
        "neuvième" => 9,
        "dixième" => 10,
        _ => return None,
    })
}

/// Returns the first explicit ordinal in `message` (1-based), if any.
pub fn extract_position(message: &str) -> Option<usize> {
    let words = WORD_ORDINAL_RE
        .captures_iter(message)
        .filter_map(|c| {
            let m = c.get(1)?;
            Some((m.start(), word_ordinal(m.as_str())?))
        });

    let numeric = [&*NUMERIC_ORDINAL_RE, &*NUMBERED_REF_RE]
        .into_iter()
        .flat_map(|re| re.captures_iter(message))
        .filter_map(|c| {
            let whole = c.get(0)?;
            let n = c.get(1)?.as_str().parse::<usize>().ok()?;
            Some((whole.start(), n))
        });

    words
        .chain(numeric)
        .filter(|&(_, n)| n > 0)
        .min_by_key(|&(start, _)| start)
        .map(|(_, n)| n)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::llm_client::testing::ScriptedProvider;

    #[test]
    fn test_examples_resolve_positions() {
        assert_eq!(extract_position("Plus de détails sur la première"), Some(1));
        assert_eq!(extract_position("Parle-moi de l'offre 2"), Some(2));
        assert_eq!(extract_position("La 3ème offre m'intéresse"), Some(3));
        assert_eq!(extract_position("je veux le 4"), Some(4));
        assert_eq!(extract_position("n°5 stp"), Some(5));
    }

    #[test]
    fn test_first_ordinal_wins() {
        assert_eq!(extract_position("la deuxième, ou peut-être la 4e"), Some(2));
    }

    #[test]
    fn test_no_ordinal() {
        assert_eq!(extract_position("j'ai 2 ans d'expérience"), None);
        assert_eq!(extract_position("montre-moi tout"), None);
    }

    #[test]
    fn test_parse_full_search() {
        let value = json!({
            "intent": "search_jobs",
            "filters": {
                "skills": ["Docker", " ", 42],
                "location": "Lyon",
                "type": "",
                "job_id": "",
                "position_in_list": 0
            }
        });
        let c = parse_classification(&value, "docker à lyon").unwrap();
        assert_eq!(c.intent, Intent::SearchJobs);
        assert_eq!(c.filters.search.skills.iter().collect::<Vec<_>>(), vec!["docker"]);
        assert_eq!(c.filters.search.location.as_deref(), Some("Lyon"));
        assert!(c.filters.search.job_type.is_none());
        assert!(c.filters.job_id.is_none());
        assert!(c.filters.position_in_list.is_none());
    }

    #[test]
    fn test_parse_details_falls_back_to_message_ordinal() {
        let value = json!({"intent": "job_details", "filters": {"position_in_list": null}});
        let c = parse_classification(&value, "plus de détails sur la première").unwrap();
        assert_eq!(c.filters.position_in_list, Some(1));
    }

    #[test]
    fn test_parse_keeps_provider_position() {
        let value = json!({"intent": "job_details", "filters": {"position_in_list": 2}});
        let c = parse_classification(&value, "la première").unwrap();
        assert_eq!(c.filters.position_in_list, Some(2));
    }

    #[test]
    fn test_missing_intent_is_rejected() {
        let value = json!({"filters": {}});
        assert!(matches!(
            parse_classification(&value, "x"),
            Err(ClassifyError::Invalid(_))
        ));
    }

    #[test]
    fn test_unknown_intent_is_rejected() {
        let value = json!({"intent": "book_flight"});
        assert!(parse_classification(&value, "x").is_err());
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(parse_classification(&json!(["search_jobs"]), "x").is_err());
    }

    #[test]
    fn test_prompt_contains_last_four_turns_and_examples_first() {
        let history: Vec<ChatMessage> = (1..=6).map(|i| ChatMessage::user(format!("msg{i}"))).collect();
        let prompt = build_classify_prompt(&history, "la première");
        assert!(!prompt.contains("msg2"));
        assert!(prompt.contains("msg3") && prompt.contains("msg6"));
        assert!(prompt.find("EXEMPLES").unwrap() < prompt.find("RÈGLES").unwrap());
        assert!(prompt.contains("\"la première\""));
    }

    #[test]
    fn test_placeholders_in_user_text_stay_literal() {
        let history = vec![ChatMessage::user("que veut dire {message} ?")];
        let prompt = build_classify_prompt(&history, "et {history} alors");
        assert!(prompt.contains("user: que veut dire {message} ?"));
        assert!(prompt.contains("\"et {history} alors\""));
        assert_eq!(prompt.matches("et {history} alors").count(), 1);
    }

    #[tokio::test]
    async fn test_classify_strips_fences() {
        let provider = ScriptedProvider::new()
            .reply("```json\n{\"intent\":\"show_all_jobs\",\"filters\":{}}\n```");
        let c = classify(&provider, &[], "toutes les offres").await.unwrap();
        assert_eq!(c.intent, Intent::ShowAllJobs);
    }

    #[tokio::test]
    async fn test_classify_prose_reply_is_an_error() {
        let provider = ScriptedProvider::new().reply("Bien sûr ! Voici les offres.");
        assert!(classify(&provider, &[], "salut").await.is_err());
    }
}

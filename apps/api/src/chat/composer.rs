//! Response Composer: structured results pass through untouched; everything
//! else gets a short persona reply from the provider, or a fixed apology.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::chat::intent::Intent;
use crate::chat::prompts::COMPOSE_PROMPT_TEMPLATE;
use crate::llm_client::prompts::fill_template;
use crate::llm_client::{Completion, CompletionProvider};
use crate::matching::MatchReport;
use crate::models::conversation::{render_recent, ChatMessage};
use crate::models::job::Job;
use crate::models::profile::UserProfile;

const COMPOSE_MAX_TOKENS: u32 = 200;
const COMPOSE_TEMPERATURE: f32 = 0.7;
const COMPOSE_HISTORY_TURNS: usize = 3;

pub const APOLOGY: &str = "Désolé, je rencontre un souci technique pour te répondre. \
    Tu peux reformuler ta demande, ou me demander de te montrer toutes les offres ?";

pub const PROFILE_INCOMPLETE: &str = "Pour te recommander des offres, j'ai besoin de connaître \
    tes compétences. Quelles technologies maîtrises-tu (par exemple React, Python ou SQL) ?";

pub const NOT_FOUND: &str = "Je n'ai pas trouvé cette offre. Indique-moi son numéro dans la \
    dernière liste, ou demande-moi de te montrer toutes les offres.";

pub const MATCHING_FAILED: &str = "Je n'arrive pas à calculer tes recommandations pour le moment. \
    Réessaie dans un instant, ou lance une recherche par compétence.";

/// What a turn returns. The discriminant is explicit on the wire as `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnPayload {
    Jobs { jobs: Vec<Job>, count: usize },
    Matches(MatchReport),
    Job { job: Job },
    Text { answer: String },
    ProfileIncomplete { message: String },
    NotFound { message: String },
    MatchingFailed { message: String },
}

impl TurnPayload {
    pub fn jobs(jobs: Vec<Job>) -> Self {
        let count = jobs.len();
        TurnPayload::Jobs { jobs, count }
    }

    /// Job ids displayed by this payload, in order, if it is a list.
    pub fn shown_job_ids(&self) -> Option<Vec<String>> {
        match self {
            TurnPayload::Jobs { jobs, .. } => Some(jobs.iter().map(|j| j.id.clone()).collect()),
            TurnPayload::Matches(report) => Some(report.job_ids()),
            _ => None,
        }
    }
}

/// Result of the executing stage, before composition.
#[derive(Debug, Clone, PartialEq)]
pub enum Executed {
    Jobs(Vec<Job>),
    Matches(MatchReport),
    Job(Job),
    ProfileIncomplete,
    NotFound,
    MatchingFailed,
    /// No structured result: the reply must be generated.
    Nothing,
}

pub struct ComposeInput<'a> {
    pub intent: Intent,
    pub message: &'a str,
    pub history: &'a [ChatMessage],
    pub profile: &'a UserProfile,
}

/// Composed payload plus whether the apology fallback was used.
pub struct Composed {
    pub payload: TurnPayload,
    pub fell_back: bool,
}

pub async fn compose(
    provider: &dyn CompletionProvider,
    executed: Executed,
    input: ComposeInput<'_>,
) -> Composed {
    let payload = match executed {
        Executed::Jobs(jobs) => TurnPayload::jobs(jobs),
        Executed::Matches(report) => TurnPayload::Matches(report),
        Executed::Job(job) => TurnPayload::Job { job },
        Executed::ProfileIncomplete => TurnPayload::ProfileIncomplete {
            message: PROFILE_INCOMPLETE.to_string(),
        },
        Executed::NotFound => TurnPayload::NotFound {
            message: NOT_FOUND.to_string(),
        },
        Executed::MatchingFailed => TurnPayload::MatchingFailed {
            message: MATCHING_FAILED.to_string(),
        },
        Executed::Nothing => return compose_text(provider, &input).await,
    };
    Composed {
        payload,
        fell_back: false,
    }
}

async fn compose_text(provider: &dyn CompletionProvider, input: &ComposeInput<'_>) -> Composed {
    let prompt = build_compose_prompt(input);
    match provider
        .complete(Completion::new(&prompt, COMPOSE_MAX_TOKENS, COMPOSE_TEMPERATURE))
        .await
    {
        Ok(answer) if !answer.trim().is_empty() => Composed {
            payload: TurnPayload::Text {
                answer: answer.trim().to_string(),
            },
            fell_back: false,
        },
        Ok(_) => {
            warn!("Composer received an empty completion, using apology");
            apology()
        }
        Err(e) => {
            warn!("Composer provider call failed: {e}; using apology");
            apology()
        }
    }
}

fn apology() -> Composed {
    Composed {
        payload: TurnPayload::Text {
            answer: APOLOGY.to_string(),
        },
        fell_back: true,
    }
}

pub fn build_compose_prompt(input: &ComposeInput<'_>) -> String {
    let history = render_recent(input.history, COMPOSE_HISTORY_TURNS);
    let profile = serde_json::to_string(input.profile).unwrap_or_else(|_| "{}".to_string());
    fill_template(
        COMPOSE_PROMPT_TEMPLATE,
        &[
            ("history", if history.is_empty() { "(aucun)" } else { &history }),
            ("intent", input.intent.as_str()),
            ("profile", &profile),
            ("message", input.message),
        ],
    )
}

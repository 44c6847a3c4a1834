use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single job listing from the corpus. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    /// Employment type: "Alternance", "Stage", or anything else.
    #[serde(rename = "type")]
    pub job_type: String,
    pub duration: String,
    pub rhythm: String,
    pub description: String,
    pub skills_required: Vec<String>,
    #[serde(default)]
    pub soft_skills: Vec<String>,
    pub education_level: String,
    pub salary: String,
    #[serde(default)]
    pub benefits: Vec<String>,
    pub company_size: String,
    pub sector: String,
    pub posted_date: String,
    pub contact_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<String>>,
    /// category → technologies, e.g. "frontend" → ["React", "TypeScript"]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech_stack: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interview_process: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub office_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_culture: Option<String>,
}

impl Job {
    /// True if any required skill contains `skill` (both compared lowercase).
    pub fn requires_skill(&self, skill: &str) -> bool {
        let skill = skill.to_lowercase();
        self.skills_required
            .iter()
            .any(|s| s.to_lowercase().contains(&skill))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn job(id: &str, location: &str, job_type: &str, skills: &[&str]) -> Job {
        Job {
            id: id.to_string(),
            title: format!("Poste {id}"),
            company: format!("Entreprise {id}"),
            location: location.to_string(),
            job_type: job_type.to_string(),
            duration: "12 mois".to_string(),
            rhythm: "3j entreprise / 2j école".to_string(),
            description: "Description".to_string(),
            skills_required: skills.iter().map(|s| s.to_string()).collect(),
            soft_skills: vec!["Autonomie".to_string()],
            education_level: "Bac+3".to_string(),
            salary: "1200€/mois".to_string(),
            benefits: vec!["Tickets restaurant".to_string()],
            company_size: "50-200".to_string(),
            sector: "Tech".to_string(),
            posted_date: "2025-01-15".to_string(),
            contact_email: format!("rh@{id}.fr"),
            application_url: None,
            team: None,
            projects: None,
            tech_stack: None,
            interview_process: None,
            start_date: None,
            remote_policy: None,
            office_location: None,
            company_culture: None,
        }
    }
}

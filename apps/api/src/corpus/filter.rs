//! Pure filtering over the corpus. No LLM calls, no mutation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::job::Job;

/// Search criteria. Empty / absent fields impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFilters {
    #[serde(default)]
    pub skills: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
}

impl JobFilters {
    fn wanted_skills(&self) -> impl Iterator<Item = &str> {
        self.skills.iter().map(|s| s.trim()).filter(|s| !s.is_empty())
    }

    /// AND across criteria, OR within skills.
    pub fn matches(&self, job: &Job) -> bool {
        let mut skills = self.wanted_skills().peekable();
        if skills.peek().is_some() && !skills.any(|s| job.requires_skill(s)) {
            return false;
        }

        if let Some(location) = present(&self.location) {
            if !job
                .location
                .to_lowercase()
                .contains(&location.to_lowercase())
            {
                return false;
            }
        }

        if let Some(job_type) = present(&self.job_type) {
            if job.job_type.trim().to_lowercase() != job_type.to_lowercase() {
                return false;
            }
        }

        true
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Returns the jobs matching every provided criterion, in corpus order.
pub fn filter_jobs<'a>(jobs: &'a [Job], filters: &JobFilters) -> Vec<&'a Job> {
    jobs.iter().filter(|job| filters.matches(job)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::fixtures::job;

    fn corpus() -> Vec<Job> {
        vec![
            job("a", "Paris", "Alternance", &["React", "Node.js"]),
            job("b", "Lyon", "Stage", &["Python", "SQL"]),
            job("c", "Paris La Défense", "Stage", &["Docker", "Kubernetes"]),
            job("d", "Lyon", "Alternance", &["React", "TypeScript"]),
        ]
    }

    fn ids(jobs: Vec<&Job>) -> Vec<&str> {
        jobs.into_iter().map(|j| j.id.as_str()).collect()
    }

    fn skills(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_criteria_returns_everything_in_order() {
        let jobs = corpus();
        let filters = JobFilters::default();
        assert_eq!(ids(filter_jobs(&jobs, &filters)), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_skills_are_or_within_set() {
        let jobs = corpus();
        let filters = JobFilters {
            skills: skills(&["python", "docker"]),
            ..Default::default()
        };
        assert_eq!(ids(filter_jobs(&jobs, &filters)), vec!["b", "c"]);
    }

    #[test]
    fn test_skill_containment_matches_dotted_names() {
        let jobs = corpus();
        let filters = JobFilters {
            skills: skills(&["NODE"]),
            ..Default::default()
        };
        assert_eq!(ids(filter_jobs(&jobs, &filters)), vec!["a"]);
    }

    #[test]
    fn test_criteria_are_and_across_fields() {
        let jobs = corpus();
        let filters = JobFilters {
            skills: skills(&["react"]),
            location: Some("lyon".into()),
            job_type: None,
        };
        assert_eq!(ids(filter_jobs(&jobs, &filters)), vec!["d"]);
    }

    #[test]
    fn test_location_is_substring_match() {
        let jobs = corpus();
        let filters = JobFilters {
            location: Some("PARIS".into()),
            ..Default::default()
        };
        assert_eq!(ids(filter_jobs(&jobs, &filters)), vec!["a", "c"]);
    }

    #[test]
    fn test_type_is_exact_case_insensitive() {
        let jobs = corpus();
        let filters = JobFilters {
            job_type: Some("stage".into()),
            ..Default::default()
        };
        assert_eq!(ids(filter_jobs(&jobs, &filters)), vec!["b", "c"]);

        let partial = JobFilters {
            job_type: Some("alt".into()),
            ..Default::default()
        };
        assert!(filter_jobs(&jobs, &partial).is_empty());
    }

    #[test]
    fn test_blank_criteria_are_ignored() {
        let jobs = corpus();
        let filters = JobFilters {
            skills: skills(&["  "]),
            location: Some("".into()),
            job_type: Some(" ".into()),
        };
        assert_eq!(filter_jobs(&jobs, &filters).len(), 4);
    }

    #[test]
    fn test_no_job_satisfying_both_returns_empty() {
        let jobs = corpus();
        let filters = JobFilters {
            skills: skills(&["docker"]),
            location: Some("lyon".into()),
            job_type: None,
        };
        assert!(filter_jobs(&jobs, &filters).is_empty());
    }

    #[test]
    fn test_any_required_skill_query_includes_job() {
        let jobs = corpus();
        for job in &jobs {
            for skill in &job.skills_required {
                let filters = JobFilters {
                    skills: skills(&[skill.to_uppercase().as_str(), "cobol"]),
                    ..Default::default()
                };
                let found = filter_jobs(&jobs, &filters);
                assert!(found.iter().any(|j| j.id == job.id), "{} / {skill}", job.id);
            }
        }
    }
}

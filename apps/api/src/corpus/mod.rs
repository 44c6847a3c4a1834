//! Job Corpus: the read-only, in-memory collection of job listings.
//!
//! Loaded once at startup from a JSON file and shared as `Arc<JobCorpus>`.

pub mod filter;
pub mod handlers;

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::models::job::Job;

/// Accepts either `{ "jobs": [...] }` or a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum CorpusFile {
    Wrapped { jobs: Vec<Job> },
    Bare(Vec<Job>),
}

/// Immutable job list plus an id index. Order is the file order.
#[derive(Debug)]
pub struct JobCorpus {
    jobs: Vec<Job>,
    by_id: HashMap<String, usize>,
}

impl JobCorpus {
    /// Builds a corpus, rejecting duplicate or blank identifiers.
    pub fn new(jobs: Vec<Job>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(jobs.len());
        for (idx, job) in jobs.iter().enumerate() {
            if job.id.trim().is_empty() {
                bail!("Job at position {idx} has an empty id");
            }
            if by_id.insert(job.id.clone(), idx).is_some() {
                bail!("Duplicate job id '{}' in corpus", job.id);
            }
        }
        Ok(Self { jobs, by_id })
    }

    pub fn all(&self) -> &[Job] {
        &self.jobs
    }

    pub fn get(&self, id: &str) -> Option<&Job> {
        self.by_id.get(id.trim()).map(|&idx| &self.jobs[idx])
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Reads the corpus file once. The engine never writes back to it.
pub fn load_jobs(path: impl AsRef<Path>) -> Result<JobCorpus> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read job corpus at {}", path.display()))?;
    let parsed: CorpusFile = serde_json::from_str(&raw)
        .with_context(|| format!("Job corpus at {} is not valid JSON", path.display()))?;
    let jobs = match parsed {
        CorpusFile::Wrapped { jobs } | CorpusFile::Bare(jobs) => jobs,
    };
    let corpus = JobCorpus::new(jobs)?;
    if corpus.is_empty() {
        warn!("Job corpus at {} is empty; every listing will come back empty", path.display());
    } else {
        info!("Loaded {} jobs from {}", corpus.len(), path.display());
    }
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::models::job::fixtures::job;

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let jobs = vec![
            job("a", "Paris", "Alternance", &["React"]),
            job("a", "Lyon", "Stage", &["Python"]),
        ];
        let err = JobCorpus::new(jobs).unwrap_err();
        assert!(err.to_string().contains("Duplicate job id 'a'"));
    }

    #[test]
    fn test_get_by_id_and_order_preserved() {
        let corpus = JobCorpus::new(vec![
            job("b", "Paris", "Alternance", &[]),
            job("a", "Lyon", "Stage", &[]),
        ])
        .unwrap();
        assert_eq!(corpus.all()[0].id, "b");
        assert_eq!(corpus.get("a").unwrap().location, "Lyon");
        assert!(corpus.get("zzz").is_none());
    }

    #[test]
    fn test_load_then_lookup_round_trips_every_field() {
        let mut original = job("job-42", "Paris 11e", "Alternance", &["React", "Node.js"]);
        original.application_url = Some("https://example.fr/apply".to_string());
        original.tech_stack = Some(
            [("frontend".to_string(), vec!["React".to_string()])]
                .into_iter()
                .collect(),
        );
        original.interview_process = Some(vec!["RH".to_string(), "Technique".to_string()]);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        let body = serde_json::json!({ "jobs": [original.clone()] });
        write!(file, "{body}").unwrap();

        let corpus = load_jobs(file.path()).unwrap();
        assert_eq!(corpus.get("job-42"), Some(&original));
    }

    #[test]
    fn test_load_accepts_bare_array() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let body = serde_json::json!([job("x", "Lille", "Stage", &["SQL"])]);
        write!(file, "{body}").unwrap();
        assert_eq!(load_jobs(file.path()).unwrap().len(), 1);
    }

    #[test]
    fn test_load_empty_corpus_is_allowed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"jobs": []}}"#).unwrap();
        assert!(load_jobs(file.path()).unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_file_has_context() {
        let err = load_jobs("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read job corpus"));
    }

    #[test]
    fn test_bundled_corpus_is_valid() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/jobs.json");
        let corpus = load_jobs(path).unwrap();
        assert!(corpus.len() >= 6);
    }
}

//! Closed-lexicon profile extraction. No LLM calls.
//!
//! Terms match case-insensitively as whole terms: the characters on either side
//! of an occurrence must not be letters or digits, so "java" is not found in
//! "javascript" and "git" is not found in "digital". When two skill forms
//! overlap, only the longer one counts: "react native" is not also "react".

use std::sync::LazyLock;

use regex::Regex;

use crate::models::profile::ProfileDelta;

/// (canonical name, surface forms)
type Lexicon = &'static [(&'static str, &'static [&'static str])];

const SKILLS: Lexicon = &[
    ("react", &["react", "reactjs", "react.js"]),
    ("react native", &["react native"]),
    ("node", &["node", "node.js", "nodejs"]),
    ("angular", &["angular"]),
    ("vue", &["vue.js", "vuejs"]),
    ("javascript", &["javascript"]),
    ("typescript", &["typescript"]),
    ("python", &["python"]),
    ("java", &["java"]),
    ("spring", &["spring", "spring boot"]),
    ("php", &["php"]),
    ("symfony", &["symfony"]),
    ("django", &["django"]),
    ("sql", &["sql", "mysql"]),
    ("postgresql", &["postgresql", "postgres"]),
    ("mongodb", &["mongodb", "mongo"]),
    ("html", &["html"]),
    ("css", &["css", "scss"]),
    ("docker", &["docker"]),
    ("kubernetes", &["kubernetes", "k8s"]),
    ("terraform", &["terraform"]),
    ("linux", &["linux"]),
    ("aws", &["aws"]),
    ("git", &["git", "github", "gitlab"]),
    ("firebase", &["firebase"]),
    ("machine learning", &["machine learning", "ml"]),
    ("pytorch", &["pytorch"]),
    ("power bi", &["power bi", "powerbi"]),
    ("excel", &["excel"]),
    ("figma", &["figma"]),
    ("rust", &["rust"]),
    ("c++", &["c++"]),
    ("c#", &["c#"]),
    ("kotlin", &["kotlin"]),
    ("swift", &["swift"]),
    ("flutter", &["flutter"]),
];

const CITIES: Lexicon = &[
    ("paris", &["paris"]),
    ("lyon", &["lyon"]),
    ("marseille", &["marseille"]),
    ("toulouse", &["toulouse"]),
    ("bordeaux", &["bordeaux"]),
    ("lille", &["lille"]),
    ("nantes", &["nantes"]),
    ("nice", &["nice"]),
    ("strasbourg", &["strasbourg"]),
    ("montpellier", &["montpellier"]),
    ("rennes", &["rennes"]),
    ("grenoble", &["grenoble"]),
];

const PREFERENCES: Lexicon = &[
    ("startup", &["startup", "startups", "start-up", "start-ups"]),
    ("scale-up", &["scale-up", "scaleup"]),
    ("grand groupe", &["grand groupe", "grands groupes", "grande entreprise"]),
    ("esn", &["esn", "ssii"]),
    ("pme", &["pme"]),
    ("alternance", &["alternance"]),
    ("stage", &["stage"]),
];

const EDUCATION: Lexicon = &[
    ("bac+2", &["bac+2", "bac +2"]),
    ("bac+3", &["bac+3", "bac +3"]),
    ("bac+4", &["bac+4", "bac +4"]),
    ("bac+5", &["bac+5", "bac +5"]),
    ("bts", &["bts"]),
    ("dut", &["dut"]),
    ("licence", &["licence"]),
    ("bachelor", &["bachelor"]),
    ("master", &["master", "mastère"]),
    ("mba", &["mba"]),
    ("doctorat", &["doctorat", "phd"]),
];

static EXPERIENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})\s*(?:années?|ans?)\b").expect("static experience pattern")
});

/// Extracts every profile attribute the lexicon recognises in `message`.
///
/// - skills: every recognised skill, longest form first
/// - location: the earliest city mentioned
/// - preferences / education / experience: the latest mention
pub fn extract_profile(message: &str) -> ProfileDelta {
    let text = message.to_lowercase();

    let hits = skill_hits(&text);
    let skills = hits
        .iter()
        .filter(|hit| !hits.iter().any(|other| other.covers(hit)))
        .map(|hit| hit.canonical.to_string())
        .collect();

    ProfileDelta {
        skills,
        location: pick(&text, CITIES, Pick::Earliest),
        preferences: pick(&text, PREFERENCES, Pick::Latest),
        experience: extract_experience(&text),
        education: pick(&text, EDUCATION, Pick::Latest),
    }
}

/// `<n> an|ans|année|années` → `"<n> ans"`; the last mention wins.
pub fn extract_experience(message: &str) -> Option<String> {
    EXPERIENCE_RE
        .captures_iter(message)
        .last()
        .and_then(|caps| caps.get(1))
        .and_then(|n| n.as_str().parse::<u32>().ok())
        .map(|n| format!("{n} ans"))
}

/// True if `term` occurs in `text` as a whole term, ignoring case.
/// `node` is found in `Node.js`; `java` is not found in `JavaScript`.
pub fn contains_term(text: &str, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return false;
    }
    let text = text.to_lowercase();
    let found = occurrences(&text, &term).next().is_some();
    found
}

#[derive(Debug, Clone, Copy)]
struct SkillHit {
    start: usize,
    end: usize,
    canonical: &'static str,
}

impl SkillHit {
    /// A strictly longer hit spanning this one.
    fn covers(&self, other: &SkillHit) -> bool {
        self.start <= other.start
            && other.end <= self.end
            && self.end - self.start > other.end - other.start
    }
}

fn skill_hits(text: &str) -> Vec<SkillHit> {
    let mut hits = Vec::new();
    for &(canonical, forms) in SKILLS {
        for form in forms {
            hits.extend(occurrences(text, form).map(|start| SkillHit {
                start,
                end: start + form.len(),
                canonical,
            }));
        }
    }
    hits
}

#[derive(Clone, Copy)]
enum Pick {
    Earliest,
    Latest,
}

fn pick(text: &str, lexicon: Lexicon, mode: Pick) -> Option<String> {
    let hits = lexicon.iter().filter_map(|(canonical, forms)| {
        let position = forms.iter().filter_map(|f| match mode {
            Pick::Earliest => first_occurrence(text, f),
            Pick::Latest => last_occurrence(text, f),
        });
        let position = match mode {
            Pick::Earliest => position.min(),
            Pick::Latest => position.max(),
        }?;
        Some((position, *canonical))
    });

    let best = match mode {
        Pick::Earliest => hits.min_by_key(|(pos, _)| *pos),
        Pick::Latest => hits.max_by_key(|(pos, _)| *pos),
    };
    best.map(|(_, canonical)| canonical.to_string())
}

fn occurrences<'a>(text: &'a str, term: &'a str) -> impl Iterator<Item = usize> + 'a {
    text.match_indices(term)
        .map(|(idx, _)| idx)
        .filter(move |&idx| is_whole_term(text, idx, term.len()))
}

fn first_occurrence(text: &str, term: &str) -> Option<usize> {
    occurrences(text, term).next()
}

fn last_occurrence(text: &str, term: &str) -> Option<usize> {
    text.rmatch_indices(term)
        .map(|(idx, _)| idx)
        .find(|&idx| is_whole_term(text, idx, term.len()))
}

fn is_whole_term(text: &str, start: usize, len: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[start + len..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

// Profile Accumulator: lexicon extraction from free text plus the
// per-conversation store the orchestrator merges into.

pub mod extract;
pub mod store;

//! Chat pipeline: classify the message, run the matching branch, compose the reply.
//!
//! `engine::TurnEngine` owns the per-turn state machine; the other modules are
//! the steps it calls in order.

pub mod composer;
pub mod engine;
pub mod handlers;
pub mod intent;
pub mod prompts;

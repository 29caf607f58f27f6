//! # jobsuggest
//!
//! Client-side state and synchronization layer for the job-suggestions
//! service. Users authenticate, submit a five-field survey, and browse the
//! AI-generated suggestion entries the server keeps for them. An
//! accessibility layer adds text sizing, high contrast, and read-aloud.
//!
//! The crate owns session state, the entry cache, the survey submission
//! workflow, and the single shared speech channel. The HTTP API and any
//! rendering are external; they are reached through the [`net::Transport`]
//! and [`speech::SpeechBackend`] seams.

pub mod config;
pub mod net;
pub mod speech;
pub mod state;

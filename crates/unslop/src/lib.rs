//! Prompt realism scoring and rewriting.
//!
//! The [`prompt`] module holds the engine: a weighted rule table that scores how
//! likely an image-generation prompt is to produce generic, synthetic-looking
//! output, and a transformer that strips the offending phrases and grounds the
//! prompt in photographic vocabulary.

pub mod config;
pub mod error;
pub mod prompt;
pub mod telemetry;

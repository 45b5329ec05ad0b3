//! Batch sentiment analysis for tweet dumps
//!
//! Reads a CSV of tweets, cleans and tokenizes each one, scores it against a lexicon and writes
//! a per-tweet table plus a summary by label (and by label and time, when the input has
//! timestamps). Rows that can't be analyzed are counted as rejects, never dropped silently.
//!
//! The binaries in `src/bin` are thin wrappers; everything they do is available here.

#[macro_use] extern crate log;
extern crate chrono;
extern crate csv;
extern crate farmhash;
extern crate rayon;
extern crate regex;
extern crate serde;
extern crate unicode_segmentation;

pub mod errors;
pub mod config;
pub mod farm;
pub mod record;
pub mod normalize;
pub mod classify;
pub mod aggregate;
pub mod stats;
pub mod writer;
pub mod pipeline;

pub use crate::classify::{Classifier, Label, LexiconScorer, Scorer, SentimentResult};
pub use crate::config::{Config, Thresholds, TimeBucket};
pub use crate::pipeline::{Pipeline, RunReport};

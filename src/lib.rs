//! Has the Heroku Ruby buildpack upgraded Bundler yet?
//!
//! Resolves the latest buildpack release, reads the Bundler version it
//! pins and compares it against a configured minimum. The answer is served
//! over HTTP as HTML or JSON, with an optional Redis cache in front of the
//! upstream lookups.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod server;
pub mod upstream;
pub mod version;
pub mod web;


pub use error::{AppError, AppResult};
pub use evaluator::{Evaluation, UpgradeEvaluator};

//! Semantic version comparison
//!
//! Precedence follows semver: major, minor and patch numerically, then
//! pre-release identifiers (a release outranks any of its pre-releases).
//! Build metadata never affects the result.

use crate::error::{AppError, AppResult};
use semver::Version;
use std::cmp::Ordering;

/// Parse a version string, trimming surrounding whitespace
pub fn parse(value: &str) -> AppResult<Version> {
    Version::parse(value.trim()).map_err(|e| AppError::invalid_version(value, e))
}

/// Compare two versions by semver precedence, ignoring build metadata
pub fn cmp_precedence(a: &Version, b: &Version) -> Ordering {
    (a.major, a.minor, a.patch, &a.pre).cmp(&(b.major, b.minor, b.patch, &b.pre))
}

/// Whether `candidate >= threshold` under semver precedence
pub fn satisfies_minimum(candidate: &Version, threshold: &Version) -> bool {
    cmp_precedence(candidate, threshold) != Ordering::Less
}

/// Parse `candidate` and test it against an already validated threshold
pub fn is_at_least(candidate: &str, threshold: &Version) -> AppResult<bool> {
    let candidate = parse(candidate)?;
    Ok(satisfies_minimum(&candidate, threshold))
}

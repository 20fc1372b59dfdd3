//! Per-run name salting.
//!
//! Scenarios derive topic, table and connector names from a base identifier
//! plus a [`NameSalt`]. Concurrent runs against the same broker and database
//! only stay isolated through this suffix, so it is passed explicitly into
//! every scenario instead of living in process-wide state.

use std::fmt;

use rand::distr::Alphanumeric;
use rand::Rng;

/// Number of random characters in a generated salt.
const SALT_LEN: usize = 10;

/// Suffix appended to every resource name of a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameSalt(String);

impl NameSalt {
    /// Use an explicit suffix.
    pub fn new(salt: impl Into<String>) -> Self {
        Self(salt.into())
    }

    /// Generate `_` followed by random lowercase alphanumerics using `rng`.
    ///
    /// Lowercase keeps derived names valid as unquoted table identifiers.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let suffix: String = (0..SALT_LEN)
            .map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_lowercase())
            .collect();
        Self(format!("_{suffix}"))
    }

    /// Generate a salt from the thread-local RNG.
    pub fn random() -> Self {
        Self::generate(&mut rand::rng())
    }

    /// The suffix itself.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Append this salt to `base`.
    pub fn apply(&self, base: &str) -> String {
        format!("{base}{}", self.0)
    }
}

impl fmt::Display for NameSalt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

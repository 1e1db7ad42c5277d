//! Build option sets
//!
//! The full option set is owned by the build tool; this crate only needs it
//! to be comparable, hashable, trimmable and encodable. `OptionSet` captures
//! that contract and `BuildOptions` is a ready-made implementation keyed by
//! option category.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::Hash;
use thiserror::Error;

/// Errors raised by an option set implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionsError {
    #[error("Option category required by fragment is missing: {0}")]
    MissingCategory(String),

    #[error("Failed to encode options: {0}")]
    Encode(String),

    #[error("Failed to decode options: {0}")]
    Decode(String),
}

/// A named group of related build flags (e.g. "cpp", "java", "core")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionCategory(String);

impl OptionCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OptionCategory {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for OptionCategory {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for OptionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Contract for the immutable set of build flags a fragment key is built from.
///
/// Two option sets must be equal exactly when their `canonical_bytes` are
/// identical, and `trim` must be pure.
pub trait OptionSet: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// Reduce the set to the given categories
    fn trim(&self, relevant: &BTreeSet<OptionCategory>) -> Result<Self, OptionsError>;

    /// Deterministic byte form used for fingerprinting
    fn canonical_bytes(&self) -> Result<Vec<u8>, OptionsError>;

    /// Append the wire encoding to `out`
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), OptionsError>;

    /// Decode from the front of `input`, advancing it past the consumed bytes
    fn decode(input: &mut &[u8]) -> Result<Self, OptionsError>;
}

/// Build options grouped by category, each category a flag -> value map.
///
/// Ordered maps keep both equality and the postcard encoding canonical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildOptions {
    categories: BTreeMap<OptionCategory, BTreeMap<String, String>>,
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy with `flag` set to `value` in `category`
    pub fn with(
        mut self,
        category: impl Into<OptionCategory>,
        flag: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.set(category, flag, value);
        self
    }

    pub fn set(
        &mut self,
        category: impl Into<OptionCategory>,
        flag: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.categories
            .entry(category.into())
            .or_default()
            .insert(flag.into(), value.into());
    }

    pub fn get(&self, category: &str, flag: &str) -> Option<&str> {
        self.categories
            .get(&OptionCategory::from(category))
            .and_then(|flags| flags.get(flag))
            .map(String::as_str)
    }

    pub fn categories(&self) -> impl Iterator<Item = &OptionCategory> {
        self.categories.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl OptionSet for BuildOptions {
    fn trim(&self, relevant: &BTreeSet<OptionCategory>) -> Result<Self, OptionsError> {
        let mut categories = BTreeMap::new();
        for category in relevant {
            let flags = self
                .categories
                .get(category)
                .ok_or_else(|| OptionsError::MissingCategory(category.to_string()))?;
            categories.insert(category.clone(), flags.clone());
        }
        Ok(Self { categories })
    }

    fn canonical_bytes(&self) -> Result<Vec<u8>, OptionsError> {
        postcard::to_allocvec(self).map_err(|e| OptionsError::Encode(e.to_string()))
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<(), OptionsError> {
        out.extend_from_slice(&self.canonical_bytes()?);
        Ok(())
    }

    fn decode(input: &mut &[u8]) -> Result<Self, OptionsError> {
        let (options, rest) = postcard::take_from_bytes::<Self>(*input)
            .map_err(|e| OptionsError::Decode(e.to_string()))?;
        *input = rest;
        Ok(options)
    }
}

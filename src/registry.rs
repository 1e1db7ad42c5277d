//! Fragment type registry
//!
//! Maps fragment type names to their runtime identity and to the option
//! categories each fragment reads. Two traits split the roles so callers can
//! inject either one:
//! - `TypeResolver`: name -> `FragmentType` (used when decoding keys)
//! - `OptionsResolver`: `FragmentType` -> relevant option categories (used
//!   when trimming)
//!
//! `FragmentRegistry` implements both and is immutable once built.

use crate::config::schema::FragmentConfig;
use crate::error::{FragkeyError, FragkeyResult};
use crate::options::OptionCategory;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Identity of a fragment kind, carried by its globally unique name
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FragmentType(Arc<str>);

impl FragmentType {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FragmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for FragmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FragmentType({})", self.0)
    }
}

/// Resolves serialized fragment type names back to live types
///
/// Unknown names resolve to `None`; implementations must never substitute a
/// default type.
pub trait TypeResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<FragmentType>;
}

/// Reports which option categories a fragment type depends on
pub trait OptionsResolver: Send + Sync {
    fn option_categories(&self, fragment: &FragmentType) -> Option<BTreeSet<OptionCategory>>;
}

#[derive(Debug, Clone)]
struct Registration {
    fragment_type: FragmentType,
    categories: BTreeSet<OptionCategory>,
}

/// Immutable registry of known fragment types
#[derive(Debug, Clone, Default)]
pub struct FragmentRegistry {
    fragments: BTreeMap<String, Registration>,
}

impl FragmentRegistry {
    pub fn builder() -> FragmentRegistryBuilder {
        FragmentRegistryBuilder::default()
    }

    /// Build a registry from `[[fragments]]` config entries
    pub fn from_config(fragments: &[FragmentConfig]) -> FragkeyResult<Self> {
        fragments
            .iter()
            .fold(Self::builder(), |builder, fragment| {
                builder.register(&fragment.name, fragment.options.iter().map(String::as_str))
            })
            .build()
    }

    pub fn get(&self, name: &str) -> Option<&FragmentType> {
        self.fragments.get(name).map(|r| &r.fragment_type)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// All registered fragment types, ordered by name
    pub fn fragment_types(&self) -> impl Iterator<Item = &FragmentType> {
        self.fragments.values().map(|r| &r.fragment_type)
    }
}

impl TypeResolver for FragmentRegistry {
    fn resolve(&self, name: &str) -> Option<FragmentType> {
        self.get(name).cloned()
    }
}

impl OptionsResolver for FragmentRegistry {
    fn option_categories(&self, fragment: &FragmentType) -> Option<BTreeSet<OptionCategory>> {
        self.fragments
            .get(fragment.name())
            .map(|r| r.categories.clone())
    }
}

/// Collects registrations and validates them on `build`
#[derive(Debug, Default)]
pub struct FragmentRegistryBuilder {
    entries: Vec<(String, BTreeSet<OptionCategory>)>,
}

impl FragmentRegistryBuilder {
    /// Register a fragment type and the option categories it reads
    pub fn register<I, C>(mut self, name: impl Into<String>, categories: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<OptionCategory>,
    {
        self.entries.push((
            name.into(),
            categories.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn build(self) -> FragkeyResult<FragmentRegistry> {
        let mut fragments = BTreeMap::new();

        for (name, categories) in self.entries {
            if name.trim().is_empty() || name.chars().any(char::is_whitespace) {
                return Err(FragkeyError::InvalidFragmentName(name));
            }
            if fragments.contains_key(&name) {
                return Err(FragkeyError::DuplicateFragmentType(name));
            }

            debug!("Registered fragment type {} ({} option categories)", name, categories.len());
            let registration = Registration {
                fragment_type: FragmentType::new(&name),
                categories,
            };
            fragments.insert(name, registration);
        }

        Ok(FragmentRegistry { fragments })
    }
}

//! Fragment keys
//!
//! A `FragmentKey` names "the fragment of type T computed from exactly these
//! (trimmed) options". Keys are only handed out through `key()` or the codec,
//! both of which route through a `KeyInterner`, so logically equal keys are
//! also the same allocation.

use crate::error::{FragkeyError, FragkeyResult};
use crate::fingerprint::Fingerprint;
use crate::interner::KeyInterner;
use crate::options::{BuildOptions, OptionSet};
use crate::registry::{FragmentType, OptionsResolver};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::trace;

/// Dispatch name the host graph engine routes on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionName(&'static str);

impl FunctionName {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Function name shared by fragment keys and values
pub const CONFIGURATION_FRAGMENT: FunctionName = FunctionName::new("CONFIGURATION_FRAGMENT");

/// A key the host graph engine can schedule
pub trait NodeKey {
    fn function_name(&self) -> FunctionName;
}

pub(crate) struct KeyData<O> {
    options: O,
    fragment_type: FragmentType,
    fingerprint: Fingerprint,
}

impl<O: OptionSet> KeyData<O> {
    /// Logical identity: the fingerprint takes no part
    pub(crate) fn same_identity(&self, other: &Self) -> bool {
        self.fragment_type == other.fragment_type && self.options == other.options
    }
}

/// Canonical identity of a configuration fragment node
pub struct FragmentKey<O: OptionSet = BuildOptions> {
    pub(crate) data: Arc<KeyData<O>>,
}

impl<O: OptionSet> FragmentKey<O> {
    /// Build an un-interned candidate from already trimmed options
    pub(crate) fn candidate(options: O, fragment_type: FragmentType) -> FragkeyResult<Self> {
        let fingerprint = Fingerprint::of_options(&options)?;
        Ok(Self::with_fingerprint(options, fragment_type, fingerprint))
    }

    pub(crate) fn with_fingerprint(
        options: O,
        fragment_type: FragmentType,
        fingerprint: Fingerprint,
    ) -> Self {
        Self {
            data: Arc::new(KeyData {
                options,
                fragment_type,
                fingerprint,
            }),
        }
    }

    /// The trimmed options this key was built from
    pub fn options(&self) -> &O {
        &self.data.options
    }

    pub fn fragment_type(&self) -> &FragmentType {
        &self.data.fragment_type
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.data.fingerprint
    }

    /// Whether both handles point at the same canonical instance
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.data, &b.data)
    }
}

impl<O: OptionSet> Clone for FragmentKey<O> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<O: OptionSet> PartialEq for FragmentKey<O> {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other) || self.data.same_identity(&other.data)
    }
}

impl<O: OptionSet> Eq for FragmentKey<O> {}

impl<O: OptionSet> Hash for FragmentKey<O> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.options.hash(state);
        self.data.fragment_type.hash(state);
    }
}

impl<O: OptionSet> fmt::Display for FragmentKey<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FragmentKey(type={}, checksum={})",
            self.data.fragment_type, self.data.fingerprint
        )
    }
}

impl<O: OptionSet> fmt::Debug for FragmentKey<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FragmentKey")
            .field("fragment_type", &self.data.fragment_type)
            .field("fingerprint", &self.data.fingerprint)
            .field("options", &self.data.options)
            .finish()
    }
}

impl<O: OptionSet> NodeKey for FragmentKey<O> {
    fn function_name(&self) -> FunctionName {
        CONFIGURATION_FRAGMENT
    }
}

/// Get the canonical key for `fragment_type` computed from `options`.
///
/// Options are trimmed to the categories `resolver` reports for the fragment,
/// so option sets differing only in irrelevant flags produce the same
/// (pointer-equal) key.
pub fn key<O: OptionSet>(
    options: &O,
    fragment_type: &FragmentType,
    resolver: &dyn OptionsResolver,
    interner: &KeyInterner<O>,
) -> FragkeyResult<FragmentKey<O>> {
    let relevant = resolver
        .option_categories(fragment_type)
        .ok_or_else(|| FragkeyError::FragmentNotRegistered(fragment_type.name().to_string()))?;

    let trimmed = options.trim(&relevant)?;
    let candidate = FragmentKey::candidate(trimmed, fragment_type.clone())?;
    let key = interner.intern(candidate);

    trace!("Resolved {}", key);
    Ok(key)
}

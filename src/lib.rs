//! fragkey - identity and persistence for configuration fragment nodes
//!
//! A configuration fragment is derived from a subset of build flags. This
//! crate gives "fragment of type T computed from these flags" a canonical,
//! interned and serializable key so an incremental build graph can share one
//! cached computation between independent, concurrent requests.

pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod fingerprint;
pub mod interner;
pub mod key;
pub mod logging;
pub mod options;
pub mod registry;
pub mod value;

pub use codec::{DeserializationContext, Dependencies, KeyCodec, SerializationContext};
pub use context::FragmentContext;
pub use error::{FragkeyError, FragkeyResult};
pub use fingerprint::Fingerprint;
pub use interner::{InternerStats, KeyInterner};
pub use key::{key, FragmentKey, FunctionName, NodeKey, CONFIGURATION_FRAGMENT};
pub use options::{BuildOptions, OptionCategory, OptionSet, OptionsError};
pub use registry::{FragmentRegistry, FragmentType, OptionsResolver, TypeResolver};
pub use value::{Fragment, FragmentValue};

//! Process-wide fragment context
//!
//! Bundles the interner, the fragment registry and the key codec so a host
//! creates them once at startup and passes one handle around instead of
//! reaching for global state.

use crate::codec::{DeserializationContext, KeyCodec, SerializationContext};
use crate::config::Config;
use crate::error::{FragkeyError, FragkeyResult};
use crate::interner::KeyInterner;
use crate::key::{self, FragmentKey};
use crate::options::{BuildOptions, OptionSet};
use crate::registry::{FragmentRegistry, FragmentType, TypeResolver};
use std::sync::Arc;
use tracing::info;

/// Shared state for building, interning and (de)serializing fragment keys
pub struct FragmentContext<O: OptionSet = BuildOptions> {
    registry: Arc<FragmentRegistry>,
    codec: KeyCodec<O>,
    validate_on_serialize: bool,
}

impl<O: OptionSet> FragmentContext<O> {
    pub fn new(registry: FragmentRegistry, interner: KeyInterner<O>) -> Self {
        Self {
            registry: Arc::new(registry),
            codec: KeyCodec::new(Arc::new(interner)),
            validate_on_serialize: true,
        }
    }

    /// Build the context described by a loaded config
    pub fn from_config(config: &Config) -> FragkeyResult<Self> {
        let registry = FragmentRegistry::from_config(&config.fragments)?;
        info!(
            "Fragment context ready: {} fragment types, {} interner shards",
            registry.len(),
            config.interner.shards
        );

        let mut context = Self::new(registry, KeyInterner::new(config.interner.shards));
        context.validate_on_serialize = config.codec.validate_on_serialize;
        Ok(context)
    }

    /// Canonical key for `fragment_type` computed from `options`
    pub fn key(&self, options: &O, fragment_type: &FragmentType) -> FragkeyResult<FragmentKey<O>> {
        key::key(options, fragment_type, self.registry.as_ref(), self.interner())
    }

    /// Same as `key`, looking the fragment type up by name
    pub fn key_by_name(&self, options: &O, name: &str) -> FragkeyResult<FragmentKey<O>> {
        let fragment_type = self
            .registry
            .resolve(name)
            .ok_or_else(|| FragkeyError::FragmentNotRegistered(name.to_string()))?;
        self.key(options, &fragment_type)
    }

    pub fn serialization_context(&self) -> SerializationContext {
        let context = SerializationContext::new();
        if self.validate_on_serialize {
            context.with_validation(self.registry.clone())
        } else {
            context
        }
    }

    pub fn deserialization_context(&self) -> DeserializationContext {
        DeserializationContext::new(self.registry.clone())
    }

    pub fn encode_key(&self, key: &FragmentKey<O>) -> FragkeyResult<Vec<u8>> {
        self.codec.to_bytes(&self.serialization_context(), key)
    }

    pub fn decode_key(&self, bytes: &[u8]) -> FragkeyResult<FragmentKey<O>> {
        self.codec.from_bytes(&self.deserialization_context(), bytes)
    }

    pub fn registry(&self) -> &FragmentRegistry {
        &self.registry
    }

    pub fn interner(&self) -> &KeyInterner<O> {
        self.codec.interner().as_ref()
    }

    pub fn codec(&self) -> &KeyCodec<O> {
        &self.codec
    }
}

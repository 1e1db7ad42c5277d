//! Context-aware fragment key codec
//!
//! Wire layout of a key:
//!
//! | Part | Encoding |
//! |------|----------|
//! | trimmed options | delegated to `OptionSet::encode` |
//! | fragment type name | postcard string (varint length + UTF-8) |
//!
//! Decoding resolves the name through the context's `TypeResolver` and then
//! re-enters the interner, so a decoded key is the same instance as one built
//! in memory. The interner is only touched once the whole key has decoded
//! and resolved; `from_bytes` also checks for trailing bytes first, so a
//! rejected buffer never registers a key.

use crate::error::{FragkeyError, FragkeyResult};
use crate::interner::KeyInterner;
use crate::key::FragmentKey;
use crate::options::{BuildOptions, OptionSet};
use crate::registry::TypeResolver;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Typed collaborators injected into codecs (filesystem providers, etc.)
#[derive(Clone, Default)]
pub struct Dependencies {
    entries: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Dependencies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dependency, replacing any previous value of the same type
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        self.entries.insert(TypeId::of::<T>(), Arc::new(value));
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    /// Like `get`, but a missing dependency is a `MissingDependency` error
    pub fn require<T: Any + Send + Sync>(&self) -> FragkeyResult<&T> {
        self.get::<T>()
            .ok_or(FragkeyError::MissingDependency(type_name::<T>()))
    }
}

/// Context passed to every serializer
#[derive(Clone, Default)]
pub struct SerializationContext {
    resolver: Option<Arc<dyn TypeResolver>>,
    dependencies: Dependencies,
}

impl SerializationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse to write fragment type names this resolver cannot resolve
    pub fn with_validation(mut self, resolver: Arc<dyn TypeResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_dependency<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.dependencies.insert(value);
        self
    }

    pub fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }

    fn validate(&self, name: &str) -> FragkeyResult<()> {
        match &self.resolver {
            Some(resolver) if resolver.resolve(name).is_none() => {
                Err(FragkeyError::UnresolvedFragmentType {
                    name: name.to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Context passed to every deserializer; the resolver is mandatory
#[derive(Clone)]
pub struct DeserializationContext {
    resolver: Arc<dyn TypeResolver>,
    dependencies: Dependencies,
}

impl DeserializationContext {
    pub fn new(resolver: Arc<dyn TypeResolver>) -> Self {
        Self {
            resolver,
            dependencies: Dependencies::new(),
        }
    }

    pub fn with_dependency<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.dependencies.insert(value);
        self
    }

    pub fn resolver(&self) -> &dyn TypeResolver {
        self.resolver.as_ref()
    }

    pub fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }
}

pub(crate) fn write_str(out: &mut Vec<u8>, value: &str) -> FragkeyResult<()> {
    let bytes = postcard::to_allocvec(value).map_err(|e| FragkeyError::encode("string", e))?;
    out.extend_from_slice(&bytes);
    Ok(())
}

pub(crate) fn read_str(input: &mut &[u8], context: &str) -> FragkeyResult<String> {
    let (value, rest) =
        postcard::take_from_bytes::<String>(*input).map_err(|e| FragkeyError::decode(context, e))?;
    *input = rest;
    Ok(value)
}

pub(crate) fn write_bool(out: &mut Vec<u8>, value: bool) -> FragkeyResult<()> {
    let bytes = postcard::to_allocvec(&value).map_err(|e| FragkeyError::encode("flag", e))?;
    out.extend_from_slice(&bytes);
    Ok(())
}

pub(crate) fn read_bool(input: &mut &[u8], context: &str) -> FragkeyResult<bool> {
    let (value, rest) =
        postcard::take_from_bytes::<bool>(*input).map_err(|e| FragkeyError::decode(context, e))?;
    *input = rest;
    Ok(value)
}

pub(crate) fn ensure_consumed(input: &[u8]) -> FragkeyResult<()> {
    if input.is_empty() {
        Ok(())
    } else {
        Err(FragkeyError::TrailingBytes(input.len()))
    }
}

/// Serializer for `FragmentKey`, bound to the interner decoded keys rejoin
pub struct KeyCodec<O: OptionSet = BuildOptions> {
    interner: Arc<KeyInterner<O>>,
}

impl<O: OptionSet> KeyCodec<O> {
    pub fn new(interner: Arc<KeyInterner<O>>) -> Self {
        Self { interner }
    }

    /// Append the encoding of `key` to `out`
    pub fn serialize(
        &self,
        context: &SerializationContext,
        key: &FragmentKey<O>,
        out: &mut Vec<u8>,
    ) -> FragkeyResult<()> {
        let name = key.fragment_type().name();
        context.validate(name)?;

        key.options().encode(out)?;
        write_str(out, name)?;

        trace!("Serialized {}", key);
        Ok(())
    }

    /// Decode one key from the front of `input`, advancing past it
    pub fn deserialize(
        &self,
        context: &DeserializationContext,
        input: &mut &[u8],
    ) -> FragkeyResult<FragmentKey<O>> {
        let candidate = self.decode_candidate(context, input)?;
        Ok(self.interner.intern(candidate))
    }

    pub fn to_bytes(
        &self,
        context: &SerializationContext,
        key: &FragmentKey<O>,
    ) -> FragkeyResult<Vec<u8>> {
        let mut out = Vec::new();
        self.serialize(context, key, &mut out)?;
        Ok(out)
    }

    /// Decode a buffer holding exactly one key
    pub fn from_bytes(
        &self,
        context: &DeserializationContext,
        bytes: &[u8],
    ) -> FragkeyResult<FragmentKey<O>> {
        let mut input = bytes;
        let candidate = self.decode_candidate(context, &mut input)?;
        ensure_consumed(input)?;
        Ok(self.interner.intern(candidate))
    }

    pub fn interner(&self) -> &Arc<KeyInterner<O>> {
        &self.interner
    }

    /// Decode and resolve one key without registering it
    fn decode_candidate(
        &self,
        context: &DeserializationContext,
        input: &mut &[u8],
    ) -> FragkeyResult<FragmentKey<O>> {
        let options = O::decode(input)?;
        let name = read_str(input, "fragment type name")?;

        let fragment_type = context.resolver().resolve(&name).ok_or_else(|| {
            debug!("Refusing to decode key with unknown fragment type {}", name);
            FragkeyError::UnresolvedFragmentType { name }
        })?;

        FragmentKey::candidate(options, fragment_type)
    }
}

impl<O: OptionSet> Clone for KeyCodec<O> {
    fn clone(&self) -> Self {
        Self {
            interner: Arc::clone(&self.interner),
        }
    }
}

//! Fragment values
//!
//! The host engine stores one `FragmentValue` per `FragmentKey`. The value
//! either holds the computed fragment or records that the fragment type does
//! not apply to the given options.

use crate::codec::{
    ensure_consumed, read_bool, write_bool, DeserializationContext, SerializationContext,
};
use crate::error::FragkeyResult;
use crate::key::{FunctionName, CONFIGURATION_FRAGMENT};
use std::fmt;
use std::sync::Arc;

/// A computed configuration fragment that can travel through the codec
pub trait Fragment: fmt::Debug + Send + Sync + 'static {
    fn encode(&self, context: &SerializationContext, out: &mut Vec<u8>) -> FragkeyResult<()>;

    fn decode(context: &DeserializationContext, input: &mut &[u8]) -> FragkeyResult<Self>
    where
        Self: Sized;
}

/// Immutable holder for a computed fragment
#[derive(Debug)]
pub struct FragmentValue<F> {
    fragment: Option<Arc<F>>,
}

impl<F: Fragment> FragmentValue<F> {
    pub fn new(fragment: F) -> Self {
        Self {
            fragment: Some(Arc::new(fragment)),
        }
    }

    /// Value recorded when the fragment type does not apply
    pub fn not_applicable() -> Self {
        Self { fragment: None }
    }

    pub fn fragment(&self) -> Option<&F> {
        self.fragment.as_deref()
    }

    pub fn is_applicable(&self) -> bool {
        self.fragment.is_some()
    }

    pub fn function_name(&self) -> FunctionName {
        CONFIGURATION_FRAGMENT
    }

    /// Append `[present flag][fragment encoding]` to `out`
    pub fn serialize(
        &self,
        context: &SerializationContext,
        out: &mut Vec<u8>,
    ) -> FragkeyResult<()> {
        write_bool(out, self.fragment.is_some())?;
        if let Some(fragment) = &self.fragment {
            fragment.encode(context, out)?;
        }
        Ok(())
    }

    pub fn deserialize(context: &DeserializationContext, input: &mut &[u8]) -> FragkeyResult<Self> {
        if read_bool(input, "fragment presence")? {
            Ok(Self::new(F::decode(context, input)?))
        } else {
            Ok(Self::not_applicable())
        }
    }

    pub fn to_bytes(&self, context: &SerializationContext) -> FragkeyResult<Vec<u8>> {
        let mut out = Vec::new();
        self.serialize(context, &mut out)?;
        Ok(out)
    }

    pub fn from_bytes(context: &DeserializationContext, bytes: &[u8]) -> FragkeyResult<Self> {
        let mut input = bytes;
        let value = Self::deserialize(context, &mut input)?;
        ensure_consumed(input)?;
        Ok(value)
    }
}

impl<F> Clone for FragmentValue<F> {
    fn clone(&self) -> Self {
        Self {
            fragment: self.fragment.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{read_str, write_str};
    use crate::error::FragkeyError;
    use crate::registry::FragmentRegistry;

    /// Where the host keeps toolchains; injected when decoding
    #[derive(Debug)]
    struct ToolchainRoot(String);

    #[derive(Debug, PartialEq)]
    struct CppFragment {
        compiler: String,
        sysroot: String,
    }

    impl Fragment for CppFragment {
        fn encode(&self, _: &SerializationContext, out: &mut Vec<u8>) -> FragkeyResult<()> {
            write_str(out, &self.compiler)
        }

        fn decode(context: &DeserializationContext, input: &mut &[u8]) -> FragkeyResult<Self> {
            let root = context.dependencies().require::<ToolchainRoot>()?;
            Ok(Self {
                compiler: read_str(input, "compiler")?,
                sysroot: root.0.clone(),
            })
        }
    }

    fn context() -> DeserializationContext {
        let registry = FragmentRegistry::builder().build().unwrap();
        DeserializationContext::new(Arc::new(registry))
            .with_dependency(ToolchainRoot("/opt/toolchains".to_string()))
    }

    fn cpp() -> CppFragment {
        CppFragment {
            compiler: "clang".to_string(),
            sysroot: "/opt/toolchains".to_string(),
        }
    }

    #[test]
    fn accessors() {
        let value = FragmentValue::new(cpp());
        assert!(value.is_applicable());
        assert_eq!(value.fragment(), Some(&cpp()));
        assert_eq!(value.function_name(), CONFIGURATION_FRAGMENT);

        let absent = FragmentValue::<CppFragment>::not_applicable();
        assert!(!absent.is_applicable());
        assert!(absent.fragment().is_none());
    }

    #[test]
    fn fragment_roundtrip_uses_injected_dependency() {
        let bytes = FragmentValue::new(cpp())
            .to_bytes(&SerializationContext::new())
            .unwrap();
        let decoded = FragmentValue::<CppFragment>::from_bytes(&context(), &bytes).unwrap();

        assert_eq!(decoded.fragment(), Some(&cpp()));
    }

    #[test]
    fn not_applicable_roundtrip() {
        let bytes = FragmentValue::<CppFragment>::not_applicable()
            .to_bytes(&SerializationContext::new())
            .unwrap();
        assert_eq!(bytes, vec![0]);

        let decoded = FragmentValue::<CppFragment>::from_bytes(&context(), &bytes).unwrap();
        assert!(!decoded.is_applicable());
    }

    #[test]
    fn missing_dependency_fails_decode() {
        let bytes = FragmentValue::new(cpp())
            .to_bytes(&SerializationContext::new())
            .unwrap();
        let bare = DeserializationContext::new(Arc::new(FragmentRegistry::default()));

        let err = FragmentValue::<CppFragment>::from_bytes(&bare, &bytes).unwrap_err();
        assert!(matches!(err, FragkeyError::MissingDependency(_)));
    }

    #[test]
    fn clones_share_fragment() {
        let value = FragmentValue::new(cpp());
        let copy = value.clone();
        assert!(std::ptr::eq(
            value.fragment().unwrap(),
            copy.fragment().unwrap()
        ));
    }
}

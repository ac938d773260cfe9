use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;

use crate::adapters::script_provider::ScriptProvider;
use crate::domain::{EnumSchema, MockError, RegistrationError, TypeDescriptor, TypeKey};

const STR_EXAMPLES: [&str; 3] = [
    "Hello, World ❤️",
    "Nihil verum omnia licet",
    "Lorem ipsum dolor sit amet",
];

pub type NullaryFn = dyn Fn(&mut dyn RngCore) -> Result<Value, MockError> + Send + Sync;
pub type UnaryFn =
    dyn Fn(&TypeDescriptor, &mut dyn RngCore) -> Result<Value, MockError> + Send + Sync;

/// A value source registered for a type key.
#[derive(Clone)]
pub enum Generator {
    Constant(Value),
    /// Called without the target descriptor.
    Nullary(Arc<NullaryFn>),
    /// Called with the target descriptor.
    Unary(Arc<UnaryFn>),
    /// Arity is only known once the script's `generate` function is inspected.
    Script(Arc<ScriptProvider>),
}

impl Generator {
    pub fn constant(value: impl Into<Value>) -> Self {
        Self::Constant(value.into())
    }

    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&mut dyn RngCore) -> Value + Send + Sync + 'static,
    {
        Self::Nullary(Arc::new(move |rng: &mut dyn RngCore| Ok(f(rng))))
    }

    pub fn typed<F>(f: F) -> Self
    where
        F: Fn(&TypeDescriptor, &mut dyn RngCore) -> Result<Value, MockError>
            + Send
            + Sync
            + 'static,
    {
        Self::Unary(Arc::new(f))
    }

    fn call(
        &self,
        key: &TypeKey,
        descriptor: &TypeDescriptor,
        rng: &mut dyn RngCore,
    ) -> Result<Value, MockError> {
        match self {
            Self::Constant(value) => Ok(value.clone()),
            Self::Nullary(f) => f(rng),
            Self::Unary(f) => f(descriptor, rng),
            Self::Script(script) => script.call(key, descriptor),
        }
    }
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Self::Nullary(_) => f.write_str("Nullary(..)"),
            Self::Unary(_) => f.write_str("Unary(..)"),
            Self::Script(_) => f.write_str("Script(..)"),
        }
    }
}

/// Ordered registry of example generators.
///
/// Lookup walks the entries in insertion order and uses the first key the
/// target descriptor is a subtype of.
#[derive(Clone)]
pub struct ExampleProvider {
    entries: Vec<(TypeKey, Generator)>,
}

impl ExampleProvider {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Caller entries take priority over the defaults they don't replace.
    pub fn with_providers<I>(providers: I) -> Result<Self, RegistrationError>
    where
        I: IntoIterator<Item = (TypeKey, Generator)>,
    {
        let mut provider = Self::empty();
        for (key, generator) in providers {
            provider.register(key, generator)?;
        }
        for (key, generator) in default_entries() {
            if !provider.contains(&key) {
                provider.entries.push((key, generator));
            }
        }
        Ok(provider)
    }

    /// Register a generator, replacing any entry for the exact same key.
    pub fn register(
        &mut self,
        key: TypeKey,
        generator: Generator,
    ) -> Result<(), RegistrationError> {
        match key {
            TypeKey::Null => return Err(RegistrationError::NullType),
            TypeKey::Record => return Err(RegistrationError::RecordType),
            _ => key.validate()?,
        }

        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = generator;
        } else {
            tracing::debug!(type_key = %key, "registered example provider");
            self.entries.push((key, generator));
        }
        Ok(())
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &TypeKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Generate a value for a scalar, named or enumeration descriptor.
    pub fn resolve(
        &self,
        descriptor: &TypeDescriptor,
        rng: &mut dyn RngCore,
    ) -> Result<Value, MockError> {
        let (key, generator) = self
            .entries
            .iter()
            .find(|(key, _)| descriptor.is_subtype_of(key))
            .ok_or_else(|| MockError::UnsupportedSchema(descriptor.type_name()))?;
        generator.call(key, descriptor, rng)
    }
}

impl Default for ExampleProvider {
    fn default() -> Self {
        Self {
            entries: default_entries(),
        }
    }
}

impl fmt::Debug for ExampleProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.keys().map(ToString::to_string)).finish()
    }
}

fn default_entries() -> Vec<(TypeKey, Generator)> {
    vec![
        (TypeKey::Bool, Generator::from_fn(|rng| json!(rng.gen::<bool>()))),
        (TypeKey::Int, Generator::from_fn(|rng| json!(rng.gen_range(0..100)))),
        (
            TypeKey::Float,
            Generator::from_fn(|rng| json!(rng.gen_range(0.0..100.0))),
        ),
        (
            TypeKey::Str,
            Generator::from_fn(|rng| {
                json!(STR_EXAMPLES.choose(rng).copied().unwrap_or_default())
            }),
        ),
        (TypeKey::Enum, Generator::typed(choose_enum_member)),
    ]
}

fn choose_enum_member(
    descriptor: &TypeDescriptor,
    rng: &mut dyn RngCore,
) -> Result<Value, MockError> {
    let schema = enum_schema(descriptor)
        .ok_or_else(|| MockError::UnsupportedSchema(descriptor.type_name()))?;
    schema
        .members
        .choose(rng)
        .cloned()
        .ok_or_else(|| {
            MockError::UnsupportedSchema(format!("enum {} has no members", schema.name))
        })
}

fn enum_schema(descriptor: &TypeDescriptor) -> Option<&EnumSchema> {
    match descriptor {
        TypeDescriptor::Enum(schema) => Some(schema),
        TypeDescriptor::Named { base, .. } => base.as_deref().and_then(enum_schema),
        _ => None,
    }
}

use rand::seq::SliceRandom;
use rand::RngCore;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::adapters::example_provider::ExampleProvider;
use crate::domain::{DeclaredExample, FieldSchema, MockError, RecordSchema, TypeDescriptor};

/// Maximum descriptor nesting before resolution gives up.
pub const MAX_DEPTH: usize = 32;

/// Walks a descriptor tree and synthesizes a matching example value.
#[derive(Debug, Clone, Default)]
pub struct SchemaResolver {
    provider: Arc<ExampleProvider>,
}

impl SchemaResolver {
    pub fn new(provider: Arc<ExampleProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &ExampleProvider {
        &self.provider
    }

    pub fn resolve(&self, descriptor: Option<&TypeDescriptor>) -> Result<Value, MockError> {
        let mut rng = rand::thread_rng();
        self.resolve_with(descriptor, &mut rng)
    }

    /// Resolve with an injected randomness source.
    pub fn resolve_with(
        &self,
        descriptor: Option<&TypeDescriptor>,
        rng: &mut dyn RngCore,
    ) -> Result<Value, MockError> {
        match descriptor {
            Some(descriptor) => self.resolve_at(descriptor, rng, 0),
            None => Ok(Value::Null),
        }
    }

    fn resolve_at(
        &self,
        descriptor: &TypeDescriptor,
        rng: &mut dyn RngCore,
        depth: usize,
    ) -> Result<Value, MockError> {
        if depth > MAX_DEPTH {
            return Err(MockError::RecursionLimit(MAX_DEPTH));
        }

        match descriptor {
            TypeDescriptor::Null => Ok(Value::Null),
            TypeDescriptor::Scalar(_) | TypeDescriptor::Named { .. } | TypeDescriptor::Enum(_) => {
                self.provider.resolve(descriptor, rng)
            }
            TypeDescriptor::Record(record) => self.resolve_record_at(record, rng, depth),
            TypeDescriptor::List(args) | TypeDescriptor::Tuple(args) => {
                Ok(Value::Array(self.resolve_each(args, rng, depth)?))
            }
            TypeDescriptor::Set(args) => {
                let mut items: Vec<Value> = Vec::with_capacity(args.len());
                for item in self.resolve_each(args, rng, depth)? {
                    if !items.contains(&item) {
                        items.push(item);
                    }
                }
                Ok(Value::Array(items))
            }
            TypeDescriptor::Map(key, value) => {
                let key = object_key(self.resolve_at(key, rng, depth + 1)?)?;
                let value = self.resolve_at(value, rng, depth + 1)?;
                let mut object = Map::new();
                object.insert(key, value);
                Ok(Value::Object(object))
            }
            TypeDescriptor::Union(alternatives) => {
                let chosen = alternatives
                    .choose(rng)
                    .ok_or_else(|| MockError::UnsupportedSchema("empty union".to_string()))?;
                self.resolve_at(chosen, rng, depth + 1)
            }
            TypeDescriptor::Opaque(name) => Err(MockError::UnsupportedSchema(name.clone())),
        }
    }

    fn resolve_each(
        &self,
        args: &[TypeDescriptor],
        rng: &mut dyn RngCore,
        depth: usize,
    ) -> Result<Vec<Value>, MockError> {
        args.iter()
            .map(|arg| self.resolve_at(arg, rng, depth + 1))
            .collect()
    }

    /// Resolve a record: its own declared example first, then field by field.
    pub fn resolve_record(
        &self,
        record: &RecordSchema,
        rng: &mut dyn RngCore,
    ) -> Result<Value, MockError> {
        self.resolve_record_at(record, rng, 0)
    }

    fn resolve_record_at(
        &self,
        record: &RecordSchema,
        rng: &mut dyn RngCore,
        depth: usize,
    ) -> Result<Value, MockError> {
        match &record.example {
            Some(DeclaredExample::Single(example)) => return Ok(example.clone()),
            Some(DeclaredExample::Choices(examples)) => {
                if let Some(example) = examples.choose(rng) {
                    return Ok(example.clone());
                }
            }
            None => {}
        }

        let mut object = Map::new();
        for field in &record.fields {
            let value = self.resolve_field(field, rng, depth).map_err(|e| {
                tracing::debug!(
                    record = %record.name,
                    field = %field.name,
                    error = %e,
                    "field resolution failed"
                );
                e
            })?;
            object.insert(field.name.clone(), value);
        }
        Ok(Value::Object(object))
    }

    fn resolve_field(
        &self,
        field: &FieldSchema,
        rng: &mut dyn RngCore,
        depth: usize,
    ) -> Result<Value, MockError> {
        if let Some(example) = &field.example {
            return Ok(example.clone());
        }
        if let Some(example) = field.examples.choose(rng) {
            return Ok(example.clone());
        }
        if let Some(default) = field.default.get().filter(|d| !d.is_null()) {
            return Ok(default);
        }
        match &field.ty {
            Some(ty) => self.resolve_at(ty, rng, depth + 1),
            None => Ok(Value::Null),
        }
    }
}

/// JSON object keys are strings; scalars render to their JSON text.
fn object_key(key: Value) -> Result<String, MockError> {
    match key {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok("null".to_string()),
        other => Err(MockError::UnsupportedSchema(format!(
            "mapping key must be a scalar, got {}",
            other
        ))),
    }
}

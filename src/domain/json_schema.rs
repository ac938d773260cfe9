//! JSON Schema import.
//!
//! Converts JSON Schema / OpenAPI schema objects into [`TypeDescriptor`]s so
//! routes configured from files, and Rust types deriving
//! [`schemars::JsonSchema`], can be resolved into examples.
//!
//! ## Mapping
//!
//! | JSON Schema                              | Descriptor                    |
//! |------------------------------------------|-------------------------------|
//! | `type: string` + `format: email`         | `Named("email")` over `Str`   |
//! | `type: [string, null]`, `anyOf`, `oneOf` | `Union`                       |
//! | `enum`, `const`                          | `Enum`                        |
//! | `items` / `prefixItems` / `uniqueItems`  | `List` / `Tuple` / `Set`      |
//! | `properties`                             | `Record`                      |
//! | `additionalProperties: {..}`             | `Map(Str, ..)`                |
//! | `$ref`                                   | the referenced definition     |
//!
//! A `$ref` cycle resolves to `Null` at the point where it closes.

use schemars::JsonSchema;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use super::{
    DeclaredExample, EnumSchema, FieldDefault, FieldSchema, MockError, RecordSchema,
    TypeDescriptor,
};

/// Build a descriptor from any type deriving `schemars::JsonSchema`.
pub fn describe_json_schema<T: JsonSchema>() -> Result<TypeDescriptor, MockError> {
    let root = schemars::schema_for!(T);
    let value = serde_json::to_value(&root)?;
    TypeDescriptor::from_json_schema(&value)
}

impl TypeDescriptor {
    pub fn from_json_schema(schema: &Value) -> Result<Self, MockError> {
        SchemaConverter::new(schema).convert(schema, None)
    }
}

struct SchemaConverter<'a> {
    root: &'a Value,
    resolving: Vec<String>,
    definitions: HashMap<String, TypeDescriptor>,
}

impl<'a> SchemaConverter<'a> {
    fn new(root: &'a Value) -> Self {
        Self {
            root,
            resolving: Vec::new(),
            definitions: HashMap::new(),
        }
    }

    fn convert(
        &mut self,
        schema: &Value,
        name_hint: Option<&str>,
    ) -> Result<TypeDescriptor, MockError> {
        let obj = match schema {
            Value::Object(obj) => obj,
            Value::Bool(true) => return Ok(TypeDescriptor::Opaque("any".to_string())),
            Value::Bool(false) => return Ok(TypeDescriptor::Opaque("never".to_string())),
            other => {
                return Err(MockError::InvalidSchema(format!(
                    "expected a schema object, found {}",
                    other
                )))
            }
        };

        let descriptor = self.convert_object(obj, name_hint)?;
        if obj.get("nullable").and_then(Value::as_bool) == Some(true) {
            return Ok(TypeDescriptor::optional(descriptor));
        }
        Ok(descriptor)
    }

    fn convert_object(
        &mut self,
        obj: &Map<String, Value>,
        name_hint: Option<&str>,
    ) -> Result<TypeDescriptor, MockError> {
        let title = obj.get("title").and_then(Value::as_str).or(name_hint);

        if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
            return self.resolve_ref(reference);
        }

        if let Some(constant) = obj.get("const") {
            return Ok(EnumSchema::new(title.unwrap_or("const"), [constant.clone()]).into());
        }

        if let Some(members) = obj.get("enum").and_then(Value::as_array) {
            return Ok(EnumSchema::new(title.unwrap_or("enum"), members.iter().cloned()).into());
        }

        for keyword in ["anyOf", "oneOf"] {
            if let Some(alternatives) = obj.get(keyword).and_then(Value::as_array) {
                let alternatives = alternatives
                    .iter()
                    .map(|alt| self.convert(alt, None))
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(TypeDescriptor::Union(alternatives));
            }
        }

        if let Some(parts) = obj.get("allOf").and_then(Value::as_array) {
            return self.convert_all_of(parts, title);
        }

        match obj.get("type") {
            Some(Value::String(ty)) => self.convert_typed(ty, obj, title),
            Some(Value::Array(types)) => {
                let alternatives = types
                    .iter()
                    .map(|ty| match ty.as_str() {
                        Some(ty) => self.convert_typed(ty, obj, title),
                        None => Err(MockError::InvalidSchema(format!("invalid type entry {}", ty))),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(TypeDescriptor::Union(alternatives))
            }
            Some(other) => Err(MockError::InvalidSchema(format!("invalid type {}", other))),
            None if obj.contains_key("properties") => self.convert_typed("object", obj, title),
            None if obj.contains_key("items") || obj.contains_key("prefixItems") => {
                self.convert_typed("array", obj, title)
            }
            None => Ok(TypeDescriptor::Opaque("any".to_string())),
        }
    }

    fn convert_typed(
        &mut self,
        ty: &str,
        obj: &Map<String, Value>,
        title: Option<&str>,
    ) -> Result<TypeDescriptor, MockError> {
        let descriptor = match ty {
            "null" => TypeDescriptor::Null,
            "boolean" => TypeDescriptor::bool(),
            "integer" => TypeDescriptor::int(),
            "number" => TypeDescriptor::float(),
            "string" => match obj.get("format").and_then(Value::as_str) {
                Some(format) => TypeDescriptor::refined(format, TypeDescriptor::str()),
                None => TypeDescriptor::str(),
            },
            "array" => self.convert_array(obj)?,
            "object" => self.convert_record_or_map(obj, title)?,
            other => TypeDescriptor::Opaque(other.to_string()),
        };
        Ok(descriptor)
    }

    fn convert_array(&mut self, obj: &Map<String, Value>) -> Result<TypeDescriptor, MockError> {
        // draft 2020-12 tuples, then the older array form of `items`
        let positional = obj
            .get("prefixItems")
            .and_then(Value::as_array)
            .or_else(|| obj.get("items").and_then(Value::as_array));
        if let Some(positional) = positional {
            let items = positional
                .iter()
                .map(|item| self.convert(item, None))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(TypeDescriptor::Tuple(items));
        }

        let items = match obj.get("items") {
            Some(item) => vec![self.convert(item, None)?],
            None => Vec::new(),
        };
        if obj.get("uniqueItems").and_then(Value::as_bool) == Some(true) {
            Ok(TypeDescriptor::Set(items))
        } else {
            Ok(TypeDescriptor::List(items))
        }
    }

    fn convert_record_or_map(
        &mut self,
        obj: &Map<String, Value>,
        title: Option<&str>,
    ) -> Result<TypeDescriptor, MockError> {
        if !obj.contains_key("properties") {
            if let Some(values @ Value::Object(_)) = obj.get("additionalProperties") {
                let value = self.convert(values, None)?;
                return Ok(TypeDescriptor::map(TypeDescriptor::str(), value));
            }
        }
        Ok(TypeDescriptor::Record(Arc::new(self.convert_record(obj, title)?)))
    }

    fn convert_record(
        &mut self,
        obj: &Map<String, Value>,
        title: Option<&str>,
    ) -> Result<RecordSchema, MockError> {
        let mut record = RecordSchema::new(title.unwrap_or("Model"));
        record.example = declared_example(obj);

        if let Some(properties) = obj.get("properties").and_then(Value::as_object) {
            for (name, property) in properties {
                let ty = self.convert(property, None)?;
                let mut field = FieldSchema::new(name.clone(), ty);
                if let Some(meta) = property.as_object() {
                    field.example = meta.get("example").cloned();
                    field.examples = meta
                        .get("examples")
                        .and_then(Value::as_array)
                        .cloned()
                        .unwrap_or_default();
                    if let Some(default) = meta.get("default") {
                        field.default = FieldDefault::Value(default.clone());
                    }
                }
                record.fields.push(field);
            }
        }
        Ok(record)
    }

    fn convert_all_of(
        &mut self,
        parts: &[Value],
        title: Option<&str>,
    ) -> Result<TypeDescriptor, MockError> {
        if let [single] = parts {
            return self.convert(single, title);
        }

        let mut merged = RecordSchema::new(title.unwrap_or("Model"));
        for part in parts {
            match self.convert(part, None)? {
                TypeDescriptor::Record(record) => {
                    if merged.example.is_none() {
                        merged.example = record.example.clone();
                    }
                    merged.fields.extend(record.fields.iter().cloned());
                }
                other => {
                    return Ok(TypeDescriptor::Opaque(format!(
                        "allOf with non-object part {}",
                        other.type_name()
                    )))
                }
            }
        }
        Ok(merged.into())
    }

    fn resolve_ref(&mut self, reference: &str) -> Result<TypeDescriptor, MockError> {
        if let Some(known) = self.definitions.get(reference) {
            return Ok(known.clone());
        }
        if self.resolving.iter().any(|r| r == reference) {
            tracing::debug!(reference, "cyclic schema reference resolved to null");
            return Ok(TypeDescriptor::Null);
        }

        let pointer = reference.strip_prefix('#').ok_or_else(|| {
            MockError::InvalidSchema(format!(
                "only local references are supported: {}",
                reference
            ))
        })?;
        let root = self.root;
        let target = root
            .pointer(pointer)
            .ok_or_else(|| {
                MockError::InvalidSchema(format!("unresolved reference {}", reference))
            })?;
        let name = reference.rsplit('/').next().filter(|n| !n.is_empty());

        self.resolving.push(reference.to_string());
        let converted = self.convert(target, name);
        self.resolving.pop();

        let converted = converted?;
        self.definitions.insert(reference.to_string(), converted.clone());
        Ok(converted)
    }
}

fn declared_example(obj: &Map<String, Value>) -> Option<DeclaredExample> {
    if let Some(example) = obj.get("example") {
        return Some(DeclaredExample::Single(example.clone()));
    }
    match obj.get("examples").and_then(Value::as_array) {
        Some(examples) if !examples.is_empty() => Some(DeclaredExample::Choices(examples.clone())),
        _ => None,
    }
}

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub mod error;
pub mod json_schema;

pub use error::{MockError, RegistrationError};
pub use json_schema::describe_json_schema;

/// Primitive scalar kinds understood by the default providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Bool,
    Int,
    Float,
    Str,
}

/// Structural description of an expected value's shape.
///
/// Descriptors are immutable and cheap to clone: records are shared behind
/// an `Arc` so a schema referenced from many places is built once.
#[derive(Debug, Clone)]
pub enum TypeDescriptor {
    Null,
    Scalar(ScalarType),
    /// A custom type token, optionally refining a base shape
    /// (`email` refining `Str`, `date-time` refining `Str`...).
    Named {
        name: String,
        base: Option<Box<TypeDescriptor>>,
    },
    Enum(EnumSchema),
    List(Vec<TypeDescriptor>),
    Tuple(Vec<TypeDescriptor>),
    Set(Vec<TypeDescriptor>),
    Map(Box<TypeDescriptor>, Box<TypeDescriptor>),
    Union(Vec<TypeDescriptor>),
    Record(Arc<RecordSchema>),
    /// A shape that can be described but not synthesized.
    Opaque(String),
}

impl TypeDescriptor {
    pub fn bool() -> Self {
        Self::Scalar(ScalarType::Bool)
    }

    pub fn int() -> Self {
        Self::Scalar(ScalarType::Int)
    }

    pub fn float() -> Self {
        Self::Scalar(ScalarType::Float)
    }

    pub fn str() -> Self {
        Self::Scalar(ScalarType::Str)
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named {
            name: name.into(),
            base: None,
        }
    }

    pub fn refined(name: impl Into<String>, base: TypeDescriptor) -> Self {
        Self::Named {
            name: name.into(),
            base: Some(Box::new(base)),
        }
    }

    pub fn list(item: TypeDescriptor) -> Self {
        Self::List(vec![item])
    }

    pub fn set(item: TypeDescriptor) -> Self {
        Self::Set(vec![item])
    }

    pub fn map(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    /// `T | None`
    pub fn optional(inner: TypeDescriptor) -> Self {
        Self::Union(vec![inner, Self::Null])
    }

    pub fn of<T: Describe>() -> Self {
        T::describe()
    }

    /// Whether this descriptor is a subtype of a registry key.
    ///
    /// Records and `Null` never match: records are resolved field by field
    /// and null is a builtin case.
    pub fn is_subtype_of(&self, key: &TypeKey) -> bool {
        match self {
            Self::Scalar(scalar) => TypeKey::from(*scalar) == *key,
            Self::Enum(schema) => match key {
                TypeKey::Enum => true,
                TypeKey::Named(name) => *name == schema.name,
                _ => false,
            },
            Self::Named { name, base } => {
                matches!(key, TypeKey::Named(n) if n == name)
                    || base.as_deref().is_some_and(|b| b.is_subtype_of(key))
            }
            _ => false,
        }
    }

    /// Short human-readable rendering used in errors and logs.
    pub fn type_name(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Scalar(scalar) => TypeKey::from(*scalar).to_string(),
            Self::Named { name, .. } => name.clone(),
            Self::Enum(schema) => format!("enum {}", schema.name),
            Self::List(args) => format!("list[{}]", join_names(args)),
            Self::Tuple(args) => format!("tuple[{}]", join_names(args)),
            Self::Set(args) => format!("set[{}]", join_names(args)),
            Self::Map(key, value) => format!("dict[{}, {}]", key.type_name(), value.type_name()),
            Self::Union(args) => args
                .iter()
                .map(TypeDescriptor::type_name)
                .collect::<Vec<_>>()
                .join(" | "),
            Self::Record(record) => record.name.clone(),
            Self::Opaque(name) => name.clone(),
        }
    }

    /// JSON summary handed to single-argument script providers.
    pub fn summary(&self) -> Value {
        match self {
            Self::Enum(schema) => json!({
                "kind": "enum",
                "name": schema.name,
                "members": schema.members,
            }),
            Self::Named { name, base } => json!({
                "kind": "named",
                "name": name,
                "base": base.as_deref().map(TypeDescriptor::type_name),
            }),
            other => json!({ "kind": other.kind(), "name": other.type_name() }),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Scalar(_) => "scalar",
            Self::Named { .. } => "named",
            Self::Enum(_) => "enum",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Set(_) => "set",
            Self::Map(..) => "map",
            Self::Union(_) => "union",
            Self::Record(_) => "record",
            Self::Opaque(_) => "opaque",
        }
    }
}

fn join_names(args: &[TypeDescriptor]) -> String {
    args.iter()
        .map(TypeDescriptor::type_name)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<RecordSchema> for TypeDescriptor {
    fn from(record: RecordSchema) -> Self {
        Self::Record(Arc::new(record))
    }
}

impl From<EnumSchema> for TypeDescriptor {
    fn from(schema: EnumSchema) -> Self {
        Self::Enum(schema)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumSchema {
    pub name: String,
    pub members: Vec<Value>,
}

impl EnumSchema {
    pub fn new<I, V>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            name: name.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }
}

/// Example declared on a record as a whole.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclaredExample {
    Single(Value),
    Choices(Vec<Value>),
}

/// A structured record: named, typed fields plus optional declared examples.
#[derive(Debug, Clone)]
pub struct RecordSchema {
    pub name: String,
    pub example: Option<DeclaredExample>,
    pub fields: Vec<FieldSchema>,
}

impl RecordSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            example: None,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    pub fn example(mut self, example: impl Into<Value>) -> Self {
        self.example = Some(DeclaredExample::Single(example.into()));
        self
    }

    pub fn examples<I, V>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.example = Some(DeclaredExample::Choices(
            examples.into_iter().map(Into::into).collect(),
        ));
        self
    }
}

pub type DefaultFactory = Arc<dyn Fn() -> Value + Send + Sync>;

/// A field's default. `NoDefault` is distinct from an explicit null default.
#[derive(Clone, Default)]
pub enum FieldDefault {
    #[default]
    NoDefault,
    Value(Value),
    Factory(DefaultFactory),
}

impl FieldDefault {
    /// The default value, calling the factory if there is one.
    pub fn get(&self) -> Option<Value> {
        match self {
            Self::NoDefault => None,
            Self::Value(value) => Some(value.clone()),
            Self::Factory(factory) => Some(factory()),
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDefault => f.write_str("NoDefault"),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldSchema {
    pub name: String,
    /// `None` resolves to null.
    pub ty: Option<TypeDescriptor>,
    pub example: Option<Value>,
    pub examples: Vec<Value>,
    pub default: FieldDefault,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty),
            example: None,
            examples: Vec::new(),
            default: FieldDefault::NoDefault,
        }
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: None,
            example: None,
            examples: Vec::new(),
            default: FieldDefault::NoDefault,
        }
    }

    pub fn example(mut self, example: impl Into<Value>) -> Self {
        self.example = Some(example.into());
        self
    }

    pub fn examples<I, V>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.examples = examples.into_iter().map(Into::into).collect();
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = FieldDefault::Value(value.into());
        self
    }

    pub fn default_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = FieldDefault::Factory(Arc::new(factory));
        self
    }
}

/// Registry key for example providers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Null,
    Bool,
    Int,
    Float,
    Str,
    Enum,
    Record,
    Named(String),
}

impl From<ScalarType> for TypeKey {
    fn from(scalar: ScalarType) -> Self {
        match scalar {
            ScalarType::Bool => Self::Bool,
            ScalarType::Int => Self::Int,
            ScalarType::Float => Self::Float,
            ScalarType::Str => Self::Str,
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool => f.write_str("bool"),
            Self::Int => f.write_str("int"),
            Self::Float => f.write_str("float"),
            Self::Str => f.write_str("str"),
            Self::Enum => f.write_str("enum"),
            Self::Record => f.write_str("record"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

impl FromStr for TypeKey {
    type Err = RegistrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = match s.to_ascii_lowercase().as_str() {
            "null" | "none" => Self::Null,
            "bool" | "boolean" => Self::Bool,
            "int" | "integer" => Self::Int,
            "float" | "number" => Self::Float,
            "str" | "string" => Self::Str,
            "enum" => Self::Enum,
            "record" | "object" | "model" => Self::Record,
            _ => Self::Named(s.to_string()),
        };
        key.validate()?;
        Ok(key)
    }
}

impl TypeKey {
    /// Named keys must be a single non-empty token, not container syntax.
    pub fn validate(&self) -> Result<(), RegistrationError> {
        match self {
            Self::Named(name) => {
                let is_token = !name.is_empty()
                    && name
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
                if is_token {
                    Ok(())
                } else {
                    Err(RegistrationError::NotAType(name.clone()))
                }
            }
            _ => Ok(()),
        }
    }
}

/// Schema-description interface for Rust types.
///
/// Implemented for primitives and std containers; record types implement it
/// with [`RecordSchema`].
pub trait Describe {
    fn describe() -> TypeDescriptor;
}

macro_rules! describe_scalar {
    ($scalar:expr => $($ty:ty),+) => {
        $(impl Describe for $ty {
            fn describe() -> TypeDescriptor {
                TypeDescriptor::Scalar($scalar)
            }
        })+
    };
}

describe_scalar!(ScalarType::Bool => bool);
describe_scalar!(ScalarType::Int => i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
describe_scalar!(ScalarType::Float => f32, f64);
describe_scalar!(ScalarType::Str => String, &str, char);

impl Describe for () {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::Null
    }
}

impl<T: Describe> Describe for Option<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::optional(T::describe())
    }
}

impl<T: Describe> Describe for Vec<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::list(T::describe())
    }
}

impl<T: Describe> Describe for HashSet<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::set(T::describe())
    }
}

impl<T: Describe> Describe for BTreeSet<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::set(T::describe())
    }
}

impl<K: Describe, V: Describe> Describe for HashMap<K, V> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::map(K::describe(), V::describe())
    }
}

impl<K: Describe, V: Describe> Describe for BTreeMap<K, V> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::map(K::describe(), V::describe())
    }
}

impl<T: Describe> Describe for Box<T> {
    fn describe() -> TypeDescriptor {
        T::describe()
    }
}

impl<T: Describe> Describe for Arc<T> {
    fn describe() -> TypeDescriptor {
        T::describe()
    }
}

macro_rules! describe_tuple {
    ($($name:ident),+) => {
        impl<$($name: Describe),+> Describe for ($($name,)+) {
            fn describe() -> TypeDescriptor {
                TypeDescriptor::Tuple(vec![$($name::describe()),+])
            }
        }
    };
}

describe_tuple!(A);
describe_tuple!(A, B);
describe_tuple!(A, B, C);
describe_tuple!(A, B, C, D);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_key_parsing() {
        assert_eq!("str".parse::<TypeKey>().unwrap(), TypeKey::Str);
        assert_eq!("Integer".parse::<TypeKey>().unwrap(), TypeKey::Int);
        assert_eq!("none".parse::<TypeKey>().unwrap(), TypeKey::Null);
        assert_eq!("object".parse::<TypeKey>().unwrap(), TypeKey::Record);
        assert_eq!(
            "date-time".parse::<TypeKey>().unwrap(),
            TypeKey::Named("date-time".to_string())
        );
        assert!(matches!(
            "list[int]".parse::<TypeKey>(),
            Err(RegistrationError::NotAType(_))
        ));
        assert!(matches!("".parse::<TypeKey>(), Err(RegistrationError::NotAType(_))));
    }

    #[test]
    fn test_subtype_relation() {
        let email = TypeDescriptor::refined("email", TypeDescriptor::str());
        assert!(email.is_subtype_of(&TypeKey::Named("email".to_string())));
        assert!(email.is_subtype_of(&TypeKey::Str));
        assert!(!email.is_subtype_of(&TypeKey::Int));

        let color = TypeDescriptor::from(EnumSchema::new("Color", ["red", "green"]));
        assert!(color.is_subtype_of(&TypeKey::Enum));
        assert!(color.is_subtype_of(&TypeKey::Named("Color".to_string())));

        assert!(!TypeDescriptor::bool().is_subtype_of(&TypeKey::Int));
        assert!(!TypeDescriptor::Null.is_subtype_of(&TypeKey::Null));

        let record = TypeDescriptor::from(RecordSchema::new("User"));
        assert!(!record.is_subtype_of(&TypeKey::Record));
    }

    #[test]
    fn test_describe_std_types() {
        let ty = TypeDescriptor::of::<HashMap<String, Vec<Option<i32>>>>();
        assert_eq!(ty.type_name(), "dict[str, list[int | null]]");

        let ty = TypeDescriptor::of::<(bool, f64, String)>();
        assert_eq!(ty.type_name(), "tuple[bool, float, str]");
    }

    #[test]
    fn test_field_default_factory_is_called() {
        let field = FieldSchema::new("tags", TypeDescriptor::list(TypeDescriptor::str()))
            .default_factory(|| json!(["a", "b"]));
        assert_eq!(field.default.get(), Some(json!(["a", "b"])));
        assert_eq!(FieldDefault::NoDefault.get(), None);
    }
}

use super::example_provider::{ExampleProvider, Generator};
use crate::domain::{EnumSchema, MockError, RegistrationError, TypeDescriptor, TypeKey};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;

fn rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

#[test]
fn test_default_scalars() {
    let provider = ExampleProvider::default();
    let mut rng = rng();

    let value = provider.resolve(&TypeDescriptor::int(), &mut rng).unwrap();
    let n = value.as_i64().unwrap();
    assert!((0..100).contains(&n));

    let value = provider.resolve(&TypeDescriptor::float(), &mut rng).unwrap();
    let f = value.as_f64().unwrap();
    assert!((0.0..100.0).contains(&f));

    let value = provider.resolve(&TypeDescriptor::bool(), &mut rng).unwrap();
    assert!(value.is_boolean());

    let value = provider.resolve(&TypeDescriptor::str(), &mut rng).unwrap();
    assert!([
        "Hello, World ❤️",
        "Nihil verum omnia licet",
        "Lorem ipsum dolor sit amet"
    ]
    .contains(&value.as_str().unwrap()));
}

#[test]
fn test_bool_is_not_an_int() {
    let provider =
        ExampleProvider::with_providers([(TypeKey::Int, Generator::constant(7))]).unwrap();
    let value = provider.resolve(&TypeDescriptor::bool(), &mut rng()).unwrap();
    assert!(value.is_boolean());
}

#[test]
fn test_enum_picks_a_member() {
    let provider = ExampleProvider::default();
    let color = TypeDescriptor::from(EnumSchema::new("Color", ["red", "green", "blue"]));
    let mut rng = rng();
    for _ in 0..20 {
        let value = provider.resolve(&color, &mut rng).unwrap();
        assert!(["red", "green", "blue"].contains(&value.as_str().unwrap()));
    }
}

#[test]
fn test_empty_enum_is_unsupported() {
    let provider = ExampleProvider::default();
    let empty = TypeDescriptor::from(EnumSchema::new("Nothing", Vec::<String>::new()));
    let err = provider.resolve(&empty, &mut rng()).unwrap_err();
    assert!(err.is_unsupported());
}

#[test]
fn test_named_enum_provider_beats_generic_enum() {
    let provider = ExampleProvider::with_providers([(
        "Color".parse::<TypeKey>().unwrap(),
        Generator::constant("always-red"),
    )])
    .unwrap();
    let color = TypeDescriptor::from(EnumSchema::new("Color", ["red", "green"]));
    assert_eq!(provider.resolve(&color, &mut rng()).unwrap(), json!("always-red"));
}

#[test]
fn test_caller_override_wins() {
    let provider = ExampleProvider::with_providers([
        (TypeKey::Str, Generator::constant("fixed")),
        (TypeKey::Int, Generator::from_fn(|_| json!(-1))),
    ])
    .unwrap();

    let mut rng = rng();
    assert_eq!(provider.resolve(&TypeDescriptor::str(), &mut rng).unwrap(), json!("fixed"));
    assert_eq!(provider.resolve(&TypeDescriptor::int(), &mut rng).unwrap(), json!(-1));
    assert!(provider.resolve(&TypeDescriptor::float(), &mut rng).unwrap().is_number());
}

#[test]
fn test_registration_order_decides_first_match() {
    // `email` refines str, so both entries match; the first registered wins.
    let email = TypeDescriptor::refined("email", TypeDescriptor::str());

    let provider = ExampleProvider::with_providers([
        ("email".parse().unwrap(), Generator::constant("a@example.com")),
        (TypeKey::Str, Generator::constant("plain")),
    ])
    .unwrap();
    assert_eq!(provider.resolve(&email, &mut rng()).unwrap(), json!("a@example.com"));

    let provider = ExampleProvider::with_providers([
        (TypeKey::Str, Generator::constant("plain")),
        ("email".parse().unwrap(), Generator::constant("a@example.com")),
    ])
    .unwrap();
    assert_eq!(provider.resolve(&email, &mut rng()).unwrap(), json!("plain"));
}

#[test]
fn test_register_replaces_in_place() {
    let mut provider = ExampleProvider::default();
    let before: Vec<String> = provider.keys().map(ToString::to_string).collect();

    provider.register(TypeKey::Int, Generator::constant(5)).unwrap();

    let after: Vec<String> = provider.keys().map(ToString::to_string).collect();
    assert_eq!(before, after);
    assert_eq!(provider.resolve(&TypeDescriptor::int(), &mut rng()).unwrap(), json!(5));
}

#[test]
fn test_typed_generator_receives_descriptor() {
    let provider = ExampleProvider::with_providers([(
        "slug".parse().unwrap(),
        Generator::typed(|ty, _| Ok(json!(format!("{}-1", ty.type_name())))),
    )])
    .unwrap();
    let value = provider.resolve(&TypeDescriptor::named("slug"), &mut rng()).unwrap();
    assert_eq!(value, json!("slug-1"));
}

#[test]
fn test_rejects_null_and_record_keys() {
    let err =
        ExampleProvider::with_providers([(TypeKey::Null, Generator::constant(1))]).unwrap_err();
    assert!(matches!(err, RegistrationError::NullType));

    let mut provider = ExampleProvider::empty();
    let err = provider.register(TypeKey::Record, Generator::constant(1)).unwrap_err();
    assert!(matches!(err, RegistrationError::RecordType));
}

#[test]
fn test_invalid_type_token() {
    assert!(matches!(
        "not a type!".parse::<TypeKey>(),
        Err(RegistrationError::NotAType(_))
    ));
    assert!("".parse::<TypeKey>().is_err());
}

#[test]
fn test_unknown_named_type_is_unsupported() {
    let provider = ExampleProvider::default();
    let err = provider
        .resolve(&TypeDescriptor::named("Decimal"), &mut rng())
        .unwrap_err();
    assert!(matches!(err, MockError::UnsupportedSchema(name) if name == "Decimal"));
}

#[test]
fn test_empty_registry_supports_nothing() {
    let provider = ExampleProvider::empty();
    assert!(provider.resolve(&TypeDescriptor::int(), &mut rng()).is_err());
}

#[test]
fn test_register_rejects_non_token_names() {
    let mut provider = ExampleProvider::empty();

    let err = provider
        .register(TypeKey::Named("list[int]".to_string()), Generator::constant(1))
        .unwrap_err();
    assert!(matches!(err, RegistrationError::NotAType(name) if name == "list[int]"));

    let err = provider
        .register(TypeKey::Named(String::new()), Generator::constant(1))
        .unwrap_err();
    assert!(matches!(err, RegistrationError::NotAType(_)));

    assert_eq!(provider.keys().count(), 0);
    assert!(provider
        .register(TypeKey::Named("date-time".to_string()), Generator::constant("now"))
        .is_ok());
}

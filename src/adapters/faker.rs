use chrono::{Duration, Utc};
use fake::faker::address::en::{CityName, CountryName, PostCode, StateAbbr, StreetName};
use fake::faker::internet::en::{SafeEmail, Username};
use fake::faker::lorem::en::{Paragraph, Sentence, Word};
use fake::faker::name::en::{FirstName, LastName, Name};
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::adapters::example_provider::Generator;

/// Realistic fake data kinds usable as example providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FakerKind {
    // Personal
    FirstName,
    LastName,
    FullName,
    Username,

    // Contact
    Email,
    Phone,

    // Address
    StreetAddress,
    City,
    State,
    Country,
    PostalCode,

    // Text
    Word,
    Sentence,
    Paragraph,
    Lorem,

    // Identifiers and time
    Uuid,
    DateTime,
}

impl FakerKind {
    pub fn generate(self, rng: &mut dyn RngCore) -> Value {
        match self {
            Self::FirstName => json!(FirstName().fake_with_rng::<String, _>(rng)),
            Self::LastName => json!(LastName().fake_with_rng::<String, _>(rng)),
            Self::FullName => json!(Name().fake_with_rng::<String, _>(rng)),
            Self::Username => json!(Username().fake_with_rng::<String, _>(rng)),

            Self::Email => json!(SafeEmail().fake_with_rng::<String, _>(rng)),
            Self::Phone => json!(PhoneNumber().fake_with_rng::<String, _>(rng)),

            Self::StreetAddress => json!(StreetName().fake_with_rng::<String, _>(rng)),
            Self::City => json!(CityName().fake_with_rng::<String, _>(rng)),
            Self::State => json!(StateAbbr().fake_with_rng::<String, _>(rng)),
            Self::Country => json!(CountryName().fake_with_rng::<String, _>(rng)),
            Self::PostalCode => json!(PostCode().fake_with_rng::<String, _>(rng)),

            Self::Word => json!(Word().fake_with_rng::<String, _>(rng)),
            Self::Sentence => json!(Sentence(1..10).fake_with_rng::<String, _>(rng)),
            Self::Paragraph => json!(Paragraph(1..3).fake_with_rng::<String, _>(rng)),
            Self::Lorem => json!(Sentence(1..5).fake_with_rng::<String, _>(rng)),

            Self::Uuid => {
                let bytes: [u8; 16] = rng.gen();
                json!(uuid::Builder::from_random_bytes(bytes).into_uuid().to_string())
            }
            Self::DateTime => {
                // somewhere in the past year
                let offset = Duration::seconds(rng.gen_range(0..365 * 24 * 3600));
                json!((Utc::now() - offset).to_rfc3339())
            }
        }
    }
}

impl From<FakerKind> for Generator {
    fn from(kind: FakerKind) -> Self {
        Generator::from_fn(move |rng| kind.generate(rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_every_kind_produces_a_string() {
        let mut rng = StdRng::seed_from_u64(7);
        for kind in [
            FakerKind::FirstName,
            FakerKind::FullName,
            FakerKind::Email,
            FakerKind::City,
            FakerKind::Sentence,
            FakerKind::Uuid,
            FakerKind::DateTime,
        ] {
            let value = kind.generate(&mut rng);
            assert!(value.as_str().is_some_and(|s| !s.is_empty()), "{:?} -> {}", kind, value);
        }
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = FakerKind::Email.generate(&mut StdRng::seed_from_u64(42));
        let b = FakerKind::Email.generate(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_uuid_format() {
        let value = FakerKind::Uuid.generate(&mut StdRng::seed_from_u64(1));
        assert!(uuid::Uuid::parse_str(value.as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_kind_names_deserialize() {
        let kind: FakerKind = serde_json::from_value(json!("street_address")).unwrap();
        assert_eq!(kind, FakerKind::StreetAddress);
    }
}

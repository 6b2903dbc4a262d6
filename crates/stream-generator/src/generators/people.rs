//! Person, address and company strategies backed by `fake`.

use fake::faker::address::en::{
    BuildingNumber, CityName, CountryName, StateAbbr, StateName, StreetName, ZipCode,
};
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::{FirstName, LastName, Name};
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rand::RngCore;
use serde_json::Value;
use stream_schema::Constraints;

pub fn full_name(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    Value::String(Name().fake_with_rng(rng))
}

pub fn first_name(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    Value::String(FirstName().fake_with_rng(rng))
}

pub fn last_name(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    Value::String(LastName().fake_with_rng(rng))
}

pub fn email(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    Value::String(SafeEmail().fake_with_rng(rng))
}

pub fn phone_number(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    Value::String(PhoneNumber().fake_with_rng(rng))
}

/// `"<number> <street>, <city>, <ST> <zip>"`
pub fn address(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    let street = street_line(rng);
    let city: String = CityName().fake_with_rng(rng);
    let state: String = StateAbbr().fake_with_rng(rng);
    let zip: String = ZipCode().fake_with_rng(rng);
    Value::String(format!("{street}, {city}, {state} {zip}"))
}

pub fn street(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    Value::String(street_line(rng))
}

pub fn city(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    Value::String(CityName().fake_with_rng(rng))
}

pub fn state(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    Value::String(StateName().fake_with_rng(rng))
}

pub fn zip_code(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    Value::String(ZipCode().fake_with_rng(rng))
}

pub fn country(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    Value::String(CountryName().fake_with_rng(rng))
}

pub fn company(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    Value::String(CompanyName().fake_with_rng(rng))
}

fn street_line(rng: &mut dyn RngCore) -> String {
    let number: String = BuildingNumber().fake_with_rng(rng);
    let name: String = StreetName().fake_with_rng(rng);
    format!("{number} {name}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_email_shape() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            let value = email(&mut rng, &Constraints::default());
            let email = value.as_str().unwrap();
            let (local, domain) = email.split_once('@').expect("email must contain @");
            assert!(!local.is_empty());
            assert!(domain.contains('.'));
        }
    }

    #[test]
    fn test_address_contains_street_and_city() {
        let mut rng = StdRng::seed_from_u64(1);
        let value = address(&mut rng, &Constraints::default());
        let parts: Vec<&str> = value.as_str().unwrap().split(", ").collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[0].chars().next().unwrap().is_ascii_digit());
    }

    #[test]
    fn test_names_are_deterministic_for_seed() {
        let mut rng1 = StdRng::seed_from_u64(99);
        let mut rng2 = StdRng::seed_from_u64(99);
        assert_eq!(
            full_name(&mut rng1, &Constraints::default()),
            full_name(&mut rng2, &Constraints::default())
        );
    }
}

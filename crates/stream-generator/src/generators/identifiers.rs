//! Identifier and network-address strategies.

use fake::faker::creditcard::en::CreditCardNumber;
use fake::faker::internet::en::{DomainSuffix, IPv4, IPv6};
use fake::faker::lorem::en::Word;
use fake::Fake;
use rand::{Rng, RngCore};
use serde_json::Value;
use stream_schema::Constraints;
use uuid::Uuid;

/// Random UUID v4 drawn from the provided RNG.
pub fn uuid_v4(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);

    bytes[6] = (bytes[6] & 0x0f) | 0x40; // Version 4
    bytes[8] = (bytes[8] & 0x3f) | 0x80; // Variant RFC 4122

    Value::String(Uuid::from_bytes(bytes).to_string())
}

pub fn ipv4(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    Value::String(IPv4().fake_with_rng(rng))
}

pub fn ipv6(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    Value::String(IPv6().fake_with_rng(rng))
}

pub fn url(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    let host: String = Word().fake_with_rng(rng);
    let suffix: String = DomainSuffix().fake_with_rng(rng);
    let path: String = Word().fake_with_rng(rng);
    Value::String(format!("https://www.{host}.{suffix}/{path}"))
}

/// ISBN-13 with the `978` prefix and a valid check digit.
pub fn isbn13(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    let mut digits = vec![9u8, 7, 8];
    digits.extend((0..9).map(|_| rng.gen_range(0..10u8)));
    digits.push(isbn13_check_digit(&digits));

    Value::String(digits.iter().map(|d| char::from(b'0' + d)).collect())
}

pub fn credit_card(rng: &mut dyn RngCore, _: &Constraints) -> Value {
    Value::String(CreditCardNumber().fake_with_rng(rng))
}

fn isbn13_check_digit(first_twelve: &[u8]) -> u8 {
    let sum: u32 = first_twelve
        .iter()
        .enumerate()
        .map(|(i, &d)| if i % 2 == 0 { d as u32 } else { d as u32 * 3 })
        .sum();
    ((10 - sum % 10) % 10) as u8
}

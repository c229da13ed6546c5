//! Snapshot encoding.
//!
//! Decoding never fails: an absent snapshot is the empty list, and a corrupt
//! one is logged and also treated as empty.

use serde_json::Value;

use capstone_core::Collection;

/// Serialize a collection as JSON text for the local mirror.
///
/// # Errors
///
/// Returns a `serde_json::Error` if serialization fails.
pub fn encode<C: Collection>(collection: &C) -> Result<String, serde_json::Error> {
    serde_json::to_string(collection)
}

/// Serialize a collection as a JSON value for the remote row.
///
/// # Errors
///
/// Returns a `serde_json::Error` if serialization fails.
pub fn to_value<C: Collection>(collection: &C) -> Result<Value, serde_json::Error> {
    serde_json::to_value(collection)
}

/// Decode local mirror text.
#[must_use]
pub fn decode<C: Collection>(raw: Option<&str>) -> C {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return C::default();
    };
    match serde_json::from_str::<C>(raw) {
        Ok(collection) => collection.normalized(),
        Err(e) => {
            tracing::warn!(kind = %C::KIND, error = %e, "corrupt local snapshot; starting empty");
            C::default()
        }
    }
}

/// Decode a remote row's snapshot column.
#[must_use]
pub fn from_value<C: Collection>(value: Value) -> C {
    if value.is_null() {
        return C::default();
    }
    match serde_json::from_value::<C>(value) {
        Ok(collection) => collection.normalized(),
        Err(e) => {
            tracing::warn!(kind = %C::KIND, error = %e, "corrupt remote snapshot; starting empty");
            C::default()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use capstone_core::{Cart, Price, ProductId, Wishlist};
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_absent_and_blank_are_empty() {
        assert!(decode::<Cart>(None).is_empty());
        assert!(decode::<Cart>(Some("  ")).is_empty());
        assert!(from_value::<Wishlist>(Value::Null).is_empty());
    }

    #[test]
    fn test_corrupt_is_empty() {
        assert!(decode::<Cart>(Some("{not json")).is_empty());
        assert!(decode::<Cart>(Some(r#"{"id":"1"}"#)).is_empty());
        assert!(from_value::<Wishlist>(json!("nope")).is_empty());
    }

    #[test]
    fn test_cart_line_round_trip() {
        let raw = r#"[{"id":"1","name":"Classic Black Cap","category":"Lifestyle","price":39.99,"image":"a.jpg","quantity":2}]"#;
        let cart: Cart = decode(Some(raw));
        let encoded = encode(&cart).unwrap();
        let again: Cart = decode(Some(&encoded));

        let line = again.get(&ProductId::new("1")).unwrap();
        assert_eq!(line.quantity, 2);
        assert_eq!(line.product.price, Price::new(Decimal::new(3999, 2)));
        assert_eq!(again, cart);
    }

    #[test]
    fn test_decode_normalizes_duplicates() {
        let value = json!([
            {"id":"1","name":"A","category":"Street","price":10,"image":"a.jpg","quantity":1},
            {"id":"1","name":"A","category":"Street","price":10,"image":"a.jpg","quantity":2}
        ]);
        let cart: Cart = from_value(value);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.count(), 3);
    }
}

//! Deserializers for the scalar-or-list positions of the IAM policy grammar.

use serde::de::value::{MapAccessDeserializer, SeqAccessDeserializer};
use serde::de::{self, IntoDeserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use super::ConditionMap;

/// Deserialize either a single value or a list of values into a `Vec`
///
/// Errors from the element type are passed through unchanged, so an invalid
/// `Effect` inside a single statement object still reports the bad variant.
pub(crate) fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    deserializer.deserialize_any(OneOrManyVisitor(PhantomData))
}

struct OneOrManyVisitor<T>(PhantomData<T>);

impl<'de, T> Visitor<'de> for OneOrManyVisitor<T>
where
    T: Deserialize<'de>,
{
    type Value = Vec<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a single value or a list of values")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        T::deserialize(value.into_deserializer()).map(|v| vec![v])
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
        T::deserialize(value.into_deserializer()).map(|v| vec![v])
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
        T::deserialize(value.into_deserializer()).map(|v| vec![v])
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        T::deserialize(value.into_deserializer()).map(|v| vec![v])
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        T::deserialize(value.into_deserializer()).map(|v| vec![v])
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        T::deserialize(value.into_deserializer()).map(|v| vec![v])
    }

    fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<Self::Value, A::Error> {
        Vec::<T>::deserialize(SeqAccessDeserializer::new(seq))
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
        T::deserialize(MapAccessDeserializer::new(map)).map(|v| vec![v])
    }
}

/// A condition value; IAM accepts strings, booleans and numbers
struct ScalarValue(String);

impl<'de> Deserialize<'de> for ScalarValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ScalarVisitor;

        impl Visitor<'_> for ScalarVisitor {
            type Value = ScalarValue;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string, boolean or number")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                Ok(ScalarValue(value.to_string()))
            }

            fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
                Ok(ScalarValue(value))
            }

            fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
                Ok(ScalarValue(value.to_string()))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                Ok(ScalarValue(value.to_string()))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                Ok(ScalarValue(value.to_string()))
            }

            fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
                Ok(ScalarValue(value.to_string()))
            }
        }

        deserializer.deserialize_any(ScalarVisitor)
    }
}

#[derive(Deserialize)]
struct ConditionValues(#[serde(deserialize_with = "one_or_many")] Vec<ScalarValue>);

/// Deserialize a `Condition` block into a [`ConditionMap`]
pub(crate) fn condition_map<'de, D>(deserializer: D) -> Result<Option<ConditionMap>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, BTreeMap<String, ConditionValues>>>::deserialize(deserializer)?;

    Ok(raw
        .map(|blocks| {
            blocks
                .into_iter()
                .map(|(operator, keys)| {
                    let keys = keys
                        .into_iter()
                        .map(|(key, values)| (key, values.0.into_iter().map(|v| v.0).collect()))
                        .collect();
                    (operator, keys)
                })
                .collect::<ConditionMap>()
        })
        .filter(|map| !map.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(deserialize_with = "one_or_many")]
        items: Vec<String>,
    }

    #[derive(Deserialize)]
    struct ConditionHolder {
        #[serde(default, deserialize_with = "condition_map")]
        condition: Option<ConditionMap>,
    }

    #[test]
    fn test_one_or_many_accepts_scalar_and_list() {
        let one: Holder = serde_json::from_str(r#"{"items": "s3:GetObject"}"#).unwrap();
        assert_eq!(one.items, vec!["s3:GetObject"]);

        let many: Holder = serde_json::from_str(r#"{"items": ["a", "b"]}"#).unwrap();
        assert_eq!(many.items, vec!["a", "b"]);
    }

    #[test]
    fn test_one_or_many_rejects_wrong_element_type() {
        assert!(serde_json::from_str::<Holder>(r#"{"items": 5}"#).is_err());
        assert!(serde_json::from_str::<Holder>(r#"{"items": [true]}"#).is_err());
    }

    #[test]
    fn test_condition_values_are_stringified() {
        let holder: ConditionHolder = serde_json::from_str(
            r#"{"condition": {"Bool": {"aws:SecureTransport": false}, "NumericLessThan": {"s3:max-keys": [10, 2.5]}}}"#,
        )
        .unwrap();
        let condition = holder.condition.unwrap();
        assert_eq!(condition["Bool"]["aws:SecureTransport"], vec!["false"]);
        assert_eq!(condition["NumericLessThan"]["s3:max-keys"], vec!["10", "2.5"]);
    }

    #[test]
    fn test_empty_condition_block_is_none() {
        let holder: ConditionHolder = serde_json::from_str(r#"{"condition": {}}"#).unwrap();
        assert!(holder.condition.is_none());

        let absent: ConditionHolder = serde_json::from_str("{}").unwrap();
        assert!(absent.condition.is_none());
    }
}

//! Condition coverage
//!
//! Decides whether a granted statement's condition block applies a required
//! condition. The check is deliberately narrow: one comparator and one key per
//! required condition, compared by literal set containment. Numeric, date and
//! IP operators get no special treatment; their values are compared as
//! strings like any other.

use crate::policy::{Condition, ConditionMap};

/// Check whether the `granted` condition block covers the `required` condition
///
/// - No required condition: covered only when the grant has no condition
///   either, since a conditioned grant is narrower than the requirement.
/// - Required condition but no granted block: not covered.
/// - Otherwise every required value must appear in
///   `granted[required.type][required.key]`.
#[must_use]
pub fn covers(granted: Option<&ConditionMap>, required: Option<&Condition>) -> bool {
    match (granted, required) {
        (None, None) => true,
        (Some(_), None) | (None, Some(_)) => false,
        (Some(granted), Some(required)) => granted
            .get(&required.condition_type)
            .and_then(|keys| keys.get(&required.key))
            .is_some_and(|values| {
                required
                    .values
                    .iter()
                    .all(|required_value| values.contains(required_value))
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn granted(operator: &str, key: &str, values: &[&str]) -> ConditionMap {
        let mut keys = BTreeMap::new();
        keys.insert(
            key.to_string(),
            values.iter().map(ToString::to_string).collect(),
        );
        let mut map = BTreeMap::new();
        map.insert(operator.to_string(), keys);
        map
    }

    fn required(operator: &str, key: &str, values: &[&str]) -> Condition {
        Condition {
            condition_type: operator.to_string(),
            key: key.to_string(),
            values: values.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_absent_on_both_sides_covers() {
        assert!(covers(None, None));
    }

    #[test]
    fn test_conditioned_grant_does_not_cover_unconditioned_requirement() {
        let g = granted("StringEquals", "aws:RequestedRegion", &["us-east-1"]);
        assert!(!covers(Some(&g), None));
    }

    #[test]
    fn test_unconditioned_grant_does_not_cover_required_condition() {
        let r = required("ForAnyValue:StringLike", "kms:ResourceAliases", &["alias/x-*"]);
        assert!(!covers(None, Some(&r)));
    }

    #[test]
    fn test_subset_of_values_is_covered() {
        let g = granted(
            "ForAnyValue:StringLike",
            "kms:ResourceAliases",
            &["alias/cluster-api-provider-aws-*", "alias/other"],
        );
        let r = required(
            "ForAnyValue:StringLike",
            "kms:ResourceAliases",
            &["alias/cluster-api-provider-aws-*"],
        );
        assert!(covers(Some(&g), Some(&r)));
    }

    #[test]
    fn test_missing_value_is_not_covered() {
        let g = granted(
            "ForAnyValue:StringLike",
            "kms:ResourceAliases",
            &["alias/cluster-api-provider-aws-*"],
        );
        let r = required(
            "ForAnyValue:StringLike",
            "kms:ResourceAliases",
            &["alias/cluster-api-provider-aws-*", "alias/another-value"],
        );
        assert!(!covers(Some(&g), Some(&r)));
    }

    #[test]
    fn test_values_are_compared_literally() {
        let g = granted("StringLike", "s3:prefix", &["home/*"]);
        let r = required("StringLike", "s3:prefix", &["home/alice"]);
        assert!(!covers(Some(&g), Some(&r)));
    }

    #[test]
    fn test_type_and_key_must_match() {
        let g = granted("StringEquals", "aws:RequestedRegion", &["us-east-1"]);
        assert!(!covers(
            Some(&g),
            Some(&required("StringLike", "aws:RequestedRegion", &["us-east-1"]))
        ));
        assert!(!covers(
            Some(&g),
            Some(&required("StringEquals", "aws:SourceVpc", &["us-east-1"]))
        ));
    }

    proptest! {
        #[test]
        fn prop_containment_decides_coverage(
            granted_values in proptest::collection::btree_set("[a-z]{1,4}", 0..6),
            required_values in proptest::collection::vec("[a-z]{1,4}", 0..4),
        ) {
            let granted_refs: Vec<&str> = granted_values.iter().map(String::as_str).collect();
            let required_refs: Vec<&str> = required_values.iter().map(String::as_str).collect();
            let g = granted("StringEquals", "k", &granted_refs);
            let r = required("StringEquals", "k", &required_refs);
            let contained = required_values.iter().all(|v| granted_values.contains(v));
            prop_assert_eq!(covers(Some(&g), Some(&r)), contained);
        }
    }
}

//! Glob matching for IAM action and resource patterns.
//!
//! `*` matches any run of characters (including none) and `?` matches exactly
//! one character. There are no character classes and no escapes. Matching is
//! anchored and case-sensitive: inputs are compared as given.

use regex::Regex;

/// A compiled IAM pattern
///
/// Patterns without wildcards are compared by string equality. Wildcard
/// patterns are translated once into an anchored regex, which keeps matching
/// linear in the length of the pattern and the input.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    glob: Option<Regex>,
}

impl Pattern {
    /// Compile an IAM pattern
    ///
    /// # Errors
    /// Returns the regex error if the translated pattern exceeds the regex
    /// size limits.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let glob = if pattern.contains(['*', '?']) {
            Some(Regex::new(&glob_to_regex(pattern))?)
        } else {
            None
        };

        Ok(Self {
            source: pattern.to_string(),
            glob,
        })
    }

    /// The pattern text as written in the policy
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Check whether `literal` is matched by this pattern
    #[must_use]
    pub fn is_match(&self, literal: &str) -> bool {
        match &self.glob {
            Some(regex) => regex.is_match(literal),
            None => self.source == literal,
        }
    }
}

/// Check whether `literal` is matched by the IAM `pattern`
///
/// A pattern that cannot be compiled matches nothing.
#[must_use]
pub fn matches(pattern: &str, literal: &str) -> bool {
    Pattern::new(pattern).is_ok_and(|p| p.is_match(literal))
}

fn glob_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() + 8);
    regex.push_str("(?s)^");

    let mut buf = [0u8; 4];
    let mut previous_star = false;
    for c in pattern.chars() {
        match c {
            '*' => {
                // consecutive stars are equivalent to one
                if !previous_star {
                    regex.push_str(".*");
                }
                previous_star = true;
                continue;
            }
            '?' => regex.push('.'),
            _ => regex.push_str(&regex::escape(c.encode_utf8(&mut buf))),
        }
        previous_star = false;
    }

    regex.push('$');
    regex
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_literal_patterns_are_equality() {
        assert!(matches("ec2:DescribeInstances", "ec2:DescribeInstances"));
        assert!(!matches("ec2:DescribeInstances", "ec2:DescribeInstance"));
        assert!(!matches("ec2:DescribeInstances", "EC2:DescribeInstances"));
    }

    #[test]
    fn test_star_matches_any_run() {
        assert!(matches("*", "s3:GetObject"));
        assert!(matches("*", ""));
        assert!(matches("s3:List*", "s3:ListBuckets"));
        assert!(matches("s3:List*", "s3:List"));
        assert!(matches("organizations:*Organizations", "organizations:ListOrganizations"));
        assert!(matches("iam:*Group*", "iam:DetachGroupPolicy"));
        assert!(!matches("iam:*Group*", "iam:DetachRolePolicy"));
        assert!(!matches("s3:List*", "s3:GetObject"));
    }

    #[test]
    fn test_question_mark_matches_exactly_one() {
        assert!(matches("s3:Get?bject", "s3:GetObject"));
        assert!(!matches("s3:Get?bject", "s3:Getbject"));
        assert!(!matches("s3:Get?", "s3:GetOb"));
    }

    #[test]
    fn test_resource_arn_patterns() {
        assert!(matches("arn:*:eks:*:*:cluster/*", "arn:*:eks:*:*:cluster/*"));
        assert!(matches(
            "arn:*:eks:*:*:cluster/*",
            "arn:aws:eks:us-east-1:123456789012:cluster/prod"
        ));
        assert!(!matches("arn:*:eks:*:*:cluster/*", "arn:*:eks:*:*:nodegroup/*/*/*"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert!(matches("arn:aws:s3:::bucket.name/(a)+", "arn:aws:s3:::bucket.name/(a)+"));
        assert!(!matches("arn:aws:s3:::bucket.name/*", "arn:aws:s3:::bucketXname/key"));
        assert!(matches("a[b]*", "a[b]cd"));
    }

    #[test]
    fn test_empty_pattern_matches_only_empty() {
        assert!(matches("", ""));
        assert!(!matches("", "a"));
    }

    #[test]
    fn test_compiled_pattern_keeps_source() {
        let pattern = Pattern::new("kms:*").unwrap();
        assert_eq!(pattern.as_str(), "kms:*");
        assert!(pattern.is_match("kms:CreateGrant"));
    }

    proptest! {
        #[test]
        fn prop_literal_matches_itself(s in "[a-zA-Z0-9:/._-]{0,40}") {
            prop_assert!(matches(&s, &s));
        }

        #[test]
        fn prop_star_matches_everything(s in "\\PC{0,40}") {
            prop_assert!(matches("*", &s));
        }

        #[test]
        fn prop_prefix_star(prefix in "[a-z0-9:]{0,10}", rest in "[a-zA-Z0-9]{0,10}") {
            let pattern = format!("{prefix}*");
            let literal = format!("{prefix}{rest}");
            prop_assert!(matches(&pattern, &literal));
        }

        #[test]
        fn prop_question_marks_match_length(s in "[a-zA-Z0-9]{0,20}") {
            let pattern = "?".repeat(s.chars().count());
            prop_assert!(matches(&pattern, &s));
            let longer = format!("{pattern}?");
            prop_assert!(!matches(&longer, &s));
        }
    }
}

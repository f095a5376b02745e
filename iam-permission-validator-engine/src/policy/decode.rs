//! Decoding and encoding of granted policy documents.
//!
//! IAM returns policy version documents as percent-encoded JSON. Decoding
//! undoes the percent-encoding (accepting `+` for a space, as query-escaped
//! input uses it) and then parses the IAM JSON grammar into a
//! [`GrantedPolicy`].

use log::trace;
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};

use super::GrantedPolicy;
use crate::errors::{Result, ValidatorError};

/// Decode a percent-encoded IAM policy document
///
/// `policy` names the document (usually its ARN) in error messages.
///
/// # Errors
/// Returns [`ValidatorError::MalformedPolicy`] when the text is not valid
/// percent-encoded UTF-8, is not valid JSON, has an `Effect` other than
/// `Allow`/`Deny`, or lacks `Statement`, `Effect`, `Action` or `Resource`.
pub fn decode_policy_document(policy: &str, encoded: &str) -> Result<GrantedPolicy> {
    let unescaped = encoded.replace('+', " ");
    let json = percent_decode_str(&unescaped).decode_utf8().map_err(|e| {
        ValidatorError::malformed_policy(policy, format!("invalid percent-encoding: {e}"))
    })?;

    trace!("Decoded policy document {}: {}", policy, json);

    serde_json::from_str::<GrantedPolicy>(&json)
        .map_err(|e| ValidatorError::malformed_policy(policy, e.to_string()))
}

/// Serialize a granted policy to IAM JSON and percent-encode it
///
/// The output is accepted by [`decode_policy_document`].
///
/// # Errors
/// Returns [`ValidatorError::JsonParsing`] if serialization fails.
pub fn encode_policy_document(policy: &GrantedPolicy) -> Result<String> {
    let json = serde_json::to_string(policy)
        .map_err(|e| ValidatorError::json_parsing("policy document encoding", e))?;
    Ok(percent_encode_document(&json))
}

/// Percent-encode a raw JSON policy document the way IAM returns it
#[must_use]
pub fn percent_encode_document(json: &str) -> String {
    utf8_percent_encode(json, NON_ALPHANUMERIC).to_string()
}

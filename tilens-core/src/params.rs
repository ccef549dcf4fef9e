//! Tool argument parsing
//!
//! The agent runtime hands every tool a single free-text argument. Tools that
//! need more than one value ask the model (via their description) for a comma
//! separated list and recover the fields here.

use thiserror::Error;

/// Errors from splitting or interpreting tool arguments
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected {expected} comma separated fields, found {found} in {input:?}")]
    FieldCount {
        expected: usize,
        found: usize,
        input: String,
    },

    #[error("unknown observable type: {0:?}")]
    UnknownObservableType(String),

    #[error("unknown relationship: {0:?}")]
    UnknownRelationship(String),
}

/// Split `input` on `,` into exactly `expected` fields.
///
/// Whitespace is preserved and there is no quoting or escaping. Any other
/// field count is an error; there are no defaults.
pub fn split_fields(input: &str, expected: usize) -> Result<Vec<&str>, ParseError> {
    let fields: Vec<&str> = input.split(',').collect();
    if fields.len() != expected {
        return Err(ParseError::FieldCount {
            expected,
            found: fields.len(),
            input: input.to_string(),
        });
    }
    Ok(fields)
}

/// Parse `observable,observable_type`
pub fn parse_observable_pair(input: &str) -> Result<(&str, &str), ParseError> {
    let fields = split_fields(input, 2)?;
    Ok((fields[0], fields[1]))
}

/// Parse `observable,observable_type,relationship`
pub fn parse_relationship_triple(input: &str) -> Result<(&str, &str, &str), ParseError> {
    let fields = split_fields(input, 3)?;
    Ok((fields[0], fields[1], fields[2]))
}

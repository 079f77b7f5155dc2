//! Error and diagnostic types for map payload loading.

use std::io;
use thiserror::Error;

/// Fatal payload problems: nothing can be rendered from the payload.
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Map service reported an error: {0}")]
    Backend(String),
    /// Only `map` is required; it carries the grid dimensions.
    #[error("Payload is missing required array `{0}`")]
    MissingArray(&'static str),
}

/// Non-fatal malformed-payload conditions.
///
/// The affected cell, building or entity is skipped and the rest of the map
/// still resolves. Callers surface these to the user instead of blanking the
/// viewport.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Diagnostic {
    #[error("`{array}` has {found} columns, grid has {expected}")]
    ColumnCountMismatch {
        array: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("`{array}[{x}]` has {found} rows, grid has {expected}")]
    RowLengthMismatch {
        array: &'static str,
        x: usize,
        expected: usize,
        found: usize,
    },
    #[error("`{array}` is missing; treated as empty")]
    MissingArray { array: &'static str },
    #[error("`{array}` is not an array; treated as empty")]
    MalformedArray { array: &'static str },
    #[error("`{array}[{index}]` skipped: {reason}")]
    RecordSkipped {
        array: &'static str,
        index: usize,
        reason: String,
    },
    #[error("cell ({x}, {y}) skipped: `{array}` entry has the wrong type")]
    CellInvalid {
        x: usize,
        y: usize,
        array: &'static str,
    },
    #[error("cell ({x}, {y}) skipped: no entry in `{array}`")]
    CellSkipped {
        x: usize,
        y: usize,
        array: &'static str,
    },
    #[error("building {index} at ({x}, {y}) is outside the {width}x{height} grid")]
    BuildingOutOfBounds {
        index: usize,
        x: i64,
        y: i64,
        width: usize,
        height: usize,
    },
    #[error("entity {index} ({name}) at ({x}, {y}) is outside the {width}x{height} grid")]
    EntityOutOfBounds {
        index: usize,
        name: String,
        x: i64,
        y: i64,
        width: usize,
        height: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_messages_name_the_offender() {
        let d = Diagnostic::BuildingOutOfBounds {
            index: 2,
            x: 25,
            y: -1,
            width: 20,
            height: 20,
        };
        assert_eq!(
            d.to_string(),
            "building 2 at (25, -1) is outside the 20x20 grid"
        );

        let d = Diagnostic::RowLengthMismatch {
            array: "terrain",
            x: 3,
            expected: 20,
            found: 19,
        };
        assert_eq!(d.to_string(), "`terrain[3]` has 19 rows, grid has 20");
    }

    #[test]
    fn test_payload_error_wraps_json_error() {
        let err: PayloadError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(err.to_string().starts_with("Serialization error"));
    }
}

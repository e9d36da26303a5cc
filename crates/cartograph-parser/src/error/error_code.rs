//! Error codes for the Cartograph diagnostic system.
//!
//! Codes are organized by phase:
//! - `E0xx` - Lexer errors
//! - `E1xx` - Grammar errors
//! - `E2xx` - Conversion errors
//! - `W3xx` - Conversion warnings

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexer Errors (E0xx)
    // =========================================================================
    /// Unterminated string literal.
    E001,

    /// Unexpected character.
    E002,

    /// Invalid escape sequence.
    ///
    /// Valid escapes are: `\n`, `\r`, `\t`, `\b`, `\f`, `\\`, `\/`, `\'`, `\"`, `\0`, `\u{...}`.
    E003,

    /// Invalid unicode escape format. Unicode escapes use `\u{XXXX}` with 1-6 hex digits.
    E004,

    /// Invalid unicode codepoint (out of range or a surrogate).
    E005,

    /// Empty unicode escape `\u{}`.
    E006,

    // =========================================================================
    // Grammar Errors (E1xx)
    // =========================================================================
    /// Unexpected token.
    E100,

    /// Incomplete input, e.g. a block that is never closed.
    E101,

    // =========================================================================
    // Conversion Errors (E2xx)
    // =========================================================================
    /// Unknown profile keyword.
    E200,

    /// Unknown statement keyword for the profile.
    E201,

    /// Unknown property for a fixed-schema statement.
    E202,

    /// Property or argument value has the wrong type or is not an allowed value.
    E203,

    /// A required value is missing.
    E204,

    /// Identifier defined more than once.
    E205,

    /// Reference to something that was never defined.
    E206,

    /// Unknown container template.
    E207,

    /// Unknown metric name.
    E208,

    /// Numeric value out of its allowed range.
    E209,

    // =========================================================================
    // Conversion Warnings (W3xx)
    // =========================================================================
    /// Shape is not in the shape catalog.
    W300,

    /// Net with a single connection.
    W301,

    /// Kanban column exceeds its WIP limit.
    W302,

    /// Setting given more than once; the last value wins.
    W303,
}

impl ErrorCode {
    /// Returns the code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            ErrorCode::E006 => "E006",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            ErrorCode::E205 => "E205",
            ErrorCode::E206 => "E206",
            ErrorCode::E207 => "E207",
            ErrorCode::E208 => "E208",
            ErrorCode::E209 => "E209",
            ErrorCode::W300 => "W300",
            ErrorCode::W301 => "W301",
            ErrorCode::W302 => "W302",
            ErrorCode::W303 => "W303",
        }
    }

    /// Returns a short description of what this code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "unterminated string literal",
            ErrorCode::E002 => "unexpected character",
            ErrorCode::E003 => "invalid escape sequence",
            ErrorCode::E004 => "invalid unicode escape",
            ErrorCode::E005 => "invalid unicode codepoint",
            ErrorCode::E006 => "empty unicode escape",
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "incomplete input",
            ErrorCode::E200 => "unknown profile",
            ErrorCode::E201 => "unknown statement",
            ErrorCode::E202 => "unknown property",
            ErrorCode::E203 => "invalid value",
            ErrorCode::E204 => "missing value",
            ErrorCode::E205 => "duplicate definition",
            ErrorCode::E206 => "undefined reference",
            ErrorCode::E207 => "unknown template",
            ErrorCode::E208 => "unknown metric",
            ErrorCode::E209 => "value out of range",
            ErrorCode::W300 => "unknown shape",
            ErrorCode::W301 => "dangling net",
            ErrorCode::W302 => "wip limit exceeded",
            ErrorCode::W303 => "setting overridden",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E001.to_string(), "E001");
        assert_eq!(ErrorCode::E206.to_string(), "E206");
        assert_eq!(ErrorCode::W300.to_string(), "W300");
    }

    #[test]
    fn test_error_code_description() {
        assert_eq!(ErrorCode::E100.description(), "unexpected token");
        assert_eq!(ErrorCode::W301.description(), "dangling net");
    }
}

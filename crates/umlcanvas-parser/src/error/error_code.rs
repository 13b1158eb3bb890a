//! Error codes for listing diagnostics.
//!
//! - `E1xx` - Syntax errors
//! - `E2xx` - Structural warnings

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Unrecognized line.
    ///
    /// The line is not a class header, a section header, a member, a
    /// relationship or a closing brace.
    E100,

    /// Member outside of a class.
    ///
    /// A field or method appeared before any class header.
    E101,

    /// Malformed member.
    ///
    /// A member line starts like a field or method but cannot be parsed,
    /// for example an unclosed parameter list.
    E102,

    /// Malformed relationship.
    ///
    /// A line containing `->` lacks a source or target class name.
    E103,

    /// Empty listing.
    ///
    /// The listing declares no classes at all.
    E104,

    /// Duplicate class.
    ///
    /// A class header repeats an earlier name; its members are appended to
    /// the first declaration.
    E200,

    /// Unknown relationship kind.
    ///
    /// The kind after `:` is not recognized and was read as association.
    E201,
}

impl ErrorCode {
    /// Returns a short summary of the code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::E100 => "unrecognized line",
            Self::E101 => "member outside of a class",
            Self::E102 => "malformed member",
            Self::E103 => "malformed relationship",
            Self::E104 => "empty listing",
            Self::E200 => "duplicate class",
            Self::E201 => "unknown relationship kind",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E101.to_string(), "E101");
        assert_eq!(ErrorCode::E200.description(), "duplicate class");
    }
}

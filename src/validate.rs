//! Input validation for task commands.
//!
//! The store accepts any text; callers run titles and ids through here first.

use crate::error::{Error, Result};

/// Longest title accepted, in characters.
pub const MAX_TITLE_CHARS: usize = 1000;

/// Trim a title and reject it if nothing visible remains.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` for blank or over-long titles.
pub fn validate_title(input: &str) -> Result<String> {
    let title = input.trim();

    if title.is_empty() {
        return Err(Error::InvalidArgument(
            "title must not be blank".to_string(),
        ));
    }

    let chars = title.chars().count();
    if chars > MAX_TITLE_CHARS {
        return Err(Error::InvalidArgument(format!(
            "title is {chars} characters; the limit is {MAX_TITLE_CHARS}"
        )));
    }

    Ok(title.to_string())
}

/// Parse a task id given on the command line.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` if the input is not an integer.
pub fn parse_id(input: &str) -> Result<i64> {
    input
        .trim()
        .parse::<i64>()
        .map_err(|_| Error::InvalidArgument(format!("'{input}' is not a task id")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_is_trimmed() {
        assert_eq!(validate_title("  buy milk \n").unwrap(), "buy milk");
    }

    #[test]
    fn test_blank_titles_rejected() {
        for input in ["", "   ", "\t\n"] {
            let err = validate_title(input).unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(ref m) if m.contains("title")));
        }
    }

    #[test]
    fn test_long_title_rejected() {
        let long = "x".repeat(MAX_TITLE_CHARS + 1);
        assert!(validate_title(&long).is_err());
        assert!(validate_title(&long[1..]).is_ok());
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert_eq!(parse_id(" 1700000000000 ").unwrap(), 1_700_000_000_000);
        assert!(parse_id("abc").is_err());
        assert!(parse_id("").is_err());
    }
}

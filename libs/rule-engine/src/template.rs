//! Template text parsing
//!
//! ARM templates may carry `//` and `/* */` comments and trailing commas. Both are blanked
//! out in place before `serde_json` sees the text, so line and column positions in parse
//! errors match the original.

use crate::error::{Error, Result};
use json_comments::{strip_comments_in_place, CommentSettings};
use serde_json::Value;

pub fn parse_template(text: &str) -> Result<Value> {
    let mut stripped = text.to_owned();
    strip_comments_in_place(&mut stripped, CommentSettings::c_style(), true)
        .map_err(|e| Error::InvalidTemplate(e.to_string()))?;
    Ok(serde_json::from_str(&stripped)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepts_comments_and_trailing_commas() {
        let text = "{\n  // line comment\n  \"a\": [1, 2,], /* block */\n  \"b\": { \"c\": \"//not a comment\", },\n}";
        assert_eq!(
            parse_template(text).unwrap(),
            json!({ "a": [1, 2], "b": { "c": "//not a comment" } })
        );
    }

    #[test]
    fn test_plain_json_is_unchanged() {
        assert_eq!(parse_template(r#"{"x": 1}"#).unwrap(), json!({ "x": 1 }));
    }

    #[test]
    fn test_reports_errors_at_original_lines() {
        let error = parse_template("{\n  /* a\n  b */\n  \"x\": ?\n}").unwrap_err();
        match error {
            Error::Json(e) => assert_eq!(e.line(), 4),
            other => panic!("unexpected error: {}", other),
        }
    }
}

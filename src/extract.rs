//! Verification-code extraction from message bodies.
//!
//! This is deliberately a tokenizer, not a parser. The body is normalized by
//! replacing newlines and angle brackets with spaces (so codes wedged between
//! HTML tags still come free), split on whitespace, and every token that is
//! exactly six ASCII digits is kept and concatenated in order of appearance.
//!
//! The rule both over- and under-matches: a six-digit postal code will
//! match, a code glued to punctuation will not. Services that send codes of
//! another length can use [`extract_code_with_length`]. Existing callers
//! depend on these exact semantics; do not swap in a smarter regex.
//!
//! # Example
//!
//! ```
//! use tempbox::extract::extract_code;
//!
//! assert_eq!(
//!     extract_code("Your verification code is 123456."),
//!     None // "123456." is seven characters - the period sticks
//! );
//! assert_eq!(
//!     extract_code("Your code: <b>123456</b>"),
//!     Some("123456".to_string())
//! );
//! ```

/// The code length virtually every verification mail uses.
const DEFAULT_CODE_LENGTH: usize = 6;

/// Extracts 6-digit verification codes from a message body.
///
/// Returns the concatenation of every isolated 6-digit token in order of
/// appearance, or `None` when the body contains none.
///
/// # Example
///
/// ```
/// use tempbox::extract::extract_code;
///
/// assert_eq!(
///     extract_code("code 123456 and 654321"),
///     Some("123456654321".to_string())
/// );
/// assert_eq!(extract_code("no digits here"), None);
/// ```
#[must_use]
pub fn extract_code(body: &str) -> Option<String> {
    extract_code_with_length(body, DEFAULT_CODE_LENGTH)
}

/// Extracts verification codes of an arbitrary length.
///
/// Same tokenization rule as [`extract_code`] with a caller-chosen token
/// length.
#[must_use]
pub fn extract_code_with_length(body: &str, length: usize) -> Option<String> {
    let normalized: String = body
        .chars()
        .map(|c| match c {
            '\n' | '<' | '>' => ' ',
            other => other,
        })
        .collect();

    let code: String = normalized
        .split_whitespace()
        .filter(|token| is_code(token, length))
        .collect();

    if code.is_empty() {
        None
    } else {
        Some(code)
    }
}

/// Returns `true` if the token is a purely numeric string of exactly `length` characters.
fn is_code(token: &str, length: usize) -> bool {
    token.len() == length && token.bytes().all(|b| b.is_ascii_digit())
}

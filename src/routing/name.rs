//! Route-name grammar.
//!
//! # Responsibilities
//! - Validate `segment('/' segment)*` route names
//! - Report the first violated rule as a distinct error
//!
//! # Design Decisions
//! - Whole name: at least two characters, starts with a letter, ends with a
//!   letter or digit, only letters/digits/`-`/`_`/`/`
//! - Sub-routes (segments after a `/`): non-empty, at least two characters,
//!   start with a letter; a segment followed by `/` ends with a letter or digit
//! - Names starting with `_` are reserved for system routes

use thiserror::Error;

/// Why a route name was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RouteNameError {
    #[error("Route is required")]
    Empty,

    #[error("Route should be at least two characters long")]
    TooShort,

    #[error("Route should start with a letter")]
    InvalidStart,

    #[error("Route should end with a letter or a number")]
    InvalidEnd,

    #[error("Route should contain only letters, numbers, dashes, underscores, and forward slashes")]
    InvalidCharacter,

    #[error("Sub-routes should not be empty")]
    EmptySegment,

    #[error("Sub-routes should start with a letter")]
    InvalidSegmentStart,

    #[error("Sub-routes should end with a letter or a number")]
    InvalidSegmentEnd,

    #[error("Sub-routes should be at least two characters long")]
    SegmentTooShort,
}

pub fn validate_route_name(name: &str) -> Result<(), RouteNameError> {
    let bytes = name.as_bytes();
    let (Some(&first), Some(&last)) = (bytes.first(), bytes.last()) else {
        return Err(RouteNameError::Empty);
    };

    if bytes.len() < 2 {
        return Err(RouteNameError::TooShort);
    }
    if !first.is_ascii_alphabetic() {
        return Err(RouteNameError::InvalidStart);
    }
    if !last.is_ascii_alphanumeric() {
        return Err(RouteNameError::InvalidEnd);
    }
    if !bytes
        .iter()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'/'))
    {
        return Err(RouteNameError::InvalidCharacter);
    }

    let segments: Vec<&str> = name.split('/').collect();
    let count = segments.len();
    for (index, segment) in segments.into_iter().enumerate() {
        let Some(&seg_first) = segment.as_bytes().first() else {
            return Err(RouteNameError::EmptySegment);
        };
        if index > 0 {
            if !seg_first.is_ascii_alphabetic() {
                return Err(RouteNameError::InvalidSegmentStart);
            }
            if segment.len() < 2 {
                return Err(RouteNameError::SegmentTooShort);
            }
        }
        if index + 1 < count && !segment.as_bytes()[segment.len() - 1].is_ascii_alphanumeric() {
            return Err(RouteNameError::InvalidSegmentEnd);
        }
    }

    Ok(())
}

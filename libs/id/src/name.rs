//! RFC 1123 hostname validation.
//!
//! Set names end up in host labels and hostnames, so they must be lowercase
//! alphanumerics and hyphens, segment-wise no longer than 63 characters and
//! never starting or ending with a hyphen.

use crate::NameError;

/// Maximum length of a single dot-separated segment.
pub const MAX_LABEL_LENGTH: usize = 63;

/// Maximum length of a full dotted name.
pub const MAX_NAME_LENGTH: usize = 253;

/// Validate a name against RFC 1123 hostname syntax.
pub fn validate_label_name(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(NameError::TooLong {
            len: name.len(),
            max: MAX_NAME_LENGTH,
        });
    }

    name.split('.').try_for_each(validate_segment)
}

/// Predicate form of [`validate_label_name`].
pub fn is_valid_label_name(name: &str) -> bool {
    validate_label_name(name).is_ok()
}

/// Validate a single label (no dots), as used for namespaces.
pub(crate) fn validate_single_label(name: &str) -> Result<(), NameError> {
    if name.contains('.') {
        return Err(NameError::NotSingleLabel(name.to_string()));
    }
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    validate_segment(name)
}

fn validate_segment(segment: &str) -> Result<(), NameError> {
    if segment.is_empty() {
        return Err(NameError::EmptySegment);
    }

    if segment.len() > MAX_LABEL_LENGTH {
        return Err(NameError::SegmentTooLong {
            segment: segment.to_string(),
            len: segment.len(),
            max: MAX_LABEL_LENGTH,
        });
    }

    if let Some(ch) = segment
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
    {
        return Err(NameError::InvalidCharacter {
            ch,
            segment: segment.to_string(),
        });
    }

    if segment.starts_with('-') || segment.ends_with('-') {
        return Err(NameError::HyphenBoundary {
            segment: segment.to_string(),
        });
    }

    Ok(())
}

//! Field-level text checks shared by every input type.
//!
//! All helpers trim their input. Optional fields that are blank after
//! trimming become `None`.

use juris_core::{DomainError, DomainResult};

/// A required text field of at most `max` characters.
pub fn required(field: &str, value: String, max: Option<usize>) -> DomainResult<String> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(DomainError::field(field, "must not be empty"));
    }
    check_len(field, &value, max)?;
    Ok(value)
}

pub fn optional(field: &str, value: Option<String>, max: Option<usize>) -> DomainResult<Option<String>> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if v.is_empty() => Ok(None),
        Some(v) => {
            check_len(field, &v, max)?;
            Ok(Some(v))
        }
        None => Ok(None),
    }
}

/// Lower-cased, syntactically plausible email address.
pub fn email(field: &str, value: String) -> DomainResult<String> {
    let value = required(field, value, Some(255))?.to_lowercase();
    if !looks_like_email(&value) {
        return Err(DomainError::field(field, "is not a valid email address"));
    }
    Ok(value)
}

pub fn optional_email(field: &str, value: Option<String>) -> DomainResult<Option<String>> {
    match optional(field, value, Some(255))? {
        Some(v) => email(field, v).map(Some),
        None => Ok(None),
    }
}

/// Case-insensitive substring match used by list searches.
pub fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn check_len(field: &str, value: &str, max: Option<usize>) -> DomainResult<()> {
    if let Some(max) = max {
        if value.chars().count() > max {
            return Err(DomainError::validation(format!(
                "{field} must be at most {max} characters"
            )));
        }
    }
    Ok(())
}

fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

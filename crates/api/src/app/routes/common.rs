use core::str::FromStr;

use juris_core::DomainError;

use crate::app::errors::ApiError;

/// Parse a path id; a malformed id is a 400, not a 404.
pub fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = DomainError>,
{
    Ok(raw.parse::<T>()?)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use juris_core::CaseId;

    use super::*;

    #[test]
    fn malformed_ids_are_bad_requests() {
        let err = parse_id::<CaseId>("not-a-uuid").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let id = CaseId::new();
        assert_eq!(parse_id::<CaseId>(&id.to_string()).unwrap(), id);
    }
}

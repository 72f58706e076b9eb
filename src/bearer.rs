//! `Authorization` header parsing.

use crate::error::TokenError;

/// Extract the token from `Bearer <token>`.
///
/// The scheme is matched case-sensitively and the value must consist of
/// exactly two space-separated parts.
pub fn extract_bearer(header_value: &str) -> Result<&str, TokenError> {
    let mut parts = header_value.split(' ');
    let (Some(scheme), Some(token), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(TokenError::Malformed);
    };

    if scheme != "Bearer" {
        return Err(TokenError::Malformed);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(TokenError::Malformed);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_token() {
        assert_eq!(extract_bearer("Bearer abc.def.ghi"), Ok("abc.def.ghi"));
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert_eq!(extract_bearer("bearer abc"), Err(TokenError::Malformed));
        assert_eq!(extract_bearer("Basic dXNlcjpwYXNz"), Err(TokenError::Malformed));
    }

    #[test]
    fn test_rejects_bad_shapes() {
        assert_eq!(extract_bearer(""), Err(TokenError::Malformed));
        assert_eq!(extract_bearer("Bearer"), Err(TokenError::Malformed));
        assert_eq!(extract_bearer("Bearer "), Err(TokenError::Malformed));
        assert_eq!(extract_bearer("Bearer a b"), Err(TokenError::Malformed));
        assert_eq!(extract_bearer("Bearer  abc"), Err(TokenError::Malformed));
    }
}

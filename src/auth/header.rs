//! Credential extraction from the `Authorization` header.
//!
//! Two schemes are accepted, `Bearer <token>` and `ApiKey <key>`. The scheme
//! keyword must be followed by its single-space delimiter, so a value such
//! as `BearerXYZ` is rejected instead of being read as the token `XYZ`.

use actix_web::http::header::{HeaderMap, AUTHORIZATION};

const BEARER_PREFIX: &str = "Bearer ";
const API_KEY_PREFIX: &str = "ApiKey ";

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    #[error("no credential in the authorization header")]
    MissingCredential,
    #[error("authorization header does not use the expected scheme")]
    MalformedScheme,
}

/// Returns the token carried by `Authorization: Bearer <token>`.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, HeaderError> {
    extract_with_scheme(headers, BEARER_PREFIX)
}

/// Returns the key carried by `Authorization: ApiKey <key>`.
pub fn extract_api_key(headers: &HeaderMap) -> Result<&str, HeaderError> {
    extract_with_scheme(headers, API_KEY_PREFIX)
}

fn extract_with_scheme<'a>(headers: &'a HeaderMap, prefix: &str) -> Result<&'a str, HeaderError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(HeaderError::MissingCredential)?
        .to_str()
        .map_err(|_| HeaderError::MalformedScheme)?;

    if value.trim().is_empty() {
        return Err(HeaderError::MissingCredential);
    }

    let credential = value
        .strip_prefix(prefix)
        .ok_or(HeaderError::MalformedScheme)?
        .trim();

    if credential.is_empty() {
        return Err(HeaderError::MissingCredential);
    }

    Ok(credential)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::HeaderValue;

    fn headers_with(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_extract_bearer() {
        let headers = headers_with("Bearer abc123");
        assert_eq!(extract_bearer(&headers), Ok("abc123"));
    }

    #[test]
    fn test_extract_bearer_trims_token() {
        let headers = headers_with("Bearer   abc123  ");
        assert_eq!(extract_bearer(&headers), Ok("abc123"));
    }

    #[test]
    fn test_missing_header() {
        let headers = HeaderMap::new();
        assert_eq!(extract_bearer(&headers), Err(HeaderError::MissingCredential));
        assert_eq!(extract_api_key(&headers), Err(HeaderError::MissingCredential));
    }

    #[test]
    fn test_empty_credential() {
        assert_eq!(
            extract_bearer(&headers_with("Bearer    ")),
            Err(HeaderError::MissingCredential)
        );
        assert_eq!(
            extract_bearer(&headers_with("")),
            Err(HeaderError::MissingCredential)
        );
    }

    #[test]
    fn test_scheme_requires_delimiter() {
        assert_eq!(
            extract_bearer(&headers_with("BearerXYZ")),
            Err(HeaderError::MalformedScheme)
        );
        assert_eq!(
            extract_bearer(&headers_with("Bearer")),
            Err(HeaderError::MalformedScheme)
        );
    }

    #[test]
    fn test_scheme_is_case_sensitive() {
        assert_eq!(
            extract_bearer(&headers_with("bearer abc123")),
            Err(HeaderError::MalformedScheme)
        );
    }

    #[test]
    fn test_wrong_scheme() {
        assert_eq!(
            extract_bearer(&headers_with("Basic dXNlcjpwYXNz")),
            Err(HeaderError::MalformedScheme)
        );
        assert_eq!(
            extract_api_key(&headers_with("Bearer abc123")),
            Err(HeaderError::MalformedScheme)
        );
    }

    #[test]
    fn test_extract_api_key() {
        let headers = headers_with("ApiKey f271c81ff7084ee5b99a5091b42d486e");
        assert_eq!(
            extract_api_key(&headers),
            Ok("f271c81ff7084ee5b99a5091b42d486e")
        );
    }
}

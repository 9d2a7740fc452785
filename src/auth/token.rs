use std::fmt;

/// An opaque bearer token presented by a client.
///
/// It is forwarded verbatim to the auth/data service and never decoded here.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Extracts the token from an `Authorization` header value.
///
/// The value is split on whitespace and the second segment is the token.
/// The scheme in the first segment is not checked.
pub fn bearer_token(header: &str) -> Option<&str> {
    header.split_whitespace().nth(1)
}

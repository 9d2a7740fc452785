use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A user's public profile as reported by the auth service.
///
/// Only `id` and `email` are interpreted here; every other attribute the
/// service returns is carried along in `attributes` so responses can relay
/// the profile without reshaping it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

/// The caller of the current request, as resolved from their bearer token.
///
/// Lives only as long as the request; never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub email: Option<String>,
}

impl From<&UserProfile> for Identity {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id,
            email: profile.email.clone(),
        }
    }
}

/// Email/password pair forwarded to the auth service.
///
/// Missing fields deserialize as empty strings; the auth service decides
/// whether they are acceptable.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A successful password sign-in.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub user: UserProfile,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_relays_unknown_attributes() {
        let raw = json!({
            "id": "6a1f3c2e-8d7b-4e4f-9b1a-2c3d4e5f6a7b",
            "email": "a@x.com",
            "aud": "authenticated",
            "role": "authenticated",
            "user_metadata": {}
        });
        let profile: UserProfile = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(profile.email.as_deref(), Some("a@x.com"));
        assert_eq!(profile.attributes["aud"], "authenticated");
        assert_eq!(serde_json::to_value(&profile).unwrap(), raw);
    }

    #[test]
    fn test_credentials_defaults_and_redaction() {
        let credentials: Credentials = serde_json::from_value(json!({ "email": "a@x.com" })).unwrap();
        assert_eq!(credentials.password, "");

        let credentials = Credentials {
            email: "a@x.com".into(),
            password: "pw123456".into(),
        };
        let printed = format!("{:?}", credentials);
        assert!(printed.contains("a@x.com"));
        assert!(!printed.contains("pw123456"));
    }
}

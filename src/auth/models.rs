use serde::{Deserialize, Serialize};

/// An authenticated caller, as resolved by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque stable subject identifier issued by the provider.
    pub subject: String,
    /// Email address, when the provider supplies one.
    #[serde(default)]
    pub email: Option<String>,
}

/// Bearer token claims issued by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject — the stable user identifier.
    pub sub: String,
    /// Email address, optional in provider tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

impl Claims {
    /// Build the application-facing identity from token claims.
    pub fn into_identity(self) -> Identity {
        Identity {
            subject: self.sub,
            email: self.email,
        }
    }
}

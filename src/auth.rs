//! Authorization gate and the caller context it decides on

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Catalog operation kinds, as seen by the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Retrieve,
    Create,
    Update,
    Delete,
}

impl Operation {
    /// Reads are public, mutations need an authenticated caller
    pub fn requires_authentication(self) -> bool {
        matches!(self, Operation::Create | Operation::Update | Operation::Delete)
    }
}

/// Who is calling. Produced by the transport layer; the core never verifies
/// credentials itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub authenticated: bool,
    /// Caller identity, used for audit logging only
    pub principal: Option<String>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(principal: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            principal: Some(principal.into()),
        }
    }

    /// Principal name for log lines
    pub fn who(&self) -> &str {
        self.principal.as_deref().unwrap_or("anonymous")
    }

    /// Gate check: `Unauthorized` when the operation needs an authenticated
    /// caller and this one is not
    pub fn authorize(&self, operation: Operation) -> AppResult<()> {
        if operation.requires_authentication() && !self.authenticated {
            tracing::warn!(?operation, "Rejected unauthenticated {:?}", operation);
            return Err(AppError::Unauthorized);
        }
        Ok(())
    }
}

/// JWT claims accepted on the `Authorization: Bearer` header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClaims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

impl AuthClaims {
    pub fn new(sub: impl Into<String>, ttl_hours: i64) -> Self {
        let now = chrono::Utc::now();
        Self {
            sub: sub.into(),
            iat: now.timestamp(),
            exp: (now + chrono::Duration::hours(ttl_hours)).timestamp(),
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}

impl From<AuthClaims> for AuthContext {
    fn from(claims: AuthClaims) -> Self {
        AuthContext::authenticated(claims.sub)
    }
}

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Nurse,
    Admin,
}

impl Role {
    fn parse(raw: &str) -> Option<Role> {
        match raw.to_ascii_lowercase().as_str() {
            "client" => Some(Role::Client),
            "nurse" => Some(Role::Nurse),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| Error::Unauthorized("Token subject is not a user id".into()))
    }

    pub fn role(&self) -> Option<Role> {
        self.role.as_deref().and_then(Role::parse)
    }

    /// The caller's id, provided they hold one of `allowed` roles.
    pub fn require_role(&self, allowed: &[Role]) -> Result<Uuid> {
        match self.role() {
            Some(role) if allowed.contains(&role) => self.user_id(),
            _ => Err(Error::Forbidden("Role not permitted for this operation".into())),
        }
    }
}

/// Signs an HS256 token for `user_id`.
pub fn issue_token(secret: &str, user_id: Uuid, role: Role, ttl: chrono::Duration) -> Result<String> {
    let exp = (Utc::now() + ttl).timestamp().max(0) as usize;
    let role = match role {
        Role::Client => "client",
        Role::Nurse => "nurse",
        Role::Admin => "admin",
    };
    let claims = Claims {
        sub: user_id.to_string(),
        exp,
        role: Some(role.to_string()),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| Error::Internal(format!("token signing failed: {}", e)))
}

fn bearer_claims(req: &Request, secret: &str) -> Result<Claims> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| Error::Unauthorized("missing_authorization".into()))?;
    let auth_str = auth_header
        .to_str()
        .map_err(|_| Error::Unauthorized("bad_authorization".into()))?;
    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| Error::Unauthorized("unsupported_scheme".into()))?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|_| Error::Unauthorized("invalid_token".into()))
}

/// Verifies the bearer token and stores its `Claims` in request extensions.
/// Role checks happen in the handlers.
pub async fn require_bearer_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    match bearer_claims(&req, &state.jwt_secret) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_round_trips_role() {
        let user = Uuid::new_v4();
        let token = issue_token("secret", user, Role::Nurse, chrono::Duration::minutes(5)).unwrap();
        let claims = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"secret"),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap()
        .claims;
        assert_eq!(claims.user_id().unwrap(), user);
        assert_eq!(claims.role(), Some(Role::Nurse));
    }

    #[test]
    fn wrong_role_is_forbidden() {
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            exp: 0,
            role: Some("nurse".into()),
        };
        assert!(matches!(claims.require_role(&[Role::Client]), Err(Error::Forbidden(_))));
        assert!(claims.require_role(&[Role::Nurse, Role::Client]).is_ok());
    }

    #[test]
    fn missing_role_is_forbidden() {
        let claims = Claims { sub: Uuid::new_v4().to_string(), exp: 0, role: None };
        assert!(claims.require_role(&[Role::Admin]).is_err());
    }
}

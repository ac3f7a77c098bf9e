use super::jwks::JwksClient;
use super::model::{AuthenticatedAdmin, RoleClaims};
use crate::core::error::AppError;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Validates RS256 access tokens and resolves the admin's roles.
pub struct JwtValidator {
    jwks_client: Arc<JwksClient>,
    issuer: String,
    audience: String,
    claims_namespace: String,
    leeway: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct Claims {
    sub: String,
    // Namespaced custom claims are looked up by the configured key
    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

impl JwtValidator {
    pub fn new(
        jwks_client: Arc<JwksClient>,
        issuer: String,
        audience: String,
        claims_namespace: String,
        leeway: Duration,
    ) -> Self {
        Self {
            jwks_client,
            issuer,
            audience,
            claims_namespace,
            leeway: leeway.as_secs(),
        }
    }

    pub async fn validate_token(&self, token: &str) -> Result<AuthenticatedAdmin, AppError> {
        let header = decode_header(token).map_err(|e| AppError::Auth(e.to_string()))?;

        if header.alg != Algorithm::RS256 {
            return Err(AppError::Auth(format!(
                "Unsupported algorithm: {:?}. Only RS256 is allowed",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| AppError::Auth("Missing kid in token header".to_string()))?;

        let decoding_key = self
            .jwks_client
            .get_key(&kid)
            .await
            .map_err(|e| AppError::Auth(e.to_string()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.leeway = self.leeway;
        validation.validate_nbf = true;

        let claims = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|e| AppError::Auth(e.to_string()))?
            .claims;

        admin_from_claims(claims, &self.claims_namespace)
    }
}

fn admin_from_claims(mut claims: Claims, namespace: &str) -> Result<AuthenticatedAdmin, AppError> {
    let role_claims = match claims.extra.remove(namespace) {
        Some(value) => serde_json::from_value::<RoleClaims>(value)
            .map_err(|e| AppError::Auth(format!("Malformed role claims: {}", e)))?,
        None => RoleClaims::default(),
    };

    Ok(AuthenticatedAdmin {
        sub: claims.sub,
        username: role_claims.username,
        roles: role_claims.roles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NS: &str = "https://mirocommunity.org/claims";

    fn claims(value: Value) -> Claims {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_roles_read_from_namespace() {
        let admin = admin_from_claims(
            claims(json!({
                "sub": "user-1",
                "iss": "https://id.example",
                NS: { "roles": ["site_admin"], "username": "alice" }
            })),
            NS,
        )
        .unwrap();

        assert_eq!(admin.sub, "user-1");
        assert_eq!(admin.username.as_deref(), Some("alice"));
        assert!(admin.is_site_admin());
    }

    #[test]
    fn test_missing_namespace_yields_no_roles() {
        let admin = admin_from_claims(claims(json!({ "sub": "user-2" })), NS).unwrap();
        assert!(admin.roles.is_empty());
        assert!(!admin.is_site_admin());
    }

    #[test]
    fn test_malformed_namespace_is_rejected() {
        let result = admin_from_claims(claims(json!({ "sub": "u", NS: "superuser" })), NS);
        assert!(matches!(result, Err(AppError::Auth(_))));
    }
}

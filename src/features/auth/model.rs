use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::constants::{ROLE_SITE_ADMIN, ROLE_SUPERUSER};

/// An administrator authenticated by a bearer token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedAdmin {
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub roles: Vec<String>,
}

impl AuthenticatedAdmin {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_superuser(&self) -> bool {
        self.has_role(ROLE_SUPERUSER)
    }

    /// Superusers administer every site
    pub fn is_site_admin(&self) -> bool {
        self.is_superuser() || self.has_role(ROLE_SITE_ADMIN)
    }
}

/// Role claims published by the identity provider under the configured namespace
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleClaims {
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub username: Option<String>,
}

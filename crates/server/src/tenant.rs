//! Resolution of the authenticated principal to the tenant it acts for.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::UserRole;

use crate::{config::AuthConfig, error::AppError, state::AppState};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub company_id: i64,
    pub role: UserRole,
    pub exp: usize,
}

/// The `(company, user, role)` triple every tenant-scoped operation runs under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantContext {
    pub company_id: i64,
    pub user_id: i64,
    pub role: UserRole,
}

impl TenantContext {
    pub fn require_admin(&self) -> Result<(), AppError> {
        match self.role {
            UserRole::Admin => Ok(()),
            UserRole::User => Err(AppError::Forbidden("Admin access required".to_string())),
        }
    }
}

pub fn issue_token(ctx: &TenantContext, auth_config: &AuthConfig) -> Result<String, AppError> {
    let expiration = chrono::Utc::now()
        .checked_add_signed(chrono::Duration::hours(auth_config.token_expiry_hours as i64))
        .ok_or_else(|| AppError::Internal("Failed to calculate expiration".to_string()))?
        .timestamp() as usize;

    let claims = Claims {
        sub: ctx.user_id.to_string(),
        company_id: ctx.company_id,
        role: ctx.role,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth_config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(e.to_string()))
}

pub fn verify_token(token: &str, secret: &str) -> Result<TenantContext, AppError> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::AuthError("Invalid or expired token".to_string()))?;

    let user_id = claims
        .sub
        .parse()
        .map_err(|_| AppError::AuthError("Invalid or expired token".to_string()))?;

    Ok(TenantContext {
        company_id: claims.company_id,
        user_id,
        role: claims.role,
    })
}

#[async_trait]
impl FromRequestParts<AppState> for TenantContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::AuthError("Authorization token required".to_string()))?;

        let ctx = verify_token(token, &state.config.auth.jwt_secret)?;

        // The user must still exist in the company; its stored role wins over the token's
        let user = state
            .db
            .get_user(ctx.user_id, ctx.company_id)
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid or expired token".to_string()))?;

        Ok(TenantContext {
            role: match user.role.as_str() {
                "admin" => UserRole::Admin,
                _ => UserRole::User,
            },
            ..ctx
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".to_string(),
            token_expiry_hours: 1,
        }
    }

    #[test]
    fn test_token_roundtrip_keeps_tenant() {
        let ctx = TenantContext {
            company_id: 7,
            user_id: 42,
            role: UserRole::Admin,
        };
        let token = issue_token(&ctx, &auth()).unwrap();
        assert_eq!(verify_token(&token, "test-secret").unwrap(), ctx);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let ctx = TenantContext {
            company_id: 1,
            user_id: 1,
            role: UserRole::User,
        };
        let token = issue_token(&ctx, &auth()).unwrap();
        assert!(matches!(
            verify_token(&token, "other-secret"),
            Err(AppError::AuthError(_))
        ));
    }

    #[test]
    fn test_require_admin() {
        let mut ctx = TenantContext {
            company_id: 1,
            user_id: 1,
            role: UserRole::User,
        };
        assert!(matches!(ctx.require_admin(), Err(AppError::Forbidden(_))));
        ctx.role = UserRole::Admin;
        assert!(ctx.require_admin().is_ok());
    }
}

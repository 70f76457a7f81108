//! 调用方身份
//!
//! 认证由上游网关完成，网关通过请求头传入用户ID和角色。

use axum::{extract::FromRequestParts, http::request::Parts};
use marketplace_domain::entities::UserRole;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub role: UserRole,
}

impl AuthenticatedUser {
    /// 角色等级：user < employee < admin
    pub fn require_role(&self, required: UserRole) -> Result<(), ApiError> {
        if self.role.satisfies(required) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = %self.id,
                role = self.role.as_str(),
                required = required.as_str(),
                "权限不足"
            );
            Err(ApiError::Forbidden)
        }
    }

    fn header<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, ApiError> {
        parts
            .headers
            .get(name)
            .ok_or_else(|| ApiError::Unauthorized(format!("Missing {name} header")))?
            .to_str()
            .map_err(|_| ApiError::Unauthorized(format!("Invalid {name} header")))
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = Uuid::parse_str(Self::header(parts, USER_ID_HEADER)?.trim())
            .map_err(|_| ApiError::Unauthorized("Invalid user id".to_string()))?;
        let role = UserRole::from_str(Self::header(parts, USER_ROLE_HEADER)?.trim())
            .map_err(|_| ApiError::Unauthorized("Invalid user role".to_string()))?;
        Ok(Self { id, role })
    }
}

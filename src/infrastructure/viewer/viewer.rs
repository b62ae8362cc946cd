// ViewerContext - the acting user for one request
//
// Identity is supplied by the upstream auth layer and trusted as-is; this type
// only enforces the capability flags it was given.

use crate::core::VoterId;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerContext {
    pub request_id: String,
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub is_verified_member: bool,
    pub is_admin: bool,
}

impl ViewerContext {
    pub fn anonymous(request_id: String) -> Self {
        Self {
            request_id,
            user_id: None,
            username: None,
            is_verified_member: false,
            is_admin: false,
        }
    }

    pub fn authenticated_user(user_id: String, username: Option<String>, request_id: String) -> Self {
        Self {
            request_id,
            user_id: Some(user_id),
            username,
            is_verified_member: false,
            is_admin: false,
        }
    }

    pub fn verified(mut self, is_verified_member: bool) -> Self {
        self.is_verified_member = is_verified_member;
        self
    }

    pub fn admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Acting user id, or Unauthorized for anonymous requests.
    pub fn require_user(&self) -> AppResult<&str> {
        self.user_id
            .as_deref()
            .ok_or_else(|| AppError::Unauthorized("sign in required".to_string()))
    }

    pub fn voter(&self) -> AppResult<VoterId> {
        self.require_user().map(VoterId::new)
    }

    /// Name stored on content the viewer writes. Falls back to the user id.
    pub fn display_name(&self) -> String {
        match (&self.username, &self.user_id) {
            (Some(name), _) if !name.trim().is_empty() => name.clone(),
            (_, Some(id)) => id.clone(),
            _ => String::new(),
        }
    }

    pub fn require_verified_member(&self) -> AppResult<&str> {
        let user_id = self.require_user()?;
        if !self.is_verified_member {
            return Err(AppError::Forbidden(
                "only verified members can do this".to_string(),
            ));
        }
        Ok(user_id)
    }

    pub fn require_admin(&self) -> AppResult<&str> {
        let user_id = self.require_user()?;
        if !self.is_admin {
            return Err(AppError::Forbidden("admin access required".to_string()));
        }
        Ok(user_id)
    }

    pub fn require_owner_or_admin(&self, owner_id: &str) -> AppResult<()> {
        let user_id = self.require_user()?;
        if self.is_admin || user_id == owner_id {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "only the author or an admin can do this".to_string(),
            ))
        }
    }
}

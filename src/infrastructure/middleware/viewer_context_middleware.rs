// ViewerContext Middleware - builds the request's ViewerContext from trusted
// upstream identity headers and injects it into request extensions

use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::infrastructure::viewer::ViewerContext;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const VERIFIED_MEMBER_HEADER: &str = "x-verified-member";
pub const ADMIN_HEADER: &str = "x-admin";

/// Identity as asserted by the auth layer in front of this service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthInfo {
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub is_verified_member: bool,
    pub is_admin: bool,
}

pub async fn viewer_context_middleware(
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_info = extract_auth_from_request(request.headers())?;
    let viewer_context = create_viewer_context(auth_info);

    request.extensions_mut().insert(viewer_context);
    Ok(next.run(request).await)
}

/// Read identity headers. A header that is not valid text is a bad request.
fn extract_auth_from_request(headers: &HeaderMap) -> Result<AuthInfo, StatusCode> {
    let text = |name: &str| -> Result<Option<String>, StatusCode> {
        match headers.get(name) {
            Some(value) => {
                let value = value.to_str().map_err(|_| StatusCode::BAD_REQUEST)?.trim();
                Ok((!value.is_empty()).then(|| value.to_string()))
            }
            None => Ok(None),
        }
    };
    let flag = |name: &str| -> Result<bool, StatusCode> {
        Ok(matches!(
            text(name)?.map(|v| v.to_ascii_lowercase()).as_deref(),
            Some("true" | "1" | "yes")
        ))
    };

    let user_id = text(USER_ID_HEADER)?;
    if user_id.is_none() {
        return Ok(AuthInfo::default());
    }

    Ok(AuthInfo {
        user_id,
        username: text(USER_NAME_HEADER)?,
        is_verified_member: flag(VERIFIED_MEMBER_HEADER)?,
        is_admin: flag(ADMIN_HEADER)?,
    })
}

fn create_viewer_context(auth_info: AuthInfo) -> Arc<ViewerContext> {
    let request_id = format!("req-{}", Uuid::new_v4());

    let viewer_context = match auth_info.user_id {
        Some(user_id) => ViewerContext::authenticated_user(user_id, auth_info.username, request_id)
            .verified(auth_info.is_verified_member)
            .admin(auth_info.is_admin),
        None => ViewerContext::anonymous(request_id),
    };

    Arc::new(viewer_context)
}

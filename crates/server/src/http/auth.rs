use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use db::models::admin::Admin;

use crate::{AppState, error::ApiError};

fn parse_authorization_bearer(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    let (prefix, rest) = trimmed.split_once(' ')?;
    if !prefix.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

/// Guards the admin surface. The bearer token must map to an issued login
/// token whose admin row still exists.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_authorization_bearer)
        .ok_or(ApiError::Unauthorized)?;

    let admin_id = state
        .admin_tokens()
        .verify(token)
        .ok_or(ApiError::Unauthorized)?;
    let admin = Admin::find_by_uuid(&state.db().conn, admin_id)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    request.extensions_mut().insert(admin);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::parse_authorization_bearer;

    #[test]
    fn bearer_parsing_is_case_insensitive_and_trimmed() {
        assert_eq!(parse_authorization_bearer("Bearer abc"), Some("abc"));
        assert_eq!(parse_authorization_bearer("  bearer   abc  "), Some("abc"));
        assert_eq!(parse_authorization_bearer("BEARER abc"), Some("abc"));
        assert_eq!(parse_authorization_bearer("Basic abc"), None);
        assert_eq!(parse_authorization_bearer("Bearer "), None);
        assert_eq!(parse_authorization_bearer("abc"), None);
    }
}

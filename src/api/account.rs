//! Account mutation endpoints
//!
//! `PUT /account/change/{field}` for firstname, lastname, email, username
//! and password. The field name is part of the path contract; anything
//! else is a 400 before any work happens.

use axum::{
    extract::{Path, State},
    routing::put,
    Router,
};
use serde::Deserialize;
use tracing::debug;

use crate::api::auth::UserResponse;
use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};

/// Create the account router
pub fn create_account_router() -> Router<AppState> {
    Router::new().route("/change/{field}", put(change_account_field))
}

/// Body for the change endpoint.
///
/// `value` carries the new value for every field except password, which
/// uses the credential pair instead.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeAccountRequest {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub current_password: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

/// PUT /account/change/{field}
pub async fn change_account_field(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(field): Path<String>,
    Json(request): Json<ChangeAccountRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    debug!(field = %field, user_id = %user.id(), "Changing account field");

    let updated = match field.as_str() {
        "firstname" => {
            let value = require_value(&request, "firstname")?;
            state.accounts.change_first_name(user.id(), &value).await
        }
        "lastname" => {
            let value = require_value(&request, "lastname")?;
            state.accounts.change_last_name(user.id(), &value).await
        }
        "email" => {
            let value = require_value(&request, "email")?;
            state.accounts.change_email(user.id(), &value).await
        }
        "username" => {
            let value = require_value(&request, "username")?;
            state.accounts.change_username(user.id(), &value).await
        }
        "password" => {
            let current = request.current_password.as_deref().ok_or_else(|| {
                ApiError::bad_request("Missing 'current_password' in request body")
            })?;
            let new = request
                .new_password
                .as_deref()
                .ok_or_else(|| ApiError::bad_request("Missing 'new_password' in request body"))?;
            state.accounts.change_password(user.id(), current, new).await
        }
        other => {
            return Err(ApiError::bad_request(format!(
                "Unsupported account field '{}'",
                other
            )));
        }
    }
    .map_err(ApiError::from)?;

    Ok(Json(UserResponse::from(&updated)))
}

fn require_value(request: &ChangeAccountRequest, field: &str) -> Result<String, ApiError> {
    request
        .value
        .clone()
        .ok_or_else(|| ApiError::bad_request(format!("Missing 'value' for field '{}'", field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_request_value_only() {
        let json = r#"{"value": "new@example.com"}"#;

        let request: ChangeAccountRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.value.as_deref(), Some("new@example.com"));
        assert!(request.current_password.is_none());
    }

    #[test]
    fn test_change_request_password_pair() {
        let json = r#"{"current_password": "old", "new_password": "new_password123"}"#;

        let request: ChangeAccountRequest = serde_json::from_str(json).unwrap();
        assert!(request.value.is_none());
        assert_eq!(request.current_password.as_deref(), Some("old"));
        assert_eq!(request.new_password.as_deref(), Some("new_password123"));
    }

    #[test]
    fn test_require_value_missing() {
        let request = ChangeAccountRequest {
            value: None,
            current_password: None,
            new_password: None,
        };

        assert!(require_value(&request, "email").is_err());
    }
}

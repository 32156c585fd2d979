//! `POST /api/authenticate`

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::EndpointContext;
use crate::http::error::ApiError;
use crate::identity::{SignInResult, TokenService, UserManager};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateResponse {
    pub result: bool,
    pub token: String,
    pub username: String,
    pub is_locked_out: bool,
    pub is_not_allowed: bool,
    pub requires_two_factor: bool,
}

/// Failed sign-ins are a normal response with `result: false`.
pub async fn authenticate(ctx: EndpointContext) -> Result<Response, ApiError> {
    let request: AuthenticateRequest = ctx.json()?;
    let users = ctx.get::<UserManager>()?;
    let tokens = ctx.get::<TokenService>()?;

    let mut response = AuthenticateResponse {
        username: request.username.clone(),
        ..AuthenticateResponse::default()
    };

    match users.sign_in(&request.username, &request.password).await? {
        SignInResult::Succeeded => {
            let roles = users.roles_for(&request.username).await?;
            response.token = tokens
                .issue(&request.username, roles)
                .map_err(|err| ApiError::internal_from("failed to issue token", err))?;
            response.result = true;
        }
        SignInResult::LockedOut => response.is_locked_out = true,
        SignInResult::Failed => {
            tracing::info!(user = %request.username, "Sign-in failed");
        }
    }

    Ok(Json(response).into_response())
}

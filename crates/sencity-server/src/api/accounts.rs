use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::auth::{hash_password, hash_secret, issue_token, verify_password};
use crate::middleware::{CurrentUser, RequestId};

use super::{map_db_error, ApiError, ApiResponse, AppState};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub(super) struct SignUpRequest {
    pub username: String,
    pub mail: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct SignInRequest {
    pub mail: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub(super) struct TokenData {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ProfileData {
    pub username: String,
    pub mail: String,
}

/// `local@domain.tld` with a non-empty local part and non-empty domain labels.
fn is_plausible_mail(mail: &str) -> bool {
    let Some((local, domain)) = mail.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !mail.contains(char::is_whitespace)
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

fn validate_sign_up(body: &SignUpRequest) -> Result<(), &'static str> {
    if body.username.trim().is_empty() {
        return Err("username must not be empty");
    }
    let mail = body.mail.trim();
    if !is_plausible_mail(mail) {
        return Err("mail must be a valid address");
    }
    if body.password.chars().count() < MIN_PASSWORD_LEN {
        return Err("password must be at least 8 characters");
    }
    Ok(())
}

/// Issues a fresh token for `user_id` and stores its hash.
async fn grant_token(state: &AppState, req_id: &str, user_id: i64) -> Result<String, ApiError> {
    let token = issue_token();
    sencity_db::insert_api_token(&state.pool, user_id, &hash_secret(&state.auth_salt, &token))
        .await
        .map_err(|e| map_db_error(req_id.to_string(), &e))?;
    Ok(token)
}

pub(super) async fn sign_up(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TokenData>>), ApiError> {
    if let Err(message) = validate_sign_up(&body) {
        return Err(ApiError::new(req_id.0, "validation_error", message));
    }

    let password = body.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| e.to_string())
        .and_then(|hashed| hashed.map_err(|e| e.to_string()))
        .map_err(|e| {
            tracing::error!(request_id = %req_id.0, error = %e, "password hashing failed");
            ApiError::new(req_id.0.clone(), "internal_error", "password hashing failed")
        })?;
    let user = sencity_db::create_user(
        &state.pool,
        body.username.trim(),
        body.mail.trim(),
        &password_hash,
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let token = grant_token(&state, &req_id.0, user.id).await?;
    tracing::info!(user_id = user.id, "account created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(req_id.0, TokenData { token })),
    ))
}

pub(super) async fn sign_in(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<SignInRequest>,
) -> Result<Json<ApiResponse<TokenData>>, ApiError> {
    let user = sencity_db::find_user_by_mail(&state.pool, body.mail.trim())
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let matched = match user {
        Some(user) => {
            let password = body.password;
            let stored = user.password_hash.clone();
            tokio::task::spawn_blocking(move || verify_password(&password, &stored))
                .await
                .unwrap_or(false)
                .then_some(user)
        }
        None => None,
    };
    let Some(user) = matched else {
        return Err(ApiError::new(
            req_id.0,
            "unauthorized",
            "invalid mail or password",
        ));
    };

    let token = grant_token(&state, &req_id.0, user.id).await?;
    Ok(Json(ApiResponse::new(req_id.0, TokenData { token })))
}

pub(super) async fn profile(
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
) -> Json<ApiResponse<ProfileData>> {
    Json(ApiResponse::new(
        req_id.0,
        ProfileData {
            username: user.username,
            mail: user.mail,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, mail: &str, password: &str) -> SignUpRequest {
        SignUpRequest {
            username: username.to_string(),
            mail: mail.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn validate_sign_up_accepts_well_formed_input() {
        assert!(validate_sign_up(&request("ada", "ada@example.org", "correct horse")).is_ok());
    }

    #[test]
    fn validate_sign_up_rejects_blank_username() {
        assert_eq!(
            validate_sign_up(&request("  ", "ada@example.org", "correct horse")),
            Err("username must not be empty")
        );
    }

    #[test]
    fn validate_sign_up_rejects_mail_without_domain() {
        for mail in [
            "ada",
            "ada@",
            "@example.org",
            "ada@localhost",
            "a@b.",
            "a@.com",
            "a@b..com",
            "a b@example.org",
            "ada@example@org",
        ] {
            assert!(
                validate_sign_up(&request("ada", mail, "correct horse")).is_err(),
                "{mail} should be rejected"
            );
        }
    }

    #[test]
    fn validate_sign_up_accepts_subdomains_and_plus_tags() {
        for mail in ["ada+maps@mail.example.org", "a@b.co"] {
            assert!(
                validate_sign_up(&request("ada", mail, "correct horse")).is_ok(),
                "{mail} should be accepted"
            );
        }
    }

    #[test]
    fn validate_sign_up_rejects_short_password() {
        assert!(validate_sign_up(&request("ada", "ada@example.org", "short")).is_err());
    }
}

use actix_web::{http, web, Either, HttpRequest, HttpResponse};
use bcrypt::{hash, verify};
use log::{info, warn};
use serde_json::json;

use crate::app_state::AppState;
use crate::error::{ApiError, StoreError};
use crate::models::Credentials;
use crate::session::SESSION_COOKIE;

pub const HOME_PAGE: &str = "/html/index.html";
/// Where a failed form login lands, so the page can show the message.
pub const LOGIN_FAILED_PAGE: &str = "/html/login.html?error=invalid";

/// `/register` and `/login` accept JSON as well as a plain HTML form post.
type CredentialsBody = Either<web::Json<Credentials>, web::Form<Credentials>>;

fn into_credentials(body: CredentialsBody) -> Credentials {
    match body {
        Either::Left(json) => json.into_inner(),
        Either::Right(form) => form.into_inner(),
    }
}

/// bcrypt is deliberately slow, so it runs on the blocking pool.
async fn hash_password(password: String, cost: u32) -> Result<String, StoreError> {
    web::block(move || hash(password, cost))
        .await
        .map_err(|e| StoreError::Blocking(e.to_string()))?
        .map_err(StoreError::from)
}

async fn verify_password(password: String, password_hash: String) -> Result<bool, StoreError> {
    web::block(move || verify(password, &password_hash))
        .await
        .map_err(|e| StoreError::Blocking(e.to_string()))?
        .map_err(StoreError::from)
}

/// POST /register
/// Creates the account and signs the new user in.
pub async fn register(
    data: web::Data<AppState>,
    body: CredentialsBody,
) -> Result<HttpResponse, ApiError> {
    let credentials = into_credentials(body);
    let (username, password) = credentials
        .normalized()
        .ok_or(ApiError::MissingCredentials)?;

    let existing = data
        .users
        .find_by_username(&username)
        .await
        .map_err(ApiError::storage("Server, register error"))?;
    if existing.is_some() {
        return Err(ApiError::UsernameTaken);
    }

    let password_hash = hash_password(password.to_string(), data.config.bcrypt_cost)
        .await
        .map_err(ApiError::storage("Server, register error"))?;

    // A concurrent registration can still win the race; the unique index reports it.
    let user = match data.users.insert(&username, &password_hash).await {
        Ok(user) => user,
        Err(StoreError::Duplicate) => return Err(ApiError::UsernameTaken),
        Err(e) => return Err(ApiError::storage("Server, register error")(e)),
    };

    let (_, token) = data
        .sessions
        .start(&user.id)
        .await
        .map_err(ApiError::storage("Server, register error"))?;
    info!("User registered: {}", user.username);

    Ok(HttpResponse::Created()
        .cookie(data.sessions.cookie(token))
        .json(json!({ "message": "User registered", "userId": user.id })))
}

/// POST /login
/// Redirects to the task page with a fresh session cookie. A rejected form
/// post goes back to the login page; JSON clients get 401.
pub async fn login(
    data: web::Data<AppState>,
    body: CredentialsBody,
) -> Result<HttpResponse, ApiError> {
    let from_form = matches!(body, Either::Right(_));
    match check_login(&data, into_credentials(body)).await {
        Err(ApiError::InvalidCredentials) if from_form => {
            Ok(HttpResponse::SeeOther()
                .insert_header((http::header::LOCATION, LOGIN_FAILED_PAGE))
                .finish())
        }
        result => result,
    }
}

async fn check_login(
    data: &web::Data<AppState>,
    credentials: Credentials,
) -> Result<HttpResponse, ApiError> {
    let Some((username, password)) = credentials.normalized() else {
        return Err(ApiError::InvalidCredentials);
    };

    let user = data
        .users
        .find_by_username(&username)
        .await
        .map_err(ApiError::storage("Server, login error"))?;
    let Some(user) = user else {
        warn!("Login attempt for unknown user {}", username);
        return Err(ApiError::InvalidCredentials);
    };

    let ok = verify_password(password.to_string(), user.password_hash.clone())
        .await
        .map_err(ApiError::storage("Server, login error"))?;
    if !ok {
        warn!("Wrong password for {}", username);
        return Err(ApiError::InvalidCredentials);
    }

    let (_, token) = data
        .sessions
        .start(&user.id)
        .await
        .map_err(ApiError::storage("Server, login error"))?;
    info!("User logged in: {}", user.username);

    Ok(HttpResponse::SeeOther()
        .cookie(data.sessions.cookie(token))
        .insert_header((http::header::LOCATION, HOME_PAGE))
        .finish())
}

/// POST /logout
/// Always clears the cookie, even when the session was already gone.
pub async fn logout(req: HttpRequest, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        data.sessions
            .end(cookie.value())
            .await
            .map_err(ApiError::storage("Logout failed"))?;
    }
    Ok(HttpResponse::Ok()
        .cookie(data.sessions.removal_cookie())
        .json(json!({ "message": "User logged out" })))
}

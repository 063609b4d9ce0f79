use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use actix_web::{
    body::{BoxBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http, web, Error, HttpMessage, HttpRequest, HttpResponse, ResponseError,
};
use futures::future::{ok, Ready};
use log::debug;

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::session::SESSION_COOKIE;

pub const LOGIN_PAGE: &str = "/html/login.html";

/// Id of the authenticated user, placed in request extensions by `RequireSession`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

/// Gate for task routes: requests without a live session are turned away
/// before they reach a handler. A no-op when auth is disabled.
#[derive(Debug)]
pub struct RequireSession;

impl<S, B> Transform<S, ServiceRequest> for RequireSession
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = RequireSessionMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequireSessionMiddleware {
            service: Rc::new(service),
        })
    }
}

pub struct RequireSessionMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireSessionMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let state = req.app_data::<web::Data<AppState>>().cloned();
            let Some(state) = state.filter(|s| s.config.auth_enabled) else {
                let res = service.call(req).await?;
                return Ok(res.map_into_boxed_body());
            };

            let token = req.cookie(SESSION_COOKIE).map(|c| c.value().to_string());
            let session = match token {
                Some(token) => state.sessions.resolve(&token).await,
                None => Ok(None),
            };

            match session {
                Ok(Some(session)) => {
                    req.extensions_mut().insert(CurrentUser(session.user_id));
                    let res = service.call(req).await?;
                    Ok(res.map_into_boxed_body())
                }
                Ok(None) => {
                    debug!("No session for {} {}", req.method(), req.path());
                    let (req_parts, _payload) = req.into_parts();
                    let resp = reject(&req_parts);
                    Ok(ServiceResponse::new(req_parts, resp))
                }
                Err(e) => {
                    let (req_parts, _payload) = req.into_parts();
                    let resp = ApiError::storage("Failed to load session")(e).error_response();
                    Ok(ServiceResponse::new(req_parts, resp))
                }
            }
        })
    }
}

/// JSON clients get a 401; browsers are sent to the login page.
fn reject(req: &HttpRequest) -> HttpResponse {
    if wants_json(req) {
        ApiError::Unauthorized.error_response()
    } else {
        HttpResponse::Found()
            .insert_header((http::header::LOCATION, LOGIN_PAGE))
            .finish()
    }
}

pub fn wants_json(req: &HttpRequest) -> bool {
    req.headers()
        .get(http::header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |accept| accept.contains("application/json"))
}

/// The owner every task query is scoped to. `None` only when auth is off.
pub fn owner_scope(req: &HttpRequest, state: &AppState) -> Result<Option<String>, ApiError> {
    if !state.config.auth_enabled {
        return Ok(None);
    }
    req.extensions()
        .get::<CurrentUser>()
        .map(|user| Some(user.0.clone()))
        .ok_or(ApiError::Unauthorized)
}

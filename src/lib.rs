pub mod app_state;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod frontend;
pub mod middleware;
pub mod models;
pub mod session;
pub mod store;
pub mod tasks;
pub mod view;

use actix_web::{error::InternalError, web, HttpResponse};
use serde_json::json;

pub use crate::app_state::AppState;
use crate::auth::{login, logout, register};
use crate::middleware::RequireSession;
use crate::tasks::{
    complete_task, create_completed, create_task, delete_completed, delete_task, list_completed,
    list_tasks, update_task,
};
use crate::view::{completed_fragment, pending_fragment};

/// Malformed JSON bodies get the same `{error}` shape as every other failure.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = format!("Invalid JSON body: {}", err);
        InternalError::from_response(err, HttpResponse::BadRequest().json(json!({ "error": message })))
            .into()
    })
}

/// Registers every route. Expects `web::Data<AppState>` to be provided by the caller.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/register", web::post().to(register))
        .route("/login", web::post().to(login))
        .route("/logout", web::post().to(logout))
        // Specific paths first: `/{id}` would otherwise swallow `completed` and `fragment`.
        .service(
            web::scope("/tasks")
                .wrap(RequireSession)
                .route("", web::get().to(list_tasks))
                .route("", web::post().to(create_task))
                .route("/fragment", web::get().to(pending_fragment))
                .route("/completed", web::get().to(list_completed))
                .route("/completed", web::post().to(create_completed))
                .route("/completed/fragment", web::get().to(completed_fragment))
                .route("/completed/{id}", web::delete().to(delete_completed))
                .route("/{id}", web::put().to(update_task))
                .route("/{id}", web::delete().to(delete_task))
                .route("/{id}/complete", web::post().to(complete_task)),
        );
    frontend::configure(cfg);
}

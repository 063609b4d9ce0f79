#![allow(dead_code)]

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use tasker::config::Config;
use tasker::session::SESSION_COOKIE;

/// Builds the full application over the in-memory store.
#[macro_export]
macro_rules! test_app {
    ($config:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new(tasker::AppState::in_memory($config)))
                .configure(tasker::configure),
        )
        .await
    };
}

pub fn open_config() -> Config {
    Config {
        auth_enabled: false,
        ..Config::default()
    }
}

pub fn auth_config() -> Config {
    Config {
        auth_enabled: true,
        bcrypt_cost: 4,
        session_secret: "test-secret".to_string(),
        ..Config::default()
    }
}

pub fn session_cookie<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.into_owned())
}

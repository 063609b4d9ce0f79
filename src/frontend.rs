//! The browser client, compiled into the binary.

use actix_web::{http, web, HttpResponse};

use crate::auth::HOME_PAGE;

const INDEX_HTML: &str = include_str!("../front_end/html/index.html");
const LOGIN_HTML: &str = include_str!("../front_end/html/login.html");
const REGISTER_HTML: &str = include_str!("../front_end/html/register.html");
const SCRIPT_JS: &str = include_str!("../front_end/js/script.js");
const STYLE_CSS: &str = include_str!("../front_end/css/style.css");

fn asset(content_type: &'static str, body: &'static str) -> HttpResponse {
    HttpResponse::Ok().content_type(content_type).body(body)
}

pub async fn root() -> HttpResponse {
    HttpResponse::Found()
        .insert_header((http::header::LOCATION, HOME_PAGE))
        .finish()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(root))
        .route(
            "/html/index.html",
            web::get().to(|| async { asset("text/html; charset=utf-8", INDEX_HTML) }),
        )
        .route(
            "/html/login.html",
            web::get().to(|| async { asset("text/html; charset=utf-8", LOGIN_HTML) }),
        )
        .route(
            "/html/register.html",
            web::get().to(|| async { asset("text/html; charset=utf-8", REGISTER_HTML) }),
        )
        .route(
            "/js/script.js",
            web::get().to(|| async { asset("application/javascript; charset=utf-8", SCRIPT_JS) }),
        )
        .route(
            "/css/style.css",
            web::get().to(|| async { asset("text/css; charset=utf-8", STYLE_CSS) }),
        );
}

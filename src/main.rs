// src/main.rs

use actix_cors::Cors;
use actix_web::{http, middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::{error, info};

use tasker::config::{Config, StoreKind};
use tasker::db::MongoDB;
use tasker::store::mongo::ensure_indexes;
use tasker::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let (state, mongodb) = match config.store {
        StoreKind::Mongo => {
            let mongodb = match MongoDB::init(&config.mongo_uri, &config.database_name).await {
                Ok(mongodb) => mongodb,
                Err(e) => {
                    error!("MongoDB connection error: {}", e);
                    std::process::exit(1);
                }
            };
            if let Err(e) = ensure_indexes(&mongodb.db).await {
                error!("Could not create MongoDB indexes: {}", e);
                std::process::exit(1);
            }
            info!("Connected to MongoDB ({} database)", config.database_name);
            (AppState::with_mongo(&mongodb, config.clone()), Some(mongodb))
        }
        StoreKind::Memory => {
            info!("Using the in-memory store; data is lost on exit");
            (AppState::in_memory(config.clone()), None)
        }
    };

    let state = web::Data::new(state);
    let frontend_origin = config.frontend_origin.clone();

    info!("Server running at http://0.0.0.0:{}", config.port);
    info!("Allowed CORS Origin: {}", frontend_origin);
    if !config.auth_enabled {
        info!("Authentication disabled; tasks are shared by every client");
    }

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![http::header::CONTENT_TYPE, http::header::ACCEPT])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(state.clone())
            .configure(tasker::configure)
    })
    .bind(("0.0.0.0", config.port))?
    .run()
    .await?;

    if let Some(mongodb) = mongodb {
        mongodb.shutdown().await;
        info!("MongoDB client shut down");
    }
    Ok(())
}

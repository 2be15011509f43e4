// src/main.rs

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http, middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::{error, info};

use contentflow::auth::Authentication;
use contentflow::config::{Config, StorageBackend};
use contentflow::storage::{MemoryStorage, MongoStorage, Storage};
use contentflow::{configure, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| {
        error!("{}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let storage: Arc<dyn Storage> = match config.storage_backend {
        StorageBackend::Mongo => {
            let uri = config.mongo_uri.as_deref().unwrap_or_default();
            let mongo = MongoStorage::init(uri, &config.database_name).await.map_err(|e| {
                error!("{}", e);
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e.to_string())
            })?;
            Arc::new(mongo)
        }
        StorageBackend::Memory => Arc::new(MemoryStorage::with_sample_data()),
    };

    let state = AppState::new(storage, config.clone());
    let frontend_origin = config.frontend_origin.clone();
    let jwt_secret = config.jwt_secret.clone();

    info!("Server running at http://{}", config.bind_addr);
    info!("Allowed CORS Origin: {}", frontend_origin);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                http::header::CONTENT_TYPE,
                http::header::ACCEPT,
                http::header::AUTHORIZATION,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(Authentication::new(jwt_secret.clone()))
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(configure)
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}

// src/main.rs
use actix_web::{App, HttpServer, middleware, web};
use cropdoctor::services::vision::VisionService;
use cropdoctor::{AppState, configure_routes};
use log::info;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting cropdoctor service...");

    let api_key = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY must be set");
    let api_base = std::env::var("OPENAI_API_BASE").ok();

    let app_state = AppState::new(Arc::new(VisionService::new(api_key, api_base)));

    info!("Starting HTTP server on 0.0.0.0:8080");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .configure(configure_routes)
            .service(actix_files::Files::new("/", "./static").index_file("index.html"))
    })
    .bind("0.0.0.0:8080")?
    .run()
    .await
}

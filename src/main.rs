use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::io;
use storefront_api::{config::Config, configure, db::Database, logging, AppState};
use tracing::info;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    logging::init();

    let config = Config::from_env().map_err(io::Error::other)?;

    let db = match &config.data_dir {
        Some(dir) => Database::open(dir).await.map_err(io::Error::other)?,
        None => Database::in_memory(),
    };

    if let Some((username, password)) = &config.bootstrap_admin {
        db.seed_admin(username, password)
            .await
            .map_err(|e| io::Error::other(e.to_string()))?;
    }

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let state = web::Data::new(AppState::new(db, &config));
    let addr = config.bind_addr();
    info!(%addr, "listening");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(configure)
    })
    .bind(addr)?
    .run()
    .await
}

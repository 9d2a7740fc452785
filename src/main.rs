use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;

use tasks_gateway::{routes, Backend, Config};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config =
        Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let backend = Backend::from_config(&config.backend)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    let backend = web::Data::new(backend);

    log::info!(
        "Starting server at {} ({} backend)",
        config.server_url(),
        backend.kind()
    );
    HttpServer::new(move || {
        App::new()
            .app_data(backend.clone())
            .wrap(routes::cors())
            .wrap(Logger::default())
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}

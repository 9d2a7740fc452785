pub mod auth;
pub mod health;
pub mod tasks;

use actix_cors::Cors;
use actix_web::{guard, http::header, web, HttpResponse};

use crate::auth::IdentityMiddleware;
use crate::error::AppError;

/// Answers any `OPTIONS` request that `cors()` did not already handle as a
/// preflight, without going through authentication.
async fn options() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

/// Registers every route. `/tasks` is wrapped in `IdentityMiddleware`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .service(
        web::resource("/{tail:.*}")
            .guard(guard::Options())
            .to(options),
    )
    .service(health::health)
    .service(auth::register)
    .service(auth::login)
    .service(
        web::scope("/tasks")
            .wrap(IdentityMiddleware)
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    );
}

/// CORS policy: any origin, the five methods the API uses, and the two
/// request headers clients send. Preflight requests are answered here.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .send_wildcard()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(3600)
}


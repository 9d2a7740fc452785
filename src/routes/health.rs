use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

use crate::backend::Backend;

/// Health check endpoint
///
/// Returns the configured backend kind and the current timestamp. Does not
/// contact the backend.
#[get("/health")]
pub async fn health(backend: web::Data<Backend>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "backend": backend.kind(),
        "timestamp": Utc::now()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use actix_web::test;
    use std::sync::Arc;

    #[actix_web::test]
    async fn test_health_endpoint() {
        let backend = Backend::memory(Arc::new(MemoryBackend::new("health")));
        let app = test::init_service(
            actix_web::App::new()
                .app_data(web::Data::new(backend))
                .service(health),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.status().is_success());

        let body = test::read_body(resp).await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["status"], "ok");
        assert_eq!(json["backend"], "memory");
        assert!(json["timestamp"].is_string());
    }
}

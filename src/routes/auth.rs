use crate::{
    auth::{LoginResponse, RegisterResponse},
    backend::{Backend, BackendError},
    error::AppError,
    models::Credentials,
};
use actix_web::{post, web, HttpResponse, Responder};

/// Register a new user
///
/// Forwards the credentials to the auth service's sign-up operation and
/// returns the created user's public profile. No token is issued here.
///
/// ## Responses:
/// - `200 OK`: `{"user": {...}}`
/// - `400 Bad Request`: the auth service refused the sign-up; its message is relayed.
/// - `500 Internal Server Error`: the auth service could not be reached.
#[post("/register")]
pub async fn register(
    backend: web::Data<Backend>,
    credentials: web::Json<Credentials>,
) -> Result<impl Responder, AppError> {
    let user = backend.auth.sign_up(&credentials).await?;

    Ok(HttpResponse::Ok().json(RegisterResponse { user }))
}

/// Login user
///
/// Forwards the credentials to the auth service's password sign-in and
/// returns its access token together with the user's public profile.
///
/// ## Responses:
/// - `200 OK`: `{"token": "...", "user": {...}}`
/// - `401 Unauthorized`: bad credentials; the auth service's message is relayed.
/// - `500 Internal Server Error`: the auth service could not be reached.
#[post("/login")]
pub async fn login(
    backend: web::Data<Backend>,
    credentials: web::Json<Credentials>,
) -> Result<impl Responder, AppError> {
    let session = backend
        .auth
        .sign_in_with_password(&credentials)
        .await
        .map_err(|err| match err {
            BackendError::Rejected { message, .. } => AppError::Unauthorized(message),
            other => AppError::from(other),
        })?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        token: session.access_token,
        user: session.user,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::json;
    use std::sync::Arc;

    fn backend() -> web::Data<Backend> {
        web::Data::new(Backend::memory(Arc::new(MemoryBackend::with_hash_cost(
            "routes-auth",
            4,
        ))))
    }

    #[actix_rt::test]
    async fn test_register_relays_service_rejection() {
        let app = test::init_service(App::new().app_data(backend()).service(register)).await;

        let req = test::TestRequest::post()
            .uri("/register")
            .set_json(json!({
                "email": "test@example.com",
                "password": "short"
            }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Password should be at least 6 characters.");
    }

    #[actix_rt::test]
    async fn test_login_bad_credentials_is_unauthorized() {
        let app = test::init_service(App::new().app_data(backend()).service(login)).await;

        let req = test::TestRequest::post()
            .uri("/login")
            .set_json(json!({
                "email": "nobody@example.com",
                "password": "password123"
            }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid login credentials");
    }
}

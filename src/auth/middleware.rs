use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderValue, AUTHORIZATION},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;

use crate::auth::extractors::RequestContext;
use crate::auth::token::{bearer_token, AccessToken};
use crate::backend::{Backend, BackendError};
use crate::error::AppError;
use crate::models::Identity;

pub const TOKEN_REQUIRED: &str = "token required";
pub const INVALID_TOKEN: &str = "invalid token";
pub const AUTHENTICATION_FAILED: &str = "internal authentication error";

/// Resolves the caller behind an `Authorization` header.
///
/// On success the returned context holds the caller's identity and a task
/// store bound to their token. A missing or malformed header, or a token the
/// auth service does not accept, yields `Unauthorized`; failing to reach the
/// auth service yields `InternalServerError`.
pub async fn authenticate(
    backend: &Backend,
    header: Option<&HeaderValue>,
) -> Result<RequestContext, AppError> {
    let token = header
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .map(AccessToken::new)
        .ok_or_else(|| AppError::Unauthorized(TOKEN_REQUIRED.into()))?;

    match backend.auth.get_user(&token).await {
        Ok(Some(user)) => Ok(RequestContext {
            identity: Identity::from(&user),
            store: backend.scoped(token),
        }),
        Ok(None) => Err(AppError::Unauthorized(INVALID_TOKEN.into())),
        Err(BackendError::Rejected { status, message }) => {
            log::debug!("token rejected by auth service ({}): {}", status, message);
            Err(AppError::Unauthorized(INVALID_TOKEN.into()))
        }
        Err(err) => {
            log::error!("authentication failed: {}", err);
            Err(AppError::InternalServerError(AUTHENTICATION_FAILED.into()))
        }
    }
}

/// Gate for every task route.
///
/// Runs `authenticate` before the wrapped service and hands the resulting
/// `RequestContext` to the handler. Rejected requests never reach the handler.
pub struct IdentityMiddleware;

impl<S, B> Transform<S, ServiceRequest> for IdentityMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = IdentityMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct IdentityMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for IdentityMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let backend = match req.app_data::<web::Data<Backend>>().cloned() {
                Some(backend) => backend,
                None => {
                    log::error!("no backend registered in app data");
                    let err = AppError::InternalServerError(AUTHENTICATION_FAILED.into());
                    return Ok(req.error_response(err).map_into_right_body());
                }
            };

            let header = req.headers().get(AUTHORIZATION).cloned();
            match authenticate(&backend, header.as_ref()).await {
                Ok(context) => {
                    req.extensions_mut().insert(context);
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                Err(err) => Ok(req.error_response(err).map_into_right_body()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::models::Credentials;
    use std::sync::Arc;

    fn memory() -> (Arc<MemoryBackend>, Backend) {
        let memory = Arc::new(MemoryBackend::with_hash_cost("middleware-test", 4));
        (memory.clone(), Backend::memory(memory))
    }

    #[actix_rt::test]
    async fn test_missing_or_malformed_header() {
        let (_, backend) = memory();

        for header in [None, Some(HeaderValue::from_static("Bearer"))] {
            match authenticate(&backend, header.as_ref()).await {
                Err(AppError::Unauthorized(msg)) => assert_eq!(msg, TOKEN_REQUIRED),
                other => panic!("expected Unauthorized, got {:?}", other.map(|c| c.identity)),
            }
        }
    }

    #[actix_rt::test]
    async fn test_unknown_token() {
        let (_, backend) = memory();
        let header = HeaderValue::from_static("Bearer not-a-token");

        match authenticate(&backend, Some(&header)).await {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, INVALID_TOKEN),
            other => panic!("expected Unauthorized, got {:?}", other.map(|c| c.identity)),
        }
    }

    #[actix_rt::test]
    async fn test_valid_token_resolves_identity() {
        use crate::backend::AuthService;

        let (memory, backend) = memory();
        let credentials = Credentials {
            email: "a@x.com".into(),
            password: "pw123456".into(),
        };
        memory.sign_up(&credentials).await.unwrap();
        let session = memory.sign_in_with_password(&credentials).await.unwrap();

        let header = HeaderValue::from_str(&format!("Bearer {}", session.access_token)).unwrap();
        let context = authenticate(&backend, Some(&header)).await.unwrap();
        assert_eq!(context.identity.id, session.user.id);
        assert_eq!(context.identity.email.as_deref(), Some("a@x.com"));
    }
}

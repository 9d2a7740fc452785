use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::middleware::TOKEN_REQUIRED;
use crate::backend::ScopedStore;
use crate::error::AppError;
use crate::models::Identity;

/// Everything a task handler knows about its caller.
///
/// Produced by `IdentityMiddleware` and moved out of the request extensions by
/// this extractor, so each context is consumed by exactly one handler and is
/// dropped when that handler returns.
#[derive(Debug)]
pub struct RequestContext {
    pub identity: Identity,
    pub store: ScopedStore,
}

impl FromRequest for RequestContext {
    type Error = ActixError; // AppError will be converted into ActixError via ResponseError
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions_mut().remove::<RequestContext>() {
            Some(context) => ready(Ok(context)),
            None => {
                // Only reachable when a route is mounted outside `IdentityMiddleware`.
                log::warn!("no request context for {}", req.path());
                let err = AppError::Unauthorized(TOKEN_REQUIRED.into());
                ready(Err(err.into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::AccessToken;
    use crate::backend::{Backend, MemoryBackend};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use std::sync::Arc;
    use uuid::Uuid;

    #[actix_rt::test]
    async fn test_request_context_extractor_success() {
        let backend = Backend::memory(Arc::new(MemoryBackend::with_hash_cost("extractor", 4)));
        let identity = Identity {
            id: Uuid::new_v4(),
            email: None,
        };
        let req = test::TestRequest::default().to_http_request();
        req.extensions_mut().insert(RequestContext {
            identity: identity.clone(),
            store: backend.scoped(AccessToken::new("t")),
        });

        let mut payload = Payload::None;
        let context = RequestContext::from_request(&req, &mut payload).await.unwrap();
        assert_eq!(context.identity, identity);

        // The context was moved out; a second extraction finds nothing.
        let again = RequestContext::from_request(&req, &mut payload).await;
        assert!(again.is_err());
    }

    #[actix_rt::test]
    async fn test_request_context_extractor_failure() {
        let req = test::TestRequest::default().to_http_request();

        let mut payload = Payload::None;
        let result = RequestContext::from_request(&req, &mut payload).await;
        assert!(result.is_err());

        let response = result.unwrap_err().error_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

//! # Authentication Middleware Module
//!
//! Guards the account endpoints. The access token is read from the
//! `Authorization: Bearer` header or, for browser calls, from the
//! `sb-access-token` cookie. Valid tokens put their [`AuthClaims`] into the
//! request extensions so handlers can take `web::ReqData<AuthClaims>`.
//!
//! ## Usage
//! ```ignore
//! .service(
//!     web::scope("/dashboard")
//!         .wrap(api_auth::auth_middleware(config.clone()))
//!         .service(/* secured endpoints */)
//! )
//! ```

use std::{future::Future, pin::Pin, rc::Rc, sync::Arc};

use actix_web::{
    Error, HttpMessage, HttpResponse,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use common::jwt::{self, AuthClaims};
use futures::future::{Ready, ok};

pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";

/// Authentication middleware for securing API endpoints.
///
/// # Fields
/// * `jwt_secret` - HS256 secret shared with the identity provider
/// * `audience` - expected `aud` claim
pub struct AuthMiddleware {
    jwt_secret: Rc<String>,
    audience: Rc<String>,
}

impl AuthMiddleware {
    pub fn new(jwt_secret: String, audience: String) -> Self {
        AuthMiddleware {
            jwt_secret: Rc::new(jwt_secret),
            audience: Rc::new(audience),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService {
            service: Arc::new(service),
            jwt_secret: self.jwt_secret.clone(),
            audience: self.audience.clone(),
        })
    }
}

pub struct AuthMiddlewareService<S> {
    service: Arc<S>,
    jwt_secret: Rc<String>,
    audience: Rc<String>,
}

/// Bearer header first, then the session cookie.
fn extract_token(req: &ServiceRequest) -> Option<String> {
    let bearer = req
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    bearer.or_else(|| {
        req.cookie(ACCESS_TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
    })
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token_value = extract_token(&req);
        let jwt_secret = self.jwt_secret.clone();
        let audience = self.audience.clone();
        let srv = Arc::clone(&self.service);

        Box::pin(async move {
            let Some(token) = token_value else {
                // no token passed - 401
                let response = HttpResponse::Unauthorized()
                    .json(serde_json::json!({"error": "Unauthorized"}))
                    .map_into_boxed_body();
                return Ok(req.into_response(response));
            };

            match jwt::validate_jwt(&token, &jwt_secret, &audience) {
                Ok(claims) => {
                    req.extensions_mut().insert::<AuthClaims>(claims);
                    srv.call(req).await.map(|res| res.map_into_boxed_body())
                }
                Err(e) => {
                    log::debug!("Rejected access token: {}", e);
                    let response = HttpResponse::Unauthorized()
                        .json(serde_json::json!({"error": "Unauthorized"}))
                        .map_into_boxed_body();
                    Ok(req.into_response(response))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{
        App, HttpResponse, cookie::Cookie, get, http::StatusCode, test, web::ReqData,
    };
    use common::jwt::{ClaimsSpec, generate_jwt};

    use super::*;

    const SECRET: &str = "super-secret-jwt-token-with-at-least-32-characters";

    #[get("/whoami")]
    async fn whoami(claims: ReqData<AuthClaims>) -> HttpResponse {
        HttpResponse::Ok().body(claims.sub.clone())
    }

    fn token(audience: &str) -> String {
        generate_jwt(
            ClaimsSpec {
                user_id: "u1".to_string(),
                email: None,
            },
            SECRET,
            audience,
            1,
        )
        .unwrap()
    }

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .wrap(AuthMiddleware::new(
                        SECRET.to_string(),
                        "authenticated".to_string(),
                    ))
                    .service(whoami),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn bearer_token_reaches_handler() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("Authorization", format!("Bearer {}", token("authenticated"))))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "u1");
    }

    #[actix_web::test]
    async fn cookie_token_is_accepted() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/whoami")
            .cookie(Cookie::new(ACCESS_TOKEN_COOKIE, token("authenticated")))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn missing_or_foreign_token_is_401() {
        let app = app!();
        let req = test::TestRequest::get().uri("/whoami").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("Authorization", format!("Bearer {}", token("anon"))))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}

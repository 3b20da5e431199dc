use actix_web::HttpRequest;
use chrono::{SecondsFormat, Utc};
use log::{error, info, warn};

use crate::authn::Authenticator;
use crate::server::request::AuthRequest;
use crate::server::response::{self, Response};
use crate::token::claims::TOKEN_VALIDITY;
use crate::token::issuer::Issuer;
use crate::types::token::TokenResponse;

use super::Handler;

pub struct AuthHandler {
    authn: Box<dyn Authenticator>,
    issuer: Issuer,
    soft_deny: bool,
}

impl AuthHandler {
    pub fn new(authn: Box<dyn Authenticator>, issuer: Issuer, soft_deny: bool) -> Self {
        Self {
            authn,
            issuer,
            soft_deny,
        }
    }
}

impl Handler for AuthHandler {
    fn handle(&self, _path: &str, req: HttpRequest, body: Option<Vec<u8>>) -> Response {
        let auth_req = match AuthRequest::parse(&req, body) {
            Ok(auth_req) => auth_req,
            Err(e) => return Response::bad_request(format!("{e:#}")),
        };
        info!("Token request: {auth_req}");

        let now = Utc::now();
        let result = match self.authn.authenticate(&auth_req.user, &auth_req.password) {
            Some(principal) => self.issuer.issue(
                &principal,
                &auth_req.scopes,
                &auth_req.service,
                now.timestamp(),
            ),
            None if self.soft_deny => {
                warn!(
                    "User '{}' not authenticated, returning token without access",
                    auth_req.user
                );
                self.issuer
                    .issue_denied(&auth_req.scopes, &auth_req.service, now.timestamp())
            }
            None => {
                warn!("User '{}' not authenticated", auth_req.user);
                return Response::unauthenticated("invalid username or password");
            }
        };

        let issued = match result {
            Ok(issued) => issued,
            Err(e) => {
                error!("Failed to issue token for '{}': {e}", auth_req.user);
                return Response::error(response::TOKEN_ERROR);
            }
        };

        Response::json(TokenResponse {
            token: issued.token.clone(),
            access_token: issued.token,
            expires_in: TOKEN_VALIDITY,
            issued_at: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        })
    }
}

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;
    use actix_web::http::{header, StatusCode};
    use actix_web::test::TestRequest;
    use actix_web::HttpResponse;
    use base64::prelude::BASE64_URL_SAFE_NO_PAD;
    use base64::Engine;

    use crate::authn::config::AuthnConfig;
    use crate::authn::{new_test_user, StaticAuthenticator};
    use crate::authz::config::PolicyConfig;
    use crate::authz::rule::Rule;
    use crate::authz::Authorizer;
    use crate::config::CommonConfig;
    use crate::server::request::tests::basic_auth;
    use crate::token::claims::ClaimSet;
    use crate::token::signer::tests::new_test_rsa;
    use crate::types::response::CommonResponse;

    use super::*;

    fn new_test_handler(soft_deny: bool) -> AuthHandler {
        let mut authn_cfg = AuthnConfig::default();
        authn_cfg.users = vec![new_test_user("bob", "bob_pass", &["readers"])];
        let authn = StaticAuthenticator::new(&authn_cfg);

        let mut policy = PolicyConfig::default();
        policy.rules = vec![Rule::new("^org/", &["pull"]).with_group("readers")];
        let (signer, _) = new_test_rsa();
        let issuer = Issuer::new(
            "auth.test",
            false,
            Authorizer::new(&policy),
            Box::new(signer),
        );

        AuthHandler::new(Box::new(authn), issuer, soft_deny)
    }

    fn request(auth: Option<String>) -> HttpRequest {
        let mut req = TestRequest::with_uri(
            "/auth?service=registry.test&client_id=docker&scope=repository:org/app:pull,push",
        );
        if let Some(auth) = auth {
            req = req.insert_header((header::AUTHORIZATION, auth));
        }
        req.to_http_request()
    }

    async fn read_body<T: serde::de::DeserializeOwned>(resp: Response) -> T {
        let resp: HttpResponse = resp.into();
        let body = to_bytes(resp.into_body()).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn decode_claims(token: &str) -> ClaimSet {
        let payload = token.split('.').nth(1).unwrap();
        let payload = BASE64_URL_SAFE_NO_PAD.decode(payload).unwrap();
        serde_json::from_slice(&payload).unwrap()
    }

    #[actix_web::test]
    async fn test_issue() {
        let handler = new_test_handler(true);
        let req = request(Some(basic_auth("bob", "bob_pass")));

        let resp = handler.handle("", req, None);
        assert_eq!(resp.status(), StatusCode::OK);
        let body: TokenResponse = read_body(resp).await;
        assert_eq!(body.token, body.access_token);
        assert_eq!(body.expires_in, 900);
        assert!(body.issued_at.ends_with('Z'));

        let claims = decode_claims(&body.token);
        assert_eq!(claims.subject, "bob");
        assert_eq!(claims.audience, "registry.test");
        assert_eq!(claims.access.len(), 1);
        assert_eq!(
            claims.access[0].actions.iter().collect::<Vec<_>>(),
            vec!["pull"]
        );
    }

    #[actix_web::test]
    async fn test_soft_deny() {
        let handler = new_test_handler(true);
        let req = request(Some(basic_auth("bob", "wrong")));

        let resp = handler.handle("", req, None);
        assert_eq!(resp.status(), StatusCode::OK);
        let body: TokenResponse = read_body(resp).await;

        let claims = decode_claims(&body.token);
        assert_eq!(claims.subject, "");
        assert_eq!(claims.access.len(), 1);
        assert!(claims.access[0].actions.is_empty());
    }

    #[actix_web::test]
    async fn test_hard_deny() {
        let handler = new_test_handler(false);
        let req = request(Some(basic_auth("bob", "wrong")));

        let resp = handler.handle("", req, None);
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: CommonResponse = read_body(resp).await;
        assert_eq!(body.code, 401);
    }

    #[actix_web::test]
    async fn test_bad_request() {
        let handler = new_test_handler(true);

        let resp = handler.handle("", request(None), None);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: CommonResponse = read_body(resp).await;
        assert_eq!(body.code, 400);
        assert!(body.message.unwrap().starts_with("Bad request: "));
    }
}

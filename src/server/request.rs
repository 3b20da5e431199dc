use std::fmt;

use actix_web::http::header;
use actix_web::HttpRequest;
use anyhow::{bail, Context, Result};
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use log::debug;
use url::form_urlencoded;

use crate::scope::{parse_scopes, Scope};

/// A parsed token request.
pub struct AuthRequest {
    pub user: String,
    pub password: String,
    pub service: String,
    pub client_id: String,
    pub scopes: Vec<Scope>,
}

impl AuthRequest {
    /// Reads Basic credentials from the headers and the fields from the query
    /// string, plus the body for form posts. `scope` may be repeated and each
    /// value may hold several space separated scopes.
    pub fn parse(req: &HttpRequest, body: Option<Vec<u8>>) -> Result<Self> {
        let (user, password) = parse_basic_auth(req)?;

        let mut fields: Vec<(String, String)> =
            form_urlencoded::parse(req.query_string().as_bytes())
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect();
        if let Some(body) = body {
            fields.extend(
                form_urlencoded::parse(&body).map(|(key, value)| (key.to_string(), value.to_string())),
            );
        }

        let mut service = String::new();
        let mut client_id = String::new();
        let mut scopes = Vec::new();
        for (key, value) in fields {
            match key.as_str() {
                "service" => service = value,
                "client_id" => client_id = value,
                "scope" => {
                    let parsed = parse_scopes(&value).context("parse scope")?;
                    scopes.extend(parsed);
                }
                _ => {}
            }
        }

        if service.is_empty() {
            bail!("service is required");
        }
        if client_id.is_empty() {
            bail!("client_id is required");
        }

        let parsed = Self {
            user,
            password,
            service,
            client_id,
            scopes,
        };
        debug!(
            "- {} {}, request: {parsed}, peer: {:?}",
            req.method(),
            req.path(),
            req.peer_addr()
        );
        Ok(parsed)
    }
}

impl fmt::Display for AuthRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let password = if self.password.is_empty() {
            ""
        } else {
            "********"
        };
        let scopes: Vec<String> = self.scopes.iter().map(|s| s.to_string()).collect();
        write!(
            f,
            "{}:{password} client_id='{}' service='{}' scopes={:?}",
            self.user, self.client_id, self.service, scopes
        )
    }
}

fn parse_basic_auth(req: &HttpRequest) -> Result<(String, String)> {
    let value = match req.headers().get(header::AUTHORIZATION) {
        Some(value) => value
            .to_str()
            .context("invalid authorization header value")?,
        None => bail!("basic authentication is required"),
    };

    let encoded = match value.split_once(' ') {
        Some((scheme, encoded)) if scheme.eq_ignore_ascii_case("basic") => encoded.trim(),
        _ => bail!("basic authentication is required"),
    };

    let decoded = BASE64_STANDARD
        .decode(encoded)
        .context("decode basic auth base64")?;
    let decoded = String::from_utf8(decoded).context("basic auth is not utf-8")?;
    match decoded.split_once(':') {
        Some((user, password)) => Ok((user.to_string(), password.to_string())),
        None => bail!("basic auth missing password"),
    }
}

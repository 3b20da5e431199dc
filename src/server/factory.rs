use std::sync::Arc;

use anyhow::{Context, Result};
use openssl::ssl::{SslAcceptor, SslAcceptorBuilder, SslMethod};

use crate::authn::StaticAuthenticator;
use crate::authz::Authorizer;
use crate::token::factory::TokenFactory;

use super::config::ServerConfig;
use super::handlers::auth::AuthHandler;
use super::handlers::healthz::HealthzHandler;
use super::restful::{RestfulContext, RestfulServer};

pub struct ServerFactory {
    cfg: ServerConfig,
}

impl ServerFactory {
    pub fn new(cfg: ServerConfig) -> Self {
        Self { cfg }
    }

    pub fn build_server(&self) -> Result<RestfulServer> {
        let ssl = self.build_ssl()?;
        let ctx = self.build_context()?;

        let mut srv = RestfulServer::new(self.cfg.bind.clone(), ssl, ctx);
        if self.cfg.keep_alive_secs > 0 {
            srv.set_keep_alive_secs(self.cfg.keep_alive_secs);
        }
        if self.cfg.workers > 0 {
            srv.set_workers(self.cfg.workers);
        }

        Ok(srv)
    }

    pub fn build_ssl(&self) -> Result<Option<SslAcceptorBuilder>> {
        if !self.cfg.ssl {
            return Ok(None);
        }

        let mut builder =
            SslAcceptor::mozilla_intermediate(SslMethod::tls()).context("init ssl acceptor")?;

        builder
            .set_private_key_file(&self.cfg.key_path, openssl::ssl::SslFiletype::PEM)
            .context("load ssl key file")?;
        builder
            .set_certificate_chain_file(&self.cfg.cert_path)
            .context("load ssl cert file")?;

        Ok(Some(builder))
    }

    pub fn build_context(&self) -> Result<Arc<RestfulContext>> {
        let token_factory = TokenFactory::new(&self.cfg.token).context("init token")?;

        let authorizer = Authorizer::new(&self.cfg.authz);
        let issuer = token_factory
            .build_issuer(authorizer)
            .context("init token issuer")?;

        let authn = StaticAuthenticator::new(&self.cfg.authn);
        let auth_handler = AuthHandler::new(Box::new(authn), issuer, self.cfg.authn.soft_deny);
        let healthz_handler = HealthzHandler::new();

        let ctx = RestfulContext {
            auth_handler,
            healthz_handler,
        };
        Ok(Arc::new(ctx))
    }
}

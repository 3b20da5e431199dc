use std::sync::Arc;
use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::web::{self, Bytes, Data, PayloadConfig};
use actix_web::{App, HttpRequest, HttpResponse, HttpServer};
use anyhow::{Context, Result};
use log::{info, warn};
use openssl::ssl::SslAcceptorBuilder;
use sd_notify::NotifyState;

use crate::types::response::CommonResponse;

use super::handlers::auth::AuthHandler;
use super::handlers::healthz::HealthzHandler;
use super::handlers::Handler;

pub struct RestfulServer {
    ssl: Option<SslAcceptorBuilder>,
    ctx: Arc<RestfulContext>,

    keep_alive_secs: Option<u64>,
    workers: Option<u64>,

    bind: String,
}

pub struct RestfulContext {
    pub auth_handler: AuthHandler,
    pub healthz_handler: HealthzHandler,
}

impl RestfulServer {
    pub const AUTH_PATH: &str = "/auth";
    pub const HEALTHZ_PATH: &str = "/healthz";

    const PAYLOAD_LIMIT: usize = 64 * 1024;

    pub fn new(bind: String, ssl: Option<SslAcceptorBuilder>, ctx: Arc<RestfulContext>) -> Self {
        Self {
            ssl,
            ctx,
            keep_alive_secs: None,
            workers: None,
            bind,
        }
    }

    pub fn set_keep_alive_secs(&mut self, keep_alive_secs: u64) {
        self.keep_alive_secs = Some(keep_alive_secs);
    }

    pub fn set_workers(&mut self, workers: u64) {
        self.workers = Some(workers);
    }

    pub async fn run(mut self) -> Result<()> {
        let ctx = self.ctx.clone();
        let mut srv = HttpServer::new(move || {
            App::new()
                .app_data(Data::new(ctx.clone()))
                .configure(Self::configure)
                .default_service(web::route().to(Self::default_handler))
        });

        if let Some(ssl) = self.ssl.take() {
            info!("Binding to https://{}", self.bind);
            srv = srv.bind_openssl(&self.bind, ssl).context("bind with ssl")?
        } else {
            warn!("Using HTTP (without SSL), credentials are sent in clear text");
            info!("Binding to http://{}", self.bind);
            srv = srv.bind(&self.bind).context("bind without ssl")?
        };

        if let Some(keep_alive) = self.keep_alive_secs {
            srv = srv.keep_alive(Duration::from_secs(keep_alive));
        }
        if let Some(workers) = self.workers {
            srv = srv.workers(workers as usize);
        }

        sd_notify::notify(true, &[NotifyState::Ready]).context("notify systemd")?;
        info!("Starting restful server");
        srv.run().await.context("run server")?;

        info!("Server stopped by user");
        Ok(())
    }

    /// Registers the routes, expects a `Data<Arc<RestfulContext>>` in the app.
    pub fn configure(cfg: &mut web::ServiceConfig) {
        cfg.app_data(PayloadConfig::new(Self::PAYLOAD_LIMIT))
            .service(
                web::resource(Self::AUTH_PATH)
                    .route(web::get().to(Self::handle_auth))
                    .route(web::post().to(Self::handle_auth)),
            )
            .service(web::resource(Self::HEALTHZ_PATH).route(web::get().to(Self::handle_healthz)));
    }

    async fn handle_auth(
        req: HttpRequest,
        body: Option<Bytes>,
        ctx: Data<Arc<RestfulContext>>,
    ) -> HttpResponse {
        let body = Self::parse_body(body);

        ctx.auth_handler.handle("", req, body).into()
    }

    async fn handle_healthz(
        req: HttpRequest,
        body: Option<Bytes>,
        ctx: Data<Arc<RestfulContext>>,
    ) -> HttpResponse {
        let body = Self::parse_body(body);

        ctx.healthz_handler.handle("", req, body).into()
    }

    pub async fn default_handler(req: HttpRequest) -> HttpResponse {
        let path = req.uri().path().to_string();
        let method = req.method().as_str().to_string();
        let message = format!("No route to {method} {path}");
        let ret = CommonResponse {
            code: StatusCode::NOT_FOUND.into(),
            message: Some(message),
        };
        HttpResponse::NotFound().json(ret)
    }

    fn parse_body(body: Option<Bytes>) -> Option<Vec<u8>> {
        body.filter(|b| !b.is_empty()).map(|b| b.to_vec())
    }
}

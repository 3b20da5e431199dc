pub mod auth;
pub mod healthz;

use actix_web::HttpRequest;

use super::response::Response;

pub trait Handler {
    fn handle(&self, path: &str, req: HttpRequest, body: Option<Vec<u8>>) -> Response;
}

pub mod healthz;
pub mod response;
pub mod token;

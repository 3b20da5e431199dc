mod handlers;
mod request;
mod response;

pub mod config;
pub mod factory;
pub mod restful;

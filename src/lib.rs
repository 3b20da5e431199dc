pub mod authn;
pub mod authz;
pub mod config;
pub mod dirs;
pub mod logs;
pub mod scope;
pub mod server;
pub mod token;
pub mod types;

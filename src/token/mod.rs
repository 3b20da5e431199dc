mod error;
mod jti;

pub mod claims;
pub mod config;
pub mod factory;
pub mod issuer;
pub mod keys;
pub mod signer;

pub use error::IssueError;
pub use jti::generate_jti;

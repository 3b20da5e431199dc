use thiserror::Error;

/// Failures that abort a token issuance. No token is returned in any case.
#[derive(Error, Debug)]
pub enum IssueError {
    #[error("generate token id: {0}")]
    Jti(#[from] rand::Error),

    #[error("encode {part}: {source}")]
    Encode {
        part: &'static str,
        source: serde_json::Error,
    },

    #[error("sign token: {0:#}")]
    Sign(anyhow::Error),
}

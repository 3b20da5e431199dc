use log::{debug, error};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::authz::{Authorizer, AuthzRequest};
use crate::scope::{Access, Scope};

use super::claims::{base64_url_encode, build_claims, ClaimSet, Header};
use super::error::IssueError;
use super::jti::generate_jti_with;
use super::signer::Signer;

/// A signed token along with the claims it carries.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: ClaimSet,
}

/// Turns authorization decisions into signed tokens.
pub struct Issuer {
    issuer: String,
    embed_scopes: bool,
    authorizer: Authorizer,
    signer: Box<dyn Signer>,
}

impl Issuer {
    pub fn new(
        issuer: impl ToString,
        embed_scopes: bool,
        authorizer: Authorizer,
        signer: Box<dyn Signer>,
    ) -> Self {
        Self {
            issuer: issuer.to_string(),
            embed_scopes,
            authorizer,
            signer,
        }
    }

    /// Authorizes `req` for the requested scopes and issues a token for the
    /// granted access, valid from `now` (unix seconds).
    pub fn issue(
        &self,
        req: &AuthzRequest,
        scopes: &[Scope],
        audience: &str,
        now: i64,
    ) -> Result<IssuedToken, IssueError> {
        self.issue_with_rng(req, scopes, audience, now, &mut OsRng)
    }

    pub fn issue_with_rng<R: RngCore>(
        &self,
        req: &AuthzRequest,
        scopes: &[Scope],
        audience: &str,
        now: i64,
        rng: &mut R,
    ) -> Result<IssuedToken, IssueError> {
        let access = self.authorizer.authorize(req, scopes);
        self.sign_access(access, audience, &req.user, now, rng)
    }

    /// Issues a token granting nothing, for clients that failed to
    /// authenticate. Every requested scope is kept with no actions.
    pub fn issue_denied(
        &self,
        scopes: &[Scope],
        audience: &str,
        now: i64,
    ) -> Result<IssuedToken, IssueError> {
        let access = scopes.iter().map(Scope::empty_access).collect();
        self.sign_access(access, audience, "", now, &mut OsRng)
    }

    fn sign_access<R: RngCore>(
        &self,
        access: Vec<Access>,
        audience: &str,
        subject: &str,
        now: i64,
        rng: &mut R,
    ) -> Result<IssuedToken, IssueError> {
        let jti = match generate_jti_with(rng) {
            Ok(jti) => jti,
            Err(e) => {
                error!("Unable to read random bytes for token id: {e}");
                return Err(IssueError::Jti(e));
            }
        };

        let scopes = if self.embed_scopes {
            let granted: Vec<String> = access
                .iter()
                .filter(|a| !a.is_empty())
                .map(|a| a.to_string())
                .collect();
            if granted.is_empty() {
                None
            } else {
                Some(granted.join(" "))
            }
        } else {
            None
        };

        let mut claims = build_claims(&self.issuer, access, audience, subject, now, jti);
        claims.scopes = scopes;

        let header = Header::new(self.signer.algorithm(), self.signer.key_id());
        let header = serde_json::to_vec(&header).map_err(|e| IssueError::Encode {
            part: "jose header",
            source: e,
        })?;
        let payload = serde_json::to_vec(&claims).map_err(|e| IssueError::Encode {
            part: "claim set",
            source: e,
        })?;

        let signing_input = format!(
            "{}.{}",
            base64_url_encode(header),
            base64_url_encode(payload)
        );
        let signature = match self.signer.sign(signing_input.as_bytes()) {
            Ok(signature) => signature,
            Err(e) => {
                error!("Unable to sign token payload: {e:#}");
                return Err(IssueError::Sign(e));
            }
        };

        let token = format!("{signing_input}.{}", base64_url_encode(signature));
        debug!("Issued token {} for '{subject}'", claims.jwt_id);
        Ok(IssuedToken { token, claims })
    }
}

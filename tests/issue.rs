use chrono::Utc;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use openssl::ec::{EcGroup, EcKey};
use openssl::nid::Nid;
use openssl::pkey::PKey;

use regauth::authz::config::{GroupPlaceholder, PolicyConfig};
use regauth::authz::rule::Rule;
use regauth::authz::{Authorizer, AuthzRequest};
use regauth::config::CommonConfig;
use regauth::scope::parse_scopes;
use regauth::token::claims::ClaimSet;
use regauth::token::issuer::Issuer;
use regauth::token::keys::generate_rsa_key;
use regauth::token::signer::{KeySigner, Signer};

fn new_policy() -> PolicyConfig {
    let mut cfg = PolicyConfig::default();
    cfg.group_placeholder = GroupPlaceholder::Fixed;
    cfg.rules = vec![
        Rule::new("^org/", &["pull"]).with_group("readers"),
        Rule::new("^org/", &["pull", "push"]).with_group("writers"),
        Rule::new("^${user}/", &["pull", "push", "delete"]),
        Rule::new("^teams/${group}/", &["pull", "push"]),
    ];
    cfg
}

fn validation(alg: Algorithm) -> Validation {
    let mut validation = Validation::new(alg);
    validation.set_audience(&["registry.test"]);
    validation.set_issuer(&["auth.test"]);
    validation
}

#[test]
fn issue_rs256() {
    let private_key = generate_rsa_key().unwrap();
    let public_key = PKey::private_key_from_pem(&private_key)
        .unwrap()
        .public_key_to_pem()
        .unwrap();
    let signer = KeySigner::from_pem(&private_key).unwrap();
    let kid = signer.key_id().to_string();

    let issuer = Issuer::new("auth.test", true, Authorizer::new(&new_policy()), Box::new(signer));
    let req = AuthzRequest {
        user: String::from("bob"),
        groups: vec![String::from("readers"), String::from("ops")],
    };
    let scopes = parse_scopes(
        "repository:org/app:pull,push repository:bob/tools:push,delete \
         repository:teams/ops/db:push repository:teams/dev/db:push registry:catalog:*",
    )
    .unwrap();

    let now = Utc::now().timestamp();
    let issued = issuer.issue(&req, &scopes, "registry.test", now).unwrap();

    let header = decode_header(&issued.token).unwrap();
    assert_eq!(header.alg, Algorithm::RS256);
    assert_eq!(header.kid.as_deref(), Some(kid.as_str()));

    let key = DecodingKey::from_rsa_pem(&public_key).unwrap();
    let data = decode::<ClaimSet>(&issued.token, &key, &validation(Algorithm::RS256)).unwrap();
    let claims = data.claims;
    assert_eq!(claims, issued.claims);
    assert_eq!(claims.subject, "bob");
    assert_eq!(claims.expiration, now + 900);
    assert_eq!(claims.not_before, now);

    let granted: Vec<String> = claims.access.iter().map(|a| a.to_string()).collect();
    assert_eq!(
        granted,
        vec![
            "repository:org/app:pull",
            "repository:bob/tools:push,delete",
            "repository:teams/ops/db:push",
            "repository:teams/dev/db:",
            "registry:catalog:",
        ]
    );
    assert_eq!(
        claims.scopes.as_deref(),
        Some("repository:org/app:pull repository:bob/tools:push,delete repository:teams/ops/db:push")
    );
}

#[test]
fn issue_es256() {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    let key = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();
    let private_key = key.private_key_to_pem_pkcs8().unwrap();
    let public_key = key.public_key_to_pem().unwrap();

    let signer = KeySigner::from_pem(&private_key).unwrap();
    let issuer = Issuer::new("auth.test", false, Authorizer::new(&new_policy()), Box::new(signer));
    let req = AuthzRequest {
        user: String::from("alice"),
        groups: vec![String::from("writers")],
    };
    let scopes = parse_scopes("repository:org/app:pull,push").unwrap();

    let now = Utc::now().timestamp();
    let issued = issuer.issue(&req, &scopes, "registry.test", now).unwrap();

    let key = DecodingKey::from_ec_pem(&public_key).unwrap();
    let data = decode::<ClaimSet>(&issued.token, &key, &validation(Algorithm::ES256)).unwrap();
    assert_eq!(data.header.alg, Algorithm::ES256);
    assert_eq!(
        data.claims.access[0].actions.iter().collect::<Vec<_>>(),
        vec!["pull", "push"]
    );
    assert!(data.claims.scopes.is_none());
}

#[test]
fn issue_denied() {
    let private_key = generate_rsa_key().unwrap();
    let public_key = PKey::private_key_from_pem(&private_key)
        .unwrap()
        .public_key_to_pem()
        .unwrap();
    let signer = KeySigner::from_pem(&private_key).unwrap();
    let issuer = Issuer::new("auth.test", true, Authorizer::new(&new_policy()), Box::new(signer));

    let scopes = parse_scopes("repository:org/app:pull").unwrap();
    let now = Utc::now().timestamp();
    let issued = issuer.issue_denied(&scopes, "registry.test", now).unwrap();

    let key = DecodingKey::from_rsa_pem(&public_key).unwrap();
    let data = decode::<ClaimSet>(&issued.token, &key, &validation(Algorithm::RS256)).unwrap();
    assert_eq!(data.claims.subject, "");
    assert_eq!(data.claims.access.len(), 1);
    assert!(data.claims.access[0].is_empty());
    assert!(data.claims.scopes.is_none());
}

mod pattern;

pub mod config;
pub mod rule;

use log::info;

use crate::scope::{Access, Scope};

use config::PolicyConfig;
use rule::{Matcher, Rule};

/// The principal being authorized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthzRequest {
    pub user: String,
    pub groups: Vec<String>,
}

/// Reduces the configured rules and a list of requested scopes into the
/// access granted for each scope.
pub struct Authorizer {
    rules: Vec<Rule>,
    matcher: Matcher,
}

impl Authorizer {
    pub fn new(cfg: &PolicyConfig) -> Self {
        Self {
            rules: cfg.rules.clone(),
            matcher: Matcher::new(cfg),
        }
    }

    /// Returns one [`Access`] per requested scope, in request order. Scopes no
    /// rule matches are kept with no actions.
    pub fn authorize(&self, req: &AuthzRequest, scopes: &[Scope]) -> Vec<Access> {
        scopes
            .iter()
            .map(|scope| self.check_access(req, scope))
            .collect()
    }

    fn check_access(&self, req: &AuthzRequest, scope: &Scope) -> Access {
        let mut access = scope.empty_access();
        for rule in self.rules.iter() {
            if rule.is_group_independent() {
                rule.eval(&self.matcher, &req.user, "", scope, &mut access);
                continue;
            }
            for group in req.groups.iter() {
                rule.eval(&self.matcher, &req.user, group, scope, &mut access);
            }
        }
        info!("Checked access {}@{}: {:?}", req.user, scope.name, access.actions);
        access
    }
}

#[cfg(test)]
mod tests {
    use crate::config::CommonConfig;

    use super::config::GroupPlaceholder;
    use super::*;

    fn new_authorizer(rules: Vec<Rule>) -> Authorizer {
        let mut cfg = PolicyConfig::default();
        cfg.rules = rules;
        Authorizer::new(&cfg)
    }

    fn request(user: &str, groups: &[&str]) -> AuthzRequest {
        AuthzRequest {
            user: user.to_string(),
            groups: groups.iter().map(|g| g.to_string()).collect(),
        }
    }

    fn scopes(s: &[&str]) -> Vec<Scope> {
        s.iter().map(|s| s.parse().unwrap()).collect()
    }

    fn actions(access: &Access) -> Vec<&str> {
        access.actions.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_authorize() {
        let authz = new_authorizer(vec![Rule::new("^org/", &["pull"]).with_group("readers")]);
        let granted = authz.authorize(
            &request("bob", &["readers"]),
            &scopes(&["repository:org/app:pull,push"]),
        );
        assert_eq!(granted.len(), 1);
        assert_eq!(granted[0].resource_type, "repository");
        assert_eq!(granted[0].name, "org/app");
        assert_eq!(actions(&granted[0]), vec!["pull"]);
    }

    #[test]
    fn test_authorize_keeps_every_scope() {
        let authz = new_authorizer(vec![Rule::new("^org/", &["pull"])]);
        let granted = authz.authorize(
            &request("bob", &[]),
            &scopes(&[
                "repository:other/app:pull",
                "tag:org/app:pull",
                "repository:org/app:pull",
            ]),
        );
        assert_eq!(granted.len(), 3);
        assert_eq!(granted[0].name, "other/app");
        assert!(granted[0].is_empty());
        assert_eq!(granted[1].resource_type, "tag");
        assert!(granted[1].is_empty());
        assert_eq!(actions(&granted[2]), vec!["pull"]);

        assert!(authz.authorize(&request("bob", &[]), &[]).is_empty());
    }

    #[test]
    fn test_authorize_rule_order() {
        let a = Rule::new("^org/", &["pull", "push"]).with_user("bob");
        let b = Rule::new("app$", &["pull", "delete"]);
        let c = Rule::new("^org/", &["push"]).with_group("writers");

        let req = request("bob", &["writers", "readers"]);
        let requested = scopes(&[
            "repository:org/app:delete,push,pull",
            "repository:team/app:pull,push",
        ]);

        let forward = new_authorizer(vec![a.clone(), b.clone(), c.clone()]);
        let backward = new_authorizer(vec![c, b, a]);

        let forward = forward.authorize(&req, &requested);
        let backward = backward.authorize(&req, &requested);
        // IndexSet equality ignores insertion order.
        assert_eq!(forward, backward);

        assert_eq!(actions(&forward[0]), vec!["push", "pull", "delete"]);
        assert_eq!(actions(&backward[0]), vec!["push", "delete", "pull"]);
        assert_eq!(actions(&forward[1]), vec!["pull"]);
    }

    #[test]
    fn test_authorize_duplicate_actions() {
        let authz = new_authorizer(vec![
            Rule::new(".*", &["pull"]),
            Rule::new("^x$", &["pull"]),
        ]);
        let granted = authz.authorize(&request("bob", &[]), &scopes(&["repository:x:pull,pull"]));
        assert_eq!(actions(&granted[0]), vec!["pull"]);
    }

    #[test]
    fn test_authorize_user_filter() {
        let authz = new_authorizer(vec![Rule::new(".*", &["pull"]).with_user("alice")]);
        let requested = scopes(&["repository:x:pull"]);

        let granted = authz.authorize(&request("bob", &["alice"]), &requested);
        assert!(granted[0].is_empty());

        let granted = authz.authorize(&request("alice", &[]), &requested);
        assert_eq!(actions(&granted[0]), vec!["pull"]);
    }

    #[test]
    fn test_authorize_groups() {
        let authz = new_authorizer(vec![
            Rule::new("^shared/", &["pull"]),
            Rule::new("^team/", &["pull", "push"]).with_group("dev"),
        ]);
        let requested = scopes(&["repository:team/app:pull,push", "repository:shared/app:pull"]);

        // No groups: group filtered rules are never evaluated.
        let granted = authz.authorize(&request("bob", &[]), &requested);
        assert!(granted[0].is_empty());
        assert_eq!(actions(&granted[1]), vec!["pull"]);

        let granted = authz.authorize(&request("bob", &["ops", "dev", "qa"]), &requested);
        assert_eq!(actions(&granted[0]), vec!["pull", "push"]);
        assert_eq!(actions(&granted[1]), vec!["pull"]);

        let granted = authz.authorize(&request("bob", &["ops"]), &requested);
        assert!(granted[0].is_empty());
    }

    #[test]
    fn test_authorize_group_template() {
        let mut cfg = PolicyConfig::default();
        cfg.rules = vec![Rule::new("^${group}/", &["pull", "push"])];
        cfg.group_placeholder = GroupPlaceholder::Fixed;
        let authz = Authorizer::new(&cfg);

        let requested = scopes(&["repository:dev/app:push", "repository:qa/app:pull"]);
        let granted = authz.authorize(&request("bob", &["dev", "qa"]), &requested);
        assert_eq!(actions(&granted[0]), vec!["push"]);
        assert_eq!(actions(&granted[1]), vec!["pull"]);

        let granted = authz.authorize(&request("bob", &[]), &requested);
        assert!(granted.iter().all(Access::is_empty));
    }
}

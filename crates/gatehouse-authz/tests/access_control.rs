//! End-to-end access control evaluation from configuration.

use std::net::IpAddr;
use std::sync::Arc;
use std::thread;

use gatehouse_authz::{
    AccessControlConfig, AuthzError, Level, Object, ReloadableRuleSet, RuleSet, Subject,
};

const CONFIG: &str = r#"
default_policy = "deny"

[[networks]]
name = "internal"
networks = ["10.0.0.0/8", "192.168.0.0/16"]

# 1
[[rules]]
domain = ["public.example.com"]
methods = ["GET"]
policy = "bypass"

# 2
[[rules]]
domain = ["secure.example.com"]
subject = ["group:admins"]
policy = "two_factor"

# 3
[[rules]]
domain = ["{user}.home.example.com"]
policy = "one_factor"

# 4
[[rules]]
domain = ["*.example.com"]
resources = ["^/api/.*$"]
networks = ["internal"]
subject = [["group:dev", "!group:contractors"], "user:john"]
policy = "one_factor"

# 5
[[rules]]
domain = ["*.example.com"]
query = [{ key = "debug", operator = "present" }]
policy = "deny"

# 6
[[rules]]
domain_regex = ['^(?P<Group>\w+)\.team\.example\.com$']
policy = "two_factor"

# 7
[[rules]]
domain = ["*.example.com"]
networks = ["172.16.0.0/12"]
policy = "bypass"
"#;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn rules() -> RuleSet {
    init_tracing();
    let config = AccessControlConfig::from_toml_str(CONFIG).unwrap();
    RuleSet::build(&config).unwrap()
}

fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

fn user(name: &str, groups: &[&str], from: &str) -> Subject {
    Subject::authenticated(name, groups.iter().copied(), ip(from))
}

fn anonymous(from: &str) -> Subject {
    Subject::anonymous(ip(from))
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_bypass_on_domain_and_method() {
    let rules = rules();
    let subject = anonymous("8.8.8.8");

    let decision =
        rules.evaluate_detailed(&subject, &Object::new("public.example.com", "/", "GET"));
    assert_eq!(decision.level, Level::Bypass);
    assert_eq!(decision.position, Some(1));

    // POST skips rule 1 and falls through to the default.
    let decision =
        rules.evaluate_detailed(&subject, &Object::new("public.example.com", "/", "POST"));
    assert_eq!(decision.level, Level::Denied);
    assert!(decision.is_default());
}

#[test]
fn test_group_rule_and_anonymous_subject() {
    let rules = rules();
    let object = Object::new("secure.example.com", "/", "GET");

    // Anonymous passes the subject criterion and is asked for two factors.
    assert_eq!(rules.evaluate(&anonymous("8.8.8.8"), &object), Level::TwoFactor);

    // Not an admin: rule 2 fails; no later rule applies from this address.
    assert_eq!(
        rules.evaluate_detailed(&user("fred", &["dev"], "8.8.8.8"), &object).position,
        None
    );

    assert_eq!(
        rules.evaluate(&user("harry", &["admins"], "8.8.8.8"), &object),
        Level::TwoFactor
    );
}

#[test]
fn test_user_placeholder_domain() {
    let rules = rules();
    let object = Object::new("john.home.example.com", "/", "GET");

    let decision = rules.evaluate_detailed(&user("john", &[], "8.8.8.8"), &object);
    assert_eq!(decision.position, Some(3));
    assert_eq!(decision.level, Level::OneFactor);

    let decision = rules.evaluate_detailed(&user("fred", &[], "8.8.8.8"), &object);
    assert_ne!(decision.position, Some(3));
}

#[test]
fn test_network_and_subject_groups() {
    let rules = rules();
    let api = Object::new("app.example.com", "/api/items", "GET");

    // dev inside the network
    assert_eq!(
        rules.evaluate_detailed(&user("alice", &["dev"], "10.1.1.1"), &api).position,
        Some(4)
    );

    // dev but contractor: excluded by the negated entry
    assert_ne!(
        rules
            .evaluate_detailed(&user("bob", &["dev", "contractors"], "10.1.1.1"), &api)
            .position,
        Some(4)
    );

    // john matches the second subject group regardless of groups
    assert_eq!(
        rules.evaluate_detailed(&user("john", &[], "192.168.3.3"), &api).position,
        Some(4)
    );

    // Right domain, path and subject but wrong network
    assert_ne!(
        rules.evaluate_detailed(&user("alice", &["dev"], "8.8.8.8"), &api).position,
        Some(4)
    );
}

#[test]
fn test_query_rule() {
    let rules = rules();
    let subject = user("fred", &[], "8.8.8.8");

    let decision =
        rules.evaluate_detailed(&subject, &Object::new("app.example.com", "/?debug=1", "GET"));
    assert_eq!(decision.position, Some(5));

    let decision =
        rules.evaluate_detailed(&subject, &Object::new("app.example.com", "/?verbose=1", "GET"));
    assert_eq!(decision.position, None);
}

#[test]
fn test_group_capture_domain() {
    let rules = rules();
    let object = Object::new("ops.team.example.com", "/", "GET");

    assert_eq!(
        rules.evaluate_detailed(&user("fred", &["ops"], "8.8.8.8"), &object).position,
        Some(6)
    );
    assert_eq!(
        rules.evaluate_detailed(&user("fred", &["dev"], "8.8.8.8"), &object).position,
        None
    );
}

#[test]
fn test_later_rule_reached_when_earlier_fail() {
    let rules = rules();
    let decision = rules.evaluate_detailed(
        &anonymous("172.20.0.1"),
        &Object::new("wiki.example.com", "/", "GET"),
    );
    assert_eq!(decision.position, Some(7));
    assert_eq!(decision.level, Level::Bypass);
}

#[test]
fn test_named_and_literal_networks_are_cached() {
    let rules = rules();
    assert!(rules.networks().definition("internal").is_some());
    assert!(rules.networks().get("172.16.0.0/12").is_some());
    assert!(rules.networks().get("10.0.0.0/8").is_some());
}

// =============================================================================
// Construction Failures
// =============================================================================

#[test]
fn test_bad_rule_fails_whole_build() {
    let config = AccessControlConfig::from_toml_str(
        r#"
[[rules]]
policy = "bypass"

[[rules]]
networks = ["10.0.0.300"]
policy = "deny"
"#,
    )
    .unwrap();

    let err = RuleSet::build(&config).unwrap_err();
    assert!(matches!(err, AuthzError::InvalidNetwork { position: 2, .. }));
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn test_concurrent_evaluation_during_reload() {
    init_tracing();
    let config = AccessControlConfig::from_toml_str(CONFIG).unwrap();
    let reloadable = Arc::new(ReloadableRuleSet::from_config(&config).unwrap());

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let rules = Arc::clone(&reloadable);
            thread::spawn(move || {
                let subject = Subject::anonymous("8.8.8.8".parse().unwrap());
                let object = Object::new("public.example.com", "/", "GET");
                for _ in 0..1000 {
                    let level = rules.evaluate(&subject, &object);
                    assert!(level == Level::Bypass || level == Level::Denied);
                }
            })
        })
        .collect();

    // No rules, default deny.
    let locked_down = AccessControlConfig::default();
    for _ in 0..10 {
        reloadable.reload(&locked_down).unwrap();
        reloadable.reload(&config).unwrap();
    }

    for reader in readers {
        reader.join().unwrap();
    }
}

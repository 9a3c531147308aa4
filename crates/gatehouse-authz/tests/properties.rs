//! Matching properties that must hold for any rule set.

use std::net::IpAddr;

use gatehouse_authz::{
    AccessControlRule, DomainMatcher, Level, Object, RuleSet, RuleSpec, Subject, SubjectGroup,
    SubjectSpec, build_rules,
};

fn subjects() -> Vec<Subject> {
    let ips: [IpAddr; 3] = [
        "127.0.0.1".parse().unwrap(),
        "10.20.30.40".parse().unwrap(),
        "2001:db8::1".parse().unwrap(),
    ];

    ips.iter()
        .flat_map(|ip| {
            [
                Subject::anonymous(*ip),
                Subject::authenticated("john", ["dev"], *ip),
                Subject::authenticated("harry", ["admins", "ops"], *ip),
            ]
        })
        .collect()
}

fn objects() -> Vec<Object> {
    vec![
        Object::new("example.com", "/", "GET"),
        Object::new("app.example.com", "/api/v1/items?id=3", "POST"),
        Object::new("other.org", "/login?redirect=%2F", "DELETE"),
        Object::new("LOCALHOST", "", "OPTIONS"),
    ]
}

#[test]
fn test_rule_without_criteria_matches_everything() {
    let rule = AccessControlRule::new(1, Level::OneFactor);
    for subject in subjects() {
        for object in objects() {
            assert!(rule.is_match(&subject, &object), "{:?} {:?}", subject, object);
        }
    }
}

#[test]
fn test_anonymous_always_passes_subject_criterion() {
    let mut rule = AccessControlRule::new(1, Level::TwoFactor);
    rule.subjects = vec![
        SubjectGroup::parse(1, &["user:nobody"]).unwrap(),
        SubjectGroup::parse(1, &["group:nothing"]).unwrap(),
    ];

    for subject in subjects() {
        assert_eq!(rule.matches_subjects(&subject), subject.is_anonymous());
    }
}

#[test]
fn test_failing_criterion_fails_rule() {
    let mut rule = AccessControlRule::new(1, Level::Bypass);
    rule.domains = vec![DomainMatcher::literal("example.com")];
    rule.methods = vec!["GET".to_string()];
    rule.networks = vec!["192.0.2.0/24".parse().unwrap()];

    let object = Object::new("example.com", "/", "GET");
    for subject in subjects() {
        assert!(rule.matches_domains(&subject, &object));
        assert!(rule.matches_methods(&object));
        assert!(!rule.is_match(&subject, &object));
    }
}

#[test]
fn test_first_matching_position_wins() {
    let rules = build_rules(
        &[
            RuleSpec {
                subject: vec![SubjectSpec::from("user:john")],
                ..RuleSpec::new("deny")
            },
            RuleSpec {
                methods: vec!["POST".to_string()],
                ..RuleSpec::new("two_factor")
            },
            RuleSpec::new("one_factor"),
            RuleSpec::new("bypass"),
        ],
        &[],
        Level::Denied,
    )
    .unwrap();

    for subject in subjects() {
        for object in objects() {
            let decision = rules.evaluate_detailed(&subject, &object);
            let expected = rules
                .rules()
                .iter()
                .find(|r| r.is_match(&subject, &object))
                .map(|r| r.position);

            assert_eq!(decision.position, expected);
            // Rule 3 catches everything, so rule 4 is never reached.
            assert_ne!(decision.position, Some(4));
        }
    }
}

#[test]
fn test_default_for_empty_rule_set() {
    for default in [Level::Bypass, Level::OneFactor, Level::TwoFactor, Level::Denied] {
        let rules = RuleSet::empty(default);
        for subject in subjects() {
            for object in objects() {
                assert_eq!(rules.evaluate(&subject, &object), default);
            }
        }
    }
}

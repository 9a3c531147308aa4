//! Request description consumed by rule evaluation.
//!
//! A request is described as a [`Subject`] (who is asking, and from where)
//! and an [`Object`] (what is being asked for). Both are built by the host
//! from its session and HTTP layers and are immutable during evaluation.

use std::collections::BTreeMap;
use std::net::IpAddr;

use url::Url;

// =============================================================================
// Subject
// =============================================================================

/// Identity of an authenticated user.
///
/// Only built through [`Subject::authenticated`], so the username is never
/// empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    username: String,
    groups: Vec<String>,
}

impl Identity {
    /// Username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Group memberships.
    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }
}

/// The actor making a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    /// `None` for anonymous requests.
    identity: Option<Identity>,
    ip: IpAddr,
}

impl Subject {
    /// An unauthenticated subject.
    #[must_use]
    pub fn anonymous(ip: IpAddr) -> Self {
        Self { identity: None, ip }
    }

    /// An authenticated subject.
    ///
    /// An empty username yields an anonymous subject.
    #[must_use]
    pub fn authenticated<I, G>(username: impl Into<String>, groups: I, ip: IpAddr) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<String>,
    {
        let username = username.into();
        if username.is_empty() {
            return Self::anonymous(ip);
        }

        Self {
            identity: Some(Identity {
                username,
                groups: groups.into_iter().map(Into::into).collect(),
            }),
            ip,
        }
    }

    /// Source address of the request.
    #[must_use]
    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    /// Identity of an authenticated subject.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Returns `true` if the subject carries no identity.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.identity.is_none()
    }

    /// Username of an authenticated subject.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.username.as_str())
    }

    /// Groups of an authenticated subject; empty for anonymous subjects.
    #[must_use]
    pub fn groups(&self) -> &[String] {
        self.identity
            .as_ref()
            .map(|i| i.groups.as_slice())
            .unwrap_or_default()
    }

    /// Returns `true` if the subject is a member of `group`.
    #[must_use]
    pub fn in_group(&self, group: &str) -> bool {
        self.groups().iter().any(|g| g == group)
    }
}

// =============================================================================
// Query Parameters
// =============================================================================

/// Decoded query parameters of a request.
///
/// A key may occur several times; all values are kept in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    values: BTreeMap<String, Vec<String>>,
}

impl QueryParams {
    /// Parse an `application/x-www-form-urlencoded` query string (without `?`).
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params.insert(key, value);
        }
        params
    }

    /// Add a value for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values
            .entry(key.into())
            .or_default()
            .push(value.into());
    }

    /// All values for `key`, empty if the key is absent.
    #[must_use]
    pub fn get_all(&self, key: &str) -> &[String] {
        self.values.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns `true` if `key` appears at least once.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Returns `true` if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// =============================================================================
// Object
// =============================================================================

/// The resource being requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    /// Target host, lowercased.
    pub domain: String,
    /// Request path including the query string, if any.
    pub path: String,
    /// HTTP method.
    pub method: String,
    /// Decoded query parameters.
    pub query: QueryParams,
}

impl Object {
    /// Build an object from a host, a request URI (path and optional query)
    /// and a method.
    #[must_use]
    pub fn new(domain: impl AsRef<str>, path: impl Into<String>, method: impl Into<String>) -> Self {
        let path = path.into();
        let query = path
            .split_once('?')
            .map(|(_, q)| QueryParams::parse(q))
            .unwrap_or_default();

        Self {
            domain: domain.as_ref().to_ascii_lowercase(),
            path,
            method: method.into(),
            query,
        }
    }

    /// Build an object from an already-parsed URL.
    #[must_use]
    pub fn from_url(url: &Url, method: impl Into<String>) -> Self {
        let path = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };

        Self::new(url.host_str().unwrap_or_default(), path, method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip() -> IpAddr {
        "127.0.0.1".parse().unwrap()
    }

    #[test]
    fn test_anonymous_subject() {
        let subject = Subject::anonymous(ip());
        assert!(subject.is_anonymous());
        assert_eq!(subject.username(), None);
        assert!(subject.groups().is_empty());
    }

    #[test]
    fn test_empty_username_is_anonymous() {
        let subject = Subject::authenticated("", ["admins"], ip());
        assert!(subject.is_anonymous());
        assert!(!subject.in_group("admins"));
    }

    #[test]
    fn test_authenticated_subject() {
        let subject = Subject::authenticated("john", ["admins", "dev"], ip());
        assert!(!subject.is_anonymous());
        assert_eq!(subject.username(), Some("john"));
        assert_eq!(subject.ip(), ip());
        assert!(subject.in_group("dev"));
        assert!(!subject.in_group("ops"));

        let identity = subject.identity().unwrap();
        assert_eq!(identity.username(), "john");
        assert_eq!(identity.groups(), ["admins", "dev"]);
    }

    #[test]
    fn test_identity_only_exists_with_username() {
        assert!(Subject::authenticated("", ["admins"], ip()).identity().is_none());
        assert!(Subject::anonymous(ip()).identity().is_none());
        assert!(
            Subject::authenticated("fred", Vec::<String>::new(), ip())
                .identity()
                .is_some_and(|i| !i.username().is_empty() && i.groups().is_empty())
        );
    }

    #[test]
    fn test_object_lowercases_domain() {
        let object = Object::new("App.Example.COM", "/", "GET");
        assert_eq!(object.domain, "app.example.com");
    }

    #[test]
    fn test_object_parses_query() {
        let object = Object::new("example.com", "/search?q=a%20b&tag=x&tag=y", "GET");
        assert_eq!(object.path, "/search?q=a%20b&tag=x&tag=y");
        assert_eq!(object.query.get_all("q"), ["a b"]);
        assert_eq!(object.query.get_all("tag"), ["x", "y"]);
        assert!(object.query.get_all("missing").is_empty());
    }

    #[test]
    fn test_object_without_query() {
        let object = Object::new("example.com", "/api", "POST");
        assert!(object.query.is_empty());
    }

    #[test]
    fn test_object_from_url() {
        let url = Url::parse("https://Secure.Example.com/admin/users?page=2").unwrap();
        let object = Object::from_url(&url, "GET");
        assert_eq!(object.domain, "secure.example.com");
        assert_eq!(object.path, "/admin/users?page=2");
        assert_eq!(object.query.get_all("page"), ["2"]);
    }
}

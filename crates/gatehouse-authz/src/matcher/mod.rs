//! Per-criterion matchers.
//!
//! Each criterion of an [`AccessControlRule`](crate::AccessControlRule) is a
//! list of entries from one of these families. Entries are built once from
//! configuration and evaluated on every request.

pub mod domain;
pub mod query;
pub mod resource;
pub mod subject;

pub use domain::DomainMatcher;
pub use query::{QueryCondition, QueryMatcher, QueryOperator};
pub use resource::ResourceMatcher;
pub use subject::{SubjectGroup, SubjectMatcher};

//! Data model types for policies, rules and decisions.
//!
//! Canonical forms:
//! - Effect: `ALLOW` or `DENY`
//! - Action key: `read` or namespaced `document:metadata:read`; `*` matches
//!   any action
//! - Subject pattern: `*`, `authenticated`, `anonymous`, `principal:<name>`,
//!   or a matcher-specific prefix such as `role:<authority>`
//! - Resource pattern: ant-style dot path, e.g. `document.metadata.*`

mod action;
mod authentication;
mod effect;
mod permission;
mod policy;
mod rule;

pub use action::Action;
pub use authentication::{Authentication, Principal};
pub use effect::Effect;
pub use permission::Permission;
pub use policy::AccessPolicy;
pub use rule::AccessRule;

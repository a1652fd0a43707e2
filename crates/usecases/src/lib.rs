//! # TenantKit Use Cases
//!
//! The concrete business operations of the toolkit: user registration and
//! account management, organization lifecycle, and the organization
//! membership state machine (invite, accept, leave, remove, role change,
//! reactivate). Every use case runs through the `tenantkit-core` execution
//! pipeline, so all of them share the same validation, authorization, hook,
//! and error-normalization behavior.
//!
//! [`Toolkit`] constructs one instance of every use case against a
//! persistence adapter and a hook registry.

pub mod memberships;
pub mod organizations;
pub mod toolkit;
pub mod users;

mod support;

#[cfg(test)]
pub(crate) mod fixtures;

pub use toolkit::Toolkit;

//! Shared test fixtures: a pinned clock, sequential ids, and seed helpers
//! writing directly to the in-memory adapter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tenantkit_core::{
    Actor, Adapters, Clock, HookRegistry, IdGenerator, MembershipRole, MemoryAdapter,
    OperationContext, Organization, OrganizationMembership, RepositoryBundle, User,
};

use crate::Toolkit;

pub(crate) struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub(crate) struct SequentialIds(AtomicU64);

impl SequentialIds {
    pub(crate) fn new() -> Self {
        Self(AtomicU64::new(0))
    }
}

impl IdGenerator for SequentialIds {
    fn generate(&self) -> String {
        format!("id-{}", self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

pub(crate) fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

/// The pinned "now" every mutation in a fixture-driven test will stamp.
pub(crate) const NOW: i64 = 1_000;

pub(crate) fn test_adapters() -> Adapters<MemoryAdapter> {
    Adapters::new(MemoryAdapter::new())
        .with_clock(Arc::new(FixedClock(at(NOW))))
        .with_ids(Arc::new(SequentialIds::new()))
}

pub(crate) fn toolkit() -> (Toolkit<MemoryAdapter>, Adapters<MemoryAdapter>) {
    let adapters = test_adapters();
    (Toolkit::new(adapters.clone(), HookRegistry::new()), adapters)
}

pub(crate) fn ctx_external(external_id: &str) -> OperationContext {
    OperationContext::new("req-test", Actor::external(external_id))
}

pub(crate) fn ctx_user(user_id: &str) -> OperationContext {
    OperationContext::new("req-test", Actor::user(user_id))
}

pub(crate) async fn seed_user(adapters: &Adapters<MemoryAdapter>, id: &str, username: &str) -> User {
    let user = User {
        id: id.to_string(),
        external_id: format!("ext-{}", id),
        username: username.to_string(),
        created_at: at(0),
        updated_at: at(0),
        deleted_at: None,
        custom_fields: None,
    };
    adapters
        .persistence
        .users()
        .insert(user)
        .await
        .expect("seed user")
}

pub(crate) async fn seed_organization(
    adapters: &Adapters<MemoryAdapter>,
    id: &str,
    owner_user_id: &str,
) -> Organization {
    let organization = Organization {
        id: id.to_string(),
        owner_user_id: owner_user_id.to_string(),
        created_at: at(0),
        updated_at: at(0),
        archived_at: None,
        deleted_at: None,
        custom_fields: None,
    };
    adapters
        .persistence
        .organizations()
        .insert(organization)
        .await
        .expect("seed organization")
}

/// An active membership row joined well before [`NOW`]. Tests derive other
/// states with struct-update syntax before inserting.
pub(crate) fn active_membership(
    id: &str,
    user_id: &str,
    username: &str,
    organization_id: &str,
    role: MembershipRole,
) -> OrganizationMembership {
    OrganizationMembership {
        id: id.to_string(),
        user_id: Some(user_id.to_string()),
        username: username.to_string(),
        organization_id: organization_id.to_string(),
        role,
        invited_at: Some(at(10)),
        joined_at: Some(at(20)),
        left_at: None,
        deleted_at: None,
        created_at: at(10),
        updated_at: at(20),
        custom_fields: None,
    }
}

pub(crate) async fn seed_membership(
    adapters: &Adapters<MemoryAdapter>,
    membership: OrganizationMembership,
) -> OrganizationMembership {
    adapters
        .persistence
        .memberships()
        .insert(membership)
        .await
        .expect("seed membership")
}

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::context::AuditContext;
use crate::error::{DomainResult, RepoResult, RepositoryError};
use crate::hooks::HookExecution;
use crate::types::{Organization, OrganizationFilter, OrganizationMembership, User};

use super::traits::{
    ObservabilityAdapter, OrganizationMembershipRepository, OrganizationRepository,
    PersistenceAdapter, RepositoryBundle, UserRepository,
};

/// In-memory persistence adapter for testing and development.
///
/// Each store is a mutex-guarded map keyed by entity id. Uniqueness that a
/// relational backend would enforce with indexes (user id, external id,
/// username) is enforced on insert and surfaces as
/// [`RepositoryError::Constraint`].
///
/// Transactions snapshot all three stores up front and restore them when
/// the work closure fails, so a failed unit of work leaves no partial
/// writes behind. The snapshot is only consistent against other
/// transactions, which is all the single-process test scenarios need.
#[derive(Default)]
pub struct MemoryAdapter {
    users: Mutex<HashMap<String, User>>,
    organizations: Mutex<HashMap<String, Organization>>,
    memberships: Mutex<HashMap<String, OrganizationMembership>>,
    membership_write_fault: Mutex<Option<u32>>,
}

struct Snapshot {
    users: HashMap<String, User>,
    organizations: HashMap<String, Organization>,
    memberships: HashMap<String, OrganizationMembership>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a one-shot fault: the next `writes` membership writes succeed and
    /// the one after that fails with a connection error, after which the
    /// fault clears. Lets callers exercise mid-transaction failures through
    /// the full stack.
    pub fn fail_membership_writes_after(&self, writes: u32) {
        *self.membership_write_fault.lock().unwrap() = Some(writes);
    }

    fn check_membership_write_fault(&self) -> RepoResult<()> {
        let mut fault = self.membership_write_fault.lock().unwrap();
        match fault.as_mut() {
            None => Ok(()),
            Some(0) => {
                *fault = None;
                Err(RepositoryError::Connection(
                    "injected membership write fault".to_string(),
                ))
            }
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            users: self.users.lock().unwrap().clone(),
            organizations: self.organizations.lock().unwrap().clone(),
            memberships: self.memberships.lock().unwrap().clone(),
        }
    }

    fn restore(&self, snapshot: Snapshot) {
        *self.users.lock().unwrap() = snapshot.users;
        *self.organizations.lock().unwrap() = snapshot.organizations;
        *self.memberships.lock().unwrap() = snapshot.memberships;
    }
}

// ── User operations ──

#[async_trait]
impl UserRepository for MemoryAdapter {
    async fn find_by_id(&self, id: &str) -> RepoResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.get(id).cloned())
    }

    async fn find_by_external_id(&self, external_id: &str) -> RepoResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .values()
            .find(|u| u.external_id == external_id)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn insert(&self, user: User) -> RepoResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&user.id) {
            return Err(RepositoryError::Constraint(format!(
                "duplicate user id: {}",
                user.id
            )));
        }
        if users.values().any(|u| u.username == user.username) {
            return Err(RepositoryError::Constraint(format!(
                "duplicate username: {}",
                user.username
            )));
        }
        if users.values().any(|u| u.external_id == user.external_id) {
            return Err(RepositoryError::Constraint(format!(
                "duplicate external id: {}",
                user.external_id
            )));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> RepoResult<User> {
        let mut users = self.users.lock().unwrap();
        if !users.contains_key(&user.id) {
            return Err(RepositoryError::Query(format!(
                "User {} does not exist",
                user.id
            )));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }
}

// ── Organization operations ──

#[async_trait]
impl OrganizationRepository for MemoryAdapter {
    async fn find_by_id(&self, id: &str) -> RepoResult<Option<Organization>> {
        let organizations = self.organizations.lock().unwrap();
        Ok(organizations.get(id).cloned())
    }

    async fn find_by_owner(&self, owner_user_id: &str) -> RepoResult<Vec<Organization>> {
        let organizations = self.organizations.lock().unwrap();
        Ok(organizations
            .values()
            .filter(|o| o.owner_user_id == owner_user_id)
            .cloned()
            .collect())
    }

    async fn find_by_ids(&self, ids: &[String]) -> RepoResult<Vec<Organization>> {
        let organizations = self.organizations.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| organizations.get(id).cloned())
            .collect())
    }

    async fn find_many(&self, filter: &OrganizationFilter) -> RepoResult<Vec<Organization>> {
        let organizations = self.organizations.lock().unwrap();
        Ok(organizations
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &OrganizationFilter) -> RepoResult<usize> {
        let organizations = self.organizations.lock().unwrap();
        Ok(organizations.values().filter(|o| filter.matches(o)).count())
    }

    async fn insert(&self, organization: Organization) -> RepoResult<Organization> {
        let mut organizations = self.organizations.lock().unwrap();
        if organizations.contains_key(&organization.id) {
            return Err(RepositoryError::Constraint(format!(
                "duplicate organization id: {}",
                organization.id
            )));
        }
        organizations.insert(organization.id.clone(), organization.clone());
        Ok(organization)
    }

    async fn update(&self, organization: Organization) -> RepoResult<Organization> {
        let mut organizations = self.organizations.lock().unwrap();
        if !organizations.contains_key(&organization.id) {
            return Err(RepositoryError::Query(format!(
                "Organization {} does not exist",
                organization.id
            )));
        }
        organizations.insert(organization.id.clone(), organization.clone());
        Ok(organization)
    }

    async fn delete(&self, id: &str) -> RepoResult<()> {
        let mut organizations = self.organizations.lock().unwrap();
        organizations.remove(id);
        Ok(())
    }
}

// ── Membership operations ──

/// Pair lookups return the live row when one exists and fall back to a
/// removed row otherwise, so removed history stays addressable without
/// shadowing its replacement.
fn live_row_first<'a, I>(rows: I) -> Option<OrganizationMembership>
where
    I: Iterator<Item = &'a OrganizationMembership>,
{
    let mut removed = None;
    for row in rows {
        if !row.is_deleted() {
            return Some(row.clone());
        }
        if removed.is_none() {
            removed = Some(row.clone());
        }
    }
    removed
}

#[async_trait]
impl OrganizationMembershipRepository for MemoryAdapter {
    async fn find_by_id(&self, id: &str) -> RepoResult<Option<OrganizationMembership>> {
        let memberships = self.memberships.lock().unwrap();
        Ok(memberships.get(id).cloned())
    }

    async fn find_by_user_id_and_organization_id(
        &self,
        user_id: &str,
        organization_id: &str,
    ) -> RepoResult<Option<OrganizationMembership>> {
        let memberships = self.memberships.lock().unwrap();
        Ok(live_row_first(memberships.values().filter(|m| {
            m.user_id.as_deref() == Some(user_id) && m.organization_id == organization_id
        })))
    }

    async fn find_by_username_and_organization_id(
        &self,
        username: &str,
        organization_id: &str,
    ) -> RepoResult<Option<OrganizationMembership>> {
        let memberships = self.memberships.lock().unwrap();
        Ok(live_row_first(memberships.values().filter(|m| {
            m.username == username && m.organization_id == organization_id
        })))
    }

    async fn find_by_user(&self, user_id: &str) -> RepoResult<Vec<OrganizationMembership>> {
        let memberships = self.memberships.lock().unwrap();
        Ok(memberships
            .values()
            .filter(|m| m.user_id.as_deref() == Some(user_id))
            .cloned()
            .collect())
    }

    async fn find_by_organization(
        &self,
        organization_id: &str,
    ) -> RepoResult<Vec<OrganizationMembership>> {
        let memberships = self.memberships.lock().unwrap();
        Ok(memberships
            .values()
            .filter(|m| m.organization_id == organization_id)
            .cloned()
            .collect())
    }

    async fn insert(
        &self,
        membership: OrganizationMembership,
    ) -> RepoResult<OrganizationMembership> {
        self.check_membership_write_fault()?;
        let mut memberships = self.memberships.lock().unwrap();
        if memberships.contains_key(&membership.id) {
            return Err(RepositoryError::Constraint(format!(
                "duplicate membership id: {}",
                membership.id
            )));
        }
        // One live row per (user | username, organization); removed rows
        // stay behind as history and do not block a new one.
        let duplicate = memberships.values().any(|m| {
            m.organization_id == membership.organization_id
                && !m.is_deleted()
                && match (&membership.user_id, &m.user_id) {
                    (Some(new_uid), Some(uid)) => new_uid == uid,
                    _ => m.username == membership.username,
                }
        });
        if duplicate {
            return Err(RepositoryError::Constraint(format!(
                "duplicate membership for {} in organization {}",
                membership.username, membership.organization_id
            )));
        }
        memberships.insert(membership.id.clone(), membership.clone());
        Ok(membership)
    }

    async fn update(
        &self,
        membership: OrganizationMembership,
    ) -> RepoResult<OrganizationMembership> {
        self.check_membership_write_fault()?;
        let mut memberships = self.memberships.lock().unwrap();
        if !memberships.contains_key(&membership.id) {
            return Err(RepositoryError::Query(format!(
                "Membership {} does not exist",
                membership.id
            )));
        }
        memberships.insert(membership.id.clone(), membership.clone());
        Ok(membership)
    }

    async fn delete(&self, id: &str) -> RepoResult<()> {
        self.check_membership_write_fault()?;
        let mut memberships = self.memberships.lock().unwrap();
        memberships.remove(id);
        Ok(())
    }

    async fn link_username_memberships_to_user_id(
        &self,
        username: &str,
        user_id: &str,
    ) -> RepoResult<usize> {
        let mut memberships = self.memberships.lock().unwrap();
        let mut linked = 0;
        for membership in memberships.values_mut() {
            if membership.username == username && membership.user_id.is_none() {
                membership.user_id = Some(user_id.to_string());
                linked += 1;
            }
        }
        Ok(linked)
    }
}

impl RepositoryBundle for MemoryAdapter {
    fn users(&self) -> &dyn UserRepository {
        self
    }

    fn organizations(&self) -> &dyn OrganizationRepository {
        self
    }

    fn memberships(&self) -> &dyn OrganizationMembershipRepository {
        self
    }
}

impl PersistenceAdapter for MemoryAdapter {
    type Tx = Self;

    fn transaction<'a, T, F>(
        &'a self,
        audit: AuditContext,
        work: F,
    ) -> BoxFuture<'a, DomainResult<T>>
    where
        T: Send + 'a,
        F: for<'t> FnOnce(&'t Self::Tx) -> BoxFuture<'t, DomainResult<T>> + Send + 'a,
    {
        Box::pin(async move {
            let snapshot = self.snapshot();
            tracing::debug!(action = audit.action, "Begin in-memory transaction");
            match work(self).await {
                Ok(value) => {
                    tracing::debug!(action = audit.action, "Commit in-memory transaction");
                    Ok(value)
                }
                Err(err) => {
                    self.restore(snapshot);
                    tracing::debug!(
                        action = audit.action,
                        error = %err,
                        "Rolled back in-memory transaction"
                    );
                    Err(err)
                }
            }
        })
    }
}

/// Observability sink that records hook events in memory, for tests and
/// local development.
#[derive(Default)]
pub struct MemoryObservability {
    events: Mutex<Vec<HookExecution>>,
}

impl MemoryObservability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HookExecution> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObservabilityAdapter for MemoryObservability {
    async fn log_hook_execution(&self, event: HookExecution) -> DomainResult<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainError;
    use crate::types::MembershipRole;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn user(id: &str, username: &str) -> User {
        User {
            id: id.to_string(),
            external_id: format!("ext-{}", id),
            username: username.to_string(),
            created_at: at(0),
            updated_at: at(0),
            deleted_at: None,
            custom_fields: None,
        }
    }

    fn organization(id: &str, owner: &str) -> Organization {
        Organization {
            id: id.to_string(),
            owner_user_id: owner.to_string(),
            created_at: at(0),
            updated_at: at(0),
            archived_at: None,
            deleted_at: None,
            custom_fields: None,
        }
    }

    fn membership(id: &str, username: &str, organization_id: &str) -> OrganizationMembership {
        OrganizationMembership {
            id: id.to_string(),
            user_id: None,
            username: username.to_string(),
            organization_id: organization_id.to_string(),
            role: MembershipRole::Member,
            invited_at: Some(at(0)),
            joined_at: None,
            left_at: None,
            deleted_at: None,
            created_at: at(0),
            updated_at: at(0),
            custom_fields: None,
        }
    }

    #[tokio::test]
    async fn test_user_lookups() {
        let db = MemoryAdapter::new();
        db.users().insert(user("u1", "a@x.com")).await.unwrap();

        assert!(db.users().find_by_id("u1").await.unwrap().is_some());
        assert!(db
            .users()
            .find_by_external_id("ext-u1")
            .await
            .unwrap()
            .is_some());
        assert!(db
            .users()
            .find_by_username("a@x.com")
            .await
            .unwrap()
            .is_some());
        assert!(db.users().find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_user_insert_enforces_uniqueness() {
        let db = MemoryAdapter::new();
        db.users().insert(user("u1", "a@x.com")).await.unwrap();

        let err = db
            .users()
            .insert(user("u2", "a@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_update_of_missing_user_fails() {
        let db = MemoryAdapter::new();
        let err = db.users().update(user("ghost", "g@x.com")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Query(_)));
    }

    #[tokio::test]
    async fn test_pair_finders_return_removed_rows_until_replaced() {
        let db = MemoryAdapter::new();
        let removed = OrganizationMembership {
            deleted_at: Some(at(50)),
            ..membership("m1", "a@x.com", "org1")
        };
        db.memberships().insert(removed).await.unwrap();

        // A removed row is still addressable by its pair, so callers can
        // see that the membership once existed.
        let found = db
            .memberships()
            .find_by_username_and_organization_id("a@x.com", "org1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "m1");

        // It does not block a new row for the same pair, and once a live
        // row exists the lookup prefers it.
        db.memberships()
            .insert(membership("m2", "a@x.com", "org1"))
            .await
            .unwrap();
        let found = db
            .memberships()
            .find_by_username_and_organization_id("a@x.com", "org1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "m2");
    }

    #[tokio::test]
    async fn test_armed_write_fault_fires_once_then_clears() {
        let db = MemoryAdapter::new();
        db.fail_membership_writes_after(1);

        db.memberships()
            .insert(membership("m1", "a@x.com", "org1"))
            .await
            .unwrap();
        let err = db
            .memberships()
            .insert(membership("m2", "b@x.com", "org1"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Connection(_)));

        // The fault is consumed; later writes succeed again.
        db.memberships()
            .insert(membership("m2", "b@x.com", "org1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_membership_insert_rejects_second_live_row() {
        let db = MemoryAdapter::new();
        db.memberships()
            .insert(membership("m1", "a@x.com", "org1"))
            .await
            .unwrap();

        let err = db
            .memberships()
            .insert(membership("m2", "a@x.com", "org1"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Constraint(_)));

        // Same username in another organization is fine.
        db.memberships()
            .insert(membership("m3", "a@x.com", "org2"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_link_username_memberships() {
        let db = MemoryAdapter::new();
        db.memberships()
            .insert(membership("m1", "a@x.com", "org1"))
            .await
            .unwrap();
        db.memberships()
            .insert(membership("m2", "a@x.com", "org2"))
            .await
            .unwrap();
        let linked_already = OrganizationMembership {
            user_id: Some("u9".to_string()),
            ..membership("m3", "a@x.com", "org3")
        };
        db.memberships().insert(linked_already).await.unwrap();
        db.memberships()
            .insert(membership("m4", "b@x.com", "org1"))
            .await
            .unwrap();

        let linked = db
            .memberships()
            .link_username_memberships_to_user_id("a@x.com", "u1")
            .await
            .unwrap();

        assert_eq!(linked, 2);
        let m1 = db.memberships().find_by_id("m1").await.unwrap().unwrap();
        assert_eq!(m1.user_id.as_deref(), Some("u1"));
        let m3 = db.memberships().find_by_id("m3").await.unwrap().unwrap();
        assert_eq!(m3.user_id.as_deref(), Some("u9"));
        let m4 = db.memberships().find_by_id("m4").await.unwrap().unwrap();
        assert_eq!(m4.user_id, None);
    }

    #[tokio::test]
    async fn test_find_many_applies_filter() {
        let db = MemoryAdapter::new();
        db.organizations()
            .insert(organization("org1", "u1"))
            .await
            .unwrap();
        let archived = Organization {
            archived_at: Some(at(10)),
            ..organization("org2", "u1")
        };
        db.organizations().insert(archived).await.unwrap();
        let deleted = Organization {
            deleted_at: Some(at(20)),
            ..organization("org3", "u1")
        };
        db.organizations().insert(deleted).await.unwrap();
        db.organizations()
            .insert(organization("org4", "u2"))
            .await
            .unwrap();

        let active_u1 = db
            .organizations()
            .find_many(&OrganizationFilter::new().with_owner("u1"))
            .await
            .unwrap();
        assert_eq!(active_u1.len(), 1);
        assert_eq!(active_u1[0].id, "org1");

        let with_archived = db
            .organizations()
            .find_many(&OrganizationFilter::new().with_owner("u1").include_archived())
            .await
            .unwrap();
        assert_eq!(with_archived.len(), 2);

        let everything = db
            .organizations()
            .count(
                &OrganizationFilter::new()
                    .include_archived()
                    .include_deleted(),
            )
            .await
            .unwrap();
        assert_eq!(everything, 4);
    }

    #[tokio::test]
    async fn test_transaction_commits_all_writes() {
        let db = MemoryAdapter::new();
        let audit = AuditContext::new("create-organization");

        db.transaction(audit, |tx| {
            Box::pin(async move {
                tx.organizations()
                    .insert(organization("org1", "u1"))
                    .await?;
                tx.memberships()
                    .insert(membership("m1", "a@x.com", "org1"))
                    .await?;
                Ok(())
            })
        })
        .await
        .unwrap();

        assert!(db
            .organizations()
            .find_by_id("org1")
            .await
            .unwrap()
            .is_some());
        assert!(db.memberships().find_by_id("m1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_transaction_rolls_back_every_store() {
        let db = MemoryAdapter::new();
        db.users().insert(user("u1", "a@x.com")).await.unwrap();

        let result: DomainResult<()> = db
            .transaction(AuditContext::new("add-organization-member"), |tx| {
                Box::pin(async move {
                    tx.organizations()
                        .insert(organization("org1", "u1"))
                        .await?;
                    tx.memberships()
                        .insert(membership("m1", "a@x.com", "org1"))
                        .await?;
                    let changed = User {
                        username: "renamed@x.com".to_string(),
                        ..user("u1", "a@x.com")
                    };
                    tx.users().update(changed).await?;
                    Err(DomainError::conflict("forced failure"))
                })
            })
            .await;
        assert!(result.is_err());

        // Nothing from the failed unit of work is visible.
        assert!(db
            .organizations()
            .find_by_id("org1")
            .await
            .unwrap()
            .is_none());
        assert!(db.memberships().find_by_id("m1").await.unwrap().is_none());
        let u1 = db.users().find_by_id("u1").await.unwrap().unwrap();
        assert_eq!(u1.username, "a@x.com");
    }

    #[tokio::test]
    async fn test_memory_observability_records_events() {
        use crate::hooks::{HookOutcome, HookStage};
        use crate::pipeline::UseCaseName;

        let sink = MemoryObservability::new();
        sink.log_hook_execution(HookExecution {
            execution_id: "exec-1".to_string(),
            use_case: UseCaseName::new("echo-message"),
            stage: HookStage::OnStart,
            outcome: HookOutcome::Completed,
            at: at(0),
        })
        .await
        .unwrap();

        assert_eq!(sink.events().len(), 1);
        assert_eq!(sink.events()[0].execution_id, "exec-1");
    }
}

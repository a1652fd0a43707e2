use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;

use crate::context::AuditContext;
use crate::error::{DomainResult, RepoResult};
use crate::hooks::HookExecution;
use crate::types::{Organization, OrganizationFilter, OrganizationMembership, User};

/// User persistence operations.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> RepoResult<Option<User>>;
    async fn find_by_external_id(&self, external_id: &str) -> RepoResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    async fn insert(&self, user: User) -> RepoResult<User>;
    async fn update(&self, user: User) -> RepoResult<User>;
}

/// Organization persistence operations.
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> RepoResult<Option<Organization>>;
    async fn find_by_owner(&self, owner_user_id: &str) -> RepoResult<Vec<Organization>>;
    async fn find_by_ids(&self, ids: &[String]) -> RepoResult<Vec<Organization>>;
    async fn find_many(&self, filter: &OrganizationFilter) -> RepoResult<Vec<Organization>>;
    async fn count(&self, filter: &OrganizationFilter) -> RepoResult<usize>;
    async fn insert(&self, organization: Organization) -> RepoResult<Organization>;
    async fn update(&self, organization: Organization) -> RepoResult<Organization>;
    async fn delete(&self, id: &str) -> RepoResult<()>;
}

/// Organization membership persistence operations.
///
/// Memberships are addressed by the composite natural key
/// `(user_id | username, organization_id)`; `username` covers pending
/// invitations whose user has not registered yet.
#[async_trait]
pub trait OrganizationMembershipRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> RepoResult<Option<OrganizationMembership>>;
    async fn find_by_user_id_and_organization_id(
        &self,
        user_id: &str,
        organization_id: &str,
    ) -> RepoResult<Option<OrganizationMembership>>;
    async fn find_by_username_and_organization_id(
        &self,
        username: &str,
        organization_id: &str,
    ) -> RepoResult<Option<OrganizationMembership>>;
    async fn find_by_user(&self, user_id: &str) -> RepoResult<Vec<OrganizationMembership>>;
    async fn find_by_organization(
        &self,
        organization_id: &str,
    ) -> RepoResult<Vec<OrganizationMembership>>;
    async fn insert(
        &self,
        membership: OrganizationMembership,
    ) -> RepoResult<OrganizationMembership>;
    async fn update(
        &self,
        membership: OrganizationMembership,
    ) -> RepoResult<OrganizationMembership>;
    async fn delete(&self, id: &str) -> RepoResult<()>;

    /// Populate `user_id` on every membership still addressed only by
    /// `username`. Returns the number of linked rows. Called when a user
    /// registers so pending invitations attach to the new account.
    async fn link_username_memberships_to_user_id(
        &self,
        username: &str,
        user_id: &str,
    ) -> RepoResult<usize>;
}

/// Accessor trio over the three repositories. Implemented by the adapter
/// itself for non-transactional reads and by its transactional bundle.
pub trait RepositoryBundle: Send + Sync {
    fn users(&self) -> &dyn UserRepository;
    fn organizations(&self) -> &dyn OrganizationRepository;
    fn memberships(&self) -> &dyn OrganizationMembershipRepository;
}

/// Persistence port: repository access plus the unit of work.
///
/// `transaction` runs `work` against the transactional bundle `Tx`; all
/// writes performed through that bundle commit or roll back as one atomic
/// unit. The audit context tags the transaction with the action name,
/// organization id, and request id.
pub trait PersistenceAdapter: RepositoryBundle + 'static {
    type Tx: RepositoryBundle;

    fn transaction<'a, T, F>(
        &'a self,
        audit: AuditContext,
        work: F,
    ) -> BoxFuture<'a, DomainResult<T>>
    where
        T: Send + 'a,
        F: for<'t> FnOnce(&'t Self::Tx) -> BoxFuture<'t, DomainResult<T>> + Send + 'a;
}

/// Wall-clock source.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Id source for entities and execution ids.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Optional sink for pipeline hook-execution events.
///
/// Events are dispatched as detached tasks; a failing sink is logged and
/// never affects the pipeline.
#[async_trait]
pub trait ObservabilityAdapter: Send + Sync {
    async fn log_hook_execution(&self, event: HookExecution) -> DomainResult<()>;
}

//! Shared lookups and guards used by the use cases.
//!
//! These run against the non-transactional repository bundle, so they are
//! subject to time-of-check races against concurrent writers; use cases
//! re-validate critical preconditions inside their transaction.

use tenantkit_core::{
    Actor, Adapters, DomainError, DomainResult, MembershipRole, OperationContext, Organization,
    OrganizationMembership, PersistenceAdapter, User,
};

/// Resolve the acting principal to a live user record.
///
/// Soft-deleted users cannot act; they resolve the same as missing ones.
pub(crate) async fn resolve_actor<P: PersistenceAdapter>(
    adapters: &Adapters<P>,
    ctx: &OperationContext,
) -> DomainResult<User> {
    let found = match &ctx.actor {
        Actor::External { external_id } => {
            adapters
                .persistence
                .users()
                .find_by_external_id(external_id)
                .await?
        }
        Actor::User { user_id } => adapters.persistence.users().find_by_id(user_id).await?,
    };
    match found {
        Some(user) if !user.is_deleted() => Ok(user),
        _ => Err(DomainError::not_found("User", actor_identifier(&ctx.actor))),
    }
}

fn actor_identifier(actor: &Actor) -> String {
    match actor {
        Actor::External { external_id } => external_id.clone(),
        Actor::User { user_id } => user_id.clone(),
    }
}

pub(crate) async fn require_organization<P: PersistenceAdapter>(
    adapters: &Adapters<P>,
    organization_id: &str,
) -> DomainResult<Organization> {
    adapters
        .persistence
        .organizations()
        .find_by_id(organization_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Organization", organization_id))
}

/// The actor's membership row in the organization, if a non-removed one
/// exists. Removed rows are history and never stand in for the actor.
pub(crate) async fn actor_membership<P: PersistenceAdapter>(
    adapters: &Adapters<P>,
    user_id: &str,
    organization_id: &str,
) -> DomainResult<Option<OrganizationMembership>> {
    Ok(adapters
        .persistence
        .memberships()
        .find_by_user_id_and_organization_id(user_id, organization_id)
        .await?
        .filter(|m| !m.is_deleted()))
}

/// Whether a membership entitles its holder to admin-level actions: the
/// member must currently be active and hold the admin role.
pub(crate) fn is_active_admin(membership: Option<&OrganizationMembership>) -> bool {
    membership.map_or(false, |m| m.is_active() && m.role == MembershipRole::Admin)
}

/// Resolve the actor and organization, requiring the actor to be the
/// organization owner.
pub(crate) async fn require_owner_actor<P: PersistenceAdapter>(
    adapters: &Adapters<P>,
    ctx: &OperationContext,
    organization_id: &str,
    denial: &'static str,
) -> DomainResult<(User, Organization)> {
    let actor = resolve_actor(adapters, ctx).await?;
    let organization = require_organization(adapters, organization_id).await?;
    if actor.id != organization.owner_user_id {
        return Err(DomainError::unauthorized(denial));
    }
    Ok((actor, organization))
}

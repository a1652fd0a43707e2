//! Archive, restore, delete, and ownership transfer.
//!
//! Organizations move active → archived ⇄ active → deleted; deletion is
//! terminal. Ownership transfer is the only operation that changes
//! `owner_user_id`, and it rewrites both affected membership roles in the
//! same transaction.

use async_trait::async_trait;

use tenantkit_core::{
    Adapters, AuditContext, DomainError, DomainResult, HookRegistry, MembershipRole,
    OperationContext, Organization, OrganizationMembership, PersistenceAdapter, Pipeline,
    RepositoryBundle, UseCase, UseCaseName,
};

use super::types::{
    ArchiveOrganizationInput, DeleteOrganizationInput, RestoreOrganizationInput,
    TransferOrganizationOwnershipInput,
};
use crate::support::{require_organization, require_owner_actor};

pub const ARCHIVE_ORGANIZATION: UseCaseName = UseCaseName::new("archive-organization");
pub const RESTORE_ORGANIZATION: UseCaseName = UseCaseName::new("restore-organization");
pub const DELETE_ORGANIZATION: UseCaseName = UseCaseName::new("delete-organization");
pub const TRANSFER_ORGANIZATION_OWNERSHIP: UseCaseName =
    UseCaseName::new("transfer-organization-ownership");

/// Owner-only; fails if the organization is already archived or deleted.
pub struct ArchiveOrganization<P: PersistenceAdapter> {
    pipeline: Pipeline,
    adapters: Adapters<P>,
}

impl<P: PersistenceAdapter> ArchiveOrganization<P> {
    pub fn new(adapters: Adapters<P>, hooks: &HookRegistry) -> Self {
        Self {
            pipeline: Pipeline::new(ARCHIVE_ORGANIZATION, &adapters, hooks),
            adapters,
        }
    }
}

#[async_trait]
impl<P: PersistenceAdapter> UseCase for ArchiveOrganization<P> {
    type Input = ArchiveOrganizationInput;
    type Output = Organization;

    const NAME: UseCaseName = ARCHIVE_ORGANIZATION;

    fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    fn failure_message(&self) -> &'static str {
        "Failed to archive organization"
    }

    async fn authorize(
        &self,
        input: &ArchiveOrganizationInput,
        ctx: &OperationContext,
    ) -> DomainResult<()> {
        require_owner_actor(
            &self.adapters,
            ctx,
            &input.organization_id,
            "Only the organization owner can archive the organization",
        )
        .await?;
        Ok(())
    }

    async fn perform(
        &self,
        input: ArchiveOrganizationInput,
        ctx: &OperationContext,
    ) -> DomainResult<Organization> {
        let organization = require_organization(&self.adapters, &input.organization_id).await?;
        if organization.is_deleted() {
            return Err(DomainError::validation("Organization has been deleted"));
        }
        if organization.is_archived() {
            return Err(DomainError::validation("Organization is already archived"));
        }

        let now = self.adapters.clock.now();
        let archived = Organization {
            archived_at: Some(now),
            updated_at: now,
            ..organization
        };

        let audit = AuditContext::new("archive-organization")
            .with_organization(input.organization_id.clone())
            .with_request(ctx.request_id.clone());
        self.adapters
            .persistence
            .transaction(audit, move |tx| {
                Box::pin(async move { Ok(tx.organizations().update(archived).await?) })
            })
            .await
    }
}

/// Owner-only; requires the organization to be archived and not deleted.
pub struct RestoreOrganization<P: PersistenceAdapter> {
    pipeline: Pipeline,
    adapters: Adapters<P>,
}

impl<P: PersistenceAdapter> RestoreOrganization<P> {
    pub fn new(adapters: Adapters<P>, hooks: &HookRegistry) -> Self {
        Self {
            pipeline: Pipeline::new(RESTORE_ORGANIZATION, &adapters, hooks),
            adapters,
        }
    }
}

#[async_trait]
impl<P: PersistenceAdapter> UseCase for RestoreOrganization<P> {
    type Input = RestoreOrganizationInput;
    type Output = Organization;

    const NAME: UseCaseName = RESTORE_ORGANIZATION;

    fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    fn failure_message(&self) -> &'static str {
        "Failed to restore organization"
    }

    async fn authorize(
        &self,
        input: &RestoreOrganizationInput,
        ctx: &OperationContext,
    ) -> DomainResult<()> {
        require_owner_actor(
            &self.adapters,
            ctx,
            &input.organization_id,
            "Only the organization owner can restore the organization",
        )
        .await?;
        Ok(())
    }

    async fn perform(
        &self,
        input: RestoreOrganizationInput,
        ctx: &OperationContext,
    ) -> DomainResult<Organization> {
        let organization = require_organization(&self.adapters, &input.organization_id).await?;
        if organization.is_deleted() {
            return Err(DomainError::validation("Organization has been deleted"));
        }
        if !organization.is_archived() {
            return Err(DomainError::validation("Organization is not archived"));
        }

        let restored = Organization {
            archived_at: None,
            updated_at: self.adapters.clock.now(),
            ..organization
        };

        let audit = AuditContext::new("restore-organization")
            .with_organization(input.organization_id.clone())
            .with_request(ctx.request_id.clone());
        self.adapters
            .persistence
            .transaction(audit, move |tx| {
                Box::pin(async move { Ok(tx.organizations().update(restored).await?) })
            })
            .await
    }
}

/// Owner-only soft delete. Terminal: a deleted organization can never be
/// archived, restored, or have its ownership transferred. The row and its
/// memberships stay behind as history.
pub struct DeleteOrganization<P: PersistenceAdapter> {
    pipeline: Pipeline,
    adapters: Adapters<P>,
}

impl<P: PersistenceAdapter> DeleteOrganization<P> {
    pub fn new(adapters: Adapters<P>, hooks: &HookRegistry) -> Self {
        Self {
            pipeline: Pipeline::new(DELETE_ORGANIZATION, &adapters, hooks),
            adapters,
        }
    }
}

#[async_trait]
impl<P: PersistenceAdapter> UseCase for DeleteOrganization<P> {
    type Input = DeleteOrganizationInput;
    type Output = Organization;

    const NAME: UseCaseName = DELETE_ORGANIZATION;

    fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    fn failure_message(&self) -> &'static str {
        "Failed to delete organization"
    }

    async fn authorize(
        &self,
        input: &DeleteOrganizationInput,
        ctx: &OperationContext,
    ) -> DomainResult<()> {
        require_owner_actor(
            &self.adapters,
            ctx,
            &input.organization_id,
            "Only the organization owner can delete the organization",
        )
        .await?;
        Ok(())
    }

    async fn perform(
        &self,
        input: DeleteOrganizationInput,
        ctx: &OperationContext,
    ) -> DomainResult<Organization> {
        let organization = require_organization(&self.adapters, &input.organization_id).await?;
        if organization.is_deleted() {
            return Err(DomainError::validation(
                "Organization has already been deleted",
            ));
        }

        let now = self.adapters.clock.now();
        let deleted = Organization {
            deleted_at: Some(now),
            updated_at: now,
            ..organization
        };

        let audit = AuditContext::new("delete-organization")
            .with_organization(input.organization_id.clone())
            .with_request(ctx.request_id.clone());
        self.adapters
            .persistence
            .transaction(audit, move |tx| {
                Box::pin(async move { Ok(tx.organizations().update(deleted).await?) })
            })
            .await
    }
}

/// Moves `owner_user_id` to another active member.
///
/// The organization update, the old owner's demotion to member, and the
/// new owner's promotion all commit in one transaction.
pub struct TransferOrganizationOwnership<P: PersistenceAdapter> {
    pipeline: Pipeline,
    adapters: Adapters<P>,
}

impl<P: PersistenceAdapter> TransferOrganizationOwnership<P> {
    pub fn new(adapters: Adapters<P>, hooks: &HookRegistry) -> Self {
        Self {
            pipeline: Pipeline::new(TRANSFER_ORGANIZATION_OWNERSHIP, &adapters, hooks),
            adapters,
        }
    }
}

#[async_trait]
impl<P: PersistenceAdapter> UseCase for TransferOrganizationOwnership<P> {
    type Input = TransferOrganizationOwnershipInput;
    type Output = Organization;

    const NAME: UseCaseName = TRANSFER_ORGANIZATION_OWNERSHIP;

    fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    fn failure_message(&self) -> &'static str {
        "Failed to transfer organization ownership"
    }

    async fn authorize(
        &self,
        input: &TransferOrganizationOwnershipInput,
        ctx: &OperationContext,
    ) -> DomainResult<()> {
        let (_, organization) = require_owner_actor(
            &self.adapters,
            ctx,
            &input.organization_id,
            "Only the organization owner can transfer ownership",
        )
        .await?;
        if organization.is_deleted() {
            return Err(DomainError::validation("Organization has been deleted"));
        }
        Ok(())
    }

    async fn perform(
        &self,
        input: TransferOrganizationOwnershipInput,
        ctx: &OperationContext,
    ) -> DomainResult<Organization> {
        let organization = require_organization(&self.adapters, &input.organization_id).await?;
        if organization.is_deleted() {
            return Err(DomainError::validation("Organization has been deleted"));
        }
        if input.new_owner_user_id == organization.owner_user_id {
            return Err(DomainError::validation(
                "New owner must differ from the current owner",
            ));
        }

        let users = self.adapters.persistence.users();
        users
            .find_by_id(&input.new_owner_user_id)
            .await?
            .filter(|u| !u.is_deleted())
            .ok_or_else(|| DomainError::not_found("User", input.new_owner_user_id.clone()))?;

        let memberships = self.adapters.persistence.memberships();
        let new_owner_membership = memberships
            .find_by_user_id_and_organization_id(&input.new_owner_user_id, &organization.id)
            .await?
            .filter(|m| m.is_active())
            .ok_or_else(|| {
                DomainError::validation("New owner must be an active member of the organization")
            })?;
        let current_owner_membership = memberships
            .find_by_user_id_and_organization_id(&organization.owner_user_id, &organization.id)
            .await?
            .filter(|m| m.is_active())
            .ok_or_else(|| {
                DomainError::validation("Current owner's membership is not active")
            })?;

        let now = self.adapters.clock.now();
        let transferred = Organization {
            owner_user_id: input.new_owner_user_id.clone(),
            updated_at: now,
            ..organization
        };
        let demoted = OrganizationMembership {
            role: MembershipRole::Member,
            updated_at: now,
            ..current_owner_membership
        };
        let promoted = OrganizationMembership {
            role: MembershipRole::Owner,
            updated_at: now,
            ..new_owner_membership
        };

        let audit = AuditContext::new("transfer-organization-ownership")
            .with_organization(input.organization_id.clone())
            .with_request(ctx.request_id.clone());
        self.adapters
            .persistence
            .transaction(audit, move |tx| {
                Box::pin(async move {
                    let updated = tx.organizations().update(transferred).await?;
                    tx.memberships().update(demoted).await?;
                    tx.memberships().update(promoted).await?;
                    Ok(updated)
                })
            })
            .await
    }
}

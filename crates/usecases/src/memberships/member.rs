//! Member side of the membership state machine: leaving, removal, role
//! changes, and listing.
//!
//! Removal is the model's only hard delete; every other transition keeps
//! the row as history. Two deliberately asymmetric rules live here: an
//! admin may demote another admin to member (the check is against the
//! requested role) but may never remove another admin (the check is
//! against the target's current role).

use async_trait::async_trait;

use tenantkit_core::{
    Adapters, AuditContext, DomainError, DomainResult, FieldViolation, HookRegistry,
    MembershipRole, OperationContext, OrganizationMembership, PersistenceAdapter, Pipeline,
    RepositoryBundle, RuleSet, SchemaValidator, UseCase, UseCaseName, Validator, ValidatorChain,
};

use super::types::{
    LeaveOrganizationInput, ListOrganizationMembersInput, OrganizationMemberList,
    RemoveOrganizationMemberInput, UpdateOrganizationMemberRoleInput,
};
use crate::support::{actor_membership, is_active_admin, require_organization, resolve_actor};

pub const LEAVE_ORGANIZATION: UseCaseName = UseCaseName::new("leave-organization");
pub const REMOVE_ORGANIZATION_MEMBER: UseCaseName = UseCaseName::new("remove-organization-member");
pub const UPDATE_ORGANIZATION_MEMBER_ROLE: UseCaseName =
    UseCaseName::new("update-organization-member-role");
pub const LIST_ORGANIZATION_MEMBERS: UseCaseName = UseCaseName::new("list-organization-members");

/// The actor leaves the organization voluntarily. The row stays behind
/// with `left_at` set, which is what later allows reactivation.
pub struct LeaveOrganization<P: PersistenceAdapter> {
    pipeline: Pipeline,
    adapters: Adapters<P>,
}

impl<P: PersistenceAdapter> LeaveOrganization<P> {
    pub fn new(adapters: Adapters<P>, hooks: &HookRegistry) -> Self {
        Self {
            pipeline: Pipeline::new(LEAVE_ORGANIZATION, &adapters, hooks),
            adapters,
        }
    }
}

#[async_trait]
impl<P: PersistenceAdapter> UseCase for LeaveOrganization<P> {
    type Input = LeaveOrganizationInput;
    type Output = OrganizationMembership;

    const NAME: UseCaseName = LEAVE_ORGANIZATION;

    fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    fn failure_message(&self) -> &'static str {
        "Failed to leave organization"
    }

    async fn authorize(
        &self,
        input: &LeaveOrganizationInput,
        ctx: &OperationContext,
    ) -> DomainResult<()> {
        let actor = resolve_actor(&self.adapters, ctx).await?;
        let organization = require_organization(&self.adapters, &input.organization_id).await?;
        if actor.id == organization.owner_user_id {
            return Err(DomainError::validation(
                "The organization owner cannot leave the organization. Transfer ownership first.",
            ));
        }
        Ok(())
    }

    async fn perform(
        &self,
        input: LeaveOrganizationInput,
        ctx: &OperationContext,
    ) -> DomainResult<OrganizationMembership> {
        let actor = resolve_actor(&self.adapters, ctx).await?;
        let membership = actor_membership(&self.adapters, &actor.id, &input.organization_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(
                    "Membership",
                    format!("user {} in organization {}", actor.id, input.organization_id),
                )
            })?;
        if membership.has_left() {
            return Err(DomainError::validation(
                "Member has already left the organization",
            ));
        }

        let now = self.adapters.clock.now();
        let left = OrganizationMembership {
            left_at: Some(now),
            updated_at: now,
            ..membership
        };

        let audit = AuditContext::new("leave-organization")
            .with_organization(input.organization_id.clone())
            .with_request(ctx.request_id.clone());
        self.adapters
            .persistence
            .transaction(audit, move |tx| {
                Box::pin(async move { Ok(tx.memberships().update(left).await?) })
            })
            .await
    }
}

/// Physically deletes a membership row.
///
/// The owner may remove anyone but themselves; an active admin may only
/// remove plain members. This is the one hard delete in the model, so the
/// target's existence is re-checked inside the transaction before the row
/// goes away.
pub struct RemoveOrganizationMember<P: PersistenceAdapter> {
    pipeline: Pipeline,
    adapters: Adapters<P>,
}

impl<P: PersistenceAdapter> RemoveOrganizationMember<P> {
    pub fn new(adapters: Adapters<P>, hooks: &HookRegistry) -> Self {
        Self {
            pipeline: Pipeline::new(REMOVE_ORGANIZATION_MEMBER, &adapters, hooks),
            adapters,
        }
    }
}

#[async_trait]
impl<P: PersistenceAdapter> UseCase for RemoveOrganizationMember<P> {
    type Input = RemoveOrganizationMemberInput;
    type Output = OrganizationMembership;

    const NAME: UseCaseName = REMOVE_ORGANIZATION_MEMBER;

    fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    fn failure_message(&self) -> &'static str {
        "Failed to remove organization member"
    }

    async fn authorize(
        &self,
        input: &RemoveOrganizationMemberInput,
        ctx: &OperationContext,
    ) -> DomainResult<()> {
        let actor = resolve_actor(&self.adapters, ctx).await?;
        let organization = require_organization(&self.adapters, &input.organization_id).await?;
        let target = self
            .adapters
            .persistence
            .memberships()
            .find_by_id(&input.membership_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Membership", input.membership_id.clone()))?;
        if target.organization_id != input.organization_id {
            return Err(DomainError::validation(
                "Member does not belong to this organization",
            ));
        }
        if target.role == MembershipRole::Owner
            || target.user_id.as_deref() == Some(organization.owner_user_id.as_str())
        {
            return Err(DomainError::validation(
                "The organization owner cannot be removed. Transfer ownership first.",
            ));
        }
        if actor.id == organization.owner_user_id {
            return Ok(());
        }
        let membership = actor_membership(&self.adapters, &actor.id, &organization.id).await?;
        if is_active_admin(membership.as_ref()) && target.role == MembershipRole::Member {
            return Ok(());
        }
        Err(DomainError::unauthorized("Insufficient permissions"))
    }

    async fn perform(
        &self,
        input: RemoveOrganizationMemberInput,
        ctx: &OperationContext,
    ) -> DomainResult<OrganizationMembership> {
        let membership_id = input.membership_id.clone();
        let audit = AuditContext::new("remove-organization-member")
            .with_organization(input.organization_id.clone())
            .with_request(ctx.request_id.clone());
        self.adapters
            .persistence
            .transaction(audit, move |tx| {
                Box::pin(async move {
                    let target = tx
                        .memberships()
                        .find_by_id(&membership_id)
                        .await?
                        .ok_or_else(|| {
                            DomainError::not_found("Membership", membership_id.clone())
                        })?;
                    tx.memberships().delete(&target.id).await?;
                    Ok(target)
                })
            })
            .await
    }
}

/// Changes an active member's role.
///
/// The owner may assign admin or member; an active admin may only assign
/// member. The owner role moves exclusively through ownership transfer,
/// and the owner's own membership cannot be targeted at all. Assigning a
/// member's current role is a no-op apart from `updated_at`.
pub struct UpdateOrganizationMemberRole<P: PersistenceAdapter> {
    pipeline: Pipeline,
    adapters: Adapters<P>,
    input_rules: ValidatorChain<UpdateOrganizationMemberRoleInput>,
}

impl<P: PersistenceAdapter> UpdateOrganizationMemberRole<P> {
    pub fn new(adapters: Adapters<P>, hooks: &HookRegistry) -> Self {
        let input_rules = ValidatorChain::new().with(SchemaValidator).with(RuleSet::new(
            |input: &UpdateOrganizationMemberRoleInput| {
                if input.role == MembershipRole::Owner {
                    Err(vec![FieldViolation::new(
                        "role",
                        "Cannot assign the owner role. Use ownership transfer instead.",
                    )])
                } else {
                    Ok(())
                }
            },
        ));
        Self {
            pipeline: Pipeline::new(UPDATE_ORGANIZATION_MEMBER_ROLE, &adapters, hooks),
            adapters,
            input_rules,
        }
    }
}

#[async_trait]
impl<P: PersistenceAdapter> UseCase for UpdateOrganizationMemberRole<P> {
    type Input = UpdateOrganizationMemberRoleInput;
    type Output = OrganizationMembership;

    const NAME: UseCaseName = UPDATE_ORGANIZATION_MEMBER_ROLE;

    fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    fn failure_message(&self) -> &'static str {
        "Failed to update organization member role"
    }

    fn input_validator(&self) -> &dyn Validator<UpdateOrganizationMemberRoleInput> {
        &self.input_rules
    }

    async fn authorize(
        &self,
        input: &UpdateOrganizationMemberRoleInput,
        ctx: &OperationContext,
    ) -> DomainResult<()> {
        let actor = resolve_actor(&self.adapters, ctx).await?;
        let organization = require_organization(&self.adapters, &input.organization_id).await?;
        let target = self
            .adapters
            .persistence
            .memberships()
            .find_by_id(&input.membership_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Membership", input.membership_id.clone()))?;
        if target.organization_id != input.organization_id {
            return Err(DomainError::validation(
                "Member does not belong to this organization",
            ));
        }
        if target.role == MembershipRole::Owner
            || target.user_id.as_deref() == Some(organization.owner_user_id.as_str())
        {
            return Err(DomainError::validation(
                "Cannot change the organization owner's role. Transfer ownership first.",
            ));
        }
        if !target.is_active() {
            return Err(DomainError::validation("Member is not active"));
        }
        if actor.id == organization.owner_user_id {
            return Ok(());
        }
        let membership = actor_membership(&self.adapters, &actor.id, &organization.id).await?;
        if is_active_admin(membership.as_ref()) && input.role == MembershipRole::Member {
            return Ok(());
        }
        Err(DomainError::unauthorized("Insufficient permissions"))
    }

    async fn perform(
        &self,
        input: UpdateOrganizationMemberRoleInput,
        ctx: &OperationContext,
    ) -> DomainResult<OrganizationMembership> {
        let membership_id = input.membership_id.clone();
        let role = input.role;
        let now = self.adapters.clock.now();
        let audit = AuditContext::new("update-organization-member-role")
            .with_organization(input.organization_id.clone())
            .with_request(ctx.request_id.clone());
        self.adapters
            .persistence
            .transaction(audit, move |tx| {
                Box::pin(async move {
                    let target = tx
                        .memberships()
                        .find_by_id(&membership_id)
                        .await?
                        .ok_or_else(|| {
                            DomainError::not_found("Membership", membership_id.clone())
                        })?;
                    let updated = OrganizationMembership {
                        role,
                        updated_at: now,
                        ..target
                    };
                    Ok(tx.memberships().update(updated).await?)
                })
            })
            .await
    }
}

/// Lists every membership row of an organization, including pending
/// invitations and former members. Visible to any active member.
pub struct ListOrganizationMembers<P: PersistenceAdapter> {
    pipeline: Pipeline,
    adapters: Adapters<P>,
}

impl<P: PersistenceAdapter> ListOrganizationMembers<P> {
    pub fn new(adapters: Adapters<P>, hooks: &HookRegistry) -> Self {
        Self {
            pipeline: Pipeline::new(LIST_ORGANIZATION_MEMBERS, &adapters, hooks),
            adapters,
        }
    }
}

#[async_trait]
impl<P: PersistenceAdapter> UseCase for ListOrganizationMembers<P> {
    type Input = ListOrganizationMembersInput;
    type Output = OrganizationMemberList;

    const NAME: UseCaseName = LIST_ORGANIZATION_MEMBERS;

    fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    fn failure_message(&self) -> &'static str {
        "Failed to list organization members"
    }

    async fn authorize(
        &self,
        input: &ListOrganizationMembersInput,
        ctx: &OperationContext,
    ) -> DomainResult<()> {
        let actor = resolve_actor(&self.adapters, ctx).await?;
        let organization = require_organization(&self.adapters, &input.organization_id).await?;
        if actor.id == organization.owner_user_id {
            return Ok(());
        }
        let membership = actor_membership(&self.adapters, &actor.id, &organization.id).await?;
        if membership.map_or(false, |m| m.is_active()) {
            return Ok(());
        }
        Err(DomainError::unauthorized(
            "Not a member of this organization",
        ))
    }

    async fn perform(
        &self,
        input: ListOrganizationMembersInput,
        _ctx: &OperationContext,
    ) -> DomainResult<OrganizationMemberList> {
        let members = self
            .adapters
            .persistence
            .memberships()
            .find_by_organization(&input.organization_id)
            .await?;
        let total = members.len();
        Ok(OrganizationMemberList { members, total })
    }
}

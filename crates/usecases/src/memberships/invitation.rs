//! Invitation side of the membership state machine: adding a member
//! (invite or reactivate) and accepting a pending invitation.

use async_trait::async_trait;

use tenantkit_core::{
    Adapters, AuditContext, DomainError, DomainResult, FieldViolation, HookRegistry,
    MembershipRole, OperationContext, OrganizationMembership, PersistenceAdapter, Pipeline,
    RepositoryBundle, RuleSet, SchemaValidator, UseCase, UseCaseName, Validator, ValidatorChain,
};

use super::types::{AcceptOrganizationInvitationInput, AddOrganizationMemberInput};
use crate::support::{actor_membership, is_active_admin, require_organization, resolve_actor};

pub const ADD_ORGANIZATION_MEMBER: UseCaseName = UseCaseName::new("add-organization-member");
pub const ACCEPT_ORGANIZATION_INVITATION: UseCaseName =
    UseCaseName::new("accept-organization-invitation");

/// Invites a user into an organization, or reactivates their previous
/// membership if they once left.
///
/// The owner may grant any role below owner; an active admin may only
/// grant `member`. A membership that is pending or active conflicts; a
/// `left` row is reactivated under its original id with a fresh
/// invitation; a removed row is gone for good and a new row is created.
pub struct AddOrganizationMember<P: PersistenceAdapter> {
    pipeline: Pipeline,
    adapters: Adapters<P>,
    input_rules: ValidatorChain<AddOrganizationMemberInput>,
}

impl<P: PersistenceAdapter> AddOrganizationMember<P> {
    pub fn new(adapters: Adapters<P>, hooks: &HookRegistry) -> Self {
        let input_rules = ValidatorChain::new().with(SchemaValidator).with(RuleSet::new(
            |input: &AddOrganizationMemberInput| {
                if input.role == MembershipRole::Owner {
                    Err(vec![FieldViolation::new(
                        "role",
                        "Cannot grant the owner role. Use ownership transfer instead.",
                    )])
                } else {
                    Ok(())
                }
            },
        ));
        Self {
            pipeline: Pipeline::new(ADD_ORGANIZATION_MEMBER, &adapters, hooks),
            adapters,
            input_rules,
        }
    }
}

#[async_trait]
impl<P: PersistenceAdapter> UseCase for AddOrganizationMember<P> {
    type Input = AddOrganizationMemberInput;
    type Output = OrganizationMembership;

    const NAME: UseCaseName = ADD_ORGANIZATION_MEMBER;

    fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    fn failure_message(&self) -> &'static str {
        "Failed to add organization member"
    }

    fn input_validator(&self) -> &dyn Validator<AddOrganizationMemberInput> {
        &self.input_rules
    }

    async fn authorize(
        &self,
        input: &AddOrganizationMemberInput,
        ctx: &OperationContext,
    ) -> DomainResult<()> {
        let actor = resolve_actor(&self.adapters, ctx).await?;
        let organization = require_organization(&self.adapters, &input.organization_id).await?;
        if organization.is_deleted() {
            return Err(DomainError::validation("Organization has been deleted"));
        }
        if actor.id == organization.owner_user_id {
            return Ok(());
        }
        let membership = actor_membership(&self.adapters, &actor.id, &organization.id).await?;
        if is_active_admin(membership.as_ref()) && input.role == MembershipRole::Member {
            return Ok(());
        }
        Err(DomainError::unauthorized(
            "Only organization owners and admins can add members",
        ))
    }

    async fn perform(
        &self,
        input: AddOrganizationMemberInput,
        ctx: &OperationContext,
    ) -> DomainResult<OrganizationMembership> {
        // The invitee may not be registered yet; resolve what we can.
        let target_user_id = self
            .adapters
            .persistence
            .users()
            .find_by_username(&input.username)
            .await?
            .filter(|u| !u.is_deleted())
            .map(|u| u.id);

        let memberships = self.adapters.persistence.memberships();
        let existing = match &target_user_id {
            Some(user_id) => {
                match memberships
                    .find_by_user_id_and_organization_id(user_id, &input.organization_id)
                    .await?
                {
                    Some(m) => Some(m),
                    None => {
                        memberships
                            .find_by_username_and_organization_id(
                                &input.username,
                                &input.organization_id,
                            )
                            .await?
                    }
                }
            }
            None => {
                memberships
                    .find_by_username_and_organization_id(&input.username, &input.organization_id)
                    .await?
            }
        };
        // A removed row is terminal history and never blocks a new one.
        let existing = existing.filter(|m| !m.is_deleted());

        let now = self.adapters.clock.now();
        let (membership, is_reactivation) = match existing {
            Some(m) if !m.has_left() => {
                return Err(if m.is_pending_invitation() {
                    DomainError::conflict("User has already been invited to this organization")
                } else {
                    DomainError::conflict("User is already a member of this organization")
                });
            }
            Some(previous) => {
                // Reactivation: same row, same id, fresh invitation.
                let user_id = target_user_id.or_else(|| previous.user_id.clone());
                (
                    OrganizationMembership {
                        user_id,
                        role: input.role,
                        invited_at: Some(now),
                        joined_at: None,
                        left_at: None,
                        deleted_at: None,
                        updated_at: now,
                        ..previous
                    },
                    true,
                )
            }
            None => (
                OrganizationMembership {
                    id: self.adapters.ids.generate(),
                    user_id: target_user_id,
                    username: input.username.clone(),
                    organization_id: input.organization_id.clone(),
                    role: input.role,
                    invited_at: Some(now),
                    joined_at: None,
                    left_at: None,
                    deleted_at: None,
                    created_at: now,
                    updated_at: now,
                    custom_fields: None,
                },
                false,
            ),
        };

        let audit = AuditContext::new("add-organization-member")
            .with_organization(input.organization_id.clone())
            .with_request(ctx.request_id.clone());
        self.adapters
            .persistence
            .transaction(audit, move |tx| {
                Box::pin(async move {
                    if is_reactivation {
                        Ok(tx.memberships().update(membership).await?)
                    } else {
                        Ok(tx.memberships().insert(membership).await?)
                    }
                })
            })
            .await
    }
}

/// Accepts a pending invitation, turning it into an active membership.
///
/// The acceptor must be the invited username; the invitation must not have
/// been left, revoked, or already accepted. Checks run in that order so
/// the caller always learns the most specific reason.
pub struct AcceptOrganizationInvitation<P: PersistenceAdapter> {
    pipeline: Pipeline,
    adapters: Adapters<P>,
}

impl<P: PersistenceAdapter> AcceptOrganizationInvitation<P> {
    pub fn new(adapters: Adapters<P>, hooks: &HookRegistry) -> Self {
        Self {
            pipeline: Pipeline::new(ACCEPT_ORGANIZATION_INVITATION, &adapters, hooks),
            adapters,
        }
    }
}

#[async_trait]
impl<P: PersistenceAdapter> UseCase for AcceptOrganizationInvitation<P> {
    type Input = AcceptOrganizationInvitationInput;
    type Output = OrganizationMembership;

    const NAME: UseCaseName = ACCEPT_ORGANIZATION_INVITATION;

    fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    fn failure_message(&self) -> &'static str {
        "Failed to accept organization invitation"
    }

    async fn perform(
        &self,
        input: AcceptOrganizationInvitationInput,
        ctx: &OperationContext,
    ) -> DomainResult<OrganizationMembership> {
        let user = resolve_actor(&self.adapters, ctx).await?;
        if user.username != input.username {
            return Err(DomainError::validation_field("username", "Username mismatch"));
        }

        let invitation = self
            .adapters
            .persistence
            .memberships()
            .find_by_username_and_organization_id(&input.username, &input.organization_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(
                    "Invitation",
                    format!("{} in organization {}", input.username, input.organization_id),
                )
            })?;

        if invitation.invited_at.is_none() {
            return Err(DomainError::validation(
                "Membership has no pending invitation",
            ));
        }
        if invitation.left_at.is_some() {
            return Err(DomainError::validation(
                "Cannot accept: this member previously left the organization",
            ));
        }
        if invitation.deleted_at.is_some() {
            return Err(DomainError::validation("Invitation has been revoked"));
        }
        if invitation.joined_at.is_some() {
            return Err(DomainError::validation(
                "Invitation has already been accepted",
            ));
        }

        let now = self.adapters.clock.now();
        let accepted = OrganizationMembership {
            user_id: Some(user.id.clone()),
            joined_at: Some(now),
            updated_at: now,
            ..invitation
        };

        let audit = AuditContext::new("accept-organization-invitation")
            .with_organization(input.organization_id.clone())
            .with_request(ctx.request_id.clone());
        self.adapters
            .persistence
            .transaction(audit, move |tx| {
                Box::pin(async move { Ok(tx.memberships().update(accepted).await?) })
            })
            .await
    }
}

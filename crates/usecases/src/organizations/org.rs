use async_trait::async_trait;

use tenantkit_core::{
    Adapters, AuditContext, DomainError, DomainResult, HookRegistry, MembershipRole,
    OperationContext, Organization, OrganizationMembership, PersistenceAdapter, Pipeline,
    RepositoryBundle, SchemaValidator, UseCase, UseCaseName, Validator, ValidatorChain,
};

use super::types::{
    CreateOrganizationInput, ListOrganizationsInput, OrganizationList, UpdateOrganizationInput,
};
use crate::support::{actor_membership, is_active_admin, require_organization, resolve_actor};

pub const CREATE_ORGANIZATION: UseCaseName = UseCaseName::new("create-organization");
pub const UPDATE_ORGANIZATION: UseCaseName = UseCaseName::new("update-organization");
pub const LIST_ORGANIZATIONS: UseCaseName = UseCaseName::new("list-organizations");

/// Creates an organization owned by the actor.
///
/// The organization row and the owner's membership row (owner role, joined
/// immediately) are inserted in one transaction, so no organization ever
/// exists without its owner membership.
pub struct CreateOrganization<P: PersistenceAdapter> {
    pipeline: Pipeline,
    adapters: Adapters<P>,
    input_rules: ValidatorChain<CreateOrganizationInput>,
}

impl<P: PersistenceAdapter> CreateOrganization<P> {
    pub fn new(adapters: Adapters<P>, hooks: &HookRegistry) -> Self {
        Self {
            pipeline: Pipeline::new(CREATE_ORGANIZATION, &adapters, hooks),
            adapters,
            input_rules: ValidatorChain::new().with(SchemaValidator),
        }
    }

    /// Replace the input contract, typically to append custom-field rules
    /// after the schema check.
    pub fn with_input_rules(mut self, rules: ValidatorChain<CreateOrganizationInput>) -> Self {
        self.input_rules = rules;
        self
    }
}

#[async_trait]
impl<P: PersistenceAdapter> UseCase for CreateOrganization<P> {
    type Input = CreateOrganizationInput;
    type Output = Organization;

    const NAME: UseCaseName = CREATE_ORGANIZATION;

    fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    fn failure_message(&self) -> &'static str {
        "Failed to create organization"
    }

    fn input_validator(&self) -> &dyn Validator<CreateOrganizationInput> {
        &self.input_rules
    }

    async fn perform(
        &self,
        input: CreateOrganizationInput,
        ctx: &OperationContext,
    ) -> DomainResult<Organization> {
        let actor = resolve_actor(&self.adapters, ctx).await?;
        let now = self.adapters.clock.now();

        let organization = Organization {
            id: self.adapters.ids.generate(),
            owner_user_id: actor.id.clone(),
            created_at: now,
            updated_at: now,
            archived_at: None,
            deleted_at: None,
            custom_fields: input.custom_fields,
        };
        let owner_membership = OrganizationMembership {
            id: self.adapters.ids.generate(),
            user_id: Some(actor.id.clone()),
            username: actor.username.clone(),
            organization_id: organization.id.clone(),
            role: MembershipRole::Owner,
            invited_at: Some(now),
            joined_at: Some(now),
            left_at: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
            custom_fields: None,
        };

        let audit = AuditContext::new("create-organization")
            .with_organization(organization.id.clone())
            .with_request(ctx.request_id.clone());
        self.adapters
            .persistence
            .transaction(audit, move |tx| {
                Box::pin(async move {
                    let created = tx.organizations().insert(organization).await?;
                    tx.memberships().insert(owner_membership).await?;
                    Ok(created)
                })
            })
            .await
    }
}

/// Replaces an organization's custom fields. Owner or active admin only.
pub struct UpdateOrganization<P: PersistenceAdapter> {
    pipeline: Pipeline,
    adapters: Adapters<P>,
}

impl<P: PersistenceAdapter> UpdateOrganization<P> {
    pub fn new(adapters: Adapters<P>, hooks: &HookRegistry) -> Self {
        Self {
            pipeline: Pipeline::new(UPDATE_ORGANIZATION, &adapters, hooks),
            adapters,
        }
    }
}

#[async_trait]
impl<P: PersistenceAdapter> UseCase for UpdateOrganization<P> {
    type Input = UpdateOrganizationInput;
    type Output = Organization;

    const NAME: UseCaseName = UPDATE_ORGANIZATION;

    fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    fn failure_message(&self) -> &'static str {
        "Failed to update organization"
    }

    async fn authorize(
        &self,
        input: &UpdateOrganizationInput,
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
        if is_active_admin(membership.as_ref()) {
            return Ok(());
        }
        Err(DomainError::unauthorized(
            "Only organization owners and admins can update the organization",
        ))
    }

    async fn perform(
        &self,
        input: UpdateOrganizationInput,
        ctx: &OperationContext,
    ) -> DomainResult<Organization> {
        let organization = require_organization(&self.adapters, &input.organization_id).await?;
        if organization.is_deleted() {
            return Err(DomainError::validation("Organization has been deleted"));
        }

        let updated = Organization {
            custom_fields: input.custom_fields,
            updated_at: self.adapters.clock.now(),
            ..organization
        };

        let audit = AuditContext::new("update-organization")
            .with_organization(input.organization_id.clone())
            .with_request(ctx.request_id.clone());
        self.adapters
            .persistence
            .transaction(audit, move |tx| {
                Box::pin(async move { Ok(tx.organizations().update(updated).await?) })
            })
            .await
    }
}

/// Filter-driven listing: the matching page plus the total count.
pub struct ListOrganizations<P: PersistenceAdapter> {
    pipeline: Pipeline,
    adapters: Adapters<P>,
}

impl<P: PersistenceAdapter> ListOrganizations<P> {
    pub fn new(adapters: Adapters<P>, hooks: &HookRegistry) -> Self {
        Self {
            pipeline: Pipeline::new(LIST_ORGANIZATIONS, &adapters, hooks),
            adapters,
        }
    }
}

#[async_trait]
impl<P: PersistenceAdapter> UseCase for ListOrganizations<P> {
    type Input = ListOrganizationsInput;
    type Output = OrganizationList;

    const NAME: UseCaseName = LIST_ORGANIZATIONS;

    fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    fn failure_message(&self) -> &'static str {
        "Failed to list organizations"
    }

    async fn perform(
        &self,
        input: ListOrganizationsInput,
        _ctx: &OperationContext,
    ) -> DomainResult<OrganizationList> {
        let filter = input.to_filter();
        let organizations_repo = self.adapters.persistence.organizations();
        let organizations = organizations_repo.find_many(&filter).await?;
        let total = organizations_repo.count(&filter).await?;
        Ok(OrganizationList {
            organizations,
            total,
        })
    }
}

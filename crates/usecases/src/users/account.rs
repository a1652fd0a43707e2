use async_trait::async_trait;

use tenantkit_core::{
    fire_and_forget, Adapters, AuditContext, DomainError, DomainResult, HookRegistry,
    OperationContext, PersistenceAdapter, Pipeline, RepositoryBundle, UseCase, UseCaseName, User,
};

use super::types::{CreateUserInput, DeleteUserInput, UpdateUserInput};
use crate::support::resolve_actor;

pub const CREATE_USER: UseCaseName = UseCaseName::new("create-user");
pub const UPDATE_USER: UseCaseName = UseCaseName::new("update-user");
pub const DELETE_USER: UseCaseName = UseCaseName::new("delete-user");

/// Registers a new user.
///
/// Both natural keys must be free. After the insert commits, a detached
/// task links any pending invitations addressed to the new username, so an
/// invite issued before registration attaches to the fresh account.
pub struct CreateUser<P: PersistenceAdapter> {
    pipeline: Pipeline,
    adapters: Adapters<P>,
}

impl<P: PersistenceAdapter> CreateUser<P> {
    pub fn new(adapters: Adapters<P>, hooks: &HookRegistry) -> Self {
        Self {
            pipeline: Pipeline::new(CREATE_USER, &adapters, hooks),
            adapters,
        }
    }
}

#[async_trait]
impl<P: PersistenceAdapter> UseCase for CreateUser<P> {
    type Input = CreateUserInput;
    type Output = User;

    const NAME: UseCaseName = CREATE_USER;

    fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    fn failure_message(&self) -> &'static str {
        "Failed to create user"
    }

    async fn perform(&self, input: CreateUserInput, ctx: &OperationContext) -> DomainResult<User> {
        let users = self.adapters.persistence.users();
        if users
            .find_by_external_id(&input.external_id)
            .await?
            .is_some()
        {
            return Err(DomainError::conflict(
                "A user with this external id already exists",
            ));
        }
        if users.find_by_username(&input.username).await?.is_some() {
            return Err(DomainError::conflict("This username is already taken"));
        }

        let now = self.adapters.clock.now();
        let user = User {
            id: self.adapters.ids.generate(),
            external_id: input.external_id,
            username: input.username,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            custom_fields: input.custom_fields,
        };

        let audit = AuditContext::new("create-user").with_request(ctx.request_id.clone());
        let inserted = self
            .adapters
            .persistence
            .transaction(audit, move |tx| {
                Box::pin(async move { Ok(tx.users().insert(user).await?) })
            })
            .await?;

        // Pending username-addressed invitations acquire the new account
        // off the critical path; acceptance resolves by username anyway, so
        // nothing depends on this completing first.
        let persistence = self.adapters.persistence.clone();
        let username = inserted.username.clone();
        let user_id = inserted.id.clone();
        fire_and_forget("link-username-memberships", async move {
            let linked = persistence
                .memberships()
                .link_username_memberships_to_user_id(&username, &user_id)
                .await?;
            if linked > 0 {
                tracing::info!(username = %username, linked, "Linked pending memberships to new user");
            }
            Ok(())
        });

        Ok(inserted)
    }
}

/// Updates the actor's own record: an optional new username (with a
/// conflict check) and an optional replacement of the custom fields.
pub struct UpdateUser<P: PersistenceAdapter> {
    pipeline: Pipeline,
    adapters: Adapters<P>,
}

impl<P: PersistenceAdapter> UpdateUser<P> {
    pub fn new(adapters: Adapters<P>, hooks: &HookRegistry) -> Self {
        Self {
            pipeline: Pipeline::new(UPDATE_USER, &adapters, hooks),
            adapters,
        }
    }
}

#[async_trait]
impl<P: PersistenceAdapter> UseCase for UpdateUser<P> {
    type Input = UpdateUserInput;
    type Output = User;

    const NAME: UseCaseName = UPDATE_USER;

    fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    fn failure_message(&self) -> &'static str {
        "Failed to update user"
    }

    async fn perform(&self, input: UpdateUserInput, ctx: &OperationContext) -> DomainResult<User> {
        let actor = resolve_actor(&self.adapters, ctx).await?;

        let username = match input.username {
            Some(username) if username != actor.username => {
                if self
                    .adapters
                    .persistence
                    .users()
                    .find_by_username(&username)
                    .await?
                    .is_some()
                {
                    return Err(DomainError::conflict("This username is already taken"));
                }
                username
            }
            _ => actor.username.clone(),
        };

        let updated = User {
            username,
            custom_fields: input.custom_fields.or_else(|| actor.custom_fields.clone()),
            updated_at: self.adapters.clock.now(),
            ..actor
        };

        let audit = AuditContext::new("update-user").with_request(ctx.request_id.clone());
        self.adapters
            .persistence
            .transaction(audit, move |tx| {
                Box::pin(async move { Ok(tx.users().update(updated).await?) })
            })
            .await
    }
}

/// Soft-deletes the actor's own record. The row stays behind as history;
/// a deleted user can no longer act as a principal.
pub struct DeleteUser<P: PersistenceAdapter> {
    pipeline: Pipeline,
    adapters: Adapters<P>,
}

impl<P: PersistenceAdapter> DeleteUser<P> {
    pub fn new(adapters: Adapters<P>, hooks: &HookRegistry) -> Self {
        Self {
            pipeline: Pipeline::new(DELETE_USER, &adapters, hooks),
            adapters,
        }
    }
}

#[async_trait]
impl<P: PersistenceAdapter> UseCase for DeleteUser<P> {
    type Input = DeleteUserInput;
    type Output = User;

    const NAME: UseCaseName = DELETE_USER;

    fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    fn failure_message(&self) -> &'static str {
        "Failed to delete user"
    }

    async fn perform(&self, _input: DeleteUserInput, ctx: &OperationContext) -> DomainResult<User> {
        let actor = resolve_actor(&self.adapters, ctx).await?;
        let now = self.adapters.clock.now();
        let deleted = User {
            deleted_at: Some(now),
            updated_at: now,
            ..actor
        };

        let audit = AuditContext::new("delete-user").with_request(ctx.request_id.clone());
        self.adapters
            .persistence
            .transaction(audit, move |tx| {
                Box::pin(async move { Ok(tx.users().update(deleted).await?) })
            })
            .await
    }
}

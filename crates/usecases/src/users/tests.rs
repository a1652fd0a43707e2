use std::time::Duration;

use serde_json::json;
use tenantkit_core::{MembershipRole, RepositoryBundle, UseCase};

use crate::fixtures::{
    active_membership, at, ctx_external, ctx_user, seed_membership, seed_user, toolkit, NOW,
};
use crate::users::types::{CreateUserInput, DeleteUserInput, UpdateUserInput};

fn create_input(external_id: &str, username: &str) -> CreateUserInput {
    CreateUserInput {
        external_id: external_id.to_string(),
        username: username.to_string(),
        custom_fields: None,
    }
}

#[tokio::test]
async fn test_create_user_returns_the_new_record() {
    let (toolkit, adapters) = toolkit();

    let user = toolkit
        .create_user
        .execute(create_input("ext-1", "alice@x.com"), &ctx_external("ext-1"))
        .await
        .unwrap();

    assert_eq!(user.id, "id-2"); // id-1 went to the execution frame
    assert_eq!(user.external_id, "ext-1");
    assert_eq!(user.username, "alice@x.com");
    assert_eq!(user.created_at, at(NOW));
    assert_eq!(user.deleted_at, None);

    let stored = adapters
        .persistence
        .users()
        .find_by_username("alice@x.com")
        .await
        .unwrap();
    assert_eq!(stored.unwrap().id, user.id);
}

#[tokio::test]
async fn test_create_user_rejects_blank_username() {
    let (toolkit, _) = toolkit();

    let err = toolkit
        .create_user
        .execute(create_input("ext-1", ""), &ctx_external("ext-1"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "VALIDATION_ERROR");
    assert_eq!(err.field(), Some("username"));
}

#[tokio::test]
async fn test_create_user_conflicts_on_duplicate_keys() {
    let (toolkit, adapters) = toolkit();
    seed_user(&adapters, "u1", "alice@x.com").await;

    let err = toolkit
        .create_user
        .execute(
            create_input("ext-other", "alice@x.com"),
            &ctx_external("ext-other"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "CONFLICT");
    assert_eq!(err.to_string(), "This username is already taken");

    // Seeded users carry external id "ext-u1".
    let err = toolkit
        .create_user
        .execute(create_input("ext-u1", "bob@x.com"), &ctx_external("ext-u1"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "CONFLICT");
    assert_eq!(err.to_string(), "A user with this external id already exists");
}

#[tokio::test]
async fn test_create_user_links_pending_invitations() {
    let (toolkit, adapters) = toolkit();
    let pending = tenantkit_core::OrganizationMembership {
        user_id: None,
        joined_at: None,
        ..active_membership("m1", "unused", "carol@x.com", "org1", MembershipRole::Member)
    };
    seed_membership(&adapters, pending).await;

    let user = toolkit
        .create_user
        .execute(create_input("ext-9", "carol@x.com"), &ctx_external("ext-9"))
        .await
        .unwrap();

    // Linking runs as a detached task; give it a moment.
    let mut linked = None;
    for _ in 0..100 {
        let row = adapters
            .persistence
            .memberships()
            .find_by_id("m1")
            .await
            .unwrap()
            .unwrap();
        if row.user_id.is_some() {
            linked = row.user_id;
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    assert_eq!(linked.as_deref(), Some(user.id.as_str()));
}

#[tokio::test]
async fn test_update_user_changes_username() {
    let (toolkit, adapters) = toolkit();
    seed_user(&adapters, "u1", "old@x.com").await;

    let updated = toolkit
        .update_user
        .execute(
            UpdateUserInput {
                username: Some("new@x.com".to_string()),
                custom_fields: None,
            },
            &ctx_user("u1"),
        )
        .await
        .unwrap();

    assert_eq!(updated.username, "new@x.com");
    assert_eq!(updated.updated_at, at(NOW));
    let stored = adapters
        .persistence
        .users()
        .find_by_id("u1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.username, "new@x.com");
}

#[tokio::test]
async fn test_update_user_rejects_taken_username() {
    let (toolkit, adapters) = toolkit();
    seed_user(&adapters, "u1", "alice@x.com").await;
    seed_user(&adapters, "u2", "bob@x.com").await;

    let err = toolkit
        .update_user
        .execute(
            UpdateUserInput {
                username: Some("bob@x.com".to_string()),
                custom_fields: None,
            },
            &ctx_user("u1"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), "CONFLICT");
}

#[tokio::test]
async fn test_update_user_keeps_current_username_without_conflict() {
    let (toolkit, adapters) = toolkit();
    seed_user(&adapters, "u1", "alice@x.com").await;

    // Re-submitting the current username is not a conflict.
    let updated = toolkit
        .update_user
        .execute(
            UpdateUserInput {
                username: Some("alice@x.com".to_string()),
                custom_fields: Some(json!({"displayName": "Alice"})),
            },
            &ctx_user("u1"),
        )
        .await
        .unwrap();

    assert_eq!(updated.username, "alice@x.com");
    assert_eq!(updated.custom_fields, Some(json!({"displayName": "Alice"})));
}

#[tokio::test]
async fn test_update_user_requires_known_actor() {
    let (toolkit, _) = toolkit();

    let err = toolkit
        .update_user
        .execute(
            UpdateUserInput {
                username: None,
                custom_fields: None,
            },
            &ctx_user("ghost"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), "NOT_FOUND");
}

#[tokio::test]
async fn test_delete_user_soft_deletes() {
    let (toolkit, adapters) = toolkit();
    seed_user(&adapters, "u1", "alice@x.com").await;

    let deleted = toolkit
        .delete_user
        .execute(DeleteUserInput::default(), &ctx_user("u1"))
        .await
        .unwrap();
    assert_eq!(deleted.deleted_at, Some(at(NOW)));

    // The row survives as history, but the principal can no longer act.
    let stored = adapters
        .persistence
        .users()
        .find_by_id("u1")
        .await
        .unwrap()
        .unwrap();
    assert!(stored.is_deleted());

    let err = toolkit
        .delete_user
        .execute(DeleteUserInput::default(), &ctx_user("u1"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
}

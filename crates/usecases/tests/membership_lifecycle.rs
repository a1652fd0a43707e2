//! End-to-end membership lifecycle: invite, register, accept, promote,
//! leave, reactivate, and remove, all driven through the assembled toolkit.

mod common;

use std::sync::Arc;
use std::time::Duration;

use tenantkit_core::{HookRegistry, MembershipRole, RepositoryBundle, UseCase};
use tenantkit_usecases::memberships::{
    AcceptOrganizationInvitationInput, AddOrganizationMemberInput, LeaveOrganizationInput,
    RemoveOrganizationMemberInput, UpdateOrganizationMemberRoleInput, ADD_ORGANIZATION_MEMBER,
};
use tenantkit_usecases::organizations::CreateOrganizationInput;
use tenantkit_usecases::users::CreateUserInput;

use common::{at, ctx_external, ctx_user, membership_by_id, seed_user, toolkit, toolkit_with, NOW};
use common::RecordingHooks;

fn add_input(organization_id: &str, username: &str) -> AddOrganizationMemberInput {
    AddOrganizationMemberInput {
        organization_id: organization_id.to_string(),
        username: username.to_string(),
        role: MembershipRole::Member,
    }
}

#[tokio::test]
async fn test_membership_lifecycle_end_to_end() {
    let (toolkit, adapters) = toolkit();
    seed_user(&adapters, "owner", "owner@x.com").await;

    let organization = toolkit
        .create_organization
        .execute(CreateOrganizationInput::default(), &ctx_user("owner"))
        .await
        .unwrap();

    // Invite someone who has not registered yet.
    let invitation = toolkit
        .add_organization_member
        .execute(add_input(&organization.id, "bob@x.com"), &ctx_user("owner"))
        .await
        .unwrap();
    assert!(invitation.is_pending_invitation());
    assert_eq!(invitation.user_id, None);

    // Registration links the pending invitation in the background.
    let bob = toolkit
        .create_user
        .execute(
            CreateUserInput {
                external_id: "ext-bob".to_string(),
                username: "bob@x.com".to_string(),
                custom_fields: None,
            },
            &ctx_external("ext-bob"),
        )
        .await
        .unwrap();
    let mut linked = false;
    for _ in 0..100 {
        let row = membership_by_id(&adapters, &invitation.id).await.unwrap();
        if row.user_id.as_deref() == Some(bob.id.as_str()) {
            linked = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    assert!(linked, "registration should link the pending invitation");

    // Accept, then promote.
    let membership = toolkit
        .accept_organization_invitation
        .execute(
            AcceptOrganizationInvitationInput {
                organization_id: organization.id.clone(),
                username: "bob@x.com".to_string(),
            },
            &ctx_user(&bob.id),
        )
        .await
        .unwrap();
    assert!(membership.is_active());
    assert_eq!(membership.joined_at, Some(at(NOW)));

    let promoted = toolkit
        .update_organization_member_role
        .execute(
            UpdateOrganizationMemberRoleInput {
                organization_id: organization.id.clone(),
                membership_id: membership.id.clone(),
                role: MembershipRole::Admin,
            },
            &ctx_user("owner"),
        )
        .await
        .unwrap();
    assert_eq!(promoted.role, MembershipRole::Admin);

    // Leave, then get invited back under the same row.
    let left = toolkit
        .leave_organization
        .execute(
            LeaveOrganizationInput {
                organization_id: organization.id.clone(),
            },
            &ctx_user(&bob.id),
        )
        .await
        .unwrap();
    assert!(left.has_left());

    let reinvited = toolkit
        .add_organization_member
        .execute(add_input(&organization.id, "bob@x.com"), &ctx_user("owner"))
        .await
        .unwrap();
    assert_eq!(reinvited.id, membership.id);
    assert_eq!(reinvited.role, MembershipRole::Member);
    assert!(reinvited.is_pending_invitation());

    let rejoined = toolkit
        .accept_organization_invitation
        .execute(
            AcceptOrganizationInvitationInput {
                organization_id: organization.id.clone(),
                username: "bob@x.com".to_string(),
            },
            &ctx_user(&bob.id),
        )
        .await
        .unwrap();
    assert!(rejoined.is_active());

    // Removal is the one transition that erases the row.
    toolkit
        .remove_organization_member
        .execute(
            RemoveOrganizationMemberInput {
                organization_id: organization.id.clone(),
                membership_id: membership.id.clone(),
            },
            &ctx_user("owner"),
        )
        .await
        .unwrap();
    assert!(membership_by_id(&adapters, &membership.id).await.is_none());

    // The roster is back to just the owner.
    let roster = adapters
        .persistence
        .memberships()
        .find_by_organization(&organization.id)
        .await
        .unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].role, MembershipRole::Owner);
}

#[tokio::test]
async fn test_hooks_fire_in_stage_order() {
    let (hooks, stages) = RecordingHooks::new();
    let registry = HookRegistry::new().with(ADD_ORGANIZATION_MEMBER, hooks);
    let (toolkit, adapters) = toolkit_with(registry);
    seed_user(&adapters, "owner", "owner@x.com").await;
    let organization = toolkit
        .create_organization
        .execute(CreateOrganizationInput::default(), &ctx_user("owner"))
        .await
        .unwrap();

    toolkit
        .add_organization_member
        .execute(add_input(&organization.id, "bob@x.com"), &ctx_user("owner"))
        .await
        .unwrap();
    assert_eq!(
        *stages.lock().unwrap(),
        vec![
            "onStart",
            "afterValidation",
            "beforeExecution",
            "afterExecution",
            "onSuccess",
            "onFinally",
        ]
    );

    // A conflict fails in the business step, after beforeExecution.
    stages.lock().unwrap().clear();
    let err = toolkit
        .add_organization_member
        .execute(add_input(&organization.id, "bob@x.com"), &ctx_user("owner"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "CONFLICT");
    assert_eq!(
        *stages.lock().unwrap(),
        vec![
            "onStart",
            "afterValidation",
            "beforeExecution",
            "onError",
            "onFinally",
        ]
    );

    // A validation failure never reaches afterValidation.
    stages.lock().unwrap().clear();
    let err = toolkit
        .add_organization_member
        .execute(add_input(&organization.id, ""), &ctx_user("owner"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");
    assert_eq!(
        *stages.lock().unwrap(),
        vec!["onStart", "onError", "onFinally"]
    );

    // An authorization failure stops short of beforeExecution.
    stages.lock().unwrap().clear();
    seed_user(&adapters, "outsider", "outsider@x.com").await;
    let err = toolkit
        .add_organization_member
        .execute(
            add_input(&organization.id, "carol@x.com"),
            &ctx_user("outsider"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "UNAUTHORIZED");
    assert_eq!(
        *stages.lock().unwrap(),
        vec!["onStart", "afterValidation", "onError", "onFinally"]
    );
}

#[tokio::test]
async fn test_hook_abort_settles_without_side_effects() {
    let (hooks, stages) = RecordingHooks::aborting("suspicious request");
    let registry = HookRegistry::new().with(ADD_ORGANIZATION_MEMBER, hooks);
    let (toolkit, adapters) = toolkit_with(registry);
    seed_user(&adapters, "owner", "owner@x.com").await;
    let organization = toolkit
        .create_organization
        .execute(CreateOrganizationInput::default(), &ctx_user("owner"))
        .await
        .unwrap();

    let err = toolkit
        .add_organization_member
        .execute(add_input(&organization.id, "bob@x.com"), &ctx_user("owner"))
        .await
        .unwrap_err();

    assert!(err.is_aborted());
    assert_eq!(err.abort_reason(), Some("suspicious request"));
    assert_eq!(
        *stages.lock().unwrap(),
        vec!["onStart", "onAbort", "onFinally"]
    );

    // Nothing was written; the roster still only holds the owner.
    let roster = adapters
        .persistence
        .memberships()
        .find_by_organization(&organization.id)
        .await
        .unwrap();
    assert_eq!(roster.len(), 1);
}

#[tokio::test]
async fn test_concurrent_executions_do_not_share_state() {
    let (toolkit, adapters) = toolkit();
    seed_user(&adapters, "owner", "owner@x.com").await;
    let organization = toolkit
        .create_organization
        .execute(CreateOrganizationInput::default(), &ctx_user("owner"))
        .await
        .unwrap();

    let toolkit = Arc::new(toolkit);
    let mut handles = Vec::new();
    for i in 0..8 {
        let toolkit = toolkit.clone();
        let org_id = organization.id.clone();
        handles.push(tokio::spawn(async move {
            toolkit
                .add_organization_member
                .execute(
                    AddOrganizationMemberInput {
                        organization_id: org_id,
                        username: format!("user-{}@x.com", i),
                        role: MembershipRole::Member,
                    },
                    &ctx_user("owner"),
                )
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let roster = adapters
        .persistence
        .memberships()
        .find_by_organization(&organization.id)
        .await
        .unwrap();
    assert_eq!(roster.len(), 9); // owner + 8 invitations
}

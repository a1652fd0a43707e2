use serde::{Deserialize, Serialize};
use validator::Validate;

use tenantkit_core::{MembershipRole, OrganizationMembership};

/// Invitation target, addressed by username so that unregistered users can
/// be invited. The owner role cannot be granted here; the input contract
/// rejects it.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddOrganizationMemberInput {
    #[validate(length(min = 1, message = "Organization id is required"))]
    pub organization_id: String,
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    pub role: MembershipRole,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AcceptOrganizationInvitationInput {
    #[validate(length(min = 1, message = "Organization id is required"))]
    pub organization_id: String,
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LeaveOrganizationInput {
    #[validate(length(min = 1, message = "Organization id is required"))]
    pub organization_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RemoveOrganizationMemberInput {
    #[validate(length(min = 1, message = "Organization id is required"))]
    pub organization_id: String,
    #[validate(length(min = 1, message = "Membership id is required"))]
    pub membership_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrganizationMemberRoleInput {
    #[validate(length(min = 1, message = "Organization id is required"))]
    pub organization_id: String,
    #[validate(length(min = 1, message = "Membership id is required"))]
    pub membership_id: String,
    pub role: MembershipRole,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListOrganizationMembersInput {
    #[validate(length(min = 1, message = "Organization id is required"))]
    pub organization_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationMemberList {
    pub members: Vec<OrganizationMembership>,
    pub total: usize,
}

use serde::{Deserialize, Serialize};
use validator::Validate;

use tenantkit_core::{Organization, OrganizationFilter};

/// The actor becomes the owner; custom fields are validated by the use
/// case's validator chain, which callers may extend with their own rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganizationInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrganizationInput {
    #[validate(length(min = 1, message = "Organization id is required"))]
    pub organization_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveOrganizationInput {
    #[validate(length(min = 1, message = "Organization id is required"))]
    pub organization_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RestoreOrganizationInput {
    #[validate(length(min = 1, message = "Organization id is required"))]
    pub organization_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOrganizationInput {
    #[validate(length(min = 1, message = "Organization id is required"))]
    pub organization_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransferOrganizationOwnershipInput {
    #[validate(length(min = 1, message = "Organization id is required"))]
    pub organization_id: String,
    #[validate(length(min = 1, message = "New owner user id is required"))]
    pub new_owner_user_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListOrganizationsInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    #[serde(default)]
    pub include_archived: bool,
    #[serde(default)]
    pub include_deleted: bool,
}

impl ListOrganizationsInput {
    pub(crate) fn to_filter(&self) -> OrganizationFilter {
        let mut filter = OrganizationFilter::new();
        if let Some(owner) = &self.owner_user_id {
            filter = filter.with_owner(owner.clone());
        }
        if let Some(ids) = &self.ids {
            filter = filter.with_ids(ids.clone());
        }
        if self.include_archived {
            filter = filter.include_archived();
        }
        if self.include_deleted {
            filter = filter.include_deleted();
        }
        filter
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationList {
    pub organizations: Vec<Organization>,
    pub total: usize,
}

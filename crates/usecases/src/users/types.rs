use serde::{Deserialize, Serialize};
use validator::Validate;

/// Registration input. `external_id` is the identity-provider key the user
/// will authenticate with; `username` is the natural key invitations are
/// addressed to.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserInput {
    #[validate(length(min = 1, message = "External id is required"))]
    pub external_id: String,
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<serde_json::Value>,
}

/// Self-service update of the actor's own record.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserInput {
    #[validate(length(min = 1, message = "Username must not be empty"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<serde_json::Value>,
}

/// Soft-deletes the actor's own record; no parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DeleteUserInput {}

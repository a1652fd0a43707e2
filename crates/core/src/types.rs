use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Core user record.
///
/// `external_id` is the identity-provider key used to resolve the acting
/// principal to an internal id; `username` is a secondary natural key used
/// for invitation matching. Users are soft-deleted via `deleted_at` and
/// never hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    #[serde(rename = "externalId")]
    pub external_id: String,
    pub username: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "deletedAt", skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(rename = "customFields", skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<serde_json::Value>,
}

impl User {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Organization record.
///
/// Exactly one `owner_user_id` at any time; ownership transfer is the only
/// operation that changes it. States: active, archived (restorable), deleted
/// (terminal).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Organization {
    pub id: String,
    #[serde(rename = "ownerUserId")]
    pub owner_user_id: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "archivedAt", skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
    #[serde(rename = "deletedAt", skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(rename = "customFields", skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<serde_json::Value>,
}

impl Organization {
    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Membership role code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipRole {
    Owner,
    Admin,
    Member,
}

impl MembershipRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }
}

impl std::fmt::Display for MembershipRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Organization membership: the join entity linking a user (or a pending
/// invited username) to an organization with a role and lifecycle
/// timestamps.
///
/// `user_id` is unset while the invited username has not registered; it is
/// populated on registration or acceptance. The timestamp combination
/// encodes the state:
///
/// - `invited_at` set, rest unset: pending invitation
/// - `joined_at` set, `left_at`/`deleted_at` unset: active member
/// - `joined_at` and `left_at` set, `deleted_at` unset: former member
/// - `deleted_at` set: removed (terminal for this row)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrganizationMembership {
    pub id: String,
    #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub username: String,
    #[serde(rename = "organizationId")]
    pub organization_id: String,
    pub role: MembershipRole,
    #[serde(rename = "invitedAt", skip_serializing_if = "Option::is_none")]
    pub invited_at: Option<DateTime<Utc>>,
    #[serde(rename = "joinedAt", skip_serializing_if = "Option::is_none")]
    pub joined_at: Option<DateTime<Utc>>,
    #[serde(rename = "leftAt", skip_serializing_if = "Option::is_none")]
    pub left_at: Option<DateTime<Utc>>,
    #[serde(rename = "deletedAt", skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "customFields", skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<serde_json::Value>,
}

impl OrganizationMembership {
    /// A membership is active iff the member joined and has neither left
    /// nor been removed.
    pub fn is_active(&self) -> bool {
        self.joined_at.is_some() && self.left_at.is_none() && self.deleted_at.is_none()
    }

    /// Invited but not yet joined, left, or removed.
    pub fn is_pending_invitation(&self) -> bool {
        self.invited_at.is_some()
            && self.joined_at.is_none()
            && self.left_at.is_none()
            && self.deleted_at.is_none()
    }

    pub fn has_left(&self) -> bool {
        self.left_at.is_some()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Filter for organization listing and counting.
#[derive(Debug, Clone, Default)]
pub struct OrganizationFilter {
    pub owner_user_id: Option<String>,
    pub ids: Option<Vec<String>>,
    pub include_archived: bool,
    pub include_deleted: bool,
}

impl OrganizationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_owner(mut self, owner_user_id: impl Into<String>) -> Self {
        self.owner_user_id = Some(owner_user_id.into());
        self
    }

    pub fn with_ids(mut self, ids: Vec<String>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn include_archived(mut self) -> Self {
        self.include_archived = true;
        self
    }

    pub fn include_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    /// Whether an organization satisfies this filter. Adapters apply the
    /// same semantics regardless of their storage backend.
    pub fn matches(&self, org: &Organization) -> bool {
        if let Some(owner) = &self.owner_user_id {
            if &org.owner_user_id != owner {
                return false;
            }
        }
        if let Some(ids) = &self.ids {
            if !ids.iter().any(|id| id == &org.id) {
                return false;
            }
        }
        if org.is_deleted() && !self.include_deleted {
            return false;
        }
        if org.is_archived() && !self.include_archived && !org.is_deleted() {
            return false;
        }
        true
    }
}

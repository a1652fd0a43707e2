use std::collections::HashMap;

/// The acting principal of an operation.
///
/// `External` identifies the caller by the identity-provider key and is
/// resolved to an internal user by the use case; `User` carries an already
/// resolved internal id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    External { external_id: String },
    User { user_id: String },
}

impl Actor {
    pub fn external(external_id: impl Into<String>) -> Self {
        Self::External {
            external_id: external_id.into(),
        }
    }

    pub fn user(user_id: impl Into<String>) -> Self {
        Self::User {
            user_id: user_id.into(),
        }
    }
}

/// Per-call context passed to every `execute` invocation.
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub request_id: String,
    pub actor: Actor,
    pub organization_id: Option<String>,
    pub audit_action: Option<String>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl OperationContext {
    pub fn new(request_id: impl Into<String>, actor: Actor) -> Self {
        Self {
            request_id: request_id.into(),
            actor,
            organization_id: None,
            audit_action: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_organization(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }

    pub fn with_audit_action(mut self, audit_action: impl Into<String>) -> Self {
        self.audit_action = Some(audit_action.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Audit tags attached to every unit-of-work transaction.
#[derive(Debug, Clone)]
pub struct AuditContext {
    pub action: &'static str,
    pub organization_id: Option<String>,
    pub request_id: Option<String>,
}

impl AuditContext {
    pub fn new(action: &'static str) -> Self {
        Self {
            action,
            organization_id: None,
            request_id: None,
        }
    }

    pub fn with_organization(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }

    pub fn with_request(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

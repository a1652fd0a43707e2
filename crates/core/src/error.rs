use thiserror::Error;

/// Domain error taxonomy.
///
/// Every variant maps to a stable machine-readable code via
/// [`DomainError::code`]. Expected business failures are returned as
/// `Err(DomainError)` from use cases; nothing in the library panics across
/// the `execute` boundary.
#[derive(Error, Debug)]
pub enum DomainError {
    /// Input or business-rule violation. `field` is set when the violation
    /// is scoped to a single input field; `source` carries the original
    /// error when this variant wraps an unexpected failure at the pipeline
    /// boundary.
    #[error("{message}")]
    Validation {
        message: String,
        field: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{entity} not found: {identifier}")]
    NotFound {
        entity: &'static str,
        identifier: String,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    /// A hook requested a cooperative abort of the pipeline.
    #[error("Execution aborted: {reason}")]
    Aborted { reason: String },

    /// Adapter or configuration failure. Normalized into [`Validation`]
    /// with the use case's failure message before leaving the pipeline.
    ///
    /// [`Validation`]: DomainError::Validation
    #[error("{message}")]
    Infrastructure {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl DomainError {
    /// Stable code string for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Aborted { .. } => "ABORTED",
            Self::Infrastructure { .. } => "INFRASTRUCTURE_ERROR",
        }
    }

    /// The violated field path, when the error is field-scoped.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => field.as_deref(),
            _ => None,
        }
    }

    /// The abort reason, when the error is an abort.
    pub fn abort_reason(&self) -> Option<&str> {
        match self {
            Self::Aborted { reason } => Some(reason),
            _ => None,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }

    // --- Constructors ---

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
            source: None,
        }
    }

    pub fn validation_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
            source: None,
        }
    }

    /// Validation error wrapping an unexpected failure, keeping the original
    /// as the error source. Used by the pipeline's one-shot normalization.
    pub fn failure(message: impl Into<String>, original: DomainError) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
            source: Some(Box::new(original)),
        }
    }

    pub fn not_found(entity: &'static str, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            identifier: identifier.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn aborted(reason: impl Into<String>) -> Self {
        Self::Aborted {
            reason: reason.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        Self::Infrastructure {
            message: message.into(),
            source: None,
        }
    }
}

/// Failures raised by persistence adapters.
///
/// Repository and unit-of-work implementations return these; they convert
/// into [`DomainError::Infrastructure`] when they cross into use-case code.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Transaction error: {0}")]
    Transaction(String),
}

impl From<RepositoryError> for DomainError {
    fn from(err: RepositoryError) -> Self {
        DomainError::Infrastructure {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

pub type RepoResult<T> = Result<T, RepositoryError>;

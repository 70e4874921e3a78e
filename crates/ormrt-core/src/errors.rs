use thiserror::Error;

use crate::batch::MultipleErrors;

/// Result type alias using OrmError
pub type Result<T> = std::result::Result<T, OrmError>;

// ========== Error Facility ==========

/// Coarse classification of an error
///
/// The class decides how callers react: structural errors need a code or
/// schema change, recoverable errors may succeed when the whole transaction
/// is retried, usage errors are caller mistakes, object errors concern one
/// object only, and partial failures come from bulk operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Structural,
    Recoverable,
    Usage,
    Object,
    PartialFailure,
}

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code usable by tests, logs and outer
/// API layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Usage
    NullPointer,
    AlreadyInTransaction,
    NotInTransaction,
    TransactionAlreadyFinalized,
    AlreadyInSession,
    NotInSession,
    SessionRequired,
    InvalidInput,

    // Recoverable
    ConnectionLost,
    Timeout,
    Deadlock,

    // Object state
    ObjectNotPersistent,
    ObjectAlreadyPersistent,
    ObjectChanged,
    ResultNotCached,
    Database,
    SectionNotLoaded,
    SectionNotInObject,

    // Polymorphism / schema
    AbstractClass,
    NoTypeInfo,
    DuplicateRegistration,
    CatalogNotInitialized,
    CatalogAlreadyInitialized,
    PreparedAlreadyCached,
    PreparedTypeMismatch,
    UnknownSchema,
    UnknownSchemaVersion,

    // Bulk
    MultipleErrors,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::NullPointer => "ERR_NULL_POINTER",
            ExErrorKind::AlreadyInTransaction => "ERR_ALREADY_IN_TRANSACTION",
            ExErrorKind::NotInTransaction => "ERR_NOT_IN_TRANSACTION",
            ExErrorKind::TransactionAlreadyFinalized => "ERR_TRANSACTION_ALREADY_FINALIZED",
            ExErrorKind::AlreadyInSession => "ERR_ALREADY_IN_SESSION",
            ExErrorKind::NotInSession => "ERR_NOT_IN_SESSION",
            ExErrorKind::SessionRequired => "ERR_SESSION_REQUIRED",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::ConnectionLost => "ERR_CONNECTION_LOST",
            ExErrorKind::Timeout => "ERR_TIMEOUT",
            ExErrorKind::Deadlock => "ERR_DEADLOCK",
            ExErrorKind::ObjectNotPersistent => "ERR_OBJECT_NOT_PERSISTENT",
            ExErrorKind::ObjectAlreadyPersistent => "ERR_OBJECT_ALREADY_PERSISTENT",
            ExErrorKind::ObjectChanged => "ERR_OBJECT_CHANGED",
            ExErrorKind::ResultNotCached => "ERR_RESULT_NOT_CACHED",
            ExErrorKind::Database => "ERR_DATABASE",
            ExErrorKind::SectionNotLoaded => "ERR_SECTION_NOT_LOADED",
            ExErrorKind::SectionNotInObject => "ERR_SECTION_NOT_IN_OBJECT",
            ExErrorKind::AbstractClass => "ERR_ABSTRACT_CLASS",
            ExErrorKind::NoTypeInfo => "ERR_NO_TYPE_INFO",
            ExErrorKind::DuplicateRegistration => "ERR_DUPLICATE_REGISTRATION",
            ExErrorKind::CatalogNotInitialized => "ERR_CATALOG_NOT_INITIALIZED",
            ExErrorKind::CatalogAlreadyInitialized => "ERR_CATALOG_ALREADY_INITIALIZED",
            ExErrorKind::PreparedAlreadyCached => "ERR_PREPARED_ALREADY_CACHED",
            ExErrorKind::PreparedTypeMismatch => "ERR_PREPARED_TYPE_MISMATCH",
            ExErrorKind::UnknownSchema => "ERR_UNKNOWN_SCHEMA",
            ExErrorKind::UnknownSchemaVersion => "ERR_UNKNOWN_SCHEMA_VERSION",
            ExErrorKind::MultipleErrors => "ERR_MULTIPLE_ERRORS",
        }
    }

    /// Get the coarse class of this kind
    pub fn class(&self) -> ErrorClass {
        match self {
            ExErrorKind::NullPointer
            | ExErrorKind::AlreadyInTransaction
            | ExErrorKind::NotInTransaction
            | ExErrorKind::TransactionAlreadyFinalized
            | ExErrorKind::AlreadyInSession
            | ExErrorKind::NotInSession
            | ExErrorKind::SessionRequired
            | ExErrorKind::InvalidInput => ErrorClass::Usage,

            ExErrorKind::ConnectionLost | ExErrorKind::Timeout | ExErrorKind::Deadlock => {
                ErrorClass::Recoverable
            }

            ExErrorKind::ObjectNotPersistent
            | ExErrorKind::ObjectAlreadyPersistent
            | ExErrorKind::ObjectChanged
            | ExErrorKind::ResultNotCached
            | ExErrorKind::Database
            | ExErrorKind::SectionNotLoaded
            | ExErrorKind::SectionNotInObject => ErrorClass::Object,

            ExErrorKind::AbstractClass
            | ExErrorKind::NoTypeInfo
            | ExErrorKind::DuplicateRegistration
            | ExErrorKind::CatalogNotInitialized
            | ExErrorKind::CatalogAlreadyInitialized
            | ExErrorKind::PreparedAlreadyCached
            | ExErrorKind::PreparedTypeMismatch
            | ExErrorKind::UnknownSchema
            | ExErrorKind::UnknownSchemaVersion => ErrorClass::Structural,

            ExErrorKind::MultipleErrors => ErrorClass::PartialFailure,
        }
    }
}

/// Canonical structured error type
///
/// `ExError` is the projection of an [`OrmError`] used at reporting
/// boundaries (logs, outer API layers). It carries the stable kind and
/// whatever context the reporting site knows about.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    hierarchy: Option<String>,
    type_name: Option<String>,
    position: Option<usize>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            hierarchy: None,
            type_name: None,
            position: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add hierarchy context
    pub fn with_hierarchy(mut self, hierarchy: impl Into<String>) -> Self {
        self.hierarchy = Some(hierarchy.into());
        self
    }

    /// Add concrete type context
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Add batch position context
    pub fn with_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn class(&self) -> ErrorClass {
        self.kind.class()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn hierarchy(&self) -> Option<&str> {
        self.hierarchy.as_deref()
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(hierarchy) = &self.hierarchy {
            write!(f, " (hierarchy: {})", hierarchy)?;
        }
        if let Some(type_name) = &self.type_name {
            write!(f, " (type: {})", type_name)?;
        }
        if let Some(position) = self.position {
            write!(f, " (position: {})", position)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Runtime error taxonomy
///
/// The messages are stable: the batch summary quotes them verbatim.
#[derive(Error, Debug, Clone)]
pub enum OrmError {
    // ===== Usage =====
    #[error("NULL pointer")]
    NullPointer,

    #[error("transaction already in progress in this thread")]
    AlreadyInTransaction,

    #[error("operation can only be performed in transaction")]
    NotInTransaction,

    #[error("transaction already committed or rolled back")]
    TransactionAlreadyFinalized,

    #[error("session already in effect in this thread")]
    AlreadyInSession,

    #[error("session not in effect in this thread")]
    NotInSession,

    #[error("session required to load this object relationship")]
    SessionRequired,

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    // ===== Recoverable =====
    #[error("connection to database lost")]
    ConnectionLost,

    #[error("database operation timeout")]
    Timeout,

    #[error("transaction aborted due to deadlock")]
    Deadlock,

    // ===== Object state =====
    #[error("object not persistent")]
    ObjectNotPersistent,

    #[error("object already persistent")]
    ObjectAlreadyPersistent,

    #[error("object changed concurrently")]
    ObjectChanged,

    #[error("query result is not cached")]
    ResultNotCached,

    /// Error reported by the underlying database, message passed through
    #[error("{message}")]
    Database { message: String },

    #[error("section is not loaded")]
    SectionNotLoaded,

    #[error("section instance is not part of an object (section was copied?)")]
    SectionNotInObject,

    // ===== Polymorphism =====
    #[error("database operation on instance of abstract class {type_name}")]
    AbstractClass { type_name: String },

    /// The key was never registered in the hierarchy (or the type was
    /// omitted from the generated set)
    #[error("no type information for {key} in hierarchy {hierarchy}")]
    NoTypeInfo { hierarchy: String, key: String },

    #[error("duplicate registration of {key} in hierarchy {hierarchy}")]
    DuplicateRegistration { hierarchy: String, key: String },

    #[error("type catalog is not initialized")]
    CatalogNotInitialized,

    #[error("type catalog is already initialized")]
    CatalogAlreadyInitialized,

    // ===== Prepared queries / schema =====
    #[error("prepared query '{name}' is already cached")]
    PreparedAlreadyCached { name: String },

    #[error("type mismatch while looking up prepared query '{name}'")]
    PreparedTypeMismatch { name: String },

    #[error("unknown database schema '{name}'")]
    UnknownSchema { name: String },

    #[error("unknown database schema version {version}")]
    UnknownSchemaVersion { version: u64 },

    // ===== Bulk =====
    #[error("{0}")]
    Multiple(MultipleErrors),
}

impl OrmError {
    /// Create a database error carrying the driver's message verbatim
    pub fn database(message: impl Into<String>) -> Self {
        OrmError::Database {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ExErrorKind {
        match self {
            OrmError::NullPointer => ExErrorKind::NullPointer,
            OrmError::AlreadyInTransaction => ExErrorKind::AlreadyInTransaction,
            OrmError::NotInTransaction => ExErrorKind::NotInTransaction,
            OrmError::TransactionAlreadyFinalized => ExErrorKind::TransactionAlreadyFinalized,
            OrmError::AlreadyInSession => ExErrorKind::AlreadyInSession,
            OrmError::NotInSession => ExErrorKind::NotInSession,
            OrmError::SessionRequired => ExErrorKind::SessionRequired,
            OrmError::InvalidInput { .. } => ExErrorKind::InvalidInput,
            OrmError::ConnectionLost => ExErrorKind::ConnectionLost,
            OrmError::Timeout => ExErrorKind::Timeout,
            OrmError::Deadlock => ExErrorKind::Deadlock,
            OrmError::ObjectNotPersistent => ExErrorKind::ObjectNotPersistent,
            OrmError::ObjectAlreadyPersistent => ExErrorKind::ObjectAlreadyPersistent,
            OrmError::ObjectChanged => ExErrorKind::ObjectChanged,
            OrmError::ResultNotCached => ExErrorKind::ResultNotCached,
            OrmError::Database { .. } => ExErrorKind::Database,
            OrmError::SectionNotLoaded => ExErrorKind::SectionNotLoaded,
            OrmError::SectionNotInObject => ExErrorKind::SectionNotInObject,
            OrmError::AbstractClass { .. } => ExErrorKind::AbstractClass,
            OrmError::NoTypeInfo { .. } => ExErrorKind::NoTypeInfo,
            OrmError::DuplicateRegistration { .. } => ExErrorKind::DuplicateRegistration,
            OrmError::CatalogNotInitialized => ExErrorKind::CatalogNotInitialized,
            OrmError::CatalogAlreadyInitialized => ExErrorKind::CatalogAlreadyInitialized,
            OrmError::PreparedAlreadyCached { .. } => ExErrorKind::PreparedAlreadyCached,
            OrmError::PreparedTypeMismatch { .. } => ExErrorKind::PreparedTypeMismatch,
            OrmError::UnknownSchema { .. } => ExErrorKind::UnknownSchema,
            OrmError::UnknownSchemaVersion { .. } => ExErrorKind::UnknownSchemaVersion,
            OrmError::Multiple(_) => ExErrorKind::MultipleErrors,
        }
    }

    pub fn class(&self) -> ErrorClass {
        self.kind().class()
    }

    /// Whether a failure of one batch element forces the whole transaction
    /// to abort.
    ///
    /// Per-object errors (including a null element) leave the other
    /// elements applied; everything else invalidates the batch.
    pub fn is_batch_fatal(&self) -> bool {
        match self {
            OrmError::Multiple(me) => me.fatal(),
            OrmError::NullPointer => false,
            other => !matches!(other.class(), ErrorClass::Object),
        }
    }

    /// Get the nested batch result, if this is one
    pub fn as_multiple(&self) -> Option<&MultipleErrors> {
        match self {
            OrmError::Multiple(me) => Some(me),
            _ => None,
        }
    }
}

impl From<MultipleErrors> for OrmError {
    fn from(me: MultipleErrors) -> Self {
        OrmError::Multiple(me)
    }
}

/// Conversion from OrmError to the structured ExError
impl From<OrmError> for ExError {
    fn from(err: OrmError) -> Self {
        ExError::from(&err)
    }
}

impl From<&OrmError> for ExError {
    fn from(err: &OrmError) -> Self {
        let base = ExError::new(err.kind()).with_message(err.to_string());
        match err {
            OrmError::AbstractClass { type_name } => base.with_type_name(type_name.clone()),
            OrmError::NoTypeInfo { hierarchy, .. }
            | OrmError::DuplicateRegistration { hierarchy, .. } => {
                base.with_hierarchy(hierarchy.clone())
            }
            OrmError::Multiple(me) => match me.iter().next() {
                // The first failure is the most useful single source to carry.
                Some((position, first)) => {
                    base.with_source(ExError::from(first).with_position(position))
                }
                None => base,
            },
            _ => base,
        }
    }
}

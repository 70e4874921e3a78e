use std::fmt;

use super::Hierarchy;

/// Lifecycle points at which user callbacks run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackEvent {
    PrePersist,
    PostPersist,
    PreLoad,
    PostLoad,
    PreUpdate,
    PostUpdate,
    PreErase,
    PostErase,
}

/// Operations that can be dispatched to a concrete class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationCode {
    Callback,
    Persist,
    Update,
    Find,
    Reload,
    Load,
    Erase,
}

impl OperationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationCode::Callback => "callback",
            OperationCode::Persist => "persist",
            OperationCode::Update => "update",
            OperationCode::Find => "find",
            OperationCode::Reload => "reload",
            OperationCode::Load => "load",
            OperationCode::Erase => "erase",
        }
    }
}

impl fmt::Display for OperationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operation together with its argument
pub enum Call<'a, H: Hierarchy> {
    /// Run the user callback for `event`
    Callback(CallbackEvent),
    Persist,
    Update,
    /// Populate the object from the row with this identity
    Find(&'a H::Id),
    Reload,
    /// Load the section with this index
    Load(usize),
    /// Erase the supplied object, or the row with this identity when no
    /// object is supplied
    Erase(Option<&'a H::Id>),
}

impl<H: Hierarchy> Call<'_, H> {
    pub fn code(&self) -> OperationCode {
        match self {
            Call::Callback(_) => OperationCode::Callback,
            Call::Persist => OperationCode::Persist,
            Call::Update => OperationCode::Update,
            Call::Find(_) => OperationCode::Find,
            Call::Reload => OperationCode::Reload,
            Call::Load(_) => OperationCode::Load,
            Call::Erase(_) => OperationCode::Erase,
        }
    }
}

impl<H: Hierarchy> fmt::Debug for Call<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Call::Callback(event) => f.debug_tuple("Callback").field(event).finish(),
            Call::Find(id) => f.debug_tuple("Find").field(id).finish(),
            Call::Load(section) => f.debug_tuple("Load").field(section).finish(),
            Call::Erase(id) => f.debug_tuple("Erase").field(id).finish(),
            other => f.write_str(match other.code() {
                OperationCode::Persist => "Persist",
                OperationCode::Update => "Update",
                _ => "Reload",
            }),
        }
    }
}

//! ORM Runtime Core - polymorphic dispatch and batch failure aggregation
//!
//! This crate provides the runtime pieces generated mapping code relies on:
//! - Per-hierarchy registries resolving an object's runtime type or stored
//!   discriminator to its concrete class's mapping logic
//! - A process-wide catalog built once at start-up and read lock-free
//! - Aggregation of per-element failures of bulk operations
//! - A bulk driver splitting logical calls into physical sub-batches
//! - Ordered container persistence traits
//! - The runtime error taxonomy and structured logging facility

pub use ormrt_core_types as types;

pub mod batch;
pub mod bulk;
pub mod container;
pub mod errors;
pub mod logging_facility;
pub mod polymorphic;

// Re-export commonly used types
pub use batch::MultipleErrors;
pub use bulk::BulkOptions;
pub use container::{ContainerTraits, OrderedFunctions};
pub use errors::{ErrorClass, ExError, ExErrorKind, OrmError, Result};
pub use polymorphic::{
    Call, CallbackEvent, Catalog, CatalogBuilder, ConcreteInfo, Hierarchy, MappingModule,
    ObjectTraits, OperationCode, Polymorphic, PolymorphicMap, TypeTag,
};

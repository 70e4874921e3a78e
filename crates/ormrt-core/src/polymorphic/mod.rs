//! Polymorphic persistence support
//!
//! Application code holds objects of a class hierarchy through the hierarchy
//! root (typically a trait object such as `dyn Animal`). Generated mapping
//! code, on the other hand, only knows concrete classes. This module is the
//! seam between the two:
//!
//! - [`Hierarchy`] describes one family of mapped classes
//! - [`ObjectTraits`] is what generated code implements per concrete class
//! - [`ConcreteInfo`] is the registry record of one concrete class
//! - [`PolymorphicMap`] indexes the records of a hierarchy by runtime type and
//!   by stored discriminator
//! - [`Catalog`] owns every hierarchy's map once start-up registration is over

pub mod call;
pub mod catalog;
pub mod dispatch;
pub mod info;
pub mod map;

pub use call::{Call, CallbackEvent, OperationCode};
pub use catalog::{catalog, install, register_all, Catalog, CatalogBuilder, MappingModule};
pub use dispatch::{ConcreteDispatch, Dispatcher, ObjectTraits};
pub use info::ConcreteInfo;
pub use map::PolymorphicMap;

use std::any::{Any, TypeId};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Interned runtime type identity
///
/// Equality and ordering use the `TypeId` only; the name is kept for
/// diagnostics.
#[derive(Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl PartialOrd for TypeTag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeTag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for TypeTag {
    fn hash<S: Hasher>(&self, state: &mut S) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({})", self.name)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Runtime type access for hierarchy members
///
/// Implemented for every sized `'static` type. A hierarchy's root trait
/// declares it as a supertrait so that `dyn Root` exposes the concrete
/// object's identity:
///
/// ```
/// use ormrt_core::polymorphic::{Polymorphic, TypeTag};
///
/// trait Shape: Polymorphic {}
/// struct Circle;
/// impl Shape for Circle {}
///
/// let shape: Box<dyn Shape> = Box::new(Circle);
/// assert_eq!(Polymorphic::type_tag(&*shape), TypeTag::of::<Circle>());
/// ```
pub trait Polymorphic: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn type_tag(&self) -> TypeTag;
}

impl<T: Any> Polymorphic for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_tag(&self) -> TypeTag {
        TypeTag::of::<T>()
    }
}

/// One family of mapped classes
///
/// Implemented by a marker type per hierarchy root, usually by generated
/// code.
pub trait Hierarchy: Sized + 'static {
    /// Type through which application code holds members, e.g. `dyn Animal`
    type Root: ?Sized + Polymorphic;
    /// Concrete class at the top of the family; `()` when the root is not
    /// itself a mapped class
    type RootClass: 'static;
    /// Object identity value
    type Id: fmt::Debug + Send + Sync + 'static;
    /// Stored value naming the concrete class of a row
    type Discriminator: Ord + Clone + fmt::Debug + fmt::Display + Send + Sync + 'static;
    /// Opaque storage/session handle handed to generated code
    type Db: ?Sized;

    /// Name used in diagnostics and logs
    const NAME: &'static str;
    /// Whether identities are assigned by the database on persist
    const AUTO_ID: bool = false;
}

/// Tag of the object's exact runtime type
pub(crate) fn tag_of<H: Hierarchy>(obj: &H::Root) -> TypeTag {
    <H::Root as Polymorphic>::type_tag(obj)
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Shape: Polymorphic {}
    struct Circle;
    struct Square;
    impl Shape for Circle {}
    impl Shape for Square {}

    #[test]
    fn test_type_tag_identifies_concrete_type_behind_trait_object() {
        let shapes: Vec<Box<dyn Shape>> = vec![Box::new(Circle), Box::new(Square)];
        let tags: Vec<TypeTag> = shapes
            .iter()
            .map(|s| Polymorphic::type_tag(&**s))
            .collect();

        assert_eq!(tags[0], TypeTag::of::<Circle>());
        assert_eq!(tags[1], TypeTag::of::<Square>());
        assert_ne!(tags[0], tags[1]);
    }

    #[test]
    fn test_type_tag_name_is_diagnostic_only() {
        let tag = TypeTag::of::<Circle>();
        assert!(tag.name().ends_with("Circle"));
        assert_eq!(tag.to_string(), tag.name());
    }
}

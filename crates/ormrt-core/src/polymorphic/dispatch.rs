//! Per-class dispatch entry points
//!
//! [`ObjectTraits`] is the interface generated code implements for every
//! concrete class. It works on the concrete type only and knows nothing
//! about the hierarchy's polymorphism. [`Dispatcher`] adapts it to the
//! object-safe [`ConcreteDispatch`] stored in the registry, performing the
//! single downcast from the root type to the concrete type.
//!
//! Every call made through a dispatcher is a top-level call with dynamic
//! type checking disabled: the dynamic type has already been resolved.

use std::any::TypeId;
use std::marker::PhantomData;

use super::call::CallbackEvent;
use super::{tag_of, Hierarchy, Polymorphic, TypeTag};
use crate::errors::{OrmError, Result};

/// Mapping logic of one concrete class, implemented by generated code
///
/// `top_level` tells the implementation it was invoked directly for this
/// object rather than from a base or derived class implementation;
/// `dynamic_check` tells it whether it still has to resolve the object's
/// dynamic type itself.
pub trait ObjectTraits<H: Hierarchy>: Polymorphic + Sized {
    /// Create a default instance, held through the hierarchy root
    fn create() -> Box<H::Root>;

    fn callback(db: &mut H::Db, obj: &mut Self, event: CallbackEvent) -> Result<()> {
        let _ = (db, obj, event);
        Ok(())
    }

    /// Takes `&mut` so that database-assigned identities can be stored.
    fn persist(db: &mut H::Db, obj: &mut Self, top_level: bool, dynamic_check: bool)
        -> Result<()>;

    fn update(db: &mut H::Db, obj: &Self, top_level: bool, dynamic_check: bool) -> Result<()>;

    /// Returns `false` when no row has this identity.
    fn find(db: &mut H::Db, id: &H::Id, obj: &mut Self, dynamic_check: bool) -> Result<bool>;

    /// Returns `false` when the object's row no longer exists.
    fn reload(db: &mut H::Db, obj: &mut Self, dynamic_check: bool) -> Result<bool>;

    /// Load the section with index `section`, counted over this class and
    /// its bases.
    fn load_section(db: &mut H::Db, obj: &mut Self, section: usize) -> Result<()> {
        let _ = (db, obj, section);
        Err(OrmError::SectionNotInObject)
    }

    fn erase(db: &mut H::Db, obj: &Self, top_level: bool, dynamic_check: bool) -> Result<()>;

    fn erase_id(db: &mut H::Db, id: &H::Id, top_level: bool, dynamic_check: bool) -> Result<()>;
}

/// Object-safe capability set of one concrete class
///
/// Every method receives the object through the hierarchy root.
pub trait ConcreteDispatch<H: Hierarchy>: Send + Sync {
    fn type_tag(&self) -> TypeTag;

    fn create(&self) -> Box<H::Root>;

    fn callback(&self, db: &mut H::Db, obj: &mut H::Root, event: CallbackEvent) -> Result<()>;

    fn persist(&self, db: &mut H::Db, obj: &mut H::Root) -> Result<()>;

    fn update(&self, db: &mut H::Db, obj: &H::Root) -> Result<()>;

    fn find(&self, db: &mut H::Db, id: &H::Id, obj: &mut H::Root) -> Result<bool>;

    fn reload(&self, db: &mut H::Db, obj: &mut H::Root) -> Result<bool>;

    fn load(&self, db: &mut H::Db, obj: &mut H::Root, section: usize) -> Result<()>;

    fn erase(&self, db: &mut H::Db, obj: &H::Root) -> Result<()>;

    fn erase_id(&self, db: &mut H::Db, id: &H::Id) -> Result<()>;
}

/// [`ConcreteDispatch`] for the concrete class `T`
pub struct Dispatcher<T>(PhantomData<fn() -> T>);

impl<T> Dispatcher<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for Dispatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn mismatch<H: Hierarchy, T: 'static>(found: TypeTag) -> OrmError {
    OrmError::NoTypeInfo {
        hierarchy: H::NAME.to_string(),
        key: format!(
            "{} (dispatched as {})",
            found.name(),
            std::any::type_name::<T>()
        ),
    }
}

fn downcast_ref<H: Hierarchy, T: 'static>(obj: &H::Root) -> Result<&T> {
    let found = tag_of::<H>(obj);
    <H::Root as Polymorphic>::as_any(obj)
        .downcast_ref::<T>()
        .ok_or_else(|| mismatch::<H, T>(found))
}

fn downcast_mut<H: Hierarchy, T: 'static>(obj: &mut H::Root) -> Result<&mut T> {
    let found = tag_of::<H>(obj);
    <H::Root as Polymorphic>::as_any_mut(obj)
        .downcast_mut::<T>()
        .ok_or_else(|| mismatch::<H, T>(found))
}

impl<H, T> ConcreteDispatch<H> for Dispatcher<T>
where
    H: Hierarchy,
    T: ObjectTraits<H>,
{
    fn type_tag(&self) -> TypeTag {
        TypeTag::of::<T>()
    }

    fn create(&self) -> Box<H::Root> {
        T::create()
    }

    fn callback(&self, db: &mut H::Db, obj: &mut H::Root, event: CallbackEvent) -> Result<()> {
        T::callback(db, downcast_mut::<H, T>(obj)?, event)
    }

    fn persist(&self, db: &mut H::Db, obj: &mut H::Root) -> Result<()> {
        T::persist(db, downcast_mut::<H, T>(obj)?, true, false)
    }

    fn update(&self, db: &mut H::Db, obj: &H::Root) -> Result<()> {
        T::update(db, downcast_ref::<H, T>(obj)?, true, false)
    }

    fn find(&self, db: &mut H::Db, id: &H::Id, obj: &mut H::Root) -> Result<bool> {
        T::find(db, id, downcast_mut::<H, T>(obj)?, false)
    }

    fn reload(&self, db: &mut H::Db, obj: &mut H::Root) -> Result<bool> {
        T::reload(db, downcast_mut::<H, T>(obj)?, false)
    }

    fn load(&self, db: &mut H::Db, obj: &mut H::Root, section: usize) -> Result<()> {
        let obj = downcast_mut::<H, T>(obj)?;
        // Sections of the root class are loaded by the root's own code;
        // reaching this point means the caller re-dispatched for nothing.
        assert!(
            TypeId::of::<T>() != TypeId::of::<H::RootClass>(),
            "invariant violation: section load dispatched to hierarchy root {} of {}",
            std::any::type_name::<T>(),
            H::NAME
        );
        T::load_section(db, obj, section)
    }

    fn erase(&self, db: &mut H::Db, obj: &H::Root) -> Result<()> {
        T::erase(db, downcast_ref::<H, T>(obj)?, true, false)
    }

    fn erase_id(&self, db: &mut H::Db, id: &H::Id) -> Result<()> {
        T::erase_id(db, id, true, false)
    }
}

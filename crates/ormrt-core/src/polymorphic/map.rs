//! Per-hierarchy registry of concrete classes
//!
//! The map keeps two indices over the same set of records, one keyed by
//! runtime type and one keyed by discriminator. Both are updated by the one
//! registration operation so they always mirror each other. Entries are
//! never removed.
//!
//! A map is filled during start-up and only read afterwards; it does no
//! locking of its own.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::call::Call;
use super::dispatch::{ConcreteDispatch, Dispatcher, ObjectTraits};
use super::info::ConcreteInfo;
use super::{tag_of, Hierarchy, TypeTag};
use crate::bulk::{self, BulkOptions};
use crate::errors::{OrmError, Result};

pub struct PolymorphicMap<H: Hierarchy> {
    by_type: BTreeMap<TypeTag, Arc<ConcreteInfo<H>>>,
    by_discriminator: BTreeMap<H::Discriminator, Arc<ConcreteInfo<H>>>,
}

impl<H: Hierarchy> Default for PolymorphicMap<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Hierarchy> PolymorphicMap<H> {
    pub fn new() -> Self {
        Self {
            by_type: BTreeMap::new(),
            by_discriminator: BTreeMap::new(),
        }
    }

    /// Register a concrete class in both indices
    ///
    /// # Errors
    ///
    /// Returns `DuplicateRegistration` if the type or the discriminator is
    /// already registered; the map is left unchanged.
    pub fn register(
        &mut self,
        tag: TypeTag,
        discriminator: H::Discriminator,
        is_abstract: bool,
        dispatch: Box<dyn ConcreteDispatch<H>>,
    ) -> Result<()> {
        if self.by_type.contains_key(&tag) {
            return Err(duplicate::<H>(tag.name()));
        }
        if self.by_discriminator.contains_key(&discriminator) {
            return Err(duplicate::<H>(&discriminator.to_string()));
        }

        tracing::debug!(
            component = module_path!(),
            op = "register",
            hierarchy = H::NAME,
            type_name = tag.name(),
            discriminator = %discriminator,
            is_abstract = is_abstract,
        );

        let info = Arc::new(ConcreteInfo::new(
            tag,
            discriminator.clone(),
            is_abstract,
            dispatch,
        ));
        self.by_type.insert(tag, Arc::clone(&info));
        self.by_discriminator.insert(discriminator, info);
        Ok(())
    }

    /// Register the concrete class `T` with a generated dispatcher
    ///
    /// # Errors
    ///
    /// Same as [`register`](Self::register).
    pub fn register_type<T: ObjectTraits<H>>(
        &mut self,
        discriminator: H::Discriminator,
        is_abstract: bool,
    ) -> Result<()> {
        self.register(
            TypeTag::of::<T>(),
            discriminator,
            is_abstract,
            Box::new(Dispatcher::<T>::new()),
        )
    }

    /// Record of the exact runtime type `tag`
    ///
    /// # Errors
    ///
    /// Returns `NoTypeInfo` if the type was never registered.
    pub fn find_by_type(&self, tag: &TypeTag) -> Result<&ConcreteInfo<H>> {
        self.by_type
            .get(tag)
            .map(Arc::as_ref)
            .ok_or_else(|| no_type_info::<H>(tag.name()))
    }

    /// Record of the object's exact runtime type
    ///
    /// # Errors
    ///
    /// Returns `NoTypeInfo` if the object's type was never registered.
    pub fn find_of(&self, obj: &H::Root) -> Result<&ConcreteInfo<H>> {
        self.find_by_type(&tag_of::<H>(obj))
    }

    /// Record stored under `discriminator`
    ///
    /// # Errors
    ///
    /// Returns `NoTypeInfo` for an unknown discriminator, which usually
    /// means the stored data and the application disagree on the schema.
    pub fn find_by_discriminator(
        &self,
        discriminator: &H::Discriminator,
    ) -> Result<&ConcreteInfo<H>> {
        self.by_discriminator
            .get(discriminator)
            .map(Arc::as_ref)
            .ok_or_else(|| no_type_info::<H>(&discriminator.to_string()))
    }

    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }

    /// Records in discriminator order
    pub fn iter(&self) -> impl Iterator<Item = &ConcreteInfo<H>> + '_ {
        self.by_discriminator.values().map(Arc::as_ref)
    }

    /// Dispatch `call` to the mapping logic of the object's runtime type
    ///
    /// # Errors
    ///
    /// Returns `NoTypeInfo` if the object's type is not registered, or any
    /// error of [`ConcreteInfo::dispatch`].
    pub fn dispatch(
        &self,
        db: &mut H::Db,
        obj: &mut H::Root,
        call: Call<'_, H>,
    ) -> Result<bool> {
        let info = self.find_of(obj)?;
        info.dispatch(db, Some(obj), call)
    }

    /// Create a default instance of the class stored under `discriminator`
    ///
    /// # Errors
    ///
    /// Returns `NoTypeInfo` for an unknown discriminator and
    /// `AbstractClass` if it names an abstract class.
    pub fn instantiate(&self, discriminator: &H::Discriminator) -> Result<Box<H::Root>> {
        self.find_by_discriminator(discriminator)?.create()
    }

    /// Reconstruct the object with identity `id` from its stored
    /// discriminator
    ///
    /// Returns `None` if no row has this identity.
    ///
    /// # Errors
    ///
    /// Same as [`instantiate`](Self::instantiate), plus errors of the
    /// mapping logic.
    pub fn load(
        &self,
        db: &mut H::Db,
        discriminator: &H::Discriminator,
        id: &H::Id,
    ) -> Result<Option<Box<H::Root>>> {
        let info = self.find_by_discriminator(discriminator)?;
        let mut obj = info.create()?;
        if info.dispatch(db, Some(&mut *obj), Call::Find(id))? {
            Ok(Some(obj))
        } else {
            Ok(None)
        }
    }

    /// Erase the row with identity `id` of the class stored under
    /// `discriminator`, without materializing the object
    ///
    /// # Errors
    ///
    /// Returns `NoTypeInfo` for an unknown discriminator, or errors of the
    /// mapping logic.
    pub fn erase_by_id(
        &self,
        db: &mut H::Db,
        discriminator: &H::Discriminator,
        id: &H::Id,
    ) -> Result<()> {
        self.find_by_discriminator(discriminator)?
            .dispatch(db, None, Call::Erase(Some(id)))
            .map(|_| ())
    }

    /// Persist every object, each through its own concrete class
    ///
    /// # Errors
    ///
    /// Returns `Multiple` with one record per failed position.
    pub fn persist_all(
        &self,
        db: &mut H::Db,
        objects: &mut [Box<H::Root>],
        options: &BulkOptions,
    ) -> Result<()> {
        bulk::run("bulk_persist", options, objects.iter_mut(), |obj| {
            self.dispatch(db, &mut **obj, Call::Persist).map(|_| ())
        })
    }

    /// Update every object, each through its own concrete class
    ///
    /// # Errors
    ///
    /// Returns `Multiple` with one record per failed position.
    pub fn update_all(
        &self,
        db: &mut H::Db,
        objects: &mut [Box<H::Root>],
        options: &BulkOptions,
    ) -> Result<()> {
        bulk::run("bulk_update", options, objects.iter_mut(), |obj| {
            self.dispatch(db, &mut **obj, Call::Update).map(|_| ())
        })
    }

    /// Erase every object, each through its own concrete class
    ///
    /// # Errors
    ///
    /// Returns `Multiple` with one record per failed position.
    pub fn erase_all(
        &self,
        db: &mut H::Db,
        objects: &mut [Box<H::Root>],
        options: &BulkOptions,
    ) -> Result<()> {
        bulk::run("bulk_erase", options, objects.iter_mut(), |obj| {
            self.dispatch(db, &mut **obj, Call::Erase(None)).map(|_| ())
        })
    }
}

fn no_type_info<H: Hierarchy>(key: &str) -> OrmError {
    OrmError::NoTypeInfo {
        hierarchy: H::NAME.to_string(),
        key: key.to_string(),
    }
}

fn duplicate<H: Hierarchy>(key: &str) -> OrmError {
    OrmError::DuplicateRegistration {
        hierarchy: H::NAME.to_string(),
        key: key.to_string(),
    }
}

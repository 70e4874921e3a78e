use std::fmt;

use super::call::Call;
use super::dispatch::ConcreteDispatch;
use super::{Hierarchy, TypeTag};
use crate::errors::{OrmError, Result};

/// Registry record of one concrete class
pub struct ConcreteInfo<H: Hierarchy> {
    tag: TypeTag,
    discriminator: H::Discriminator,
    is_abstract: bool,
    dispatch: Box<dyn ConcreteDispatch<H>>,
}

impl<H: Hierarchy> ConcreteInfo<H> {
    pub fn new(
        tag: TypeTag,
        discriminator: H::Discriminator,
        is_abstract: bool,
        dispatch: Box<dyn ConcreteDispatch<H>>,
    ) -> Self {
        Self {
            tag,
            discriminator,
            is_abstract,
            dispatch,
        }
    }

    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    pub fn type_name(&self) -> &'static str {
        self.tag.name()
    }

    pub fn discriminator(&self) -> &H::Discriminator {
        &self.discriminator
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    fn ensure_concrete(&self) -> Result<()> {
        if self.is_abstract {
            return Err(OrmError::AbstractClass {
                type_name: self.tag.name().to_string(),
            });
        }
        Ok(())
    }

    /// Create a default instance of this class
    ///
    /// # Errors
    ///
    /// Returns `AbstractClass` for abstract classes.
    pub fn create(&self) -> Result<Box<H::Root>> {
        self.ensure_concrete()?;
        Ok(self.dispatch.create())
    }

    /// Execute `call` with this class's mapping logic
    ///
    /// `Find` and `Reload` return whether the row exists; every other
    /// operation returns `false`.
    ///
    /// # Errors
    ///
    /// - `NullPointer` if an operation other than `Erase` gets no object, or
    ///   `Erase` gets neither object nor identity
    /// - `AbstractClass` when persisting or updating an abstract class
    /// - `NoTypeInfo` if the object is not an instance of this class
    /// - whatever the mapping logic returns
    ///
    /// # Panics
    ///
    /// `Load` on the hierarchy's root class is an invariant violation and
    /// panics.
    pub fn dispatch(
        &self,
        db: &mut H::Db,
        obj: Option<&mut H::Root>,
        call: Call<'_, H>,
    ) -> Result<bool> {
        let d = self.dispatch.as_ref();
        match (call, obj) {
            (Call::Erase(_), Some(obj)) => d.erase(db, obj).map(|_| false),
            (Call::Erase(Some(id)), None) => d.erase_id(db, id).map(|_| false),
            (_, None) => Err(OrmError::NullPointer),
            (Call::Callback(event), Some(obj)) => d.callback(db, obj, event).map(|_| false),
            (Call::Persist, Some(obj)) => {
                self.ensure_concrete()?;
                d.persist(db, obj).map(|_| false)
            }
            (Call::Update, Some(obj)) => {
                self.ensure_concrete()?;
                d.update(db, obj).map(|_| false)
            }
            (Call::Find(id), Some(obj)) => d.find(db, id, obj),
            (Call::Reload, Some(obj)) => d.reload(db, obj),
            (Call::Load(section), Some(obj)) => d.load(db, obj, section).map(|_| false),
        }
    }
}

impl<H: Hierarchy> fmt::Debug for ConcreteInfo<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcreteInfo")
            .field("type", &self.tag)
            .field("discriminator", &self.discriminator)
            .field("is_abstract", &self.is_abstract)
            .finish()
    }
}

//! Shared fixture: an `Animal` hierarchy mapped onto an in-memory store
//!
//! `Pet` is the hierarchy's root class; `Dog` and `Cat` derive from it and
//! `Creature` is abstract. Dog tricks live in a separate container table
//! and are loaded as section 0.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fmt;

use ormrt_core::container::{ContainerTraits, OrderedFunctions};
use ormrt_core::polymorphic::{
    CallbackEvent, CatalogBuilder, Hierarchy, MappingModule, ObjectTraits, Polymorphic,
};
use ormrt_core::{OrmError, Result};

pub trait Animal: Polymorphic + fmt::Debug {
    fn id(&self) -> Option<u64>;
    fn name(&self) -> &str;
}

/// Marker type of the hierarchy
pub struct Zoo;

impl Hierarchy for Zoo {
    type Root = dyn Animal;
    type RootClass = Pet;
    type Id = u64;
    type Discriminator = String;
    type Db = PetStore;

    const NAME: &'static str = "Animal";
    const AUTO_ID: bool = true;
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Pet {
    pub id: Option<u64>,
    pub name: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Dog {
    pub pet: Pet,
    pub tricks: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Cat {
    pub pet: Pet,
    pub lives: u8,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Creature {
    pub pet: Pet,
}

impl Pet {
    pub fn named(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
        }
    }
}

impl Dog {
    pub fn named(name: &str, tricks: &[&str]) -> Self {
        Self {
            pet: Pet::named(name),
            tricks: tricks.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl Cat {
    pub fn named(name: &str, lives: u8) -> Self {
        Self {
            pet: Pet::named(name),
            lives,
        }
    }
}

impl Animal for Pet {
    fn id(&self) -> Option<u64> {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

macro_rules! derived_animal {
    ($($ty:ty),*) => {$(
        impl Animal for $ty {
            fn id(&self) -> Option<u64> {
                self.pet.id
            }

            fn name(&self) -> &str {
                &self.pet.name
            }
        }
    )*};
}

derived_animal!(Dog, Cat, Creature);

/// Downcast a hierarchy member to its concrete class
pub fn concrete<T: 'static>(obj: &dyn Animal) -> Option<&T> {
    Polymorphic::as_any(obj).downcast_ref::<T>()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub discriminator: String,
    pub name: String,
    pub detail: String,
}

/// One call received by the mapping logic
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub op: &'static str,
    pub class: &'static str,
    pub top_level: Option<bool>,
    pub dynamic_check: bool,
}

/// In-memory database handle
///
/// Persisting an object named `taken` fails with `ObjectAlreadyPersistent`;
/// one named `unplugged` fails with `ConnectionLost`.
#[derive(Debug, Default)]
pub struct PetStore {
    pub rows: BTreeMap<u64, Row>,
    pub tricks: BTreeMap<u64, Vec<(usize, String)>>,
    pub invocations: Vec<Invocation>,
    pub callbacks: Vec<(CallbackEvent, &'static str)>,
    next_id: u64,
}

impl PetStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn trace(
        &mut self,
        op: &'static str,
        class: &'static str,
        top_level: Option<bool>,
        dynamic_check: bool,
    ) {
        self.invocations.push(Invocation {
            op,
            class,
            top_level,
            dynamic_check,
        });
    }

    fn insert(&mut self, discriminator: &str, name: &str, detail: String) -> Result<u64> {
        match name {
            "taken" => return Err(OrmError::ObjectAlreadyPersistent),
            "unplugged" => return Err(OrmError::ConnectionLost),
            _ => {}
        }
        self.next_id += 1;
        self.rows.insert(
            self.next_id,
            Row {
                discriminator: discriminator.to_string(),
                name: name.to_string(),
                detail,
            },
        );
        Ok(self.next_id)
    }

    fn update_row(&mut self, id: Option<u64>, name: &str, detail: String) -> Result<()> {
        let row = id
            .and_then(|id| self.rows.get_mut(&id))
            .ok_or(OrmError::ObjectNotPersistent)?;
        row.name = name.to_string();
        row.detail = detail;
        Ok(())
    }

    fn delete(&mut self, id: Option<u64>) -> Result<()> {
        let id = id.ok_or(OrmError::ObjectNotPersistent)?;
        self.tricks.remove(&id);
        self.rows
            .remove(&id)
            .map(|_| ())
            .ok_or(OrmError::ObjectNotPersistent)
    }

    fn fetch_pet(&self, id: u64, pet: &mut Pet) -> Option<String> {
        let row = self.rows.get(&id)?;
        pet.id = Some(id);
        pet.name = row.name.clone();
        Some(row.detail.clone())
    }

    fn trick_rows(&mut self, id: u64) -> TrickRows<'_> {
        TrickRows {
            rows: self.tricks.entry(id).or_default(),
            cursor: 0,
        }
    }

    /// Discriminator stored for `id`
    pub fn discriminator_of(&self, id: u64) -> Option<String> {
        self.rows.get(&id).map(|r| r.discriminator.clone())
    }
}

/// Container table of one dog's tricks
pub struct TrickRows<'a> {
    rows: &'a mut Vec<(usize, String)>,
    cursor: usize,
}

impl OrderedFunctions<usize, String> for TrickRows<'_> {
    fn insert_one(&mut self, index: usize, value: &String) -> Result<()> {
        self.rows.push((index, value.clone()));
        Ok(())
    }

    fn load_all(&mut self, index: &mut usize, value: &mut String) -> Result<bool> {
        let (i, v) = self
            .rows
            .get(self.cursor)
            .ok_or_else(|| OrmError::database("read past the last trick"))?;
        *index = *i;
        *value = v.clone();
        self.cursor += 1;
        Ok(self.cursor < self.rows.len())
    }

    fn delete_all(&mut self) -> Result<()> {
        self.rows.clear();
        self.cursor = 0;
        Ok(())
    }
}

impl ObjectTraits<Zoo> for Pet {
    fn create() -> Box<dyn Animal> {
        Box::new(Pet::default())
    }

    fn callback(db: &mut PetStore, _obj: &mut Self, event: CallbackEvent) -> Result<()> {
        db.callbacks.push((event, "Pet"));
        Ok(())
    }

    fn persist(db: &mut PetStore, obj: &mut Self, top_level: bool, dynamic_check: bool) -> Result<()> {
        db.trace("persist", "Pet", Some(top_level), dynamic_check);
        obj.id = Some(db.insert("Pet", &obj.name, String::new())?);
        Ok(())
    }

    fn update(db: &mut PetStore, obj: &Self, top_level: bool, dynamic_check: bool) -> Result<()> {
        db.trace("update", "Pet", Some(top_level), dynamic_check);
        db.update_row(obj.id, &obj.name, String::new())
    }

    fn find(db: &mut PetStore, id: &u64, obj: &mut Self, dynamic_check: bool) -> Result<bool> {
        db.trace("find", "Pet", None, dynamic_check);
        Ok(db.fetch_pet(*id, obj).is_some())
    }

    fn reload(db: &mut PetStore, obj: &mut Self, dynamic_check: bool) -> Result<bool> {
        let id = obj.id.ok_or(OrmError::ObjectNotPersistent)?;
        Self::find(db, &id, obj, dynamic_check)
    }

    fn erase(db: &mut PetStore, obj: &Self, top_level: bool, dynamic_check: bool) -> Result<()> {
        db.trace("erase", "Pet", Some(top_level), dynamic_check);
        db.delete(obj.id)
    }

    fn erase_id(db: &mut PetStore, id: &u64, top_level: bool, dynamic_check: bool) -> Result<()> {
        db.trace("erase_id", "Pet", Some(top_level), dynamic_check);
        db.delete(Some(*id))
    }
}

impl ObjectTraits<Zoo> for Dog {
    fn create() -> Box<dyn Animal> {
        Box::new(Dog::default())
    }

    fn callback(db: &mut PetStore, _obj: &mut Self, event: CallbackEvent) -> Result<()> {
        db.callbacks.push((event, "Dog"));
        Ok(())
    }

    fn persist(db: &mut PetStore, obj: &mut Self, top_level: bool, dynamic_check: bool) -> Result<()> {
        db.trace("persist", "Dog", Some(top_level), dynamic_check);
        let id = db.insert("Dog", &obj.pet.name, String::new())?;
        obj.pet.id = Some(id);
        obj.tricks.persist(&mut db.trick_rows(id))
    }

    fn update(db: &mut PetStore, obj: &Self, top_level: bool, dynamic_check: bool) -> Result<()> {
        db.trace("update", "Dog", Some(top_level), dynamic_check);
        db.update_row(obj.pet.id, &obj.pet.name, String::new())?;
        let id = obj.pet.id.ok_or(OrmError::ObjectNotPersistent)?;
        obj.tricks.update(&mut db.trick_rows(id))
    }

    /// Tricks are not loaded here; they form section 0.
    fn find(db: &mut PetStore, id: &u64, obj: &mut Self, dynamic_check: bool) -> Result<bool> {
        db.trace("find", "Dog", None, dynamic_check);
        Ok(db.fetch_pet(*id, &mut obj.pet).is_some())
    }

    fn reload(db: &mut PetStore, obj: &mut Self, dynamic_check: bool) -> Result<bool> {
        let id = obj.pet.id.ok_or(OrmError::ObjectNotPersistent)?;
        Self::find(db, &id, obj, dynamic_check)
    }

    fn load_section(db: &mut PetStore, obj: &mut Self, section: usize) -> Result<()> {
        if section != 0 {
            return Err(OrmError::SectionNotInObject);
        }
        let id = obj.pet.id.ok_or(OrmError::ObjectNotPersistent)?;
        let mut rows = db.trick_rows(id);
        let more = !rows.rows.is_empty();
        obj.tricks.load(more, &mut rows)
    }

    fn erase(db: &mut PetStore, obj: &Self, top_level: bool, dynamic_check: bool) -> Result<()> {
        db.trace("erase", "Dog", Some(top_level), dynamic_check);
        db.delete(obj.pet.id)
    }

    fn erase_id(db: &mut PetStore, id: &u64, top_level: bool, dynamic_check: bool) -> Result<()> {
        db.trace("erase_id", "Dog", Some(top_level), dynamic_check);
        db.delete(Some(*id))
    }
}

impl ObjectTraits<Zoo> for Cat {
    fn create() -> Box<dyn Animal> {
        Box::new(Cat::default())
    }

    fn persist(db: &mut PetStore, obj: &mut Self, top_level: bool, dynamic_check: bool) -> Result<()> {
        db.trace("persist", "Cat", Some(top_level), dynamic_check);
        obj.pet.id = Some(db.insert("Cat", &obj.pet.name, obj.lives.to_string())?);
        Ok(())
    }

    fn update(db: &mut PetStore, obj: &Self, top_level: bool, dynamic_check: bool) -> Result<()> {
        db.trace("update", "Cat", Some(top_level), dynamic_check);
        db.update_row(obj.pet.id, &obj.pet.name, obj.lives.to_string())
    }

    fn find(db: &mut PetStore, id: &u64, obj: &mut Self, dynamic_check: bool) -> Result<bool> {
        db.trace("find", "Cat", None, dynamic_check);
        match db.fetch_pet(*id, &mut obj.pet) {
            Some(detail) => {
                obj.lives = detail
                    .parse()
                    .map_err(|_| OrmError::database(format!("bad lives column '{}'", detail)))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn reload(db: &mut PetStore, obj: &mut Self, dynamic_check: bool) -> Result<bool> {
        let id = obj.pet.id.ok_or(OrmError::ObjectNotPersistent)?;
        Self::find(db, &id, obj, dynamic_check)
    }

    fn erase(db: &mut PetStore, obj: &Self, top_level: bool, dynamic_check: bool) -> Result<()> {
        db.trace("erase", "Cat", Some(top_level), dynamic_check);
        db.delete(obj.pet.id)
    }

    fn erase_id(db: &mut PetStore, id: &u64, top_level: bool, dynamic_check: bool) -> Result<()> {
        db.trace("erase_id", "Cat", Some(top_level), dynamic_check);
        db.delete(Some(*id))
    }
}

impl ObjectTraits<Zoo> for Creature {
    fn create() -> Box<dyn Animal> {
        Box::new(Creature::default())
    }

    fn persist(db: &mut PetStore, _obj: &mut Self, top_level: bool, dynamic_check: bool) -> Result<()> {
        db.trace("persist", "Creature", Some(top_level), dynamic_check);
        Ok(())
    }

    fn update(db: &mut PetStore, _obj: &Self, top_level: bool, dynamic_check: bool) -> Result<()> {
        db.trace("update", "Creature", Some(top_level), dynamic_check);
        Ok(())
    }

    fn find(db: &mut PetStore, id: &u64, obj: &mut Self, dynamic_check: bool) -> Result<bool> {
        db.trace("find", "Creature", None, dynamic_check);
        Ok(db.fetch_pet(*id, &mut obj.pet).is_some())
    }

    fn reload(db: &mut PetStore, obj: &mut Self, dynamic_check: bool) -> Result<bool> {
        let id = obj.pet.id.ok_or(OrmError::ObjectNotPersistent)?;
        Self::find(db, &id, obj, dynamic_check)
    }

    fn erase(db: &mut PetStore, obj: &Self, top_level: bool, dynamic_check: bool) -> Result<()> {
        db.trace("erase", "Creature", Some(top_level), dynamic_check);
        db.delete(obj.pet.id)
    }

    fn erase_id(db: &mut PetStore, id: &u64, top_level: bool, dynamic_check: bool) -> Result<()> {
        db.trace("erase_id", "Creature", Some(top_level), dynamic_check);
        db.delete(Some(*id))
    }
}

/// Registrations of the whole `Animal` hierarchy
pub struct PetModule;

impl MappingModule for PetModule {
    fn name(&self) -> &'static str {
        "pets"
    }

    fn register(&self, catalog: &mut CatalogBuilder) -> Result<()> {
        catalog.register::<Zoo, Pet>("Pet".to_string(), false)?;
        catalog.register::<Zoo, Dog>("Dog".to_string(), false)?;
        catalog.register::<Zoo, Cat>("Cat".to_string(), false)?;
        catalog.register::<Zoo, Creature>("Creature".to_string(), true)
    }
}

/// A fully registered `Animal` map
pub fn zoo_map() -> ormrt_core::PolymorphicMap<Zoo> {
    let mut builder = CatalogBuilder::new();
    if let Err(err) = PetModule.register(&mut builder) {
        panic!("fixture registration failed: {}", err);
    }
    std::mem::take(builder.hierarchy::<Zoo>())
}

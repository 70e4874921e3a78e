//! Process-wide type catalog
//!
//! Registration runs in two phases. During start-up every generated module
//! registers its classes on an exclusively owned [`CatalogBuilder`]
//! ([`register_all`]). The builder is then frozen into an immutable
//! [`Catalog`], optionally installed once for the whole process
//! ([`install`]). From that point on the catalog is only read, from any
//! thread, without locking.
//!
//! Each hierarchy's map is shared through an `Arc`: [`Catalog::hierarchy`]
//! hands out a reference and the map is freed once the catalog and every
//! handed-out reference are gone.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use super::dispatch::ObjectTraits;
use super::map::PolymorphicMap;
use super::Hierarchy;
use crate::errors::{OrmError, Result};
use crate::{log_op_end, log_op_error, log_op_start};

/// A set of generated class registrations
pub trait MappingModule: Sync {
    fn name(&self) -> &'static str;

    /// Register this module's classes
    ///
    /// # Errors
    ///
    /// Returns `DuplicateRegistration` if a class or discriminator clashes
    /// with one already registered.
    fn register(&self, catalog: &mut CatalogBuilder) -> Result<()>;
}

struct Entry {
    name: &'static str,
    map: Box<dyn Any + Send + Sync>,
}

/// Exclusively owned catalog under construction
#[derive(Default)]
pub struct CatalogBuilder {
    maps: HashMap<TypeId, Entry>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map of hierarchy `H`, created on first use
    pub fn hierarchy<H: Hierarchy>(&mut self) -> &mut PolymorphicMap<H> {
        let entry = self.maps.entry(TypeId::of::<H>()).or_insert_with(|| Entry {
            name: H::NAME,
            map: Box::new(PolymorphicMap::<H>::new()),
        });
        match entry.map.downcast_mut::<PolymorphicMap<H>>() {
            Some(map) => map,
            // Entries are keyed by the TypeId of the map's own hierarchy.
            None => unreachable!("catalog entry for {} holds a foreign map", H::NAME),
        }
    }

    /// Register the concrete class `T` in hierarchy `H`
    ///
    /// # Errors
    ///
    /// Returns `DuplicateRegistration` on a clashing type or discriminator.
    pub fn register<H, T>(
        &mut self,
        discriminator: H::Discriminator,
        is_abstract: bool,
    ) -> Result<()>
    where
        H: Hierarchy,
        T: ObjectTraits<H>,
    {
        self.hierarchy::<H>()
            .register_type::<T>(discriminator, is_abstract)
    }

    /// Freeze into a read-only catalog
    pub fn build(self) -> Catalog {
        let maps = self
            .maps
            .into_iter()
            .map(|(id, entry)| {
                let shared: Arc<dyn Any + Send + Sync> = Arc::from(entry.map);
                (
                    id,
                    SharedEntry {
                        name: entry.name,
                        map: shared,
                    },
                )
            })
            .collect();
        Catalog { maps }
    }
}

struct SharedEntry {
    name: &'static str,
    map: Arc<dyn Any + Send + Sync>,
}

/// Read-only set of hierarchy maps
pub struct Catalog {
    maps: HashMap<TypeId, SharedEntry>,
}

impl Catalog {
    /// Acquire a shared reference to the map of hierarchy `H`
    ///
    /// # Errors
    ///
    /// Returns `NoTypeInfo` if no class of `H` was registered.
    pub fn hierarchy<H: Hierarchy>(&self) -> Result<Arc<PolymorphicMap<H>>> {
        let missing = || OrmError::NoTypeInfo {
            hierarchy: H::NAME.to_string(),
            key: "<hierarchy not registered>".to_string(),
        };
        let entry = self.maps.get(&TypeId::of::<H>()).ok_or_else(missing)?;
        Arc::clone(&entry.map)
            .downcast::<PolymorphicMap<H>>()
            .map_err(|_| missing())
    }

    /// Number of registered hierarchies
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Names of the registered hierarchies, sorted
    pub fn hierarchy_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.maps.values().map(|e| e.name).collect();
        names.sort_unstable();
        names
    }
}

/// Run every module's registration on a fresh builder
///
/// # Errors
///
/// Returns the first registration error; the partially filled builder is
/// discarded.
pub fn register_all(modules: &[&dyn MappingModule]) -> Result<Catalog> {
    let start = Instant::now();
    log_op_start!("register_all", modules = modules.len());

    let mut builder = CatalogBuilder::new();
    for module in modules {
        if let Err(err) = module.register(&mut builder) {
            log_op_error!(
                "register_all",
                &err,
                duration_ms = start.elapsed().as_millis() as u64,
                module = module.name()
            );
            return Err(err);
        }
    }

    let catalog = builder.build();
    log_op_end!(
        "register_all",
        duration_ms = start.elapsed().as_millis() as u64,
        hierarchies = catalog.len(),
        modules = modules.len()
    );
    Ok(catalog)
}

static CATALOG: OnceLock<Catalog> = OnceLock::new();

/// Install `catalog` as the process-wide catalog
///
/// # Errors
///
/// Returns `CatalogAlreadyInitialized` if a catalog was installed before;
/// the new one is dropped.
pub fn install(catalog: Catalog) -> Result<&'static Catalog> {
    let mut installed = false;
    let current = CATALOG.get_or_init(|| {
        installed = true;
        catalog
    });
    if !installed {
        return Err(OrmError::CatalogAlreadyInitialized);
    }
    tracing::info!(
        component = module_path!(),
        op = "install",
        hierarchies = current.len(),
    );
    Ok(current)
}

/// The process-wide catalog
///
/// # Errors
///
/// Returns `CatalogNotInitialized` before [`install`] succeeded.
pub fn catalog() -> Result<&'static Catalog> {
    CATALOG.get().ok_or(OrmError::CatalogNotInitialized)
}

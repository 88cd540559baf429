//! The module registry.
//!
//! One registry is created per process and shared by handle. It owns the
//! handler strategies, the live descriptors, their default shadows and the
//! data-changed flag the persistence writer polls.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chatplays_core::error::SurfaceError;
use chatplays_core::handler::{CommandHandler, HandlerKind};
use chatplays_core::settings::GameModes;
use chatplays_core::surface::TypeInfo;
use tracing::{debug, error, info, warn};

use crate::application::handlers::{IntrospectedHandler, UnsupportedHandler};
use crate::application::introspection::{Discovery, introspect};
use crate::builtin;
use crate::domain::descriptor::{DefaultModuleDescriptor, DescriptorField, ModuleDescriptor};
use crate::domain::instance::ModuleInstance;

/// Builds the handler for a module with a built-in implementation.
pub type HandlerConstructor =
    Arc<dyn Fn(&ModuleInstance) -> Box<dyn CommandHandler> + Send + Sync>;

/// Wraps an introspected handler.
pub type ShimConstructor =
    Arc<dyn Fn(Box<dyn CommandHandler>) -> Box<dyn CommandHandler> + Send + Sync>;

#[derive(Clone)]
enum Strategy {
    BuiltIn(HandlerConstructor),
    Shim(ShimConstructor),
}

/// A resolved module: its handler and current descriptor.
pub struct Resolved {
    pub handler: Box<dyn CommandHandler>,
    pub descriptor: ModuleDescriptor,
}

impl std::fmt::Debug for Resolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolved")
            .field("kind", &self.handler.kind())
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

/// Process-wide table of module strategies and descriptors.
#[derive(Default)]
pub struct ModuleRegistry {
    strategies: RwLock<HashMap<String, Strategy>>,
    descriptors: RwLock<HashMap<String, ModuleDescriptor>>,
    defaults: RwLock<HashMap<String, DefaultModuleDescriptor>>,
    data_changed: AtomicBool,
    type_universe: RwLock<Vec<TypeInfo>>,
    logged_type_names: Mutex<HashSet<String>>,
    modes: RwLock<GameModes>,
}

impl ModuleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry seeded with the built-in descriptor table.
    #[must_use]
    pub fn with_builtin_table() -> Self {
        let registry = Self::new();
        for descriptor in builtin::descriptors() {
            registry.install_default(descriptor);
        }
        debug!(
            count = read(&registry.descriptors).len(),
            "installed built-in descriptors"
        );
        registry
    }

    /// Registers a built-in handler constructor for `module_id`.
    pub fn register_builtin<F>(&self, module_id: impl Into<String>, constructor: F)
    where
        F: Fn(&ModuleInstance) -> Box<dyn CommandHandler> + Send + Sync + 'static,
    {
        write(&self.strategies).insert(module_id.into(), Strategy::BuiltIn(Arc::new(constructor)));
    }

    /// Registers a shim wrapped around the introspected handler of
    /// `module_id`.
    pub fn register_shim<F>(&self, module_id: impl Into<String>, shim: F)
    where
        F: Fn(Box<dyn CommandHandler>) -> Box<dyn CommandHandler> + Send + Sync + 'static,
    {
        write(&self.strategies).insert(module_id.into(), Strategy::Shim(Arc::new(shim)));
    }

    /// Installs a factory-declared descriptor and its default shadow.
    ///
    /// The shadow is written only if none exists yet.
    pub fn install_default(&self, descriptor: ModuleDescriptor) {
        let module_id = descriptor.module_id.clone();
        write(&self.defaults)
            .entry(module_id.clone())
            .or_insert_with(|| DefaultModuleDescriptor::from_declared(&descriptor));
        write(&self.descriptors).insert(module_id, descriptor);
    }

    /// Replaces the set of loaded component types used for duplicate-name
    /// diagnostics.
    pub fn load_type_universe(&self, types: Vec<TypeInfo>) {
        *write(&self.type_universe) = types;
    }

    /// Sets the game modes written into newly bound modules.
    pub fn set_game_modes(&self, modes: GameModes) {
        *write(&self.modes) = modes;
    }

    /// The game modes written into newly bound modules.
    #[must_use]
    pub fn game_modes(&self) -> GameModes {
        *read(&self.modes)
    }

    /// Resolves the handler for a module instance.
    ///
    /// Built-in constructors win; otherwise the module is introspected and
    /// optionally shimmed; anything without a usable entry point gets the
    /// unsupported handler. Never fails.
    pub fn resolve(&self, instance: &ModuleInstance) -> Resolved {
        let strategy = read(&self.strategies).get(&instance.module_type).cloned();
        let handler = match strategy {
            Some(Strategy::BuiltIn(constructor)) => constructor(instance),
            Some(Strategy::Shim(shim)) => {
                let inner = self.resolve_introspected(instance);
                if inner.kind() == HandlerKind::Unsupported {
                    inner
                } else {
                    shim(inner)
                }
            }
            None => self.resolve_introspected(instance),
        };

        info!(
            module_type = %instance.module_type,
            display_name = %instance.display_name,
            kind = %handler.kind(),
            "resolved module handler"
        );

        Resolved {
            handler,
            descriptor: self.descriptor(&instance.module_type),
        }
    }

    fn resolve_introspected(&self, instance: &ModuleInstance) -> Box<dyn CommandHandler> {
        match self.discover(instance) {
            Ok(discovery) if discovery.is_supported() => {
                Box::new(IntrospectedHandler::new(discovery.binding, self.game_modes()))
            }
            Ok(discovery) => {
                warn!(
                    module_type = %instance.module_type,
                    "no usable command entry point, module is unsupported"
                );
                self.log_duplicate_types(instance);
                Box::new(UnsupportedHandler::new(discovery.binding.forced_solve))
            }
            Err(error) => {
                error!(
                    module_type = %instance.module_type,
                    %error,
                    "introspection failed, falling back to unsupported handler"
                );
                self.log_duplicate_types(instance);
                Box::new(UnsupportedHandler::default())
            }
        }
    }

    fn discover(&self, instance: &ModuleInstance) -> Result<Discovery, SurfaceError> {
        let discovery = introspect(instance)?;
        let module_id = &instance.module_type;

        write(&self.defaults)
            .entry(module_id.clone())
            .or_insert_with(|| {
                DefaultModuleDescriptor::from_declared(
                    &discovery.declared(module_id, &instance.display_name),
                )
            });

        let changed = {
            let mut descriptors = write(&self.descriptors);
            let stored = descriptors
                .entry(module_id.clone())
                .or_insert_with(|| ModuleDescriptor::new(module_id.as_str()));
            discovery.apply_to(stored, &instance.display_name)
        };
        if changed {
            self.mark_data_changed();
        }

        Ok(discovery)
    }

    /// Logs every component type of `instance` whose full name is shared by
    /// several loaded types. Each name is reported at most once per
    /// registry. Returns the names reported by this call.
    pub fn log_duplicate_types(&self, instance: &ModuleInstance) -> Vec<String> {
        let universe = read(&self.type_universe);
        let mut logged = lock(&self.logged_type_names);
        let mut reported = Vec::new();

        for component in &instance.components {
            let full_name = &component.type_info().full_name;
            if full_name.is_empty() || !logged.insert(full_name.clone()) {
                continue;
            }

            let matches: Vec<&TypeInfo> = universe
                .iter()
                .filter(|t| t.full_name == *full_name)
                .collect();
            if matches.len() < 2 {
                continue;
            }

            warn!(
                full_name = %full_name,
                count = matches.len(),
                "found several types sharing one full name"
            );
            for duplicate in matches {
                warn!(
                    full_name = %duplicate.full_name,
                    origin = %duplicate.origin,
                    "duplicate type"
                );
            }
            reported.push(full_name.clone());
        }

        reported
    }

    /// Returns the descriptor for `module_id`, creating an all-default one
    /// if none exists.
    #[must_use]
    pub fn descriptor(&self, module_id: &str) -> ModuleDescriptor {
        if let Some(descriptor) = read(&self.descriptors).get(module_id) {
            return descriptor.clone();
        }
        write(&self.descriptors)
            .entry(module_id.to_owned())
            .or_insert_with(|| ModuleDescriptor::new(module_id))
            .clone()
    }

    /// Returns the default shadow for `module_id`, if one was recorded.
    #[must_use]
    pub fn default_descriptor(&self, module_id: &str) -> Option<ModuleDescriptor> {
        read(&self.defaults)
            .get(module_id)
            .map(DefaultModuleDescriptor::to_descriptor)
    }

    /// Merges `incoming` into the stored descriptor, respecting override
    /// flags. Returns whether anything changed.
    pub fn register(&self, incoming: &ModuleDescriptor) -> bool {
        if incoming.module_id.is_empty() {
            warn!("ignoring descriptor without a module id");
            return false;
        }

        let changed = match write(&self.descriptors).entry(incoming.module_id.clone()) {
            Entry::Occupied(mut stored) => stored.get_mut().merge_from(incoming),
            Entry::Vacant(slot) => {
                slot.insert(incoming.clone());
                true
            }
        };
        if changed {
            debug!(module_id = %incoming.module_id, "descriptor changed");
            self.mark_data_changed();
        }
        changed
    }

    /// Discards the stored descriptor, override flags included, and restores
    /// the default shadow. Returns `false` if no shadow exists.
    pub fn reset_to_default(&self, module_id: &str) -> bool {
        let Some(default) = self.default_descriptor(module_id) else {
            return false;
        };
        write(&self.descriptors).insert(module_id.to_owned(), default);
        self.mark_data_changed();
        true
    }

    /// Resets every stored descriptor that has a default shadow.
    pub fn reset_all(&self) {
        let ids: Vec<String> = read(&self.descriptors).keys().cloned().collect();
        for module_id in ids {
            self.reset_to_default(&module_id);
        }
    }

    /// Lists the fields of `module_id` that differ from its default shadow.
    #[must_use]
    pub fn drift(&self, module_id: &str) -> Vec<DescriptorField> {
        let Some(default) = read(&self.defaults).get(module_id).cloned() else {
            return Vec::new();
        };
        default.drift(&self.descriptor(module_id))
    }

    /// Every stored descriptor, ordered by module id.
    #[must_use]
    pub fn descriptors(&self) -> Vec<ModuleDescriptor> {
        let mut all: Vec<ModuleDescriptor> = read(&self.descriptors).values().cloned().collect();
        all.sort_by(|a, b| a.module_id.cmp(&b.module_id));
        all
    }

    /// Flags that descriptors need to be written out.
    pub fn mark_data_changed(&self) {
        self.data_changed.store(true, Ordering::Release);
    }

    /// Clears and returns the data-changed flag.
    pub fn take_data_changed(&self) -> bool {
        self.data_changed.swap(false, Ordering::AcqRel)
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

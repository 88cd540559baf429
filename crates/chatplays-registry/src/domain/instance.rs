//! A module instance as presented to the registry.

use std::fmt;
use std::sync::Arc;

use chatplays_core::surface::ComponentSurface;

/// One module on the bomb, seen through its component graph.
#[derive(Clone)]
pub struct ModuleInstance {
    /// The module type id.
    pub module_type: String,
    /// The name shown to players.
    pub display_name: String,
    /// Every component of the module, in graph order.
    pub components: Vec<Arc<dyn ComponentSurface>>,
    /// Local `(x, z)` position of the status light, if the module has one.
    pub status_light_position: Option<(f32, f32)>,
}

impl ModuleInstance {
    /// Creates an instance with no components.
    #[must_use]
    pub fn new(module_type: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            module_type: module_type.into(),
            display_name: display_name.into(),
            components: Vec::new(),
            status_light_position: None,
        }
    }

    /// Adds a component.
    #[must_use]
    pub fn with_component(mut self, component: Arc<dyn ComponentSurface>) -> Self {
        self.components.push(component);
        self
    }

    /// Sets the status light's local position.
    #[must_use]
    pub fn with_status_light(mut self, x: f32, z: f32) -> Self {
        self.status_light_position = Some((x, z));
        self
    }
}

impl fmt::Debug for ModuleInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleInstance")
            .field("module_type", &self.module_type)
            .field("display_name", &self.display_name)
            .field(
                "components",
                &self
                    .components
                    .iter()
                    .map(|c| c.type_info().full_name.clone())
                    .collect::<Vec<_>>(),
            )
            .field("status_light_position", &self.status_light_position)
            .finish()
    }
}

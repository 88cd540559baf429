//! Game-engine collaborators: the bomb, its modules, cameras and music.
//!
//! These are the leaves the dispatch engine drives. Focus, defocus, UI
//! transitions and bomb turns are animations, so they are `async` and the
//! engine awaits them in order.

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use crate::directive::{Rotation, SelectableId};
use crate::error::HandlerFault;

/// Events a module raises towards its solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleEvent {
    /// The module reached its win condition.
    Pass,
    /// The module struck.
    Strike,
    /// A visual-only strike; no counter changes.
    FakeStrike,
}

/// One module on the bomb.
pub trait BombModule: Send + Sync {
    /// The module type id.
    fn module_type(&self) -> &str;

    /// The name shown to players.
    fn display_name(&self) -> &str;

    /// Whether the module is solved.
    fn is_solved(&self) -> bool;

    /// Needy modules never award solves.
    fn is_needy(&self) -> bool;

    /// Presses and releases one selectable.
    ///
    /// # Errors
    ///
    /// Returns a [`HandlerFault`] if the selectable does not exist.
    fn interact(&self, selectable: &SelectableId) -> Result<(), HandlerFault>;

    /// Forces the module into its solved state, raising [`ModuleEvent::Pass`].
    fn force_pass(&self);

    /// Registers the channel that receives this module's events.
    fn subscribe(&self, events: UnboundedSender<ModuleEvent>);
}

/// The bomb as a whole.
#[async_trait]
pub trait BombCommander: Send + Sync {
    /// Brings a module into view.
    async fn focus(&self, module_code: &str);

    /// Returns a focused module to the bomb.
    async fn defocus(&self, module_code: &str);

    /// Rotates the bomb face in the holder's local space.
    fn rotate_by_local(&self, rotation: Rotation);

    /// Rotates the camera looking at a module.
    fn rotate_camera_by_local(&self, module_code: &str, rotation: Rotation);

    /// Strikes allowed before the bomb explodes.
    fn strike_limit(&self) -> u32;

    /// Strikes the bomb has taken.
    fn strike_count(&self) -> u32;

    /// Clears the bomb's strike counter.
    fn reset_strike_count(&self);

    /// Whether the bomb has more than two faces.
    fn is_multi_decker(&self) -> bool;

    /// Number of solvable modules on the bomb.
    fn solvable_modules(&self) -> u32;

    /// Counts one more solved module.
    fn record_solve(&self);

    /// Seconds left on the timer.
    fn current_timer(&self) -> f32;

    /// Sets the seconds left on the timer.
    fn set_time_remaining(&self, seconds: f32);

    /// Explodes the bomb, crediting `module_name`.
    fn cause_explosion(&self, reason: &str, module_name: &str);

    /// Hides the main UI window.
    async fn hide_main_ui(&self);

    /// Shows the main UI window.
    async fn show_main_ui(&self);

    /// Turns the bomb to its other face.
    async fn turn_bomb(&self);

    /// Solves modules whose rules depend on the solve count.
    fn remove_solve_based_modules(&self);
}

/// Camera slot priority, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum CameraPriority {
    #[default]
    NotInUse,
    InUse,
    Prioritised,
    Pinned,
}

/// Picture-in-picture module cameras.
pub trait ModuleCameras: Send + Sync {
    /// Attaches a camera to a module.
    fn attach(&self, module_code: &str, priority: CameraPriority);

    /// Detaches the camera from a module, optionally after a delay.
    fn detach(&self, module_code: &str, delayed: bool);

    /// Hides every camera.
    fn hide(&self);

    /// Shows every camera.
    fn show(&self);

    /// Hides the HUD overlay.
    fn hide_hud(&self);

    /// Shows the HUD overlay.
    fn show_hud(&self);

    /// Refreshes the solved-module counter.
    fn update_solves(&self);

    /// Refreshes the strike counter, optionally flashing it.
    fn update_strikes(&self, flash: bool);
}

/// Ambient music.
pub trait MusicPlayer: Send + Sync {
    /// Starts a random track.
    fn start_random(&self);

    /// Stops the current track.
    fn stop(&self);
}

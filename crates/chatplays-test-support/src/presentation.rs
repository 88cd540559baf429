//! Test cameras and music: record what the engine asked for.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use chatplays_core::game::{CameraPriority, ModuleCameras, MusicPlayer};

/// One call made against the module cameras.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraCall {
    Attach(String, CameraPriority),
    Detach { module_code: String, delayed: bool },
    Hide,
    Show,
    HideHud,
    ShowHud,
    UpdateSolves,
    UpdateStrikes { flash: bool },
}

/// Module cameras that record every call.
#[derive(Debug, Default)]
pub struct RecordingCameras {
    calls: Mutex<Vec<CameraCall>>,
}

impl RecordingCameras {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every call.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<CameraCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: CameraCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ModuleCameras for RecordingCameras {
    fn attach(&self, module_code: &str, priority: CameraPriority) {
        self.record(CameraCall::Attach(module_code.to_owned(), priority));
    }

    fn detach(&self, module_code: &str, delayed: bool) {
        self.record(CameraCall::Detach {
            module_code: module_code.to_owned(),
            delayed,
        });
    }

    fn hide(&self) {
        self.record(CameraCall::Hide);
    }

    fn show(&self) {
        self.record(CameraCall::Show);
    }

    fn hide_hud(&self) {
        self.record(CameraCall::HideHud);
    }

    fn show_hud(&self) {
        self.record(CameraCall::ShowHud);
    }

    fn update_solves(&self) {
        self.record(CameraCall::UpdateSolves);
    }

    fn update_strikes(&self, flash: bool) {
        self.record(CameraCall::UpdateStrikes { flash });
    }
}

/// A music player that counts starts and stops.
#[derive(Debug, Default)]
pub struct RecordingMusic {
    started: AtomicU32,
    stopped: AtomicU32,
}

impl RecordingMusic {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn started(&self) -> u32 {
        self.started.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn stopped(&self) -> u32 {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl MusicPlayer for RecordingMusic {
    fn start_random(&self) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn stop(&self) {
        self.stopped.fetch_add(1, Ordering::SeqCst);
    }
}

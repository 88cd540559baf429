//! Shared helpers for console host integration tests.
#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use chatplays_core::chat::ChatSink;
use chatplays_core::scheduler::Scheduler;
use chatplays_core::settings::PlaySettings;
use chatplays_server::config::Config;
use chatplays_server::state::AppState;
use chatplays_test_support::{RecordingChat, RecordingScheduler};

/// A host armed against a descriptor file in `dir`.
pub struct TestHost {
    pub state: AppState,
    pub chat: Arc<RecordingChat>,
    pub scheduler: Arc<RecordingScheduler>,
}

/// Descriptor file used by every test host.
pub fn module_data(dir: &Path) -> std::path::PathBuf {
    dir.join("ModuleInformation.json")
}

/// Configuration with `alice` as admin and `host` as the operator.
pub fn test_config(dir: &Path) -> Config {
    let data = module_data(dir);
    Config::from_lookup(|name| match name {
        "CHATPLAYS_MODULE_DATA" => data.to_str().map(str::to_owned),
        "CHATPLAYS_ADMINS" => Some("alice".to_owned()),
        "CHATPLAYS_STREAMER" => Some("host".to_owned()),
        _ => None,
    })
    .unwrap()
}

/// Builds a host with default settings and a scheduler that never sleeps.
pub async fn build_host(dir: &Path) -> TestHost {
    build_host_with(dir, PlaySettings::default()).await
}

/// Builds a host with `settings`.
pub async fn build_host_with(dir: &Path, settings: PlaySettings) -> TestHost {
    let chat = Arc::new(RecordingChat::new());
    let scheduler = Arc::new(RecordingScheduler::new());
    let state = AppState::build(
        &test_config(dir),
        settings,
        Arc::clone(&chat) as Arc<dyn ChatSink>,
        Arc::clone(&scheduler) as Arc<dyn Scheduler>,
    )
    .await
    .unwrap();
    TestHost {
        state,
        chat,
        scheduler,
    }
}

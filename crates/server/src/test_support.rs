use db::DBService;
use services::services::config::{Config, WatchConfig};

use crate::AppState;

pub async fn test_state_with(config: Config) -> (tempfile::TempDir, AppState) {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("db.sqlite");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.to_string_lossy());
    let db = DBService::connect(&db_url).await.unwrap();
    let state = AppState::new(db, config, dir.path().join("storage")).unwrap();
    (dir, state)
}

pub async fn test_state() -> (tempfile::TempDir, AppState) {
    test_state_with(Config::default()).await
}

pub async fn test_state_with_watch(
    interval_secs: u64,
    deadline_secs: u64,
) -> (tempfile::TempDir, AppState) {
    let config = Config {
        watch: WatchConfig {
            interval_secs,
            deadline_secs,
        },
        ..Default::default()
    };
    test_state_with(config).await
}

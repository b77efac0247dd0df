use std::path::{Path, PathBuf};

pub const TURN_LOG_FILE: &str = "conversation_log.jsonl";
pub const CACHE_FILE: &str = "request_cache.json";
pub const DIAGNOSTIC_LOG_FILE: &str = "diagnostics.log";

#[must_use]
pub fn turn_log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(TURN_LOG_FILE)
}

#[must_use]
pub fn cache_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CACHE_FILE)
}

#[must_use]
pub fn diagnostic_log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DIAGNOSTIC_LOG_FILE)
}

use super::constants::*;

pub(crate) fn log_level() -> Option<String> {
    Some("info".to_string())
}

pub(crate) fn log_file_path() -> String {
    LOG_FILE_PATH.to_string()
}

pub(crate) fn max_conversations() -> usize {
    MAX_CONVERSATIONS
}

pub(crate) fn storage_dir() -> String {
    STORAGE_DIR.to_string()
}

pub(crate) fn storage_key() -> String {
    STORAGE_KEY.to_string()
}

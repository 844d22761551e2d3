/// Key of the single storage slot holding every conversation
pub const STORAGE_KEY: &str = "chat-conversations";

/// Conversations kept when the storage medium runs out of space
pub const MAX_CONVERSATIONS: usize = 50;

pub const DEFAULT_TITLE: &str = "New Chat";

/// Titles derived from a prompt are cut at this many characters
pub const MAX_TITLE_LENGTH: usize = 50;

pub const LOG_FILE_PATH: &str = "/tmp/parley.log";

pub const STORAGE_DIR: &str = "${HOME}/.local/share/parley";

pub const RELAY_ENDPOINT: &str = "http://localhost:3000/api/chat";

pub const OPENAI_ENDPOINT: &str = "https://api.openai.com";

pub const OPENAI_MODEL: &str = "gpt-3.5-turbo";

pub const TEMPERATURE: f32 = 0.7;

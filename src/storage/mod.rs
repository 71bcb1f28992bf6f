mod export;
mod game_storage;
mod history_recorder;
mod store;

pub use export::{ExportDocument, ImportSummary};
pub use game_storage::{
    GameStorage, COMPOSITION_HISTORY_KEY, COMPOSITION_SETTINGS_KEY, GAME_HISTORY_KEY,
    HISTORY_LIMIT, PLAYER_NAME_KEY, SETTINGS_KEY,
};
pub use history_recorder::HistoryRecorder;
pub use store::{FileStore, KeyValueStore, MemoryStore};

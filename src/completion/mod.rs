//! Completion reporting
//!
//! Persists a record when a session is won and builds the
//! [`NavigationSignal`] that hands control back to the lesson browser.

pub mod navigation;
pub mod store;

pub use navigation::{DEFAULT_GAME_PAGE, DEFAULT_PRACTICE_PAGE, NavigationSignal};
pub use store::{
    CompletionMap, CompletionRecord, CompletionStore, JsonFileStore, MemoryStore, report_win,
};

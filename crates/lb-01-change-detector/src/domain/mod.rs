//! Domain layer: cursor and recent-history buffer.

pub mod cursor;
pub mod history;

pub use cursor::Cursor;
pub use history::{RecentHistory, MAX_HISTORY};

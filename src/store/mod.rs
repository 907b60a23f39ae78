pub mod sqlite;
pub mod tracked;

use crate::app::Result;

pub use sqlite::SqliteStore;
pub use tracked::TrackedChannels;

/// Small string values that outlive the process, addressed by a fixed key.
pub trait Store {
    fn get_value(&self, key: &str) -> Result<Option<String>>;
    fn set_value(&self, key: &str, value: &str) -> Result<()>;
    fn delete_value(&self, key: &str) -> Result<()>;
}

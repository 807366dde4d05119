// Client-side key/value persistence, shared by the HTTP client and the session

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::Result;

/// Key under which the bearer token is stored.
pub const TOKEN_KEY: &str = "token";

pub trait LocalStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;

    fn token(&self) -> Result<Option<String>> {
        Ok(self.get_item(TOKEN_KEY)?.filter(|t| !t.is_empty()))
    }

    fn set_token(&self, token: &str) -> Result<()> {
        self.set_item(TOKEN_KEY, token)
    }

    fn clear_token(&self) -> Result<()> {
        self.remove_item(TOKEN_KEY)
    }
}

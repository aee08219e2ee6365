//! Persisted configuration on the device file system.

mod flash;
pub mod kv;
mod store;

pub use flash::{FlashFileSystem, SLOT_CAPACITY};
pub use store::{ConfigStore, FILE_BUFFER_SIZE, LoadedConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    NotFound,
    /// No room left, either on the medium or in a fixed-size buffer
    Full,
    DriverError,
    InvalidData,
    /// Written data did not read back identically
    VerifyFailed,
    NameTooLong,
}

impl From<core::fmt::Error> for StorageError {
    fn from(_error: core::fmt::Error) -> Self {
        StorageError::Full
    }
}

/// How a write treats existing file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Add to the end of the file, creating it when absent
    Append,
    /// Replace the whole file, creating it when absent
    Truncate,
}

/// Minimal file system the configuration store runs on.
#[allow(async_fn_in_trait)]
pub trait FileSystem {
    /// Size of a file in bytes.
    async fn size(&mut self, path: &str) -> Result<usize, StorageError>;

    /// Read file content starting at `offset`.
    ///
    /// Returns the number of bytes copied into `buf`, `0` past the end.
    async fn read(
        &mut self,
        path: &str,
        offset: usize,
        buf: &mut [u8],
    ) -> Result<usize, StorageError>;

    async fn write(
        &mut self,
        path: &str,
        data: &[u8],
        mode: OpenMode,
    ) -> Result<(), StorageError>;

    /// Move `from` over `to`, replacing any existing `to`.
    async fn rename(&mut self, from: &str, to: &str) -> Result<(), StorageError>;

    async fn remove(&mut self, path: &str) -> Result<(), StorageError>;
}

mod error;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use filesystem::FilesystemStorage;
pub use traits::{BoxReader, FileStorage};

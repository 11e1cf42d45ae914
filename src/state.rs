mod error;
mod file;
mod store;

pub use error::{Error, Result};
pub use file::FileStateStore;
pub use store::StateStore;

pub mod error;
pub mod types;

pub use error::{InsertError, Result, SERIALIZATION_FAILURE, WriteError};
pub use types::{CartItem, ItemId};

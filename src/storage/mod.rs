pub mod fault;
pub mod memory;

pub use fault::FlakyWriter;
pub use memory::InMemoryCartItemStore;

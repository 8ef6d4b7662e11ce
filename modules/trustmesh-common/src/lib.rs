pub mod config;
pub mod error;
pub mod memory;
pub mod store;
pub mod types;

pub use config::Config;
pub use error::TrustMeshError;
pub use memory::MemoryStore;
pub use store::*;
pub use types::*;

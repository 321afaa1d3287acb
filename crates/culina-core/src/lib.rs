pub mod config;
pub mod error;
pub mod types;

pub use config::CulinaConfig;
pub use error::{CulinaError, Result};
pub use types::*;

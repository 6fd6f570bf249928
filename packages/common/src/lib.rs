pub mod config;
pub mod error;
pub mod id_generator;
pub mod logging;
pub mod result;

pub use config::*;
pub use error::*;
pub use id_generator::*;
pub use logging::*;
pub use result::*;

//! quizgate-host — Host-record backends and tool configuration.
//!
//! Implements the `HostRecord` and `SuspendStore` traits from
//! `quizgate-core` over a JSON file ([`file::FileHost`]) and in memory
//! ([`memory::MemoryHost`]).

pub mod config;
pub mod error;
pub mod file;
pub mod memory;

pub use config::{load_config, load_config_from, QuizgateConfig};
pub use error::StoreError;
pub use file::{FileHost, StoredRecord};
pub use memory::MemoryHost;

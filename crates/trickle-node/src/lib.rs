//! # trickle-node
//! RocksDB storage, configuration and orchestration.
//!
//! - [`storage::RocksStore`]: persistent incentive state backed by RocksDB
//! - [`node::Node`]: engine behind a lock, driven once per block
//! - [`config::NodeConfig`] / [`config::ParamsFile`]: TOML + environment configuration
//! - [`logging::init_logging`]: tracing subscriber setup

pub mod config;
pub mod error;
pub mod logging;
pub mod node;
pub mod storage;

pub use config::{LogFormat, NodeConfig, ParamsFile};
pub use error::NodeError;
pub use logging::init_logging;
pub use node::Node;
pub use storage::RocksStore;

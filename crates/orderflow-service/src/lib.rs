//! # orderflow-service
//!
//! Wires the admission and finality planes into the order-creation
//! workflow, and adds the administrative surface around it.
//!
//! - [`OrderWorkflow`]: guard → validate → delay → recheck → commit
//! - [`ClientDirectory`]: register, update, deactivate, profit resets
//! - [`OrderQueries`]: order lookup and listing
//! - [`ServiceConfig`]: JSON configuration; [`init_tracing`] for logging
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use orderflow_service::{OrderWorkflow, ServiceConfig, WorkflowStores, init_tracing};
//! use orderflow_store::{MemoryLockStore, MemoryStore};
//!
//! # async fn run() -> orderflow_types::Result<()> {
//! let config = ServiceConfig::from_file("orderflow.json")?;
//! init_tracing(&config.log);
//!
//! let store = Arc::new(MemoryStore::default());
//! let stores = WorkflowStores::memory(&store, Arc::new(MemoryLockStore::new()));
//! let workflow = OrderWorkflow::new(&config.workflow, stores)?;
//! # let _ = workflow;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod directory;
pub mod orders;
pub mod telemetry;
pub mod workflow;

pub use config::{LogConfig, LogFormat, ServiceConfig};
pub use directory::{ClientDirectory, ClientRequest, ClientView};
pub use orders::{OrderQueries, OrderView};
pub use telemetry::init_tracing;
pub use workflow::{OrderWorkflow, WorkflowStores};

//! Teren Server - field-service settlement backend
//!
//! Backend for a telecom installation company's financial settlement: once
//! a work order is completed and verified, compute what the customer owes,
//! what each technician earns, and what the company keeps - exactly once
//! per work order, with typed, resumable failure records when the
//! configuration is incomplete.
//!
//! # Module structure
//!
//! ```text
//! teren-server/src/
//! ├── core/        # Configuration, state, HTTP server
//! ├── api/         # HTTP routes and handlers
//! ├── db/          # SurrealDB models and repositories
//! ├── settlement/  # Decision procedure, money math, recalculation driver
//! ├── reporting/   # Ledger aggregation with cache
//! └── utils/       # Errors, logging, time helpers
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod reporting;
pub mod settlement;
pub mod utils;

// Re-export common types
pub use crate::core::{Config, Server, ServerState};
pub use settlement::{RecalcDriver, SettlementEngine, SettlementOutcome};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

//! Concurrent implementations of the fee ledger components
//!
//! This module provides thread-safe counterparts of the sequential fee ledger
//! and engine, using DashMap for per-record locking.
//!
//! # Architecture
//!
//! - **AsyncFeeLedger**: Thread-safe fee record store using DashMap
//! - **AsyncFeeEngine**: Applies ledger commands on top of the shared store
//! - **BatchProcessor**: Runs one tokio task per fee record
//!
//! # Thread Safety
//!
//! - Commands for different fee records proceed in parallel
//! - Commands for the same record are serialized by its entry lock
//! - No global locks

pub mod batch_processor;
pub mod engine;
pub mod fee_ledger;

pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use engine::AsyncFeeEngine;
pub use fee_ledger::AsyncFeeLedger;

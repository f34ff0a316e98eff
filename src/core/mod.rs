//! Core business logic module
//!
//! This module contains the core components:
//! - `allocator` - Spreads payments over fee buckets
//! - `status` - Derives bucket and record statuses and totals
//! - `receipt` - Payment id and receipt number generation
//! - `fee_ledger` - Fee record storage and payment application
//! - `engine` - Fee processing orchestration
//! - `traits` - Trait abstraction shared by the sequential and concurrent engines
//! - `grading` - Marks to grades
//! - `results_book` - Graded results and GPA
//! - `circulation` - Library issue, return, renewal and fines
//! - `lockout` - Failed-login lockout transitions
//! - `accounts` - User registration, login and role checks
//! - `notify` - Best-effort notifications
//! - `async` - Concurrent fee ledger, engine and batch processor

pub mod accounts;
pub mod allocator;
pub mod r#async;
pub mod circulation;
pub mod engine;
pub mod fee_ledger;
pub mod grading;
pub mod lockout;
pub mod notify;
pub mod receipt;
pub mod results_book;
pub mod status;
pub mod traits;

pub use accounts::Directory;
pub use circulation::Library;
pub use engine::FeeEngine;
pub use fee_ledger::{FeeLedger, FeeOverview};
pub use notify::{LogNotifier, Notifier};
pub use r#async::{AsyncFeeEngine, AsyncFeeLedger, BatchProcessor};
pub use results_book::ResultsBook;
pub use traits::FeeLedgerEngine;

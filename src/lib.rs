//! # Claustra
//!
//! **Claustra** is a cooperative monitor primitive for async Rust, designed as the
//! coordination layer for the **Nebula** ecosystem.
//!
//! A monitor guards a mutually-exclusive *section*: at most one task executes inside
//! it at a time. Unlike a plain async mutex, occupancy is proven by an explicit
//! [`OwnerToken`] capability rather than inferred from execution context, and the
//! monitor hands out [`Cond`] condition variables that let a task release the
//! section, suspend until another task signals a state change, and then reclaim the
//! section ahead of any first-time entrant.
//!
//! Claustra is built from the ground up for cooperative scheduling, offering:
//!
//! - **Token-based ownership** — entering mints an unforgeable [`OwnerToken`];
//!   releasing requires presenting it back
//! - **FIFO admission** — first-time entrants are granted in arrival order
//! - **Wait/signal/broadcast** condition variables with optional timeouts and
//!   `wait_while` / `wait_until` predicate loops
//! - **Reacquisition priority** — a signaled waiter always regains the section
//!   before any task still queued for first entry
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use claustra::Monitor;
//! use std::sync::Arc;
//!
//! let monitor = Arc::new(Monitor::new());
//! let not_empty = monitor.new_cond();
//!
//! monitor
//!     .with(async |token| {
//!         not_empty.wait_until(token, || queue_has_items()).await.unwrap();
//!         consume_one();
//!     })
//!     .await
//!     .unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`monitor`] — the monitor core: section state, owner tokens, admission queues
//! - [`cond`] — condition variables bound to a monitor
//!
//! ## Getting Started
//!
//! Add Claustra to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! claustra = { git = "https://github.com/Nebula-ecosystem/Claustra" }
//! ```

mod timer;

pub mod cond;
pub mod monitor;

pub use cond::Cond;
pub use monitor::{Enter, Monitor, MonitorError, OwnerToken};

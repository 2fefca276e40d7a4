// src/contract/mod.rs

//! Vocabulary shared between the coordinator and plugins.
//!
//! - [`flags`]: the task bitset.
//! - [`result`]: result codes and their ordering.
//! - [`outcome`]: per-task results of one plugin session.
//! - [`message`]: request and reply messages, JSON encodable.
//! - [`extra`]: extra form fields a plugin declares.

pub mod extra;
pub mod flags;
pub mod message;
pub mod outcome;
pub mod result;

pub use extra::ExtraFormat;
pub use flags::{is_valid_task_int, TaskFlags, TASK_BITS};
pub use message::{SyncReply, SyncRequest, TaskResultEntry};
pub use outcome::SessionOutcome;
pub use result::{SyncResult, TestResult};

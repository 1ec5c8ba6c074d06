#![deny(unsafe_code)]
#![warn(missing_docs)]
//! atb-runtime
//!
//! The dispatch chokepoint: every tool invocation goes through
//! [`Dispatcher::execute_function`], which validates the raw parameter bag
//! against the backend's registry and only then delegates. No tool executes
//! without passing validation, so parameters reaching adapter code are always
//! schema-conformant.
//!
//! The dispatcher holds no locks and no mutable state; arbitrarily many
//! concurrent invocations — of the same or different tools — are safe.

mod dispatch;
mod error;

pub use dispatch::{Dispatch, Dispatcher};
pub use error::DispatchError;

//! atb-core
//!
//! The stable contract for the Agent Toolbelt.
//!
//! Everything a vendor adapter or framework bridge needs to agree on lives
//! here: [`ToolDescriptor`] (the name/description/parameters triple advertised
//! to an LLM), [`ParameterSchema`] (the runtime validator generated from the
//! same typed parameter struct), and [`ToolRegistry`] (the two kept in
//! lockstep). If you only take one dependency, take this one.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod descriptor;
mod outcome;
mod registry;
mod schema;

pub use descriptor::ToolDescriptor;
pub use outcome::CallOutcome;
pub use registry::{RegistryError, ToolRegistry, ToolRegistryBuilder};
pub use schema::{ParameterSchema, SchemaError, SchemaViolations, Violation};

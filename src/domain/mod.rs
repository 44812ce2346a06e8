//! Domain modules organized as vertical slices.
//!
//! Each sub-module contains:
//! - `mod.rs` — Rich domain types (validated, business-logic-ready)
//! - `wire.rs` — Raw serde structs matching broker requests/responses
//! - `convert.rs` — `TryFrom`/`From` conversions with validation
//! - `client.rs` — Sub-client with the envelope-returning operations

pub mod account;
pub mod order;
pub mod position;

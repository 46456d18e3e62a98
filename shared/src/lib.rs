//! Shared record types and wire codec for query result exchange
//!
//! This crate contains the `Point` and `Aux` records that carry intermediate
//! query results between processes, together with the tag-based binary codec
//! used to put them on the wire.

pub mod config;
pub mod protocol;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::CodecConfig;
pub use protocol::error::{Malformed, WireError};
pub use protocol::wire::WireRecord;
pub use types::{auxiliary::Aux, point::Point, value::Value};

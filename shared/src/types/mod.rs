//! Record type definitions
//!
//! `Point` is one row of a query result stream; `Aux` is a typed side value
//! attached to it. Both keep every optional field as an `Option` so that an
//! absent field is never confused with its zero value.

pub mod auxiliary;
pub mod point;
pub mod value;

//! Metrics feed schema
//!
//! This module defines the record format the external feed delivers and the
//! adapter that loads those records into an observation store.

mod adapter;
mod feed_record;

pub use adapter::*;
pub use feed_record::*;

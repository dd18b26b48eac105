//! `adm-model`: the read-only ADM object graph and BS.2051 layouts
//! consumed by the rendering pipeline.
//!
//! This crate owns the data model only — XML parsing, BW64 chunk layout
//! and the common-definitions catalogue are external collaborators whose
//! output is a resolved [`graph::Adm`] value.

pub mod block_format;
mod error;
mod graph;
mod layout;
mod position;
mod validate;

pub use block_format::*;
pub use error::*;
pub use graph::*;
pub use layout::*;
pub use position::*;
pub use validate::*;

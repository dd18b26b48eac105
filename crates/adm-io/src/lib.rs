//! BW64 container interfaces (spec §6).
//!
//! Byte-level AXML and CHNA chunk parsing is out of scope; this crate
//! owns PCM sample access via hound and exposes `Bw64Reader`/
//! `Bw64Writer` trait interfaces a front-end can implement once it has
//! extracted those chunks' raw bytes.

mod bw64;
mod error;

pub use bw64::{BitDepth, Bw64Reader, Bw64Writer, ChnaRow, ChnaTable, HoundBw64Reader, HoundBw64Writer};
pub use error::{IoError, IoResult};

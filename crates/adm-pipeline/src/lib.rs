//! Item selection, track resolution and the block-to-sample
//! interpolation/mixing engine that sits between [`adm_model`]'s static
//! graph and [`adm_render`]'s per-block gain computation.

mod block_processor;
mod error;
mod item;
mod monitor;
mod render;
mod source;
mod track;

pub use block_processor::{accumulate, expand_event};
pub use error::{PipelineError, PipelineResult};
pub use item::{select_items, track_uid_physical_index, RenderingItem};
pub use monitor::Monitor;
pub use render::{render_programme, RenderConfig};
pub use source::Bw64Source;
pub use track::{MetadataSource, TrackProcessor, TrackSpec};

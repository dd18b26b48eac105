//! Panning geometry: the point-source panner (polar path), the
//! allocentric cube panner (Cartesian path), width/height/depth extent
//! spreading, and screen scaling/edge lock. Spec §4.3.

pub mod allocentric;
pub mod extent;
pub mod point_source;
pub mod screen;

pub use allocentric::AllocentricPanner;
pub use extent::{pan_extent, ExtentParams};
pub use point_source::PointSourcePanner;
pub use screen::{lock_to_screen_edge, scale_position, ScreenExtent};

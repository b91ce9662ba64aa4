pub mod background;
pub mod camera;
pub mod frame;
pub mod gpu;
pub mod texture;

pub use background::{BackgroundFeed, Frame, FrameSource, source_from_config};
pub use camera::{Eye, StereoCamera, Trackball};
pub use frame::FrameUniforms;
pub use gpu::{GpuState, RenderError};

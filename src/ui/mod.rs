pub mod panels;
pub mod state;
pub mod theme;

pub use panels::{FrameStats, UiActions, draw_help_overlay, draw_side_panel};
pub use state::RenderState;
pub use theme::apply_theme;

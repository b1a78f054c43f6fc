pub mod info_panel;
pub mod overlay;

pub use info_panel::{PanelLayout, PanelStatus, PanelStyle};
pub use overlay::{DebugStats, OverlayActions, OverlayFrame, UiOverlay};

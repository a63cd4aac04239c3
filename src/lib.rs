//! Core of the HySkin Hytale skin editor: layered 256x256 raster editing,
//! bounded snapshot history, brush/fill/picker painting, rectangle
//! selection moves, and painting through UVs of the 3D rig.
#![allow(clippy::too_many_arguments)]

#[macro_use]
pub mod logger;

pub mod canvas;
pub mod cli;
pub mod components;
pub mod gpu;
pub mod io;
pub mod ops;
pub mod rig;
pub mod session;
pub mod settings;

pub use canvas::{PixelSurface, RasterSurface, SurfaceId, TEXTURE_SIZE};
pub use components::history::HistoryLog;
pub use components::layers::LayerStack;
pub use components::tools::{BrushShape, Tool, ToolConfig};
pub use ops::paint::PaintEngine;
pub use ops::transform::SelectionTransform;
pub use ops::uv_paint::UvPaintBridge;
pub use session::EditorSession;

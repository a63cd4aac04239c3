pub mod paint;
pub mod transform;
pub mod uv_paint;

// ============================================================================
// GPU MODULE — live skin texture and rig buffers for the 3D preview
// ============================================================================
//
// Architecture:
//   context.rs — wgpu Device, Queue, adapter init
//   texture.rs — TextureBridge dirty contract + SkinTexture upload target
//   mesh.rs    — rig vertex/index buffers
// ============================================================================

pub mod context;
pub mod mesh;
pub mod texture;

pub use context::GpuContext;
pub use mesh::RigMeshBuffers;
pub use texture::{SkinTexture, TextureBridge, TextureSink};

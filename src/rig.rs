// ============================================================================
// RIG — box-part character model the skin is wrapped around
// ============================================================================

use std::path::Path;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Default character layout, embedded at build time.
const DEFAULT_RIG_JSON: &str = include_str!("../assets/rig.json");

/// Extent used in place of zero-thickness box sides.
const MIN_EXTENT: f32 = 0.01;

#[derive(Debug)]
pub enum RigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    InvalidResolution(f32),
}

impl std::fmt::Display for RigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RigError::Io(e) => write!(f, "I/O error: {}", e),
            RigError::Parse(e) => write!(f, "Rig parse error: {}", e),
            RigError::InvalidResolution(r) => write!(f, "Invalid rig resolution: {}", r),
        }
    }
}

impl std::error::Error for RigError {}

impl From<std::io::Error> for RigError {
    fn from(e: std::io::Error) -> Self {
        RigError::Io(e)
    }
}

impl From<serde_json::Error> for RigError {
    fn from(e: serde_json::Error) -> Self {
        RigError::Parse(e)
    }
}

/// One UV rectangle per box face, `[u_min, v_min, u_max, v_max]` in rig
/// units (divide by the rig resolution for normalized UVs).  Min may exceed
/// max, which mirrors the face.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RigFaces {
    pub north: [f32; 4],
    pub east: [f32; 4],
    pub south: [f32; 4],
    pub west: [f32; 4],
    pub up: [f32; 4],
    pub down: [f32; 4],
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RigPart {
    pub name: String,
    /// Box extents (x, y, z).
    pub size: [f32; 3],
    /// Box centre.
    pub pos: [f32; 3],
    pub faces: RigFaces,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rig {
    /// Divisor turning face coordinates into 0..1 UVs.
    pub resolution: f32,
    pub parts: Vec<RigPart>,
}

impl Rig {
    /// The built-in character.
    pub fn default_rig() -> Result<Self, RigError> {
        Self::from_json(DEFAULT_RIG_JSON)
    }

    pub fn from_json(text: &str) -> Result<Self, RigError> {
        let rig: Rig = serde_json::from_str(text)?;
        if !(rig.resolution.is_finite() && rig.resolution > 0.0) {
            return Err(RigError::InvalidResolution(rig.resolution));
        }
        Ok(rig)
    }

    pub fn load(path: &Path) -> Result<Self, RigError> {
        let text = std::fs::read_to_string(path)?;
        let rig = Self::from_json(&text)?;
        log_info!("Loaded rig {} ({} parts)", path.display(), rig.parts.len());
        Ok(rig)
    }

    pub fn part(&self, name: &str) -> Option<&RigPart> {
        self.parts.iter().find(|p| p.name == name)
    }
}

// ============================================================================
// TRIANGLE MESH
// ============================================================================

/// GPU-ready vertex: position followed by UV.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct RigVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// Box faces in vertex-buffer order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaceSide {
    East,
    West,
    Up,
    Down,
    South,
    North,
}

impl FaceSide {
    pub const ALL: [FaceSide; 6] = [
        FaceSide::East,
        FaceSide::West,
        FaceSide::Up,
        FaceSide::Down,
        FaceSide::South,
        FaceSide::North,
    ];

    fn rect(self, faces: &RigFaces) -> [f32; 4] {
        match self {
            FaceSide::East => faces.east,
            FaceSide::West => faces.west,
            FaceSide::Up => faces.up,
            FaceSide::Down => faces.down,
            FaceSide::South => faces.south,
            FaceSide::North => faces.north,
        }
    }

    /// Corner signs (top-left, top-right, bottom-left, bottom-right) seen
    /// from outside the box.
    fn corners(self) -> [[f32; 3]; 4] {
        match self {
            FaceSide::East => [[1., 1., 1.], [1., 1., -1.], [1., -1., 1.], [1., -1., -1.]],
            FaceSide::West => [[-1., 1., -1.], [-1., 1., 1.], [-1., -1., -1.], [-1., -1., 1.]],
            FaceSide::Up => [[-1., 1., -1.], [1., 1., -1.], [-1., 1., 1.], [1., 1., 1.]],
            FaceSide::Down => [[-1., -1., 1.], [1., -1., 1.], [-1., -1., -1.], [1., -1., -1.]],
            FaceSide::South => [[-1., 1., 1.], [1., 1., 1.], [-1., -1., 1.], [1., -1., 1.]],
            FaceSide::North => [[1., 1., -1.], [-1., 1., -1.], [1., -1., -1.], [-1., -1., -1.]],
        }
    }
}

/// Flattened triangle soup of the whole rig in world space.
#[derive(Clone, Debug, Default)]
pub struct RigMesh {
    pub vertices: Vec<RigVertex>,
    pub indices: Vec<u32>,
    /// Owning part index for every triangle.
    pub triangle_parts: Vec<usize>,
}

impl RigMesh {
    pub fn build(rig: &Rig) -> Self {
        let mut mesh = RigMesh::default();
        for (part_index, part) in rig.parts.iter().enumerate() {
            let half = Vec3::new(
                extent(part.size[0]),
                extent(part.size[1]),
                extent(part.size[2]),
            ) * 0.5;
            let centre = Vec3::from(part.pos);

            for side in FaceSide::ALL {
                let [u_min, v_min, u_max, v_max] = side.rect(&part.faces);
                let u0 = u_min / rig.resolution;
                let u1 = u_max / rig.resolution;
                let v0 = 1.0 - v_max / rig.resolution;
                let v1 = 1.0 - v_min / rig.resolution;
                let uvs = [[u0, v1], [u1, v1], [u0, v0], [u1, v0]];

                let base = mesh.vertices.len() as u32;
                for (corner, uv) in side.corners().iter().zip(uvs) {
                    let position = centre + Vec3::from(*corner) * half;
                    mesh.vertices.push(RigVertex {
                        position: position.to_array(),
                        uv,
                    });
                }

                // (TL, BL, TR) and (BL, BR, TR), counter-clockwise from outside
                mesh.indices
                    .extend_from_slice(&[base, base + 2, base + 1, base + 2, base + 3, base + 1]);
                mesh.triangle_parts.extend_from_slice(&[part_index, part_index]);
            }
        }
        mesh
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Corner positions and UVs of triangle `index`.
    pub fn triangle(&self, index: usize) -> Option<([Vec3; 3], [[f32; 2]; 3])> {
        let idx = self.indices.get(index * 3..index * 3 + 3)?;
        let mut positions = [Vec3::ZERO; 3];
        let mut uvs = [[0.0; 2]; 3];
        for (slot, &i) in idx.iter().enumerate() {
            let v = self.vertices.get(i as usize)?;
            positions[slot] = Vec3::from(v.position);
            uvs[slot] = v.uv;
        }
        Some((positions, uvs))
    }
}

fn extent(v: f32) -> f32 {
    if v == 0.0 { MIN_EXTENT } else { v.abs() }
}

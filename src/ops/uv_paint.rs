// ============================================================================
// UV PAINT BRIDGE — pointer on the 3D preview → texture pixel
// ============================================================================

use glam::{Mat4, Vec2, Vec3};

use crate::rig::{Rig, RigMesh};

// ============================================================================
// CAMERA
// ============================================================================

/// Perspective camera of the 3D preview.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    /// Viewport width / height.
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 70.0, 140.0),
            target: Vec3::new(0.0, 45.0, 0.0),
            up: Vec3::Y,
            fov_y: 45.0,
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Camera {
    pub fn view_projection(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye, self.target, self.up);
        let proj = Mat4::perspective_rh_gl(self.fov_y.to_radians(), self.aspect.max(1e-6), self.near, self.far);
        proj * view
    }

    /// World-space ray through a normalized device coordinate
    /// (`x`, `y` in -1..1, y up).
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inv = self.view_projection().inverse();
        let near = inv.project_point3(Vec3::new(ndc.x, ndc.y, -1.0));
        let far = inv.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        Ray {
            origin: near,
            direction: (far - near).normalize(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Nearest front-facing triangle under a ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UvHit {
    pub u: f32,
    pub v: f32,
    /// Distance along the ray.
    pub distance: f32,
    pub part: usize,
}

// ============================================================================
// BRIDGE
// ============================================================================

pub struct UvPaintBridge {
    pub camera: Camera,
    mesh: RigMesh,
}

impl UvPaintBridge {
    pub fn new(rig: &Rig, camera: Camera) -> Self {
        Self {
            camera,
            mesh: RigMesh::build(rig),
        }
    }

    pub fn mesh(&self) -> &RigMesh {
        &self.mesh
    }

    /// Cast through `ndc` and return the UV of the nearest hit, if any.
    pub fn hit_uv(&self, ndc: Vec2) -> Option<UvHit> {
        self.raycast(&self.camera.ray_from_ndc(ndc))
    }

    pub fn raycast(&self, ray: &Ray) -> Option<UvHit> {
        let mut closest: Option<UvHit> = None;

        for t in 0..self.mesh.triangle_count() {
            let Some(([p0, p1, p2], [uv0, uv1, uv2])) = self.mesh.triangle(t) else {
                continue;
            };
            let Some((dist, b1, b2)) = ray_triangle_intersection(ray.origin, ray.direction, p0, p1, p2) else {
                continue;
            };
            if closest.is_some_and(|c| c.distance <= dist) {
                continue;
            }
            let b0 = 1.0 - b1 - b2;
            closest = Some(UvHit {
                u: uv0[0] * b0 + uv1[0] * b1 + uv2[0] * b2,
                v: uv0[1] * b0 + uv1[1] * b1 + uv2[1] * b2,
                distance: dist,
                part: self.mesh.triangle_parts.get(t).copied().unwrap_or(0),
            });
        }

        closest
    }

    /// Texture pixel under `ndc` on a `width`×`height` texture.
    pub fn pick_pixel(&self, ndc: Vec2, width: u32, height: u32) -> Option<(i32, i32)> {
        self.hit_uv(ndc).map(|hit| uv_to_pixel(hit.u, hit.v, width, height))
    }
}

/// UV (origin bottom-left) to texture pixel (origin top-left).
pub fn uv_to_pixel(u: f32, v: f32, width: u32, height: u32) -> (i32, i32) {
    (
        (u * width as f32).floor() as i32,
        ((1.0 - v) * height as f32).floor() as i32,
    )
}

/// Möller–Trumbore, front faces only (counter-clockwise seen from the ray).
/// Returns `(t, u, v)` barycentrics of `v1` and `v2`.
fn ray_triangle_intersection(
    ray_origin: Vec3,
    ray_dir: Vec3,
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
) -> Option<(f32, f32, f32)> {
    const EPSILON: f32 = 1e-8;

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let h = ray_dir.cross(edge2);
    let a = edge1.dot(h);

    // back-facing or parallel
    if a < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray_origin - v0;
    let u = f * s.dot(h);

    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray_dir.dot(q);

    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);

    if t > EPSILON { Some((t, u, v)) } else { None }
}

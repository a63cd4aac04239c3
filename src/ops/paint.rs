use std::time::{SystemTime, UNIX_EPOCH};

use egui::Color32;
use image::RgbaImage;

use crate::canvas::{PixelSurface, RasterSurface};
use crate::components::tools::{BrushShape, Tool, ToolConfig, color_from_rgba};

/// What a single [`PaintEngine::apply_stroke`] call did, so the caller can
/// decide on recomposite, history and tool changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrokeOutcome {
    /// Nothing happened (out of bounds, hidden layer, non-paint tool).
    Ignored,
    /// Brush or eraser pixels were written.  Recomposite; commit on pointer-up.
    Painted,
    /// The whole surface was washed.  Recomposite, end the stroke, commit now.
    Filled,
    /// The composite was sampled.  Switch to this color and back to the brush.
    Picked(Color32),
}

// ============================================================================
// PAINT ENGINE
// ============================================================================

/// Applies brush, eraser, fill and picker dabs to a surface.
///
/// The only state is the spray PRNG (xorshift64).  Seed it with
/// [`with_seed`](Self::with_seed) for reproducible spray patterns.
pub struct PaintEngine {
    rng_state: u64,
}

impl Default for PaintEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PaintEngine {
    /// Time-seeded engine.
    pub fn new() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self::with_seed(nanos)
    }

    pub fn with_seed(seed: u64) -> Self {
        // xorshift64 never leaves zero
        let rng_state = if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed };
        Self { rng_state }
    }

    /// Uniform f32 in [0, 1).
    fn next_f32(&mut self) -> f32 {
        let mut s = self.rng_state;
        s ^= s << 13;
        s ^= s >> 7;
        s ^= s << 17;
        self.rng_state = s;
        (s >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Apply the configured tool at `(x, y)`, the top-left corner of the
    /// footprint.  `composite` is only read by the picker.
    pub fn apply_stroke(
        &mut self,
        surface: &mut PixelSurface,
        x: i32,
        y: i32,
        config: &ToolConfig,
        composite: &RgbaImage,
    ) -> StrokeOutcome {
        if !surface.visible || !surface.contains(x, y) {
            return StrokeOutcome::Ignored;
        }

        match config.tool {
            Tool::Brush | Tool::Eraser => {
                self.dab(surface, x, y, config);
                if config.mirror {
                    let mirror_x = surface.width() as i32 - x - config.size as i32;
                    self.dab(surface, mirror_x, y, config);
                }
                StrokeOutcome::Painted
            }
            Tool::Fill => {
                surface.fill(config.rgba(), config.opacity);
                StrokeOutcome::Filled
            }
            Tool::Picker => {
                let px = RasterSurface::pixel(composite, x as u32, y as u32);
                StrokeOutcome::Picked(color_from_rgba(px))
            }
            Tool::Select | Tool::Move | Tool::Zoom | Tool::Pan => StrokeOutcome::Ignored,
        }
    }

    /// One footprint, no mirroring.
    fn dab<S: RasterSurface + ?Sized>(&mut self, surface: &mut S, x: i32, y: i32, config: &ToolConfig) {
        let size = config.size.max(1);
        if config.tool == Tool::Eraser {
            surface.clear_region(x, y, size, size);
            return;
        }

        let color = config.rgba();
        match config.shape {
            BrushShape::Square => {
                for py in y..y + size as i32 {
                    for px in x..x + size as i32 {
                        surface.blend_pixel(px, py, color, config.opacity);
                    }
                }
            }
            BrushShape::Circle => {
                for (px, py) in disk_footprint(x, y, size) {
                    surface.blend_pixel(px, py, color, config.opacity);
                }
            }
            BrushShape::Spray => {
                for (px, py) in self.spray_dabs(x, y, size) {
                    surface.blend_pixel(px, py, color, config.opacity);
                }
            }
        }
    }

    /// `size * 8` random points inside the footprint disk, in draw order and
    /// possibly repeating.
    pub fn spray_samples(&mut self, x: i32, y: i32, size: u32) -> Vec<(i32, i32)> {
        let radius = size as f32 / 2.0;
        let cx = x as f32 + radius;
        let cy = y as f32 + radius;

        (0..size * 8)
            .map(|_| {
                let r = self.next_f32() * radius;
                let angle = self.next_f32() * std::f32::consts::TAU;
                (
                    (cx + angle.cos() * r).floor() as i32,
                    (cy + angle.sin() * r).floor() as i32,
                )
            })
            .collect()
    }

    /// [`spray_samples`](Self::spray_samples) deduplicated so each pixel is
    /// blended once.
    pub fn spray_dabs(&mut self, x: i32, y: i32, size: u32) -> Vec<(i32, i32)> {
        let mut dabs = self.spray_samples(x, y, size);
        dabs.sort_unstable();
        dabs.dedup();
        dabs
    }
}

/// Pixels of the size×size box at `(x, y)` whose centres fall inside the
/// inscribed disk.
pub fn disk_footprint(x: i32, y: i32, size: u32) -> Vec<(i32, i32)> {
    let radius = size as f32 / 2.0;
    let cx = x as f32 + radius;
    let cy = y as f32 + radius;
    let r2 = radius * radius;

    let mut out = Vec::with_capacity((size * size) as usize);
    for py in y..y + size as i32 {
        for px in x..x + size as i32 {
            let dx = px as f32 + 0.5 - cx;
            let dy = py as f32 + 0.5 - cy;
            if dx * dx + dy * dy <= r2 {
                out.push((px, py));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::TRANSPARENT;
    use crate::components::tools::parse_hex_color;
    use image::Rgba;

    const W: u32 = 64;

    fn surface() -> PixelSurface {
        PixelSurface::new(0, "Layer", W, W)
    }

    fn brush() -> ToolConfig {
        ToolConfig::default()
    }

    fn painted(surface: &PixelSurface) -> Vec<(u32, u32)> {
        surface
            .pixels
            .enumerate_pixels()
            .filter(|(_, _, p)| p[3] != 0)
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    #[test]
    fn test_single_pixel_square() {
        let mut s = surface();
        let comp = RgbaImage::new(W, W);
        let out = PaintEngine::with_seed(1).apply_stroke(&mut s, 10, 10, &brush(), &comp);
        assert_eq!(out, StrokeOutcome::Painted);
        assert_eq!(s.pixel(10, 10), Rgba([255, 0, 0, 255]));
        assert_eq!(s.pixel(11, 10), TRANSPARENT);
    }

    #[test]
    fn test_square_footprint_is_anchored_top_left() {
        let mut s = surface();
        let comp = RgbaImage::new(W, W);
        PaintEngine::with_seed(1).apply_stroke(&mut s, 4, 6, &brush().with_size(3), &comp);
        let mut expected = Vec::new();
        for y in 6..9 {
            for x in 4..7 {
                expected.push((x, y));
            }
        }
        let mut got = painted(&s);
        got.sort_by_key(|&(x, y)| (y, x));
        assert_eq!(got, expected);
    }

    #[test]
    fn test_circle_trims_corners() {
        let mut s = surface();
        let comp = RgbaImage::new(W, W);
        PaintEngine::with_seed(1).apply_stroke(
            &mut s,
            0,
            0,
            &brush().with_size(6).with_shape(BrushShape::Circle),
            &comp,
        );
        assert_eq!(s.pixel(0, 0), TRANSPARENT);
        assert_eq!(s.pixel(5, 5), TRANSPARENT);
        assert_ne!(s.pixel(3, 3), TRANSPARENT);
        assert_ne!(s.pixel(0, 3), TRANSPARENT);
        assert!(painted(&s).len() < 36);
    }

    #[test]
    fn test_spray_stays_inside_disk() {
        let mut engine = PaintEngine::with_seed(7);
        for size in [1u32, 4, 9, 32] {
            let dabs = engine.spray_dabs(20, 20, size);
            assert!(!dabs.is_empty());
            assert!(dabs.len() <= (size * 8) as usize);
            let radius = size as f32 / 2.0;
            let (cx, cy) = (20.0 + radius, 20.0 + radius);
            for (px, py) in dabs {
                let dx = (px as f32 + 0.5 - cx).abs();
                let dy = (py as f32 + 0.5 - cy).abs();
                assert!(dx <= radius + 1.0 && dy <= radius + 1.0);
            }
        }
    }

    #[test]
    fn test_spray_draws_eight_samples_per_size_unit() {
        for size in [1u32, 5, 16, 32] {
            let raw = PaintEngine::with_seed(99).spray_samples(30, 30, size);
            assert_eq!(raw.len(), (size * 8) as usize);

            let mut expected = raw.clone();
            expected.sort_unstable();
            expected.dedup();
            assert_eq!(PaintEngine::with_seed(99).spray_dabs(30, 30, size), expected);
        }
    }

    #[test]
    fn test_spray_is_reproducible_when_seeded() {
        let a = PaintEngine::with_seed(42).spray_dabs(10, 10, 16);
        let b = PaintEngine::with_seed(42).spray_dabs(10, 10, 16);
        assert_eq!(a, b);
    }

    #[test]
    fn test_eraser_is_always_square() {
        let mut s = surface();
        s.fill(Rgba([1, 2, 3, 255]), 1.0);
        let comp = RgbaImage::new(W, W);
        let eraser = brush().with_tool(Tool::Eraser).with_size(4).with_shape(BrushShape::Circle);
        PaintEngine::with_seed(1).apply_stroke(&mut s, 8, 8, &eraser, &comp);
        assert_eq!(s.pixel(8, 8), TRANSPARENT);
        assert_eq!(s.pixel(11, 11), TRANSPARENT);
        assert_eq!(s.pixel(12, 12), Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn test_mirror_paints_reflected_footprint() {
        let mut s = surface();
        let comp = RgbaImage::new(W, W);
        let cfg = brush().with_size(3).with_mirror(true);
        PaintEngine::with_seed(1).apply_stroke(&mut s, 5, 2, &cfg, &comp);
        let mx = W - 5 - 3;
        for dy in 0..3 {
            for dx in 0..3 {
                assert_eq!(s.pixel(5 + dx, 2 + dy), s.pixel(mx + dx, 2 + dy));
                assert_ne!(s.pixel(mx + dx, 2 + dy), TRANSPARENT);
            }
        }
        assert_eq!(painted(&s).len(), 18);
    }

    #[test]
    fn test_mirrored_eraser_clears_both_squares() {
        let fill = Rgba([1, 2, 3, 255]);
        let mut s = surface();
        s.fill(fill, 1.0);
        let comp = RgbaImage::new(W, W);
        let eraser = brush().with_tool(Tool::Eraser).with_size(4).with_mirror(true);
        PaintEngine::with_seed(1).apply_stroke(&mut s, 6, 10, &eraser, &comp);

        let mx = W - 6 - 4;
        for dy in 0..4 {
            for dx in 0..4 {
                assert_eq!(s.pixel(6 + dx, 10 + dy), TRANSPARENT);
                assert_eq!(s.pixel(mx + dx, 10 + dy), TRANSPARENT);
            }
        }
        assert_eq!(s.pixel(5, 10), fill);
        assert_eq!(s.pixel(10, 10), fill);
        assert_eq!(s.pixel(W / 2, 11), fill);
        assert_eq!(s.pixel(mx - 1, 10), fill);
        assert_eq!(s.pixel(mx + 4, 10), fill);
        assert_eq!(s.pixel(6, 14), fill);
        assert_eq!(painted(&s).len(), (W * W - 32) as usize);
    }

    #[test]
    fn test_out_of_bounds_is_ignored() {
        let mut s = surface();
        let comp = RgbaImage::new(W, W);
        let mut engine = PaintEngine::with_seed(1);
        assert_eq!(engine.apply_stroke(&mut s, -1, 0, &brush(), &comp), StrokeOutcome::Ignored);
        assert_eq!(engine.apply_stroke(&mut s, 0, W as i32, &brush(), &comp), StrokeOutcome::Ignored);
        assert!(s.is_blank());
    }

    #[test]
    fn test_hidden_surface_is_not_painted() {
        let mut s = surface();
        s.visible = false;
        let comp = RgbaImage::new(W, W);
        let out = PaintEngine::with_seed(1).apply_stroke(&mut s, 1, 1, &brush(), &comp);
        assert_eq!(out, StrokeOutcome::Ignored);
        assert!(s.is_blank());
    }

    #[test]
    fn test_fill_washes_everything() {
        let mut s = surface();
        let comp = RgbaImage::new(W, W);
        let blue = parse_hex_color("#3b82f6").unwrap();
        let cfg = brush().with_tool(Tool::Fill).with_color(blue);
        let out = PaintEngine::with_seed(1).apply_stroke(&mut s, 30, 30, &cfg, &comp);
        assert_eq!(out, StrokeOutcome::Filled);
        assert!(s.pixels.pixels().all(|p| *p == Rgba([0x3b, 0x82, 0xf6, 255])));
    }

    #[test]
    fn test_picker_reads_composite_not_layer() {
        let mut s = surface();
        s.put_pixel(3, 3, Rgba([9, 9, 9, 255]));
        let comp = RgbaImage::from_pixel(W, W, Rgba([0x8d, 0x55, 0x24, 255]));
        let cfg = brush().with_tool(Tool::Picker);
        let out = PaintEngine::with_seed(1).apply_stroke(&mut s, 3, 3, &cfg, &comp);
        assert_eq!(out, StrokeOutcome::Picked(Color32::from_rgb(0x8d, 0x55, 0x24)));
        assert_eq!(s.pixel(3, 3), Rgba([9, 9, 9, 255]));
    }

    #[test]
    fn test_selection_tools_do_not_paint() {
        let mut s = surface();
        let comp = RgbaImage::new(W, W);
        let mut engine = PaintEngine::with_seed(1);
        for tool in [Tool::Select, Tool::Move, Tool::Zoom, Tool::Pan] {
            let out = engine.apply_stroke(&mut s, 1, 1, &brush().with_tool(tool), &comp);
            assert_eq!(out, StrokeOutcome::Ignored);
        }
        assert!(s.is_blank());
    }
}

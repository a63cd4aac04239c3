use image::{Rgba, RgbaImage};

/// Side length of the skin texture, in pixels.
pub const TEXTURE_SIZE: u32 = 256;

/// Fully transparent pixel (what `clearRect` leaves behind).
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

pub type SurfaceId = u32;

// ============================================================================
// RASTER CAPABILITY
// ============================================================================

/// Pixel-level access the editing core needs from a raster.
///
/// Layers, the history log, the paint engine and the selection transform only
/// talk to this trait, never to a concrete rendering API.  The required
/// methods are the platform adapter; everything else is provided on top.
pub trait RasterSurface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Pixel at `(x, y)`.  Out-of-bounds reads return [`TRANSPARENT`].
    fn pixel(&self, x: u32, y: u32) -> Rgba<u8>;
    /// Overwrite one pixel.  Out-of-bounds writes are ignored.
    fn put_pixel(&mut self, x: u32, y: u32, px: Rgba<u8>);
    /// Full raster as row-major RGBA bytes.
    fn as_bytes(&self) -> &[u8];
    /// Replace the whole raster.  Returns `false` (and leaves the raster
    /// untouched) when `data` is not exactly `width * height * 4` bytes.
    fn replace_bytes(&mut self, data: &[u8]) -> bool;

    fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width() && (y as u32) < self.height()
    }

    /// Source-over `color` onto the pixel at `(x, y)`, clipped.
    fn blend_pixel(&mut self, x: i32, y: i32, color: Rgba<u8>, opacity: f32) {
        if !self.contains(x, y) {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        let dst = self.pixel(x, y);
        self.put_pixel(x, y, blend_source_over(dst, color, opacity));
    }

    fn clear_pixel(&mut self, x: i32, y: i32) {
        if self.contains(x, y) {
            self.put_pixel(x as u32, y as u32, TRANSPARENT);
        }
    }

    /// Copy a `w`×`h` block starting at `(x, y)`.  Parts outside the raster
    /// come back transparent.
    fn read_region(&self, x: i32, y: i32, w: u32, h: u32) -> RgbaImage {
        let mut out = RgbaImage::new(w, h);
        for ry in 0..h {
            for rx in 0..w {
                let sx = x.saturating_add(rx as i32);
                let sy = y.saturating_add(ry as i32);
                if self.contains(sx, sy) {
                    out.put_pixel(rx, ry, self.pixel(sx as u32, sy as u32));
                }
            }
        }
        out
    }

    /// Set a `w`×`h` block to [`TRANSPARENT`], clipped to the raster.
    fn clear_region(&mut self, x: i32, y: i32, w: u32, h: u32) {
        let (x0, y0, x1, y1) = match clip_rect(x, y, w, h, self.width(), self.height()) {
            Some(r) => r,
            None => return,
        };
        for py in y0..y1 {
            for px in x0..x1 {
                self.put_pixel(px, py, TRANSPARENT);
            }
        }
    }

    /// Draw `src` with its top-left corner at `(x, y)` using source-over.
    fn draw_region(&mut self, x: i32, y: i32, src: &RgbaImage) {
        for sy in 0..src.height() {
            for sx in 0..src.width() {
                let (dx, dy) = (x.saturating_add(sx as i32), y.saturating_add(sy as i32));
                self.blend_pixel(dx, dy, *src.get_pixel(sx, sy), 1.0);
            }
        }
    }

    /// Wash every pixel with `color` at `opacity`.
    fn fill(&mut self, color: Rgba<u8>, opacity: f32) {
        for y in 0..self.height() {
            for x in 0..self.width() {
                let dst = self.pixel(x, y);
                self.put_pixel(x, y, blend_source_over(dst, color, opacity));
            }
        }
    }
}

/// Clip `(x, y, w, h)` against a `width`×`height` raster.
/// Returns `(min_x, min_y, max_x, max_y)` with exclusive max, or `None` when empty.
pub fn clip_rect(x: i32, y: i32, w: u32, h: u32, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let x0 = x.max(0) as i64;
    let y0 = y.max(0) as i64;
    let x1 = (x as i64 + w as i64).min(width as i64);
    let y1 = (y as i64 + h as i64).min(height as i64);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
}

impl RasterSurface for RgbaImage {
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    fn height(&self) -> u32 {
        self.dimensions().1
    }

    fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        self.get_pixel_checked(x, y).copied().unwrap_or(TRANSPARENT)
    }

    fn put_pixel(&mut self, x: u32, y: u32, px: Rgba<u8>) {
        if let Some(p) = self.get_pixel_mut_checked(x, y) {
            *p = px;
        }
    }

    fn as_bytes(&self) -> &[u8] {
        self.as_raw()
    }

    fn replace_bytes(&mut self, data: &[u8]) -> bool {
        let buf: &mut [u8] = self;
        if buf.len() != data.len() {
            return false;
        }
        buf.copy_from_slice(data);
        true
    }
}

// ============================================================================
// BLENDING
// ============================================================================

/// Straight-alpha "source-over" of `src` (scaled by `opacity`) onto `dst`.
///
/// The fast paths are exact, so drawing a pixel back onto a cleared pixel
/// reproduces it bit for bit.
pub fn blend_source_over(dst: Rgba<u8>, src: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let opacity = opacity.clamp(0.0, 1.0);
    if src[3] == 0 || opacity <= 0.0 {
        return dst;
    }
    if opacity >= 1.0 && src[3] == 255 {
        return src;
    }

    let sa = src[3] as f32 / 255.0 * opacity;
    if dst[3] == 0 {
        return Rgba([src[0], src[1], src[2], (sa * 255.0).round() as u8]);
    }

    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let channel = |s: u8, d: u8| -> u8 {
        let v = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

// ============================================================================
// PIXEL SURFACE (one layer)
// ============================================================================

/// One paintable layer.  Its dimensions are fixed at creation.
#[derive(Clone, Debug)]
pub struct PixelSurface {
    pub id: SurfaceId,
    pub name: String,
    pub visible: bool,
    pub pixels: RgbaImage,
}

impl PixelSurface {
    /// A fully transparent, visible surface.
    pub fn new(id: SurfaceId, name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id,
            name: name.into(),
            visible: true,
            pixels: RgbaImage::new(width, height),
        }
    }

    /// True when every pixel has zero alpha.
    pub fn is_blank(&self) -> bool {
        self.pixels.pixels().all(|p| p[3] == 0)
    }
}

impl RasterSurface for PixelSurface {
    fn width(&self) -> u32 {
        self.pixels.width()
    }

    fn height(&self) -> u32 {
        self.pixels.height()
    }

    fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        RasterSurface::pixel(&self.pixels, x, y)
    }

    fn put_pixel(&mut self, x: u32, y: u32, px: Rgba<u8>) {
        RasterSurface::put_pixel(&mut self.pixels, x, y, px);
    }

    fn as_bytes(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    fn replace_bytes(&mut self, data: &[u8]) -> bool {
        self.pixels.replace_bytes(data)
    }
}

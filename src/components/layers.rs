use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::canvas::{PixelSurface, RasterSurface, SurfaceId, blend_source_over};
use crate::gpu::texture::{TextureBridge, TextureSink};

/// Names of the layers a fresh editor starts with, bottom to top.
pub const DEFAULT_LAYER_NAMES: [&str; 3] = ["Base Skin", "Clothing", "Details"];

// ============================================================================
// LAYER STACK
// ============================================================================

/// Ordered stack of paintable layers plus their flattened composite.
///
/// Paint order is front-to-back: index 0 is the topmost layer.
#[derive(Clone)]
pub struct LayerStack {
    layers: Vec<PixelSurface>,
    active_id: Option<SurfaceId>,
    next_id: SurfaceId,
    width: u32,
    height: u32,
    composite: RgbaImage,
    texture: TextureBridge,
}

impl LayerStack {
    /// Empty stack.  Callers are expected to add at least one layer before
    /// handing the stack to the editor.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            layers: Vec::new(),
            active_id: None,
            next_id: 0,
            width,
            height,
            composite: RgbaImage::new(width, height),
            texture: TextureBridge::new(),
        }
    }

    /// Stack with the editor's starting layers, the bottom-most one active.
    pub fn with_default_layers(width: u32, height: u32) -> Self {
        let mut stack = Self::new(width, height);
        for name in DEFAULT_LAYER_NAMES {
            stack.add_layer(name);
        }
        if let Some(bottom) = stack.layers.last().map(|l| l.id) {
            stack.set_active(bottom);
        }
        stack.recomposite();
        stack
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Add a transparent layer on top of the paint order and return its id.
    /// The first layer ever added also becomes the active one.
    pub fn add_layer(&mut self, name: &str) -> SurfaceId {
        let id = self.next_id;
        self.next_id += 1;
        self.layers.insert(0, PixelSurface::new(id, name, self.width, self.height));
        if self.active_id.is_none() {
            self.active_id = Some(id);
        }
        log_info!("Added layer {} \"{}\"", id, name);
        id
    }

    /// Point the active selection at `id`.  Unknown ids are ignored.
    pub fn set_active(&mut self, id: SurfaceId) {
        if self.layers.iter().any(|l| l.id == id) {
            self.active_id = Some(id);
        }
    }

    pub fn active_id(&self) -> Option<SurfaceId> {
        self.active_id
    }

    pub fn get_active(&self) -> Option<&PixelSurface> {
        self.active_id.and_then(|id| self.get(id))
    }

    pub fn get_active_mut(&mut self) -> Option<&mut PixelSurface> {
        let id = self.active_id?;
        self.get_mut(id)
    }

    /// Active layer together with the composite, borrowed at the same time
    /// (the picker reads the composite while the brush writes the layer).
    pub fn active_and_composite_mut(&mut self) -> Option<(&mut PixelSurface, &RgbaImage)> {
        let id = self.active_id?;
        let layer = self.layers.iter_mut().find(|l| l.id == id)?;
        Some((layer, &self.composite))
    }

    pub fn get(&self, id: SurfaceId) -> Option<&PixelSurface> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn get_mut(&mut self, id: SurfaceId) -> Option<&mut PixelSurface> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    /// Layers in paint order (topmost first).
    pub fn layers(&self) -> &[PixelSurface] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// The bottom-most layer (last in paint order).
    pub fn bottom_mut(&mut self) -> Option<&mut PixelSurface> {
        self.layers.last_mut()
    }

    /// Flip a layer's visibility and recomposite.  Unknown ids are ignored.
    pub fn toggle_visibility(&mut self, id: SurfaceId) {
        if let Some(layer) = self.get_mut(id) {
            layer.visible = !layer.visible;
            self.recomposite();
        }
    }

    /// Replace the bottom-most layer with `image`, resampled to the texture
    /// size when the dimensions differ, and recomposite.  Returns the id of
    /// the layer that was replaced so the caller can record it in history.
    pub fn load_base_image(&mut self, image: &RgbaImage) -> Option<SurfaceId> {
        let (width, height) = (self.width, self.height);
        let fitted;
        let source = if image.dimensions() == (width, height) {
            image
        } else {
            log_warn!(
                "Base image is {}x{}, resampling to {}x{}",
                image.width(),
                image.height(),
                width,
                height
            );
            fitted = image::imageops::resize(image, width, height, image::imageops::FilterType::Triangle);
            &fitted
        };

        let base = self.bottom_mut()?;
        base.pixels.replace_bytes(source.as_raw());
        let id = base.id;
        self.recomposite();
        Some(id)
    }

    // ========================================================================
    // COMPOSITING
    // ========================================================================

    /// Rebuild the composite from every visible layer, bottom to top, with
    /// source-over blending.  Rows are processed in parallel; each pixel only
    /// depends on the same pixel of each layer, so the output is identical to
    /// a sequential pass.
    pub fn recomposite(&mut self) -> &RgbaImage {
        let row_bytes = self.width as usize * 4;
        let visible: Vec<&[u8]> = self
            .layers
            .iter()
            .rev()
            .filter(|l| l.visible)
            .map(|l| l.pixels.as_raw().as_slice())
            .collect();

        let out: &mut [u8] = &mut self.composite;
        if row_bytes > 0 {
            out.par_chunks_mut(row_bytes).enumerate().for_each(|(y, row)| {
                let offset = y * row_bytes;
                for x in 0..row.len() / 4 {
                    let mut acc = Rgba([0u8, 0, 0, 0]);
                    for layer in &visible {
                        let i = offset + x * 4;
                        let src = Rgba([layer[i], layer[i + 1], layer[i + 2], layer[i + 3]]);
                        acc = blend_source_over(acc, src, 1.0);
                    }
                    row[x * 4..x * 4 + 4].copy_from_slice(&acc.0);
                }
            });
        }

        self.texture.mark_dirty();
        &self.composite
    }

    /// The flattened texture as of the last [`recomposite`](Self::recomposite).
    pub fn composite(&self) -> &RgbaImage {
        &self.composite
    }

    pub fn texture(&self) -> &TextureBridge {
        &self.texture
    }

    /// Bumped by every recomposite.
    pub fn generation(&self) -> u64 {
        self.texture.generation()
    }

    /// Push the composite to the renderer if it changed since the last frame.
    pub fn present_texture(&mut self, sink: &mut dyn TextureSink) -> bool {
        self.texture.present(&self.composite, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::TRANSPARENT;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    #[test]
    fn test_add_layer_goes_on_top() {
        let mut stack = LayerStack::new(4, 4);
        let a = stack.add_layer("A");
        let b = stack.add_layer("B");
        assert_eq!(stack.layers()[0].id, b);
        assert_eq!(stack.layers()[1].id, a);
        assert_eq!(stack.active_id(), Some(a));
        assert!(stack.layers().iter().all(|l| l.is_blank()));
    }

    #[test]
    fn test_default_layers_activate_bottom() {
        let stack = LayerStack::with_default_layers(4, 4);
        assert_eq!(stack.len(), 3);
        assert_eq!(stack.get_active().map(|l| l.name.as_str()), Some("Base Skin"));
        assert_eq!(stack.layers()[0].name, "Details");
    }

    #[test]
    fn test_set_active_ignores_unknown_id() {
        let mut stack = LayerStack::new(4, 4);
        let a = stack.add_layer("A");
        stack.set_active(99);
        assert_eq!(stack.active_id(), Some(a));
    }

    #[test]
    fn test_get_active_on_empty_stack() {
        let stack = LayerStack::new(4, 4);
        assert!(stack.get_active().is_none());
    }

    #[test]
    fn test_top_layer_wins_in_composite() {
        let mut stack = LayerStack::new(2, 1);
        let bottom = stack.add_layer("bottom");
        let top = stack.add_layer("top");
        stack.get_mut(bottom).unwrap().put_pixel(0, 0, RED);
        stack.get_mut(top).unwrap().put_pixel(0, 0, BLUE);
        stack.get_mut(bottom).unwrap().put_pixel(1, 0, RED);
        let composite = stack.recomposite().clone();
        assert_eq!(*composite.get_pixel(0, 0), BLUE);
        assert_eq!(*composite.get_pixel(1, 0), RED);
    }

    #[test]
    fn test_hidden_layer_is_skipped() {
        let mut stack = LayerStack::new(1, 1);
        let bottom = stack.add_layer("bottom");
        let top = stack.add_layer("top");
        stack.get_mut(bottom).unwrap().put_pixel(0, 0, RED);
        stack.get_mut(top).unwrap().put_pixel(0, 0, BLUE);
        stack.toggle_visibility(top);
        assert_eq!(*stack.composite().get_pixel(0, 0), RED);
        stack.toggle_visibility(bottom);
        assert_eq!(*stack.composite().get_pixel(0, 0), TRANSPARENT);
    }

    #[test]
    fn test_recomposite_is_deterministic() {
        let mut stack = LayerStack::new(16, 16);
        let a = stack.add_layer("a");
        let b = stack.add_layer("b");
        for i in 0..16 {
            stack.get_mut(a).unwrap().put_pixel(i, i, Rgba([i as u8 * 10, 40, 90, 200]));
            stack.get_mut(b).unwrap().put_pixel(15 - i, i, Rgba([10, i as u8 * 12, 50, 90]));
        }
        let first = stack.recomposite().clone();
        let second = stack.recomposite().clone();
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn test_recomposite_marks_texture_dirty() {
        let mut stack = LayerStack::new(2, 2);
        stack.add_layer("a");
        let before = stack.texture().generation();
        stack.recomposite();
        assert!(stack.texture().generation() > before);
        assert!(stack.texture().is_dirty());
    }

    #[test]
    fn test_load_base_image_resamples_into_bottom_layer() {
        let mut stack = LayerStack::with_default_layers(8, 8);
        let image = RgbaImage::from_pixel(16, 16, RED);
        let replaced = stack.load_base_image(&image);
        let bottom = stack.layers().last().unwrap();
        assert_eq!(replaced, Some(bottom.id));
        assert_eq!(bottom.pixels.dimensions(), (8, 8));
        assert_eq!(*bottom.pixels.get_pixel(4, 4), RED);
        assert_eq!(*stack.composite().get_pixel(4, 4), RED);
    }
}

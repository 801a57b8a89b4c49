//! Magic-wand tool: click-and-drag flood fill producing brush-mask regions.
//!
//! The gesture pipeline runs on a plain RGBA buffer resampled from the source
//! image through the active viewport transform, because pixel data cannot be
//! read back through a CSS transform. Pointer movement maps displacement to a
//! flood-fill tolerance, recomputed live as an overlay; pointer release blits
//! the overlay to the natural image size, merges it with any prior wand work
//! on the same region and label, and commits one run-length-encoded mask
//! result. The whole gesture batches into a single undo entry.

#[cfg(test)]
#[path = "wand_test.rs"]
mod wand_test;

use std::collections::VecDeque;

use crate::annotation::Annotation;
use crate::config::{ConfigRegistry, ControlNode};
use crate::consts::{WAND_DEFAULT_THRESHOLD, WAND_HISTORY_KEY, WAND_MAX_THRESHOLD, WAND_THRESHOLD_PER_PX};
use crate::errors::WandError;
use crate::geometry::{Point, Viewport};
use crate::shape::Shape;

/// A plain RGBA pixel buffer (4 bytes per pixel, row-major).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// A zeroed (transparent black) buffer.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, data: vec![0; (width as usize) * (height as usize) * 4] }
    }

    /// Wrap raw RGBA bytes, validating the length against the dimensions.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, WandError> {
        if data.len() != (width as usize) * (height as usize) * 4 {
            return Err(WandError::BufferSize);
        }
        Ok(Self { width, height, data })
    }

    /// The RGBA value at a pixel. Out-of-range coordinates read as
    /// transparent black.
    #[must_use]
    pub fn rgba(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0; 4];
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    fn put_rgba(&mut self, x: u32, y: u32, px: [u8; 4]) {
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        self.data[i..i + 4].copy_from_slice(&px);
    }

    /// Resample this buffer through a viewport transform into an
    /// `out_width` × `out_height` screen-space buffer (nearest neighbor).
    /// Screen pixels that map outside the source read as transparent black.
    #[must_use]
    pub fn sample_viewport(&self, viewport: &Viewport, out_width: u32, out_height: u32) -> PixelBuffer {
        let mut out = PixelBuffer::new(out_width, out_height);
        for y in 0..out_height {
            for x in 0..out_width {
                let screen = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                let src = viewport.screen_to_source(screen);
                if src.x < 0.0 || src.y < 0.0 {
                    continue;
                }
                let (sx, sy) = (src.x as u32, src.y as u32);
                if sx < self.width && sy < self.height {
                    out.put_rgba(x, y, self.rgba(sx, sy));
                }
            }
        }
        out
    }
}

/// A binary mask over a pixel grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMask {
    pub width: u32,
    pub height: u32,
    bits: Vec<bool>,
}

impl BitMask {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, bits: vec![false; (width as usize) * (height as usize)] }
    }

    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.bits[(y as usize) * (self.width as usize) + (x as usize)]
    }

    pub fn set(&mut self, x: u32, y: u32) {
        if x < self.width && y < self.height {
            self.bits[(y as usize) * (self.width as usize) + (x as usize)] = true;
        }
    }

    /// Number of set pixels.
    #[must_use]
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    /// Union another mask of the same dimensions into this one. Mismatched
    /// dimensions leave this mask unchanged.
    pub fn or_assign(&mut self, other: &BitMask) {
        if self.width != other.width || self.height != other.height {
            return;
        }
        for (a, b) in self.bits.iter_mut().zip(&other.bits) {
            *a |= *b;
        }
    }

    /// Blit this screen-space mask onto the natural image grid in one pass,
    /// reading back through the viewport transform (nearest neighbor).
    #[must_use]
    pub fn to_natural(&self, viewport: &Viewport, natural_width: u32, natural_height: u32) -> BitMask {
        let mut out = BitMask::new(natural_width, natural_height);
        for ny in 0..natural_height {
            for nx in 0..natural_width {
                let source = Point::new(f64::from(nx) + 0.5, f64::from(ny) + 0.5);
                let screen = viewport.source_to_screen(source);
                if screen.x < 0.0 || screen.y < 0.0 {
                    continue;
                }
                if self.get(screen.x as u32, screen.y as u32) {
                    out.set(nx, ny);
                }
            }
        }
        out
    }

    /// Run-length encode: alternating run lengths as little-endian `u32`s,
    /// starting with a run of unset pixels (possibly zero-length).
    #[must_use]
    pub fn to_rle(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut current = false;
        let mut run: u32 = 0;
        for &bit in &self.bits {
            if bit == current {
                run += 1;
            } else {
                out.extend_from_slice(&run.to_le_bytes());
                current = bit;
                run = 1;
            }
        }
        out.extend_from_slice(&run.to_le_bytes());
        out
    }

    /// Decode a run-length payload produced by [`BitMask::to_rle`]. Returns
    /// `None` when the runs do not sum to `width * height` or the payload is
    /// not a whole number of `u32`s.
    #[must_use]
    pub fn from_rle(rle: &[u8], width: u32, height: u32) -> Option<BitMask> {
        if rle.len() % 4 != 0 {
            return None;
        }
        let mut mask = BitMask::new(width, height);
        let total = mask.bits.len();
        let mut pos = 0usize;
        let mut value = false;
        for chunk in rle.chunks_exact(4) {
            let run = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as usize;
            if pos + run > total {
                return None;
            }
            if value {
                for bit in &mut mask.bits[pos..pos + run] {
                    *bit = true;
                }
            }
            pos += run;
            value = !value;
        }
        if pos == total { Some(mask) } else { None }
    }
}

/// Flood fill from an anchor pixel: 4-connected BFS over pixels whose RGB
/// channels each differ from the anchor's by at most `threshold`.
#[must_use]
pub fn flood_fill(buffer: &PixelBuffer, anchor_x: u32, anchor_y: u32, threshold: u8) -> BitMask {
    let mut mask = BitMask::new(buffer.width, buffer.height);
    if anchor_x >= buffer.width || anchor_y >= buffer.height {
        return mask;
    }
    let target = buffer.rgba(anchor_x, anchor_y);
    let matches = |px: [u8; 4]| {
        px[0].abs_diff(target[0]) <= threshold
            && px[1].abs_diff(target[1]) <= threshold
            && px[2].abs_diff(target[2]) <= threshold
    };

    let mut queue: VecDeque<(u32, u32)> = VecDeque::new();
    mask.set(anchor_x, anchor_y);
    queue.push_back((anchor_x, anchor_y));
    while let Some((x, y)) = queue.pop_front() {
        let mut visit = |nx: u32, ny: u32, mask: &mut BitMask, queue: &mut VecDeque<(u32, u32)>| {
            if !mask.get(nx, ny) && matches(buffer.rgba(nx, ny)) {
                mask.set(nx, ny);
                queue.push_back((nx, ny));
            }
        };
        if x > 0 {
            visit(x - 1, y, &mut mask, &mut queue);
        }
        if x + 1 < buffer.width {
            visit(x + 1, y, &mut mask, &mut queue);
        }
        if y > 0 {
            visit(x, y - 1, &mut mask, &mut queue);
        }
        if y + 1 < buffer.height {
            visit(x, y + 1, &mut mask, &mut queue);
        }
    }
    mask
}

/// Map pointer displacement from the anchor to an effective tolerance.
///
/// Magnitude grows with distance; the sign comes from the dominant axis, so
/// dragging left/up tightens the fill and right/down loosens it. The result
/// is clamped to `[0, WAND_MAX_THRESHOLD]`.
#[must_use]
pub fn threshold_from_displacement(initial: u8, dx: f64, dy: f64) -> u8 {
    let magnitude = dx.hypot(dy) * WAND_THRESHOLD_PER_PX;
    let signed = if dx.abs() >= dy.abs() { magnitude.copysign(dx) } else { magnitude.copysign(dy) };
    (f64::from(initial) + signed).clamp(0.0, f64::from(WAND_MAX_THRESHOLD)).round() as u8
}

/// Prior wand work cached per (region, label) so consecutive gestures merge
/// into one mask instead of stacking regions.
#[derive(Debug, Clone)]
struct MaskCache {
    region_id: String,
    label: String,
    /// Accumulated mask at natural image size.
    mask: BitMask,
}

#[derive(Debug, Clone)]
enum WandState {
    Idle,
    /// Pointer is down, no movement yet.
    Sampling { buffer: PixelBuffer, anchor: (u32, u32), origin: Point },
    /// Pointer has moved; a live overlay exists.
    Thresholding { buffer: PixelBuffer, anchor: (u32, u32), origin: Point, mask: BitMask, threshold: u8 },
}

/// The magic-wand gesture state machine.
#[derive(Debug)]
pub struct MagicWand {
    state: WandState,
    /// Tolerance before any pointer displacement.
    pub initial_threshold: u8,
    cache: Option<MaskCache>,
}

impl Default for MagicWand {
    fn default() -> Self {
        Self::new()
    }
}

impl MagicWand {
    #[must_use]
    pub fn new() -> Self {
        Self { state: WandState::Idle, initial_threshold: WAND_DEFAULT_THRESHOLD, cache: None }
    }

    /// Whether a gesture is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self.state, WandState::Idle)
    }

    /// The live overlay mask (screen space), if the pointer has moved.
    #[must_use]
    pub fn overlay(&self) -> Option<&BitMask> {
        match &self.state {
            WandState::Thresholding { mask, .. } => Some(mask),
            _ => None,
        }
    }

    /// The effective tolerance of the gesture in progress.
    #[must_use]
    pub fn threshold(&self) -> u8 {
        match &self.state {
            WandState::Thresholding { threshold, .. } => *threshold,
            _ => self.initial_threshold,
        }
    }

    /// Begin a gesture at a screen-space pointer position.
    ///
    /// Resamples the source image through the viewport at the rendered size
    /// and takes the history freeze for the gesture. Rotated viewports and an
    /// active crosshair are rejected up front; so is an anchor outside the
    /// rendered area.
    pub fn pointer_down(
        &mut self,
        screen: Point,
        source: &PixelBuffer,
        viewport: &Viewport,
        rendered_width: u32,
        rendered_height: u32,
        crosshair_active: bool,
        annotation: &mut Annotation,
    ) -> Result<(), WandError> {
        // A lost pointer-up leaves a gesture active; abort it so at most one
        // history freeze is ever held.
        self.escape(annotation);
        if viewport.is_rotated() {
            return Err(WandError::RotatedImage);
        }
        if crosshair_active {
            return Err(WandError::CrosshairActive);
        }
        if screen.x < 0.0
            || screen.y < 0.0
            || screen.x >= f64::from(rendered_width)
            || screen.y >= f64::from(rendered_height)
        {
            return Err(WandError::OutOfBounds);
        }
        let buffer = source.sample_viewport(viewport, rendered_width, rendered_height);
        let anchor = (screen.x as u32, screen.y as u32);
        annotation.freeze_history(WAND_HISTORY_KEY);
        self.state = WandState::Sampling { buffer, anchor, origin: screen };
        Ok(())
    }

    /// Update the gesture with a new pointer position, recomputing the
    /// tolerance and the overlay mask. Returns the overlay.
    pub fn pointer_move(&mut self, screen: Point) -> Result<&BitMask, WandError> {
        let state = std::mem::replace(&mut self.state, WandState::Idle);
        let (buffer, anchor, origin) = match state {
            WandState::Sampling { buffer, anchor, origin }
            | WandState::Thresholding { buffer, anchor, origin, .. } => (buffer, anchor, origin),
            WandState::Idle => return Err(WandError::NotActive),
        };
        let threshold =
            threshold_from_displacement(self.initial_threshold, screen.x - origin.x, screen.y - origin.y);
        let mask = flood_fill(&buffer, anchor.0, anchor.1, threshold);
        self.state = WandState::Thresholding { buffer, anchor, origin, mask, threshold };
        match &self.state {
            WandState::Thresholding { mask, .. } => Ok(mask),
            // Assigned Thresholding on the previous line.
            _ => Err(WandError::NotActive),
        }
    }

    /// Finish the gesture: blit the overlay to the natural image size, merge
    /// with cached wand work on the same selected region and label, and
    /// commit one mask result. Releases the history freeze so the whole
    /// gesture lands as a single undo entry. Returns the committed region's
    /// id, or `Ok(None)` when the annotation refused the mutation.
    pub fn pointer_up(
        &mut self,
        viewport: &Viewport,
        natural_width: u32,
        natural_height: u32,
        control: &ControlNode,
        registry: &ConfigRegistry,
        annotation: &mut Annotation,
    ) -> Result<Option<String>, WandError> {
        let state = std::mem::replace(&mut self.state, WandState::Idle);
        let mask = match state {
            WandState::Idle => return Err(WandError::NotActive),
            WandState::Sampling { buffer, anchor, .. } => {
                flood_fill(&buffer, anchor.0, anchor.1, self.initial_threshold)
            }
            WandState::Thresholding { mask, .. } => mask,
        };
        let result = self.commit(&mask, viewport, natural_width, natural_height, control, registry, annotation);
        annotation.unfreeze_history(WAND_HISTORY_KEY);
        result
    }

    fn commit(
        &mut self,
        overlay: &BitMask,
        viewport: &Viewport,
        natural_width: u32,
        natural_height: u32,
        control: &ControlNode,
        registry: &ConfigRegistry,
        annotation: &mut Annotation,
    ) -> Result<Option<String>, WandError> {
        let natural = overlay.to_natural(viewport, natural_width, natural_height);
        let label = control.selected.first().cloned().unwrap_or_default();

        // Continue an existing mask only when the cached region is still the
        // selected one and the label has not changed.
        let selected = annotation.selected_region().map(|r| r.id.clone());
        let extend = self.cache.as_mut().filter(|c| {
            Some(c.region_id.as_str()) == selected.as_deref()
                && c.label == label
                && c.mask.width == natural.width
                && c.mask.height == natural.height
        });
        if let Some(cache) = extend {
            cache.mask.or_assign(&natural);
            let shape = Shape::Mask {
                rle: cache.mask.to_rle(),
                width: natural_width,
                height: natural_height,
            };
            let region_id = cache.region_id.clone();
            if annotation.set_region_shape(&region_id, shape) {
                return Ok(Some(region_id));
            }
            return Ok(None);
        }

        // A mask loaded from the server is not folded into a fresh cache, so
        // the first gesture after a reload starts a new accumulation.
        let shape = Shape::Mask { rle: natural.to_rle(), width: natural_width, height: natural_height };
        match annotation.create_result(shape, control, registry)? {
            Some(id) => {
                annotation.select_region(&id);
                self.cache = Some(MaskCache { region_id: id.clone(), label, mask: natural });
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    /// Abort the gesture with no commit, releasing the history freeze.
    pub fn escape(&mut self, annotation: &mut Annotation) {
        if self.is_active() {
            self.state = WandState::Idle;
            annotation.unfreeze_history(WAND_HISTORY_KEY);
        }
    }

    /// Drop the cached mask when its region is deleted, so a later gesture
    /// does not resurrect it.
    pub fn invalidate_region(&mut self, region_id: &str) {
        if self.cache.as_ref().is_some_and(|c| c.region_id == region_id) {
            self.cache = None;
        }
    }
}

//! Off-screen pixel surfaces
//!
//! A surface owns a block of pixel storage and a clip rectangle. Everything
//! that draws into it goes through the clip arithmetic in [`SurfaceCore`]
//! first; geometry that ends up empty is silently skipped, never an error.
//!
//! Depth-specific drawing lives behind the [`PixelSurface`] trait, implemented
//! by [`IndexedSurface`] (8-bit palette indices) and [`TrueColorSurface`]
//! (16-bit RGB565).

mod indexed;
mod truecolor;

pub use indexed::IndexedSurface;
pub use truecolor::{blend_565, rgb565, TrueColorSurface};

use serde::{Deserialize, Serialize};

use crate::util::Rng;
use crate::xform::XformPalette;

/// Index treated as "don't draw" by the transparent copies
pub const TRANSPARENT_PIXEL: u8 = 0xff;

const DEFAULT_STATIC_SEED: u64 = 0x5eed_1998;

// ============================================================================
// Geometry
// ============================================================================

/// Clip rectangle in offset-adjusted surface coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClipRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl ClipRect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }
}

/// One axis of a transfer: `len` pixels starting at `src` land at `dest`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub src: i32,
    pub len: i32,
    pub dest: i32,
}

impl Span {
    pub const fn new(src: i32, len: i32, dest: i32) -> Self {
        Self { src, len, dest }
    }
}

/// A rectangular transfer, clipped on both axes by [`SurfaceCore::clip`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blit {
    pub srcx: i32,
    pub srcy: i32,
    pub srcw: i32,
    pub srch: i32,
    pub destx: i32,
    pub desty: i32,
}

impl Blit {
    pub const fn new(srcx: i32, srcy: i32, srcw: i32, srch: i32, destx: i32, desty: i32) -> Self {
        Self {
            srcx,
            srcy,
            srcw,
            srch,
            destx,
            desty,
        }
    }

    /// Blit of a whole `w` x `h` source array to `(destx, desty)`
    pub const fn whole(w: i32, h: i32, destx: i32, desty: i32) -> Self {
        Self::new(0, 0, w, h, destx, desty)
    }
}

/// Clip one axis of a transfer to `[clip_start, clip_start + clip_len)`
///
/// Returns `None` when clipping leaves nothing to draw. A span that already
/// fits comes back unchanged.
pub fn clip_span(span: Span, clip_start: i32, clip_len: i32) -> Option<Span> {
    let Span {
        mut src,
        mut len,
        mut dest,
    } = span;
    let clip_end = clip_start.saturating_add(clip_len);
    if dest < clip_start {
        let overhang = clip_start.saturating_sub(dest);
        len = len.saturating_sub(overhang);
        if len <= 0 {
            return None;
        }
        src = src.saturating_add(overhang);
        dest = clip_start;
    }
    if dest.saturating_add(len) > clip_end {
        len = clip_end - dest;
        if len <= 0 {
            return None;
        }
    }
    Some(Span { src, len, dest })
}

/// True when a `srcw` x `srch` source needs more than `len` elements
///
/// Non-positive sizes count as short so callers can bail out with one test.
#[inline]
pub(crate) fn short_source(len: usize, srcw: i32, srch: i32) -> bool {
    if srcw <= 0 || srch <= 0 {
        return true;
    }
    (srcw as usize)
        .checked_mul(srch as usize)
        .map_or(true, |need| len < need)
}

// ============================================================================
// Surface depth
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Depth {
    /// One byte per pixel, palette index
    #[default]
    Indexed8,
    /// Two bytes per pixel, RGB565
    TrueColor16,
}

impl Depth {
    #[inline]
    pub const fn bits(self) -> u32 {
        match self {
            Depth::Indexed8 => 8,
            Depth::TrueColor16 => 16,
        }
    }

    #[inline]
    pub const fn pixel_size(self) -> usize {
        match self {
            Depth::Indexed8 => 1,
            Depth::TrueColor16 => 2,
        }
    }
}

/// Create an empty surface of the given depth
pub fn new_surface(depth: Depth, width: u32, height: u32) -> Box<dyn PixelSurface> {
    match depth {
        Depth::Indexed8 => Box::new(IndexedSurface::new(width, height)),
        Depth::TrueColor16 => Box::new(TrueColorSurface::new(width, height)),
    }
}

// ============================================================================
// SurfaceCore
// ============================================================================

/// Storage and clip state shared by every surface depth
pub struct SurfaceCore {
    width: u32,
    height: u32,
    offset_x: i32,
    offset_y: i32,
    depth: Depth,
    // Pixels per scan line
    line_width: usize,
    bits: Vec<u8>,
    clip: ClipRect,
    rng: Rng,
}

impl SurfaceCore {
    pub fn new(width: u32, height: u32, depth: Depth) -> Self {
        let line_width = width as usize;
        let mut core = Self {
            width,
            height,
            offset_x: 0,
            offset_y: 0,
            depth,
            line_width,
            bits: vec![0; line_width * height as usize * depth.pixel_size()],
            clip: ClipRect::default(),
            rng: Rng::new(DEFAULT_STATIC_SEED),
        };
        core.clear_clip();
        core
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn depth(&self) -> Depth {
        self.depth
    }

    #[inline]
    pub fn pixel_size(&self) -> usize {
        self.depth.pixel_size()
    }

    /// Scan-line length in pixels
    #[inline]
    pub fn line_width(&self) -> usize {
        self.line_width
    }

    /// Scan-line length in bytes
    #[inline]
    pub fn pitch(&self) -> usize {
        self.line_width * self.pixel_size()
    }

    #[inline]
    pub fn offset(&self) -> (i32, i32) {
        (self.offset_x, self.offset_y)
    }

    /// Move the logical origin; the clip is reset to the whole surface
    pub fn set_offset(&mut self, x: i32, y: i32) {
        self.offset_x = x;
        self.offset_y = y;
        self.clear_clip();
    }

    #[inline]
    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    #[inline]
    pub fn bits_mut(&mut self) -> &mut [u8] {
        &mut self.bits
    }

    pub(crate) fn rng_mut(&mut self) -> &mut Rng {
        &mut self.rng
    }

    pub fn set_static_seed(&mut self, seed: u64) {
        self.rng = Rng::new(seed);
    }

    // ========================================================================
    // Clip rectangle
    // ========================================================================

    /// Reset the clip to the whole surface
    pub fn clear_clip(&mut self) {
        self.clip = ClipRect::new(
            -self.offset_x,
            -self.offset_y,
            self.width as i32,
            self.height as i32,
        );
    }

    /// Set the clip, clamped to the surface bounds
    pub fn set_clip(&mut self, x: i32, y: i32, w: i32, h: i32) {
        let (x, w) = clamp_axis(x.saturating_add(self.offset_x), w, self.width as i32);
        let (y, h) = clamp_axis(y.saturating_add(self.offset_y), h, self.height as i32);
        self.clip = ClipRect::new(x - self.offset_x, y - self.offset_y, w, h);
    }

    #[inline]
    pub fn get_clip(&self) -> ClipRect {
        self.clip
    }

    /// Does the rectangle overlap the clip? Touching edges don't count.
    pub fn is_visible(&self, x: i32, y: i32, w: i32, h: i32) -> bool {
        let c = self.clip;
        x < c.x.saturating_add(c.w)
            && y < c.y.saturating_add(c.h)
            && x.saturating_add(w) > c.x
            && y.saturating_add(h) > c.y
    }

    /// Clip a rectangular transfer, x first then y
    pub fn clip(&self, blit: Blit) -> Option<Blit> {
        let x = clip_span(Span::new(blit.srcx, blit.srcw, blit.destx), self.clip.x, self.clip.w)
            .filter(|s| s.len > 0)?;
        let y = clip_span(Span::new(blit.srcy, blit.srch, blit.desty), self.clip.y, self.clip.h)
            .filter(|s| s.len > 0)?;
        Some(Blit::new(x.src, y.src, x.len, y.len, x.dest, y.dest))
    }

    /// Clip a horizontal line at row `desty`
    pub fn clip_x(&self, span: Span, desty: i32) -> Option<Span> {
        if desty < self.clip.y || desty >= self.clip.y.saturating_add(self.clip.h) {
            return None;
        }
        clip_span(span, self.clip.x, self.clip.w).filter(|s| s.len > 0)
    }

    /// Is the logical pixel inside the clip?
    #[inline]
    pub fn in_clip(&self, x: i32, y: i32) -> bool {
        let c = self.clip;
        x >= c.x && x < c.x + c.w && y >= c.y && y < c.y + c.h
    }

    /// Cohen-Sutherland clip of a line against the clip rectangle
    ///
    /// Returns the trimmed endpoints, or `None` when nothing of the line is
    /// inside. Works in wide integers so endpoints anywhere in `i32` are fine.
    pub fn clip_line(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> Option<(i32, i32, i32, i32)> {
        const INSIDE: u8 = 0;
        const LEFT: u8 = 1;
        const RIGHT: u8 = 2;
        const BOTTOM: u8 = 4;
        const TOP: u8 = 8;
        // Each pass moves one endpoint onto an edge; four edges, two endpoints
        const MAX_ITERATIONS: u32 = 16;

        let c = self.clip;
        if c.is_empty() {
            return None;
        }
        let (xmin, ymin) = (c.x as i64, c.y as i64);
        let (xmax, ymax) = (xmin + c.w as i64 - 1, ymin + c.h as i64 - 1);

        let outcode = |x: i64, y: i64| -> u8 {
            let mut code = INSIDE;
            if x < xmin {
                code |= LEFT;
            } else if x > xmax {
                code |= RIGHT;
            }
            if y < ymin {
                code |= TOP;
            } else if y > ymax {
                code |= BOTTOM;
            }
            code
        };
        // Point on the line at `at` along one axis; products need 128 bits
        let lerp = |a0: i64, b0: i64, a1: i64, b1: i64, at: i64| -> i64 {
            let t = (a1 - a0) as i128 * (at - b0) as i128 / (b1 - b0) as i128;
            a0 + t as i64
        };

        let (mut x0, mut y0, mut x1, mut y1) = (x0 as i64, y0 as i64, x1 as i64, y1 as i64);
        let mut code0 = outcode(x0, y0);
        let mut code1 = outcode(x1, y1);

        for _ in 0..MAX_ITERATIONS {
            if (code0 | code1) == INSIDE {
                // Both endpoints now lie in the clip, which is i32-sized
                return Some((x0 as i32, y0 as i32, x1 as i32, y1 as i32));
            }
            if (code0 & code1) != 0 {
                return None;
            }

            let code_out = if code0 != 0 { code0 } else { code1 };
            // An endpoint outside on an axis means that axis has nonzero extent
            let (x, y) = if (code_out & BOTTOM) != 0 {
                (lerp(x0, y0, x1, y1, ymax), ymax)
            } else if (code_out & TOP) != 0 {
                (lerp(x0, y0, x1, y1, ymin), ymin)
            } else if (code_out & RIGHT) != 0 {
                (xmax, lerp(y0, x0, y1, x1, xmax))
            } else {
                (xmin, lerp(y0, x0, y1, x1, xmin))
            };

            if code_out == code0 {
                x0 = x;
                y0 = y;
                code0 = outcode(x0, y0);
            } else {
                x1 = x;
                y1 = y;
                code1 = outcode(x1, y1);
            }
        }
        None
    }

    // ========================================================================
    // Storage addressing
    // ========================================================================

    /// Byte offset of logical pixel (x, y); caller guarantees it is on the surface
    #[inline]
    pub fn index(&self, x: i32, y: i32) -> usize {
        let sx = (x + self.offset_x) as usize;
        let sy = (y + self.offset_y) as usize;
        (sy * self.line_width + sx) * self.pixel_size()
    }

    /// Bytes of `len` pixels starting at logical (x, y)
    #[inline]
    pub fn row_mut(&mut self, x: i32, y: i32, len: i32) -> &mut [u8] {
        let start = self.index(x, y);
        let end = start + len as usize * self.pixel_size();
        &mut self.bits[start..end]
    }

    /// Move a rectangle within this surface; overlapping rows are safe
    pub fn copy_within(&mut self, srcx: i32, srcy: i32, srcw: i32, srch: i32, destx: i32, desty: i32) {
        let Some(b) = self.clip(Blit::new(srcx, srcy, srcw, srch, destx, desty)) else {
            return;
        };
        // Trim the source to storage too, shifting the target with it
        let (ox, oy) = (self.offset_x, self.offset_y);
        let Some(cols) = clip_span(Span::new(b.destx, b.srcw, b.srcx), -ox, self.width as i32) else {
            return;
        };
        let Some(rows) = clip_span(Span::new(b.desty, b.srch, b.srcy), -oy, self.height as i32) else {
            return;
        };
        let b = Blit::new(cols.dest, rows.dest, cols.len, rows.len, cols.src, rows.src);
        let row_bytes = b.srcw as usize * self.pixel_size();
        let mut copy_row = |row: i32| {
            let from = self.index(b.srcx, b.srcy + row);
            let to = self.index(b.destx, b.desty + row);
            self.bits.copy_within(from..from + row_bytes, to);
        };
        if b.srcy < b.desty {
            for row in (0..b.srch).rev() {
                copy_row(row);
            }
        } else {
            for row in 0..b.srch {
                copy_row(row);
            }
        }
    }

    /// Copy `src`'s whole storage into this surface at logical (destx, desty)
    pub fn blit_from(&mut self, src: &SurfaceCore, destx: i32, desty: i32) {
        if src.depth != self.depth {
            log::warn!(
                "put: depth mismatch ({} into {} bits), ignored",
                src.depth.bits(),
                self.depth.bits()
            );
            return;
        }
        let src_pitch = src.pitch();
        self.blit_bytes(
            &src.bits,
            src_pitch,
            Blit::whole(src.width as i32, src.height as i32, destx, desty),
        );
    }

    /// Fill `dest`'s whole storage from this surface at logical (srcx, srcy)
    pub fn blit_into(&self, dest: &mut SurfaceCore, srcx: i32, srcy: i32) {
        if dest.depth != self.depth {
            log::warn!(
                "get: depth mismatch ({} into {} bits), ignored",
                self.depth.bits(),
                dest.depth.bits()
            );
            return;
        }
        // Clipped against this surface only: dest's storage is the "source"
        // span and our coordinates are the target.
        let Some(b) = self.clip(Blit::new(
            0,
            0,
            dest.width as i32,
            dest.height as i32,
            srcx,
            srcy,
        )) else {
            return;
        };
        let row_bytes = b.srcw as usize * self.pixel_size();
        let dest_pitch = dest.pitch();
        for row in 0..b.srch {
            let from = self.index(b.destx, b.desty + row);
            let to = (b.srcy + row) as usize * dest_pitch + b.srcx as usize * self.pixel_size();
            dest.bits[to..to + row_bytes].copy_from_slice(&self.bits[from..from + row_bytes]);
        }
    }

    /// Clipped raw copy of a `pitch`-byte-per-row pixel array
    pub(crate) fn blit_bytes(&mut self, src: &[u8], pitch: usize, blit: Blit) {
        let need = pitch.checked_mul(blit.srch.max(0) as usize);
        if blit.srcw <= 0 || blit.srch <= 0 || need.map_or(true, |n| src.len() < n) {
            return;
        }
        let Some(b) = self.clip(blit) else {
            return;
        };
        let ps = self.pixel_size();
        let row_bytes = b.srcw as usize * ps;
        for row in 0..b.srch {
            let from = (b.srcy + row) as usize * pitch + b.srcx as usize * ps;
            let to = self.index(b.destx, b.desty + row);
            self.bits[to..to + row_bytes].copy_from_slice(&src[from..from + row_bytes]);
        }
    }
}

/// Clamp one axis of a clip request to `[0, limit]`
fn clamp_axis(mut pos: i32, mut len: i32, limit: i32) -> (i32, i32) {
    if pos < 0 {
        len = len.saturating_add(pos);
        pos = 0;
    }
    pos = pos.min(limit);
    if pos.saturating_add(len) > limit {
        len = limit - pos;
    }
    (pos, len.max(0))
}

// ============================================================================
// PixelSurface
// ============================================================================

/// Drawing contract shared by every surface depth
///
/// Coordinates are logical (offset-adjusted). Sizes are signed so callers can
/// hand over raw arithmetic; anything that clips to nothing is a no-op.
///
/// The 16-bit methods are optional capabilities: the defaults ignore their
/// arguments, so depth-agnostic code can call them on any surface.
pub trait PixelSurface {
    fn core(&self) -> &SurfaceCore;
    fn core_mut(&mut self) -> &mut SurfaceCore;

    fn width(&self) -> u32 {
        self.core().width()
    }

    fn height(&self) -> u32 {
        self.core().height()
    }

    fn depth(&self) -> Depth {
        self.core().depth()
    }

    /// Raw storage, `line_width() * pixel size` bytes per row
    fn bits(&self) -> &[u8] {
        self.core().bits()
    }

    fn bits_mut(&mut self) -> &mut [u8] {
        self.core_mut().bits_mut()
    }

    fn line_width(&self) -> usize {
        self.core().line_width()
    }

    fn clear_clip(&mut self) {
        self.core_mut().clear_clip();
    }

    fn set_clip(&mut self, x: i32, y: i32, w: i32, h: i32) {
        self.core_mut().set_clip(x, y, w, h);
    }

    fn get_clip(&self) -> ClipRect {
        self.core().get_clip()
    }

    fn is_visible(&self, x: i32, y: i32, w: i32, h: i32) -> bool {
        self.core().is_visible(x, y, w, h)
    }

    // ------------------------------------------------------------------------
    // 16-bit color
    // ------------------------------------------------------------------------

    /// Does this surface implement the 16-bit methods?
    fn supports_truecolor(&self) -> bool {
        false
    }

    /// Fill the whole surface with a pixel
    fn fill16(&mut self, _pix: u16) {}

    /// Fill a rectangle with a pixel
    fn fill16_rect(&mut self, _pix: u16, _srcw: i32, _srch: i32, _destx: i32, _desty: i32) {}

    /// Copy a rectangle of pixels into here
    fn copy16(&mut self, _src: &[u16], _srcw: i32, _srch: i32, _destx: i32, _desty: i32) {}

    /// Copy a rectangle of palette indices, skipping [`TRANSPARENT_PIXEL`]
    fn copy_transparent16(&mut self, _src: &[u8], _srcw: i32, _srch: i32, _destx: i32, _desty: i32) {}

    // ------------------------------------------------------------------------
    // 8-bit color
    // ------------------------------------------------------------------------

    /// Fill the whole surface, ignoring the clip
    fn fill8(&mut self, val: u8);

    /// Fill a rectangle
    fn fill8_rect(&mut self, val: u8, srcw: i32, srch: i32, destx: i32, desty: i32);

    /// Fill a horizontal line
    fn fill_hline8(&mut self, val: u8, srcw: i32, destx: i32, desty: i32);

    /// Draw a line between any two points, optionally through a transform
    fn draw_line8(
        &mut self,
        val: u8,
        startx: i32,
        starty: i32,
        endx: i32,
        endy: i32,
        xform: Option<&XformPalette>,
    );

    /// Copy a `srcw` x `srch` pixel array into here
    fn copy8(&mut self, src: &[u8], srcw: i32, srch: i32, destx: i32, desty: i32);

    /// Copy a line of pixels into here
    fn copy_hline8(&mut self, src: &[u8], srcw: i32, destx: i32, desty: i32);

    /// Copy a line; source values in `[first, last]` are translucent and
    /// apply `xforms[value - first]` to the destination instead
    fn copy_hline_translucent8(
        &mut self,
        src: &[u8],
        srcw: i32,
        destx: i32,
        desty: i32,
        first: u8,
        last: u8,
        xforms: &[XformPalette],
    );

    /// Apply a transform along a line
    fn fill_hline_translucent8(
        &mut self,
        val: u8,
        srcw: i32,
        destx: i32,
        desty: i32,
        xform: &XformPalette,
    );

    /// Apply a transform to a rectangle
    fn fill_translucent8(
        &mut self,
        val: u8,
        srcw: i32,
        srch: i32,
        destx: i32,
        desty: i32,
        xform: &XformPalette,
    );

    /// Copy a rectangle, skipping [`TRANSPARENT_PIXEL`]
    fn copy_transparent8(&mut self, src: &[u8], srcw: i32, srch: i32, destx: i32, desty: i32);

    // ------------------------------------------------------------------------
    // Depth-independent
    // ------------------------------------------------------------------------

    /// New empty surface of the same depth
    fn create_another(&self, w: u32, h: u32) -> Box<dyn PixelSurface>;

    /// Copy a rectangle within this surface
    fn copy(&mut self, srcx: i32, srcy: i32, srcw: i32, srch: i32, destx: i32, desty: i32);

    /// Read the rectangle at (srcx, srcy) into `dest`, sized by `dest`
    fn get(&self, dest: &mut dyn PixelSurface, srcx: i32, srcy: i32);

    /// Write all of `src` back at (destx, desty)
    fn put(&mut self, src: &dyn PixelSurface, destx: i32, desty: i32);

    /// Fill with random black/gray/white noise
    fn fill_static(&mut self, black: u8, gray: u8, white: u8);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core_100x50() -> SurfaceCore {
        SurfaceCore::new(100, 50, Depth::Indexed8)
    }

    #[test]
    fn test_new_surface_clip_is_whole_surface() {
        let core = core_100x50();
        assert_eq!(core.get_clip(), ClipRect::new(0, 0, 100, 50));
        assert_eq!(core.bits().len(), 5000);
        assert_eq!(core.pitch(), 100);
    }

    #[test]
    fn test_set_clip_scenarios() {
        let mut core = core_100x50();
        core.set_clip(-10, 0, 30, 50);
        assert_eq!(core.get_clip(), ClipRect::new(0, 0, 20, 50));
        core.set_clip(90, 0, 20, 50);
        assert_eq!(core.get_clip(), ClipRect::new(90, 0, 10, 50));
    }

    #[test]
    fn test_set_clip_fully_outside_is_empty() {
        let mut core = core_100x50();
        core.set_clip(200, 10, 30, 10);
        let c = core.get_clip();
        assert!(c.is_empty());
        assert!(c.x + c.w <= 100);
        core.set_clip(-50, -50, 20, 20);
        let c = core.get_clip();
        assert_eq!((c.x, c.y, c.w, c.h), (0, 0, 0, 0));
    }

    #[test]
    fn test_set_clip_always_within_bounds() {
        let mut core = core_100x50();
        core.set_offset(7, 3);
        let values = [-500, -101, -60, -7, -1, 0, 1, 3, 49, 50, 93, 99, 100, 150, 500];
        for &x in &values {
            for &w in &values {
                for &y in &values {
                    for &h in &[-5, 0, 10, 50, 400] {
                        core.set_clip(x, y, w, h);
                        let c = core.get_clip();
                        assert!(c.x >= -7 && c.x + c.w <= 100 - 7, "{:?}", c);
                        assert!(c.y >= -3 && c.y + c.h <= 50 - 3, "{:?}", c);
                        assert!(c.w >= 0 && c.h >= 0);
                    }
                }
            }
        }
    }

    #[test]
    fn test_clear_clip_accounts_for_offset() {
        let mut core = core_100x50();
        core.set_offset(16, 8);
        core.set_clip(0, 0, 10, 10);
        core.clear_clip();
        assert_eq!(core.get_clip(), ClipRect::new(-16, -8, 100, 50));
    }

    #[test]
    fn test_is_visible() {
        let mut core = core_100x50();
        core.set_clip(10, 10, 20, 20);
        // Entirely outside
        assert!(!core.is_visible(40, 10, 5, 5));
        assert!(!core.is_visible(0, 0, 5, 5));
        // Touching edges only
        assert!(!core.is_visible(30, 10, 5, 5));
        assert!(!core.is_visible(5, 10, 5, 5));
        assert!(!core.is_visible(10, 30, 5, 5));
        // Overlapping, inside, containing
        assert!(core.is_visible(29, 29, 5, 5));
        assert!(core.is_visible(15, 15, 2, 2));
        assert!(core.is_visible(0, 0, 100, 50));
    }

    #[test]
    fn test_clip_span_fitting_span_unchanged() {
        for dest in 10..=20 {
            for len in 1..=(30 - dest) {
                let span = Span::new(3, len, dest);
                assert_eq!(clip_span(span, 10, 20), Some(span));
            }
        }
    }

    #[test]
    fn test_clip_span_left_overhang() {
        let clipped = clip_span(Span::new(0, 10, -4), 0, 100);
        assert_eq!(clipped, Some(Span::new(4, 6, 0)));
        assert_eq!(clip_span(Span::new(0, 4, -4), 0, 100), None);
        assert_eq!(clip_span(Span::new(0, 3, -4), 0, 100), None);
    }

    #[test]
    fn test_clip_span_right_overhang() {
        assert_eq!(clip_span(Span::new(2, 10, 95), 0, 100), Some(Span::new(2, 5, 95)));
        assert_eq!(clip_span(Span::new(2, 10, 100), 0, 100), None);
    }

    #[test]
    fn test_clip_span_both_sides() {
        assert_eq!(clip_span(Span::new(0, 50, -10), 0, 20), Some(Span::new(10, 20, 0)));
    }

    #[test]
    fn test_clip_requires_both_axes() {
        let mut core = core_100x50();
        core.set_clip(10, 10, 20, 20);
        assert_eq!(core.clip(Blit::whole(5, 5, 40, 15)), None);
        assert_eq!(core.clip(Blit::whole(5, 5, 15, 40)), None);
        assert_eq!(
            core.clip(Blit::whole(10, 10, 5, 25)),
            Some(Blit::new(5, 0, 5, 5, 10, 25))
        );
        assert_eq!(core.clip(Blit::whole(0, 5, 15, 15)), None);
    }

    #[test]
    fn test_clip_x_rejects_rows_outside_clip() {
        let mut core = core_100x50();
        core.set_clip(0, 10, 100, 5);
        let span = Span::new(0, 10, 0);
        assert_eq!(core.clip_x(span, 9), None);
        assert_eq!(core.clip_x(span, 15), None);
        assert_eq!(core.clip_x(span, 10), Some(span));
        assert_eq!(core.clip_x(span, 14), Some(span));
    }

    #[test]
    fn test_offset_moves_storage_origin() {
        let mut core = core_100x50();
        core.set_offset(10, 5);
        assert_eq!(core.index(-10, -5), 0);
        assert_eq!(core.index(0, 0), 5 * 100 + 10);
    }

    #[test]
    fn test_copy_within_overlapping_down() {
        let mut core = SurfaceCore::new(4, 4, Depth::Indexed8);
        for (i, b) in core.bits_mut().iter_mut().enumerate() {
            *b = (i / 4) as u8 + 1;
        }
        // Shift rows 0..3 down by one
        core.copy_within(0, 0, 4, 3, 0, 1);
        let rows: Vec<u8> = core.bits().chunks(4).map(|r| r[0]).collect();
        assert_eq!(rows, vec![1, 1, 2, 3]);
    }

    #[test]
    fn test_copy_within_overlapping_up() {
        let mut core = SurfaceCore::new(4, 4, Depth::Indexed8);
        for (i, b) in core.bits_mut().iter_mut().enumerate() {
            *b = (i / 4) as u8 + 1;
        }
        core.copy_within(0, 1, 4, 3, 0, 0);
        let rows: Vec<u8> = core.bits().chunks(4).map(|r| r[0]).collect();
        assert_eq!(rows, vec![2, 3, 4, 4]);
    }

    #[test]
    fn test_copy_within_trims_source_off_storage() {
        let mut core = SurfaceCore::new(4, 4, Depth::Indexed8);
        for (i, b) in core.bits_mut().iter_mut().enumerate() {
            *b = i as u8;
        }
        // Two source columns hang off the left edge; the rest still lands
        core.copy_within(-2, 0, 4, 1, 0, 1);
        assert_eq!(&core.bits()[4..8], &[4, 5, 0, 1]);
        // Source rows above the storage are dropped the same way
        core.copy_within(0, -1, 4, 3, 0, 1);
        assert_eq!(&core.bits()[8..12], &[0, 1, 2, 3]);
        assert_eq!(&core.bits()[12..16], &[4, 5, 0, 1]);
        // Nothing on storage, nothing copied
        let before = core.bits().to_vec();
        core.copy_within(-10, 0, 4, 4, 0, 0);
        assert_eq!(core.bits(), &before[..]);
    }

    #[test]
    fn test_clip_line_trims_to_clip() {
        let mut core = SurfaceCore::new(8, 8, Depth::Indexed8);
        assert_eq!(core.clip_line(1, 1, 6, 6), Some((1, 1, 6, 6)));
        assert_eq!(core.clip_line(-5, 2, 12, 2), Some((0, 2, 7, 2)));
        assert_eq!(core.clip_line(3, -4, 3, 20), Some((3, 0, 3, 7)));
        assert_eq!(core.clip_line(-4, -4, -1, 9), None);
        assert_eq!(core.clip_line(9, 0, 12, 12), None);
        core.set_clip(2, 2, 2, 2);
        assert_eq!(core.clip_line(0, 0, 7, 7), Some((2, 2, 3, 3)));
        core.set_clip(20, 20, 4, 4);
        assert_eq!(core.clip_line(0, 0, 7, 7), None);
    }

    #[test]
    fn test_clip_line_far_endpoints() {
        let core = SurfaceCore::new(8, 8, Depth::Indexed8);
        let far = 1_500_000_000;
        assert_eq!(core.clip_line(-far, 3, far, 3), Some((0, 3, 7, 3)));
        assert_eq!(core.clip_line(-far, -far, far, far), Some((0, 0, 7, 7)));
        assert_eq!(core.clip_line(i32::MIN, i32::MAX, i32::MAX, i32::MAX), None);
        assert_eq!(core.clip_line(i32::MIN, 0, i32::MAX, 0), Some((0, 0, 7, 0)));
    }

    #[test]
    fn test_short_source_sizes_in_usize() {
        assert!(!short_source(12, 4, 3));
        assert!(short_source(11, 4, 3));
        assert!(short_source(100, 0, 3));
        assert!(short_source(100, 4, -1));
        // 65536 * 65537 wraps to 65536 in i32
        assert!(short_source(65536, 65536, 65537));
    }

    #[test]
    fn test_depth_sizes() {
        assert_eq!(Depth::Indexed8.bits(), 8);
        assert_eq!(Depth::TrueColor16.pixel_size(), 2);
        let s = new_surface(Depth::TrueColor16, 8, 2);
        assert_eq!(s.bits().len(), 32);
        assert!(s.supports_truecolor());
        assert!(!new_surface(Depth::Indexed8, 8, 2).supports_truecolor());
    }
}

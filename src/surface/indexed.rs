use super::{short_source, Blit, Depth, PixelSurface, Span, SurfaceCore, TRANSPARENT_PIXEL};
use crate::xform::XformPalette;

/// 8-bit palette-indexed surface
pub struct IndexedSurface {
    core: SurfaceCore,
}

impl IndexedSurface {
    pub fn new(width: u32, height: u32) -> Self {
        log::debug!("new 8-bit surface {}x{}", width, height);
        Self {
            core: SurfaceCore::new(width, height, Depth::Indexed8),
        }
    }

    /// Read a pixel (bounds checked against the storage, not the clip)
    #[inline]
    pub fn pixel(&self, x: i32, y: i32) -> Option<u8> {
        let (ox, oy) = self.core.offset();
        let (sx, sy) = (x + ox, y + oy);
        if sx < 0 || sy < 0 || sx >= self.core.width() as i32 || sy >= self.core.height() as i32 {
            return None;
        }
        Some(self.core.bits()[self.core.index(x, y)])
    }

    /// Rows of a clipped rectangle, one mutable slice at a time
    fn for_each_row(&mut self, b: &Blit, mut f: impl FnMut(i32, &mut [u8])) {
        for row in 0..b.srch {
            f(row, self.core.row_mut(b.destx, b.desty + row, b.srcw));
        }
    }
}

impl PixelSurface for IndexedSurface {
    fn core(&self) -> &SurfaceCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SurfaceCore {
        &mut self.core
    }

    fn fill8(&mut self, val: u8) {
        self.core.bits_mut().fill(val);
    }

    fn fill8_rect(&mut self, val: u8, srcw: i32, srch: i32, destx: i32, desty: i32) {
        let Some(b) = self.core.clip(Blit::whole(srcw, srch, destx, desty)) else {
            return;
        };
        self.for_each_row(&b, |_, row| row.fill(val));
    }

    fn fill_hline8(&mut self, val: u8, srcw: i32, destx: i32, desty: i32) {
        let Some(s) = self.core.clip_x(Span::new(0, srcw, destx), desty) else {
            return;
        };
        self.core.row_mut(s.dest, desty, s.len).fill(val);
    }

    fn draw_line8(
        &mut self,
        val: u8,
        startx: i32,
        starty: i32,
        endx: i32,
        endy: i32,
        xform: Option<&XformPalette>,
    ) {
        let Some((startx, starty, endx, endy)) = self.core.clip_line(startx, starty, endx, endy)
        else {
            return;
        };

        // Bresenham, both endpoints inclusive
        let dx = (endx - startx).abs();
        let dy = -(endy - starty).abs();
        let sx = if startx < endx { 1 } else { -1 };
        let sy = if starty < endy { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (startx, starty);

        loop {
            if self.core.in_clip(x, y) {
                let idx = self.core.index(x, y);
                let bits = self.core.bits_mut();
                bits[idx] = match xform {
                    Some(t) => t[bits[idx]],
                    None => val,
                };
            }
            if x == endx && y == endy {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn copy8(&mut self, src: &[u8], srcw: i32, srch: i32, destx: i32, desty: i32) {
        if srcw <= 0 {
            return;
        }
        self.core
            .blit_bytes(src, srcw as usize, Blit::whole(srcw, srch, destx, desty));
    }

    fn copy_hline8(&mut self, src: &[u8], srcw: i32, destx: i32, desty: i32) {
        if srcw <= 0 || src.len() < srcw as usize {
            return;
        }
        let Some(s) = self.core.clip_x(Span::new(0, srcw, destx), desty) else {
            return;
        };
        let from = &src[s.src as usize..(s.src + s.len) as usize];
        self.core.row_mut(s.dest, desty, s.len).copy_from_slice(from);
    }

    fn copy_hline_translucent8(
        &mut self,
        src: &[u8],
        srcw: i32,
        destx: i32,
        desty: i32,
        first: u8,
        last: u8,
        xforms: &[XformPalette],
    ) {
        if srcw <= 0 || src.len() < srcw as usize {
            return;
        }
        let Some(s) = self.core.clip_x(Span::new(0, srcw, destx), desty) else {
            return;
        };
        let from = &src[s.src as usize..(s.src + s.len) as usize];
        let row = self.core.row_mut(s.dest, desty, s.len);
        for (dst, &val) in row.iter_mut().zip(from) {
            let table = (first..=last)
                .contains(&val)
                .then(|| xforms.get((val - first) as usize))
                .flatten();
            *dst = match table {
                Some(t) => t[*dst],
                None => val,
            };
        }
    }

    fn fill_hline_translucent8(
        &mut self,
        _val: u8,
        srcw: i32,
        destx: i32,
        desty: i32,
        xform: &XformPalette,
    ) {
        let Some(s) = self.core.clip_x(Span::new(0, srcw, destx), desty) else {
            return;
        };
        for p in self.core.row_mut(s.dest, desty, s.len) {
            *p = xform[*p];
        }
    }

    fn fill_translucent8(
        &mut self,
        _val: u8,
        srcw: i32,
        srch: i32,
        destx: i32,
        desty: i32,
        xform: &XformPalette,
    ) {
        let Some(b) = self.core.clip(Blit::whole(srcw, srch, destx, desty)) else {
            return;
        };
        self.for_each_row(&b, |_, row| {
            for p in row {
                *p = xform[*p];
            }
        });
    }

    fn copy_transparent8(&mut self, src: &[u8], srcw: i32, srch: i32, destx: i32, desty: i32) {
        if short_source(src.len(), srcw, srch) {
            return;
        }
        let Some(b) = self.core.clip(Blit::whole(srcw, srch, destx, desty)) else {
            return;
        };
        let pitch = srcw as usize;
        self.for_each_row(&b, |row, dst| {
            let start = (b.srcy + row) as usize * pitch + b.srcx as usize;
            for (d, &s) in dst.iter_mut().zip(&src[start..start + b.srcw as usize]) {
                if s != TRANSPARENT_PIXEL {
                    *d = s;
                }
            }
        });
    }

    fn create_another(&self, w: u32, h: u32) -> Box<dyn PixelSurface> {
        Box::new(IndexedSurface::new(w, h))
    }

    fn copy(&mut self, srcx: i32, srcy: i32, srcw: i32, srch: i32, destx: i32, desty: i32) {
        self.core.copy_within(srcx, srcy, srcw, srch, destx, desty);
    }

    fn get(&self, dest: &mut dyn PixelSurface, srcx: i32, srcy: i32) {
        self.core.blit_into(dest.core_mut(), srcx, srcy);
    }

    fn put(&mut self, src: &dyn PixelSurface, destx: i32, desty: i32) {
        self.core.blit_from(src.core(), destx, desty);
    }

    fn fill_static(&mut self, black: u8, gray: u8, white: u8) {
        let len = self.core.bits().len();
        for i in 0..len {
            let pix = match self.core.rng_mut().next_u32() % 5 {
                0 | 1 => black,
                2 | 3 => gray,
                _ => white,
            };
            self.core.bits_mut()[i] = pix;
        }
    }
}

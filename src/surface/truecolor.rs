use super::{short_source, Blit, Depth, PixelSurface, Span, SurfaceCore, TRANSPARENT_PIXEL};
use crate::xform::{XformPalette, PALETTE_SIZE};

/// Pack 8-bit channels into RGB565
#[inline]
pub const fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    (((r as u16) >> 3) << 11) | (((g as u16) >> 2) << 5) | ((b as u16) >> 3)
}

/// 50/50 blend of two RGB565 pixels, per channel
#[inline]
pub const fn blend_565(a: u16, b: u16) -> u16 {
    (((a ^ b) & 0xf7de) >> 1) + (a & b)
}

#[inline]
fn read_pixel(bytes: &[u8]) -> u16 {
    u16::from_ne_bytes([bytes[0], bytes[1]])
}

#[inline]
fn write_pixel(bytes: &mut [u8], pix: u16) {
    bytes.copy_from_slice(&pix.to_ne_bytes());
}

/// 16-bit RGB565 surface
///
/// Palette indices handed to the 8-bit methods are looked up in the surface
/// palette. Translucent drawing can't consult a transform table here (the
/// destination holds colors, not indices), so it blends the palette color
/// 50/50 with what is already there.
pub struct TrueColorSurface {
    core: SurfaceCore,
    palette: [u16; PALETTE_SIZE],
}

impl TrueColorSurface {
    pub fn new(width: u32, height: u32) -> Self {
        log::debug!("new 16-bit surface {}x{}", width, height);
        let mut palette = [0u16; PALETTE_SIZE];
        for (i, p) in palette.iter_mut().enumerate() {
            let v = i as u8;
            *p = rgb565(v, v, v);
        }
        Self {
            core: SurfaceCore::new(width, height, Depth::TrueColor16),
            palette,
        }
    }

    /// Replace the first `colors.len()` palette entries
    pub fn set_palette(&mut self, colors: &[(u8, u8, u8)]) {
        for (p, &(r, g, b)) in self.palette.iter_mut().zip(colors) {
            *p = rgb565(r, g, b);
        }
    }

    #[inline]
    pub fn palette_color(&self, index: u8) -> u16 {
        self.palette[index as usize]
    }

    #[inline]
    pub fn pixel(&self, x: i32, y: i32) -> Option<u16> {
        let (ox, oy) = self.core.offset();
        let (sx, sy) = (x + ox, y + oy);
        if sx < 0 || sy < 0 || sx >= self.core.width() as i32 || sy >= self.core.height() as i32 {
            return None;
        }
        let idx = self.core.index(x, y);
        Some(read_pixel(&self.core.bits()[idx..idx + 2]))
    }

    fn fill_rect_with(&mut self, b: &Blit, mut f: impl FnMut(u16) -> u16) {
        for row in 0..b.srch {
            for px in self.core.row_mut(b.destx, b.desty + row, b.srcw).chunks_exact_mut(2) {
                let pix = f(read_pixel(px));
                write_pixel(px, pix);
            }
        }
    }

    fn fill_span_with(&mut self, s: &Span, desty: i32, mut f: impl FnMut(u16) -> u16) {
        for px in self.core.row_mut(s.dest, desty, s.len).chunks_exact_mut(2) {
            let pix = f(read_pixel(px));
            write_pixel(px, pix);
        }
    }
}

impl PixelSurface for TrueColorSurface {
    fn core(&self) -> &SurfaceCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SurfaceCore {
        &mut self.core
    }

    fn supports_truecolor(&self) -> bool {
        true
    }

    fn fill16(&mut self, pix: u16) {
        for px in self.core.bits_mut().chunks_exact_mut(2) {
            write_pixel(px, pix);
        }
    }

    fn fill16_rect(&mut self, pix: u16, srcw: i32, srch: i32, destx: i32, desty: i32) {
        let Some(b) = self.core.clip(Blit::whole(srcw, srch, destx, desty)) else {
            return;
        };
        self.fill_rect_with(&b, |_| pix);
    }

    fn copy16(&mut self, src: &[u16], srcw: i32, srch: i32, destx: i32, desty: i32) {
        if short_source(src.len(), srcw, srch) {
            return;
        }
        let Some(b) = self.core.clip(Blit::whole(srcw, srch, destx, desty)) else {
            return;
        };
        let pitch = srcw as usize;
        for row in 0..b.srch {
            let start = (b.srcy + row) as usize * pitch + b.srcx as usize;
            let from = &src[start..start + b.srcw as usize];
            let dst = self.core.row_mut(b.destx, b.desty + row, b.srcw);
            for (px, &pix) in dst.chunks_exact_mut(2).zip(from) {
                write_pixel(px, pix);
            }
        }
    }

    fn copy_transparent16(&mut self, src: &[u8], srcw: i32, srch: i32, destx: i32, desty: i32) {
        if short_source(src.len(), srcw, srch) {
            return;
        }
        let Some(b) = self.core.clip(Blit::whole(srcw, srch, destx, desty)) else {
            return;
        };
        let pitch = srcw as usize;
        let palette = self.palette;
        for row in 0..b.srch {
            let start = (b.srcy + row) as usize * pitch + b.srcx as usize;
            let from = &src[start..start + b.srcw as usize];
            let dst = self.core.row_mut(b.destx, b.desty + row, b.srcw);
            for (px, &val) in dst.chunks_exact_mut(2).zip(from) {
                if val != TRANSPARENT_PIXEL {
                    write_pixel(px, palette[val as usize]);
                }
            }
        }
    }

    fn fill8(&mut self, val: u8) {
        self.fill16(self.palette_color(val));
    }

    fn fill8_rect(&mut self, val: u8, srcw: i32, srch: i32, destx: i32, desty: i32) {
        self.fill16_rect(self.palette_color(val), srcw, srch, destx, desty);
    }

    fn fill_hline8(&mut self, val: u8, srcw: i32, destx: i32, desty: i32) {
        let Some(s) = self.core.clip_x(Span::new(0, srcw, destx), desty) else {
            return;
        };
        let pix = self.palette_color(val);
        self.fill_span_with(&s, desty, |_| pix);
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

        let color = self.palette_color(val);
        let dx = (endx - startx).abs();
        let dy = -(endy - starty).abs();
        let sx = if startx < endx { 1 } else { -1 };
        let sy = if starty < endy { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (startx, starty);

        loop {
            if self.core.in_clip(x, y) {
                let idx = self.core.index(x, y);
                let px = &mut self.core.bits_mut()[idx..idx + 2];
                let pix = if xform.is_some() {
                    blend_565(read_pixel(px), color)
                } else {
                    color
                };
                write_pixel(px, pix);
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
        if short_source(src.len(), srcw, srch) {
            return;
        }
        let Some(b) = self.core.clip(Blit::whole(srcw, srch, destx, desty)) else {
            return;
        };
        let pitch = srcw as usize;
        let palette = self.palette;
        for row in 0..b.srch {
            let start = (b.srcy + row) as usize * pitch + b.srcx as usize;
            let from = &src[start..start + b.srcw as usize];
            let dst = self.core.row_mut(b.destx, b.desty + row, b.srcw);
            for (px, &val) in dst.chunks_exact_mut(2).zip(from) {
                write_pixel(px, palette[val as usize]);
            }
        }
    }

    fn copy_hline8(&mut self, src: &[u8], srcw: i32, destx: i32, desty: i32) {
        if srcw <= 0 || src.len() < srcw as usize {
            return;
        }
        let Some(s) = self.core.clip_x(Span::new(0, srcw, destx), desty) else {
            return;
        };
        let palette = self.palette;
        let mut from = src[s.src as usize..(s.src + s.len) as usize].iter();
        self.fill_span_with(&s, desty, |old| {
            from.next().map_or(old, |&val| palette[val as usize])
        });
    }

    fn copy_hline_translucent8(
        &mut self,
        src: &[u8],
        srcw: i32,
        destx: i32,
        desty: i32,
        first: u8,
        last: u8,
        _xforms: &[XformPalette],
    ) {
        if srcw <= 0 || src.len() < srcw as usize {
            return;
        }
        let Some(s) = self.core.clip_x(Span::new(0, srcw, destx), desty) else {
            return;
        };
        let palette = self.palette;
        let mut from = src[s.src as usize..(s.src + s.len) as usize].iter();
        self.fill_span_with(&s, desty, |old| match from.next() {
            Some(&val) if (first..=last).contains(&val) => blend_565(old, palette[val as usize]),
            Some(&val) => palette[val as usize],
            None => old,
        });
    }

    fn fill_hline_translucent8(
        &mut self,
        val: u8,
        srcw: i32,
        destx: i32,
        desty: i32,
        _xform: &XformPalette,
    ) {
        let Some(s) = self.core.clip_x(Span::new(0, srcw, destx), desty) else {
            return;
        };
        let color = self.palette_color(val);
        self.fill_span_with(&s, desty, |old| blend_565(old, color));
    }

    fn fill_translucent8(
        &mut self,
        val: u8,
        srcw: i32,
        srch: i32,
        destx: i32,
        desty: i32,
        _xform: &XformPalette,
    ) {
        let Some(b) = self.core.clip(Blit::whole(srcw, srch, destx, desty)) else {
            return;
        };
        let color = self.palette_color(val);
        self.fill_rect_with(&b, |old| blend_565(old, color));
    }

    fn copy_transparent8(&mut self, src: &[u8], srcw: i32, srch: i32, destx: i32, desty: i32) {
        self.copy_transparent16(src, srcw, srch, destx, desty);
    }

    fn create_another(&self, w: u32, h: u32) -> Box<dyn PixelSurface> {
        let mut another = TrueColorSurface::new(w, h);
        another.palette = self.palette;
        Box::new(another)
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
        let colors = [
            self.palette_color(black),
            self.palette_color(gray),
            self.palette_color(white),
        ];
        let count = self.core.bits().len() / 2;
        for i in 0..count {
            let pix = match self.core.rng_mut().next_u32() % 5 {
                0 | 1 => colors[0],
                2 | 3 => colors[1],
                _ => colors[2],
            };
            write_pixel(&mut self.core.bits_mut()[i * 2..i * 2 + 2], pix);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::checksum;

    const RED: u16 = rgb565(255, 0, 0);
    const BLUE: u16 = rgb565(0, 0, 255);

    #[test]
    fn test_rgb565_packing() {
        assert_eq!(rgb565(255, 255, 255), 0xffff);
        assert_eq!(RED, 0xf800);
        assert_eq!(rgb565(0, 255, 0), 0x07e0);
        assert_eq!(BLUE, 0x001f);
    }

    #[test]
    fn test_blend_565_halves_channels() {
        assert_eq!(blend_565(0xffff, 0x0000), 0x7bef);
        assert_eq!(blend_565(RED, RED), RED);
        assert_eq!(blend_565(RED, BLUE), 0x780f);
    }

    #[test]
    fn test_fill16_rect_clipped() {
        let mut s = TrueColorSurface::new(4, 4);
        s.set_clip(0, 0, 2, 2);
        s.fill16_rect(RED, 4, 4, 1, 1);
        assert_eq!(s.pixel(1, 1), Some(RED));
        assert_eq!(s.pixel(2, 1), Some(0));
        assert_eq!(s.pixel(1, 2), Some(0));
        assert_eq!(s.pixel(0, 0), Some(0));
    }

    #[test]
    fn test_copy16_and_outside_clip() {
        let mut s = TrueColorSurface::new(3, 2);
        s.copy16(&[1, 2, 3, 4], 2, 2, 1, 0);
        assert_eq!(s.pixel(1, 0), Some(1));
        assert_eq!(s.pixel(2, 1), Some(4));
        let before = checksum(s.bits());
        s.copy16(&[9; 4], 2, 2, 3, 0);
        s.copy16(&[9; 4], 2, 2, 0, -2);
        assert_eq!(checksum(s.bits()), before);
    }

    #[test]
    fn test_eight_bit_values_go_through_palette() {
        let mut s = TrueColorSurface::new(2, 2);
        s.set_palette(&[(0, 0, 0), (255, 0, 0)]);
        s.fill8(1);
        assert_eq!(s.pixel(1, 1), Some(RED));
        s.copy_hline8(&[0, 1], 2, 0, 0);
        assert_eq!(s.pixel(0, 0), Some(0));
        assert_eq!(s.pixel(1, 0), Some(RED));
    }

    #[test]
    fn test_copy_transparent16_skips_sentinel() {
        let mut s = TrueColorSurface::new(2, 1);
        s.set_palette(&[(0, 0, 255)]);
        s.fill16(RED);
        s.copy_transparent16(&[0, TRANSPARENT_PIXEL], 2, 1, 0, 0);
        assert_eq!(s.pixel(0, 0), Some(BLUE));
        assert_eq!(s.pixel(1, 0), Some(RED));
    }

    #[test]
    fn test_translucent_fill_blends_with_destination() {
        let mut s = TrueColorSurface::new(2, 2);
        s.set_palette(&[(0, 0, 255)]);
        s.fill16(RED);
        s.fill_translucent8(0, 1, 2, 0, 0, &XformPalette::identity());
        assert_eq!(s.pixel(0, 1), Some(blend_565(RED, BLUE)));
        assert_eq!(s.pixel(1, 1), Some(RED));
    }

    #[test]
    fn test_copy_hline_translucent8_range() {
        let mut s = TrueColorSurface::new(2, 1);
        s.set_palette(&[(0, 0, 255), (0, 0, 0)]);
        s.fill16(RED);
        s.copy_hline_translucent8(&[0, 1], 2, 0, 0, 0, 0, &[]);
        assert_eq!(s.pixel(0, 0), Some(blend_565(RED, BLUE)));
        assert_eq!(s.pixel(1, 0), Some(0));
    }

    #[test]
    fn test_oversized_dimensions_are_ignored() {
        let mut s = TrueColorSurface::new(8, 8);
        s.fill_static(0, 128, 255);
        let before = checksum(s.bits());
        let wide = vec![RED; 65536];
        let narrow = vec![1u8; 65536];
        s.copy16(&wide, 65536, 65537, 0, 0);
        s.copy_transparent16(&narrow, 65536, 65537, 0, 0);
        s.copy8(&narrow, 65536, 65537, 0, 0);
        s.copy_transparent8(&narrow, 65536, 65537, 0, 0);
        assert_eq!(checksum(s.bits()), before);
    }

    #[test]
    fn test_draw_line8_far_endpoints() {
        let far = 1_500_000_000;
        let mut s = TrueColorSurface::new(8, 8);
        s.set_palette(&[(255, 0, 0)]);
        s.draw_line8(0, -far, 3, far, 3, None);
        for x in 0..8 {
            assert_eq!(s.pixel(x, 3), Some(RED));
        }
        assert_eq!(s.pixel(0, 2), Some(0));
        assert_eq!(s.pixel(0, 4), Some(0));
    }

    #[test]
    fn test_create_another_keeps_depth_and_palette() {
        let mut s = TrueColorSurface::new(4, 4);
        s.set_palette(&[(255, 0, 0)]);
        let mut other = s.create_another(2, 2);
        assert_eq!(other.depth(), Depth::TrueColor16);
        other.fill8(0);
        assert_eq!(other.bits()[..2], RED.to_ne_bytes());
    }

    #[test]
    fn test_get_put_round_trip() {
        let mut s = TrueColorSurface::new(8, 8);
        s.fill_static(0, 128, 255);
        let original = s.bits().to_vec();
        let mut save = s.create_another(3, 3);
        s.get(save.as_mut(), 4, 4);
        s.fill16_rect(RED, 3, 3, 4, 4);
        s.put(save.as_ref(), 4, 4);
        assert_eq!(s.bits(), &original[..]);
    }
}

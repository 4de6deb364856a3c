//! Color transform tables for palette-indexed translucency
//!
//! An `XformPalette` describes the effect of one translucent color (glass,
//! fog, shadow) on every other palette index: drawing through it replaces a
//! destination index `d` with `table[d]`.

use std::ops::Index;

use thiserror::Error;

/// Number of entries in an 8-bit palette
pub const PALETTE_SIZE: usize = 256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum XformError {
    #[error("transform table needs 256 entries, got {0}")]
    Length(usize),
}

/// 256-entry lookup mapping an 8-bit color index to its transformed index
#[derive(Clone, PartialEq, Eq)]
pub struct XformPalette {
    colors: [u8; PALETTE_SIZE],
}

impl XformPalette {
    pub const fn new(colors: [u8; PALETTE_SIZE]) -> Self {
        Self { colors }
    }

    /// Table that leaves every index unchanged
    pub fn identity() -> Self {
        let mut colors = [0u8; PALETTE_SIZE];
        for (i, c) in colors.iter_mut().enumerate() {
            *c = i as u8;
        }
        Self { colors }
    }

    /// Build a translucency table from an RGB palette
    ///
    /// Each palette entry is blended toward `color` by `alpha / 255` and the
    /// result is mapped back to the closest palette entry. Indices past the
    /// end of `palette` map to themselves.
    pub fn blend(palette: &[(u8, u8, u8)], color: (u8, u8, u8), alpha: u8) -> Self {
        let mut table = Self::identity();
        let alpha = alpha as u16;
        for (i, &(r, g, b)) in palette.iter().take(PALETTE_SIZE).enumerate() {
            let target = (
                blend_channel(color.0, r, alpha),
                blend_channel(color.1, g, alpha),
                blend_channel(color.2, b, alpha),
            );
            table.colors[i] = nearest_index(palette, target);
        }
        table
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; PALETTE_SIZE] {
        &self.colors
    }
}

impl Default for XformPalette {
    fn default() -> Self {
        Self::identity()
    }
}

impl Index<u8> for XformPalette {
    type Output = u8;

    #[inline]
    fn index(&self, i: u8) -> &u8 {
        &self.colors[i as usize]
    }
}

impl TryFrom<&[u8]> for XformPalette {
    type Error = XformError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let colors: [u8; PALETTE_SIZE] = bytes
            .try_into()
            .map_err(|_| XformError::Length(bytes.len()))?;
        Ok(Self { colors })
    }
}

impl std::fmt::Debug for XformPalette {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let changed = self
            .colors
            .iter()
            .enumerate()
            .filter(|&(i, &c)| i != c as usize)
            .count();
        f.debug_struct("XformPalette")
            .field("remapped", &changed)
            .finish()
    }
}

/// Alpha blend one channel; `(x + 1 + (x >> 8)) >> 8` stands in for `x / 255`
#[inline]
fn blend_channel(src: u8, dst: u8, alpha: u16) -> u8 {
    let result = src as u16 * alpha + dst as u16 * (255 - alpha);
    ((result + 1 + (result >> 8)) >> 8) as u8
}

fn nearest_index(palette: &[(u8, u8, u8)], target: (u8, u8, u8)) -> u8 {
    let dist = |&(r, g, b): &(u8, u8, u8)| {
        let dr = r as i32 - target.0 as i32;
        let dg = g as i32 - target.1 as i32;
        let db = b as i32 - target.2 as i32;
        dr * dr + dg * dg + db * db
    };
    palette
        .iter()
        .take(PALETTE_SIZE)
        .enumerate()
        .min_by_key(|(_, c)| dist(c))
        .map_or(0, |(i, _)| i as u8)
}

use std::io::{Cursor, Read};

use crate::{bytes_ext::ReadBytesExt, error::Error};

/// RGBA color table, indexed by color index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pal(Vec<[u8; 4]>);

impl Pal {
    /// Reads `count` BGRA entries at `offset` and reorders them to RGBA.
    pub fn read(r: &mut Cursor<&[u8]>, offset: u32, count: u16) -> Result<Self, Error> {
        let declared = 4 * count as usize;
        let available = r.get_ref().len().saturating_sub(offset as usize);
        if available < declared {
            return Err(Error::TruncatedPalette {
                declared,
                available,
            });
        }

        r.set_position(offset as u64);
        let mut colors = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let mut bgra = [0u8; 4];
            r.read_exact(&mut bgra)?;
            colors.push([bgra[2], bgra[1], bgra[0], bgra[3]]);
        }

        Ok(Pal(colors))
    }

    /// Opaque gray ramp used for surfaces that carry no color table.
    pub fn grayscale(count: usize) -> Self {
        let step = 255 / (count.max(2) - 1);
        Pal((0..count)
            .map(|i| {
                let v = (i * step).min(255) as u8;
                [v, v, v, 255]
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn colors(&self) -> &[[u8; 4]] {
        &self.0
    }
}

/// Reads a PaletteInfo record (`colorCount:u16, reserved:u16,
/// colorsOffset:u32`) at `offset` and loads the colors it points at.
pub fn read_palette_info(r: &mut Cursor<&[u8]>, offset: u32) -> Result<Pal, Error> {
    r.set_position(offset as u64);
    let count = r.read_le_u16()?;
    let _reserved = r.read_le_u16()?;
    let colors_offset = r.read_le_u32()?;

    log::trace!("palette at {colors_offset:#x}, {count} colors");

    Pal::read(r, colors_offset, count)
}

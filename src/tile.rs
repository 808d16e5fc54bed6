//! Tile-stripe layout shared by the indexed surface formats.
//!
//! Texels are stored in tiles of 8 rows by `16 * den` columns, where `den`
//! is the number of texels packed into a byte. Tiles run left to right,
//! and each run of tiles across the surface forms one 8-row stripe.

use std::io::{Cursor, Read};

use itertools::iproduct;

use crate::{error::Error, frame::Frame, tpl::TextureSurface};

pub const STRIPE_ROWS: usize = 8;

/// Position of raster texel (`row`, `col`) in the expanded on-disk sequence.
#[inline]
pub fn tile_position(row: usize, col: usize, width: usize, den: usize) -> usize {
    let tile_width = 16 * den;
    let tile_len = 128 * den;

    (row / STRIPE_ROWS) * (width / tile_width) * tile_len
        + (row % STRIPE_ROWS) * tile_width
        + (col % tile_width)
        + (col / tile_width) * tile_len
}

/// Splits every byte into two 4-bit indices, low nibble first.
pub fn expand_nibbles(packed: &[u8]) -> Vec<u8> {
    packed.iter().flat_map(|&b| [b & 0x0f, b >> 4]).collect()
}

pub fn decode(data: &[u8], surface: &TextureSurface) -> Result<Frame, Error> {
    let den = surface
        .format
        .texels_per_byte()
        .ok_or(Error::UnsupportedFormat(surface.format.code()))?;

    let (width, height) = (surface.width, surface.height);
    let granularity = 16 * den;
    if width == 0 || height == 0 || width % granularity != 0 || height % granularity != 0 {
        return Err(Error::InvalidDimensions {
            width,
            height,
            granularity,
        });
    }

    let len = width * height / den;
    if data.len().saturating_sub(surface.data_offset as usize) < len {
        return Err(Error::TruncatedInput);
    }

    let mut stored = vec![0u8; len];
    let mut r = Cursor::new(data);
    r.set_position(surface.data_offset as u64);
    r.read_exact(&mut stored)?;

    let texels = if den == 2 {
        expand_nibbles(&stored)
    } else {
        stored
    };

    let pixels = iproduct!(0..height, 0..width)
        .map(|(row, col)| texels[tile_position(row, col, width, den)])
        .collect();

    Ok(Frame::from_indices(width, height, pixels))
}

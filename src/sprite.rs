use std::io::Cursor;

use itertools::iproduct;

use crate::{
    bytes_ext::ReadBytesExt, error::Error, frame::Frame, tile::STRIPE_ROWS, tpl::TextureSurface,
};

const SPRITE_HEADER_LEN: u32 = 8;

/// Copies a `hrle` x `vrle` rectangle from the base surface into a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DBlock {
    pub h_shift: u8,
    pub v_shift: u8,
    pub row: u16,
    pub col: u16,
    pub hrle: u8,
    pub vrle: u8,
}

impl DBlock {
    pub fn read(r: &mut Cursor<&[u8]>) -> std::io::Result<Self> {
        let h_shift = r.read_u8()?;
        let v_shift = r.read_u8()? >> 1;
        let packed = r.read_le_u16()?;
        let hrle = r.read_u8()?;
        let vrle = r.read_u8()? >> 2;

        Ok(DBlock {
            h_shift,
            v_shift,
            row: packed >> 10,
            col: packed & 0x03ff,
            hrle,
            vrle,
        })
    }

    fn right(&self) -> usize {
        self.h_shift as usize + self.hrle as usize
    }

    fn bottom(&self) -> usize {
        self.v_shift as usize + self.vrle as usize
    }
}

#[derive(Clone, Copy, Debug)]
pub struct BlockDescriptor {
    pub dblock_offset: u32,
    pub byte_len: u16,
    pub dblock_count: u8,
}

/// One animation frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompositeBlock {
    pub dblocks: Vec<DBlock>,
}

impl CompositeBlock {
    pub fn read(r: &mut Cursor<&[u8]>, desc: &BlockDescriptor) -> Result<Self, Error> {
        r.set_position(desc.dblock_offset as u64);
        let dblocks = (0..desc.dblock_count)
            .map(|_| DBlock::read(r))
            .collect::<std::io::Result<Vec<_>>>()?;

        Ok(CompositeBlock { dblocks })
    }

    pub fn canvas_size(&self) -> (usize, usize) {
        let width = self.dblocks.iter().map(DBlock::right).max().unwrap_or(0);
        let height = self.dblocks.iter().map(DBlock::bottom).max().unwrap_or(0);
        (width, height)
    }
}

pub struct SpriteSet {
    pub descriptors: Vec<BlockDescriptor>,
    /// One entry per descriptor; a frame whose DBlocks can't be read fails
    /// on its own.
    pub frames: Vec<Result<CompositeBlock, Error>>,
}

impl SpriteSet {
    pub fn read(data: &[u8], surface: &TextureSurface) -> Result<Self, Error> {
        let mut r = Cursor::new(data);
        r.set_position(surface.data_offset as u64);

        let header_len = r.read_le_u32()?;
        if header_len != SPRITE_HEADER_LEN {
            return Err(Error::CorruptSprite(format!(
                "header length {header_len}, expected {SPRITE_HEADER_LEN}"
            )));
        }
        let block_count = r.read_le_u32()? as usize;

        // Every descriptor must be present before any of them is trusted.
        let desc_end = r.position() as usize + 8 * block_count;
        if desc_end > data.len() {
            return Err(Error::TruncatedInput);
        }

        let mut descriptors = Vec::with_capacity(block_count);
        for _ in 0..block_count {
            let dblock_offset = r.read_le_u32()?;
            let _unused = r.read_u8()?;
            let byte_len = r.read_le_u16()?;
            let dblock_count = r.read_u8()?;
            log::trace!("frame at {dblock_offset:#x}: {dblock_count} dblocks, {byte_len} bytes");
            descriptors.push(BlockDescriptor {
                dblock_offset,
                byte_len,
                dblock_count,
            });
        }

        let frames = descriptors
            .iter()
            .map(|desc| CompositeBlock::read(&mut r, desc))
            .collect();

        Ok(SpriteSet {
            descriptors,
            frames,
        })
    }
}

/// Index into the raster-order base surface for texel (`x`, `y`) of `d`.
///
/// A run that passes the right edge of the base continues in the
/// neighbouring tile stripe, one stripe further down.
#[inline]
pub fn base_source_index(base_width: usize, d: &DBlock, x: usize, y: usize) -> usize {
    let col = d.col as usize % base_width;
    let mut index = d.row as usize * base_width + col + y * base_width + x;
    if x + col >= base_width {
        index += base_width * STRIPE_ROWS;
    }
    index
}

/// Builds one frame by applying its DBlocks in order onto a blank canvas.
pub fn compose(block: &CompositeBlock, base: &Frame) -> Result<Frame, Error> {
    let (width, height) = block.canvas_size();
    if width == 0 || height == 0 {
        return Err(Error::CorruptSprite("empty frame".into()));
    }
    if base.width() == 0 {
        return Err(Error::CorruptSprite("empty base surface".into()));
    }

    let mut canvas = Frame::new(width, height);
    let src = base.data();

    for (n, d) in block.dblocks.iter().enumerate() {
        for (y, x) in iproduct!(0..d.vrle as usize, 0..d.hrle as usize) {
            let src_index = base_source_index(base.width(), d, x, y);
            let dst_index = (d.v_shift as usize + y) * width + d.h_shift as usize + x;

            let c = *src.get(src_index).ok_or_else(|| {
                Error::CorruptSprite(format!(
                    "dblock {n} reads texel {src_index} of {}",
                    src.len()
                ))
            })?;
            let dst_len = canvas.data().len();
            let slot = canvas.mut_data().get_mut(dst_index).ok_or_else(|| {
                Error::CorruptSprite(format!("dblock {n} writes pixel {dst_index} of {dst_len}"))
            })?;
            *slot = c;
        }
    }

    Ok(canvas)
}

use std::io::Cursor;

use crate::{
    bytes_ext::ReadBytesExt,
    error::Error,
    pal::{read_palette_info, Pal},
};

pub const FORMAT_INDEXED4: u16 = 0x0000;
pub const FORMAT_INDEXED8: u16 = 0x0001;
pub const FORMAT_SPRITE: u16 = 0xffff;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Indexed4,
    Indexed8,
    SpriteSentinel,
    Unknown(u16),
}

impl PixelFormat {
    pub fn from_code(code: u16) -> Self {
        match code {
            FORMAT_INDEXED4 => Self::Indexed4,
            FORMAT_INDEXED8 => Self::Indexed8,
            FORMAT_SPRITE => Self::SpriteSentinel,
            other => Self::Unknown(other),
        }
    }

    pub fn code(&self) -> u16 {
        match *self {
            Self::Indexed4 => FORMAT_INDEXED4,
            Self::Indexed8 => FORMAT_INDEXED8,
            Self::SpriteSentinel => FORMAT_SPRITE,
            Self::Unknown(code) => code,
        }
    }

    /// Number of texel indices packed into one stored byte.
    pub fn texels_per_byte(&self) -> Option<usize> {
        match self {
            Self::Indexed4 => Some(2),
            Self::Indexed8 => Some(1),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TextureSurface {
    /// Position in the texture directory.
    pub index: usize,
    pub width: usize,
    pub height: usize,
    pub format: PixelFormat,
    pub data_offset: u32,
    pub palette: Option<Pal>,
}

pub struct TplFile {
    pub surfaces: Vec<TextureSurface>,
    pub sprites: Vec<TextureSurface>,
    /// Directory entries that could not be read, by directory index.
    pub failed: Vec<(usize, Error)>,
}

impl TplFile {
    pub fn parse(data: &[u8]) -> Result<TplFile, Error> {
        let mut r = Cursor::new(data);

        let texture_count = r.read_le_u32()? as usize;
        let catalog_offset = r.read_le_u32()?;

        // Every directory slot must at least be present.
        if (catalog_offset as usize).saturating_add(texture_count.saturating_mul(8)) > data.len() {
            return Err(Error::TruncatedInput);
        }

        r.set_position(catalog_offset as u64);
        let mut slots = Vec::with_capacity(texture_count);
        for _ in 0..texture_count {
            let info_offset = r.read_le_u32()?;
            let pal_info_offset = r.read_le_u32()?;
            slots.push((info_offset, pal_info_offset));
        }

        let mut surfaces = Vec::new();
        let mut sprites = Vec::new();
        let mut failed = Vec::new();

        for (index, (info_offset, pal_info_offset)) in slots.into_iter().enumerate() {
            match read_surface(&mut r, index, info_offset, pal_info_offset) {
                Ok(s) if s.format == PixelFormat::SpriteSentinel => sprites.push(s),
                Ok(s) => surfaces.push(s),
                Err(e) => {
                    log::debug!("directory entry {index}: {e}");
                    failed.push((index, e));
                }
            }
        }

        Ok(TplFile {
            surfaces,
            sprites,
            failed,
        })
    }

    /// The single surface all sprite sets copy their pixels from.
    ///
    /// This is the first ordinary surface in the directory. Sprite entries
    /// that sit on both sides of an ordinary surface hint at per-group base
    /// surfaces, and an unreadable entry in front of it leaves the base
    /// unknown; both are rejected instead of guessed at.
    pub fn base_surface(&self) -> Result<&TextureSurface, Error> {
        let base = self
            .surfaces
            .first()
            .ok_or(Error::InvalidDirectory("sprites without a base surface"))?;

        // An unreadable entry ahead of the first surface may well be the
        // real base.
        if self.failed.iter().any(|(index, _)| *index < base.index) {
            return Err(Error::InvalidDirectory("base surface entry unreadable"));
        }

        let first_sprite = self.sprites.iter().map(|s| s.index).min();
        let last_sprite = self.sprites.iter().map(|s| s.index).max();
        if let (Some(first), Some(last)) = (first_sprite, last_sprite) {
            if self
                .surfaces
                .iter()
                .any(|s| s.index > first && s.index < last)
            {
                return Err(Error::InvalidDirectory(
                    "sprite entries are split across several surfaces",
                ));
            }
        }

        Ok(base)
    }

    pub fn entry_count(&self) -> usize {
        self.surfaces.len() + self.sprites.len() + self.failed.len()
    }
}

fn read_surface(
    r: &mut Cursor<&[u8]>,
    index: usize,
    info_offset: u32,
    pal_info_offset: u32,
) -> Result<TextureSurface, Error> {
    r.set_position(info_offset as u64);
    let height = r.read_le_u16()? as usize;
    let width = r.read_le_u16()? as usize;
    let _reserved = r.read_le_u16()?;
    let format = PixelFormat::from_code(r.read_le_u16()?);
    let data_offset = r.read_le_u32()?;

    let palette = if pal_info_offset != 0 {
        Some(read_palette_info(r, pal_info_offset)?)
    } else {
        None
    };

    log::trace!(
        "entry {index}: {width}x{height} {format:?} at {data_offset:#x}, {} colors",
        palette.as_ref().map_or(0, Pal::len)
    );

    Ok(TextureSurface {
        index,
        width,
        height,
        format,
        data_offset,
        palette,
    })
}

#[cfg(test)]
pub mod test_util {
    use crate::bytes_ext::test_util::ByteWriter;

    pub enum Payload {
        Raw(Vec<u8>),
        /// DBlock records per frame.
        Sprite(Vec<Vec<[u8; 6]>>),
    }

    /// One directory entry of a synthetic TPL file.
    pub struct Entry {
        pub width: u16,
        pub height: u16,
        pub format: u16,
        pub data: Payload,
        pub palette: Option<Vec<[u8; 4]>>,
    }

    /// Lays out header, directory, then each entry's records and payload.
    pub fn build(entries: &[Entry]) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.u32(entries.len() as u32).u32(8);

        let dir_at = w.len();
        w.pad_to(dir_at + 8 * entries.len());

        for (i, e) in entries.iter().enumerate() {
            let info_at = w.len();
            w.u16(e.height).u16(e.width).u16(0).u16(e.format);
            let data_field = w.len();
            w.u32(0);

            let mut pal_info_at = 0;
            if let Some(colors) = &e.palette {
                pal_info_at = w.len();
                w.u16(colors.len() as u16).u16(0).u32(pal_info_at as u32 + 8);
                for c in colors {
                    w.u8(c[2]).u8(c[1]).u8(c[0]).u8(c[3]);
                }
            }

            let data_at = w.len();
            w.patch_u32(data_field, data_at as u32);
            match &e.data {
                Payload::Raw(bytes) => w.bytes(bytes),
                Payload::Sprite(frames) => w.bytes(&sprite_payload(data_at, frames)),
            };

            w.patch_u32(dir_at + 8 * i, info_at as u32);
            w.patch_u32(dir_at + 8 * i + 4, pal_info_at as u32);
        }

        w.0
    }

    /// `base` is the payload's absolute offset in the final file.
    fn sprite_payload(base: usize, frames: &[Vec<[u8; 6]>]) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.u32(8).u32(frames.len() as u32);

        let desc_at = w.len();
        w.pad_to(desc_at + 8 * frames.len());

        for (i, dblocks) in frames.iter().enumerate() {
            let at = w.len();
            for d in dblocks {
                w.bytes(d);
            }
            let mut desc = ByteWriter::new();
            desc.u32((base + at) as u32)
                .u8(0)
                .u16(6 * dblocks.len() as u16)
                .u8(dblocks.len() as u8);
            let slot = desc_at + 8 * i;
            w.0[slot..slot + 8].copy_from_slice(&desc.0);
        }

        w.0
    }
}

#[cfg(test)]
mod tests {
    use super::test_util::{build, Entry, Payload};
    use super::*;

    fn entry(format: u16) -> Entry {
        Entry {
            width: 16,
            height: 16,
            format,
            data: Payload::Raw(vec![0; 256]),
            palette: None,
        }
    }

    #[test]
    fn sentinel_entries_are_split_from_surfaces() {
        let data = build(&[
            Entry {
                palette: Some(vec![[1, 2, 3, 4]; 16]),
                ..entry(FORMAT_INDEXED8)
            },
            entry(FORMAT_SPRITE),
            entry(FORMAT_SPRITE),
        ]);
        let tpl = TplFile::parse(&data).unwrap();

        assert_eq!(tpl.surfaces.len(), 1);
        assert_eq!(tpl.sprites.len(), 2);
        assert_eq!(tpl.sprites[0].index, 1);
        assert_eq!(tpl.surfaces[0].format, PixelFormat::Indexed8);
        assert_eq!(tpl.surfaces[0].width, 16);
        assert_eq!(tpl.surfaces[0].palette.as_ref().unwrap().len(), 16);
        assert!(tpl.sprites[0].palette.is_none());
        assert_eq!(tpl.base_surface().unwrap().index, 0);
    }

    #[test]
    fn unknown_format_is_kept_for_decode_time() {
        let data = build(&[entry(0x0002)]);
        let tpl = TplFile::parse(&data).unwrap();
        assert_eq!(tpl.surfaces[0].format, PixelFormat::Unknown(2));
        assert_eq!(tpl.surfaces[0].format.code(), 2);
    }

    #[test]
    fn sprites_need_a_base_surface() {
        let data = build(&[entry(FORMAT_SPRITE)]);
        let tpl = TplFile::parse(&data).unwrap();
        assert!(matches!(
            tpl.base_surface(),
            Err(Error::InvalidDirectory(_))
        ));
    }

    #[test]
    fn interleaved_sprite_groups_are_rejected() {
        let data = build(&[
            entry(FORMAT_INDEXED8),
            entry(FORMAT_SPRITE),
            entry(FORMAT_INDEXED8),
            entry(FORMAT_SPRITE),
        ]);
        let tpl = TplFile::parse(&data).unwrap();
        assert!(matches!(
            tpl.base_surface(),
            Err(Error::InvalidDirectory(_))
        ));
    }

    #[test]
    fn bad_palette_only_fails_its_entry() {
        let mut data = build(&[
            Entry {
                palette: Some(vec![[0; 4]; 4]),
                ..entry(FORMAT_INDEXED8)
            },
            entry(FORMAT_INDEXED8),
        ]);
        // Bump the first entry's color count past the end of the file.
        let pal_info = u32::from_le_bytes(data[12..16].try_into().unwrap()) as usize;
        data[pal_info..pal_info + 2].copy_from_slice(&0xfff0u16.to_le_bytes());

        let tpl = TplFile::parse(&data).unwrap();
        assert_eq!(tpl.surfaces.len(), 1);
        assert_eq!(tpl.surfaces[0].index, 1);
        assert!(matches!(
            tpl.failed[0],
            (0, Error::TruncatedPalette { .. })
        ));
        assert_eq!(tpl.entry_count(), 2);
    }

    #[test]
    fn unreadable_first_surface_leaves_no_base() {
        let mut data = build(&[
            Entry {
                palette: Some(vec![[0; 4]; 4]),
                ..entry(FORMAT_INDEXED8)
            },
            entry(FORMAT_INDEXED8),
            entry(FORMAT_SPRITE),
        ]);
        let pal_info = u32::from_le_bytes(data[12..16].try_into().unwrap()) as usize;
        data[pal_info..pal_info + 2].copy_from_slice(&0xfff0u16.to_le_bytes());

        let tpl = TplFile::parse(&data).unwrap();
        assert_eq!(tpl.surfaces[0].index, 1);
        assert!(matches!(
            tpl.base_surface(),
            Err(Error::InvalidDirectory("base surface entry unreadable"))
        ));
    }

    #[test]
    fn unreadable_entry_after_base_is_harmless() {
        let mut data = build(&[
            entry(FORMAT_INDEXED8),
            Entry {
                palette: Some(vec![[0; 4]; 4]),
                ..entry(FORMAT_INDEXED8)
            },
            entry(FORMAT_SPRITE),
        ]);
        let pal_info = u32::from_le_bytes(data[20..24].try_into().unwrap()) as usize;
        data[pal_info..pal_info + 2].copy_from_slice(&0xfff0u16.to_le_bytes());

        let tpl = TplFile::parse(&data).unwrap();
        assert_eq!(tpl.failed.len(), 1);
        assert_eq!(tpl.base_surface().unwrap().index, 0);
    }

    #[test]
    fn decoded_indices_stay_inside_the_palette() {
        let data = build(&[Entry {
            width: 32,
            height: 16,
            format: FORMAT_INDEXED8,
            data: Payload::Raw((0..512).map(|i| (i * 5 % 24) as u8).collect()),
            palette: Some((0..24).map(|i| [i, i, i, 255]).collect()),
        }]);

        let tpl = TplFile::parse(&data).unwrap();
        let surface = &tpl.surfaces[0];
        let pal_len = surface.palette.as_ref().unwrap().len();
        assert_eq!(pal_len, 24);

        let frame = crate::tile::decode(&data, surface).unwrap();
        assert_eq!(frame.data().len(), 32 * 16);
        assert!(frame.data().iter().all(|&c| (c as usize) < pal_len));
    }

    #[test]
    fn short_directory_is_truncated_input() {
        let mut data = build(&[entry(FORMAT_INDEXED8)]);
        data[0..4].copy_from_slice(&1000u32.to_le_bytes());
        assert!(matches!(TplFile::parse(&data), Err(Error::TruncatedInput)));
        assert!(matches!(TplFile::parse(&[1, 0]), Err(Error::TruncatedInput)));
    }
}

use std::io::{Read, Seek, SeekFrom};

use crate::{bytes_ext::ReadBytesExt, error::Error};

use super::{read_span, Archive, ArchiveEntry};

pub const MAGIC: [u8; 4] = *b"AFS\0";

pub struct AfsFile<R> {
    reader: R,
    entries: Vec<ArchiveEntry>,
}

impl<R: Read + Seek> AfsFile<R> {
    pub fn new(mut reader: R) -> Result<Self, Error> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(Error::UnknownArchive("missing AFS magic".into()));
        }

        let file_count = reader.read_le_u32()? as usize;
        let mut spans = Vec::new();
        for _ in 0..file_count {
            let offset = reader.read_le_u32()? as usize;
            let size = reader.read_le_u32()? as usize;
            spans.push((offset, size));
        }

        let names_offset = reader.read_le_u32()?;
        let _names_len = reader.read_le_u32()?;

        reader.seek(SeekFrom::Start(names_offset as u64))?;
        let mut entries = Vec::new();
        for (offset, size) in spans {
            let name = reader.read_fixed_str(32)?;
            let mut _unknown = [0u8; 16];
            reader.read_exact(&mut _unknown)?;

            entries.push(ArchiveEntry {
                name,
                offset,
                size,
                packed_size: None,
            });
        }

        Ok(AfsFile { reader, entries })
    }
}

impl<R: Read + Seek> Archive for AfsFile<R> {
    fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    fn read_at(&mut self, offset: usize, len: usize) -> Result<Vec<u8>, Error> {
        read_span(&mut self.reader, offset, len)
    }
}

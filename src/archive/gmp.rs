use std::io::{Read, Seek, SeekFrom};

use crate::{bytes_ext::ReadBytesExt, error::Error};

use super::{read_span, Archive, ArchiveEntry};

const DESCRIPTOR_LEN: u64 = 32;

pub struct GmpFile<R> {
    reader: R,
    entries: Vec<ArchiveEntry>,
}

impl<R: Read + Seek> GmpFile<R> {
    pub fn new(mut reader: R) -> Result<Self, Error> {
        let file_count = reader.read_le_u32()? as usize;
        let descriptor_offset = reader.read_le_u32()? as u64;
        let unknown0 = reader.read_le_u32()?;
        let unknown1 = reader.read_le_u32()?;
        log::trace!("gmp: {file_count} files, unknowns {unknown0:08x} {unknown1:08x}");

        let mut entries = Vec::new();
        for i in 0..file_count {
            reader.seek(SeekFrom::Start(descriptor_offset + i as u64 * DESCRIPTOR_LEN))?;

            let mut name = reader.read_fixed_str(20)?;
            if name.is_empty() {
                name = format!("f{i}");
            }
            let size = reader.read_le_u32()? as usize;
            let offset = reader.read_le_u32()? as usize;
            let _unknown = reader.read_le_u32()?;

            entries.push(ArchiveEntry {
                name,
                offset,
                size,
                packed_size: None,
            });
        }

        Ok(GmpFile { reader, entries })
    }
}

impl<R: Read + Seek> Archive for GmpFile<R> {
    fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    fn read_at(&mut self, offset: usize, len: usize) -> Result<Vec<u8>, Error> {
        read_span(&mut self.reader, offset, len)
    }
}

use std::io::{Read, Seek, SeekFrom};

use flate2::read::ZlibDecoder;

use crate::{bytes_ext::ReadBytesExt, error::Error};

use super::{read_span, Archive, ArchiveEntry};

const INFO_LEN: u64 = 16;

pub struct DarFile<R> {
    reader: R,
    entries: Vec<ArchiveEntry>,
}

impl<R: Read + Seek> DarFile<R> {
    pub fn new(mut reader: R) -> Result<Self, Error> {
        let file_count = reader.read_le_u32()? as usize;
        let _data_offset = reader.read_le_u32()?;
        let _names_offset = reader.read_le_u32()?;
        let info_offset = reader.read_le_u32()? as u64;

        let mut entries = Vec::new();
        for i in 0..file_count {
            reader.seek(SeekFrom::Start(info_offset + i as u64 * INFO_LEN))?;
            let name_offset = reader.read_le_u32()?;
            let packed_size = reader.read_le_u32()? as usize;
            let size = reader.read_le_u32()? as usize;
            let offset = reader.read_le_u32()? as usize;

            reader.seek(SeekFrom::Start(name_offset as u64))?;
            let name = reader.read_c_str()?;

            entries.push(ArchiveEntry {
                name,
                offset,
                size,
                packed_size: (packed_size != 0).then_some(packed_size),
            });
        }

        Ok(DarFile { reader, entries })
    }
}

impl<R: Read + Seek> Archive for DarFile<R> {
    fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    fn read_at(&mut self, offset: usize, len: usize) -> Result<Vec<u8>, Error> {
        read_span(&mut self.reader, offset, len)
    }

    fn read(&mut self, entry: &ArchiveEntry) -> Result<Vec<u8>, Error> {
        let Some(packed_size) = entry.packed_size else {
            return self.read_at(entry.offset, entry.size);
        };

        let packed = self.read_at(entry.offset, packed_size)?;
        let mut data = Vec::new();
        match ZlibDecoder::new(packed.as_slice()).read_to_end(&mut data) {
            Ok(_) => Ok(data),
            Err(e) => {
                log::warn!(
                    "`{}` looks compressed but failed to inflate ({e}), keeping stored bytes",
                    entry.name
                );
                Ok(packed)
            }
        }
    }
}

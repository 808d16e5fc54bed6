//! Container archives that carry TPL files and other assets.

use std::{
    fs::File,
    io::{BufReader, Read, Seek, SeekFrom},
    path::Path,
};

use crate::error::Error;

pub mod afs;
pub mod dar;
pub mod gmp;

pub use afs::AfsFile;
pub use dar::DarFile;
pub use gmp::GmpFile;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub offset: usize,
    /// Size of the entry's contents once read.
    pub size: usize,
    /// Stored size when the entry is compressed.
    pub packed_size: Option<usize>,
}

pub trait Archive {
    fn entries(&self) -> &[ArchiveEntry];

    fn read_at(&mut self, offset: usize, len: usize) -> Result<Vec<u8>, Error>;

    fn read(&mut self, entry: &ArchiveEntry) -> Result<Vec<u8>, Error> {
        self.read_at(entry.offset, entry.size)
    }

    fn find(&self, name: &str) -> Option<&ArchiveEntry> {
        self.entries().iter().find(|e| e.name == name)
    }

    fn read_named(&mut self, name: &str) -> Result<Vec<u8>, Error> {
        let entry = self
            .find(name)
            .cloned()
            .ok_or_else(|| Error::EntryNotFound(name.to_string()))?;
        self.read(&entry)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ArchiveKind {
    Afs,
    Dar,
    Gmp,
}

impl ArchiveKind {
    /// AFS files carry a magic; the others are told apart by extension.
    pub fn detect(path: &Path, head: &[u8]) -> Option<Self> {
        if head.starts_with(&afs::MAGIC) {
            return Some(Self::Afs);
        }

        let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
        match ext.as_str() {
            "afs" => Some(Self::Afs),
            "dar" => Some(Self::Dar),
            "gmp" => Some(Self::Gmp),
            _ => None,
        }
    }
}

pub fn open(path: &Path, kind: Option<ArchiveKind>) -> Result<Box<dyn Archive>, Error> {
    let mut reader = BufReader::new(File::open(path)?);

    let kind = match kind {
        Some(k) => k,
        None => {
            let mut head = Vec::with_capacity(4);
            (&mut reader).take(4).read_to_end(&mut head)?;
            reader.seek(SeekFrom::Start(0))?;
            ArchiveKind::detect(path, &head)
                .ok_or_else(|| Error::UnknownArchive(path.display().to_string()))?
        }
    };

    log::debug!("opening `{}` as {kind:?}", path.display());

    Ok(match kind {
        ArchiveKind::Afs => Box::new(AfsFile::new(reader)?),
        ArchiveKind::Dar => Box::new(DarFile::new(reader)?),
        ArchiveKind::Gmp => Box::new(GmpFile::new(reader)?),
    })
}

pub(crate) fn read_span<R: Read + Seek>(
    reader: &mut R,
    offset: usize,
    len: usize,
) -> Result<Vec<u8>, Error> {
    reader.seek(SeekFrom::Start(offset as u64))?;

    let mut data = Vec::new();
    reader.by_ref().take(len as u64).read_to_end(&mut data)?;
    if data.len() < len {
        return Err(Error::TruncatedInput);
    }

    Ok(data)
}

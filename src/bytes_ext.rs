pub trait ReadBytesExt: std::io::Read {
    #[inline]
    fn read_u8(&mut self) -> std::io::Result<u8> {
        let mut buf = [0; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    #[inline]
    fn read_le_u16(&mut self) -> std::io::Result<u16> {
        let mut buf = [0; 2];
        self.read_exact(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    #[inline]
    fn read_le_u32(&mut self) -> std::io::Result<u32> {
        let mut buf = [0; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn read_fixed_str(&mut self, len: usize) -> std::io::Result<String> {
        let mut buf = vec![0; len];
        self.read_exact(&mut buf)?;

        let end = buf.iter().position(|&c| c == 0).unwrap_or(len);
        Ok(String::from_utf8_lossy(&buf[..end]).into_owned())
    }

    /// Reads up to and including a NUL byte, or to end of input.
    fn read_c_str(&mut self) -> std::io::Result<String> {
        let mut buf = Vec::new();
        loop {
            let mut c = [0; 1];
            if self.read(&mut c)? == 0 || c[0] == 0 {
                break;
            }
            buf.push(c[0]);
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl<R: std::io::Read> ReadBytesExt for R {}

#[cfg(test)]
pub mod test_util {
    /// Little-endian byte buffer builder for synthetic archives.
    #[derive(Default)]
    pub struct ByteWriter(pub Vec<u8>);

    impl ByteWriter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn u8(&mut self, v: u8) -> &mut Self {
            self.0.push(v);
            self
        }

        pub fn u16(&mut self, v: u16) -> &mut Self {
            self.0.extend_from_slice(&v.to_le_bytes());
            self
        }

        pub fn u32(&mut self, v: u32) -> &mut Self {
            self.0.extend_from_slice(&v.to_le_bytes());
            self
        }

        pub fn bytes(&mut self, v: &[u8]) -> &mut Self {
            self.0.extend_from_slice(v);
            self
        }

        pub fn pad_to(&mut self, len: usize) -> &mut Self {
            self.0.resize(len, 0);
            self
        }

        pub fn len(&self) -> usize {
            self.0.len()
        }

        pub fn patch_u32(&mut self, at: usize, v: u32) -> &mut Self {
            self.0[at..at + 4].copy_from_slice(&v.to_le_bytes());
            self
        }
    }
}

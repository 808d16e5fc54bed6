use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use crate::{error::Error, pal::Pal};

/// Raster-order palette indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl Frame {
    pub fn new(width: usize, height: usize) -> Self {
        let data = vec![0u8; width * height];
        Self {
            data,
            width,
            height,
        }
    }

    pub fn from_indices(width: usize, height: usize, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            data,
            width,
            height,
        }
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    pub fn mut_data(&mut self) -> &mut [u8] {
        self.data.as_mut_slice()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Encodes the frame as an 8-bit indexed PNG.
    ///
    /// Indices past the end of `pal` come out fully transparent.
    pub fn write_png<W: Write>(&self, w: W, pal: &Pal) -> Result<(), Error> {
        let used = self.data.iter().copied().max().map_or(1, |m| m as usize + 1);
        let entries = used.max(pal.len()).min(256);

        let mut rgb = Vec::with_capacity(3 * entries);
        let mut alpha = Vec::with_capacity(entries);
        for i in 0..entries {
            let [r, g, b, a] = pal.colors().get(i).copied().unwrap_or([0, 0, 0, 0]);
            rgb.extend_from_slice(&[r, g, b]);
            alpha.push(a);
        }

        let mut encoder = png::Encoder::new(w, self.width as u32, self.height as u32);
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_palette(rgb);
        if alpha.iter().any(|&a| a != 255) {
            encoder.set_trns(alpha);
        }

        let mut writer = encoder.write_header()?;
        writer.write_image_data(&self.data)?;

        Ok(())
    }
}

/// Destination for decoded palette-indexed images.
pub trait ImageSink {
    fn write_indexed(&mut self, name: &str, frame: &Frame, pal: &Pal) -> Result<(), Error>;
}

/// Writes `{name}.png` files into a directory.
pub struct PngDir {
    dir: PathBuf,
}

impl PngDir {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, Error> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }
}

impl ImageSink for PngDir {
    fn write_indexed(&mut self, name: &str, frame: &Frame, pal: &Pal) -> Result<(), Error> {
        let path = self.dir.join(format!("{name}.png"));
        let file = File::create(&path)?;
        let mut w = BufWriter::new(file);
        frame.write_png(&mut w, pal)?;
        w.flush()?;

        log::debug!(
            "wrote `{}` ({}x{})",
            path.display(),
            frame.width(),
            frame.height()
        );
        Ok(())
    }
}

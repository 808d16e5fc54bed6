use std::{fs::File, io::Write, path::PathBuf};

use crate::{
    archive::Archive,
    error::Error,
    frame::{Frame, ImageSink},
    pal::Pal,
    sprite::{compose, SpriteSet},
    tile,
    tpl::{PixelFormat, TextureSurface, TplFile},
};

/// Settings handed to every extraction call.
#[derive(Clone, Debug)]
pub struct ExtractOptions {
    pub output_dir: PathBuf,
    pub verbose: bool,
}

#[derive(Debug, Default)]
pub struct ExtractReport {
    pub written: usize,
    pub failures: Vec<(String, Error)>,
}

impl ExtractReport {
    fn record(&mut self, name: String, result: Result<(), Error>, options: &ExtractOptions) {
        match result {
            Ok(()) => {
                if options.verbose {
                    log::info!("Extracted `{name}`");
                }
                self.written += 1;
            }
            Err(e) => {
                log::warn!("Skipping `{name}`: {e}");
                self.failures.push((name, e));
            }
        }
    }
}

fn surface_palette(surface: &TextureSurface) -> Pal {
    match (&surface.palette, surface.format) {
        (Some(pal), _) => pal.clone(),
        (None, PixelFormat::Indexed4) => Pal::grayscale(16),
        (None, _) => Pal::grayscale(256),
    }
}

/// Resolves the base surface shared by every sprite set and decodes it,
/// reusing the decode from the surface pass when there was one.
///
/// A failure is returned afresh on every call so each sprite set can
/// report it.
fn sprite_base<'a>(
    tpl: &TplFile,
    data: &[u8],
    first_decoded: &'a mut Option<Frame>,
) -> Result<(&'a Frame, Pal), Error> {
    let surface = tpl.base_surface()?;
    let frame = match first_decoded.take() {
        Some(frame) => frame,
        None => tile::decode(data, surface)?,
    };
    Ok((first_decoded.insert(frame), surface_palette(surface)))
}

/// Decodes every surface and sprite frame of a TPL file into `sink`.
///
/// Failures are per image: one bad surface or frame is reported and the
/// rest are still written.
pub fn extract_textures(
    data: &[u8],
    stem: &str,
    options: &ExtractOptions,
    sink: &mut dyn ImageSink,
) -> Result<ExtractReport, Error> {
    let tpl = TplFile::parse(data)?;
    let mut report = ExtractReport::default();

    if options.verbose {
        log::info!(
            "`{stem}`: {} surfaces, {} sprite sets",
            tpl.surfaces.len(),
            tpl.sprites.len()
        );
    }

    let mut first_decoded: Option<Frame> = None;
    for (i, surface) in tpl.surfaces.iter().enumerate() {
        let name = format!("{stem}-{:03}", surface.index);
        let result = tile::decode(data, surface).and_then(|frame| {
            sink.write_indexed(&name, &frame, &surface_palette(surface))?;
            if i == 0 {
                first_decoded = Some(frame);
            }
            Ok(())
        });
        report.record(name, result, options);
    }

    for (set_index, sentinel) in tpl.sprites.iter().enumerate() {
        let set_name = format!("{stem}-sprite{set_index:02}");
        let set = sprite_base(&tpl, data, &mut first_decoded)
            .and_then(|base| Ok((base, SpriteSet::read(data, sentinel)?)));
        let ((base_frame, pal), set) = match set {
            Ok(v) => v,
            Err(e) => {
                report.record(set_name, Err(e), options);
                continue;
            }
        };

        for (frame_index, block) in set.frames.into_iter().enumerate() {
            let name = format!("{set_name}-{frame_index:03}");
            let result = block
                .and_then(|block| compose(&block, base_frame))
                .and_then(|frame| sink.write_indexed(&name, &frame, &pal));
            report.record(name, result, options);
        }
    }

    for (index, e) in tpl.failed {
        report.record(format!("{stem}-{index:03}"), Err(e), options);
    }

    Ok(report)
}

/// Copies every entry of a container out as `{offset:08X}_{name}`.
pub fn extract_archive(
    archive: &mut dyn Archive,
    options: &ExtractOptions,
) -> Result<ExtractReport, Error> {
    std::fs::create_dir_all(&options.output_dir)?;

    let entries = archive.entries().to_vec();
    let mut report = ExtractReport::default();
    for entry in entries.iter() {
        let name = format!("{:08X}_{}", entry.offset, entry.name);
        let path = options.output_dir.join(&name);
        let result = archive.read(entry).and_then(|data| {
            let mut f = File::create(&path)?;
            f.write_all(data.as_slice())?;
            Ok(())
        });
        report.record(name, result, options);
    }

    Ok(report)
}

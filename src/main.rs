mod archive;
mod bytes_ext;
mod error;
mod extract;
mod frame;
mod pal;
mod sprite;
mod tile;
mod tpl;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use itertools::Itertools;

use crate::{
    archive::{Archive, ArchiveKind},
    error::Error,
    extract::{ExtractOptions, ExtractReport},
    frame::PngDir,
    tpl::{PixelFormat, TplFile},
};

#[derive(Debug, Parser)]
#[command(name = "tpl-extract")]
struct Cli {
    /// Directory extracted files are written to
    #[arg(short, long, global = true, default_value = ".")]
    output: PathBuf,
    /// Log every extracted file
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the contents of an AFS, DAR or GMP archive
    List {
        archive: PathBuf,
        #[arg(long, value_enum)]
        kind: Option<ArchiveKind>,
    },
    /// Extracts every entry of an archive without decoding
    Extract {
        archive: PathBuf,
        #[arg(long, value_enum)]
        kind: Option<ArchiveKind>,
    },
    /// Prints the texture directory of a TPL file
    Info { tpl: PathBuf },
    /// Decodes surfaces and sprite frames of a TPL file to PNG
    #[command(arg_required_else_help = true)]
    ExtractTextures {
        /// A TPL file, or an archive when `--entry` is given
        path: PathBuf,
        /// Name of the TPL entry inside the archive
        #[arg(long)]
        entry: Option<String>,
        #[arg(long, value_enum)]
        kind: Option<ArchiveKind>,
    },
}

fn list(archive: &dyn Archive) {
    println!("+----------------------------------+------------+------------+");
    println!("| name                             |     offset |       size |");
    println!("+----------------------------------+------------+------------+");
    for e in archive.entries().iter() {
        println!("| {:32} | {:-10} | {:-10} |", e.name, e.offset, e.size);
    }
    println!("+----------------------------------+------------+------------+");
}

fn info(tpl: &TplFile) {
    println!("{} entries", tpl.entry_count());
    println!("+-------+-----------+-----------+------------+--------+");
    println!("| entry |  format   |      size |     offset | colors |");
    println!("+-------+-----------+-----------+------------+--------+");
    let rows = tpl
        .surfaces
        .iter()
        .chain(tpl.sprites.iter())
        .sorted_by_key(|s| s.index);
    for s in rows {
        let format = match s.format {
            PixelFormat::Indexed4 => "4bpp".to_string(),
            PixelFormat::Indexed8 => "8bpp".to_string(),
            PixelFormat::SpriteSentinel => "sprite".to_string(),
            PixelFormat::Unknown(code) => format!("{code:#06x}"),
        };
        println!(
            "| {:5} | {:9} | {:>9} | {:#010x} | {:6} |",
            s.index,
            format,
            format!("{}x{}", s.width, s.height),
            s.data_offset,
            s.palette.as_ref().map_or(0, |p| p.len())
        );
    }
    println!("+-------+-----------+-----------+------------+--------+");
    for (index, e) in &tpl.failed {
        println!("entry {index}: {e}");
    }
}

fn extract_textures(
    path: &Path,
    entry: Option<&str>,
    kind: Option<ArchiveKind>,
    options: &ExtractOptions,
) -> Result<ExtractReport, Error> {
    let (data, name) = match entry {
        Some(name) => {
            let mut archive = archive::open(path, kind)?;
            (archive.read_named(name)?, name.to_string())
        }
        None => (std::fs::read(path)?, path.display().to_string()),
    };

    let stem = Path::new(&name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "TEXTURE".into());

    if options.verbose {
        log::info!("Extracting textures from `{name}`");
    }

    let mut sink = PngDir::new(&options.output_dir)?;
    extract::extract_textures(&data, &stem, options, &mut sink)
}

fn summarize(report: &ExtractReport) {
    println!(
        "Extracted {} files, {} failed",
        report.written,
        report.failures.len()
    );
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let options = ExtractOptions {
        output_dir: cli.output.clone(),
        verbose: cli.verbose,
    };

    match &cli.command {
        Commands::List { archive: path, kind } => {
            let archive = archive::open(path, *kind)?;
            list(archive.as_ref());
        }
        Commands::Extract { archive: path, kind } => {
            let mut archive = archive::open(path, *kind)?;
            let report = extract::extract_archive(archive.as_mut(), &options)?;
            summarize(&report);
        }
        Commands::Info { tpl } => {
            let data = std::fs::read(tpl)?;
            info(&TplFile::parse(&data)?);
        }
        Commands::ExtractTextures { path, entry, kind } => {
            let report = extract_textures(path, entry.as_deref(), *kind, &options)?;
            summarize(&report);
        }
    }
    Ok(())
}

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::{ArgAction, ArgGroup, Parser, ValueEnum};
use publistalib::{build_all, AttachmentProbe, Config, Error, Layout, OutputFormat, Result, Source};
use tracing::{debug, info};

#[derive(Debug, Parser)]
#[command(
    name = "publista",
    version,
    about = "Regenerate a publication listing from BibTeX sources"
)]
#[command(group(ArgGroup::new("outputs").required(true).multiple(true).args(["output", "emit"])))]
pub struct Cli {
    /// BibTeX files, or directories whose `*.bib` files are read in path order
    #[arg(required = true)]
    pub sources: Vec<PathBuf>,

    /// Destination file, overwritten on success
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Format written to `--output`
    #[arg(short, long, value_enum, default_value_t = Format::Html)]
    pub format: Format,

    /// Additional output as FORMAT=PATH, e.g. `tsv=pubs.tsv`; repeatable
    #[arg(long, value_name = "FORMAT=PATH", value_parser = parse_emit)]
    pub emit: Vec<Emit>,

    /// Emit the bare listing blocks instead of a page grouped by section
    #[arg(long)]
    pub flat: bool,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Overrides `attachment_dir` from the configuration
    #[arg(long)]
    pub attachment_dir: Option<String>,

    /// Directory the attachment paths are resolved against
    #[arg(long, default_value = ".")]
    pub site_root: PathBuf,

    /// More output per occurrence (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only report errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Html,
    Text,
    Bib,
    Tsv,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Html => OutputFormat::Html,
            Format::Text => OutputFormat::Text,
            Format::Bib => OutputFormat::Bib,
            Format::Tsv => OutputFormat::Tsv,
        }
    }
}

/// One requested output document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emit {
    pub format: Format,
    pub path: PathBuf,
}

fn parse_emit(s: &str) -> std::result::Result<Emit, String> {
    let (format, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FORMAT=PATH, got '{s}'"))?;
    let format = <Format as ValueEnum>::from_str(format, true)?;
    if path.is_empty() {
        return Err(format!("missing path for '{format:?}' output"));
    }
    Ok(Emit {
        format,
        path: PathBuf::from(path),
    })
}

impl Cli {
    /// `--output` first, then every `--emit` in the order given.
    pub fn targets(&self) -> Vec<Emit> {
        self.output
            .iter()
            .map(|path| Emit {
                format: self.format,
                path: path.clone(),
            })
            .chain(self.emit.iter().cloned())
            .collect()
    }
}

/// Looks attachments up on disk below `root`.
#[derive(Debug, Clone)]
pub struct FsProbe {
    root: PathBuf,
}

impl FsProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsProbe { root: root.into() }
    }
}

impl AttachmentProbe for FsProbe {
    fn exists(&self, path: &str) -> bool {
        self.root.join(path).is_file()
    }
}

fn read_source(path: &Path) -> Result<Source> {
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    debug!(path = %path.display(), bytes = text.len(), "read source");
    Ok(Source::new(path.display().to_string(), text))
}

/// The `*.bib` files among a directory listing, sorted. A failed listing
/// entry fails the whole directory.
fn bib_files<I>(dir: &Path, listing: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator<Item = io::Result<PathBuf>>,
{
    let mut files = Vec::new();
    for entry in listing {
        let file = entry.map_err(|e| Error::io(dir, e))?;
        if file.is_file() && file.extension().is_some_and(|ext| ext == "bib") {
            files.push(file);
        }
    }
    files.sort();
    Ok(files)
}

/// Files as given; directories expand to their `*.bib` files, sorted.
pub fn collect_sources(paths: &[PathBuf]) -> Result<Vec<Source>> {
    let mut sources = Vec::new();
    for path in paths {
        if path.is_dir() {
            let listing = fs::read_dir(path).map_err(|e| Error::io(path, e))?;
            let files = bib_files(path, listing.map(|entry| entry.map(|e| e.path())))?;
            for file in files {
                sources.push(read_source(&file)?);
            }
        } else {
            sources.push(read_source(path)?);
        }
    }
    Ok(sources)
}

pub fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
            Config::from_toml(&text)?
        }
        None => Config::default(),
    };
    if let Some(dir) = &cli.attachment_dir {
        config.attachment_dir = dir.clone();
    }
    Ok(config)
}

pub fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let sources = collect_sources(&cli.sources)?;
    info!(sources = sources.len(), "read bibliography sources");

    let layout = if cli.flat { Layout::Flat } else { Layout::Page };
    let probe = FsProbe::new(&cli.site_root);
    let targets = cli.targets();
    let formats: Vec<OutputFormat> = targets.iter().map(|t| t.format.into()).collect();
    let outputs = build_all(&sources, &config, &probe, &formats, layout)?;

    for (target, out) in targets.iter().zip(outputs) {
        fs::write(&target.path, out).map_err(|e| Error::io(&target.path, e))?;
        info!(output = %target.path.display(), format = ?target.format, "wrote output");
    }
    Ok(())
}

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use x3db_codecs::DEFAULT_TOLERANCE;
use x3db_core::format::FLAG_HAS_CHECKSUM;
use x3db_core::{Attribute, AttributeValue, DocumentHandler, Name, ParseError, TypedArray};
use x3db_scene::x3d_vocabulary;
use x3db_scene::{ContainerCodec, ContainerConfig, SceneNode, DEFAULT_BUFFER_SIZE};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "x3db",
    about = "X3DB binary scene codec: encode, decode, and inspect compressed X3D scenes",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a JSON scene tree into an X3DB document
    Encode {
        /// Source scene as JSON ("-" reads stdin)
        input: PathBuf,
        /// Destination X3DB file
        output: PathBuf,
        /// Absolute error allowed for float arrays
        #[arg(short, long, default_value_t = DEFAULT_TOLERANCE)]
        tolerance: f32,
        /// Omit the xxh3 checksum trailer
        #[arg(long)]
        no_checksum: bool,
        /// Declare the legacy vocabulary URI for older readers
        #[arg(long)]
        legacy_uri: bool,
    },
    /// Decode an X3DB document into a JSON scene tree
    Decode {
        /// Source X3DB file
        input: PathBuf,
        /// Destination JSON file ("-" writes to stdout)
        output: PathBuf,
        /// Input buffer in bytes
        #[arg(short, long, default_value_t = DEFAULT_BUFFER_SIZE)]
        buffer_size: usize,
        /// Write JSON without indentation
        #[arg(long)]
        compact: bool,
    },
    /// Print header metadata and content statistics
    Inspect {
        /// X3DB file to inspect
        file: PathBuf,
        /// Print the per-element histogram
        #[arg(long)]
        elements: bool,
    },
    /// List the built-in X3D vocabulary
    Vocab {
        /// Which table to list
        #[arg(short, long, value_enum, default_value_t = Table::Elements)]
        table: Table,
        /// Include reserved placeholder slots
        #[arg(long)]
        reserved: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Table {
    Elements,
    Attributes,
    Values,
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

fn is_stdio(path: &Path) -> bool {
    path.to_str() == Some("-")
}

fn url_of(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// Content statistics gathered while streaming a document.
#[derive(Default)]
struct Stats {
    histogram: BTreeMap<String, u64>,
    elements: u64,
    literal_names: u64,
    attributes: u64,
    int_arrays: u64,
    int_values: u64,
    float_arrays: u64,
    float_values: u64,
    text_bytes: u64,
    depth: usize,
    max_depth: usize,
}

impl DocumentHandler for Stats {
    fn start_element(&mut self, name: Name<'_>, attributes: &[Attribute<'_>]) -> Result<(), ParseError> {
        self.elements += 1;
        *self.histogram.entry(name.local.to_owned()).or_default() += 1;
        self.literal_names += u64::from(name.index.is_none());
        for attr in attributes {
            self.attributes += 1;
            self.literal_names += u64::from(attr.name.index.is_none());
            match &attr.value {
                AttributeValue::Array(TypedArray::Int32(v)) => {
                    self.int_arrays += 1;
                    self.int_values += v.len() as u64;
                }
                AttributeValue::Array(TypedArray::Float32(v)) => {
                    self.float_arrays += 1;
                    self.float_values += v.len() as u64;
                }
                AttributeValue::Text(_) | AttributeValue::Boolean(_) => {}
            }
        }
        self.depth += 1;
        self.max_depth = self.max_depth.max(self.depth);
        Ok(())
    }

    fn characters(&mut self, text: &str) -> Result<(), ParseError> {
        self.text_bytes += text.len() as u64;
        Ok(())
    }

    fn end_element(&mut self, _name: Name<'_>) -> Result<(), ParseError> {
        self.depth -= 1;
        Ok(())
    }
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn run_encode(
    input: PathBuf,
    output: PathBuf,
    tolerance: f32,
    no_checksum: bool,
    legacy_uri: bool,
) -> anyhow::Result<()> {
    let t0 = Instant::now();
    let json_size: u64;
    let scene: SceneNode = if is_stdio(&input) {
        let mut buf = Vec::new();
        io::stdin().lock().read_to_end(&mut buf)?;
        json_size = buf.len() as u64;
        serde_json::from_slice(&buf).context("parsing scene JSON from stdin")?
    } else {
        let file = File::open(&input).with_context(|| format!("opening input file {:?}", input))?;
        json_size = file.metadata()?.len();
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing scene JSON {:?}", input))?
    };

    let codec = ContainerCodec::initialized(ContainerConfig {
        float_tolerance: tolerance,
        checksum: !no_checksum,
        legacy_uri,
        ..ContainerConfig::default()
    })?;
    let file = File::create(&output).with_context(|| format!("creating output file {:?}", output))?;
    let mut out = codec
        .encode_scene(&scene, BufWriter::new(file))
        .with_context(|| format!("encoding scene into {:?}", output))?;
    out.flush()?;
    drop(out);

    let elapsed = t0.elapsed();
    let encoded = std::fs::metadata(&output)?.len();
    info!(output = %output.display(), bytes = encoded, "scene encoded");

    eprintln!("  nodes       : {}", scene.node_count());
    eprintln!("  tolerance   : {:e}", tolerance);
    eprintln!("  json size   : {}", human_bytes(json_size));
    eprintln!("  encoded     : {}", human_bytes(encoded));
    eprintln!("  ratio       : {:.2}x", json_size as f64 / encoded.max(1) as f64);
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_decode(input: PathBuf, output: PathBuf, buffer_size: usize, compact: bool) -> anyhow::Result<()> {
    let mut codec = ContainerCodec::initialized(ContainerConfig {
        buffer_size,
        ..ContainerConfig::default()
    })?;
    let file = File::open(&input).with_context(|| format!("opening input file {:?}", input))?;
    let encoded = file.metadata()?.len();

    let url = url_of(&input);
    let t0 = Instant::now();
    let scene = codec.decode_scene(file, Some(url.as_str()))?;
    let elapsed = t0.elapsed();

    let mut dst: Box<dyn Write> = if is_stdio(&output) {
        Box::new(io::stdout().lock())
    } else {
        Box::new(BufWriter::new(
            File::create(&output).with_context(|| format!("creating output file {:?}", output))?,
        ))
    };
    if compact {
        serde_json::to_writer(&mut dst, &scene)?;
    } else {
        serde_json::to_writer_pretty(&mut dst, &scene)?;
    }
    writeln!(dst)?;
    dst.flush()?;

    eprintln!("  nodes       : {}", scene.node_count());
    eprintln!("  encoded     : {}", human_bytes(encoded));
    eprintln!(
        "  throughput  : {}/s",
        human_bytes((encoded as f64 / elapsed.as_secs_f64().max(1e-9)) as u64)
    );
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_inspect(file: PathBuf, show_elements: bool) -> anyhow::Result<()> {
    let mut codec = ContainerCodec::initialized(ContainerConfig::default())?;
    let src = File::open(&file).with_context(|| format!("opening {:?}", file))?;
    let file_size = src.metadata()?.len();

    let url = url_of(&file);
    let mut stats = Stats::default();
    let header = codec.parse_scene(src, Some(url.as_str()), &mut stats)?;

    println!("=== X3DB File: {:?} ===", file);
    println!();
    println!("  format version : {}", header.version);
    println!("  checksum       : {}", header.has_flag(FLAG_HAS_CHECKSUM));
    println!(
        "  vocabulary     : {}",
        if header.vocabulary_uri.is_empty() { "(none)" } else { header.vocabulary_uri.as_str() }
    );
    for (i, uri) in header.algorithms.iter().enumerate() {
        println!("  algorithm {:<4} : {}", i, uri);
    }
    println!("  file size      : {}", human_bytes(file_size));
    println!("  elements       : {}", stats.elements);
    println!("  max depth      : {}", stats.max_depth);
    println!("  attributes     : {}", stats.attributes);
    println!("  literal names  : {}", stats.literal_names);
    println!("  int arrays     : {} ({} values)", stats.int_arrays, stats.int_values);
    println!("  float arrays   : {} ({} values)", stats.float_arrays, stats.float_values);
    println!("  text           : {}", human_bytes(stats.text_bytes));

    if show_elements {
        let mut rows: Vec<(&String, &u64)> = stats.histogram.iter().collect();
        rows.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        println!();
        println!("  {:<32}  {:>10}", "element", "count");
        println!("  {}", "-".repeat(44));
        for (name, count) in rows {
            println!("  {:<32}  {:>10}", name, count);
        }
    }
    Ok(())
}

fn run_vocab(table: Table, reserved: bool) -> anyhow::Result<()> {
    let vocabulary = x3d_vocabulary::shared()?;
    let names = match table {
        Table::Elements => vocabulary.elements(),
        Table::Attributes => vocabulary.attributes(),
        Table::Values => vocabulary.values(),
    };
    let mut out = io::stdout().lock();
    for (index, name) in names.iter() {
        if reserved || !names.is_reserved(index) {
            writeln!(out, "{:>5}  {}", index, name)?;
        }
    }
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Encode {
            input,
            output,
            tolerance,
            no_checksum,
            legacy_uri,
        } => run_encode(input, output, tolerance, no_checksum, legacy_uri),
        Commands::Decode {
            input,
            output,
            buffer_size,
            compact,
        } => run_decode(input, output, buffer_size, compact),
        Commands::Inspect { file, elements } => run_inspect(file, elements),
        Commands::Vocab { table, reserved } => run_vocab(table, reserved),
    }
}

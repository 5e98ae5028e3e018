use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use topocodec::io_utils::{codec_cli_error, io_cli_error, simple_cli_error, CliError};
use topocodec::logging::setup_logging;
use topocodec::{
    decode_persistence_index, read_segmentation_header, read_segmentation_with_limit,
    write_segmentation, Config, Constraint, PersistenceIndex, PersistenceMapping, WordReader,
    WordWriter,
};
use tracing::info;

/// Pack and inspect segmentations and persistence indices.
#[derive(Parser)]
#[command(name = "topocodec")]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log at debug level
    #[arg(long, short, global = true)]
    verbose: bool,
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pack a CSV of segment ids (one per record) into a segmentation file
    Pack {
        input: PathBuf,
        output: PathBuf,
        /// Number of segments the ids are drawn from
        #[arg(long)]
        segments: u64,
    },
    /// Unpack a segmentation file into a CSV of segment ids
    Unpack { input: PathBuf, output: PathBuf },
    /// Print the header of a segmentation file
    Inspect {
        input: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Pack mapping (vertex,value) and constraint (vertex,value,kind) CSVs
    PackIndex {
        mapping: PathBuf,
        constraints: PathBuf,
        output: PathBuf,
    },
    /// Unpack a persistence index into mapping and constraint CSVs
    UnpackIndex {
        input: PathBuf,
        mapping: PathBuf,
        constraints: PathBuf,
    },
    /// Summarize a persistence index file
    InspectIndex {
        input: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize, Deserialize)]
struct MappingRecord {
    vertex: i32,
    value: f64,
}

#[derive(Serialize, Deserialize)]
struct ConstraintRecord {
    vertex: i32,
    value: f64,
    kind: i32,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load(path).map_err(|e| codec_cli_error("loading config", e))?,
        None => Config::default(),
    };
    let directives = if cli.verbose {
        "warn,topocodec=debug"
    } else {
        config.log_directives.as_str()
    };
    setup_logging(directives, cli.log_json);

    match cli.command {
        Command::Pack {
            input,
            output,
            segments,
        } => pack(&config, &input, &output, segments),
        Command::Unpack { input, output } => unpack(&config, &input, &output),
        Command::Inspect { input, json } => inspect(&input, json),
        Command::PackIndex {
            mapping,
            constraints,
            output,
        } => pack_index(&config, &mapping, &constraints, &output),
        Command::UnpackIndex {
            input,
            mapping,
            constraints,
        } => unpack_index(&config, &input, &mapping, &constraints),
        Command::InspectIndex { input, json } => inspect_index(&input, json),
    }
}

fn csv_reader(config: &Config, path: &Path) -> Result<csv::Reader<File>, CliError> {
    let file = File::open(path).map_err(|e| io_cli_error("opening input file", path, e))?;
    Ok(csv::ReaderBuilder::new()
        .has_headers(config.csv_headers)
        .trim(csv::Trim::All)
        .from_reader(file))
}

fn read_records<T: serde::de::DeserializeOwned>(
    config: &Config,
    path: &Path,
) -> Result<Vec<T>, CliError> {
    let mut rdr = csv_reader(config, path)?;
    rdr.deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| simple_cli_error(&format!("parsing '{}': {e}", path.display())))
}

fn csv_writer(config: &Config, path: &Path) -> Result<csv::Writer<File>, CliError> {
    let file = File::create(path).map_err(|e| io_cli_error("creating output file", path, e))?;
    Ok(csv::WriterBuilder::new()
        .has_headers(config.csv_headers)
        .from_writer(file))
}

fn create(path: &Path) -> Result<WordWriter<BufWriter<File>>, CliError> {
    let file = File::create(path).map_err(|e| io_cli_error("creating output file", path, e))?;
    Ok(WordWriter::new(BufWriter::new(file)))
}

fn open(path: &Path) -> Result<WordReader<BufReader<File>>, CliError> {
    let file = File::open(path).map_err(|e| io_cli_error("opening input file", path, e))?;
    Ok(WordReader::new(BufReader::new(file)))
}

fn pack(
    config: &Config,
    input: &Path,
    output: &Path,
    segments: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let ids: Vec<u32> = read_records(config, input)?;
    let mut writer = create(output)?;
    let written = write_segmentation(&mut writer, &ids, segments)
        .and_then(|n| writer.flush().map(|_| n))
        .map_err(|e| codec_cli_error("packing segmentation", e))?;
    info!(vertices = ids.len(), segments, bytes = written, "packed segmentation");
    Ok(())
}

fn unpack(config: &Config, input: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = open(input)?;
    let (header, ids, read) = read_segmentation_with_limit(&mut reader, config.max_vertices)
        .map_err(|e| codec_cli_error("unpacking segmentation", e))?;
    let mut wtr = csv_writer(config, output)?;
    if config.csv_headers {
        wtr.write_record(["segment"])?;
    }
    for id in &ids {
        wtr.serialize(id)?;
    }
    wtr.flush()
        .map_err(|e| io_cli_error("writing output file", output, e))?;
    info!(
        vertices = header.vertices,
        segments = header.segments,
        bytes = read,
        "unpacked segmentation"
    );
    Ok(())
}

fn inspect(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let file_bytes = fs::metadata(input)
        .map_err(|e| io_cli_error("reading input file", input, e))?
        .len();
    let mut reader = open(input)?;
    let header = read_segmentation_header(&mut reader)
        .map_err(|e| codec_cli_error("reading header", e))?;
    let width = header
        .width()
        .map_err(|e| codec_cli_error("reading header", e))?;
    let words = header
        .word_count()
        .map_err(|e| codec_cli_error("reading header", e))?;
    let expected = topocodec::segmentation::HEADER_SIZE as u64 + words as u64 * 4;

    if json {
        let out = serde_json::json!({
            "vertices": header.vertices,
            "segments": header.segments,
            "bits_per_segment": width,
            "words": words,
            "expected_bytes": expected,
            "file_bytes": file_bytes,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("vertices:         {}", header.vertices);
        println!("segments:         {}", header.segments);
        println!("bits per segment: {width}");
        println!("words:            {words}");
        println!("bytes:            {file_bytes} (expected {expected})");
    }
    Ok(())
}

fn pack_index(
    config: &Config,
    mapping: &Path,
    constraints: &Path,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mapping: Vec<PersistenceMapping> = read_records::<MappingRecord>(config, mapping)?
        .into_iter()
        .map(|r| PersistenceMapping::new(r.value, r.vertex))
        .collect();
    let constraints: Vec<Constraint> = read_records::<ConstraintRecord>(config, constraints)?
        .into_iter()
        .map(|r| Constraint::new(r.vertex, r.value, r.kind))
        .collect();
    let index = PersistenceIndex::new(mapping, constraints);
    let mut writer = create(output)?;
    let written = index
        .encode(&mut writer)
        .and_then(|n| writer.flush().map(|_| n))
        .map_err(|e| codec_cli_error("packing persistence index", e))?;
    info!(
        mappings = index.mapping.len(),
        constraints = index.constraints.len(),
        bytes = written,
        "packed persistence index"
    );
    Ok(())
}

fn unpack_index(
    config: &Config,
    input: &Path,
    mapping: &Path,
    constraints: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = open(input)?;
    let decoded = decode_persistence_index(&mut reader)
        .map_err(|e| codec_cli_error("unpacking persistence index", e))?;

    let mut wtr = csv_writer(config, mapping)?;
    for m in decoded.mappings.by_vertex() {
        wtr.serialize(MappingRecord {
            vertex: m.vertex,
            value: m.value,
        })?;
    }
    wtr.flush()
        .map_err(|e| io_cli_error("writing mapping file", mapping, e))?;

    let mut wtr = csv_writer(config, constraints)?;
    for c in decoded.constraints.entries() {
        wtr.serialize(ConstraintRecord {
            vertex: c.vertex,
            value: c.value,
            kind: c.kind,
        })?;
    }
    wtr.flush()
        .map_err(|e| io_cli_error("writing constraints file", constraints, e))?;
    Ok(())
}

fn inspect_index(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = open(input)?;
    let decoded = decode_persistence_index(&mut reader)
        .map_err(|e| codec_cli_error("reading persistence index", e))?;
    let range = decoded.constraints.range();

    if json {
        let out = serde_json::json!({
            "mappings": decoded.mappings.len(),
            "constraints": decoded.constraints.len(),
            "min": range.map(|r| r.min),
            "max": range.map(|r| r.max),
            "bytes": decoded.bytes_read,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("mappings:    {}", decoded.mappings.len());
        println!("constraints: {}", decoded.constraints.len());
        match range {
            Some(r) => println!("range:       [{}, {}]", r.min, r.max),
            None => println!("range:       none"),
        }
        println!("bytes:       {}", decoded.bytes_read);
    }
    Ok(())
}

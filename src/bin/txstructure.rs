//! A binary to derive the transcriptional structure of a chromosome from a
//! single track of read mappings.
//!
//! ```shell
//! cargo run --release --bin=txstructure --features=binaries -- \
//!     --features features.tsv \
//!     --mappings mappings.tsv.gz \
//!     --reference chromosome.fa \
//!     --output results
//! ```
//!
//! Features are read as tab-delimited `id`, `start`, `stop`, `strand`, `type`
//! and `name` columns, mappings as tab-delimited `start`, `stop` and `strand`
//! columns (optionally gzipped). Empty lines and lines starting with `#` are
//! ignored in both. The following files are written to the output directory:
//!
//! * `counts.tsv`: the number of reads hitting each feature.
//! * `starts.tsv`: the detected transcription starts.
//! * `operons.tsv`: the assembled operons.

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Write as _;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use clap::Parser;
use clap_verbosity_flag::Verbosity;
use flate2::read::GzDecoder;
use noodles::fasta;
use omics::coordinate::position::Number;
use tracing::info;
use tracing::warn;
use tracing_log::AsTrace as _;
use tracing_subscriber::EnvFilter;
use txstructure::config;
use txstructure::core::Feature;
use txstructure::core::Mapping;
use txstructure::detect::Placement;
use txstructure::detect::TranscriptionStart;
use txstructure::index;
use txstructure::index::mask;
use txstructure::pipeline::Outcome;
use txstructure::pipeline::Pipeline;

/// The number of mappings handed to the pipeline at once.
const BATCH_SIZE: usize = 100_000;

////////////////////////////////////////////////////////////////////////////////////////
// Inputs
////////////////////////////////////////////////////////////////////////////////////////

/// Opens a file for buffered reading, decompressing it if it ends in `.gz`.
fn open(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;

    let reader: Box<dyn BufRead> = match path.extension().and_then(|ext| ext.to_str()) {
        Some("gz") => Box::new(BufReader::new(GzDecoder::new(file))),
        _ => Box::new(BufReader::new(file)),
    };

    Ok(reader)
}

/// Whether a line holds a record.
fn is_record(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && !line.starts_with('#')
}

/// Reads every feature from `path`.
fn read_features(path: &Path) -> Result<Vec<Feature>> {
    let mut features = Vec::new();

    for (i, line) in open(path)?.lines().enumerate() {
        let line = line.with_context(|| format!("reading {}", path.display()))?;

        if !is_record(&line) {
            continue;
        }

        let feature = line
            .trim_end()
            .parse::<Feature>()
            .with_context(|| format!("parsing feature on line {} of {}", i + 1, path.display()))?;
        features.push(feature);
    }

    Ok(features)
}

/// Reads the first sequence from the FASTA file at `path`.
fn read_reference(path: &Path) -> Result<Vec<u8>> {
    let mut reader = fasta::reader::Builder
        .build_from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut records = reader.records();

    let record = match records.next() {
        Some(result) => result.with_context(|| format!("reading {}", path.display()))?,
        None => bail!("no sequences found in {}", path.display()),
    };

    if records.next().is_some() {
        warn!(
            "{} holds more than one sequence; only `{}` is used",
            path.display(),
            String::from_utf8_lossy(record.name())
        );
    }

    Ok(record.sequence().as_ref().to_vec())
}

////////////////////////////////////////////////////////////////////////////////////////
// Outputs
////////////////////////////////////////////////////////////////////////////////////////

/// Creates a buffered writer for `name` within `directory`.
fn create(directory: &Path, name: &str) -> Result<BufWriter<File>> {
    let path = directory.join(name);
    File::create(&path)
        .map(BufWriter::new)
        .with_context(|| format!("creating {}", path.display()))
}

/// Writes the number of hits for each feature.
fn write_counts(directory: &Path, features: &[Feature], outcome: &Outcome) -> Result<()> {
    let mut writer = create(directory, "counts.tsv")?;
    writeln!(writer, "id\tname\tstrand\tcount")?;

    for feature in features {
        let count = outcome.counts().get(feature.id()).unwrap_or_default();
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            feature.id(),
            feature.name(),
            feature.strand(),
            count
        )?;
    }

    writer.flush().context("writing counts")
}

/// Formats a single transcription start.
fn format_start(start: &TranscriptionStart) -> String {
    let (placement, next) = match start.placement() {
        Placement::Upstream(_) => ("upstream", String::from(".")),
        Placement::Within { next, .. } => (
            "within",
            next.map(|neighbor| format!("{}:{}", neighbor.feature, neighbor.offset))
                .unwrap_or_else(|| String::from(".")),
        ),
        Placement::Orphan => ("orphan", String::from(".")),
    };

    let context = start
        .upstream()
        .iter()
        .map(|count| count.to_string())
        .collect::<Vec<_>>()
        .join(",");

    format!(
        "{}\t{}\t{}\t{:.2}\t{}\t{}\t{}\t{}\t{}\t{}",
        start.position(),
        start.strand(),
        start.read_starts(),
        start.relative_count(),
        placement,
        start
            .placement()
            .feature()
            .map(|id| id.to_string())
            .unwrap_or_else(|| String::from(".")),
        start
            .placement()
            .offset()
            .map(|offset| offset.to_string())
            .unwrap_or_else(|| String::from(".")),
        next,
        context,
        start.sequence().unwrap_or(".")
    )
}

/// Writes the detected transcription starts.
fn write_starts(directory: &Path, outcome: &Outcome) -> Result<()> {
    let mut writer = create(directory, "starts.tsv")?;
    writeln!(
        writer,
        "position\tstrand\tread_starts\tper_million\tplacement\tfeature\toffset\tnext\tupstream\tsequence"
    )?;

    for start in outcome.starts() {
        writeln!(writer, "{}", format_start(start))?;
    }

    writer.flush().context("writing starts")
}

/// Writes the assembled operons.
fn write_operons(directory: &Path, outcome: &Outcome) -> Result<()> {
    let mut writer = create(directory, "operons.tsv")?;
    writeln!(writer, "operon\tfeatures\tspanning_reads")?;

    for (i, operon) in outcome.operons().iter().enumerate() {
        let features = operon
            .features()
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let spanning = operon
            .adjacencies()
            .iter()
            .map(|adjacency| adjacency.spanning_reads().to_string())
            .collect::<Vec<_>>()
            .join(",");

        writeln!(writer, "{}\t{}\t{}", i + 1, features, spanning)?;
    }

    writer.flush().context("writing operons")
}

////////////////////////////////////////////////////////////////////////////////////////
// Main
////////////////////////////////////////////////////////////////////////////////////////

/// Derives transcription starts and operons from a track of read mappings.
#[derive(Parser)]
struct Args {
    /// The annotated features of the chromosome.
    #[arg(long)]
    features: PathBuf,

    /// The read mappings of the track (optionally gzipped).
    #[arg(long)]
    mappings: PathBuf,

    /// The reference sequence of the chromosome in FASTA format.
    #[arg(long)]
    reference: Option<PathBuf>,

    /// The length of the chromosome. Required without a reference.
    #[arg(long)]
    genome_length: Option<Number>,

    /// The directory to write the results to.
    #[arg(short, long)]
    output: PathBuf,

    /// The name of the track used in logs.
    #[arg(long, default_value = "track")]
    name: String,

    /// The minimum jump in read starts over the upstream neighbour.
    #[arg(long, default_value_t = config::DEFAULT_RATIO_THRESHOLD)]
    ratio_threshold: f64,

    /// The background cutoff as a fraction of all read starts.
    #[arg(long, default_value_t = config::DEFAULT_BACKGROUND_CUTOFF_FRACTION)]
    background_cutoff_fraction: f64,

    /// The bases added before each feature when counting hits.
    #[arg(long, default_value_t = 0)]
    start_offset: Number,

    /// The bases added after each feature when counting hits.
    #[arg(long, default_value_t = 0)]
    stop_offset: Number,

    /// The bases of sequence reported before each transcription start.
    #[arg(long, default_value_t = 0)]
    upstream_window: Number,

    /// The bases of sequence reported after each transcription start.
    #[arg(long, default_value_t = 0)]
    downstream_window: Number,

    /// The spanning reads an adjacency must exceed to join an operon.
    #[arg(long, default_value_t = config::DEFAULT_SPANNING_READ_THRESHOLD)]
    spanning_read_threshold: u64,

    /// How far downstream of a transcription start to look for a feature.
    #[arg(long, default_value_t = config::DEFAULT_MAX_FEATURE_DISTANCE)]
    max_feature_distance: Number,

    /// Disables the exclusion mask around tRNA and rRNA genes.
    #[arg(long, default_value_t = false)]
    no_mask: bool,

    #[command(flatten)]
    verbose: Verbosity,
}

fn run(args: &Args) -> Result<()> {
    let mask = if args.no_mask {
        mask::Config::empty()
    } else {
        mask::Config::default()
    };

    let config = config::Builder::default()
        .ratio_threshold(args.ratio_threshold)
        .background_cutoff_fraction(args.background_cutoff_fraction)
        .start_offset(args.start_offset)
        .stop_offset(args.stop_offset)
        .upstream_window(args.upstream_window)
        .downstream_window(args.downstream_window)
        .spanning_read_threshold(args.spanning_read_threshold)
        .max_feature_distance(args.max_feature_distance)
        .mask(mask)
        .try_build()
        .context("validating parameters")?;

    let reference = args
        .reference
        .as_deref()
        .map(read_reference)
        .transpose()?;

    let genome_length = match (&reference, args.genome_length) {
        (Some(reference), Some(length)) if reference.len() as Number != length => bail!(
            "the reference holds {} bases, but a genome length of {} was given",
            reference.len(),
            length
        ),
        (Some(reference), _) => reference.len() as Number,
        (None, Some(length)) => length,
        (None, None) => bail!("either `--reference` or `--genome-length` must be provided"),
    };

    let features = read_features(&args.features)?;
    info!("read {} features", features.len());

    let index = index::Builder::default()
        .mask(*config.mask())
        .try_build(&features, genome_length)
        .context("indexing features")?;

    let mut pipeline = Pipeline::new(&features, &index, &config);
    if let Some(reference) = &reference {
        pipeline = pipeline.with_reference(reference);
    }

    let mut track = pipeline.track(args.name.clone());
    let mut batch = Vec::with_capacity(BATCH_SIZE);

    for (i, line) in open(&args.mappings)?.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                let reason = format!("reading {}: {}", args.mappings.display(), err);
                track.fail(reason.clone());
                bail!(reason);
            }
        };

        if !is_record(&line) {
            continue;
        }

        let mapping = match line.trim_end().parse::<Mapping>() {
            Ok(mapping) => mapping,
            Err(err) => {
                let reason = format!(
                    "parsing mapping on line {} of {}: {}",
                    i + 1,
                    args.mappings.display(),
                    err
                );
                track.fail(reason.clone());
                bail!(reason);
            }
        };

        batch.push(mapping);

        if batch.len() == BATCH_SIZE {
            track.feed(batch.drain(..));
        }
    }

    track.feed(batch);

    let outcome = track
        .complete()
        .into_result()
        .with_context(|| format!("analysing track `{}`", args.name))?;

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;

    write_counts(&args.output, &features, &outcome)?;
    write_starts(&args.output, &outcome)?;
    write_operons(&args.output, &outcome)?;

    info!(
        "wrote {} starts and {} operons to {}",
        outcome.starts().len(),
        outcome.operons().len(),
        args.output.display()
    );

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    match std::env::var("RUST_LOG") {
        Ok(_) => tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .init(),
        Err(_) => tracing_subscriber::fmt()
            .with_max_level(args.verbose.log_level_filter().as_trace())
            .init(),
    };

    run(&args)
}

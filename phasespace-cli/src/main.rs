//! phsf: inspect, histogram and dump BEAM phase-space files.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::too_many_lines
)]

mod density;

use clap::{Args, Parser, Subcommand, ValueEnum};
use density::{density_table, normalization, DensityRow};
use phasespace_beam::{HeaderOptions, IncidentCountEncoding, PhsfHeader};
use phasespace_core::{
    BinIndex, BinningConfig, Event, Histogram1D, Observable, ParticleFilter,
};
use phasespace_io::{histogram_files, BatchSummary, EventWriter, FillOptions, PhsfReader};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    PhaseSpace(#[from] phasespace_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] phasespace_core::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid arguments: {0}")]
    Usage(String),

    #[error("All {0} input file(s) failed")]
    AllFailed(usize),
}

/// Interpretation of the header's incident particle count.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum IncidentCountArg {
    /// IEEE-754 single precision
    Float32,
    /// Signed 32-bit integer
    Int32,
}

impl From<IncidentCountArg> for HeaderOptions {
    fn from(arg: IncidentCountArg) -> Self {
        let incident_count = match arg {
            IncidentCountArg::Float32 => IncidentCountEncoding::Float32,
            IncidentCountArg::Int32 => IncidentCountEncoding::Int32,
        };
        HeaderOptions { incident_count }
    }
}

/// Particle species selection.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Particles {
    Photons,
    Electrons,
    Positrons,
    /// Electrons and positrons
    Charged,
    All,
}

impl From<Particles> for ParticleFilter {
    fn from(arg: Particles) -> Self {
        match arg {
            Particles::Photons => ParticleFilter::Photons,
            Particles::Electrons => ParticleFilter::Electrons,
            Particles::Positrons => ParticleFilter::Positrons,
            Particles::Charged => ParticleFilter::Charged,
            Particles::All => ParticleFilter::All,
        }
    }
}

/// Event field to histogram.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ObservableArg {
    /// Kinetic energy (MeV)
    Energy,
    X,
    Y,
    ZLast,
    U,
    V,
    W,
    Weight,
}

impl From<ObservableArg> for Observable {
    fn from(arg: ObservableArg) -> Self {
        match arg {
            ObservableArg::Energy => Observable::Energy,
            ObservableArg::X => Observable::X,
            ObservableArg::Y => Observable::Y,
            ObservableArg::ZLast => Observable::ZLast,
            ObservableArg::U => Observable::U,
            ObservableArg::V => Observable::V,
            ObservableArg::W => Observable::W,
            ObservableArg::Weight => Observable::Weight,
        }
    }
}

/// Histogram binning; exactly one form must be given.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct BinningArgs {
    /// Number of equal-width bins over [--lo, --hi)
    #[arg(long)]
    bins: Option<usize>,

    /// Explicit ascending bin edges, comma separated
    #[arg(long, value_delimiter = ',')]
    edges: Option<Vec<f64>>,

    /// Split scale LO,ME,HI: coarse bins below ME, --fine-bins bins above
    #[arg(long, value_delimiter = ',', value_name = "LO,ME,HI")]
    split_scale: Option<Vec<f64>>,

    /// JSON binning description file
    #[arg(long, value_name = "FILE")]
    binning: Option<PathBuf>,
}

/// BEAM phase-space file tool.
#[derive(Parser)]
#[command(name = "phsf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// How to read the header's incident particle count
    #[arg(long, value_enum, default_value = "float32", global = true)]
    incident_count: IncidentCountArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the header of a phase-space file
    Info {
        /// Input phase-space file
        input: PathBuf,

        /// Read every record and report per-species counts
        #[arg(long)]
        count: bool,
    },

    /// Histogram an event field over one or more files
    Spectrum {
        /// Input phase-space file(s)
        #[arg(required = true)]
        input: Vec<PathBuf>,

        #[command(flatten)]
        binning: BinningArgs,

        /// Lower edge for --bins
        #[arg(long, default_value = "0.0")]
        lo: f64,

        /// Upper edge for --bins
        #[arg(long)]
        hi: Option<f64>,

        /// Fine bins above ME for --split-scale
        #[arg(long, default_value = "5")]
        fine_bins: usize,

        /// Event field to histogram
        #[arg(short, long, value_enum, default_value = "energy")]
        observable: ObservableArg,

        /// Particle species to include
        #[arg(short, long, value_enum, default_value = "photons")]
        particles: Particles,

        /// Maximum number of records read per file
        #[arg(long)]
        max_records: Option<usize>,

        /// Fill with unit weight instead of the event weight
        #[arg(long)]
        unweighted: bool,

        /// Read through a memory mapping
        #[arg(long)]
        mapped: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write events as a flat table (CSV if the output ends in .csv)
    Dump {
        /// Input phase-space file
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Particle species to include
        #[arg(short, long, value_enum, default_value = "photons")]
        particles: Particles,

        /// Maximum number of records read
        #[arg(long)]
        max_records: Option<usize>,
    },
}

/// JSON form of a spectrum run.
#[derive(Serialize)]
struct SpectrumReport<'a> {
    observable: Observable,
    weighted: bool,
    summary: &'a BatchSummary,
    density: Vec<DensityRow>,
    normalization: f64,
}

const DUMP_BATCH: usize = 65_536;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let header_options = HeaderOptions::from(cli.incident_count);

    match cli.command {
        Commands::Info { input, count } => {
            let mut reader = PhsfReader::open_with_options(&input, &header_options)?;
            println!("File: {}", input.display());
            print_header(reader.header());

            if count {
                let start = Instant::now();
                let mut failure = None;
                for record in reader.records() {
                    if let Err(e) = record {
                        failure = Some(e);
                        break;
                    }
                }
                let counts = reader.counts();
                println!("Records read: {}", counts.total());
                println!("  photons:   {}", counts.photons);
                println!("  electrons: {}", counts.electrons);
                println!("  positrons: {}", counts.positrons);
                println!("Read in {:.2}s", start.elapsed().as_secs_f64());
                if let Some(e) = failure {
                    return Err(e.into());
                }
            }
        }

        Commands::Spectrum {
            input,
            binning,
            lo,
            hi,
            fine_bins,
            observable,
            particles,
            max_records,
            unweighted,
            mapped,
            json,
        } => {
            let config = binning_config(&binning, lo, hi, fine_bins)?;
            let prototype = config.build()?;
            let options = FillOptions {
                observable: observable.into(),
                filter: particles.into(),
                weighted: !unweighted,
                max_records,
                header: header_options,
                mapped,
            };

            let start = Instant::now();
            let summary = histogram_files(input.as_slice(), &prototype, &options)?;
            let failed = summary.failures().count();
            if failed == input.len() {
                return Err(CliError::AllFailed(input.len()));
            }

            let rows = density_table(&summary.merged);
            let norm = normalization(&rows);

            if json {
                let report = SpectrumReport {
                    observable: options.observable,
                    weighted: options.weighted,
                    summary: &summary,
                    density: rows,
                    normalization: norm,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            for outcome in summary.failures() {
                if let Some(e) = &outcome.error {
                    eprintln!("Failed: {}: {}", outcome.path.display(), e);
                }
            }

            let h = &summary.merged;
            println!(
                "Processed {} file(s) in {:.2}s ({} failed)",
                input.len(),
                start.elapsed().as_secs_f64(),
                failed
            );
            println!(
                "Records: {} (photons {}, electrons {}, positrons {})",
                summary.counts.total(),
                summary.counts.photons,
                summary.counts.electrons,
                summary.counts.positrons
            );
            println!(
                "{}: {} bins over [{}, {}), {}",
                options.observable.label(),
                h.size(),
                h.lo(),
                h.hi(),
                if options.weighted {
                    "weighted"
                } else {
                    "unweighted"
                }
            );
            println!("Events: {}  Integral: {:.6e}", h.nof_events(), h.integral());
            println!();
            println!(
                "{:>10} | {:>12} | {:>12} | {:>12} | {:>10} | {:>12}",
                "Bin", "Low", "High", "Weight", "Events", "Density"
            );
            println!("{:-<83}", "");
            for row in &rows {
                let label = match row.bin {
                    BinIndex::Underflow => "under".to_string(),
                    BinIndex::Bin(i) => i.to_string(),
                    BinIndex::Overflow => "over".to_string(),
                };
                println!(
                    "{:>10} | {:>12.5} | {:>12.5} | {:>12.5e} | {:>10} | {:>12.5e}",
                    label, row.lo, row.hi, row.weight, row.events, row.density
                );
            }
            println!();
            println!("Normalization check: {:.6}", norm);
        }

        Commands::Dump {
            input,
            output,
            particles,
            max_records,
        } => {
            let csv = output
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

            let mut reader = PhsfReader::open_with_options(&input, &header_options)?;
            if let Some(n) = max_records {
                reader = reader.with_max_records(n);
            }
            let mut writer = EventWriter::create(&output)?;
            log::debug!("Writing {} to {}", if csv { "CSV" } else { "text" }, output.display());

            let mut batch = Vec::with_capacity(DUMP_BATCH);
            let mut written = 0usize;
            let mut failure = None;
            for event in reader.events(ParticleFilter::from(particles)) {
                match event {
                    Ok(e) => batch.push(e),
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
                if batch.len() == DUMP_BATCH {
                    write_batch(&mut writer, &batch, csv)?;
                    written += batch.len();
                    batch.clear();
                }
            }
            write_batch(&mut writer, &batch, csv)?;
            written += batch.len();
            writer.flush()?;

            println!("Wrote {} events to {}", written, output.display());
            if let Some(e) = failure {
                return Err(e.into());
            }
        }
    }

    Ok(())
}

fn print_header(header: &PhsfHeader) {
    let incident = header.incident_particle_count;
    println!("Mode: {}", header.mode);
    println!("Record size: {} bytes", header.mode.record_size());
    println!("Total records: {}", header.total_records);
    println!("Photon records: {}", header.total_photon_records);
    println!("Max kinetic energy: {} MeV", header.max_kinetic_energy);
    println!(
        "Min electron kinetic energy: {} MeV",
        header.min_electron_kinetic_energy
    );
    println!(
        "Incident particles: {} (as float32: {}, as int32: {})",
        incident.value(),
        incident.as_f32(),
        incident.as_i32()
    );
}

fn write_batch(
    writer: &mut EventWriter,
    batch: &[Event],
    csv: bool,
) -> Result<()> {
    if csv {
        writer.write_csv(batch)?;
    } else {
        writer.write_text(batch)?;
    }
    Ok(())
}

/// Resolves the binning arguments into a configuration.
fn binning_config(
    args: &BinningArgs,
    lo: f64,
    hi: Option<f64>,
    fine_bins: usize,
) -> Result<BinningConfig> {
    if let Some(bins) = args.bins {
        let hi = hi.ok_or_else(|| CliError::Usage("--bins requires --hi".into()))?;
        return Ok(BinningConfig::Uniform { bins, lo, hi });
    }
    if let Some(edges) = &args.edges {
        return Ok(BinningConfig::Edges(edges.clone()));
    }
    if let Some(scale) = &args.split_scale {
        let &[lo, me, hi] = scale.as_slice() else {
            return Err(CliError::Usage(
                "--split-scale takes exactly three values LO,ME,HI".into(),
            ));
        };
        return Ok(BinningConfig::SplitScale {
            lo,
            me,
            hi,
            fine_bins,
        });
    }
    if let Some(path) = &args.binning {
        return Ok(BinningConfig::from_file(path)?);
    }
    Err(CliError::Usage("no binning given".into()))
}

//! session — a full experiment session driven by a YAML settings file.
//!
//! ```text
//! settings.yml ─▶ trial table + intervals ─▶ stimulator ─▶ pin writes (stdout)
//! input stream ─▶ reader ─────────────────────────┐
//!                              stimulator events ─┴─▶ recorder ─▶ events file
//! ```
//!
//! The stimulator presents every trial, waiting one generated interval before
//! each, then ends the session through the observer.  Ctrl-C aborts through
//! the same path, so the events file is always flushed.
//!
//! # Settings
//!
//! ```yaml
//! Comport:
//!   port: capture.txt        # any line stream; "-" reads stdin
//!   timeout: 0.1
//! Experimental:
//!   trials: 20               # per condition
//!   seed: 7
//!   pulse: 0.5
//!   warmup: 5.0
//!   intervals: { model: exponential, mean: 10.0, min: 2.0 }
//! Metadata:
//!   experiment: vi
//!   subject: rat01
//! PinMode:
//!   12: output
//!   13: output
//! ```

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cx_agent::{DEFAULT_POLL, Stimulator, Task, high_for, observer, reader, recorder};
use cx_core::{Control, ExperimentConfig, OBSERVER, RECORDER, SessionRng, timestamp};
use cx_device::{SharedDevice, StreamDevice, share};
use cx_env::EnvironmentBuilder;
use cx_output::{CsvEventWriter, EventSink, NameOptions, namefile};
use cx_schedule::{
    IntervalModel, TrialIterator, blockwise_shuffle, elementwise_shuffle, load_trials_csv, zip_values,
};

#[derive(Parser)]
#[command(name = "session")]
#[command(about = "Run experiment sessions described by YAML settings files")]
struct Cli {
    /// Settings file; repeat to run several sessions back to back
    #[arg(short = 'y', long = "yaml", required = true)]
    yamls: Vec<PathBuf>,

    /// Input line stream, overriding Comport.port ("-" reads stdin until EOF)
    #[arg(short, long)]
    port: Option<String>,

    /// Read poll in seconds, overriding Comport.timeout
    #[arg(short, long)]
    timeout: Option<f64>,

    /// Seconds to wait before the first trial, overriding Experimental.warmup
    #[arg(short, long)]
    warmup: Option<f64>,

    /// Trial table CSV (`trial,value[,repeats]`, value = output pin)
    #[arg(long)]
    trials: Option<PathBuf>,

    /// Directory for event files
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Write events to SQLite instead of CSV
    #[cfg(feature = "sqlite")]
    #[arg(long)]
    sqlite: bool,

    /// Enable debug logging
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    for yaml in &cli.yamls {
        run_session(&cli, yaml).with_context(|| format!("session {}", yaml.display()))?;
    }
    Ok(())
}

fn run_session(cli: &Cli, yaml: &Path) -> Result<()> {
    let cfg = ExperimentConfig::from_path(yaml)?;
    let exp = &cfg.experimental;

    // 1. Schedule.
    let mut rng = match exp.get_or::<Option<u64>>("seed", None)? {
        Some(seed) => SessionRng::new(seed),
        None => SessionRng::from_entropy(),
    };
    let mut trials = trial_table(cli, &cfg, &mut rng)?;
    let model: IntervalModel = exp.get("intervals")?;
    let waits = model
        .generate(trials.len(), true, &mut rng)?
        .into_iter()
        .map(|w| seconds("interval", w))
        .collect::<Result<Vec<_>>>()?;
    let pulse = seconds("pulse", exp.get_or("pulse", 0.5)?)?;
    let warmup = seconds("warmup", cli.warmup.map_or_else(|| exp.get_or("warmup", 0.0), Ok)?)?;
    let schedule = zip_values(trials.by_ref().collect(), waits)?;
    info!(
        trials = schedule.len(),
        conditions = trials.trial_count(),
        mean = model.mean(),
        "schedule ready"
    );

    // 2. Devices.
    let poll = match cli.timeout.or(cfg.comport.timeout) {
        Some(t) => seconds("timeout", t)?,
        None => DEFAULT_POLL,
    };
    let port = cli.port.clone().or_else(|| cfg.comport.port.clone()).unwrap_or_else(|| "-".into());
    if let Some(baud) = cfg.comport.baudrate {
        info!(port = %port, baud, "baud rate is set by the stream's owner");
    }
    let input = open_input(&port)?;
    let output: SharedDevice = share(StreamDevice::new(io::empty()).with_output(io::stdout()));

    // 3. Agents.
    let sink = open_sink(cli, &cfg)?;
    let device = output.clone();
    let stim = Stimulator::new(output)
        .with_task(Task::custom(move |me| async move {
            me.sleep(warmup).await?;
            for ((trial, pin), wait) in schedule {
                me.sleep(wait).await?;
                me.send_to(RECORDER, timestamp(trial))?;
                high_for(&me, &device, pin, pulse).await?;
            }
            me.send_to(OBSERVER, Control::Nend)
        }))
        .into_agent();
    let obs = observer();

    let mut env = EnvironmentBuilder::new()
        .name(yaml.file_stem().map_or_else(|| "session".into(), |s| s.to_string_lossy().into_owned()))
        .agents([reader(input, poll), recorder(sink), stim, obs.clone()])
        .interrupt_via(&obs)
        .build()?;

    let report = env.run()?;
    if !report.is_clean() {
        warn!(%report, "session ended with task errors");
    }
    println!("{report}");
    Ok(())
}

/// A setting given in seconds; negative, NaN and overflowing values are
/// rejected.
fn seconds(what: &str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).with_context(|| format!("{what} of {secs} s"))
}

/// The trial table: from `--trials`, or one condition per output pin.
fn trial_table(cli: &Cli, cfg: &ExperimentConfig, rng: &mut SessionRng) -> Result<TrialIterator<String, u8>> {
    if let Some(path) = &cli.trials {
        let mut table = load_trials_csv::<u8>(path)?;
        table.shuffle(|s| Ok(elementwise_shuffle(s, rng)))?;
        return Ok(table);
    }

    let pins = cfg.output_pins();
    if pins.is_empty() {
        bail!("no output pins in PinMode and no --trials table");
    }
    let per_condition: usize = cfg.experimental.get_or("trials", 10)?;
    let ids: Vec<String> = pins.iter().map(|p| format!("pin{p}")).collect();

    // Cycle through the conditions, then shuffle within each cycle so every
    // block holds each condition once.
    let cycles: Vec<String> = (0..per_condition).flat_map(|_| ids.iter().cloned()).collect();
    let mut table = TrialIterator::new(ids, pins)?;
    let blocksize = table.trial_count();
    table.set_sequence(cycles)?;
    table.shuffle(|s| blockwise_shuffle(s, blocksize, rng))?;
    Ok(table)
}

fn open_input(port: &str) -> Result<SharedDevice> {
    if port == "-" {
        return Ok(share(StreamDevice::new(BufReader::new(io::stdin()))));
    }
    let file = File::open(port).with_context(|| format!("opening input {port}"))?;
    Ok(share(StreamDevice::new(BufReader::new(file))))
}

fn open_sink(cli: &Cli, cfg: &ExperimentConfig) -> Result<Box<dyn EventSink>> {
    std::fs::create_dir_all(&cli.output)
        .with_context(|| format!("creating {}", cli.output.display()))?;

    #[cfg(feature = "sqlite")]
    if cli.sqlite {
        let path = cli.output.join(namefile(&cfg.metadata, &NameOptions::default().with_extension("db")));
        info!(path = %path.display(), "recording events");
        return Ok(Box::new(cx_output::SqliteEventWriter::create(&path)?));
    }

    let path = cli.output.join(namefile(&cfg.metadata, &NameOptions::default()));
    info!(path = %path.display(), "recording events");
    Ok(Box::new(CsvEventWriter::create(&path)?))
}

//! split_groups — the sender paces on one thread while the recorder logs on
//! another.
//!
//! ```text
//! thread "cx-env-pacing"   sender ──values──┐      observer
//! thread "cx-env-logging"                   └──▶ recorder ──▶ CSV
//! ```
//!
//! Both groups share one register, so the observer's `NEND` broadcast
//! reaches the recorder across the thread boundary and its file is flushed
//! before `join()` returns.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cx_agent::{Agent, Register, Task, observer, recorder};
use cx_core::{Control, Metadata, OBSERVER, RECORDER, SessionRng};
use cx_env::EnvironmentBuilder;
use cx_output::{CsvEventWriter, NameOptions, namefile};
use cx_schedule::uniform_intervals;

#[derive(Parser)]
#[command(name = "split_groups")]
#[command(about = "Sender and recorder running in separate environments")]
struct Cli {
    /// Values to send before ending the session
    #[arg(short, long, default_value = "10")]
    count: usize,

    /// Mean gap between values, in seconds
    #[arg(long, default_value = "0.5")]
    mean: f64,

    /// Half-width of the gap distribution, in seconds
    #[arg(long, default_value = "0.25")]
    range: f64,

    /// Seed for the gap order (random if omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Directory for the event file
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Subject identifier used in the file name
    #[arg(long, default_value = "demo")]
    subject: String,

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

    let mut rng = cli.seed.map_or_else(SessionRng::from_entropy, SessionRng::new);
    let gaps = uniform_intervals(cli.mean, cli.range, cli.count, true, &mut rng)?
        .into_iter()
        .map(|gap| Duration::try_from_secs_f64(gap).with_context(|| format!("gap of {gap} s")))
        .collect::<Result<Vec<_>>>()?;

    let meta = Metadata {
        experiment: Some("split".into()),
        subject:    Some(cli.subject.clone()),
        ..Metadata::default()
    };
    std::fs::create_dir_all(&cli.output)
        .with_context(|| format!("creating {}", cli.output.display()))?;
    let path = cli.output.join(namefile(&meta, &NameOptions::default()));
    let writer = CsvEventWriter::create(&path)
        .with_context(|| format!("opening {}", path.display()))?;
    info!(path = %path.display(), "recording events");

    let sender = Agent::new("sender")
        .assign_task(Task::custom(move |me| async move {
            for (i, gap) in gaps.into_iter().enumerate() {
                me.sleep(gap).await?;
                me.send_to(RECORDER, i as i64)?;
            }
            me.send_to(OBSERVER, Control::Nend)
        }))
        .assign_task(Task::SelfTerminate);
    let rec = recorder(Box::new(writer));
    let obs = observer();
    Register::new(&[sender.clone(), rec.clone(), obs.clone()])?;

    let logging = EnvironmentBuilder::new().name("logging").agent(rec).build()?.parallelize()?;
    let pacing = EnvironmentBuilder::new()
        .name("pacing")
        .agents([sender, obs.clone()])
        .interrupt_via(&obs)
        .build()?
        .parallelize()?;

    let pacing = pacing.join()?;
    let logging = logging.join()?;
    println!("{pacing}");
    println!("{logging}");
    println!("events written to {}", path.display());
    Ok(())
}

//! single_group — one sender, one receiver and an observer on one scheduler.
//!
//! The sender waits a random 0.2–1.8 s before each message, then reports
//! `NEND` to the observer; the observer's broadcast stops both agents and
//! `run()` returns.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cx_agent::{Agent, Task, observer};
use cx_core::{Control, OBSERVER, SessionRng};
use cx_env::EnvironmentBuilder;

#[derive(Parser)]
#[command(name = "single_group")]
#[command(about = "Sender and receiver coordinated by an observer on one scheduler")]
struct Cli {
    /// Messages to send before ending the session
    #[arg(short, long, default_value = "5")]
    messages: usize,

    /// Seed for the send delays (random if omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Multiply every delay by this factor
    #[arg(long, default_value = "1.0")]
    time_scale: f64,

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
    let delays = (0..cli.messages)
        .map(|_| {
            let secs = f64::from(rng.gen_range(1u32..10)) / 5.0 * cli.time_scale;
            Duration::try_from_secs_f64(secs).with_context(|| format!("delay of {secs} s (--time-scale)"))
        })
        .collect::<Result<Vec<_>>>()?;

    let sender = Agent::new("sender")
        .assign_task(Task::custom(move |me| async move {
            for (i, delay) in delays.into_iter().enumerate() {
                me.sleep(delay).await?;
                info!(message = i, "sending");
                me.send_to("receiver", i as i64)?;
            }
            me.send_to(OBSERVER, Control::Nend)
        }))
        .assign_task(Task::SelfTerminate);

    let receiver = Agent::new("receiver")
        .assign_task(Task::custom(|me| async move {
            while me.working() {
                let message = me.recv().await?;
                info!(from = %message.origin, payload = %message.payload, "received");
            }
            Ok(())
        }))
        .assign_task(Task::SelfTerminate);

    let obs = observer();
    let mut env = EnvironmentBuilder::new()
        .name("single_group")
        .agents([sender, receiver, obs.clone()])
        .interrupt_via(&obs)
        .build()?;

    let report = env.run()?;
    println!("{report}");
    Ok(())
}

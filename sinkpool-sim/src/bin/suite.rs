//! Binary target running the resilience suite against the in-memory driver.
//!
//! ```text
//! sinkpool-suite --instant
//! sinkpool-suite --config nightly.json --scenario restart -v
//! ```

use std::path::PathBuf;
use std::process;
use std::rc::Rc;

use clap::Parser;
use sinkpool_sim::{
    scenarios, HarnessConfig, HarnessError, HarnessResult, InMemoryDriver, SettleConfig,
    SuiteReport, SuiteRunner, TimeProvider, TokioTimeProvider, VirtualTimeProvider,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "sinkpool-suite")]
#[command(about = "Run connector resilience scenarios against the in-memory model", long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Name salt, overriding the configuration file
    #[arg(long)]
    salt: Option<String>,

    /// Zero settle waits and a virtual clock
    #[arg(long)]
    instant: bool,

    /// Only run scenarios whose name contains this string (repeatable)
    #[arg(long = "scenario")]
    scenarios: Vec<String>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "debug"
    } else {
        "warn,sinkpool_sim=info"
    };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();

    match run(args).await {
        Ok(report) => {
            println!("{report}");
            if !report.all_passed() {
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("ERROR: {e}");
            process::exit(2);
        }
    }
}

async fn run(args: Args) -> HarnessResult<SuiteReport> {
    let mut config = match &args.config {
        Some(path) => HarnessConfig::from_json_file(path)?,
        None => HarnessConfig::default(),
    };
    if let Some(salt) = args.salt {
        config.salt = Some(salt);
    }
    if !args.scenarios.is_empty() {
        config.scenarios = args.scenarios;
    }

    let salt = config.name_salt();
    let plan = config.retry_plan()?;
    let time: Rc<dyn TimeProvider> = if args.instant {
        Rc::new(VirtualTimeProvider::new())
    } else {
        Rc::new(TokioTimeProvider::new())
    };
    let settle = if args.instant {
        config.settle(SettleConfig::instant())
    } else {
        config.settle(SettleConfig::default())
    };

    let suite = scenarios::resilience_suite(&salt, |name| config.selects(name));
    if suite.is_empty() {
        return Err(HarnessError::Config(format!(
            "no scenario matches {:?}",
            config.scenarios
        )));
    }

    let report = SuiteRunner::new(Rc::new(InMemoryDriver::new()), time)
        .salt(salt)
        .settle(settle)
        .retry_plan(plan)
        .scenarios(suite)
        .run()
        .await;
    Ok(report)
}

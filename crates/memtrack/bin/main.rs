use clap::Parser;
use eyre::{eyre, Result};
use memtrack::{allocate, deallocate, Category, Format, RegistryBuilder, TrackError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "memtrack demo: allocates a couple of tracked blocks, reports, frees them and reports again"
)]
pub struct DemoArgs {
    #[arg(
        long,
        default_value = "table",
        help = "Report format: text, table, json or json-pretty (env: MEMTRACK_JSON)"
    )]
    pub format: Format,

    #[arg(
        long,
        help = "Maximum number of tracked blocks (env: MEMTRACK_CAPACITY)"
    )]
    pub capacity: Option<usize>,

    #[arg(long, help = "Skip the final frees and leave the blocks outstanding")]
    pub leak: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

/// Running out of memory in the demo is not something to recover from.
fn fatal(err: TrackError) -> eyre::Report {
    match err {
        TrackError::AllocationFailed { size, origin } => {
            eyre!("CRITICAL: allocation of {size} bytes failed at {origin}")
        }
        other => eyre!(other),
    }
}

fn main() -> Result<()> {
    let args = DemoArgs::parse();
    init_logging();

    if let Some(capacity) = args.capacity {
        memtrack::global::configure(RegistryBuilder::new().with_env()?.capacity(capacity))?;
    }

    memtrack::global::init();

    let ints = allocate!(5 * std::mem::size_of::<i32>(), Category::Dynamic)
        .map_err(fatal)?
        .cast::<i32>();
    let text = allocate!(50, Category::Temporary).map_err(fatal)?;

    let message = b"Memory Management Demonstration\0";
    // SAFETY: both blocks are live and sized for what is written into them.
    unsafe {
        for i in 0..5 {
            ints.as_ptr().add(i).write(i as i32 * 10);
        }
        std::ptr::copy_nonoverlapping(message.as_ptr(), text.as_ptr(), message.len());
    }

    memtrack::global::print_report(args.format).map_err(|e| eyre!("report failed: {e}"))?;

    if !args.leak {
        // SAFETY: both pointers came from allocate! above and are freed once.
        unsafe {
            deallocate!(ints.as_ptr());
            deallocate!(text.as_ptr());
        }
    }

    memtrack::global::print_report(args.format).map_err(|e| eyre!("report failed: {e}"))?;

    Ok(())
}

use anyhow::{bail, Context};
use tracing_subscriber::EnvFilter;
use varpart::*;

/// Variable-partition memory allocation simulator
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to input
    #[arg(value_parser = clap::value_parser!(PathBuf))]
    input:          PathBuf,

    /// Input format
    #[arg(value_enum)]
    format:         InputFormat,

    /// Total memory available
    #[arg(short, long, default_value_t = 100)]
    #[arg(value_parser = clap::value_parser!(Units))]
    memory:         Units,

    /// Placement strategy
    #[arg(short, long, value_enum, default_value_t = Strategy::FirstFit)]
    strategy:       Strategy,

    /// Ticks needed to select a partition
    #[arg(long, default_value_t = 1)]
    selection:      Ticks,

    /// Ticks needed to load a process
    #[arg(long, default_value_t = 1)]
    load:           Ticks,

    /// Ticks needed to release a partition
    #[arg(long, default_value_t = 1)]
    release:        Ticks,

    /// Safety cap on simulated ticks (unsatisfiable requests never finish)
    #[arg(long, default_value_t = 100_000)]
    max_ticks:      Ticks,

    /// Print the event log after the report
    #[arg(short, long)]
    events:         bool,

    /// Write the per-tick partition history to this file as JSON
    #[arg(long)]
    history_json:   Option<PathBuf>,

    /// Run every strategy on the same input and report each
    #[arg(long, conflicts_with_all = ["events", "history_json"])]
    compare:        bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Args::parse();
    let input_path = cli.input;
    if !(input_path.exists() && input_path.is_file()) {
        bail!("Invalid input path: {}", input_path.display());
    }
    let records = match cli.format {
        InputFormat::Json   => read_from_path::<JsonParser>(input_path.clone()),
        InputFormat::Csv    => read_from_path::<CsvParser>(input_path.clone()),
    }.with_context(|| format!("loading {}", input_path.display()))?;

    let config = Config {
        total_memory:   cli.memory,
        strategy:       cli.strategy,
        selection_time: cli.selection,
        load_time:      cli.load,
        release_time:   cli.release,
    };

    if cli.compare {
        for report in compare_strategies(&config, &records, cli.max_ticks)? {
            println!("{report}\n");
        }
        return Ok(());
    }

    let mut sim = Simulator::new(config, records)?;
    sim.run(cli.max_ticks);
    println!("{}", sim.report());
    println!("Last active tick:\t\t{}", sim.history().last_visible_tick());

    if cli.events {
        println!();
        for line in sim.event_log().lines() {
            println!("{line}");
        }
    }
    if let Some(path) = cli.history_json {
        std::fs::write(&path, sim.history().to_json()?)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    Ok(())
}

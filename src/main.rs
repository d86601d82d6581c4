use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tokio::sync::broadcast::error::RecvError;
use xkcd_mirror::{Config, Event, Mirror, Result, logging};

/// Keep a local copy of every xkcd comic up to date
#[derive(Parser, Debug)]
#[clap(version, about)]
struct Cli {
    /// Path to a TOML config file
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the index and logs (overrides the config file)
    #[clap(long)]
    data_dir: Option<PathBuf>,

    /// Also write logs to daily files in `<data_dir>/logs`
    #[clap(long)]
    log: bool,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,

    /// Show offline index stats instead of syncing
    #[clap(long)]
    stat: bool,

    /// Print `id,year,month,day` for every indexed comic
    #[clap(long, requires = "stat")]
    dump: bool,

    /// Serve the index over HTTP instead of syncing
    #[clap(long, conflicts_with = "stat")]
    serve: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let logs_dir = config.persistence.logs_dir();
    let _guard = match logging::init_logging(cli.verbose, cli.log.then_some(logs_dir.as_path()))
    {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(data_dir) = &cli.data_dir {
        config.persistence.data_dir = data_dir.clone();
    }
    Ok(config)
}

async fn run(cli: &Cli, config: Config) -> Result<()> {
    let mirror = Mirror::new(config).await?;
    mirror.load_index().await;

    if cli.serve {
        tokio::select! {
            result = xkcd_mirror::api::start_api_server(mirror.clone()) => result?,
            _ = xkcd_mirror::run_with_shutdown(mirror.clone()) => {}
        }
        return Ok(());
    }

    if cli.stat {
        print_stats(&mirror, cli.dump).await?;
    } else {
        sync(&mirror).await?;
    }

    mirror.shutdown().await;
    Ok(())
}

async fn sync(mirror: &Mirror) -> Result<()> {
    let start = Instant::now();
    let progress = tokio::spawn(print_progress(mirror.subscribe()));

    let result = mirror.sync().await;
    progress.abort();
    let report = result?;

    println!("\nDONE in {:.2?}", start.elapsed());
    if !report.failed.is_empty() {
        println!(
            "Failed to fetch {} comics, they will be retried on the next run",
            report.failed.len()
        );
    }
    println!("\nTotal comics: {}", mirror.collection().len());
    Ok(())
}

async fn print_progress(mut events: tokio::sync::broadcast::Receiver<Event>) {
    loop {
        match events.recv().await {
            Ok(Event::Discovered { latest, missing }) => {
                eprintln!("Latest comic is {latest}, {missing} to download");
            }
            Ok(Event::Progress { percent, .. }) => {
                eprint!("Downloading... {percent:5.1}%\r");
                std::io::stderr().flush().ok();
            }
            Ok(Event::Complete { .. }) | Err(RecvError::Closed) => break,
            Ok(_) | Err(RecvError::Lagged(_)) => {}
        }
    }
}

async fn print_stats(mirror: &Mirror, dump: bool) -> Result<()> {
    if dump {
        for row in mirror.dump() {
            println!("{},{},{},{}", row.id, row.year, row.month, row.day);
        }
    }

    let stats = mirror.stats().await?;
    println!("\nIndex status: {}", stats.total);
    if let Some(latest) = stats.latest {
        println!("Latest comic: {latest}");
    }
    if !stats.missing.is_empty() {
        println!("Missing: {}", stats.missing.len());
    }
    if stats.without_payload > 0 {
        println!("Without image: {}", stats.without_payload);
    }
    if let (Some(first), Some(last)) = (stats.first_published, stats.last_published) {
        println!("Published: {first} to {last}");
    }
    if let Some(last_sync) = stats.last_sync {
        println!(
            "Last sync: {} ({} fetched, {} failed)",
            last_sync.completed_at.format("%Y-%m-%d %H:%M:%S UTC"),
            last_sync.fetched,
            last_sync.failed
        );
    }
    Ok(())
}

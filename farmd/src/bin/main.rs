use std::process::ExitCode;

use farmd::{
    cli::{run, Command, USAGE},
    config::Config,
    FarmMinderError, FarmMinderResult,
};
use farmdb::ReadingStore;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::FmtSubscriber;

use tracing_log::LogTracer;

fn init_logging(config: &Config) -> FarmMinderResult<WorkerGuard> {
    LogTracer::init().map_err(|e| FarmMinderError::Logging(e.to_string()))?;

    let log = rolling::daily(&config.log_dir, "farm-minder");
    let (nb, guard) = tracing_appender::non_blocking(log);

    let sub = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .with_writer(nb)
        .finish();

    tracing::subscriber::set_global_default(sub)
        .map_err(|e| FarmMinderError::Logging(e.to_string()))?;
    Ok(guard)
}

fn main() -> ExitCode {
    let command = match Command::parse(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{e}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };
    if !command.needs_store() {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let _guard = match init_logging(&config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut store = match ReadingStore::open(&config.database_path) {
        Ok(store) => store,
        Err(e) => {
            log::error!("Unable to initialize reading store {e:}, exiting");
            eprintln!("unable to open {}: {e}", config.database_path.display());
            return ExitCode::FAILURE;
        }
    };
    log::info!("Reading store ready at {}", store.location());

    let mut stdout = std::io::stdout().lock();
    let status = match run(command, &mut store, &config, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Command failed: {e:}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    };

    store.close();
    status
}

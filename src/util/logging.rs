use anyhow::Result;
use env_logger::{Builder, Env};

/// Initialize the logging system with env_logger.
///
/// `RUST_LOG` takes precedence. Otherwise the `verbose` flag controls whether
/// per-judgement debug logs are shown.
pub fn init_logging(verbose: bool) -> Result<()> {
    let default_filter = if verbose {
        "rhythm_judge=debug,warn"
    } else {
        "rhythm_judge=info,warn"
    };

    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_target(true)
        .try_init()?;

    Ok(())
}

//! Tracing subscriber setup (`SPEC_FULL.md` §4.9). Verbosity is driven by the
//! `-v`/`-vv` CLI flag, folded into an `EnvFilter` so `RUST_LOG` still
//! overrides it when set.

use tracing::Level;

pub fn init(verbosity: u8) -> anyhow::Result<()> {
    let default_level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level.to_string()));

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

/// Operator diagnostics go to stderr so stdout stays machine readable.
/// `RUST_LOG` selects levels (default `warn`); `BUILDPULSE_LOG_FORMAT=json`
/// switches to one JSON object per event.
pub fn init_cli_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = std::env::var("BUILDPULSE_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder
            .with_ansi(std::io::stderr().is_terminal())
            .compact()
            .try_init()
    };
}

use tracing_subscriber::EnvFilter;

use crate::console::VerbosityLevel;

/// Installs the stderr diagnostics subscriber.
///
/// `RUST_LOG` wins when set; otherwise the filter follows the console
/// verbosity so `-vv` also surfaces HTTP and polling traces.
pub fn init_tracing(verbosity: VerbosityLevel) {
    let default_directive = match verbosity {
        VerbosityLevel::Debug => "confluence_agent=debug,warn",
        VerbosityLevel::Verbose => "confluence_agent=info,warn",
        _ => "warn",
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

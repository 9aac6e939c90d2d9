// ABOUTME: Shared logging setup for batchway binaries and demos
// ABOUTME: Two functions: init() for stderr, init_for() scoped to one crate

use tracing_subscriber::EnvFilter;

/// Standard logging to stderr. Default: INFO level, RUST_LOG override.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();
}

/// Crate-filtered logging to stderr. Default: INFO for named crate, WARN for everything else.
/// Keeps tonic/h2 connection chatter out of client output.
pub fn init_for(crate_name: &str) {
    let filter = EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into())
        .add_directive(directive_for(crate_name));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn directive_for(crate_name: &str) -> tracing_subscriber::filter::Directive {
    format!("{crate_name}=info")
        .parse()
        .unwrap_or_else(|_| tracing::Level::INFO.into())
}

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_tree::HierarchicalLayer;

/// Environment variable consulted before `RUST_LOG`.
pub const LOG_ENV: &str = "WEFT_LOG";

pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let tree = HierarchicalLayer::new(2)
        .with_indent_lines(true)
        .with_targets(true)
        .with_bracketed_fields(true);

    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = tracing_subscriber::registry().with(filter).with(tree).try_init();
}

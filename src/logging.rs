use tracing_subscriber::{fmt, EnvFilter};

use crate::core::paths::env;

fn json_requested(value: Option<&str>) -> bool {
    matches!(value, Some("1") | Some("true"))
}

pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    let _ = if json_requested(std::env::var(env::LOG_JSON).ok().as_deref()) {
        builder.json().try_init()
    } else {
        builder.pretty().try_init()
    };
}

/// Native entry point.
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use panoview::config::{AppConfig, LogLevel};

    // The logger comes up before the config so that config problems are
    // reported; the configured level is applied afterwards. RUST_LOG wins.
    let rust_log = std::env::var("RUST_LOG").ok();
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Trace)
        .parse_default_env()
        .init();
    if let Some(level) = LogLevel::default().override_filter(rust_log.as_deref()) {
        log::set_max_level(level);
    }

    let config = AppConfig::load_or_create();
    if let Some(level) = config.log_level.override_filter(rust_log.as_deref()) {
        log::set_max_level(level);
    }

    log::info!(
        "Starting panoview (presets in '{}', log level {:?})",
        config.preset_dir,
        config.log_level
    );

    if let Err(e) = panoview::native::run(config) {
        log::error!("Application error: {}", e);
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}

// WASM doesn't use main(), it uses wasm_bindgen's start function
#[cfg(target_arch = "wasm32")]
fn main() {}

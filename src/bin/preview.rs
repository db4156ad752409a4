//! Desktop preview of the backdrop
//!
//! Run with: cargo run --features native --bin backdrop-preview
//! Set BACKDROP_SEED for a reproducible session; press D for diagnostics.

use eframe::egui;
use matrix_backdrop::app::BackdropApp;
use matrix_backdrop::core::RngSource;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,matrix_backdrop=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    let seed = std::env::var("BACKDROP_SEED").ok().and_then(|s| s.parse::<u64>().ok());
    let rng = match seed {
        Some(seed) => {
            info!(seed, "Using fixed seed");
            RngSource::seeded(seed)
        }
        None => RngSource::from_entropy(),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title("matrix backdrop"),
        ..Default::default()
    };

    eframe::run_native(
        "matrix-backdrop",
        options,
        Box::new(move |cc| Ok(Box::new(BackdropApp::new(cc, rng)))),
    )?;
    Ok(())
}

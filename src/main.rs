//! Headless backdrop run: drives the frame loop against a virtual host,
//! moves a scripted pointer around, resizes once, and logs population stats.
//!
//! Run with: cargo run --features cli --bin backdrop-cli

use std::str::FromStr;
use std::time::Duration;

use matrix_backdrop::core::headless::HostCounters;
use matrix_backdrop::core::{FrameDriver, FrameReport, HeadlessHost, Host, RngSource, Viewport};
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

const FRAME_MS: f64 = 1000.0 / 60.0;

/// Read `name` from the environment, falling back to `default` when unset or
/// unparsable.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(name, value = %raw, "Ignoring unparsable value");
            default
        }),
        Err(_) => default,
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
struct Config {
    width: f32,
    height: f32,
    device_pixel_ratio: f32,
    frames: u64,
    seed: u64,
}

impl Config {
    fn from_env() -> Self {
        Self {
            width: env_or("BACKDROP_WIDTH", 1920.0),
            height: env_or("BACKDROP_HEIGHT", 1080.0),
            device_pixel_ratio: env_or("BACKDROP_DPR", 1.0),
            frames: env_or("BACKDROP_FRAMES", 900),
            seed: env_or("BACKDROP_SEED", 42),
        }
    }
}

#[derive(Serialize)]
struct Summary {
    config: Config,
    frames_run: u64,
    interrupted: bool,
    last_frame: Option<FrameReport>,
    host: HostCounters,
}

/// Lissajous path across the middle of the viewport.
fn pointer_at(frame: u64, viewport: &Viewport) -> (f32, f32) {
    let t = frame as f32 * (FRAME_MS as f32 / 1000.0);
    (
        viewport.width * (0.5 + 0.35 * (t * 0.7).sin()),
        viewport.height * (0.5 + 0.35 * (t * 1.1).sin()),
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,matrix_backdrop=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    let config = Config::from_env();
    info!(?config, "Starting headless backdrop");

    let viewport = Viewport::new(config.width, config.height, config.device_pixel_ratio);
    let mut driver = FrameDriver::mount(HeadlessHost::new(viewport), RngSource::seeded(config.seed));

    // Pointer for the first three quarters, idle after that; one resize halfway.
    let leave_at = config.frames * 3 / 4;
    let resize_at = config.frames / 2;

    let mut frame_interval = tokio::time::interval(Duration::from_millis(16));
    frame_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut stats_interval = tokio::time::interval(Duration::from_secs(1));
    stats_interval.tick().await;

    let mut frame = 0u64;
    let mut interrupted = false;

    while frame < config.frames {
        tokio::select! {
            _ = frame_interval.tick() => {
                let current = driver.host().viewport();
                if frame < leave_at {
                    let (x, y) = pointer_at(frame, &current);
                    driver.on_pointer_move(x, y);
                } else if frame == leave_at {
                    debug!(frame, "Pointer left");
                    driver.on_pointer_leave();
                }

                if frame == resize_at {
                    let resized = Viewport::new(current.height, current.width, current.device_pixel_ratio);
                    debug!(width = resized.width, height = resized.height, "Simulating resize");
                    driver.host_mut().set_viewport(resized);
                    driver.on_resize();
                }

                driver.on_scroll(frame as f32 * 2.0);
                driver.tick(FRAME_MS);
                frame += 1;
            }
            _ = stats_interval.tick() => {
                if let Some(report) = driver.last_report() {
                    info!(
                        frame = report.frame,
                        profile = ?report.profile,
                        points = report.points,
                        nearby = report.nearby,
                        pending = report.lines.pending,
                        steady = report.lines.steady,
                        disappearing = report.lines.disappearing,
                        pointer_batches = report.pointer_batches,
                        ambient_batches = report.ambient_batches,
                        "stats"
                    );
                }
            }
            _ = tokio::signal::ctrl_c() => {
                warn!(frame, "Interrupted");
                interrupted = true;
                break;
            }
        }
    }

    let last_frame = driver.last_report().copied();
    driver.unmount();

    let summary = Summary {
        config,
        frames_run: frame,
        interrupted,
        last_frame,
        host: driver.host().counters(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

//! Depth Bridge CLI
//!
//! Runs a polling consumer against a synthetic depth/color device and
//! reports how many frames each channel delivered.

use clap::Parser;
use depth_bridge::{
    config::FileConfig,
    device::MockDevice,
    frame::{ColorImage, DistanceMap, ValidityMap},
    Acquisition, DepthFormat,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "depth-bridge",
    version,
    about = "Poll depth and color frames from a capture device"
)]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of poll iterations.
    #[arg(short = 'n', long)]
    frames: Option<u32>,

    /// Delay between polls, in milliseconds.
    #[arg(long)]
    poll_ms: Option<u64>,

    /// Device frame interval, in milliseconds.
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Tilt angle to request after start, in degrees.
    #[arg(long, allow_hyphen_values = true)]
    tilt: Option<f32>,

    /// Use the packed 11-bit depth layout.
    #[arg(long)]
    packed: bool,

    /// Port for the Prometheus endpoint (0 disables it).
    #[cfg(feature = "metrics")]
    #[arg(long)]
    metrics_port: Option<u16>,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!("Depth Bridge v{}", depth_bridge::VERSION);

    let mut file_config = match &args.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => FileConfig::default(),
    };

    // Command-line flags override the file
    if let Some(frames) = args.frames {
        file_config.output.poll_count = frames;
    }
    if let Some(poll_ms) = args.poll_ms {
        file_config.output.poll_interval_ms = poll_ms;
    }
    if let Some(interval_ms) = args.interval_ms {
        file_config.mock.frame_interval_ms = interval_ms;
    }
    if args.tilt.is_some() {
        file_config.output.tilt_angle = args.tilt;
    }
    if args.packed {
        file_config.device.depth_format = DepthFormat::Packed11Bit;
    }
    #[cfg(feature = "metrics")]
    if let Some(port) = args.metrics_port {
        file_config.output.metrics_port = port;
    }

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = Arc::clone(&interrupted);
        if let Err(e) = ctrlc::set_handler(move || interrupted.store(true, Ordering::SeqCst)) {
            warn!("Failed to install Ctrl-C handler: {}", e);
        }
    }

    let FileConfig {
        device: device_config,
        mock,
        output,
    } = file_config;

    let device = MockDevice::from_settings(&device_config, &mock);
    let acquisition = match Acquisition::new(device, device_config.clone()) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    #[cfg(feature = "metrics")]
    let metrics = spawn_metrics_server(output.metrics_port);

    if let Err(e) = acquisition.start() {
        eprintln!("Failed to start acquisition: {}", e);
        std::process::exit(1);
    }

    if let Some(angle) = output.tilt_angle {
        acquisition.set_tilt_angle(angle);
    }

    let depth = device_config.depth;
    let color = device_config.color;
    let mut distance = DistanceMap::new(depth.width, depth.height);
    let mut validity = ValidityMap::new(depth.width, depth.height);
    let mut image = ColorImage::new(color.width, color.height);

    let mut depth_received = 0u64;
    let mut color_received = 0u64;
    let mut valid_pixels = 0u64;

    info!(
        polls = output.poll_count,
        interval_ms = output.poll_interval_ms,
        "Polling frames..."
    );

    for i in 0..output.poll_count {
        if interrupted.load(Ordering::SeqCst) {
            warn!("Interrupted after {} polls", i);
            break;
        }

        match acquisition.update_state() {
            Ok(state) => tracing::trace!(
                tilt = state.tilt_angle,
                status = ?state.tilt_status,
                "Device state"
            ),
            Err(e) => warn!("State update failed: {}", e),
        }

        if acquisition.get_depth_map(&mut distance, &mut validity) {
            depth_received += 1;
            valid_pixels += validity.pixels().iter().filter(|&&v| v != 0).count() as u64;
        }
        if acquisition.get_rgb(&mut image) {
            color_received += 1;
        }

        #[cfg(feature = "metrics")]
        if let Some(state) = &metrics {
            state.blocking_write().update(&acquisition.stats());
        }

        if (i + 1) % 50 == 0 {
            info!(
                polls = i + 1,
                depth = depth_received,
                color = color_received,
                "Progress"
            );
        }

        std::thread::sleep(Duration::from_millis(output.poll_interval_ms));
    }

    acquisition.stop();

    let stats = acquisition.stats();
    let valid_ratio = if depth_received > 0 {
        valid_pixels as f64 / (depth_received as f64 * depth.pixel_count() as f64)
    } else {
        0.0
    };

    info!(
        "Received {} depth and {} color frames ({:.1}% valid depth pixels)",
        depth_received,
        color_received,
        valid_ratio * 100.0
    );
    println!(
        "depth: captured={} delivered={} overwritten={} rejected={}",
        stats.capture.depth_frames,
        stats.store.depth.reads,
        stats.store.depth.overwritten,
        stats.capture.depth_rejected
    );
    println!(
        "color: captured={} delivered={} overwritten={} rejected={}",
        stats.capture.color_frames,
        stats.store.color.reads,
        stats.store.color.overwritten,
        stats.capture.color_rejected
    );
}

#[cfg(feature = "metrics")]
fn spawn_metrics_server(
    port: u16,
) -> Option<Arc<tokio::sync::RwLock<depth_bridge::metrics::MetricsState>>> {
    use depth_bridge::metrics::{MetricsRegistry, MetricsServer, MetricsServerConfig};

    if port == 0 {
        return None;
    }

    let registry = match MetricsRegistry::new() {
        Ok(r) => r,
        Err(e) => {
            warn!("Metrics disabled: {}", e);
            return None;
        }
    };
    let server = MetricsServer::new(MetricsServerConfig::with_port(port), registry);
    let state = server.state();

    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                warn!("Metrics runtime failed to start: {}", e);
                return;
            }
        };
        if let Err(e) = runtime.block_on(server.run()) {
            warn!("Metrics server stopped: {}", e);
        }
    });

    Some(state)
}

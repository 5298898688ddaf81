use anyhow::Result;
use orient_config::AppConfig;
use orient_publisher::{Palette, Snapshot, SnapshotPublisher, Subscription};
use orient_sensor::{AngleKind, AngleSampler, AxisRemap, SimulatedSource};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Stand-in presentation layer: reports every tenth snapshot.
async fn present(mut subscription: Subscription) {
    while let Some(snapshot) = subscription.changed().await {
        if snapshot.sequence % 10 == 0 {
            report(&snapshot);
        } else {
            debug!(sequence = snapshot.sequence, "Snapshot received");
        }
    }
    debug!("Presenter detached");
}

fn report(snapshot: &Snapshot) {
    info!(
        sequence = snapshot.sequence,
        samples = snapshot.sample_count,
        accuracy = ?snapshot.accuracy,
        pitch = format_args!("{:.1}", snapshot.pitch.reading.degrees),
        tilt = format_args!("{:.1}", snapshot.tilt.reading.degrees),
        azimuth = format_args!("{:.1}", snapshot.azimuth.reading.degrees),
        history = snapshot.pitch.history.len(),
        pitch_color = ?snapshot.pitch.color,
        tilt_color = ?snapshot.tilt.color,
        azimuth_color = ?snapshot.azimuth.color,
        "Orientation"
    );
    for kind in AngleKind::ALL {
        let angle = snapshot.angle(kind);
        debug!(
            angle = kind.name(),
            normalized = angle.normalized(),
            oldest = angle.history.first().map(|r| r.degrees),
            "History"
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "orient_app=info,orient_sensor=info,orient_publisher=info".into()
            }),
        )
        .init();

    info!("Orientation monitor starting");

    // Load config.
    let config = orient_config::load_config().unwrap_or_else(|e| {
        warn!(?e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    let remap = config.sampler.remap.to_remap().unwrap_or_else(|e| {
        warn!(?e, "Invalid axis remap, using identity");
        AxisRemap::IDENTITY
    });

    info!(
        capacity = config.sampler.history_capacity,
        interval_ms = config.publisher.interval_ms,
        rate_hz = config.sensor.rate_hz,
        "Config loaded"
    );

    let sampler = Arc::new(AngleSampler::new(config.sampler.history_capacity, remap));
    let publisher = Arc::new(SnapshotPublisher::new(sampler.clone(), Palette::default()));

    // Attach to the sensor; without one the publisher still emits zeroed snapshots.
    let mut source = if config.sensor.enabled {
        SimulatedSource::new(config.sensor.rate_hz)
    } else {
        SimulatedSource::unavailable()
    };
    match sampler.start(&mut source) {
        Ok(()) => info!("Rotation sensor attached"),
        Err(e) => warn!(?e, "Rotation sensor not available, publishing default snapshots"),
    }

    let presenter = tokio::spawn(present(publisher.subscribe()));
    let handle = publisher.spawn(config.publisher.interval());

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    sampler.stop(&mut source);
    handle.stop().await;
    report(&publisher.latest());

    drop(publisher);
    presenter.await?;

    // Save config on exit.
    if let Err(e) = orient_config::save_config(&config) {
        error!(?e, "Failed to save config");
    }

    Ok(())
}

//! Scripted placement session against the simulated engine.

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tracing::info;

use arsession::capability::{CapabilityDetector, StaticCapabilities};
use arsession::catalog::demo_item;
use arsession::clock::SystemClock;
use arsession::engine::{
    EngineConfig, EngineFactory, SimulatedEngine, SimulatedEngineConfig,
    SimulatedRecognitionModule, SimulatedScript,
};
use arsession::gesture::TouchPoint;
use arsession::session::{
    PermissionProbe, SessionController, SessionControllerConfig, SessionState, StaticPermission,
};

use super::CommandError;

#[derive(Debug, Args)]
pub struct PlaceArgs {
    /// Frames before the simulated environment reports a surface.
    #[arg(long, default_value_t = 30)]
    surface_after: u32,

    /// Simulated engine module fetch latency in milliseconds.
    #[arg(long, default_value_t = 250)]
    load_delay_ms: u64,

    /// Deny the camera permission prompt.
    #[arg(long)]
    deny_camera: bool,
}

/// Mount, start, place on the first tracked surface, apply one pinch
/// gesture, then end. Ctrl-C at any point ends the session cleanly.
pub async fn run(args: PlaceArgs) -> Result<(), CommandError> {
    let engine = Arc::new(SimulatedEngine::new(SimulatedEngineConfig {
        script: SimulatedScript {
            frames_until_surface: args.surface_after,
            ..SimulatedScript::default()
        },
        ..SimulatedEngineConfig::default()
    }));
    let probe = engine.probe();
    let config = EngineConfig::Simulated {
        engine,
        recognition: Arc::new(SimulatedRecognitionModule::new(
            vec![],
            Duration::from_millis(1),
        )),
        load_delay: Duration::from_millis(args.load_delay_ms),
        fail_module_load: None,
    };

    let permission: Arc<dyn PermissionProbe> = if args.deny_camera {
        Arc::new(StaticPermission::deny())
    } else {
        Arc::new(StaticPermission::allow())
    };

    let mut controller = SessionController::new(
        SessionControllerConfig::default(),
        CapabilityDetector::new(Arc::new(StaticCapabilities::full())),
        permission,
        EngineFactory::immersive(&config),
        Arc::new(SystemClock),
    );

    controller.mount().await?;
    if controller.state() == SessionState::Unsupported {
        info!("device does not support immersive sessions");
        return Ok(());
    }

    let item = demo_item();
    info!(slug = %item.slug, title = %item.title, "starting placement session");
    controller.start(&item).await?;

    // Roughly 30 frames per second, matching a host frame callback.
    let mut frames = tokio::time::interval(Duration::from_millis(33));
    let record = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                controller.end().await;
                return Ok(());
            }
            _ = frames.tick() => {
                if let Some(pose) = controller.on_frame() {
                    info!(position = ?pose.position, "surface tracked");
                    break controller.commit_placement()?;
                }
            }
        }
    };
    info!(position = ?record.pose.position, "object placed");

    // One pinch-and-twist gesture over the placed object.
    controller.on_gesture_start(&[
        TouchPoint::new(1, 0.0, 0.0),
        TouchPoint::new(2, 100.0, 0.0),
    ]);
    if let Some(transform) = controller.on_gesture_move(&[
        TouchPoint::new(1, 0.0, 0.0),
        TouchPoint::new(2, 150.0, 50.0),
    ]) {
        info!(
            scale = transform.scale,
            rotation = transform.rotation,
            "gesture applied"
        );
    }
    controller.on_gesture_end(&[]);

    controller.end().await;
    info!(
        sessions_started = probe.sessions_started(),
        sessions_ended = probe.sessions_ended(),
        transitions = ?controller.transitions(),
        "session closed"
    );
    Ok(())
}

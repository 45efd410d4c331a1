//! Scripted image-target scan against the simulated recognizer.

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tracing::info;

use arsession::catalog::demo_item;
use arsession::engine::{
    EngineConfig, EngineFactory, SimulatedEngine, SimulatedEngineConfig,
    SimulatedRecognitionModule, TargetEvent,
};
use arsession::scan::ScanController;

use super::CommandError;

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Comma-separated found/lost script played back by the recognizer.
    #[arg(long, default_value = "found,lost,found")]
    events: String,

    /// Milliseconds between scripted events.
    #[arg(long, default_value_t = 500)]
    event_interval_ms: u64,

    /// Scan an item with no tracking target configured (exercises the
    /// configuration error path).
    #[arg(long)]
    missing_target: bool,
}

fn parse_script(events: &str) -> Result<Vec<TargetEvent>, CommandError> {
    events
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| match token {
            "found" => Ok(TargetEvent::Found),
            "lost" => Ok(TargetEvent::Lost),
            other => Err(format!("unknown target event `{other}` (expected found|lost)").into()),
        })
        .collect()
}

/// Start a scan, pump the scripted found/lost events through the
/// controller, then stop. Ctrl-C stops the scan early.
pub async fn run(args: ScanArgs) -> Result<(), CommandError> {
    let script = parse_script(&args.events)?;
    let module = Arc::new(SimulatedRecognitionModule::new(
        script,
        Duration::from_millis(args.event_interval_ms),
    ));
    let config = EngineConfig::simulated(
        Arc::new(SimulatedEngine::new(SimulatedEngineConfig::default())),
        module,
    );
    let mut controller = ScanController::new(EngineFactory::recognition(&config));

    let mut item = demo_item();
    if !args.missing_target {
        item.target_locator = Some("targets/demo-cube.mind".to_string());
    }

    info!(slug = %item.slug, "starting scan");
    controller.start(&item).await?;

    let mut stream = controller
        .take_events()
        .ok_or("recognition event stream unavailable")?;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
            event = stream.recv() => match event {
                Some(event) => {
                    controller.on_target_event(event);
                    info!(state = %controller.state(), "target event applied");
                }
                None => break,
            },
        }
    }

    controller.stop().await;
    info!(transitions = ?controller.transitions(), "scan finished");
    Ok(())
}

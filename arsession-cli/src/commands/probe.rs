//! Capability report for a simulated device.

use std::sync::Arc;

use clap::{Args, ValueEnum};
use tracing::info;

use arsession::capability::{
    CapabilityDetector, PlatformClass, StaticCapabilities, Support,
};

use super::CommandError;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Platform {
    Ios,
    Android,
    Other,
}

impl From<Platform> for PlatformClass {
    fn from(platform: Platform) -> Self {
        match platform {
            Platform::Ios => PlatformClass::IosLike,
            Platform::Android => PlatformClass::AndroidLike,
            Platform::Other => PlatformClass::Other,
        }
    }
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Report immersive sessions as unsupported.
    #[arg(long)]
    unsupported: bool,

    /// Report the camera as unavailable.
    #[arg(long)]
    no_camera: bool,

    /// Report the capability probes as inconclusive (fails closed).
    #[arg(long)]
    unknown: bool,

    /// Device class to report.
    #[arg(long, value_enum, default_value_t = Platform::Android)]
    platform: Platform,
}

pub async fn run(args: ProbeArgs) -> Result<(), CommandError> {
    let answer = |negative: bool| {
        if args.unknown {
            Support::Unknown
        } else if negative {
            Support::Unsupported
        } else {
            Support::Supported
        }
    };
    let provider = StaticCapabilities {
        immersive: answer(args.unsupported),
        camera: answer(args.no_camera),
        platform: args.platform.into(),
    };
    let detector = CapabilityDetector::new(Arc::new(provider));

    info!(
        immersive = detector.check_immersive_support().await,
        camera = detector.check_camera_available().await,
        platform = ?detector.classify_platform(),
        "capability report"
    );
    Ok(())
}

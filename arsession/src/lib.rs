//! ARSession - real-time augmented-reality interaction engine
//!
//! This library manages the lifecycle of immersive AR interactions: it
//! detects device capabilities, defers loading of heavy render/tracking
//! runtimes until an experience is actually requested, runs the per-frame
//! hit-test loop that finds placement surfaces, commits one-shot object
//! placements, converts two-finger gestures into composed object
//! transforms, and drives image-target tracking in scan mode.
//!
//! The underlying 3D and recognition runtimes are opaque engines behind the
//! [`engine`] trait contracts; the core drives them and recovers from their
//! failures but never reimplements rendering or computer vision.

pub mod capability;
pub mod catalog;
pub mod clock;
pub mod engine;
pub mod gesture;
pub mod pose;
pub mod resource;
pub mod scan;
pub mod session;
pub mod telemetry;

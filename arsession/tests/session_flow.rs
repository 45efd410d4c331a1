//! End-to-end lifecycle scenarios against the simulated engine.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;

use arsession::capability::{CapabilityDetector, StaticCapabilities};
use arsession::catalog::demo_item;
use arsession::clock::SystemClock;
use arsession::engine::{
    EngineConfig, EngineFactory, ImmersiveEngine, SessionProbe, SimulatedEngine,
    SimulatedEngineConfig, SimulatedRecognitionModule,
};
use arsession::gesture::TouchPoint;
use arsession::resource::{ResourceHandle, ResourceState};
use arsession::session::{
    CommitRejected, PermissionProbe, SessionController, SessionControllerConfig, SessionState,
    StaticPermission,
};

/// Permission probe that counts prompts.
#[derive(Default)]
struct CountingPermission {
    prompts: AtomicU32,
    granted: bool,
}

impl CountingPermission {
    fn allowing() -> Self {
        Self {
            prompts: AtomicU32::new(0),
            granted: true,
        }
    }
}

impl PermissionProbe for CountingPermission {
    fn request_camera(&self) -> BoxFuture<'_, bool> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        let granted = self.granted;
        async move { granted }.boxed()
    }
}

/// Permission probe whose prompt never resolves.
struct PendingPermission;

impl PermissionProbe for PendingPermission {
    fn request_camera(&self) -> BoxFuture<'_, bool> {
        futures::future::pending().boxed()
    }
}

struct Setup {
    controller: SessionController,
    probe: Arc<SessionProbe>,
    engine_handle: Arc<ResourceHandle<dyn ImmersiveEngine>>,
}

fn setup_with(
    capabilities: StaticCapabilities,
    permission: Arc<dyn PermissionProbe>,
    engine_config: SimulatedEngineConfig,
) -> Setup {
    let probe = Arc::clone(&engine_config.probe);
    let config = EngineConfig::simulated(
        Arc::new(SimulatedEngine::new(engine_config)),
        Arc::new(SimulatedRecognitionModule::new(
            vec![],
            Duration::from_millis(1),
        )),
    );
    let engine_handle = EngineFactory::immersive(&config);
    let controller = SessionController::new(
        SessionControllerConfig::default(),
        CapabilityDetector::new(Arc::new(capabilities)),
        permission,
        Arc::clone(&engine_handle),
        Arc::new(SystemClock),
    );
    Setup {
        controller,
        probe,
        engine_handle,
    }
}

fn setup() -> Setup {
    setup_with(
        StaticCapabilities::full(),
        Arc::new(StaticPermission::allow()),
        SimulatedEngineConfig::default(),
    )
}

/// Drive frames until a reticle pose appears.
fn frames_until_surface(controller: &mut SessionController) {
    for _ in 0..16 {
        if controller.on_frame().is_some() {
            return;
        }
    }
    panic!("no surface found within the scripted frame count");
}

#[tokio::test]
async fn test_unsupported_device_sequence() {
    let permission = Arc::new(CountingPermission::allowing());
    let mut setup = setup_with(
        StaticCapabilities::none(),
        Arc::clone(&permission) as Arc<dyn PermissionProbe>,
        SimulatedEngineConfig::default(),
    );

    setup.controller.mount().await.unwrap();
    assert_eq!(
        setup.controller.transitions(),
        &[
            SessionState::Idle,
            SessionState::CheckingSupport,
            SessionState::Unsupported,
        ]
    );
    // No permission prompt was ever issued.
    assert_eq!(permission.prompts.load(Ordering::SeqCst), 0);
    assert_eq!(setup.engine_handle.state(), ResourceState::NotLoaded);
}

#[tokio::test]
async fn test_full_placement_flow() {
    let mut setup = setup();
    let controller = &mut setup.controller;

    controller.mount().await.unwrap();
    controller.start(&demo_item()).await.unwrap();
    assert_eq!(controller.state(), SessionState::Active);

    frames_until_surface(controller);
    assert!(controller.reticle_pose().is_some());

    let record = controller.commit_placement().unwrap();
    assert_eq!(controller.state(), SessionState::Placed);
    assert_eq!(record.pose.position.z, -1.0);
    assert!(controller.reticle_pose().is_none());

    // Demo item has no physical dimensions: the visibility default applies.
    let (pose, scale) = setup.probe.placed().unwrap();
    assert_eq!(pose, record.pose);
    assert_eq!(scale, 0.5);

    assert_eq!(
        controller.transitions(),
        &[
            SessionState::Idle,
            SessionState::CheckingSupport,
            SessionState::ReadyToStart,
            SessionState::RequestingPermission,
            SessionState::Active,
            SessionState::Placed,
        ]
    );

    controller.end().await;
    assert_eq!(controller.state(), SessionState::Ended);
    assert_eq!(setup.probe.sessions_ended(), 1);
}

#[tokio::test]
async fn test_physical_dimensions_drive_fit_scale() {
    let mut setup = setup();
    let mut item = demo_item();
    item.width_m = Some(0.4);
    item.height_m = Some(0.3);
    item.depth_m = Some(0.2);

    setup.controller.mount().await.unwrap();
    setup.controller.start(&item).await.unwrap();
    frames_until_surface(&mut setup.controller);
    setup.controller.commit_placement().unwrap();

    // Model bounding max is 2.0 in the default script: 0.4 / 2.0.
    let (_, scale) = setup.probe.placed().unwrap();
    assert!((scale - 0.2).abs() < 1e-12);
}

#[tokio::test]
async fn test_placement_is_single_shot() {
    let mut setup = setup();
    setup.controller.mount().await.unwrap();
    setup.controller.start(&demo_item()).await.unwrap();
    frames_until_surface(&mut setup.controller);

    let record = setup.controller.commit_placement().unwrap();
    assert_eq!(
        setup.controller.commit_placement(),
        Err(CommitRejected::AlreadyPlaced)
    );
    assert_eq!(setup.controller.placement().unwrap().pose, record.pose);
}

#[tokio::test]
async fn test_commit_without_candidate_is_rejected() {
    let mut setup = setup();
    setup.controller.mount().await.unwrap();
    setup.controller.start(&demo_item()).await.unwrap();

    // No frame delivered a surface yet.
    assert_eq!(
        setup.controller.commit_placement(),
        Err(CommitRejected::NoCandidatePose)
    );
    assert_eq!(setup.controller.state(), SessionState::Active);
}

#[tokio::test]
async fn test_permission_requested_before_engine_load() {
    let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

    struct OrderedPermission {
        order: Arc<Mutex<Vec<&'static str>>>,
    }
    impl PermissionProbe for OrderedPermission {
        fn request_camera(&self) -> BoxFuture<'_, bool> {
            self.order.lock().push("permission");
            async { true }.boxed()
        }
    }

    let engine = Arc::new(SimulatedEngine::new(SimulatedEngineConfig::default()));
    let loader_order = Arc::clone(&order);
    let engine_handle: Arc<ResourceHandle<dyn ImmersiveEngine>> =
        Arc::new(ResourceHandle::new("immersive-engine", move || {
            loader_order.lock().push("engine-load");
            let engine = Arc::clone(&engine);
            async move { Ok(engine as Arc<dyn ImmersiveEngine>) }
        }));

    let mut controller = SessionController::new(
        SessionControllerConfig::default(),
        CapabilityDetector::new(Arc::new(StaticCapabilities::full())),
        Arc::new(OrderedPermission {
            order: Arc::clone(&order),
        }),
        engine_handle,
        Arc::new(SystemClock),
    );

    controller.mount().await.unwrap();
    controller.start(&demo_item()).await.unwrap();
    assert_eq!(&*order.lock(), &["permission", "engine-load"]);
}

#[tokio::test]
async fn test_end_before_active_still_tears_down() {
    let mut setup = setup();
    setup.controller.mount().await.unwrap();
    assert_eq!(setup.controller.state(), SessionState::ReadyToStart);

    setup.controller.end().await;
    assert_eq!(setup.controller.state(), SessionState::Ended);
    // Nothing was leaked because nothing was acquired.
    assert_eq!(setup.engine_handle.state(), ResourceState::NotLoaded);
    assert_eq!(setup.probe.sessions_started(), 0);

    // Ending is idempotent.
    setup.controller.end().await;
    assert_eq!(setup.controller.state(), SessionState::Ended);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_mid_start_discards_pending_result() {
    let mut setup = setup_with(
        StaticCapabilities::full(),
        Arc::new(PendingPermission),
        SimulatedEngineConfig::default(),
    );
    setup.controller.mount().await.unwrap();

    let token = setup.controller.cancel_token();
    let item = demo_item();
    let (start_result, _) = tokio::join!(setup.controller.start(&item), async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();
    });

    // The cancelled start converges on the normal end path.
    start_result.unwrap();
    assert_eq!(setup.controller.state(), SessionState::Ended);
    assert_eq!(setup.engine_handle.state(), ResourceState::NotLoaded);
    assert_eq!(setup.probe.sessions_started(), 0);
}

#[tokio::test]
async fn test_frames_ignored_after_end() {
    let mut setup = setup();
    setup.controller.mount().await.unwrap();
    setup.controller.start(&demo_item()).await.unwrap();
    frames_until_surface(&mut setup.controller);

    setup.controller.end().await;
    assert!(setup.controller.on_frame().is_none());
    assert!(setup.controller.reticle_pose().is_none());
}

#[tokio::test]
async fn test_restart_discards_placement_and_supports_new_session() {
    let mut setup = setup();
    setup.controller.mount().await.unwrap();
    setup.controller.start(&demo_item()).await.unwrap();
    frames_until_surface(&mut setup.controller);
    setup.controller.commit_placement().unwrap();
    setup.controller.end().await;

    setup.controller.restart().unwrap();
    assert_eq!(setup.controller.state(), SessionState::ReadyToStart);
    assert!(setup.controller.placement().is_none());

    // A fresh session reaches Placed again; the engine module was loaded
    // exactly once and reused.
    setup.controller.start(&demo_item()).await.unwrap();
    frames_until_surface(&mut setup.controller);
    setup.controller.commit_placement().unwrap();
    assert_eq!(setup.controller.state(), SessionState::Placed);
    assert_eq!(setup.probe.sessions_started(), 2);
}

#[tokio::test]
async fn test_gesture_transform_forwarded_once_placed() {
    let mut setup = setup();
    setup.controller.mount().await.unwrap();
    setup.controller.start(&demo_item()).await.unwrap();
    frames_until_surface(&mut setup.controller);
    setup.controller.commit_placement().unwrap();

    setup.controller.on_gesture_start(&[
        TouchPoint::new(1, 0.0, 0.0),
        TouchPoint::new(2, 100.0, 0.0),
    ]);
    let transform = setup
        .controller
        .on_gesture_move(&[
            TouchPoint::new(1, 0.0, 0.0),
            TouchPoint::new(2, 150.0, 50.0),
        ])
        .unwrap();
    setup.controller.on_gesture_end(&[]);

    assert!((transform.scale - 1.5811).abs() < 1e-3);
    assert!((transform.rotation - 0.3217).abs() < 1e-3);
    assert_eq!(setup.probe.last_transform().unwrap(), transform);
}

#[tokio::test]
async fn test_module_load_failure_is_retryable_after_restart() {
    let engine = Arc::new(SimulatedEngine::new(SimulatedEngineConfig::default()));
    let attempts = Arc::new(AtomicU32::new(0));
    let loader_attempts = Arc::clone(&attempts);
    let engine_handle: Arc<ResourceHandle<dyn ImmersiveEngine>> =
        Arc::new(ResourceHandle::new("immersive-engine", move || {
            let attempt = loader_attempts.fetch_add(1, Ordering::SeqCst);
            let engine = Arc::clone(&engine);
            async move {
                if attempt == 0 {
                    Err(arsession::resource::ResourceError::load_failed(
                        "network down",
                    ))
                } else {
                    Ok(engine as Arc<dyn ImmersiveEngine>)
                }
            }
        }));

    let mut controller = SessionController::new(
        SessionControllerConfig::default(),
        CapabilityDetector::new(Arc::new(StaticCapabilities::full())),
        Arc::new(StaticPermission::allow()),
        engine_handle,
        Arc::new(SystemClock),
    );

    controller.mount().await.unwrap();
    let err = controller.start(&demo_item()).await.unwrap_err();
    assert!(err.to_string().contains("network down"));
    assert_eq!(controller.state(), SessionState::Error);

    controller.restart().unwrap();
    controller.start(&demo_item()).await.unwrap();
    assert_eq!(controller.state(), SessionState::Active);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

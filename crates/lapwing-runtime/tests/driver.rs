//! Frame driver on a paused tokio clock

use std::time::Duration;

use lapwing_runtime::{AvatarConfig, AvatarRuntime, FrameDriver};
use lapwing_visual::{ClipLibrary, PoseConfig, SkeletonRig};
use tokio::sync::watch;

fn runtime() -> AvatarRuntime<SkeletonRig> {
    let mut config = AvatarConfig::default();
    config.blinking.seed = Some(5);
    let clips = ClipLibrary::load([("Neutral_A", 2.0), ("Thinking_A", 2.0)], &PoseConfig::default());
    AvatarRuntime::new(SkeletonRig::character(), &clips, &config).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_driver_runs_until_shutdown() {
    let runtime = runtime();
    let inputs = runtime.inputs();
    let driver = FrameDriver::new(runtime, 60.0);
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        inputs.set_pose(Some("Thinking_A"));
        tokio::time::sleep(Duration::from_millis(500)).await;
        let _ = tx.send(true);
    });

    let runtime = driver.run(rx).await;

    let frames = runtime.stats().frames;
    assert!((55..=65).contains(&frames), "frames = {frames}");
    assert!((runtime.state().elapsed() - 1.0).abs() < 0.05);
    assert_eq!(runtime.stats().pose_transitions, 1);
    assert_eq!(runtime.state().poses().current(), Some("Thinking_A"));
}

#[tokio::test(start_paused = true)]
async fn test_dropped_sender_stops_driver() {
    let driver = FrameDriver::new(runtime(), 30.0);
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        drop(tx);
    });

    let runtime = driver.run(rx).await;
    assert!(runtime.stats().frames >= 5);
}

#[tokio::test(start_paused = true)]
async fn test_already_shut_down() {
    let driver = FrameDriver::new(runtime(), 60.0);
    let (_tx, rx) = watch::channel(true);

    let runtime = driver.run(rx).await;
    assert_eq!(runtime.stats().frames, 0);
}

use std::sync::Arc;
use std::time::Duration;

use thermwatch::core::thermal::{
    ChannelId, EngineHandle, EnginePhase, EngineRuntime, EngineSettings, FanLevel,
    NotificationSink, SeverityLevel,
};
use thermwatch::ThermError;

use super::common::{settings, HangingSink, RecordingFan, RecordingSink, ScriptedSource};

fn fast_settings() -> EngineSettings {
    EngineSettings {
        sampling_interval: Duration::from_millis(20),
        delivery_timeout: Duration::from_millis(500),
        ..settings()
    }
}

async fn wait_for_cycles(handle: &EngineHandle, cycles: u64) {
    let mut snapshots = handle.snapshots();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if snapshots.borrow_and_update().stats.cycles >= cycles {
                return;
            }
            if snapshots.changed().await.is_err() {
                return;
            }
        }
    })
    .await
    .expect("engine did not reach the expected cycle count");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_runtime_publishes_snapshots_and_history() {
    let fan = RecordingFan::default();
    let runtime = EngineRuntime::start(
        fast_settings(),
        Box::new(ScriptedSource::new(&[Some(40.0), Some(46.0)])),
        Box::new(fan.clone()),
        Vec::new(),
    )
    .unwrap();
    let handle = runtime.handle();

    wait_for_cycles(&handle, 3).await;

    let snapshot = handle.current_snapshot();
    assert_eq!(snapshot.severity, SeverityLevel::High);
    assert_eq!(snapshot.fan_level, FanLevel::High);
    assert_eq!(snapshot.last_reading, Some(46.0));
    assert!(snapshot.last_sample_time.is_some());
    assert!(handle.history_recent(2).len() == 2);

    let stats = runtime.shutdown().await.unwrap();
    assert!(stats.cycles >= 3);

    // fan switched off on the way out
    assert_eq!(fan.commands.lock().last(), Some(&FanLevel::Idle));
    assert_eq!(handle.current_snapshot().phase, EnginePhase::Stopped);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_alerts_are_delivered_once_per_cooldown() {
    let sink = RecordingSink::default();
    let sinks: Vec<(ChannelId, Arc<dyn NotificationSink>)> =
        vec![(ChannelId::new("email"), Arc::new(sink.clone()))];

    let runtime = EngineRuntime::start(
        fast_settings(),
        // a few normal cycles before the subscription can miss anything
        Box::new(ScriptedSource::new(&[
            Some(40.0),
            Some(40.0),
            Some(40.0),
            Some(40.0),
            Some(55.0),
        ])),
        Box::new(RecordingFan::default()),
        sinks,
    )
    .unwrap();
    let handle = runtime.handle();
    let mut alerts = handle.subscribe_alerts();

    let pushed = tokio::time::timeout(Duration::from_secs(5), alerts.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pushed.severity, SeverityLevel::Critical);
    assert_eq!(pushed.channel.as_str(), "email");

    wait_for_cycles(&handle, 10).await;
    let stats = runtime.shutdown().await.unwrap();

    // the 300s critical cooldown holds for the whole test
    assert_eq!(sink.delivered.lock().len(), 1);
    assert_eq!(stats.alerts_triggered, 1);
    assert_eq!(stats.alerts_delivered, 1);

    let pending = handle.pending_alerts();
    assert_eq!(pending.len(), 1);
    assert!(handle.pending_alerts().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failed_delivery_is_retried() {
    let sink = RecordingSink::failing(2);
    let sinks: Vec<(ChannelId, Arc<dyn NotificationSink>)> =
        vec![(ChannelId::new("chat"), Arc::new(sink.clone()))];

    let runtime = EngineRuntime::start(
        fast_settings(),
        Box::new(ScriptedSource::new(&[Some(48.0)])),
        Box::new(RecordingFan::default()),
        sinks,
    )
    .unwrap();
    let handle = runtime.handle();

    tokio::time::timeout(Duration::from_secs(5), async {
        while sink.delivered.lock().is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("alert was never delivered");

    // let the outcome reach the engine
    let target = handle.current_snapshot().stats.cycles + 2;
    wait_for_cycles(&handle, target).await;

    let stats = runtime.shutdown().await.unwrap();
    assert_eq!(stats.delivery_failures, 2);
    assert_eq!(stats.alerts_delivered, 1);
    assert_eq!(sink.delivered.lock().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_hung_sink_does_not_stall_sampling() {
    let sink = HangingSink::default();
    let sinks: Vec<(ChannelId, Arc<dyn NotificationSink>)> =
        vec![(ChannelId::new("email"), Arc::new(sink.clone()))];

    let settings = EngineSettings {
        delivery_timeout: Duration::from_millis(30),
        ..fast_settings()
    };
    let runtime = EngineRuntime::start(
        settings,
        Box::new(ScriptedSource::new(&[Some(55.0)])),
        Box::new(RecordingFan::default()),
        sinks,
    )
    .unwrap();
    let handle = runtime.handle();

    // 300ms per attempt; 15 cycles at 20ms only fit if sampling never waits on the sink
    let started = std::time::Instant::now();
    wait_for_cycles(&handle, 15).await;
    assert!(started.elapsed() < Duration::from_millis(1500));

    let stats = runtime.shutdown().await.unwrap();
    assert!(stats.cycles >= 15);
    assert!(stats.delivery_failures >= 1);
    assert_eq!(stats.alerts_delivered, 0);
    assert!(stats.alerts_triggered >= 2);
    assert!(*sink.attempts.lock() >= 2);
}

#[tokio::test]
async fn test_reset_stats_command() {
    let runtime = EngineRuntime::start(
        fast_settings(),
        Box::new(ScriptedSource::new(&[Some(40.0)])),
        Box::new(RecordingFan::default()),
        Vec::new(),
    )
    .unwrap();
    let handle = runtime.handle();

    wait_for_cycles(&handle, 2).await;
    let started_at = handle.current_snapshot().stats.started_at;
    tokio::time::sleep(Duration::from_millis(5)).await;
    handle.reset_stats().await.unwrap();

    let mut snapshots = handle.snapshots();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if snapshots.borrow_and_update().stats.started_at > started_at {
                return;
            }
            snapshots.changed().await.unwrap();
        }
    })
    .await
    .expect("statistics were not reset");

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_zero_interval_rejected() {
    let settings = EngineSettings {
        sampling_interval: Duration::ZERO,
        ..settings()
    };
    let result = EngineRuntime::start(
        settings,
        Box::new(ScriptedSource::new(&[])),
        Box::new(RecordingFan::default()),
        Vec::new(),
    );
    assert!(matches!(result, Err(ThermError::ConfigInvalid(_))));
}

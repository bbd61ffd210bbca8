use thermwatch::core::thermal::{
    ActuationOutcome, ChannelId, CooldownConfig, EngineSettings, FanLevel, SeverityLevel,
    ThermalEngine, ThresholdConfig,
};
use thermwatch::ThermError;

use super::common::{at, settings, RecordingFan, ScriptedSource};

fn engine_with(
    readings: &[Option<f32>],
    settings: &EngineSettings,
    fan: RecordingFan,
) -> ThermalEngine {
    ThermalEngine::new(
        settings,
        Box::new(ScriptedSource::new(readings)),
        Box::new(fan),
        vec![ChannelId::new("email"), ChannelId::new("chat")],
    )
    .unwrap()
}

#[test]
fn test_hysteresis_scenario_drives_fan() {
    use SeverityLevel::*;

    let readings = [40.0, 46.0, 52.0, 48.0, 44.0, 39.0];
    let fan = RecordingFan::default();
    let mut engine = engine_with(
        &readings.map(Some),
        &settings(),
        fan.clone(),
    );

    let severities: Vec<_> = (0..readings.len())
        .map(|i| engine.run_cycle(at(i as i64 * 30)).severity)
        .collect();
    assert_eq!(severities, vec![Normal, High, Critical, Critical, High, Normal]);

    // one command per level change only
    assert_eq!(
        *fan.commands.lock(),
        vec![
            FanLevel::Idle,
            FanLevel::High,
            FanLevel::Critical,
            FanLevel::High,
            FanLevel::Idle,
        ]
    );
    assert_eq!(engine.stats().fan_cycles, 1);
    assert_eq!(engine.stats().min_temp, Some(39.0));
    assert_eq!(engine.stats().max_temp, Some(52.0));
}

#[test]
fn test_read_error_mid_sequence_keeps_state() {
    let fan = RecordingFan::default();
    let mut engine = engine_with(&[Some(46.0), None, None, Some(46.5)], &settings(), fan.clone());

    engine.run_cycle(at(0));
    for i in 1..=2 {
        let report = engine.run_cycle(at(i * 30));
        assert!(report.is_degraded());
        assert_eq!(report.severity, SeverityLevel::High);
        assert_eq!(report.fan_level, FanLevel::High);
        assert_eq!(report.actuation, ActuationOutcome::Skipped);
    }
    engine.run_cycle(at(90));

    let history = engine.history().all();
    assert_eq!(history.len(), 4);
    assert_eq!(
        history.iter().map(|s| s.degraded).collect::<Vec<_>>(),
        vec![false, true, true, false]
    );
    assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert_eq!(*fan.commands.lock(), vec![FanLevel::High]);
    assert!(!engine.snapshot().degraded);
}

#[test]
fn test_critical_cooldown_per_channel() {
    let settings = EngineSettings {
        cooldowns: CooldownConfig {
            critical_secs: 300,
            ..Default::default()
        },
        ..settings()
    };
    let mut engine = engine_with(&[Some(55.0)], &settings, RecordingFan::default());

    let first = engine.run_cycle(at(0));
    assert_eq!(first.intents.len(), 2);
    for intent in &first.intents {
        engine.confirm_delivery(intent);
    }

    assert!(engine.run_cycle(at(100)).intents.is_empty());

    let third = engine.run_cycle(at(301));
    assert_eq!(third.intents.len(), 2);
    assert!(third
        .intents
        .iter()
        .all(|i| i.severity == SeverityLevel::Critical));
}

#[test]
fn test_failed_delivery_is_retried_next_cycle() {
    let mut engine = engine_with(&[Some(55.0)], &settings(), RecordingFan::default());

    let first = engine.run_cycle(at(0));
    for intent in &first.intents {
        engine.delivery_failed(intent, "timeout");
    }

    let retry = engine.run_cycle(at(1));
    assert_eq!(retry.intents.len(), 2);
    assert_eq!(engine.stats().delivery_failures, 2);
}

#[test]
fn test_return_to_normal_allows_immediate_alert() {
    let mut engine = engine_with(
        &[Some(55.0), Some(30.0), Some(55.0)],
        &settings(),
        RecordingFan::default(),
    );

    let first = engine.run_cycle(at(0));
    for intent in &first.intents {
        engine.confirm_delivery(intent);
    }
    assert!(engine.run_cycle(at(30)).intents.is_empty());

    let again = engine.run_cycle(at(60));
    assert_eq!(again.intents.len(), 2);
    assert!(again.intents[0].episode > first.intents[0].episode);
}

#[test]
fn test_overlapping_bands_block_startup() {
    let settings = EngineSettings {
        thresholds: ThresholdConfig {
            high_enter: 45.0,
            high_exit: 42.0,
            critical_enter: 50.0,
            critical_exit: 44.0,
        },
        ..settings()
    };
    let result = ThermalEngine::new(
        &settings,
        Box::new(ScriptedSource::new(&[])),
        Box::new(RecordingFan::default()),
        Vec::new(),
    );
    assert!(matches!(result, Err(ThermError::ConfigInvalid(_))));
}

#[test]
fn test_huge_cooldowns_never_realert() {
    for high_secs in [10_000_000_000_000_000, u64::MAX] {
        let settings = EngineSettings {
            cooldowns: CooldownConfig {
                high_secs,
                ..Default::default()
            },
            ..settings()
        };
        let mut engine = engine_with(&[Some(46.0)], &settings, RecordingFan::default());

        let first = engine.run_cycle(at(0));
        assert_eq!(first.intents.len(), 2);
        for intent in &first.intents {
            engine.confirm_delivery(intent);
        }

        assert!(engine.run_cycle(at(30)).intents.is_empty());
    }
}

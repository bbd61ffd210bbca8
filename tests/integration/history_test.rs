use chrono::Duration;
use thermwatch::core::thermal::{FanLevel, HistoryRing, Sample, SeverityLevel, SharedHistory, Window};

use super::common::at;

fn sample(secs: i64, temperature: f32) -> Sample {
    Sample {
        timestamp: at(secs),
        temperature: Some(temperature),
        severity: SeverityLevel::Normal,
        fan_level: FanLevel::Idle,
        degraded: false,
    }
}

#[test]
fn test_size_is_min_of_appends_and_capacity() {
    for (appends, capacity) in [(3usize, 5usize), (5, 5), (12, 5), (1, 1)] {
        let mut ring = HistoryRing::with_capacity(capacity);
        for i in 0..appends {
            ring.append(sample(i as i64, 40.0));
        }
        assert_eq!(ring.len(), appends.min(capacity));
        // oldest evicted first
        let first = ring.iter().next().unwrap();
        assert_eq!(first.timestamp, at(appends.saturating_sub(capacity) as i64));
    }
}

#[test]
fn test_range_query_is_restartable() {
    let mut ring = HistoryRing::with_capacity(10);
    for i in 0..10 {
        ring.append(sample(i * 30, 40.0 + i as f32));
    }

    let window = ring.query(at(60), at(150));
    let first_pass: Vec<_> = window.clone().map(|s| s.timestamp).collect();
    let second_pass: Vec<_> = window.map(|s| s.timestamp).collect();
    assert_eq!(first_pass, vec![at(60), at(90), at(120), at(150)]);
    assert_eq!(first_pass, second_pass);
}

#[test]
fn test_aggregate_skips_degraded_samples() {
    let history = SharedHistory::new(8);
    history.append(sample(0, 40.0));
    history.append(sample(30, 50.0));
    history.append(Sample::degraded(at(60), Some(50.0), SeverityLevel::Normal, FanLevel::Idle));
    history.append(sample(90, 45.0));

    let agg = history.aggregate(Window::Count(4), at(90)).unwrap();
    assert_eq!(agg.count, 3);
    assert_eq!(agg.min, 40.0);
    assert_eq!(agg.max, 50.0);
    assert!((agg.mean - 45.0).abs() < 1e-4);

    let recent = history
        .aggregate(Window::Duration(Duration::seconds(45)), at(90))
        .unwrap();
    assert_eq!(recent.count, 1);
    assert_eq!(recent.max, 45.0);
}

#[test]
fn test_backwards_clock_is_clamped() {
    let history = SharedHistory::new(4);
    history.append(sample(100, 40.0));
    history.append(sample(50, 41.0));

    let all = history.all();
    assert_eq!(all[1].timestamp, at(100));
    assert_eq!(all[1].temperature, Some(41.0));
}

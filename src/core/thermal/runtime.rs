//! Tokio driver for the thermal engine.
//!
//! A single task owns the [`ThermalEngine`] and runs one cycle per tick.
//! Alert deliveries run as independent, time-bounded tasks whose outcomes are
//! sent back to the engine task, so a slow sink never delays sampling.
//! Readers go through [`EngineHandle`].

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::alerts::{AlertIntent, ChannelId};
use super::cooling::FanActuator;
use super::delivery::{deliver_with_timeout, DeliveryOutcome, NotificationSink};
use super::engine::{EngineSettings, ThermalEngine};
use super::history::{Aggregate, SharedHistory, Window};
use super::sampler::TemperatureSource;
use super::types::{EngineSnapshot, EngineStats, Sample};
use crate::error::{Result, ThermError};

/// Undelivered intents kept for polling readers
pub const PENDING_ALERT_CAPACITY: usize = 256;

/// Requests from readers that mutate engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCommand {
    ResetStats,
}

type SinkMap = HashMap<ChannelId, Arc<dyn NotificationSink>>;

/// Read-side handle to a running engine. Cheap to clone.
#[derive(Clone)]
pub struct EngineHandle {
    snapshot_rx: watch::Receiver<Arc<EngineSnapshot>>,
    history: SharedHistory,
    alerts_tx: broadcast::Sender<AlertIntent>,
    pending: Arc<Mutex<VecDeque<AlertIntent>>>,
    commands_tx: mpsc::Sender<EngineCommand>,
    shutdown_tx: broadcast::Sender<()>,
}

impl EngineHandle {
    pub fn current_snapshot(&self) -> Arc<EngineSnapshot> {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver that is notified after every published snapshot
    pub fn snapshots(&self) -> watch::Receiver<Arc<EngineSnapshot>> {
        self.snapshot_rx.clone()
    }

    pub fn history_range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<Sample> {
        self.history.range(from, to)
    }

    pub fn history_recent(&self, n: usize) -> Vec<Sample> {
        self.history.recent(n)
    }

    pub fn history_since(&self, window: ChronoDuration) -> Vec<Sample> {
        self.history.since(Utc::now(), window)
    }

    pub fn aggregate(&self, window: Window) -> Option<Aggregate> {
        self.history.aggregate(window, Utc::now())
    }

    /// Alert intents emitted since the last call
    pub fn pending_alerts(&self) -> Vec<AlertIntent> {
        self.pending.lock().drain(..).collect()
    }

    /// Push subscription to alert intents as they are emitted
    pub fn subscribe_alerts(&self) -> broadcast::Receiver<AlertIntent> {
        self.alerts_tx.subscribe()
    }

    pub async fn reset_stats(&self) -> Result<()> {
        self.commands_tx
            .send(EngineCommand::ResetStats)
            .await
            .map_err(|_| ThermError::engine("engine is not running"))
    }

    /// Ask the engine to stop after the current cycle
    pub fn request_shutdown(&self) {
        // send() only fails when the engine task already exited
        let _ = self.shutdown_tx.send(());
    }
}

/// A running engine task plus its handle
pub struct EngineRuntime {
    handle: EngineHandle,
    task: JoinHandle<ThermalEngine>,
}

impl EngineRuntime {
    /// Validate settings, build the engine and spawn its task on the current Tokio runtime.
    pub fn start(
        settings: EngineSettings,
        source: Box<dyn TemperatureSource>,
        actuator: Box<dyn FanActuator>,
        sinks: Vec<(ChannelId, Arc<dyn NotificationSink>)>,
    ) -> Result<Self> {
        if settings.sampling_interval.is_zero() {
            return Err(ThermError::config("sampling interval must be greater than zero"));
        }

        let sinks: SinkMap = sinks.into_iter().collect();
        let mut channels: Vec<ChannelId> = sinks.keys().cloned().collect();
        channels.sort();

        let engine = ThermalEngine::new(&settings, source, actuator, channels)?;
        let history = engine.history();

        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(engine.snapshot()));
        let (alerts_tx, _) = broadcast::channel(64);
        let (commands_tx, commands_rx) = mpsc::channel(8);
        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let pending = Arc::new(Mutex::new(VecDeque::new()));

        let task = tokio::spawn(engine_task(
            engine,
            sinks,
            settings,
            EngineChannels {
                snapshot_tx,
                alerts_tx: alerts_tx.clone(),
                pending: pending.clone(),
                commands_rx,
                shutdown_rx: shutdown_tx.subscribe(),
            },
        ));

        log::info!("Thermal engine started");

        Ok(Self {
            handle: EngineHandle {
                snapshot_rx,
                history,
                alerts_tx,
                pending,
                commands_tx,
                shutdown_tx,
            },
            task,
        })
    }

    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Stop at the next tick boundary and return the final statistics.
    pub async fn shutdown(self) -> Result<EngineStats> {
        self.handle.request_shutdown();
        let engine = self
            .task
            .await
            .map_err(|e| ThermError::engine(format!("engine task failed: {}", e)))?;
        log::info!("Thermal engine stopped");
        Ok(engine.stats().clone())
    }
}

struct EngineChannels {
    snapshot_tx: watch::Sender<Arc<EngineSnapshot>>,
    alerts_tx: broadcast::Sender<AlertIntent>,
    pending: Arc<Mutex<VecDeque<AlertIntent>>>,
    commands_rx: mpsc::Receiver<EngineCommand>,
    shutdown_rx: broadcast::Receiver<()>,
}

async fn engine_task(
    mut engine: ThermalEngine,
    sinks: SinkMap,
    settings: EngineSettings,
    mut channels: EngineChannels,
) -> ThermalEngine {
    let (outcome_tx, mut outcome_rx) = mpsc::channel::<DeliveryOutcome>(64);

    let mut ticker = interval(settings.sampling_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            _ = channels.shutdown_rx.recv() => {
                log::debug!("Engine task received shutdown");
                break;
            }
            _ = ticker.tick() => {
                let report = engine.run_cycle(Utc::now());

                for intent in report.intents {
                    publish_intent(&channels, &intent);

                    match sinks.get(&intent.channel) {
                        Some(sink) => {
                            let sink = Arc::clone(sink);
                            let outcome_tx = outcome_tx.clone();
                            let timeout = settings.delivery_timeout;
                            tokio::spawn(async move {
                                let outcome = deliver_with_timeout(sink, intent, timeout).await;
                                // the engine may have stopped meanwhile
                                let _ = outcome_tx.send(outcome).await;
                            });
                        }
                        None => {
                            engine.delivery_failed(&intent, "no sink registered for channel");
                        }
                    }
                }
            }
            Some(outcome) = outcome_rx.recv() => {
                match &outcome.result {
                    Ok(()) => engine.confirm_delivery(&outcome.intent),
                    Err(reason) => engine.delivery_failed(&outcome.intent, reason),
                }
            }
            Some(command) = channels.commands_rx.recv() => {
                match command {
                    EngineCommand::ResetStats => engine.reset_stats(Utc::now()),
                }
            }
        }

        // watch::send() only fails if there are no receivers (which is fine)
        let _ = channels.snapshot_tx.send(Arc::new(engine.snapshot()));
    }

    engine.shutdown();
    let _ = channels.snapshot_tx.send(Arc::new(engine.snapshot()));

    // blocking HTTP clients inside sinks must not be dropped on an async worker
    let _ = tokio::task::spawn_blocking(move || drop(sinks)).await;

    engine
}

fn publish_intent(channels: &EngineChannels, intent: &AlertIntent) {
    {
        let mut pending = channels.pending.lock();
        if pending.len() >= PENDING_ALERT_CAPACITY {
            pending.pop_front();
        }
        pending.push_back(intent.clone());
    }
    // no subscribers is fine
    let _ = channels.alerts_tx.send(intent.clone());
}

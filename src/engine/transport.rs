//! Control-rate thread that drives the [`Scheduler`].
//!
//! The thread owns the scheduler and its copy of the sequence. Commands come
//! in on a ring; status goes out through a single shared slot that always
//! holds the latest pass. Each pass it applies pending commands, ticks,
//! publishes status and sleeps for the lookahead interval. Oversleeping is
//! harmless: the next tick catches up.

use std::{
    sync::{Arc, Mutex},
    thread::{self, JoinHandle},
};

use rtrb::{Consumer, Producer, RingBuffer};
use tracing::{debug, info, warn};

use crate::{
    engine::{
        clock::Clock,
        handle::EngineHandle,
        master::MasterParam,
        scheduler::{Scheduler, TriggerSink},
    },
    error::EngineError,
    sequencing::{Sequence, StepEvent},
};

const COMMAND_CAPACITY: usize = 64;

/// What the transport drives: note triggers plus master-bus changes.
pub trait TransportSink: TriggerSink {
    fn set_master(&mut self, param: MasterParam, value: f32);
}

impl TransportSink for EngineHandle {
    fn set_master(&mut self, param: MasterParam, value: f32) {
        // a full ring is already logged and counted by the handle
        let _ = self.set_master_value(param, value);
    }
}

#[derive(Debug, Clone)]
pub enum TransportCommand {
    Start,
    Stop,
    SetTempo(f64),
    SetStep {
        track: usize,
        step: usize,
        event: StepEvent,
    },
    ClearStep {
        track: usize,
        step: usize,
    },
    /// Swap in a whole sequence, e.g. after undo.
    ReplaceSequence(Box<Sequence>),
    SetMaster {
        param: MasterParam,
        value: f32,
    },
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportStatus {
    pub running: bool,
    pub tempo: f64,
    /// Step sounding on the audio clock right now.
    pub step: Option<usize>,
    pub dispatched: u64,
}

pub struct Transport {
    commands: Producer<TransportCommand>,
    status: Arc<Mutex<TransportStatus>>,
    thread: Option<JoinHandle<()>>,
}

impl Transport {
    pub fn spawn<S, C>(
        scheduler: Scheduler,
        sequence: Sequence,
        sink: S,
        clock: Arc<C>,
    ) -> Result<Self, EngineError>
    where
        S: TransportSink + Send + 'static,
        C: Clock + ?Sized + 'static,
    {
        let (commands, inbox) = RingBuffer::new(COMMAND_CAPACITY);
        let status = Arc::new(Mutex::new(TransportStatus {
            running: false,
            tempo: scheduler.tempo(),
            step: None,
            dispatched: 0,
        }));
        let outbox = Arc::clone(&status);

        let thread = thread::Builder::new()
            .name("synthsmith-transport".into())
            .spawn(move || run(scheduler, sequence, sink, clock, inbox, outbox))
            .map_err(EngineError::Spawn)?;

        Ok(Self {
            commands,
            status,
            thread: Some(thread),
        })
    }

    pub fn send(&mut self, command: TransportCommand) -> Result<(), EngineError> {
        self.commands
            .push(command)
            .map_err(|_| EngineError::QueueFull {
                capacity: COMMAND_CAPACITY,
            })
    }

    /// Most recent status published by the thread.
    pub fn status(&self) -> TransportStatus {
        match self.status.lock() {
            Ok(status) => *status,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Stop the thread and wait for it.
    pub fn shutdown(mut self) {
        self.join();
    }

    fn join(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        // a full ring still gets drained by the thread within one pass
        while self.commands.push(TransportCommand::Shutdown).is_err() {
            thread::yield_now();
            if thread.is_finished() {
                break;
            }
        }
        if thread.join().is_err() {
            warn!("transport thread panicked");
        }
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.join();
    }
}

fn run<S, C>(
    mut scheduler: Scheduler,
    mut sequence: Sequence,
    mut sink: S,
    clock: Arc<C>,
    mut inbox: Consumer<TransportCommand>,
    outbox: Arc<Mutex<TransportStatus>>,
) where
    S: TransportSink,
    C: Clock + ?Sized,
{
    info!("transport thread running");
    loop {
        while let Ok(command) = inbox.pop() {
            match command {
                TransportCommand::Start => match scheduler.start(clock.now()) {
                    Ok(()) => {
                        scheduler.tick(clock.now(), &sequence, &mut sink);
                    }
                    Err(err) => debug!(%err, "start ignored"),
                },
                TransportCommand::Stop => scheduler.stop(),
                TransportCommand::SetTempo(tempo) => {
                    if let Err(err) = scheduler.set_tempo(tempo) {
                        warn!(%err, "tempo change rejected");
                    }
                }
                TransportCommand::SetStep { track, step, event } => {
                    if let Err(err) = sequence.set_step(track, step, event) {
                        warn!(%err, "step edit rejected");
                    }
                }
                TransportCommand::ClearStep { track, step } => {
                    if let Err(err) = sequence.clear_step(track, step) {
                        warn!(%err, "step edit rejected");
                    }
                }
                TransportCommand::ReplaceSequence(next) => sequence = *next,
                TransportCommand::SetMaster { param, value } => sink.set_master(param, value),
                TransportCommand::Shutdown => {
                    scheduler.stop();
                    info!("transport thread exiting");
                    return;
                }
            }
        }

        let now = clock.now();
        scheduler.tick(now, &sequence, &mut sink);
        let status = TransportStatus {
            running: scheduler.is_running(),
            tempo: scheduler.tempo(),
            step: scheduler.playhead(now),
            dispatched: scheduler.dispatched(),
        };
        match outbox.lock() {
            Ok(mut latest) => *latest = status,
            Err(poisoned) => *poisoned.into_inner() = status,
        }

        thread::sleep(scheduler.config().lookahead);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::{
            atomic::{AtomicU64, Ordering},
            Mutex,
        },
        time::{Duration, Instant},
    };

    use crate::config::SchedulerConfig;

    /// Clock that reads the wall clock since construction.
    struct WallClock(Instant);

    impl Clock for WallClock {
        fn now(&self) -> f64 {
            self.0.elapsed().as_secs_f64()
        }
    }

    #[derive(Clone, Default)]
    struct SharedLog(Arc<Mutex<Vec<f64>>>, Arc<AtomicU64>, Arc<Mutex<Vec<(MasterParam, f32)>>>);

    impl TriggerSink for SharedLog {
        fn trigger(&mut self, _track: usize, _note: u8, time: f64, _duration: f32) {
            if let Ok(mut log) = self.0.lock() {
                log.push(time);
            }
            self.1.fetch_add(1, Ordering::Relaxed);
        }
    }

    impl TransportSink for SharedLog {
        fn set_master(&mut self, param: MasterParam, value: f32) {
            if let Ok(mut log) = self.2.lock() {
                log.push((param, value));
            }
        }
    }

    #[test]
    fn thread_dispatches_until_stopped() {
        let mut sequence = Sequence::new(1);
        for step in 0..16 {
            sequence.toggle_step(0, step).unwrap();
        }
        let scheduler = Scheduler::new(SchedulerConfig::default(), 240.0).unwrap();
        let log = SharedLog::default();
        let clock = Arc::new(WallClock(Instant::now()));

        let mut transport =
            Transport::spawn(scheduler, sequence, log.clone(), clock).unwrap();
        transport.send(TransportCommand::Start).unwrap();
        thread::sleep(Duration::from_millis(300));
        transport.send(TransportCommand::Stop).unwrap();
        thread::sleep(Duration::from_millis(60));
        let at_stop = log.1.load(Ordering::Relaxed);
        thread::sleep(Duration::from_millis(100));
        transport.shutdown();

        assert!(at_stop >= 4, "expected several steps, got {at_stop}");
        assert_eq!(log.1.load(Ordering::Relaxed), at_stop, "nothing after stop");

        let times = log.0.lock().unwrap().clone();
        for pair in times.windows(2) {
            assert!((pair[1] - pair[0] - 0.0625).abs() < 1e-9);
        }
    }

    #[test]
    fn status_stays_current_when_nobody_reads() {
        let scheduler = Scheduler::new(SchedulerConfig::default(), 120.0).unwrap();
        let clock = Arc::new(WallClock(Instant::now()));
        let mut transport =
            Transport::spawn(scheduler, Sequence::new(1), SharedLog::default(), clock).unwrap();

        // well past the point where a queue of statuses would have filled
        thread::sleep(Duration::from_millis(500));
        transport.send(TransportCommand::SetTempo(90.0)).unwrap();
        thread::sleep(Duration::from_millis(100));
        let status = transport.status();
        transport.shutdown();

        assert_eq!(status.tempo, 90.0, "status should reflect the last pass");
    }

    #[test]
    fn master_changes_reach_the_sink() {
        let scheduler = Scheduler::new(SchedulerConfig::default(), 120.0).unwrap();
        let log = SharedLog::default();
        let clock = Arc::new(WallClock(Instant::now()));
        let mut transport =
            Transport::spawn(scheduler, Sequence::new(1), log.clone(), clock).unwrap();
        transport
            .send(TransportCommand::SetMaster {
                param: MasterParam::ReverbWet,
                value: 0.6,
            })
            .unwrap();
        thread::sleep(Duration::from_millis(100));
        transport.shutdown();

        assert_eq!(*log.2.lock().unwrap(), vec![(MasterParam::ReverbWet, 0.6)]);
    }
}

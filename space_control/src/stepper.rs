// Realtime stepper: a background thread that advances the universe on a
// wall clock.
//
// Each tick measures the monotonic time since the previous tick and feeds
// it to `ControlState::advance_nanos` under the write lock, so realtime
// stepping serializes with every HTTP writer. Ticks are paced at `hz`
// (clamped to 1..=240) by sleeping in short slices, which keeps `stop`
// responsive at low rates.
//
// Shutdown: `stop` clears the `keep_running` flag and waits for the thread
// at most `timeout`. A step in progress always finishes; the lock is never
// released mid-step.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use crate::state::ControlState;

pub const MIN_HZ: u32 = 1;
pub const MAX_HZ: u32 = 240;

const SLEEP_SLICE: Duration = Duration::from_millis(5);

#[derive(Debug)]
pub struct Stepper {
    keep_running: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Stepper {
    pub fn spawn(state: Arc<RwLock<ControlState>>, hz: u32) -> Self {
        let hz = hz.clamp(MIN_HZ, MAX_HZ);
        let keep_running = Arc::new(AtomicBool::new(true));
        let keep_running_clone = keep_running.clone();
        let thread = thread::spawn(move || run(state, hz, keep_running_clone));
        debug!(hz, "realtime stepper started");
        Self {
            keep_running,
            thread: Some(thread),
        }
    }

    /// Signal the thread to stop and wait up to `timeout` for it. Returns
    /// whether it exited in time.
    pub fn stop(mut self, timeout: Duration) -> bool {
        self.keep_running.store(false, Ordering::SeqCst);
        let Some(handle) = self.thread.take() else {
            return true;
        };
        let deadline = Instant::now() + timeout;
        while !handle.is_finished() && Instant::now() < deadline {
            thread::sleep(SLEEP_SLICE);
        }
        if handle.is_finished() {
            let _ = handle.join();
            true
        } else {
            warn!(?timeout, "realtime stepper did not stop in time; detaching");
            false
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }
}

fn run(state: Arc<RwLock<ControlState>>, hz: u32, keep_running: Arc<AtomicBool>) {
    let period = Duration::from_secs_f64(1.0 / f64::from(hz));
    let mut last = Instant::now();
    let mut next_tick = last + period;
    while keep_running.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now < next_tick {
            thread::sleep((next_tick - now).min(SLEEP_SLICE));
            continue;
        }
        next_tick += period;
        if next_tick < now {
            // Fell behind (e.g. a long lock wait); don't try to catch up.
            next_tick = now + period;
        }
        let elapsed = i64::try_from((now - last).as_nanos()).unwrap_or(i64::MAX);
        last = now;
        match state.write() {
            Ok(mut guard) => {
                guard.advance_nanos(elapsed);
            }
            Err(_) => {
                error!("universe lock poisoned; realtime stepper exiting");
                break;
            }
        }
    }
}

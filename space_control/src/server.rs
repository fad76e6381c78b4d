// HTTP listener, worker pool and endpoint routing for the control server.
//
// Architecture: a `tiny_http::Server` shared by a fixed pool of worker
// threads. Each worker polls `recv_timeout` so it can notice the
// `keep_running` flag, routes the request through `Router`, and writes the
// JSON response. All universe access goes through one
// `Arc<RwLock<ControlState>>`: `/observe` and `/world` take the read lock,
// `/act`, `/step`, `/reset` and `/autopilot` take the write lock for the
// whole mutation. `/health` takes no lock.
//
// Routing is by path only; any method is accepted. Unknown paths get 404.
// Validation failures are answered with 400 before any lock is taken.
//
// In realtime mode a `Stepper` thread advances the universe on its own and
// `/step` only reports the current time.
//
// Shutdown (`ControlHandle::stop`): the stepper is stopped first (bounded
// join), then the workers are flagged and joined. Dropping the last
// `Arc<Server>` closes the listening socket.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread;
use std::time::Duration;

use serde::Serialize;
use space_protocol::{AutopilotResponse, HealthResponse, OkResponse, ResetResponse, StepResponse};
use space_sim::Universe;
use tiny_http::{Header, Request, Response, Server};
use tracing::{debug, error, info, warn};

use crate::error::ControlError;
use crate::query::Query;
use crate::snapshot;
use crate::state::{ControlState, UniverseFactory};
use crate::stepper::Stepper;

/// Default `dt` for `/step`.
pub const DEFAULT_STEP_DT: f32 = 1.0 / 60.0;
/// Largest `dt` a single `/step` may request.
pub const MAX_STEP_DT: f32 = 10.0;

const RECV_POLL: Duration = Duration::from_millis(100);

/// Configuration for starting a control server.
#[derive(Clone, Debug)]
pub struct ControlConfig {
    pub host: String,
    /// 0 lets the OS pick a free port.
    pub port: u16,
    pub seed: i64,
    pub realtime: bool,
    /// Realtime step rate, clamped to 1..=240.
    pub realtime_hz: u32,
    pub workers: usize,
    /// Bound on waiting for the realtime stepper at shutdown.
    pub join_timeout: Duration,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            seed: 42,
            realtime: false,
            realtime_hz: 60,
            workers: 4,
            join_timeout: Duration::from_millis(500),
        }
    }
}

/// Handle returned by `start_control` to inspect and stop the running
/// server.
pub struct ControlHandle {
    keep_running: Arc<AtomicBool>,
    workers: Vec<thread::JoinHandle<()>>,
    stepper: Option<Stepper>,
    state: Arc<RwLock<ControlState>>,
    join_timeout: Duration,
}

impl ControlHandle {
    /// The shared state the endpoints operate on.
    pub fn state(&self) -> Arc<RwLock<ControlState>> {
        self.state.clone()
    }

    /// True once every worker has exited (after `stop`, or if the listener
    /// failed).
    pub fn is_finished(&self) -> bool {
        self.workers.iter().all(|w| w.is_finished())
    }

    /// Stop the realtime stepper (if any), then the workers, and wait for
    /// them.
    pub fn stop(mut self) {
        if let Some(stepper) = self.stepper.take() {
            stepper.stop(self.join_timeout);
        }
        self.keep_running.store(false, Ordering::SeqCst);
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
        info!("control server stopped");
    }

    /// Block while `running` stays set and the workers are alive, then
    /// `stop`. The binary clears `running` from its signal handler.
    pub fn run_until(self, running: &AtomicBool) {
        while running.load(Ordering::SeqCst) && !self.is_finished() {
            thread::sleep(Duration::from_millis(100));
        }
        info!("shutting down control server");
        self.stop();
    }
}

/// Maps request paths to endpoint handlers over the shared state.
#[derive(Clone)]
pub struct Router {
    state: Arc<RwLock<ControlState>>,
    realtime: bool,
}

impl Router {
    pub fn new(state: Arc<RwLock<ControlState>>, realtime: bool) -> Self {
        Self { state, realtime }
    }

    /// Handle a request URL (path plus optional query). Returns the status
    /// code and JSON body.
    pub fn handle(&self, url: &str) -> (u16, String) {
        let (path, raw_query) = match url.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (url, None),
        };
        match self.route(path, raw_query) {
            Ok(body) => (200, body),
            Err(err) => {
                let status = err.status();
                if status >= 500 {
                    error!(path, error = %err, "control endpoint fault");
                } else {
                    debug!(path, status, error = %err, "control request rejected");
                }
                (status, err.to_body())
            }
        }
    }

    fn route(&self, path: &str, raw_query: Option<&str>) -> Result<String, ControlError> {
        match path {
            "/health" => to_json(&HealthResponse::ok()),
            "/observe" => {
                let query = Query::parse(raw_query)?;
                let state = self.read()?;
                to_json(&snapshot::observe(state.universe(), query.number("nearestN")))
            }
            "/world" => {
                let state = self.read()?;
                to_json(&snapshot::world(state.universe(), self.realtime))
            }
            "/act" => self.act(&Query::parse(raw_query)?),
            "/step" => self.step(&Query::parse(raw_query)?),
            "/reset" => {
                let query = Query::parse(raw_query)?;
                let seed = self.write()?.reset(query.number("seed"));
                to_json(&ResetResponse { ok: true, seed })
            }
            "/autopilot" => self.autopilot(&Query::parse(raw_query)?),
            other => Err(ControlError::NotFound(other.to_string())),
        }
    }

    fn act(&self, query: &Query) -> Result<String, ControlError> {
        let thrust: Option<f32> = query.number("thrust");
        let angle: Option<f32> = query.number("angle");
        if thrust.is_some_and(|t| !(0.0..=1.0).contains(&t)) {
            return Err(ControlError::validation("thrust must be in range [0, 1]"));
        }
        if angle.is_some_and(|a| !a.is_finite()) {
            return Err(ControlError::validation("angle must be a finite number"));
        }
        self.write()?.universe_mut().command(angle, thrust);
        to_json(&OkResponse { ok: true })
    }

    fn step(&self, query: &Query) -> Result<String, ControlError> {
        if self.realtime {
            let now = self.read()?.universe().now();
            return to_json(&StepResponse { now: now.into() });
        }
        let dt = query.number::<f32>("dt").unwrap_or(DEFAULT_STEP_DT);
        if !(dt > 0.0 && dt <= MAX_STEP_DT) {
            return Err(ControlError::validation("dt must be in range (0, 10]"));
        }
        let now = self.write()?.advance(dt);
        to_json(&StepResponse { now: now.into() })
    }

    fn autopilot(&self, query: &Query) -> Result<String, ControlError> {
        let Some(enabled) = query.get("enabled").and_then(|v| v.parse::<bool>().ok()) else {
            return Err(ControlError::validation("enabled must be true or false"));
        };
        self.write()?.universe_mut().set_autopilot(enabled);
        to_json(&AutopilotResponse { ok: true, enabled })
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, ControlState>, ControlError> {
        self.state.read().map_err(|_| ControlError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, ControlState>, ControlError> {
        self.state.write().map_err(|_| ControlError::LockPoisoned)
    }
}

fn to_json(value: &impl Serialize) -> Result<String, ControlError> {
    Ok(serde_json::to_string(value)?)
}

/// Start the control server on background threads. Returns a handle for
/// stopping it and the actual bound address (useful when port 0 is used).
///
/// Bind failure is logged and returned as `ControlError::Bind`.
pub fn start_control<F>(
    config: ControlConfig,
    factory: F,
) -> Result<(ControlHandle, SocketAddr), ControlError>
where
    F: Fn(i64) -> Universe + Send + Sync + 'static,
{
    let bind_addr = format!("{}:{}", config.host, config.port);
    let server = Server::http(bind_addr.as_str()).map_err(|e| {
        error!(addr = %bind_addr, error = %e, "failed to start control server");
        ControlError::Bind {
            addr: bind_addr.clone(),
            reason: e.to_string(),
        }
    })?;
    let addr = server.server_addr().to_ip().ok_or_else(|| ControlError::Bind {
        addr: bind_addr.clone(),
        reason: "listener has no IP address".into(),
    })?;
    let server = Arc::new(server);

    let factory: UniverseFactory = Arc::new(factory);
    let state = Arc::new(RwLock::new(ControlState::new(config.seed, factory)));
    let router = Router::new(state.clone(), config.realtime);
    let keep_running = Arc::new(AtomicBool::new(true));

    let workers = (0..config.workers.max(1))
        .map(|_| {
            let server = server.clone();
            let router = router.clone();
            let keep_running = keep_running.clone();
            thread::spawn(move || worker_loop(&server, &router, &keep_running))
        })
        .collect();

    let stepper = config
        .realtime
        .then(|| Stepper::spawn(state.clone(), config.realtime_hz));

    info!(
        %addr,
        seed = config.seed,
        realtime = config.realtime,
        workers = config.workers.max(1),
        "control server listening"
    );
    info!("endpoints: /health, /observe, /world, /act, /step, /reset, /autopilot");

    Ok((
        ControlHandle {
            keep_running,
            workers,
            stepper,
            state,
            join_timeout: config.join_timeout,
        },
        addr,
    ))
}

fn worker_loop(server: &Server, router: &Router, keep_running: &AtomicBool) {
    while keep_running.load(Ordering::SeqCst) {
        match server.recv_timeout(RECV_POLL) {
            Ok(Some(request)) => respond(router, request),
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "control server stopped accepting requests");
                break;
            }
        }
    }
}

fn respond(router: &Router, request: Request) {
    let (status, body) = router.handle(request.url());
    let mut response = Response::from_string(body).with_status_code(status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        response.add_header(header);
    }
    if let Err(e) = request.respond(response) {
        debug!(error = %e, "client went away before the response was written");
    }
}

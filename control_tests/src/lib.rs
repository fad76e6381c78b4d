// Test-only HTTP client for control-server integration tests.
//
// `TestControlClient` speaks plain HTTP/1.1 over `TcpStream` to a real
// `space_control` server and decodes bodies with the `space_protocol`
// types. `start_server` launches a server on a free port with a chosen seed
// and namer. Everything the server does runs through the same code paths as
// the `spacectl` binary; the only test-specific code is this client.
//
// See also: `tests/full_pipeline.rs` for the scenarios.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use space_control::{ControlConfig, ControlHandle, start_control};
use space_namer::{CatalogNamer, MinimalNamer, Namer};
use space_protocol::{ObserveResponse, WorldResponse};
use space_sim::{Universe, UniverseConfig};

/// Read timeout for a single request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Copy, Debug)]
pub enum TestNamer {
    Catalog,
    Minimal,
}

/// Start a control server on a free localhost port.
pub fn start_server(seed: i64, namer: TestNamer) -> (ControlHandle, TestControlClient) {
    let config = ControlConfig {
        port: 0,
        seed,
        workers: 4,
        ..ControlConfig::default()
    };
    let (handle, addr) = start_control(config, move |seed| {
        let namer: Box<dyn Namer> = match namer {
            TestNamer::Catalog => Box::new(CatalogNamer::default()),
            TestNamer::Minimal => Box::new(MinimalNamer),
        };
        Universe::generate(namer, seed, UniverseConfig::default())
    })
    .expect("control server failed to start");
    (handle, TestControlClient::new(addr))
}

/// A raw HTTP response.
#[derive(Clone, Debug)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("response body is not JSON")
    }
}

#[derive(Clone, Debug)]
pub struct TestControlClient {
    addr: SocketAddr,
}

impl TestControlClient {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Send one request on a fresh connection.
    pub fn request(&self, method: &str, path: &str) -> Reply {
        let mut stream = TcpStream::connect(self.addr).expect("connect failed");
        stream
            .set_read_timeout(Some(REQUEST_TIMEOUT))
            .expect("set_read_timeout failed");
        write!(
            stream,
            "{method} {path} HTTP/1.1\r\nHost: {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            self.addr
        )
        .expect("write request failed");
        let mut raw = String::new();
        stream.read_to_string(&mut raw).expect("read response failed");

        let (head, body) = raw
            .split_once("\r\n\r\n")
            .unwrap_or_else(|| panic!("no header terminator in {raw:?}"));
        let status = head
            .split_whitespace()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| panic!("bad status line in {head:?}"));
        Reply {
            status,
            body: body.to_string(),
        }
    }

    pub fn health(&self) -> Reply {
        self.request("GET", "/health")
    }

    /// `/observe` body, byte for byte.
    pub fn observe_raw(&self, nearest_n: Option<i64>) -> String {
        let path = match nearest_n {
            Some(n) => format!("/observe?nearestN={n}"),
            None => "/observe".to_string(),
        };
        let reply = self.request("GET", &path);
        assert_eq!(reply.status, 200, "observe failed: {}", reply.body);
        reply.body
    }

    pub fn observe(&self) -> ObserveResponse {
        serde_json::from_str(&self.observe_raw(None)).expect("observe body does not decode")
    }

    pub fn world(&self) -> WorldResponse {
        let reply = self.request("GET", "/world");
        assert_eq!(reply.status, 200, "world failed: {}", reply.body);
        serde_json::from_str(&reply.body).expect("world body does not decode")
    }

    pub fn act(&self, thrust: Option<f32>, angle: Option<f32>) -> Reply {
        let mut params = Vec::new();
        if let Some(t) = thrust {
            params.push(format!("thrust={t}"));
        }
        if let Some(a) = angle {
            params.push(format!("angle={a}"));
        }
        self.request("POST", &format!("/act?{}", params.join("&")))
    }

    /// Advance by `dt` seconds; returns the reported `now`.
    pub fn step(&self, dt: f32) -> f64 {
        let reply = self.request("POST", &format!("/step?dt={dt}"));
        assert_eq!(reply.status, 200, "step failed: {}", reply.body);
        reply.json()["now"].as_f64().expect("now is a number")
    }

    pub fn reset(&self, seed: Option<i64>) -> i64 {
        let path = match seed {
            Some(s) => format!("/reset?seed={s}"),
            None => "/reset".to_string(),
        };
        let reply = self.request("POST", &path);
        assert_eq!(reply.status, 200, "reset failed: {}", reply.body);
        reply.json()["seed"].as_i64().expect("seed is an integer")
    }

    pub fn autopilot(&self, enabled: bool) -> Reply {
        self.request("POST", &format!("/autopilot?enabled={enabled}"))
    }
}

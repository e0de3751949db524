//! Minimal HTTP/1.1 server standing in for the routing service and the job
//! endpoints in integration tests.
//!
//! Routes:
//! - `GET /route/v1/driving/{lon,lat;...}`: OSRM-style JSON echoing the
//!   coordinates; 60 s and 1000 m per leg.
//! - `GET /route/v1/broken/...`: 400 with an error body.
//! - `GET /sync/ok`, `GET /sync/down`: 200 / 503.
//! - `POST /locations`: 200, body recorded.
//! - `POST /upload?name=..`: 200 with `stored/{name}`.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub target: String,
    pub body: Vec<u8>,
}

pub struct FieldServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FieldServer {
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.target.starts_with(prefix))
            .count()
    }
}

/// Start a server on an ephemeral port. It runs until the process exits.
pub fn start() -> FieldServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let log = Arc::clone(&log);
            thread::spawn(move || handle(stream, &log));
        }
    });
    FieldServer {
        base_url: format!("http://127.0.0.1:{}", port),
        requests,
    }
}

fn handle(mut stream: TcpStream, log: &Mutex<Vec<Recorded>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));

    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.lines();
    let mut first = lines.next().unwrap_or("").split_whitespace();
    let method = first.next().unwrap_or("").to_string();
    let target = first.next().unwrap_or("/").to_string();

    let mut content_length = 0usize;
    let mut expect_continue = false;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            } else if name.eq_ignore_ascii_case("expect") {
                expect_continue = value.trim().eq_ignore_ascii_case("100-continue");
            }
        }
    }
    if expect_continue {
        let _ = stream.write_all(b"HTTP/1.1 100 Continue\r\n\r\n");
    }
    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => break,
            Ok(n) => body.extend_from_slice(&chunk[..n]),
        }
    }

    log.lock().unwrap().push(Recorded {
        method: method.clone(),
        target: target.clone(),
        body,
    });

    let (status, payload) = respond(&method, &target);
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        payload.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(payload.as_bytes());
}

fn respond(method: &str, target: &str) -> (&'static str, String) {
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    match (method, path) {
        ("GET", p) if p.starts_with("/route/v1/driving/") => {
            ("200 OK", echo_route(&p["/route/v1/driving/".len()..]))
        }
        ("GET", p) if p.starts_with("/route/v1/broken/") => (
            "400 Bad Request",
            r#"{"code":"InvalidQuery","message":"profile not supported"}"#.to_string(),
        ),
        ("GET", "/sync/ok") => ("200 OK", "{}".to_string()),
        ("GET", "/sync/down") => ("503 Service Unavailable", "{}".to_string()),
        ("POST", "/locations") => ("200 OK", "{}".to_string()),
        ("POST", "/upload") => {
            let name = query
                .split('&')
                .find_map(|kv| kv.strip_prefix("name="))
                .unwrap_or("unnamed");
            ("200 OK", format!("stored/{}", name))
        }
        _ => ("404 Not Found", "{}".to_string()),
    }
}

/// Route JSON for `lon,lat;lon,lat;...` (possibly percent-encoded).
fn echo_route(coords: &str) -> String {
    let decoded = coords.replace("%2C", ",").replace("%3B", ";");
    let points: Vec<String> = decoded
        .split(';')
        .filter(|p| !p.is_empty())
        .map(|p| format!("[{}]", p))
        .collect();
    let legs = points.len().saturating_sub(1);
    format!(
        r#"{{"code":"Ok","routes":[{{"duration":{},"distance":{},"geometry":{{"type":"LineString","coordinates":[{}]}}}}]}}"#,
        legs * 60,
        legs * 1000,
        points.join(",")
    )
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

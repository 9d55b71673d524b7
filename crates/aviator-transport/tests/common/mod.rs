//! Shared fixtures for transport integration tests.

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// One canned answer keyed by request path (query ignored).
#[derive(Debug, Clone)]
pub struct CannedRoute {
    pub method: &'static str,
    pub path: &'static str,
    pub status: u16,
    pub body: &'static str,
}

/// Request line and body seen by the fixture server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenRequest {
    pub method: String,
    pub target: String,
    pub body: String,
}

/// Starts a one-request-per-connection HTTP fixture server.
#[allow(dead_code)]
pub async fn spawn_http_fixture(
    routes: Vec<CannedRoute>,
) -> (String, Arc<Mutex<Vec<SeenRequest>>>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("fixture listener should bind");
    let origin = format!(
        "http://{}",
        listener.local_addr().expect("fixture address should resolve")
    );
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let routes = routes.clone();
            let log = log.clone();
            tokio::spawn(async move {
                answer(stream, &routes, &log).await;
            });
        }
    });

    (origin, seen)
}

async fn answer(mut stream: TcpStream, routes: &[CannedRoute], log: &Mutex<Vec<SeenRequest>>) {
    let mut raw = Vec::new();
    let mut chunk = [0_u8; 1024];
    let head_end = loop {
        let read = stream.read(&mut chunk).await.expect("fixture read should work");
        if read == 0 {
            return;
        }
        raw.extend_from_slice(&chunk[..read]);
        if let Some(position) = raw.windows(4).position(|window| window == b"\r\n\r\n") {
            break position + 4;
        }
    };

    let head = String::from_utf8_lossy(&raw[..head_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    while raw.len() < head_end + content_length {
        let read = stream.read(&mut chunk).await.expect("fixture read should work");
        if read == 0 {
            break;
        }
        raw.extend_from_slice(&chunk[..read]);
    }

    let mut request_line = head.lines().next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default().to_string();
    let path = target.split('?').next().unwrap_or_default().to_string();
    let body = String::from_utf8_lossy(&raw[head_end..]).to_string();
    log.lock().expect("fixture log lock should work").push(SeenRequest {
        method: method.clone(),
        target,
        body,
    });

    let (status, body) = routes
        .iter()
        .find(|route| route.method == method && route.path == path)
        .map(|route| (route.status, route.body))
        .unwrap_or((404, r#"{"detail":"Not Found"}"#));
    let response = format!(
        "HTTP/1.1 {status} Fixture\r\nContent-Type: application/json\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

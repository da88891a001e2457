// crates/certus-server/tests/common/mod.rs
// ============================================================================
// Module: Certus Server Test Helpers
// Description: Scripted HTTP stub for remote collaborator tests.
// Purpose: Serve canned answers and record what the client sent.
// Dependencies: tiny_http
// ============================================================================

//! ## Overview
//! [`spawn_stub`] answers a fixed sequence of requests and returns what it
//! received when joined.

#![allow(dead_code, reason = "Each test binary uses a subset of the helpers.")]

use std::thread;
use std::thread::JoinHandle;

use tiny_http::Response;
use tiny_http::Server;

/// Request observed by the stub.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: String,
    /// Request path and query.
    pub url: String,
    /// Raw request body.
    pub body: String,
}

/// Starts a stub that answers each request with the next scripted reply.
///
/// Returns the base URL and a handle yielding the recorded requests.
pub fn spawn_stub(replies: Vec<(u16, String)>) -> (String, JoinHandle<Vec<RecordedRequest>>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let handle = thread::spawn(move || {
        let mut recorded = Vec::new();
        for (status, body) in replies {
            let Ok(mut request) = server.recv() else {
                break;
            };
            let mut received = String::new();
            let _ = request.as_reader().read_to_string(&mut received);
            recorded.push(RecordedRequest {
                method: request.method().to_string(),
                url: request.url().to_string(),
                body: received,
            });
            let _ = request.respond(Response::from_string(body).with_status_code(status));
        }
        recorded
    });
    (format!("http://{addr}"), handle)
}

/// Returns a local URL nothing listens on.
pub fn closed_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

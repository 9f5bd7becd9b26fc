//! Shared test utilities
#![allow(dead_code)]

use neomind::face::{FaceRenderer, FaceStyle};
use neomind::server::SharedStore;
use neomind::voice::SAMPLE_RATE;
use neomind::{Capabilities, CompanionServer, SessionController, SessionOptions};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::net::TcpListener;

/// Session options with the default wake words
#[must_use]
pub fn options(child_name: &str) -> SessionOptions {
    SessionOptions {
        child_name: child_name.to_string(),
        wake_words: vec!["hey".into(), "hi".into(), "hello".into()],
        heartbeat: false,
    }
}

/// A session with a deterministic face
#[must_use]
pub fn session(caps: Capabilities) -> SessionController {
    SessionController::new(
        options("Mia"),
        caps,
        FaceRenderer::with_rng(FaceStyle::Animated, StdRng::seed_from_u64(7)),
    )
}

/// Start the companion chat service on an ephemeral local port
pub async fn spawn_server() -> (String, SharedStore) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test server");
    let addr = listener.local_addr().expect("no local addr");

    let server = CompanionServer::new(addr.port());
    let store = server.store();
    let _ = server.spawn(listener);

    (format!("http://{addr}"), store)
}

/// A local URL nothing is listening on
pub async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind probe port");
    let addr = listener.local_addr().expect("no local addr");
    drop(listener);
    format!("http://{addr}")
}

/// Generate sine wave audio samples
#[must_use]
pub fn generate_sine_samples(frequency: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Generate silence
#[must_use]
pub fn generate_silence(duration_secs: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    vec![0.0; num_samples]
}

use oauth2_wire::{HttpClient, HttpRequest, HttpResponse};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Scripted authorization server: replays queued responses and keeps every
/// request it was sent. Sending with an empty queue fails like a dropped
/// connection.
#[derive(Default)]
pub struct MockHttpClient {
    script: Mutex<VecDeque<HttpResponse>>,
    sent: Mutex<Vec<HttpRequest>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue_response(&self, response: HttpResponse) {
        self.script.lock().unwrap().push_back(response);
    }

    pub fn enqueue_json(&self, status: u16, body: serde_json::Value) {
        self.enqueue_response(
            HttpResponse::new(status, serde_json::to_vec(&body).unwrap())
                .with_header("Content-Type", "application/json"),
        );
    }

    /// A `302 Found` pointing at `location`.
    pub fn enqueue_redirect(&self, location: &str) {
        self.enqueue_response(HttpResponse::new(302, Vec::new()).with_header("Location", location));
    }

    pub fn take_requests(&self) -> Vec<HttpRequest> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }
}

impl HttpClient for MockHttpClient {
    async fn send(
        &self,
        request: HttpRequest,
    ) -> Result<HttpResponse, Box<dyn std::error::Error + Send + Sync>> {
        self.sent.lock().unwrap().push(request);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| "connection closed: no scripted response left".into())
    }
}

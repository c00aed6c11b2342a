//! Scripted fetcher for the cache tests
//!
//! Results are queued per URL; the last one repeats once the queue drains.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use platform::error::ApiError;
use platform::fetch::Fetcher;
use platform::http::FetchDescriptor;
use serde_json::Value;

#[derive(Clone)]
struct Step {
    result: Result<Value, ApiError>,
    delay: Duration,
}

#[derive(Default)]
struct Script {
    routes: HashMap<String, VecDeque<Step>>,
    calls: Vec<FetchDescriptor>,
}

#[derive(Clone, Default)]
pub struct ScriptedFetcher {
    script: Arc<Mutex<Script>>,
}

impl ScriptedFetcher {
    pub fn on(&self, url: &str, result: Result<Value, ApiError>) -> &Self {
        self.on_delayed(url, result, Duration::ZERO)
    }

    pub fn on_delayed(&self, url: &str, result: Result<Value, ApiError>, delay: Duration) -> &Self {
        self.lock()
            .routes
            .entry(url.to_string())
            .or_default()
            .push_back(Step { result, delay });
        self
    }

    pub fn calls(&self) -> Vec<FetchDescriptor> {
        self.lock().calls.clone()
    }

    pub fn count(&self, url: &str) -> usize {
        self.lock().calls.iter().filter(|d| d.url() == url).count()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_step(&self, descriptor: &FetchDescriptor) -> Step {
        let mut script = self.lock();
        script.calls.push(descriptor.clone());
        let queued = match script.routes.get_mut(descriptor.url()) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        queued.unwrap_or_else(|| Step {
            result: Err(ApiError::Http {
                status: 404,
                message: "Not Found".to_string(),
                body: None,
            }),
            delay: Duration::ZERO,
        })
    }
}

impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, descriptor: &FetchDescriptor) -> Result<Value, ApiError> {
        let step = self.next_step(descriptor);
        if !step.delay.is_zero() {
            tokio::time::sleep(step.delay).await;
        }
        step.result
    }
}

//! Page source replaying scripted pages.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

use crate::error::BoxedError;
use crate::query::PageRequest;
use crate::source::PageSource;

#[derive(Debug, Default)]
struct Script {
    pages: VecDeque<Vec<Value>>,
    requests: Vec<PageRequest>,
    fail_on_call: Option<usize>,
}

/// Page source returning pre-recorded pages in order.
///
/// Every request is recorded. Once the script runs out, empty pages are
/// returned. Clones share the same script.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    script: Arc<Mutex<Script>>,
}

impl ScriptedSource {
    /// Creates a source replaying `pages`.
    pub fn new<I>(pages: I) -> Self
    where
        I: IntoIterator<Item = Vec<Value>>,
    {
        let script = Script {
            pages: pages.into_iter().collect(),
            ..Script::default()
        };
        Self {
            script: Arc::new(Mutex::new(script)),
        }
    }

    /// Makes the `call`-th request (1-based) fail instead of returning a page.
    pub fn fail_on_call(self, call: usize) -> Self {
        self.lock().fail_on_call = Some(call);
        self
    }

    /// Returns every request received so far.
    pub fn requests(&self) -> Vec<PageRequest> {
        self.lock().requests.clone()
    }

    /// Returns the number of requests received so far.
    pub fn calls(&self) -> usize {
        self.lock().requests.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl PageSource<Value> for ScriptedSource {
    async fn find_many(&self, request: PageRequest) -> Result<Vec<Value>, BoxedError> {
        let mut script = self.lock();
        script.requests.push(request);

        if script.fail_on_call == Some(script.requests.len()) {
            return Err(format!("scripted failure on call {}", script.requests.len()).into());
        }

        Ok(script.pages.pop_front().unwrap_or_default())
    }
}

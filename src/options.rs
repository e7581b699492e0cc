//! Default inference options injected into generation requests.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Backend tuning values. Field names follow the backend's `options` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceOptions {
    pub num_ctx: u32,
    pub num_batch: u32,
    pub num_gpu: u32,
    pub num_thread: u32,
    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub repeat_penalty: f64,
    pub penalize_newline: bool,
    pub use_mmap: bool,
    /// Output-length cap; only set for warmup and keepalive calls.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub num_predict: Option<u32>,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            num_ctx: 2048,
            num_batch: 512,
            num_gpu: 1,
            num_thread: 4,
            temperature: 0.7,
            top_k: 40,
            top_p: 0.9,
            repeat_penalty: 1.1,
            penalize_newline: false,
            use_mmap: true,
            num_predict: None,
        }
    }
}

impl InferenceOptions {
    pub fn with_num_predict(mut self, num_predict: u32) -> Self {
        self.num_predict = Some(num_predict);
        self
    }

    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Shallow merge: start from the defaults and let every caller key win.
/// Anything other than a JSON object from the caller contributes nothing.
pub fn merge_options(caller: Option<&Value>) -> Map<String, Value> {
    let mut merged = InferenceOptions::default().to_map();
    if let Some(Value::Object(overrides)) = caller {
        for (key, value) in overrides {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

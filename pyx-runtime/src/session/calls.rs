use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use pyx_runtime_sdk::model::{message::CallId, value::ResourceId};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct PendingCall {
    pub function_id: ResourceId,

    /// The full call-site argument list, kept for argument-fetch requests.
    pub args: Arc<Value>,
    pub issued_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct CallTable {
    pending: DashMap<CallId, PendingCall>,
}

impl CallTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, call_id: CallId, function_id: ResourceId, args: Arc<Value>) {
        let previous = self.pending.insert(
            call_id.clone(),
            PendingCall {
                function_id,
                args,
                issued_at: Utc::now(),
            },
        );

        // ids are v4 uuids, a clash means the generator is broken
        debug_assert!(previous.is_none(), "call id {} issued twice", call_id);
    }

    pub fn get(&self, call_id: &str) -> Option<PendingCall> {
        self.pending.get(call_id).map(|call| call.clone())
    }

    pub fn args(&self, call_id: &str) -> Option<Arc<Value>> {
        self.pending.get(call_id).map(|call| call.args.clone())
    }

    /// Removes the call. Completing an unknown id is a no-op.
    pub fn complete(&self, call_id: &str) -> Option<PendingCall> {
        self.pending.remove(call_id).map(|(_, call)| call)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&self) {
        self.pending.clear();
    }
}

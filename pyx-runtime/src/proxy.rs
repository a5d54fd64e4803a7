use std::{
    fmt,
    sync::{Arc, Weak},
};

use pyx_runtime_sdk::{
    error::{PyxError, PyxResult},
    model::{
        message::{CallId, CallPayload, ClientMessage, ResourceEvent},
        value::{PreloadPlan, ResourceId},
    },
};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::preload::preload;
use crate::render::RenderValue;
use crate::session::{subscriptions::SubscriptionToken, SessionState};

/// A live slot bound to a resource id. Mounting it subscribes to the resource;
/// the returned guard unsubscribes when dropped.
#[derive(Clone)]
pub struct SubscribedView {
    id: ResourceId,
    session: Weak<SessionState>,
}

impl SubscribedView {
    pub(crate) fn new(id: ResourceId, session: Weak<SessionState>) -> Self {
        Self { id, session }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn mount<F>(&self, on_update: F) -> PyxResult<ViewGuard>
    where
        F: Fn(RenderValue) + Send + Sync + 'static,
    {
        let session = self.session.upgrade().ok_or(PyxError::SessionClosed)?;
        session.ensure_open()?;

        let token = session.subscriptions.subscribe(
            self.id.clone(),
            Arc::new(on_update),
            session.store.as_ref(),
            &session.converter(),
        );

        Ok(ViewGuard {
            id: self.id.clone(),
            token,
            session: self.session.clone(),
        })
    }
}

impl fmt::Debug for SubscribedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscribedView").field("id", &self.id).finish()
    }
}

impl PartialEq for SubscribedView {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.session.ptr_eq(&other.session)
    }
}

/// Keeps a mounted view subscribed for as long as it lives.
#[must_use = "dropping the guard unmounts the view"]
pub struct ViewGuard {
    id: ResourceId,
    token: SubscriptionToken,
    session: Weak<SessionState>,
}

impl ViewGuard {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn unmount(self) {}
}

impl Drop for ViewGuard {
    fn drop(&mut self) {
        if let Some(session) = self.session.upgrade() {
            if session.subscriptions.release(&self.id, self.token) {
                tracing::debug!(resource = %self.id, "view unmounted");
            }
        }
    }
}

impl fmt::Debug for ViewGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewGuard")
            .field("id", &self.id)
            .field("token", &self.token)
            .finish()
    }
}

/// Client-side stand-in for a function that lives on the server.
#[derive(Clone)]
pub struct RemoteFunction {
    id: ResourceId,
    preload_plan: Option<PreloadPlan>,
    session: Weak<SessionState>,
}

impl RemoteFunction {
    pub(crate) fn new(
        id: ResourceId,
        preload_plan: Option<PreloadPlan>,
        session: Weak<SessionState>,
    ) -> Self {
        Self { id, preload_plan, session }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Fires the call and returns its correlation id. Nothing waits for the server:
    /// the eventual `function_return` only clears the pending entry.
    pub fn call(&self, args: Vec<Value>) -> PyxResult<CallId> {
        let session = self.session.upgrade().ok_or(PyxError::SessionClosed)?;
        session.ensure_open()?;

        let _span = session.span.enter();

        let call_id = Uuid::new_v4().simple().to_string();
        let arg_count = args.len();
        let args = Arc::new(Value::Array(args));

        session.calls.register(call_id.clone(), self.id.clone(), args.clone());

        let preloaded_data = match &self.preload_plan {
            Some(plan) => match preload(&args, plan) {
                Ok(data) => data,
                Err(e) => {
                    session.calls.complete(&call_id);
                    tracing::error!(
                        function = %self.id,
                        error = %e,
                        "preload plan does not match call arguments"
                    );
                    return Err(e);
                }
            },
            None => Map::new(),
        };

        let message = ClientMessage::ResourceEvent {
            id: self.id.clone(),
            data: ResourceEvent::Call(CallPayload {
                call_id: call_id.clone(),
                arg_count,
                preloaded_data,
            }),
        };

        if let Err(e) = session.post(message) {
            session.calls.complete(&call_id);
            return Err(e);
        }

        tracing::debug!(function = %self.id, call_id = %call_id, arg_count, "remote call sent");

        Ok(call_id)
    }
}

impl fmt::Debug for RemoteFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteFunction")
            .field("id", &self.id)
            .field("preload_plan", &self.preload_plan)
            .finish()
    }
}

impl PartialEq for RemoteFunction {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.preload_plan == other.preload_plan
            && self.session.ptr_eq(&other.session)
    }
}

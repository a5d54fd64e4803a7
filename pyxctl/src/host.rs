use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use pyx_runtime::{
    proxy::{SubscribedView, ViewGuard},
    render::RenderValue,
};
use pyx_runtime_sdk::model::value::ResourceId;
use serde_json::{json, Value};

use crate::cmd::OutputFormat;
use crate::formatter;

#[derive(Default)]
struct HostState {
    root: Option<ResourceId>,
    values: HashMap<ResourceId, RenderValue>,

    /// Ids with a mount in flight or done. Claimed under the lock so that a view
    /// reachable twice is only mounted once.
    mounted: HashSet<ResourceId>,
    guards: HashMap<ResourceId, ViewGuard>,
}

/// Keeps every view reachable from the root mounted and prints the whole tree
/// each time any part of it changes.
pub struct TerminalHost {
    state: Mutex<HostState>,
    format: OutputFormat,
    pretty: bool,
}

impl TerminalHost {
    pub fn new(format: OutputFormat, pretty: bool) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(HostState::default()),
            format,
            pretty,
        })
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drops the previous tree and mounts `view` as the new root.
    pub fn mount_root(self: &Arc<Self>, view: SubscribedView) {
        let stale = {
            let mut state = self.lock();
            state.root = Some(view.id().to_string());
            state.values.clear();
            state.mounted.clear();
            state.mounted.insert(view.id().to_string());
            std::mem::take(&mut state.guards)
        };
        drop(stale);

        tracing::info!(root = %view.id(), "mounting root");
        self.mount(view);
    }

    fn mount(self: &Arc<Self>, view: SubscribedView) {
        let host = Arc::downgrade(self);
        let id = view.id().to_string();

        let on_update = {
            let id = id.clone();
            move |value: RenderValue| {
                if let Some(host) = Weak::upgrade(&host) {
                    host.on_update(&id, value);
                }
            }
        };

        match view.mount(on_update) {
            Ok(guard) => {
                let mut state = self.lock();
                // pruned while the cached value was being delivered
                if state.mounted.contains(&id) {
                    state.guards.insert(id, guard);
                }
            }
            Err(e) => {
                tracing::warn!(resource = %id, error = %e, "failed to mount view");
                self.lock().mounted.remove(&id);
            }
        }
    }

    fn on_update(self: &Arc<Self>, id: &str, value: RenderValue) {
        let fresh: Vec<SubscribedView> = {
            let mut state = self.lock();
            let fresh = value
                .views()
                .into_iter()
                .filter(|view| state.mounted.insert(view.id().to_string()))
                .cloned()
                .collect();
            state.values.insert(id.to_string(), value);
            fresh
        };

        for view in fresh {
            self.mount(view);
        }

        drop(self.prune());
        self.print();
    }

    /// Unmounts views no longer reachable from the root. The guards are handed back
    /// so they drop outside the lock.
    fn prune(&self) -> Vec<ViewGuard> {
        let mut state = self.lock();
        let reachable = reachable(&state);

        state.mounted.retain(|id| reachable.contains(id));
        state.values.retain(|id, _| reachable.contains(id));

        let stale: Vec<ResourceId> = state
            .guards
            .keys()
            .filter(|id| !reachable.contains(*id))
            .cloned()
            .collect();

        stale.iter().filter_map(|id| state.guards.remove(id)).collect()
    }

    /// JSON picture of the tree as far as it has been rendered.
    pub fn snapshot(&self) -> Option<Value> {
        let state = self.lock();
        let root = state.root.as_ref()?;
        let mut visiting = Vec::new();

        Some(resolve(&state.values, root, &mut visiting))
    }

    fn print(&self) {
        let Some(tree) = self.snapshot() else {
            return;
        };

        if let Err(e) = formatter::print_output(&tree, self.format, self.pretty) {
            tracing::error!("Failed to print tree: {}", e);
        }
    }
}

fn reachable(state: &HostState) -> HashSet<ResourceId> {
    let mut seen = HashSet::new();
    let mut pending: Vec<ResourceId> = state.root.iter().cloned().collect();

    while let Some(id) = pending.pop() {
        if !seen.insert(id.clone()) {
            continue;
        }

        if let Some(value) = state.values.get(&id) {
            pending.extend(value.views().into_iter().map(|view| view.id().to_string()));
        }
    }

    seen
}

fn resolve(
    values: &HashMap<ResourceId, RenderValue>,
    id: &str,
    visiting: &mut Vec<ResourceId>,
) -> Value {
    if visiting.iter().any(|open| open == id) {
        return json!({ "__cycle__": id });
    }

    let Some(value) = values.get(id) else {
        return json!({ "__pending__": id });
    };

    visiting.push(id.to_string());
    let tree = value.snapshot(&mut |view: &SubscribedView| resolve(values, view.id(), visiting));
    visiting.pop();

    tree
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pyx_runtime::{ClientSession, ClientSessionBuilder};
    use serde_json::json;
    use tokio::sync::mpsc::unbounded_channel;

    use super::*;

    fn new_session() -> Arc<ClientSession> {
        let (tx, _rx) = unbounded_channel();
        Arc::new(ClientSessionBuilder::new(Arc::new(tx)).build())
    }

    fn send(session: &ClientSession, frame: Value) {
        session.handle_text(&frame.to_string()).unwrap();
    }

    fn watch(session: &Arc<ClientSession>, host: &Arc<TerminalHost>) {
        let weak = Arc::downgrade(session);
        let host = host.clone();
        session.watch_root(move |id| {
            if let Some(session) = weak.upgrade() {
                host.mount_root(session.view(&id));
            }
        });
    }

    #[test]
    fn test_tree_follows_nested_views() {
        let session = new_session();
        let host = TerminalHost::new(OutputFormat::Json, false);
        watch(&session, &host);

        send(&session, json!({ "event": "root", "data": "app" }));
        send(&session, json!({ "event": "render", "data": {
            "app": { "__type__": "Element", "tag": "div", "props": {}, "children": [
                { "__type__": "Renderable", "id": "counter" }
            ]}
        }}));

        assert_eq!(
            host.snapshot().unwrap(),
            json!({ "tag": "div", "props": {}, "children": [{ "__pending__": "counter" }] })
        );
        assert!(session.is_subscribed("counter"));

        send(&session, json!({ "event": "render", "data": { "counter": "Count: 1" } }));

        assert_eq!(
            host.snapshot().unwrap(),
            json!({ "tag": "div", "props": {}, "children": ["Count: 1"] })
        );
    }

    #[test]
    fn test_unreachable_views_are_unmounted() {
        let session = new_session();
        let host = TerminalHost::new(OutputFormat::Json, false);
        watch(&session, &host);

        send(&session, json!({ "event": "root", "data": "app" }));
        send(&session, json!({ "event": "render", "data": {
            "child": 1,
            "app": [{ "__type__": "Renderable", "id": "child" }]
        }}));
        assert!(session.is_subscribed("child"));
        assert_eq!(host.snapshot().unwrap(), json!([1]));

        send(&session, json!({ "event": "render", "data": { "app": [] } }));

        assert!(!session.is_subscribed("child"));
        assert_eq!(host.snapshot().unwrap(), json!([]));
    }

    #[test]
    fn test_cycles_are_cut() {
        let session = new_session();
        let host = TerminalHost::new(OutputFormat::Json, false);
        watch(&session, &host);

        send(&session, json!({ "event": "render", "data": {
            "a": { "next": { "__type__": "Renderable", "id": "b" } },
            "b": { "next": { "__type__": "Renderable", "id": "a" } }
        }}));
        send(&session, json!({ "event": "root", "data": "a" }));

        assert_eq!(
            host.snapshot().unwrap(),
            json!({ "next": { "next": { "__cycle__": "a" } } })
        );
    }

    #[test]
    fn test_new_root_replaces_tree() {
        let session = new_session();
        let host = TerminalHost::new(OutputFormat::Json, false);
        watch(&session, &host);

        send(&session, json!({ "event": "render", "data": { "one": 1, "two": 2 } }));
        send(&session, json!({ "event": "root", "data": "one" }));
        assert_eq!(host.snapshot().unwrap(), json!(1));

        send(&session, json!({ "event": "root", "data": "two" }));

        assert_eq!(host.snapshot().unwrap(), json!(2));
        assert!(!session.is_subscribed("one"));
    }
}

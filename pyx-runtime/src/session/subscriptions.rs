use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use dashmap::DashMap;
use pyx_runtime_sdk::{
    data::ResourceStore,
    model::value::{RawValue, ResourceId},
};

use crate::convert::Converter;
use crate::render::RenderValue;

pub type UpdateCallback = Arc<dyn Fn(RenderValue) + Send + Sync>;

/// Identifies one particular subscription, so a stale unmount can't remove its replacement.
/// Tokens are issued in increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionToken(u64);

struct Subscription {
    token: SubscriptionToken,
    callback: UpdateCallback,
}

/// At most one update callback per resource. Kept apart from the store so that a view
/// can mount before or after the data it shows arrives.
#[derive(Default)]
pub struct SubscriptionRegistry {
    subscriptions: DashMap<ResourceId, Subscription>,
    next_token: AtomicU64,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `callback` for `id`, replacing any previous one, and delivers the cached
    /// value right away if the store already has one.
    ///
    /// The subscription is in place before the store is read: a render racing with this
    /// call either finds the subscriber to notify or has stored its value before the read.
    pub fn subscribe(
        &self,
        id: ResourceId,
        callback: UpdateCallback,
        store: &dyn ResourceStore,
        converter: &Converter,
    ) -> SubscriptionToken {
        let token = SubscriptionToken(self.next_token.fetch_add(1, Ordering::SeqCst));

        // the map guard must be gone before the callback runs, it may mount nested views
        let replaced = self
            .subscriptions
            .insert(id.clone(), Subscription { token, callback: callback.clone() })
            .is_some();

        let cached = store.get(&id);
        tracing::debug!(resource = %id, replaced, cached = cached.is_some(), "subscribed");

        if let Some(raw) = cached {
            callback(converter.convert(&raw));
        }

        token
    }

    /// The token the next subscription will get. Subscriptions issued from here on read
    /// whatever the store holds at that point.
    pub fn watermark(&self) -> SubscriptionToken {
        SubscriptionToken(self.next_token.load(Ordering::SeqCst))
    }

    /// Delivers `value` to whoever currently watches `id`. Returns whether anyone did.
    pub fn notify(&self, id: &str, value: &RawValue, converter: &Converter) -> bool {
        self.deliver(id, value, converter, None)
    }

    /// Like `notify`, but skips a subscription issued at or after `watermark`. Such a
    /// subscriber already received the stored value when it subscribed.
    pub fn notify_before(
        &self,
        id: &str,
        value: &RawValue,
        converter: &Converter,
        watermark: SubscriptionToken,
    ) -> bool {
        self.deliver(id, value, converter, Some(watermark))
    }

    fn deliver(
        &self,
        id: &str,
        value: &RawValue,
        converter: &Converter,
        watermark: Option<SubscriptionToken>,
    ) -> bool {
        let callback = self
            .subscriptions
            .get(id)
            .filter(|subscription| watermark.map_or(true, |mark| subscription.token < mark))
            .map(|subscription| subscription.callback.clone());

        match callback {
            Some(callback) => {
                callback(converter.convert(value));
                true
            }
            None => false,
        }
    }

    pub fn unsubscribe(&self, id: &str) -> bool {
        self.subscriptions.remove(id).is_some()
    }

    /// Removes the subscription for `id` only if it is still the one `token` names.
    pub fn release(&self, id: &str, token: SubscriptionToken) -> bool {
        self.subscriptions
            .remove_if(id, |_, subscription| subscription.token == token)
            .is_some()
    }

    pub fn is_subscribed(&self, id: &str) -> bool {
        self.subscriptions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn clear(&self) {
        self.subscriptions.clear();
    }
}

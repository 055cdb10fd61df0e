//! Typed publish/subscribe event bus.
//!
//! Two audiences exist for every published event: *handlers*, which do the
//! actual work for one event kind and whose failures fail the publish, and
//! *subscribers*, passive observers that watch the lifecycle of every
//! publish regardless of kind.

use crate::error::Result;
use futures::future::{BoxFuture, join_all};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use tokio::sync::RwLock;

/// An event type routable by the bus.
///
/// `Kind` is the discriminant handlers register against; `kind()` projects
/// an event value onto it.
pub trait BusEvent: Clone + Send + Sync + 'static {
    type Kind: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    fn kind(&self) -> Self::Kind;
}

/// Lifecycle of one published event, as seen by subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Handlers are about to run.
    Loading,
    /// Every handler completed.
    Success,
    /// At least one handler failed; carries the first failure's message.
    Error(String),
}

/// What a subscriber receives: the event plus where its publish stands.
#[derive(Debug, Clone)]
pub struct Notification<E> {
    pub event: E,
    pub status: Status,
}

type Handler<E> = Box<dyn Fn(E) -> BoxFuture<'static, Result<()>> + Send + Sync>;
type Subscriber<E> = Box<dyn Fn(Notification<E>) + Send + Sync>;

/// Routes events to per-kind handlers and notifies passive subscribers.
///
/// Handlers of one kind run concurrently per publish; the bus itself
/// provides no mutual exclusion between publishes.
pub struct EventBus<E: BusEvent> {
    handlers: RwLock<HashMap<E::Kind, Vec<Handler<E>>>>,
    subscribers: RwLock<Vec<Subscriber<E>>>,
}

impl<E: BusEvent> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            subscribers: RwLock::new(Vec::new()),
        }
    }
}

impl<E: BusEvent> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for exactly one event kind.
    pub async fn subscribe<F, Fut>(&self, kind: E::Kind, handler: F)
    where
        F: Fn(E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let boxed: Handler<E> = Box::new(move |event| Box::pin(handler(event)));
        self.handlers.write().await.entry(kind).or_default().push(boxed);
    }

    /// Register a passive observer.
    ///
    /// For every publish it receives exactly two notifications: one with
    /// [`Status::Loading`] before any handler runs, one with the terminal
    /// [`Status::Success`] or [`Status::Error`].
    pub async fn add_subscriber<F>(&self, subscriber: F)
    where
        F: Fn(Notification<E>) + Send + Sync + 'static,
    {
        self.subscribers.write().await.push(Box::new(subscriber));
    }

    async fn notify(&self, event: E, status: Status) {
        for subscriber in self.subscribers.read().await.iter() {
            subscriber(Notification { event: event.clone(), status: status.clone() });
        }
    }

    /// Fan an event out to every handler registered for its kind.
    ///
    /// All handlers run concurrently and all settle before this returns.
    /// On failure the error returned (and forwarded to subscribers) is the
    /// first failing handler's in registration order; completion order
    /// between handlers is otherwise unspecified.
    pub async fn publish(&self, event: E) -> Result<()> {
        let kind = event.kind();
        tracing::debug!(?kind, "publishing event");
        self.notify(event.clone(), Status::Loading).await;

        let futures: Vec<_> = {
            let handlers = self.handlers.read().await;
            match handlers.get(&kind) {
                Some(registered) => registered.iter().map(|handler| handler(event.clone())).collect(),
                None => Vec::new(),
            }
        };
        // `join_all` preserves input order, so the first error found here
        // is the first in registration order.
        let failure = join_all(futures).await.into_iter().find_map(Result::err);

        match failure {
            None => {
                self.notify(event, Status::Success).await;
                Ok(())
            },
            Some(error) => {
                tracing::warn!(?kind, %error, "event handler failed");
                self.notify(event, Status::Error(error.to_string())).await;
                Err(error)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone)]
    enum Ping {
        One,
        Two,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum PingKind {
        One,
        Two,
    }

    impl BusEvent for Ping {
        type Kind = PingKind;

        fn kind(&self) -> PingKind {
            match self {
                Ping::One => PingKind::One,
                Ping::Two => PingKind::Two,
            }
        }
    }

    fn failing(message: &'static str) -> impl Fn(Ping) -> BoxFuture<'static, Result<()>> + Send + Sync {
        move |_| Box::pin(async move { exn::bail!(ErrorKind::Adapter(message.to_string())) })
    }

    #[tokio::test]
    async fn handlers_only_see_their_kind() {
        let bus = EventBus::<Ping>::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = calls.clone();
        bus.subscribe(PingKind::One, move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .await;

        bus.publish(Ping::Two).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        bus.publish(Ping::One).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn subscribers_see_loading_then_success() {
        let bus = EventBus::<Ping>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        bus.add_subscriber(move |notification: Notification<Ping>| {
            sink.lock().unwrap().push(notification.status);
        })
        .await;

        bus.publish(Ping::One).await.unwrap();
        assert_eq!(&*seen.lock().unwrap(), &[Status::Loading, Status::Success]);
    }

    #[tokio::test]
    async fn first_registered_failure_wins() {
        let bus = EventBus::<Ping>::new();
        bus.subscribe(PingKind::One, failing("first")).await;
        bus.subscribe(PingKind::One, failing("second")).await;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        bus.add_subscriber(move |notification: Notification<Ping>| {
            sink.lock().unwrap().push(notification.status);
        })
        .await;

        let err = bus.publish(Ping::One).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Adapter(name) if name == "first"));
        let statuses = seen.lock().unwrap();
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0], Status::Loading);
        assert!(matches!(&statuses[1], Status::Error(msg) if msg.contains("first")));
    }

    #[tokio::test]
    async fn publish_without_handlers_succeeds() {
        let bus = EventBus::<Ping>::new();
        bus.publish(Ping::One).await.unwrap();
    }
}

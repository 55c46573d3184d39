//! Document store seam and in-memory implementation
//!
//! This module defines the trait through which all session state flows
//! between clients. The store holds JSON documents keyed by collection
//! and id, delivers eventually-consistent snapshots to subscribers, and
//! applies partial updates with shallow top-level merge semantics.
//!
//! The trait abstraction keeps the rest of the library unit-testable
//! without a live backend: production wires a hosted real-time database
//! adapter behind it, tests use [`MemoryStore`].

use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, VecDeque},
    rc::Rc,
};

use serde_json::Value;
use thiserror::Error;

/// A stored document: a JSON object of top-level fields
pub type Document = serde_json::Map<String, Value>;

/// A snapshot listener invoked with the document's current value
pub type Listener = Box<dyn FnMut(&Document)>;

/// Errors surfaced by store operations
///
/// Store failures are never fatal: callers surface them as a message to
/// the acting user and the user may re-attempt manually. There is no
/// automatic retry anywhere in this library.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The requested document does not exist
    #[error("document not found")]
    NotFound,
    /// A document with this id already exists in the collection
    #[error("document already exists")]
    AlreadyExists,
    /// The backend failed to apply the operation
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Handle for an active snapshot subscription
///
/// Cancelling detaches the listener. This is the only cancellation
/// primitive in the system: a patch, once sent, cannot be retracted.
pub trait Subscription {
    /// Stops snapshot delivery to the associated listener
    fn cancel(self);
}

/// The minimum store surface the session core requires
///
/// Implementations deliver eventually-consistent snapshots: later calls
/// produce later-or-equal snapshots, but no ordering guarantee exists
/// beyond that and intermediate states may be coalesced. The design
/// must tolerate both.
pub trait DocumentStore {
    /// Handle type returned by [`DocumentStore::subscribe`]
    type Subscription: Subscription;

    /// Creates a document, failing if the id is already taken
    fn create(&self, collection: &str, id: &str, value: Document) -> Result<(), Error>;

    /// Reads the current value of a document
    fn read(&self, collection: &str, id: &str) -> Result<Document, Error>;

    /// Registers a listener for snapshots of a document
    ///
    /// The listener fires with the current value immediately if the
    /// document exists, and again whenever the store's view of the
    /// document changes.
    fn subscribe(&self, collection: &str, id: &str, listener: Listener) -> Self::Subscription;

    /// Shallow-merges the given fields into a stored document
    ///
    /// Each top-level key in `partial` wholesale-replaces the stored
    /// value under that key; nested objects are NOT deep-merged. Keys
    /// absent from `partial` are preserved. Cooperative board updates
    /// rely on this contract: they always send the complete new value
    /// for the one top-level key they touch.
    fn patch(&self, collection: &str, id: &str, partial: Document) -> Result<(), Error>;

    /// Sets a single nested field addressed by a dotted path
    ///
    /// Unlike [`DocumentStore::patch`], this touches only the one entry
    /// the path names (for example `players.<id>`), leaving sibling
    /// entries of the enclosing object untouched. Join registration
    /// uses this to avoid clobbering concurrent joins.
    fn patch_field(&self, collection: &str, id: &str, path: &str, value: Value) -> Result<(), Error>;
}

/// Key identifying one document within the store
type DocKey = (String, String);

/// Internal shared state of [`MemoryStore`]
#[derive(Default)]
struct StoreInner {
    /// All stored documents keyed by (collection, id)
    documents: RefCell<HashMap<DocKey, Document>>,
    /// Registered listeners per document
    listeners: RefCell<HashMap<DocKey, Vec<(u64, Rc<RefCell<Listener>>)>>>,
    /// Source of unique listener registration ids
    next_listener: Cell<u64>,
    /// Documents with snapshot deliveries waiting to go out
    pending: RefCell<VecDeque<DocKey>>,
    /// Guard against re-entrant delivery loops
    delivering: Cell<bool>,
}

/// Single-process, single-threaded in-memory document store
///
/// Matches the concurrency model of the real system as seen from one
/// client: event-driven, no parallelism, snapshot callbacks delivered
/// from a queue. Cloning the store yields another handle to the same
/// underlying documents, so one instance can serve the host and every
/// player within a test.
///
/// Snapshot delivery is queued rather than immediate, so a listener may
/// itself issue reads and patches; deliveries triggered while the queue
/// is draining are coalesced into the same drain pass. Listeners see
/// the document's value at delivery time, which may skip intermediate
/// states entirely.
#[derive(Default, Clone)]
pub struct MemoryStore {
    inner: Rc<StoreInner>,
}

impl MemoryStore {
    /// Creates an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a snapshot delivery for a document and drains the queue
    /// unless a drain is already in progress higher up the stack
    fn notify(&self, key: DocKey) {
        self.inner.pending.borrow_mut().push_back(key);

        if self.inner.delivering.get() {
            return;
        }
        self.inner.delivering.set(true);

        loop {
            let Some(key) = self.inner.pending.borrow_mut().pop_front() else {
                break;
            };

            // Snapshot and listener list are cloned out so no store
            // borrow is held while user callbacks run.
            let snapshot = self.inner.documents.borrow().get(&key).cloned();
            let Some(snapshot) = snapshot else {
                continue;
            };
            let targets: Vec<Rc<RefCell<Listener>>> = self
                .inner
                .listeners
                .borrow()
                .get(&key)
                .map(|v| v.iter().map(|(_, l)| Rc::clone(l)).collect())
                .unwrap_or_default();

            tracing::trace!(
                collection = key.0,
                id = key.1,
                listeners = targets.len(),
                "delivering snapshot"
            );

            for listener in targets {
                (listener.borrow_mut())(&snapshot);
            }
        }

        self.inner.delivering.set(false);
    }
}

impl DocumentStore for MemoryStore {
    type Subscription = MemorySubscription;

    fn create(&self, collection: &str, id: &str, value: Document) -> Result<(), Error> {
        let key = (collection.to_owned(), id.to_owned());

        {
            let mut documents = self.inner.documents.borrow_mut();
            if documents.contains_key(&key) {
                return Err(Error::AlreadyExists);
            }
            documents.insert(key.clone(), value);
        }

        tracing::debug!(collection, id, "created document");
        self.notify(key);
        Ok(())
    }

    fn read(&self, collection: &str, id: &str) -> Result<Document, Error> {
        self.inner
            .documents
            .borrow()
            .get(&(collection.to_owned(), id.to_owned()))
            .cloned()
            .ok_or(Error::NotFound)
    }

    fn subscribe(&self, collection: &str, id: &str, listener: Listener) -> Self::Subscription {
        let key = (collection.to_owned(), id.to_owned());
        let registration = self.inner.next_listener.get();
        self.inner.next_listener.set(registration + 1);

        self.inner
            .listeners
            .borrow_mut()
            .entry(key.clone())
            .or_default()
            .push((registration, Rc::new(RefCell::new(listener))));

        // Initial snapshot, if the document already exists.
        self.notify(key.clone());

        MemorySubscription {
            inner: Rc::clone(&self.inner),
            key,
            registration,
        }
    }

    fn patch(&self, collection: &str, id: &str, partial: Document) -> Result<(), Error> {
        let key = (collection.to_owned(), id.to_owned());

        {
            let mut documents = self.inner.documents.borrow_mut();
            let document = documents.get_mut(&key).ok_or(Error::NotFound)?;
            for (field, value) in partial {
                document.insert(field, value);
            }
        }

        tracing::debug!(collection, id, "patched document");
        self.notify(key);
        Ok(())
    }

    fn patch_field(
        &self,
        collection: &str,
        id: &str,
        path: &str,
        value: Value,
    ) -> Result<(), Error> {
        let key = (collection.to_owned(), id.to_owned());

        {
            let mut documents = self.inner.documents.borrow_mut();
            let document = documents.get_mut(&key).ok_or(Error::NotFound)?;

            let mut segments = path.split('.').peekable();
            let mut current = document;
            loop {
                let Some(segment) = segments.next() else {
                    return Err(Error::Backend(format!("empty field path: {path:?}")));
                };
                if segments.peek().is_none() {
                    current.insert(segment.to_owned(), value);
                    break;
                }
                let entry = current
                    .entry(segment.to_owned())
                    .or_insert_with(|| Value::Object(Document::new()));
                if !entry.is_object() {
                    // A path segment crossing a scalar replaces it,
                    // matching hosted field-path update behavior.
                    *entry = Value::Object(Document::new());
                }
                current = entry
                    .as_object_mut()
                    .ok_or_else(|| Error::Backend(format!("field path not an object: {path:?}")))?;
            }
        }

        tracing::debug!(collection, id, path, "patched document field");
        self.notify(key);
        Ok(())
    }
}

/// Subscription handle for [`MemoryStore`]
pub struct MemorySubscription {
    /// The store this listener is registered with
    inner: Rc<StoreInner>,
    /// The document the listener watches
    key: DocKey,
    /// The listener's registration id
    registration: u64,
}

impl Subscription for MemorySubscription {
    fn cancel(self) {
        if let Some(registered) = self.inner.listeners.borrow_mut().get_mut(&self.key) {
            registered.retain(|(id, _)| *id != self.registration);
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("test document must be an object"),
        }
    }

    #[test]
    fn test_create_and_read() {
        let store = MemoryStore::new();
        store
            .create("sessions", "123", doc(json!({"status": "waiting"})))
            .unwrap();

        let read = store.read("sessions", "123").unwrap();
        assert_eq!(read["status"], "waiting");
    }

    #[test]
    fn test_create_duplicate_rejected() {
        let store = MemoryStore::new();
        store.create("sessions", "123", Document::new()).unwrap();
        assert_eq!(
            store.create("sessions", "123", Document::new()),
            Err(Error::AlreadyExists)
        );
    }

    #[test]
    fn test_read_missing() {
        let store = MemoryStore::new();
        assert_eq!(store.read("sessions", "nope"), Err(Error::NotFound));
    }

    #[test]
    fn test_patch_missing() {
        let store = MemoryStore::new();
        assert_eq!(
            store.patch("sessions", "nope", Document::new()),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn test_patch_shallow_merges_top_level_keys() {
        let store = MemoryStore::new();
        store
            .create(
                "sessions",
                "123",
                doc(json!({"status": "waiting", "currentQuestionIndex": 0})),
            )
            .unwrap();

        store
            .patch("sessions", "123", doc(json!({"status": "active"})))
            .unwrap();

        let read = store.read("sessions", "123").unwrap();
        assert_eq!(read["status"], "active");
        // Untouched keys are preserved.
        assert_eq!(read["currentQuestionIndex"], 0);
    }

    #[test]
    fn test_patch_wholesale_replaces_nested_objects() {
        let store = MemoryStore::new();
        store
            .create(
                "sessions",
                "123",
                doc(json!({"boardState": {"found": ["cat"], "extra": true}})),
            )
            .unwrap();

        // A patched key replaces its previous value entirely; nested
        // objects are not deep-merged.
        store
            .patch(
                "sessions",
                "123",
                doc(json!({"boardState": {"found": ["cat", "dog"]}})),
            )
            .unwrap();

        let read = store.read("sessions", "123").unwrap();
        assert_eq!(read["boardState"], json!({"found": ["cat", "dog"]}));
    }

    #[test]
    fn test_patch_field_touches_only_named_entry() {
        let store = MemoryStore::new();
        store
            .create(
                "sessions",
                "123",
                doc(json!({"players": {"a": {"name": "Ana", "score": 0}}})),
            )
            .unwrap();

        store
            .patch_field(
                "sessions",
                "123",
                "players.b",
                json!({"name": "Bo", "score": 0}),
            )
            .unwrap();

        let read = store.read("sessions", "123").unwrap();
        assert_eq!(read["players"]["a"]["name"], "Ana");
        assert_eq!(read["players"]["b"]["name"], "Bo");
    }

    #[test]
    fn test_patch_field_creates_intermediate_objects() {
        let store = MemoryStore::new();
        store.create("sessions", "123", Document::new()).unwrap();

        store
            .patch_field("sessions", "123", "players.a.score", json!(3))
            .unwrap();

        let read = store.read("sessions", "123").unwrap();
        assert_eq!(read["players"]["a"]["score"], 3);
    }

    #[test]
    fn test_subscribe_delivers_initial_and_updated_snapshots() {
        let store = MemoryStore::new();
        store
            .create("sessions", "123", doc(json!({"status": "waiting"})))
            .unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _subscription = store.subscribe(
            "sessions",
            "123",
            Box::new(move |snapshot| {
                sink.borrow_mut()
                    .push(snapshot["status"].as_str().unwrap().to_owned());
            }),
        );

        store
            .patch("sessions", "123", doc(json!({"status": "active"})))
            .unwrap();

        assert_eq!(seen.borrow().as_slice(), ["waiting", "active"]);
    }

    #[test]
    fn test_cancelled_subscription_stops_delivery() {
        let store = MemoryStore::new();
        store
            .create("sessions", "123", doc(json!({"status": "waiting"})))
            .unwrap();

        let seen = Rc::new(RefCell::new(0usize));
        let sink = Rc::clone(&seen);
        let subscription = store.subscribe(
            "sessions",
            "123",
            Box::new(move |_| {
                *sink.borrow_mut() += 1;
            }),
        );
        assert_eq!(*seen.borrow(), 1);

        subscription.cancel();
        store
            .patch("sessions", "123", doc(json!({"status": "active"})))
            .unwrap();
        assert_eq!(*seen.borrow(), 1);
    }

    #[test]
    fn test_listener_may_reenter_store() {
        let store = MemoryStore::new();
        store
            .create("sessions", "123", doc(json!({"status": "waiting", "echo": 0})))
            .unwrap();

        let reentrant = store.clone();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _subscription = store.subscribe(
            "sessions",
            "123",
            Box::new(move |snapshot| {
                sink.borrow_mut().push(snapshot["status"].clone());
                // A client reacting to a snapshot by patching must not
                // deadlock or panic; delivery of the follow-up snapshot
                // is queued behind this one.
                if snapshot["status"] == "waiting" {
                    reentrant
                        .patch("sessions", "123", doc(json!({"status": "active"})))
                        .unwrap();
                }
            }),
        );

        assert_eq!(seen.borrow().as_slice(), [json!("waiting"), json!("active")]);
    }
}

//! In-memory entity store.

use crate::error::{Result, TrancheError};
use crate::run_state::RequestContext;
use crate::traits::{EntityStore, Fetch, ListPage, ListQuery};
use crate::value::Value;
use parking_lot::RwLock;
use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// How a [`MemoryStore`] answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Every lookup is `Ready`, as if served from cache.
    #[default]
    Immediate,
    /// Every lookup is `Pending` and resolves after the delay on the runtime.
    Deferred(Duration),
}

/// Entity store backed by in-memory lists.
///
/// Entities are matched on their `id` field. Counts every call so tests can
/// check what compilation and runs actually asked for.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entities: RwLock<BTreeMap<String, Vec<Value>>>,
    failing: RwLock<HashSet<String>>,
    mode: FetchMode,
    gets: AtomicUsize,
    lists: AtomicUsize,
    prepares: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store answering immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how lookups are answered.
    pub fn with_mode(mut self, mode: FetchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Add an entity (builder form).
    pub fn with_entity(self, type_name: impl Into<String>, entity: impl Into<Value>) -> Self {
        self.insert(type_name, entity);
        self
    }

    /// Add an entity.
    pub fn insert(&self, type_name: impl Into<String>, entity: impl Into<Value>) {
        self.entities
            .write()
            .entry(type_name.into())
            .or_default()
            .push(entity.into());
    }

    /// Make every lookup of `type_name` fail.
    pub fn fail_type(&self, type_name: impl Into<String>) {
        self.failing.write().insert(type_name.into());
    }

    /// Number of `get` calls.
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Number of `list` calls.
    pub fn list_count(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    /// Number of `prepare` calls.
    pub fn prepare_count(&self) -> usize {
        self.prepares.load(Ordering::SeqCst)
    }

    fn check(&self, type_name: &str) -> Result<()> {
        if self.failing.read().contains(type_name) {
            return Err(TrancheError::fetch(type_name, "store unavailable"));
        }
        Ok(())
    }

    fn answer<T: Send + 'static>(&self, result: Result<T>) -> Fetch<T> {
        match self.mode {
            FetchMode::Immediate => Fetch::Ready(result),
            FetchMode::Deferred(delay) => Fetch::pending(async move {
                tokio::time::sleep(delay).await;
                result
            }),
        }
    }

    fn find(&self, type_name: &str, id: &Value) -> Option<Value> {
        let wanted = id.string_form();
        self.entities.read().get(type_name).and_then(|items| {
            items
                .iter()
                .find(|entity| {
                    entity
                        .get_field("id")
                        .is_some_and(|v| v.string_form() == wanted)
                })
                .cloned()
        })
    }

    fn query(&self, type_name: &str, query: &ListQuery) -> ListPage {
        let entities = self.entities.read();
        let mut items: Vec<Value> = entities
            .get(type_name)
            .map(|items| {
                items
                    .iter()
                    .filter(|entity| {
                        query.filter.iter().all(|(field, expected)| {
                            entity
                                .get_field(field)
                                .is_some_and(|v| v.string_form() == expected.string_form())
                        })
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(sort) = &query.sort {
            let (field, descending) = match sort.strip_prefix('-') {
                Some(field) => (field, true),
                None => (sort.as_str(), false),
            };
            items.sort_by(|a, b| {
                let ord = compare(&a.get_field(field), &b.get_field(field));
                if descending { ord.reverse() } else { ord }
            });
        }

        let total = query.count_total.then_some(items.len() as u64);
        let limit = query.limit.map_or(usize::MAX, |l| l as usize);
        let items = items
            .into_iter()
            .skip(query.offset as usize)
            .take(limit)
            .collect();
        ListPage { items, total }
    }
}

fn compare(a: &Option<Value>, b: &Option<Value>) -> CmpOrdering {
    match (a, b) {
        (Some(a), Some(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(CmpOrdering::Equal),
            _ => a.string_form().cmp(&b.string_form()),
        },
        (None, Some(_)) => CmpOrdering::Less,
        (Some(_), None) => CmpOrdering::Greater,
        (None, None) => CmpOrdering::Equal,
    }
}

impl EntityStore for MemoryStore {
    fn prepare(&self, _type_name: &str) -> Fetch<()> {
        self.prepares.fetch_add(1, Ordering::SeqCst);
        self.answer(Ok(()))
    }

    fn get(&self, type_name: &str, id: &Value, _ctx: &RequestContext) -> Fetch<Option<Value>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let result = self.check(type_name).map(|()| self.find(type_name, id));
        self.answer(result)
    }

    fn list(&self, type_name: &str, query: &ListQuery, _ctx: &RequestContext) -> Fetch<ListPage> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        let result = self.check(type_name).map(|()| self.query(type_name, query));
        self.answer(result)
    }
}

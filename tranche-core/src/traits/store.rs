//! Data-access collaborator.

use crate::error::Result;
use crate::run_state::RequestContext;
use crate::value::Value;
use futures_util::future::try_join_all;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

/// Boxed future of a deferred fetch.
pub type FetchFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'static>>;

/// Result of a data-access call.
///
/// Most lookups are answered from cache; those come back `Ready` and are
/// consumed inline without touching the run's waiter count. Only `Pending`
/// results suspend the run.
pub enum Fetch<T> {
    /// The answer is already available.
    Ready(Result<T>),
    /// The answer needs I/O.
    Pending(FetchFuture<T>),
}

impl<T: Send + 'static> Fetch<T> {
    /// An immediately available value.
    pub fn ready(value: T) -> Self {
        Self::Ready(Ok(value))
    }

    /// An immediately available failure.
    pub fn failed(err: crate::error::TrancheError) -> Self {
        Self::Ready(Err(err))
    }

    /// A deferred value.
    pub fn pending(future: impl Future<Output = Result<T>> + Send + 'static) -> Self {
        Self::Pending(Box::pin(future))
    }

    /// Check if the value is available without waiting.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Wait for the value.
    pub async fn resolve(self) -> Result<T> {
        match self {
            Self::Ready(result) => result,
            Self::Pending(future) => future.await,
        }
    }

    /// Transform the value once available.
    pub fn map<U: Send + 'static>(self, f: impl FnOnce(T) -> U + Send + 'static) -> Fetch<U> {
        match self {
            Self::Ready(result) => Fetch::Ready(result.map(f)),
            Self::Pending(future) => Fetch::pending(async move { future.await.map(f) }),
        }
    }

    /// Chain a dependent fetch once the value is available.
    pub fn and_then<U: Send + 'static>(
        self,
        f: impl FnOnce(T) -> Fetch<U> + Send + 'static,
    ) -> Fetch<U> {
        match self {
            Self::Ready(Ok(value)) => f(value),
            Self::Ready(Err(err)) => Fetch::failed(err),
            Self::Pending(future) => Fetch::pending(async move {
                let value = future.await?;
                f(value).resolve().await
            }),
        }
    }

    /// Combine several fetches, staying `Ready` when all of them are.
    ///
    /// Pending members are awaited together; the first failure wins.
    pub fn all(fetches: Vec<Fetch<T>>) -> Fetch<Vec<T>> {
        if !fetches.iter().all(Fetch::is_ready) {
            return Fetch::pending(try_join_all(fetches.into_iter().map(Fetch::resolve)));
        }
        let mut values = Vec::with_capacity(fetches.len());
        for fetch in fetches {
            if let Self::Ready(result) = fetch {
                match result {
                    Ok(value) => values.push(value),
                    Err(err) => return Fetch::failed(err),
                }
            }
        }
        Fetch::ready(values)
    }
}

/// Parameters of a list lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    /// Equality filters by field.
    pub filter: BTreeMap<String, Value>,
    /// Sort field, `-` prefixed for descending.
    pub sort: Option<String>,
    /// Maximum number of items.
    pub limit: Option<u64>,
    /// Number of items to skip.
    pub offset: u64,
    /// Whether the total before paging is wanted.
    pub count_total: bool,
}

/// One page of a list lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPage {
    /// Entities on this page.
    pub items: Vec<Value>,
    /// Total matches before paging, when requested.
    pub total: Option<u64>,
}

/// Async entity access keyed by entity-type name.
pub trait EntityStore: Send + Sync {
    /// One-off setup for an entity type, run at compile time.
    fn prepare(&self, _type_name: &str) -> Fetch<()> {
        Fetch::ready(())
    }

    /// Load one entity by id.
    fn get(&self, type_name: &str, id: &Value, ctx: &RequestContext) -> Fetch<Option<Value>>;

    /// Load a filtered list of entities.
    fn list(&self, type_name: &str, query: &ListQuery, ctx: &RequestContext) -> Fetch<ListPage>;
}

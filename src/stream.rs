//! Lazy, re-traversable record pipelines.
//!
//! A [`LazyStream`] starts *deferred*: its producer reproduces a fresh
//! traversal each time a terminal drains it, recomputing the whole chain.
//! Calling [`LazyStream::materialize`] transitions it, exactly once, to
//! *materialized*, backed by one concrete vector that later transforms and
//! terminals re-derive from without ever mutating it.

use crate::cache::FileCache;
use crate::Result;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;
use std::sync::Arc;

type BoxedIter<T> = Box<dyn Iterator<Item = Result<T>>>;
type Producer<T> = Rc<dyn Fn() -> BoxedIter<T>>;

enum Source<T> {
    Deferred(Producer<T>),
    Materialized(Arc<Vec<T>>),
}

/// Composable deferred pipeline over a record sequence.
///
/// Evaluation is single-threaded and synchronous; errors produced upstream
/// (a malformed record, an unreadable file) propagate to whichever terminal
/// drains the stream. There is no skip-and-continue mode.
pub struct LazyStream<T> {
    source: Source<T>,
}

impl<T: Clone + 'static> LazyStream<T> {
    /// Creates a deferred stream from a producer that yields a fresh
    /// traversal per call.
    pub fn new<I, F>(producer: F) -> Self
    where
        F: Fn() -> I + 'static,
        I: Iterator<Item = Result<T>> + 'static,
    {
        Self {
            source: Source::Deferred(Rc::new(move || Box::new(producer()) as BoxedIter<T>)),
        }
    }

    /// Creates a materialized stream over an already concrete sequence.
    #[must_use]
    pub fn of(items: Vec<T>) -> Self {
        Self {
            source: Source::Materialized(Arc::new(items)),
        }
    }

    /// Returns whether the stream is backed by a concrete sequence.
    #[must_use]
    pub const fn is_materialized(&self) -> bool {
        matches!(self.source, Source::Materialized(_))
    }

    /// Keeps only records the predicate accepts.
    #[must_use]
    pub fn filter(self, predicate: impl Fn(&T) -> bool + 'static) -> Self {
        let upstream = self.into_producer();
        let predicate = Rc::new(predicate);
        Self::wrap(move || -> BoxedIter<T> {
            let predicate = Rc::clone(&predicate);
            Box::new(upstream().filter(move |item| match item {
                Ok(record) => predicate(record),
                Err(_) => true,
            }))
        })
    }

    /// Transforms each record.
    #[must_use]
    pub fn map<U: Clone + 'static>(self, transform: impl Fn(T) -> U + 'static) -> LazyStream<U> {
        let upstream = self.into_producer();
        let transform = Rc::new(transform);
        LazyStream::wrap(move || -> BoxedIter<U> {
            let transform = Rc::clone(&transform);
            Box::new(upstream().map(move |item| item.map(|record| transform(record))))
        })
    }

    /// Truncates the stream after `max` records.
    #[must_use]
    pub fn limit(self, max: usize) -> Self {
        let upstream = self.into_producer();
        Self::wrap(move || -> BoxedIter<T> { Box::new(upstream().take(max)) })
    }

    /// Injects a side effect per record without consuming it.
    #[must_use]
    pub fn peek(self, action: impl Fn(&T) + 'static) -> Self {
        let upstream = self.into_producer();
        let action = Rc::new(action);
        Self::wrap(move || -> BoxedIter<T> {
            let action = Rc::clone(&action);
            Box::new(upstream().map(move |item| {
                if let Ok(record) = &item {
                    action(record);
                }
                item
            }))
        })
    }

    /// Makes the stream reusable: drains the producer exactly once into a
    /// concrete backing sequence. The identity on an already materialized
    /// stream.
    ///
    /// # Errors
    ///
    /// Propagates the first upstream error encountered while draining.
    pub fn materialize(self) -> Result<Self> {
        match self.source {
            Source::Materialized(_) => Ok(self),
            Source::Deferred(producer) => {
                let items = producer().collect::<Result<Vec<T>>>()?;
                Ok(Self::of(items))
            }
        }
    }

    /// Drains the stream into a vector.
    ///
    /// On a deferred stream every call recomputes the whole chain; call
    /// [`materialize`](Self::materialize) first to compute once.
    ///
    /// # Errors
    ///
    /// Propagates the first upstream error.
    pub fn to_list(&self) -> Result<Vec<T>> {
        match &self.source {
            Source::Deferred(producer) => producer().collect(),
            Source::Materialized(backing) => Ok(backing.as_ref().clone()),
        }
    }

    /// Drains the stream, applying the action to each record.
    ///
    /// # Errors
    ///
    /// Propagates the first upstream error.
    pub fn for_each(&self, mut action: impl FnMut(T)) -> Result<()> {
        for item in self.iterate() {
            action(item?);
        }
        Ok(())
    }

    /// Drains the stream into a set of keys.
    ///
    /// # Errors
    ///
    /// Propagates the first upstream error.
    pub fn to_set<K>(&self, key: impl Fn(&T) -> K) -> Result<HashSet<K>>
    where
        K: Eq + Hash,
    {
        let mut set = HashSet::new();
        for item in self.iterate() {
            set.insert(key(&item?));
        }
        Ok(set)
    }

    /// Drains the stream into a key→value map. Later records win on key
    /// collision.
    ///
    /// # Errors
    ///
    /// Propagates the first upstream error.
    pub fn to_map<K, V>(&self, key: impl Fn(&T) -> K, value: impl Fn(&T) -> V) -> Result<HashMap<K, V>>
    where
        K: Eq + Hash,
    {
        let mut map = HashMap::new();
        for item in self.iterate() {
            let record = item?;
            map.insert(key(&record), value(&record));
        }
        Ok(map)
    }

    /// Drains the stream, grouping records by key.
    ///
    /// # Errors
    ///
    /// Propagates the first upstream error.
    pub fn group_by<K>(&self, key: impl Fn(&T) -> K) -> Result<HashMap<K, Vec<T>>>
    where
        K: Eq + Hash,
    {
        let mut groups: HashMap<K, Vec<T>> = HashMap::new();
        for item in self.iterate() {
            let record = item?;
            groups.entry(key(&record)).or_default().push(record);
        }
        Ok(groups)
    }

    /// Drains the stream into a concrete sequence, then broadcasts the action
    /// across a scoped worker pool.
    ///
    /// No ordering guarantee between elements and no aggregated result; a
    /// panicking action in one worker does not prevent the others from
    /// running.
    ///
    /// # Errors
    ///
    /// Propagates the first upstream error from the draining phase.
    pub fn for_each_parallel(&self, action: impl Fn(&T) + Send + Sync) -> Result<()>
    where
        T: Send + Sync,
    {
        let items = self.to_list()?;
        if items.is_empty() {
            return Ok(());
        }
        let workers = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
        let chunk = items.len().div_ceil(workers);
        let action = &action;
        std::thread::scope(|scope| {
            for part in items.chunks(chunk) {
                scope.spawn(move || {
                    for record in part {
                        action(record);
                    }
                });
            }
        });
        Ok(())
    }

    /// Cache-or-compute: if the cache artifact exists, returns the stream it
    /// reads back; otherwise drains this stream, writes the result (only if
    /// non-empty), and returns the freshly computed sequence.
    ///
    /// # Errors
    ///
    /// Propagates upstream errors from draining and cache write failures.
    pub fn cache_by(self, cache: &dyn FileCache<T>) -> Result<Self> {
        if cache.exists() {
            tracing::debug!("cache hit, skipping upstream computation");
            return cache.read();
        }
        tracing::debug!("cache miss, computing upstream");
        let items = self.to_list()?;
        if !items.is_empty() {
            cache.write(&items)?;
        }
        Ok(Self::of(items))
    }

    fn wrap(producer: impl Fn() -> BoxedIter<T> + 'static) -> Self {
        Self {
            source: Source::Deferred(Rc::new(producer)),
        }
    }

    fn into_producer(self) -> Producer<T> {
        match self.source {
            Source::Deferred(producer) => producer,
            Source::Materialized(backing) => Rc::new(move || -> BoxedIter<T> {
                Box::new(SharedIter {
                    backing: Arc::clone(&backing),
                    index: 0,
                })
            }),
        }
    }

    fn iterate(&self) -> BoxedIter<T> {
        match &self.source {
            Source::Deferred(producer) => producer(),
            Source::Materialized(backing) => Box::new(SharedIter {
                backing: Arc::clone(backing),
                index: 0,
            }),
        }
    }
}

impl<T> Clone for LazyStream<T> {
    fn clone(&self) -> Self {
        let source = match &self.source {
            Source::Deferred(producer) => Source::Deferred(Rc::clone(producer)),
            Source::Materialized(backing) => Source::Materialized(Arc::clone(backing)),
        };
        Self { source }
    }
}

impl<T> fmt::Debug for LazyStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.source {
            Source::Deferred(_) => "deferred",
            Source::Materialized(_) => "materialized",
        };
        f.debug_struct("LazyStream").field("state", &state).finish()
    }
}

/// Clone-on-read iterator over a shared materialized backing.
struct SharedIter<T> {
    backing: Arc<Vec<T>>,
    index: usize,
}

impl<T: Clone> Iterator for SharedIter<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.backing.get(self.index)?.clone();
        self.index += 1;
        Some(Ok(item))
    }
}

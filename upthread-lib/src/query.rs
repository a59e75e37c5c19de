//! A cache of remote query results with declarative invalidation.
//!
//! Consumers read a [QuerySnapshot] every frame. When a key is missing or
//! stale, [QueryCache::begin_fetch] tells exactly one consumer to dispatch a
//! resolve. Mutations declare the queries they affect; once a mutation
//! finishes those keys are invalidated, the invalidation is published to
//! subscribers, and the next consumer to read a stale key re-resolves it.

use crate::api::RemoteApi;
use crate::error::Error;
use crate::post::{Post, PostId};
use crate::vote::Vote;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Identifies one remote query and its variables
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    VotesByPostId(PostId),
    PostList,
    PostsByTopic(String),
    Post(PostId),
}

impl QueryKey {
    pub fn operation_name(&self) -> &'static str {
        match self {
            QueryKey::VotesByPostId(_) => "getVotesByPostId",
            QueryKey::PostList => "getPostList",
            QueryKey::PostsByTopic(_) => "getPostListByTopic",
            QueryKey::Post(_) => "getPostByPostId",
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::VotesByPostId(id) | QueryKey::Post(id) => {
                write!(f, "{}({})", self.operation_name(), id)
            }
            QueryKey::PostsByTopic(topic) => write!(f, "{}({})", self.operation_name(), topic),
            QueryKey::PostList => write!(f, "{}", self.operation_name()),
        }
    }
}

/// The result of a query
#[derive(Debug, Clone)]
pub enum QueryData {
    Votes(Arc<Vec<Vote>>),
    Posts(Arc<Vec<Post>>),
    Post(Option<Arc<Post>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryStatus {
    Loading,
    Ready,
    Failed(String),
}

/// What a consumer sees of a query
#[derive(Debug, Clone)]
pub struct QuerySnapshot {
    pub status: QueryStatus,

    /// The last data that arrived. Kept through refetches and failures.
    pub data: Option<QueryData>,

    /// Bumped every time a fetch completes or fails. Consumers that derive
    /// state from the data recompute when this changes.
    pub generation: u64,

    /// Invalidated and waiting for a consumer to refetch
    pub stale: bool,

    /// How many finished mutations on this key the data reflects. Compare
    /// against a ticket from [QueryCache::register_mutation].
    pub mutations_applied: u64,
}

impl QuerySnapshot {
    fn loading() -> QuerySnapshot {
        QuerySnapshot {
            status: QueryStatus::Loading,
            data: None,
            generation: 0,
            stale: false,
            mutations_applied: 0,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            QueryStatus::Failed(s) => Some(s),
            _ => None,
        }
    }

    pub fn votes(&self) -> Option<&Arc<Vec<Vote>>> {
        match &self.data {
            Some(QueryData::Votes(v)) => Some(v),
            _ => None,
        }
    }

    pub fn posts(&self) -> Option<&Arc<Vec<Post>>> {
        match &self.data {
            Some(QueryData::Posts(p)) => Some(p),
            _ => None,
        }
    }

    /// `Some(None)` means the post was looked up and does not exist
    pub fn post(&self) -> Option<Option<&Arc<Post>>> {
        match &self.data {
            Some(QueryData::Post(p)) => Some(p.as_ref()),
            _ => None,
        }
    }
}

struct QueryEntry {
    snapshot: QuerySnapshot,

    // invalidated while a fetch was in flight; that fetch may predate the change
    refetch_after_load: bool,

    // finished mutations as of when the current fetch began
    fetch_covers: u64,
}

impl QueryEntry {
    fn new(covers: u64) -> QueryEntry {
        QueryEntry {
            snapshot: QuerySnapshot::loading(),
            refetch_after_load: false,
            fetch_covers: covers,
        }
    }
}

/// Mutations counted against one query key
#[derive(Debug, Default, Clone, Copy)]
struct MutationCount {
    requested: u64,
    finished: u64,
}

/// A write that changes remote data, along with the queries it affects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    AddVote {
        post_id: PostId,
        username: String,
        upvote: bool,
    },
}

impl Mutation {
    /// Queries whose results this mutation can change
    pub fn refetch_queries(&self) -> Vec<QueryKey> {
        match self {
            Mutation::AddVote { post_id, .. } => vec![QueryKey::VotesByPostId(*post_id)],
        }
    }

    pub async fn execute(&self, api: &dyn RemoteApi) -> Result<(), Error> {
        match self {
            Mutation::AddVote {
                post_id,
                username,
                upvote,
            } => api.add_vote(*post_id, username, *upvote).await,
        }
    }
}

pub struct QueryCache {
    entries: DashMap<QueryKey, QueryEntry>,
    mutations: DashMap<QueryKey, MutationCount>,
    invalidations: broadcast::Sender<QueryKey>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> QueryCache {
        let (invalidations, _) = broadcast::channel(256);
        QueryCache {
            entries: DashMap::new(),
            mutations: DashMap::new(),
            invalidations,
        }
    }

    pub fn snapshot(&self, key: &QueryKey) -> Option<QuerySnapshot> {
        self.entries.get(key).map(|e| e.snapshot.clone())
    }

    /// Returns true if the caller should dispatch a resolve for this key.
    /// The key is marked as loading so nobody else does the same.
    pub fn begin_fetch(&self, key: &QueryKey) -> bool {
        let finished = self.mutations_finished(key);
        match self.entries.entry(key.clone()) {
            Entry::Vacant(vacant) => {
                vacant.insert(QueryEntry::new(finished));
                true
            }
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if entry.snapshot.stale && !entry.snapshot.is_loading() {
                    entry.snapshot.status = QueryStatus::Loading;
                    entry.snapshot.stale = false;
                    entry.fetch_covers = finished;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn complete(&self, key: &QueryKey, data: QueryData) {
        self.finish(key, QueryStatus::Ready, Some(data));
    }

    pub fn fail(&self, key: &QueryKey, message: String) {
        self.finish(key, QueryStatus::Failed(message), None);
    }

    fn finish(&self, key: &QueryKey, status: QueryStatus, data: Option<QueryData>) {
        let finished = self.mutations_finished(key);
        let mut entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| QueryEntry::new(finished));
        let entry = entry.value_mut();
        entry.snapshot.status = status;
        if data.is_some() {
            entry.snapshot.data = data;
        }
        entry.snapshot.generation += 1;
        entry.snapshot.stale = entry.refetch_after_load;
        entry.snapshot.mutations_applied = entry.fetch_covers;
        entry.refetch_after_load = false;
    }

    fn mutations_finished(&self, key: &QueryKey) -> u64 {
        self.mutations.get(key).map(|m| m.finished).unwrap_or(0)
    }

    /// Note that `mutation` has been handed off for execution. Returns the
    /// ticket for its first dependent query: once that query's
    /// `mutations_applied` reaches the ticket, the data reflects the
    /// mutation (or its failure).
    pub fn register_mutation(&self, mutation: &Mutation) -> u64 {
        let mut ticket = 0;
        for (i, key) in mutation.refetch_queries().iter().enumerate() {
            let mut count = self.mutations.entry(key.clone()).or_default();
            count.requested += 1;
            if i == 0 {
                ticket = count.requested;
            }
        }
        ticket
    }

    /// Mark a query stale and tell subscribers about it
    pub fn invalidate(&self, key: &QueryKey) {
        if let Some(mut entry) = self.entries.get_mut(key) {
            if entry.snapshot.is_loading() {
                entry.refetch_after_load = true;
            } else {
                entry.snapshot.stale = true;
            }
        }
        tracing::debug!("Invalidated {}", key);
        // nobody listening is fine
        let _ = self.invalidations.send(key.clone());
    }

    /// Invalidate every vote query, e.g. when the viewer changes
    pub fn invalidate_votes(&self) {
        self.invalidate_matching(|k| matches!(k, QueryKey::VotesByPostId(_)));
    }

    pub fn invalidate_all(&self) {
        self.invalidate_matching(|_| true);
    }

    fn invalidate_matching<F: Fn(&QueryKey) -> bool>(&self, f: F) {
        let keys: Vec<QueryKey> = self
            .entries
            .iter()
            .filter(|e| f(e.key()))
            .map(|e| e.key().clone())
            .collect();
        for key in keys.iter() {
            self.invalidate(key);
        }
    }

    /// Receive every key as it is invalidated
    pub fn subscribe(&self) -> broadcast::Receiver<QueryKey> {
        self.invalidations.subscribe()
    }

    /// Run the remote query for `key` and store the outcome
    pub async fn resolve(&self, key: &QueryKey, api: &dyn RemoteApi) -> Result<(), Error> {
        let result = match key {
            QueryKey::VotesByPostId(id) => api
                .get_votes_by_post_id(*id)
                .await
                .map(|v| QueryData::Votes(Arc::new(v))),
            QueryKey::PostList => api
                .get_post_list()
                .await
                .map(|p| QueryData::Posts(Arc::new(p))),
            QueryKey::PostsByTopic(topic) => api
                .get_post_list_by_topic(topic)
                .await
                .map(|p| QueryData::Posts(Arc::new(p))),
            QueryKey::Post(id) => api
                .get_post(*id)
                .await
                .map(|p| QueryData::Post(p.map(Arc::new))),
        };

        match result {
            Ok(data) => {
                self.complete(key, data);
                Ok(())
            }
            Err(e) => {
                self.fail(key, e.kind.to_string());
                Err(e)
            }
        }
    }

    /// Run a mutation, then invalidate the queries it declares whether it
    /// worked or not, so consumers never wait on data that is not coming.
    pub async fn mutate(&self, mutation: &Mutation, api: &dyn RemoteApi) -> Result<(), Error> {
        let result = mutation.execute(api).await;
        for key in mutation.refetch_queries().iter() {
            self.mutations.entry(key.clone()).or_default().finished += 1;
            self.invalidate(key);
        }
        result
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::api::MemoryApi;
    use crate::error::ErrorKind;
    use async_trait::async_trait;

    struct FailingApi;

    #[async_trait]
    impl RemoteApi for FailingApi {
        async fn get_votes_by_post_id(&self, _: PostId) -> Result<Vec<Vote>, Error> {
            Err(ErrorKind::HttpStatus(503).into())
        }
        async fn add_vote(&self, _: PostId, _: &str, _: bool) -> Result<(), Error> {
            Err(ErrorKind::HttpStatus(503).into())
        }
        async fn get_post_list(&self) -> Result<Vec<Post>, Error> {
            Err(ErrorKind::HttpStatus(503).into())
        }
        async fn get_post_list_by_topic(&self, _: &str) -> Result<Vec<Post>, Error> {
            Err(ErrorKind::HttpStatus(503).into())
        }
        async fn get_post(&self, _: PostId) -> Result<Option<Post>, Error> {
            Err(ErrorKind::HttpStatus(503).into())
        }
    }

    fn votes_key() -> QueryKey {
        QueryKey::VotesByPostId(PostId(1))
    }

    #[test]
    fn test_begin_fetch_only_once() {
        let cache = QueryCache::new();
        assert!(cache.begin_fetch(&votes_key()));
        assert!(!cache.begin_fetch(&votes_key()));
        assert!(cache.snapshot(&votes_key()).unwrap().is_loading());

        cache.complete(&votes_key(), QueryData::Votes(Arc::new(vec![])));
        assert!(!cache.begin_fetch(&votes_key()));

        cache.invalidate(&votes_key());
        assert!(cache.snapshot(&votes_key()).unwrap().stale);
        assert!(cache.begin_fetch(&votes_key()));
        assert!(!cache.begin_fetch(&votes_key()));
    }

    #[test]
    fn test_invalidate_while_loading_refetches_after() {
        let cache = QueryCache::new();
        assert!(cache.begin_fetch(&votes_key()));
        cache.invalidate(&votes_key());

        // the in-flight result lands, but it may be older than the invalidation
        cache.complete(&votes_key(), QueryData::Votes(Arc::new(vec![])));
        let snap = cache.snapshot(&votes_key()).unwrap();
        assert_eq!(snap.status, QueryStatus::Ready);
        assert!(snap.stale);
        assert!(cache.begin_fetch(&votes_key()));
    }

    #[tokio::test]
    async fn test_mutation_invalidates_dependent_query() {
        let api = MemoryApi::new();
        let cache = QueryCache::new();
        let mut invalidations = cache.subscribe();

        assert!(cache.begin_fetch(&votes_key()));
        cache.resolve(&votes_key(), &api).await.unwrap();
        let first = cache.snapshot(&votes_key()).unwrap();
        assert_eq!(first.votes().unwrap().len(), 0);
        assert_eq!(first.generation, 1);

        let mutation = Mutation::AddVote {
            post_id: PostId(1),
            username: "u1".to_owned(),
            upvote: true,
        };
        assert_eq!(mutation.refetch_queries(), vec![votes_key()]);
        cache.mutate(&mutation, &api).await.unwrap();
        assert_eq!(invalidations.recv().await.unwrap(), votes_key());

        // a mounted consumer sees the stale key and re-resolves it
        assert!(cache.begin_fetch(&votes_key()));
        cache.resolve(&votes_key(), &api).await.unwrap();
        let second = cache.snapshot(&votes_key()).unwrap();
        assert_eq!(second.generation, 2);
        assert_eq!(second.votes().unwrap().as_slice(), &[Vote::new("u1", true)]);
        assert!(!second.stale);
    }

    #[tokio::test]
    async fn test_failures_keep_data_and_advance_generation() {
        let cache = QueryCache::new();
        cache.complete(
            &votes_key(),
            QueryData::Votes(Arc::new(vec![Vote::new("u1", false)])),
        );

        let mutation = Mutation::AddVote {
            post_id: PostId(1),
            username: "u1".to_owned(),
            upvote: true,
        };
        assert!(cache.mutate(&mutation, &FailingApi).await.is_err());
        assert!(cache.snapshot(&votes_key()).unwrap().stale);

        assert!(cache.begin_fetch(&votes_key()));
        assert!(cache.resolve(&votes_key(), &FailingApi).await.is_err());
        let snap = cache.snapshot(&votes_key()).unwrap();
        assert_eq!(snap.generation, 2);
        assert_eq!(snap.error(), Some("HTTP status 503"));
        assert_eq!(snap.votes().unwrap().as_slice(), &[Vote::new("u1", false)]);
    }

    #[tokio::test]
    async fn test_resolve_posts() {
        let api = MemoryApi::demo();
        let cache = QueryCache::new();

        cache.resolve(&QueryKey::PostList, &api).await.unwrap();
        assert_eq!(cache.snapshot(&QueryKey::PostList).unwrap().posts().unwrap().len(), 3);

        let missing = QueryKey::Post(PostId(404));
        cache.resolve(&missing, &api).await.unwrap();
        assert!(matches!(cache.snapshot(&missing).unwrap().post(), Some(None)));
    }

    #[test]
    fn test_invalidate_votes_only() {
        let cache = QueryCache::new();
        cache.complete(&votes_key(), QueryData::Votes(Arc::new(vec![])));
        cache.complete(&QueryKey::PostList, QueryData::Posts(Arc::new(vec![])));
        cache.invalidate_votes();
        assert!(cache.snapshot(&votes_key()).unwrap().stale);
        assert!(!cache.snapshot(&QueryKey::PostList).unwrap().stale);
        assert_eq!(votes_key().to_string(), "getVotesByPostId(1)");
    }

    #[tokio::test]
    async fn test_mutations_applied_tracks_fetch_start() {
        let api = MemoryApi::new();
        let cache = QueryCache::new();
        let mutation = Mutation::AddVote {
            post_id: PostId(1),
            username: "u1".to_owned(),
            upvote: true,
        };

        assert!(cache.begin_fetch(&votes_key()));
        assert_eq!(cache.register_mutation(&mutation), 1);
        cache.mutate(&mutation, &api).await.unwrap();

        // this fetch began before the vote finished
        cache.resolve(&votes_key(), &api).await.unwrap();
        let snap = cache.snapshot(&votes_key()).unwrap();
        assert_eq!(snap.mutations_applied, 0);
        assert!(snap.stale);

        assert!(cache.begin_fetch(&votes_key()));
        cache.resolve(&votes_key(), &api).await.unwrap();
        assert_eq!(cache.snapshot(&votes_key()).unwrap().mutations_applied, 1);
        assert_eq!(cache.register_mutation(&mutation), 2);
    }
}

//! The remote backend: votes and posts.

mod graphql;
pub use graphql::GraphqlClient;

mod memory;
pub use memory::MemoryApi;

use crate::error::{Error, ErrorKind};
use crate::post::{Post, PostId};
use crate::settings::Settings;
use crate::vote::Vote;
use async_trait::async_trait;
use std::sync::Arc;

/// Everything the client asks of its backend
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// All votes cast on a post
    async fn get_votes_by_post_id(&self, post_id: PostId) -> Result<Vec<Vote>, Error>;

    /// Insert or replace `username`'s vote on a post
    async fn add_vote(&self, post_id: PostId, username: &str, upvote: bool) -> Result<(), Error>;

    /// The home feed, newest first
    async fn get_post_list(&self) -> Result<Vec<Post>, Error>;

    /// Posts in one subreddit, newest first
    async fn get_post_list_by_topic(&self, topic: &str) -> Result<Vec<Post>, Error>;

    async fn get_post(&self, post_id: PostId) -> Result<Option<Post>, Error>;
}

/// Build the backend the settings ask for
pub fn from_settings(settings: &Settings) -> Result<Arc<dyn RemoteApi>, Error> {
    if settings.offline {
        tracing::info!("Offline mode, using the in-memory backend");
        Ok(Arc::new(MemoryApi::demo()))
    } else {
        tracing::info!("Using GraphQL backend at {}", settings.api_url);
        Ok(Arc::new(GraphqlClient::new(settings)?))
    }
}

/// Stands in when the configured backend cannot be built, so every query
/// fails with the reason instead of loading forever.
pub struct UnavailableApi {
    reason: String,
}

impl UnavailableApi {
    pub fn new(reason: String) -> UnavailableApi {
        UnavailableApi { reason }
    }

    #[track_caller]
    fn fail<T>(&self) -> Result<T, Error> {
        Err(ErrorKind::General(self.reason.clone()).into())
    }
}

#[async_trait]
impl RemoteApi for UnavailableApi {
    async fn get_votes_by_post_id(&self, _post_id: PostId) -> Result<Vec<Vote>, Error> {
        self.fail()
    }

    async fn add_vote(&self, _post_id: PostId, _username: &str, _upvote: bool) -> Result<(), Error> {
        self.fail()
    }

    async fn get_post_list(&self) -> Result<Vec<Post>, Error> {
        self.fail()
    }

    async fn get_post_list_by_topic(&self, _topic: &str) -> Result<Vec<Post>, Error> {
        self.fail()
    }

    async fn get_post(&self, _post_id: PostId) -> Result<Option<Post>, Error> {
        self.fail()
    }
}

/// Build the backend the settings ask for, falling back to one that
/// reports why it could not be built
pub fn connect(settings: &Settings) -> (Arc<dyn RemoteApi>, Option<Error>) {
    match from_settings(settings) {
        Ok(api) => (api, None),
        Err(e) => {
            tracing::error!("{}", e);
            let api = Arc::new(UnavailableApi::new(format!(
                "Cannot reach the backend: {}",
                e.kind
            )));
            (api, Some(e))
        }
    }
}

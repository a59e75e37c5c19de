use super::RemoteApi;
use crate::error::Error;
use crate::post::{Comment, Post, PostId, Subreddit};
use crate::vote::Vote;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use time::{Duration, OffsetDateTime};

/// An in-process backend. Used for offline mode and in tests.
#[derive(Default)]
pub struct MemoryApi {
    posts: RwLock<Vec<Post>>,
    votes: RwLock<HashMap<PostId, Vec<Vote>>>,
}

impl MemoryApi {
    pub fn new() -> MemoryApi {
        MemoryApi::default()
    }

    pub fn with_posts(posts: Vec<Post>) -> MemoryApi {
        MemoryApi {
            posts: RwLock::new(posts),
            votes: RwLock::new(HashMap::new()),
        }
    }

    /// A handful of posts to click around in
    pub fn demo() -> MemoryApi {
        let now = OffsetDateTime::now_utc();
        let post = |id: u64, topic: &str, user: &str, title: &str, body: &str, ago: i64| Post {
            id: PostId(id),
            title: title.to_owned(),
            body: body.to_owned(),
            image: None,
            username: user.to_owned(),
            created_at: now - Duration::minutes(ago),
            subreddit: vec![Subreddit {
                topic: topic.to_owned(),
            }],
            comments: vec![],
        };

        let mut posts = vec![
            post(1, "rust", "ferris", "Borrow checker finally clicked", "It only took three rewrites.", 5),
            post(2, "gaming", "mario", "Speedrun routing help", "Any% or 100%? Asking for a friend.", 95),
            post(3, "rust", "crab", "egui for desktop apps?", "Immediate mode feels odd at first.", 60 * 26),
        ];
        posts[0].comments.push(Comment {
            username: "crab".to_owned(),
            text: "Welcome to the club".to_owned(),
        });

        let api = MemoryApi::with_posts(posts);
        api.set_votes(
            PostId(1),
            vec![Vote::new("crab", true), Vote::new("mario", true)],
        );
        api.set_votes(
            PostId(2),
            vec![Vote::new("ferris", true), Vote::new("crab", false)],
        );
        api
    }

    pub fn set_votes(&self, post_id: PostId, votes: Vec<Vote>) {
        self.votes.write().insert(post_id, votes);
    }

    fn newest_first(mut posts: Vec<Post>) -> Vec<Post> {
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts
    }
}

#[async_trait]
impl RemoteApi for MemoryApi {
    async fn get_votes_by_post_id(&self, post_id: PostId) -> Result<Vec<Vote>, Error> {
        Ok(self.votes.read().get(&post_id).cloned().unwrap_or_default())
    }

    async fn add_vote(&self, post_id: PostId, username: &str, upvote: bool) -> Result<(), Error> {
        let mut map = self.votes.write();
        let votes = map.entry(post_id).or_default();
        match votes.iter_mut().find(|v| v.username == username) {
            Some(existing) => existing.upvote = upvote,
            None => votes.push(Vote::new(username, upvote)),
        }
        Ok(())
    }

    async fn get_post_list(&self) -> Result<Vec<Post>, Error> {
        Ok(Self::newest_first(self.posts.read().clone()))
    }

    async fn get_post_list_by_topic(&self, topic: &str) -> Result<Vec<Post>, Error> {
        let posts = self
            .posts
            .read()
            .iter()
            .filter(|p| p.topic() == Some(topic))
            .cloned()
            .collect();
        Ok(Self::newest_first(posts))
    }

    async fn get_post(&self, post_id: PostId) -> Result<Option<Post>, Error> {
        Ok(self.posts.read().iter().find(|p| p.id == post_id).cloned())
    }
}

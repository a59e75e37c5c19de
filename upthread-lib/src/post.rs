use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// The identifier of a post.
///
/// GraphQL `ID` values arrive either as JSON numbers or as strings holding a
/// number, so both forms are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PostId(pub u64);

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PostId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<PostId, Self::Err> {
        Ok(PostId(s.trim().parse::<u64>()?))
    }
}

impl<'de> Deserialize<'de> for PostId {
    fn deserialize<D>(deserializer: D) -> Result<PostId, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(PostId(n)),
            Raw::Text(s) => s.parse::<PostId>().map_err(de::Error::custom),
        }
    }
}

/// The community a post was made in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subreddit {
    pub topic: String,
}

/// A comment on a post. The card only ever counts these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub text: String,
}

/// A post, as delivered by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,

    #[serde(default)]
    pub body: String,

    #[serde(default)]
    pub image: Option<String>,

    pub username: String,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub subreddit: Vec<Subreddit>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub comments: Vec<Comment>,
}

impl Post {
    /// The topic of the first subreddit this post belongs to
    pub fn topic(&self) -> Option<&str> {
        self.subreddit.first().map(|s| s.topic.as_str())
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    /// The image reference, if there is a non-blank one
    pub fn image(&self) -> Option<&str> {
        match self.image.as_deref() {
            Some(s) if !s.trim().is_empty() => Some(s),
            _ => None,
        }
    }

    pub fn route(&self) -> Route {
        Route::Post(self.id)
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Navigation targets inside the client
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Post(PostId),
    Subreddit(String),
}

impl Route {
    /// Parse a path such as `/post/12` or `/subreddit/rust`
    pub fn parse(path: &str) -> Option<Route> {
        let mut parts = path.trim_matches('/').splitn(2, '/');
        match (parts.next(), parts.next()) {
            (Some(""), None) => Some(Route::Home),
            (Some("post"), Some(id)) => id.parse::<PostId>().ok().map(Route::Post),
            (Some("subreddit"), Some(topic)) if !topic.is_empty() && !topic.contains('/') => {
                Some(Route::Subreddit(topic.to_owned()))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => write!(f, "/"),
            Route::Post(id) => write!(f, "/post/{}", id),
            Route::Subreddit(topic) => write!(f, "/subreddit/{}", topic),
        }
    }
}

use super::RemoteApi;
use crate::error::{Error, ErrorKind};
use crate::post::{Post, PostId};
use crate::settings::Settings;
use crate::vote::Vote;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

const POST_FIELDS: &str = "
    id
    title
    body
    image
    username
    created_at
    comments {
      username
      text
    }
    subreddit {
      topic
    }";

const GET_VOTES_BY_POST_ID: &str = "
query getVotesByPostId($post_id: ID!) {
  getVotesByPostId(post_id: $post_id) {
    username
    upvote
  }
}";

const ADD_VOTE: &str = "
mutation addVote($post_id: ID!, $username: String!, $upvote: Boolean!) {
  addVote(post_id: $post_id, username: $username, upvote: $upvote) {
    username
    upvote
  }
}";

fn get_post_list() -> String {
    format!("query getPostList {{\n  getPostList {{{}\n  }}\n}}", POST_FIELDS)
}

fn get_post_list_by_topic() -> String {
    format!(
        "query getPostListByTopic($topic: String!) {{\n  getPostListByTopic(topic: $topic) {{{}\n  }}\n}}",
        POST_FIELDS
    )
}

fn get_post_by_post_id() -> String {
    format!(
        "query getPostByPostId($post_id: ID!) {{\n  getPostByPostId(post_id: $post_id) {{{}\n  }}\n}}",
        POST_FIELDS
    )
}

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

/// Talks to the GraphQL endpoint over HTTP
pub struct GraphqlClient {
    client: reqwest::Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl GraphqlClient {
    pub fn new(settings: &Settings) -> Result<GraphqlClient, Error> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .user_agent(crate::USER_AGENT)
            .build()?;

        Ok(GraphqlClient {
            client,
            endpoint: Url::parse(&settings.api_url)?,
            api_key: settings.api_key.clone(),
        })
    }

    async fn request<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
        field: &'static str,
    ) -> Result<Option<T>, Error> {
        let mut builder = self
            .client
            .post(self.endpoint.clone())
            .json(&GraphqlRequest { query, variables });
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("apikey {}", key));
        }

        tracing::debug!("GraphQL {}", field);
        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            // A GraphQL error body says more than the bare status
            if let Err(e) = decode_response::<Value>(&bytes, field) {
                if matches!(e.kind, ErrorKind::Graphql(_)) {
                    return Err(e);
                }
            }
            return Err(ErrorKind::HttpStatus(status.as_u16()).into());
        }
        decode_response(&bytes, field)
    }
}

/// Pull `data.<field>` out of a GraphQL response body. A null or missing
/// field decodes as `None`; any reported error wins over the data.
fn decode_response<T: DeserializeOwned>(bytes: &[u8], field: &'static str) -> Result<Option<T>, Error> {
    let response: GraphqlResponse = serde_json::from_slice(bytes)?;
    if !response.errors.is_empty() {
        return Err(ErrorKind::Graphql(
            response.errors.into_iter().map(|e| e.message).collect(),
        )
        .into());
    }
    let mut data = match response.data {
        Some(Value::Object(map)) => map,
        Some(Value::Null) | None => return Err(ErrorKind::MissingData("data").into()),
        Some(_) => return Err(ErrorKind::MissingData("data object").into()),
    };
    match data.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
    }
}

#[async_trait]
impl RemoteApi for GraphqlClient {
    async fn get_votes_by_post_id(&self, post_id: PostId) -> Result<Vec<Vote>, Error> {
        let votes: Option<Vec<Vote>> = self
            .request(
                GET_VOTES_BY_POST_ID,
                json!({ "post_id": post_id }),
                "getVotesByPostId",
            )
            .await?;
        Ok(votes.unwrap_or_default())
    }

    async fn add_vote(&self, post_id: PostId, username: &str, upvote: bool) -> Result<(), Error> {
        let _: Option<Value> = self
            .request(
                ADD_VOTE,
                json!({ "post_id": post_id, "username": username, "upvote": upvote }),
                "addVote",
            )
            .await?;
        Ok(())
    }

    async fn get_post_list(&self) -> Result<Vec<Post>, Error> {
        let posts: Option<Vec<Post>> = self
            .request(&get_post_list(), json!({}), "getPostList")
            .await?;
        Ok(posts.unwrap_or_default())
    }

    async fn get_post_list_by_topic(&self, topic: &str) -> Result<Vec<Post>, Error> {
        let posts: Option<Vec<Post>> = self
            .request(
                &get_post_list_by_topic(),
                json!({ "topic": topic }),
                "getPostListByTopic",
            )
            .await?;
        Ok(posts.unwrap_or_default())
    }

    async fn get_post(&self, post_id: PostId) -> Result<Option<Post>, Error> {
        self.request(
            &get_post_by_post_id(),
            json!({ "post_id": post_id }),
            "getPostByPostId",
        )
        .await
    }
}

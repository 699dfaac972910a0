// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Request/response query layer.
//!
//! [`QueryLayer`] is the interface the vote client and fallback poller
//! depend on. [`GraphqlQueryLayer`] implements it as GraphQL over HTTP.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use mm_core::{GraphqlRequest, Movie, Room, VoteResponse};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::credentials::CredentialProvider;

/// Boxed future returned by query layer methods.
pub type QueryFuture<'a, T> = Pin<Box<dyn Future<Output = QueryResult<T>> + Send + 'a>>;

/// Error type for query layer calls.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Request could not be sent or the body not read.
    #[error("http error: {0}")]
    Http(String),

    /// Endpoint answered with a non-success status.
    #[error("endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// GraphQL `errors` in the response.
    #[error("graphql error: {0}")]
    Graphql(String),

    /// Response body did not have the expected shape.
    #[error("malformed response: {0}")]
    Decode(String),

    /// Request rejected before sending, or an empty result.
    #[error("{0}")]
    Validation(String),
}

pub type QueryResult<T> = Result<T, QueryError>;

/// A vote submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteInput {
    pub room_id: String,
    pub movie_id: String,
    pub user_id: String,
}

/// Operations of the request/response API.
pub trait QueryLayer: Send + Sync {
    fn create_room<'a>(&'a self, name: &'a str, user_id: &'a str) -> QueryFuture<'a, Room>;

    fn join_room<'a>(&'a self, room_id: &'a str, user_id: &'a str) -> QueryFuture<'a, Room>;

    fn get_room<'a>(&'a self, room_id: &'a str) -> QueryFuture<'a, Room>;

    fn vote<'a>(&'a self, input: &'a VoteInput) -> QueryFuture<'a, VoteResponse>;

    fn get_movie_details<'a>(&'a self, movie_id: &'a str) -> QueryFuture<'a, Movie>;

    fn get_user_rooms<'a>(&'a self, user_id: &'a str) -> QueryFuture<'a, Vec<Room>>;
}

const ROOM_FIELDS: &str = "id name status resultMovieId memberIds totalMembers createdAt";

const MOVIE_FIELDS: &str = "id title year overview posterUrl";

const VOTE_FIELDS: &str = "roomId status resultMovieId currentVotes totalMembers";

#[derive(Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    errors: Vec<GraphqlErrorEntry>,
}

#[derive(Deserialize)]
struct GraphqlErrorEntry {
    message: String,
}

/// Extract `data.<field>` from a GraphQL response body.
pub fn decode_response<T: DeserializeOwned>(body: &str, field: &str) -> QueryResult<T> {
    let response: GraphqlResponse =
        serde_json::from_str(body).map_err(|e| QueryError::Decode(e.to_string()))?;
    if !response.errors.is_empty() {
        let messages: Vec<&str> = response.errors.iter().map(|e| e.message.as_str()).collect();
        return Err(QueryError::Graphql(messages.join("; ")));
    }
    let value = response
        .data
        .and_then(|mut data| data.get_mut(field).map(serde_json::Value::take))
        .filter(|v| !v.is_null())
        .ok_or_else(|| QueryError::Validation(format!("{} returned no result", field)))?;
    serde_json::from_value(value).map_err(|e| QueryError::Decode(e.to_string()))
}

/// GraphQL-over-HTTP implementation of [`QueryLayer`].
pub struct GraphqlQueryLayer {
    url: String,
    http: reqwest::Client,
    credentials: Arc<dyn CredentialProvider>,
}

impl GraphqlQueryLayer {
    pub fn new(
        url: impl Into<String>,
        credentials: Arc<dyn CredentialProvider>,
        timeout: Duration,
    ) -> QueryResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QueryError::Http(e.to_string()))?;
        Ok(GraphqlQueryLayer {
            url: url.into(),
            http,
            credentials,
        })
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        field: &str,
        request: GraphqlRequest,
    ) -> QueryResult<T> {
        debug!(operation = field, url = %self.url, "query");
        let mut builder = self.http.post(&self.url).json(&request);
        if let Some(token) = self.credentials.current() {
            builder = builder.header(reqwest::header::AUTHORIZATION, token);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| QueryError::Http(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| QueryError::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(QueryError::Status {
                status: status.as_u16(),
                body,
            });
        }
        decode_response(&body, field)
    }
}

impl QueryLayer for GraphqlQueryLayer {
    fn create_room<'a>(&'a self, name: &'a str, user_id: &'a str) -> QueryFuture<'a, Room> {
        Box::pin(self.execute(
            "createRoom",
            GraphqlRequest::new(
                format!(
                    "mutation CreateRoom($name: String!, $userId: ID!) {{ createRoom(name: $name, userId: $userId) {{ {} }} }}",
                    ROOM_FIELDS
                ),
                serde_json::json!({ "name": name, "userId": user_id }),
            ),
        ))
    }

    fn join_room<'a>(&'a self, room_id: &'a str, user_id: &'a str) -> QueryFuture<'a, Room> {
        Box::pin(self.execute(
            "joinRoom",
            GraphqlRequest::new(
                format!(
                    "mutation JoinRoom($roomId: ID!, $userId: ID!) {{ joinRoom(roomId: $roomId, userId: $userId) {{ {} }} }}",
                    ROOM_FIELDS
                ),
                serde_json::json!({ "roomId": room_id, "userId": user_id }),
            ),
        ))
    }

    fn get_room<'a>(&'a self, room_id: &'a str) -> QueryFuture<'a, Room> {
        Box::pin(self.execute(
            "getRoom",
            GraphqlRequest::new(
                format!(
                    "query GetRoom($roomId: ID!) {{ getRoom(roomId: $roomId) {{ {} }} }}",
                    ROOM_FIELDS
                ),
                serde_json::json!({ "roomId": room_id }),
            ),
        ))
    }

    fn vote<'a>(&'a self, input: &'a VoteInput) -> QueryFuture<'a, VoteResponse> {
        Box::pin(self.execute(
            "vote",
            GraphqlRequest::new(
                format!(
                    "mutation Vote($roomId: ID!, $movieId: ID!, $userId: ID!) {{ vote(roomId: $roomId, movieId: $movieId, userId: $userId) {{ {} }} }}",
                    VOTE_FIELDS
                ),
                serde_json::json!({
                    "roomId": input.room_id,
                    "movieId": input.movie_id,
                    "userId": input.user_id,
                }),
            ),
        ))
    }

    fn get_movie_details<'a>(&'a self, movie_id: &'a str) -> QueryFuture<'a, Movie> {
        Box::pin(self.execute(
            "getMovieDetails",
            GraphqlRequest::new(
                format!(
                    "query GetMovieDetails($movieId: ID!) {{ getMovieDetails(movieId: $movieId) {{ {} }} }}",
                    MOVIE_FIELDS
                ),
                serde_json::json!({ "movieId": movie_id }),
            ),
        ))
    }

    fn get_user_rooms<'a>(&'a self, user_id: &'a str) -> QueryFuture<'a, Vec<Room>> {
        Box::pin(self.execute(
            "getUserRooms",
            GraphqlRequest::new(
                format!(
                    "query GetUserRooms($userId: ID!) {{ getUserRooms(userId: $userId) {{ {} }} }}",
                    ROOM_FIELDS
                ),
                serde_json::json!({ "userId": user_id }),
            ),
        ))
    }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;

//! GraphQL client for GitHub Discussions.
//!
//! Discussions have no REST surface; every operation here goes through
//! the GraphQL endpoint.

use anyhow::{anyhow, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::{Discussion, DiscussionComment};

/// GitHub GraphQL endpoint
const GITHUB_GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// GitHub Discussions GraphQL client.
#[derive(Debug, Clone)]
pub struct DiscussionsClient {
    client: reqwest::Client,
    api_url: String,
}

/// GraphQL request body
#[derive(Debug, Serialize)]
struct GraphQLRequest<V: Serialize> {
    query: &'static str,
    variables: V,
}

/// GraphQL response wrapper
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

/// GraphQL error
#[derive(Debug, Deserialize)]
struct GraphQLError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    #[serde(rename = "hasNextPage")]
    has_next_page: bool,
    #[serde(rename = "endCursor")]
    end_cursor: Option<String>,
}

impl DiscussionsClient {
    /// Create a new Discussions client.
    ///
    /// # Errors
    ///
    /// Returns an error if headers cannot be constructed.
    pub fn new(token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).context("Invalid access token")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("scribe/0.3"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_url: GITHUB_GRAPHQL_URL.to_string(),
        })
    }

    /// Point the client at a different GraphQL URL (mock servers).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Execute a GraphQL query/mutation
    async fn execute<V: Serialize, R: DeserializeOwned>(
        &self,
        query: &'static str,
        variables: V,
    ) -> Result<R> {
        let request = GraphQLRequest { query, variables };

        let response = self
            .client
            .post(&self.api_url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to GitHub GraphQL API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "GitHub GraphQL API returned error status {status}: {body}"
            ));
        }

        let gql_response: GraphQLResponse<R> = response
            .json()
            .await
            .context("Failed to parse GitHub GraphQL response")?;

        if let Some(errors) = gql_response.errors {
            let error_messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
            return Err(anyhow!("GraphQL errors: {}", error_messages.join(", ")));
        }

        gql_response
            .data
            .ok_or_else(|| anyhow!("No data in GraphQL response"))
    }

    // =========================================================================
    // Repository / category lookup
    // =========================================================================

    /// Resolve the repository node id and the id of a discussion category.
    ///
    /// # Errors
    ///
    /// Returns an error when the repository does not exist or has no
    /// category of that name. Both are fatal setup conditions.
    pub async fn repository_and_category(
        &self,
        owner: &str,
        repo: &str,
        category: &str,
    ) -> Result<(String, String)> {
        const QUERY: &str = r"
            query($owner: String!, $repo: String!) {
                repository(owner: $owner, name: $repo) {
                    id
                    discussionCategories(first: 25) {
                        nodes { id name }
                    }
                }
            }";

        #[derive(Serialize)]
        struct Variables<'a> {
            owner: &'a str,
            repo: &'a str,
        }

        #[derive(Deserialize)]
        struct Data {
            repository: Option<RepositoryNode>,
        }

        #[derive(Deserialize)]
        struct RepositoryNode {
            id: String,
            #[serde(rename = "discussionCategories")]
            discussion_categories: CategoryConnection,
        }

        #[derive(Deserialize)]
        struct CategoryConnection {
            nodes: Vec<CategoryNode>,
        }

        #[derive(Deserialize)]
        struct CategoryNode {
            id: String,
            name: String,
        }

        let data: Data = self.execute(QUERY, Variables { owner, repo }).await?;
        let repository = data
            .repository
            .ok_or_else(|| anyhow!("Repository {owner}/{repo} not found"))?;

        let category_id = repository
            .discussion_categories
            .nodes
            .into_iter()
            .find(|c| c.name == category)
            .map(|c| c.id)
            .ok_or_else(|| {
                anyhow!("Repository {owner}/{repo} has no discussion category named {category}")
            })?;

        Ok((repository.id, category_id))
    }

    // =========================================================================
    // Discussion operations
    // =========================================================================

    /// Find a discussion by exact title, walking pages newest-first.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    pub async fn find_discussion(
        &self,
        owner: &str,
        repo: &str,
        title: &str,
    ) -> Result<Option<Discussion>> {
        const QUERY: &str = r"
            query($owner: String!, $repo: String!, $cursor: String) {
                repository(owner: $owner, name: $repo) {
                    discussions(first: 50, after: $cursor,
                                orderBy: {field: CREATED_AT, direction: DESC}) {
                        pageInfo { hasNextPage endCursor }
                        nodes { id number title }
                    }
                }
            }";

        #[derive(Serialize)]
        struct Variables<'a> {
            owner: &'a str,
            repo: &'a str,
            cursor: Option<String>,
        }

        #[derive(Deserialize)]
        struct Data {
            repository: Option<RepositoryNode>,
        }

        #[derive(Deserialize)]
        struct RepositoryNode {
            discussions: DiscussionConnection,
        }

        #[derive(Deserialize)]
        struct DiscussionConnection {
            #[serde(rename = "pageInfo")]
            page_info: PageInfo,
            nodes: Vec<Discussion>,
        }

        let mut cursor: Option<String> = None;

        loop {
            let data: Data = self
                .execute(
                    QUERY,
                    Variables {
                        owner,
                        repo,
                        cursor: cursor.clone(),
                    },
                )
                .await?;

            let connection = data
                .repository
                .ok_or_else(|| anyhow!("Repository {owner}/{repo} not found"))?
                .discussions;

            if let Some(found) = connection.nodes.into_iter().find(|d| d.title == title) {
                return Ok(Some(found));
            }
            if !connection.page_info.has_next_page {
                return Ok(None);
            }
            cursor = connection.page_info.end_cursor;
        }
    }

    /// Create a discussion.
    ///
    /// # Errors
    ///
    /// Returns an error if the mutation fails.
    pub async fn create_discussion(
        &self,
        repository_id: &str,
        category_id: &str,
        title: &str,
        body: &str,
    ) -> Result<Discussion> {
        const QUERY: &str = r"
            mutation($repositoryId: ID!, $categoryId: ID!, $title: String!, $body: String!) {
                createDiscussion(input: {repositoryId: $repositoryId, categoryId: $categoryId,
                                         title: $title, body: $body}) {
                    discussion { id number title }
                }
            }";

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Variables<'a> {
            repository_id: &'a str,
            category_id: &'a str,
            title: &'a str,
            body: &'a str,
        }

        #[derive(Deserialize)]
        struct Data {
            #[serde(rename = "createDiscussion")]
            create_discussion: CreatePayload,
        }

        #[derive(Deserialize)]
        struct CreatePayload {
            discussion: Discussion,
        }

        let data: Data = self
            .execute(
                QUERY,
                Variables {
                    repository_id,
                    category_id,
                    title,
                    body,
                },
            )
            .await?;

        debug!(title = %title, number = data.create_discussion.discussion.number, "Created discussion");
        Ok(data.create_discussion.discussion)
    }

    /// List every top-level comment of a discussion with nested reactions,
    /// following pagination.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    pub async fn list_discussion_comments(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<DiscussionComment>> {
        const QUERY: &str = r"
            query($owner: String!, $repo: String!, $number: Int!, $cursor: String) {
                repository(owner: $owner, name: $repo) {
                    discussion(number: $number) {
                        comments(first: 50, after: $cursor) {
                            pageInfo { hasNextPage endCursor }
                            nodes {
                                id
                                body
                                reactions(first: 100) { nodes { content } }
                            }
                        }
                    }
                }
            }";

        #[derive(Serialize)]
        struct Variables<'a> {
            owner: &'a str,
            repo: &'a str,
            number: u64,
            cursor: Option<String>,
        }

        #[derive(Deserialize)]
        struct Data {
            repository: Option<RepositoryNode>,
        }

        #[derive(Deserialize)]
        struct RepositoryNode {
            discussion: Option<DiscussionNode>,
        }

        #[derive(Deserialize)]
        struct DiscussionNode {
            comments: CommentConnection,
        }

        #[derive(Deserialize)]
        struct CommentConnection {
            #[serde(rename = "pageInfo")]
            page_info: PageInfo,
            nodes: Vec<DiscussionComment>,
        }

        let mut comments = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let data: Data = self
                .execute(
                    QUERY,
                    Variables {
                        owner,
                        repo,
                        number,
                        cursor: cursor.clone(),
                    },
                )
                .await?;

            let connection = data
                .repository
                .and_then(|r| r.discussion)
                .ok_or_else(|| anyhow!("Discussion #{number} not found in {owner}/{repo}"))?
                .comments;

            comments.extend(connection.nodes);
            if !connection.page_info.has_next_page {
                break;
            }
            cursor = connection.page_info.end_cursor;
        }

        debug!(owner = %owner, repo = %repo, number, count = comments.len(), "Fetched discussion comments");
        Ok(comments)
    }

    /// Post a discussion comment, optionally as a reply to another comment.
    ///
    /// Returns the new comment's node id.
    ///
    /// # Errors
    ///
    /// Returns an error if the mutation fails.
    pub async fn add_discussion_comment(
        &self,
        discussion_id: &str,
        reply_to_id: Option<&str>,
        body: &str,
    ) -> Result<String> {
        const QUERY: &str = r"
            mutation($discussionId: ID!, $replyToId: ID, $body: String!) {
                addDiscussionComment(input: {discussionId: $discussionId,
                                             replyToId: $replyToId, body: $body}) {
                    comment { id }
                }
            }";

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Variables<'a> {
            discussion_id: &'a str,
            reply_to_id: Option<&'a str>,
            body: &'a str,
        }

        #[derive(Deserialize)]
        struct Data {
            #[serde(rename = "addDiscussionComment")]
            add_discussion_comment: CommentPayload,
        }

        #[derive(Deserialize)]
        struct CommentPayload {
            comment: CommentNode,
        }

        #[derive(Deserialize)]
        struct CommentNode {
            id: String,
        }

        let data: Data = self
            .execute(
                QUERY,
                Variables {
                    discussion_id,
                    reply_to_id,
                    body,
                },
            )
            .await?;

        Ok(data.add_discussion_comment.comment.id)
    }

    /// Add a reaction to any reactable node (discussion comments here).
    ///
    /// # Errors
    ///
    /// Returns an error if the mutation fails.
    pub async fn add_reaction(&self, subject_id: &str, content: &str) -> Result<()> {
        const QUERY: &str = r"
            mutation($subjectId: ID!, $content: ReactionContent!) {
                addReaction(input: {subjectId: $subjectId, content: $content}) {
                    reaction { content }
                }
            }";

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Variables<'a> {
            subject_id: &'a str,
            content: &'a str,
        }

        let _: serde_json::Value = self
            .execute(
                QUERY,
                Variables {
                    subject_id,
                    content,
                },
            )
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphql_request_serialization() {
        #[derive(Serialize)]
        struct Variables<'a> {
            owner: &'a str,
        }

        let request = GraphQLRequest {
            query: "query($owner: String!) { x }",
            variables: Variables { owner: "o" },
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["query"], "query($owner: String!) { x }");
        assert_eq!(value["variables"]["owner"], "o");
    }

    #[test]
    fn test_graphql_error_envelope_deserializes() {
        let body = r#"{"data": null, "errors": [{"message": "boom"}]}"#;
        let parsed: GraphQLResponse<serde_json::Value> = serde_json::from_str(body).unwrap();
        assert!(parsed.data.is_none());
        assert_eq!(parsed.errors.unwrap()[0].message, "boom");
    }

    #[test]
    fn test_page_info_deserializes() {
        let info: PageInfo =
            serde_json::from_str(r#"{"hasNextPage": true, "endCursor": "abc"}"#).unwrap();
        assert!(info.has_next_page);
        assert_eq!(info.end_cursor.as_deref(), Some("abc"));
    }
}

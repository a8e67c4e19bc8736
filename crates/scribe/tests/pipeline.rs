//! End-to-end pipeline behavior against mocked GitHub and provider APIs.

use std::collections::HashSet;

use github::{DiscussionsClient, RestClient};
use scribe::pipeline::{Pipeline, RunConfig};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn run_config(repo: &str) -> RunConfig {
    RunConfig {
        repo: repo.to_string(),
        config_label: "ai-config".to_string(),
        template_label: "ai-template".to_string(),
        discussion_title: "daily".to_string(),
        category: "General".to_string(),
    }
}

fn pipeline_for(server: &MockServer) -> Pipeline {
    let rest = RestClient::new("t").unwrap().with_base_url(server.uri());
    let discussions = DiscussionsClient::new("t")
        .unwrap()
        .with_base_url(format!("{}/graphql", server.uri()));
    Pipeline::with_clients(run_config("o/r"), rest, discussions).unwrap()
}

/// Mount the REST fixtures shared by the scenarios: one config issue with
/// one provider config pointing at this server, one template issue with
/// one placeholder template.
async fn mount_issues(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/repos/o/r/issues"))
        .and(query_param("labels", "ai-config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"number": 1, "title": "Provider configs", "body": null}
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/o/r/issues/1/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 11,
                "body": format!("name: test-model\nurl: {}/chat\nkey: sk-test\ntype: openai", server.uri()),
                "created_at": "2026-01-01T00:00:00Z"
            }
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/o/r/issues"))
        .and(query_param("labels", "ai-template"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"number": 2, "title": "Templates", "body": null}
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/o/r/issues/2/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 21,
                "body": "SummaryPrompt: Summarize the following article: {{article}}",
                "created_at": "2026-01-01T00:00:00Z"
            }
        ])))
        .mount(server)
        .await;
}

/// Mount the GraphQL discussion lookup plus a comment listing with the
/// given reaction nodes.
async fn mount_discussion(server: &MockServer, reactions: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("discussions(first"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"repository": {"discussions": {
                "pageInfo": {"hasNextPage": false, "endCursor": null},
                "nodes": [{"id": "D_1", "number": 5, "title": "daily"}]
            }}}
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("discussion(number"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"repository": {"discussion": {"comments": {
                "pageInfo": {"hasNextPage": false, "endCursor": null},
                "nodes": [{
                    "id": "DC_1",
                    "body": "an interesting article",
                    "reactions": {"nodes": reactions}
                }]
            }}}}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn one_unprocessed_comment_produces_exactly_one_reply_and_markers() {
    let server = MockServer::start().await;
    mount_issues(&server).await;
    mount_discussion(&server, json!([])).await;

    // Provider endpoint; the filled prompt must carry the article text.
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_string_contains("Summarize the following article: an interesting article"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "generated summary"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    // The reply targets the work-item comment and carries the generation.
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("addDiscussionComment"))
        .and(body_string_contains("\"replyToId\":\"DC_1\""))
        .and(body_string_contains("generated summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"addDiscussionComment": {"comment": {"id": "DC_reply"}}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Comment marker (GraphQL) and template marker (REST).
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("addReaction"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"addReaction": {"reaction": {"content": "THUMBS_DOWN"}}}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/o/r/issues/comments/21/reactions"))
        .and(body_string_contains("\"content\":\"-1\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1, "content": "-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = pipeline_for(&server);
    let mut used_templates = HashSet::new();
    let result = pipeline.run(&mut used_templates).await.unwrap();

    assert_eq!(result.configs, 1);
    assert_eq!(result.templates, 1);
    assert_eq!(result.comments_seen, 1);
    assert_eq!(result.replies, 1);
    assert_eq!(result.skipped, 0);
    assert!(result.errors.is_empty());
    assert_eq!(used_templates.len(), 1);
}

#[tokio::test]
async fn marked_comment_is_skipped_without_any_generation() {
    let server = MockServer::start().await;
    mount_issues(&server).await;
    mount_discussion(&server, json!([{"content": "THUMBS_DOWN"}])).await;

    // Neither the provider nor the reply mutation may be touched.
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("addDiscussionComment"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("addReaction"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let pipeline = pipeline_for(&server);
    let mut used_templates = HashSet::new();
    let result = pipeline.run(&mut used_templates).await.unwrap();

    assert_eq!(result.replies, 0);
    assert_eq!(result.skipped, 1);
    assert!(used_templates.is_empty());
}

#[tokio::test]
async fn missing_config_issue_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/o/r/issues"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let pipeline = pipeline_for(&server);
    let mut used_templates = HashSet::new();
    let err = pipeline.run(&mut used_templates).await.unwrap_err();
    assert!(err.to_string().contains("ai-config"));
}

#[tokio::test]
async fn generation_failure_leaves_comment_unmarked_and_continues() {
    let server = MockServer::start().await;
    mount_issues(&server).await;
    mount_discussion(&server, json!([])).await;

    // Every provider attempt fails; no reply and no marker may be written.
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("addDiscussionComment"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("addReaction"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let pipeline = pipeline_for(&server);
    let mut used_templates = HashSet::new();
    let result = pipeline.run(&mut used_templates).await.unwrap();

    assert_eq!(result.replies, 0);
    assert_eq!(result.errors.len(), 1);
    assert!(used_templates.is_empty());
}

//! Tree-walk scenarios against a mock API server.

use std::sync::Arc;

use repo_publisher::{
    fetch_context_documents, fetch_repository_files, FetchConfig, GitHubClient, PublisherConfig,
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(server: &MockServer) -> GitHubClient {
    let mut config = PublisherConfig::new("test-token").with_api_base_url(server.uri());
    config.request_timeout_secs = 5;
    config.max_retries = 0;
    GitHubClient::new(config).unwrap()
}

async fn mock_tree(server: &MockServer, git_ref: &str, entries: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/acme/widgets/git/trees/{git_ref}")))
        .and(query_param("recursive", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sha": "root",
            "tree": entries,
            "truncated": false
        })))
        .mount(server)
        .await;
}

async fn mock_blob(server: &MockServer, sha: &str, content_b64: &str, size: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/acme/widgets/git/blobs/{sha}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sha": sha,
            "content": content_b64,
            "encoding": "base64",
            "size": size
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_extension_allow_list_filters_and_counts_skips() {
    let server = MockServer::start().await;
    mock_tree(
        &server,
        "main",
        json!([
            { "path": "a.ts", "mode": "100644", "type": "blob", "size": 21, "sha": "ts1" },
            { "path": "b.py", "mode": "100644", "type": "blob", "size": 9, "sha": "py1" },
            { "path": "c.md", "mode": "100644", "type": "blob", "size": 8, "sha": "md1" },
            { "path": "src", "mode": "040000", "type": "tree", "sha": "t1" }
        ]),
    )
    .await;
    // "const x: number = 1;\n"
    mock_blob(&server, "ts1", "Y29uc3QgeDogbnVtYmVyID0gMTsK", 21).await;
    // "# Notes\n"
    mock_blob(&server, "md1", "IyBOb3Rlcwo=", 8).await;

    let config = FetchConfig {
        include_extensions: ["ts", "md"].iter().map(|s| (*s).to_string()).collect(),
        ..FetchConfig::default()
    };
    let outcome = fetch_repository_files(&test_client(&server), "acme", "widgets", "main", &config)
        .await
        .unwrap();

    let paths: Vec<&str> = outcome.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["a.ts", "c.md"]);
    assert_eq!(outcome.skipped, 1);
    assert_eq!(outcome.files[1].content, "# Notes\n");
}

#[tokio::test]
async fn test_oversized_file_is_skipped() {
    let server = MockServer::start().await;
    mock_tree(
        &server,
        "main",
        json!([
            { "path": "large.txt", "mode": "100644", "type": "blob", "size": 500, "sha": "big1" }
        ]),
    )
    .await;
    mock_blob(&server, "big1", "aGVsbG8gd29ybGQ=", 500).await;

    let config = FetchConfig {
        max_file_size: 100,
        ..FetchConfig::default()
    };
    let outcome = fetch_repository_files(&test_client(&server), "acme", "widgets", "main", &config)
        .await
        .unwrap();

    assert!(outcome.files.is_empty());
    assert_eq!(outcome.skipped, 1);
}

#[tokio::test]
async fn test_binary_files_skipped_unless_included() {
    let server = MockServer::start().await;
    mock_tree(
        &server,
        "main",
        json!([
            { "path": "logo.png", "mode": "100644", "type": "blob", "size": 2, "sha": "bin1" }
        ]),
    )
    .await;
    // 0xFF 0xFE: not valid UTF-8
    mock_blob(&server, "bin1", "//4=", 2).await;

    let client = test_client(&server);

    let outcome =
        fetch_repository_files(&client, "acme", "widgets", "main", &FetchConfig::default())
            .await
            .unwrap();
    assert!(outcome.files.is_empty());
    assert_eq!(outcome.skipped, 1);

    let config = FetchConfig {
        include_binary: true,
        ..FetchConfig::default()
    };
    let outcome = fetch_repository_files(&client, "acme", "widgets", "main", &config)
        .await
        .unwrap();
    assert_eq!(outcome.files.len(), 1);
    assert_eq!(outcome.files[0].content, "//4=");
    assert_eq!(outcome.skipped, 0);
}

#[tokio::test]
async fn test_exclude_patterns_match_full_paths() {
    let server = MockServer::start().await;
    mock_tree(
        &server,
        "main",
        json!([
            { "path": "node_modules/pkg/index.js", "mode": "100644", "type": "blob", "size": 11, "sha": "dep1" },
            { "path": "src/app.js", "mode": "100644", "type": "blob", "size": 11, "sha": "app1" }
        ]),
    )
    .await;
    mock_blob(&server, "app1", "aGVsbG8gd29ybGQ=", 11).await;

    let config = FetchConfig {
        exclude_patterns: vec!["node_modules/*".to_string()],
        ..FetchConfig::default()
    };
    let outcome = fetch_repository_files(&test_client(&server), "acme", "widgets", "main", &config)
        .await
        .unwrap();

    assert_eq!(outcome.files.len(), 1);
    assert_eq!(outcome.files[0].path, "src/app.js");
    assert_eq!(outcome.skipped, 1);
}

#[tokio::test]
async fn test_main_falls_back_to_master() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/git/trees/main"))
        .and(query_param("recursive", "1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .mount(&server)
        .await;
    mock_tree(
        &server,
        "master",
        json!([
            { "path": "c.md", "mode": "100644", "type": "blob", "size": 8, "sha": "md1" }
        ]),
    )
    .await;
    mock_blob(&server, "md1", "IyBOb3Rlcwo=", 8).await;

    let outcome = fetch_repository_files(
        &test_client(&server),
        "acme",
        "widgets",
        "main",
        &FetchConfig::default(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.files.len(), 1);
    assert_eq!(outcome.files[0].path, "c.md");
}

#[tokio::test]
async fn test_single_entry_failure_is_a_skip_not_an_abort() {
    let server = MockServer::start().await;
    mock_tree(
        &server,
        "main",
        json!([
            { "path": "a.md", "mode": "100644", "type": "blob", "size": 8, "sha": "a1" },
            { "path": "b.md", "mode": "100644", "type": "blob", "size": 8, "sha": "b1" }
        ]),
    )
    .await;
    mock_blob(&server, "a1", "IyBOb3Rlcwo=", 8).await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/git/blobs/b1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream hiccup"))
        .mount(&server)
        .await;

    let outcome = fetch_repository_files(
        &test_client(&server),
        "acme",
        "widgets",
        "main",
        &FetchConfig::default(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.files.len(), 1);
    assert_eq!(outcome.files[0].path, "a.md");
    assert_eq!(outcome.skipped, 1);
}

#[tokio::test]
async fn test_custom_filter_rejects_entries() {
    let server = MockServer::start().await;
    mock_tree(
        &server,
        "main",
        json!([
            { "path": "a.md", "mode": "100644", "type": "blob", "size": 8, "sha": "a1" },
            { "path": "hello.txt", "mode": "100644", "type": "blob", "size": 11, "sha": "h1" }
        ]),
    )
    .await;
    mock_blob(&server, "a1", "IyBOb3Rlcwo=", 8).await;
    mock_blob(&server, "h1", "aGVsbG8gd29ybGQ=", 11).await;

    let config = FetchConfig {
        custom_filter: Some(Arc::new(|_path: &str, content: &str| {
            !content.contains("hello")
        })),
        ..FetchConfig::default()
    };
    let outcome = fetch_repository_files(&test_client(&server), "acme", "widgets", "main", &config)
        .await
        .unwrap();

    assert_eq!(outcome.files.len(), 1);
    assert_eq!(outcome.files[0].path, "a.md");
    assert_eq!(outcome.skipped, 1);
}

#[tokio::test]
async fn test_context_documents_skip_missing_files_silently() {
    let server = MockServer::start().await;

    // Only the README exists; every other candidate 404s.
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/contents/README.md"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": "IyBXaWRnZXRzCgpBIGRlbW8gcHJvamVjdC4K",
            "encoding": "base64",
            "size": 26
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .mount(&server)
        .await;

    let joined = fetch_context_documents(&test_client(&server), "acme", "widgets")
        .await
        .unwrap()
        .expect("README should be found");

    assert!(joined.starts_with("# README.md"));
    assert!(joined.contains("A demo project."));
}

#[tokio::test]
async fn test_no_context_documents_yields_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .mount(&server)
        .await;

    let joined = fetch_context_documents(&test_client(&server), "acme", "widgets")
        .await
        .unwrap();
    assert!(joined.is_none());
}

//! Remote catalog resolution against mocked GitHub and GitLab APIs

use serde_json::{json, Value};
use std::time::Duration;
use template_core::templates::{build_catalog, CatalogResolver, HttpSettings, RemoteFetcher};
use template_core::{Origin, ProviderKind, TemplateError, TemplateSourceConfig};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Matches requests that carry no Authorization header at all
struct NoAuthorization;

impl Match for NoAuthorization {
    fn matches(&self, request: &Request) -> bool {
        !request.headers.contains_key("authorization")
    }
}

fn resolver() -> CatalogResolver {
    CatalogResolver::new(RemoteFetcher::new(&HttpSettings::default()).unwrap())
}

fn github_source(server: &MockServer, owner: &str) -> TemplateSourceConfig {
    TemplateSourceConfig::new(ProviderKind::GitHub, owner, "y")
        .with_path("templates")
        .with_api_url(&server.uri())
}

fn github_dir(server: &MockServer, owner: &str, repo_path: &str) -> Value {
    json!({
        "name": repo_path.rsplit('/').next().unwrap(),
        "path": repo_path,
        "type": "dir",
        "url": format!("{}/repos/{}/y/contents/{}", server.uri(), owner, repo_path),
        "download_url": null
    })
}

fn github_file(server: &MockServer, repo_path: &str) -> Value {
    json!({
        "name": repo_path.rsplit('/').next().unwrap(),
        "path": repo_path,
        "type": "file",
        "url": format!("{}/repos/x/y/contents/{}", server.uri(), repo_path),
        "download_url": format!("{}/raw/{}", server.uri(), repo_path)
    })
}

async fn mount_listing(server: &MockServer, listing_path: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(listing_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_github_two_level_resolution() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "/repos/x/y/contents/templates",
        json!([github_dir(&server, "x", "templates/web")]),
    )
    .await;
    mount_listing(
        &server,
        "/repos/x/y/contents/templates/web",
        json!([github_dir(&server, "x", "templates/web/basic")]),
    )
    .await;

    let resolution = resolver()
        .resolve_provider(ProviderKind::GitHub, &[github_source(&server, "x")])
        .await;

    assert!(resolution.failures.is_empty());
    assert_eq!(resolution.entries.len(), 1);
    let web = &resolution.entries[0];
    assert_eq!(web.name, "web");
    assert_eq!(web.path, "web");
    assert_eq!(web.children.len(), 1);

    let basic = &web.children[0];
    assert_eq!(basic.name, "basic");
    assert_eq!(basic.path, "web/basic");
    assert!(basic.children.is_empty());
    match &basic.origin {
        Origin::Remote {
            provider,
            listing_url,
            ..
        } => {
            assert_eq!(*provider, ProviderKind::GitHub);
            assert!(listing_url.path().ends_with("/contents/templates/web/basic"));
        }
        other => panic!("expected a remote origin, got {:?}", other),
    }
}

#[tokio::test]
async fn test_root_without_directories_yields_no_types() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "/repos/x/y/contents/templates",
        json!([github_file(&server, "templates/README.md")]),
    )
    .await;

    let resolution = resolver()
        .resolve_provider(ProviderKind::GitHub, &[github_source(&server, "x")])
        .await;

    assert!(resolution.entries.is_empty());
    assert!(resolution.failures.is_empty());
}

#[tokio::test]
async fn test_listing_order_is_preserved() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "/repos/x/y/contents/templates",
        json!([
            github_dir(&server, "x", "templates/zeta"),
            github_dir(&server, "x", "templates/alpha"),
        ]),
    )
    .await;
    // The first type answers slowest
    Mock::given(method("GET"))
        .and(path("/repos/x/y/contents/templates/zeta"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([github_dir(&server, "x", "templates/zeta/one")]))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;
    mount_listing(
        &server,
        "/repos/x/y/contents/templates/alpha",
        json!([github_dir(&server, "x", "templates/alpha/two")]),
    )
    .await;

    let resolution = resolver()
        .resolve_provider(ProviderKind::GitHub, &[github_source(&server, "x")])
        .await;

    let names: Vec<&str> = resolution.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["zeta", "alpha"]);
}

#[tokio::test]
async fn test_github_token_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/x/y/contents/templates"))
        .and(header("authorization", "token secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let source = github_source(&server, "x").with_token("secret");
    let resolution = resolver()
        .resolve_provider(ProviderKind::GitHub, &[source])
        .await;

    assert!(resolution.failures.is_empty());
    assert!(!resolution.anonymous);
}

#[tokio::test]
async fn test_missing_token_sends_no_header_and_flags_anonymous() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/x/y/contents/templates"))
        .and(NoAuthorization)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let resolution = resolver()
        .resolve_provider(ProviderKind::GitHub, &[github_source(&server, "x")])
        .await;

    assert!(resolution.failures.is_empty());
    assert!(resolution.anonymous);
}

#[tokio::test]
async fn test_timed_out_source_is_isolated() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "/repos/x/y/contents/templates",
        json!([github_dir(&server, "x", "templates/web")]),
    )
    .await;
    mount_listing(
        &server,
        "/repos/x/y/contents/templates/web",
        json!([github_dir(&server, "x", "templates/web/basic")]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/repos/slow/y/contents/templates"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let fetcher = RemoteFetcher::new(&HttpSettings {
        timeout: Duration::from_millis(300),
        ..HttpSettings::default()
    })
    .unwrap();
    let sources = vec![github_source(&server, "slow"), github_source(&server, "x")];
    let resolution = CatalogResolver::new(fetcher)
        .resolve_provider(ProviderKind::GitHub, &sources)
        .await;

    assert_eq!(resolution.entries.len(), 1);
    assert_eq!(resolution.entries[0].name, "web");
    assert_eq!(resolution.failures.len(), 1);
    assert_eq!(resolution.failures[0].source.owner, "slow");
    assert!(matches!(
        resolution.first_error(),
        Some(TemplateError::Timeout {
            provider: ProviderKind::GitHub
        })
    ));
}

#[tokio::test]
async fn test_failed_second_level_discards_whole_source() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "/repos/x/y/contents/templates",
        json!([
            github_dir(&server, "x", "templates/web"),
            github_dir(&server, "x", "templates/api"),
        ]),
    )
    .await;
    mount_listing(
        &server,
        "/repos/x/y/contents/templates/web",
        json!([github_dir(&server, "x", "templates/web/basic")]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/repos/x/y/contents/templates/api"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"message": "API rate limit exceeded"})),
        )
        .mount(&server)
        .await;

    let resolution = resolver()
        .resolve_provider(ProviderKind::GitHub, &[github_source(&server, "x")])
        .await;

    assert!(resolution.entries.is_empty());
    assert_eq!(resolution.failures.len(), 1);
    match &resolution.failures[0].error {
        TemplateError::Provider { provider, message } => {
            assert_eq!(*provider, ProviderKind::GitHub);
            assert!(message.contains("API rate limit exceeded"));
        }
        other => panic!("expected a provider error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_gitlab_resolution_builds_child_urls() {
    let server = MockServer::start().await;
    let tree_path = "/projects/group%2Frepo/repository/tree";

    Mock::given(method("GET"))
        .and(path(tree_path))
        .and(query_param("path", "templates"))
        .and(query_param("ref", "main"))
        .and(query_param("per_page", "100"))
        .and(header("authorization", "Bearer glpat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "t1", "name": "web", "type": "tree", "path": "templates/web", "mode": "040000"},
            {"id": "b1", "name": "README.md", "type": "blob", "path": "templates/README.md", "mode": "100644"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(tree_path))
        .and(query_param("path", "templates/web"))
        .and(query_param("ref", "main"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "t2", "name": "basic", "type": "tree", "path": "templates/web/basic", "mode": "040000"},
            {"id": "t3", "name": "spa", "type": "tree", "path": "templates/web/spa", "mode": "040000"}
        ])))
        .mount(&server)
        .await;

    let source = TemplateSourceConfig::new(ProviderKind::GitLab, "group", "repo")
        .with_path("templates")
        .with_branch("main")
        .with_api_url(&server.uri())
        .with_token("glpat");
    let resolution = resolver()
        .resolve_provider(ProviderKind::GitLab, &[source])
        .await;

    assert!(resolution.failures.is_empty(), "{:?}", resolution.failures);
    assert_eq!(resolution.entries.len(), 1);
    let names: Vec<&str> = resolution.entries[0]
        .children
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["basic", "spa"]);
}

#[tokio::test]
async fn test_gitlab_listing_follows_pagination() {
    let server = MockServer::start().await;
    let tree_path = "/projects/group%2Frepo/repository/tree";

    Mock::given(method("GET"))
        .and(path(tree_path))
        .and(query_param("path", "templates"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "t2", "name": "cli", "type": "tree", "path": "templates/cli", "mode": "040000"}
        ])))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(tree_path))
        .and(query_param("path", "templates"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-next-page", "2")
                .set_body_json(json!([
                    {"id": "t1", "name": "web", "type": "tree", "path": "templates/web", "mode": "040000"}
                ])),
        )
        .with_priority(2)
        .mount(&server)
        .await;
    for name in ["web", "cli"] {
        Mock::given(method("GET"))
            .and(path(tree_path))
            .and(query_param("path", format!("templates/{}", name)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "x", "name": "basic", "type": "tree", "path": format!("templates/{}/basic", name), "mode": "040000"}
            ])))
            .mount(&server)
            .await;
    }

    let source = TemplateSourceConfig::new(ProviderKind::GitLab, "group", "repo")
        .with_path("templates")
        .with_api_url(&server.uri());
    let resolution = resolver()
        .resolve_provider(ProviderKind::GitLab, &[source])
        .await;

    let names: Vec<&str> = resolution.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["web", "cli"]);
}

#[tokio::test]
async fn test_build_catalog_combines_local_and_remote() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "/repos/x/y/contents/templates",
        json!([github_dir(&server, "x", "templates/web")]),
    )
    .await;
    mount_listing(
        &server,
        "/repos/x/y/contents/templates/web",
        json!([github_dir(&server, "x", "templates/web/basic")]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/repos/broken/y/contents/templates"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
        .mount(&server)
        .await;

    let local = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(local.path().join("cli/rust")).unwrap();
    std::fs::create_dir_all(local.path().join("empty")).unwrap();

    let build = build_catalog(
        &resolver(),
        &[local.path().to_path_buf()],
        &[github_source(&server, "x"), github_source(&server, "broken")],
    )
    .await;

    let labels: Vec<String> = build.catalog.types().iter().map(|t| t.label()).collect();
    assert_eq!(labels, vec!["cli (local)", "web (github-x/y)"]);

    let advisories = build.advisories();
    assert!(advisories.iter().any(|a| a.contains("No github token")));
    assert!(advisories
        .iter()
        .any(|a| a.contains("github-broken/y") && a.contains("Not Found")));
}

#[tokio::test]
async fn test_build_catalog_without_anything_is_empty() {
    let local = tempfile::tempdir().unwrap();
    let build = build_catalog(&resolver(), &[local.path().to_path_buf()], &[]).await;

    assert!(build.catalog.is_empty());
    assert!(build.advisories().is_empty());
}

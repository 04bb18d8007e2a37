//! The REST adapter against a mock GitHub.

use governance::{
    CodeRepository, CommitSha, CommitState, CommitStatus, GitHubError, OrganizationName,
    Permission, PullRequestManager, PullRequestNumber, RepositoryId, RepositoryInspector,
    RepositoryName, ReviewState, TeamAdmin, TeamId, TeamPrivacy, TeamSlug, TeamSpec, Username,
};
use github::GitHubClient;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> GitHubClient {
    GitHubClient::new(
        &server.uri(),
        "secret-token",
        OrganizationName::new("acme").unwrap(),
    )
    .unwrap()
}

fn slug(s: &str) -> TeamSlug {
    TeamSlug::new(s).unwrap()
}

#[tokio::test]
async fn sends_auth_and_api_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme/teams/core"))
        .and(header("authorization", "Bearer secret-token"))
        .and(header("accept", "application/vnd.github+json"))
        .and(header("x-github-api-version", "2022-11-28"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "slug": "core",
            "name": "Core",
            "description": "",
            "parent": { "slug": "platform" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let team = client(&server).get_team(&slug("core")).await.unwrap();

    assert_eq!(team.id, TeamId::new(42));
    assert_eq!(team.description, None);
    assert_eq!(team.parent, Some(slug("platform")));
}

#[tokio::test]
async fn follows_next_links_and_normalizes_logins() {
    let server = MockServer::start().await;
    let first: Vec<_> = (0..100).map(|i| json!({ "login": format!("User{i:03}") })).collect();
    let next = format!(
        "<{}/orgs/acme/teams/core/members?per_page=100&page=2>; rel=\"next\"",
        server.uri()
    );

    Mock::given(method("GET"))
        .and(path("/orgs/acme/teams/core/members"))
        .and(query_param("per_page", "100"))
        .and(query_param_is_missing("page"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("link", next.as_str())
                .set_body_json(json!(first)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme/teams/core/members"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "login": "Zed" }])))
        .mount(&server)
        .await;

    let members = client(&server).list_members(&slug("core")).await.unwrap();

    assert_eq!(members.len(), 101);
    assert_eq!(members[0], Username::new("user000").unwrap());
    assert_eq!(members[100], Username::new("zed").unwrap());
}

#[tokio::test]
async fn classifies_error_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/orgs/acme/teams/core/memberships/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/orgs/acme/teams/core/memberships/limited"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .set_body_json(json!({ "message": "API rate limit exceeded" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/orgs/acme/teams/core/memberships/forbidden"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "message": "Must have admin rights" })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/orgs/acme/teams/core/memberships/broken"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let github = client(&server);
    let add = |name: &'static str| {
        let github = github.clone();
        async move {
            github
                .add_member(&slug("core"), &Username::new(name).unwrap())
                .await
                .unwrap_err()
        }
    };

    assert!(add("ghost").await.is_not_found());
    assert!(matches!(add("limited").await, GitHubError::RateLimited { .. }));
    assert_eq!(
        add("forbidden").await,
        GitHubError::PermissionDenied {
            message: "Must have admin rights".into()
        }
    );
    assert_eq!(
        add("broken").await,
        GitHubError::Api {
            status: 502,
            message: "bad gateway".into()
        }
    );
}

#[tokio::test]
async fn membership_and_permission_payloads() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/orgs/acme/teams/core/memberships/alice"))
        .and(body_json(json!({ "role": "member" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "state": "active" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/orgs/acme/teams/core/repos/acme/api"))
        .and(body_json(json!({ "permission": "push" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/orgs/acme/teams/core/repos/acme/old"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let github = client(&server);
    let core = slug("core");
    github
        .add_member(&core, &Username::new("alice").unwrap())
        .await
        .unwrap();
    github
        .set_repository_permission(&core, &RepositoryName::new("api").unwrap(), &Permission::Push)
        .await
        .unwrap();
    github
        .remove_repository(&core, &RepositoryName::new("old").unwrap())
        .await
        .unwrap();
}

#[tokio::test]
async fn team_repositories_prefer_role_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme/teams/core/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "API", "role_name": "maintain", "permissions": { "admin": false, "push": true, "pull": true } },
            { "name": "docs", "permissions": { "admin": false, "push": true, "pull": true } },
            { "name": "ops", "role_name": "release-manager", "permissions": { "pull": true } }
        ])))
        .mount(&server)
        .await;

    let repositories = TeamAdmin::list_repositories(&client(&server), &slug("core"))
        .await
        .unwrap();
    let pairs: Vec<(&str, Permission)> = repositories
        .iter()
        .map(|r| (r.name.as_str(), r.permission.clone()))
        .collect();

    assert_eq!(
        pairs,
        vec![
            ("api", Permission::Maintain),
            ("docs", Permission::Push),
            ("ops", Permission::Custom("release-manager".into())),
        ]
    );
}

#[tokio::test]
async fn creates_closed_child_team() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orgs/acme/teams"))
        .and(body_json(json!({
            "name": "core-reviewers",
            "description": "Reviewers",
            "privacy": "closed",
            "parent_team_id": 42
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 43,
            "slug": "core-reviewers",
            "name": "core-reviewers",
            "description": "Reviewers",
            "parent": { "slug": "core" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let team = client(&server)
        .create_team(&TeamSpec {
            name: "core-reviewers".into(),
            description: "Reviewers".into(),
            privacy: TeamPrivacy::Closed,
            parent_team_id: Some(TeamId::new(42)),
        })
        .await
        .unwrap();

    assert_eq!(team.slug, slug("core-reviewers"));
}

#[tokio::test]
async fn pull_request_reviews_and_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/pulls/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "number": 7,
            "base": { "ref": "main", "sha": "base000" },
            "head": { "ref": "feature", "sha": "abc123" },
            "user": { "login": "Author" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/pulls/7/reviews"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "user": { "login": "rita" }, "state": "APPROVED" },
            { "user": null, "state": "APPROVED" },
            { "user": { "login": "ron" }, "state": "CHANGES_REQUESTED" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/widgets/statuses/abc123"))
        .and(body_json(json!({
            "state": "pending",
            "context": "pr-review-requirements",
            "description": "1/2 approvals"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let repo = client(&server).for_repository(RepositoryId::parse("acme/widgets").unwrap());
    let pr = repo.get_pull_request(PullRequestNumber::new(7)).await.unwrap();
    assert_eq!(pr.base_ref, "main");
    assert_eq!(pr.author, Username::new("author").unwrap());

    let reviews = repo.list_reviews(pr.number).await.unwrap();
    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[1].state, ReviewState::ChangesRequested);

    repo.create_commit_status(
        &pr.head_sha,
        &CommitStatus {
            state: CommitState::Pending,
            context: "pr-review-requirements".into(),
            description: "1/2 approvals".into(),
        },
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn compare_lists_changed_files() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/governance/compare/aaa...bbb"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [
                { "filename": "teams/core/teams.yml" },
                { "filename": "README.md" }
            ]
        })))
        .mount(&server)
        .await;

    let repo = client(&server).for_repository(RepositoryId::parse("acme/governance").unwrap());
    let files = repo
        .changed_files(&CommitSha::new("aaa").unwrap(), &CommitSha::new("bbb").unwrap())
        .await
        .unwrap();

    assert_eq!(files, vec!["teams/core/teams.yml", "README.md"]);
}

#[tokio::test]
async fn repository_inspection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme/repos"))
        .and(query_param("type", "all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "name": "Widgets",
            "full_name": "acme/Widgets",
            "archived": false,
            "private": true,
            "updated_at": "2024-03-09T12:00:00Z"
        }])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/contents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "README.md", "type": "file" },
            { "name": "src", "type": "dir" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/contents/.github"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "security_and_analysis": { "advanced_security": { "status": "enabled" } }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/vulnerability-alerts"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/dependabot/alerts"))
        .and(query_param("state", "open"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "security_advisory": { "severity": "HIGH" } },
            { "security_vulnerability": { "severity": "critical" } }
        ])))
        .mount(&server)
        .await;

    let github = client(&server);
    let repos = RepositoryInspector::list_repositories(&github).await.unwrap();
    assert_eq!(repos.len(), 1);
    assert!(repos[0].private);
    assert!(repos[0].updated_at.is_some());

    let name = repos[0].name.clone();
    assert_eq!(name.as_str(), "widgets");
    assert_eq!(
        github.list_directory(&name, "").await.unwrap(),
        vec!["README.md", "src"]
    );
    assert!(github.list_directory(&name, ".github").await.unwrap_err().is_not_found());
    assert!(github.advanced_security_enabled(&name).await.unwrap());
    assert!(github.vulnerability_alerts_enabled(&name).await.unwrap());
    assert_eq!(
        github.list_dependabot_alert_severities(&name).await.unwrap(),
        vec!["high", "critical"]
    );
}

#[tokio::test]
async fn disabled_vulnerability_alerts_are_false() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/quiet/vulnerability-alerts"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let enabled = client(&server)
        .vulnerability_alerts_enabled(&RepositoryName::new("quiet").unwrap())
        .await
        .unwrap();
    assert!(!enabled);
}

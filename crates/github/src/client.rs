//! HTTP plumbing shared by every endpoint: headers, pagination and
//! status classification.

use governance::{GitHubError, OrganizationName, RepositoryId};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, LINK};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Public GitHub API root, used unless `GITHUB_API_URL` says otherwise.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("org-governance/", env!("CARGO_PKG_VERSION"));
const PAGE_SIZE: usize = 100;

/// An authenticated client bound to one organization.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    org: OrganizationName,
}

/// A [`GitHubClient`] narrowed to one repository.
#[derive(Debug, Clone)]
pub struct RepositoryClient {
    pub(crate) client: GitHubClient,
    pub(crate) repository: RepositoryId,
}

pub(crate) fn transport(e: reqwest::Error) -> GitHubError {
    GitHubError::Transport {
        message: e.to_string(),
    }
}

pub(crate) fn invalid(e: impl std::fmt::Display) -> GitHubError {
    GitHubError::InvalidResponse {
        message: e.to_string(),
    }
}

impl GitHubClient {
    pub fn new(
        base_url: &str,
        token: impl Into<String>,
        org: OrganizationName,
    ) -> Result<Self, GitHubError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(transport)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            org,
        })
    }

    pub fn organization(&self) -> &OrganizationName {
        &self.org
    }

    pub fn for_repository(&self, repository: RepositoryId) -> RepositoryClient {
        RepositoryClient {
            client: self.clone(),
            repository,
        }
    }

    /// `/orgs/{org}` followed by `path`.
    pub(crate) fn org_path(&self, path: &str) -> String {
        format!("/orgs/{}{path}", self.org)
    }

    /// `/repos/{org}/{repository}` followed by `path`.
    pub(crate) fn org_repo_path(&self, repository: &str, path: &str) -> String {
        format!("/repos/{}/{repository}{path}", self.org)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let url = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}{url}", self.base_url)
        };
        self.http.request(method, url).bearer_auth(&self.token)
    }

    /// Sends a request and classifies a non-success status.
    async fn execute(&self, builder: RequestBuilder, resource: &str) -> Result<Response, GitHubError> {
        let response = builder.send().await.map_err(transport)?;
        classify(response, resource).await
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GitHubError> {
        let response = self.execute(self.request(Method::GET, path), path).await?;
        response.json().await.map_err(invalid)
    }

    /// Walks every page of a list endpoint, following `Link: rel="next"`.
    pub(crate) async fn get_paged<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, GitHubError> {
        let per_page = PAGE_SIZE.to_string();
        let mut builder = self
            .request(Method::GET, path)
            .query(query)
            .query(&[("per_page", per_page.as_str())]);
        let mut items = Vec::new();

        loop {
            let response = self.execute(builder, path).await?;
            let next = next_page(response.headers());
            let page: Vec<T> = response.json().await.map_err(invalid)?;
            let short = page.len() < PAGE_SIZE;
            items.extend(page);

            match next {
                Some(url) if !short => builder = self.request(Method::GET, &url),
                _ => break,
            }
        }

        tracing::trace!(path, count = items.len(), "Fetched paged list");
        Ok(items)
    }

    /// Sends a JSON body and decodes a JSON response.
    pub(crate) async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, GitHubError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute(self.request(method, path).json(body), path)
            .await?;
        response.json().await.map_err(invalid)
    }

    /// Sends a request whose response body is irrelevant.
    pub(crate) async fn send_unit<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<(), GitHubError>
    where
        B: Serialize + ?Sized,
    {
        let mut builder = self.request(method, path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.execute(builder, path).await.map(|_| ())
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), GitHubError> {
        self.send_unit::<()>(Method::DELETE, path, None).await
    }

    /// GETs `path` and reports only whether it exists: `true` on success,
    /// `false` on 404.
    pub(crate) async fn exists(&self, path: &str) -> Result<bool, GitHubError> {
        match self.execute(self.request(Method::GET, path), path).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

async fn classify(response: Response, resource: &str) -> Result<Response, GitHubError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let exhausted = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        == Some("0");
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|b| b.message)
        .unwrap_or(text);

    tracing::debug!(status = status.as_u16(), resource, %message, "GitHub API call failed");

    Err(match status {
        StatusCode::NOT_FOUND => GitHubError::NotFound {
            resource: resource.to_string(),
        },
        StatusCode::TOO_MANY_REQUESTS => GitHubError::RateLimited { message },
        StatusCode::FORBIDDEN
            if exhausted || message.to_ascii_lowercase().contains("rate limit") =>
        {
            GitHubError::RateLimited { message }
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GitHubError::PermissionDenied { message }
        }
        other => GitHubError::Api {
            status: other.as_u16(),
            message,
        },
    })
}

/// Extracts the `rel="next"` target from a `Link` header.
fn next_page(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        params
            .split(';')
            .any(|p| p.trim() == "rel=\"next\"")
            .then(|| {
                target
                    .trim()
                    .trim_start_matches('<')
                    .trim_end_matches('>')
                    .to_string()
            })
    })
}

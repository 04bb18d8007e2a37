//! `PullRequestManager` and `CodeRepository` for one repository.

use async_trait::async_trait;
use governance::{
    CodeRepository, CommitSha, CommitStatus, GitHubError, PullRequest, PullRequestManager,
    PullRequestNumber, Review, TeamSlug, Username,
};
use reqwest::Method;
use serde_json::json;

use crate::client::{invalid, RepositoryClient};
use crate::models::{CompareBody, PullRequestBody, ReviewBody};

impl RepositoryClient {
    fn repo_path(&self, rest: &str) -> String {
        format!("/repos/{}{rest}", self.repository)
    }
}

#[async_trait]
impl PullRequestManager for RepositoryClient {
    async fn get_pull_request(
        &self,
        number: PullRequestNumber,
    ) -> Result<PullRequest, GitHubError> {
        let body: PullRequestBody = self
            .client
            .get_json(&self.repo_path(&format!("/pulls/{number}")))
            .await?;
        body.into_pull_request()
            .ok_or_else(|| invalid(format!("pull request #{number} is missing its head or author")))
    }

    async fn list_reviews(&self, number: PullRequestNumber) -> Result<Vec<Review>, GitHubError> {
        let reviews: Vec<ReviewBody> = self
            .client
            .get_paged(&self.repo_path(&format!("/pulls/{number}/reviews")), &[])
            .await?;
        Ok(reviews.into_iter().filter_map(ReviewBody::into_review).collect())
    }

    async fn request_team_reviewers(
        &self,
        number: PullRequestNumber,
        teams: &[TeamSlug],
    ) -> Result<(), GitHubError> {
        let teams: Vec<&str> = teams.iter().map(TeamSlug::as_str).collect();
        self.client
            .send_unit(
                Method::POST,
                &self.repo_path(&format!("/pulls/{number}/requested_reviewers")),
                Some(&json!({ "team_reviewers": teams })),
            )
            .await
    }

    async fn add_assignees(
        &self,
        number: PullRequestNumber,
        users: &[Username],
    ) -> Result<(), GitHubError> {
        let users: Vec<&str> = users.iter().map(Username::as_str).collect();
        self.client
            .send_unit(
                Method::POST,
                &self.repo_path(&format!("/issues/{number}/assignees")),
                Some(&json!({ "assignees": users })),
            )
            .await
    }

    async fn close_pull_request(&self, number: PullRequestNumber) -> Result<(), GitHubError> {
        self.client
            .send_unit(
                Method::PATCH,
                &self.repo_path(&format!("/pulls/{number}")),
                Some(&json!({ "state": "closed" })),
            )
            .await
    }

    async fn create_commit_status(
        &self,
        sha: &CommitSha,
        status: &CommitStatus,
    ) -> Result<(), GitHubError> {
        self.client
            .send_unit(
                Method::POST,
                &self.repo_path(&format!("/statuses/{sha}")),
                Some(&json!({
                    "state": status.state.as_api_str(),
                    "context": status.context,
                    "description": status.description,
                })),
            )
            .await
    }
}

#[async_trait]
impl CodeRepository for RepositoryClient {
    async fn changed_files(
        &self,
        base: &CommitSha,
        head: &CommitSha,
    ) -> Result<Vec<String>, GitHubError> {
        let body: CompareBody = self
            .client
            .get_json(&self.repo_path(&format!("/compare/{base}...{head}")))
            .await?;
        Ok(body.files.into_iter().map(|f| f.filename).collect())
    }
}

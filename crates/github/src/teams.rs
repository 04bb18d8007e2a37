//! `TeamAdmin` over the organization teams endpoints.

use async_trait::async_trait;
use governance::{
    GitHubError, Permission, RepositoryName, Team, TeamAdmin, TeamRepository, TeamSlug, TeamSpec,
    Username,
};
use reqwest::Method;
use serde_json::json;

use crate::client::{invalid, GitHubClient};
use crate::models::{Account, TeamBody, TeamRepositoryBody, TeamRequest};

impl GitHubClient {
    fn team_path(&self, team: &TeamSlug, rest: &str) -> String {
        self.org_path(&format!("/teams/{team}{rest}"))
    }

    fn team_request<'a>(spec: &'a TeamSpec) -> TeamRequest<'a> {
        TeamRequest {
            name: &spec.name,
            description: &spec.description,
            privacy: spec.privacy.as_api_str(),
            parent_team_id: spec.parent_team_id.map(|id| id.as_u64()),
        }
    }
}

fn to_team(body: TeamBody) -> Result<Team, GitHubError> {
    let slug = body.slug.clone();
    body.into_team()
        .ok_or_else(|| invalid(format!("team with unusable slug '{slug}'")))
}

#[async_trait]
impl TeamAdmin for GitHubClient {
    async fn get_team(&self, team: &TeamSlug) -> Result<Team, GitHubError> {
        to_team(self.get_json(&self.team_path(team, "")).await?)
    }

    async fn list_members(&self, team: &TeamSlug) -> Result<Vec<Username>, GitHubError> {
        let members: Vec<Account> = self
            .get_paged(&self.team_path(team, "/members"), &[])
            .await?;
        Ok(members
            .into_iter()
            .filter_map(|m| Username::normalize(&m.login))
            .collect())
    }

    async fn add_member(&self, team: &TeamSlug, user: &Username) -> Result<(), GitHubError> {
        let path = self.team_path(team, &format!("/memberships/{user}"));
        self.send_unit(Method::PUT, &path, Some(&json!({ "role": "member" })))
            .await
    }

    async fn remove_member(&self, team: &TeamSlug, user: &Username) -> Result<(), GitHubError> {
        self.delete(&self.team_path(team, &format!("/memberships/{user}")))
            .await
    }

    async fn list_repositories(
        &self,
        team: &TeamSlug,
    ) -> Result<Vec<TeamRepository>, GitHubError> {
        let repositories: Vec<TeamRepositoryBody> = self
            .get_paged(&self.team_path(team, "/repos"), &[])
            .await?;
        Ok(repositories
            .into_iter()
            .filter_map(TeamRepositoryBody::into_team_repository)
            .collect())
    }

    async fn set_repository_permission(
        &self,
        team: &TeamSlug,
        repository: &RepositoryName,
        permission: &Permission,
    ) -> Result<(), GitHubError> {
        let path = self.team_path(team, &format!("/repos/{}/{repository}", self.organization()));
        self.send_unit(
            Method::PUT,
            &path,
            Some(&json!({ "permission": permission.as_api_str() })),
        )
        .await
    }

    async fn remove_repository(
        &self,
        team: &TeamSlug,
        repository: &RepositoryName,
    ) -> Result<(), GitHubError> {
        let path = self.team_path(team, &format!("/repos/{}/{repository}", self.organization()));
        self.delete(&path).await
    }

    async fn list_child_teams(&self, team: &TeamSlug) -> Result<Vec<Team>, GitHubError> {
        let children: Vec<TeamBody> = self.get_paged(&self.team_path(team, "/teams"), &[]).await?;
        children.into_iter().map(to_team).collect()
    }

    async fn create_team(&self, spec: &TeamSpec) -> Result<Team, GitHubError> {
        let body: TeamBody = self
            .send_json(Method::POST, &self.org_path("/teams"), &Self::team_request(spec))
            .await?;
        to_team(body)
    }

    async fn update_team(&self, team: &TeamSlug, spec: &TeamSpec) -> Result<Team, GitHubError> {
        let body: TeamBody = self
            .send_json(
                Method::PATCH,
                &self.team_path(team, ""),
                &Self::team_request(spec),
            )
            .await?;
        to_team(body)
    }

    async fn delete_team(&self, team: &TeamSlug) -> Result<(), GitHubError> {
        self.delete(&self.team_path(team, "")).await
    }
}

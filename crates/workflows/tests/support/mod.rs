//! In-memory GitHub implementing every port trait, with call recording and
//! per-item failure injection.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;
use governance::{
    CommitSha, CommitStatus, GitHubError, Permission, PullRequest, PullRequestManager,
    PullRequestNumber, RepositoryId, RepositoryInspector, RepositoryName, RepositorySummary,
    Review, Team, TeamAdmin, TeamId, TeamRepository, TeamSlug, TeamSpec, Username,
};

pub fn user(name: &str) -> Username {
    Username::normalize(name).unwrap()
}

pub fn repo(name: &str) -> RepositoryName {
    RepositoryName::normalize(name).unwrap()
}

pub fn slug(name: &str) -> TeamSlug {
    TeamSlug::from_name(name).unwrap()
}

#[derive(Debug, Clone)]
pub struct FakeTeam {
    pub team: Team,
    pub members: BTreeSet<Username>,
    pub repositories: BTreeMap<RepositoryName, Permission>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeRepository {
    pub archived: bool,
    pub private: bool,
    pub root: Vec<String>,
    pub dot_github: Option<Vec<String>>,
    pub advanced_security: bool,
    pub vulnerability_alerts: bool,
    pub alert_severities: Vec<String>,
    /// Every inspection call fails with a 500.
    pub broken: bool,
}

#[derive(Debug, Default)]
pub struct State {
    pub teams: BTreeMap<TeamSlug, FakeTeam>,
    next_id: u64,
    /// Users whose addition fails with a 404.
    pub unknown_users: BTreeSet<Username>,
    /// Repositories whose revocation fails with a 404.
    pub vanished_repositories: BTreeSet<RepositoryName>,
    /// Every mutating call, in order, e.g. `add_member team-a alice`.
    pub calls: Vec<String>,

    pub pull_requests: BTreeMap<u64, PullRequest>,
    pub reviews: BTreeMap<u64, Vec<Review>>,
    pub requested_teams: Vec<TeamSlug>,
    pub assignee_batches: Vec<Vec<Username>>,
    pub statuses: Vec<(CommitSha, CommitStatus)>,
    pub closed: BTreeSet<u64>,

    pub repositories: BTreeMap<String, FakeRepository>,
    /// Peak number of concurrent inspections.
    pub in_flight: usize,
    pub peak_in_flight: usize,
}

impl State {
    fn roster(&self, team: &TeamSlug) -> BTreeSet<Username> {
        let mut members = self
            .teams
            .get(team)
            .map(|t| t.members.clone())
            .unwrap_or_default();
        for child in self.teams.values().filter(|t| t.team.parent.as_ref() == Some(team)) {
            members.extend(self.roster(&child.team.slug));
        }
        members
    }
}

#[derive(Debug, Default)]
pub struct FakeGitHub {
    pub state: Mutex<State>,
}

impl FakeGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_team(self, name: &str, parent: Option<&str>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            let id = TeamId::new(state.next_id);
            let team = Team {
                id,
                slug: slug(name),
                name: name.to_string(),
                description: None,
                parent: parent.map(slug),
            };
            state.teams.insert(
                team.slug.clone(),
                FakeTeam {
                    team,
                    members: BTreeSet::new(),
                    repositories: BTreeMap::new(),
                },
            );
        }
        self
    }

    pub fn with_members(self, team: &str, members: &[&str]) -> Self {
        self.state
            .lock()
            .unwrap()
            .teams
            .get_mut(&slug(team))
            .unwrap()
            .members
            .extend(members.iter().map(|m| user(m)));
        self
    }

    pub fn with_grant(self, team: &str, repository: &str, permission: Permission) -> Self {
        self.state
            .lock()
            .unwrap()
            .teams
            .get_mut(&slug(team))
            .unwrap()
            .repositories
            .insert(repo(repository), permission);
        self
    }

    pub fn with_repository(self, name: &str, repository: FakeRepository) -> Self {
        self.state
            .lock()
            .unwrap()
            .repositories
            .insert(name.to_string(), repository);
        self
    }

    pub fn unknown_user(self, name: &str) -> Self {
        self.state.lock().unwrap().unknown_users.insert(user(name));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn members(&self, team: &str) -> BTreeSet<Username> {
        self.state.lock().unwrap().teams[&slug(team)].members.clone()
    }

    pub fn grants(&self, team: &str) -> BTreeMap<RepositoryName, Permission> {
        self.state.lock().unwrap().teams[&slug(team)]
            .repositories
            .clone()
    }

    pub fn has_team(&self, team: &str) -> bool {
        self.state.lock().unwrap().teams.contains_key(&slug(team))
    }

    pub fn team(&self, team: &str) -> Team {
        self.state.lock().unwrap().teams[&slug(team)].team.clone()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

fn missing(what: impl std::fmt::Display) -> GitHubError {
    GitHubError::not_found(what.to_string())
}

#[async_trait]
impl TeamAdmin for FakeGitHub {
    async fn get_team(&self, team: &TeamSlug) -> Result<Team, GitHubError> {
        let state = self.state.lock().unwrap();
        state
            .teams
            .get(team)
            .map(|t| t.team.clone())
            .ok_or_else(|| missing(team))
    }

    /// Direct members plus the members of every descendant team, as GitHub
    /// lists them.
    async fn list_members(&self, team: &TeamSlug) -> Result<Vec<Username>, GitHubError> {
        let state = self.state.lock().unwrap();
        if !state.teams.contains_key(team) {
            return Err(missing(team));
        }
        Ok(state.roster(team).into_iter().collect())
    }

    async fn add_member(&self, team: &TeamSlug, user: &Username) -> Result<(), GitHubError> {
        self.record(format!("add_member {team} {user}"));
        let mut state = self.state.lock().unwrap();
        if state.unknown_users.contains(user) {
            return Err(missing(user));
        }
        let t = state.teams.get_mut(team).ok_or_else(|| missing(team))?;
        t.members.insert(user.clone());
        Ok(())
    }

    async fn remove_member(&self, team: &TeamSlug, user: &Username) -> Result<(), GitHubError> {
        self.record(format!("remove_member {team} {user}"));
        let mut state = self.state.lock().unwrap();
        let t = state.teams.get_mut(team).ok_or_else(|| missing(team))?;
        t.members.remove(user);
        Ok(())
    }

    async fn list_repositories(&self, team: &TeamSlug) -> Result<Vec<TeamRepository>, GitHubError> {
        let state = self.state.lock().unwrap();
        let t = state.teams.get(team).ok_or_else(|| missing(team))?;
        Ok(t.repositories
            .iter()
            .map(|(name, permission)| TeamRepository {
                name: name.clone(),
                permission: permission.clone(),
            })
            .collect())
    }

    async fn set_repository_permission(
        &self,
        team: &TeamSlug,
        repository: &RepositoryName,
        permission: &Permission,
    ) -> Result<(), GitHubError> {
        self.record(format!("set_permission {team} {repository} {permission}"));
        let mut state = self.state.lock().unwrap();
        let t = state.teams.get_mut(team).ok_or_else(|| missing(team))?;
        t.repositories.insert(repository.clone(), permission.clone());
        Ok(())
    }

    async fn remove_repository(
        &self,
        team: &TeamSlug,
        repository: &RepositoryName,
    ) -> Result<(), GitHubError> {
        self.record(format!("remove_repository {team} {repository}"));
        let mut state = self.state.lock().unwrap();
        let vanished = state.vanished_repositories.contains(repository);
        let t = state.teams.get_mut(team).ok_or_else(|| missing(team))?;
        t.repositories.remove(repository);
        if vanished {
            return Err(missing(repository));
        }
        Ok(())
    }

    async fn list_child_teams(&self, team: &TeamSlug) -> Result<Vec<Team>, GitHubError> {
        let state = self.state.lock().unwrap();
        if !state.teams.contains_key(team) {
            return Err(missing(team));
        }
        Ok(state
            .teams
            .values()
            .filter(|t| t.team.parent.as_ref() == Some(team))
            .map(|t| t.team.clone())
            .collect())
    }

    async fn create_team(&self, spec: &TeamSpec) -> Result<Team, GitHubError> {
        self.record(format!("create_team {}", spec.name));
        let mut state = self.state.lock().unwrap();
        let parent = match spec.parent_team_id {
            Some(id) => Some(
                state
                    .teams
                    .values()
                    .find(|t| t.team.id == id)
                    .map(|t| t.team.slug.clone())
                    .ok_or_else(|| missing(id))?,
            ),
            None => None,
        };
        state.next_id += 1;
        let team = Team {
            id: TeamId::new(state.next_id),
            slug: slug(&spec.name),
            name: spec.name.clone(),
            description: Some(spec.description.clone()),
            parent,
        };
        state.teams.insert(
            team.slug.clone(),
            FakeTeam {
                team: team.clone(),
                members: BTreeSet::new(),
                repositories: BTreeMap::new(),
            },
        );
        Ok(team)
    }

    async fn update_team(&self, team: &TeamSlug, spec: &TeamSpec) -> Result<Team, GitHubError> {
        self.record(format!("update_team {team}"));
        let mut state = self.state.lock().unwrap();
        let parent = spec.parent_team_id.and_then(|id| {
            state
                .teams
                .values()
                .find(|t| t.team.id == id)
                .map(|t| t.team.slug.clone())
        });
        let t = state.teams.get_mut(team).ok_or_else(|| missing(team))?;
        t.team.name = spec.name.clone();
        t.team.description = Some(spec.description.clone());
        t.team.parent = parent;
        Ok(t.team.clone())
    }

    async fn delete_team(&self, team: &TeamSlug) -> Result<(), GitHubError> {
        self.record(format!("delete_team {team}"));
        let mut state = self.state.lock().unwrap();
        state.teams.remove(team).map(|_| ()).ok_or_else(|| missing(team))
    }
}

#[async_trait]
impl PullRequestManager for FakeGitHub {
    async fn get_pull_request(&self, number: PullRequestNumber) -> Result<PullRequest, GitHubError> {
        let state = self.state.lock().unwrap();
        state
            .pull_requests
            .get(&number.as_u64())
            .cloned()
            .ok_or_else(|| missing(number))
    }

    async fn list_reviews(&self, number: PullRequestNumber) -> Result<Vec<Review>, GitHubError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .reviews
            .get(&number.as_u64())
            .cloned()
            .unwrap_or_default())
    }

    async fn request_team_reviewers(
        &self,
        _number: PullRequestNumber,
        teams: &[TeamSlug],
    ) -> Result<(), GitHubError> {
        let mut state = self.state.lock().unwrap();
        if let Some(unknown) = teams.iter().find(|t| !state.teams.contains_key(*t)) {
            return Err(missing(unknown));
        }
        state.requested_teams.extend(teams.iter().cloned());
        Ok(())
    }

    async fn add_assignees(
        &self,
        _number: PullRequestNumber,
        users: &[Username],
    ) -> Result<(), GitHubError> {
        self.state
            .lock()
            .unwrap()
            .assignee_batches
            .push(users.to_vec());
        Ok(())
    }

    async fn close_pull_request(&self, number: PullRequestNumber) -> Result<(), GitHubError> {
        self.state.lock().unwrap().closed.insert(number.as_u64());
        Ok(())
    }

    async fn create_commit_status(
        &self,
        sha: &CommitSha,
        status: &CommitStatus,
    ) -> Result<(), GitHubError> {
        self.state
            .lock()
            .unwrap()
            .statuses
            .push((sha.clone(), status.clone()));
        Ok(())
    }
}

impl FakeGitHub {
    fn inspect(&self, repository: &RepositoryName) -> Result<FakeRepository, GitHubError> {
        let state = self.state.lock().unwrap();
        let repo = state
            .repositories
            .get(repository.as_str())
            .cloned()
            .ok_or_else(|| missing(repository))?;
        if repo.broken {
            return Err(GitHubError::Api {
                status: 500,
                message: "boom".into(),
            });
        }
        Ok(repo)
    }
}

#[async_trait]
impl RepositoryInspector for FakeGitHub {
    async fn list_repositories(&self) -> Result<Vec<RepositorySummary>, GitHubError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .repositories
            .iter()
            .map(|(name, r)| RepositorySummary {
                name: repo(name),
                full_name: RepositoryId::parse(&format!("acme/{name}")).unwrap(),
                archived: r.archived,
                private: r.private,
                updated_at: None,
            })
            .collect())
    }

    async fn list_directory(
        &self,
        repository: &RepositoryName,
        path: &str,
    ) -> Result<Vec<String>, GitHubError> {
        {
            let mut state = self.state.lock().unwrap();
            state.in_flight += 1;
            state.peak_in_flight = state.peak_in_flight.max(state.in_flight);
        }
        // Let other checks run while this one is "in flight".
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        self.state.lock().unwrap().in_flight -= 1;

        let repo = self.inspect(repository)?;
        match path {
            "" => Ok(repo.root),
            ".github" => repo.dot_github.ok_or_else(|| missing(path)),
            other => Err(missing(other)),
        }
    }

    async fn advanced_security_enabled(&self, repository: &RepositoryName) -> Result<bool, GitHubError> {
        Ok(self.inspect(repository)?.advanced_security)
    }

    async fn vulnerability_alerts_enabled(
        &self,
        repository: &RepositoryName,
    ) -> Result<bool, GitHubError> {
        Ok(self.inspect(repository)?.vulnerability_alerts)
    }

    async fn list_dependabot_alert_severities(
        &self,
        repository: &RepositoryName,
    ) -> Result<Vec<String>, GitHubError> {
        Ok(self.inspect(repository)?.alert_severities)
    }
}

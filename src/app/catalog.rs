use serde::de::DeserializeOwned;
use tracing::error;

use crate::domain::catalog::{Departmental, Freelancer, Mentor, Team, TeamMember};
use crate::infra::api::ApiClient;

/// Records grouped under their department, headings in first-seen order.
pub type Grouped<T> = Vec<(String, Vec<T>)>;

pub fn group_by_department<T: Departmental>(items: Vec<T>) -> Grouped<T> {
    let mut groups: Grouped<T> = Vec::new();
    for item in items {
        match groups
            .iter_mut()
            .find(|(department, _)| department == item.department())
        {
            Some((_, members)) => members.push(item),
            None => groups.push((item.department().to_string(), vec![item])),
        }
    }
    groups
}

/// Read-only directory pages. Fetch failures render as empty lists.
#[derive(Clone)]
pub struct CatalogService {
    api: ApiClient,
}

impl CatalogService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn mentors(&self) -> Vec<Mentor> {
        self.fetch_list("/api/mentors", &[]).await
    }

    pub async fn mentors_by_department(&self) -> Grouped<Mentor> {
        group_by_department(self.mentors().await)
    }

    pub async fn freelancers(&self) -> Vec<Freelancer> {
        self.fetch_list("/api/freelancers", &[]).await
    }

    pub async fn freelancers_by_department(&self) -> Grouped<Freelancer> {
        group_by_department(self.freelancers().await)
    }

    pub async fn team_members(&self, team: Team) -> Vec<TeamMember> {
        self.fetch_list("/api/team-members", &[("team", team.as_str())])
            .await
    }

    async fn fetch_list<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Vec<T> {
        match self.api.get_with_query::<Vec<T>>(path, query).await {
            Ok(envelope) => envelope.data.unwrap_or_default(),
            Err(err) => {
                error!(error = ?err, path, "failed to fetch catalog");
                Vec::new()
            }
        }
    }
}

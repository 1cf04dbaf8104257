use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPerson")]
pub struct Mentor {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub title: String,
    pub department: String,
    pub image: Option<String>,
    pub linkedin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPerson")]
pub struct Freelancer {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub title: String,
    pub department: String,
    pub image: Option<String>,
    pub linkedin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTeamMember")]
pub struct TeamMember {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub designation: String,
    pub linkedin: Option<String>,
    pub team: String,
}

/// Catalog records arrive keyed by `_id`, `id`, or both. `_id` wins.
fn record_id(mongo_id: Option<String>, id: Option<String>) -> Result<String, String> {
    mongo_id
        .or(id)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| "missing field `_id`".to_string())
}

#[derive(Deserialize)]
struct RawPerson {
    #[serde(rename = "_id")]
    mongo_id: Option<String>,
    id: Option<String>,
    name: String,
    title: String,
    department: String,
    image: Option<String>,
    linkedin: Option<String>,
}

impl TryFrom<RawPerson> for Mentor {
    type Error = String;

    fn try_from(raw: RawPerson) -> Result<Self, Self::Error> {
        Ok(Self {
            id: record_id(raw.mongo_id, raw.id)?,
            name: raw.name,
            title: raw.title,
            department: raw.department,
            image: raw.image,
            linkedin: raw.linkedin,
        })
    }
}

impl TryFrom<RawPerson> for Freelancer {
    type Error = String;

    fn try_from(raw: RawPerson) -> Result<Self, Self::Error> {
        Ok(Self {
            id: record_id(raw.mongo_id, raw.id)?,
            name: raw.name,
            title: raw.title,
            department: raw.department,
            image: raw.image,
            linkedin: raw.linkedin,
        })
    }
}

#[derive(Deserialize)]
struct RawTeamMember {
    #[serde(rename = "_id")]
    mongo_id: Option<String>,
    id: Option<String>,
    name: String,
    designation: String,
    linkedin: Option<String>,
    team: String,
}

impl TryFrom<RawTeamMember> for TeamMember {
    type Error = String;

    fn try_from(raw: RawTeamMember) -> Result<Self, Self::Error> {
        Ok(Self {
            id: record_id(raw.mongo_id, raw.id)?,
            name: raw.name,
            designation: raw.designation,
            linkedin: raw.linkedin,
            team: raw.team,
        })
    }
}

/// Teams published under `/api/team-members?team=...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Team {
    BinaryDigital,
    BinaryHub,
    Consultancy,
}

impl Team {
    pub fn as_str(&self) -> &'static str {
        match self {
            Team::BinaryDigital => "binary-digital",
            Team::BinaryHub => "binary-hub",
            Team::Consultancy => "consultancy",
        }
    }
}

/// Records that the catalog pages group under a heading.
pub trait Departmental {
    fn department(&self) -> &str;
}

impl Departmental for Mentor {
    fn department(&self) -> &str {
        &self.department
    }
}

impl Departmental for Freelancer {
    fn department(&self) -> &str {
        &self.department
    }
}

impl Departmental for TeamMember {
    fn department(&self) -> &str {
        &self.team
    }
}

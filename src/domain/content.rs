use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub slug: String,
    pub title: String,
    pub duration: String,
    pub price: String,
    pub summary: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: String,
    pub name: String,
    pub city: String,
    pub address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GalleryCategory {
    Branches,
    Projects,
    Events,
    Team,
    Courses,
}

impl GalleryCategory {
    pub const ALL: [GalleryCategory; 5] = [
        GalleryCategory::Branches,
        GalleryCategory::Projects,
        GalleryCategory::Events,
        GalleryCategory::Team,
        GalleryCategory::Courses,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GalleryCategory::Branches => "Branches",
            GalleryCategory::Projects => "Projects",
            GalleryCategory::Events => "Events",
            GalleryCategory::Team => "Team",
            GalleryCategory::Courses => "Courses",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryItem {
    pub id: String,
    pub image: String,
    pub alt: String,
    pub category: GalleryCategory,
}

/// Gallery tab selection; `All` disables filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GalleryFilter {
    All,
    Category(GalleryCategory),
}

impl FromStr for GalleryFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value == "All" {
            return Ok(GalleryFilter::All);
        }
        GalleryCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == value)
            .map(GalleryFilter::Category)
            .ok_or_else(|| format!("unknown gallery category: {}", value))
    }
}

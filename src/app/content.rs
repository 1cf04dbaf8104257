use anyhow::{anyhow, Result};
use serde::Deserialize;

use crate::domain::content::{Branch, Course, GalleryFilter, GalleryItem};

const SEED: &str = include_str!("../../data/seed.json");

/// Static site content shipped with the crate: course catalog, branches and
/// gallery.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteContent {
    courses: Vec<Course>,
    branches: Vec<Branch>,
    gallery: Vec<GalleryItem>,
}

impl SiteContent {
    pub fn embedded() -> Result<Self> {
        Self::from_json(SEED)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let content: SiteContent =
            serde_json::from_str(raw).map_err(|err| anyhow!("invalid site content: {}", err))?;

        for (index, course) in content.courses.iter().enumerate() {
            if content.courses[..index]
                .iter()
                .any(|other| other.slug == course.slug)
            {
                return Err(anyhow!("duplicate course slug: {}", course.slug));
            }
        }

        Ok(content)
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn course(&self, slug: &str) -> Option<&Course> {
        self.courses.iter().find(|course| course.slug == slug)
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn gallery(&self, filter: GalleryFilter) -> Vec<&GalleryItem> {
        self.gallery
            .iter()
            .filter(|item| match filter {
                GalleryFilter::All => true,
                GalleryFilter::Category(category) => item.category == category,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::GalleryCategory;

    #[test]
    fn embedded_content_parses() {
        let content = SiteContent::embedded().expect("seed parses");
        assert!(!content.courses().is_empty());
        assert!(!content.branches().is_empty());
        assert!(content.course("web-development").is_some());
        assert!(content.course("basket-weaving").is_none());
    }

    #[test]
    fn gallery_filters_by_category() {
        let content = SiteContent::embedded().expect("seed parses");
        let all = content.gallery(GalleryFilter::All);
        let events = content.gallery(GalleryFilter::Category(GalleryCategory::Events));

        assert!(!events.is_empty());
        assert!(events.len() < all.len());
        assert!(events
            .iter()
            .all(|item| item.category == GalleryCategory::Events));
        assert_eq!(
            "Events".parse::<GalleryFilter>(),
            Ok(GalleryFilter::Category(GalleryCategory::Events))
        );
        assert_eq!("All".parse::<GalleryFilter>(), Ok(GalleryFilter::All));
        assert!("Nope".parse::<GalleryFilter>().is_err());
    }

    #[test]
    fn rejects_duplicate_slugs() {
        let raw = r#"{
            "courses": [
                {"slug": "a", "title": "A", "duration": "1w", "price": "0", "summary": ""},
                {"slug": "a", "title": "A again", "duration": "1w", "price": "0", "summary": ""}
            ],
            "branches": [],
            "gallery": []
        }"#;
        assert!(SiteContent::from_json(raw).is_err());
    }
}

//! Read-only course material and team bios. Nothing here is personalized
//! or needs authentication.

use std::path::Path;

use anyhow::Context;
use axum::{
    Json,
    extract::{Path as UrlPath, State},
};
use serde::Deserialize;
use tracing::info;

use envision_types::content::{BlogPost, BlogSection, CatalogEntry, PracticeQuestion, TeamMember};

use crate::auth::AppState;
use crate::error::ApiError;

const UNITS_JSON: &str = include_str!("../data/units.json");
const COURSES_JSON: &str = include_str!("../data/courses.json");
const PRACTICE_JSON: &str = include_str!("../data/practice.json");
const BLOG_JSON: &str = include_str!("../data/blog.json");

#[derive(Debug, Deserialize)]
struct BlogSource {
    title: String,
    description: String,
    author_name: String,
    sections: Vec<BlogSection>,
}

pub struct Catalog {
    units: Vec<CatalogEntry>,
    courses: Vec<CatalogEntry>,
    practice: Vec<PracticeQuestion>,
    blog: BlogSource,
    team: Vec<TeamMember>,
}

impl Catalog {
    /// Built-in material plus team bios read from `team_path`, if given.
    pub fn load(team_path: Option<&Path>) -> anyhow::Result<Self> {
        let team = match team_path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading team bios from {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("parsing team bios in {}", path.display()))?
            }
            None => Vec::new(),
        };
        let catalog = Self::with_team(team)?;
        info!("Catalog loaded ({} team bios)", catalog.team.len());
        Ok(catalog)
    }

    pub fn with_team(team: Vec<TeamMember>) -> anyhow::Result<Self> {
        Ok(Self {
            units: serde_json::from_str(UNITS_JSON).context("embedded units.json")?,
            courses: serde_json::from_str(COURSES_JSON).context("embedded courses.json")?,
            practice: serde_json::from_str(PRACTICE_JSON).context("embedded practice.json")?,
            blog: serde_json::from_str(BLOG_JSON).context("embedded blog.json")?,
            team,
        })
    }

    /// Look a bio up by URL slug: case-insensitive, `-` stands for a space.
    pub fn find_member(&self, slug: &str) -> Option<&TeamMember> {
        let wanted = slug.replace('-', " ").to_lowercase();
        self.team.iter().find(|m| m.name.to_lowercase() == wanted)
    }

    pub fn blog(&self) -> BlogPost {
        BlogPost {
            title: self.blog.title.clone(),
            description: self.blog.description.clone(),
            author: self.find_member(&self.blog.author_name).cloned(),
            sections: self.blog.sections.clone(),
        }
    }
}

pub async fn index() -> &'static str {
    "Workin"
}

pub async fn units(State(state): State<AppState>) -> Json<Vec<CatalogEntry>> {
    Json(state.catalog.units.clone())
}

pub async fn courses(State(state): State<AppState>) -> Json<Vec<CatalogEntry>> {
    Json(state.catalog.courses.clone())
}

pub async fn practice(State(state): State<AppState>) -> Json<Vec<PracticeQuestion>> {
    Json(state.catalog.practice.clone())
}

pub async fn blog(State(state): State<AppState>) -> Json<BlogPost> {
    Json(state.catalog.blog())
}

pub async fn about(State(state): State<AppState>) -> Json<Vec<TeamMember>> {
    Json(state.catalog.team.clone())
}

pub async fn about_member(
    State(state): State<AppState>,
    UrlPath(name): UrlPath<String>,
) -> Result<Json<TeamMember>, ApiError> {
    state
        .catalog
        .find_member(&name)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Could not find user.".into()))
}

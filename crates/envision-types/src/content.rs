//! Static catalog payloads. None of these are personalized or stored.

use serde::{Deserialize, Serialize};

/// A named entry with an SF Symbol icon, used for units, courses and
/// the "likes" strip on a team bio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeQuestion {
    pub question: String,
    pub explanation: String,
    pub incorrect: Vec<String>,
    pub correct: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactLine {
    pub icon: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: String,
    pub position: String,
    pub description: String,
    #[serde(default)]
    pub likes: Vec<CatalogEntry>,
    #[serde(default)]
    pub info: Vec<ContactLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogSection {
    pub header: String,
    pub paragraphs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    pub title: String,
    pub description: String,
    pub author: Option<TeamMember>,
    pub sections: Vec<BlogSection>,
}

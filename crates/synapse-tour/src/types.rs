//! Tour definitions.

use serde::{Deserialize, Serialize};

/// Where the tooltip sits relative to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
    Center,
}

/// Manual pixel adjustment applied after anchoring.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

impl Offset {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One tip of a tour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelpStep {
    pub id: String,
    pub title: String,
    pub content: String,
    /// CSS-style selector of the element to anchor to. `None` centers the tip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default)]
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<Offset>,
}

impl HelpStep {
    /// A step without a target. The overlay centers it in the viewport.
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            target: None,
            position: Position::default(),
            offset: None,
        }
    }

    pub fn anchored(mut self, target: impl Into<String>, position: Position) -> Self {
        self.target = Some(target.into());
        self.position = position;
        self
    }

    pub fn with_offset(mut self, x: f64, y: f64) -> Self {
        self.offset = Some(Offset::new(x, y));
        self
    }
}

/// A page's tour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelpConfig {
    #[serde(alias = "pageId")]
    pub page_id: String,
    pub title: String,
    #[serde(default)]
    pub steps: Vec<HelpStep>,
}

impl HelpConfig {
    pub fn new(page_id: impl Into<String>, title: impl Into<String>, steps: Vec<HelpStep>) -> Self {
        Self {
            page_id: page_id.into(),
            title: title.into(),
            steps,
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

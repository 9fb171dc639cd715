//! Catalog records: categories and products.

use serde::{Deserialize, Serialize};

/// A named grouping of products. Identity is the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    /// Path segment used to request this category's products, when it differs from the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: None,
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    /// Segment appended to the product endpoint for this category.
    pub fn path_segment(&self) -> &str {
        self.slug.as_deref().unwrap_or(&self.name)
    }
}

/// A catalog item. Identity is `id`, unique within one category fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub title: String,
    pub price: f64,
    #[serde(default)]
    pub category: String,
}

impl Product {
    pub fn new(id: i64, title: impl Into<String>, price: f64) -> Self {
        Self {
            id,
            name: String::new(),
            title: title.into(),
            price,
            category: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Name shown in the report detail list; the catalog often leaves `name` empty.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.title
        } else {
            &self.name
        }
    }
}

#![allow(dead_code)]

use pricedash::{App, AppEvent, CatalogSource, Category, FetchError, Product};
use std::collections::HashMap;
use std::sync::mpsc::Receiver;
use std::sync::Mutex;
use std::time::Duration;

/// In-memory catalog. Categories without an entry in `products` fail with HTTP 404.
#[derive(Default)]
pub struct FakeCatalog {
    pub categories: Option<Vec<Category>>,
    pub products: HashMap<String, Vec<Product>>,
    pub requested: Mutex<Vec<String>>,
}

impl FakeCatalog {
    /// smartphones (iPhone 999, Galaxy 899) and laptops (MacBook Pro 1749)
    pub fn phones_and_laptops() -> Self {
        let mut products = HashMap::new();
        products.insert(
            "smartphones".to_string(),
            vec![
                Product::new(1, "iPhone", 999.0).with_category("smartphones"),
                Product::new(2, "Galaxy", 899.0).with_category("smartphones"),
            ],
        );
        products.insert(
            "laptops".to_string(),
            vec![Product::new(7, "MacBook Pro", 1749.0).with_category("laptops")],
        );
        Self {
            categories: Some(vec![
                Category::new("smartphones"),
                Category::new("laptops"),
                Category::new("fragrances"),
            ]),
            products,
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable() -> Self {
        Self::default()
    }
}

impl CatalogSource for FakeCatalog {
    fn categories(&self) -> Result<Vec<Category>, FetchError> {
        self.categories.clone().ok_or_else(|| FetchError::Transport {
            url: "fake://products/categories".to_string(),
            message: "connection refused".to_string(),
        })
    }

    fn products(&self, category: &Category) -> Result<Vec<Product>, FetchError> {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(category.name.clone());
        }
        self.products
            .get(category.path_segment())
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: format!("fake://products/category/{}", category.path_segment()),
                status: 404,
            })
    }
}

/// Handle `event` and every follow-up event it returns.
pub fn dispatch(app: &mut App, event: AppEvent) {
    let mut next = app.event(&event);
    while let Some(event) = next.take() {
        next = app.event(&event);
    }
}

/// Dispatch `first`, then drain worker responses until the channel is quiet.
pub fn pump(app: &mut App, rx: &Receiver<AppEvent>, first: AppEvent) {
    dispatch(app, first);
    while let Ok(event) = rx.recv_timeout(Duration::from_millis(200)) {
        dispatch(app, event);
    }
}

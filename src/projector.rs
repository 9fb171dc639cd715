//! Projects the category list or the filtered products into declarative chart options.

use serde::Serialize;

use crate::model::{Category, Product};
use crate::selection::ChartMode;

/// Value given to every category slice. The category list carries no metric of its own.
pub const CATEGORY_PLACEHOLDER_VALUE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Column,
    Pie,
}

/// How data points are labelled by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataLabels {
    /// Print each point's value.
    Value,
    /// Label slice `i` with `x_axis.categories[i]`.
    SliceCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XAxis {
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YAxis {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub kind: ChartKind,
    pub data: Vec<f64>,
}

/// Everything the chart renderer needs. `x_axis.categories[i]` pairs with `series.data[i]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartOptions {
    pub chart: ChartKind,
    pub title: String,
    pub x_axis: XAxis,
    pub y_axis: YAxis,
    pub series: Series,
    pub data_labels: DataLabels,
}

impl ChartOptions {
    /// Pie label formatter: the x-axis category at the slice index.
    pub fn slice_label(&self, index: usize) -> Option<&str> {
        self.x_axis.categories.get(index).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.series.data.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Input to the projector, tagged by what is being charted.
#[derive(Debug, Clone, Copy)]
pub enum ChartData<'a> {
    Categories(&'a [Category]),
    Products(&'a [Product]),
}

impl<'a> ChartData<'a> {
    pub fn select(mode: ChartMode, categories: &'a [Category], filtered: &'a [Product]) -> Self {
        match mode {
            ChartMode::Category => ChartData::Categories(categories),
            ChartMode::Product => ChartData::Products(filtered),
        }
    }
}

pub fn project(mode: ChartMode, categories: &[Category], filtered: &[Product]) -> ChartOptions {
    project_data(ChartData::select(mode, categories, filtered))
}

pub fn project_data(data: ChartData<'_>) -> ChartOptions {
    match data {
        ChartData::Categories(categories) => ChartOptions {
            chart: ChartKind::Pie,
            title: "Category".to_string(),
            x_axis: XAxis {
                categories: categories.iter().map(|c| c.name.clone()).collect(),
            },
            y_axis: YAxis {
                title: "All category".to_string(),
            },
            series: Series {
                name: "Categories".to_string(),
                kind: ChartKind::Pie,
                data: vec![CATEGORY_PLACEHOLDER_VALUE; categories.len()],
            },
            data_labels: DataLabels::SliceCategory,
        },
        ChartData::Products(products) => ChartOptions {
            chart: ChartKind::Column,
            title: "Products in selected category".to_string(),
            x_axis: XAxis {
                categories: products.iter().map(|p| p.title.clone()).collect(),
            },
            y_axis: YAxis {
                title: "Price".to_string(),
            },
            series: Series {
                name: "Price".to_string(),
                kind: ChartKind::Column,
                data: products.iter().map(|p| p.price).collect(),
            },
            data_labels: DataLabels::Value,
        },
    }
}

//! Selection state: the chosen category, the picked product ids, and the committed report.
//!
//! `Selection` is owned by the [`App`](crate::App) and is the only place filter state lives.
//! It performs no I/O. Choosing a category returns the category whose products should be
//! fetched, and the caller reports the outcome back through [`Selection::products_loaded`]
//! or [`Selection::products_failed`].
//!
//! Lifecycle:
//! - choosing a category (or none) discards the product list, picked ids and any report
//! - toggles only edit the picked ids and mark the selection dirty
//! - `run_report` is the only operation that recomputes the filtered products

use std::collections::BTreeSet;
use std::sync::mpsc::{channel, Receiver, Sender};

use thiserror::Error;
use tracing::{debug, info};

use crate::model::Product;

/// Which projection feeds the chart.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ChartMode {
    /// All categories, drawn as a pie.
    #[default]
    Category,
    /// The filtered products of the last report, drawn as columns.
    Product,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No category chosen.
    Idle,
    /// Category chosen, products loading or loaded, report not run.
    CategoryChosen,
    /// A report has been produced and is displayed.
    ReportRunning,
}

/// Notification sent to subscribers after each state change.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    CategoryChosen(Option<String>),
    ProductsLoaded { category: String, count: usize },
    ProductsFailed { category: String },
    ProductToggled { id: i64, selected: bool },
    ReportRun { count: usize },
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("run report is disabled (dirty: {dirty}, running: {running})")]
pub struct ReportBlocked {
    pub dirty: bool,
    pub running: bool,
}

#[derive(Debug, Default)]
pub struct Selection {
    category: Option<String>,
    products: Vec<Product>,
    product_ids: BTreeSet<i64>,
    filtered: Vec<Product>,
    mode: ChartMode,
    dirty: bool,
    running: bool,
    pending_fetches: usize,
    observers: Vec<Sender<Transition>>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. It receives every transition made after this call.
    pub fn subscribe(&mut self) -> Receiver<Transition> {
        let (tx, rx) = channel();
        self.observers.push(tx);
        rx
    }

    fn notify(&mut self, transition: Transition) {
        self.observers
            .retain(|observer| observer.send(transition.clone()).is_ok());
    }

    /// Choose a category (or none). Returns the category whose products must be fetched.
    ///
    /// Picked ids, the product list and any report are discarded regardless of what the
    /// fetch later returns.
    pub fn choose_category(&mut self, category: Option<String>) -> Option<String> {
        info!(category = category.as_deref().unwrap_or("<none>"), "category chosen");
        self.category = category.clone();
        self.products.clear();
        self.product_ids.clear();
        self.filtered.clear();
        self.mode = ChartMode::Category;
        self.running = false;
        self.dirty = false;
        if category.is_some() {
            self.pending_fetches += 1;
        }
        self.notify(Transition::CategoryChosen(category.clone()));
        category
    }

    /// Apply a product response. The latest arrival wins, whichever category it was for.
    pub fn products_loaded(&mut self, category: &str, products: Vec<Product>) {
        self.pending_fetches = self.pending_fetches.saturating_sub(1);
        if self.category.is_none() {
            debug!(category, "dropping products that arrived after the category was cleared");
            return;
        }
        let count = products.len();
        self.products = products;
        self.notify(Transition::ProductsLoaded {
            category: category.to_string(),
            count,
        });
    }

    /// A product fetch failed. Only a failure for the chosen category empties the lists;
    /// a late failure for an earlier choice leaves what has loaded since.
    pub fn products_failed(&mut self, category: &str) {
        self.pending_fetches = self.pending_fetches.saturating_sub(1);
        if self.category.as_deref() == Some(category) {
            self.products.clear();
            self.filtered.clear();
        } else {
            debug!(category, "ignoring failure for a category that is no longer chosen");
        }
        self.notify(Transition::ProductsFailed {
            category: category.to_string(),
        });
    }

    /// Flip whether `id` is picked. Does nothing when no category is chosen.
    pub fn toggle_product(&mut self, id: i64) -> bool {
        if self.category.is_none() {
            return false;
        }
        let selected = if self.product_ids.remove(&id) {
            false
        } else {
            self.product_ids.insert(id);
            true
        };
        // Edge-triggered: a toggle that nets back to the previous set still marks dirty.
        self.dirty = true;
        self.notify(Transition::ProductToggled { id, selected });
        true
    }

    pub fn can_run_report(&self) -> bool {
        self.dirty && !self.running
    }

    /// Commit the picked ids: filtered = products whose id is picked, in product-list order.
    pub fn run_report(&mut self) -> Result<&[Product], ReportBlocked> {
        if !self.can_run_report() {
            return Err(ReportBlocked {
                dirty: self.dirty,
                running: self.running,
            });
        }
        self.filtered = self
            .products
            .iter()
            .filter(|p| self.product_ids.contains(&p.id))
            .cloned()
            .collect();
        self.mode = ChartMode::Product;
        self.running = true;
        self.dirty = false;
        let count = self.filtered.len();
        info!(count, "report run");
        self.notify(Transition::ReportRun { count });
        Ok(&self.filtered)
    }

    /// Back to `Idle`: no category, nothing picked, category chart.
    pub fn clear_filters(&mut self) {
        info!("filters cleared");
        self.category = None;
        self.products.clear();
        self.product_ids.clear();
        self.filtered.clear();
        self.mode = ChartMode::Category;
        self.running = false;
        self.dirty = false;
        self.notify(Transition::Cleared);
    }

    pub fn phase(&self) -> Phase {
        if self.running {
            Phase::ReportRunning
        } else if self.category.is_some() {
            Phase::CategoryChosen
        } else {
            Phase::Idle
        }
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn product_ids(&self) -> &BTreeSet<i64> {
        &self.product_ids
    }

    pub fn is_selected(&self, id: i64) -> bool {
        self.product_ids.contains(&id)
    }

    pub fn filtered(&self) -> &[Product] {
        &self.filtered
    }

    pub fn mode(&self) -> ChartMode {
        self.mode
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_loading_products(&self) -> bool {
        self.pending_fetches > 0
    }

    /// Comma-separated titles of picked products; ids with no loaded product are skipped.
    pub fn selected_titles(&self) -> String {
        self.products
            .iter()
            .filter(|p| self.product_ids.contains(&p.id))
            .map(|p| p.title.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phones() -> Vec<Product> {
        vec![
            Product::new(1, "iPhone", 999.0),
            Product::new(2, "Galaxy", 899.0),
            Product::new(3, "Pixel", 799.0),
        ]
    }

    fn loaded() -> Selection {
        let mut s = Selection::new();
        s.choose_category(Some("smartphones".to_string()));
        s.products_loaded("smartphones", phones());
        s
    }

    #[test]
    fn test_starts_idle() {
        let s = Selection::new();
        assert_eq!(s.phase(), Phase::Idle);
        assert_eq!(s.mode(), ChartMode::Category);
        assert!(!s.can_run_report());
        assert!(!s.is_loading_products());
    }

    #[test]
    fn test_choose_category_requests_fetch() {
        let mut s = Selection::new();
        let fetch = s.choose_category(Some("laptops".to_string()));
        assert_eq!(fetch.as_deref(), Some("laptops"));
        assert_eq!(s.phase(), Phase::CategoryChosen);
        assert!(s.is_loading_products());
        s.products_loaded("laptops", vec![]);
        assert!(!s.is_loading_products());
    }

    #[test]
    fn test_choose_none_requests_nothing() {
        let mut s = loaded();
        assert_eq!(s.choose_category(None), None);
        assert_eq!(s.phase(), Phase::Idle);
        assert!(s.products().is_empty());
    }

    #[test]
    fn test_toggle_without_category_is_ignored() {
        let mut s = Selection::new();
        assert!(!s.toggle_product(1));
        assert!(s.product_ids().is_empty());
        assert!(!s.is_dirty());
    }

    #[test]
    fn test_run_report_preserves_product_order() {
        let mut s = loaded();
        s.toggle_product(3);
        s.toggle_product(1);
        let ids: Vec<i64> = s.run_report().unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(s.mode(), ChartMode::Product);
        assert_eq!(s.phase(), Phase::ReportRunning);
        assert!(!s.is_dirty());
    }

    #[test]
    fn test_run_report_blocked_while_running() {
        let mut s = loaded();
        s.toggle_product(1);
        s.run_report().unwrap();
        s.toggle_product(2);
        assert!(s.is_dirty());
        let err = s.run_report().unwrap_err();
        assert_eq!(
            err,
            ReportBlocked {
                dirty: true,
                running: true
            }
        );
        assert_eq!(s.filtered().len(), 1);
    }

    #[test]
    fn test_filtered_not_live() {
        let mut s = loaded();
        s.toggle_product(2);
        assert!(s.filtered().is_empty());
    }

    #[test]
    fn test_category_change_resets_report() {
        let mut s = loaded();
        s.toggle_product(2);
        s.run_report().unwrap();
        s.choose_category(Some("laptops".to_string()));
        assert!(s.product_ids().is_empty());
        assert!(s.filtered().is_empty());
        assert!(!s.is_running());
        assert_eq!(s.mode(), ChartMode::Category);
        assert_eq!(s.phase(), Phase::CategoryChosen);
    }

    #[test]
    fn test_failed_fetch_empties_products() {
        let mut s = loaded();
        s.choose_category(Some("laptops".to_string()));
        s.products_failed("laptops");
        assert!(s.products().is_empty());
        assert!(s.filtered().is_empty());
        assert!(s.product_ids().is_empty());
        assert!(!s.is_loading_products());
    }

    #[test]
    fn test_last_arrival_wins() {
        let mut s = Selection::new();
        s.choose_category(Some("smartphones".to_string()));
        s.choose_category(Some("laptops".to_string()));
        assert!(s.is_loading_products());
        s.products_loaded("laptops", vec![Product::new(7, "MacBook", 1999.0)]);
        assert!(s.is_loading_products());
        s.products_loaded("smartphones", phones());
        assert!(!s.is_loading_products());
        assert_eq!(s.products().len(), 3);
        assert_eq!(s.category(), Some("laptops"));
    }

    #[test]
    fn test_late_failure_keeps_chosen_category_products() {
        let mut s = Selection::new();
        s.choose_category(Some("smartphones".to_string()));
        s.choose_category(Some("laptops".to_string()));
        s.products_loaded("laptops", vec![Product::new(7, "MacBook", 1999.0)]);
        s.products_failed("smartphones");
        assert_eq!(s.category(), Some("laptops"));
        assert_eq!(s.products().len(), 1);
        assert!(!s.is_loading_products());
    }

    #[test]
    fn test_arrival_after_clear_is_dropped() {
        let mut s = Selection::new();
        s.choose_category(Some("smartphones".to_string()));
        s.clear_filters();
        s.products_loaded("smartphones", phones());
        assert!(s.products().is_empty());
        assert!(!s.is_loading_products());
    }

    #[test]
    fn test_selected_titles_skips_unknown_ids() {
        let mut s = loaded();
        s.toggle_product(3);
        s.toggle_product(42);
        s.toggle_product(1);
        assert_eq!(s.selected_titles(), "iPhone, Pixel");
    }

    #[test]
    fn test_observers_receive_transitions() {
        let mut s = Selection::new();
        let rx = s.subscribe();
        s.choose_category(Some("smartphones".to_string()));
        s.products_loaded("smartphones", phones());
        s.toggle_product(2);
        s.run_report().unwrap();
        s.clear_filters();
        let seen: Vec<Transition> = rx.try_iter().collect();
        assert_eq!(
            seen,
            vec![
                Transition::CategoryChosen(Some("smartphones".to_string())),
                Transition::ProductsLoaded {
                    category: "smartphones".to_string(),
                    count: 3
                },
                Transition::ProductToggled {
                    id: 2,
                    selected: true
                },
                Transition::ReportRun { count: 1 },
                Transition::Cleared,
            ]
        );
    }

    #[test]
    fn test_dropped_observer_is_pruned() {
        let mut s = Selection::new();
        drop(s.subscribe());
        let rx = s.subscribe();
        s.clear_filters();
        assert_eq!(s.observers.len(), 1);
        assert_eq!(rx.try_recv().unwrap(), Transition::Cleared);
    }
}

use pricedash::{ChartMode, Product, Selection};
use proptest::prelude::*;
use std::collections::HashMap;

fn catalog(n: i64) -> Vec<Product> {
    (0..n)
        .map(|id| Product::new(id, format!("product-{id}"), id as f64 * 10.0))
        .collect()
}

proptest! {
    #[test]
    fn filtered_is_odd_toggled_subset_in_list_order(
        toggles in prop::collection::vec(0i64..12, 1..40),
    ) {
        let products = catalog(10);
        let mut s = Selection::new();
        s.choose_category(Some("c".to_string()));
        s.products_loaded("c", products.clone());
        for id in &toggles {
            s.toggle_product(*id);
        }
        s.run_report().unwrap();

        let mut counts: HashMap<i64, usize> = HashMap::new();
        for id in &toggles {
            *counts.entry(*id).or_default() += 1;
        }
        let expected: Vec<i64> = products
            .iter()
            .map(|p| p.id)
            .filter(|id| counts.get(id).copied().unwrap_or(0) % 2 == 1)
            .collect();
        let actual: Vec<i64> = s.filtered().iter().map(|p| p.id).collect();
        prop_assert_eq!(actual, expected);
        prop_assert_eq!(s.mode(), ChartMode::Product);
    }

    #[test]
    fn category_change_always_resets(
        toggles in prop::collection::vec(0i64..10, 0..20),
        run in any::<bool>(),
    ) {
        let mut s = Selection::new();
        s.choose_category(Some("a".to_string()));
        s.products_loaded("a", catalog(10));
        for id in &toggles {
            s.toggle_product(*id);
        }
        if run {
            let _ = s.run_report();
        }
        s.choose_category(Some("b".to_string()));
        prop_assert!(s.product_ids().is_empty());
        prop_assert!(s.filtered().is_empty());
        prop_assert!(!s.can_run_report());
    }
}

#[test]
fn run_report_needs_a_toggle_since_last_run_or_clear() {
    let mut s = Selection::new();
    s.choose_category(Some("a".to_string()));
    s.products_loaded("a", catalog(3));
    assert!(s.run_report().is_err());

    s.toggle_product(1);
    assert!(s.run_report().is_ok());
    assert!(s.run_report().is_err());

    s.clear_filters();
    assert!(s.run_report().is_err());
}

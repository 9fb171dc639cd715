use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info, warn};

use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::widgets::{ListState, Paragraph, Widget};
use ratatui::{buffer::Buffer, layout::Rect};

pub mod catalog;
pub mod cli;
pub mod config;
pub mod logging;
pub mod model;
pub mod projector;
pub mod selection;
pub mod widgets;

pub use catalog::{CatalogSource, FetchError, HttpCatalog};
pub use cli::Args;
pub use config::{AppConfig, ColorParser, ConfigManager, Theme};
pub use model::{Category, Product};
pub use projector::{project, ChartKind, ChartOptions};
pub use selection::{ChartMode, Phase, Selection, Transition};

use catalog::guarded;
use widgets::chart::{ChartView, ReportDetails};
use widgets::controls::Controls;
use widgets::debug::DebugState;
use widgets::picker;

/// Application name used for config, cache and log paths
pub const APP_NAME: &str = "pricedash";

const SIDEBAR_WIDTH: u16 = 36;
const MAX_DETAIL_ROWS: u16 = 10;

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize(u16, u16),
    FetchCategories,
    CategoriesFetched(Result<Vec<Category>, FetchError>),
    ChooseCategory(Option<usize>),
    FetchProducts(Category),
    ProductsFetched {
        category: Category,
        result: Result<Vec<Product>, FetchError>,
    },
    ToggleProduct(i64),
    RunReport,
    ClearFilters,
    Exit,
    Crash(String),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Categories,
    Products,
}

pub struct App {
    events: Sender<AppEvent>,
    catalog: Arc<dyn CatalogSource>,
    categories: Vec<Category>,
    loading_categories: bool,
    selection: Selection,
    transitions: Receiver<Transition>,
    chart: ChartOptions,
    chart_mode: ChartMode,
    focus: Focus,
    category_list: ListState,
    product_list: ListState,
    theme: Theme,
    debug: DebugState,
    throbber_frame: u8,
}

impl App {
    pub fn new(events: Sender<AppEvent>, catalog: Arc<dyn CatalogSource>, theme: Theme) -> Self {
        let mut selection = Selection::new();
        let transitions = selection.subscribe();
        let chart_mode = selection.mode();
        Self {
            events,
            catalog,
            categories: Vec::new(),
            loading_categories: false,
            chart: project(chart_mode, &[], &[]),
            chart_mode,
            selection,
            transitions,
            focus: Focus::default(),
            category_list: ListState::default(),
            product_list: ListState::default(),
            theme,
            debug: DebugState::default(),
            throbber_frame: 0,
        }
    }

    pub fn enable_debug(&mut self) {
        self.debug.enabled = true;
    }

    pub fn send_event(&mut self, event: AppEvent) -> color_eyre::Result<()> {
        self.events.send(event)?;
        Ok(())
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The options currently handed to the chart renderer.
    pub fn chart(&self) -> &ChartOptions {
        &self.chart
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn is_loading_categories(&self) -> bool {
        self.loading_categories
    }

    /// True while any catalog call is in flight.
    pub fn is_busy(&self) -> bool {
        self.loading_categories || self.selection.is_loading_products()
    }

    /// Advance the loading spinner.
    pub fn tick(&mut self) {
        self.throbber_frame = self.throbber_frame.wrapping_add(1);
    }

    fn spawn_fetch_categories(&self) {
        let catalog = Arc::clone(&self.catalog);
        let events = self.events.clone();
        thread::spawn(move || {
            let result = guarded(|| catalog.categories());
            if events.send(AppEvent::CategoriesFetched(result)).is_err() {
                debug!("category response arrived after shutdown");
            }
        });
    }

    fn spawn_fetch_products(&self, category: Category) {
        let catalog = Arc::clone(&self.catalog);
        let events = self.events.clone();
        thread::spawn(move || {
            let result = guarded(|| catalog.products(&category));
            if events
                .send(AppEvent::ProductsFetched { category, result })
                .is_err()
            {
                debug!("product response arrived after shutdown");
            }
        });
    }

    /// Re-project only when a report is run or the chart mode flips.
    fn sync_chart(&mut self) {
        let report_run = self
            .transitions
            .try_iter()
            .fold(false, |acc, t| acc || matches!(t, Transition::ReportRun { .. }));
        if report_run || self.selection.mode() != self.chart_mode {
            self.reproject();
        }
    }

    fn reproject(&mut self) {
        self.chart_mode = self.selection.mode();
        self.chart = project(
            self.chart_mode,
            &self.categories,
            self.selection.filtered(),
        );
        debug!(mode = ?self.chart_mode, points = self.chart.series.data.len(), "chart projected");
        if tracing::enabled!(tracing::Level::TRACE) {
            match self.chart.to_json() {
                Ok(json) => tracing::trace!(options = %json, "chart options"),
                Err(e) => warn!("failed to serialise chart options: {e}"),
            }
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let (state, len) = match self.focus {
            Focus::Categories => (&mut self.category_list, self.categories.len()),
            Focus::Products => (&mut self.product_list, self.selection.products().len()),
        };
        if len == 0 {
            state.select(None);
            return;
        }
        let current = state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, len as isize - 1) as usize;
        state.select(Some(next));
    }

    fn key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        if event.kind != KeyEventKind::Press {
            return None;
        }
        self.debug.on_key(event);

        let quit = matches!(event.code, KeyCode::Char('q'))
            || (event.code == KeyCode::Char('c') && event.modifiers.contains(KeyModifiers::CONTROL));
        if quit {
            return Some(AppEvent::Exit);
        }
        // Controls are hidden while the category list loads.
        if self.loading_categories {
            return None;
        }

        match event.code {
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    Focus::Categories => Focus::Products,
                    Focus::Products => Focus::Categories,
                };
                self.debug.last_action = "focus".to_string();
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_cursor(-1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_cursor(1);
                None
            }
            KeyCode::Enter if self.focus == Focus::Categories => {
                self.category_list
                    .selected()
                    .or(if self.categories.is_empty() { None } else { Some(0) })
                    .map(|i| AppEvent::ChooseCategory(Some(i)))
            }
            KeyCode::Esc => Some(AppEvent::ChooseCategory(None)),
            KeyCode::Char(' ') if self.focus == Focus::Products => {
                if self.selection.is_loading_products() {
                    return None;
                }
                let index = self.product_list.selected()?;
                self.selection
                    .products()
                    .get(index)
                    .map(|p| AppEvent::ToggleProduct(p.id))
            }
            // Run Report is only dispatched while enabled.
            KeyCode::Char('r') if self.selection.can_run_report() => Some(AppEvent::RunReport),
            KeyCode::Char('c') => Some(AppEvent::ClearFilters),
            _ => None,
        }
    }

    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        self.debug.num_events += 1;
        let next = match event {
            AppEvent::Key(key) => self.key(key),
            AppEvent::FetchCategories => {
                self.loading_categories = true;
                self.spawn_fetch_categories();
                None
            }
            AppEvent::CategoriesFetched(result) => {
                match result {
                    Ok(categories) => {
                        info!(count = categories.len(), "categories loaded");
                        self.categories = categories.clone();
                    }
                    Err(e) => {
                        error!(error = %e, "error fetching categories");
                        self.categories.clear();
                    }
                }
                self.loading_categories = false;
                self.category_list
                    .select(if self.categories.is_empty() { None } else { Some(0) });
                self.reproject();
                None
            }
            AppEvent::ChooseCategory(index) => {
                self.debug.last_action = "choose_category".to_string();
                let chosen = (*index).and_then(|i| self.categories.get(i)).cloned();
                self.selection
                    .choose_category(chosen.as_ref().map(|c| c.name.clone()));
                self.product_list.select(None);
                chosen.map(|category| {
                    self.focus = Focus::Products;
                    AppEvent::FetchProducts(category)
                })
            }
            AppEvent::FetchProducts(category) => {
                self.spawn_fetch_products(category.clone());
                None
            }
            AppEvent::ProductsFetched { category, result } => {
                match result {
                    Ok(products) => {
                        info!(category = %category.name, count = products.len(), "products loaded");
                        if self.selection.category() != Some(category.name.as_str()) {
                            warn!(
                                category = %category.name,
                                current = self.selection.category().unwrap_or("<none>"),
                                "products arrived for a category that is no longer chosen"
                            );
                        }
                        self.selection
                            .products_loaded(&category.name, products.clone());
                    }
                    Err(e) => {
                        error!(category = %category.name, error = %e, "error fetching products");
                        self.selection.products_failed(&category.name);
                    }
                }
                self.product_list
                    .select(if self.selection.products().is_empty() { None } else { Some(0) });
                None
            }
            AppEvent::ToggleProduct(id) => {
                self.debug.last_action = "toggle_product".to_string();
                self.selection.toggle_product(*id);
                None
            }
            AppEvent::RunReport => {
                self.debug.last_action = "run_report".to_string();
                if let Err(e) = self.selection.run_report() {
                    warn!(error = %e, "run report ignored");
                }
                None
            }
            AppEvent::ClearFilters => {
                self.debug.last_action = "clear_filters".to_string();
                self.selection.clear_filters();
                self.product_list.select(None);
                self.focus = Focus::Categories;
                None
            }
            AppEvent::Resize(_, _) | AppEvent::Exit | AppEvent::Crash(_) => None,
        };
        self.sync_chart();
        next
    }

    fn render_body(&mut self, area: Rect, buf: &mut Buffer) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Fill(1)])
            .split(area);

        let sidebar = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(40),
                Constraint::Fill(1),
                Constraint::Length(3),
            ])
            .split(columns[0]);

        picker::render_category_list(
            sidebar[0],
            buf,
            &self.categories,
            self.selection.category(),
            &mut self.category_list,
            self.focus == Focus::Categories,
            &self.theme,
        );
        picker::render_product_list(
            sidebar[1],
            buf,
            &self.selection,
            &mut self.product_list,
            self.focus == Focus::Products,
            &self.theme,
        );
        picker::render_selection_summary(sidebar[2], buf, &self.selection, &self.theme);

        let main = columns[1];
        if self.chart_mode == ChartMode::Product {
            let detail_rows = u16::try_from(self.selection.filtered().len())
                .unwrap_or(u16::MAX)
                .saturating_add(1)
                .min(MAX_DETAIL_ROWS);
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Fill(1), Constraint::Length(detail_rows)])
                .split(main);
            ChartView::new(&self.chart, &self.theme).render(rows[0], buf);
            ReportDetails::new(self.selection.filtered(), &self.theme).render(rows[1], buf);
        } else {
            ChartView::new(&self.chart, &self.theme).render(main, buf);
        }
    }
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "Idle",
        Phase::CategoryChosen => "Category chosen",
        Phase::ReportRunning => "Report",
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.debug.num_frames += 1;
        self.debug.phase = phase_label(self.selection.phase()).to_string();

        let mut constraints = vec![
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ];
        if self.debug.enabled {
            constraints.push(Constraint::Length(1));
        }
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        Paragraph::new(" Product Filter Dashboard")
            .style(
                Style::default()
                    .fg(self.theme.get("text_primary"))
                    .bg(self.theme.get("controls_bg")),
            )
            .render(layout[0], buf);

        if self.loading_categories {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Fill(1),
                    Constraint::Length(1),
                    Constraint::Fill(1),
                ])
                .split(layout[1]);
            Paragraph::new("Loading…")
                .style(Style::default().fg(self.theme.get("primary")))
                .alignment(Alignment::Center)
                .render(rows[1], buf);
        } else {
            self.render_body(layout[1], buf);
        }

        let controls = Controls::dashboard(self.selection.can_run_report())
            .with_status(phase_label(self.selection.phase()))
            .with_busy(self.is_busy(), self.throbber_frame)
            .with_colors(
                self.theme.get("controls_bg"),
                self.theme.get("primary"),
                self.theme.get("text_primary"),
                self.theme.get("dimmed"),
            );
        controls.render(layout[2], buf);

        if self.debug.enabled {
            (&self.debug).render(layout[3], buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;
    use std::time::Duration;

    struct StaticCatalog;

    impl CatalogSource for StaticCatalog {
        fn categories(&self) -> Result<Vec<Category>, FetchError> {
            Ok(vec![Category::new("smartphones"), Category::new("laptops")])
        }

        fn products(&self, _category: &Category) -> Result<Vec<Product>, FetchError> {
            Ok(vec![
                Product::new(1, "iPhone", 999.0),
                Product::new(2, "Galaxy", 899.0),
            ])
        }
    }

    struct PanickingCatalog;

    impl CatalogSource for PanickingCatalog {
        fn categories(&self) -> Result<Vec<Category>, FetchError> {
            panic!("catalog exploded")
        }

        fn products(&self, _category: &Category) -> Result<Vec<Product>, FetchError> {
            panic!("catalog exploded")
        }
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    /// Handle `event` and every follow-up event it returns.
    fn dispatch(app: &mut App, event: AppEvent) {
        let mut next = app.event(&event);
        while let Some(event) = next.take() {
            next = app.event(&event);
        }
    }

    /// Dispatch `first`, then drain responses from fetch workers.
    fn pump(app: &mut App, rx: &Receiver<AppEvent>, first: AppEvent) {
        dispatch(app, first);
        while let Ok(event) = rx.recv_timeout(Duration::from_millis(200)) {
            dispatch(app, event);
        }
    }

    fn app() -> (App, Receiver<AppEvent>) {
        let (tx, rx) = channel();
        let app = App::new(tx, Arc::new(StaticCatalog), Theme::default());
        (app, rx)
    }

    #[test]
    fn test_run_report_key_blocked_until_dirty() {
        let (mut app, rx) = app();
        pump(&mut app, &rx, AppEvent::FetchCategories);
        pump(&mut app, &rx, key(KeyCode::Enter));
        assert_eq!(app.selection().products().len(), 2);
        assert!(app.event(&key(KeyCode::Char('r'))).is_none());

        dispatch(&mut app, key(KeyCode::Char(' ')));
        assert!(app.selection().is_selected(1));
        assert!(matches!(
            app.event(&key(KeyCode::Char('r'))),
            Some(AppEvent::RunReport)
        ));
    }

    #[test]
    fn test_panicking_source_still_clears_loading() {
        let (tx, rx) = channel();
        let mut app = App::new(tx, Arc::new(PanickingCatalog), Theme::default());
        pump(&mut app, &rx, AppEvent::FetchCategories);
        assert!(!app.is_loading_categories());
        assert!(app.categories().is_empty());

        app.categories = vec![Category::new("smartphones")];
        pump(&mut app, &rx, AppEvent::ChooseCategory(Some(0)));
        assert_eq!(app.selection().category(), Some("smartphones"));
        assert!(!app.selection().is_loading_products());
        assert!(!app.is_busy());
    }

    #[test]
    fn test_keys_ignored_while_categories_load() {
        let (mut app, _rx) = app();
        app.loading_categories = true;
        assert!(app.event(&key(KeyCode::Char('c'))).is_none());
        assert!(matches!(
            app.event(&key(KeyCode::Char('q'))),
            Some(AppEvent::Exit)
        ));
    }

    #[test]
    fn test_chart_not_reprojected_on_toggle() {
        let (mut app, rx) = app();
        pump(&mut app, &rx, AppEvent::FetchCategories);
        pump(&mut app, &rx, key(KeyCode::Enter));
        let before = app.chart().clone();
        app.event(&AppEvent::ToggleProduct(1));
        assert_eq!(app.chart(), &before);
        app.event(&AppEvent::RunReport);
        assert_eq!(app.chart().chart, ChartKind::Column);
        assert_eq!(app.chart().x_axis.categories, vec!["iPhone"]);
    }

    #[test]
    fn test_render_smoke() {
        let (mut app, rx) = app();
        app.enable_debug();
        pump(&mut app, &rx, AppEvent::FetchCategories);
        let area = Rect::new(0, 0, 100, 30);
        let mut buf = Buffer::empty(area);
        (&mut app).render(area, &mut buf);
        let top: String = (0..area.width)
            .map(|x| buf[(x, 0)].symbol().to_string())
            .collect();
        assert!(top.contains("Product Filter Dashboard"));
    }
}

//! Category and product pickers for the sidebar.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, StatefulWidget, Widget, Wrap},
};

use crate::config::Theme;
use crate::model::{Category, Product};
use crate::selection::Selection;

fn panel_block<'a>(title: &'a str, focused: bool, theme: &Theme) -> Block<'a> {
    let border = if focused {
        theme.get("panel_border_active")
    } else {
        theme.get("panel_border")
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(format!(" {title} "))
}

fn render_loading(block: Block<'_>, what: &str, area: Rect, buf: &mut Buffer, theme: &Theme) {
    Paragraph::new(format!("Loading {what}…"))
        .style(Style::default().fg(theme.get("text_secondary")))
        .alignment(Alignment::Center)
        .block(block)
        .render(area, buf);
}

/// Single-choice category list. The chosen category is marked with a filled radio.
pub fn render_category_list(
    area: Rect,
    buf: &mut Buffer,
    categories: &[Category],
    chosen: Option<&str>,
    state: &mut ListState,
    focused: bool,
    theme: &Theme,
) {
    let block = panel_block("Category", focused, theme);
    if categories.is_empty() {
        Paragraph::new("No categories")
            .style(Style::default().fg(theme.get("text_secondary")))
            .block(block)
            .render(area, buf);
        return;
    }

    let items: Vec<ListItem> = categories
        .iter()
        .map(|c| {
            let is_chosen = chosen == Some(c.name.as_str());
            let marker = if is_chosen { "●" } else { "○" };
            let style = if is_chosen {
                Style::default().fg(theme.get("secondary"))
            } else {
                Style::default().fg(theme.get("text_primary"))
            };
            ListItem::new(Line::from(Span::styled(format!("{marker} {}", c.name), style)))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    StatefulWidget::render(list, area, buf, state);
}

/// Multi-choice product list with checkboxes.
pub fn render_product_list(
    area: Rect,
    buf: &mut Buffer,
    selection: &Selection,
    state: &mut ListState,
    focused: bool,
    theme: &Theme,
) {
    let block = panel_block("Products", focused, theme);
    if selection.is_loading_products() {
        render_loading(block, "products", area, buf, theme);
        return;
    }
    let products: &[Product] = selection.products();
    if products.is_empty() {
        let hint = if selection.category().is_some() {
            "No products"
        } else {
            "Choose a category"
        };
        Paragraph::new(hint)
            .style(Style::default().fg(theme.get("text_secondary")))
            .block(block)
            .render(area, buf);
        return;
    }

    let checkbox = Style::default().fg(theme.get("checkbox"));
    let text = Style::default().fg(theme.get("text_primary"));
    let items: Vec<ListItem> = products
        .iter()
        .map(|p| {
            let mark = if selection.is_selected(p.id) { "[x]" } else { "[ ]" };
            ListItem::new(Line::from(vec![
                Span::styled(mark, checkbox),
                Span::raw(" "),
                Span::styled(p.title.clone(), text),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    StatefulWidget::render(list, area, buf, state);
}

/// Summary of picked product titles, wrapped.
pub fn render_selection_summary(area: Rect, buf: &mut Buffer, selection: &Selection, theme: &Theme) {
    let titles = selection.selected_titles();
    let body = if titles.is_empty() {
        Span::styled("none", Style::default().fg(theme.get("text_secondary")))
    } else {
        Span::styled(titles, Style::default().fg(theme.get("text_primary")))
    };
    Paragraph::new(Line::from(vec![Span::raw("Selected: "), body]))
        .wrap(Wrap { trim: true })
        .render(area, buf);
}

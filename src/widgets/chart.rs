//! Chart renderer: draws [`ChartOptions`] as a column chart or a pie with legend.

use std::f64::consts::TAU;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Points},
        Bar, BarChart, BarGroup, Block, Borders, List, ListItem, Paragraph, Widget,
    },
};

use crate::config::Theme;
use crate::model::Product;
use crate::projector::{ChartKind, ChartOptions, DataLabels};

/// Bar values are integers; prices are scaled to cents so small prices keep their proportions.
const BAR_VALUE_SCALE: f64 = 100.0;
const MAX_BAR_WIDTH: u16 = 12;

/// Price as the catalog writes it: whole numbers without decimals.
pub fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{price:.0}")
    } else {
        format!("{price:.2}")
    }
}

/// Slice covering `fraction` of a full turn (clockwise from 12 o'clock).
/// Non-positive totals fall back to equal slices.
pub fn slice_at(fraction: f64, weights: &[f64]) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }
    let fraction = fraction.clamp(0.0, 1.0);
    let total: f64 = weights.iter().map(|w| w.max(0.0)).sum();
    if total <= 0.0 {
        let n = weights.len();
        return Some(((fraction * n as f64) as usize).min(n - 1));
    }
    let mut cumulative = 0.0;
    for (i, w) in weights.iter().enumerate() {
        cumulative += w.max(0.0) / total;
        if fraction < cumulative {
            return Some(i);
        }
    }
    Some(weights.len() - 1)
}

/// Sample a `cols` x `rows` grid over the unit disc and bucket the points per slice.
pub fn pie_points(weights: &[f64], cols: u16, rows: u16) -> Vec<Vec<(f64, f64)>> {
    let mut slices = vec![Vec::new(); weights.len()];
    if weights.is_empty() || cols == 0 || rows == 0 {
        return slices;
    }
    for i in 0..cols {
        let x = -1.0 + (2.0 * i as f64 + 1.0) / cols as f64;
        for j in 0..rows {
            let y = -1.0 + (2.0 * j as f64 + 1.0) / rows as f64;
            if x * x + y * y > 1.0 {
                continue;
            }
            let mut fraction = x.atan2(y) / TAU;
            if fraction < 0.0 {
                fraction += 1.0;
            }
            if let Some(k) = slice_at(fraction, weights) {
                slices[k].push((x, y));
            }
        }
    }
    slices
}

pub struct ChartView<'a> {
    options: &'a ChartOptions,
    theme: &'a Theme,
}

impl<'a> ChartView<'a> {
    pub fn new(options: &'a ChartOptions, theme: &'a Theme) -> Self {
        Self { options, theme }
    }

    fn block(&self) -> Block<'a> {
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.get("panel_border")))
            .title(format!(" {} ", self.options.title))
            .title_bottom(Line::from(format!(" {} ", self.options.y_axis.title)).right_aligned())
    }

    fn render_columns(&self, area: Rect, buf: &mut Buffer) {
        let options = self.options;
        let n = u16::try_from(options.series.data.len().max(1)).unwrap_or(u16::MAX);
        let bar_gap: u16 = 1;
        let bar_width = (area.width.saturating_sub(n.saturating_sub(1).saturating_mul(bar_gap)) / n)
            .clamp(1, MAX_BAR_WIDTH);

        let bar_style = Style::default().fg(self.theme.get("chart_bar"));
        let value_style = Style::default()
            .fg(self.theme.get("chart_value"))
            .bg(self.theme.get("chart_bar"));
        let bars: Vec<Bar> = options
            .series
            .data
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let label = options.x_axis.categories.get(i).cloned().unwrap_or_default();
                let text_value = match options.data_labels {
                    DataLabels::Value => format_price(*value),
                    DataLabels::SliceCategory => String::new(),
                };
                Bar::default()
                    .value((value.max(0.0) * BAR_VALUE_SCALE).round() as u64)
                    .label(Line::from(label))
                    .text_value(text_value)
                    .style(bar_style)
                    .value_style(value_style)
            })
            .collect();

        BarChart::default()
            .bar_width(bar_width)
            .bar_gap(bar_gap)
            .data(BarGroup::default().bars(&bars))
            .render(area, buf);
    }

    fn render_pie(&self, area: Rect, buf: &mut Buffer) {
        let options = self.options;
        let longest = options
            .x_axis
            .categories
            .iter()
            .map(|c| u16::try_from(c.chars().count()).unwrap_or(u16::MAX))
            .max()
            .unwrap_or(0);
        let legend_width = longest.saturating_add(3).min(area.width / 3);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Fill(1), Constraint::Length(legend_width)])
            .split(area);

        // Terminal cells are about twice as tall as wide.
        let pie_width = columns[0].width.min(columns[0].height.saturating_mul(2));
        let pie_area = Rect {
            x: columns[0].x + (columns[0].width - pie_width) / 2,
            y: columns[0].y,
            width: pie_width,
            height: columns[0].height.min(pie_width.div_ceil(2)),
        };
        let slices = pie_points(
            &options.series.data,
            pie_area.width.saturating_mul(2),
            pie_area.height.saturating_mul(4),
        );
        let theme = self.theme;
        Canvas::default()
            .marker(Marker::Braille)
            .x_bounds([-1.0, 1.0])
            .y_bounds([-1.0, 1.0])
            .paint(|ctx| {
                for (k, coords) in slices.iter().enumerate() {
                    ctx.draw(&Points {
                        coords,
                        color: theme.slice_color(k),
                    });
                }
            })
            .render(pie_area, buf);

        let mut items = vec![ListItem::new(Line::from(Span::styled(
            options.series.name.clone(),
            Style::default().fg(theme.get("text_secondary")),
        )))];
        items.extend((0..options.series.data.len()).map(|i| {
            let label = match options.data_labels {
                DataLabels::SliceCategory => options.slice_label(i).unwrap_or_default().to_string(),
                DataLabels::Value => format_price(options.series.data[i]),
            };
            ListItem::new(Line::from(vec![
                Span::styled("■ ", Style::default().fg(theme.slice_color(i))),
                Span::styled(label, Style::default().fg(theme.get("text_primary"))),
            ]))
        }));
        List::new(items).render(columns[1], buf);
    }
}

impl Widget for ChartView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = self.block();
        let inner = block.inner(area);
        block.render(area, buf);

        if self.options.is_empty() {
            Paragraph::new("No data")
                .style(Style::default().fg(self.theme.get("text_secondary")))
                .alignment(Alignment::Center)
                .render(inner, buf);
            return;
        }

        match self.options.chart {
            ChartKind::Column => self.render_columns(inner, buf),
            ChartKind::Pie => self.render_pie(inner, buf),
        }
    }
}

/// The `name: $price` list shown under a product report.
pub struct ReportDetails<'a> {
    products: &'a [Product],
    theme: &'a Theme,
}

impl<'a> ReportDetails<'a> {
    pub fn new(products: &'a [Product], theme: &'a Theme) -> Self {
        Self { products, theme }
    }
}

impl Widget for ReportDetails<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default().fg(self.theme.get("text_primary"));
        let items: Vec<ListItem> = self
            .products
            .iter()
            .map(|p| {
                ListItem::new(Span::styled(
                    format!("{}: ${}", p.display_name(), format_price(p.price)),
                    style,
                ))
            })
            .collect();
        List::new(items)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(self.theme.get("panel_border"))),
            )
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;
    use crate::projector::project;
    use crate::selection::ChartMode;

    fn text(buf: &Buffer) -> String {
        let area = buf.area;
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(899.0), "899");
        assert_eq!(format_price(9.99), "9.99");
        assert_eq!(format_price(12.5), "12.50");
    }

    #[test]
    fn test_slice_at_equal_weights() {
        let w = [100.0, 100.0, 100.0, 100.0];
        assert_eq!(slice_at(0.0, &w), Some(0));
        assert_eq!(slice_at(0.3, &w), Some(1));
        assert_eq!(slice_at(0.99, &w), Some(3));
        assert_eq!(slice_at(1.0, &w), Some(3));
        assert_eq!(slice_at(0.5, &[]), None);
    }

    #[test]
    fn test_slice_at_weighted_and_degenerate() {
        assert_eq!(slice_at(0.2, &[1.0, 3.0]), Some(0));
        assert_eq!(slice_at(0.3, &[1.0, 3.0]), Some(1));
        assert_eq!(slice_at(0.6, &[0.0, 0.0]), Some(1));
    }

    #[test]
    fn test_pie_points_cover_disc_only() {
        let slices = pie_points(&[1.0, 1.0], 20, 20);
        assert_eq!(slices.len(), 2);
        assert!(slices.iter().all(|s| !s.is_empty()));
        assert!(slices
            .iter()
            .flatten()
            .all(|(x, y)| x * x + y * y <= 1.0));
        // first half-turn is the right side of the disc
        assert!(slices[0].iter().all(|(x, _)| *x >= 0.0));
    }

    #[test]
    fn test_empty_chart_renders_placeholder() {
        let options = project(ChartMode::Product, &[], &[]);
        let area = Rect::new(0, 0, 40, 10);
        let mut buf = Buffer::empty(area);
        ChartView::new(&options, &Theme::default()).render(area, &mut buf);
        let out = text(&buf);
        assert!(out.contains("No data"));
        assert!(out.contains("Products in selected category"));
    }

    #[test]
    fn test_column_chart_labels_and_values() {
        let products = vec![Product::new(2, "Galaxy", 899.0)];
        let options = project(ChartMode::Product, &[], &products);
        let area = Rect::new(0, 0, 40, 12);
        let mut buf = Buffer::empty(area);
        ChartView::new(&options, &Theme::default()).render(area, &mut buf);
        let out = text(&buf);
        assert!(out.contains("Galaxy"));
        assert!(out.contains("899"));
        assert!(out.contains("Price"));
    }

    #[test]
    fn test_column_chart_with_more_bars_than_cells() {
        let products: Vec<Product> = (0..70_000)
            .map(|id| Product::new(id, format!("p{id}"), 1.0))
            .collect();
        let options = project(ChartMode::Product, &[], &products);
        let area = Rect::new(0, 0, 40, 12);
        let mut buf = Buffer::empty(area);
        ChartView::new(&options, &Theme::default()).render(area, &mut buf);
        assert!(text(&buf).contains("Price"));
    }

    #[test]
    fn test_pie_legend_uses_slice_labels() {
        let categories = vec![Category::new("smartphones"), Category::new("laptops")];
        let options = project(ChartMode::Category, &categories, &[]);
        let area = Rect::new(0, 0, 60, 16);
        let mut buf = Buffer::empty(area);
        ChartView::new(&options, &Theme::default()).render(area, &mut buf);
        let out = text(&buf);
        assert!(out.contains("Categories"));
        assert!(out.contains("■ smartphones"));
        assert!(out.contains("■ laptops"));
    }

    #[test]
    fn test_report_details() {
        let products = vec![
            Product::new(1, "iPhone", 999.0).with_name("iPhone 9"),
            Product::new(2, "Galaxy", 899.5),
        ];
        let area = Rect::new(0, 0, 30, 4);
        let mut buf = Buffer::empty(area);
        ReportDetails::new(&products, &Theme::default()).render(area, &mut buf);
        let out = text(&buf);
        assert!(out.contains("iPhone 9: $999"));
        assert!(out.contains("Galaxy: $899.50"));
    }
}

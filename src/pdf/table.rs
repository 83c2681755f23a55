//! Auto-sized tables drawn onto a [`PageCanvas`].
//!
//! A table starts at a given Y on the current page, spreads its columns over
//! the space between the left and right margins in proportion to their
//! content, wraps long cell text, and continues on a new page (repeating the
//! head) when a row would cross the bottom margin.

use log::debug;

use super::content::{PT_TO_MM, Rect, Rgb, TextStyle};
use super::document::PageCanvas;
use super::fonts::StandardFont;

/// 40pt, the default distance between a table and the page edges
pub const DEFAULT_MARGIN: f64 = 40.0 * PT_TO_MM;

const LINE_HEIGHT_FACTOR: f64 = 1.15;
/// Distance from the top of a text line to its baseline, in font sizes
const BASELINE_OFFSET: f64 = 0.85;
const DEFAULT_TEXT_COLOR: Rgb = Rgb(20, 20, 20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    /// Coloured head, alternate body rows shaded
    Striped,
    /// No fills unless a style asks for one
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Right,
}

/// How the cells of one section (head or body) are drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellStyle {
    pub font: StandardFont,
    pub font_size: f64,
    pub text_color: Rgb,
    pub fill: Option<Rgb>,
}

/// Per-column overrides
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColumnStyle {
    pub font: Option<StandardFont>,
    pub halign: Option<HAlign>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: DEFAULT_MARGIN,
            right: DEFAULT_MARGIN,
            bottom: DEFAULT_MARGIN,
            left: DEFAULT_MARGIN,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub start_y: f64,
    pub margins: Margins,
    pub head: Vec<String>,
    pub body: Vec<Vec<String>>,
    pub theme: Theme,
    /// Padding on every side of a cell, in mm
    pub cell_padding: f64,
    pub head_style: CellStyle,
    pub body_style: CellStyle,
    /// Fill of every other body row, starting with the first
    pub alternate_fill: Option<Rgb>,
    pub column_styles: Vec<ColumnStyle>,
}

impl Table {
    /// A table with the defaults of `theme`
    pub fn new(theme: Theme, head: Vec<String>, body: Vec<Vec<String>>) -> Self {
        let (head_style, alternate_fill) = match theme {
            Theme::Striped => (
                CellStyle {
                    font: StandardFont::HelveticaBold,
                    font_size: 10.0,
                    text_color: Rgb::WHITE,
                    fill: Some(Rgb(41, 128, 185)),
                },
                Some(Rgb(245, 245, 245)),
            ),
            Theme::Plain => (
                CellStyle {
                    font: StandardFont::HelveticaBold,
                    font_size: 10.0,
                    text_color: DEFAULT_TEXT_COLOR,
                    fill: None,
                },
                None,
            ),
        };
        Self {
            start_y: DEFAULT_MARGIN,
            margins: Margins::default(),
            head,
            body,
            theme,
            cell_padding: 1.76,
            head_style,
            body_style: CellStyle {
                font: StandardFont::Helvetica,
                font_size: 10.0,
                text_color: DEFAULT_TEXT_COLOR,
                fill: None,
            },
            alternate_fill,
            column_styles: Vec::new(),
        }
    }

    fn column_count(&self) -> usize {
        self.body
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.head.len()))
            .max()
            .unwrap_or(0)
    }

    fn column_style(&self, column: usize) -> ColumnStyle {
        self.column_styles.get(column).copied().unwrap_or_default()
    }

    fn cell_text_style(&self, section: &CellStyle, column: usize) -> TextStyle {
        let font = self.column_style(column).font.unwrap_or(section.font);
        TextStyle::new(font, section.font_size).with_color(section.text_color)
    }

    /// Spread the available width over the columns in proportion to content
    pub fn column_widths(&self, canvas: &PageCanvas) -> Vec<f64> {
        let columns = self.column_count();
        if columns == 0 {
            return Vec::new();
        }
        let available = (canvas.width() - self.margins.left - self.margins.right).max(0.0);

        let mut content = vec![0.0_f64; columns];
        let rows = std::iter::once((&self.head, &self.head_style))
            .chain(self.body.iter().map(|row| (row, &self.body_style)));
        for (row, section) in rows {
            for (column, text) in row.iter().enumerate() {
                let style = self.cell_text_style(section, column);
                let width = text
                    .lines()
                    .map(|line| canvas.text_width(line, style.font, style.size))
                    .fold(0.0, f64::max);
                content[column] = content[column].max(width + 2.0 * self.cell_padding);
            }
        }

        let total: f64 = content.iter().sum();
        if total <= 0.0 {
            return vec![available / columns as f64; columns];
        }
        content.iter().map(|w| w * available / total).collect()
    }

    /// Draw the table and report where it ended.
    ///
    /// When the head and the first body row do not fit between `start_y`
    /// and the bottom margin, the whole table starts on a new page instead.
    pub fn draw(&self, canvas: &mut PageCanvas) -> TableOutcome {
        let widths = self.column_widths(canvas);
        let bottom_limit = canvas.height() - self.margins.bottom;
        let head_height = self.row_height(canvas, &self.head, &self.head_style, &widths);
        let first_row_height = self
            .body
            .first()
            .map(|row| self.row_height(canvas, row, &self.body_style, &widths))
            .unwrap_or(0.0);

        let mut y = self.start_y;
        if y > self.margins.top && y + head_height + first_row_height > bottom_limit {
            canvas.add_page();
            y = self.margins.top;
        }
        let start_page = canvas.current_page_index();
        let start_y = y;

        let head_fill = self.head_style.fill;
        self.draw_row(canvas, &self.head, &self.head_style, head_fill, &widths, y);
        y += head_height;
        let mut rows_on_page = 0;

        for (index, row) in self.body.iter().enumerate() {
            let height = self.row_height(canvas, row, &self.body_style, &widths);
            if rows_on_page > 0 && y + height > bottom_limit {
                canvas.add_page();
                y = self.margins.top;
                self.draw_row(canvas, &self.head, &self.head_style, head_fill, &widths, y);
                y += head_height;
                rows_on_page = 0;
            }

            let fill = match (self.theme, self.alternate_fill) {
                (Theme::Striped, Some(fill)) if index % 2 == 0 => Some(fill),
                _ => self.body_style.fill,
            };
            self.draw_row(canvas, row, &self.body_style, fill, &widths, y);
            y += height;
            rows_on_page += 1;
        }

        let outcome = TableOutcome {
            start_y,
            final_y: y,
            start_page,
            end_page: canvas.current_page_index(),
            column_widths: widths,
            body_rows: self.body.len(),
        };
        debug!(
            "table: {} body rows, y {:.2} -> {:.2}, pages {}..={}",
            outcome.body_rows,
            outcome.start_y,
            outcome.final_y,
            outcome.start_page,
            outcome.end_page
        );
        outcome
    }

    fn cell_lines(
        &self,
        canvas: &PageCanvas,
        text: &str,
        style: &TextStyle,
        width: f64,
    ) -> Vec<String> {
        let max_width = (width - 2.0 * self.cell_padding).max(0.0);
        wrap_text(text, max_width, |s| canvas.text_width(s, style.font, style.size))
    }

    fn row_height(
        &self,
        canvas: &PageCanvas,
        row: &[String],
        section: &CellStyle,
        widths: &[f64],
    ) -> f64 {
        let line_height = section.font_size * PT_TO_MM * LINE_HEIGHT_FACTOR;
        let lines = row
            .iter()
            .enumerate()
            .map(|(column, text)| {
                let style = self.cell_text_style(section, column);
                self.cell_lines(canvas, text, &style, widths[column]).len()
            })
            .max()
            .unwrap_or(1)
            .max(1);
        lines as f64 * line_height + 2.0 * self.cell_padding
    }

    fn draw_row(
        &self,
        canvas: &mut PageCanvas,
        row: &[String],
        section: &CellStyle,
        fill: Option<Rgb>,
        widths: &[f64],
        y: f64,
    ) {
        let height = self.row_height(canvas, row, section, widths);
        let font_size_mm = section.font_size * PT_TO_MM;
        let line_height = font_size_mm * LINE_HEIGHT_FACTOR;

        if let Some(color) = fill {
            let total_width: f64 = widths.iter().sum();
            canvas
                .page()
                .fill_rect(Rect::new(self.margins.left, y, total_width, height), color);
        }

        let mut x = self.margins.left;
        for (column, width) in widths.iter().enumerate() {
            let text = row.get(column).map(String::as_str).unwrap_or("");
            let style = self.cell_text_style(section, column);
            let halign = self.column_style(column).halign.unwrap_or(HAlign::Left);

            for (i, line) in self.cell_lines(canvas, text, &style, *width).iter().enumerate() {
                let line_x = match halign {
                    HAlign::Left => x + self.cell_padding,
                    HAlign::Right => {
                        let line_width = canvas.text_width(line, style.font, style.size);
                        x + width - self.cell_padding - line_width
                    }
                };
                let baseline = y
                    + self.cell_padding
                    + i as f64 * line_height
                    + font_size_mm * BASELINE_OFFSET;
                if !line.is_empty() {
                    canvas.page().add_text(line, line_x, baseline, style);
                }
            }
            x += width;
        }
    }
}

/// Where a drawn table ended up
#[derive(Debug, Clone, PartialEq)]
pub struct TableOutcome {
    /// Top edge of the head, on `start_page`
    pub start_y: f64,
    /// Bottom edge of the last row, on `end_page`
    pub final_y: f64,
    pub start_page: usize,
    pub end_page: usize,
    pub column_widths: Vec<f64>,
    pub body_rows: usize,
}

/// Greedy word wrap; words wider than `max_width` are split by character
pub fn wrap_text(text: &str, max_width: f64, measure: impl Fn(&str) -> f64) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if measure(&candidate) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if measure(word) <= max_width {
                current = word.to_string();
                continue;
            }
            for c in word.chars() {
                let mut next = current.clone();
                next.push(c);
                if !current.is_empty() && measure(&next) > max_width {
                    lines.push(std::mem::take(&mut current));
                    current.push(c);
                } else {
                    current = next;
                }
            }
        }
        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn page_content(doc: &lopdf::Document, page: u32) -> String {
        let pages = doc.get_pages();
        String::from_utf8_lossy(&doc.get_page_content(pages[&page]).unwrap()).to_string()
    }

    fn char_count(s: &str) -> f64 {
        s.chars().count() as f64
    }

    #[test]
    fn test_wrap_text_fits() {
        assert_eq!(wrap_text("Page Setup", 20.0, char_count), vec!["Page Setup"]);
        assert_eq!(wrap_text("", 20.0, char_count), vec![""]);
    }

    #[test]
    fn test_wrap_text_breaks_words() {
        assert_eq!(
            wrap_text("Promoting Page on social media", 12.0, char_count),
            vec!["Promoting", "Page on", "social media"]
        );
    }

    #[test]
    fn test_wrap_text_splits_long_word() {
        assert_eq!(wrap_text("abcdefgh", 3.0, char_count), vec!["abc", "def", "gh"]);
    }

    #[test]
    fn test_wrap_text_keeps_newlines() {
        assert_eq!(wrap_text("one\ntwo", 20.0, char_count), vec!["one", "two"]);
    }

    #[test]
    fn test_column_widths_fill_available_space() {
        let canvas = PageCanvas::a4(None);
        let mut table = Table::new(
            Theme::Striped,
            strings(&["DESCRIPTION", "PRICE", "QTY", "SUBTOTAL"]),
            vec![strings(&["Design", "1500", "2", "3000.00"])],
        );
        table.margins.left = 20.0;
        let widths = table.column_widths(&canvas);

        assert_eq!(widths.len(), 4);
        let total: f64 = widths.iter().sum();
        assert!((total - (210.0 - 20.0 - DEFAULT_MARGIN)).abs() < 1e-9);
        assert!(widths[0] > widths[2]);
    }

    #[test]
    fn test_header_only_table() {
        let mut canvas = PageCanvas::a4(None);
        let mut table = Table::new(Theme::Striped, strings(&["A", "B"]), Vec::new());
        table.start_y = 100.0;
        let outcome = table.draw(&mut canvas);

        assert_eq!(outcome.body_rows, 0);
        assert!(outcome.final_y > 100.0);
        assert_eq!(outcome.start_page, outcome.end_page);
    }

    #[test]
    fn test_final_y_grows_per_row() {
        let head = strings(&["A", "B"]);
        let one = vec![strings(&["x", "1"])];
        let two = vec![strings(&["x", "1"]), strings(&["y", "2"])];

        let mut canvas = PageCanvas::a4(None);
        let first = Table::new(Theme::Plain, head.clone(), one).draw(&mut canvas);
        let mut canvas = PageCanvas::a4(None);
        let second = Table::new(Theme::Plain, head, two).draw(&mut canvas);

        let row_height = 10.0 * PT_TO_MM * LINE_HEIGHT_FACTOR + 2.0 * 1.76;
        assert!((second.final_y - first.final_y - row_height).abs() < 1e-9);
    }

    #[test]
    fn test_long_table_continues_on_new_page() {
        let mut canvas = PageCanvas::a4(None);
        let body: Vec<Vec<String>> = (0..80).map(|i| vec![format!("Row {}", i)]).collect();
        let mut table = Table::new(Theme::Striped, strings(&["DESCRIPTION"]), body);
        table.start_y = 115.0;
        let outcome = table.draw(&mut canvas);

        assert!(outcome.end_page > outcome.start_page);
        assert_eq!(canvas.page_count(), outcome.end_page + 1);
        assert!(outcome.final_y <= 297.0 - DEFAULT_MARGIN);
    }

    #[test]
    fn test_table_without_room_starts_on_next_page() {
        let mut canvas = PageCanvas::a4(None);
        let mut table = Table::new(
            Theme::Plain,
            strings(&["Amount Calculation", ""]),
            vec![strings(&["Sub-total :", "0.00"]), strings(&["Total :", "0.00"])],
        );
        table.start_y = 280.0;
        let outcome = table.draw(&mut canvas);

        assert_eq!(outcome.start_page, 1);
        assert_eq!(outcome.end_page, 1);
        assert_eq!(outcome.start_y, DEFAULT_MARGIN);
        assert!(outcome.final_y <= 297.0 - DEFAULT_MARGIN);

        let doc = canvas.finish();
        let first = page_content(&doc, 1);
        let second = page_content(&doc, 2);
        assert!(!first.contains("(Amount Calculation) Tj"));
        assert!(second.contains("(Amount Calculation) Tj"));
        assert!(second.contains("(Sub-total :) Tj"));
    }

    #[test]
    fn test_table_with_room_stays_on_page() {
        let mut canvas = PageCanvas::a4(None);
        let mut table = Table::new(Theme::Plain, strings(&["A"]), vec![strings(&["x"])]);
        table.start_y = 250.0;
        let outcome = table.draw(&mut canvas);

        assert_eq!(outcome.start_page, 0);
        assert_eq!(outcome.start_y, 250.0);
        assert_eq!(canvas.page_count(), 1);
    }

    #[test]
    fn test_right_aligned_column() {
        let mut canvas = PageCanvas::a4(None);
        let mut table = Table::new(
            Theme::Plain,
            strings(&["", ""]),
            vec![strings(&["Total :", "1.00"])],
        );
        table.column_styles = vec![
            ColumnStyle::default(),
            ColumnStyle {
                font: None,
                halign: Some(HAlign::Right),
            },
        ];
        table.draw(&mut canvas);
        let content = page_content(&canvas.finish(), 1);
        assert!(content.contains("(1.00) Tj"));
        assert!(content.contains("(Total :) Tj"));
    }
}

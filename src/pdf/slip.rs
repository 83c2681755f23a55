//! The payment slip layout.
//!
//! Everything is placed at fixed positions on an A4 page, in millimetres
//! from the top-left corner. The only dependent position is the totals
//! table, which starts just below wherever the items table ended.

use anyhow::Result;
use log::info;
use lopdf::Document;
use std::path::{Path, PathBuf};

use super::assets::{AssetKind, AssetSet};
use super::content::{Rect, Rgb, TextStyle};
use super::document::{PageCanvas, save_document};
use super::fonts::{StandardFont, UnicodeFont};
use super::table::{CellStyle, ColumnStyle, HAlign, Table, TableOutcome, Theme};
use crate::model::{InvoiceRecord, LineItem, format_amount};

/// Name of the file the slip is saved as
pub const SLIP_FILE_NAME: &str = "payment-slip.pdf";
pub const AGENCY_NAME: &str = "UL FATH ADS AGENCY";

pub const ITEMS_HEAD: [&str; 4] = ["DESCRIPTION", "PRICE", "QTY", "SUBTOTAL"];
pub const TOTALS_HEAD: [&str; 2] = ["Amount Calculation", ""];

const METADATA_LEFT_X: f64 = 20.0;
const METADATA_RIGHT_X: f64 = 100.0;
const METADATA_TOP_Y: f64 = 70.0;
const METADATA_ROW_SPACING: f64 = 8.0;

const ITEMS_TABLE_Y: f64 = 115.0;
const ITEMS_TABLE_LEFT: f64 = 20.0;
/// Distance of the totals table from the right page edge
const TOTALS_TABLE_OFFSET: f64 = 80.0;
/// Gap between the items table and the totals table
const TOTALS_TABLE_GAP: f64 = 5.0;

const CELL_PADDING: f64 = 2.0;

/// What the renderer computed and where things ended up
#[derive(Debug, Clone, PartialEq)]
pub struct SlipLayout {
    pub total_amount: f64,
    pub item_rows: Vec<Vec<String>>,
    pub totals_rows: Vec<Vec<String>>,
    pub items_table: TableOutcome,
    pub totals_table: TableOutcome,
    pub page_count: usize,
}

pub struct RenderedSlip {
    pub document: Document,
    pub layout: SlipLayout,
}

/// Body rows of the items table, one per line item in input order
pub fn item_rows(items: &[LineItem]) -> Vec<Vec<String>> {
    items
        .iter()
        .map(|item| {
            vec![
                item.description.clone(),
                item.price.to_string(),
                item.quantity.to_string(),
                format_amount(item.subtotal()),
            ]
        })
        .collect()
}

/// Body rows of the totals table. Charge and Due are always zero.
pub fn totals_rows(total_amount: f64) -> Vec<Vec<String>> {
    let total = format_amount(total_amount);
    vec![
        vec!["Sub-total :".to_string(), total.clone()],
        vec!["Charge :".to_string(), format_amount(0.0)],
        vec!["Due :".to_string(), format_amount(0.0)],
        vec!["Total :".to_string(), total],
    ]
}

/// The ten `Label: value` pairs with their positions, left column then right
pub fn metadata_lines(record: &InvoiceRecord) -> Vec<(String, f64, f64)> {
    let pairs = [
        (
            format!("CLIENT NAME: {}", record.client_name),
            format!("Mobile Number: {}", record.mobile_number),
        ),
        (
            format!("Page Name: {}", record.page_name),
            format!("Bkash Account Last Digit: {}", record.bkash_account_last_digit),
        ),
        (
            format!("Bkash Trx ID: {}", record.bkash_trx_id),
            format!("Order No: {}", record.order_no),
        ),
        (
            format!("Payment Date: {}", record.payment_date_text()),
            format!("Payment Method: {}", record.payment_method),
        ),
        (
            format!("Bank Account No: {}", record.bank_account_no),
            format!("Account Name: {}", record.account_name),
        ),
    ];

    let mut lines = Vec::with_capacity(10);
    for (row, (left, right)) in pairs.into_iter().enumerate() {
        let y = METADATA_TOP_Y + row as f64 * METADATA_ROW_SPACING;
        lines.push((left, METADATA_LEFT_X, y));
        lines.push((right, METADATA_RIGHT_X, y));
    }
    lines
}

fn items_table(rows: Vec<Vec<String>>) -> Table {
    let mut table = Table::new(
        Theme::Striped,
        ITEMS_HEAD.iter().map(|s| s.to_string()).collect(),
        rows,
    );
    table.start_y = ITEMS_TABLE_Y;
    table.margins.left = ITEMS_TABLE_LEFT;
    table.cell_padding = CELL_PADDING;
    table.head_style = CellStyle {
        font: StandardFont::HelveticaBold,
        font_size: 12.0,
        text_color: Rgb::BLACK,
        fill: Some(Rgb(255, 215, 0)),
    };
    table.body_style.font = StandardFont::HelveticaBold;
    table.body_style.font_size = 11.0;
    table
}

fn totals_table(page_width: f64, start_y: f64, rows: Vec<Vec<String>>) -> Table {
    let mut table = Table::new(
        Theme::Plain,
        TOTALS_HEAD.iter().map(|s| s.to_string()).collect(),
        rows,
    );
    table.start_y = start_y;
    table.margins.left = page_width - TOTALS_TABLE_OFFSET;
    table.cell_padding = CELL_PADDING;
    table.head_style = CellStyle {
        font: StandardFont::HelveticaBold,
        font_size: 11.0,
        text_color: Rgb::BLACK,
        fill: Some(Rgb(245, 245, 245)),
    };
    table.body_style.font_size = 11.0;
    table.column_styles = vec![
        ColumnStyle {
            font: Some(StandardFont::HelveticaBold),
            halign: None,
        },
        ColumnStyle {
            font: None,
            halign: Some(HAlign::Right),
        },
    ];
    table
}

/// Lay out a slip for `record`.
///
/// Images come from `assets`; text outside the standard fonts is drawn with
/// `unicode_font` when one is given.
pub fn render_payment_slip(
    record: &InvoiceRecord,
    assets: &AssetSet,
    unicode_font: Option<&UnicodeFont>,
) -> Result<RenderedSlip> {
    let mut canvas = PageCanvas::a4(unicode_font);
    canvas.register_assets(assets)?;
    let pw = canvas.width();
    let ph = canvas.height();

    // Letterhead
    canvas.place_image(AssetKind::Header, Rect::new(0.0, 0.0, pw, 20.0))?;
    canvas.place_image(AssetKind::Badge, Rect::new(36.0, 20.0, 30.0, 30.0))?;
    canvas
        .page()
        .add_text(AGENCY_NAME, 20.0, 55.0, TextStyle::new(StandardFont::HelveticaBold, 18.0));
    canvas.place_image(AssetKind::Paid, Rect::new(pw - 60.0, 23.0, 40.0, 40.0))?;

    let metadata_style = TextStyle::new(StandardFont::Helvetica, 12.0);
    for (text, x, y) in metadata_lines(record) {
        canvas.page().add_text(&text, x, y, metadata_style);
    }

    let item_rows = item_rows(&record.items);
    let items_table = items_table(item_rows.clone()).draw(&mut canvas);

    let total_amount = record.total_amount();
    let totals_rows = totals_rows(total_amount);
    let totals_table = totals_table(pw, items_table.final_y + TOTALS_TABLE_GAP, totals_rows.clone())
        .draw(&mut canvas);

    // Seal, social links, signature and footer go on the last page
    canvas.place_image(AssetKind::Seal, Rect::new(30.0, ph - 130.0, 54.0, 40.0))?;
    canvas.place_image(AssetKind::Social, Rect::new(20.0, ph - 80.0, 70.0, 23.0))?;
    canvas.place_image(AssetKind::Signature, Rect::new(pw - 80.0, ph - 50.0, 60.0, 30.0))?;
    canvas.place_image(AssetKind::Footer, Rect::new(0.0, ph - 20.0, pw, 20.0))?;

    let page_count = canvas.page_count();
    info!(
        "Rendered payment slip for order {}: {} items, total {}, {} page(s)",
        record.order_no,
        record.items.len(),
        format_amount(total_amount),
        page_count
    );

    Ok(RenderedSlip {
        document: canvas.finish(),
        layout: SlipLayout {
            total_amount,
            item_rows,
            totals_rows,
            items_table,
            totals_table,
            page_count,
        },
    })
}

/// Save the slip as `payment-slip.pdf` inside `dir`
pub fn save_payment_slip(slip: &mut RenderedSlip, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(SLIP_FILE_NAME);
    save_document(&mut slip.document, &path)?;
    info!("Saved {:?}", path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PaymentMethod;
    use chrono::NaiveDate;

    fn record(items: Vec<LineItem>) -> InvoiceRecord {
        InvoiceRecord {
            client_name: "Rahim Uddin".to_string(),
            mobile_number: "01711000000".to_string(),
            page_name: "Rahim Fashion".to_string(),
            bkash_account_last_digit: "4321".to_string(),
            bkash_trx_id: "TX99".to_string(),
            order_no: "1a2b3c4d".to_string(),
            payment_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            payment_method: PaymentMethod::Bkash,
            bank_account_no: String::new(),
            account_name: String::new(),
            items,
        }
    }

    #[test]
    fn test_item_rows() {
        let rows = item_rows(&[
            LineItem::new("Design", 1500.0, 2.0),
            LineItem::new("Boost", 12.5, 3.0),
        ]);
        assert_eq!(rows[0], vec!["Design", "1500", "2", "3000.00"]);
        assert_eq!(rows[1], vec!["Boost", "12.5", "3", "37.50"]);
    }

    #[test]
    fn test_item_rows_nan() {
        let rows = item_rows(&[LineItem::new("Boost", f64::NAN, 3.0)]);
        assert_eq!(rows[0], vec!["Boost", "NaN", "3", "NaN"]);
    }

    #[test]
    fn test_totals_rows() {
        let rows = totals_rows(3000.0);
        assert_eq!(
            rows,
            vec![
                vec!["Sub-total :", "3000.00"],
                vec!["Charge :", "0.00"],
                vec!["Due :", "0.00"],
                vec!["Total :", "3000.00"],
            ]
        );
    }

    #[test]
    fn test_metadata_lines() {
        let lines = metadata_lines(&record(Vec::new()));
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0], ("CLIENT NAME: Rahim Uddin".to_string(), 20.0, 70.0));
        assert_eq!(lines[1], ("Mobile Number: 01711000000".to_string(), 100.0, 70.0));
        assert_eq!(lines[5], ("Order No: 1a2b3c4d".to_string(), 100.0, 86.0));
        assert_eq!(lines[6], ("Payment Date: 2024-05-01".to_string(), 20.0, 94.0));
        assert_eq!(lines[7], ("Payment Method: bkash".to_string(), 100.0, 94.0));
        assert_eq!(lines[9], ("Account Name: ".to_string(), 100.0, 102.0));
    }

    #[test]
    fn test_items_table_style() {
        let table = items_table(Vec::new());
        assert_eq!(table.start_y, 115.0);
        assert_eq!(table.margins.left, 20.0);
        assert_eq!(table.head_style.fill, Some(Rgb(255, 215, 0)));
        assert_eq!(table.head, vec!["DESCRIPTION", "PRICE", "QTY", "SUBTOTAL"]);
    }

    #[test]
    fn test_totals_table_position() {
        let table = totals_table(210.0, 140.0, totals_rows(0.0));
        assert_eq!(table.margins.left, 130.0);
        assert_eq!(table.start_y, 140.0);
        assert_eq!(table.theme, Theme::Plain);
    }
}

//! Invoice data handed from the form to the renderer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pdf::fonts::is_winansi;

/// How the client paid for the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Bkash,
    Bank,
    Cash,
}

impl PaymentMethod {
    /// Identifier used by the form and printed on the slip
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Bkash => "bkash",
            PaymentMethod::Bank => "bank",
            PaymentMethod::Cash => "cash",
        }
    }

    /// Parse a form value into a PaymentMethod
    pub fn from_name(name: &str) -> Option<PaymentMethod> {
        match name.trim().to_lowercase().as_str() {
            "bkash" => Some(PaymentMethod::Bkash),
            "bank" => Some(PaymentMethod::Bank),
            "cash" => Some(PaymentMethod::Cash),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One billed service line.
///
/// Price and quantity come out of numeric coercion of form text, so either
/// may be NaN when the user typed something that is not a number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItem {
    pub description: String,
    pub price: f64,
    pub quantity: f64,
}

impl LineItem {
    pub fn new(description: impl Into<String>, price: f64, quantity: f64) -> Self {
        Self {
            description: description.into(),
            price,
            quantity,
        }
    }

    pub fn subtotal(&self) -> f64 {
        self.price * self.quantity
    }
}

/// A submitted invoice. Built once by the form and consumed by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceRecord {
    pub client_name: String,
    pub mobile_number: String,
    pub page_name: String,
    pub bkash_account_last_digit: String,
    pub bkash_trx_id: String,
    pub order_no: String,
    pub payment_date: NaiveDate,
    pub payment_method: PaymentMethod,
    pub bank_account_no: String,
    pub account_name: String,
    pub items: Vec<LineItem>,
}

impl InvoiceRecord {
    /// Sum of price × quantity over every item
    pub fn total_amount(&self) -> f64 {
        total_amount(&self.items)
    }

    /// Payment date as it appears on the slip
    pub fn payment_date_text(&self) -> String {
        self.payment_date.format("%Y-%m-%d").to_string()
    }

    /// Whether any printed text needs glyphs outside the standard fonts
    pub fn needs_unicode_font(&self) -> bool {
        let fields = [
            &self.client_name,
            &self.mobile_number,
            &self.page_name,
            &self.bkash_account_last_digit,
            &self.bkash_trx_id,
            &self.order_no,
            &self.bank_account_no,
            &self.account_name,
        ];
        fields.iter().any(|s| !is_winansi(s))
            || self.items.iter().any(|item| !is_winansi(&item.description))
    }
}

pub fn total_amount(items: &[LineItem]) -> f64 {
    items.iter().fold(0.0, |acc, item| acc + item.subtotal())
}

/// Format a monetary figure with exactly two decimals, no symbol or grouping.
///
/// Values exactly halfway between two cents round away from zero, and
/// negative zero prints as `0.00`.
pub fn format_amount(value: f64) -> String {
    if value == 0.0 {
        return "0.00".to_string();
    }
    // The only binary fractions sitting exactly on a half cent are odd eighths
    let eighths = value.abs() * 8.0;
    let value = if eighths.fract() == 0.0 && eighths % 2.0 == 1.0 {
        (value * 100.0).round() / 100.0
    } else {
        value
    };
    format!("{:.2}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtotal() {
        let item = LineItem::new("Design", 1500.0, 2.0);
        assert_eq!(item.subtotal(), 3000.0);
    }

    #[test]
    fn test_total_amount_empty() {
        assert_eq!(total_amount(&[]), 0.0);
        assert_eq!(format_amount(total_amount(&[])), "0.00");
    }

    #[test]
    fn test_total_amount_sums_every_item() {
        let items = vec![
            LineItem::new("Design", 1500.0, 2.0),
            LineItem::new("Boost", 250.5, 3.0),
            LineItem::new("Design", 1500.0, 2.0),
        ];
        assert_eq!(total_amount(&items), 6751.5);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(3000.0), "3000.00");
        assert_eq!(format_amount(0.126), "0.13");
        assert_eq!(format_amount(12.5), "12.50");
        assert_eq!(format_amount(1234567.0), "1234567.00");
    }

    #[test]
    fn test_format_amount_half_cent_rounds_up() {
        assert_eq!(format_amount(0.125), "0.13");
        assert_eq!(format_amount(0.625), "0.63");
        assert_eq!(format_amount(0.375), "0.38");
        assert_eq!(format_amount(1000.875), "1000.88");
        assert_eq!(format_amount(-0.125), "-0.13");
        // 1.005 is stored just below the half cent
        assert_eq!(format_amount(1.005), "1.00");
    }

    #[test]
    fn test_format_amount_negative_zero() {
        assert_eq!(format_amount(-0.0), "0.00");
        assert_eq!(format_amount(0.0 * -3.0), "0.00");
    }

    #[test]
    fn test_nan_degrades_total() {
        let items = vec![
            LineItem::new("Design", f64::NAN, 2.0),
            LineItem::new("Logo", 100.0, 1.0),
        ];
        assert_eq!(format_amount(total_amount(&items)), "NaN");
    }

    #[test]
    fn test_payment_method_names() {
        assert_eq!(PaymentMethod::from_name("bkash"), Some(PaymentMethod::Bkash));
        assert_eq!(PaymentMethod::from_name(" Bank "), Some(PaymentMethod::Bank));
        assert_eq!(PaymentMethod::from_name("cash"), Some(PaymentMethod::Cash));
        assert_eq!(PaymentMethod::from_name("card"), None);
        assert_eq!(PaymentMethod::Bank.to_string(), "bank");
    }

    #[test]
    fn test_needs_unicode_font() {
        let mut record = InvoiceRecord {
            client_name: "Rahim".to_string(),
            mobile_number: "01700000000".to_string(),
            page_name: "Shop".to_string(),
            bkash_account_last_digit: String::new(),
            bkash_trx_id: String::new(),
            order_no: "a1b2c3d4".to_string(),
            payment_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            payment_method: PaymentMethod::Cash,
            bank_account_no: String::new(),
            account_name: String::new(),
            items: vec![LineItem::new("Page Setup", 0.0, 1.0)],
        };
        assert!(!record.needs_unicode_font());
        assert_eq!(record.payment_date_text(), "2024-05-01");

        record.client_name = "José Café".to_string();
        assert!(!record.needs_unicode_font());

        record.items.push(LineItem::new("লোগো", 0.0, 1.0));
        assert!(record.needs_unicode_font());
    }
}

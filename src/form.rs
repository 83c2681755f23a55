//! Invoice form state and submission.
//!
//! The form keeps every field as the text the user typed, plus an ordered
//! list of line-item rows. Rows get a stable key when appended so that
//! removing one never renumbers the others. Submitting validates the
//! required fields and coerces price/quantity into numbers, producing an
//! [`InvoiceRecord`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{FieldError, ValidationErrors};
use crate::model::{InvoiceRecord, LineItem, PaymentMethod};

/// Rows every new form starts with: (description, price, quantity)
const DEFAULT_ROWS: [(&str, &str, &str); 4] = [
    ("Page Setup", "0", "1"),
    ("Promoting Page", "0", "2"),
    ("Cover Logo", "0", "1"),
    ("Algorithm", "0", "1"),
];

/// Length of the generated order number
const ORDER_NO_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormField {
    ClientName,
    MobileNumber,
    PageName,
    BkashAccountLastDigit,
    BkashTrxId,
    OrderNo,
    PaymentDate,
    PaymentMethod,
    BankAccountNo,
    AccountName,
}

impl FormField {
    /// Input id, as used for the keys of a form draft
    pub fn id(&self) -> &'static str {
        match self {
            FormField::ClientName => "clientName",
            FormField::MobileNumber => "mobileNumber",
            FormField::PageName => "pageName",
            FormField::BkashAccountLastDigit => "bkashAccountLastDigit",
            FormField::BkashTrxId => "bkashTrxId",
            FormField::OrderNo => "orderNo",
            FormField::PaymentDate => "paymentDate",
            FormField::PaymentMethod => "paymentMethod",
            FormField::BankAccountNo => "bankAccountNo",
            FormField::AccountName => "accountName",
        }
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self, FormField::OrderNo)
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Stable identity of a line-item row within one form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey(u64);

/// One editable line-item row, holding the raw input text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRow {
    pub key: RowKey,
    pub description: String,
    pub price: String,
    pub quantity: String,
}

impl ItemRow {
    fn to_line_item(&self) -> LineItem {
        LineItem::new(
            self.description.clone(),
            coerce_number(&self.price),
            coerce_number(&self.quantity),
        )
    }
}

/// A numeric input value: either a JSON number or whatever text was typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberInput {
    Number(f64),
    Text(String),
}

impl NumberInput {
    fn into_text(self) -> String {
        match self {
            NumberInput::Number(n) => n.to_string(),
            NumberInput::Text(s) => s,
        }
    }
}

impl Default for NumberInput {
    fn default() -> Self {
        NumberInput::Text(String::new())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemDraft {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: NumberInput,
    #[serde(default)]
    pub quantity: NumberInput,
}

impl ItemDraft {
    pub fn new(description: impl Into<String>, price: f64, quantity: f64) -> Self {
        Self {
            description: description.into(),
            price: NumberInput::Number(price),
            quantity: NumberInput::Number(quantity),
        }
    }
}

/// Field values as submitted from outside the process (e.g. `form.json`).
///
/// Missing fields leave the form untouched. `items`, when present, replaces
/// the seeded rows. There is no order number here: it is read-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bkash_account_last_digit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bkash_trx_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_account_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ItemDraft>>,
}

impl FormDraft {
    /// A draft with every field blank and the seeded rows, for users to fill in
    pub fn template(form: &InvoiceForm) -> Self {
        let blank = Some(String::new());
        Self {
            client_name: blank.clone(),
            mobile_number: blank.clone(),
            page_name: blank.clone(),
            bkash_account_last_digit: blank.clone(),
            bkash_trx_id: blank.clone(),
            payment_date: blank.clone(),
            payment_method: blank.clone(),
            bank_account_no: blank.clone(),
            account_name: blank,
            items: Some(
                form.items()
                    .iter()
                    .map(|row| ItemDraft {
                        description: row.description.clone(),
                        price: NumberInput::Text(row.price.clone()),
                        quantity: NumberInput::Text(row.quantity.clone()),
                    })
                    .collect(),
            ),
        }
    }
}

/// Editable invoice form.
#[derive(Debug, Clone)]
pub struct InvoiceForm {
    order_no: String,
    client_name: String,
    mobile_number: String,
    page_name: String,
    bkash_account_last_digit: String,
    bkash_trx_id: String,
    payment_date: String,
    payment_method: String,
    bank_account_no: String,
    account_name: String,
    items: Vec<ItemRow>,
    next_key: u64,
}

impl InvoiceForm {
    /// Create a form with a fresh order number and the default rows
    pub fn new() -> Self {
        let mut form = Self {
            order_no: generate_order_no(),
            client_name: String::new(),
            mobile_number: String::new(),
            page_name: String::new(),
            bkash_account_last_digit: String::new(),
            bkash_trx_id: String::new(),
            payment_date: String::new(),
            payment_method: String::new(),
            bank_account_no: String::new(),
            account_name: String::new(),
            items: Vec::new(),
            next_key: 0,
        };
        for (description, price, quantity) in DEFAULT_ROWS {
            form.push_row(description.to_string(), price.to_string(), quantity.to_string());
        }
        form
    }

    pub fn order_no(&self) -> &str {
        &self.order_no
    }

    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::ClientName => &self.client_name,
            FormField::MobileNumber => &self.mobile_number,
            FormField::PageName => &self.page_name,
            FormField::BkashAccountLastDigit => &self.bkash_account_last_digit,
            FormField::BkashTrxId => &self.bkash_trx_id,
            FormField::OrderNo => &self.order_no,
            FormField::PaymentDate => &self.payment_date,
            FormField::PaymentMethod => &self.payment_method,
            FormField::BankAccountNo => &self.bank_account_no,
            FormField::AccountName => &self.account_name,
        }
    }

    /// Set a field's text. Returns false (and changes nothing) for read-only fields.
    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) -> bool {
        let slot = match field {
            FormField::OrderNo => return false,
            FormField::ClientName => &mut self.client_name,
            FormField::MobileNumber => &mut self.mobile_number,
            FormField::PageName => &mut self.page_name,
            FormField::BkashAccountLastDigit => &mut self.bkash_account_last_digit,
            FormField::BkashTrxId => &mut self.bkash_trx_id,
            FormField::PaymentDate => &mut self.payment_date,
            FormField::PaymentMethod => &mut self.payment_method,
            FormField::BankAccountNo => &mut self.bank_account_no,
            FormField::AccountName => &mut self.account_name,
        };
        *slot = value.into();
        true
    }

    pub fn items(&self) -> &[ItemRow] {
        &self.items
    }

    /// Append a row at the end of the list, returning its key
    pub fn append_item(&mut self, draft: ItemDraft) -> RowKey {
        self.push_row(
            draft.description,
            draft.price.into_text(),
            draft.quantity.into_text(),
        )
    }

    /// Append the row the "Add Item" control creates
    pub fn append_blank_item(&mut self) -> RowKey {
        self.push_row(String::new(), "0".to_string(), "1".to_string())
    }

    /// Remove the row at `index`. Out-of-range indexes leave the list unchanged.
    pub fn remove_item(&mut self, index: usize) -> Option<ItemRow> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    /// Edit the row with the given key
    pub fn item_mut(&mut self, key: RowKey) -> Option<&mut ItemRow> {
        self.items.iter_mut().find(|row| row.key == key)
    }

    /// Copy the values of a draft into the form
    pub fn apply_draft(&mut self, draft: FormDraft) {
        let fields = [
            (FormField::ClientName, draft.client_name),
            (FormField::MobileNumber, draft.mobile_number),
            (FormField::PageName, draft.page_name),
            (FormField::BkashAccountLastDigit, draft.bkash_account_last_digit),
            (FormField::BkashTrxId, draft.bkash_trx_id),
            (FormField::PaymentDate, draft.payment_date),
            (FormField::PaymentMethod, draft.payment_method),
            (FormField::BankAccountNo, draft.bank_account_no),
            (FormField::AccountName, draft.account_name),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                self.set_field(field, value);
            }
        }

        if let Some(items) = draft.items {
            self.items.clear();
            for item in items {
                self.append_item(item);
            }
        }
    }

    /// Validate the form and build the record handed to the renderer.
    ///
    /// Every failing field is reported; no record is produced unless all
    /// required fields are filled in.
    pub fn submit(&self) -> Result<InvoiceRecord, ValidationErrors> {
        let mut errors = Vec::new();

        for (field, message) in [
            (FormField::ClientName, "Client name is required"),
            (FormField::MobileNumber, "Mobile number is required"),
            (FormField::PageName, "Page name is required"),
        ] {
            if self.value(field).trim().is_empty() {
                errors.push(field_error(field, message));
            }
        }

        let payment_date = parse_payment_date(&self.payment_date).map_err(|message| {
            errors.push(field_error(FormField::PaymentDate, message));
        });
        let payment_method = parse_payment_method(&self.payment_method).map_err(|message| {
            errors.push(field_error(FormField::PaymentMethod, message));
        });

        match (payment_date, payment_method) {
            (Ok(payment_date), Ok(payment_method)) if errors.is_empty() => Ok(InvoiceRecord {
                client_name: self.client_name.clone(),
                mobile_number: self.mobile_number.clone(),
                page_name: self.page_name.clone(),
                bkash_account_last_digit: self.bkash_account_last_digit.clone(),
                bkash_trx_id: self.bkash_trx_id.clone(),
                order_no: self.order_no.clone(),
                payment_date,
                payment_method,
                bank_account_no: self.bank_account_no.clone(),
                account_name: self.account_name.clone(),
                items: self.items.iter().map(ItemRow::to_line_item).collect(),
            }),
            _ => Err(ValidationErrors { errors }),
        }
    }

    fn push_row(&mut self, description: String, price: String, quantity: String) -> RowKey {
        let key = RowKey(self.next_key);
        self.next_key += 1;
        self.items.push(ItemRow {
            key,
            description,
            price,
            quantity,
        });
        key
    }
}

impl Default for InvoiceForm {
    fn default() -> Self {
        Self::new()
    }
}

fn field_error(field: FormField, message: &str) -> FieldError {
    FieldError {
        field,
        message: message.to_string(),
    }
}

fn parse_payment_date(value: &str) -> Result<NaiveDate, &'static str> {
    let value = value.trim();
    if value.is_empty() {
        return Err("Payment date is required");
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| "Payment date must be a valid date")
}

fn parse_payment_method(value: &str) -> Result<PaymentMethod, &'static str> {
    if value.trim().is_empty() {
        return Err("Payment method is required");
    }
    PaymentMethod::from_name(value).ok_or("Payment method must be bkash, bank or cash")
}

/// Numeric coercion of an input's text; anything that is not a finite number
/// (including `inf` and `nan` spellings) is NaN
pub fn coerce_number(value: &str) -> f64 {
    match value.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => f64::NAN,
    }
}

/// Short random order identifier, generated once per form
pub fn generate_order_no() -> String {
    let id = uuid::Uuid::new_v4().to_string();
    id[..ORDER_NO_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filled_form() -> InvoiceForm {
        let mut form = InvoiceForm::new();
        form.set_field(FormField::ClientName, "Rahim Uddin");
        form.set_field(FormField::MobileNumber, "01711000000");
        form.set_field(FormField::PageName, "Rahim Fashion");
        form.set_field(FormField::PaymentDate, "2024-05-01");
        form.set_field(FormField::PaymentMethod, "bkash");
        form
    }

    #[test]
    fn test_new_form_has_order_no() {
        let form = InvoiceForm::new();
        assert_eq!(form.order_no().len(), 8);
        assert!(form.order_no().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(form.value(FormField::OrderNo), form.order_no());
    }

    #[test]
    fn test_order_no_is_per_form() {
        let a = InvoiceForm::new();
        let b = InvoiceForm::new();
        assert_ne!(a.order_no(), b.order_no());
    }

    #[test]
    fn test_order_no_is_read_only() {
        let mut form = InvoiceForm::new();
        let before = form.order_no().to_string();
        assert!(!form.set_field(FormField::OrderNo, "changed"));
        assert_eq!(form.order_no(), before);
        assert!(FormField::OrderNo.is_read_only());
    }

    #[test]
    fn test_default_rows() {
        let form = InvoiceForm::new();
        let descriptions: Vec<&str> = form.items().iter().map(|r| r.description.as_str()).collect();
        assert_eq!(descriptions, ["Page Setup", "Promoting Page", "Cover Logo", "Algorithm"]);
        assert_eq!(form.items()[1].quantity, "2");
    }

    #[test]
    fn test_row_keys_are_stable_after_remove() {
        let mut form = InvoiceForm::new();
        let keys: Vec<RowKey> = form.items().iter().map(|r| r.key).collect();
        let removed = form.remove_item(1).unwrap();
        assert_eq!(removed.key, keys[1]);
        let remaining: Vec<RowKey> = form.items().iter().map(|r| r.key).collect();
        assert_eq!(remaining, vec![keys[0], keys[2], keys[3]]);

        let new_key = form.append_blank_item();
        assert!(!keys.contains(&new_key));
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut form = InvoiceForm::new();
        assert!(form.remove_item(10).is_none());
        assert_eq!(form.items().len(), 4);
    }

    #[test]
    fn test_append_blank_item() {
        let mut form = InvoiceForm::new();
        let key = form.append_blank_item();
        let row = form.items().last().unwrap();
        assert_eq!(row.key, key);
        assert_eq!(row.description, "");
        assert_eq!(row.price, "0");
        assert_eq!(row.quantity, "1");
    }

    #[test]
    fn test_item_mut_edits_by_key() {
        let mut form = InvoiceForm::new();
        let key = form.items()[2].key;
        form.remove_item(0);
        form.item_mut(key).unwrap().price = "500".to_string();
        assert_eq!(form.items()[1].price, "500");
    }

    #[test]
    fn test_submit_all_required_missing() {
        let form = InvoiceForm::new();
        let err = form.submit().unwrap_err();
        assert_eq!(
            err.fields(),
            vec![
                FormField::ClientName,
                FormField::MobileNumber,
                FormField::PageName,
                FormField::PaymentDate,
                FormField::PaymentMethod,
            ]
        );
        assert_eq!(err.message_for(FormField::ClientName), Some("Client name is required"));
        assert_eq!(err.message_for(FormField::PaymentMethod), Some("Payment method is required"));
    }

    #[test]
    fn test_submit_each_required_field_blocks() {
        for field in [
            FormField::ClientName,
            FormField::MobileNumber,
            FormField::PageName,
            FormField::PaymentDate,
            FormField::PaymentMethod,
        ] {
            let mut form = filled_form();
            form.set_field(field, "  ");
            let err = form.submit().unwrap_err();
            assert_eq!(err.fields(), vec![field]);
        }
    }

    #[test]
    fn test_submit_optional_fields_may_be_empty() {
        let record = filled_form().submit().unwrap();
        assert_eq!(record.bkash_trx_id, "");
        assert_eq!(record.account_name, "");
        assert_eq!(record.payment_method, PaymentMethod::Bkash);
        assert_eq!(record.payment_date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(record.items.len(), 4);
    }

    #[test]
    fn test_submit_without_items() {
        let mut form = filled_form();
        while form.remove_item(0).is_some() {}
        let record = form.submit().unwrap();
        assert!(record.items.is_empty());
        assert_eq!(record.total_amount(), 0.0);
    }

    #[test]
    fn test_submit_invalid_date_and_method() {
        let mut form = filled_form();
        form.set_field(FormField::PaymentDate, "01/05/2024");
        form.set_field(FormField::PaymentMethod, "card");
        let err = form.submit().unwrap_err();
        assert_eq!(
            err.message_for(FormField::PaymentDate),
            Some("Payment date must be a valid date")
        );
        assert_eq!(
            err.message_for(FormField::PaymentMethod),
            Some("Payment method must be bkash, bank or cash")
        );
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(coerce_number("1500"), 1500.0);
        assert_eq!(coerce_number(" 2.5 "), 2.5);
        assert!(coerce_number("").is_nan());
        assert!(coerce_number("abc").is_nan());
    }

    #[test]
    fn test_numeric_coercion_rejects_non_finite() {
        for text in ["inf", "-inf", "Infinity", "nan", "NaN", "1e400"] {
            assert!(coerce_number(text).is_nan(), "{text} should coerce to NaN");
        }

        let mut form = filled_form();
        form.apply_draft(FormDraft {
            items: Some(vec![ItemDraft {
                description: "Boost".to_string(),
                price: NumberInput::Text("inf".to_string()),
                quantity: NumberInput::Text("1".to_string()),
            }]),
            ..FormDraft::default()
        });
        let record = form.submit().unwrap();
        assert!(record.total_amount().is_nan());
    }

    #[test]
    fn test_submit_keeps_order_and_coerces() {
        let mut form = filled_form();
        form.apply_draft(FormDraft {
            items: Some(vec![
                ItemDraft::new("Design", 1500.0, 2.0),
                ItemDraft {
                    description: "Boost".to_string(),
                    price: NumberInput::Text("oops".to_string()),
                    quantity: NumberInput::Text("3".to_string()),
                },
            ]),
            ..FormDraft::default()
        });
        let record = form.submit().unwrap();
        assert_eq!(record.items[0], LineItem::new("Design", 1500.0, 2.0));
        assert_eq!(record.items[1].description, "Boost");
        assert!(record.items[1].price.is_nan());
        assert_eq!(record.items[1].quantity, 3.0);
    }

    #[test]
    fn test_draft_from_json() {
        let draft: FormDraft = serde_json::from_value(json!({
            "clientName": "Karim",
            "mobileNumber": "01800000000",
            "pageName": "Karim Foods",
            "orderNo": "ignored!",
            "paymentDate": "2024-06-10",
            "paymentMethod": "cash",
            "items": [
                { "description": "Design", "price": 1500, "quantity": "2" }
            ]
        }))
        .unwrap();

        let mut form = InvoiceForm::new();
        let order_no = form.order_no().to_string();
        form.apply_draft(draft);

        assert_eq!(form.order_no(), order_no);
        assert_eq!(form.items().len(), 1);
        assert_eq!(form.items()[0].price, "1500");
        let record = form.submit().unwrap();
        assert_eq!(record.total_amount(), 3000.0);
        assert_eq!(record.payment_method, PaymentMethod::Cash);
    }

    #[test]
    fn test_draft_without_items_keeps_seed() {
        let mut form = InvoiceForm::new();
        form.apply_draft(FormDraft {
            client_name: Some("Karim".to_string()),
            ..FormDraft::default()
        });
        assert_eq!(form.items().len(), 4);
        assert_eq!(form.value(FormField::ClientName), "Karim");
    }

    #[test]
    fn test_template_lists_seeded_rows() {
        let form = InvoiceForm::new();
        let template = FormDraft::template(&form);
        let value = serde_json::to_value(&template).unwrap();
        assert_eq!(value["clientName"], "");
        assert_eq!(value["items"][1]["description"], "Promoting Page");
        assert_eq!(value["items"][1]["quantity"], "2");
        assert!(value.get("orderNo").is_none());
    }
}

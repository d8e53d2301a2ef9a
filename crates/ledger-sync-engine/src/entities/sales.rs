//! Sales documents: invoices, quotes, orders and invoice payments.

use super::fields::{amount, int, opt, or_default, record, status_label};
use crate::entity::TransformContext;
use crate::types::Record;
use serde_json::{json, Value};

const INVOICE_STATUS: [(i64, &str); 5] = [
    (7, "draft"),
    (8, "pending"),
    (9, "paid"),
    (16, "partial"),
    (19, "cancelled"),
];

const QUOTE_STATUS: [(i64, &str); 4] = [
    (1, "draft"),
    (2, "pending"),
    (3, "accepted"),
    (4, "declined"),
];

const ORDER_COMPLETED: i64 = 6;

pub(crate) fn invoice(item: &Value, ctx: &TransformContext<'_>) -> Record {
    record(json!({
        "id": opt(item, "id"),
        "document_nr": opt(item, "document_nr"),
        "title": opt(item, "title"),
        "contact_id": opt(item, "contact_id"),
        "user_id": opt(item, "user_id"),
        "status": status_label(item, "kb_item_status_id", &INVOICE_STATUS),
        "is_valid_from": opt(item, "is_valid_from"),
        "is_valid_to": opt(item, "is_valid_to"),
        "total_gross": amount(item, "total_gross"),
        "total_net": amount(item, "total_net"),
        "total_taxes": amount(item, "total_taxes"),
        "total_received": amount(item, "total_received_payments"),
        "currency_id": opt(item, "currency_id"),
        "currency_code": or_default(item, "currency_code", "CHF"),
        "kb_item_status": opt(item, "kb_item_status_id"),
        "api_reference": opt(item, "api_reference"),
        "created_at": opt(item, "created_at"),
        "updated_at": opt(item, "updated_at"),
        "synced_at": ctx.synced_at,
    }))
}

pub(crate) fn quote(item: &Value, ctx: &TransformContext<'_>) -> Record {
    record(json!({
        "id": opt(item, "id"),
        "document_nr": opt(item, "document_nr"),
        "title": opt(item, "title"),
        "contact_id": opt(item, "contact_id"),
        "user_id": opt(item, "user_id"),
        "status": status_label(item, "kb_item_status_id", &QUOTE_STATUS),
        "is_valid_from": opt(item, "is_valid_from"),
        "is_valid_to": opt(item, "is_valid_to"),
        "total_gross": amount(item, "total_gross"),
        "total_net": amount(item, "total_net"),
        "total_taxes": amount(item, "total_taxes"),
        "currency_id": opt(item, "currency_id"),
        "kb_item_status": opt(item, "kb_item_status_id"),
        "api_reference": opt(item, "api_reference"),
        "created_at": opt(item, "created_at"),
        "updated_at": opt(item, "updated_at"),
        "synced_at": ctx.synced_at,
    }))
}

pub(crate) fn order(item: &Value, ctx: &TransformContext<'_>) -> Record {
    let status = if int(item, "kb_item_status_id") == Some(ORDER_COMPLETED) {
        "completed"
    } else {
        "open"
    };
    record(json!({
        "id": opt(item, "id"),
        "document_nr": opt(item, "document_nr"),
        "title": opt(item, "title"),
        "contact_id": opt(item, "contact_id"),
        "user_id": opt(item, "user_id"),
        "status": status,
        "is_valid_from": opt(item, "is_valid_from"),
        "total_gross": amount(item, "total_gross"),
        "total_net": amount(item, "total_net"),
        "total_taxes": amount(item, "total_taxes"),
        "currency_id": opt(item, "currency_id"),
        "kb_item_status": opt(item, "kb_item_status_id"),
        "api_reference": opt(item, "api_reference"),
        "created_at": opt(item, "created_at"),
        "updated_at": opt(item, "updated_at"),
        "synced_at": ctx.synced_at,
    }))
}

/// Payment of an invoice; the invoice id comes from the parent item.
pub(crate) fn invoice_payment(item: &Value, ctx: &TransformContext<'_>) -> Record {
    let invoice_id = ctx
        .parent_id
        .cloned()
        .unwrap_or_else(|| opt(item, "kb_invoice_id"));
    record(json!({
        "id": opt(item, "id"),
        "invoice_id": invoice_id,
        "date": opt(item, "date"),
        "amount": amount(item, "value"),
        "bank_account_id": opt(item, "bank_account_id"),
        "title": opt(item, "title"),
        "is_cash_discount": opt(item, "is_cash_discount"),
        "synced_at": ctx.synced_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CTX: TransformContext<'static> = TransformContext {
        synced_at: "2024-03-01T05:00:00.000Z",
        parent_id: None,
    };

    #[test]
    fn invoice_status_and_amounts() {
        let row = invoice(
            &json!({
                "id": 101,
                "document_nr": "RE-00101",
                "kb_item_status_id": 16,
                "total_gross": "1077.00",
                "total_received_payments": "500",
            }),
            &CTX,
        );
        assert_eq!(row["status"], "partial");
        assert_eq!(row["total_gross"], 1077.0);
        assert_eq!(row["total_received"], 500.0);
        assert_eq!(row["total_net"], 0.0);
        assert_eq!(row["currency_code"], "CHF");
        assert_eq!(row["kb_item_status"], 16);
    }

    #[test]
    fn unknown_invoice_status() {
        let row = invoice(&json!({ "id": 1, "kb_item_status_id": 99 }), &CTX);
        assert_eq!(row["status"], "unknown");
    }

    #[test]
    fn quote_labels() {
        let row = quote(&json!({ "id": 5, "kb_item_status_id": 3 }), &CTX);
        assert_eq!(row["status"], "accepted");
        assert!(row.get("currency_code").is_none());
    }

    #[test]
    fn order_completion() {
        assert_eq!(order(&json!({ "id": 1, "kb_item_status_id": 6 }), &CTX)["status"], "completed");
        assert_eq!(order(&json!({ "id": 2, "kb_item_status_id": 5 }), &CTX)["status"], "open");
        assert_eq!(order(&json!({ "id": 3 }), &CTX)["status"], "open");
    }

    #[test]
    fn payment_takes_invoice_from_parent() {
        let parent = json!(101);
        let ctx = TransformContext {
            synced_at: CTX.synced_at,
            parent_id: Some(&parent),
        };
        let item = json!({ "id": 7, "value": "250.00", "date": "2024-02-20" });
        let row = invoice_payment(&item, &ctx);
        assert_eq!(row["invoice_id"], 101);
        assert_eq!(row["amount"], 250.0);
    }
}

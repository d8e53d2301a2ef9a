//! Supplier bills.

use super::fields::{amount, opt, or_default, record, string_id};
use crate::entity::TransformContext;
use crate::types::Record;
use serde_json::{json, Value};

/// Bills carry UUID-style ids upstream; they are stored as strings.
pub(crate) fn bill(item: &Value, ctx: &TransformContext<'_>) -> Record {
    record(json!({
        "id": string_id(item, "id"),
        "document_nr": opt(item, "document_nr"),
        "title": opt(item, "title"),
        "contact_id": opt(item, "vendor_ref"),
        "status": or_default(item, "status", "draft"),
        "bill_date": opt(item, "bill_date"),
        "due_date": opt(item, "due_date"),
        "total_gross": amount(item, "total_gross"),
        "total_net": amount(item, "total_net"),
        "total_taxes": amount(item, "total_taxes"),
        "total_paid": amount(item, "amount_paid"),
        "currency_id": opt(item, "currency_id"),
        "currency_code": or_default(item, "currency_code", "CHF"),
        "pending_amount": amount(item, "pending_amount"),
        "created_at": opt(item, "created_at"),
        "updated_at": opt(item, "updated_at"),
        "synced_at": ctx.synced_at,
    }))
}

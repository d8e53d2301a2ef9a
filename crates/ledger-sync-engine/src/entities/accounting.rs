//! Reference and ledger data: currencies, taxes, chart of accounts, journal.

use super::fields::{amount, flag, opt, record};
use crate::entity::TransformContext;
use crate::types::Record;
use serde_json::{json, Value};

pub(crate) fn currency(item: &Value, ctx: &TransformContext<'_>) -> Record {
    record(json!({
        "id": opt(item, "id"),
        "code": opt(item, "name"),
        "round_factor": amount(item, "round_factor"),
        "synced_at": ctx.synced_at,
    }))
}

pub(crate) fn tax(item: &Value, ctx: &TransformContext<'_>) -> Record {
    record(json!({
        "id": opt(item, "id"),
        "uuid": opt(item, "uuid"),
        "name": opt(item, "name"),
        "code": opt(item, "code"),
        "display_name": opt(item, "display_name"),
        "tax_type": opt(item, "type"),
        "rate": amount(item, "value"),
        "net_tax_value": opt(item, "net_tax_value"),
        "account_id": opt(item, "account_id"),
        "start_year": opt(item, "start_year"),
        "end_year": opt(item, "end_year"),
        "is_active": flag(item, "is_active"),
        "synced_at": ctx.synced_at,
    }))
}

pub(crate) fn account_group(item: &Value, ctx: &TransformContext<'_>) -> Record {
    record(json!({
        "id": opt(item, "id"),
        "account_no": opt(item, "account_no"),
        "name": opt(item, "name"),
        "parent_id": opt(item, "parent_fibu_account_group_id"),
        "is_active": flag(item, "is_active"),
        "is_locked": flag(item, "is_locked"),
        "synced_at": ctx.synced_at,
    }))
}

pub(crate) fn account(item: &Value, ctx: &TransformContext<'_>) -> Record {
    record(json!({
        "id": opt(item, "id"),
        "account_no": opt(item, "account_no"),
        "name": opt(item, "name"),
        "account_group_id": opt(item, "fibu_account_group_id"),
        "account_type": opt(item, "account_type"),
        "tax_id": opt(item, "tax_id"),
        "is_active": flag(item, "is_active"),
        "is_locked": flag(item, "is_locked"),
        "synced_at": ctx.synced_at,
    }))
}

pub(crate) fn journal_entry(item: &Value, ctx: &TransformContext<'_>) -> Record {
    record(json!({
        "id": opt(item, "id"),
        "ref_id": opt(item, "ref_id"),
        "ref_class": opt(item, "ref_class"),
        "date": opt(item, "date"),
        "debit_account_id": opt(item, "debit_account_id"),
        "credit_account_id": opt(item, "credit_account_id"),
        "description": opt(item, "description"),
        "amount": amount(item, "amount"),
        "currency_id": opt(item, "currency_id"),
        "currency_factor": amount(item, "currency_factor"),
        "base_amount": amount(item, "base_currency_amount"),
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
    fn tax_rate_is_numeric() {
        let row = tax(
            &json!({
                "id": 16,
                "name": "UN81",
                "value": "8.1",
                "type": "sales_tax",
                "is_active": true
            }),
            &CTX,
        );
        assert_eq!(row["rate"], 8.1);
        assert_eq!(row["tax_type"], "sales_tax");
        assert_eq!(row["is_active"], true);
    }

    #[test]
    fn journal_amounts_default_to_zero() {
        let row = journal_entry(&json!({ "id": 1, "debit_account_id": 77 }), &CTX);
        assert_eq!(row["amount"], 0.0);
        assert_eq!(row["base_amount"], 0.0);
        assert_eq!(row["debit_account_id"], 77);
    }

    #[test]
    fn account_links_group() {
        let item = json!({ "id": 3, "account_no": "1020", "fibu_account_group_id": 9 });
        let row = account(&item, &CTX);
        assert_eq!(row["account_group_id"], 9);
        assert_eq!(row["is_locked"], false);
    }
}

//! Bank accounts.

use super::fields::{opt, record};
use crate::entity::TransformContext;
use crate::types::Record;
use serde_json::{json, Value};

pub(crate) fn bank_account(item: &Value, ctx: &TransformContext<'_>) -> Record {
    record(json!({
        "id": opt(item, "id"),
        "name": opt(item, "name"),
        "owner": opt(item, "owner"),
        "iban": opt(item, "iban_nr"),
        "bc_nr": opt(item, "bc_nr"),
        "currency_id": opt(item, "currency_id"),
        "account_id": opt(item, "account_id"),
        "account_type": opt(item, "type"),
        "remarks": opt(item, "remarks"),
        "synced_at": ctx.synced_at,
    }))
}

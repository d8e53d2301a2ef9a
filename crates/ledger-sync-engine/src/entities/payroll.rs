//! Payroll employees.

use super::fields::{opt, record, string_id};
use crate::entity::TransformContext;
use crate::types::Record;
use serde_json::{json, Value};

pub(crate) fn employee(item: &Value, ctx: &TransformContext<'_>) -> Record {
    record(json!({
        "id": string_id(item, "id"),
        "first_name": opt(item, "first_name"),
        "last_name": opt(item, "last_name"),
        "email": opt(item, "email"),
        "personal_number": opt(item, "personal_number"),
        "date_of_birth": opt(item, "date_of_birth"),
        "entry_date": opt(item, "entry_date"),
        "exit_date": opt(item, "exit_date"),
        "synced_at": ctx.synced_at,
    }))
}

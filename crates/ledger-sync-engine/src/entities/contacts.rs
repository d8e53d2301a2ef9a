//! Contacts (customers and suppliers).

use super::fields::{has_group, opt, record};
use crate::entity::TransformContext;
use crate::types::Record;
use serde_json::{json, Value};

const CUSTOMER_GROUP: i64 = 1;
const SUPPLIER_GROUP: i64 = 2;

pub(crate) fn contact(item: &Value, ctx: &TransformContext<'_>) -> Record {
    record(json!({
        "id": opt(item, "id"),
        "nr": opt(item, "nr"),
        "contact_type": opt(item, "contact_type_id"),
        "name_1": opt(item, "name_1"),
        "name_2": opt(item, "name_2"),
        "email": opt(item, "mail"),
        "phone": opt(item, "phone_fixed"),
        "address": opt(item, "address"),
        "postcode": opt(item, "postcode"),
        "city": opt(item, "city"),
        "country_id": opt(item, "country_id"),
        "is_customer": has_group(item, "contact_group_ids", CUSTOMER_GROUP),
        "is_supplier": has_group(item, "contact_group_ids", SUPPLIER_GROUP),
        "owner_id": opt(item, "user_id"),
        "updated_at": opt(item, "updated_at"),
        "synced_at": ctx.synced_at,
    }))
}

//! Registry of synced entities and named modes.
//!
//! [`ENTITIES`] is listed in execution order: reference data, master data,
//! transactional documents, then data that depends on transactional
//! documents.

mod accounting;
mod banking;
mod contacts;
mod fields;
mod payroll;
mod purchases;
mod sales;

use crate::entity::{EntitySpec, Phase, Source};

pub static ENTITIES: &[EntitySpec] = &[
    EntitySpec {
        name: "currencies",
        table: "currencies",
        phase: Phase::Reference,
        source: Source::Collection {
            path: "/3.0/currencies",
        },
        transform: accounting::currency,
    },
    EntitySpec {
        name: "taxes",
        table: "taxes",
        phase: Phase::Reference,
        source: Source::Collection { path: "/3.0/taxes" },
        transform: accounting::tax,
    },
    EntitySpec {
        name: "account_groups",
        table: "account_groups",
        phase: Phase::Reference,
        source: Source::Collection {
            path: "/2.0/account_groups",
        },
        transform: accounting::account_group,
    },
    EntitySpec {
        name: "accounts",
        table: "accounts",
        phase: Phase::Reference,
        source: Source::Collection {
            path: "/2.0/accounts",
        },
        transform: accounting::account,
    },
    EntitySpec {
        name: "bank_accounts",
        table: "bank_accounts",
        phase: Phase::Reference,
        source: Source::Collection {
            path: "/3.0/banking/accounts",
        },
        transform: banking::bank_account,
    },
    EntitySpec {
        name: "contacts",
        table: "contacts",
        phase: Phase::Master,
        source: Source::Collection {
            path: "/2.0/contact",
        },
        transform: contacts::contact,
    },
    EntitySpec {
        name: "employees",
        table: "employees",
        phase: Phase::Master,
        source: Source::Collection {
            path: "/4.0/payroll/employees",
        },
        transform: payroll::employee,
    },
    EntitySpec {
        name: "invoices",
        table: "invoices",
        phase: Phase::Transactional,
        source: Source::Collection {
            path: INVOICES_PATH,
        },
        transform: sales::invoice,
    },
    EntitySpec {
        name: "quotes",
        table: "quotes",
        phase: Phase::Transactional,
        source: Source::Collection {
            path: "/2.0/kb_offer",
        },
        transform: sales::quote,
    },
    EntitySpec {
        name: "orders",
        table: "orders",
        phase: Phase::Transactional,
        source: Source::Collection {
            path: "/2.0/kb_order",
        },
        transform: sales::order,
    },
    EntitySpec {
        name: "bills",
        table: "bills",
        phase: Phase::Transactional,
        source: Source::Collection {
            path: "/4.0/purchase/bills",
        },
        transform: purchases::bill,
    },
    EntitySpec {
        name: "journal_entries",
        table: "journal_entries",
        phase: Phase::Transactional,
        source: Source::Collection {
            path: "/3.0/accounting/journal",
        },
        transform: accounting::journal_entry,
    },
    EntitySpec {
        name: "invoice_payments",
        table: "invoice_payments",
        phase: Phase::Dependent,
        source: Source::PerParent {
            parent: INVOICES_PATH,
            child: "/2.0/kb_invoice/{id}/payment",
        },
        transform: sales::invoice_payment,
    },
];

const INVOICES_PATH: &str = "/2.0/kb_invoice";

/// A named subset of entities.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct Mode {
    pub name: &'static str,
    pub entities: &'static [&'static str],
}

pub static MODES: &[Mode] = &[
    Mode {
        name: "daily",
        entities: &["invoices", "quotes", "orders", "bills"],
    },
    Mode {
        name: "reference",
        entities: &["currencies", "taxes", "account_groups", "accounts", "bank_accounts"],
    },
    Mode {
        name: "accounting",
        entities: &["currencies", "taxes", "account_groups", "accounts", "journal_entries"],
    },
    Mode {
        name: "sales",
        entities: &["contacts", "invoices", "quotes", "orders", "invoice_payments"],
    },
    Mode {
        name: "payroll",
        entities: &["employees"],
    },
    Mode {
        name: "banking",
        entities: &["bank_accounts"],
    },
];

/// Look up an entity by name.
pub fn entity(name: &str) -> Option<&'static EntitySpec> {
    ENTITIES.iter().find(|spec| spec.name == name)
}

/// Look up a mode by name.
pub fn mode(name: &str) -> Option<&'static Mode> {
    MODES.iter().find(|mode| mode.name == name)
}

/// Every entity, in execution order.
pub fn all() -> Vec<&'static EntitySpec> {
    ENTITIES.iter().collect()
}

impl Mode {
    /// The mode's entities in global execution order, regardless of the
    /// order they are listed in.
    pub fn specs(&self) -> Vec<&'static EntitySpec> {
        ENTITIES
            .iter()
            .filter(|spec| self.entities.contains(&spec.name))
            .collect()
    }
}

/// Upstream paths whose collections dependent entities iterate.
pub fn parent_paths() -> Vec<&'static str> {
    let mut paths: Vec<&'static str> = ENTITIES
        .iter()
        .filter_map(|spec| match spec.source {
            Source::PerParent { parent, .. } => Some(parent),
            Source::Collection { .. } => None,
        })
        .collect();
    paths.dedup();
    paths
}

fn main() {
    // Recompile when compile-time defaults change; option_env!() values are
    // otherwise cached between builds.
    println!("cargo:rerun-if-env-changed=LEDGER_SYNC_DEFAULT_UPSTREAM_URL");
    println!("cargo:rerun-if-env-changed=LEDGER_SYNC_DEFAULT_AUDIT_TABLE");
}

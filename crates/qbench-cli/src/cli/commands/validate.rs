use serde_json::json;

use super::{exit_codes, init_logging, load_catalog_or_builtin};
use crate::cli::args::ValidateArgs;

pub fn run(args: ValidateArgs) -> anyhow::Result<i32> {
    init_logging(None);

    // Validation is always strict: unknown fields are errors here.
    match load_catalog_or_builtin(args.catalog.as_deref(), true) {
        Ok((cat, origin)) => {
            if args.format == "json" {
                let out = json!({
                    "ok": true,
                    "catalog": cat.name,
                    "origin": origin,
                    "queries": cat.queries.len(),
                    "groups": cat.groups(),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                eprintln!(
                    "✅ {} ({}): {} queries in {} groups",
                    cat.name,
                    origin,
                    cat.queries.len(),
                    cat.groups().len()
                );
            }
            Ok(exit_codes::OK)
        }
        Err(e) => {
            if args.format == "json" {
                let out = json!({ "ok": false, "error": e.to_string() });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                eprintln!("❌ {}", e);
            }
            Ok(exit_codes::CONFIG_ERROR)
        }
    }
}

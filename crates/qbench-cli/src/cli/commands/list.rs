use super::{exit_codes, load_catalog_or_builtin};
use crate::cli::args::ListArgs;

pub fn run(args: ListArgs) -> anyhow::Result<i32> {
    let (cat, _) = match load_catalog_or_builtin(args.catalog.as_deref(), false) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config error: {}", e);
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };
    for q in &cat.queries {
        match (&q.group, q.variant) {
            (Some(g), Some(v)) => println!("{}\t{}\t{}", q.name, g, v.as_str()),
            (Some(g), None) => println!("{}\t{}", q.name, g),
            _ => println!("{}", q.name),
        }
    }
    Ok(exit_codes::OK)
}

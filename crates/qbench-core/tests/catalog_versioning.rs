use qbench_core::config::load_catalog;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_catalog_version_defaults() -> anyhow::Result<()> {
    let mut tmp = NamedTempFile::new()?;
    writeln!(
        tmp,
        r#"
name: legacy
queries:
  - name: q1
    sql: SELECT 1
"#
    )?;

    let cat = load_catalog(tmp.path(), true)?;
    assert_eq!(cat.version, 0, "Missing version is accepted as 0");
    assert_eq!(cat.name, "legacy");
    assert!(cat.location.is_none());
    Ok(())
}

#[test]
fn test_catalog_explicit_v1_with_pairs() -> anyhow::Result<()> {
    let mut tmp = NamedTempFile::new()?;
    writeln!(
        tmp,
        r#"
version: 1
name: pairs
location: EU
queries:
  - name: a_base
    group: a
    variant: baseline
    sql: |
      SELECT COUNT(*) FROM t
  - name: a_opt
    group: a
    variant: optimized
    sql: SELECT COUNT(1) FROM t
"#
    )?;

    let cat = load_catalog(tmp.path(), true)?;
    assert_eq!(cat.location.as_deref(), Some("EU"));
    assert_eq!(cat.names().collect::<Vec<_>>(), vec!["a_base", "a_opt"]);
    assert_eq!(cat.groups(), vec!["a".to_string()]);
    assert_eq!(cat.queries[0].sql.trim(), "SELECT COUNT(*) FROM t");
    Ok(())
}

#[test]
fn test_yaml_anchor_keys_are_not_unknown_fields() -> anyhow::Result<()> {
    let mut tmp = NamedTempFile::new()?;
    writeln!(
        tmp,
        r#"
version: 1
x-common: &window "WHERE block_timestamp >= TIMESTAMP('2023-06-01')"
queries:
  - name: q1
    sql: SELECT 1
"#
    )?;
    assert!(load_catalog(tmp.path(), true).is_ok());
    Ok(())
}

#[test]
fn test_missing_file_is_config_error() {
    let err = load_catalog(std::path::Path::new("/nonexistent/catalog.yaml"), true).unwrap_err();
    assert!(err.to_string().contains("failed to read catalog"));
}

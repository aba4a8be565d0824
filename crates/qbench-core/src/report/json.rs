use crate::model::RunArtifacts;
use std::path::Path;

pub fn write_json(artifacts: &RunArtifacts, out: &Path) -> anyhow::Result<()> {
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let doc = serde_json::json!({
        "schema_version": 1,
        "qbench_version": env!("CARGO_PKG_VERSION"),
        "catalog": artifacts.catalog,
        "backend": artifacts.backend,
        "started_at": artifacts.started_at,
        "finished_at": artifacts.finished_at,
        "completed": artifacts.completed(),
        "failed": artifacts.failed(),
        "outcomes": artifacts.outcomes,
    });
    std::fs::write(out, serde_json::to_string_pretty(&doc)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DefinitionState, QueryDefinition, QueryOutcome};

    #[test]
    fn test_json_counts_and_states() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("run.json");

        let mut ok = QueryOutcome::pending(&QueryDefinition::new("a", "SELECT 1"));
        ok.state = DefinitionState::Completed;
        let mut bad = QueryOutcome::pending(&QueryDefinition::new("b", "SELECT 2"));
        bad.state = DefinitionState::SubmissionFailed;
        bad.error = Some("no job id".into());

        let artifacts = RunArtifacts {
            catalog: "demo".into(),
            backend: "fake".into(),
            started_at: "2024-01-01T00:00:00Z".into(),
            finished_at: "2024-01-01T00:00:05Z".into(),
            outcomes: vec![ok, bad],
        };
        write_json(&artifacts, &out).unwrap();

        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(v["completed"], 1);
        assert_eq!(v["failed"], 1);
        assert_eq!(v["outcomes"][1]["state"], "submission_failed");
        assert_eq!(v["outcomes"][1]["error"], "no job id");
    }
}

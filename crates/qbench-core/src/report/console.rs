use crate::model::{DefinitionState, QueryOutcome, Variant};
use std::fmt::Write;

/// Baseline vs. optimized comparison for one group. Duration and slot time
/// are kept apart: a faster variant can still consume more slot time.
#[derive(Debug, Clone, PartialEq)]
pub struct PairDelta {
    pub group: String,
    pub baseline: String,
    pub optimized: String,
    pub duration_delta_ms: Option<i64>,
    pub slot_delta_ms: Option<i64>,
    pub bytes_delta: Option<i64>,
}

impl PairDelta {
    pub fn faster(&self) -> Option<bool> {
        self.duration_delta_ms.map(|d| d < 0)
    }

    pub fn fewer_slots(&self) -> Option<bool> {
        self.slot_delta_ms.map(|d| d < 0)
    }
}

pub fn pair_deltas(outcomes: &[QueryOutcome]) -> Vec<PairDelta> {
    let mut groups: Vec<&str> = Vec::new();
    for o in outcomes {
        if let Some(g) = o.group.as_deref() {
            if !groups.contains(&g) {
                groups.push(g);
            }
        }
    }

    let mut out = Vec::new();
    for g in groups {
        let find = |v: Variant| {
            outcomes.iter().find(|o| {
                o.group.as_deref() == Some(g)
                    && o.variant == Some(v)
                    && o.state == DefinitionState::Completed
            })
        };
        let (Some(base), Some(opt)) = (find(Variant::Baseline), find(Variant::Optimized)) else {
            continue;
        };
        let b = base.stats.clone().unwrap_or_default();
        let o = opt.stats.clone().unwrap_or_default();
        out.push(PairDelta {
            group: g.to_string(),
            baseline: base.name.clone(),
            optimized: opt.name.clone(),
            duration_delta_ms: diff(o.duration_ms, b.duration_ms),
            slot_delta_ms: diff(o.slot_ms.map(|x| x as i64), b.slot_ms.map(|x| x as i64)),
            bytes_delta: diff(
                o.bytes_processed.map(|x| x as i64),
                b.bytes_processed.map(|x| x as i64),
            ),
        });
    }
    out
}

fn diff(after: Option<i64>, before: Option<i64>) -> Option<i64> {
    Some(after? - before?)
}

fn fmt_opt(v: Option<i64>) -> String {
    v.map(|x| format!("{:+}", x)).unwrap_or_else(|| "n/a".into())
}

fn human_bytes(b: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut v = b as f64;
    let mut i = 0;
    while v >= 1024.0 && i < UNITS.len() - 1 {
        v /= 1024.0;
        i += 1;
    }
    if i == 0 {
        format!("{} B", b)
    } else {
        format!("{:.2} {}", v, UNITS[i])
    }
}

pub fn render_summary(outcomes: &[QueryOutcome]) -> String {
    let mut out = String::new();
    let mut completed = 0;
    let mut failed = 0;
    let mut partial = 0;

    let _ = writeln!(out, "\nRan {} queries:", outcomes.len());

    for o in outcomes {
        match o.state {
            DefinitionState::Completed => {
                completed += 1;
                let s = o.stats.clone().unwrap_or_default();
                if o.stats_missing {
                    partial += 1;
                    let _ = writeln!(out, "⚠️  {:<28} stats unavailable", o.name);
                } else {
                    let duration = s
                        .duration_ms
                        .map(|d| format!("({:.1}s)", d as f64 / 1000.0))
                        .unwrap_or_default();
                    let _ = writeln!(
                        out,
                        "✅ {:<28} {:>12}  {:>10} slot-ms  {}",
                        o.name,
                        s.bytes_processed.map(human_bytes).unwrap_or_default(),
                        s.slot_ms.map(|x| x.to_string()).unwrap_or_default(),
                        duration
                    );
                }
            }
            DefinitionState::SubmissionFailed | DefinitionState::WaitFailed => {
                failed += 1;
                let label = if o.state == DefinitionState::WaitFailed {
                    "wait"
                } else {
                    "submit"
                };
                let _ = writeln!(
                    out,
                    "❌ {:<28} {} failed: {}",
                    o.name,
                    label,
                    o.error.as_deref().unwrap_or("unknown error")
                );
            }
            DefinitionState::Pending | DefinitionState::Submitted => {
                let _ = writeln!(out, "💥 {:<28} did not finish", o.name);
            }
        }
    }

    let deltas = pair_deltas(outcomes);
    if !deltas.is_empty() {
        let _ = writeln!(out, "\nOptimized vs. baseline:");
        for d in &deltas {
            let _ = writeln!(
                out,
                "  {:<20} duration {:>10} ms   slots {:>12} ms   bytes {:>16}",
                d.group,
                fmt_opt(d.duration_delta_ms),
                fmt_opt(d.slot_delta_ms),
                fmt_opt(d.bytes_delta)
            );
            if d.faster() == Some(true) && d.fewer_slots() == Some(false) {
                let _ = writeln!(out, "    note: faster wall-clock but more slot time consumed");
            }
        }
    }

    let _ = writeln!(out, "\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    let _ = writeln!(
        out,
        "Summary: {} completed ({} without stats), {} failed",
        completed, partial, failed
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExecutionStats, QueryDefinition};

    fn done(name: &str, group: &str, variant: Variant, dur: i64, slots: u64) -> QueryOutcome {
        let mut def = QueryDefinition::new(name, "SELECT 1");
        def.group = Some(group.into());
        def.variant = Some(variant);
        let mut o = QueryOutcome::pending(&def);
        o.state = DefinitionState::Completed;
        o.stats = Some(ExecutionStats {
            duration_ms: Some(dur),
            slot_ms: Some(slots),
            bytes_processed: Some(1000),
            ..Default::default()
        });
        o
    }

    #[test]
    fn test_faster_but_more_slots_is_reported_as_both() {
        let outcomes = vec![
            done("q2_base", "top_n", Variant::Baseline, 5000, 1000),
            done("q2_opt", "top_n", Variant::Optimized, 3000, 1500),
        ];
        let d = pair_deltas(&outcomes);
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].duration_delta_ms, Some(-2000));
        assert_eq!(d[0].slot_delta_ms, Some(500));
        assert_eq!(d[0].bytes_delta, Some(0));
        assert_eq!(d[0].faster(), Some(true));
        assert_eq!(d[0].fewer_slots(), Some(false));
    }

    #[test]
    fn test_incomplete_pair_is_skipped() {
        let mut failed = done("q1_opt", "cte", Variant::Optimized, 10, 10);
        failed.state = DefinitionState::WaitFailed;
        let outcomes = vec![done("q1_base", "cte", Variant::Baseline, 20, 20), failed];
        assert!(pair_deltas(&outcomes).is_empty());
    }

    #[test]
    fn test_render_counts_and_note() {
        let mut bad = QueryOutcome::pending(&QueryDefinition::new("q9", "SELECT 9"));
        bad.state = DefinitionState::SubmissionFailed;
        bad.error = Some("no job id".into());
        let outcomes = vec![
            done("q2_base", "top_n", Variant::Baseline, 5000, 1000),
            done("q2_opt", "top_n", Variant::Optimized, 3000, 1500),
            bad,
        ];
        let text = render_summary(&outcomes);
        assert!(text.contains("Summary: 2 completed (0 without stats), 1 failed"));
        assert!(text.contains("submit failed: no job id"));
        assert!(text.contains("faster wall-clock but more slot time"));
    }

    #[test]
    fn test_human_bytes() {
        assert_eq!(human_bytes(512), "512 B");
        assert_eq!(human_bytes(1536), "1.50 KiB");
        assert_eq!(human_bytes(3 * 1024 * 1024 * 1024), "3.00 GiB");
    }
}

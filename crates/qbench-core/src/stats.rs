//! Extraction of job ids and execution statistics from raw backend output.

use crate::model::ExecutionStats;
use serde_json::Value;

const STARTED_PREFIX: &str = "Successfully started query ";

/// Finds the job id in a submission response.
///
/// Accepts the JSON job resource (`jobReference.jobId`) and falls back to the
/// plain-text `Successfully started query <project>:<location>.<job_id>` line.
pub fn parse_job_id(raw: &str) -> Option<String> {
    if let Ok(v) = serde_json::from_str::<Value>(raw.trim()) {
        if let Some(id) = v.pointer("/jobReference/jobId").and_then(|x| x.as_str()) {
            return valid_job_id(id);
        }
    }

    for line in raw.lines() {
        if let Some(rest) = line.trim().strip_prefix(STARTED_PREFIX) {
            let token = rest.split_whitespace().next()?;
            let id = match token.rsplit_once(':') {
                Some((_, loc_and_id)) => loc_and_id
                    .split_once('.')
                    .map(|(_, id)| id)
                    .unwrap_or(loc_and_id),
                None => token,
            };
            return valid_job_id(id);
        }
    }
    None
}

fn valid_job_id(id: &str) -> Option<String> {
    let id = id.trim();
    if id.is_empty() || id == "null" {
        return None;
    }
    if id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        Some(id.to_string())
    } else {
        None
    }
}

/// Wall-clock duration in whole milliseconds: the fractional difference is
/// floored, so 1000.7 -> 2500.2 is 1499. Non-finite or out-of-range
/// timestamps yield `None`.
pub fn duration_ms(start_ms: f64, end_ms: f64) -> Option<i64> {
    if !start_ms.is_finite() || !end_ms.is_finite() {
        return None;
    }
    let d = (end_ms - start_ms).floor();
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
    if !d.is_finite() || d < i64::MIN as f64 || d >= i64::MAX as f64 {
        return None;
    }
    Some(d as i64)
}

/// Parses a `show -j` job resource. Fields the backend did not report are
/// left as `None`; only unparseable input is an error.
pub fn parse_stats(raw: &str) -> Result<ExecutionStats, String> {
    let v: Value = serde_json::from_str(raw.trim())
        .map_err(|e| format!("stats response is not JSON: {}", e))?;
    let s = v
        .get("statistics")
        .ok_or_else(|| "stats response has no 'statistics' object".to_string())?;

    let start_time_ms = s.get("startTime").and_then(as_f64);
    let end_time_ms = s.get("endTime").and_then(as_f64);
    let duration_ms = match (start_time_ms, end_time_ms) {
        (Some(a), Some(b)) => duration_ms(a, b),
        _ => None,
    };

    let bytes_processed = s
        .get("totalBytesProcessed")
        .or_else(|| s.pointer("/query/totalBytesProcessed"))
        .and_then(as_u64);
    let slot_ms = s
        .pointer("/query/totalSlotMs")
        .or_else(|| s.get("totalSlotMs"))
        .and_then(as_u64);

    Ok(ExecutionStats {
        start_time_ms,
        end_time_ms,
        duration_ms,
        bytes_processed,
        slot_ms,
        bytes_billed: s.pointer("/query/totalBytesBilled").and_then(as_u64),
        cache_hit: s.pointer("/query/cacheHit").and_then(|x| x.as_bool()),
    })
}

// The backend reports int64 fields as JSON strings.
fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn as_u64(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

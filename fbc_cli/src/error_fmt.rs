//! Human-readable error descriptions, run aborts, and structured JSON errors.

use fbc_core::Confidence;
use thiserror::Error;

/// Non-success endings of a run that still produced a controller summary.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RunAbort {
    #[error("run timed out after {timeout_ms} ms ({ticks} ticks)")]
    Timeout { timeout_ms: u64, ticks: u64 },
    #[error("actuator stalled at position {position} (output {output})")]
    Stalled { position: i32, output: i32 },
    #[error("run interrupted after {ticks} ticks")]
    Interrupted { ticks: u64 },
}

impl RunAbort {
    pub fn name(&self) -> &'static str {
        match self {
            RunAbort::Timeout { .. } => "Timeout",
            RunAbort::Stalled { .. } => "Stalled",
            RunAbort::Interrupted { .. } => "Interrupted",
        }
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use fbc_core::error::{BuildError, FbcError};

    if let Some(abort) = err.downcast_ref::<RunAbort>() {
        return match abort {
            RunAbort::Timeout { .. } => format!(
                "What happened: The {abort}.\nLikely causes: Gains too low, tolerance too tight, or the goal is out of reach.\nHow to fix: Raise --timeout-ms or runner.timeout_ms, or retune the [strategy] gains."
            ),
            RunAbort::Stalled { .. } => format!(
                "What happened: The {abort}.\nLikely causes: Mechanical jam, load too high, or deadband too small to overcome friction.\nHow to fix: Check the mechanism, then raise controller.pos_deadband/neg_deadband if the motor hums without moving."
            ),
            RunAbort::Interrupted { .. } => format!(
                "What happened: The {abort}.\nLikely causes: Ctrl-C or SIGINT before the controller settled.\nHow to fix: Nothing to fix; the actuator was driven to 0 before exit."
            ),
        };
    }

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingActuator | BuildError::MissingSensor => format!(
                "What happened: {be}.\nLikely causes: Hardware failed to initialize or was not wired into the builder.\nHow to fix: Ensure both actuator and sensor are created and passed to the builder."
            ),
            BuildError::MissingStrategy => "What happened: No compute strategy was configured.\nLikely causes: The [strategy] section is missing.\nHow to fix: Add [strategy] with kind = \"pidmod\", \"clegg\" or \"hysteresis\".".to_string(),
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(fe) = err.downcast_ref::<FbcError>() {
        if matches!(fe, FbcError::Timeout) {
            return "What happened: Sensor read timed out.\nLikely causes: Encoder disconnected or not powered.\nHow to fix: Check sensor wiring and power, then rerun.".to_string();
        }
        return format!(
            "What happened: {fe}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
        );
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("read config") {
        return format!(
            "What happened: Could not read the config file.\nLikely causes: Wrong --config path or missing permissions.\nHow to fix: Pass --config FILE pointing at a readable TOML file. Original: {msg}"
        );
    }
    if lower.contains("parse config") || lower.contains("must be") {
        return format!(
            "What happened: Configuration is invalid or incomplete.\nLikely causes: Unknown keys, a missing [strategy] section, or out-of-range values.\nHow to fix: Edit the TOML config and try again. Original: {msg}"
        );
    }

    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 3 timeout, 4 stall, 130 interrupted, 1 for everything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<RunAbort>() {
        Some(RunAbort::Timeout { .. }) => 3,
        Some(RunAbort::Stalled { .. }) => 4,
        Some(RunAbort::Interrupted { .. }) => 130,
        None => 1,
    }
}

/// End state of a run as seen by the CLI.
#[derive(Debug, Clone, Copy)]
pub struct Outcome {
    pub completed: bool,
    pub cancelled: bool,
    pub status: Confidence,
    /// Error already inside tolerance, so a `Stalled` status is a motor at rest.
    pub parked: bool,
    pub timeout_ms: u64,
    pub ticks: u64,
    pub position: i32,
    pub output: i32,
}

/// Turn the end state of a run into success or a `RunAbort`.
///
/// Interruption wins over everything, then a stall (unless parked), then the
/// deadline.
pub fn check_outcome(o: &Outcome) -> Result<(), RunAbort> {
    if o.cancelled {
        return Err(RunAbort::Interrupted { ticks: o.ticks });
    }
    match (o.completed, o.status) {
        (_, Confidence::Stalled) if !o.parked => Err(RunAbort::Stalled {
            position: o.position,
            output: o.output,
        }),
        (false, _) => Err(RunAbort::Timeout {
            timeout_ms: o.timeout_ms,
            ticks: o.ticks,
        }),
        (true, _) => Ok(()),
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    match err.downcast_ref::<RunAbort>() {
        Some(abort @ RunAbort::Timeout { timeout_ms, ticks }) => json!({
            "reason": abort.name(),
            "details": { "timeout_ms": timeout_ms, "ticks": ticks },
            "message": humanize(err),
        })
        .to_string(),
        Some(abort @ RunAbort::Stalled { position, output }) => json!({
            "reason": abort.name(),
            "details": { "position": position, "output": output },
            "message": humanize(err),
        })
        .to_string(),
        Some(abort @ RunAbort::Interrupted { ticks }) => json!({
            "reason": abort.name(),
            "details": { "ticks": ticks },
            "message": humanize(err),
        })
        .to_string(),
        None => json!({ "reason": "Error", "message": humanize(err) }).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_stable() {
        let t = eyre::Report::new(RunAbort::Timeout {
            timeout_ms: 10,
            ticks: 2,
        });
        let s = eyre::Report::new(RunAbort::Stalled {
            position: 0,
            output: 40,
        });
        assert_eq!(exit_code_for_error(&t), 3);
        assert_eq!(exit_code_for_error(&s), 4);
        assert_eq!(exit_code_for_error(&eyre::eyre!("boom")), 1);
    }

    fn outcome(completed: bool, status: Confidence) -> Outcome {
        Outcome {
            completed,
            cancelled: false,
            status,
            parked: false,
            timeout_ms: 10,
            ticks: 3,
            position: 5,
            output: 40,
        }
    }

    #[test]
    fn stall_wins_over_timeout() {
        assert_eq!(
            check_outcome(&outcome(false, Confidence::Stalled)),
            Err(RunAbort::Stalled {
                position: 5,
                output: 40
            })
        );
        assert!(check_outcome(&outcome(true, Confidence::Confident)).is_ok());
        assert!(matches!(
            check_outcome(&outcome(false, Confidence::NotYet)),
            Err(RunAbort::Timeout { .. })
        ));
    }

    #[test]
    fn parked_stall_is_success_but_keeps_its_status() {
        let o = Outcome {
            parked: true,
            ..outcome(true, Confidence::Stalled)
        };
        assert!(check_outcome(&o).is_ok());
        assert_eq!(o.status, Confidence::Stalled);
        let off_target = Outcome {
            parked: false,
            ..o
        };
        assert!(matches!(
            check_outcome(&off_target),
            Err(RunAbort::Stalled { .. })
        ));
    }

    #[test]
    fn interruption_wins_and_exits_130() {
        let o = Outcome {
            cancelled: true,
            ..outcome(false, Confidence::Stalled)
        };
        let abort = check_outcome(&o).unwrap_err();
        assert_eq!(abort, RunAbort::Interrupted { ticks: 3 });
        let err = eyre::Report::new(abort);
        assert_eq!(exit_code_for_error(&err), 130);
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "Interrupted");
        assert_eq!(v["details"]["ticks"], 3);
    }

    #[test]
    fn json_error_has_reason_and_details() {
        let err = eyre::Report::new(RunAbort::Timeout {
            timeout_ms: 250,
            ticks: 14,
        });
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "Timeout");
        assert_eq!(v["details"]["timeout_ms"], 250);
        assert!(v["message"].as_str().unwrap().contains("timed out"));
    }
}

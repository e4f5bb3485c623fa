//! JSON output for automation consumers.
//!
//! Every command prints one envelope: `{"success": .., "timestamp": .., ...}`
//! with the command's fields merged in, or `error` / `error_code` on failure.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use ntm_core::api::{ApiError, RouteFilter, RoutingCore};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::Command;

/// Wrap a serializable payload in a success envelope
pub fn success_envelope<T: Serialize>(data: &T) -> Value {
    let mut envelope = Map::new();
    envelope.insert("success".to_string(), Value::Bool(true));
    envelope.insert("timestamp".to_string(), json!(Utc::now().to_rfc3339()));

    match serde_json::to_value(data) {
        Ok(Value::Object(fields)) => envelope.extend(fields),
        Ok(other) => {
            envelope.insert("data".to_string(), other);
        }
        Err(e) => return error_envelope("SERIALIZATION", &e.to_string()),
    }
    Value::Object(envelope)
}

/// Failure envelope
pub fn error_envelope(code: &str, message: &str) -> Value {
    json!({
        "success": false,
        "timestamp": Utc::now().to_rfc3339(),
        "error": message,
        "error_code": code,
    })
}

/// Stable machine-readable code for an API error
pub fn error_code(err: &ApiError) -> &'static str {
    match err {
        ApiError::SessionNotFound { .. } => "SESSION_NOT_FOUND",
        ApiError::PaneEnumeration(_) => "PANE_ENUMERATION_FAILED",
        ApiError::InvalidInput { .. } => "INVALID_INPUT",
        ApiError::Persistence(_) => "PERSISTENCE_FAILED",
        ApiError::Internal(_) => "INTERNAL_ERROR",
    }
}

fn from_result<T: Serialize>(result: Result<T, ApiError>) -> Value {
    match result {
        Ok(data) => success_envelope(&data),
        Err(e) => error_envelope(error_code(&e), &e.to_string()),
    }
}

/// Serialize an envelope for printing
pub fn render(value: &Value, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}

/// Whether an envelope reports success
pub fn is_success(value: &Value) -> bool {
    value.get("success").and_then(Value::as_bool).unwrap_or(false)
}

/// Run one command against the core and build its envelope
pub fn execute(core: &RoutingCore, command: &Command) -> Value {
    match command {
        Command::Route {
            session,
            prompt,
            agent_type,
            panes,
            exclude_panes,
            all,
            ..
        } => {
            let filter = RouteFilter {
                agent_type: agent_type.clone(),
                panes: panes.clone(),
                exclude_panes: exclude_panes.clone(),
                include_excluded: *all,
            };
            from_result(core.route(session, prompt, &filter))
        }
        Command::Rank { task } => from_result(core.rank_for_task(task)),
        Command::Record {
            agent,
            task,
            success,
            ..
        } => from_result(core.record_outcome(agent, task, *success).map(|()| {
            json!({
                "agent_type": agent,
                "task_type": task,
                "recorded": if *success { "success" } else { "failure" },
            })
        })),
        Command::Effectiveness { agent, task } => from_result(core.effectiveness(agent, task)),
    }
}

/// Run a command, printing envelopes to stdout; returns whether it succeeded
///
/// `route --watch N` re-scores every N seconds until Ctrl-C.
pub async fn run(core: Arc<RoutingCore>, command: Command, pretty: bool) -> Result<bool> {
    let watch = match &command {
        Command::Route { watch, .. } => watch.filter(|secs| *secs > 0),
        _ => None,
    };

    let Some(secs) = watch else {
        let envelope = execute_blocking(Arc::clone(&core), command.clone()).await?;
        println!("{}", render(&envelope, pretty)?);
        return Ok(is_success(&envelope));
    };

    let mut interval = tokio::time::interval(Duration::from_secs(secs));
    let mut ok = true;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let envelope = execute_blocking(Arc::clone(&core), command.clone()).await?;
                ok = is_success(&envelope);
                println!("{}", render(&envelope, pretty)?);
                if !ok {
                    warn!("Routing failed, stopping watch");
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                debug!("Interrupted, stopping watch");
                break;
            }
        }
    }
    Ok(ok)
}

/// Scoring shells out to tmux and blocks, so keep it off the runtime threads
async fn execute_blocking(core: Arc<RoutingCore>, command: Command) -> Result<Value> {
    Ok(tokio::task::spawn_blocking(move || execute(&core, &command)).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ntm_core::api::RoutingCoreBuilder;
    use ntm_core::config::EffectivenessSettings;
    use ntm_core::tmux::{PaneInfo, PaneSource};
    use pretty_assertions::assert_eq;

    /// One idle Claude pane in session "proj"
    struct OnePane;

    impl PaneSource for OnePane {
        fn list_panes(&self, session: &str) -> Result<Vec<PaneInfo>> {
            if session != "proj" {
                anyhow::bail!("can't find session: {}", session);
            }
            Ok(PaneInfo::parse("%1\tproj:0.1\tclaude\t100\tproj__cc_1")
                .into_iter()
                .collect())
        }

        fn capture_pane(&self, _pane: &PaneInfo) -> Result<String> {
            Ok("all done\n> ".to_string())
        }
    }

    fn core() -> RoutingCore {
        RoutingCoreBuilder::new()
            .effectiveness(EffectivenessSettings {
                persist: false,
                ..Default::default()
            })
            .with_source(Arc::new(OnePane))
            .build()
            .unwrap()
    }

    fn route(session: &str) -> Command {
        Command::Route {
            session: session.to_string(),
            prompt: String::new(),
            agent_type: String::new(),
            panes: Vec::new(),
            exclude_panes: Vec::new(),
            all: false,
            watch: None,
        }
    }

    #[test]
    fn test_success_envelope_merges_fields() {
        let v = success_envelope(&json!({"count": 2}));
        assert_eq!(v["success"], json!(true));
        assert_eq!(v["count"], json!(2));
        assert!(v["timestamp"].is_string());
        assert!(v.get("error").is_none());
    }

    #[test]
    fn test_success_envelope_wraps_non_objects() {
        let v = success_envelope(&vec![1, 2]);
        assert_eq!(v["data"], json!([1, 2]));
    }

    #[test]
    fn test_error_envelope() {
        let v = error_envelope("INVALID_INPUT", "bad");
        assert!(!is_success(&v));
        assert_eq!(v["error"], json!("bad"));
        assert_eq!(v["error_code"], json!("INVALID_INPUT"));
    }

    #[test]
    fn test_execute_route() {
        let v = execute(&core(), &route("proj"));
        assert!(is_success(&v));
        assert_eq!(v["recommendation"]["pane_id"], json!("%1"));
        assert_eq!(v["recommendation"]["agent_type"], json!("cc"));
        assert_eq!(v["recommendation"]["state"], json!("WAITING"));
        assert_eq!(v["available"], json!(1));
    }

    #[test]
    fn test_execute_route_missing_session() {
        let v = execute(&core(), &route("other"));
        assert!(!is_success(&v));
        assert_eq!(v["error_code"], json!("SESSION_NOT_FOUND"));
    }

    #[test]
    fn test_execute_rank() {
        let v = execute(
            &core(),
            &Command::Rank {
                task: "docs".to_string(),
            },
        );
        assert_eq!(v["task_type"], json!("docs"));
        assert_eq!(v["rankings"][0]["agent_type"], json!("gmi"));
        assert_eq!(v["rankings"][0]["rank"], json!(1));
    }

    #[test]
    fn test_execute_record_then_effectiveness() {
        let core = core();
        let record = Command::Record {
            agent: "cod".to_string(),
            task: "bug".to_string(),
            success: true,
            failure: false,
        };
        for _ in 0..3 {
            assert!(is_success(&execute(&core, &record)));
        }

        let v = execute(
            &core,
            &Command::Effectiveness {
                agent: "cod".to_string(),
                task: "bug".to_string(),
            },
        );
        assert_eq!(v["sample_count"], json!(3));
        assert_eq!(v["has_data"], json!(true));
        assert_eq!(v["mode"], json!("balanced"));
    }

    #[test]
    fn test_execute_record_invalid_agent() {
        let v = execute(
            &core(),
            &Command::Record {
                agent: "aider".to_string(),
                task: "bug".to_string(),
                success: false,
                failure: true,
            },
        );
        assert_eq!(v["error_code"], json!("INVALID_INPUT"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            error_code(&ApiError::Persistence(anyhow::anyhow!("x"))),
            "PERSISTENCE_FAILED"
        );
        assert_eq!(
            error_code(&ApiError::Internal(anyhow::anyhow!("x"))),
            "INTERNAL_ERROR"
        );
    }

    #[test]
    fn test_render() {
        let v = json!({"success": true});
        assert_eq!(render(&v, false).unwrap(), r#"{"success":true}"#);
        assert!(render(&v, true).unwrap().contains('\n'));
    }
}

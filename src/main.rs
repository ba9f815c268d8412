//! unbound-gate: gated command-submission gateway.
//!
//! One-shot request processor: reads a JSON request from stdin, writes a
//! JSON response to stdout. Store state persists between invocations as a
//! JSON snapshot (default `~/.local/share/unbound-gate/state.json`,
//! override with `--state PATH`).
//!
//! Requests:
//!   {"op":"login","username":"alice"}
//!   {"op":"submit","api_key":"…","command":"ls -la"}
//!   {"op":"history","api_key":"…"}
//!   {"op":"credits","api_key":"…"}
//!   {"op":"add_rule","api_key":"…","pattern":"…","action":"AUTO_REJECT"}
//!   {"op":"list_rules","api_key":"…"}
//!
//! Errors are reported as {"error":KIND,"message":…} with exit code 1.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;

use unbound_gate::config::Config;
use unbound_gate::store::{Action, MemoryStore, Store, User};
use unbound_gate::{Gateway, GatewayError, logging};

#[derive(Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request {
    Login {
        username: String,
    },
    Submit {
        api_key: String,
        command: String,
    },
    History {
        api_key: String,
    },
    Credits {
        api_key: String,
    },
    AddRule {
        api_key: String,
        pattern: String,
        action: Action,
    },
    ListRules {
        api_key: String,
    },
}

fn main() {
    let state_override = parse_args();

    let data_dir = logging::data_dir();
    if let Some(dir) = &data_dir {
        logging::init(dir);
    }

    let state_path = match state_override.or_else(|| data_dir.as_ref().map(|d| d.join("state.json")))
    {
        Some(path) => path,
        None => fail("storage", "cannot resolve state path: HOME unset (pass --state PATH)"),
    };

    let mut input = String::new();
    if std::io::stdin().read_to_string(&mut input).is_err() {
        eprintln!("failed to read stdin");
        std::process::exit(1);
    }

    let request: Request = match serde_json::from_str(&input) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("JSON parse error: {e}");
            std::process::exit(1);
        }
    };

    let config = Config::load();
    let store = match MemoryStore::load(&state_path) {
        Ok(store) => Arc::new(store),
        Err(e) => fail("storage", &e.to_string()),
    };
    let gateway = match Gateway::new(&config, Arc::clone(&store) as Arc<dyn Store>) {
        Ok(gw) => gw,
        Err(e) => fail(e.kind(), &e.to_string()),
    };

    // The bootstrap admin's api key is visible exactly once, on stderr so
    // the stdout protocol stays clean.
    if let Some(admin) = gateway.bootstrap_admin() {
        eprintln!("admin account created, api key: {}", admin.api_key);
    }

    let response = match dispatch(&gateway, data_dir.as_deref(), request) {
        Ok(value) => value,
        Err(e) => {
            // Bootstrap may have mutated the store even when the request failed.
            persist(&store, &state_path);
            fail(e.kind(), &e.to_string())
        }
    };

    persist(&store, &state_path);
    println!("{response}");
}

fn dispatch(
    gateway: &Gateway,
    data_dir: Option<&std::path::Path>,
    request: Request,
) -> Result<serde_json::Value, GatewayError> {
    match request {
        Request::Login { username } => {
            let user = gateway.login(&username)?;
            Ok(serde_json::json!({
                "id": user.id,
                "username": user.username,
                "api_key": user.api_key,
                "role": user.role,
                "credits": user.credits,
            }))
        }
        Request::Submit { api_key, command } => {
            let user = authed(gateway, &api_key)?;
            let record = gateway.submit(user.id, &command)?;
            if let Some(dir) = data_dir {
                logging::log_verdict(dir, &user.username, &record);
            }
            Ok(serde_json::json!({
                "id": record.id,
                "command": record.command_text,
                "status": record.status,
                "reason": record.reason,
                "created_at": record.created_at,
                "credits_left": gateway.credits(user.id)?,
            }))
        }
        Request::History { api_key } => {
            let user = authed(gateway, &api_key)?;
            let history = gateway.history(user.id)?;
            Ok(serde_json::to_value(history).expect("records serialize"))
        }
        Request::Credits { api_key } => {
            let user = authed(gateway, &api_key)?;
            Ok(serde_json::json!({ "credits": gateway.credits(user.id)? }))
        }
        Request::AddRule {
            api_key,
            pattern,
            action,
        } => {
            let user = authed(gateway, &api_key)?;
            let rule = gateway.add_rule(user.id, &pattern, action)?;
            Ok(serde_json::to_value(rule).expect("rule serializes"))
        }
        Request::ListRules { api_key } => {
            // Any authenticated caller may list rules.
            authed(gateway, &api_key)?;
            let rules = gateway.list_rules()?;
            Ok(serde_json::to_value(rules).expect("rules serialize"))
        }
    }
}

/// Resolve a bearer secret or fail the request as unauthorized.
fn authed(gateway: &Gateway, api_key: &str) -> Result<User, GatewayError> {
    gateway
        .authenticate(api_key)?
        .ok_or(GatewayError::Unauthorized)
}

fn persist(store: &MemoryStore, path: &std::path::Path) {
    if let Err(e) = store.save(path) {
        eprintln!("failed to persist state: {e}");
        std::process::exit(1);
    }
}

fn parse_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    let mut state = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--state" => match args.next() {
                Some(path) => state = Some(PathBuf::from(path)),
                None => {
                    eprintln!("--state requires a path");
                    std::process::exit(1);
                }
            },
            "--help" | "-h" => {
                eprintln!("usage: unbound-gate [--state PATH] < request.json");
                std::process::exit(0);
            }
            other => {
                eprintln!("unknown argument: {other}");
                std::process::exit(1);
            }
        }
    }
    state
}

/// Print an error response and exit non-zero.
fn fail(kind: &str, message: &str) -> ! {
    let body = serde_json::json!({ "error": kind, "message": message });
    println!("{body}");
    std::process::exit(1);
}

//! Process logging setup and verdict log file.

use std::io::Write;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};

use crate::store::CommandRecord;

/// Data directory for state, logs, and the verdict file:
/// `~/.local/share/unbound-gate`.
pub fn data_dir() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(Path::new(&home).join(".local/share/unbound-gate"))
}

/// Initialize `log` output to `gateway.log` in the data directory.
/// Best-effort: if the file cannot be opened, logging stays disabled
/// rather than failing the request.
pub fn init(dir: &Path) {
    let _ = std::fs::create_dir_all(dir);
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("gateway.log"))
    else {
        return;
    };
    let config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let _ = WriteLogger::init(LevelFilter::Info, config, file);
}

/// Append a verdict record to `verdicts.log` in the data directory.
/// Best-effort: failures are silently ignored (the audit store, not this
/// file, is the system of record).
pub fn log_verdict(dir: &Path, username: &str, record: &CommandRecord) {
    let _ = std::fs::create_dir_all(dir);
    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("verdicts.log"))
    else {
        return;
    };

    let cmd_truncated: String = record.command_text.chars().take(200).collect();
    let _ = writeln!(
        file,
        "{ts}\t{user}\t{status}\t{cmd}\t{reason}",
        ts = record.created_at.to_rfc3339(),
        user = username,
        status = record.status.as_str(),
        cmd = cmd_truncated,
        reason = record.reason,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CommandId, Status, UserId};

    #[test]
    fn verdict_lines_are_tab_separated() {
        let dir = tempfile::tempdir().unwrap();
        let record = CommandRecord {
            id: CommandId(0),
            user_id: UserId(1),
            command_text: "ls -la".into(),
            status: Status::Executed,
            reason: "Command executed successfully".into(),
            created_at: chrono::Utc::now(),
        };
        log_verdict(dir.path(), "alice", &record);

        let content = std::fs::read_to_string(dir.path().join("verdicts.log")).unwrap();
        let fields: Vec<_> = content.trim_end().split('\t').collect();
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[1], "alice");
        assert_eq!(fields[2], "executed");
        assert_eq!(fields[3], "ls -la");
    }

    #[test]
    fn long_commands_are_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let record = CommandRecord {
            id: CommandId(0),
            user_id: UserId(1),
            command_text: "x".repeat(500),
            status: Status::Rejected,
            reason: "Blocked by rule".into(),
            created_at: chrono::Utc::now(),
        };
        log_verdict(dir.path(), "alice", &record);

        let content = std::fs::read_to_string(dir.path().join("verdicts.log")).unwrap();
        let fields: Vec<_> = content.trim_end().split('\t').collect();
        assert_eq!(fields[3].len(), 200);
    }
}

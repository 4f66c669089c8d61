// SPDX-License-Identifier: Apache-2.0

use std::path::Path;
use std::sync::Arc;

use campus_checkin_model::{EventId, EventRecord, EventStatus, Profile, UserId};
use campus_checkin_server::{validate_startup_config_contract, ApiConfig, RegistrationService};
use campus_checkin_store::SqliteLedger;
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::info;

use crate::commands::Commands;
use crate::helpers::emit_ok;
use crate::{scan_console, CliError, OutputMode};

/// Ticket and ledger settings shared with the HTTP service.
fn cli_config(db_path: &Path) -> Result<ApiConfig, CliError> {
    let config = ApiConfig {
        db_path: db_path.to_path_buf(),
        ..ApiConfig::from_env()
    };
    validate_startup_config_contract(&config).map_err(CliError::validation)?;
    Ok(config)
}

fn event_id(raw: &str) -> Result<EventId, CliError> {
    EventId::parse(raw).map_err(|e| CliError::validation(e.to_string()))
}

fn user_id(raw: &str) -> Result<UserId, CliError> {
    UserId::parse(raw).map_err(|e| CliError::validation(e.to_string()))
}

fn parse_starts_at(raw: Option<&str>) -> Result<DateTime<Utc>, CliError> {
    match raw {
        Some(text) => DateTime::parse_from_rfc3339(text.trim())
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| CliError::validation(format!("invalid --starts-at {text}: {e}"))),
        None => Ok(Utc::now()),
    }
}

pub(crate) async fn run_command(
    command: Commands,
    db_path: &Path,
    output_mode: OutputMode,
) -> Result<(), CliError> {
    let config = cli_config(db_path)?;
    let ledger = Arc::new(SqliteLedger::open(db_path)?);
    let service = RegistrationService::new(
        ledger.clone(),
        ledger.clone(),
        config.ticket_codec(),
        config.ledger_timeout,
    );

    let payload = match command {
        Commands::InitDb => {
            let version = ledger.schema_version().await?;
            info!(db = %db_path.display(), version, "ledger ready");
            json!({
                "command": "init-db",
                "status": "ok",
                "db": db_path,
                "schema_version": version,
            })
        }
        Commands::AddEvent {
            id,
            title,
            venue,
            starts_at,
            closed,
        } => {
            let status = if closed {
                EventStatus::Closed
            } else {
                EventStatus::Open
            };
            let event = EventRecord::new(
                event_id(&id)?,
                &title,
                &venue,
                parse_starts_at(starts_at.as_deref())?,
                status,
            )
            .map_err(|e| CliError::validation(e.to_string()))?;
            ledger.put_event(&event).await?;
            json!({"command": "add-event", "status": "ok", "event": event})
        }
        Commands::AddProfile {
            id,
            name,
            college_code,
            role,
        } => {
            let profile = Profile::new(user_id(&id)?, &name, college_code.as_deref(), role.into())
                .map_err(|e| CliError::validation(e.to_string()))?;
            ledger.put_profile(&profile).await?;
            json!({"command": "add-profile", "status": "ok", "profile": profile})
        }
        Commands::Register { event, student } => {
            let row = service
                .register(&event_id(&event)?, &user_id(&student)?)
                .await?;
            json!({"command": "register", "status": "ok", "registration": row})
        }
        Commands::Ticket { event, student } => {
            let ticket = service
                .ticket_for(&event_id(&event)?, &user_id(&student)?)
                .await?;
            if !output_mode.json {
                println!("{}", ticket.credential);
                return Ok(());
            }
            json!({
                "command": "ticket",
                "event_id": ticket.event_id,
                "student_id": ticket.student_id,
                "credential": ticket.credential,
                "signed": ticket.signed,
            })
        }
        Commands::Registrations { student } => {
            let student = user_id(&student)?;
            let rows = service.list_for_student(&student).await?;
            json!({"command": "registrations", "student_id": student, "registrations": rows})
        }
        Commands::Attendance { event } => {
            let event = event_id(&event)?;
            let counts = service.attendance(&event).await?;
            json!({
                "command": "attendance",
                "event_id": event,
                "registered": counts.registered,
                "attended": counts.attended,
                "total": counts.total(),
            })
        }
        Commands::Scan {
            operator,
            auto_reset,
        } => {
            let operator = user_id(&operator)?;
            return scan_console::run_scan(
                ledger,
                &config,
                &service,
                &operator,
                auto_reset,
                output_mode,
            )
            .await;
        }
    };
    emit_ok(output_mode, &payload).map_err(CliError::internal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_accepts_offsets_and_rejects_garbage() {
        let t = parse_starts_at(Some("2026-10-18T18:00:00+05:30")).expect("parse");
        assert_eq!(t.to_rfc3339(), "2026-10-18T12:30:00+00:00");
        assert!(parse_starts_at(Some("tomorrow")).is_err());
        assert!(parse_starts_at(None).is_ok());
    }
}

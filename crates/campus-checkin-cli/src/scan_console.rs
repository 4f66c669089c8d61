// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use campus_checkin_model::UserId;
use campus_checkin_server::{
    ApiConfig, CheckinVerifier, RegistrationService, ScanOutcome, ScanSession, SessionState,
};
use campus_checkin_store::SqliteLedger;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::helpers::emit_ok;
use crate::{CliError, OutputMode};

fn outcome_label(outcome: &ScanOutcome) -> &'static str {
    match outcome {
        ScanOutcome::Verdict(verdict) => verdict.kind().as_str(),
        ScanOutcome::Failed(err) => err.as_str(),
    }
}

fn emit_frame(session: &ScanSession, event: &str, output_mode: OutputMode) -> Result<(), CliError> {
    let display = session.display();
    if output_mode.json {
        let frame = json!({
            "event": event,
            "display": display,
            "counters": session.counters(),
        });
        return emit_ok(output_mode, &frame).map_err(CliError::internal);
    }
    if let Some(headline) = &display.headline {
        println!("{headline}");
    }
    println!("{}", display.message);
    for line in &display.details {
        println!("  {line}");
    }
    Ok(())
}

/// Reads decode events from stdin until `quit` or end of input.
pub(crate) async fn run_scan(
    ledger: Arc<SqliteLedger>,
    config: &ApiConfig,
    service: &RegistrationService,
    operator: &UserId,
    auto_reset: bool,
    output_mode: OutputMode,
) -> Result<(), CliError> {
    let profile = service.caller_profile(operator).await?;
    let verifier = Arc::new(
        CheckinVerifier::new(ledger.clone(), ledger, config.ticket_codec())
            .with_ledger_timeout(config.ledger_timeout)
            .with_directory_timeout(config.directory_timeout()),
    );
    let mut session = ScanSession::open(verifier, profile.role)
        .with_halt_after_failures(config.halt_after_failures);
    if session.state() == &SessionState::AccessDenied {
        emit_frame(&session, "access_denied", output_mode)?;
        return Err(CliError::rejected(
            "forbidden",
            format!("role {} may not operate the scanner", profile.role),
        ));
    }
    info!(operator = %operator, role = %profile.role, "scanner opened");
    emit_frame(&session, "ready", output_mode)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| CliError::internal(format!("failed to read stdin: {e}")))?
    {
        let text = line.trim();
        match text {
            "" => continue,
            "quit" => break,
            "reset" => {
                session.reset();
                emit_frame(&session, "reset", output_mode)?;
                continue;
            }
            _ => {}
        }
        if auto_reset {
            session.reset();
        }
        let event = match session.on_decode(text).await {
            Some(outcome) => outcome_label(&outcome),
            None => "suppressed",
        };
        emit_frame(&session, event, output_mode)?;
        if let SessionState::Halted(reason) = session.state() {
            return Err(CliError::dependency(format!("scanner halted: {reason}")));
        }
    }

    let counters = session.counters();
    info!(
        accepted = counters.accepted,
        rejected = counters.rejected,
        failures = counters.failures,
        "scanner closed"
    );
    emit_ok(
        output_mode,
        &json!({
            "command": "scan",
            "operator": operator,
            "counters": counters,
        }),
    )
    .map_err(CliError::internal)
}

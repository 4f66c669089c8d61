// SPDX-License-Identifier: Apache-2.0

use crate::OutputMode;
use campus_checkin_core::canonical;
use serde_json::Value;

pub(crate) fn emit_ok(output_mode: OutputMode, payload: &Value) -> Result<(), String> {
    if output_mode.json {
        let bytes = canonical::stable_json_bytes(payload).map_err(|e| e.to_string())?;
        let text = String::from_utf8(bytes).map_err(|e| e.to_string())?;
        println!("{text}");
    } else {
        println!(
            "{}",
            serde_json::to_string_pretty(payload).map_err(|e| e.to_string())?
        );
    }
    Ok(())
}

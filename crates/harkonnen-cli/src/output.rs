use std::io::Write;

use serde_json::Value;

use crate::error::CliError;

/// Writes `data` to stdout as one JSON document.
pub fn render(data: &Value, pretty: bool) -> Result<(), CliError> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    handle.write_all(to_json(data, pretty)?.as_bytes())?;
    handle.write_all(b"\n")?;
    handle.flush()?;
    Ok(())
}

pub fn to_json(data: &Value, pretty: bool) -> Result<String, CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(data)?
    } else {
        serde_json::to_string(data)?
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn compact_by_default() {
        let json = to_json(&json!({"ok": true}), false).expect("json");
        assert_eq!(json, r#"{"ok":true}"#);
    }

    #[test]
    fn pretty_output_is_indented() {
        let json = to_json(&json!({"ok": true}), true).expect("json");
        assert!(json.contains("\n  \"ok\": true"));
    }
}

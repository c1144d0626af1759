use serde_json::Value;

use crate::inquiry::FieldMap;

/// Parse a form body into field values based on the Content-Type header.
/// An empty body yields no fields.
pub fn parse_fields(content_type: Option<&str>, body: &[u8]) -> Result<FieldMap, String> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(FieldMap::new());
    }

    let ct = content_type.unwrap_or("application/json");

    if ct.contains("application/json") {
        parse_json(body)
    } else if ct.contains("application/x-www-form-urlencoded") {
        parse_form_urlencoded(body)
    } else {
        // Try JSON first, then form-urlencoded
        parse_json(body)
            .or_else(|_| parse_form_urlencoded(body))
            .map_err(|e| format!("Unable to parse body: {e}"))
    }
}

fn parse_json(body: &[u8]) -> Result<FieldMap, String> {
    let value: Value = serde_json::from_slice(body).map_err(|e| format!("Invalid JSON: {e}"))?;
    let Value::Object(obj) = value else {
        return Err("Expected a JSON object of fields".to_string());
    };

    let mut fields = FieldMap::new();
    for (name, value) in obj {
        match value {
            Value::String(s) => {
                fields.insert(name, s);
            }
            Value::Null => {}
            Value::Number(n) => {
                fields.insert(name, n.to_string());
            }
            Value::Bool(b) => {
                fields.insert(name, b.to_string());
            }
            Value::Array(_) | Value::Object(_) => {
                return Err(format!("Field '{name}' must be a string"));
            }
        }
    }
    Ok(fields)
}

fn parse_form_urlencoded(body: &[u8]) -> Result<FieldMap, String> {
    let body_str = std::str::from_utf8(body).map_err(|e| format!("Invalid UTF-8: {e}"))?;
    Ok(form_urlencoded::parse(body_str.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect())
}

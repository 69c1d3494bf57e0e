use serde_json::Value;

/// Looks a key up either directly or, for dotted keys, as a nested path.
fn lookup<'a>(raw: &'a Value, key: &str) -> Option<&'a Value> {
    if key.contains('.') {
        let pointer = format!("/{}", key.replace('.', "/"));
        raw.pointer(&pointer)
    } else {
        raw.get(key)
    }
}

/// First non-blank string among `keys`, trimmed.
pub(super) fn text_field(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| lookup(raw, key))
        .filter_map(|v| v.as_str())
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// First parsable, finite, non-negative number among `keys`.
pub(super) fn number_field(raw: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|key| lookup(raw, key))
        .find_map(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => parse_amount(s),
            _ => None,
        })
        .filter(|n| n.is_finite() && *n >= 0.0)
}

/// Skill lists arrive as arrays or as comma-separated strings.
/// An explicit empty list is kept as known-but-empty.
pub(super) fn skills_field(raw: &Value, keys: &[&str]) -> Option<Vec<String>> {
    keys.iter()
        .filter_map(|key| lookup(raw, key))
        .find_map(|v| match v {
            Value::Array(items) => Some(
                items
                    .iter()
                    .filter_map(|i| i.as_str())
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            Value::String(s) => Some(
                s.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            _ => None,
        })
}

/// Parses amounts like `"120000"`, `"$120,000"`, `"₹25,00,000"` or `"90k"`.
/// Anything else (ranges, prose) is unknown.
fn parse_amount(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' ' | '$' | '€' | '£' | '₹' | '¥'))
        .collect();

    let (digits, multiplier) = match cleaned.strip_suffix(|c: char| c == 'k' || c == 'K') {
        Some(rest) => (rest, 1000.0),
        None => (cleaned.as_str(), 1.0),
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    digits.parse::<f64>().ok().map(|n| n * multiplier)
}

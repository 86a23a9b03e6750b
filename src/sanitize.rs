use crate::form::FormKind;
use std::collections::HashMap;

/// Escape the characters that are significant in HTML markup, quotes included.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn contains_line_break(value: &str) -> bool {
    value.contains(|c| c == '\r' || c == '\n')
}

/// Posted values after trimming and escaping, keyed by the form's field names.
#[derive(Debug, Clone, Default)]
pub struct SanitizedFields {
    values: HashMap<&'static str, String>,
    trimmed: HashMap<&'static str, String>,
    honeypot: String,
}

impl SanitizedFields {
    /// Later duplicates of a field name win over earlier ones. Names the form
    /// does not declare are dropped.
    pub fn from_raw(kind: FormKind, raw: &[(String, String)], honeypot_field: &str) -> Self {
        let lookup = |name: &str| {
            raw.iter()
                .rev()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
                .unwrap_or("")
        };

        let mut values = HashMap::new();
        let mut trimmed_values = HashMap::new();
        for spec in kind.fields() {
            let trimmed = lookup(spec.name).trim();
            let value = if spec.is_free_text() {
                escape_html(trimmed)
            } else {
                trimmed.to_string()
            };
            values.insert(spec.name, value);
            trimmed_values.insert(spec.name, trimmed.to_string());
        }

        Self {
            values,
            trimmed: trimmed_values,
            honeypot: lookup(honeypot_field).trim().to_string(),
        }
    }

    pub fn get(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or("")
    }

    /// The trimmed value as posted, before escaping. Character counts are
    /// taken from this so `<` counts once, as it does in the browser.
    pub fn unescaped(&self, name: &str) -> &str {
        self.trimmed.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn optional(&self, name: &str) -> Option<String> {
        let value = self.get(name);
        (!value.is_empty()).then(|| value.to_string())
    }

    pub fn honeypot(&self) -> &str {
        &self.honeypot
    }
}

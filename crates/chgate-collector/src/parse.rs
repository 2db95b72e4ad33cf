//! ClickHouse TabSeparated response parsing and metric naming.

/// Split a TabSeparated body into rows of exactly `columns` fields.
///
/// Blank lines are skipped. Any other line with a different field count
/// fails the whole response.
pub(crate) fn parse_rows(body: &str, columns: usize) -> Result<Vec<Vec<&str>>, String> {
    let mut rows = Vec::new();
    for (idx, line) in body.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != columns {
            return Err(format!(
                "line {}: expected {columns} columns, got {}",
                idx + 1,
                fields.len()
            ));
        }
        rows.push(fields);
    }
    Ok(rows)
}

/// Parse a two-column `key\tvalue` body.
pub(crate) fn parse_key_values(body: &str) -> Result<Vec<(String, f64)>, String> {
    parse_rows(body, 2)?
        .into_iter()
        .map(|row| Ok((row[0].to_string(), parse_number(row[1])?)))
        .collect()
}

pub(crate) fn parse_number(raw: &str) -> Result<f64, String> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| format!("not a number: {raw:?}"))
}

/// Convert a ClickHouse metric name into a Prometheus-safe snake_case name.
///
/// An underscore goes before an upper-case letter that follows a lower-case
/// letter or precedes one (`HTTPConnection` → `http_connection`).
pub(crate) fn metric_name(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len() + 8);

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev_lower = chars[i - 1].is_lowercase();
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev_lower || next_lower {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }

    out.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == ':' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

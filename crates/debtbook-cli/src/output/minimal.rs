use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Heuristic: for an analysis, the projected remaining total; for a mutated
/// account, the new balance; for a bare schedule, the gross payment of the
/// first installment.
pub fn print_minimal(value: &Value) {
    // Unwrap the computation envelope if present
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    // A bare schedule: the fixed gross payment is the answer
    if let Value::Array(rows) = result {
        if let Some(first) = rows.first() {
            if let Some(payment) = first.get("gross_payment") {
                println!("{}", format_minimal(payment));
                return;
            }
        }
        println!("{}", rows.len());
        return;
    }

    // Priority list of key output fields, searched one level deep
    let priority_keys = [
        "projected_remaining_total",
        "total_paid_to_date",
        "payment_id",
        "balance",
    ];

    if let Value::Object(map) = result {
        for key in &priority_keys {
            if let Some(val) = lookup(map, key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        // Fall back to first scalar field
        if let Some((key, val)) = map.iter().find(|(_, v)| !v.is_object() && !v.is_array()) {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result));
}

/// Find a key at the top level or inside a nested object such as
/// `aggregates` or `account`.
fn lookup<'a>(map: &'a serde_json::Map<String, Value>, key: &str) -> Option<&'a Value> {
    if let Some(val) = map.get(key) {
        return Some(val);
    }
    map.values()
        .filter_map(|v| v.as_object())
        .find_map(|nested| nested.get(key))
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

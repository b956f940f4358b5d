use serde_json::Value;
use tabled::{builder::Builder, Table};

/// Format output as a table using the tabled crate.
///
/// Knows the two primary shapes: a computation envelope whose result is
/// either an installment array (`schedule`) or a `{schedule, aggregates}`
/// analysis, and a bare account record from the mutating commands.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result(result, map);
            } else {
                print_account_or_flat(value);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result(result: &Value, envelope: &serde_json::Map<String, Value>) {
    match result {
        Value::Array(rows) => print_array_table(rows),
        Value::Object(map) => {
            if let Some(Value::Array(rows)) = map.get("schedule") {
                print_array_table(rows);
                if let Some(aggregates) = map.get("aggregates") {
                    println!();
                    print_flat_object(aggregates);
                }
            } else {
                print_flat_object(result);
            }
        }
        _ => println!("{}", result),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_account_or_flat(value: &Value) {
    print_flat_object(value);

    // Manual payments deserve their own table when present
    if let Some(Value::Array(payments)) = value.get("manual_payments") {
        if !payments.is_empty() {
            println!("\nManual payments:");
            print_array_table(payments);
        }
    }
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            // Nested collections are printed separately or too wide to inline
            if matches!(val, Value::Array(_) | Value::Object(_)) {
                continue;
            }
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        let table = Table::from(builder);
        println!("{}", table);

        // One-level nesting, e.g. next_due_installment inside the aggregates
        for (key, val) in map {
            if let Value::Object(_) = val {
                println!("\n{}:", key);
                print_flat_object(val);
            }
        }
    } else {
        println!("{}", value);
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();

        let mut builder = Builder::default();
        builder.push_record(headers.clone());
        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }
        let table = Table::from(builder);
        println!("{}", table);
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

use std::fmt::Write as _;

use serde_json::Value;

use crate::cmd::OutputFormat;

pub fn print_output(value: &Value, format: OutputFormat, pretty: bool) -> anyhow::Result<()> {
    println!("{}", format_output(value, format, pretty)?);
    Ok(())
}

pub fn format_output(value: &Value, format: OutputFormat, pretty: bool) -> anyhow::Result<String> {
    let text = match format {
        OutputFormat::Json => {
            if pretty {
                serde_json::to_string_pretty(value)?
            } else {
                serde_json::to_string(value)?
            }
        },

        OutputFormat::Yaml => serde_yml::to_string(value)?,

        OutputFormat::Standard => {
            let mut out = String::new();
            write_human_readable(&mut out, value, 0);
            out.truncate(out.trim_end().len());
            out
        }
    };

    Ok(text)
}

/// Element snapshots print as `<tag key=value>` with their children indented below;
/// everything else prints as nested key/value lines.
fn write_human_readable(out: &mut String, value: &Value, indent: usize) {
    if let Some((tag, props, children)) = as_element(value) {
        let mut line = format!("<{}", tag);
        for (k, v) in props {
            let _ = write!(line, " {}={}", k, inline(v));
        }
        line.push('>');
        let _ = writeln!(out, "{:indent$}{}", "", line, indent = indent);
        write_children(out, children, indent + 2);
        return;
    }

    match value {
        Value::Object(map) => {
            for (k, v) in map {
                match v {
                    Value::Object(_) | Value::Array(_) => {
                        let _ = writeln!(out, "{:indent$}{}:", "", k, indent = indent);
                        write_human_readable(out, v, indent + 2);
                    },
                    _ => {
                        let _ = writeln!(out, "{:indent$}{}: {}", "", k, v, indent = indent);
                    },
                }
            }
        },
        Value::Array(arr) => {
            for v in arr {
                match v {
                    Value::Object(_) | Value::Array(_) => {
                        let _ = writeln!(out, "{:indent$}-", "", indent = indent);
                        write_human_readable(out, v, indent + 2);
                    },
                    _ => {
                        let _ = writeln!(out, "{:indent$}- {}", "", inline(v), indent = indent);
                    },
                }
            }
        },
        _ => {
            let _ = writeln!(out, "{:indent$}{}", "", inline(value), indent = indent);
        },
    }
}

fn write_children(out: &mut String, children: &Value, indent: usize) {
    match children {
        Value::Null => {},
        Value::Array(items) => items.iter().for_each(|item| write_children(out, item, indent)),
        _ => write_human_readable(out, children, indent),
    }
}

fn as_element(value: &Value) -> Option<(&str, &serde_json::Map<String, Value>, &Value)> {
    let node = value.as_object()?;
    if node.len() != 3 {
        return None;
    }

    Some((
        node.get("tag")?.as_str()?,
        node.get("props")?.as_object()?,
        node.get("children")?,
    ))
}

fn inline(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Object(map) => match map.get("__function__").and_then(Value::as_str) {
            Some(id) if map.len() == 1 => format!("fn({})", id),
            _ => value.to_string(),
        },
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn standard_output_draws_element_tree() {
        let tree = json!({
            "tag": "div",
            "props": {},
            "children": [
                { "tag": "h1", "props": {}, "children": "Count: 3" },
                { "tag": "button", "props": { "onClick": { "__function__": "f1" } }, "children": "+" },
                null
            ]
        });

        let text = format_output(&tree, OutputFormat::Standard, false).unwrap();

        assert_eq!(
            text,
            "<div>\n  <h1>\n    Count: 3\n  <button onClick=fn(f1)>\n    +"
        );
    }

    #[test]
    fn standard_output_falls_back_to_key_values() {
        let value = json!({ "a": 1, "b": [true, { "c": "x" }] });
        let text = format_output(&value, OutputFormat::Standard, false).unwrap();

        assert_eq!(text, "a: 1\nb:\n  - true\n  -\n    c: \"x\"");
    }

    #[test]
    fn json_output() {
        let value = json!({ "a": [1, 2] });

        assert_eq!(format_output(&value, OutputFormat::Json, false).unwrap(), r#"{"a":[1,2]}"#);
        assert_eq!(
            format_output(&value, OutputFormat::Json, true).unwrap(),
            "{\n  \"a\": [\n    1,\n    2\n  ]\n}"
        );
    }
}

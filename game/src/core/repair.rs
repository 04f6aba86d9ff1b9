//! Best-effort repair of model-produced JSON objects.
//!
//! Each step is a pure text transform; [`repair`] chains them in order. The
//! result is not guaranteed to parse, only to be closer to valid JSON than the
//! input.

/// Run the full repair pipeline.
pub fn repair(raw: &str) -> String {
    let text = strip_code_fences(raw);
    let text = isolate_object(&text);
    let text = escape_control_chars(&text);
    repair_structure(&text)
}

/// Return the body of the first markdown code block, or the input unchanged.
pub fn strip_code_fences(raw: &str) -> String {
    let Some(open) = raw.find("```") else {
        return raw.trim().to_string();
    };
    let after_open = &raw[open + 3..];
    // Skip the info string (`json`, `JSON`, ...) up to the end of the line.
    let body_start = after_open.find('\n').map(|idx| idx + 1).unwrap_or(0);
    let body = &after_open[body_start..];
    let body = match body.find("```") {
        Some(close) => &body[..close],
        None => body,
    };
    body.trim().to_string()
}

/// Keep the span from the first `{` to the last `}`.
///
/// A missing closing brace keeps everything after the opening one so the
/// structural pass can close it.
pub fn isolate_object(text: &str) -> String {
    let Some(start) = text.find('{') else {
        return text.to_string();
    };
    match text.rfind('}') {
        Some(end) if end > start => text[start..=end].to_string(),
        _ => text[start..].to_string(),
    }
}

/// Escape raw control characters that appear inside string literals.
pub fn escape_control_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for ch in text.chars() {
        if !in_string {
            if ch == '"' {
                in_string = true;
            }
            out.push(ch);
            continue;
        }

        if escaped {
            escaped = false;
            out.push(ch);
            continue;
        }

        match ch {
            '\\' => {
                escaped = true;
                out.push(ch);
            }
            '"' => {
                in_string = false;
                out.push(ch);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }

    out
}

/// Fix trailing commas, an unterminated final string and unbalanced brackets.
pub fn repair_structure(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut closers: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for ch in text.chars() {
        if in_string {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => {
                in_string = true;
                out.push(ch);
            }
            '{' => {
                closers.push('}');
                out.push(ch);
            }
            '[' => {
                closers.push(']');
                out.push(ch);
            }
            '}' | ']' => {
                if !closers.contains(&ch) {
                    // Stray closer with no matching opener.
                    continue;
                }
                while let Some(expected) = closers.pop() {
                    drop_trailing_comma(&mut out);
                    out.push(expected);
                    if expected == ch {
                        break;
                    }
                }
            }
            _ => out.push(ch),
        }
    }

    if in_string {
        if escaped {
            out.pop();
        }
        out.push('"');
    }

    let trimmed_len = out.trim_end().len();
    out.truncate(trimmed_len);
    if out.ends_with(':') {
        out.push_str(" null");
    }

    while let Some(expected) = closers.pop() {
        drop_trailing_comma(&mut out);
        out.push(expected);
    }

    out
}

fn drop_trailing_comma(out: &mut String) {
    let trimmed_len = out.trim_end().len();
    if out[..trimmed_len].ends_with(',') {
        out.truncate(trimmed_len - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn parses(text: &str) -> Value {
        serde_json::from_str(text).unwrap_or_else(|err| panic!("{err}: {text}"))
    }

    #[test]
    fn strips_fenced_block_with_language_tag() {
        let raw = "Aquí tienes:\n```json\n{\"a\": 1}\n```\nSuerte.";
        assert_eq!(strip_code_fences(raw), "{\"a\": 1}");
    }

    #[test]
    fn unfenced_text_is_only_trimmed() {
        assert_eq!(strip_code_fences("  {\"a\": 1} \n"), "{\"a\": 1}");
    }

    #[test]
    fn isolates_outermost_object_from_prose() {
        let text = "Claro. {\"a\": {\"b\": 2}} Espero que sirva.";
        assert_eq!(isolate_object(text), "{\"a\": {\"b\": 2}}");
    }

    #[test]
    fn escapes_newlines_only_inside_strings() {
        let text = "{\n\"a\": \"línea uno\nlínea dos\"\n}";
        let escaped = escape_control_chars(text);
        assert_eq!(escaped, "{\n\"a\": \"línea uno\\nlínea dos\"\n}");
        assert_eq!(parses(&escaped)["a"], "línea uno\nlínea dos");
    }

    #[test]
    fn escaped_quotes_do_not_end_strings() {
        let text = "{\"a\": \"dijo \\\"hola\\\"\ty se fue\"}";
        let escaped = escape_control_chars(text);
        assert_eq!(parses(&escaped)["a"], "dijo \"hola\"\ty se fue");
    }

    #[test]
    fn removes_trailing_commas() {
        let repaired = repair_structure("{\"a\": [1, 2, ], \"b\": 3, }");
        assert_eq!(parses(&repaired)["a"], serde_json::json!([1, 2]));
    }

    #[test]
    fn closes_unterminated_string_and_brackets() {
        let repaired = repair_structure("{\"a\": \"corte abrupto");
        assert_eq!(parses(&repaired)["a"], "corte abrupto");
    }

    #[test]
    fn dangling_key_becomes_null() {
        let repaired = repair_structure("{\"a\": \"x\", \"b\":");
        let value = parses(&repaired);
        assert_eq!(value["a"], "x");
        assert!(value["b"].is_null());
    }

    #[test]
    fn drops_stray_closers() {
        let repaired = repair_structure("{\"a\": 1}}]");
        assert_eq!(repaired, "{\"a\": 1}");
    }

    #[test]
    fn full_pipeline_recovers_typical_model_output() {
        let raw = "```json\n{\n  \"situacion_misteriosa\": \"Un hombre\naparece muerto\",\n  \"solucion_oculta\": \"Era un buzo\",\n}\n```";
        let value = parses(&repair(raw));
        assert_eq!(value["situacion_misteriosa"], "Un hombre\naparece muerto");
        assert_eq!(value["solucion_oculta"], "Era un buzo");
    }

    #[test]
    fn full_pipeline_leaves_valid_json_intact() {
        let raw = "{\"veredicto\": \"Correcto\", \"analisis\": \"Bien, {todo} encaja.\"}";
        assert_eq!(repair(raw), raw);
    }
}

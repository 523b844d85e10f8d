//! Rendering AI responses into the requested output encoding

use serde_json::Value;

use crate::types::OutputFormat;

/// Rendering options
#[derive(Debug, Clone)]
pub struct FormatOptions {
    /// Document/section title for HTML and Markdown output
    pub title: String,
    /// Extra CSS appended to the HTML document's style block
    pub css: String,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            title: "AI Response".to_string(),
            css: String::new(),
        }
    }
}

/// Render response content into the target format.
///
/// Content arrives either as a string or as an already-structured value;
/// every format accepts both.
pub fn format_output(content: &Value, format: OutputFormat, options: &FormatOptions) -> Value {
    match format {
        OutputFormat::Text => Value::String(as_text(content)),
        OutputFormat::Json => as_json(content),
        OutputFormat::Html => Value::String(as_html(content, options)),
        OutputFormat::Markdown => Value::String(as_markdown(content, options)),
    }
}

fn as_text(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// Objects pass through unchanged; strings are parsed as JSON where
/// possible, otherwise wrapped as `{"content": ...}`.
fn as_json(content: &Value) -> Value {
    match content {
        Value::String(s) => serde_json::from_str(s)
            .unwrap_or_else(|_| serde_json::json!({ "content": s })),
        other => other.clone(),
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

fn as_html(content: &Value, options: &FormatOptions) -> String {
    let html_content = match content {
        Value::String(s) => escape_html(s).replace('\n', "<br>"),
        other => {
            let pretty =
                serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string());
            format!("<pre>{}</pre>", escape_html(&pretty))
        }
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title}</title>
  <style>
    body {{
      font-family: Arial, sans-serif;
      line-height: 1.6;
      margin: 0 auto;
      padding: 20px;
      max-width: 800px;
    }}
    pre {{
      background-color: #f5f5f5;
      padding: 10px;
      border-radius: 5px;
      overflow-x: auto;
    }}
    {css}
  </style>
</head>
<body>
  <h1>{title}</h1>
  <div class="content">
    {content}
  </div>
</body>
</html>
"#,
        title = escape_html(&options.title),
        css = options.css,
        content = html_content
    )
}

fn as_markdown(content: &Value, options: &FormatOptions) -> String {
    let md_content = match content {
        Value::String(s) => s.clone(),
        other => {
            let pretty =
                serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string());
            format!("```json\n{}\n```", pretty)
        }
    };

    format!("# {}\n\n{}", options.title, md_content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_round_trips_structured_content() {
        let object = json!({"name": "alice", "scores": [1, 2, 3]});
        let rendered = format_output(&object, OutputFormat::Json, &FormatOptions::default());
        assert_eq!(rendered, object);
    }

    #[test]
    fn json_parses_string_content() {
        let content = Value::String(r#"{"ok": true}"#.to_string());
        let rendered = format_output(&content, OutputFormat::Json, &FormatOptions::default());
        assert_eq!(rendered, json!({"ok": true}));
    }

    #[test]
    fn json_wraps_unparseable_strings() {
        let content = Value::String("plain prose".to_string());
        let rendered = format_output(&content, OutputFormat::Json, &FormatOptions::default());
        assert_eq!(rendered, json!({"content": "plain prose"}));
    }

    #[test]
    fn text_passes_strings_through() {
        let content = Value::String("as is".to_string());
        let rendered = format_output(&content, OutputFormat::Text, &FormatOptions::default());
        assert_eq!(rendered, Value::String("as is".to_string()));
    }

    #[test]
    fn text_stringifies_objects() {
        let rendered = format_output(
            &json!({"a": 1}),
            OutputFormat::Text,
            &FormatOptions::default(),
        );
        assert_eq!(rendered.as_str().unwrap(), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn html_escapes_and_converts_newlines() {
        let content = Value::String("a < b\n\"quoted\"".to_string());
        let rendered = format_output(&content, OutputFormat::Html, &FormatOptions::default());
        let html = rendered.as_str().unwrap();
        assert!(html.contains("a &lt; b<br>&quot;quoted&quot;"));
        assert!(html.contains("<title>AI Response</title>"));
        assert!(html.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn markdown_fences_structured_content() {
        let options = FormatOptions {
            title: "Report".to_string(),
            css: String::new(),
        };
        let rendered = format_output(&json!({"k": "v"}), OutputFormat::Markdown, &options);
        let md = rendered.as_str().unwrap();
        assert!(md.starts_with("# Report\n\n```json\n"));
        assert!(md.trim_end().ends_with("```"));
    }
}

//! HTML gallery rendering.
//!
//! Builds a self-contained page with one card per capture record. All
//! record content is escaped; only `data:image/` URIs become `<img>` tags.

use std::fmt::Write;

use snapvault_core::types::{CaptureRecord, SystemInfo};

/// System-info keys shown on each card, with their labels.
const KEY_FIELDS: &[(&str, &str)] = &[
    ("ip_address", "IP Address"),
    ("user_agent", "User Agent"),
    ("os", "OS"),
    ("browser", "Browser"),
    ("screen_resolution", "Screen Resolution"),
];

const STYLE: &str = "
body { font-family: sans-serif; background-color: #f0f2f5; color: #333; margin: 0; padding: 20px; }
h1 { text-align: center; color: #1a2b4d; }
.summary { text-align: center; }
.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(350px, 1fr)); gap: 20px; }
.card { background-color: #fff; border-radius: 8px; box-shadow: 0 4px 8px rgba(0,0,0,0.1); padding: 20px; overflow: hidden; }
.card h2 { margin-top: 0; color: #0056b3; }
.card p { margin: 5px 0; }
.card pre { background-color: #eee; padding: 10px; border-radius: 4px; white-space: pre-wrap; word-wrap: break-word; }
.images { display: flex; flex-wrap: wrap; gap: 10px; margin-top: 15px; }
.image-container { text-align: center; }
.image-container img { max-width: 150px; border-radius: 4px; }
.empty { text-align: center; color: #777; }
";

/// Render the full gallery document for `records` (most recent first).
pub fn render_gallery(records: &[CaptureRecord]) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "<h1>Captures</h1>");
    let _ = writeln!(
        body,
        "<p class=\"summary\">Total captures: {}</p>",
        records.len()
    );

    if records.is_empty() {
        body.push_str("<p class=\"empty\">No captures yet.</p>\n");
    } else {
        body.push_str("<div class=\"grid\">\n");
        for record in records {
            render_card(&mut body, record);
        }
        body.push_str("</div>\n");
    }

    document("Captures", &body)
}

/// Render a minimal error page; `message` is escaped.
pub fn render_error_page(message: &str) -> String {
    let body = format!(
        "<h1>Captures</h1>\n<p class=\"empty\">Failed to load captures: {}</p>\n",
        escape_html(message)
    );
    document("Captures - error", &body)
}

fn document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape_html(title),
        STYLE,
        body
    )
}

fn render_card(out: &mut String, record: &CaptureRecord) {
    let _ = writeln!(out, "<div class=\"card\">");
    let _ = writeln!(out, "<h2>Capture #{}</h2>", record.id);
    let _ = writeln!(
        out,
        "<p><strong>Timestamp:</strong> {}</p>",
        record.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(
        out,
        "<p><strong>Images:</strong> {}</p>",
        record.capture_count
    );

    for (key, label) in KEY_FIELDS {
        let _ = writeln!(
            out,
            "<p><strong>{}:</strong> {}</p>",
            label,
            escape_html(&info_field(&record.system_info, key))
        );
    }

    let raw = if record.system_info.is_empty() {
        "N/A".to_string()
    } else {
        serde_json::to_string_pretty(&record.system_info).unwrap_or_else(|_| "N/A".to_string())
    };
    let _ = writeln!(
        out,
        "<details>\n<summary>System Info</summary>\n<pre>{}</pre>\n</details>",
        escape_html(&raw)
    );

    out.push_str("<div class=\"images\">\n");
    if record.images.is_empty() {
        out.push_str("<p>No images in this capture.</p>\n");
    }
    for (i, image) in record.images.iter().enumerate() {
        let _ = writeln!(out, "<div class=\"image-container\">");
        let _ = writeln!(out, "<p>Image {}</p>", i + 1);
        if image.starts_with("data:image/") {
            let _ = writeln!(
                out,
                "<img src=\"{}\" alt=\"Capture {} image {}\" loading=\"lazy\">",
                escape_html(image),
                record.id,
                i + 1
            );
        } else {
            out.push_str("<p>Unsupported image</p>\n");
        }
        out.push_str("</div>\n");
    }
    out.push_str("</div>\n</div>\n");
}

/// Display value for a system-info key, `Unknown` when missing or blank.
fn info_field(info: &SystemInfo, key: &str) -> String {
    match info.get(key) {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(serde_json::Value::Null) | Some(serde_json::Value::String(_)) | None => {
            "Unknown".to_string()
        }
        Some(other) => other.to_string(),
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use snapvault_core::types::{NewCapture, RecordId};

    fn record(id: i64, images: Vec<&str>, info: serde_json::Value) -> CaptureRecord {
        let info = match info {
            serde_json::Value::Object(map) => map,
            _ => SystemInfo::new(),
        };
        NewCapture::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap(),
            images.into_iter().map(String::from).collect(),
            info,
        )
        .into_record(RecordId(id))
    }

    #[test]
    fn test_empty_gallery_shows_placeholder() {
        let html = render_gallery(&[]);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("No captures yet."));
        assert!(html.contains("Total captures: 0"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn test_card_without_images_shows_placeholder() {
        let html = render_gallery(&[record(1, vec![], serde_json::json!({}))]);
        assert!(html.contains("Capture #1"));
        assert!(html.contains("No images in this capture."));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn test_card_renders_every_image_and_fields() {
        let html = render_gallery(&[record(
            2,
            vec!["data:image/png;base64,AAAA", "data:image/jpeg;base64,BBBB"],
            serde_json::json!({"ip_address": "1.2.3.4", "os": "Linux"}),
        )]);
        assert_eq!(html.matches("<img").count(), 2);
        assert!(html.contains("src=\"data:image/png;base64,AAAA\""));
        assert!(html.contains("1.2.3.4"));
        assert!(html.contains("<strong>OS:</strong> Linux"));
        assert!(html.contains("<strong>Browser:</strong> Unknown"));
        assert!(html.contains("2024-01-01 09:30:00 UTC"));
        assert!(html.contains("<details>"));
    }

    #[test]
    fn test_missing_system_info_renders_fallbacks() {
        let html = render_gallery(&[record(3, vec![], serde_json::json!({}))]);
        assert!(html.contains("<strong>IP Address:</strong> Unknown"));
        assert!(html.contains("<pre>N/A</pre>"));
    }

    #[test]
    fn test_content_is_escaped() {
        let html = render_gallery(&[record(
            4,
            vec!["data:image/png;base64,\"><script>x</script>"],
            serde_json::json!({"user_agent": "<script>alert(1)</script>"}),
        )]);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[test]
    fn test_non_data_uri_is_not_inlined() {
        let html = render_gallery(&[record(
            5,
            vec!["https://example.com/a.png"],
            serde_json::json!({}),
        )]);
        assert!(!html.contains("<img"));
        assert!(html.contains("Unsupported image"));
    }

    #[test]
    fn test_non_string_values_are_shown() {
        let info: SystemInfo = serde_json::from_str(r#"{"screen_resolution": 1080}"#).unwrap();
        assert_eq!(info_field(&info, "screen_resolution"), "1080");
        assert_eq!(info_field(&info, "os"), "Unknown");
    }

    #[test]
    fn test_error_page_is_escaped() {
        let html = render_error_page("<boom>");
        assert!(html.contains("&lt;boom&gt;"));
    }
}

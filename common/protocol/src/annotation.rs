//! Draw-mode annotation types.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::command::CorrelationId;

/// An element bounding box in page coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One user-drawn rectangle over a screenshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub rect: BoundingRect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<CorrelationId>,
}

/// A completed draw-mode session for one tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationSession {
    pub tab_id: String,
    #[serde(default)]
    pub page_url: String,
    #[serde(default)]
    pub screenshot_path: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    /// Epoch milliseconds when the session completed.
    pub timestamp: i64,
}

/// DOM details captured for one annotation, looked up by correlation id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationDetail {
    pub correlation_id: CorrelationId,
    pub selector: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub computed_styles: serde_json::Map<String, Value>,
    #[serde(default)]
    pub a11y_flags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_selector: Option<String>,
    #[serde(default)]
    pub bounding_rect: BoundingRect,
}

/// A named multi-page session, appended to explicitly across tabs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedAnnotationSession {
    pub name: String,
    /// Pages in append order.
    pub pages: Vec<AnnotationSession>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::AnnotationSession;

    #[test]
    fn session_roundtrips_with_annotations() {
        let session: AnnotationSession = serde_json::from_value(json!({
            "tab_id": "42",
            "page_url": "http://localhost:3000/checkout",
            "screenshot_path": "/tmp/shot.png",
            "annotations": [
                {"rect": {"x": 1.0, "y": 2.0, "width": 30.0, "height": 40.0}, "note": "broken button"}
            ],
            "timestamp": 1700000000000i64,
        }))
        .expect("valid session");

        let back = serde_json::to_value(&session).expect("serializable");
        assert_eq!(back["annotations"][0]["note"], json!("broken button"));
        assert_eq!(back["tab_id"], json!("42"));
    }

    #[test]
    fn minimal_session_fills_defaults() {
        let session: AnnotationSession =
            serde_json::from_value(json!({"tab_id": "1", "timestamp": 5}))
                .expect("defaults fill in");
        assert!(session.annotations.is_empty());
        assert_eq!(session.page_url, "");
    }
}

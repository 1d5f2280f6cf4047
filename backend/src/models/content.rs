//! Locale+slug keyed content blocks with per-slug default documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
/// A JSON document identified by (slug, locale).
pub struct ContentBlock {
    pub slug: String,
    pub locale: String,
    #[schema(value_type = Object)]
    pub document: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
/// Admin payload replacing a content block document.
pub struct ContentUpsertRequest {
    #[schema(value_type = Object)]
    pub document: Value,
}

/// Returns the hard-coded default document for a known slug, used when no
/// persisted row exists. The default is lazily persisted on first read.
pub fn default_document(slug: &str) -> Option<Value> {
    match slug {
        "home-intro" => Some(json!({
            "title": "Hello",
            "subtitle": "Welcome to my corner of the web",
            "paragraphs": ["I build things for the web."]
        })),
        "about" => Some(json!({
            "title": "About me",
            "paragraphs": [],
            "highlights": []
        })),
        "skills" => Some(json!({
            "title": "Skills",
            "groups": []
        })),
        "contact" => Some(json!({
            "title": "Get in touch",
            "email": "",
            "links": []
        })),
        _ => None,
    }
}

/// Validates a document against the structural schema of its slug.
///
/// Unknown slugs only require a JSON object; known slugs additionally require
/// their mandatory fields with the right JSON types.
pub fn validate_document(slug: &str, document: &Value) -> Result<(), Vec<String>> {
    fn require_string(errors: &mut Vec<String>, document: &Value, field: &str) {
        if !document.get(field).map(Value::is_string).unwrap_or(false) {
            errors.push(format!("{}: required string field", field));
        }
    }

    fn require_array(errors: &mut Vec<String>, document: &Value, field: &str) {
        if !document.get(field).map(Value::is_array).unwrap_or(false) {
            errors.push(format!("{}: required array field", field));
        }
    }

    if !document.is_object() {
        return Err(vec!["document: must be a JSON object".to_string()]);
    }

    let mut errors = Vec::new();
    match slug {
        "home-intro" => {
            require_string(&mut errors, document, "title");
            require_string(&mut errors, document, "subtitle");
            require_array(&mut errors, document, "paragraphs");
        }
        "about" | "skills" | "contact" => {
            require_string(&mut errors, document, "title");
        }
        _ => {}
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

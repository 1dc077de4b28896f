// ── Raw JSON editor model ──
//
// Backs a free-text view of the whole document. Text that does not
// parse or validate is kept as typed, alongside the last document that
// did; only a clean state can be committed.

use crate::edit::Edit;
use crate::error::EditError;
use crate::model::Config;

/// Editable JSON text plus the last valid document behind it.
#[derive(Debug, Clone)]
pub struct JsonEditor {
    text: String,
    last_valid: Config,
    error: Option<EditError>,
}

impl JsonEditor {
    /// Start from `config`, rendered as pretty JSON.
    pub fn new(config: Config) -> Result<Self, EditError> {
        let text = config.to_json_pretty()?;
        Ok(Self {
            text,
            last_valid: config,
            error: None,
        })
    }

    /// Replace the text. Parse and validation failures are recorded, not
    /// returned; the last valid document is kept.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        match Config::from_json(&self.text) {
            Ok((config, _)) => {
                self.last_valid = config;
                self.error = None;
            }
            Err(e) => self.error = Some(e),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn last_valid(&self) -> &Config {
        &self.last_valid
    }

    /// The pending validation error, if the text is not committable.
    pub fn error(&self) -> Option<&EditError> {
        self.error.as_ref()
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// Turn the current text into a whole-document edit.
    pub fn commit(&self) -> Result<Edit, EditError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        Ok(Edit::ReplaceDocument {
            config: Box::new(self.last_valid.clone()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> Config {
        Config::from_value(json!({ "binds": [{ "port": 80, "listeners": [] }] }))
            .unwrap()
            .0
    }

    #[test]
    fn invalid_json_keeps_last_valid_and_blocks_commit() {
        let mut editor = JsonEditor::new(config()).unwrap();
        editor.set_text(r#"{"a":1"#);

        assert_eq!(editor.text(), r#"{"a":1"#);
        assert_eq!(editor.last_valid(), &config());
        let err = editor.error().unwrap();
        assert!(err.to_string().starts_with("Invalid JSON"));
        assert!(matches!(editor.commit(), Err(EditError::InvalidJson { .. })));
    }

    #[test]
    fn invalid_document_is_a_validation_error() {
        let mut editor = JsonEditor::new(config()).unwrap();
        editor.set_text(r#"{"binds":[{"port":0,"listeners":[]}]}"#);
        assert!(matches!(
            editor.error(),
            Some(EditError::InvalidPort { port: 0 })
        ));
        assert!(editor.commit().is_err());
    }

    #[test]
    fn fixing_the_text_clears_the_error() {
        let mut editor = JsonEditor::new(config()).unwrap();
        editor.set_text("{");
        assert!(!editor.is_valid());

        editor.set_text(r#"{"binds":[{"port":9000,"listeners":[]}]}"#);
        assert!(editor.is_valid());
        let Edit::ReplaceDocument { config } = editor.commit().unwrap() else {
            panic!("expected a document replacement");
        };
        assert_eq!(config.binds[0].port, 9000);
    }
}

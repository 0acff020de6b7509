//! Domain types for docdeploy descriptors.
//!
//! [`DocumentConfig`] is the raw, serde-decoded shape of a descriptor file.
//! [`Document`] is the normalized value the engine works with: principals are
//! exploded and de-duplicated, file references are anchored to the
//! descriptor's directory and the content source is classified once.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

/// Document type used when a descriptor does not declare one.
pub const DEFAULT_DOCUMENT_TYPE: &str = "Command";

/// `format:` value that marks a descriptor as a shell script wrapper.
pub const SHELL_FORMAT: &str = "SHELL";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Name of a document in the remote registry. Primary key for every call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentName(pub String);

impl DocumentName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for DocumentName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DocumentName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Wire format of a document payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentFormat {
    #[serde(rename = "JSON")]
    Json,
    #[serde(rename = "YAML")]
    Yaml,
    #[serde(rename = "TEXT")]
    Text,
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Json => write!(f, "JSON"),
            DocumentFormat::Yaml => write!(f, "YAML"),
            DocumentFormat::Text => write!(f, "TEXT"),
        }
    }
}

/// Where a document's content comes from.
///
/// Classified once at load time. Priority: an explicit `format: SHELL` wins
/// over inline content, which wins over a plain file reference.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentSource {
    /// A shell script wrapped into a single `aws:runShellScript` step.
    ShellScript(PathBuf),
    /// Structured content declared inline in the descriptor.
    Inline(Content),
    /// A file whose extension decides the format.
    File(PathBuf),
}

// ---------------------------------------------------------------------------
// Structured content
// ---------------------------------------------------------------------------

/// A declared document parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(rename = "type")]
    pub param_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

/// One step of a structured document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainStep {
    pub action: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<serde_json::Value>,
}

/// Structured (schema-versioned) document content.
///
/// Keys this type does not model are kept in `extra` so inline content is
/// submitted as declared.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(default)]
    pub schema_version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Parameter>,
    #[serde(default)]
    pub main_steps: Vec<MainStep>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Raw descriptor
// ---------------------------------------------------------------------------

/// A descriptor file exactly as decoded from YAML or JSON.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "type")]
    pub document_type: Option<String>,
    #[serde(default, deserialize_with = "scalar_list")]
    pub account_ids: Vec<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub parameters: BTreeMap<String, Parameter>,
    #[serde(default)]
    pub working_directory: String,
    #[serde(default)]
    pub timeout_seconds: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
}

/// Account ids are often written unquoted; accept numbers as well as strings.
fn scalar_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Number(u64),
    }

    let raw = Option::<Vec<Scalar>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|s| match s {
            Scalar::Text(t) => t,
            Scalar::Number(n) => n.to_string(),
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Normalized descriptor
// ---------------------------------------------------------------------------

/// Desired state of one remote document. Read-only once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub name: DocumentName,
    pub document_type: String,
    pub description: String,
    /// Exploded, trimmed, de-duplicated principals the document is shared with.
    pub account_ids: Vec<String>,
    pub tags: BTreeMap<String, String>,
    pub parameters: BTreeMap<String, Parameter>,
    pub working_directory: String,
    pub timeout_seconds: Option<String>,
    pub content: Option<ContentSource>,
    /// Descriptor file this document was loaded from, if any.
    pub source_path: Option<PathBuf>,
}

impl Document {
    /// An empty `Command` document with no content.
    pub fn new(name: impl Into<DocumentName>) -> Self {
        Self {
            name: name.into(),
            document_type: DEFAULT_DOCUMENT_TYPE.to_string(),
            description: String::new(),
            account_ids: Vec::new(),
            tags: BTreeMap::new(),
            parameters: BTreeMap::new(),
            working_directory: String::new(),
            timeout_seconds: None,
            content: None,
            source_path: None,
        }
    }

    /// Normalize a decoded descriptor.
    ///
    /// `default_name` is used when the descriptor has no `name:`; relative
    /// `file:` references are joined onto `base_dir`.
    pub fn from_config(config: DocumentConfig, default_name: &str, base_dir: &Path) -> Self {
        let file = config
            .file
            .as_deref()
            .filter(|f| !f.is_empty())
            .map(|f| base_dir.join(f));

        let is_shell = config
            .format
            .as_deref()
            .is_some_and(|f| f.eq_ignore_ascii_case(SHELL_FORMAT));

        let content = if is_shell {
            Some(ContentSource::ShellScript(file.unwrap_or_default()))
        } else if let Some(inline) = config
            .content
            .filter(|c| !c.schema_version.is_empty())
        {
            Some(ContentSource::Inline(inline))
        } else {
            file.map(ContentSource::File)
        };

        Self {
            name: config
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| default_name.to_string())
                .into(),
            document_type: config
                .document_type
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_DOCUMENT_TYPE.to_string()),
            description: config.description,
            account_ids: explode_account_ids(&config.account_ids),
            tags: config.tags,
            parameters: config.parameters,
            working_directory: config.working_directory,
            timeout_seconds: config.timeout_seconds.filter(|t| !t.is_empty()),
            content,
            source_path: None,
        }
    }

    pub fn with_content(mut self, content: ContentSource) -> Self {
        self.content = Some(content);
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_account_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let raw: Vec<String> = ids.into_iter().map(Into::into).collect();
        self.account_ids = explode_account_ids(&raw);
        self
    }
}

/// Split comma-joined entries, trim, drop empties and de-duplicate while
/// keeping first-seen order.
pub fn explode_account_ids(raw: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    raw.iter()
        .flat_map(|entry| entry.split(','))
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(id.to_string()))
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn config(yaml: &str) -> DocumentConfig {
        serde_yaml::from_str(yaml).expect("parse descriptor")
    }

    #[test]
    fn newtype_display() {
        assert_eq!(DocumentName::from("demo").to_string(), "demo");
        assert_eq!(DocumentFormat::Yaml.to_string(), "YAML");
    }

    #[test]
    fn explode_splits_trims_and_dedups() {
        let raw = vec![
            "111, 222".to_string(),
            " 333 ".to_string(),
            "222,,".to_string(),
            "".to_string(),
        ];
        assert_eq!(explode_account_ids(&raw), vec!["111", "222", "333"]);
    }

    #[test]
    fn defaults_apply_when_fields_missing() {
        let doc = Document::from_config(config("description: hi\n"), "demo", Path::new("/cfg"));
        assert_eq!(doc.name.as_str(), "demo");
        assert_eq!(doc.document_type, DEFAULT_DOCUMENT_TYPE);
        assert!(doc.content.is_none());
    }

    #[test]
    fn explicit_name_overrides_file_stem() {
        let doc = Document::from_config(config("name: other\n"), "demo", Path::new("/cfg"));
        assert_eq!(doc.name.as_str(), "other");
    }

    #[test]
    fn numeric_account_ids_are_accepted() {
        let doc = Document::from_config(
            config("accountIds:\n  - 123456789012\n  - \"210987654321, 123456789012\"\n"),
            "demo",
            Path::new("/cfg"),
        );
        assert_eq!(doc.account_ids, vec!["123456789012", "210987654321"]);
    }

    #[test]
    fn shell_format_wins_over_inline_content() {
        let doc = Document::from_config(
            config(
                "format: SHELL\nfile: run.sh\ncontent:\n  schemaVersion: \"2.2\"\n  mainSteps: []\n",
            ),
            "demo",
            Path::new("/cfg"),
        );
        assert_eq!(
            doc.content,
            Some(ContentSource::ShellScript(PathBuf::from("/cfg/run.sh")))
        );
    }

    #[test]
    fn inline_content_wins_over_file() {
        let doc = Document::from_config(
            config("file: doc.json\ncontent:\n  schemaVersion: \"2.2\"\n  mainSteps: []\n"),
            "demo",
            Path::new("/cfg"),
        );
        assert!(matches!(doc.content, Some(ContentSource::Inline(_))));
    }

    #[test]
    fn inline_content_without_schema_version_is_ignored() {
        let doc = Document::from_config(
            config("file: doc.json\ncontent:\n  description: nope\n"),
            "demo",
            Path::new("/cfg"),
        );
        assert_eq!(
            doc.content,
            Some(ContentSource::File(PathBuf::from("/cfg/doc.json")))
        );
    }

    #[test]
    fn unknown_content_keys_are_preserved() {
        let content: Content = serde_yaml::from_str(
            "schemaVersion: \"0.3\"\nassumeRole: arn:aws:iam::1:role/x\nmainSteps: []\n",
        )
        .expect("content");
        assert_eq!(
            content.extra.get("assumeRole"),
            Some(&serde_json::Value::String("arn:aws:iam::1:role/x".into()))
        );
        let json = serde_json::to_string(&content).expect("json");
        assert!(json.contains("\"assumeRole\""));
        assert!(!json.contains("\"parameters\""));
    }
}

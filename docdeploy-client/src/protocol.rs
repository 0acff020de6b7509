//! SSM JSON 1.1 wire shapes.
//!
//! Every request is a `POST /` whose `X-Amz-Target` header names the
//! operation and whose body is one of the PascalCase structs below. Errors
//! come back as a non-2xx status with an [`ErrorBody`].

use serde::{Deserialize, Serialize};

use docdeploy_core::DocumentFormat;
use docdeploy_sync::{RegistryError, Tag};

/// `X-Amz-Target` prefix.
pub const TARGET_PREFIX: &str = "AmazonSSM";

/// Request content type.
pub const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

pub mod op {
    pub const DESCRIBE_DOCUMENT: &str = "DescribeDocument";
    pub const CREATE_DOCUMENT: &str = "CreateDocument";
    pub const UPDATE_DOCUMENT: &str = "UpdateDocument";
    pub const UPDATE_DOCUMENT_DEFAULT_VERSION: &str = "UpdateDocumentDefaultVersion";
    pub const DESCRIBE_DOCUMENT_PERMISSION: &str = "DescribeDocumentPermission";
    pub const MODIFY_DOCUMENT_PERMISSION: &str = "ModifyDocumentPermission";
    pub const LIST_TAGS_FOR_RESOURCE: &str = "ListTagsForResource";
    pub const ADD_TAGS_TO_RESOURCE: &str = "AddTagsToResource";
    pub const REMOVE_TAGS_FROM_RESOURCE: &str = "RemoveTagsFromResource";
    pub const DELETE_DOCUMENT: &str = "DeleteDocument";
}

// ---------------------------------------------------------------------------
// Shared shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WireTag {
    pub key: String,
    pub value: String,
}

impl From<Tag> for WireTag {
    fn from(tag: Tag) -> Self {
        Self {
            key: tag.key,
            value: tag.value,
        }
    }
}

impl From<WireTag> for Tag {
    fn from(tag: WireTag) -> Self {
        Tag::new(tag.key, tag.value)
    }
}

/// Response of operations with no output.
#[derive(Debug, Default, Deserialize)]
pub struct Empty {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NameInput<'a> {
    pub name: &'a str,
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeDocumentOutput {
    pub document: WireDocumentDescription,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct WireDocumentDescription {
    pub name: Option<String>,
    pub document_type: Option<String>,
    pub document_format: Option<DocumentFormat>,
    pub document_version: Option<String>,
    pub latest_version: Option<String>,
    pub default_version: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateDocumentInput<'a> {
    pub name: &'a str,
    pub content: &'a str,
    pub document_format: DocumentFormat,
    pub document_type: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<WireTag>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateDocumentInput<'a> {
    pub name: &'a str,
    pub content: &'a str,
    pub document_format: DocumentFormat,
    pub document_version: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateDocumentOutput {
    pub document_description: WireDocumentDescription,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateDefaultVersionInput<'a> {
    pub name: &'a str,
    pub document_version: &'a str,
}

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribePermissionInput<'a> {
    pub name: &'a str,
    pub permission_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DescribePermissionOutput {
    pub account_ids: Vec<String>,
    pub next_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModifyPermissionInput<'a> {
    pub name: &'a str,
    pub permission_type: String,
    pub account_ids_to_add: &'a [String],
    pub account_ids_to_remove: &'a [String],
}

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListTagsInput<'a> {
    pub resource_type: String,
    pub resource_id: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ListTagsOutput {
    pub tag_list: Vec<WireTag>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddTagsInput<'a> {
    pub resource_type: String,
    pub resource_id: &'a str,
    pub tags: Vec<WireTag>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RemoveTagsInput<'a> {
    pub resource_type: String,
    pub resource_id: &'a str,
    pub tag_keys: &'a [String],
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error payload of a non-2xx response.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ErrorBody {
    #[serde(rename = "__type")]
    pub error_type: String,
    #[serde(alias = "Message")]
    pub message: String,
}

impl ErrorBody {
    /// Bare error code: `com.amazonaws.ssm#InvalidDocument` → `InvalidDocument`.
    pub fn code(&self) -> &str {
        self.error_type
            .rsplit_once('#')
            .map_or(self.error_type.as_str(), |(_, code)| code)
    }
}

/// Map an error response to a [`RegistryError`]. `subject` is the document
/// or resource the request addressed.
pub fn decode_error(status: u16, body: &str, subject: &str) -> RegistryError {
    let parsed: ErrorBody = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(_) => {
            return RegistryError::service(format!("HTTP{status}"), body.trim().to_string());
        }
    };

    match parsed.code() {
        "InvalidDocument" | "InvalidResourceId" => RegistryError::NotFound(subject.to_string()),
        "DuplicateDocumentContent" => RegistryError::DuplicateContent,
        "" => RegistryError::service(format!("HTTP{status}"), parsed.message),
        code => RegistryError::service(code.to_string(), parsed.message.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_input_uses_pascal_case_and_drops_empty_tags() {
        let input = CreateDocumentInput {
            name: "demo",
            content: "{}",
            document_format: DocumentFormat::Json,
            document_type: "Command",
            tags: Vec::new(),
        };
        let value = serde_json::to_value(&input).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "Name": "demo",
                "Content": "{}",
                "DocumentFormat": "JSON",
                "DocumentType": "Command"
            })
        );
    }

    #[test]
    fn modify_permission_carries_both_lists() {
        let add = vec!["111".to_string()];
        let remove = vec!["333".to_string()];
        let input = ModifyPermissionInput {
            name: "demo",
            permission_type: "Share".to_string(),
            account_ids_to_add: &add,
            account_ids_to_remove: &remove,
        };
        let value = serde_json::to_value(&input).expect("serialize");
        assert_eq!(value["AccountIdsToAdd"], serde_json::json!(["111"]));
        assert_eq!(value["AccountIdsToRemove"], serde_json::json!(["333"]));
        assert_eq!(value["PermissionType"], "Share");
    }

    #[test]
    fn describe_output_tolerates_missing_fields() {
        let out: DescribeDocumentOutput = serde_json::from_str(
            r#"{"Document":{"Name":"demo","DocumentFormat":"YAML","DefaultVersion":"3"}}"#,
        )
        .expect("decode");
        assert_eq!(out.document.document_format, Some(DocumentFormat::Yaml));
        assert_eq!(out.document.default_version.as_deref(), Some("3"));
        assert!(out.document.latest_version.is_none());
    }

    #[test]
    fn prefixed_error_codes_are_mapped() {
        let err = decode_error(
            400,
            r#"{"__type":"com.amazonaws.ssm#DuplicateDocumentContent","message":"same"}"#,
            "demo",
        );
        assert_eq!(err, RegistryError::DuplicateContent);

        let err = decode_error(400, r#"{"__type":"InvalidDocument","Message":"nope"}"#, "demo");
        assert_eq!(err, RegistryError::NotFound("demo".to_string()));

        let err = decode_error(
            400,
            r#"{"__type":"ThrottlingException","message":"Rate exceeded"}"#,
            "demo",
        );
        assert_eq!(
            err,
            RegistryError::service("ThrottlingException", "Rate exceeded")
        );
    }

    #[test]
    fn non_json_error_body_keeps_status() {
        let err = decode_error(502, "Bad Gateway\n", "demo");
        assert_eq!(err, RegistryError::service("HTTP502", "Bad Gateway"));
    }
}

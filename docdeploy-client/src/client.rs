//! [`HttpRegistry`]: `reqwest`-backed [`DocumentRegistry`].

use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use docdeploy_core::DocumentFormat;
use docdeploy_sync::{
    CreateDocumentRequest, DocumentDescription, DocumentRegistry, ModifyPermissionRequest,
    PermissionType, RegistryError, ResourceType, Tag, UpdateDocumentRequest,
};

use crate::error::ClientError;
use crate::protocol::{
    self, decode_error, op, AddTagsInput, CreateDocumentInput, DescribeDocumentOutput,
    DescribePermissionInput, DescribePermissionOutput, Empty, ListTagsInput, ListTagsOutput,
    ModifyPermissionInput, NameInput, RemoveTagsInput, UpdateDefaultVersionInput,
    UpdateDocumentInput, UpdateDocumentOutput, WireTag,
};

/// Region used when none is configured.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Public SSM endpoint for `region`.
pub fn default_endpoint(region: &str) -> String {
    format!("https://ssm.{region}.amazonaws.com")
}

/// Connection settings for [`HttpRegistry`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    /// Overrides the regional endpoint (local emulators, proxies).
    pub endpoint: Option<String>,
    pub region: Option<String>,
    /// Account the registry acts for; reported by `caller_account_id`.
    pub account_id: Option<String>,
    /// Named credentials profile. Only logged; requests are unsigned.
    pub profile: Option<String>,
}

impl ClientConfig {
    /// Configured region, then `AWS_DEFAULT_REGION`, then [`DEFAULT_REGION`].
    pub fn resolved_region(&self) -> String {
        self.region
            .clone()
            .filter(|r| !r.is_empty())
            .or_else(|| std::env::var("AWS_DEFAULT_REGION").ok().filter(|r| !r.is_empty()))
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
    }

    pub fn resolved_endpoint(&self) -> String {
        self.endpoint
            .clone()
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| default_endpoint(&self.resolved_region()))
    }
}

/// Registry client speaking SSM JSON 1.1 over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpRegistry {
    http: reqwest::Client,
    endpoint: Url,
    account_id: Option<String>,
}

impl HttpRegistry {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let raw = config.resolved_endpoint();
        let endpoint = Url::parse(&raw).map_err(|e| ClientError::InvalidEndpoint {
            endpoint: raw.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ClientError::InvalidEndpoint {
                endpoint: raw,
                reason: "scheme must be http or https".to_string(),
            });
        }

        // No request timeout: a stalled call holds its chunk until it resolves.
        let http = reqwest::Client::builder().build()?;

        debug!(
            endpoint = %endpoint,
            profile = config.profile.as_deref().unwrap_or("default"),
            "registry client ready"
        );
        Ok(Self {
            http,
            endpoint,
            account_id: config.account_id.filter(|id| !id.is_empty()),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Issue one operation and decode its response. `subject` names the
    /// addressed document for error mapping.
    async fn call<I, O>(&self, operation: &str, subject: &str, input: &I) -> Result<O, RegistryError>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        let body = serde_json::to_vec(input).map_err(|e| RegistryError::Decode(e.to_string()))?;
        debug!(operation, subject, "registry call");

        let response = self
            .http
            .post(self.endpoint.clone())
            .header("X-Amz-Target", format!("{}.{operation}", protocol::TARGET_PREFIX))
            .header(reqwest::header::CONTENT_TYPE, protocol::CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| RegistryError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RegistryError::Transport(e.to_string()))?;

        if !status.is_success() {
            debug!(operation, subject, status = status.as_u16(), "registry error response");
            return Err(decode_error(status.as_u16(), &text, subject));
        }

        let text = if text.trim().is_empty() || status == StatusCode::NO_CONTENT {
            "{}"
        } else {
            text.as_str()
        };
        serde_json::from_str(text).map_err(|e| RegistryError::Decode(format!("{operation}: {e}")))
    }
}

impl DocumentRegistry for HttpRegistry {
    async fn get_document(&self, name: &str) -> Result<Option<DocumentDescription>, RegistryError> {
        let result: Result<DescribeDocumentOutput, _> = self
            .call(op::DESCRIBE_DOCUMENT, name, &NameInput { name })
            .await;
        match result {
            Ok(out) => {
                let doc = out.document;
                Ok(Some(DocumentDescription {
                    name: doc.name.unwrap_or_else(|| name.to_string()),
                    document_type: doc.document_type.unwrap_or_default(),
                    format: doc.document_format.unwrap_or(DocumentFormat::Json),
                    latest_version: doc.latest_version.unwrap_or_default(),
                    default_version: doc.default_version.unwrap_or_default(),
                }))
            }
            Err(RegistryError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn create_document(&self, request: CreateDocumentRequest) -> Result<(), RegistryError> {
        let input = CreateDocumentInput {
            name: &request.name,
            content: &request.content,
            document_format: request.format,
            document_type: &request.document_type,
            tags: request.tags.iter().cloned().map(WireTag::from).collect(),
        };
        let _: Empty = self.call(op::CREATE_DOCUMENT, &request.name, &input).await?;
        Ok(())
    }

    async fn update_document(&self, request: UpdateDocumentRequest) -> Result<String, RegistryError> {
        let input = UpdateDocumentInput {
            name: &request.name,
            content: &request.content,
            document_format: request.format,
            document_version: &request.version,
        };
        let out: UpdateDocumentOutput = self.call(op::UPDATE_DOCUMENT, &request.name, &input).await?;
        let description = out.document_description;
        description
            .document_version
            .or(description.latest_version)
            .ok_or_else(|| RegistryError::Decode("UpdateDocument: missing DocumentVersion".into()))
    }

    async fn update_default_version(&self, name: &str, version: &str) -> Result<(), RegistryError> {
        let input = UpdateDefaultVersionInput {
            name,
            document_version: version,
        };
        let _: Empty = self
            .call(op::UPDATE_DOCUMENT_DEFAULT_VERSION, name, &input)
            .await?;
        Ok(())
    }

    async fn describe_permission(
        &self,
        name: &str,
        permission_type: PermissionType,
    ) -> Result<Vec<String>, RegistryError> {
        let mut account_ids = Vec::new();
        let mut next_token = None;
        loop {
            let input = DescribePermissionInput {
                name,
                permission_type: permission_type.to_string(),
                next_token: next_token.take(),
            };
            let out: DescribePermissionOutput = self
                .call(op::DESCRIBE_DOCUMENT_PERMISSION, name, &input)
                .await?;
            account_ids.extend(out.account_ids);
            match out.next_token.filter(|t| !t.is_empty()) {
                Some(token) => next_token = Some(token),
                None => return Ok(account_ids),
            }
        }
    }

    async fn modify_permission(&self, request: ModifyPermissionRequest) -> Result<(), RegistryError> {
        let input = ModifyPermissionInput {
            name: &request.name,
            permission_type: request.permission_type.to_string(),
            account_ids_to_add: &request.account_ids_to_add,
            account_ids_to_remove: &request.account_ids_to_remove,
        };
        let _: Empty = self
            .call(op::MODIFY_DOCUMENT_PERMISSION, &request.name, &input)
            .await?;
        Ok(())
    }

    async fn list_tags(
        &self,
        resource_id: &str,
        resource_type: ResourceType,
    ) -> Result<Vec<Tag>, RegistryError> {
        let input = ListTagsInput {
            resource_type: resource_type.to_string(),
            resource_id,
        };
        let out: ListTagsOutput = self
            .call(op::LIST_TAGS_FOR_RESOURCE, resource_id, &input)
            .await?;
        Ok(out.tag_list.into_iter().map(Tag::from).collect())
    }

    async fn add_tags(
        &self,
        resource_id: &str,
        resource_type: ResourceType,
        tags: Vec<Tag>,
    ) -> Result<(), RegistryError> {
        let input = AddTagsInput {
            resource_type: resource_type.to_string(),
            resource_id,
            tags: tags.into_iter().map(WireTag::from).collect(),
        };
        let _: Empty = self
            .call(op::ADD_TAGS_TO_RESOURCE, resource_id, &input)
            .await?;
        Ok(())
    }

    async fn remove_tags(
        &self,
        resource_id: &str,
        resource_type: ResourceType,
        keys: Vec<String>,
    ) -> Result<(), RegistryError> {
        let input = RemoveTagsInput {
            resource_type: resource_type.to_string(),
            resource_id,
            tag_keys: &keys,
        };
        let _: Empty = self
            .call(op::REMOVE_TAGS_FROM_RESOURCE, resource_id, &input)
            .await?;
        Ok(())
    }

    async fn delete_document(&self, name: &str) -> Result<(), RegistryError> {
        let _: Empty = self
            .call(op::DELETE_DOCUMENT, name, &NameInput { name })
            .await?;
        Ok(())
    }

    async fn caller_account_id(&self) -> Result<Option<String>, RegistryError> {
        Ok(self.account_id.clone())
    }
}

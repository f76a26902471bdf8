use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use etlsmith_core::{
    Bundle, ClientError, ClientResult, FlowEngineClient, Position, PropertyMap, PropertyUpdate,
    RunState, ValidationStatus, Versioned,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::types::{
    to_wire_properties, BundleDto, ConnectableDto, ConnectionDto, ConnectionEntity,
    ControllerServiceDto, ControllerServiceEntity, Envelope, PositionDto, ProcessGroupFlowEntity,
    ProcessorConfigDto, ProcessorDto, ProcessorEntity, RevisionDto, RunStatusEntity,
};

/// How the client authenticates against NiFi
#[derive(Clone, Default)]
pub enum Credentials {
    /// Unsecured installation
    #[default]
    None,
    /// A pre-issued bearer token
    Token(String),
    /// Exchanged for a bearer token at `POST /access/token` on first use
    Password { username: String, password: String },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::None => write!(f, "None"),
            Credentials::Token(_) => write!(f, "Token(***)"),
            Credentials::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"***")
                .finish(),
        }
    }
}

/// Configuration for the NiFi REST client
#[derive(Debug, Clone)]
pub struct NifiClientConfig {
    /// Base URL of the REST API, including the `/nifi-api` suffix
    pub base_url: String,
    /// Timeout in seconds for HTTP requests
    pub timeout_secs: u64,
    /// Accept self-signed certificates
    pub accept_invalid_certs: bool,
    pub credentials: Credentials,
}

impl Default for NifiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/nifi-api".to_string(),
            timeout_secs: 30,
            accept_invalid_certs: false,
            credentials: Credentials::None,
        }
    }
}

/// [`FlowEngineClient`] backed by the NiFi REST API
#[derive(Clone)]
pub struct NifiClient {
    config: NifiClientConfig,
    client: Client,
    token: Arc<Mutex<Option<String>>>,
}

impl fmt::Debug for NifiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NifiClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl NifiClient {
    /// Creates a client with the provided configuration
    pub fn new(config: NifiClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| ClientError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            token: Arc::new(Mutex::new(None)),
        })
    }

    /// Creates an unauthenticated client for the given base URL
    pub fn with_url(base_url: impl Into<String>) -> ClientResult<Self> {
        Self::new(NifiClientConfig {
            base_url: base_url.into(),
            ..Default::default()
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Maps a transport failure to a ClientError
    fn map_http_error(error: reqwest::Error) -> ClientError {
        if error.is_timeout() {
            ClientError::Transport(format!("Request timeout: {}", error))
        } else if error.is_connect() {
            ClientError::Transport(format!("Connection error: {}", error))
        } else {
            ClientError::Transport(format!("HTTP error: {}", error))
        }
    }

    async fn bearer_token(&self) -> ClientResult<Option<String>> {
        match &self.config.credentials {
            Credentials::None => Ok(None),
            Credentials::Token(token) => Ok(Some(token.clone())),
            Credentials::Password { username, password } => {
                let mut cached = self.token.lock().await;
                if let Some(token) = cached.as_ref() {
                    return Ok(Some(token.clone()));
                }
                let token = self.request_token(username, password).await?;
                *cached = Some(token.clone());
                Ok(Some(token))
            }
        }
    }

    #[instrument(skip(self, password))]
    async fn request_token(&self, username: &str, password: &str) -> ClientResult<String> {
        debug!("Requesting access token");
        let response = self
            .client
            .post(self.url("/access/token"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(Self::map_http_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Decode(format!("Failed to read token: {}", e)))?;
        if !status.is_success() {
            return Err(ClientError::Auth(format!("Token request rejected ({}): {}", status, body)));
        }

        let token = body.trim().to_string();
        if token.is_empty() {
            return Err(ClientError::Auth("Token endpoint returned an empty token".to_string()));
        }
        Ok(token)
    }

    /// Maps a non-success response to a ClientError
    async fn check_status(&self, response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| format!("HTTP error: {}", status));
        match status {
            StatusCode::CONFLICT => Err(ClientError::Conflict(body)),
            StatusCode::UNAUTHORIZED => {
                // A cached token may have expired; fetch a fresh one next time
                self.token.lock().await.take();
                Err(ClientError::Auth(body))
            }
            status => Err(ClientError::Http {
                status: status.as_u16(),
                body,
            }),
        }
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let request = match self.bearer_token().await? {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await.map_err(Self::map_http_error)?;
        let response = self.check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(format!("Failed to parse response: {}", e)))
    }

    async fn group_flow(&self, group_id: &str) -> ClientResult<ProcessGroupFlowEntity> {
        self.execute(self.client.get(self.url(&format!("/flow/process-groups/{}", group_id))))
            .await
    }

    async fn update_processor(
        &self,
        processor: &Versioned,
        config: ProcessorConfigDto,
    ) -> ClientResult<ProcessorEntity> {
        let body = Envelope {
            revision: RevisionDto::new(processor.revision),
            component: ProcessorDto {
                id: Some(processor.id.clone()),
                config: Some(config),
                ..Default::default()
            },
        };
        self.execute(
            self.client
                .put(self.url(&format!("/processors/{}", processor.id)))
                .json(&body),
        )
        .await
    }
}

#[async_trait]
impl FlowEngineClient for NifiClient {
    #[instrument(skip(self))]
    async fn default_target_group_id(&self) -> ClientResult<String> {
        let entity = self.group_flow("root").await?;
        debug!(group_id = %entity.process_group_flow.id, "Resolved root process group");
        Ok(entity.process_group_flow.id)
    }

    #[instrument(skip(self))]
    async fn group_topology(&self, group_id: &str) -> ClientResult<Vec<Position>> {
        let entity = self.group_flow(group_id).await?;
        let processors = entity.process_group_flow.flow.processors;
        let positions: Vec<Position> = processors.iter().filter_map(|p| p.position()).collect();
        if positions.len() < processors.len() {
            warn!(
                missing = processors.len() - positions.len(),
                "Some processors were reported without a position"
            );
        }
        Ok(positions)
    }

    #[instrument(skip(self, bundle))]
    async fn create_processor(
        &self,
        group_id: &str,
        name: &str,
        type_name: &str,
        position: Position,
        bundle: Option<Bundle>,
    ) -> ClientResult<Versioned> {
        let body = Envelope {
            revision: RevisionDto::new(0),
            component: ProcessorDto {
                name: Some(name.to_string()),
                type_name: Some(type_name.to_string()),
                bundle: bundle.map(BundleDto::from),
                position: Some(PositionDto::from(position)),
                ..Default::default()
            },
        };
        let entity: ProcessorEntity = self
            .execute(
                self.client
                    .post(self.url(&format!("/process-groups/{}/processors", group_id)))
                    .json(&body),
            )
            .await?;
        Ok(Versioned::new(entity.id, entity.revision.version))
    }

    #[instrument(skip(self, properties), fields(id = %processor.id, revision = processor.revision))]
    async fn update_processor_properties(
        &self,
        processor: &Versioned,
        properties: &PropertyMap,
    ) -> ClientResult<PropertyUpdate> {
        let entity = self
            .update_processor(
                processor,
                ProcessorConfigDto {
                    properties: Some(to_wire_properties(properties)),
                    ..Default::default()
                },
            )
            .await?;

        let component = entity.component.unwrap_or_default();
        let validation_status = component
            .validation_status
            .as_deref()
            .map(ValidationStatus::from)
            .unwrap_or(ValidationStatus::Valid);
        Ok(PropertyUpdate {
            revision: entity.revision.version,
            validation_status,
            validation_errors: component.validation_errors.unwrap_or_default(),
        })
    }

    #[instrument(skip(self), fields(id = %processor.id, revision = processor.revision))]
    async fn update_processor_auto_terminate(
        &self,
        processor: &Versioned,
        relationships: &[String],
    ) -> ClientResult<i64> {
        let entity = self
            .update_processor(
                processor,
                ProcessorConfigDto {
                    auto_terminated_relationships: Some(relationships.to_vec()),
                    ..Default::default()
                },
            )
            .await?;
        Ok(entity.revision.version)
    }

    #[instrument(skip(self))]
    async fn create_connection(
        &self,
        group_id: &str,
        source_id: &str,
        destination_id: &str,
        relationships: &[String],
    ) -> ClientResult<String> {
        let body = Envelope {
            revision: RevisionDto::new(0),
            component: ConnectionDto {
                source: ConnectableDto::processor(source_id, group_id),
                destination: ConnectableDto::processor(destination_id, group_id),
                selected_relationships: relationships.to_vec(),
            },
        };
        let entity: ConnectionEntity = self
            .execute(
                self.client
                    .post(self.url(&format!("/process-groups/{}/connections", group_id)))
                    .json(&body),
            )
            .await?;
        Ok(entity.id)
    }

    #[instrument(skip(self, properties, bundle))]
    async fn create_controller_service(
        &self,
        group_id: &str,
        name: &str,
        type_name: &str,
        properties: &PropertyMap,
        bundle: Option<Bundle>,
    ) -> ClientResult<Versioned> {
        let body = Envelope {
            revision: RevisionDto::new(0),
            component: ControllerServiceDto {
                name: name.to_string(),
                type_name: type_name.to_string(),
                bundle: bundle.map(BundleDto::from),
                properties: to_wire_properties(properties),
            },
        };
        let entity: ControllerServiceEntity = self
            .execute(
                self.client
                    .post(self.url(&format!("/process-groups/{}/controller-services", group_id)))
                    .json(&body),
            )
            .await?;
        Ok(Versioned::new(entity.id, entity.revision.version))
    }

    #[instrument(skip(self), fields(id = %service.id, revision = service.revision))]
    async fn enable_controller_service(&self, service: &Versioned) -> ClientResult<i64> {
        let body = RunStatusEntity {
            revision: RevisionDto::new(service.revision),
            state: "ENABLED",
        };
        let entity: ControllerServiceEntity = self
            .execute(
                self.client
                    .put(self.url(&format!("/controller-services/{}/run-status", service.id)))
                    .json(&body),
            )
            .await?;
        Ok(entity.revision.version)
    }

    #[instrument(skip(self))]
    async fn disable_controller_service(&self, service_id: &str) -> ClientResult<()> {
        let current: ControllerServiceEntity = self
            .execute(self.client.get(self.url(&format!("/controller-services/{}", service_id))))
            .await?;
        let body = RunStatusEntity {
            revision: current.revision,
            state: "DISABLED",
        };
        let _: ControllerServiceEntity = self
            .execute(
                self.client
                    .put(self.url(&format!("/controller-services/{}/run-status", service_id)))
                    .json(&body),
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_processor_run_state(&self, processor_id: &str, state: RunState) -> ClientResult<()> {
        let current: ProcessorEntity = self
            .execute(self.client.get(self.url(&format!("/processors/{}", processor_id))))
            .await?;
        let body = RunStatusEntity {
            revision: current.revision,
            state: state.as_str(),
        };
        let _: ProcessorEntity = self
            .execute(
                self.client
                    .put(self.url(&format!("/processors/{}/run-status", processor_id)))
                    .json(&body),
            )
            .await?;
        Ok(())
    }
}

//! Builder pattern for configuring SCIM server instances.
//!
//! The base URL feeds `meta.location` and discovery document locations; the
//! [`ServiceProviderConfig`] gates ETags, bulk and filtering; [`PatchConfig`]
//! selects PATCH workarounds.

use crate::error::{BuildError, BuildResult};
use crate::patch::{PatchConfig, PatchEngine};
use crate::resource::{Interceptor, PassThrough, RequestValidator, ResourceHandler, TransactionScope};
use crate::schema::SchemaRegistry;
use crate::schema_discovery::ServiceProviderConfig;
use crate::scim_server::ScimServer;
use std::collections::HashMap;
use std::sync::Arc;

/// How the transaction scope wraps a bulk request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BulkTransactionMode {
    /// One scope around the whole bulk request
    #[default]
    WholeRequest,
    /// One scope around each bulk operation
    PerOperation,
}

/// Configuration for a SCIM server instance.
#[derive(Debug, Clone)]
pub struct ScimServerConfig {
    /// Base URL of the SCIM service, without a trailing slash.
    /// Examples: "https://scim.example.com/v2", "http://localhost:8080/scim"
    pub base_url: String,
    pub service_provider: ServiceProviderConfig,
    pub patch: PatchConfig,
    pub bulk_transaction_mode: BulkTransactionMode,
}

impl Default for ScimServerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://localhost".to_string(),
            service_provider: ServiceProviderConfig::default(),
            patch: PatchConfig::default(),
            bulk_transaction_mode: BulkTransactionMode::default(),
        }
    }
}

impl ScimServerConfig {
    /// `base_url/Users/2819c223`
    pub fn location(&self, endpoint: &str, id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            endpoint.trim_matches('/'),
            id
        )
    }

    /// Validate the configuration.
    pub fn validate(&self) -> BuildResult<()> {
        if self.base_url.is_empty() {
            return Err(BuildError::InvalidConfiguration {
                message: "Base URL cannot be empty".to_string(),
            });
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(BuildError::InvalidConfiguration {
                message: "Base URL must start with http:// or https://".to_string(),
            });
        }

        if self.service_provider.bulk.supported && self.service_provider.bulk.max_operations == 0 {
            return Err(BuildError::InvalidConfiguration {
                message: "bulk.maxOperations must be at least 1 when bulk is supported".to_string(),
            });
        }

        Ok(())
    }
}

/// Builder for configuring and creating SCIM server instances.
///
/// # Examples
///
/// ```rust
/// use scim_engine::{BulkTransactionMode, ScimServerBuilder};
/// use scim_engine::schema::SchemaRegistry;
/// # use scim_engine::resource::{Document, ListQuery, ListResult, RequestContext, ResourceHandler};
/// # use scim_engine::schema::ResourceType;
/// # use scim_engine::ScimError;
/// # use std::future::Future;
/// # struct Handler;
/// # impl ResourceHandler for Handler {
/// #     type Error = ScimError;
/// #     fn create(&self, _: &ResourceType, d: Document, _: &RequestContext) -> impl Future<Output = Result<Document, ScimError>> + Send { async { Ok(d) } }
/// #     fn get(&self, _: &ResourceType, _: &str, _: &RequestContext) -> impl Future<Output = Result<Option<Document>, ScimError>> + Send { async { Ok(None) } }
/// #     fn list(&self, _: &ResourceType, _: &ListQuery, _: &RequestContext) -> impl Future<Output = Result<ListResult, ScimError>> + Send { async { Ok(ListResult::default()) } }
/// #     fn update(&self, _: &ResourceType, _: &str, d: Document, _: &RequestContext) -> impl Future<Output = Result<Document, ScimError>> + Send { async { Ok(d) } }
/// #     fn delete(&self, _: &ResourceType, _: &str, _: &RequestContext) -> impl Future<Output = Result<(), ScimError>> + Send { async { Ok(()) } }
/// # }
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let server = ScimServerBuilder::new(Handler)
///     .with_registry(SchemaRegistry::with_embedded_schemas()?)
///     .with_base_url("https://scim.example.com/v2")
///     .with_bulk_transaction_mode(BulkTransactionMode::PerOperation)
///     .build()?;
/// assert_eq!(
///     server.config().location("/Users", "2819c223"),
///     "https://scim.example.com/v2/Users/2819c223"
/// );
/// # Ok(())
/// # }
/// ```
pub struct ScimServerBuilder<H> {
    handler: H,
    registry: Option<SchemaRegistry>,
    config: ScimServerConfig,
    interceptor: Arc<dyn Interceptor>,
    transaction_scope: Arc<dyn TransactionScope>,
    request_validators: HashMap<String, Arc<dyn RequestValidator>>,
}

impl<H: ResourceHandler> ScimServerBuilder<H> {
    /// Start from the default configuration (localhost base URL, embedded
    /// User and Group resource types unless a registry is supplied).
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            registry: None,
            config: ScimServerConfig::default(),
            interceptor: Arc::new(PassThrough),
            transaction_scope: Arc::new(PassThrough),
            request_validators: HashMap::new(),
        }
    }

    /// Use a fully registered schema registry.
    pub fn with_registry(mut self, registry: SchemaRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the base URL, e.g. `"https://scim.example.com/v2"`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        self.config.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_service_provider_config(mut self, config: ServiceProviderConfig) -> Self {
        self.config.service_provider = config;
        self
    }

    pub fn with_patch_config(mut self, config: PatchConfig) -> Self {
        self.config.patch = config;
        self
    }

    pub fn with_interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptor = Arc::new(interceptor);
        self
    }

    pub fn with_transaction_scope(mut self, scope: impl TransactionScope + 'static) -> Self {
        self.transaction_scope = Arc::new(scope);
        self
    }

    /// Run `validator` for every request on the resource type named
    /// `resource_type` (e.g. `"User"`). A later call for the same name
    /// replaces the earlier validator.
    pub fn with_request_validator(
        mut self,
        resource_type: impl Into<String>,
        validator: impl RequestValidator + 'static,
    ) -> Self {
        self.request_validators
            .insert(resource_type.into(), Arc::new(validator));
        self
    }

    pub fn with_bulk_transaction_mode(mut self, mode: BulkTransactionMode) -> Self {
        self.config.bulk_transaction_mode = mode;
        self
    }

    /// Build the configured SCIM server.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] if the configuration is invalid or the
    /// embedded schemas fail to load.
    pub fn build(self) -> BuildResult<ScimServer<H>> {
        self.config.validate()?;
        let registry = match self.registry {
            Some(registry) => registry,
            None => SchemaRegistry::with_embedded_schemas()?,
        };
        if let Some(name) = self
            .request_validators
            .keys()
            .find(|name| registry.get_resource_type(name).is_none())
        {
            return Err(BuildError::InvalidConfiguration {
                message: format!("request validator for unknown resource type '{}'", name),
            });
        }
        log::info!(
            "Building SCIM server at {} with {} resource type(s)",
            self.config.base_url,
            registry.resource_types().len()
        );
        let patch_engine = PatchEngine::new(self.config.patch.clone());
        Ok(ScimServer {
            handler: self.handler,
            registry: Arc::new(registry),
            config: self.config,
            interceptor: self.interceptor,
            transaction_scope: self.transaction_scope,
            request_validators: self.request_validators,
            patch_engine,
        })
    }
}

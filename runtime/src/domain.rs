use crate::api::MetadataApi;
use crate::error::Result;
use crate::heap::{Handle, object_header_size};
use crate::rt::class::Class;
use crate::rt::object::Object;
use crate::{DomainConfig, debug_log};
use std::sync::Arc;

/// The attached runtime. Every entity keeps a reference to it.
pub struct Domain {
    api: Box<dyn MetadataApi>,
    config: DomainConfig,
}

impl Domain {
    /// Fails with [`ReflectError::InvalidConfig`](crate::ReflectError::InvalidConfig)
    /// when `config` does not pass [`DomainConfig::validate`].
    pub fn attach(api: impl MetadataApi + 'static, config: DomainConfig) -> Result<Arc<Self>> {
        config.validate()?;
        debug_log!("Attaching domain with {:?}", config);
        Ok(Arc::new(Self {
            api: Box::new(api),
            config,
        }))
    }

    pub fn api(&self) -> &dyn MetadataApi {
        self.api.as_ref()
    }

    pub fn config(&self) -> &DomainConfig {
        &self.config
    }

    pub fn header_size(&self) -> usize {
        object_header_size(self.api())
    }

    pub fn class(self: &Arc<Self>, handle: Handle) -> Result<Class> {
        Class::new(self.clone(), handle)
    }

    pub fn class_of(self: &Arc<Self>, object: Handle) -> Result<Class> {
        Class::class_of(self, object)
    }

    pub fn object(self: &Arc<Self>, handle: Handle) -> Result<Object> {
        Object::new(self.clone(), handle)
    }
}

impl std::fmt::Debug for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Domain")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

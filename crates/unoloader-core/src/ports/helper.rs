//! Resource helper port.
//!
//! The helper asks an installation which resource locations it contributes.
//! Implementations never fail: every problem is logged and degrades to an
//! empty list.

use std::path::Path;

use async_trait::async_trait;

use crate::resource::ResourceLocation;

/// Port for querying an installation's resource locations.
#[async_trait]
pub trait ResourceHelperPort: Send + Sync {
    async fn resource_locations(&self, installation: &Path) -> Vec<ResourceLocation>;
}

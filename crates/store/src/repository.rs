//! Read access to templates and read/write access to resources.
use std::sync::Arc;

use model::{ClassId, PayloadKey, Resource, ResourceFields, ResourceId, ResourceKind, Template, TemplateId};

use crate::StoreError;

/// Supplies template snapshots.
pub trait TemplateRepository: Send + Sync {
    fn template(&self, id: TemplateId) -> Result<Option<Arc<Template>>, StoreError>;
}

/// The storage layer the pipeline runs against.
///
/// `hydrate` turns a field map into the entity about to be persisted without
/// making it visible; `commit` makes it visible atomically and hands out
/// identifiers, including those of new annotations.
pub trait ResourceStore: Send + Sync {
    fn resource(&self, id: ResourceId) -> Result<Option<Resource>, StoreError>;

    fn resource_exists(&self, id: ResourceId) -> Result<bool, StoreError> {
        Ok(self.resource(id)?.is_some())
    }

    fn item_set_exists(&self, id: ResourceId) -> Result<bool, StoreError> {
        Ok(self
            .resource(id)?
            .is_some_and(|resource| resource.kind == ResourceKind::ItemSet))
    }

    /// First resource other than `exclude` holding, under `property`, a value
    /// whose exact payload key is one of `keys`.
    fn find_value_owner(
        &self,
        property: &str,
        exclude: Option<ResourceId>,
        keys: &[PayloadKey],
    ) -> Result<Option<ResourceId>, StoreError>;

    fn hydrate(&self, fields: ResourceFields) -> Result<Resource, StoreError>;

    fn commit(&self, resource: Resource) -> Result<Resource, StoreError>;

    /// Sets (or clears) the template and class of a committed annotation.
    fn set_annotation_template(
        &self,
        annotation: ResourceId,
        template: Option<TemplateId>,
        class: Option<ClassId>,
    ) -> Result<(), StoreError>;
}

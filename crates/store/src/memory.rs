//! In-memory collaborators backed by `RwLock`ed maps.
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use model::{
    ClassId, PayloadKey, PropertyMap, Resource, ResourceFields, ResourceId, Template, TemplateId,
    VocabularyId,
};
use tracing::debug;

use crate::repository::{ResourceStore, TemplateRepository};
use crate::vocabulary::{Vocabulary, VocabularyStore};
use crate::StoreError;

/// Title property of resources whose template names none.
pub const DEFAULT_TITLE_PROPERTY: &str = "dcterms:title";

fn poisoned<T>(_: T) -> StoreError {
    StoreError::backend("poisoned lock")
}

/// Templates, resources and vocabularies held in process memory.
///
/// Resources are kept in id order so lookups that scan (uniqueness) are
/// deterministic.
pub struct MemoryStore {
    templates: RwLock<HashMap<TemplateId, Arc<Template>>>,
    resources: RwLock<BTreeMap<ResourceId, Resource>>,
    /// Annotation id to owning resource id.
    annotations: RwLock<HashMap<ResourceId, ResourceId>>,
    vocabularies: RwLock<HashMap<VocabularyId, Vocabulary>>,
    read_only_vocabularies: RwLock<HashSet<VocabularyId>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            templates: RwLock::new(HashMap::new()),
            resources: RwLock::new(BTreeMap::new()),
            annotations: RwLock::new(HashMap::new()),
            vocabularies: RwLock::new(HashMap::new()),
            read_only_vocabularies: RwLock::new(HashSet::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn insert_template(&self, template: Template) -> Result<(), StoreError> {
        self.templates
            .write()
            .map_err(poisoned)?
            .insert(template.id, Arc::new(template));
        Ok(())
    }

    /// Stores a resource directly, bypassing the pipeline; returns its id.
    pub fn insert_resource(&self, resource: Resource) -> Result<ResourceId, StoreError> {
        let committed = self.commit(resource)?;
        committed
            .id
            .ok_or_else(|| StoreError::backend("committed resource without id"))
    }

    pub fn insert_vocabulary(&self, vocabulary: Vocabulary) -> Result<(), StoreError> {
        self.vocabularies
            .write()
            .map_err(poisoned)?
            .insert(vocabulary.id, vocabulary);
        Ok(())
    }

    /// Makes appends to a vocabulary fail.
    pub fn set_vocabulary_read_only(&self, id: VocabularyId) -> Result<(), StoreError> {
        self.read_only_vocabularies
            .write()
            .map_err(poisoned)?
            .insert(id);
        Ok(())
    }

    pub fn resource_count(&self) -> Result<usize, StoreError> {
        Ok(self.resources.read().map_err(poisoned)?.len())
    }

    fn allocate_id(&self) -> ResourceId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn reserve_id(&self, id: ResourceId) {
        self.next_id.fetch_max(id + 1, Ordering::Relaxed);
    }

    /// Assigns ids to new annotations, depth first; returns every annotation id.
    fn assign_annotation_ids(&self, properties: &mut PropertyMap, ids: &mut Vec<ResourceId>) {
        for value in properties.values_mut() {
            if let Some(annotation) = value.annotation_mut() {
                let id = match annotation.id {
                    Some(id) => {
                        self.reserve_id(id);
                        id
                    }
                    None => {
                        let id = self.allocate_id();
                        annotation.id = Some(id);
                        id
                    }
                };
                ids.push(id);
                self.assign_annotation_ids(&mut annotation.fields.properties, ids);
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn find_annotation(
    properties: &mut PropertyMap,
    id: ResourceId,
) -> Option<&mut model::Annotation> {
    for value in properties.values_mut() {
        if let Some(annotation) = value.annotation_mut() {
            if annotation.id == Some(id) {
                return Some(annotation);
            }
            if let Some(found) = find_annotation(&mut annotation.fields.properties, id) {
                return Some(found);
            }
        }
    }
    None
}

impl TemplateRepository for MemoryStore {
    fn template(&self, id: TemplateId) -> Result<Option<Arc<Template>>, StoreError> {
        Ok(self.templates.read().map_err(poisoned)?.get(&id).cloned())
    }
}

impl ResourceStore for MemoryStore {
    fn resource(&self, id: ResourceId) -> Result<Option<Resource>, StoreError> {
        Ok(self.resources.read().map_err(poisoned)?.get(&id).cloned())
    }

    fn resource_exists(&self, id: ResourceId) -> Result<bool, StoreError> {
        Ok(self.resources.read().map_err(poisoned)?.contains_key(&id))
    }

    fn find_value_owner(
        &self,
        property: &str,
        exclude: Option<ResourceId>,
        keys: &[PayloadKey],
    ) -> Result<Option<ResourceId>, StoreError> {
        if keys.is_empty() {
            return Ok(None);
        }
        let resources = self.resources.read().map_err(poisoned)?;
        let owner = resources
            .iter()
            .filter(|(id, _)| Some(**id) != exclude)
            .find(|(_, resource)| {
                resource
                    .properties
                    .get(property)
                    .iter()
                    .filter_map(|value| value.payload_key())
                    .any(|key| keys.contains(&key))
            })
            .map(|(id, _)| *id);
        Ok(owner)
    }

    fn hydrate(&self, fields: ResourceFields) -> Result<Resource, StoreError> {
        if let Some(id) = fields.id {
            if !self.resource_exists(id)? {
                return Err(StoreError::ResourceNotFound(id));
            }
        }
        let mut resource = Resource::from(fields);
        let templates = self.templates.read().map_err(poisoned)?;
        let title_property = resource
            .template
            .and_then(|id| templates.get(&id))
            .and_then(|template| template.title_property.as_deref())
            .unwrap_or(DEFAULT_TITLE_PROPERTY);
        resource.title = resource
            .properties
            .get(title_property)
            .iter()
            .find_map(|value| value.literal_text().filter(|text| !text.is_empty()))
            .map(str::to_string);
        for media in &mut resource.media {
            if media.template_label.is_none() {
                media.template_label = media
                    .template
                    .and_then(|id| templates.get(&id))
                    .map(|template| template.label.clone());
            }
        }
        Ok(resource)
    }

    fn commit(&self, mut resource: Resource) -> Result<Resource, StoreError> {
        let id = match resource.id {
            Some(id) => {
                self.reserve_id(id);
                id
            }
            None => self.allocate_id(),
        };
        resource.id = Some(id);
        let mut annotation_ids = Vec::new();
        self.assign_annotation_ids(&mut resource.properties, &mut annotation_ids);

        let mut resources = self.resources.write().map_err(poisoned)?;
        let mut annotations = self.annotations.write().map_err(poisoned)?;
        annotations.retain(|_, owner| *owner != id);
        for annotation in &annotation_ids {
            annotations.insert(*annotation, id);
        }
        resources.insert(id, resource.clone());
        debug!(
            resource_id = id,
            annotations = annotation_ids.len(),
            "memory_store_commit"
        );
        Ok(resource)
    }

    fn set_annotation_template(
        &self,
        annotation: ResourceId,
        template: Option<TemplateId>,
        class: Option<ClassId>,
    ) -> Result<(), StoreError> {
        let owner = self
            .annotations
            .read()
            .map_err(poisoned)?
            .get(&annotation)
            .copied()
            .ok_or(StoreError::ResourceNotFound(annotation))?;
        let mut resources = self.resources.write().map_err(poisoned)?;
        let target = resources
            .get_mut(&owner)
            .and_then(|resource| find_annotation(&mut resource.properties, annotation))
            .ok_or(StoreError::ResourceNotFound(annotation))?;
        target.fields.template = template;
        target.fields.class = class;
        Ok(())
    }
}

impl VocabularyStore for MemoryStore {
    fn vocabulary(&self, id: VocabularyId) -> Result<Option<Vocabulary>, StoreError> {
        Ok(self.vocabularies.read().map_err(poisoned)?.get(&id).cloned())
    }

    fn append_terms(&self, id: VocabularyId, terms: &[String]) -> Result<(), StoreError> {
        if self.read_only_vocabularies.read().map_err(poisoned)?.contains(&id) {
            return Err(StoreError::VocabularyReadOnly(id));
        }
        let mut vocabularies = self.vocabularies.write().map_err(poisoned)?;
        let vocabulary = vocabularies
            .get_mut(&id)
            .ok_or(StoreError::VocabularyNotFound(id))?;
        vocabulary.terms.extend(terms.iter().cloned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{Annotation, MediaRef, ResourceKind, Value};

    fn item(values: Vec<Value>) -> Resource {
        let mut fields = ResourceFields::new(ResourceKind::Item);
        for value in values {
            fields.properties.push(value);
        }
        Resource::from(fields)
    }

    #[test]
    fn commit_assigns_resource_and_annotation_ids() {
        let store = MemoryStore::new();
        let annotated = Value::annotation(
            "dcterms:subject",
            Annotation::new(ResourceFields::new(ResourceKind::ValueAnnotation)),
        );
        let committed = store.commit(item(vec![annotated])).expect("commit");

        let Some(id) = committed.id else {
            panic!("committed resource must have an id");
        };
        let annotation_id = committed.properties.get("dcterms:subject")[0]
            .annotation_ref()
            .and_then(|annotation| annotation.id);
        assert!(annotation_id.is_some());
        assert_ne!(annotation_id, Some(id));

        let Some(annotation_id) = annotation_id else {
            panic!("annotation id assigned");
        };
        store
            .set_annotation_template(annotation_id, Some(9), Some(4))
            .expect("link annotation");
        let stored = store.resource(id).expect("read").expect("present");
        let annotation = stored.properties.get("dcterms:subject")[0]
            .annotation_ref()
            .expect("annotation kept");
        assert_eq!(annotation.fields.template, Some(9));
        assert_eq!(annotation.fields.class, Some(4));
    }

    #[test]
    fn find_value_owner_excludes_self_and_matches_exact_keys() {
        let store = MemoryStore::new();
        let first = store
            .insert_resource(item(vec![Value::literal("dcterms:identifier", "X-1")]))
            .expect("insert");

        let keys = vec![PayloadKey::Literal("X-1".into())];
        assert_eq!(
            store.find_value_owner("dcterms:identifier", None, &keys).expect("query"),
            Some(first)
        );
        assert_eq!(
            store
                .find_value_owner("dcterms:identifier", Some(first), &keys)
                .expect("query"),
            None
        );
        assert_eq!(
            store.find_value_owner("dcterms:title", None, &keys).expect("query"),
            None
        );
    }

    #[test]
    fn hydrate_rejects_unknown_update_and_fills_media_labels() {
        let store = MemoryStore::new();
        store.insert_template(Template::new(3, "Scan")).expect("template");

        let mut fields = ResourceFields::new(ResourceKind::Item);
        fields.media.push(MediaRef { id: None, template: Some(3), template_label: None });
        let resource = store.hydrate(fields.clone()).expect("hydrate");
        assert_eq!(resource.media[0].template_label.as_deref(), Some("Scan"));
        assert_eq!(store.resource_count().expect("count"), 0);

        fields.id = Some(404);
        assert_eq!(store.hydrate(fields), Err(StoreError::ResourceNotFound(404)));
    }

    #[test]
    fn append_terms_keeps_order_and_honours_read_only() {
        let store = MemoryStore::new();
        store
            .insert_vocabulary(Vocabulary::literal(1, "Colours", &["red", "green"]))
            .expect("vocab");
        store.append_terms(1, &["blue".to_string()]).expect("append");
        let vocabulary = store.vocabulary(1).expect("read").expect("present");
        assert_eq!(vocabulary.terms, vec!["red", "green", "blue"]);

        store.set_vocabulary_read_only(1).expect("lock");
        assert_eq!(
            store.append_terms(1, &["cyan".to_string()]),
            Err(StoreError::VocabularyReadOnly(1))
        );
        assert_eq!(
            store.append_terms(2, &["cyan".to_string()]),
            Err(StoreError::VocabularyNotFound(2))
        );
    }

    #[test]
    fn hydrate_recomputes_the_title_from_the_title_property() {
        let store = MemoryStore::new();
        let mut template = Template::new(4, "Letter");
        template.title_property = Some("bibo:shortTitle".to_string());
        store.insert_template(template).expect("template");

        let mut stale = item(vec![Value::literal("dcterms:subject", "travel")]);
        stale.title = Some("Old title".to_string());
        let id = store.insert_resource(stale.clone()).expect("insert");

        let mut update = ResourceFields::from(stale);
        update.id = Some(id);
        let hydrated = store.hydrate(update.clone()).expect("hydrate");
        assert_eq!(hydrated.title, None);

        update.properties.push(Value::literal("dcterms:title", "New title"));
        let hydrated = store.hydrate(update.clone()).expect("hydrate");
        assert_eq!(hydrated.title.as_deref(), Some("New title"));

        update.template = Some(4);
        update.properties.push(Value::literal("bibo:shortTitle", "Short"));
        let hydrated = store.hydrate(update).expect("hydrate");
        assert_eq!(hydrated.title.as_deref(), Some("Short"));
    }
}

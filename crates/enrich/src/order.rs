//! Ordering of resource-typed values by a property of the linked resource.
use std::cmp::Ordering;
use std::collections::HashMap;

use model::{DataSet, OrderKey, Resource, ResourceFields, ResourceId, SortDirection};
use store::ResourceStore;

use crate::natural::natural_cmp;
use crate::EnrichError;

/// Per-key texts of a value's linked resource; `None` for non-resource values.
type SortKey = Option<Vec<Option<String>>>;

/// Text a linked resource exposes for a sort key: its first literal or URI.
fn linked_text(resource: &Resource, term: &str) -> Option<String> {
    resource
        .properties
        .get(term)
        .iter()
        .find_map(|value| value.text())
        .map(str::to_string)
        .filter(|text| !text.is_empty())
}

fn compare(a: &SortKey, b: &SortKey, keys: &[OrderKey]) -> Ordering {
    let (a, b) = match (a, b) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Greater,
        (Some(_), None) => return Ordering::Less,
        (Some(a), Some(b)) => (a, b),
    };
    for (index, key) in keys.iter().enumerate() {
        let ordering = match (&a[index], &b[index]) {
            (None, None) => continue,
            // Missing text sorts last in either direction.
            (None, Some(_)) => return Ordering::Greater,
            (Some(_), None) => return Ordering::Less,
            (Some(x), Some(y)) => natural_cmp(x, y),
        };
        let ordering = match key.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Stable multi-key sort of `property`'s values by texts read from their
/// linked resources. Linked resources are fetched once each.
pub fn reorder_by_linked(
    store: &dyn ResourceStore,
    property: &str,
    data_set: &DataSet,
    fields: &mut ResourceFields,
) -> Result<(), EnrichError> {
    let keys = &data_set.order_by_linked;
    if keys.is_empty() || fields.properties.get(property).len() < 2 {
        return Ok(());
    }

    let mut linked: HashMap<ResourceId, Option<Resource>> = HashMap::new();
    for id in fields
        .properties
        .get(property)
        .iter()
        .filter_map(|value| value.linked_resource())
    {
        if !linked.contains_key(&id) {
            linked.insert(id, store.resource(id)?);
        }
    }

    let Some(values) = fields.properties.get_mut(property) else {
        return Ok(());
    };
    let mut keyed: Vec<(SortKey, model::Value)> = values
        .drain(..)
        .map(|value| {
            let key = value.linked_resource().map(|id| {
                let resource = linked.get(&id).and_then(Option::as_ref);
                keys.iter()
                    .map(|key| resource.and_then(|resource| linked_text(resource, &key.term)))
                    .collect()
            });
            (key, value)
        })
        .collect();
    keyed.sort_by(|(a, _), (b, _)| compare(a, b, keys));
    values.extend(keyed.into_iter().map(|(_, value)| value));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{ResourceKind, Settings, Value};
    use serde_json::json;
    use store::MemoryStore;

    fn linked(store: &MemoryStore, title: Option<&str>, date: Option<&str>) -> ResourceId {
        let mut fields = ResourceFields::new(ResourceKind::Item);
        if let Some(title) = title {
            fields.properties.push(Value::literal("dcterms:title", title));
        }
        if let Some(date) = date {
            fields.properties.push(Value::literal("dcterms:date", date));
        }
        store
            .insert_resource(Resource::from(fields))
            .expect("insert linked resource")
    }

    fn ordered(order: serde_json::Value) -> DataSet {
        DataSet::from(Settings::new().with("order_by_linked_resource_properties", order))
    }

    fn linked_ids(fields: &ResourceFields) -> Vec<Option<ResourceId>> {
        fields
            .properties
            .get("dcterms:hasPart")
            .iter()
            .map(|value| value.linked_resource())
            .collect()
    }

    #[test]
    fn sorts_naturally_with_missing_and_non_resource_last() {
        let store = MemoryStore::new();
        let vol10 = linked(&store, Some("Vol 10"), None);
        let vol2 = linked(&store, Some("vol 2"), None);
        let untitled = linked(&store, None, None);

        let mut fields = ResourceFields::new(ResourceKind::Item)
            .with_value(Value::literal("dcterms:hasPart", "loose note"))
            .with_value(Value::resource("dcterms:hasPart", untitled))
            .with_value(Value::resource("dcterms:hasPart", vol10))
            .with_value(Value::resource("dcterms:hasPart", vol2));

        reorder_by_linked(&store, "dcterms:hasPart", &ordered(json!({"dcterms:title": "asc"})), &mut fields)
            .expect("reorder");
        assert_eq!(
            linked_ids(&fields),
            vec![Some(vol2), Some(vol10), Some(untitled), None]
        );
    }

    #[test]
    fn descending_key_with_tie_break_and_stable_ties() {
        let store = MemoryStore::new();
        let a = linked(&store, Some("A"), Some("2020"));
        let b = linked(&store, Some("B"), Some("2021"));
        let c = linked(&store, Some("C"), Some("2020"));
        let c_again = linked(&store, Some("C"), Some("2020"));

        let mut fields = ResourceFields::new(ResourceKind::Item)
            .with_value(Value::resource("dcterms:hasPart", c_again))
            .with_value(Value::resource("dcterms:hasPart", a))
            .with_value(Value::resource("dcterms:hasPart", c))
            .with_value(Value::resource("dcterms:hasPart", b));

        let data_set = ordered(json!(["dcterms:date desc", "dcterms:title asc"]));
        reorder_by_linked(&store, "dcterms:hasPart", &data_set, &mut fields).expect("reorder");
        assert_eq!(
            linked_ids(&fields),
            vec![Some(b), Some(a), Some(c_again), Some(c)]
        );
    }

    #[test]
    fn descending_keeps_missing_text_and_non_resources_last() {
        let store = MemoryStore::new();
        let older = linked(&store, Some("Older"), Some("2019"));
        let undated = linked(&store, Some("Undated"), None);
        let newer = linked(&store, Some("Newer"), Some("2021"));

        let mut fields = ResourceFields::new(ResourceKind::Item)
            .with_value(Value::resource("dcterms:hasPart", undated))
            .with_value(Value::literal("dcterms:hasPart", "loose note"))
            .with_value(Value::resource("dcterms:hasPart", older))
            .with_value(Value::resource("dcterms:hasPart", newer));

        reorder_by_linked(&store, "dcterms:hasPart", &ordered(json!({"dcterms:date": "desc"})), &mut fields)
            .expect("reorder");
        assert_eq!(
            linked_ids(&fields),
            vec![Some(newer), Some(older), Some(undated), None]
        );
    }
}

//! Templates, property bindings and their data-set configurations.
//!
//! A [`Template`] is an administrator-edited snapshot, read-only for the
//! pipeline. Each [`PropertyBinding`] links one property to the template and
//! carries one or more [`DataSet`]s, one per declared data-type group. Both
//! template-level and data-set settings arrive as opaque JSON maps
//! ([`Settings`]) and are parsed once into typed views here; the raw map is
//! kept so serialization round-trips untouched keys.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::ModelError;
use crate::settings::Settings;
use crate::types::{ClassId, DataType, ResourceKind, TemplateId};
use crate::value::Value;

/// Sort direction of one linked-resource ordering key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    fn parse(text: &str) -> Self {
        if text.trim().eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }
}

/// Property of the linked resource used as a sort key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderKey {
    pub term: String,
    pub direction: SortDirection,
}

/// Annotation-template setting of a data set, or of a whole template.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum AnnotationTemplateChoice {
    /// Empty: use the template-level default.
    #[default]
    Inherit,
    /// Explicit annotation template.
    Id(TemplateId),
    /// Annotations are filled in by hand; no template is applied.
    Manual,
    /// Explicitly no annotation template.
    None,
}

impl AnnotationTemplateChoice {
    pub fn from_setting(value: Option<&JsonValue>) -> Self {
        let text = match value {
            None | Some(JsonValue::Null) => return AnnotationTemplateChoice::Inherit,
            Some(JsonValue::Number(number)) => number.to_string(),
            Some(JsonValue::String(text)) => text.trim().to_string(),
            Some(_) => return AnnotationTemplateChoice::None,
        };
        if text.is_empty() {
            return AnnotationTemplateChoice::Inherit;
        }
        match text.parse::<TemplateId>() {
            Ok(0) => AnnotationTemplateChoice::Inherit,
            Ok(id) => AnnotationTemplateChoice::Id(id),
            Err(_) if text.eq_ignore_ascii_case("manual") => AnnotationTemplateChoice::Manual,
            Err(_) => AnnotationTemplateChoice::None,
        }
    }
}

/// Fixed automatic value of a data set.
#[derive(Debug, Clone, PartialEq)]
pub enum AutomaticValue {
    /// Full value object: `type` plus `@value`, `@id` or `value_resource_id`.
    Object(Map<String, JsonValue>),
    /// Bare text read according to the first declared data type.
    Text(String),
}

impl AutomaticValue {
    fn from_setting(value: Option<&JsonValue>) -> Option<Self> {
        match value? {
            JsonValue::Object(map) if !map.is_empty() => Some(AutomaticValue::Object(map.clone())),
            JsonValue::Number(number) => Some(AutomaticValue::Text(number.to_string())),
            JsonValue::String(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return None;
                }
                if text.starts_with('{') {
                    if let Ok(JsonValue::Object(map)) = serde_json::from_str::<JsonValue>(text) {
                        return Some(AutomaticValue::Object(map));
                    }
                }
                Some(AutomaticValue::Text(text.to_string()))
            }
            _ => None,
        }
    }
}

/// Configuration of one data-type group of a property binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Settings", into = "Settings")]
pub struct DataSet {
    /// Declared data types; empty means "any".
    pub data_types: Vec<DataType>,
    pub label: Option<String>,
    pub is_required: bool,
    pub is_private: bool,
    pub default_value: Option<String>,
    pub automatic_value: Option<AutomaticValue>,
    /// `automatic_value_issued = first`: stamp today's date on first publish.
    pub issue_on_first_publish: bool,
    pub display_value: Option<String>,
    pub unique_value: bool,
    pub locked_value: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min_values: Option<usize>,
    pub max_values: Option<usize>,
    pub input_control: Option<String>,
    pub split_separator: Option<String>,
    pub order_by_linked: Vec<OrderKey>,
    pub custom_vocab_open: bool,
    pub annotation_template: AnnotationTemplateChoice,
    raw: Settings,
}

impl DataSet {
    pub fn settings(&self) -> &Settings {
        &self.raw
    }

    /// True when the value's data type is one of the declared ones.
    pub fn matches(&self, value: &Value) -> bool {
        self.data_types.is_empty() || self.data_types.contains(&value.data_type)
    }

    /// First declared data type, `literal` when none is declared.
    pub fn primary_data_type(&self) -> DataType {
        self.data_types
            .first()
            .cloned()
            .unwrap_or_else(DataType::literal)
    }
}

impl Default for DataSet {
    fn default() -> Self {
        DataSet::from(Settings::new())
    }
}

fn parse_order_keys(value: Option<&JsonValue>) -> Vec<OrderKey> {
    match value {
        Some(JsonValue::Object(map)) => map
            .iter()
            .filter(|(term, _)| !term.trim().is_empty())
            .map(|(term, direction)| OrderKey {
                term: term.trim().to_string(),
                direction: SortDirection::parse(direction.as_str().unwrap_or("asc")),
            })
            .collect(),
        Some(JsonValue::Array(items)) => items
            .iter()
            .filter_map(JsonValue::as_str)
            .filter_map(parse_order_line)
            .collect(),
        Some(JsonValue::String(text)) => text.lines().filter_map(parse_order_line).collect(),
        _ => Vec::new(),
    }
}

/// `dcterms:date desc`, `dcterms:date = desc` or a bare term.
fn parse_order_line(line: &str) -> Option<OrderKey> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (term, direction) = match line.split_once('=') {
        Some((term, direction)) => (term.trim(), direction.trim()),
        None => match line.split_once(char::is_whitespace) {
            Some((term, direction)) => (term.trim(), direction.trim()),
            None => (line, "asc"),
        },
    };
    Some(OrderKey {
        term: term.to_string(),
        direction: SortDirection::parse(direction),
    })
}

impl From<Settings> for DataSet {
    fn from(raw: Settings) -> Self {
        let data_types = raw
            .list("o:data_type")
            .into_iter()
            .map(DataType::new)
            .collect();
        let split_separator = match raw.get("split_separator") {
            Some(JsonValue::String(separator)) if !separator.is_empty() => Some(separator.clone()),
            _ => None,
        };
        let issue_on_first_publish = raw
            .text("automatic_value_issued")
            .is_some_and(|text| text.trim() == "first");
        Self {
            data_types,
            label: raw.text("o:alternate_label"),
            is_required: raw.flag("o:is_required"),
            is_private: raw.flag("o:is_private"),
            default_value: raw.text("default_value"),
            automatic_value: AutomaticValue::from_setting(raw.get("automatic_value")),
            issue_on_first_publish,
            display_value: raw.text("display_value"),
            unique_value: raw.flag("unique_value"),
            locked_value: raw.flag("locked_value"),
            min_length: raw.count("min_length"),
            max_length: raw.count("max_length"),
            min_values: raw.count("min_values"),
            max_values: raw.count("max_values"),
            input_control: raw.text("input_control"),
            split_separator,
            order_by_linked: parse_order_keys(raw.get("order_by_linked_resource_properties")),
            custom_vocab_open: raw.flag("custom_vocab_open"),
            annotation_template: AnnotationTemplateChoice::from_setting(
                raw.get("value_annotations_template"),
            ),
            raw,
        }
    }
}

impl From<DataSet> for Settings {
    fn from(data_set: DataSet) -> Self {
        data_set.raw
    }
}

/// A property attached to a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyBinding {
    /// Property term (`dcterms:subject`).
    pub property: String,
    #[serde(default)]
    pub property_id: Option<u64>,
    #[serde(default)]
    pub data_sets: Vec<DataSet>,
}

impl PropertyBinding {
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            property_id: None,
            data_sets: Vec::new(),
        }
    }

    pub fn with_data_set(mut self, settings: Settings) -> Self {
        self.data_sets.push(DataSet::from(settings));
        self
    }
}

/// Template-level settings view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Settings", into = "Settings")]
pub struct TemplateSettings {
    /// Allowed resource kinds; empty allows every kind.
    pub use_for_resources: Vec<ResourceKind>,
    pub require_resource_class: bool,
    pub closed_class_list: bool,
    pub suggested_classes: Vec<ClassId>,
    /// Minimum media count keyed by media template id or label.
    pub media_templates_minimum: Vec<(String, usize)>,
    pub item_sets: Vec<u64>,
    /// Rule text handed to the rule evaluator.
    pub automatic_values: Option<String>,
    pub value_annotations_template: AnnotationTemplateChoice,
    pub title_fallback_properties: Vec<String>,
    raw: Settings,
}

impl TemplateSettings {
    pub fn settings(&self) -> &Settings {
        &self.raw
    }
}

impl Default for TemplateSettings {
    fn default() -> Self {
        TemplateSettings::from(Settings::new())
    }
}

fn parse_class_ids(value: Option<&JsonValue>) -> Vec<ClassId> {
    let ids: Vec<ClassId> = match value {
        Some(JsonValue::Array(items)) => items.iter().filter_map(json_id).collect(),
        Some(JsonValue::Object(map)) => map.values().filter_map(json_id).collect(),
        Some(other) => json_id(other).into_iter().collect(),
        None => Vec::new(),
    };
    ids.into_iter().filter(|id| *id > 0).collect()
}

fn json_id(value: &JsonValue) -> Option<u64> {
    match value {
        JsonValue::Number(number) => number.as_u64(),
        JsonValue::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn parse_media_minimums(value: Option<&JsonValue>) -> Vec<(String, usize)> {
    let Some(JsonValue::Object(map)) = value else {
        return Vec::new();
    };
    map.iter()
        .filter_map(|(key, count)| {
            let count = json_id(count)? as usize;
            (count > 0).then(|| (key.trim().to_string(), count))
        })
        .collect()
}

impl From<Settings> for TemplateSettings {
    fn from(raw: Settings) -> Self {
        let use_for_resources = raw
            .list("use_for_resources")
            .iter()
            .filter_map(|name| ResourceKind::from_name(name))
            .collect();
        let automatic_values = match raw.get("automatic_values") {
            Some(JsonValue::String(text)) if !text.trim().is_empty() => Some(text.clone()),
            _ => None,
        };
        Self {
            use_for_resources,
            require_resource_class: raw.flag("require_resource_class"),
            closed_class_list: raw.flag("closed_class_list"),
            suggested_classes: parse_class_ids(raw.get("suggested_resource_class_ids")),
            media_templates_minimum: parse_media_minimums(raw.get("media_templates_minimum")),
            item_sets: raw.id_list("item_sets"),
            automatic_values,
            value_annotations_template: AnnotationTemplateChoice::from_setting(
                raw.get("value_annotations_template"),
            ),
            title_fallback_properties: raw.list("title_fallback_properties"),
            raw,
        }
    }
}

impl From<TemplateSettings> for Settings {
    fn from(settings: TemplateSettings) -> Self {
        settings.raw
    }
}

/// Administrator-edited configuration entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: TemplateId,
    pub label: String,
    /// Class assigned to resources (and annotations) using this template.
    #[serde(default)]
    pub class: Option<ClassId>,
    /// Property holding the display title; `dcterms:title` when unset.
    #[serde(default)]
    pub title_property: Option<String>,
    #[serde(default)]
    pub bindings: Vec<PropertyBinding>,
    #[serde(default)]
    pub settings: TemplateSettings,
}

impl Template {
    pub fn new(id: TemplateId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            class: None,
            title_property: None,
            bindings: Vec::new(),
            settings: TemplateSettings::default(),
        }
    }

    /// Decodes a template snapshot from JSON.
    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        serde_json::from_str(text).map_err(|err| ModelError::decode("template", err))
    }

    pub fn with_binding(mut self, binding: PropertyBinding) -> Self {
        self.bindings.push(binding);
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = TemplateSettings::from(settings);
        self
    }

    pub fn with_class(mut self, class: ClassId) -> Self {
        self.class = Some(class);
        self
    }

    /// Every `(property, data set)` pair, in template order.
    pub fn data_sets(&self) -> impl Iterator<Item = (&str, &DataSet)> {
        self.bindings.iter().flat_map(|binding| {
            binding
                .data_sets
                .iter()
                .map(move |data_set| (binding.property.as_str(), data_set))
        })
    }

    /// First binding for a property.
    pub fn binding(&self, property: &str) -> Option<&PropertyBinding> {
        self.bindings.iter().find(|binding| binding.property == property)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data_set(settings: JsonValue) -> DataSet {
        let Ok(settings) = serde_json::from_value::<Settings>(settings) else {
            panic!("fixture settings must be an object");
        };
        DataSet::from(settings)
    }

    #[test]
    fn data_set_parses_typed_view() {
        let ds = data_set(json!({
            "o:data_type": ["literal", "customvocab:4"],
            "o:is_required": "1",
            "min_length": "3",
            "max_length": 0,
            "automatic_value_issued": "first",
            "split_separator": ";",
            "order_by_linked_resource_properties": {"dcterms:date": "DESC", "dcterms:title": "asc"},
            "value_annotations_template": "none",
            "unrelated": 5,
        }));
        assert_eq!(ds.data_types.len(), 2);
        assert!(ds.is_required);
        assert_eq!(ds.min_length, Some(3));
        assert_eq!(ds.max_length, None);
        assert!(ds.issue_on_first_publish);
        assert_eq!(ds.split_separator.as_deref(), Some(";"));
        assert_eq!(ds.order_by_linked[0].direction, SortDirection::Desc);
        assert_eq!(ds.order_by_linked[1].term, "dcterms:title");
        assert_eq!(ds.annotation_template, AnnotationTemplateChoice::None);
        assert_eq!(ds.settings().get("unrelated"), Some(&json!(5)));
    }

    #[test]
    fn order_keys_from_lines() {
        let ds = data_set(json!({
            "order_by_linked_resource_properties": "dcterms:date desc\n\ndcterms:title"
        }));
        assert_eq!(
            ds.order_by_linked,
            vec![
                OrderKey { term: "dcterms:date".into(), direction: SortDirection::Desc },
                OrderKey { term: "dcterms:title".into(), direction: SortDirection::Asc },
            ]
        );
    }

    #[test]
    fn annotation_choice_variants() {
        assert_eq!(AnnotationTemplateChoice::from_setting(None), AnnotationTemplateChoice::Inherit);
        assert_eq!(
            AnnotationTemplateChoice::from_setting(Some(&json!(""))),
            AnnotationTemplateChoice::Inherit
        );
        assert_eq!(
            AnnotationTemplateChoice::from_setting(Some(&json!("12"))),
            AnnotationTemplateChoice::Id(12)
        );
        assert_eq!(
            AnnotationTemplateChoice::from_setting(Some(&json!("manual"))),
            AnnotationTemplateChoice::Manual
        );
    }

    #[test]
    fn automatic_value_accepts_json_text() {
        let ds = data_set(json!({"automatic_value": "{\"type\": \"uri\", \"@id\": \"https://x.test\"}"}));
        assert!(matches!(ds.automatic_value, Some(AutomaticValue::Object(_))));
        let ds = data_set(json!({"automatic_value": "  plain  "}));
        assert_eq!(ds.automatic_value, Some(AutomaticValue::Text("plain".into())));
    }

    #[test]
    fn template_settings_parse_classes_and_minimums() {
        let Ok(settings) = serde_json::from_value::<Settings>(json!({
            "use_for_resources": ["items", "media", "bogus"],
            "closed_class_list": "yes",
            "suggested_resource_class_ids": {"Book": 7, "Article": "9"},
            "media_templates_minimum": {"3": 1, "Scan": "2", "Zero": 0},
            "item_sets": ["5", 6],
        })) else {
            panic!("fixture settings must be an object");
        };
        let view = TemplateSettings::from(settings);
        assert_eq!(view.use_for_resources, vec![ResourceKind::Item, ResourceKind::Media]);
        assert!(view.closed_class_list);
        assert_eq!(view.suggested_classes.len(), 2);
        assert_eq!(
            view.media_templates_minimum,
            vec![("3".to_string(), 1), ("Scan".to_string(), 2)]
        );
        assert_eq!(view.item_sets, vec![5, 6]);
    }

    #[test]
    fn data_set_serializes_back_to_raw_map() {
        let ds = data_set(json!({"min_values": 2, "o:is_required": true}));
        let json = serde_json::to_value(&ds).expect("serialize data set");
        assert_eq!(json, json!({"min_values": 2, "o:is_required": true}));
    }
}

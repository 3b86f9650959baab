//! Automatic-value rule text and a mapping evaluator for it.
//!
//! Rule text is line based:
//!
//! ```text
//! [automatic_values] = Optional label
//! dcterms:title = dcterms:alternative
//! dcterms:identifier = bibo:uri ^^uri ~ https://example.org/id/{{value}}
//! ~ = dcterms:rights ~ Copyright {{dcterms:creator}}
//! ```
//!
//! A `[section]` header opens a group of rules. Inside it, each line maps a
//! source (`from`) onto a target (`to`). The target names a property term,
//! optionally followed by `^^datatype`, `@language`, `§private` and a
//! `~ pattern`. A `~` source takes no input: the pattern alone produces the
//! value. `{{term}}` placeholders read the first value of that term in the
//! field map, and `{{value}}` reads the current source value.
use model::{DataType, MainType, ResourceFields, Value};
use store::{RuleEvaluator, StoreError};
use tracing::debug;

/// Where a mapping writes its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTarget {
    pub property: String,
    pub data_type: Option<DataType>,
    pub language: Option<String>,
    pub is_public: bool,
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRule {
    /// Source property term, or `~` for a constant.
    pub from: String,
    pub to: RuleTarget,
}

impl MappingRule {
    pub fn is_constant(&self) -> bool {
        self.from == "~"
    }
}

/// Rules under one `[section]` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSection {
    pub name: String,
    pub sub: Option<String>,
    pub variant: Option<String>,
    pub label: Option<String>,
    pub rules: Vec<MappingRule>,
}

impl RuleSection {
    /// `name`, `name:sub` or `name:sub #variant`.
    pub fn key(&self) -> String {
        let mut key = self.name.clone();
        if let Some(sub) = &self.sub {
            key.push(':');
            key.push_str(sub);
        }
        if let Some(variant) = &self.variant {
            key.push_str(" #");
            key.push_str(variant);
        }
        key
    }
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn parse_header(line: &str) -> Option<RuleSection> {
    let rest = line.strip_prefix('[')?;
    let (inner, after) = rest.split_once(']')?;
    let (inner, variant) = match inner.split_once('#') {
        Some((inner, variant)) => (inner, non_empty(variant)),
        None => (inner, None),
    };
    let (name, sub) = match inner.split_once(':') {
        Some((name, sub)) => (name.trim(), non_empty(sub)),
        None => (inner.trim(), None),
    };
    let valid_name = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid_name {
        return None;
    }
    let after = after.trim();
    let label = non_empty(after.strip_prefix('=').unwrap_or(after));
    Some(RuleSection {
        name: name.to_string(),
        sub,
        variant,
        label,
        rules: Vec::new(),
    })
}

/// Parses a target expression: `term [^^datatype] [@lang] [§private] [~ pattern]`.
pub fn parse_target(text: &str) -> Option<RuleTarget> {
    let (head, pattern) = match text.split_once('~') {
        Some((head, pattern)) => (head, non_empty(pattern)),
        None => (text, None),
    };
    let mut tokens = head.split_whitespace();
    let property = tokens.next()?;
    let is_term = property
        .split_once(':')
        .is_some_and(|(prefix, local)| !prefix.is_empty() && !local.is_empty());
    if !is_term {
        return None;
    }
    let mut target = RuleTarget {
        property: property.to_string(),
        data_type: None,
        language: None,
        is_public: true,
        pattern,
    };
    for token in tokens {
        if let Some(data_type) = token.strip_prefix("^^") {
            target.data_type = non_empty(data_type).map(DataType::new);
        } else if let Some(language) = token.strip_prefix('@') {
            target.language = non_empty(language);
        } else if token == "§private" {
            target.is_public = false;
        } else if token == "§public" {
            target.is_public = true;
        }
    }
    Some(target)
}

fn parse_mapping(line: &str) -> Option<MappingRule> {
    let position = if line.starts_with('~') {
        line.find('=')?
    } else {
        let head = line.split('~').next().unwrap_or(line);
        head.rfind('=')?
    };
    let from = line[..position].trim();
    let to = line[position + 1..].trim();
    if from.is_empty() || to.is_empty() {
        return None;
    }
    Some(MappingRule {
        from: from.to_string(),
        to: parse_target(to)?,
    })
}

/// Parses rule text into sections. Lines before the first header, invalid
/// headers, unparsable mappings and autofiller endpoint lines (`?query`,
/// `http(s)://`) are skipped.
pub fn parse_rule_text(text: &str) -> Vec<RuleSection> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut sections: Vec<RuleSection> = Vec::new();
    let mut in_section = false;
    for line in normalized.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if line.starts_with('[') {
            match parse_header(line) {
                Some(section) => {
                    sections.push(section);
                    in_section = true;
                }
                None => in_section = false,
            }
            continue;
        }
        if !in_section
            || line.starts_with('?')
            || line.starts_with("http://")
            || line.starts_with("https://")
        {
            continue;
        }
        if let (Some(section), Some(rule)) = (sections.last_mut(), parse_mapping(line)) {
            section.rules.push(rule);
        }
    }
    sections
}

/// Rule evaluator applying `from = to` mappings over the field map itself.
#[derive(Debug, Clone)]
pub struct MappingEvaluator {
    section: String,
}

impl MappingEvaluator {
    pub const DEFAULT_SECTION: &'static str = "automatic_values";

    pub fn new() -> Self {
        Self {
            section: Self::DEFAULT_SECTION.to_string(),
        }
    }

    /// Evaluates rules of another section name.
    pub fn for_section(section: impl Into<String>) -> Self {
        Self {
            section: section.into(),
        }
    }
}

impl Default for MappingEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// Text of the first value of `term` usable as a placeholder.
fn first_text(fields: &ResourceFields, term: &str) -> Option<String> {
    fields.properties.get(term).iter().find_map(source_text)
}

fn source_text(value: &Value) -> Option<String> {
    value
        .text()
        .map(str::to_string)
        .or_else(|| value.linked_resource().map(|id| id.to_string()))
}

/// Fills `{{...}}` placeholders; `None` when one cannot be resolved.
fn fill_pattern(pattern: &str, fields: &ResourceFields, current: Option<&str>) -> Option<String> {
    let mut output = String::with_capacity(pattern.len());
    let mut rest = pattern;
    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find("}}")?;
        let key = after[..end].trim();
        let replacement = if key == "value" {
            current.map(str::to_string)
        } else {
            first_text(fields, key)
        }?;
        output.push_str(&replacement);
        rest = &after[end + 2..];
    }
    output.push_str(rest);
    Some(output)
}

fn build_value(target: &RuleTarget, text: &str) -> Option<Value> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let data_type = target.data_type.clone().unwrap_or_else(DataType::literal);
    let mut value = match data_type.main() {
        MainType::Resource => Value::resource(target.property.clone(), text.parse().ok()?),
        MainType::Uri => Value::uri(target.property.clone(), text),
        MainType::Literal => Value::literal(target.property.clone(), text),
    }
    .with_data_type(data_type)
    .with_public(target.is_public);
    value.language = target.language.clone();
    Some(value)
}

impl RuleEvaluator for MappingEvaluator {
    fn evaluate(&self, rules: &str, fields: &ResourceFields) -> Result<Vec<Value>, StoreError> {
        let text = if rules.trim_start().starts_with('[') {
            rules.to_string()
        } else {
            format!("[{}]\n{rules}", self.section)
        };
        let mut produced = Vec::new();
        for section in parse_rule_text(&text)
            .iter()
            .filter(|section| section.name == self.section)
        {
            for rule in &section.rules {
                if rule.is_constant() {
                    let Some(pattern) = &rule.to.pattern else {
                        continue;
                    };
                    if let Some(value) = fill_pattern(pattern, fields, None)
                        .and_then(|text| build_value(&rule.to, &text))
                    {
                        produced.push(value);
                    }
                    continue;
                }
                for source in fields.properties.get(&rule.from) {
                    let Some(current) = source_text(source) else {
                        continue;
                    };
                    let text = match &rule.to.pattern {
                        Some(pattern) => fill_pattern(pattern, fields, Some(&current)),
                        None => Some(current),
                    };
                    if let Some(value) = text.and_then(|text| build_value(&rule.to, &text)) {
                        produced.push(value);
                    }
                }
            }
        }
        debug!(produced = produced.len(), section = %self.section, "mapping_rules_evaluated");
        Ok(produced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{ResourceKind, ValuePayload};

    #[test]
    fn parses_sections_and_mappings() {
        let sections = parse_rule_text(
            "ignored = before:header\n\
             [automatic_values] = Derived\n\
             dcterms:title = dcterms:alternative\n\
             ?q=ignored\n\
             https://example.org/api\n\
             ~ = dcterms:rights ^^literal @en §private ~ (c) {{dcterms:creator}}\n\
             not a rule\n\
             [geonames:search #fr]\n\
             name = dcterms:spatial",
        );
        assert_eq!(sections.len(), 2);
        let first = &sections[0];
        assert_eq!(first.key(), "automatic_values");
        assert_eq!(first.label.as_deref(), Some("Derived"));
        assert_eq!(first.rules.len(), 2);
        assert!(first.rules[1].is_constant());
        let target = &first.rules[1].to;
        assert_eq!(target.property, "dcterms:rights");
        assert_eq!(target.language.as_deref(), Some("en"));
        assert!(!target.is_public);
        assert_eq!(target.pattern.as_deref(), Some("(c) {{dcterms:creator}}"));
        assert_eq!(sections[1].key(), "geonames:search #fr");
    }

    #[test]
    fn equals_sign_inside_pattern_does_not_split() {
        let sections =
            parse_rule_text("[automatic_values]\ndcterms:identifier = bibo:uri ^^uri ~ https://x.test/?id={{value}}");
        let rule = &sections[0].rules[0];
        assert_eq!(rule.from, "dcterms:identifier");
        assert_eq!(rule.to.property, "bibo:uri");
        assert_eq!(rule.to.pattern.as_deref(), Some("https://x.test/?id={{value}}"));
    }

    #[test]
    fn evaluator_maps_and_fills_placeholders() {
        let fields = ResourceFields::new(ResourceKind::Item)
            .with_value(Value::literal("dcterms:identifier", "A-7"))
            .with_value(Value::literal("dcterms:creator", "Ada"));
        let values = MappingEvaluator::new()
            .evaluate(
                "dcterms:identifier = bibo:uri ^^uri ~ https://x.test/{{value}}\n\
                 ~ = dcterms:rights ~ (c) {{dcterms:creator}}\n\
                 ~ = dcterms:audience ~ {{dcterms:missing}}",
                &fields,
            )
            .expect("evaluate");
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].property, "bibo:uri");
        assert_eq!(values[0].payload, ValuePayload::Uri("https://x.test/A-7".into()));
        assert_eq!(values[1].literal_text(), Some("(c) Ada"));
    }

    #[test]
    fn resource_targets_need_numeric_ids() {
        let fields = ResourceFields::new(ResourceKind::Item)
            .with_value(Value::literal("dcterms:source", "12"))
            .with_value(Value::literal("dcterms:source", "twelve"));
        let values = MappingEvaluator::new()
            .evaluate("dcterms:source = dcterms:relation ^^resource:item", &fields)
            .expect("evaluate");
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].linked_resource(), Some(12));
    }
}

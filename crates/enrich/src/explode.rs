use model::{DataSet, ResourceFields, ValuePayload};

/// Splits each plain literal of `property` on the data set's separator.
///
/// Applies only when the data set's first declared type is `literal`. Every
/// fragment is trimmed, empty fragments are dropped and each remaining one
/// becomes a copy of the original value with the fragment as text. Other
/// values are kept in place.
pub fn explode_delimited_literal(property: &str, data_set: &DataSet, fields: &mut ResourceFields) {
    let first_is_literal = data_set
        .data_types
        .first()
        .is_some_and(|data_type| data_type.is_plain_literal());
    let Some(separator) = data_set.split_separator.as_deref() else {
        return;
    };
    if !first_is_literal {
        return;
    }
    let Some(values) = fields.properties.get_mut(property) else {
        return;
    };
    let mut exploded = Vec::with_capacity(values.len());
    for value in values.drain(..) {
        let text = match (&value.payload, value.data_type.is_plain_literal()) {
            (ValuePayload::Literal(text), true) => text.clone(),
            _ => {
                exploded.push(value);
                continue;
            }
        };
        for fragment in text
            .split(separator)
            .map(str::trim)
            .filter(|fragment| !fragment.is_empty())
        {
            let mut copy = value.clone();
            copy.payload = ValuePayload::Literal(fragment.to_string());
            exploded.push(copy);
        }
    }
    *values = exploded;
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{ResourceKind, Settings, Value};

    fn splitting(separator: &str, data_type: &str) -> DataSet {
        DataSet::from(
            Settings::new()
                .with("o:data_type", serde_json::json!([data_type]))
                .with("split_separator", separator),
        )
    }

    fn texts(fields: &ResourceFields, term: &str) -> Vec<String> {
        fields
            .properties
            .get(term)
            .iter()
            .filter_map(|value| value.text().map(str::to_string))
            .collect()
    }

    #[test]
    fn splits_trims_and_drops_empty_fragments() {
        let mut fields = ResourceFields::new(ResourceKind::Item)
            .with_value(Value::literal("dcterms:subject", " maps ;; charts; ").with_public(false))
            .with_value(Value::uri("dcterms:subject", "https://x.test/a;b"));
        explode_delimited_literal("dcterms:subject", &splitting(";", "literal"), &mut fields);

        assert_eq!(texts(&fields, "dcterms:subject"), vec!["maps", "charts", "https://x.test/a;b"]);
        assert!(!fields.properties.get("dcterms:subject")[1].is_public);
    }

    #[test]
    fn rejoining_fragments_gives_trimmed_original() {
        let original = " a ; b;;c ;  ";
        let mut fields = ResourceFields::new(ResourceKind::Item)
            .with_value(Value::literal("dcterms:subject", original));
        explode_delimited_literal("dcterms:subject", &splitting(";", "literal"), &mut fields);

        let expected: Vec<&str> = original
            .split(';')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        assert_eq!(texts(&fields, "dcterms:subject").join(";"), expected.join(";"));
    }

    #[test]
    fn non_literal_data_set_is_left_alone() {
        let mut fields = ResourceFields::new(ResourceKind::Item)
            .with_value(Value::literal("dcterms:subject", "a;b"));
        explode_delimited_literal("dcterms:subject", &splitting(";", "uri"), &mut fields);
        assert_eq!(texts(&fields, "dcterms:subject"), vec!["a;b"]);
    }
}

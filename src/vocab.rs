//! Growth of open vocabularies from accepted values.
use std::collections::BTreeMap;

use model::{Resource, Template, Violation, ViolationKind, ViolationSet, VocabularyId};
use store::{Vocabulary, VocabularyKind, VocabularyStore};
use tracing::{info, warn};

/// New terms gathered for one vocabulary.
#[derive(Debug)]
struct PendingTerms {
    vocabulary: Vocabulary,
    /// Property the last new term came from; violations are keyed on it.
    property: String,
    new: Vec<String>,
}

/// Appends unknown literal terms to the open vocabularies they are typed with.
///
/// Only bindings flagged `custom_vocab_open` are considered, and only
/// vocabularies of literal terms grow. Each vocabulary receives at most one
/// append, with its new terms in first-seen order. A failed append is
/// reported as a violation on the property; nothing is rolled back.
///
/// Two concurrent saves introducing the same term may both read the list
/// before either appends.
#[derive(Clone, Copy)]
pub struct CustomVocabExpander<'a> {
    vocabularies: &'a dyn VocabularyStore,
}

impl<'a> CustomVocabExpander<'a> {
    pub fn new(vocabularies: &'a dyn VocabularyStore) -> Self {
        Self { vocabularies }
    }

    pub fn expand(&self, template: &Template, resource: &Resource) -> ViolationSet {
        let mut violations = ViolationSet::new();
        let open: Vec<&str> = template
            .data_sets()
            .filter(|(_, data_set)| data_set.custom_vocab_open)
            .map(|(property, _)| property)
            .collect();
        if open.is_empty() {
            return violations;
        }

        let mut pending: BTreeMap<VocabularyId, PendingTerms> = BTreeMap::new();
        let mut unusable: Vec<VocabularyId> = Vec::new();
        for property in open {
            for value in resource.properties.get(property) {
                let Some(id) = value.data_type.vocabulary_id() else {
                    continue;
                };
                let Some(text) = value.literal_text().map(str::trim) else {
                    continue;
                };
                if text.is_empty() || unusable.contains(&id) {
                    continue;
                }
                if !pending.contains_key(&id) {
                    match self.load(id) {
                        Some(vocabulary) => {
                            pending.insert(
                                id,
                                PendingTerms {
                                    vocabulary,
                                    property: property.to_string(),
                                    new: Vec::new(),
                                },
                            );
                        }
                        None => {
                            unusable.push(id);
                            continue;
                        }
                    }
                }
                let Some(entry) = pending.get_mut(&id) else {
                    continue;
                };
                if entry.vocabulary.contains(text) || entry.new.iter().any(|known| known == text) {
                    continue;
                }
                entry.new.push(text.to_string());
                entry.property = property.to_string();
            }
        }

        for (id, entry) in pending {
            if entry.new.is_empty() {
                continue;
            }
            match self.vocabularies.append_terms(id, &entry.new) {
                Ok(()) => info!(
                    vocabulary_id = id,
                    vocabulary = %entry.vocabulary.label,
                    appended = entry.new.len(),
                    "vocabulary_expanded"
                ),
                Err(err) => {
                    warn!(vocabulary_id = id, error = %err, "vocabulary_append_failed");
                    violations.push(Violation::on_property(
                        entry.property,
                        ViolationKind::VocabularyAppend {
                            vocabulary: id,
                            reason: err.to_string(),
                        },
                    ));
                }
            }
        }
        violations
    }

    /// Literal vocabulary by id; `None` when missing, unreadable or not literal.
    fn load(&self, id: VocabularyId) -> Option<Vocabulary> {
        match self.vocabularies.vocabulary(id) {
            Ok(Some(vocabulary)) if vocabulary.kind == VocabularyKind::Literal => Some(vocabulary),
            Ok(_) => None,
            Err(err) => {
                warn!(vocabulary_id = id, error = %err, "vocabulary_read_failed");
                None
            }
        }
    }
}

impl std::fmt::Debug for CustomVocabExpander<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomVocabExpander").finish_non_exhaustive()
    }
}

use model::{ResourceFields, Value};

use crate::StoreError;

/// Evaluates a template's automatic-value rule text against a field map.
///
/// Returned values carry their target property in [`Value::property`].
pub trait RuleEvaluator: Send + Sync {
    fn evaluate(&self, rules: &str, fields: &ResourceFields) -> Result<Vec<Value>, StoreError>;
}

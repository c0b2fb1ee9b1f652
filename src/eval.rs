//! Expression evaluation: `eval(ValueItem, Env) -> Value | EvalError`.
//!
//! The expression sub-language itself is an external collaborator — this
//! module only defines the seam (the [`Evaluator`] trait) the interpreter
//! calls through, plus one default implementation (literal / name-reference
//! / `{{ name }}` template) sufficient to run this crate's worked scenarios
//! and its own tests. Embedding applications are expected to supply a real
//! expression language by implementing `Evaluator` themselves.

use crate::environment::Environment;
use crate::error::SakuraError;
use crate::value::Value;
use crate::value_item::{Expression, ValueItem};

/// The evaluation seam. Evaluation never mutates the environment.
pub trait Evaluator: Send + Sync {
    /// Resolve a `ValueItem`'s expression against `env`.
    fn eval(&self, item: &ValueItem, env: &Environment) -> Result<Value, SakuraError>;
}

/// The default `Evaluator`: literals pass through, `Reference(name)` reads
/// `name` out of the environment (recursively, through the parent chain),
/// and `Template(text)` substitutes each `{{ name }}` occurrence with the
/// referenced value's display string.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEvaluator;

/// Recursion past this depth is treated as a reference cycle.
const MAX_REFERENCE_DEPTH: usize = 64;

impl DefaultEvaluator {
    fn eval_depth(
        &self,
        item: &ValueItem,
        env: &Environment,
        depth: usize,
    ) -> Result<Value, SakuraError> {
        if depth > MAX_REFERENCE_DEPTH {
            return Err(SakuraError::Eval {
                hierarchy: Vec::new(),
                message: "reference cycle while evaluating expression".to_string(),
            });
        }
        match &item.expression {
            Expression::Literal(value) => Ok(value.clone()),
            Expression::Reference(name) => {
                let bound = env.get(name).ok_or_else(|| SakuraError::Eval {
                    hierarchy: Vec::new(),
                    message: format!("unresolved name '{name}'"),
                })?;
                self.eval_depth(bound, env, depth + 1)
            }
            Expression::Template(text) => self.eval_template(text, env, depth),
        }
    }

    fn eval_template(
        &self,
        text: &str,
        env: &Environment,
        depth: usize,
    ) -> Result<Value, SakuraError> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after_open = &rest[start + 2..];
            let Some(end) = after_open.find("}}") else {
                out.push_str(&rest[start..]);
                rest = "";
                break;
            };
            let name = after_open[..end].trim();
            let bound = env.get(name).ok_or_else(|| SakuraError::Eval {
                hierarchy: Vec::new(),
                message: format!("unresolved name '{name}' in template"),
            })?;
            let resolved = self.eval_depth(bound, env, depth + 1)?;
            out.push_str(&resolved.to_display_string());
            rest = &after_open[end + 2..];
        }
        out.push_str(rest);
        Ok(Value::String(out))
    }
}

impl Evaluator for DefaultEvaluator {
    fn eval(&self, item: &ValueItem, env: &Environment) -> Result<Value, SakuraError> {
        self.eval_depth(item, env, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_item::ValueItemMap;

    fn env_with(name: &str, value: Value) -> Environment {
        let mut map = ValueItemMap::new();
        map.insert(name, ValueItem::input(value));
        Environment::from_map(map)
    }

    #[test]
    fn literal_passes_through() {
        let eval = DefaultEvaluator;
        let env = Environment::new();
        let item = ValueItem::input(Value::Integer(5));
        assert_eq!(eval.eval(&item, &env).unwrap(), Value::Integer(5));
    }

    #[test]
    fn reference_reads_environment() {
        let eval = DefaultEvaluator;
        let env = env_with("x", Value::Integer(42));
        let item = ValueItem::reference("x");
        assert_eq!(eval.eval(&item, &env).unwrap(), Value::Integer(42));
    }

    #[test]
    fn unresolved_reference_is_an_eval_error() {
        let eval = DefaultEvaluator;
        let env = Environment::new();
        let item = ValueItem::reference("missing");
        assert!(eval.eval(&item, &env).is_err());
    }

    #[test]
    fn template_substitutes_named_placeholder() {
        let eval = DefaultEvaluator;
        let env = env_with("i", Value::Integer(3));
        let item = ValueItem::template("value={{ i }}");
        assert_eq!(eval.eval(&item, &env).unwrap(), Value::String("value=3".to_string()));
    }

    #[test]
    fn template_with_no_placeholders_is_left_alone() {
        let eval = DefaultEvaluator;
        let env = Environment::new();
        let item = ValueItem::template("constant");
        assert_eq!(eval.eval(&item, &env).unwrap(), Value::String("constant".to_string()));
    }
}

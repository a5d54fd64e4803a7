use pyx_runtime_sdk::{
    error::PyxResult,
    model::{path::walk, value::PreloadPlan},
};
use serde_json::{Map, Value};

/// Extracts the parts of `args` that `plan` names, keyed by the plan's own path keys.
/// A path that does not resolve means the plan was built for a different signature,
/// so it is reported rather than skipped.
pub fn preload(args: &Value, plan: &PreloadPlan) -> PyxResult<Map<String, Value>> {
    let mut result = Map::new();

    for (key, step) in plan.iter() {
        let value = walk(args, &step.path)?;

        let extracted = match &step.subplan {
            None => value.clone(),
            Some(subplan) => Value::Object(preload(value, subplan)?),
        };

        result.insert(key.clone(), extracted);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use pyx_runtime_sdk::error::PyxError;
    use serde_json::json;

    use super::*;

    fn plan(value: Value) -> PreloadPlan {
        PreloadPlan::from_json(value).unwrap()
    }

    #[test]
    fn leaf_plan_copies_the_whole_value() {
        let args = json!([{ "a": 1 }]);

        let result = preload(&args, &plan(json!({ "[0]": null }))).unwrap();

        assert_eq!(Value::Object(result), json!({ "[0]": { "a": 1 } }));
    }

    #[test]
    fn nested_plan_recurses_into_the_prefix() {
        let args = json!([{ "a": 1 }]);

        let result = preload(&args, &plan(json!({ "[0]": { "\"a\"": null } }))).unwrap();

        assert_eq!(Value::Object(result), json!({ "[0]": { "\"a\"": 1 } }));
    }

    #[test]
    fn only_declared_data_is_sent() {
        let args = json!([
            { "button": 0, "target": { "value": "typed", "secret": "x" } },
            "second"
        ]);

        let result = preload(
            &args,
            &plan(json!({
                "[0]": { "\"button\"": null, "[\"target\", \"value\"]": null },
                "1": null
            })),
        )
        .unwrap();

        assert_eq!(
            Value::Object(result),
            json!({
                "[0]": { "\"button\"": 0, "[\"target\", \"value\"]": "typed" },
                "1": "second"
            })
        );
    }

    #[test]
    fn empty_plan_yields_empty_structure() {
        let result = preload(&json!([1, 2]), &PreloadPlan::default()).unwrap();

        assert!(result.is_empty());
    }

    #[test]
    fn invalid_path_fails() {
        let result = preload(&json!([]), &plan(json!({ "[0]": null })));

        assert!(matches!(result, Err(PyxError::InvalidPath { .. })));
    }
}

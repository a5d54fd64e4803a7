use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};

use super::path::{parse_path_key, PathSegment};
use crate::error::{PyxError, PyxResult};

pub type ResourceId = String;

/// Field that selects how a serialized mapping is interpreted.
pub const DISCRIMINATOR: &str = "__type__";

pub const RENDERABLE: &str = "Renderable";
pub const ELEMENT: &str = "Element";
pub const LEGACY_ELEMENT: &str = "PyXElement";
pub const FUNCTION: &str = "Function";

/// What to do with a `__type__` this client does not know.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantPolicy {
    /// Keep the fields and treat them as a plain mapping.
    #[default]
    Opaque,
    Reject,
}

/// The wire form of a resource as last pushed by the server.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<RawValue>),
    Object(BTreeMap<String, RawValue>),
    Tagged(TaggedValue),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaggedValue {
    /// Back-reference: render whatever resource `id` currently holds.
    Renderable { id: ResourceId },

    Element {
        tag: String,
        props: BTreeMap<String, RawValue>,
        children: Box<RawValue>,
    },

    Function {
        id: ResourceId,
        preload_plan: Option<PreloadPlan>,
    },

    Opaque {
        discriminator: String,
        fields: BTreeMap<String, RawValue>,
    },
}

/// Server-declared description of which parts of a call's arguments are sent eagerly.
/// Keys keep their original JSON spelling since the preloaded result is keyed by them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreloadPlan {
    steps: BTreeMap<String, PlanStep>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanStep {
    pub path: Vec<PathSegment>,
    pub subplan: Option<PreloadPlan>,
}

impl PreloadPlan {
    pub fn from_json(value: Value) -> PyxResult<Self> {
        let map = match value {
            Value::Object(map) => map,
            other => {
                return Err(PyxError::MalformedPlan {
                    key: other.to_string(),
                    reason: "a preload plan must be a mapping".to_string(),
                })
            }
        };

        let mut steps = BTreeMap::new();
        for (key, subplan) in map {
            let path = parse_path_key(&key)?;
            let subplan = match subplan {
                Value::Null => None,
                nested @ Value::Object(_) => Some(PreloadPlan::from_json(nested)?),
                other => {
                    return Err(PyxError::MalformedPlan {
                        key,
                        reason: format!("expected null or a nested plan, got {}", other),
                    })
                }
            };

            steps.insert(key, PlanStep { path, subplan });
        }

        Ok(Self { steps })
    }

    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .steps
            .iter()
            .map(|(key, step)| {
                let subplan = step.subplan.as_ref().map_or(Value::Null, PreloadPlan::to_json);
                (key.clone(), subplan)
            })
            .collect();

        Value::Object(map)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PlanStep)> {
        self.steps.iter()
    }
}

impl RawValue {
    pub fn decode(value: Value, policy: VariantPolicy) -> PyxResult<Self> {
        Ok(match value {
            Value::Null => RawValue::Null,
            Value::Bool(flag) => RawValue::Bool(flag),
            Value::Number(number) => RawValue::Number(number),
            Value::String(text) => RawValue::String(text),
            Value::Array(items) => RawValue::Array(
                items
                    .into_iter()
                    .map(|item| RawValue::decode(item, policy))
                    .collect::<PyxResult<_>>()?,
            ),
            Value::Object(mut map) => match map.remove(DISCRIMINATOR) {
                None => RawValue::Object(decode_map(map, policy)?),
                Some(Value::String(discriminator)) => {
                    RawValue::Tagged(TaggedValue::decode(discriminator, map, policy)?)
                }
                Some(other) => {
                    return Err(PyxError::MalformedVariant {
                        discriminator: other.to_string(),
                        reason: format!("'{}' must be a string", DISCRIMINATOR),
                    })
                }
            },
        })
    }

    pub fn to_json(&self) -> Value {
        match self {
            RawValue::Null => Value::Null,
            RawValue::Bool(flag) => Value::Bool(*flag),
            RawValue::Number(number) => Value::Number(number.clone()),
            RawValue::String(text) => Value::String(text.clone()),
            RawValue::Array(items) => Value::Array(items.iter().map(RawValue::to_json).collect()),
            RawValue::Object(map) => Value::Object(encode_map(map)),
            RawValue::Tagged(tagged) => tagged.to_json(),
        }
    }
}

impl TaggedValue {
    fn decode(
        discriminator: String,
        mut fields: Map<String, Value>,
        policy: VariantPolicy,
    ) -> PyxResult<Self> {
        match discriminator.as_str() {
            RENDERABLE => Ok(TaggedValue::Renderable {
                id: take_string(&discriminator, &mut fields, "id")?,
            }),

            ELEMENT | LEGACY_ELEMENT => {
                let tag = take_string(&discriminator, &mut fields, "tag")?;

                let props = match fields.remove("props") {
                    None | Some(Value::Null) => BTreeMap::new(),
                    Some(Value::Object(props)) => decode_map(props, policy)?,
                    Some(other) => {
                        return Err(PyxError::MalformedVariant {
                            discriminator,
                            reason: format!("props must be a mapping, got {}", other),
                        })
                    }
                };

                let children = match fields.remove("children") {
                    Some(children) => RawValue::decode(children, policy)?,
                    None => RawValue::Null,
                };

                Ok(TaggedValue::Element {
                    tag,
                    props,
                    children: Box::new(children),
                })
            }

            FUNCTION => {
                let id = take_string(&discriminator, &mut fields, "id")?;
                let plan = fields
                    .remove("preload_args")
                    .or_else(|| fields.remove("preloadPlan"));

                let preload_plan = match plan {
                    None | Some(Value::Null) => None,
                    Some(plan) => Some(PreloadPlan::from_json(plan)?),
                };

                Ok(TaggedValue::Function { id, preload_plan })
            }

            _ => match policy {
                VariantPolicy::Opaque => Ok(TaggedValue::Opaque {
                    fields: decode_map(fields, policy)?,
                    discriminator,
                }),
                VariantPolicy::Reject => Err(PyxError::UnknownVariant(discriminator)),
            },
        }
    }

    pub fn to_json(&self) -> Value {
        let mut map = Map::new();

        match self {
            TaggedValue::Renderable { id } => {
                map.insert(DISCRIMINATOR.to_string(), Value::from(RENDERABLE));
                map.insert("id".to_string(), Value::from(id.as_str()));
            }
            TaggedValue::Element { tag, props, children } => {
                map.insert(DISCRIMINATOR.to_string(), Value::from(ELEMENT));
                map.insert("tag".to_string(), Value::from(tag.as_str()));
                map.insert("props".to_string(), Value::Object(encode_map(props)));
                map.insert("children".to_string(), children.to_json());
            }
            TaggedValue::Function { id, preload_plan } => {
                map.insert(DISCRIMINATOR.to_string(), Value::from(FUNCTION));
                map.insert("id".to_string(), Value::from(id.as_str()));
                map.insert(
                    "preload_args".to_string(),
                    preload_plan.as_ref().map_or(Value::Null, PreloadPlan::to_json),
                );
            }
            TaggedValue::Opaque { discriminator, fields } => {
                map = encode_map(fields);
                map.insert(DISCRIMINATOR.to_string(), Value::from(discriminator.as_str()));
            }
        }

        Value::Object(map)
    }
}

fn take_string(
    discriminator: &str,
    fields: &mut Map<String, Value>,
    name: &str,
) -> PyxResult<String> {
    match fields.remove(name) {
        Some(Value::String(value)) => Ok(value),
        Some(other) => Err(PyxError::MalformedVariant {
            discriminator: discriminator.to_string(),
            reason: format!("'{}' must be a string, got {}", name, other),
        }),
        None => Err(PyxError::MalformedVariant {
            discriminator: discriminator.to_string(),
            reason: format!("missing required field '{}'", name),
        }),
    }
}

fn decode_map(
    map: Map<String, Value>,
    policy: VariantPolicy,
) -> PyxResult<BTreeMap<String, RawValue>> {
    map.into_iter()
        .map(|(key, value)| Ok((key, RawValue::decode(value, policy)?)))
        .collect()
}

fn encode_map(map: &BTreeMap<String, RawValue>) -> Map<String, Value> {
    map.iter()
        .map(|(key, value)| (key.clone(), value.to_json()))
        .collect()
}

impl TryFrom<Value> for RawValue {
    type Error = PyxError;

    fn try_from(value: Value) -> PyxResult<Self> {
        RawValue::decode(value, VariantPolicy::default())
    }
}

impl Serialize for RawValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RawValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        RawValue::try_from(value).map_err(serde::de::Error::custom)
    }
}

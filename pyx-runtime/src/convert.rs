use std::{collections::BTreeMap, sync::Weak};

use pyx_runtime_sdk::model::value::{RawValue, TaggedValue, DISCRIMINATOR};

use crate::proxy::{RemoteFunction, SubscribedView};
use crate::render::{ElementNode, RenderValue};
use crate::session::SessionState;

/// Turns raw resource values into render values. Conversion has no side effects;
/// views and functions it produces only touch the session once mounted or called.
#[derive(Clone)]
pub struct Converter {
    session: Weak<SessionState>,
}

impl Converter {
    pub(crate) fn new(session: Weak<SessionState>) -> Self {
        Self { session }
    }

    /// A converter bound to no session. Views and functions it produces fail with
    /// `SessionClosed` when used.
    pub fn detached() -> Self {
        Self { session: Weak::new() }
    }

    pub fn convert(&self, raw: &RawValue) -> RenderValue {
        match raw {
            RawValue::Null => RenderValue::Null,
            RawValue::Bool(flag) => RenderValue::Bool(*flag),
            RawValue::Number(number) => RenderValue::Number(number.clone()),
            RawValue::String(text) => RenderValue::String(text.clone()),
            RawValue::Array(items) => {
                RenderValue::List(items.iter().map(|item| self.convert(item)).collect())
            }
            RawValue::Object(map) => RenderValue::Map(self.convert_map(map)),
            RawValue::Tagged(tagged) => self.convert_tagged(tagged),
        }
    }

    fn convert_tagged(&self, tagged: &TaggedValue) -> RenderValue {
        match tagged {
            TaggedValue::Renderable { id } => {
                RenderValue::View(SubscribedView::new(id.clone(), self.session.clone()))
            }

            TaggedValue::Element { tag, props, children } => RenderValue::Element(ElementNode {
                tag: tag.clone(),
                props: self.convert_map(props),
                children: Box::new(self.convert(children)),
            }),

            TaggedValue::Function { id, preload_plan } => RenderValue::Function(RemoteFunction::new(
                id.clone(),
                preload_plan.clone(),
                self.session.clone(),
            )),

            TaggedValue::Opaque { discriminator, fields } => {
                tracing::warn!(
                    discriminator = %discriminator,
                    "unknown tagged variant, passing through as a mapping"
                );

                let mut map = self.convert_map(fields);
                map.insert(DISCRIMINATOR.to_string(), RenderValue::String(discriminator.clone()));
                RenderValue::Map(map)
            }
        }
    }

    fn convert_map(&self, map: &BTreeMap<String, RawValue>) -> BTreeMap<String, RenderValue> {
        map.iter()
            .map(|(key, value)| (key.clone(), self.convert(value)))
            .collect()
    }
}

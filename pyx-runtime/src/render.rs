use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

use crate::proxy::{RemoteFunction, SubscribedView};

/// A converted resource, ready for a host to display.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<RenderValue>),
    Map(BTreeMap<String, RenderValue>),
    Element(ElementNode),

    /// Placeholder that shows whatever another resource currently holds.
    View(SubscribedView),
    Function(RemoteFunction),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    pub tag: String,
    pub props: BTreeMap<String, RenderValue>,
    pub children: Box<RenderValue>,
}

impl RenderValue {
    /// Every view reachable from this value, in document order.
    pub fn views(&self) -> Vec<&SubscribedView> {
        let mut views = Vec::new();
        self.collect_views(&mut views);
        views
    }

    fn collect_views<'a>(&'a self, views: &mut Vec<&'a SubscribedView>) {
        match self {
            RenderValue::View(view) => views.push(view),
            RenderValue::List(items) => items.iter().for_each(|item| item.collect_views(views)),
            RenderValue::Map(map) => map.values().for_each(|value| value.collect_views(views)),
            RenderValue::Element(element) => {
                element.props.values().for_each(|value| value.collect_views(views));
                element.children.collect_views(views);
            }
            _ => {}
        }
    }

    /// Plain JSON picture of the value. Views are expanded by `resolve`, functions
    /// show up as `{"__function__": id}`.
    pub fn snapshot(&self, resolve: &mut dyn FnMut(&SubscribedView) -> Value) -> Value {
        match self {
            RenderValue::Null => Value::Null,
            RenderValue::Bool(flag) => Value::Bool(*flag),
            RenderValue::Number(number) => Value::Number(number.clone()),
            RenderValue::String(text) => Value::String(text.clone()),
            RenderValue::List(items) => {
                Value::Array(items.iter().map(|item| item.snapshot(resolve)).collect())
            }
            RenderValue::Map(map) => Value::Object(snapshot_map(map, resolve)),
            RenderValue::Element(element) => {
                let mut node = Map::new();
                node.insert("tag".to_string(), Value::from(element.tag.as_str()));
                let props = snapshot_map(&element.props, resolve);
                node.insert("props".to_string(), Value::Object(props));
                node.insert("children".to_string(), element.children.snapshot(resolve));
                Value::Object(node)
            }
            RenderValue::View(view) => resolve(view),
            RenderValue::Function(function) => {
                let mut node = Map::new();
                node.insert("__function__".to_string(), Value::from(function.id()));
                Value::Object(node)
            }
        }
    }
}

fn snapshot_map(
    map: &BTreeMap<String, RenderValue>,
    resolve: &mut dyn FnMut(&SubscribedView) -> Value,
) -> Map<String, Value> {
    map.iter()
        .map(|(key, value)| (key.clone(), value.snapshot(resolve)))
        .collect()
}

/// Ready-made `ScriptHost` implementations.

use crate::marshal::{self, MarshalError};
use ferris_runtime::{NodeRef, PropertyError, ScriptHost, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};

type Getter = Box<dyn Fn() -> Value + Send>;
type Setter = Box<dyn FnMut(Value) -> Result<(), PropertyError> + Send>;

/// A host whose properties are callbacks registered per field.
///
/// A field with only a getter is read-only; one with only a setter is
/// write-only. Touching an unregistered direction is a runtime error that
/// names the field.
#[derive(Default)]
pub struct PropertyMap {
    getters: HashMap<String, Getter>,
    setters: HashMap<String, Setter>,
    node: NodeRef,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node(node: NodeRef) -> Self {
        Self { node, ..Self::default() }
    }

    pub fn getter(mut self, name: &str, get: impl Fn() -> Value + Send + 'static) -> Self {
        self.register_getter(name, get);
        self
    }

    pub fn setter(mut self, name: &str, set: impl FnMut(Value) -> Result<(), PropertyError> + Send + 'static) -> Self {
        self.register_setter(name, set);
        self
    }

    pub fn register_getter(&mut self, name: &str, get: impl Fn() -> Value + Send + 'static) {
        self.getters.insert(name.to_string(), Box::new(get));
    }

    pub fn register_setter(
        &mut self,
        name: &str,
        set: impl FnMut(Value) -> Result<(), PropertyError> + Send + 'static,
    ) {
        self.setters.insert(name.to_string(), Box::new(set));
    }

    pub fn has_getter(&self, name: &str) -> bool {
        self.getters.contains_key(name)
    }
}

impl ScriptHost for PropertyMap {
    fn get_property(&self, name: &str) -> Result<Value, PropertyError> {
        match self.getters.get(name) {
            Some(get) => Ok(get()),
            None => Err(PropertyError::NoGetter(name.to_string())),
        }
    }

    fn set_property(&mut self, name: &str, value: Value) -> Result<(), PropertyError> {
        match self.setters.get_mut(name) {
            Some(set) => set(value),
            None => Err(PropertyError::NoSetter(name.to_string())),
        }
    }

    fn node(&self) -> NodeRef {
        self.node
    }
}

/// A host backed by a plain map of fields.
///
/// Every field is readable. Writes keep the field's type (an `i32` written
/// to an `f32` field widens) and fail for read-only or unknown fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldStore {
    fields: BTreeMap<String, Value>,
    read_only: BTreeSet<String>,
    node: NodeRef,
}

impl FieldStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(text: &str) -> Result<Self, MarshalError> {
        Ok(Self { fields: marshal::properties_from_json(text)?, ..Self::default() })
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.fields.insert(name.to_string(), value.into());
    }

    pub fn read_only(mut self, name: &str) -> Self {
        self.read_only.insert(name.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn to_json(&self) -> serde_json::Value {
        marshal::properties_to_json(self.fields())
    }
}

impl ScriptHost for FieldStore {
    fn get_property(&self, name: &str) -> Result<Value, PropertyError> {
        self.fields.get(name).cloned().ok_or_else(|| PropertyError::NoGetter(name.to_string()))
    }

    fn set_property(&mut self, name: &str, value: Value) -> Result<(), PropertyError> {
        if self.read_only.contains(name) {
            return Err(PropertyError::NoSetter(name.to_string()));
        }
        let Some(slot) = self.fields.get_mut(name) else {
            return Err(PropertyError::NoSetter(name.to_string()));
        };
        *slot = value.coerce(slot.ty()).map_err(|err| PropertyError::Rejected {
            name: name.to_string(),
            reason: err.to_string(),
        })?;
        Ok(())
    }

    fn node(&self) -> NodeRef {
        self.node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferris_runtime::Vector2;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_property_map_round_trip() {
        let position = Arc::new(Mutex::new(Vector2::ZERO));
        let (read, write) = (position.clone(), position.clone());
        let mut host = PropertyMap::new()
            .getter("position", move || Value::Vector2(*read.lock()))
            .setter("position", move |value| {
                let v = Vector2::try_from(value).map_err(|err| PropertyError::Rejected {
                    name: "position".to_string(),
                    reason: err.to_string(),
                })?;
                *write.lock() = v;
                Ok(())
            });

        host.set_property("position", Value::Vector2(Vector2::new(3.0, 4.0))).unwrap();
        assert_eq!(host.get_property("position"), Ok(Value::Vector2(Vector2::new(3.0, 4.0))));
        assert_eq!(*position.lock(), Vector2::new(3.0, 4.0));
        assert!(matches!(host.set_property("position", Value::Int(1)), Err(PropertyError::Rejected { .. })));
    }

    #[test]
    fn test_property_map_missing_directions() {
        let mut host = PropertyMap::new().getter("name", || Value::from("player"));
        assert_eq!(host.get_property("health"), Err(PropertyError::NoGetter("health".to_string())));
        assert_eq!(
            host.set_property("name", Value::from("enemy")),
            Err(PropertyError::NoSetter("name".to_string()))
        );
        assert!(host.has_getter("name"));
    }

    #[test]
    fn test_field_store_keeps_types() {
        let mut store = FieldStore::new().with("speed", 1.5f32).with("id", 7).read_only("id");
        store.set_property("speed", Value::Int(2)).unwrap();
        assert_eq!(store.get("speed"), Some(&Value::Float(2.0)));
        assert!(matches!(store.set_property("speed", Value::Bool(true)), Err(PropertyError::Rejected { .. })));
        assert_eq!(store.set_property("id", Value::Int(8)), Err(PropertyError::NoSetter("id".to_string())));
        assert_eq!(store.set_property("ghost", Value::Int(8)), Err(PropertyError::NoSetter("ghost".to_string())));
    }

    #[test]
    fn test_field_store_json() {
        let store = FieldStore::from_json(r#"{"hp": 10, "position": {"x": 1.0, "y": 2.0}}"#).unwrap();
        assert_eq!(store.get_property("hp"), Ok(Value::Int(10)));
        assert_eq!(store.to_json()["position"]["y"], serde_json::json!(2.0));
    }
}

//! Drivers and fixtures for unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CellarResult;
use crate::store::{StoreOptions, VersionedStore};
use crate::traits::{DriverOpener, Namespace, StoreDriver};

/// Insertion-ordered driver over a `Vec`.
#[derive(Default)]
pub(crate) struct VecDriver {
    entries: Mutex<Vec<(String, Value)>>,
}

impl VecDriver {
    pub(crate) fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl StoreDriver for VecDriver {
    async fn set_item(&self, key: &str, value: Value) -> CellarResult<Value> {
        let mut entries = self.entries.lock().unwrap();
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.clone(),
            None => entries.push((key.to_string(), value.clone())),
        }
        Ok(value)
    }

    async fn get_item(&self, key: &str) -> CellarResult<Option<Value>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone()))
    }

    async fn get_items(&self) -> CellarResult<Vec<Value>> {
        Ok(self.entries.lock().unwrap().iter().map(|(_, v)| v.clone()).collect())
    }

    async fn remove_item(&self, key: &str) -> CellarResult<()> {
        self.entries.lock().unwrap().retain(|(k, _)| k != key);
        Ok(())
    }

    async fn clear(&self) -> CellarResult<()> {
        self.entries.lock().unwrap().clear();
        Ok(())
    }
}

/// Opener that records which namespaces were requested.
#[derive(Default)]
pub(crate) struct VecOpener {
    pub(crate) opened: Mutex<Vec<Namespace>>,
}

#[async_trait]
impl DriverOpener for VecOpener {
    async fn open(&self, namespace: &Namespace) -> CellarResult<Arc<dyn StoreDriver>> {
        self.opened.lock().unwrap().push(namespace.clone());
        Ok(VecDriver::shared())
    }
}

mockall::mock! {
    pub Driver {}

    #[async_trait]
    impl StoreDriver for Driver {
        async fn set_item(&self, key: &str, value: Value) -> CellarResult<Value>;
        async fn get_item(&self, key: &str) -> CellarResult<Option<Value>>;
        async fn get_items(&self) -> CellarResult<Vec<Value>>;
        async fn remove_item(&self, key: &str) -> CellarResult<()>;
        async fn clear(&self) -> CellarResult<()>;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Person {
    pub(crate) name: String,
    pub(crate) age: u32,
}

pub(crate) fn person(name: &str, age: u32) -> Person {
    Person {
        name: name.to_string(),
        age,
    }
}

pub(crate) fn is_person(value: &Value) -> bool {
    value.get("name").map_or(false, Value::is_string)
        && value.get("age").map_or(false, Value::is_number)
}

pub(crate) fn person_options() -> StoreOptions<Person> {
    StoreOptions::new("hoge", "foo")
        .with_confirm_type(is_person)
        .with_provide_key(|p: &Person| p.name.clone())
}

pub(crate) fn person_store() -> VersionedStore<Person> {
    VersionedStore::with_drivers(person_options(), VecDriver::shared(), VecDriver::shared())
}

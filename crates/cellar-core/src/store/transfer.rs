//! JSON import and export.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::ImportMode;
use crate::error::{CellarError, CellarResult};
use crate::store::VersionedStore;
use crate::types::{record_shape_error, DataContainer, ImportOutcome};

impl<T> VersionedStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Serialize every live record as a compact JSON array.
    pub async fn export_json(&self) -> CellarResult<String> {
        let items = self.get_items().await?;
        let json = serde_json::to_string(&items)?;
        if let Some(hook) = self.hooks.export_json.get() {
            hook(&json);
        }
        Ok(json)
    }

    /// Export through the download sink and return the file name used.
    ///
    /// Without `file_name` the name is `<storeName>_<contentHash(json)>.json`.
    pub async fn export_json_file(&self, file_name: Option<&str>) -> CellarResult<String> {
        let Some(sink) = &self.download_sink else {
            return Err(CellarError::DownloadSinkUnconfigured);
        };
        let json = self.export_json().await?;
        let name = match file_name {
            Some(name) => name.to_string(),
            None => format!("{}_{}.json", self.namespace.store_name, (self.content_hash)(&json)),
        };
        sink.download(&name, &json).await?;
        tracing::info!("Exported '{}' to {}", self.namespace, name);
        Ok(name)
    }

    /// Replace the live store with the records in `json`.
    ///
    /// The current live state is exported and backed up before anything
    /// else happens, so the returned backup key always names the
    /// pre-import state, even when the import fails. Nothing is rolled
    /// back automatically: pass the key to `restore` to undo.
    ///
    /// In [`ImportMode::PartialApply`] the live store is cleared first and
    /// elements are written in order; the first invalid element stops the
    /// import and every element before it stays written. In
    /// [`ImportMode::AllOrNothing`] the whole payload is validated before
    /// the live store is touched.
    pub async fn import_json(&self, json: &str) -> ImportOutcome {
        let outcome = self.import_json_inner(json).await;
        match &outcome.error {
            None => tracing::info!(
                "Imported into '{}' (backup {})",
                self.namespace,
                outcome.backup_key
            ),
            Some(err) => tracing::warn!(
                "Import into '{}' failed: {} (backup {})",
                self.namespace,
                err,
                outcome.backup_key
            ),
        }
        if let Some(hook) = self.hooks.import_json.get() {
            hook(&outcome);
        }
        outcome
    }

    async fn import_json_inner(&self, json: &str) -> ImportOutcome {
        let backup_json = match self.export_json().await {
            Ok(text) => text,
            Err(e) => return ImportOutcome::failed("", e),
        };
        let backup_key = match self.backup(&backup_json).await {
            Ok(key) => key,
            Err(e) => return ImportOutcome::failed("", e),
        };

        let result = match self.import_mode {
            ImportMode::PartialApply => self.import_partial(json).await,
            ImportMode::AllOrNothing => self.import_all_or_nothing(json).await,
        };
        match result {
            Ok(()) => ImportOutcome::ok(backup_key),
            Err(e) => ImportOutcome::failed(backup_key, e),
        }
    }

    async fn import_partial(&self, json: &str) -> CellarResult<()> {
        self.clear().await?;

        let items = parse_array(json)?;
        for (index, item) in items.into_iter().enumerate() {
            let record = to_record(index, item)?;
            self.set_item_core(record).await?;
        }
        Ok(())
    }

    async fn import_all_or_nothing(&self, json: &str) -> CellarResult<()> {
        let items = parse_array(json)?;
        let mut records = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let record = to_record(index, item)?;
            self.confirm_type(&record.data)?;
            records.push(record);
        }

        self.clear().await?;
        for record in records {
            self.set_item_core(record).await?;
        }
        Ok(())
    }
}

fn parse_array(json: &str) -> CellarResult<Vec<Value>> {
    let parsed: Value = serde_json::from_str(json).map_err(|e| CellarError::parse(e.to_string()))?;
    match parsed {
        Value::Array(items) => Ok(items),
        other => Err(CellarError::format(format!(
            "expected a JSON array of records, found {}",
            json_kind(&other)
        ))),
    }
}

fn to_record(index: usize, item: Value) -> CellarResult<DataContainer<Value>> {
    if let Some(reason) = record_shape_error(&item) {
        return Err(CellarError::item_format(index, reason));
    }
    serde_json::from_value(item).map_err(|e| CellarError::item_format(index, e.to_string()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

use async_trait::async_trait;
use runtime_models::core::{Column, Row};
use runtime_models::storage::{InMemoryStorage, StorageEngine, TableSchema};
use runtime_models::sync::{FieldSchemaEditor, ModelSchemaEditor};
use runtime_models::{DynamicModels, FieldOptions, ModelSchema, Result, SyncAction, Value};
use std::sync::{Arc, Mutex};

/// Storage engine that records every structural command it receives.
#[derive(Default)]
struct RecordingEngine {
    inner: InMemoryStorage,
    commands: Mutex<Vec<String>>,
}

impl RecordingEngine {
    fn record(&self, command: String) {
        self.commands.lock().unwrap().push(command);
    }

    fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    fn command_count(&self) -> usize {
        self.commands.lock().unwrap().len()
    }
}

#[async_trait]
impl StorageEngine for RecordingEngine {
    async fn create_table(&self, schema: TableSchema) -> Result<()> {
        self.record(format!("create {}", schema.name()));
        self.inner.create_table(schema).await
    }

    async fn drop_table(&self, name: &str) -> Result<()> {
        self.record(format!("drop {}", name));
        self.inner.drop_table(name).await
    }

    async fn rename_table(&self, old_name: &str, new_name: &str) -> Result<()> {
        self.record(format!("rename {} {}", old_name, new_name));
        self.inner.rename_table(old_name, new_name).await
    }

    async fn add_column(&self, table: &str, column: Column) -> Result<()> {
        self.record(format!("add {}.{}", table, column.name));
        self.inner.add_column(table, column).await
    }

    async fn remove_column(&self, table: &str, column_name: &str) -> Result<()> {
        self.record(format!("remove {}.{}", table, column_name));
        self.inner.remove_column(table, column_name).await
    }

    async fn alter_column(&self, table: &str, old: &Column, new: Column) -> Result<()> {
        self.record(format!("alter {}.{} {}", table, old.name, new.name));
        self.inner.alter_column(table, old, new).await
    }

    async fn table_exists(&self, name: &str) -> bool {
        self.inner.table_exists(name).await
    }

    async fn table_has_column(&self, table: &str, column: &str) -> bool {
        self.inner.table_has_column(table, column).await
    }

    async fn column_allows_null(&self, table: &str, column: &str) -> Result<bool> {
        self.inner.column_allows_null(table, column).await
    }

    async fn get_schema(&self, table: &str) -> Result<TableSchema> {
        self.inner.get_schema(table).await
    }

    async fn insert_row(&self, table: &str, values: Vec<(String, Value)>) -> Result<Row> {
        self.inner.insert_row(table, values).await
    }

    async fn scan_table(&self, table: &str) -> Result<Vec<Row>> {
        self.inner.scan_table(table).await
    }

    async fn row_count(&self, table: &str) -> Result<usize> {
        self.inner.row_count(table).await
    }

    async fn list_tables(&self) -> Vec<String> {
        self.inner.list_tables().await
    }
}

fn setup() -> anyhow::Result<(Arc<RecordingEngine>, Arc<DynamicModels>)> {
    let engine = Arc::new(RecordingEngine::default());
    let models = DynamicModels::builder().engine(engine.clone()).build()?;
    Ok((engine, models))
}

#[tokio::test]
async fn test_update_table_is_idempotent() -> anyhow::Result<()> {
    let (engine, models) = setup()?;
    let mut schema = ModelSchema::new(&models, "invoice");
    assert_eq!(
        schema.save().await?,
        SyncAction::CreatedTable { table: "invoice".into() }
    );
    let model = schema.as_model().await?;

    let mut editor = ModelSchemaEditor::new(engine.clone(), Some("invoice".into()));
    let issued = engine.command_count();
    assert!(editor.update_table(&model).await?.is_unchanged());
    assert!(editor.update_table(&model).await?.is_unchanged());
    assert_eq!(engine.command_count(), issued);

    // saving without a change issues nothing either
    assert!(schema.save().await?.is_unchanged());
    assert_eq!(engine.command_count(), issued);
    Ok(())
}

#[tokio::test]
async fn test_update_table_renames_once() -> anyhow::Result<()> {
    let (engine, models) = setup()?;
    let mut schema = ModelSchema::new(&models, "invoice");
    schema.save().await?;

    schema.set_name("bill");
    assert_eq!(
        schema.save().await?,
        SyncAction::RenamedTable {
            from: "invoice".into(),
            to: "bill".into()
        }
    );
    assert!(schema.save().await?.is_unchanged());
    assert_eq!(engine.commands(), vec!["create invoice", "rename invoice bill"]);
    Ok(())
}

#[tokio::test]
async fn test_update_table_recreates_missing_table() -> anyhow::Result<()> {
    let (engine, models) = setup()?;
    let mut schema = ModelSchema::new(&models, "invoice");
    schema.save().await?;
    let model = schema.as_model().await?;

    engine.inner.drop_table("invoice").await?;
    let mut editor = ModelSchemaEditor::new(engine.clone(), Some("invoice".into()));
    assert_eq!(
        editor.update_table(&model).await?,
        SyncAction::CreatedTable { table: "invoice".into() }
    );
    assert!(engine.table_exists("invoice").await);
    Ok(())
}

#[tokio::test]
async fn test_drop_table_tolerates_missing_table() -> anyhow::Result<()> {
    let (engine, _models) = setup()?;
    let mut editor = ModelSchemaEditor::new(engine.clone(), Some("ghost".into()));
    assert!(editor.drop_table("ghost").await?.is_unchanged());
    assert_eq!(editor.initial_table(), None);
    Ok(())
}

#[tokio::test]
async fn test_update_column_add_alter_noop() -> anyhow::Result<()> {
    let (engine, models) = setup()?;
    let mut schema = ModelSchema::new(&models, "invoice");
    schema.save().await?;

    let mut field = schema
        .add_field("code", "character", FieldOptions::new().max_length(10))
        .await?;
    assert!(engine.commands().contains(&"add invoice.code".to_string()));

    let issued = engine.command_count();
    assert!(field.save().await?.is_unchanged());
    assert_eq!(engine.command_count(), issued);

    field.set_max_length(Some(20));
    assert_eq!(
        field.save().await?,
        SyncAction::AlteredColumn {
            table: "invoice".into(),
            from: "code".into(),
            to: "code".into()
        }
    );
    let column = engine.get_schema("invoice").await?.column("code").cloned();
    assert_eq!(column.and_then(|c| c.max_length), Some(20));
    Ok(())
}

#[tokio::test]
async fn test_update_column_follows_rename() -> anyhow::Result<()> {
    let (engine, models) = setup()?;
    let mut schema = ModelSchema::new(&models, "invoice");
    schema.save().await?;
    let mut field = schema.add_field("amount", "integer", FieldOptions::new()).await?;

    let model = schema.as_model().await?;
    model.create(&models, [("amount", 12)]).await?;

    field.set_name("total");
    field.save().await?;

    assert!(engine.commands().contains(&"alter invoice.amount total".to_string()));
    assert!(!engine.table_has_column("invoice", "amount").await);
    let records = schema.as_model().await?.all(&models).await?;
    assert_eq!(records[0].get("total"), Some(&Value::Integer(12)));
    Ok(())
}

#[tokio::test]
async fn test_field_editor_drop_is_tolerant() -> anyhow::Result<()> {
    let (engine, models) = setup()?;
    ModelSchema::new(&models, "invoice").save().await?;

    let mut editor = FieldSchemaEditor::new(engine.clone(), None);
    assert!(editor.drop_column("invoice", "ghost").await?.is_unchanged());

    // a destructive failure other than "already gone" still propagates
    assert!(editor.drop_column("invoice", "id").await.is_err());
    Ok(())
}

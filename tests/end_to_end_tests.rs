use runtime_models::schema::MemorySchemaStore;
use runtime_models::storage::StorageEngine;
use runtime_models::{DbError, DynamicModels, FieldOptions, FieldSchema, ModelSchema, Value};
use std::sync::Arc;

#[tokio::test]
async fn test_invoice_lifecycle() -> anyhow::Result<()> {
    let models = DynamicModels::in_memory();
    let engine = models.engine().clone();

    // model schema -> table with only the implicit key
    let mut schema = ModelSchema::new(&models, "invoice");
    schema.save().await?;
    assert!(engine.table_exists("invoice").await);
    assert_eq!(
        engine.get_schema("invoice").await?.schema().column_names(),
        vec!["id"]
    );

    // integer field -> nullable column
    schema.add_field("amount", "integer", FieldOptions::new()).await?;
    assert!(engine.table_has_column("invoice", "amount").await);
    assert!(engine.column_allows_null("invoice", "amount").await?);

    // bounded text without a length fails, with a length succeeds
    let mut code = FieldSchema::new(&schema, "code", "character")?;
    assert!(matches!(code.save().await, Err(DbError::InvalidField { .. })));
    code.set_max_length(Some(10));
    code.save().await?;
    let column = engine.get_schema("invoice").await?.column("code").cloned();
    assert_eq!(column.and_then(|c| c.max_length), Some(10));

    // rename -> table renamed, old registration gone
    schema.set_name("bill");
    schema.save().await?;
    assert!(engine.table_exists("bill").await);
    assert!(!engine.table_exists("invoice").await);
    assert!(!models.registry().is_registered("dynamic_models", "Invoice")?);
    assert_eq!(schema.as_model().await?.table_name(), "bill");

    // delete -> table gone
    schema.delete().await?;
    assert!(!engine.table_exists("bill").await);
    assert!(engine.list_tables().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_outdated_type_rejects_writes() -> anyhow::Result<()> {
    let models = DynamicModels::in_memory();
    let mut schema = ModelSchema::new(&models, "invoice");
    schema.save().await?;
    let mut amount = schema.add_field("amount", "integer", FieldOptions::new()).await?;

    let model = schema.as_model().await?;
    let record = model.create(&models, [("amount", 3)]).await?;
    assert_eq!(record.id(), 1);
    assert_eq!(record.get("amount"), Some(&Value::Integer(3)));

    amount.set_name("total");
    amount.save().await?;

    assert!(matches!(
        model.create(&models, [("amount", 4)]).await,
        Err(DbError::OutdatedModel(name)) if name == "Invoice"
    ));

    let current = schema.as_model().await?;
    let record = current.create(&models, [("total", 4)]).await?;
    assert_eq!(record.id(), 2);
    assert_eq!(current.count(&models).await?, 2);
    Ok(())
}

#[tokio::test]
async fn test_record_constraints() -> anyhow::Result<()> {
    let models = DynamicModels::in_memory();
    let mut schema = ModelSchema::new(&models, "customer");
    schema.save().await?;
    schema
        .add_field("email", "character", FieldOptions::new().max_length(12).unique(true))
        .await?;
    let model = schema.as_model().await?;

    model.create(&models, [("email", "a@example.io")]).await?;
    assert!(model.create(&models, [("email", "a@example.io")]).await.is_err());
    assert!(model.create(&models, [("email", "way-too-long@example.io")]).await.is_err());
    assert!(matches!(
        model.create(&models, [("phone", "555")]).await,
        Err(DbError::ColumnNotFound(..))
    ));

    let records = model.all(&models).await?;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("email"), Some(&Value::Text("a@example.io".into())));
    Ok(())
}

#[tokio::test]
async fn test_schema_snapshot_restores_types() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("schemas.json");

    let store = Arc::new(MemorySchemaStore::new());
    let models = DynamicModels::builder().store(store.clone()).build()?;
    let mut schema = ModelSchema::new(&models, "invoice");
    schema.save().await?;
    schema.add_field("amount", "float", FieldOptions::new()).await?;
    store.save_snapshot(&path).await?;

    let restored = DynamicModels::builder()
        .store(Arc::new(MemorySchemaStore::load_snapshot(&path).await?))
        .build()?;
    let model = restored.get_model("invoice").await?;
    assert_eq!(model.field_names(), vec!["amount"]);
    Ok(())
}

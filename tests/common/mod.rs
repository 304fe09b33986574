#![allow(dead_code)]

use std::sync::Arc;

use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;

use hydronet::database::entities::common_types::ResourceKind;
use hydronet::database::entities::{attributes, networks, nodes, projects, resource_attrs};
use hydronet::database::migrations::Migrator;
use hydronet::services::{
    AttrGroupService, AttributeService, DatasetService, ScenarioService,
};
use hydronet::{AllowAll, MemoryValueStore, StorageConfig};

/// Opt-in service log output during tests, e.g. RUST_LOG=debug cargo test
fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Create an in-memory SQLite database for testing
pub async fn setup_test_db() -> DatabaseConnection {
    init_test_logging();

    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

pub struct TestServices {
    pub datasets: DatasetService,
    pub scenarios: ScenarioService,
    pub attributes: AttributeService,
    pub attr_groups: AttrGroupService,
    pub store: Arc<MemoryValueStore>,
}

pub fn build_services(db: &DatabaseConnection, threshold: usize) -> TestServices {
    let permissions = Arc::new(AllowAll);
    let store = Arc::new(MemoryValueStore::new());
    let datasets = DatasetService::new(
        db.clone(),
        store.clone(),
        StorageConfig { threshold },
        permissions.clone(),
    );
    TestServices {
        scenarios: ScenarioService::new(db.clone(), permissions.clone(), datasets.clone()),
        attributes: AttributeService::new(db.clone(), permissions.clone()),
        attr_groups: AttrGroupService::new(db.clone(), permissions.clone()),
        datasets,
        store,
    }
}

pub fn services(db: &DatabaseConnection) -> TestServices {
    build_services(db, StorageConfig::default().threshold)
}

pub async fn create_test_project(db: &DatabaseConnection, name: &str) -> projects::Model {
    projects::ActiveModel {
        name: Set(name.to_string()),
        status: Set("A".to_string()),
        created_at: Set(chrono::Utc::now()),
        updated_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert project")
}

pub async fn create_test_network(
    db: &DatabaseConnection,
    project_id: i32,
    name: &str,
) -> networks::Model {
    networks::ActiveModel {
        project_id: Set(project_id),
        name: Set(name.to_string()),
        status: Set("A".to_string()),
        created_at: Set(chrono::Utc::now()),
        updated_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert network")
}

pub async fn create_test_node(
    db: &DatabaseConnection,
    network_id: i32,
    name: &str,
) -> nodes::Model {
    nodes::ActiveModel {
        network_id: Set(network_id),
        name: Set(name.to_string()),
        status: Set("A".to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert node")
}

pub async fn create_test_attribute(db: &DatabaseConnection, name: &str) -> attributes::Model {
    attributes::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert attribute")
}

pub async fn attach_node_attribute(
    db: &DatabaseConnection,
    node_id: i32,
    attr_id: i32,
    is_var: bool,
) -> resource_attrs::Model {
    resource_attrs::ActiveModel {
        attr_id: Set(attr_id),
        ref_key: Set(ResourceKind::Node.as_str().to_string()),
        node_id: Set(Some(node_id)),
        attr_is_var: Set(is_var),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert resource attr")
}

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

use hydronet::database::entities::common_types::ResourceKind;
use hydronet::database::entities::{datasets, resource_group_items, resource_groups, scenarios};
use hydronet::errors::{DatasetError, PermissionError, ScenarioError};
use hydronet::services::{
    DatasetInput, DatasetService, NewResourceGroupItem, NewScenario, ResourceScenarioValue,
    ScenarioService,
};
use hydronet::{MemoryValueStore, PermissionChecker, PermissionScope, StorageConfig};

use common::{
    attach_node_attribute, create_test_attribute, create_test_network, create_test_node,
    create_test_project, services, setup_test_db,
};

fn new_scenario(name: &str) -> NewScenario {
    NewScenario {
        name: name.to_string(),
        ..Default::default()
    }
}

fn scalar(ra_id: i32, value: f64) -> ResourceScenarioValue {
    ResourceScenarioValue {
        resource_attr_id: ra_id,
        dataset: DatasetInput::scalar("value", value),
    }
}

async fn dataset_count(db: &DatabaseConnection) -> usize {
    datasets::Entity::find().all(db).await.unwrap().len()
}

async fn create_group(db: &DatabaseConnection, network_id: i32, name: &str) -> resource_groups::Model {
    resource_groups::ActiveModel {
        network_id: Set(network_id),
        name: Set(name.to_string()),
        status: Set("A".to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// Project, network, node, one non-result attribute attached to the node.
async fn setup_network(db: &DatabaseConnection) -> (i32, i32, i32) {
    let project = create_test_project(db, "P").await;
    let network = create_test_network(db, project.id, "N").await;
    let node = create_test_node(db, network.id, "reservoir").await;
    let attr = create_test_attribute(db, "capacity").await;
    let ra = attach_node_attribute(db, node.id, attr.id, false).await;
    (network.id, node.id, ra.id)
}

#[tokio::test]
async fn test_scenario_names_are_unique_per_network() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let (network_id, _, _) = setup_network(&db).await;

    svc.scenarios
        .add_scenario(1, network_id, new_scenario("baseline"))
        .await
        .unwrap();
    let err = svc
        .scenarios
        .add_scenario(1, network_id, new_scenario("baseline"))
        .await
        .unwrap_err();
    assert!(matches!(err, ScenarioError::NameConflict { .. }));

    // a sibling network accepts the same name
    let project = create_test_project(&db, "P2").await;
    let other = create_test_network(&db, project.id, "N2").await;
    assert!(svc
        .scenarios
        .add_scenario(1, other.id, new_scenario("baseline"))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_repeated_assignment_is_idempotent() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let (network_id, _, ra_id) = setup_network(&db).await;
    let scenario = svc
        .scenarios
        .add_scenario(1, network_id, new_scenario("s"))
        .await
        .unwrap();

    let first = svc
        .scenarios
        .update_resource_data(1, scenario.id, vec![scalar(ra_id, 42.0)])
        .await
        .unwrap();
    let second = svc
        .scenarios
        .update_resource_data(1, scenario.id, vec![scalar(ra_id, 42.0)])
        .await
        .unwrap();

    assert_eq!(first[0].dataset_id, second[0].dataset_id);
    assert_eq!(dataset_count(&db).await, 1);
}

#[tokio::test]
async fn test_exclusive_binding_updates_dataset_in_place() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let (network_id, _, ra_id) = setup_network(&db).await;
    let scenario = svc
        .scenarios
        .add_scenario(1, network_id, new_scenario("s"))
        .await
        .unwrap();

    let first = svc
        .scenarios
        .update_resource_data(1, scenario.id, vec![scalar(ra_id, 1.0)])
        .await
        .unwrap();
    let second = svc
        .scenarios
        .update_resource_data(1, scenario.id, vec![scalar(ra_id, 2.0)])
        .await
        .unwrap();

    // sole owner: the dataset row is rewritten, not replaced
    assert_eq!(first[0].dataset_id, second[0].dataset_id);
    assert_eq!(dataset_count(&db).await, 1);

    let dataset = svc
        .datasets
        .get_dataset(1, second[0].dataset_id)
        .await
        .unwrap();
    assert_eq!(dataset.value, "2");
}

#[tokio::test]
async fn test_writing_to_clone_copies_shared_dataset() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let (network_id, _, ra_id) = setup_network(&db).await;
    let source = svc
        .scenarios
        .add_scenario(1, network_id, new_scenario("source"))
        .await
        .unwrap();
    let source_binding = svc
        .scenarios
        .update_resource_data(1, source.id, vec![scalar(ra_id, 10.0)])
        .await
        .unwrap()
        .remove(0);

    let clone = svc
        .scenarios
        .clone_scenario(1, source.id, true, None)
        .await
        .unwrap();

    // the clone shares the dataset row until it writes
    let clone_data = svc.scenarios.get_scenario(1, clone.id, false).await.unwrap();
    assert_eq!(
        clone_data.resource_scenarios[0].resource_scenario.dataset_id,
        source_binding.dataset_id
    );
    assert_eq!(dataset_count(&db).await, 1);

    let updated = svc
        .scenarios
        .update_resource_data(1, clone.id, vec![scalar(ra_id, 99.0)])
        .await
        .unwrap();

    // the write landed in a fresh dataset; the source is untouched
    assert_ne!(updated[0].dataset_id, source_binding.dataset_id);
    assert_eq!(dataset_count(&db).await, 2);
    let source_dataset = svc
        .datasets
        .get_dataset(1, source_binding.dataset_id)
        .await
        .unwrap();
    assert_eq!(source_dataset.value, "10");
}

#[tokio::test]
async fn test_child_scenario_inherits_and_overrides() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let (network_id, node_id, ra_capacity) = setup_network(&db).await;
    let elevation = create_test_attribute(&db, "elevation").await;
    let ra_elevation = attach_node_attribute(&db, node_id, elevation.id, false).await;

    let parent = svc
        .scenarios
        .add_scenario(1, network_id, new_scenario("parent"))
        .await
        .unwrap();
    svc.scenarios
        .update_resource_data(
            1,
            parent.id,
            vec![scalar(ra_capacity, 1.0), scalar(ra_elevation.id, 100.0)],
        )
        .await
        .unwrap();

    let child = svc
        .scenarios
        .create_child_scenario(1, parent.id, Some("child".to_string()))
        .await
        .unwrap();
    assert_eq!(child.parent_id, Some(parent.id));

    // the child overrides capacity only
    svc.scenarios
        .update_resource_data(1, child.id, vec![scalar(ra_capacity, 2.0)])
        .await
        .unwrap();

    let resolved = svc.scenarios.get_scenario(1, child.id, true).await.unwrap();
    assert_eq!(resolved.resource_scenarios.len(), 2);

    let by_ra: std::collections::HashMap<i32, _> = resolved
        .resource_scenarios
        .iter()
        .map(|r| (r.resource_scenario.resource_attr_id, r))
        .collect();

    let capacity = by_ra[&ra_capacity];
    assert_eq!(capacity.inherited_from, None);
    assert_eq!(capacity.dataset.value, "2");

    let elevation = by_ra[&ra_elevation.id];
    assert_eq!(elevation.inherited_from, Some(parent.id));
    assert_eq!(elevation.dataset.value, "100");

    // without parent data only the override is visible
    let own = svc.scenarios.get_scenario(1, child.id, false).await.unwrap();
    assert_eq!(own.resource_scenarios.len(), 1);
}

#[tokio::test]
async fn test_inheritance_walks_the_whole_chain() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let (network_id, _, ra_id) = setup_network(&db).await;

    let root = svc
        .scenarios
        .add_scenario(1, network_id, new_scenario("root"))
        .await
        .unwrap();
    svc.scenarios
        .update_resource_data(1, root.id, vec![scalar(ra_id, 5.0)])
        .await
        .unwrap();

    let mid = svc
        .scenarios
        .create_child_scenario(1, root.id, Some("mid".to_string()))
        .await
        .unwrap();
    let leaf = svc
        .scenarios
        .create_child_scenario(1, mid.id, Some("leaf".to_string()))
        .await
        .unwrap();

    // the grandchild sees the root's value through the empty middle scenario
    let resolved = svc.scenarios.get_scenario(1, leaf.id, true).await.unwrap();
    assert_eq!(resolved.resource_scenarios.len(), 1);
    assert_eq!(
        resolved.resource_scenarios[0].inherited_from,
        Some(root.id)
    );
}

#[tokio::test]
async fn test_clone_names_and_result_filtering() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let (network_id, node_id, ra_input) = setup_network(&db).await;
    let sim_flow = create_test_attribute(&db, "sim_flow").await;
    let ra_output = attach_node_attribute(&db, node_id, sim_flow.id, true).await;

    let source = svc
        .scenarios
        .add_scenario(1, network_id, new_scenario("baseline"))
        .await
        .unwrap();
    svc.scenarios
        .update_resource_data(
            1,
            source.id,
            vec![scalar(ra_input, 1.0), scalar(ra_output.id, 7.5)],
        )
        .await
        .unwrap();

    let with_results = svc
        .scenarios
        .clone_scenario(1, source.id, true, None)
        .await
        .unwrap();
    assert_eq!(with_results.name, "baseline (clone)");
    let data = svc
        .scenarios
        .get_scenario(1, with_results.id, false)
        .await
        .unwrap();
    assert_eq!(data.resource_scenarios.len(), 2);

    let without_results = svc
        .scenarios
        .clone_scenario(1, source.id, false, None)
        .await
        .unwrap();
    assert_eq!(without_results.name, "baseline (clone) 2");
    let data = svc
        .scenarios
        .get_scenario(1, without_results.id, false)
        .await
        .unwrap();
    // the output binding was left behind
    assert_eq!(data.resource_scenarios.len(), 1);
    assert_eq!(
        data.resource_scenarios[0].resource_scenario.resource_attr_id,
        ra_input
    );
}

#[tokio::test]
async fn test_locked_scenario_rejects_edits() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let (network_id, _, ra_id) = setup_network(&db).await;
    let scenario = svc
        .scenarios
        .add_scenario(1, network_id, new_scenario("s"))
        .await
        .unwrap();
    svc.scenarios
        .update_resource_data(1, scenario.id, vec![scalar(ra_id, 1.0)])
        .await
        .unwrap();

    svc.scenarios.lock_scenario(1, scenario.id).await.unwrap();

    let err = svc
        .scenarios
        .update_resource_data(1, scenario.id, vec![scalar(ra_id, 2.0)])
        .await
        .unwrap_err();
    assert!(matches!(err, ScenarioError::Locked(_)));
    let err = svc
        .scenarios
        .delete_resource_scenario(1, scenario.id, ra_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ScenarioError::Locked(_)));

    svc.scenarios.unlock_scenario(1, scenario.id).await.unwrap();
    assert!(svc
        .scenarios
        .update_resource_data(1, scenario.id, vec![scalar(ra_id, 2.0)])
        .await
        .is_ok());
}

#[tokio::test]
async fn test_set_scenario_status_validates_flag() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let (network_id, _, _) = setup_network(&db).await;
    let scenario = svc
        .scenarios
        .add_scenario(1, network_id, new_scenario("s"))
        .await
        .unwrap();

    let deleted = svc
        .scenarios
        .set_scenario_status(1, scenario.id, "X")
        .await
        .unwrap();
    assert_eq!(deleted.status, "X");

    let restored = svc
        .scenarios
        .set_scenario_status(1, scenario.id, "A")
        .await
        .unwrap();
    assert_eq!(restored.status, "A");

    let err = svc
        .scenarios
        .set_scenario_status(1, scenario.id, "Z")
        .await
        .unwrap_err();
    assert!(matches!(err, ScenarioError::InvalidStatus(_)));
}

#[tokio::test]
async fn test_purge_scenario_keeps_datasets() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let (network_id, _, ra_id) = setup_network(&db).await;
    let scenario = svc
        .scenarios
        .add_scenario(1, network_id, new_scenario("s"))
        .await
        .unwrap();
    svc.scenarios
        .update_resource_data(1, scenario.id, vec![scalar(ra_id, 1.0)])
        .await
        .unwrap();

    svc.scenarios.purge_scenario(1, scenario.id).await.unwrap();

    assert!(scenarios::Entity::find_by_id(scenario.id)
        .one(&db)
        .await
        .unwrap()
        .is_none());
    // datasets may be referenced elsewhere and are never purged here
    assert_eq!(dataset_count(&db).await, 1);
}

#[tokio::test]
async fn test_delete_resource_scenario_removes_binding_only() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let (network_id, _, ra_id) = setup_network(&db).await;
    let scenario = svc
        .scenarios
        .add_scenario(1, network_id, new_scenario("s"))
        .await
        .unwrap();
    svc.scenarios
        .update_resource_data(1, scenario.id, vec![scalar(ra_id, 1.0)])
        .await
        .unwrap();

    svc.scenarios
        .delete_resource_scenario(1, scenario.id, ra_id)
        .await
        .unwrap();

    let data = svc.scenarios.get_scenario(1, scenario.id, false).await.unwrap();
    assert!(data.resource_scenarios.is_empty());
    assert_eq!(dataset_count(&db).await, 1);

    let err = svc
        .scenarios
        .delete_resource_scenario(1, scenario.id, ra_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ScenarioError::BindingNotFound { .. }));
}

#[tokio::test]
async fn test_bulk_update_requires_one_network() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let (network_a, _, ra_id) = setup_network(&db).await;
    let project = create_test_project(&db, "P2").await;
    let network_b = create_test_network(&db, project.id, "N2").await;

    let s1 = svc
        .scenarios
        .add_scenario(1, network_a, new_scenario("a"))
        .await
        .unwrap();
    let s2 = svc
        .scenarios
        .add_scenario(1, network_a, new_scenario("b"))
        .await
        .unwrap();
    let foreign = svc
        .scenarios
        .add_scenario(1, network_b.id, new_scenario("c"))
        .await
        .unwrap();

    let err = svc
        .scenarios
        .bulk_update_resourcedata(1, vec![s1.id, foreign.id], vec![scalar(ra_id, 1.0)])
        .await
        .unwrap_err();
    assert!(matches!(err, ScenarioError::NetworkMismatch(_)));

    svc.scenarios
        .bulk_update_resourcedata(1, vec![s1.id, s2.id], vec![scalar(ra_id, 3.0)])
        .await
        .unwrap();

    for sid in [s1.id, s2.id] {
        let data = svc.scenarios.get_scenario(1, sid, false).await.unwrap();
        assert_eq!(data.resource_scenarios.len(), 1);
        assert_eq!(data.resource_scenarios[0].dataset.value, "3");
    }
}

#[tokio::test]
async fn test_bulk_update_rejects_locked_member() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let (network_id, _, ra_id) = setup_network(&db).await;
    let open = svc
        .scenarios
        .add_scenario(1, network_id, new_scenario("open"))
        .await
        .unwrap();
    let locked = svc
        .scenarios
        .add_scenario(1, network_id, new_scenario("locked"))
        .await
        .unwrap();
    svc.scenarios.lock_scenario(1, locked.id).await.unwrap();

    let err = svc
        .scenarios
        .bulk_update_resourcedata(1, vec![open.id, locked.id], vec![scalar(ra_id, 1.0)])
        .await
        .unwrap_err();
    assert!(matches!(err, ScenarioError::Locked(_)));

    // nothing was written to the unlocked scenario either
    let data = svc.scenarios.get_scenario(1, open.id, false).await.unwrap();
    assert!(data.resource_scenarios.is_empty());
}

#[tokio::test]
async fn test_merge_matches_resources_by_name() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let project = create_test_project(&db, "P").await;
    let net_a = create_test_network(&db, project.id, "A").await;
    let net_b = create_test_network(&db, project.id, "B").await;
    // same node name in both networks
    let node_a = create_test_node(&db, net_a.id, "reservoir").await;
    let node_b = create_test_node(&db, net_b.id, "reservoir").await;
    let attr = create_test_attribute(&db, "capacity").await;
    let ra_a = attach_node_attribute(&db, node_a.id, attr.id, false).await;
    attach_node_attribute(&db, node_b.id, attr.id, false).await;

    let source = svc
        .scenarios
        .add_scenario(1, net_a.id, new_scenario("source"))
        .await
        .unwrap();
    let source_binding = svc
        .scenarios
        .update_resource_data(1, source.id, vec![scalar(ra_a.id, 42.0)])
        .await
        .unwrap()
        .remove(0);
    let target = svc
        .scenarios
        .add_scenario(1, net_b.id, new_scenario("target"))
        .await
        .unwrap();

    let merged = svc
        .scenarios
        .merge_scenarios(1, source.id, target.id, true, false)
        .await
        .unwrap();

    // the merge landed in a clone, not in the target itself
    assert_ne!(merged.id, target.id);
    assert_eq!(merged.network_id, net_b.id);
    let target_data = svc.scenarios.get_scenario(1, target.id, false).await.unwrap();
    assert!(target_data.resource_scenarios.is_empty());

    // the merged binding shares the source dataset
    let merged_data = svc.scenarios.get_scenario(1, merged.id, false).await.unwrap();
    assert_eq!(merged_data.resource_scenarios.len(), 1);
    assert_eq!(
        merged_data.resource_scenarios[0].resource_scenario.dataset_id,
        source_binding.dataset_id
    );
}

#[tokio::test]
async fn test_merge_reports_unmatched_names() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let project = create_test_project(&db, "P").await;
    let net_a = create_test_network(&db, project.id, "A").await;
    let net_b = create_test_network(&db, project.id, "B").await;
    let node_a = create_test_node(&db, net_a.id, "only in a").await;
    create_test_node(&db, net_b.id, "only in b").await;
    let attr = create_test_attribute(&db, "capacity").await;
    let ra_a = attach_node_attribute(&db, node_a.id, attr.id, false).await;

    let source = svc
        .scenarios
        .add_scenario(1, net_a.id, new_scenario("source"))
        .await
        .unwrap();
    svc.scenarios
        .update_resource_data(1, source.id, vec![scalar(ra_a.id, 1.0)])
        .await
        .unwrap();
    let target = svc
        .scenarios
        .add_scenario(1, net_b.id, new_scenario("target"))
        .await
        .unwrap();

    let err = svc
        .scenarios
        .merge_scenarios(1, source.id, target.id, true, false)
        .await
        .unwrap_err();
    match err {
        ScenarioError::UnmatchedResources(names) => {
            assert_eq!(names, vec!["only in a".to_string()]);
        }
        other => panic!("expected UnmatchedResources, got {other:?}"),
    }

    // without strict matching the unmatched binding is skipped
    let merged = svc
        .scenarios
        .merge_scenarios(1, source.id, target.id, false, false)
        .await
        .unwrap();
    let data = svc.scenarios.get_scenario(1, merged.id, false).await.unwrap();
    assert!(data.resource_scenarios.is_empty());
}

#[tokio::test]
async fn test_compare_scenarios_reports_differences() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let (network_id, node_id, ra_shared) = setup_network(&db).await;
    let elevation = create_test_attribute(&db, "elevation").await;
    let ra_extra = attach_node_attribute(&db, node_id, elevation.id, false).await;

    let s1 = svc
        .scenarios
        .add_scenario(1, network_id, new_scenario("one"))
        .await
        .unwrap();
    svc.scenarios
        .update_resource_data(
            1,
            s1.id,
            vec![scalar(ra_shared, 1.0), scalar(ra_extra.id, 5.0)],
        )
        .await
        .unwrap();

    // clone shares ra_shared's dataset, then diverges on ra_extra
    let s2 = svc.scenarios.clone_scenario(1, s1.id, true, None).await.unwrap();
    svc.scenarios
        .update_resource_data(1, s2.id, vec![scalar(ra_extra.id, 6.0)])
        .await
        .unwrap();

    let diff = svc
        .scenarios
        .compare_scenarios(1, s1.id, s2.id, false)
        .await
        .unwrap();
    assert_eq!(diff.resource_scenarios.len(), 1);
    assert_eq!(diff.resource_scenarios[0].resource_attr_id, ra_extra.id);
    assert!(diff.resource_scenarios[0].dataset_1_id.is_some());
    assert!(diff.resource_scenarios[0].dataset_2_id.is_some());
    assert_ne!(
        diff.resource_scenarios[0].dataset_1_id,
        diff.resource_scenarios[0].dataset_2_id
    );

    // different networks are rejected unless explicitly allowed
    let project = create_test_project(&db, "P2").await;
    let other = create_test_network(&db, project.id, "N2").await;
    let foreign = svc
        .scenarios
        .add_scenario(1, other.id, new_scenario("foreign"))
        .await
        .unwrap();
    let err = svc
        .scenarios
        .compare_scenarios(1, s1.id, foreign.id, false)
        .await
        .unwrap_err();
    assert!(matches!(err, ScenarioError::NetworkMismatch(_)));
    assert!(svc
        .scenarios
        .compare_scenarios(1, s1.id, foreign.id, true)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_group_items_validate_network_and_inherit() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let (network_id, node_id, _) = setup_network(&db).await;
    let group = create_group(&db, network_id, "upstream").await;

    let parent = svc
        .scenarios
        .add_scenario(1, network_id, new_scenario("parent"))
        .await
        .unwrap();

    let node_item = NewResourceGroupItem {
        group_id: group.id,
        ref_key: ResourceKind::Node,
        node_id: Some(node_id),
        link_id: None,
        subgroup_id: None,
    };
    let created = svc
        .scenarios
        .add_resource_group_items(1, parent.id, vec![node_item.clone()])
        .await
        .unwrap();
    assert_eq!(created.len(), 1);

    // a node from another network is rejected
    let project = create_test_project(&db, "P2").await;
    let other_net = create_test_network(&db, project.id, "N2").await;
    let foreign_node = create_test_node(&db, other_net.id, "foreign").await;
    let err = svc
        .scenarios
        .add_resource_group_items(
            1,
            parent.id,
            vec![NewResourceGroupItem {
                node_id: Some(foreign_node.id),
                ..node_item.clone()
            }],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ScenarioError::InvalidGroupItem(_)));

    // an empty child inherits the parent's membership
    let child = svc
        .scenarios
        .create_child_scenario(1, parent.id, Some("child".to_string()))
        .await
        .unwrap();
    let resolved = svc.scenarios.get_scenario(1, child.id, true).await.unwrap();
    assert_eq!(resolved.group_items.len(), 1);
    assert_eq!(resolved.group_items[0].scenario_id, parent.id);

    // a child defining its own items for the group overrides all of them
    let second_node = create_test_node(&db, network_id, "second").await;
    svc.scenarios
        .add_resource_group_items(
            1,
            child.id,
            vec![NewResourceGroupItem {
                node_id: Some(second_node.id),
                ..node_item
            }],
        )
        .await
        .unwrap();
    let resolved = svc.scenarios.get_scenario(1, child.id, true).await.unwrap();
    assert_eq!(resolved.group_items.len(), 1);
    assert_eq!(resolved.group_items[0].scenario_id, child.id);
    assert_eq!(resolved.group_items[0].node_id, Some(second_node.id));
}

#[tokio::test]
async fn test_clone_copies_group_items() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let (network_id, node_id, _) = setup_network(&db).await;
    let group = create_group(&db, network_id, "upstream").await;

    let source = svc
        .scenarios
        .add_scenario(1, network_id, new_scenario("source"))
        .await
        .unwrap();
    svc.scenarios
        .add_resource_group_items(
            1,
            source.id,
            vec![NewResourceGroupItem {
                group_id: group.id,
                ref_key: ResourceKind::Node,
                node_id: Some(node_id),
                link_id: None,
                subgroup_id: None,
            }],
        )
        .await
        .unwrap();

    let clone = svc
        .scenarios
        .clone_scenario(1, source.id, true, Some("copy".to_string()))
        .await
        .unwrap();

    let items = resource_group_items::Entity::find().all(&db).await.unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().any(|i| i.scenario_id == clone.id));
    // copies are new rows in the clone, not shared rows
    let clone_item = items.iter().find(|i| i.scenario_id == clone.id).unwrap();
    assert_eq!(clone_item.node_id, Some(node_id));
}

#[tokio::test]
async fn test_child_scenario_default_name() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let (network_id, _, _) = setup_network(&db).await;
    let parent = svc
        .scenarios
        .add_scenario(1, network_id, new_scenario("baseline"))
        .await
        .unwrap();

    let first = svc
        .scenarios
        .create_child_scenario(1, parent.id, None)
        .await
        .unwrap();
    assert_eq!(first.name, "baseline (child)");
    let second = svc
        .scenarios
        .create_child_scenario(1, parent.id, None)
        .await
        .unwrap();
    assert_eq!(second.name, "baseline (child) 2");
}

#[tokio::test]
async fn test_parent_must_share_the_network() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let (network_a, _, _) = setup_network(&db).await;
    let project = create_test_project(&db, "P2").await;
    let network_b = create_test_network(&db, project.id, "N2").await;

    let parent = svc
        .scenarios
        .add_scenario(1, network_a, new_scenario("parent"))
        .await
        .unwrap();
    let err = svc
        .scenarios
        .add_scenario(
            1,
            network_b.id,
            NewScenario {
                name: "child".to_string(),
                parent_id: Some(parent.id),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ScenarioError::NetworkMismatch(_)));
}

#[tokio::test]
async fn test_merge_creates_missing_target_attributes() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let project = create_test_project(&db, "P").await;
    let net_a = create_test_network(&db, project.id, "A").await;
    let net_b = create_test_network(&db, project.id, "B").await;
    let node_a = create_test_node(&db, net_a.id, "reservoir").await;
    let node_b = create_test_node(&db, net_b.id, "reservoir").await;
    let attr = create_test_attribute(&db, "capacity").await;
    // the attribute is attached on the source side only
    let ra_a = attach_node_attribute(&db, node_a.id, attr.id, false).await;

    let source = svc
        .scenarios
        .add_scenario(1, net_a.id, new_scenario("source"))
        .await
        .unwrap();
    let source_binding = svc
        .scenarios
        .update_resource_data(1, source.id, vec![scalar(ra_a.id, 42.0)])
        .await
        .unwrap()
        .remove(0);
    let target = svc
        .scenarios
        .add_scenario(1, net_b.id, new_scenario("target"))
        .await
        .unwrap();

    let merged = svc
        .scenarios
        .merge_scenarios(1, source.id, target.id, true, false)
        .await
        .unwrap();

    // the attachment was created on the matched target node
    let target_ras = svc
        .attributes
        .get_resource_attributes(ResourceKind::Node, node_b.id)
        .await
        .unwrap();
    assert_eq!(target_ras.len(), 1);
    assert_eq!(target_ras[0].attr_id, attr.id);
    assert!(!target_ras[0].attr_is_var);

    // and the merged binding points it at the source dataset
    let data = svc.scenarios.get_scenario(1, merged.id, false).await.unwrap();
    assert_eq!(data.resource_scenarios.len(), 1);
    assert_eq!(
        data.resource_scenarios[0].resource_scenario.resource_attr_id,
        target_ras[0].id
    );
    assert_eq!(
        data.resource_scenarios[0].resource_scenario.dataset_id,
        source_binding.dataset_id
    );
}

#[tokio::test]
async fn test_merge_respects_ignore_missing_attributes() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let project = create_test_project(&db, "P").await;
    let net_a = create_test_network(&db, project.id, "A").await;
    let net_b = create_test_network(&db, project.id, "B").await;
    let node_a = create_test_node(&db, net_a.id, "reservoir").await;
    let node_b = create_test_node(&db, net_b.id, "reservoir").await;
    let attr = create_test_attribute(&db, "capacity").await;
    let ra_a = attach_node_attribute(&db, node_a.id, attr.id, false).await;

    let source = svc
        .scenarios
        .add_scenario(1, net_a.id, new_scenario("source"))
        .await
        .unwrap();
    svc.scenarios
        .update_resource_data(1, source.id, vec![scalar(ra_a.id, 42.0)])
        .await
        .unwrap();
    let target = svc
        .scenarios
        .add_scenario(1, net_b.id, new_scenario("target"))
        .await
        .unwrap();

    let merged = svc
        .scenarios
        .merge_scenarios(1, source.id, target.id, true, true)
        .await
        .unwrap();

    // no attachment was created and the binding was skipped
    assert!(svc
        .attributes
        .get_resource_attributes(ResourceKind::Node, node_b.id)
        .await
        .unwrap()
        .is_empty());
    let data = svc.scenarios.get_scenario(1, merged.id, false).await.unwrap();
    assert!(data.resource_scenarios.is_empty());
}

#[tokio::test]
async fn test_compare_scenarios_reports_group_item_differences() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let (network_id, node_id, _) = setup_network(&db).await;
    let other_node = create_test_node(&db, network_id, "outfall").await;
    let group = create_group(&db, network_id, "upstream").await;

    let s1 = svc
        .scenarios
        .add_scenario(1, network_id, new_scenario("one"))
        .await
        .unwrap();
    let s2 = svc
        .scenarios
        .add_scenario(1, network_id, new_scenario("two"))
        .await
        .unwrap();

    let item_for = |node: i32| NewResourceGroupItem {
        group_id: group.id,
        ref_key: ResourceKind::Node,
        node_id: Some(node),
        link_id: None,
        subgroup_id: None,
    };
    svc.scenarios
        .add_resource_group_items(1, s1.id, vec![item_for(node_id)])
        .await
        .unwrap();
    svc.scenarios
        .add_resource_group_items(1, s2.id, vec![item_for(other_node.id)])
        .await
        .unwrap();

    let diff = svc
        .scenarios
        .compare_scenarios(1, s1.id, s2.id, false)
        .await
        .unwrap();

    assert_eq!(
        diff.group_items_only_in_1,
        vec![(group.id, "NODE".to_string(), Some(node_id), None, None)]
    );
    assert_eq!(
        diff.group_items_only_in_2,
        vec![(group.id, "NODE".to_string(), Some(other_node.id), None, None)]
    );
}

struct DenyDatasetReads;

#[async_trait]
impl PermissionChecker for DenyDatasetReads {
    async fn check_read(
        &self,
        user_id: i32,
        scope: PermissionScope,
    ) -> Result<(), PermissionError> {
        match scope {
            PermissionScope::Dataset(_) => {
                Err(PermissionError::denied(user_id, "read", scope.to_string()))
            }
            _ => Ok(()),
        }
    }

    async fn check_write(
        &self,
        _user_id: i32,
        _scope: PermissionScope,
    ) -> Result<(), PermissionError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_hidden_dataset_is_gated_on_scenario_reads() {
    let db = setup_test_db().await;
    let permissions = Arc::new(DenyDatasetReads);
    let dataset_svc = DatasetService::new(
        db.clone(),
        Arc::new(MemoryValueStore::new()),
        StorageConfig::default(),
        permissions.clone(),
    );
    let scenario_svc = ScenarioService::new(db.clone(), permissions, dataset_svc);

    let (network_id, _, ra_id) = setup_network(&db).await;
    let scenario = scenario_svc
        .add_scenario(1, network_id, new_scenario("s"))
        .await
        .unwrap();

    let mut input = DatasetInput::scalar("secret", 7);
    input.hidden = true;
    scenario_svc
        .update_resource_data(
            1,
            scenario.id,
            vec![ResourceScenarioValue {
                resource_attr_id: ra_id,
                dataset: input,
            }],
        )
        .await
        .unwrap();

    // the creator resolves the hidden value
    let data = scenario_svc.get_scenario(1, scenario.id, false).await.unwrap();
    assert_eq!(data.resource_scenarios[0].dataset.value, "7");

    // anyone else is rejected by the injected checker
    let err = scenario_svc
        .get_scenario(2, scenario.id, false)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ScenarioError::Dataset(DatasetError::Permission(_))
    ));
}

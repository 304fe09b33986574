//! Scenario lifecycle and resource-scenario value assignment
//!
//! A scenario binds resource attributes to datasets within one network.
//! Children inherit unset bindings from their parent chain at read time;
//! nothing is copied. Datasets are shared between bindings, so a write must
//! decide between mutating the dataset in place (this binding is the sole
//! owner) and copying to a fresh dataset (the dataset is visible elsewhere).
//! That decision is `assign_value` below and is the invariant the rest of the
//! module is built around: two scenarios never observe each other's edits
//! through a shared dataset, and no copy is made when one would be redundant.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::database::entities::common_types::{ResourceKind, STATUS_ACTIVE, STATUS_DELETED};
use crate::database::entities::{
    datasets, links, networks, nodes, resource_attrs, resource_group_items, resource_groups,
    resource_scenarios, scenarios,
};
use crate::errors::{ScenarioError, ScenarioResult};
use crate::hierarchy::{resolve_inherited, ParentChain};
use crate::permissions::{PermissionChecker, PermissionScope};
use crate::services::dataset_service::{dataset_hash, DatasetInput, DatasetService};

/// Input for creating a scenario.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NewScenario {
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<i32>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub time_step: Option<String>,
}

/// One requested value assignment: a resource attribute and the dataset
/// content it should hold in the scenario.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceScenarioValue {
    pub resource_attr_id: i32,
    pub dataset: DatasetInput,
}

/// A binding together with its dataset and, when inherited, the ancestor
/// scenario it came from.
#[derive(Clone, Debug)]
pub struct ResolvedResourceScenario {
    pub resource_scenario: resource_scenarios::Model,
    pub dataset: datasets::Model,
    pub inherited_from: Option<i32>,
}

/// The effective contents of a scenario.
#[derive(Clone, Debug)]
pub struct ScenarioData {
    pub scenario: scenarios::Model,
    pub resource_scenarios: Vec<ResolvedResourceScenario>,
    pub group_items: Vec<resource_group_items::Model>,
}

/// Binding-level difference between two scenarios.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceScenarioDiff {
    pub resource_attr_id: i32,
    pub dataset_1_id: Option<i32>,
    pub dataset_2_id: Option<i32>,
}

/// Identity of a group membership for set comparison.
pub type GroupItemKey = (i32, String, Option<i32>, Option<i32>, Option<i32>);

/// Full comparison of two scenarios.
#[derive(Clone, Debug, Default)]
pub struct ScenarioDiff {
    pub scenario_1_id: i32,
    pub scenario_2_id: i32,
    pub resource_scenarios: Vec<ResourceScenarioDiff>,
    pub group_items_only_in_1: Vec<GroupItemKey>,
    pub group_items_only_in_2: Vec<GroupItemKey>,
}

/// Input for adding a group membership within a scenario.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewResourceGroupItem {
    pub group_id: i32,
    pub ref_key: ResourceKind,
    pub node_id: Option<i32>,
    pub link_id: Option<i32>,
    pub subgroup_id: Option<i32>,
}

#[derive(Clone)]
pub struct ScenarioService {
    db: DatabaseConnection,
    permissions: Arc<dyn PermissionChecker>,
    datasets: DatasetService,
}

impl ScenarioService {
    pub fn new(
        db: DatabaseConnection,
        permissions: Arc<dyn PermissionChecker>,
        datasets: DatasetService,
    ) -> Self {
        Self {
            db,
            permissions,
            datasets,
        }
    }

    /// Create a scenario. Names are unique within a network; the conflict is
    /// reported before any insert is attempted.
    pub async fn add_scenario(
        &self,
        user_id: i32,
        network_id: i32,
        scenario: NewScenario,
    ) -> ScenarioResult<scenarios::Model> {
        networks::Entity::find_by_id(network_id)
            .one(&self.db)
            .await?
            .ok_or(ScenarioError::NetworkNotFound(network_id))?;
        self.permissions
            .check_write(user_id, PermissionScope::Network(network_id))
            .await?;

        if self.name_taken(network_id, &scenario.name).await? {
            return Err(ScenarioError::NameConflict {
                network_id,
                name: scenario.name,
            });
        }

        if let Some(parent_id) = scenario.parent_id {
            let parent = self.get_scenario_row(parent_id).await?;
            if parent.network_id != network_id {
                return Err(ScenarioError::NetworkMismatch(format!(
                    "parent scenario {} belongs to network {}",
                    parent_id, parent.network_id
                )));
            }
        }

        let now = Utc::now();
        let created = scenarios::ActiveModel {
            network_id: Set(network_id),
            name: Set(scenario.name),
            description: Set(scenario.description),
            parent_id: Set(scenario.parent_id),
            locked: Set(false),
            status: Set(STATUS_ACTIVE.to_string()),
            start_time: Set(scenario.start_time),
            end_time: Set(scenario.end_time),
            time_step: Set(scenario.time_step),
            created_by: Set(Some(user_id)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        info!(scenario_id = created.id, network_id, "created scenario");
        Ok(created)
    }

    pub async fn get_scenarios(
        &self,
        user_id: i32,
        network_id: i32,
    ) -> ScenarioResult<Vec<scenarios::Model>> {
        self.permissions
            .check_read(user_id, PermissionScope::Network(network_id))
            .await?;
        Ok(scenarios::Entity::find()
            .filter(scenarios::Column::NetworkId.eq(network_id))
            .all(&self.db)
            .await?)
    }

    /// Resolve the effective contents of a scenario.
    ///
    /// With `get_parent_data`, bindings absent from this scenario are filled
    /// from its parent chain, nearest ancestor first, without copying rows.
    /// Group items resolve the same way per group.
    pub async fn get_scenario(
        &self,
        user_id: i32,
        scenario_id: i32,
        get_parent_data: bool,
    ) -> ScenarioResult<ScenarioData> {
        let scenario = self.get_scenario_row(scenario_id).await?;
        self.permissions
            .check_read(user_id, PermissionScope::Scenario(scenario_id))
            .await?;

        let lineage = if get_parent_data {
            let chain = self.load_scenario_chain(scenario.network_id).await?;
            chain.lineage(scenario_id)
        } else {
            vec![scenario_id]
        };

        // Bindings for the whole lineage in one query, then override by
        // presence: the nearest scenario that binds a resource attr wins.
        let all_bindings = resource_scenarios::Entity::find()
            .filter(resource_scenarios::Column::ScenarioId.is_in(lineage.clone()))
            .all(&self.db)
            .await?;
        let mut bindings_by_scenario: HashMap<i32, Vec<resource_scenarios::Model>> =
            HashMap::new();
        for binding in all_bindings {
            bindings_by_scenario
                .entry(binding.scenario_id)
                .or_default()
                .push(binding);
        }
        let effective = resolve_inherited(&lineage, |sid| {
            bindings_by_scenario
                .remove(&sid)
                .unwrap_or_default()
                .into_iter()
                .map(|b| (b.resource_attr_id, b))
                .collect()
        });

        let dataset_ids: Vec<i32> = effective.values().map(|b| b.dataset_id).collect();
        let dataset_rows = datasets::Entity::find()
            .filter(datasets::Column::Id.is_in(dataset_ids))
            .all(&self.db)
            .await?;
        let mut datasets_by_id = HashMap::new();
        for dataset in dataset_rows {
            // Same hidden-visibility gate as a direct dataset fetch.
            let resolved = self.datasets.resolve_for_user(user_id, dataset).await?;
            datasets_by_id.insert(resolved.id, resolved);
        }

        let mut resolved_bindings = Vec::with_capacity(effective.len());
        for (_, binding) in effective {
            let dataset = datasets_by_id
                .get(&binding.dataset_id)
                .cloned()
                .ok_or(ScenarioError::Dataset(
                    crate::errors::DatasetError::NotFound(binding.dataset_id),
                ))?;
            let inherited_from =
                (binding.scenario_id != scenario_id).then_some(binding.scenario_id);
            resolved_bindings.push(ResolvedResourceScenario {
                resource_scenario: binding,
                dataset,
                inherited_from,
            });
        }
        resolved_bindings.sort_by_key(|r| r.resource_scenario.resource_attr_id);

        let group_items = self.resolve_group_items(&lineage).await?;

        Ok(ScenarioData {
            scenario,
            resource_scenarios: resolved_bindings,
            group_items,
        })
    }

    /// Copy a scenario wholesale within its network.
    ///
    /// With `retain_results == false`, bindings on output attributes
    /// (`attr_is_var`) are left behind. Dataset rows are shared with the
    /// source, never duplicated; the copy-on-write rule in `assign_value`
    /// keeps later edits isolated.
    pub async fn clone_scenario(
        &self,
        user_id: i32,
        scenario_id: i32,
        retain_results: bool,
        scenario_name: Option<String>,
    ) -> ScenarioResult<scenarios::Model> {
        let source = self.get_scenario_row(scenario_id).await?;
        self.permissions
            .check_read(user_id, PermissionScope::Scenario(scenario_id))
            .await?;
        self.permissions
            .check_write(user_id, PermissionScope::Network(source.network_id))
            .await?;

        let name = match scenario_name {
            Some(name) => {
                if self.name_taken(source.network_id, &name).await? {
                    return Err(ScenarioError::NameConflict {
                        network_id: source.network_id,
                        name,
                    });
                }
                name
            }
            None => self.generate_clone_name(source.network_id, &source.name).await?,
        };

        // The clone row and its copies land in one transaction; no partial
        // clone is ever visible.
        let txn = self.db.begin().await?;
        let clone = self
            .clone_scenario_rows(&txn, user_id, &source, name, retain_results)
            .await?;
        txn.commit().await?;

        info!(
            source_id = scenario_id,
            clone_id = clone.id,
            retain_results,
            "cloned scenario"
        );
        Ok(clone)
    }

    /// Insert the clone row and copy bindings and group items, all on `conn`,
    /// so the caller's transaction makes the whole copy atomic.
    async fn clone_scenario_rows<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: i32,
        source: &scenarios::Model,
        name: String,
        retain_results: bool,
    ) -> ScenarioResult<scenarios::Model> {
        let now = Utc::now();
        let clone = scenarios::ActiveModel {
            network_id: Set(source.network_id),
            name: Set(name),
            description: Set(source.description.clone()),
            parent_id: Set(source.parent_id),
            locked: Set(false),
            status: Set(STATUS_ACTIVE.to_string()),
            start_time: Set(source.start_time.clone()),
            end_time: Set(source.end_time.clone()),
            time_step: Set(source.time_step.clone()),
            created_by: Set(Some(user_id)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await?;

        let mut bindings = resource_scenarios::Entity::find()
            .filter(resource_scenarios::Column::ScenarioId.eq(source.id))
            .all(conn)
            .await?;

        if !retain_results {
            let ra_ids: Vec<i32> = bindings.iter().map(|b| b.resource_attr_id).collect();
            let output_attrs: HashSet<i32> = resource_attrs::Entity::find()
                .filter(resource_attrs::Column::Id.is_in(ra_ids))
                .filter(resource_attrs::Column::AttrIsVar.eq(true))
                .all(conn)
                .await?
                .into_iter()
                .map(|ra| ra.id)
                .collect();
            bindings.retain(|b| !output_attrs.contains(&b.resource_attr_id));
        }

        // Set-based copies keep the transaction short on large networks.
        let binding_copies: Vec<resource_scenarios::ActiveModel> = bindings
            .iter()
            .map(|b| resource_scenarios::ActiveModel {
                scenario_id: Set(clone.id),
                resource_attr_id: Set(b.resource_attr_id),
                dataset_id: Set(b.dataset_id),
                source: Set(b.source.clone()),
            })
            .collect();
        if !binding_copies.is_empty() {
            resource_scenarios::Entity::insert_many(binding_copies)
                .exec(conn)
                .await?;
        }

        let group_items = resource_group_items::Entity::find()
            .filter(resource_group_items::Column::ScenarioId.eq(source.id))
            .all(conn)
            .await?;
        let item_copies: Vec<resource_group_items::ActiveModel> = group_items
            .iter()
            .map(|item| resource_group_items::ActiveModel {
                group_id: Set(item.group_id),
                scenario_id: Set(clone.id),
                ref_key: Set(item.ref_key.clone()),
                node_id: Set(item.node_id),
                link_id: Set(item.link_id),
                subgroup_id: Set(item.subgroup_id),
                ..Default::default()
            })
            .collect();
        if !item_copies.is_empty() {
            resource_group_items::Entity::insert_many(item_copies)
                .exec(conn)
                .await?;
        }

        debug!(
            source_id = source.id,
            clone_id = clone.id,
            bindings = bindings.len(),
            group_items = group_items.len(),
            "copied scenario rows"
        );
        Ok(clone)
    }

    /// Create an empty scenario under a parent. Reads through `get_scenario`
    /// with `get_parent_data` see all parent data until the child overrides it.
    pub async fn create_child_scenario(
        &self,
        user_id: i32,
        parent_id: i32,
        child_name: Option<String>,
    ) -> ScenarioResult<scenarios::Model> {
        let parent = self.get_scenario_row(parent_id).await?;
        let name = match child_name {
            Some(name) => name,
            None => {
                self.generate_unique_name(parent.network_id, &format!("{} (child)", parent.name))
                    .await?
            }
        };

        self.add_scenario(
            user_id,
            parent.network_id,
            NewScenario {
                name,
                description: parent.description.clone(),
                parent_id: Some(parent_id),
                start_time: parent.start_time.clone(),
                end_time: parent.end_time.clone(),
                time_step: parent.time_step.clone(),
            },
        )
        .await
    }

    /// Merge the values of one scenario into a clone of another, matching
    /// resources between the two networks by name.
    ///
    /// The target itself is never touched: the merge lands in a fresh clone.
    /// Datasets are shared with the source by id. Unmatched resource names
    /// fail the whole call when `match_all_names` is set and are skipped
    /// otherwise. Attributes missing on the matched target resource are
    /// created unless `ignore_missing_attributes` is set.
    pub async fn merge_scenarios(
        &self,
        user_id: i32,
        source_id: i32,
        target_id: i32,
        match_all_names: bool,
        ignore_missing_attributes: bool,
    ) -> ScenarioResult<scenarios::Model> {
        let source = self.get_scenario_row(source_id).await?;
        let target = self.get_scenario_row(target_id).await?;
        self.permissions
            .check_read(user_id, PermissionScope::Scenario(source_id))
            .await?;
        self.permissions
            .check_write(user_id, PermissionScope::Network(target.network_id))
            .await?;

        let source_bindings = resource_scenarios::Entity::find()
            .filter(resource_scenarios::Column::ScenarioId.eq(source_id))
            .all(&self.db)
            .await?;
        let ra_ids: Vec<i32> = source_bindings.iter().map(|b| b.resource_attr_id).collect();
        let source_ras: HashMap<i32, resource_attrs::Model> = resource_attrs::Entity::find()
            .filter(resource_attrs::Column::Id.is_in(ra_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|ra| (ra.id, ra))
            .collect();

        let source_names = ResourceNameIndex::load(&self.db, source.network_id).await?;
        let target_names = ResourceNameIndex::load(&self.db, target.network_id).await?;

        // Match each source binding's resource to a target resource by name.
        let mut matched: Vec<(resource_scenarios::Model, ResourceKind, i32)> = Vec::new();
        let mut unmatched: Vec<String> = Vec::new();
        for binding in source_bindings {
            let ra = match source_ras.get(&binding.resource_attr_id) {
                Some(ra) => ra,
                None => {
                    return Err(ScenarioError::ResourceAttrNotFound(
                        binding.resource_attr_id,
                    ))
                }
            };
            let kind = ResourceKind::parse(&ra.ref_key)?;
            match kind {
                ResourceKind::Network => {
                    matched.push((binding, kind, target.network_id));
                }
                ResourceKind::Project => {
                    // Project-scoped values sit above both networks; nothing to merge.
                    continue;
                }
                ResourceKind::Node | ResourceKind::Link | ResourceKind::Group => {
                    let resource_id = match ra.resource_id() {
                        Some(id) => id,
                        None => {
                            return Err(ScenarioError::ResourceAttrNotFound(
                                binding.resource_attr_id,
                            ))
                        }
                    };
                    match source_names
                        .name_of(kind, resource_id)
                        .and_then(|name| target_names.id_of(kind, name))
                    {
                        Some(target_resource_id) => {
                            matched.push((binding, kind, target_resource_id));
                        }
                        None => {
                            let name = source_names
                                .name_of(kind, resource_id)
                                .unwrap_or("<unknown>")
                                .to_string();
                            unmatched.push(name);
                        }
                    }
                }
            }
        }

        if match_all_names && !unmatched.is_empty() {
            unmatched.sort();
            unmatched.dedup();
            return Err(ScenarioError::UnmatchedResources(unmatched));
        }
        if !unmatched.is_empty() {
            warn!(
                source_id,
                target_id,
                skipped = unmatched.len(),
                "merge skipping unmatched resources"
            );
        }

        // Non-destructive: the merge lands in a clone of the target, created
        // in the same transaction as the merged bindings so a failure leaves
        // nothing behind.
        let name = self
            .generate_clone_name(target.network_id, &target.name)
            .await?;
        let txn = self.db.begin().await?;
        let merged = self
            .clone_scenario_rows(&txn, user_id, &target, name, true)
            .await?;

        for (binding, kind, target_resource_id) in matched {
            let source_ra = &source_ras[&binding.resource_attr_id];
            let target_ra = resource_attrs::Entity::find()
                .filter(resource_attrs::Column::RefKey.eq(kind.as_str()))
                .filter(resource_fk_column(kind).eq(target_resource_id))
                .filter(resource_attrs::Column::AttrId.eq(source_ra.attr_id))
                .one(&txn)
                .await?;

            let target_ra = match target_ra {
                Some(ra) => ra,
                None if ignore_missing_attributes => continue,
                None => {
                    let mut active = resource_attrs::ActiveModel {
                        attr_id: Set(source_ra.attr_id),
                        ref_key: Set(kind.as_str().to_string()),
                        project_id: Set(None),
                        network_id: Set(None),
                        node_id: Set(None),
                        link_id: Set(None),
                        group_id: Set(None),
                        attr_is_var: Set(source_ra.attr_is_var),
                        ..Default::default()
                    };
                    match kind {
                        ResourceKind::Network => active.network_id = Set(Some(target_resource_id)),
                        ResourceKind::Node => active.node_id = Set(Some(target_resource_id)),
                        ResourceKind::Link => active.link_id = Set(Some(target_resource_id)),
                        ResourceKind::Group => active.group_id = Set(Some(target_resource_id)),
                        ResourceKind::Project => unreachable!("projects filtered above"),
                    }
                    active.insert(&txn).await?
                }
            };

            // Repoint (or create) the clone's binding at the source dataset.
            let existing = resource_scenarios::Entity::find_by_id((merged.id, target_ra.id))
                .one(&txn)
                .await?;
            match existing {
                Some(row) => {
                    let mut active: resource_scenarios::ActiveModel = row.into();
                    active.dataset_id = Set(binding.dataset_id);
                    active.update(&txn).await?;
                }
                None => {
                    resource_scenarios::ActiveModel {
                        scenario_id: Set(merged.id),
                        resource_attr_id: Set(target_ra.id),
                        dataset_id: Set(binding.dataset_id),
                        source: Set(binding.source.clone()),
                    }
                    .insert(&txn)
                    .await?;
                }
            }
        }
        txn.commit().await?;

        info!(source_id, target_id, merged_id = merged.id, "merged scenarios");
        Ok(merged)
    }

    /// Diff the bindings and group memberships of two scenarios.
    pub async fn compare_scenarios(
        &self,
        user_id: i32,
        scenario_1_id: i32,
        scenario_2_id: i32,
        allow_different_networks: bool,
    ) -> ScenarioResult<ScenarioDiff> {
        let s1 = self.get_scenario_row(scenario_1_id).await?;
        let s2 = self.get_scenario_row(scenario_2_id).await?;
        self.permissions
            .check_read(user_id, PermissionScope::Scenario(scenario_1_id))
            .await?;
        self.permissions
            .check_read(user_id, PermissionScope::Scenario(scenario_2_id))
            .await?;

        if s1.network_id != s2.network_id && !allow_different_networks {
            return Err(ScenarioError::NetworkMismatch(format!(
                "scenario {} is in network {}, scenario {} in network {}",
                scenario_1_id, s1.network_id, scenario_2_id, s2.network_id
            )));
        }

        let load_bindings = |sid: i32| {
            resource_scenarios::Entity::find()
                .filter(resource_scenarios::Column::ScenarioId.eq(sid))
                .all(&self.db)
        };
        let bindings_1: HashMap<i32, i32> = load_bindings(scenario_1_id)
            .await?
            .into_iter()
            .map(|b| (b.resource_attr_id, b.dataset_id))
            .collect();
        let bindings_2: HashMap<i32, i32> = load_bindings(scenario_2_id)
            .await?
            .into_iter()
            .map(|b| (b.resource_attr_id, b.dataset_id))
            .collect();

        let mut resource_attr_ids: Vec<i32> = bindings_1
            .keys()
            .chain(bindings_2.keys())
            .copied()
            .collect();
        resource_attr_ids.sort_unstable();
        resource_attr_ids.dedup();

        let mut binding_diffs = Vec::new();
        for ra_id in resource_attr_ids {
            let d1 = bindings_1.get(&ra_id).copied();
            let d2 = bindings_2.get(&ra_id).copied();
            if d1 != d2 {
                binding_diffs.push(ResourceScenarioDiff {
                    resource_attr_id: ra_id,
                    dataset_1_id: d1,
                    dataset_2_id: d2,
                });
            }
        }

        let load_items = |sid: i32| {
            resource_group_items::Entity::find()
                .filter(resource_group_items::Column::ScenarioId.eq(sid))
                .all(&self.db)
        };
        let items_1: HashSet<GroupItemKey> = load_items(scenario_1_id)
            .await?
            .iter()
            .map(resource_group_items::Model::membership_key)
            .collect();
        let items_2: HashSet<GroupItemKey> = load_items(scenario_2_id)
            .await?
            .iter()
            .map(resource_group_items::Model::membership_key)
            .collect();

        let mut only_in_1: Vec<GroupItemKey> = items_1.difference(&items_2).cloned().collect();
        let mut only_in_2: Vec<GroupItemKey> = items_2.difference(&items_1).cloned().collect();
        only_in_1.sort();
        only_in_2.sort();

        Ok(ScenarioDiff {
            scenario_1_id,
            scenario_2_id,
            resource_scenarios: binding_diffs,
            group_items_only_in_1: only_in_1,
            group_items_only_in_2: only_in_2,
        })
    }

    /// Set the cooperative lock flag. This is an application-level lock only;
    /// two callers racing between the check and the write are not serialised
    /// beyond what the database transaction provides.
    pub async fn lock_scenario(&self, user_id: i32, scenario_id: i32) -> ScenarioResult<()> {
        self.set_locked(user_id, scenario_id, true).await
    }

    pub async fn unlock_scenario(&self, user_id: i32, scenario_id: i32) -> ScenarioResult<()> {
        self.set_locked(user_id, scenario_id, false).await
    }

    /// Soft delete or reactivate a scenario via its status flag.
    pub async fn set_scenario_status(
        &self,
        user_id: i32,
        scenario_id: i32,
        status: &str,
    ) -> ScenarioResult<scenarios::Model> {
        if status != STATUS_ACTIVE && status != STATUS_DELETED {
            return Err(ScenarioError::InvalidStatus(status.to_string()));
        }
        let scenario = self.get_scenario_row(scenario_id).await?;
        self.permissions
            .check_write(user_id, PermissionScope::Scenario(scenario_id))
            .await?;

        let mut active: scenarios::ActiveModel = scenario.into();
        active.status = Set(status.to_string());
        active.updated_at = Set(Utc::now());
        Ok(active.update(&self.db).await?)
    }

    /// Hard delete a scenario row. Bindings and group items cascade; dataset
    /// rows are never deleted here, other bindings may still reference them.
    pub async fn purge_scenario(&self, user_id: i32, scenario_id: i32) -> ScenarioResult<()> {
        self.get_scenario_row(scenario_id).await?;
        self.permissions
            .check_write(user_id, PermissionScope::Scenario(scenario_id))
            .await?;

        scenarios::Entity::delete_by_id(scenario_id)
            .exec(&self.db)
            .await?;
        info!(scenario_id, "purged scenario");
        Ok(())
    }

    /// Apply value assignments to one scenario, all-or-nothing.
    pub async fn update_resource_data(
        &self,
        user_id: i32,
        scenario_id: i32,
        values: Vec<ResourceScenarioValue>,
    ) -> ScenarioResult<Vec<resource_scenarios::Model>> {
        let scenario = self.get_scenario_row(scenario_id).await?;
        if scenario.locked {
            return Err(ScenarioError::Locked(scenario_id));
        }
        self.permissions
            .check_write(user_id, PermissionScope::Scenario(scenario_id))
            .await?;

        let txn = self.db.begin().await?;
        let mut updated = Vec::with_capacity(values.len());
        for value in values {
            updated.push(
                self.update_resource_scenario(&txn, user_id, &scenario, value)
                    .await?,
            );
        }
        txn.commit().await?;
        Ok(updated)
    }

    /// Apply the same value assignments to several scenarios, which must all
    /// belong to one network. The whole batch fails up front otherwise, and
    /// any mid-batch failure rolls back every scenario's changes.
    pub async fn bulk_update_resourcedata(
        &self,
        user_id: i32,
        scenario_ids: Vec<i32>,
        values: Vec<ResourceScenarioValue>,
    ) -> ScenarioResult<()> {
        if scenario_ids.is_empty() {
            return Ok(());
        }

        let mut scenario_rows = Vec::with_capacity(scenario_ids.len());
        for scenario_id in &scenario_ids {
            scenario_rows.push(self.get_scenario_row(*scenario_id).await?);
        }

        let network_ids: HashSet<i32> = scenario_rows.iter().map(|s| s.network_id).collect();
        if network_ids.len() > 1 {
            let mut ids: Vec<String> = network_ids.iter().map(i32::to_string).collect();
            ids.sort();
            return Err(ScenarioError::NetworkMismatch(ids.join(", ")));
        }
        for scenario in &scenario_rows {
            if scenario.locked {
                return Err(ScenarioError::Locked(scenario.id));
            }
        }
        if let Some(network_id) = network_ids.into_iter().next() {
            self.permissions
                .check_write(user_id, PermissionScope::Network(network_id))
                .await?;
        }

        let txn = self.db.begin().await?;
        for scenario in &scenario_rows {
            for value in &values {
                self.update_resource_scenario(&txn, user_id, scenario, value.clone())
                    .await?;
            }
        }
        txn.commit().await?;

        info!(
            scenarios = scenario_rows.len(),
            values = values.len(),
            "bulk updated resource data"
        );
        Ok(())
    }

    /// Remove a binding. The dataset row stays; other bindings may share it.
    pub async fn delete_resource_scenario(
        &self,
        user_id: i32,
        scenario_id: i32,
        resource_attr_id: i32,
    ) -> ScenarioResult<()> {
        let scenario = self.get_scenario_row(scenario_id).await?;
        if scenario.locked {
            return Err(ScenarioError::Locked(scenario_id));
        }
        self.permissions
            .check_write(user_id, PermissionScope::Scenario(scenario_id))
            .await?;

        let binding = resource_scenarios::Entity::find_by_id((scenario_id, resource_attr_id))
            .one(&self.db)
            .await?
            .ok_or(ScenarioError::BindingNotFound {
                scenario_id,
                resource_attr_id,
            })?;

        resource_scenarios::Entity::delete_by_id((binding.scenario_id, binding.resource_attr_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Add group memberships within a scenario.
    pub async fn add_resource_group_items(
        &self,
        user_id: i32,
        scenario_id: i32,
        items: Vec<NewResourceGroupItem>,
    ) -> ScenarioResult<Vec<resource_group_items::Model>> {
        let scenario = self.get_scenario_row(scenario_id).await?;
        if scenario.locked {
            return Err(ScenarioError::Locked(scenario_id));
        }
        self.permissions
            .check_write(user_id, PermissionScope::Scenario(scenario_id))
            .await?;

        let txn = self.db.begin().await?;
        let mut created = Vec::with_capacity(items.len());
        for item in items {
            let group = resource_groups::Entity::find_by_id(item.group_id)
                .one(&txn)
                .await?
                .ok_or(ScenarioError::GroupNotFound(item.group_id))?;
            if group.network_id != scenario.network_id {
                return Err(ScenarioError::InvalidGroupItem(format!(
                    "group {} belongs to network {}, scenario to network {}",
                    group.id, group.network_id, scenario.network_id
                )));
            }
            self.validate_group_item_ref(&txn, &scenario, &item).await?;

            let active = resource_group_items::ActiveModel {
                group_id: Set(item.group_id),
                scenario_id: Set(scenario_id),
                ref_key: Set(item.ref_key.as_str().to_string()),
                node_id: Set(item.node_id),
                link_id: Set(item.link_id),
                subgroup_id: Set(item.subgroup_id),
                ..Default::default()
            };
            created.push(active.insert(&txn).await?);
        }
        txn.commit().await?;
        Ok(created)
    }

    pub async fn delete_resource_group_item(
        &self,
        user_id: i32,
        item_id: i32,
    ) -> ScenarioResult<()> {
        let item = resource_group_items::Entity::find_by_id(item_id)
            .one(&self.db)
            .await?
            .ok_or(ScenarioError::InvalidGroupItem(format!(
                "group item {} not found",
                item_id
            )))?;
        let scenario = self.get_scenario_row(item.scenario_id).await?;
        if scenario.locked {
            return Err(ScenarioError::Locked(scenario.id));
        }
        self.permissions
            .check_write(user_id, PermissionScope::Scenario(scenario.id))
            .await?;

        resource_group_items::Entity::delete_by_id(item_id)
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Upsert one binding: create it when absent, otherwise run the
    /// assign-value ownership decision on the existing one.
    async fn update_resource_scenario<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: i32,
        scenario: &scenarios::Model,
        value: ResourceScenarioValue,
    ) -> ScenarioResult<resource_scenarios::Model> {
        if scenario.locked {
            return Err(ScenarioError::Locked(scenario.id));
        }

        resource_attrs::Entity::find_by_id(value.resource_attr_id)
            .one(conn)
            .await?
            .ok_or(ScenarioError::ResourceAttrNotFound(value.resource_attr_id))?;

        let existing = resource_scenarios::Entity::find_by_id((scenario.id, value.resource_attr_id))
            .one(conn)
            .await?;

        match existing {
            Some(binding) => {
                self.assign_value(conn, user_id, scenario, binding, &value.dataset)
                    .await
            }
            None => {
                let dataset = self
                    .datasets
                    .insert_dataset_row(conn, Some(user_id), &value.dataset)
                    .await?;
                let binding = resource_scenarios::ActiveModel {
                    scenario_id: Set(scenario.id),
                    resource_attr_id: Set(value.resource_attr_id),
                    dataset_id: Set(dataset.id),
                    source: Set(None),
                }
                .insert(conn)
                .await?;
                Ok(binding)
            }
        }
    }

    /// Write a value through a binding: mutate the dataset if this binding
    /// owns it exclusively, copy to a new dataset if it is shared.
    ///
    /// Ownership is counted by query over `resource_scenarios`, not by a
    /// maintained counter: the rows referencing the dataset are fetched and
    /// the binding's own row, when it is the only one, still counts as
    /// exclusive ownership.
    async fn assign_value<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: i32,
        scenario: &scenarios::Model,
        binding: resource_scenarios::Model,
        input: &DatasetInput,
    ) -> ScenarioResult<resource_scenarios::Model> {
        if scenario.locked {
            return Err(ScenarioError::Locked(scenario.id));
        }

        let incoming_hash = dataset_hash(&input.value, &input.metadata)?;

        let current = datasets::Entity::find_by_id(binding.dataset_id)
            .one(conn)
            .await?
            .ok_or(ScenarioError::Dataset(
                crate::errors::DatasetError::NotFound(binding.dataset_id),
            ))?;

        if current.hash == incoming_hash {
            // Same content, same metadata: idempotent write.
            debug!(
                scenario_id = binding.scenario_id,
                resource_attr_id = binding.resource_attr_id,
                "assign_value is a no-op, hash unchanged"
            );
            return Ok(binding);
        }

        let references = resource_scenarios::Entity::find()
            .filter(resource_scenarios::Column::DatasetId.eq(binding.dataset_id))
            .all(conn)
            .await?;
        let exclusive = match references.len() {
            0 => true,
            1 => {
                references[0].scenario_id == binding.scenario_id
                    && references[0].resource_attr_id == binding.resource_attr_id
            }
            _ => false,
        };

        if exclusive {
            self.datasets.update_dataset_row(conn, current, input).await?;
            debug!(
                scenario_id = binding.scenario_id,
                resource_attr_id = binding.resource_attr_id,
                dataset_id = binding.dataset_id,
                "assign_value updated dataset in place"
            );
            Ok(binding)
        } else {
            // Shared with at least one other binding: copy, never mutate.
            let dataset = self
                .datasets
                .insert_dataset_row(conn, Some(user_id), input)
                .await?;
            let dataset_id = dataset.id;
            let mut active: resource_scenarios::ActiveModel = binding.into();
            active.dataset_id = Set(dataset_id);
            let updated = active.update(conn).await?;
            debug!(
                scenario_id = updated.scenario_id,
                resource_attr_id = updated.resource_attr_id,
                dataset_id,
                "assign_value copied shared dataset"
            );
            Ok(updated)
        }
    }

    async fn set_locked(
        &self,
        user_id: i32,
        scenario_id: i32,
        locked: bool,
    ) -> ScenarioResult<()> {
        let scenario = self.get_scenario_row(scenario_id).await?;
        self.permissions
            .check_write(user_id, PermissionScope::Scenario(scenario_id))
            .await?;

        let mut active: scenarios::ActiveModel = scenario.into();
        active.locked = Set(locked);
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await?;
        info!(scenario_id, locked, "changed scenario lock");
        Ok(())
    }

    async fn get_scenario_row(&self, scenario_id: i32) -> ScenarioResult<scenarios::Model> {
        scenarios::Entity::find_by_id(scenario_id)
            .one(&self.db)
            .await?
            .ok_or(ScenarioError::NotFound(scenario_id))
    }

    async fn name_taken(&self, network_id: i32, name: &str) -> ScenarioResult<bool> {
        Ok(scenarios::Entity::find()
            .filter(scenarios::Column::NetworkId.eq(network_id))
            .filter(scenarios::Column::Name.eq(name))
            .one(&self.db)
            .await?
            .is_some())
    }

    /// "<name> (clone)", then "<name> (clone 2)" and so on.
    async fn generate_clone_name(&self, network_id: i32, base: &str) -> ScenarioResult<String> {
        self.generate_unique_name(network_id, &format!("{} (clone)", base))
            .await
    }

    async fn generate_unique_name(&self, network_id: i32, base: &str) -> ScenarioResult<String> {
        if !self.name_taken(network_id, base).await? {
            return Ok(base.to_string());
        }
        let mut n = 2;
        loop {
            let candidate = format!("{} {}", base, n);
            if !self.name_taken(network_id, &candidate).await? {
                return Ok(candidate);
            }
            n += 1;
        }
    }

    /// All scenarios of a network as a parent-pointer arena.
    async fn load_scenario_chain(&self, network_id: i32) -> ScenarioResult<ParentChain> {
        let rows = scenarios::Entity::find()
            .filter(scenarios::Column::NetworkId.eq(network_id))
            .all(&self.db)
            .await?;
        let mut chain = ParentChain::new();
        for row in rows {
            chain.insert(row.id, row.parent_id);
        }
        Ok(chain)
    }

    /// Group memberships over a lineage, override by presence per group: the
    /// nearest scenario that defines any items for a group defines all of
    /// that group's items.
    async fn resolve_group_items(
        &self,
        lineage: &[i32],
    ) -> ScenarioResult<Vec<resource_group_items::Model>> {
        let all_items = resource_group_items::Entity::find()
            .filter(resource_group_items::Column::ScenarioId.is_in(lineage.to_vec()))
            .all(&self.db)
            .await?;
        let mut by_scenario: HashMap<i32, HashMap<i32, Vec<resource_group_items::Model>>> =
            HashMap::new();
        for item in all_items {
            by_scenario
                .entry(item.scenario_id)
                .or_default()
                .entry(item.group_id)
                .or_default()
                .push(item);
        }

        let effective = resolve_inherited(lineage, |sid| {
            by_scenario
                .remove(&sid)
                .unwrap_or_default()
                .into_iter()
                .collect()
        });

        let mut items: Vec<resource_group_items::Model> =
            effective.into_values().flatten().collect();
        items.sort_by_key(|i| i.id);
        Ok(items)
    }

    async fn validate_group_item_ref<C: ConnectionTrait>(
        &self,
        conn: &C,
        scenario: &scenarios::Model,
        item: &NewResourceGroupItem,
    ) -> ScenarioResult<()> {
        match item.ref_key {
            ResourceKind::Node => {
                let node_id = item.node_id.ok_or_else(|| {
                    ScenarioError::InvalidGroupItem("node item is missing node_id".to_string())
                })?;
                let node = nodes::Entity::find_by_id(node_id)
                    .one(conn)
                    .await?
                    .ok_or_else(|| {
                        ScenarioError::InvalidGroupItem(format!("node {} not found", node_id))
                    })?;
                if node.network_id != scenario.network_id {
                    return Err(ScenarioError::InvalidGroupItem(format!(
                        "node {} is not in network {}",
                        node_id, scenario.network_id
                    )));
                }
            }
            ResourceKind::Link => {
                let link_id = item.link_id.ok_or_else(|| {
                    ScenarioError::InvalidGroupItem("link item is missing link_id".to_string())
                })?;
                let link = links::Entity::find_by_id(link_id)
                    .one(conn)
                    .await?
                    .ok_or_else(|| {
                        ScenarioError::InvalidGroupItem(format!("link {} not found", link_id))
                    })?;
                if link.network_id != scenario.network_id {
                    return Err(ScenarioError::InvalidGroupItem(format!(
                        "link {} is not in network {}",
                        link_id, scenario.network_id
                    )));
                }
            }
            ResourceKind::Group => {
                let subgroup_id = item.subgroup_id.ok_or_else(|| {
                    ScenarioError::InvalidGroupItem(
                        "group item is missing subgroup_id".to_string(),
                    )
                })?;
                let subgroup = resource_groups::Entity::find_by_id(subgroup_id)
                    .one(conn)
                    .await?
                    .ok_or(ScenarioError::GroupNotFound(subgroup_id))?;
                if subgroup.network_id != scenario.network_id {
                    return Err(ScenarioError::InvalidGroupItem(format!(
                        "group {} is not in network {}",
                        subgroup_id, scenario.network_id
                    )));
                }
            }
            ResourceKind::Project | ResourceKind::Network => {
                return Err(ScenarioError::InvalidGroupItem(format!(
                    "'{}' cannot be a group member",
                    item.ref_key.as_str()
                )));
            }
        }
        Ok(())
    }
}

fn resource_fk_column(kind: ResourceKind) -> resource_attrs::Column {
    match kind {
        ResourceKind::Project => resource_attrs::Column::ProjectId,
        ResourceKind::Network => resource_attrs::Column::NetworkId,
        ResourceKind::Node => resource_attrs::Column::NodeId,
        ResourceKind::Link => resource_attrs::Column::LinkId,
        ResourceKind::Group => resource_attrs::Column::GroupId,
    }
}

/// Name lookup in both directions for the named resources of one network.
struct ResourceNameIndex {
    node_names: HashMap<i32, String>,
    link_names: HashMap<i32, String>,
    group_names: HashMap<i32, String>,
    node_ids: HashMap<String, i32>,
    link_ids: HashMap<String, i32>,
    group_ids: HashMap<String, i32>,
}

impl ResourceNameIndex {
    async fn load(db: &DatabaseConnection, network_id: i32) -> ScenarioResult<Self> {
        let node_rows = nodes::Entity::find()
            .filter(nodes::Column::NetworkId.eq(network_id))
            .all(db)
            .await?;
        let link_rows = links::Entity::find()
            .filter(links::Column::NetworkId.eq(network_id))
            .all(db)
            .await?;
        let group_rows = resource_groups::Entity::find()
            .filter(resource_groups::Column::NetworkId.eq(network_id))
            .all(db)
            .await?;

        let mut index = Self {
            node_names: HashMap::new(),
            link_names: HashMap::new(),
            group_names: HashMap::new(),
            node_ids: HashMap::new(),
            link_ids: HashMap::new(),
            group_ids: HashMap::new(),
        };
        for node in node_rows {
            index.node_ids.insert(node.name.clone(), node.id);
            index.node_names.insert(node.id, node.name);
        }
        for link in link_rows {
            index.link_ids.insert(link.name.clone(), link.id);
            index.link_names.insert(link.id, link.name);
        }
        for group in group_rows {
            index.group_ids.insert(group.name.clone(), group.id);
            index.group_names.insert(group.id, group.name);
        }
        Ok(index)
    }

    fn name_of(&self, kind: ResourceKind, resource_id: i32) -> Option<&str> {
        let names = match kind {
            ResourceKind::Node => &self.node_names,
            ResourceKind::Link => &self.link_names,
            ResourceKind::Group => &self.group_names,
            _ => return None,
        };
        names.get(&resource_id).map(String::as_str)
    }

    fn id_of(&self, kind: ResourceKind, name: &str) -> Option<i32> {
        let ids = match kind {
            ResourceKind::Node => &self.node_ids,
            ResourceKind::Link => &self.link_ids,
            ResourceKind::Group => &self.group_ids,
            _ => return None,
        };
        ids.get(name).copied()
    }
}

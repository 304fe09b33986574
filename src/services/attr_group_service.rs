//! Attribute grouping with per-network exclusivity
//!
//! Groups are declared per project; memberships are scoped to a network. An
//! exclusive group forbids its members from belonging to any other group in
//! the same network, in either direction: an attribute already in an
//! exclusive group cannot join a second group, and an exclusive group cannot
//! take an attribute that is in any other group.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::database::entities::{attr_group_items, attr_groups, attributes};
use crate::errors::{AttributeError, AttributeResult};
use crate::permissions::{PermissionChecker, PermissionScope};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewAttrGroup {
    pub project_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub layout: Option<String>,
    pub exclusive: bool,
}

/// One requested membership: attribute into group, within a network.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttrGroupItem {
    pub group_id: i32,
    pub attr_id: i32,
    pub network_id: i32,
}

#[derive(Clone)]
pub struct AttrGroupService {
    db: DatabaseConnection,
    permissions: Arc<dyn PermissionChecker>,
}

impl AttrGroupService {
    pub fn new(db: DatabaseConnection, permissions: Arc<dyn PermissionChecker>) -> Self {
        Self { db, permissions }
    }

    pub async fn add_attr_group(
        &self,
        user_id: i32,
        group: NewAttrGroup,
    ) -> AttributeResult<attr_groups::Model> {
        self.permissions
            .check_write(user_id, PermissionScope::Project(group.project_id))
            .await?;

        let conflict = attr_groups::Entity::find()
            .filter(attr_groups::Column::ProjectId.eq(group.project_id))
            .filter(attr_groups::Column::Name.eq(group.name.as_str()))
            .one(&self.db)
            .await?;
        if conflict.is_some() {
            return Err(AttributeError::GroupNameConflict {
                project_id: group.project_id,
                name: group.name,
            });
        }

        let active = attr_groups::ActiveModel {
            project_id: Set(group.project_id),
            name: Set(group.name),
            description: Set(group.description),
            layout: Set(group.layout),
            exclusive: Set(group.exclusive),
            ..Default::default()
        };
        let created = active.insert(&self.db).await?;
        info!(group_id = created.id, name = %created.name, "created attribute group");
        Ok(created)
    }

    pub async fn get_attr_group(&self, group_id: i32) -> AttributeResult<attr_groups::Model> {
        attr_groups::Entity::find_by_id(group_id)
            .one(&self.db)
            .await?
            .ok_or(AttributeError::GroupNotFound(group_id))
    }

    pub async fn get_attr_groups(
        &self,
        project_id: i32,
    ) -> AttributeResult<Vec<attr_groups::Model>> {
        Ok(attr_groups::Entity::find()
            .filter(attr_groups::Column::ProjectId.eq(project_id))
            .all(&self.db)
            .await?)
    }

    pub async fn update_attr_group(
        &self,
        user_id: i32,
        group_id: i32,
        group: NewAttrGroup,
    ) -> AttributeResult<attr_groups::Model> {
        let existing = self.get_attr_group(group_id).await?;
        self.permissions
            .check_write(user_id, PermissionScope::Project(existing.project_id))
            .await?;

        let mut active: attr_groups::ActiveModel = existing.into();
        active.name = Set(group.name);
        active.description = Set(group.description);
        active.layout = Set(group.layout);
        active.exclusive = Set(group.exclusive);
        Ok(active.update(&self.db).await?)
    }

    pub async fn delete_attr_group(&self, user_id: i32, group_id: i32) -> AttributeResult<()> {
        let existing = self.get_attr_group(group_id).await?;
        self.permissions
            .check_write(user_id, PermissionScope::Project(existing.project_id))
            .await?;
        attr_groups::Entity::delete_by_id(group_id)
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Add a batch of group memberships, enforcing exclusivity.
    ///
    /// The current memberships of every network in the batch are loaded once
    /// up front; each validated item then extends that lookup so a conflict
    /// between two items of the same call is caught as well.
    pub async fn add_attr_group_items(
        &self,
        user_id: i32,
        items: Vec<AttrGroupItem>,
    ) -> AttributeResult<Vec<attr_group_items::Model>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let network_ids: HashSet<i32> = items.iter().map(|i| i.network_id).collect();
        for network_id in &network_ids {
            self.permissions
                .check_write(user_id, PermissionScope::Network(*network_id))
                .await?;
        }

        for item in &items {
            attributes::Entity::find_by_id(item.attr_id)
                .one(&self.db)
                .await?
                .ok_or(AttributeError::NotFound(item.attr_id))?;
        }

        // exclusivity flag of every group in play, existing or requested
        let exclusive_by_group: HashMap<i32, bool> = attr_groups::Entity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|g| (g.id, g.exclusive))
            .collect();
        for item in &items {
            if !exclusive_by_group.contains_key(&item.group_id) {
                return Err(AttributeError::GroupNotFound(item.group_id));
            }
        }

        // one lookup per batch: (network, attr) -> groups it belongs to
        let existing_items = attr_group_items::Entity::find()
            .filter(
                attr_group_items::Column::NetworkId.is_in(network_ids.iter().copied()),
            )
            .all(&self.db)
            .await?;
        let mut memberships: HashMap<(i32, i32), HashSet<i32>> = HashMap::new();
        for row in &existing_items {
            memberships
                .entry((row.network_id, row.attr_id))
                .or_default()
                .insert(row.group_id);
        }

        let txn = self.db.begin().await?;
        let mut created = Vec::new();
        for item in items {
            let current = memberships
                .entry((item.network_id, item.attr_id))
                .or_default();

            if current.contains(&item.group_id) {
                // already a member, nothing to do
                continue;
            }

            let target_exclusive = exclusive_by_group
                .get(&item.group_id)
                .copied()
                .unwrap_or(false);

            if let Some(held) = current
                .iter()
                .find(|g| exclusive_by_group.get(g).copied().unwrap_or(false))
            {
                return Err(AttributeError::ExclusiveGroup {
                    attr_id: item.attr_id,
                    group_id: item.group_id,
                    network_id: item.network_id,
                    reason: format!("attribute is already in exclusive group {}", held),
                });
            }
            if target_exclusive && !current.is_empty() {
                return Err(AttributeError::ExclusiveGroup {
                    attr_id: item.attr_id,
                    group_id: item.group_id,
                    network_id: item.network_id,
                    reason: "target group is exclusive and the attribute is already grouped"
                        .to_string(),
                });
            }

            let active = attr_group_items::ActiveModel {
                group_id: Set(item.group_id),
                attr_id: Set(item.attr_id),
                network_id: Set(item.network_id),
            };
            created.push(active.insert(&txn).await?);
            current.insert(item.group_id);
        }
        txn.commit().await?;

        debug!(created = created.len(), "added attribute group items");
        Ok(created)
    }

    pub async fn delete_attr_group_items(
        &self,
        user_id: i32,
        items: Vec<AttrGroupItem>,
    ) -> AttributeResult<()> {
        let network_ids: HashSet<i32> = items.iter().map(|i| i.network_id).collect();
        for network_id in network_ids {
            self.permissions
                .check_write(user_id, PermissionScope::Network(network_id))
                .await?;
        }

        let txn = self.db.begin().await?;
        for item in items {
            attr_group_items::Entity::delete_many()
                .filter(attr_group_items::Column::GroupId.eq(item.group_id))
                .filter(attr_group_items::Column::AttrId.eq(item.attr_id))
                .filter(attr_group_items::Column::NetworkId.eq(item.network_id))
                .exec(&txn)
                .await?;
        }
        txn.commit().await?;
        Ok(())
    }

    /// All memberships in one network.
    pub async fn get_network_attr_group_items(
        &self,
        user_id: i32,
        network_id: i32,
    ) -> AttributeResult<Vec<attr_group_items::Model>> {
        self.permissions
            .check_read(user_id, PermissionScope::Network(network_id))
            .await?;
        Ok(attr_group_items::Entity::find()
            .filter(attr_group_items::Column::NetworkId.eq(network_id))
            .all(&self.db)
            .await?)
    }
}

//! Attribute definitions, resource attachment, and cross-network mapping
//!
//! Attributes are global (name, dimension) definitions; attaching one to a
//! resource creates a `resource_attrs` row carrying the `ref_key`
//! discriminator and exactly one resource foreign key. Mapping rows relate
//! resource attributes across networks and are undirected.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use tracing::{debug, info};

use crate::database::entities::common_types::ResourceKind;
use crate::database::entities::{
    attributes, links, networks, nodes, projects, resource_attr_maps, resource_attrs,
    resource_groups, template_types, type_attrs,
};
use crate::errors::{AttributeError, AttributeResult};
use crate::hierarchy::{resolve_inherited, ParentChain};
use crate::permissions::{PermissionChecker, PermissionScope};

#[derive(Clone)]
pub struct AttributeService {
    db: DatabaseConnection,
    permissions: Arc<dyn PermissionChecker>,
}

impl AttributeService {
    pub fn new(db: DatabaseConnection, permissions: Arc<dyn PermissionChecker>) -> Self {
        Self { db, permissions }
    }

    /// Create a global attribute definition, or return the existing row with
    /// the same (name, dimension).
    pub async fn add_attribute(
        &self,
        name: &str,
        dimension_id: Option<i32>,
        description: Option<&str>,
    ) -> AttributeResult<attributes::Model> {
        if let Some(existing) = self
            .get_attribute_by_name_and_dimension(name, dimension_id)
            .await?
        {
            return Ok(existing);
        }

        let attribute = attributes::ActiveModel {
            name: Set(name.to_string()),
            dimension_id: Set(dimension_id),
            description: Set(description.map(str::to_string)),
            ..Default::default()
        };

        let attribute = attribute.insert(&self.db).await?;
        info!(attr_id = attribute.id, name = %attribute.name, "created attribute");
        Ok(attribute)
    }

    pub async fn get_attribute(&self, attr_id: i32) -> AttributeResult<attributes::Model> {
        attributes::Entity::find_by_id(attr_id)
            .one(&self.db)
            .await?
            .ok_or(AttributeError::NotFound(attr_id))
    }

    pub async fn get_attributes(&self) -> AttributeResult<Vec<attributes::Model>> {
        Ok(attributes::Entity::find().all(&self.db).await?)
    }

    pub async fn get_attribute_by_name_and_dimension(
        &self,
        name: &str,
        dimension_id: Option<i32>,
    ) -> AttributeResult<Option<attributes::Model>> {
        let mut query = attributes::Entity::find().filter(attributes::Column::Name.eq(name));
        query = match dimension_id {
            Some(dim) => query.filter(attributes::Column::DimensionId.eq(dim)),
            None => query.filter(attributes::Column::DimensionId.is_null()),
        };
        Ok(query.one(&self.db).await?)
    }

    /// Attach an attribute to a resource.
    ///
    /// With `error_on_duplicate`, a second attachment of the same attribute
    /// fails; otherwise the existing row is returned unchanged.
    pub async fn add_resource_attribute(
        &self,
        user_id: i32,
        resource_type: ResourceKind,
        resource_id: i32,
        attr_id: i32,
        is_var: bool,
        error_on_duplicate: bool,
    ) -> AttributeResult<resource_attrs::Model> {
        self.get_attribute(attr_id).await?;
        let network_scope = self.assert_resource_exists(resource_type, resource_id).await?;
        self.check_resource_write(user_id, network_scope, resource_id)
            .await?;

        if let Some(existing) = self
            .find_resource_attr(resource_type, resource_id, attr_id)
            .await?
        {
            if error_on_duplicate {
                return Err(AttributeError::Duplicate {
                    attr_id,
                    resource_type: resource_type.as_str().to_string(),
                    resource_id,
                });
            }
            return Ok(existing);
        }

        let resource_attr = self
            .new_resource_attr(resource_type, resource_id, attr_id, is_var)
            .insert(&self.db)
            .await?;
        debug!(
            resource_attr_id = resource_attr.id,
            attr_id,
            ref_key = resource_type.as_str(),
            resource_id,
            "attached attribute to resource"
        );
        Ok(resource_attr)
    }

    /// All attribute attachments on one resource.
    pub async fn get_resource_attributes(
        &self,
        resource_type: ResourceKind,
        resource_id: i32,
    ) -> AttributeResult<Vec<resource_attrs::Model>> {
        Ok(resource_attrs::Entity::find()
            .filter(resource_attrs::Column::RefKey.eq(resource_type.as_str()))
            .filter(Self::resource_fk_column(resource_type).eq(resource_id))
            .all(&self.db)
            .await?)
    }

    pub async fn delete_resource_attribute(&self, resource_attr_id: i32) -> AttributeResult<()> {
        let result = resource_attrs::Entity::delete_by_id(resource_attr_id)
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(AttributeError::ResourceAttrNotFound(resource_attr_id));
        }
        Ok(())
    }

    /// Apply the attribute set declared by a template type to a resource,
    /// creating only the attachments the resource does not already have.
    /// Type attrs are inherited along the template-type parent chain, child
    /// declarations shadowing parent ones. Idempotent.
    pub async fn add_resource_attrs_from_type(
        &self,
        user_id: i32,
        type_id: i32,
        resource_type: ResourceKind,
        resource_id: i32,
    ) -> AttributeResult<Vec<resource_attrs::Model>> {
        template_types::Entity::find_by_id(type_id)
            .one(&self.db)
            .await?
            .ok_or(AttributeError::TypeNotFound(type_id))?;
        let network_scope = self.assert_resource_exists(resource_type, resource_id).await?;
        self.check_resource_write(user_id, network_scope, resource_id)
            .await?;

        let declared = self.resolve_type_attrs(type_id).await?;

        let existing: HashSet<i32> = self
            .get_resource_attributes(resource_type, resource_id)
            .await?
            .into_iter()
            .map(|ra| ra.attr_id)
            .collect();

        let mut created = Vec::new();
        for (attr_id, type_attr) in declared {
            if existing.contains(&attr_id) {
                continue;
            }
            let resource_attr = self
                .new_resource_attr(resource_type, resource_id, attr_id, type_attr.attr_is_var)
                .insert(&self.db)
                .await?;
            created.push(resource_attr);
        }

        info!(
            type_id,
            resource_id,
            created = created.len(),
            "applied type attributes to resource"
        );
        Ok(created)
    }

    /// The effective attribute declarations of a template type, resolved over
    /// its parent chain.
    async fn resolve_type_attrs(
        &self,
        type_id: i32,
    ) -> AttributeResult<HashMap<i32, type_attrs::Model>> {
        let all_types = template_types::Entity::find().all(&self.db).await?;
        let mut chain = ParentChain::new();
        for tt in &all_types {
            chain.insert(tt.id, tt.parent_id);
        }
        let lineage = chain.lineage(type_id);

        let declarations = type_attrs::Entity::find()
            .filter(type_attrs::Column::TypeId.is_in(lineage.clone()))
            .all(&self.db)
            .await?;
        let mut by_type: HashMap<i32, Vec<(i32, type_attrs::Model)>> = HashMap::new();
        for ta in declarations {
            by_type.entry(ta.type_id).or_default().push((ta.attr_id, ta));
        }

        Ok(resolve_inherited(&lineage, |tid| {
            by_type.remove(&tid).unwrap_or_default()
        }))
    }

    /// Record an equivalence between two resource attributes, usually in
    /// different networks. The pair is undirected; setting (a, b) when (b, a)
    /// exists returns the existing row.
    pub async fn set_attribute_mapping(
        &self,
        user_id: i32,
        resource_attr_a_id: i32,
        resource_attr_b_id: i32,
    ) -> AttributeResult<resource_attr_maps::Model> {
        if resource_attr_a_id == resource_attr_b_id {
            return Err(AttributeError::InvalidMapping(
                "cannot map a resource attribute to itself".to_string(),
            ));
        }

        let ra_a = self.get_resource_attr(resource_attr_a_id).await?;
        let ra_b = self.get_resource_attr(resource_attr_b_id).await?;
        let network_a_id = self.network_of_resource_attr(&ra_a).await?;
        let network_b_id = self.network_of_resource_attr(&ra_b).await?;

        self.permissions
            .check_write(user_id, PermissionScope::Network(network_a_id))
            .await?;
        self.permissions
            .check_write(user_id, PermissionScope::Network(network_b_id))
            .await?;

        if let Some(existing) = self
            .find_mapping(resource_attr_a_id, resource_attr_b_id)
            .await?
        {
            return Ok(existing);
        }

        let mapping = resource_attr_maps::ActiveModel {
            resource_attr_a_id: Set(resource_attr_a_id),
            resource_attr_b_id: Set(resource_attr_b_id),
            network_a_id: Set(network_a_id),
            network_b_id: Set(network_b_id),
        };
        let mapping = mapping.insert(&self.db).await?;
        debug!(
            resource_attr_a_id,
            resource_attr_b_id, "created attribute mapping"
        );
        Ok(mapping)
    }

    /// Delete a mapping, treating (a, b) and (b, a) as the same row.
    pub async fn delete_attribute_mapping(
        &self,
        user_id: i32,
        resource_attr_a_id: i32,
        resource_attr_b_id: i32,
    ) -> AttributeResult<()> {
        let mapping = self
            .find_mapping(resource_attr_a_id, resource_attr_b_id)
            .await?
            .ok_or_else(|| {
                AttributeError::InvalidMapping(format!(
                    "no mapping between resource attributes {} and {}",
                    resource_attr_a_id, resource_attr_b_id
                ))
            })?;

        self.permissions
            .check_write(user_id, PermissionScope::Network(mapping.network_a_id))
            .await?;

        resource_attr_maps::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(
                        Condition::all()
                            .add(
                                resource_attr_maps::Column::ResourceAttrAId
                                    .eq(resource_attr_a_id),
                            )
                            .add(
                                resource_attr_maps::Column::ResourceAttrBId
                                    .eq(resource_attr_b_id),
                            ),
                    )
                    .add(
                        Condition::all()
                            .add(
                                resource_attr_maps::Column::ResourceAttrAId
                                    .eq(resource_attr_b_id),
                            )
                            .add(
                                resource_attr_maps::Column::ResourceAttrBId
                                    .eq(resource_attr_a_id),
                            ),
                    ),
            )
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// All mappings touching a network, whichever side it is on.
    pub async fn get_mappings_in_network(
        &self,
        user_id: i32,
        network_id: i32,
    ) -> AttributeResult<Vec<resource_attr_maps::Model>> {
        self.permissions
            .check_read(user_id, PermissionScope::Network(network_id))
            .await?;
        Ok(resource_attr_maps::Entity::find()
            .filter(
                Condition::any()
                    .add(resource_attr_maps::Column::NetworkAId.eq(network_id))
                    .add(resource_attr_maps::Column::NetworkBId.eq(network_id)),
            )
            .all(&self.db)
            .await?)
    }

    /// All mappings touching a resource attribute, whichever side it is on.
    pub async fn get_attribute_mappings(
        &self,
        resource_attr_id: i32,
    ) -> AttributeResult<Vec<resource_attr_maps::Model>> {
        Ok(resource_attr_maps::Entity::find()
            .filter(
                Condition::any()
                    .add(resource_attr_maps::Column::ResourceAttrAId.eq(resource_attr_id))
                    .add(resource_attr_maps::Column::ResourceAttrBId.eq(resource_attr_id)),
            )
            .all(&self.db)
            .await?)
    }

    pub async fn get_resource_attr(
        &self,
        resource_attr_id: i32,
    ) -> AttributeResult<resource_attrs::Model> {
        resource_attrs::Entity::find_by_id(resource_attr_id)
            .one(&self.db)
            .await?
            .ok_or(AttributeError::ResourceAttrNotFound(resource_attr_id))
    }

    async fn find_mapping(
        &self,
        a: i32,
        b: i32,
    ) -> AttributeResult<Option<resource_attr_maps::Model>> {
        Ok(resource_attr_maps::Entity::find()
            .filter(
                Condition::any()
                    .add(
                        Condition::all()
                            .add(resource_attr_maps::Column::ResourceAttrAId.eq(a))
                            .add(resource_attr_maps::Column::ResourceAttrBId.eq(b)),
                    )
                    .add(
                        Condition::all()
                            .add(resource_attr_maps::Column::ResourceAttrAId.eq(b))
                            .add(resource_attr_maps::Column::ResourceAttrBId.eq(a)),
                    ),
            )
            .one(&self.db)
            .await?)
    }

    async fn find_resource_attr(
        &self,
        resource_type: ResourceKind,
        resource_id: i32,
        attr_id: i32,
    ) -> AttributeResult<Option<resource_attrs::Model>> {
        Ok(resource_attrs::Entity::find()
            .filter(resource_attrs::Column::RefKey.eq(resource_type.as_str()))
            .filter(Self::resource_fk_column(resource_type).eq(resource_id))
            .filter(resource_attrs::Column::AttrId.eq(attr_id))
            .one(&self.db)
            .await?)
    }

    fn resource_fk_column(resource_type: ResourceKind) -> resource_attrs::Column {
        match resource_type {
            ResourceKind::Project => resource_attrs::Column::ProjectId,
            ResourceKind::Network => resource_attrs::Column::NetworkId,
            ResourceKind::Node => resource_attrs::Column::NodeId,
            ResourceKind::Link => resource_attrs::Column::LinkId,
            ResourceKind::Group => resource_attrs::Column::GroupId,
        }
    }

    fn new_resource_attr(
        &self,
        resource_type: ResourceKind,
        resource_id: i32,
        attr_id: i32,
        is_var: bool,
    ) -> resource_attrs::ActiveModel {
        let mut active = resource_attrs::ActiveModel {
            attr_id: Set(attr_id),
            ref_key: Set(resource_type.as_str().to_string()),
            project_id: Set(None),
            network_id: Set(None),
            node_id: Set(None),
            link_id: Set(None),
            group_id: Set(None),
            attr_is_var: Set(is_var),
            ..Default::default()
        };
        match resource_type {
            ResourceKind::Project => active.project_id = Set(Some(resource_id)),
            ResourceKind::Network => active.network_id = Set(Some(resource_id)),
            ResourceKind::Node => active.node_id = Set(Some(resource_id)),
            ResourceKind::Link => active.link_id = Set(Some(resource_id)),
            ResourceKind::Group => active.group_id = Set(Some(resource_id)),
        }
        active
    }

    /// Write check against the scope `assert_resource_exists` resolved: the
    /// owning network, or the project itself for project-scoped resources.
    async fn check_resource_write(
        &self,
        user_id: i32,
        network_scope: Option<i32>,
        resource_id: i32,
    ) -> AttributeResult<()> {
        let scope = match network_scope {
            Some(network_id) => PermissionScope::Network(network_id),
            None => PermissionScope::Project(resource_id),
        };
        self.permissions.check_write(user_id, scope).await?;
        Ok(())
    }

    /// Confirm the referenced resource exists; returns the owning network id
    /// for network-scoped resources, None for projects.
    async fn assert_resource_exists(
        &self,
        resource_type: ResourceKind,
        resource_id: i32,
    ) -> AttributeResult<Option<i32>> {
        let not_found = || AttributeError::ResourceNotFound {
            resource_type: resource_type.as_str().to_string(),
            resource_id,
        };
        match resource_type {
            ResourceKind::Project => {
                projects::Entity::find_by_id(resource_id)
                    .one(&self.db)
                    .await?
                    .ok_or_else(not_found)?;
                Ok(None)
            }
            ResourceKind::Network => {
                networks::Entity::find_by_id(resource_id)
                    .one(&self.db)
                    .await?
                    .ok_or_else(not_found)?;
                Ok(Some(resource_id))
            }
            ResourceKind::Node => {
                let node = nodes::Entity::find_by_id(resource_id)
                    .one(&self.db)
                    .await?
                    .ok_or_else(not_found)?;
                Ok(Some(node.network_id))
            }
            ResourceKind::Link => {
                let link = links::Entity::find_by_id(resource_id)
                    .one(&self.db)
                    .await?
                    .ok_or_else(not_found)?;
                Ok(Some(link.network_id))
            }
            ResourceKind::Group => {
                let group = resource_groups::Entity::find_by_id(resource_id)
                    .one(&self.db)
                    .await?
                    .ok_or_else(not_found)?;
                Ok(Some(group.network_id))
            }
        }
    }

    /// The network a resource attribute is scoped to, via its resource.
    pub(crate) async fn network_of_resource_attr(
        &self,
        resource_attr: &resource_attrs::Model,
    ) -> AttributeResult<i32> {
        let kind = ResourceKind::parse(&resource_attr.ref_key)?;
        let missing = || AttributeError::ResourceAttrNotFound(resource_attr.id);
        match kind {
            ResourceKind::Project => Err(AttributeError::InvalidMapping(format!(
                "resource attribute {} is project-scoped and has no network",
                resource_attr.id
            ))),
            ResourceKind::Network => resource_attr.network_id.ok_or_else(missing),
            ResourceKind::Node => {
                let node_id = resource_attr.node_id.ok_or_else(missing)?;
                let node = nodes::Entity::find_by_id(node_id)
                    .one(&self.db)
                    .await?
                    .ok_or_else(missing)?;
                Ok(node.network_id)
            }
            ResourceKind::Link => {
                let link_id = resource_attr.link_id.ok_or_else(missing)?;
                let link = links::Entity::find_by_id(link_id)
                    .one(&self.db)
                    .await?
                    .ok_or_else(missing)?;
                Ok(link.network_id)
            }
            ResourceKind::Group => {
                let group_id = resource_attr.group_id.ok_or_else(missing)?;
                let group = resource_groups::Entity::find_by_id(group_id)
                    .one(&self.db)
                    .await?
                    .ok_or_else(missing)?;
                Ok(group.network_id)
            }
        }
    }
}

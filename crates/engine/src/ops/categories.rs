use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
    sea_query::{Expr, OnConflict},
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    Category, Direction, EngineError, ResultEngine, UpdateCategoryCmd, budgets,
    categories::{self, SystemCategory},
    transactions,
    util::{normalize_name_key, normalize_required_name},
};

use super::{Engine, with_tx};

impl Engine {
    /// Creates a category for `owner`.
    ///
    /// The same name may exist once per direction. A parent must belong to the
    /// same owner; the hierarchy is informational only.
    pub async fn new_category(
        &self,
        owner: &str,
        name: &str,
        direction: Direction,
        parent_id: Option<Uuid>,
    ) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "category")?;
        let name_norm = normalize_name_key(&name);

        with_tx!(self, |db_tx| {
            self.require_user_exists(&db_tx, owner).await?;
            if let Some(parent_id) = parent_id {
                self.require_owned::<categories::Entity>(&db_tx, parent_id, owner)
                    .await?;
            }
            if self
                .find_category_by_key(&db_tx, owner, &name_norm, direction)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(name));
            }

            let id = Uuid::new_v4();
            let now = Utc::now();
            categories::ActiveModel {
                id: ActiveValue::Set(id),
                owner: ActiveValue::Set(owner.to_string()),
                name: ActiveValue::Set(name),
                name_norm: ActiveValue::Set(name_norm),
                direction: ActiveValue::Set(direction.as_str().to_string()),
                parent_id: ActiveValue::Set(parent_id),
                is_system: ActiveValue::Set(false),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;
            Ok(id)
        })
    }

    pub async fn category(&self, owner: &str, category_id: Uuid) -> ResultEngine<Category> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_owned::<categories::Entity>(&db_tx, category_id, owner)
                .await?;
            Category::try_from(model)
        })
    }

    /// All categories of `owner`, system ones included, ordered by name.
    pub async fn categories(&self, owner: &str) -> ResultEngine<Vec<Category>> {
        with_tx!(self, |db_tx| {
            let models = categories::Entity::find()
                .filter(categories::Column::Owner.eq(owner))
                .order_by_asc(categories::Column::NameNorm)
                .order_by_asc(categories::Column::Direction)
                .all(&db_tx)
                .await?;
            models.into_iter().map(Category::try_from).collect()
        })
    }

    /// Renames a category or moves it in the hierarchy.
    ///
    /// Engine-managed categories cannot be edited. A parent that would make
    /// the category its own ancestor is refused.
    pub async fn update_category(&self, cmd: UpdateCategoryCmd) -> ResultEngine<Category> {
        let name = cmd
            .name
            .as_deref()
            .map(|name| normalize_required_name(name, "category"))
            .transpose()?;

        with_tx!(self, |db_tx| {
            let model = self
                .require_owned_locked::<categories::Entity>(&db_tx, cmd.category_id, &cmd.owner)
                .await?;
            if model.is_system {
                return Err(EngineError::InvalidCategory(format!(
                    "system category {} cannot be edited",
                    model.name
                )));
            }
            let direction = model.direction()?;

            let mut active = categories::ActiveModel::from(model);
            if let Some(name) = name {
                let name_norm = normalize_name_key(&name);
                if let Some(existing) = self
                    .find_category_by_key(&db_tx, &cmd.owner, &name_norm, direction)
                    .await?
                    && existing.id != cmd.category_id
                {
                    return Err(EngineError::ExistingKey(existing.name));
                }
                active.name = ActiveValue::Set(name);
                active.name_norm = ActiveValue::Set(name_norm);
            }
            if let Some(parent_id) = cmd.parent_id {
                if let Some(parent_id) = parent_id {
                    self.ensure_acyclic_parent(&db_tx, &cmd.owner, cmd.category_id, parent_id)
                        .await?;
                }
                active.parent_id = ActiveValue::Set(parent_id);
            }
            active.updated_at = ActiveValue::Set(Utc::now());
            let model = active.update(&db_tx).await?;
            Category::try_from(model)
        })
    }

    /// Deletes a category no transaction is booked under.
    ///
    /// Children are detached and budgets on the category are removed with it.
    pub async fn delete_category(&self, owner: &str, category_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_owned_locked::<categories::Entity>(&db_tx, category_id, owner)
                .await?;
            let booked = transactions::Entity::find()
                .filter(transactions::Column::CategoryId.eq(category_id))
                .count(&db_tx)
                .await?;
            if booked > 0 {
                return Err(EngineError::ResourceInUse(format!(
                    "category {} has {booked} transactions",
                    model.name
                )));
            }

            categories::Entity::update_many()
                .col_expr(categories::Column::ParentId, Expr::value(Option::<Uuid>::None))
                .filter(categories::Column::ParentId.eq(category_id))
                .exec(&db_tx)
                .await?;
            budgets::Entity::delete_many()
                .filter(budgets::Column::CategoryId.eq(category_id))
                .exec(&db_tx)
                .await?;
            categories::Entity::delete_by_id(category_id)
                .exec(&db_tx)
                .await?;

            debug!(%category_id, "category deleted");
            Ok(())
        })
    }

    /// Walks up from `parent_id` and refuses the edit if it reaches
    /// `category_id`.
    async fn ensure_acyclic_parent(
        &self,
        db_tx: &DatabaseTransaction,
        owner: &str,
        category_id: Uuid,
        parent_id: Uuid,
    ) -> ResultEngine<()> {
        let mut seen = HashSet::new();
        let mut next = Some(
            self.require_owned::<categories::Entity>(db_tx, parent_id, owner)
                .await?,
        );
        while let Some(ancestor) = next {
            if ancestor.id == category_id {
                return Err(EngineError::InvalidCategory(
                    "a category cannot be its own ancestor".to_string(),
                ));
            }
            if !seen.insert(ancestor.id) {
                break;
            }
            next = match ancestor.parent_id {
                Some(id) => categories::Entity::find_by_id(id).one(db_tx).await?,
                None => None,
            };
        }
        Ok(())
    }

    async fn find_category_by_key(
        &self,
        db_tx: &DatabaseTransaction,
        owner: &str,
        name_norm: &str,
        direction: Direction,
    ) -> ResultEngine<Option<categories::Model>> {
        categories::Entity::find()
            .filter(categories::Column::Owner.eq(owner))
            .filter(categories::Column::NameNorm.eq(name_norm))
            .filter(categories::Column::Direction.eq(direction.as_str()))
            .one(db_tx)
            .await
            .map_err(Into::into)
    }

    /// Returns the engine-managed category of `kind`, creating it on first use.
    ///
    /// Concurrent first uses race on the unique `(owner, name_norm, direction)`
    /// index; the loser's insert is a no-op and both read the same row.
    pub(super) async fn system_category(
        &self,
        db_tx: &DatabaseTransaction,
        owner: &str,
        kind: SystemCategory,
    ) -> ResultEngine<categories::Model> {
        let name_norm = normalize_name_key(kind.name());
        let direction = kind.direction();
        if let Some(model) = self
            .find_category_by_key(db_tx, owner, &name_norm, direction)
            .await?
        {
            return Ok(model);
        }

        let now = Utc::now();
        let active = categories::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            owner: ActiveValue::Set(owner.to_string()),
            name: ActiveValue::Set(kind.name().to_string()),
            name_norm: ActiveValue::Set(name_norm.clone()),
            direction: ActiveValue::Set(direction.as_str().to_string()),
            parent_id: ActiveValue::Set(None),
            is_system: ActiveValue::Set(true),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };
        categories::Entity::insert(active)
            .on_conflict(
                OnConflict::columns([
                    categories::Column::Owner,
                    categories::Column::NameNorm,
                    categories::Column::Direction,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db_tx)
            .await?;

        self.find_category_by_key(db_tx, owner, &name_norm, direction)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("category {}", kind.name())))
    }
}

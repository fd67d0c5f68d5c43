use sea_orm::{DatabaseTransaction, QuerySelect, Select, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, accounts, budgets, categories, transactions, users};

use super::Engine;

/// An entity whose rows belong to a single owner.
pub(super) trait OwnedResource: EntityTrait {
    /// Name used in error messages.
    const LABEL: &'static str;

    fn by_id(id: Uuid) -> Select<Self>;

    fn owner_of(model: &Self::Model) -> &str;
}

/// Implements [`OwnedResource`] for an entity module with an `owner` column.
macro_rules! impl_owned_resource {
    ($module:ident, $label:literal) => {
        impl OwnedResource for $module::Entity {
            const LABEL: &'static str = $label;

            fn by_id(id: Uuid) -> Select<Self> {
                Self::find_by_id(id)
            }

            fn owner_of(model: &Self::Model) -> &str {
                model.owner.as_str()
            }
        }
    };
}

impl_owned_resource!(accounts, "account");
impl_owned_resource!(categories, "category");
impl_owned_resource!(transactions, "transaction");
impl_owned_resource!(budgets, "budget");

fn check_owner<E: OwnedResource>(
    model: Option<E::Model>,
    id: Uuid,
    owner: &str,
) -> ResultEngine<E::Model> {
    let model = model.ok_or_else(|| EngineError::KeyNotFound(format!("{} {id}", E::LABEL)))?;
    if E::owner_of(&model) != owner {
        return Err(EngineError::OwnershipViolation(format!(
            "{} {id} belongs to another owner",
            E::LABEL
        )));
    }
    Ok(model)
}

impl Engine {
    pub(super) async fn require_user_exists(
        &self,
        db: &DatabaseTransaction,
        username: &str,
    ) -> ResultEngine<()> {
        users::Entity::find_by_id(username.to_string())
            .one(db)
            .await?
            .map(|_| ())
            .ok_or_else(|| EngineError::KeyNotFound(format!("user {username}")))
    }

    /// Loads a row and checks it belongs to `owner`.
    ///
    /// Unknown ids are `KeyNotFound`, rows of another owner are
    /// `OwnershipViolation`.
    pub(super) async fn require_owned<E: OwnedResource>(
        &self,
        db: &DatabaseTransaction,
        id: Uuid,
        owner: &str,
    ) -> ResultEngine<E::Model> {
        let model = E::by_id(id).one(db).await?;
        check_owner::<E>(model, id, owner)
    }

    /// Same as [`Engine::require_owned`], reading the row for update.
    pub(super) async fn require_owned_locked<E: OwnedResource>(
        &self,
        db: &DatabaseTransaction,
        id: Uuid,
        owner: &str,
    ) -> ResultEngine<E::Model> {
        let model = E::by_id(id).lock_exclusive().one(db).await?;
        check_owner::<E>(model, id, owner)
    }
}

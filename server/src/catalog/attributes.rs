use diesel::prelude::*;
use std::collections::BTreeSet;

use crate::error::ApiError;
use crate::models::{Attribute, NewIngredient, NewTag};
use crate::schema::{ingredients, recipe_ingredients, recipe_tags, recipes, tags};

/// The two kinds of named labels a recipe can be linked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Tag,
    Ingredient,
}

impl AttributeKind {
    pub fn label(self) -> &'static str {
        match self {
            AttributeKind::Tag => "Tag",
            AttributeKind::Ingredient => "Ingredient",
        }
    }

    /// Name of the recipe field holding links of this kind.
    pub fn field(self) -> &'static str {
        match self {
            AttributeKind::Tag => "tags",
            AttributeKind::Ingredient => "ingredients",
        }
    }
}

/// Owner-scoped listing over one attribute table and its recipe link table.
/// The assigned-only restriction is a semi-join, so rows never repeat.
macro_rules! scoped_list {
    ($conn:expr, $table:ident, $links:ident, $link_column:ident, $owner:expr, $assigned_only:expr) => {{
        let mut query = $table::table
            .filter($table::user_id.eq($owner))
            .select(($table::id, $table::user_id, $table::name))
            .into_boxed();

        if $assigned_only {
            let assigned = $links::table
                .inner_join(recipes::table)
                .filter(recipes::user_id.eq($owner))
                .select($links::$link_column);
            query = query.filter($table::id.eq_any(assigned));
        }

        query
            .order(($table::name.desc(), $table::id.desc()))
            .load::<Attribute>($conn)
    }};
}

/// List the owner's tags or ingredients ordered by name, descending.
pub fn list_attributes(
    conn: &mut SqliteConnection,
    kind: AttributeKind,
    owner: i32,
    assigned_only: bool,
) -> QueryResult<Vec<Attribute>> {
    match kind {
        AttributeKind::Tag => {
            scoped_list!(conn, tags, recipe_tags, tag_id, owner, assigned_only)
        }
        AttributeKind::Ingredient => scoped_list!(
            conn,
            ingredients,
            recipe_ingredients,
            ingredient_id,
            owner,
            assigned_only
        ),
    }
}

/// Create a tag or ingredient owned by `owner`.
pub fn create_attribute(
    conn: &mut SqliteConnection,
    kind: AttributeKind,
    owner: i32,
    name: &str,
) -> Result<Attribute, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("name", "This field may not be blank"));
    }

    let created = match kind {
        AttributeKind::Tag => diesel::insert_into(tags::table)
            .values(NewTag {
                user_id: owner,
                name,
            })
            .returning((tags::id, tags::user_id, tags::name))
            .get_result::<Attribute>(conn)?,
        AttributeKind::Ingredient => diesel::insert_into(ingredients::table)
            .values(NewIngredient {
                user_id: owner,
                name,
            })
            .returning((ingredients::id, ingredients::user_id, ingredients::name))
            .get_result::<Attribute>(conn)?,
    };

    tracing::debug!(kind = kind.label(), id = created.id, "created attribute");
    Ok(created)
}

/// Check that every id names an attribute owned by `owner`.
///
/// Returns the ids deduplicated and sorted, or a validation error naming the
/// first id that doesn't exist for this owner.
pub fn owned_ids(
    conn: &mut SqliteConnection,
    kind: AttributeKind,
    owner: i32,
    ids: &[i32],
) -> Result<Vec<i32>, ApiError> {
    let wanted: BTreeSet<i32> = ids.iter().copied().collect();
    if wanted.is_empty() {
        return Ok(Vec::new());
    }
    let wanted_ids: Vec<i32> = wanted.iter().copied().collect();

    let found: BTreeSet<i32> = match kind {
        AttributeKind::Tag => tags::table
            .filter(tags::user_id.eq(owner))
            .filter(tags::id.eq_any(&wanted_ids))
            .select(tags::id)
            .load::<i32>(conn)?,
        AttributeKind::Ingredient => ingredients::table
            .filter(ingredients::user_id.eq(owner))
            .filter(ingredients::id.eq_any(&wanted_ids))
            .select(ingredients::id)
            .load::<i32>(conn)?,
    }
    .into_iter()
    .collect();

    if let Some(missing) = wanted.difference(&found).next() {
        return Err(ApiError::validation(
            kind.field(),
            format!("Invalid pk \"{}\" - object does not exist", missing),
        ));
    }

    Ok(wanted_ids)
}

/// Load `(recipe_id, attribute)` pairs for the given recipes, ordered by attribute id.
pub fn linked_to_recipes(
    conn: &mut SqliteConnection,
    kind: AttributeKind,
    recipe_ids: &[i32],
) -> QueryResult<Vec<(i32, Attribute)>> {
    match kind {
        AttributeKind::Tag => recipe_tags::table
            .inner_join(tags::table)
            .filter(recipe_tags::recipe_id.eq_any(recipe_ids))
            .select((recipe_tags::recipe_id, (tags::id, tags::user_id, tags::name)))
            .order(tags::id.asc())
            .load(conn),
        AttributeKind::Ingredient => recipe_ingredients::table
            .inner_join(ingredients::table)
            .filter(recipe_ingredients::recipe_id.eq_any(recipe_ids))
            .select((
                recipe_ingredients::recipe_id,
                (ingredients::id, ingredients::user_id, ingredients::name),
            ))
            .order(ingredients::id.asc())
            .load(conn),
    }
}

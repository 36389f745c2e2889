use std::collections::HashMap;

use chrono::Utc;
use diesel::prelude::*;

use super::attributes::{linked_to_recipes, owned_ids, AttributeKind};
use crate::error::ApiError;
use crate::media::{validate_image, MediaStore};
use crate::models::{Attribute, NewRecipe, NewRecipeIngredient, NewRecipeTag, Recipe};
use crate::schema::{recipe_ingredients, recipe_tags, recipes};

/// Prices are below this bound (five digits, two of them decimals).
pub const MAX_PRICE: f64 = 1000.0;
pub const MAX_LINK_LENGTH: usize = 255;

/// Optional filters for the recipe list. Each present filter keeps recipes
/// linked to at least one of its ids; both filters must hold when both are set.
#[derive(Debug, Default, Clone)]
pub struct RecipeFilter {
    pub tag_ids: Option<Vec<i32>>,
    pub ingredient_ids: Option<Vec<i32>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Only supplied fields change; omitted relations are left alone.
    Partial,
    /// Title, time and price are required; omitted link and relations are cleared.
    Full,
}

/// Client-supplied recipe fields. `None` means the field was not sent.
#[derive(Debug, Default, Clone)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<f64>,
    pub link: Option<String>,
    pub tags: Option<Vec<i32>>,
    pub ingredients: Option<Vec<i32>>,
}

#[derive(Debug, Clone)]
pub struct RecipeWithRelations {
    pub recipe: Recipe,
    pub tags: Vec<Attribute>,
    pub ingredients: Vec<Attribute>,
}

#[derive(AsChangeset)]
#[diesel(table_name = recipes)]
struct RecipeChangeset {
    title: Option<String>,
    time_minutes: Option<i32>,
    price: Option<f64>,
    link: Option<String>,
    updated_at: chrono::NaiveDateTime,
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::validation(field, "This field is required"))
}

fn clean_title(title: &str) -> Result<String, ApiError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ApiError::validation("title", "This field may not be blank"));
    }
    Ok(title.to_string())
}

fn clean_time(minutes: i32) -> Result<i32, ApiError> {
    if minutes < 0 {
        return Err(ApiError::validation(
            "time_minutes",
            "Ensure this value is greater than or equal to 0",
        ));
    }
    Ok(minutes)
}

fn clean_price(price: f64) -> Result<f64, ApiError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ApiError::validation(
            "price",
            "Ensure this value is greater than or equal to 0",
        ));
    }
    let cents = (price * 100.0).round();
    // Tolerance for binary fractions such as 0.1 * 100
    if (price * 100.0 - cents).abs() > 1e-6 {
        return Err(ApiError::validation(
            "price",
            "Ensure that there are no more than 2 decimal places",
        ));
    }
    let price = cents / 100.0;
    if price >= MAX_PRICE {
        return Err(ApiError::validation(
            "price",
            "Ensure that there are no more than 5 digits in total",
        ));
    }
    Ok(price)
}

fn clean_link(link: &str) -> Result<String, ApiError> {
    let link = link.trim();
    if link.chars().count() > MAX_LINK_LENGTH {
        return Err(ApiError::validation(
            "link",
            format!(
                "Ensure this field has no more than {} characters",
                MAX_LINK_LENGTH
            ),
        ));
    }
    Ok(link.to_string())
}

fn replace_links(
    conn: &mut SqliteConnection,
    kind: AttributeKind,
    recipe_id: i32,
    ids: &[i32],
) -> QueryResult<()> {
    match kind {
        AttributeKind::Tag => {
            diesel::delete(recipe_tags::table.filter(recipe_tags::recipe_id.eq(recipe_id)))
                .execute(conn)?;
            let rows: Vec<NewRecipeTag> = ids
                .iter()
                .map(|&tag_id| NewRecipeTag { recipe_id, tag_id })
                .collect();
            if !rows.is_empty() {
                diesel::insert_into(recipe_tags::table)
                    .values(&rows)
                    .execute(conn)?;
            }
        }
        AttributeKind::Ingredient => {
            diesel::delete(
                recipe_ingredients::table.filter(recipe_ingredients::recipe_id.eq(recipe_id)),
            )
            .execute(conn)?;
            let rows: Vec<NewRecipeIngredient> = ids
                .iter()
                .map(|&ingredient_id| NewRecipeIngredient {
                    recipe_id,
                    ingredient_id,
                })
                .collect();
            if !rows.is_empty() {
                diesel::insert_into(recipe_ingredients::table)
                    .values(&rows)
                    .execute(conn)?;
            }
        }
    }
    Ok(())
}

/// List the owner's recipes, newest first, applying the optional id filters.
pub fn list_recipes(
    conn: &mut SqliteConnection,
    owner: i32,
    filter: &RecipeFilter,
) -> QueryResult<Vec<Recipe>> {
    let mut query = recipes::table
        .filter(recipes::user_id.eq(owner))
        .select(Recipe::as_select())
        .into_boxed();

    // IN (subquery) rather than a join keeps each recipe to a single row
    if let Some(tag_ids) = &filter.tag_ids {
        let tagged = recipe_tags::table
            .filter(recipe_tags::tag_id.eq_any(tag_ids.clone()))
            .select(recipe_tags::recipe_id);
        query = query.filter(recipes::id.eq_any(tagged));
    }

    if let Some(ingredient_ids) = &filter.ingredient_ids {
        let with_ingredient = recipe_ingredients::table
            .filter(recipe_ingredients::ingredient_id.eq_any(ingredient_ids.clone()))
            .select(recipe_ingredients::recipe_id);
        query = query.filter(recipes::id.eq_any(with_ingredient));
    }

    query.order(recipes::id.desc()).load(conn)
}

/// Attach tags and ingredients to each recipe, keeping the input order.
pub fn with_relations(
    conn: &mut SqliteConnection,
    recipes: Vec<Recipe>,
) -> QueryResult<Vec<RecipeWithRelations>> {
    if recipes.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();
    let mut tags = group_by_recipe(linked_to_recipes(conn, AttributeKind::Tag, &ids)?);
    let mut ingredients =
        group_by_recipe(linked_to_recipes(conn, AttributeKind::Ingredient, &ids)?);

    Ok(recipes
        .into_iter()
        .map(|recipe| RecipeWithRelations {
            tags: tags.remove(&recipe.id).unwrap_or_default(),
            ingredients: ingredients.remove(&recipe.id).unwrap_or_default(),
            recipe,
        })
        .collect())
}

fn group_by_recipe(rows: Vec<(i32, Attribute)>) -> HashMap<i32, Vec<Attribute>> {
    let mut grouped: HashMap<i32, Vec<Attribute>> = HashMap::new();
    for (recipe_id, attribute) in rows {
        grouped.entry(recipe_id).or_default().push(attribute);
    }
    grouped
}

/// Fetch one of the owner's recipes. Other users' recipes are reported as not found.
pub fn get_recipe(conn: &mut SqliteConnection, owner: i32, id: i32) -> Result<Recipe, ApiError> {
    recipes::table
        .filter(recipes::id.eq(id))
        .filter(recipes::user_id.eq(owner))
        .select(Recipe::as_select())
        .first(conn)
        .optional()?
        .ok_or(ApiError::NotFound("Recipe"))
}

/// Create a recipe owned by `owner`, linking only the owner's own tags and ingredients.
pub fn create_recipe(
    conn: &mut SqliteConnection,
    owner: i32,
    changes: RecipeChanges,
) -> Result<Recipe, ApiError> {
    let title = clean_title(&required(changes.title, "title")?)?;
    let time_minutes = clean_time(required(changes.time_minutes, "time_minutes")?)?;
    let price = clean_price(required(changes.price, "price")?)?;
    let link = clean_link(changes.link.as_deref().unwrap_or_default())?;
    let tags = changes.tags.unwrap_or_default();
    let ingredients = changes.ingredients.unwrap_or_default();

    let recipe = conn.transaction::<_, ApiError, _>(|conn| {
        let tag_ids = owned_ids(conn, AttributeKind::Tag, owner, &tags)?;
        let ingredient_ids = owned_ids(conn, AttributeKind::Ingredient, owner, &ingredients)?;

        let recipe: Recipe = diesel::insert_into(recipes::table)
            .values(&NewRecipe {
                user_id: owner,
                title: &title,
                time_minutes,
                price,
                link: &link,
            })
            .returning(Recipe::as_returning())
            .get_result(conn)?;

        replace_links(conn, AttributeKind::Tag, recipe.id, &tag_ids)?;
        replace_links(conn, AttributeKind::Ingredient, recipe.id, &ingredient_ids)?;

        Ok(recipe)
    })?;

    tracing::info!(recipe_id = recipe.id, owner, "created recipe");
    Ok(recipe)
}

/// Update one of the owner's recipes with PATCH or PUT semantics.
pub fn update_recipe(
    conn: &mut SqliteConnection,
    owner: i32,
    id: i32,
    changes: RecipeChanges,
    mode: UpdateMode,
) -> Result<Recipe, ApiError> {
    let existing = get_recipe(conn, owner, id)?;

    let changes = match mode {
        UpdateMode::Partial => changes,
        UpdateMode::Full => RecipeChanges {
            title: Some(required(changes.title, "title")?),
            time_minutes: Some(required(changes.time_minutes, "time_minutes")?),
            price: Some(required(changes.price, "price")?),
            link: Some(changes.link.unwrap_or_default()),
            tags: Some(changes.tags.unwrap_or_default()),
            ingredients: Some(changes.ingredients.unwrap_or_default()),
        },
    };

    let changeset = RecipeChangeset {
        title: changes.title.as_deref().map(clean_title).transpose()?,
        time_minutes: changes.time_minutes.map(clean_time).transpose()?,
        price: changes.price.map(clean_price).transpose()?,
        link: changes.link.as_deref().map(clean_link).transpose()?,
        updated_at: Utc::now().naive_utc(),
    };

    conn.transaction::<_, ApiError, _>(|conn| {
        let tag_ids = changes
            .tags
            .as_deref()
            .map(|ids| owned_ids(conn, AttributeKind::Tag, owner, ids))
            .transpose()?;
        let ingredient_ids = changes
            .ingredients
            .as_deref()
            .map(|ids| owned_ids(conn, AttributeKind::Ingredient, owner, ids))
            .transpose()?;

        let recipe: Recipe = diesel::update(recipes::table.find(existing.id))
            .set(&changeset)
            .returning(Recipe::as_returning())
            .get_result(conn)?;

        if let Some(ids) = tag_ids {
            replace_links(conn, AttributeKind::Tag, recipe.id, &ids)?;
        }
        if let Some(ids) = ingredient_ids {
            replace_links(conn, AttributeKind::Ingredient, recipe.id, &ids)?;
        }

        Ok(recipe)
    })
}

/// Store a new image for one of the owner's recipes, releasing any previous file.
///
/// The previous image is read and replaced under one write lock, so
/// concurrent uploads each release exactly the file they replaced.
pub fn set_recipe_image(
    conn: &mut SqliteConnection,
    media: &MediaStore,
    owner: i32,
    id: i32,
    data: &[u8],
) -> Result<Recipe, ApiError> {
    get_recipe(conn, owner, id)?;
    let extension = validate_image(data).map_err(|e| ApiError::validation("image", e))?;

    let stored = media.save_recipe_image(data, extension)?;

    let swapped = conn.immediate_transaction::<_, ApiError, _>(|conn| {
        let previous = get_recipe(conn, owner, id)?.image;
        let recipe: Recipe = diesel::update(recipes::table.find(id))
            .set((
                recipes::image.eq(Some(stored.as_str())),
                recipes::updated_at.eq(Utc::now().naive_utc()),
            ))
            .returning(Recipe::as_returning())
            .get_result(conn)?;
        Ok((recipe, previous))
    });

    let (recipe, previous) = match swapped {
        Ok(swapped) => swapped,
        Err(e) => {
            if let Err(cleanup) = media.delete(&stored) {
                tracing::warn!("Failed to remove orphaned image {}: {}", stored, cleanup);
            }
            return Err(e);
        }
    };

    if let Some(previous) = previous {
        if let Err(e) = media.delete(&previous) {
            tracing::warn!("Failed to remove replaced image {}: {}", previous, e);
        }
    }

    Ok(recipe)
}

/// Delete one of the owner's recipes along with its links and stored image.
pub fn delete_recipe(
    conn: &mut SqliteConnection,
    media: &MediaStore,
    owner: i32,
    id: i32,
) -> Result<(), ApiError> {
    let recipe = get_recipe(conn, owner, id)?;

    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        diesel::delete(recipe_tags::table.filter(recipe_tags::recipe_id.eq(recipe.id)))
            .execute(conn)?;
        diesel::delete(
            recipe_ingredients::table.filter(recipe_ingredients::recipe_id.eq(recipe.id)),
        )
        .execute(conn)?;
        diesel::delete(recipes::table.find(recipe.id)).execute(conn)?;
        Ok(())
    })?;

    if let Some(image) = &recipe.image {
        if let Err(e) = media.delete(image) {
            tracing::warn!("Failed to remove image {} of deleted recipe: {}", image, e);
        }
    }

    tracing::info!(recipe_id = recipe.id, owner, "deleted recipe");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::attributes::{create_attribute, list_attributes};
    use crate::db::test_pool;
    use crate::models::{NewUser, User};
    use crate::schema::users;

    fn user(conn: &mut SqliteConnection, email: &str) -> i32 {
        diesel::insert_into(users::table)
            .values(NewUser {
                email,
                password_hash: "x",
                name: "",
                is_staff: false,
                is_superuser: false,
            })
            .returning(User::as_returning())
            .get_result(conn)
            .unwrap()
            .id
    }

    fn sample(title: &str) -> RecipeChanges {
        RecipeChanges {
            title: Some(title.to_string()),
            time_minutes: Some(25),
            price: Some(5.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_clean_price_precision_and_bounds() {
        assert_eq!(clean_price(5.25).unwrap(), 5.25);
        assert_eq!(clean_price(0.1).unwrap(), 0.1);
        assert_eq!(clean_price(999.99).unwrap(), 999.99);
        assert!(matches!(
            clean_price(5.006),
            Err(ApiError::Validation {
                field: Some("price"),
                ..
            })
        ));
        assert!(clean_price(999.996).is_err());
        assert!(clean_price(1000.0).is_err());
        assert!(clean_price(-1.0).is_err());
        assert!(clean_price(f64::NAN).is_err());
    }

    #[test]
    fn test_filters_combine_conjunctively() {
        let (_dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();
        let owner = user(&mut conn, "owner@example.com");

        let vegan = create_attribute(&mut conn, AttributeKind::Tag, owner, "Vegan").unwrap();
        let tofu = create_attribute(&mut conn, AttributeKind::Ingredient, owner, "Tofu").unwrap();

        let both = create_recipe(
            &mut conn,
            owner,
            RecipeChanges {
                tags: Some(vec![vegan.id]),
                ingredients: Some(vec![tofu.id]),
                ..sample("Tofu bowl")
            },
        )
        .unwrap();
        create_recipe(
            &mut conn,
            owner,
            RecipeChanges {
                tags: Some(vec![vegan.id]),
                ..sample("Salad")
            },
        )
        .unwrap();

        let by_tag = list_recipes(
            &mut conn,
            owner,
            &RecipeFilter {
                tag_ids: Some(vec![vegan.id]),
                ingredient_ids: None,
            },
        )
        .unwrap();
        assert_eq!(by_tag.len(), 2);

        let by_both = list_recipes(
            &mut conn,
            owner,
            &RecipeFilter {
                tag_ids: Some(vec![vegan.id]),
                ingredient_ids: Some(vec![tofu.id]),
            },
        )
        .unwrap();
        assert_eq!(by_both, vec![both]);
    }

    #[test]
    fn test_assigned_only_ignores_other_owners() {
        let (_dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();
        let owner = user(&mut conn, "owner@example.com");
        let other = user(&mut conn, "other@example.com");

        let used = create_attribute(&mut conn, AttributeKind::Tag, owner, "Used").unwrap();
        create_attribute(&mut conn, AttributeKind::Tag, owner, "Unused").unwrap();
        create_attribute(&mut conn, AttributeKind::Tag, other, "Theirs").unwrap();

        for title in ["One", "Two"] {
            create_recipe(
                &mut conn,
                owner,
                RecipeChanges {
                    tags: Some(vec![used.id]),
                    ..sample(title)
                },
            )
            .unwrap();
        }

        let assigned = list_attributes(&mut conn, AttributeKind::Tag, owner, true).unwrap();
        assert_eq!(assigned, vec![used]);

        let theirs = list_attributes(&mut conn, AttributeKind::Tag, other, true).unwrap();
        assert!(theirs.is_empty());
    }

    #[test]
    fn test_full_update_clears_omitted_relations() {
        let (_dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();
        let owner = user(&mut conn, "owner@example.com");
        let tag = create_attribute(&mut conn, AttributeKind::Tag, owner, "Curry").unwrap();

        let recipe = create_recipe(
            &mut conn,
            owner,
            RecipeChanges {
                tags: Some(vec![tag.id]),
                link: Some("https://example.com".to_string()),
                ..sample("Curry")
            },
        )
        .unwrap();

        let updated = update_recipe(
            &mut conn,
            owner,
            recipe.id,
            sample("Spaghetti"),
            UpdateMode::Full,
        )
        .unwrap();
        assert_eq!(updated.title, "Spaghetti");
        assert_eq!(updated.link, "");

        let loaded = with_relations(&mut conn, vec![updated]).unwrap();
        assert!(loaded[0].tags.is_empty());
    }

    #[test]
    fn test_full_update_requires_core_fields() {
        let (_dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();
        let owner = user(&mut conn, "owner@example.com");
        let recipe = create_recipe(&mut conn, owner, sample("Curry")).unwrap();

        let err = update_recipe(
            &mut conn,
            owner,
            recipe.id,
            RecipeChanges {
                title: Some("Only a title".to_string()),
                ..Default::default()
            },
            UpdateMode::Full,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Validation {
                field: Some("time_minutes"),
                ..
            }
        ));
    }

    #[test]
    fn test_other_owner_cannot_touch_recipe() {
        let (_dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();
        let owner = user(&mut conn, "owner@example.com");
        let other = user(&mut conn, "other@example.com");
        let recipe = create_recipe(&mut conn, owner, sample("Curry")).unwrap();

        assert!(matches!(
            get_recipe(&mut conn, other, recipe.id),
            Err(ApiError::NotFound("Recipe"))
        ));
        assert!(matches!(
            update_recipe(
                &mut conn,
                other,
                recipe.id,
                sample("Hijacked"),
                UpdateMode::Partial
            ),
            Err(ApiError::NotFound("Recipe"))
        ));
        assert_eq!(get_recipe(&mut conn, owner, recipe.id).unwrap().title, "Curry");
    }

    fn png_bytes() -> Vec<u8> {
        let img = image::ImageBuffer::from_pixel(4, 4, image::Rgb([10u8, 20, 30]));
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn stored_files(media: &MediaStore) -> Vec<std::path::PathBuf> {
        std::fs::read_dir(media.root().join("uploads/recipe"))
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }

    #[test]
    fn test_concurrent_image_uploads_leave_only_current_file() {
        let (dir, pool) = test_pool();
        let media = MediaStore::new(dir.path().join("media"));
        let mut conn = pool.get().unwrap();
        let owner = user(&mut conn, "owner@example.com");
        let recipe = create_recipe(&mut conn, owner, sample("Curry")).unwrap();
        set_recipe_image(&mut conn, &media, owner, recipe.id, &png_bytes()).unwrap();
        drop(conn);

        let png = png_bytes();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    let mut conn = pool.get().unwrap();
                    set_recipe_image(&mut conn, &media, owner, recipe.id, &png).unwrap();
                });
            }
        });

        let mut conn = pool.get().unwrap();
        let current = get_recipe(&mut conn, owner, recipe.id)
            .unwrap()
            .image
            .unwrap();
        assert_eq!(stored_files(&media), vec![media.resolve(&current).unwrap()]);
    }

    #[test]
    fn test_create_rejects_foreign_tag_and_persists_nothing() {
        let (_dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();
        let owner = user(&mut conn, "owner@example.com");
        let other = user(&mut conn, "other@example.com");
        let foreign = create_attribute(&mut conn, AttributeKind::Tag, other, "Theirs").unwrap();

        let err = create_recipe(
            &mut conn,
            owner,
            RecipeChanges {
                tags: Some(vec![foreign.id]),
                ..sample("Curry")
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Validation {
                field: Some("tags"),
                ..
            }
        ));

        let all = list_recipes(&mut conn, owner, &RecipeFilter::default()).unwrap();
        assert!(all.is_empty());
    }
}

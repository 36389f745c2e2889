//! Owner-scoped queries for tags, ingredients and recipes.
//!
//! Every function here takes the requesting user's id and never reads or
//! writes rows owned by anyone else. Records belonging to other users are
//! reported as missing, not forbidden.

pub mod attributes;
pub mod filters;
pub mod recipes;

pub use attributes::{create_attribute, list_attributes, AttributeKind};
pub use filters::{parse_flag, parse_id_list, InvalidFilter};
pub use recipes::{
    create_recipe, delete_recipe, get_recipe, list_recipes, set_recipe_image, update_recipe,
    with_relations, RecipeChanges, RecipeFilter, RecipeWithRelations, UpdateMode,
};

//! Recipe search over the in-memory corpus.
//!
//! A linear scan with case-insensitive substring matching on name and
//! description. No scoring: results come back in corpus order and callers
//! decide how many to show.

use crate::models::Recipe;
use crate::storage::RecipeTable;

/// How many matches the search page displays.
pub const SEARCH_RESULT_LIMIT: usize = 5;

/// Every recipe whose name or description contains `query`, ignoring case,
/// in corpus order. An empty query matches the whole corpus.
pub fn search<'a>(query: &str, corpus: &'a RecipeTable) -> Vec<(&'a str, &'a Recipe)> {
    let needle = query.to_lowercase();
    corpus
        .iter()
        .filter(|recipe| matches(&needle, recipe))
        .map(|recipe| (recipe.recipe_id.as_str(), recipe))
        .collect()
}

/// The first `SEARCH_RESULT_LIMIT` matches, as shown to users.
pub fn top_matches<'a>(query: &str, corpus: &'a RecipeTable) -> Vec<(&'a str, &'a Recipe)> {
    let mut results = search(query, corpus);
    results.truncate(SEARCH_RESULT_LIMIT);
    results
}

fn matches(needle: &str, recipe: &Recipe) -> bool {
    recipe.name.to_lowercase().contains(needle)
        || recipe.description.to_lowercase().contains(needle)
}

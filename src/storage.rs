//! Dataset loader: reads the recipe and review CSV tables into memory.
//!
//! Tables are parsed with Arrow's CSV reader into RecordBatches, every column
//! forced to Utf8 so nothing is coerced (ids, ratings and nutrition values
//! stay exactly as written). Rows are then lifted out of the batches into
//! plain `Recipe`/`Review` records.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, StringArray};
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use tracing::{debug, info};

use crate::error::LoadError;
use crate::models::{Recipe, Review, RECIPE_COLUMNS, REVIEW_COLUMNS};

const BATCH_SIZE: usize = 4096;

/// Recipes keyed by id, iterated in insertion order.
///
/// A repeated id replaces the stored record but keeps the slot of its first
/// appearance, so iteration order is the order ids were first seen.
#[derive(Debug, Clone, Default)]
pub struct RecipeTable {
    recipes: Vec<Recipe>,
    positions: HashMap<String, usize>,
}

impl RecipeTable {
    pub fn insert(&mut self, recipe: Recipe) {
        match self.positions.entry(recipe.recipe_id.clone()) {
            Entry::Occupied(slot) => self.recipes[*slot.get()] = recipe,
            Entry::Vacant(slot) => {
                slot.insert(self.recipes.len());
                self.recipes.push(recipe);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Recipe> {
        self.positions.get(id).map(|&pos| &self.recipes[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.iter()
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

impl FromIterator<Recipe> for RecipeTable {
    fn from_iter<I: IntoIterator<Item = Recipe>>(iter: I) -> Self {
        let mut table = RecipeTable::default();
        for recipe in iter {
            table.insert(recipe);
        }
        table
    }
}

/// Reviews grouped by parent recipe id, each group in file order.
#[derive(Debug, Clone, Default)]
pub struct ReviewTable {
    by_recipe: HashMap<String, Vec<Review>>,
}

impl ReviewTable {
    pub fn push(&mut self, review: Review) {
        self.by_recipe
            .entry(review.recipe_id.clone())
            .or_default()
            .push(review);
    }

    /// Reviews for a recipe; empty when the id has none.
    pub fn reviews_for(&self, recipe_id: &str) -> &[Review] {
        self.by_recipe
            .get(recipe_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total number of reviews across all recipes.
    pub fn len(&self) -> usize {
        self.by_recipe.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_recipe.is_empty()
    }
}

impl FromIterator<Review> for ReviewTable {
    fn from_iter<I: IntoIterator<Item = Review>>(iter: I) -> Self {
        let mut table = ReviewTable::default();
        for review in iter {
            table.push(review);
        }
        table
    }
}

/// Everything read from disk at startup. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub recipes: RecipeTable,
    pub reviews: ReviewTable,
}

impl Dataset {
    pub fn new(recipes: RecipeTable, reviews: ReviewTable) -> Self {
        Self { recipes, reviews }
    }

    /// Load both tables. Any failure is fatal for the caller: a partially
    /// loaded dataset must not serve traffic.
    pub fn load(recipes_path: &Path, reviews_path: &Path) -> Result<Self, LoadError> {
        let recipes = load_recipes(recipes_path)?;
        let reviews = load_reviews(reviews_path)?;
        info!(
            recipes = recipes.len(),
            reviews = reviews.len(),
            "dataset loaded"
        );
        Ok(Self { recipes, reviews })
    }

    pub fn recipe(&self, id: &str) -> Option<&Recipe> {
        self.recipes.get(id)
    }

    pub fn reviews_for(&self, recipe_id: &str) -> &[Review] {
        self.reviews.reviews_for(recipe_id)
    }
}

pub fn load_recipes(path: &Path) -> Result<RecipeTable, LoadError> {
    let mut table = RecipeTable::default();
    for batch in read_table(path, &RECIPE_COLUMNS)? {
        let cols = text_columns(path, &batch, &RECIPE_COLUMNS)?;
        for row in 0..batch.num_rows() {
            let c = |i: usize| cell(cols[i], row);
            table.insert(Recipe {
                recipe_id: c(0),
                name: c(1),
                description: c(2),
                author_id: c(3),
                cook_time: c(4),
                prep_time: c(5),
                total_time: c(6),
                date_published: c(7),
                images: c(8),
                recipe_category: c(9),
                keywords: c(10),
                recipe_ingredient_quantities: c(11),
                recipe_ingredient_parts: c(12),
                aggregated_rating: c(13),
                review_count: c(14),
                calories: c(15),
                fat_content: c(16),
                saturated_fat_content: c(17),
                cholesterol_content: c(18),
                sodium_content: c(19),
                carbohydrate_content: c(20),
                fiber_content: c(21),
                sugar_content: c(22),
                protein_content: c(23),
                recipe_servings: c(24),
                recipe_yield: c(25),
                recipe_instructions: c(26),
            });
        }
    }
    debug!(path = %path.display(), recipes = table.len(), "recipe table read");
    Ok(table)
}

pub fn load_reviews(path: &Path) -> Result<ReviewTable, LoadError> {
    let mut table = ReviewTable::default();
    for batch in read_table(path, &REVIEW_COLUMNS)? {
        let cols = text_columns(path, &batch, &REVIEW_COLUMNS)?;
        for row in 0..batch.num_rows() {
            let c = |i: usize| cell(cols[i], row);
            table.push(Review {
                recipe_id: c(0),
                review_id: c(1),
                author_id: c(2),
                author_name: c(3),
                rating: c(4),
                review: c(5),
                date_submitted: c(6),
                date_modified: c(7),
            });
        }
    }
    debug!(path = %path.display(), reviews = table.len(), "review table read");
    Ok(table)
}

/// Read a header-driven CSV file as all-text RecordBatches after checking
/// that every `required` column is present in the header.
fn read_table(path: &Path, required: &[&str]) -> Result<Vec<RecordBatch>, LoadError> {
    let file_err = |source| LoadError::File {
        path: path.to_path_buf(),
        source,
    };
    let parse_err = |source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(file_err)?;

    // Header only: no records are sampled for type inference.
    let (header, _) = Format::default()
        .with_header(true)
        .infer_schema(&mut file, Some(0))
        .map_err(parse_err)?;

    if let Some(column) = required.iter().find(|c| header.index_of(c).is_err()) {
        return Err(LoadError::Schema {
            path: path.to_path_buf(),
            column: column.to_string(),
        });
    }

    let fields: Vec<Field> = header
        .fields()
        .iter()
        .map(|f| Field::new(f.name(), DataType::Utf8, true))
        .collect();

    // Short rows read their missing trailing cells as nulls; rows with more
    // cells than the header are still a parse error.
    file.seek(SeekFrom::Start(0)).map_err(file_err)?;
    let reader = ReaderBuilder::new(Arc::new(Schema::new(fields)))
        .with_header(true)
        .with_truncated_rows(true)
        .with_batch_size(BATCH_SIZE)
        .build(file)
        .map_err(parse_err)?;

    reader.collect::<Result<Vec<_>, _>>().map_err(parse_err)
}

fn text_columns<'a>(
    path: &Path,
    batch: &'a RecordBatch,
    names: &[&str],
) -> Result<Vec<&'a StringArray>, LoadError> {
    names
        .iter()
        .map(|name| {
            batch
                .column_by_name(name)
                .and_then(|col| col.as_any().downcast_ref::<StringArray>())
                .ok_or_else(|| LoadError::Schema {
                    path: path.to_path_buf(),
                    column: name.to_string(),
                })
        })
        .collect()
}

// Arrow reads empty cells as nulls; the records keep them as empty text.
fn cell(col: &StringArray, row: usize) -> String {
    if col.is_null(row) {
        String::new()
    } else {
        col.value(row).to_string()
    }
}

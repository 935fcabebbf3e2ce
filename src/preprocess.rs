//! Offline normalization of the recipe table.
//!
//! Never called while serving. The `preprocess` binary runs it over a CSV
//! and writes the cleaned rows to an Arrow IPC file:
//! - durations become `PT`-prefixed upper-case tokens (`24h` -> `PT24H`)
//! - `DatePublished` is parsed into a UTC timestamp
//! - ingredient quantities/parts are split on commas into trimmed lists
//! - any other empty cell becomes `NA`

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, ListBuilder, StringArray, StringBuilder, TimestampSecondArray};
use arrow::datatypes::{Field, Schema};
use arrow::error::ArrowError;
use arrow::ipc::writer::FileWriter;
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::PreprocessError;
use crate::models::{Recipe, RECIPE_COLUMNS};
use crate::storage::RecipeTable;

/// Sentinel written for missing values.
pub const MISSING: &str = "NA";

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecipe {
    /// Text columns with durations rewritten and gaps filled with `NA`.
    pub recipe: Recipe,
    pub date_published: Option<DateTime<Utc>>,
    pub ingredient_quantities: Vec<String>,
    pub ingredient_parts: Vec<String>,
}

pub fn normalize(table: &RecipeTable) -> Vec<NormalizedRecipe> {
    table.iter().cloned().map(normalize_recipe).collect()
}

pub fn normalize_recipe(mut recipe: Recipe) -> NormalizedRecipe {
    for time in [
        &mut recipe.cook_time,
        &mut recipe.prep_time,
        &mut recipe.total_time,
    ] {
        *time = iso_duration(time);
    }

    let date_published = parse_date(&recipe.date_published);
    let ingredient_quantities = split_list(&recipe.recipe_ingredient_quantities);
    let ingredient_parts = split_list(&recipe.recipe_ingredient_parts);

    // Only truly empty cells are missing; whitespace is kept as written.
    for value in recipe.columns_mut() {
        if value.is_empty() {
            *value = MISSING.to_string();
        }
    }

    NormalizedRecipe {
        recipe,
        date_published,
        ingredient_quantities,
        ingredient_parts,
    }
}

/// `"24h45m"` -> `"PT24H45M"`. Values already carrying the prefix keep a
/// single one; empty input stays empty.
pub fn iso_duration(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    if upper.is_empty() || upper.starts_with("PT") {
        upper
    } else {
        format!("PT{upper}")
    }
}

pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

pub fn split_list(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return vec![];
    }
    raw.split(',').map(|item| item.trim().to_string()).collect()
}

fn list_column<'a>(lists: impl Iterator<Item = &'a Vec<String>>) -> ArrayRef {
    let mut builder = ListBuilder::new(StringBuilder::new());
    for list in lists {
        for item in list {
            builder.values().append_value(item);
        }
        builder.append(true);
    }
    Arc::new(builder.finish())
}

/// One RecordBatch in dataset column order. Date and ingredient columns get
/// structured types; everything else stays Utf8.
pub fn to_record_batch(recipes: &[NormalizedRecipe]) -> Result<RecordBatch, ArrowError> {
    let mut fields = Vec::with_capacity(RECIPE_COLUMNS.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(RECIPE_COLUMNS.len());

    for (i, name) in RECIPE_COLUMNS.iter().enumerate() {
        let array: ArrayRef = match *name {
            "DatePublished" => Arc::new(
                recipes
                    .iter()
                    .map(|r| r.date_published.map(|d| d.timestamp()))
                    .collect::<TimestampSecondArray>()
                    .with_timezone("UTC"),
            ),
            "RecipeIngredientQuantities" => {
                list_column(recipes.iter().map(|r| &r.ingredient_quantities))
            }
            "RecipeIngredientParts" => list_column(recipes.iter().map(|r| &r.ingredient_parts)),
            _ => Arc::new(StringArray::from_iter_values(
                recipes.iter().map(|r| r.recipe.columns()[i]),
            )),
        };
        fields.push(Field::new(*name, array.data_type().clone(), true));
        arrays.push(array);
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
}

pub fn write_ipc(recipes: &[NormalizedRecipe], path: &Path) -> Result<(), PreprocessError> {
    let batch = to_record_batch(recipes)?;
    let file = File::create(path)?;
    let mut writer = FileWriter::try_new(file, batch.schema().as_ref())?;
    writer.write(&batch)?;
    writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::fixtures::recipe;
    use arrow::array::{Array, ListArray};
    use arrow::datatypes::{DataType, TimeUnit};
    use arrow::ipc::reader::FileReader;
    use chrono::TimeZone;
    use std::fs;

    fn raw_recipe() -> Recipe {
        Recipe {
            cook_time: "24h".to_string(),
            prep_time: "PT45M".to_string(),
            total_time: String::new(),
            date_published: "1999-08-09T21:46:00Z".to_string(),
            recipe_ingredient_quantities: "4, 1/4 ,1".to_string(),
            recipe_ingredient_parts: "blueberries,  sugar , lemon juice".to_string(),
            ..recipe("38", "Berry Dessert", "")
        }
    }

    #[test]
    fn test_normalize_recipe() {
        let normalized = normalize_recipe(raw_recipe());

        assert_eq!(normalized.recipe.cook_time, "PT24H");
        assert_eq!(normalized.recipe.prep_time, "PT45M");
        assert_eq!(normalized.recipe.total_time, MISSING);
        assert_eq!(normalized.recipe.description, MISSING);
        assert_eq!(normalized.recipe.name, "Berry Dessert");
        assert_eq!(
            normalized.date_published,
            Some(Utc.with_ymd_and_hms(1999, 8, 9, 21, 46, 0).unwrap())
        );
        assert_eq!(normalized.ingredient_quantities, vec!["4", "1/4", "1"]);
        assert_eq!(
            normalized.ingredient_parts,
            vec!["blueberries", "sugar", "lemon juice"]
        );
    }

    #[test]
    fn test_whitespace_cells_are_not_missing() {
        let normalized = normalize_recipe(recipe("40", "Broth", "  "));
        assert_eq!(normalized.recipe.description, "  ");
        assert_eq!(normalized.recipe.keywords, MISSING);
    }

    #[test]
    fn test_parse_date_formats() {
        let midnight = Utc.with_ymd_and_hms(2005, 9, 16, 0, 0, 0).unwrap();
        assert_eq!(parse_date("2005-09-16"), Some(midnight));
        assert_eq!(
            parse_date("2005-09-16 21:50:00"),
            Some(Utc.with_ymd_and_hms(2005, 9, 16, 21, 50, 0).unwrap())
        );
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_missing_ingredients_become_empty_lists() {
        assert!(split_list("").is_empty());
        assert!(split_list("   ").is_empty());
        assert_eq!(split_list("salt"), vec!["salt"]);
    }

    #[test]
    fn test_write_ipc_uses_structured_columns() {
        let recipes = vec![
            normalize_recipe(raw_recipe()),
            normalize_recipe(recipe("39", "Soup", "hot")),
        ];
        let path = std::env::temp_dir()
            .join(format!("recipe_hub_ipc_{}.arrow", std::process::id()));

        write_ipc(&recipes, &path).expect("write ipc");

        let file = File::open(&path).unwrap();
        let mut reader = FileReader::try_new(file, None).unwrap();
        let batch = reader.next().unwrap().unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), RECIPE_COLUMNS.len());

        let schema = batch.schema();
        assert_eq!(schema.field(0).name(), "RecipeId");
        assert_eq!(
            schema.field_with_name("DatePublished").unwrap().data_type(),
            &DataType::Timestamp(TimeUnit::Second, Some("UTC".into()))
        );

        let parts = batch
            .column_by_name("RecipeIngredientParts")
            .unwrap()
            .as_any()
            .downcast_ref::<ListArray>()
            .unwrap();
        let first = parts.value(0);
        let first = first.as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(first.value(2), "lemon juice");
        assert_eq!(parts.value(1).len(), 0);

        let dates = batch
            .column_by_name("DatePublished")
            .unwrap()
            .as_any()
            .downcast_ref::<TimestampSecondArray>()
            .unwrap();
        assert!(dates.is_null(1));

        let _ = fs::remove_file(path);
    }
}

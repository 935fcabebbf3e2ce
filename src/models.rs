use serde::{Deserialize, Serialize};

/// Header names every recipe table must carry, in dataset order.
pub const RECIPE_COLUMNS: [&str; 27] = [
    "RecipeId",
    "Name",
    "Description",
    "AuthorId",
    "CookTime",
    "PrepTime",
    "TotalTime",
    "DatePublished",
    "Images",
    "RecipeCategory",
    "Keywords",
    "RecipeIngredientQuantities",
    "RecipeIngredientParts",
    "AggregatedRating",
    "ReviewCount",
    "Calories",
    "FatContent",
    "SaturatedFatContent",
    "CholesterolContent",
    "SodiumContent",
    "CarbohydrateContent",
    "FiberContent",
    "SugarContent",
    "ProteinContent",
    "RecipeServings",
    "RecipeYield",
    "RecipeInstructions",
];

/// Header names every review table must carry.
pub const REVIEW_COLUMNS: [&str; 8] = [
    "RecipeId",
    "ReviewId",
    "AuthorId",
    "AuthorName",
    "Rating",
    "Review",
    "DateSubmitted",
    "DateModified",
];

/// A dataset recipe. Every field is the cell text exactly as read; numeric
/// columns (ratings, nutrition, ids) are not coerced.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Recipe {
    pub recipe_id: String,
    pub name: String,
    pub description: String,
    pub author_id: String,
    pub cook_time: String,
    pub prep_time: String,
    pub total_time: String,
    pub date_published: String,
    pub images: String,
    pub recipe_category: String,
    pub keywords: String,
    pub recipe_ingredient_quantities: String,
    pub recipe_ingredient_parts: String,
    pub aggregated_rating: String,
    pub review_count: String,
    pub calories: String,
    pub fat_content: String,
    pub saturated_fat_content: String,
    pub cholesterol_content: String,
    pub sodium_content: String,
    pub carbohydrate_content: String,
    pub fiber_content: String,
    pub sugar_content: String,
    pub protein_content: String,
    pub recipe_servings: String,
    pub recipe_yield: String,
    pub recipe_instructions: String,
}

impl Recipe {
    /// Field values in `RECIPE_COLUMNS` order.
    pub fn columns(&self) -> [&str; 27] {
        [
            &self.recipe_id,
            &self.name,
            &self.description,
            &self.author_id,
            &self.cook_time,
            &self.prep_time,
            &self.total_time,
            &self.date_published,
            &self.images,
            &self.recipe_category,
            &self.keywords,
            &self.recipe_ingredient_quantities,
            &self.recipe_ingredient_parts,
            &self.aggregated_rating,
            &self.review_count,
            &self.calories,
            &self.fat_content,
            &self.saturated_fat_content,
            &self.cholesterol_content,
            &self.sodium_content,
            &self.carbohydrate_content,
            &self.fiber_content,
            &self.sugar_content,
            &self.protein_content,
            &self.recipe_servings,
            &self.recipe_yield,
            &self.recipe_instructions,
        ]
    }

    /// Mutable field values in `RECIPE_COLUMNS` order.
    pub fn columns_mut(&mut self) -> [&mut String; 27] {
        [
            &mut self.recipe_id,
            &mut self.name,
            &mut self.description,
            &mut self.author_id,
            &mut self.cook_time,
            &mut self.prep_time,
            &mut self.total_time,
            &mut self.date_published,
            &mut self.images,
            &mut self.recipe_category,
            &mut self.keywords,
            &mut self.recipe_ingredient_quantities,
            &mut self.recipe_ingredient_parts,
            &mut self.aggregated_rating,
            &mut self.review_count,
            &mut self.calories,
            &mut self.fat_content,
            &mut self.saturated_fat_content,
            &mut self.cholesterol_content,
            &mut self.sodium_content,
            &mut self.carbohydrate_content,
            &mut self.fiber_content,
            &mut self.sugar_content,
            &mut self.protein_content,
            &mut self.recipe_servings,
            &mut self.recipe_yield,
            &mut self.recipe_instructions,
        ]
    }

    /// Nutrition facts as (label, value) pairs for display.
    pub fn nutrition(&self) -> [(&'static str, &str); 9] {
        [
            ("Calories", self.calories.as_str()),
            ("Fat", self.fat_content.as_str()),
            ("Saturated fat", self.saturated_fat_content.as_str()),
            ("Cholesterol", self.cholesterol_content.as_str()),
            ("Sodium", self.sodium_content.as_str()),
            ("Carbohydrates", self.carbohydrate_content.as_str()),
            ("Fiber", self.fiber_content.as_str()),
            ("Sugar", self.sugar_content.as_str()),
            ("Protein", self.protein_content.as_str()),
        ]
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Review {
    pub review_id: String,
    pub recipe_id: String,
    pub author_id: String,
    pub author_name: String,
    pub rating: String,
    pub review: String,
    pub date_submitted: String,
    pub date_modified: String,
}

/// Saved recipes for a user. Nothing populates folders yet; the mapping
/// exists so recommendations have something to consult.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Folder {
    pub name: String,
    pub recipe_ids: Vec<String>,
}

/// JWT claims carried in the session cookie.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SessionClaims {
    pub sub: String, // username
    pub sid: String, // server-side session id
    pub generation: u64,
    pub exp: usize,
}

//! HTML pages. Plain string building; every dynamic value goes through
//! `escape` before it lands in markup.

use std::fmt::Write;

use axum::response::Html;

use crate::models::{Recipe, Review};

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, user: Option<&str>, body: &str) -> Html<String> {
    let nav = match user {
        Some(user) => format!(
            r#"<nav><a href="/">Home</a> | <a href="/search">Search</a> | signed in as {}</nav>"#,
            escape(user)
        ),
        None => r#"<nav><a href="/login">Login</a> | <a href="/register">Register</a></nav>"#
            .to_string(),
    };
    Html(format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{}</title></head>\
         <body>{nav}<main>{body}</main></body></html>",
        escape(title)
    ))
}

pub fn home(user: &str, recommendations: &[String]) -> Html<String> {
    let mut body = format!("<h1>Welcome, {}</h1>", escape(user));
    if recommendations.is_empty() {
        body.push_str("<p>No recommendations yet.</p>");
    } else {
        body.push_str("<h2>Recommended for you</h2><ul>");
        for item in recommendations {
            let _ = write!(body, "<li>{}</li>", escape(item));
        }
        body.push_str("</ul>");
    }
    page("Home", Some(user), &body)
}

const SEARCH_FORM: &str = r#"<form method="post" action="/search">
<input type="text" name="query" placeholder="Search recipes">
<button type="submit">Search</button>
</form>"#;

pub fn search_form(user: &str) -> Html<String> {
    page("Search", Some(user), &format!("<h1>Search recipes</h1>{SEARCH_FORM}"))
}

pub fn search_results(user: &str, query: &str, results: &[(&str, &Recipe)]) -> Html<String> {
    let mut body = format!("<h1>Results for \"{}\"</h1>", escape(query));
    if results.is_empty() {
        body.push_str("<p>No recipes matched.</p>");
    } else {
        body.push_str("<ol>");
        for (id, recipe) in results {
            let _ = write!(
                body,
                r#"<li><a href="/recipe/{}">{}</a><p>{}</p></li>"#,
                escape(id),
                escape(&recipe.name),
                escape(&recipe.description)
            );
        }
        body.push_str("</ol>");
    }
    body.push_str(SEARCH_FORM);
    page("Search results", Some(user), &body)
}

pub fn recipe_detail(user: &str, recipe: &Recipe, reviews: &[Review]) -> Html<String> {
    let mut body = format!(
        "<h1>{}</h1><p>{}</p><dl>",
        escape(&recipe.name),
        escape(&recipe.description)
    );
    let facts = [
        ("Category", &recipe.recipe_category),
        ("Prep time", &recipe.prep_time),
        ("Cook time", &recipe.cook_time),
        ("Total time", &recipe.total_time),
        ("Published", &recipe.date_published),
        ("Servings", &recipe.recipe_servings),
        ("Yield", &recipe.recipe_yield),
        ("Rating", &recipe.aggregated_rating),
        ("Reviews", &recipe.review_count),
        ("Keywords", &recipe.keywords),
    ];
    for (label, value) in facts {
        let _ = write!(body, "<dt>{label}</dt><dd>{}</dd>", escape(value));
    }
    body.push_str("</dl><h2>Ingredients</h2>");
    let _ = write!(
        body,
        "<p>{}</p><p>{}</p>",
        escape(&recipe.recipe_ingredient_quantities),
        escape(&recipe.recipe_ingredient_parts)
    );
    let _ = write!(
        body,
        "<h2>Instructions</h2><p>{}</p><h2>Nutrition</h2><ul>",
        escape(&recipe.recipe_instructions)
    );
    for (label, value) in recipe.nutrition() {
        let _ = write!(body, "<li>{label}: {}</li>", escape(value));
    }
    body.push_str("</ul>");

    let _ = write!(body, "<h2>Reviews ({})</h2>", reviews.len());
    if reviews.is_empty() {
        body.push_str("<p>No reviews yet.</p>");
    } else {
        body.push_str("<ul>");
        for review in reviews {
            let _ = write!(
                body,
                "<li><strong>{}</strong> rated {}<p>{}</p><small>{}</small></li>",
                escape(&review.author_name),
                escape(&review.rating),
                escape(&review.review),
                escape(&review.date_submitted)
            );
        }
        body.push_str("</ul>");
    }
    page(&recipe.name, Some(user), &body)
}

pub fn error_page(user: Option<&str>, message: &str) -> Html<String> {
    page(
        "Error",
        user,
        &format!("<h1>Error</h1><p>{}</p>", escape(message)),
    )
}

pub fn login(error: Option<&str>) -> Html<String> {
    let error = error
        .map(|e| format!(r#"<p class="error">{}</p>"#, escape(e)))
        .unwrap_or_default();
    page(
        "Login",
        None,
        &format!(
            r#"<h1>Login</h1>{error}<form method="post" action="/login">
<input type="text" name="username" placeholder="Username">
<input type="password" name="password" placeholder="Password">
<button type="submit">Login</button>
</form>"#
        ),
    )
}

pub fn register(error: Option<&str>) -> Html<String> {
    let error = error
        .map(|e| format!(r#"<p class="error">{}</p>"#, escape(e)))
        .unwrap_or_default();
    page(
        "Register",
        None,
        &format!(
            r#"<h1>Register</h1>{error}<form method="post" action="/register">
<input type="text" name="username" placeholder="Username">
<input type="password" name="password" placeholder="Password">
<button type="submit">Register</button>
</form>"#
        ),
    )
}

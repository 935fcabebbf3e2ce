//! Landing-page recommendations.
//!
//! Placeholder: there is no scoring. A user who has both an account and a
//! folder entry gets two fixed strings; everybody else gets nothing. Since
//! no operation creates folders yet, the result is empty in practice.

use std::collections::HashMap;

use crate::auth::CredentialStore;
use crate::models::Folder;

pub fn recommendations(
    username: &str,
    credentials: &CredentialStore,
    folders: &HashMap<String, Vec<Folder>>,
) -> Vec<String> {
    if credentials.contains(username) && folders.contains_key(username) {
        vec![
            format!("Recommendation 1 for {username}"),
            format!("Recommendation 2 for {username}"),
        ]
    } else {
        vec![]
    }
}

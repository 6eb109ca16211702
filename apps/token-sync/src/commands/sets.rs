use super::open_state;
use crate::error::AppError;

use sync_core::graph::tree::{TreeItem, token_set_tree};

use models::{TokenSetStatus, UsedTokenSets};

use std::path::Path;

pub async fn sets(document: &Path) -> Result<(Vec<TreeItem>, UsedTokenSets), AppError> {
    let (_, state) = open_state(document).await?;
    let tree = token_set_tree(state.tokens.keys().map(String::as_str));
    Ok((tree, state.used_token_sets))
}

/// One line per item, indented by level. Leaves show their status; sets
/// missing from a non-empty selection are disabled.
pub fn render(tree: &[TreeItem], used: &UsedTokenSets) -> String {
    tree.iter()
        .map(|item| {
            let indent = "  ".repeat(item.level);
            if !item.is_leaf {
                return format!("{indent}{}/", item.label);
            }
            let status = match used.get(&item.path) {
                Some(TokenSetStatus::Enabled) => "enabled",
                Some(TokenSetStatus::Source) => "source",
                Some(TokenSetStatus::Disabled) => "disabled",
                None if used.is_empty() => "enabled",
                None => "disabled",
            };
            format!("{indent}{} ({status})", item.label)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

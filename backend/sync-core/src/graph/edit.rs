//! Local edit operations on token sets.
//!
//! These run on a private copy of the sets inside the store actor; the copy
//! replaces the published snapshot only when the operation succeeds.

use crate::error::edit::EditError;
use crate::resolve::expression::rewrite_references;

use models::{Token, TokenSets, TokenType, validate_token_name};

use log::debug;

pub const COPY_SUFFIX: &str = "-copy";

/// Appends `token` to `set`, creating the set when it does not exist yet.
pub fn create_token(sets: &mut TokenSets, set: &str, token: Token) -> Result<(), EditError> {
    validate_token_name(&token.name)?;

    let tokens = sets.entry(set.to_string()).or_default();
    if tokens.contains(&token.name) {
        return Err(EditError::token_exists(set, &token.name));
    }

    debug!("Creating token '{}' in set '{}'", token.name, set);
    tokens.insert(token);
    Ok(())
}

/// Replaces a token in place. When `old_name` differs from the new name the
/// token keeps its position and every alias to it, in every set, follows.
pub fn edit_token(
    sets: &mut TokenSets,
    set: &str,
    token: Token,
    old_name: Option<&str>,
) -> Result<(), EditError> {
    validate_token_name(&token.name)?;

    let old_name = old_name.unwrap_or(&token.name).to_string();
    let new_name = token.name.clone();

    let tokens = sets
        .get_mut(set)
        .ok_or_else(|| EditError::set_not_found(set))?;
    let position = tokens
        .position(&old_name)
        .ok_or_else(|| EditError::token_not_found(set, &old_name))?;

    if old_name != new_name && tokens.contains(&new_name) {
        return Err(EditError::token_exists(set, &new_name));
    }

    tokens.remove(&old_name);
    tokens.insert_at(position, token);

    if old_name != new_name {
        debug!("Renamed token '{}' to '{}' in set '{}'", old_name, new_name, set);
        rewrite_aliases(sets, &old_name, &new_name);
    }

    Ok(())
}

pub fn delete_token(sets: &mut TokenSets, set: &str, name: &str) -> Result<Token, EditError> {
    sets.get_mut(set)
        .ok_or_else(|| EditError::set_not_found(set))?
        .remove(name)
        .ok_or_else(|| EditError::token_not_found(set, name))
}

/// Inserts a copy right after the original, named `<name>-copy` by default.
pub fn duplicate_token(
    sets: &mut TokenSets,
    set: &str,
    name: &str,
    new_name: Option<&str>,
) -> Result<String, EditError> {
    let tokens = sets
        .get_mut(set)
        .ok_or_else(|| EditError::set_not_found(set))?;
    let position = tokens
        .position(name)
        .ok_or_else(|| EditError::token_not_found(set, name))?;

    let copy_name = new_name
        .map(str::to_string)
        .unwrap_or_else(|| format!("{name}{COPY_SUFFIX}"));
    validate_token_name(&copy_name)?;

    if tokens.contains(&copy_name) {
        return Err(EditError::token_exists(set, &copy_name));
    }

    let mut copy = tokens
        .get(name)
        .cloned()
        .ok_or_else(|| EditError::token_not_found(set, name))?;
    copy.name = copy_name.clone();
    tokens.insert_at(position + 1, copy);

    Ok(copy_name)
}

/// Removes every token under `path`, optionally only those of `token_type`.
/// Returns how many tokens were removed.
pub fn delete_token_group(
    sets: &mut TokenSets,
    set: &str,
    path: &str,
    token_type: Option<TokenType>,
) -> Result<usize, EditError> {
    let tokens = sets
        .get_mut(set)
        .ok_or_else(|| EditError::set_not_found(set))?;

    let before = tokens.len();
    tokens.retain(|token| {
        let in_group = token.is_in_group(path);
        let type_matches = token_type.is_none_or(|t| t == token.token_type);
        !(in_group && type_matches)
    });

    Ok(before - tokens.len())
}

/// Renames the group `path.old_name` to `path.new_name`, keeping token
/// positions and rewriting aliases in every set.
pub fn rename_token_group(
    sets: &mut TokenSets,
    set: &str,
    path: &str,
    old_name: &str,
    new_name: &str,
) -> Result<usize, EditError> {
    let old_group = join_path(path, old_name);
    let new_group = join_path(path, new_name);
    validate_token_name(&new_group)?;

    let tokens = sets
        .get_mut(set)
        .ok_or_else(|| EditError::set_not_found(set))?;

    let renamed: Vec<(usize, Token)> = tokens
        .iter()
        .enumerate()
        .filter(|(_, token)| token.is_in_group(&old_group))
        .map(|(index, token)| {
            let mut token = token.clone();
            token.name = format!("{new_group}{}", &token.name[old_group.len()..]);
            (index, token)
        })
        .collect();

    if renamed.is_empty() {
        return Err(EditError::token_not_found(set, &old_group));
    }

    if let Some((_, clash)) = renamed.iter().find(|(_, token)| {
        tokens
            .get(&token.name)
            .is_some_and(|existing| !existing.is_in_group(&old_group))
    }) {
        return Err(EditError::token_exists(set, &clash.name));
    }

    for (index, token) in &renamed {
        let old = tokens.iter().nth(*index).map(|t| t.name.clone());
        if let Some(old) = old {
            tokens.remove(&old);
            tokens.insert_at(*index, token.clone());
        }
    }

    rewrite_aliases(sets, &old_group, &new_group);
    Ok(renamed.len())
}

/// Copies the group `path.old_name` as `path.old_name-copy`, placed after the
/// last token of the original group.
pub fn duplicate_token_group(
    sets: &mut TokenSets,
    set: &str,
    path: &str,
    old_name: &str,
) -> Result<usize, EditError> {
    let old_group = join_path(path, old_name);
    let new_group = format!("{old_group}{COPY_SUFFIX}");

    let tokens = sets
        .get_mut(set)
        .ok_or_else(|| EditError::set_not_found(set))?;

    let members: Vec<(usize, Token)> = tokens
        .iter()
        .enumerate()
        .filter(|(_, token)| token.is_in_group(&old_group))
        .map(|(index, token)| (index, token.clone()))
        .collect();

    let Some((last_index, _)) = members.last() else {
        return Err(EditError::token_not_found(set, &old_group));
    };

    let mut insert_at = last_index + 1;
    for (_, mut token) in members.iter().cloned() {
        token.name = format!("{new_group}{}", &token.name[old_group.len()..]);
        if tokens.contains(&token.name) {
            return Err(EditError::token_exists(set, &token.name));
        }
        tokens.insert_at(insert_at, token);
        insert_at += 1;
    }

    Ok(members.len())
}

/// Points every alias to `old` (or below it) at `new`, across all sets.
pub fn rewrite_aliases(sets: &mut TokenSets, old: &str, new: &str) {
    for tokens in sets.values_mut() {
        for token in tokens.iter_mut() {
            token.value = rewrite_references(&token.value, old, new);
        }
    }
}

fn join_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

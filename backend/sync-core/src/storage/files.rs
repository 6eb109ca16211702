//! Remote file layout shared by the git adapters.
//!
//! A `*.json` path holds every set in one nested document next to `$themes`
//! and `$metadata`. A directory path holds `<set>.json` per set plus
//! `$themes.json` and `$metadata.json`, and is only allowed when multi-file
//! sync is enabled.

use crate::error::storage::StorageError;

use models::{
    RemoteMetadata, RemoteTokenData, StorageProvider, ThemeObject, Token, TokenSet, TokenSets,
    TokenType, validate_token_name,
};

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_FILE_PATH: &str = "tokens.json";
pub const THEMES_KEY: &str = "$themes";
pub const METADATA_KEY: &str = "$metadata";
const JSON_EXTENSION: &str = ".json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileLayout {
    SingleFile(String),
    Directory(String),
}

/// One file read from or written to a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: String,
    pub content: String,
}

impl RemoteFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

impl FileLayout {
    /// Picks the layout for `path`.
    ///
    /// # Errors
    ///
    /// [`StorageError::MultiFilePermission`] for a directory path when
    /// multi-file sync is not enabled.
    #[track_caller]
    pub fn resolve(
        provider: StorageProvider,
        path: Option<&str>,
        multi_file: bool,
    ) -> Result<Self, StorageError> {
        let path = path
            .map(|p| p.trim_matches('/'))
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_FILE_PATH);

        if path.ends_with(JSON_EXTENSION) {
            return Ok(FileLayout::SingleFile(path.to_string()));
        }

        if !multi_file {
            return Err(StorageError::multi_file_permission(provider, path));
        }

        Ok(FileLayout::Directory(path.to_string()))
    }

    pub fn path(&self) -> &str {
        match self {
            FileLayout::SingleFile(path) | FileLayout::Directory(path) => path,
        }
    }

    pub fn is_multi_file(&self) -> bool {
        matches!(self, FileLayout::Directory(_))
    }

    /// Whether a repository file belongs to this layout.
    pub fn owns(&self, file_path: &str) -> bool {
        let file_path = file_path.trim_start_matches('/');
        match self {
            FileLayout::SingleFile(path) => file_path == path,
            FileLayout::Directory(dir) => {
                file_path.ends_with(JSON_EXTENSION)
                    && file_path
                        .strip_prefix(dir.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
        }
    }

    /// Files to write for `data`.
    pub fn encode(&self, data: &RemoteTokenData) -> Result<Vec<RemoteFile>, StorageError> {
        match self {
            FileLayout::SingleFile(path) => {
                let document = encode_document(data);
                Ok(vec![RemoteFile::new(path, to_pretty(&document)?)])
            }
            FileLayout::Directory(dir) => {
                let mut files = Vec::with_capacity(data.tokens.len() + 2);
                for (set_name, set) in &data.tokens {
                    files.push(RemoteFile::new(
                        format!("{dir}/{set_name}{JSON_EXTENSION}"),
                        to_pretty(&nest_token_set(set))?,
                    ));
                }
                files.push(RemoteFile::new(
                    format!("{dir}/{THEMES_KEY}{JSON_EXTENSION}"),
                    to_pretty(&data.themes)?,
                ));
                files.push(RemoteFile::new(
                    format!("{dir}/{METADATA_KEY}{JSON_EXTENSION}"),
                    to_pretty(&metadata_for(data))?,
                ));
                Ok(files)
            }
        }
    }

    /// Rebuilds token data from files previously produced by [`Self::encode`].
    pub fn decode(&self, files: &[RemoteFile]) -> Result<RemoteTokenData, StorageError> {
        match self {
            FileLayout::SingleFile(path) => {
                let Some(file) = files.iter().find(|f| f.path.trim_start_matches('/') == path) else {
                    return Ok(RemoteTokenData::default());
                };
                decode_document(&parse_content(&file.content)?)
            }
            FileLayout::Directory(dir) => {
                let mut tokens = TokenSets::new();
                let mut themes = Vec::new();
                let mut metadata = RemoteMetadata::default();

                for file in files {
                    let relative = file
                        .path
                        .trim_start_matches('/')
                        .strip_prefix(dir.as_str())
                        .map(|rest| rest.trim_start_matches('/'))
                        .and_then(|rest| rest.strip_suffix(JSON_EXTENSION));
                    let Some(name) = relative else {
                        continue;
                    };

                    let value = parse_content(&file.content)?;
                    match name {
                        THEMES_KEY => themes = serde_json::from_value(value)?,
                        METADATA_KEY => metadata = serde_json::from_value(value)?,
                        set_name => {
                            tokens.insert(set_name.to_string(), flatten_token_set(set_name, &value));
                        }
                    }
                }

                Ok(RemoteTokenData {
                    tokens: order_sets(tokens, &metadata.token_set_order, true),
                    themes,
                    metadata,
                    updated_at: None,
                })
            }
        }
    }
}

/// Single-file document: every set nested, plus `$themes` and `$metadata`.
pub fn encode_document(data: &RemoteTokenData) -> Value {
    let mut document = Map::new();
    for (set_name, set) in &data.tokens {
        document.insert(set_name.clone(), nest_token_set(set));
    }
    document.insert(
        THEMES_KEY.to_string(),
        serde_json::to_value(&data.themes).unwrap_or(Value::Array(Vec::new())),
    );
    document.insert(
        METADATA_KEY.to_string(),
        serde_json::to_value(metadata_for(data)).unwrap_or(Value::Object(Map::new())),
    );
    Value::Object(document)
}

pub fn decode_document(document: &Value) -> Result<RemoteTokenData, StorageError> {
    let Value::Object(entries) = document else {
        return Err(StorageError::payload("token document is not a JSON object"));
    };

    let mut tokens = TokenSets::new();
    let mut themes: Vec<ThemeObject> = Vec::new();
    let mut metadata = RemoteMetadata::default();

    for (key, value) in entries {
        match key.as_str() {
            THEMES_KEY => themes = serde_json::from_value(value.clone())?,
            METADATA_KEY => metadata = serde_json::from_value(value.clone())?,
            set_name if set_name.starts_with('$') => {
                warn!("Ignoring unknown reserved key '{}' in token document", set_name);
            }
            set_name => {
                tokens.insert(set_name.to_string(), flatten_token_set(set_name, value));
            }
        }
    }

    let sort_rest = !metadata.token_set_order.is_empty();
    Ok(RemoteTokenData {
        tokens: order_sets(tokens, &metadata.token_set_order, sort_rest),
        themes,
        metadata,
        updated_at: None,
    })
}

#[derive(Debug, Serialize, Deserialize)]
struct NestedToken {
    value: Value,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    token_type: Option<TokenType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

/// `sizing.xs` becomes `{"sizing": {"xs": {"value": .., "type": ..}}}`.
pub fn nest_token_set(set: &TokenSet) -> Value {
    let mut root = Map::new();

    for token in set {
        let leaf = NestedToken {
            value: token.value.clone(),
            token_type: Some(token.token_type),
            description: token.description.clone(),
        };
        let Ok(leaf) = serde_json::to_value(leaf) else {
            continue;
        };

        let segments: Vec<&str> = token.name.split('.').collect();
        insert_nested(&mut root, &segments, leaf);
    }

    Value::Object(root)
}

fn insert_nested(node: &mut Map<String, Value>, segments: &[&str], leaf: Value) {
    match segments {
        [] => {}
        [last] => {
            node.insert(last.to_string(), leaf);
        }
        [first, rest @ ..] => {
            let child = node
                .entry(first.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                warn!("Token group '{}' collides with a token of the same name", first);
                *child = Value::Object(Map::new());
            }
            if let Value::Object(map) = child {
                insert_nested(map, rest, leaf);
            }
        }
    }
}

/// Inverse of [`nest_token_set`]. Any object with a `value` key is a token.
pub fn flatten_token_set(set_name: &str, value: &Value) -> TokenSet {
    let mut tokens = Vec::new();
    if let Value::Object(entries) = value {
        flatten_into(&mut tokens, "", entries);
    }
    checked_token_set(set_name, tokens)
}

fn flatten_into(tokens: &mut Vec<Token>, prefix: &str, entries: &Map<String, Value>) {
    for (key, child) in entries {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };

        let Value::Object(fields) = child else {
            continue;
        };

        if fields.contains_key("value") {
            match serde_json::from_value::<NestedToken>(child.clone()) {
                Ok(nested) => tokens.push(Token {
                    name,
                    token_type: nested.token_type.unwrap_or(TokenType::Other),
                    value: nested.value,
                    description: nested.description,
                }),
                Err(e) => warn!("Skipping malformed token '{}': {}", name, e),
            }
        } else {
            flatten_into(tokens, &name, fields);
        }
    }
}

/// Collects tokens read from a remote or a stored document.
///
/// Names that fail validation are kept but logged, so a later edit can fix
/// them. A repeated name replaces the earlier token in its position.
pub fn checked_token_set(set_name: &str, tokens: impl IntoIterator<Item = Token>) -> TokenSet {
    let mut set = TokenSet::new();
    for token in tokens {
        if let Err(e) = validate_token_name(&token.name) {
            warn!("Set '{}' holds an invalid token name: {}", set_name, e);
        }
        if let Some(replaced) = set.insert(token) {
            warn!(
                "Set '{}' repeats token '{}', the later definition wins",
                set_name, replaced.name
            );
        }
    }
    set
}

/// Orders sets by `order`; the remaining sets follow, by name when `sort_rest`.
fn order_sets(mut tokens: TokenSets, order: &[String], sort_rest: bool) -> TokenSets {
    let mut ordered = TokenSets::with_capacity(tokens.len());
    for name in order {
        if let Some(set) = tokens.shift_remove(name) {
            ordered.insert(name.clone(), set);
        }
    }

    let mut rest: Vec<(String, TokenSet)> = tokens.into_iter().collect();
    if sort_rest {
        rest.sort_by(|(a, _), (b, _)| a.cmp(b));
    }
    ordered.extend(rest);
    ordered
}

fn metadata_for(data: &RemoteTokenData) -> RemoteMetadata {
    RemoteMetadata {
        token_set_order: data.tokens.keys().cloned().collect(),
    }
}

fn parse_content(content: &str) -> Result<Value, StorageError> {
    if content.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    Ok(serde_json::from_str(content)?)
}

pub fn to_pretty<T: Serialize + ?Sized>(value: &T) -> Result<String, StorageError> {
    Ok(serde_json::to_string_pretty(value)?)
}

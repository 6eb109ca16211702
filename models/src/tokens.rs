use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of design value a token holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenType {
    Color,
    Implementation,
    Sizing,
    Spacing,
    Dimension,
    BorderRadius,
    BorderWidth,
    Border,
    BoxShadow,
    Opacity,
    FontFamilies,
    FontWeights,
    FontSizes,
    LineHeights,
    LetterSpacing,
    ParagraphSpacing,
    Typography,
    Composition,
    TextCase,
    TextDecoration,
    Asset,
    #[serde(other)]
    Other,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Color => "color",
            TokenType::Implementation => "implementation",
            TokenType::Sizing => "sizing",
            TokenType::Spacing => "spacing",
            TokenType::Dimension => "dimension",
            TokenType::BorderRadius => "borderRadius",
            TokenType::BorderWidth => "borderWidth",
            TokenType::Border => "border",
            TokenType::BoxShadow => "boxShadow",
            TokenType::Opacity => "opacity",
            TokenType::FontFamilies => "fontFamilies",
            TokenType::FontWeights => "fontWeights",
            TokenType::FontSizes => "fontSizes",
            TokenType::LineHeights => "lineHeights",
            TokenType::LetterSpacing => "letterSpacing",
            TokenType::ParagraphSpacing => "paragraphSpacing",
            TokenType::Typography => "typography",
            TokenType::Composition => "composition",
            TokenType::TextCase => "textCase",
            TokenType::TextDecoration => "textDecoration",
            TokenType::Asset => "asset",
            TokenType::Other => "other",
        }
    }

    /// Whether `ref op number` expressions are evaluated for this type.
    /// For the others the expression is kept as a string template.
    pub fn allows_arithmetic(&self) -> bool {
        !matches!(
            self,
            TokenType::Color
                | TokenType::FontFamilies
                | TokenType::TextCase
                | TokenType::TextDecoration
                | TokenType::Asset
        )
    }

    /// Types whose value is a property bundle rather than a scalar.
    pub fn is_object_type(&self) -> bool {
        matches!(
            self,
            TokenType::BoxShadow | TokenType::Typography | TokenType::Composition | TokenType::Border
        )
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named design value as authored.
///
/// `value` holds the raw expression exactly as the user typed it, aliases
/// included. Resolution never writes back into a `Token`; the dereferenced
/// form only exists on [`crate::ResolvedToken`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub name: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Token {
    pub fn new(name: impl Into<String>, token_type: TokenType, value: Value) -> Self {
        Self {
            name: name.into(),
            token_type,
            value,
            description: None,
        }
    }

    pub fn raw_value(&self) -> &Value {
        &self.value
    }

    /// `true` when `name` equals `group` or lives below it (`group.*`).
    pub fn is_in_group(&self, group: &str) -> bool {
        self.name == group
            || (self.name.starts_with(group) && self.name[group.len()..].starts_with('.'))
    }
}

/// Ordered tokens of one named set, keyed by token name.
///
/// Serialised as a plain array of tokens, which is the `values` shape of
/// the persisted document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Token>", into = "Vec<Token>")]
pub struct TokenSet {
    tokens: IndexMap<String, Token>,
}

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Token> {
        self.tokens.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tokens.contains_key(name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.tokens.get_index_of(name)
    }

    /// Appends the token, or replaces a same-named one in place.
    pub fn insert(&mut self, token: Token) -> Option<Token> {
        self.tokens.insert(token.name.clone(), token)
    }

    /// Inserts at `index`, shifting later tokens down.
    pub fn insert_at(&mut self, index: usize, token: Token) {
        let index = index.min(self.tokens.len());
        self.tokens.shift_insert(index, token.name.clone(), token);
    }

    /// Removes while keeping the order of the remaining tokens.
    pub fn remove(&mut self, name: &str) -> Option<Token> {
        self.tokens.shift_remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.tokens.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Token> {
        self.tokens.values_mut()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tokens.keys().map(String::as_str)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&Token) -> bool) {
        self.tokens.retain(|_, token| keep(token));
    }
}

impl From<Vec<Token>> for TokenSet {
    fn from(tokens: Vec<Token>) -> Self {
        tokens.into_iter().collect()
    }
}

impl From<TokenSet> for Vec<Token> {
    fn from(set: TokenSet) -> Self {
        set.tokens.into_values().collect()
    }
}

impl FromIterator<Token> for TokenSet {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        let mut set = TokenSet::new();
        for token in iter {
            set.insert(token);
        }
        set
    }
}

impl<'a> IntoIterator for &'a TokenSet {
    type Item = &'a Token;
    type IntoIter = indexmap::map::Values<'a, String, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.values()
    }
}

/// Every token set of a document, in declared order.
pub type TokenSets = IndexMap<String, TokenSet>;

use crate::resolve::{TokenSetMerger, without_source_tokens};

use models::{
    BrokenReference, ThemeObject, Token, TokenSet, TokenSetStatus, TokenSets, TokenType,
    UsedTokenSets,
};

use serde_json::json;

fn sets() -> TokenSets {
    let mut sets = TokenSets::new();
    sets.insert(
        String::from("global"),
        TokenSet::from(vec![
            Token::new("color.primary", TokenType::Color, json!("#000000")),
            Token::new("sizing.base", TokenType::Sizing, json!(4)),
            Token::new("sizing.lg", TokenType::Sizing, json!("{sizing.base} * 4")),
        ]),
    );
    sets.insert(
        String::from("light"),
        TokenSet::from(vec![
            Token::new("color.primary", TokenType::Color, json!("#ffffff")),
            Token::new("color.text", TokenType::Color, json!("{color.primary}")),
        ]),
    );
    sets.insert(
        String::from("dense"),
        TokenSet::from(vec![Token::new("sizing.base", TokenType::Sizing, json!(2))]),
    );
    sets
}

fn used(entries: &[(&str, TokenSetStatus)]) -> UsedTokenSets {
    entries
        .iter()
        .map(|(name, status)| (name.to_string(), *status))
        .collect()
}

/// **VALUE**: Verifies the later enabled set wins a name clash.
///
/// **WHY THIS MATTERS**: Themes customise a base set by redefining names;
/// an alias in any set must see the winning definition.
///
/// **BUG THIS CATCHES**: First-wins merging, or aliases resolving against
/// the set they were declared in instead of the merged graph.
#[test]
fn given_name_in_two_enabled_sets_when_merged_then_later_set_wins() {
    // GIVEN
    let sets = sets();
    let merger = TokenSetMerger::new(&sets);
    let selection = used(&[
        ("global", TokenSetStatus::Enabled),
        ("light", TokenSetStatus::Enabled),
    ]);

    // WHEN
    let resolved = merger.merge(&selection);

    // THEN
    let primary = &resolved["color.primary"];
    assert_eq!(primary.value, json!("#ffffff"));
    assert_eq!(primary.set.as_deref(), Some("light"));
    assert_eq!(resolved["color.text"].value, json!("#ffffff"));
    assert_eq!(resolved["color.text"].raw_value, Some(json!("{color.primary}")));
}

#[test]
fn given_override_of_aliased_base_when_merged_then_dependent_tokens_follow() {
    // GIVEN
    let sets = sets();
    let merger = TokenSetMerger::new(&sets);
    let selection = used(&[
        ("global", TokenSetStatus::Enabled),
        ("dense", TokenSetStatus::Enabled),
    ]);

    // WHEN
    let resolved = merger.merge(&selection);

    // THEN: sizing.lg is declared in global but uses dense's base
    assert_eq!(resolved["sizing.lg"].value, json!(8));
}

/// **VALUE**: Verifies source sets are merged before enabled ones whatever
/// their declared position.
///
/// **WHY THIS MATTERS**: A source set is a base layer; declaring it after an
/// enabled set must not let it override the theme.
///
/// **BUG THIS CATCHES**: Merging in plain declared order.
#[test]
fn given_source_declared_last_when_merged_then_enabled_set_still_wins() {
    // GIVEN
    let sets = sets();
    let merger = TokenSetMerger::new(&sets);
    let selection = used(&[
        ("light", TokenSetStatus::Enabled),
        ("global", TokenSetStatus::Source),
    ]);

    // WHEN
    let order = merger.merge_order(&selection);
    let resolved = merger.merge(&selection);

    // THEN
    assert_eq!(order, vec!["global", "light"]);
    assert_eq!(resolved["color.primary"].value, json!("#ffffff"));
    assert_eq!(resolved["sizing.lg"].value, json!(16));
}

#[test]
fn given_disabled_and_unknown_sets_when_merged_then_they_are_skipped() {
    // GIVEN
    let sets = sets();
    let merger = TokenSetMerger::new(&sets);
    let selection = used(&[
        ("global", TokenSetStatus::Enabled),
        ("light", TokenSetStatus::Disabled),
        ("missing", TokenSetStatus::Enabled),
    ]);

    // WHEN
    let resolved = merger.merge(&selection);

    // THEN
    assert_eq!(merger.merge_order(&selection), vec!["global"]);
    assert_eq!(resolved["color.primary"].value, json!("#000000"));
    assert!(!resolved.contains_key("color.text"));
}

#[test]
fn given_same_selection_when_merged_twice_then_results_are_identical() {
    let sets = sets();
    let merger = TokenSetMerger::new(&sets);
    let selection = used(&[
        ("global", TokenSetStatus::Source),
        ("light", TokenSetStatus::Enabled),
    ]);

    assert_eq!(merger.merge(&selection), merger.merge(&selection));
}

#[test]
fn given_theme_when_merged_then_its_selection_is_used() {
    // GIVEN
    let sets = sets();
    let theme = ThemeObject::new("t-dense", "Dense")
        .with_set("global", TokenSetStatus::Enabled)
        .with_set("dense", TokenSetStatus::Enabled);

    // WHEN
    let resolved = TokenSetMerger::new(&sets).merge_theme(&theme);

    // THEN
    assert_eq!(resolved["sizing.base"].value, json!(2));
    assert_eq!(resolved["sizing.base"].set.as_deref(), Some("dense"));
}

/// **VALUE**: Verifies a broken token degrades alone.
///
/// **WHY THIS MATTERS**: One bad alias in a large document must not take
/// the whole resolution down; renderers show the raw expression instead.
///
/// **BUG THIS CATCHES**: Propagating the first resolution error out of the
/// merge.
#[test]
fn given_broken_alias_when_merged_then_only_that_token_is_flagged() {
    // GIVEN
    let mut sets = sets();
    if let Some(light) = sets.get_mut("light") {
        light.insert(Token::new("color.link", TokenType::Color, json!("{color.nope}")));
    }
    let selection = used(&[
        ("global", TokenSetStatus::Enabled),
        ("light", TokenSetStatus::Enabled),
    ]);

    // WHEN
    let resolved = TokenSetMerger::new(&sets).merge(&selection);

    // THEN
    let link = &resolved["color.link"];
    assert_eq!(link.value, json!("{color.nope}"));
    assert_eq!(
        link.broken,
        Some(BrokenReference::Missing {
            reference: String::from("color.nope")
        })
    );
    assert!(!resolved["color.text"].is_broken());
}

#[test]
fn given_every_set_when_merged_all_then_document_order_decides() {
    let sets = sets();

    let resolved = TokenSetMerger::new(&sets).merge_all();

    assert_eq!(resolved["color.primary"].value, json!("#ffffff"));
    assert_eq!(resolved["sizing.base"].value, json!(2));
    let names: Vec<&str> = resolved.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec!["color.primary", "sizing.base", "sizing.lg", "color.text"]
    );
}

#[test]
fn given_source_set_when_filtering_output_then_its_winning_tokens_are_dropped() {
    // GIVEN
    let sets = sets();
    let selection = used(&[
        ("global", TokenSetStatus::Source),
        ("light", TokenSetStatus::Enabled),
    ]);
    let resolved = TokenSetMerger::new(&sets).merge(&selection);

    // WHEN
    let visible = without_source_tokens(resolved, &selection);

    // THEN: color.primary is overridden by light, so it stays
    assert!(visible.contains_key("color.primary"));
    assert!(visible.contains_key("color.text"));
    assert!(!visible.contains_key("sizing.base"));
    assert!(!visible.contains_key("sizing.lg"));
}

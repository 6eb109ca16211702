use crate::graph::tree::{TreeItem, token_set_tree};

#[test]
fn given_flat_names_when_building_tree_then_every_item_is_a_root_leaf() {
    let items = token_set_tree(["global", "light"]);

    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|item| item.is_leaf && item.level == 0 && item.parent.is_none()));
}

/// **VALUE**: Verifies folders are emitted once, before their first set.
///
/// **WHY THIS MATTERS**: The set list is rendered top to bottom from this
/// output; a duplicated or late folder row breaks the indentation.
///
/// **BUG THIS CATCHES**: Emitting a folder per child, or appending folders
/// at the end.
#[test]
fn given_nested_names_when_building_tree_then_folders_precede_their_sets() {
    // GIVEN
    let names = ["brand/light", "brand/dark", "core", "brand/modes/hc"];

    // WHEN
    let items = token_set_tree(names);

    // THEN
    let paths: Vec<(&str, bool)> = items
        .iter()
        .map(|item| (item.path.as_str(), item.is_leaf))
        .collect();
    assert_eq!(
        paths,
        vec![
            ("brand", false),
            ("brand/light", true),
            ("brand/dark", true),
            ("core", true),
            ("brand/modes", false),
            ("brand/modes/hc", true),
        ]
    );

    let high_contrast = &items[5];
    assert_eq!(
        high_contrast,
        &TreeItem {
            key: String::from("brand/modes/hc"),
            path: String::from("brand/modes/hc"),
            parent: Some(String::from("brand/modes")),
            level: 2,
            label: String::from("hc"),
            is_leaf: true,
        }
    );
}

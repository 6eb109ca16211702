use serde::Serialize;

/// A folder or set entry for displaying `a/b/c` style set names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeItem {
    pub key: String,
    pub path: String,
    pub parent: Option<String>,
    pub level: usize,
    pub label: String,
    pub is_leaf: bool,
}

/// Builds folder and leaf items in first-seen order. Folders are emitted
/// once, just before the first set that lives in them.
pub fn token_set_tree<'a, I>(names: I) -> Vec<TreeItem>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut items: Vec<TreeItem> = Vec::new();

    for name in names {
        let segments: Vec<&str> = name.split('/').collect();
        let depth = segments.len() - 1;

        for level in 0..depth {
            let folder = segments[..=level].join("/");
            if items.iter().any(|item| !item.is_leaf && item.path == folder) {
                continue;
            }
            items.push(TreeItem {
                key: folder.clone(),
                path: folder,
                parent: parent_of(&segments, level),
                level,
                label: segments[level].to_string(),
                is_leaf: false,
            });
        }

        items.push(TreeItem {
            key: name.to_string(),
            path: name.to_string(),
            parent: parent_of(&segments, depth),
            level: depth,
            label: segments[depth].to_string(),
            is_leaf: true,
        });
    }

    items
}

fn parent_of(segments: &[&str], level: usize) -> Option<String> {
    (level > 0).then(|| segments[..level].join("/"))
}

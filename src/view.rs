use crate::error::StoreError;
use crate::store::{GameRow, GameStore};
use crate::tree::{Game, NodeId, Tree};

/// Catalog groupings, in the order the view-cycle command walks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Favorite,
    MostPlayed,
    Genre,
    All,
}

impl View {
    pub const ALL: [View; 4] = [View::Favorite, View::MostPlayed, View::Genre, View::All];

    pub fn title(&self) -> &'static str {
        match self {
            View::Favorite => "Favorites",
            View::MostPlayed => "Most Played",
            View::Genre => "Genres",
            View::All => "All",
        }
    }

    /// The view after this one, `None` at the end of the cycle.
    pub fn next(&self) -> Option<View> {
        match self {
            View::Favorite => Some(View::MostPlayed),
            View::MostPlayed => Some(View::Genre),
            View::Genre => Some(View::All),
            View::All => None,
        }
    }

    /// The view before this one, `None` at the start of the cycle.
    pub fn previous(&self) -> Option<View> {
        match self {
            View::Favorite => None,
            View::MostPlayed => Some(View::Favorite),
            View::Genre => Some(View::MostPlayed),
            View::All => Some(View::Genre),
        }
    }
}

/// Queries the store for `view` and assembles the rows into a fresh tree.
pub fn build_tree(
    store: &dyn GameStore,
    view: View,
    show_hidden: bool,
) -> Result<Tree, StoreError> {
    let rows = store.query_games(view, show_hidden)?;
    log::debug!("build_tree: {} rows for {}", rows.len(), view.title());
    Ok(assemble(view, rows))
}

/// Inserts rows in order. The genre view opens a new group whenever a row's
/// genre differs from the most recently appended group.
pub fn assemble(view: View, rows: Vec<GameRow>) -> Tree {
    let mut tree = Tree::new(view.title());
    let root = tree.root();

    for row in rows {
        let parent = match view {
            View::Favorite | View::MostPlayed | View::All => Some(root),
            View::Genre => genre_group(&mut tree, &row.genre),
        };
        let game = Game {
            rom: row.rom,
            name: row.name,
            params: row.params,
            favorite: row.favorite,
            broken: row.broken,
        };
        if let Some(parent) = parent {
            tree.add_game(parent, game);
        }
    }

    tree
}

fn genre_group(tree: &mut Tree, genre: &str) -> Option<NodeId> {
    let root = tree.root();
    let last = tree.menu(root).and_then(|m| m.last());
    match last {
        Some(group) if tree.text(group) == genre => Some(group),
        _ => tree.add_menu(root, genre),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(rom: &str, name: &str, genre: &str) -> GameRow {
        GameRow {
            rom: rom.to_string(),
            name: name.to_string(),
            params: None,
            genre: genre.to_string(),
            favorite: false,
            broken: false,
        }
    }

    fn child_texts(tree: &Tree, menu: NodeId) -> Vec<String> {
        tree.menu(menu)
            .unwrap()
            .children()
            .iter()
            .map(|&c| tree.text(c).to_string())
            .collect()
    }

    #[test]
    fn cycle_stops_at_both_ends() {
        assert_eq!(View::Favorite.previous(), None);
        assert_eq!(View::All.next(), None);
        let mut v = View::Favorite;
        let mut seen = vec![v];
        while let Some(n) = v.next() {
            seen.push(n);
            v = n;
        }
        assert_eq!(seen, View::ALL.to_vec());
        assert_eq!(View::Genre.previous(), Some(View::MostPlayed));
    }

    #[test]
    fn flat_views_append_to_root() {
        let rows = vec![
            row("dkong", "Donkey Kong", "Platform"),
            row("galaga", "Galaga", "Shooter"),
        ];
        let tree = assemble(View::All, rows);
        assert_eq!(tree.text(tree.root()), "All");
        assert_eq!(child_texts(&tree, tree.root()), vec!["Donkey Kong", "Galaga"]);
        let first = tree.selected(tree.root()).unwrap();
        assert_eq!(tree.game(first).unwrap().rom, "dkong");
    }

    #[test]
    fn genre_view_groups_consecutive_rows() {
        let rows = vec![
            row("a1", "Alpha", "Action"),
            row("a2", "Beta", "Action"),
            row("p1", "Columns", "Puzzle"),
            row("a3", "Zed", "Action"),
        ];
        let tree = assemble(View::Genre, rows);
        let root = tree.root();
        assert_eq!(child_texts(&tree, root), vec!["Action", "Puzzle", "Action"]);
        let groups = tree.menu(root).unwrap().children().to_vec();
        let sizes: Vec<usize> = groups.iter().map(|&g| tree.menu(g).unwrap().len()).collect();
        assert_eq!(sizes, vec![2, 1, 1]);
        assert_eq!(child_texts(&tree, groups[0]), vec!["Alpha", "Beta"]);
    }

    #[test]
    fn empty_rows_give_empty_root() {
        let tree = assemble(View::Favorite, Vec::new());
        assert!(!tree.node(tree.root()).has_children());
        assert_eq!(tree.text(tree.root()), "Favorites");
    }

    #[test]
    fn assembly_is_deterministic() {
        let rows = || vec![row("b", "B", "X"), row("a", "A", "Y"), row("c", "C", "Y")];
        let a = assemble(View::Genre, rows());
        let b = assemble(View::Genre, rows());
        assert_eq!(a.len(), b.len());
        let root = a.root();
        assert_eq!(child_texts(&a, root), child_texts(&b, root));
    }
}

//! Menu tree model.
//!
//! Nodes live in an arena owned by [`Tree`]. A menu's children are stored as
//! ids in display order, and every node keeps a non-owning link back to the
//! menu that contains it. Dropping the tree drops every node.

/// Index of a node inside its [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A leaf entry for one emulated title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub rom: String,
    pub name: String,
    pub params: Option<String>,
    pub favorite: bool,
    pub broken: bool,
}

impl Game {
    pub fn new(rom: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            rom: rom.into(),
            name: name.into(),
            params: None,
            favorite: false,
            broken: false,
        }
    }

    pub fn toggle_favorite(&mut self) {
        self.favorite = !self.favorite;
    }

    pub fn set_broken(&mut self, broken: bool) {
        self.broken = broken;
    }
}

/// A non-leaf node with an ordered child list and a selection cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Menu {
    children: Vec<NodeId>,
    selected: Option<usize>,
}

impl Menu {
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Raw selection index, `None` while the menu is empty.
    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected.map(|i| self.children[i])
    }

    /// The most recently appended child.
    pub fn last(&self) -> Option<NodeId> {
        self.children.last().copied()
    }

    fn move_to(&mut self, index: usize) -> bool {
        if self.selected == Some(index) {
            return false;
        }
        self.selected = Some(index);
        true
    }

    pub fn select_previous(&mut self) -> bool {
        self.select_previous_page(1)
    }

    pub fn select_next(&mut self) -> bool {
        self.select_next_page(1)
    }

    pub fn select_previous_page(&mut self, n: usize) -> bool {
        match self.selected {
            Some(i) => self.move_to(i.saturating_sub(n)),
            None => false,
        }
    }

    pub fn select_next_page(&mut self, n: usize) -> bool {
        match self.selected {
            Some(i) => {
                let last = self.children.len() - 1;
                self.move_to(i.saturating_add(n).min(last))
            }
            None => false,
        }
    }

    /// Sets the raw selection index, clamped to the last child.
    pub fn select_index(&mut self, index: usize) {
        if self.children.is_empty() {
            self.selected = None;
        } else {
            self.selected = Some(index.min(self.children.len() - 1));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Menu(Menu),
    Game(Game),
}

#[derive(Debug, Clone)]
pub struct Node {
    text: String,
    parent: Option<NodeId>,
    item: Item,
}

impl Node {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn item(&self) -> &Item {
        &self.item
    }

    pub fn has_children(&self) -> bool {
        matches!(&self.item, Item::Menu(m) if !m.is_empty())
    }

    pub fn as_menu(&self) -> Option<&Menu> {
        match &self.item {
            Item::Menu(m) => Some(m),
            Item::Game(_) => None,
        }
    }

    pub fn as_game(&self) -> Option<&Game> {
        match &self.item {
            Item::Game(g) => Some(g),
            Item::Menu(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Creates a tree holding only an empty root menu.
    pub fn new(root_text: impl Into<String>) -> Self {
        Self {
            nodes: vec![Node {
                text: root_text.into(),
                parent: None,
                item: Item::Menu(Menu::default()),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn text(&self, id: NodeId) -> &str {
        self.node(id).text()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn menu(&self, id: NodeId) -> Option<&Menu> {
        self.node(id).as_menu()
    }

    pub fn menu_mut(&mut self, id: NodeId) -> Option<&mut Menu> {
        match &mut self.nodes[id.0].item {
            Item::Menu(m) => Some(m),
            Item::Game(_) => None,
        }
    }

    pub fn game(&self, id: NodeId) -> Option<&Game> {
        self.node(id).as_game()
    }

    pub fn game_mut(&mut self, id: NodeId) -> Option<&mut Game> {
        match &mut self.nodes[id.0].item {
            Item::Game(g) => Some(g),
            Item::Menu(_) => None,
        }
    }

    /// Currently selected child of `menu`.
    pub fn selected(&self, menu: NodeId) -> Option<NodeId> {
        self.menu(menu).and_then(Menu::selected)
    }

    /// Appends an empty submenu to `parent`. Returns `None` if `parent` is a game.
    pub fn add_menu(&mut self, parent: NodeId, text: impl Into<String>) -> Option<NodeId> {
        self.add_child(parent, text.into(), Item::Menu(Menu::default()))
    }

    /// Appends a game to `parent`, displayed by its name.
    pub fn add_game(&mut self, parent: NodeId, game: Game) -> Option<NodeId> {
        let text = game.name.clone();
        self.add_child(parent, text, Item::Game(game))
    }

    fn add_child(&mut self, parent: NodeId, text: String, item: Item) -> Option<NodeId> {
        self.menu(parent)?;
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            text,
            parent: Some(parent),
            item,
        });
        let menu = self.menu_mut(parent)?;
        menu.children.push(id);
        if menu.selected.is_none() {
            menu.selected = Some(0);
        }
        Some(id)
    }

    /// Jumps to the nearest earlier sibling whose first character differs.
    pub fn select_previous_alpha(&mut self, menu: NodeId) -> bool {
        self.select_alpha(menu, false)
    }

    /// Jumps to the nearest later sibling whose first character differs.
    pub fn select_next_alpha(&mut self, menu: NodeId) -> bool {
        self.select_alpha(menu, true)
    }

    fn select_alpha(&mut self, menu: NodeId, forward: bool) -> bool {
        let Some(m) = self.menu(menu) else {
            return false;
        };
        let Some(start) = m.selected else {
            return false;
        };
        let lead = |id: NodeId| self.text(id).chars().next();
        let current = lead(m.children[start]);

        let target = if forward {
            (start + 1..m.children.len()).find(|&i| lead(m.children[i]) != current)
        } else {
            (0..start).rev().find(|&i| lead(m.children[i]) != current)
        };

        match (target, self.menu_mut(menu)) {
            (Some(i), Some(m)) => m.move_to(i),
            _ => false,
        }
    }
}

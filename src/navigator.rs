//! The control loop.
//!
//! [`Navigator`] owns the menu tree and all collaborators. Events are decoded
//! one at a time on the calling thread; every state change re-arms the snapshot
//! timer and redraws the current menu.

use std::path::PathBuf;

use crate::config::{Settings, ROM_TOKEN};
use crate::error::Result;
use crate::event::{Event, EventSource, TimerKey};
use crate::input::{Command, InputDecoder};
use crate::launch::{self, ProcessRunner};
use crate::render::Renderer;
use crate::store::GameStore;
use crate::timer::Timers;
use crate::tree::{Item, Menu, NodeId, Tree};
use crate::view::{build_tree, View};

pub struct Navigator<S, R, P, T> {
    settings: Settings,
    decoder: InputDecoder,
    store: S,
    renderer: R,
    runner: P,
    timers: T,
    view: View,
    tree: Tree,
    current: NodeId,
    show_hidden: bool,
    running: bool,
}

impl<S, R, P, T> Navigator<S, R, P, T>
where
    S: GameStore,
    R: Renderer,
    P: ProcessRunner,
    T: Timers,
{
    /// Builds the favorites view. Fails if the catalog cannot be queried.
    pub fn new(
        settings: Settings,
        store: S,
        renderer: R,
        runner: P,
        timers: T,
        show_hidden: bool,
    ) -> Result<Self> {
        if !settings.paths.launch.contains(ROM_TOKEN) {
            log::warn!(
                "launch path '{}' has no {} specifier, games will not start",
                settings.paths.launch,
                ROM_TOKEN
            );
        }
        let view = View::Favorite;
        let tree = build_tree(&store, view, show_hidden)?;
        let current = tree.root();
        Ok(Navigator {
            decoder: InputDecoder::new(&settings),
            settings,
            store,
            renderer,
            runner,
            timers,
            view,
            tree,
            current,
            show_hidden,
            running: true,
        })
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn current(&self) -> NodeId {
        self.current
    }

    pub fn show_hidden(&self) -> bool {
        self.show_hidden
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn runner(&self) -> &P {
        &self.runner
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }

    /// Selection index in the menu being browsed.
    pub fn selected_index(&self) -> Option<usize> {
        self.current_menu().and_then(Menu::selected_index)
    }

    /// Display text of the selected entry.
    pub fn selected_text(&self) -> Option<&str> {
        self.tree
            .selected(self.current)
            .map(|id| self.tree.text(id))
    }

    /// Consumes events until a quit command or the end of the source.
    pub fn run(&mut self, events: &mut dyn EventSource) -> Result<()> {
        log::info!("main_loop: starting in {}", self.view.title());
        self.running = true;
        self.render();
        self.reset_snap_timer();

        let mut result = Ok(());
        while self.running {
            let Some(event) = events.next_event() else {
                break;
            };
            if let Err(e) = self.handle_event(event) {
                result = Err(e);
                break;
            }
        }

        self.timers.cancel_all();
        log::info!("main_loop: stopped");
        result
    }

    pub fn handle_event(&mut self, event: Event) -> Result<()> {
        let decoded = self.decoder.decode(event);
        if let Some(command) = decoded.command {
            log::debug!("command: {:?}", command);
            self.dispatch(command)?;
        }
        if let Some(request) = decoded.timer {
            request.apply(&mut self.timers);
        }
        Ok(())
    }

    pub fn dispatch(&mut self, command: Command) -> Result<()> {
        match command {
            Command::MoveUp => {
                let changed = self.current_menu_mut().map_or(false, Menu::select_previous);
                self.changed(changed);
            }
            Command::MoveDown => {
                let changed = self.current_menu_mut().map_or(false, Menu::select_next);
                self.changed(changed);
            }
            Command::PageUp => {
                let page = self.renderer.page_size();
                let changed = self
                    .current_menu_mut()
                    .map_or(false, |m| m.select_previous_page(page));
                self.changed(changed);
            }
            Command::PageDown => {
                let page = self.renderer.page_size();
                let changed = self
                    .current_menu_mut()
                    .map_or(false, |m| m.select_next_page(page));
                self.changed(changed);
            }
            Command::AlphaUp => {
                let changed = self.tree.select_previous_alpha(self.current);
                self.changed(changed);
            }
            Command::AlphaDown => {
                let changed = self.tree.select_next_alpha(self.current);
                self.changed(changed);
            }
            Command::CycleViewUp => {
                if let Some(view) = self.view.next() {
                    self.change_view(view)?;
                    self.changed(true);
                }
            }
            Command::CycleViewDown => {
                if let Some(view) = self.view.previous() {
                    self.change_view(view)?;
                    self.changed(true);
                }
            }
            Command::Activate => self.activate()?,
            Command::Back => {
                if self.current != self.tree.root() {
                    if let Some(parent) = self.tree.parent(self.current) {
                        self.current = parent;
                        self.changed(true);
                    }
                }
            }
            Command::ToggleFavorite => self.toggle_favorite()?,
            Command::ToggleHidden => {
                self.show_hidden = !self.show_hidden;
                log::info!("show hidden: {}", self.show_hidden);
                self.change_view(self.view)?;
                self.changed(true);
            }
            Command::RefreshSnapshot => self.update_snap(),
            Command::Quit => self.running = false,
        }
        Ok(())
    }

    fn current_menu(&self) -> Option<&Menu> {
        self.tree.menu(self.current)
    }

    fn current_menu_mut(&mut self) -> Option<&mut Menu> {
        self.tree.menu_mut(self.current)
    }

    fn changed(&mut self, changed: bool) {
        if changed {
            self.reset_snap_timer();
            self.render();
        }
    }

    fn render(&mut self) {
        self.renderer.render(&self.tree, self.current);
    }

    fn reset_snap_timer(&mut self) {
        self.timers
            .arm(TimerKey::Snapshot, self.settings.delays.snapshot);
    }

    /// Replaces the tree with a fresh build of `view` and returns to its root.
    fn change_view(&mut self, view: View) -> Result<()> {
        let tree = build_tree(&self.store, view, self.show_hidden)?;
        log::info!("change_view: {}", view.title());
        self.view = view;
        self.tree = tree;
        self.current = self.tree.root();
        Ok(())
    }

    fn activate(&mut self) -> Result<()> {
        let Some(selected) = self.tree.selected(self.current) else {
            return Ok(());
        };
        match self.tree.node(selected).item() {
            Item::Menu(_) => {
                self.current = selected;
                self.changed(true);
                Ok(())
            }
            Item::Game(_) => self.run_game(selected),
        }
    }

    fn run_game(&mut self, selected: NodeId) -> Result<()> {
        let Some(game) = self.tree.game(selected) else {
            return Ok(());
        };
        let tree = &self.tree;
        let current = self.current;
        let success = launch::launch(
            game,
            &self.settings.paths.launch,
            &mut self.renderer,
            &mut self.runner,
            &mut self.store,
            |r| r.render(tree, current),
        )?;

        if let Some(game) = self.tree.game_mut(selected) {
            game.set_broken(!success);
        }
        self.render();
        Ok(())
    }

    fn toggle_favorite(&mut self) -> Result<()> {
        let Some(selected) = self.tree.selected(self.current) else {
            return Ok(());
        };
        let Some(game) = self.tree.game_mut(selected) else {
            return Ok(());
        };
        game.toggle_favorite();
        let rom = game.rom.clone();
        let favorite = game.favorite;
        log::debug!("toggle_favorite: {}: {}", rom, favorite);

        self.store.update_favorite(&rom, favorite)?;

        if self.view == View::Favorite {
            // the toggled game may have left or joined the view
            let index = self.selected_index().unwrap_or(0);
            self.change_view(self.view)?;
            if let Some(menu) = self.current_menu_mut() {
                menu.select_index(index);
            }
            self.reset_snap_timer();
        }

        self.render();
        Ok(())
    }

    fn update_snap(&mut self) {
        let Some(selected) = self.tree.selected(self.current) else {
            return;
        };
        let snapshot = self.snapshot_for(selected);
        self.renderer.show_snapshot(snapshot.as_deref());
        self.render();
    }

    fn snapshot_for(&self, id: NodeId) -> Option<PathBuf> {
        let game = self.tree.game(id)?;
        let path = self
            .settings
            .paths
            .snapshots
            .join(format!("{}.bmp", game.rom));
        path.is_file().then_some(path)
    }
}

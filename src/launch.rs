use std::io;
use std::process::Command;

use crate::config::{PARAMS_TOKEN, ROM_TOKEN};
use crate::error::{LauncherError, Result};
use crate::render::Renderer;
use crate::store::GameStore;
use crate::tree::Game;

/// Runs an emulator command line to completion.
pub trait ProcessRunner {
    /// Returns whether the program exited successfully.
    fn run(&mut self, command: &str) -> io::Result<bool>;
}

/// Hands the command line to the platform shell and waits for it.
#[derive(Debug, Default)]
pub struct ShellRunner;

impl ProcessRunner for ShellRunner {
    fn run(&mut self, command: &str) -> io::Result<bool> {
        let mut child = shell(command).spawn()?;
        log::info!("Launched emulator with pid={}", child.id());
        let status = child.wait()?;
        log::info!("Emulator exited with {}", status);
        Ok(status.success())
    }
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", command]);
    cmd
}

#[cfg(not(windows))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", command]);
    cmd
}

/// Builds the command line for `game`. The first `%r` receives the rom id and
/// every `%p` outside it receives the game's params.
pub fn resolve_command(template: &str, game: &Game) -> Result<String> {
    let pos = template.find(ROM_TOKEN).ok_or_else(|| {
        LauncherError::Configuration(format!("launch path missing {} specifier", ROM_TOKEN))
    })?;
    let params = game.params.as_deref().unwrap_or("");
    let head = template[..pos].replace(PARAMS_TOKEN, params);
    let tail = template[pos + ROM_TOKEN.len()..].replace(PARAMS_TOKEN, params);
    Ok(format!("{}{}{}", head, game.rom, tail))
}

/// Runs one game session.
///
/// The display is torn down for the duration of the emulator and always
/// restored afterwards; `redraw` is called once it is back. The outcome is then
/// written to the store. Returns whether the emulator exited cleanly.
pub fn launch(
    game: &Game,
    template: &str,
    renderer: &mut dyn Renderer,
    runner: &mut dyn ProcessRunner,
    store: &mut dyn GameStore,
    redraw: impl FnOnce(&mut dyn Renderer),
) -> Result<bool> {
    let cmd = resolve_command(template, game)?;
    log::info!("launch: {} ({})", game.name, game.rom);
    log::debug!("launch: {}", cmd);

    renderer.destroy_presentation();
    let success = match runner.run(&cmd) {
        Ok(success) => success,
        Err(e) => {
            log::warn!("Failed to run emulator for {}: {}", game.rom, e);
            false
        }
    };
    let restored = renderer.setup_presentation();
    if restored.is_ok() {
        redraw(renderer);
    }

    if !success {
        log::warn!("launch: {} failed, marking as broken", game.rom);
    }
    store.update_play_stats(&game.rom, success)?;
    restored.map_err(LauncherError::Presentation)?;
    Ok(success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::GameRow;
    use crate::tree::{NodeId, Tree};
    use crate::view::View;
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    struct LogRenderer {
        log: Log,
        fail_setup: bool,
    }

    impl Renderer for LogRenderer {
        fn render(&mut self, _tree: &Tree, _current: NodeId) {
            self.log.borrow_mut().push("render".into());
        }
        fn destroy_presentation(&mut self) {
            self.log.borrow_mut().push("destroy".into());
        }
        fn setup_presentation(&mut self) -> std::result::Result<(), String> {
            self.log.borrow_mut().push("setup".into());
            if self.fail_setup {
                Err("no display".into())
            } else {
                Ok(())
            }
        }
        fn show_snapshot(&mut self, _image: Option<&Path>) {}
        fn page_size(&self) -> usize {
            10
        }
    }

    struct LogRunner {
        log: Log,
        result: Option<bool>,
    }

    impl ProcessRunner for LogRunner {
        fn run(&mut self, command: &str) -> io::Result<bool> {
            self.log.borrow_mut().push(format!("run {}", command));
            self.result
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such program"))
        }
    }

    struct LogStore {
        log: Log,
    }

    impl GameStore for LogStore {
        fn query_games(
            &self,
            _view: View,
            _show_hidden: bool,
        ) -> std::result::Result<Vec<GameRow>, StoreError> {
            Ok(Vec::new())
        }
        fn update_favorite(
            &mut self,
            _rom: &str,
            _favorite: bool,
        ) -> std::result::Result<(), StoreError> {
            Ok(())
        }
        fn update_play_stats(
            &mut self,
            rom: &str,
            success: bool,
        ) -> std::result::Result<(), StoreError> {
            self.log.borrow_mut().push(format!("stats {} {}", rom, success));
            Ok(())
        }
    }

    fn pacman() -> Game {
        Game::new("pacman", "Pac-Man")
    }

    fn session(
        result: Option<bool>,
        fail_setup: bool,
        template: &str,
    ) -> (Result<bool>, Vec<String>) {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let mut renderer = LogRenderer { log: log.clone(), fail_setup };
        let mut runner = LogRunner { log: log.clone(), result };
        let mut store = LogStore { log: log.clone() };
        let out = launch(&pacman(), template, &mut renderer, &mut runner, &mut store, |r| {
            r.render(&Tree::new("x"), Tree::new("x").root())
        });
        let entries = log.borrow().clone();
        (out, entries)
    }

    #[test]
    fn substitutes_rom() {
        assert_eq!(resolve_command("mame %r", &pacman()).unwrap(), "mame pacman");
        assert_eq!(
            resolve_command("mame %r -skip_gameinfo", &pacman()).unwrap(),
            "mame pacman -skip_gameinfo"
        );
    }

    #[test]
    fn substitutes_params() {
        let mut g = pacman();
        g.params = Some("-nofilter".into());
        assert_eq!(resolve_command("mame %p %r", &g).unwrap(), "mame -nofilter pacman");
        assert_eq!(resolve_command("mame %r %p", &pacman()).unwrap(), "mame pacman ");
    }

    #[test]
    fn missing_placeholder_is_configuration_error() {
        let err = resolve_command("mame", &pacman()).unwrap_err();
        assert!(matches!(err, LauncherError::Configuration(_)));
    }

    #[test]
    fn lifecycle_order_on_success() {
        let (out, log) = session(Some(true), false, "mame %r");
        assert!(out.unwrap());
        assert_eq!(
            log,
            vec!["destroy", "run mame pacman", "setup", "render", "stats pacman true"]
        );
    }

    #[test]
    fn failed_exit_marks_broken() {
        let (out, log) = session(Some(false), false, "mame %r");
        assert!(!out.unwrap());
        assert_eq!(log.last().unwrap(), "stats pacman false");
    }

    #[test]
    fn spawn_failure_still_restores_display() {
        let (out, log) = session(None, false, "mame %r");
        assert!(!out.unwrap());
        assert_eq!(
            log,
            vec!["destroy", "run mame pacman", "setup", "render", "stats pacman false"]
        );
    }

    #[test]
    fn bad_template_spawns_nothing() {
        let (out, log) = session(Some(true), false, "mame");
        assert!(matches!(out, Err(LauncherError::Configuration(_))));
        assert!(log.is_empty());
    }

    #[test]
    fn lost_display_is_reported_after_stats() {
        let (out, log) = session(Some(true), true, "mame %r");
        assert!(matches!(out, Err(LauncherError::Presentation(_))));
        assert_eq!(log, vec!["destroy", "run mame pacman", "setup", "stats pacman true"]);
    }

    #[cfg(unix)]
    #[test]
    fn shell_runner_reports_exit_status() {
        let mut runner = ShellRunner;
        assert!(runner.run("true").unwrap());
        assert!(!runner.run("exit 3").unwrap());
    }
}

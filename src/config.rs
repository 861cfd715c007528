use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder in the launch template that receives the rom id.
pub const ROM_TOKEN: &str = "%r";
/// Optional placeholder that receives the game's launch params.
pub const PARAMS_TOKEN: &str = "%p";

// SDL2 key codes and KMOD_* masks used when the config leaves a binding out.
const SDLK_ESCAPE: i32 = 27;
const SDLK_RETURN: i32 = 13;
const SDLK_BACKSPACE: i32 = 8;
const SDLK_F: i32 = 102;
const SDLK_H: i32 = 104;
const SDLK_UP: i32 = 1073741906;
const SDLK_DOWN: i32 = 1073741905;
const SDLK_PAGEUP: i32 = 1073741899;
const SDLK_PAGEDOWN: i32 = 1073741902;
const KMOD_SHIFT: u16 = 0x0003;
const KMOD_CTRL: u16 = 0x00c0;

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct KeysSection {
    pub exit: Option<i32>,
    pub up: Option<i32>,
    pub down: Option<i32>,
    pub page_up: Option<i32>,
    pub page_down: Option<i32>,
    pub select: Option<i32>,
    pub back: Option<i32>,
    pub favorite: Option<i32>,
    pub toggle_hidden: Option<i32>,
    pub alpha_modifier: Option<u16>,
    pub view_modifier: Option<u16>,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct JoystickSection {
    pub axis_up_down: Option<i32>,
    pub axis_left_right: Option<i32>,
    pub button_select: Option<u8>,
    pub button_back: Option<u8>,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct DelaysSection {
    pub snapshot: Option<u64>,
    pub repeat_delay: Option<u64>,
    pub repeat_period: Option<u64>,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct PathsSection {
    pub launch: Option<String>,
    pub database: Option<String>,
    pub snapshots: Option<String>,
    pub roms: Option<String>,
    pub font: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct StyleSection {
    pub background: Option<[u8; 3]>,
    pub tile_selected: Option<[u8; 3]>,
    pub tile_normal: Option<[u8; 3]>,
    pub text_primary: Option<[u8; 3]>,
    pub text_menu: Option<[u8; 3]>,
    pub text_favorite: Option<[u8; 3]>,
    pub text_broken: Option<[u8; 3]>,
    pub banner_bg: Option<[u8; 3]>,
    pub banner_text: Option<[u8; 3]>,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct ConfigFile {
    pub keys: KeysSection,
    pub joystick: JoystickSection,
    pub delays: DelaysSection,
    pub paths: PathsSection,
    pub style: StyleSection,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyBindings {
    pub exit: i32,
    pub up: i32,
    pub down: i32,
    pub page_up: i32,
    pub page_down: i32,
    pub select: i32,
    pub back: i32,
    pub favorite: i32,
    pub toggle_hidden: i32,
    pub alpha_modifier: u16,
    pub view_modifier: u16,
}

/// A joystick axis: zero-based index plus a polarity of +1 or -1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AxisBinding {
    pub index: u8,
    pub reverse: i32,
}

impl AxisBinding {
    /// Decodes the config form: 1-based axis number, negative to reverse, 0 for none.
    pub fn from_config(value: i32) -> Option<Self> {
        if value == 0 {
            return None;
        }
        let index = u8::try_from(value.unsigned_abs() - 1).ok()?;
        Some(AxisBinding {
            index,
            reverse: value.signum(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoystickBindings {
    pub up_down: Option<AxisBinding>,
    pub left_right: Option<AxisBinding>,
    /// 1-based button numbers.
    pub select: u8,
    pub back: u8,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delays {
    pub snapshot: Duration,
    pub repeat_delay: Duration,
    pub repeat_period: Duration,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Paths {
    pub launch: String,
    pub database: PathBuf,
    pub snapshots: PathBuf,
    pub roms: Option<PathBuf>,
    pub font: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Style {
    pub background: [u8; 3],
    pub tile_selected: [u8; 3],
    pub tile_normal: [u8; 3],
    pub text_primary: [u8; 3],
    pub text_menu: [u8; 3],
    pub text_favorite: [u8; 3],
    pub text_broken: [u8; 3],
    pub banner_bg: [u8; 3],
    pub banner_text: [u8; 3],
}

/// Fully resolved settings shared by the navigator, decoder and frontend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub keys: KeyBindings,
    pub joystick: JoystickBindings,
    pub delays: Delays,
    pub paths: Paths,
    pub style: Style,
}

impl ConfigFile {
    /// Fills every missing value with its default. Relative paths are taken
    /// relative to `base`, normally the directory holding the config file.
    pub fn resolve(&self, base: &Path) -> Settings {
        let k = &self.keys;
        let keys = KeyBindings {
            exit: k.exit.unwrap_or(SDLK_ESCAPE),
            up: k.up.unwrap_or(SDLK_UP),
            down: k.down.unwrap_or(SDLK_DOWN),
            page_up: k.page_up.unwrap_or(SDLK_PAGEUP),
            page_down: k.page_down.unwrap_or(SDLK_PAGEDOWN),
            select: k.select.unwrap_or(SDLK_RETURN),
            back: k.back.unwrap_or(SDLK_BACKSPACE),
            favorite: k.favorite.unwrap_or(SDLK_F),
            toggle_hidden: k.toggle_hidden.unwrap_or(SDLK_H),
            alpha_modifier: k.alpha_modifier.unwrap_or(KMOD_SHIFT),
            view_modifier: k.view_modifier.unwrap_or(KMOD_CTRL),
        };

        let j = &self.joystick;
        let joystick = JoystickBindings {
            up_down: AxisBinding::from_config(j.axis_up_down.unwrap_or(-2)),
            left_right: AxisBinding::from_config(j.axis_left_right.unwrap_or(1)),
            select: j.button_select.unwrap_or(1),
            back: j.button_back.unwrap_or(2),
        };

        let d = &self.delays;
        let delays = Delays {
            snapshot: Duration::from_millis(d.snapshot.unwrap_or(500)),
            repeat_delay: Duration::from_millis(d.repeat_delay.unwrap_or(250)),
            repeat_period: Duration::from_millis(d.repeat_period.unwrap_or(50)),
        };

        let p = &self.paths;
        let paths = Paths {
            launch: p.launch.clone().unwrap_or_else(|| format!("mame {}", ROM_TOKEN)),
            database: resolve_path(base, p.database.as_deref().unwrap_or("games.db")),
            snapshots: resolve_path(base, p.snapshots.as_deref().unwrap_or("snap")),
            roms: p.roms.as_deref().map(|r| resolve_path(base, r)),
            font: p.font.as_deref().map(|f| resolve_path(base, f)),
        };

        let s = &self.style;
        let style = Style {
            background: s.background.unwrap_or([12, 12, 12]),
            tile_selected: s.tile_selected.unwrap_or([200, 180, 50]),
            tile_normal: s.tile_normal.unwrap_or([60, 60, 60]),
            text_primary: s.text_primary.unwrap_or([240, 240, 240]),
            text_menu: s.text_menu.unwrap_or([140, 200, 255]),
            text_favorite: s.text_favorite.unwrap_or([255, 215, 90]),
            text_broken: s.text_broken.unwrap_or([200, 70, 70]),
            banner_bg: s.banner_bg.unwrap_or([20, 20, 20]),
            banner_text: s.banner_text.unwrap_or([220, 220, 220]),
        };

        Settings {
            keys,
            joystick,
            delays,
            paths,
            style,
        }
    }
}

impl Settings {
    pub fn defaults() -> Self {
        ConfigFile::default().resolve(Path::new("."))
    }
}

fn resolve_path(base: &Path, value: &str) -> PathBuf {
    let p = PathBuf::from(value);
    if p.is_absolute() {
        p
    } else {
        base.join(p)
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        let mut p = PathBuf::from(xdg);
        p.push("arcade_launcher");
        p.push("config.toml");
        Some(p)
    } else if let Some(home) = dirs::home_dir() {
        let mut p = home;
        p.push(".config/arcade_launcher/config.toml");
        Some(p)
    } else {
        None
    }
}

fn write_default_config(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let sample = include_str!("../config.sample.toml");
    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, sample.as_bytes())?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

pub fn parse_config(contents: &str) -> Result<ConfigFile, toml::de::Error> {
    toml::from_str::<ConfigFile>(contents)
}

/// Loads the config at `path` (or the user config location), writing the
/// sample first if nothing exists yet. Unreadable or invalid files fall back
/// to defaults.
pub fn load_settings(path: Option<&Path>) -> Settings {
    let path = path.map(Path::to_path_buf).or_else(user_config_path);
    let Some(p) = path else {
        log::warn!("No config location available, using defaults");
        return Settings::defaults();
    };

    if !p.exists() {
        if let Err(e) = write_default_config(&p) {
            log::warn!("Failed to write default config: {}", e);
        }
    }

    let base = p.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    let cfg = match std::fs::read_to_string(&p) {
        Ok(contents) => match parse_config(&contents) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("Failed to parse config at {}: {}", p.display(), e);
                ConfigFile::default()
            }
        },
        Err(e) => {
            log::warn!("Failed to read config at {}: {}", p.display(), e);
            ConfigFile::default()
        }
    };
    log::info!("Loaded config from {}", p.display());
    cfg.resolve(&base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_resolves_to_defaults() {
        let s = parse_config("").unwrap().resolve(Path::new("/etc/arcade"));
        assert_eq!(s.keys.exit, SDLK_ESCAPE);
        assert_eq!(s.keys.alpha_modifier, KMOD_SHIFT);
        assert_eq!(s.delays.snapshot, Duration::from_millis(500));
        assert_eq!(s.delays.repeat_delay, Duration::from_millis(250));
        assert_eq!(s.delays.repeat_period, Duration::from_millis(50));
        assert_eq!(s.paths.launch, "mame %r");
        assert_eq!(s.paths.database, PathBuf::from("/etc/arcade/games.db"));
        assert_eq!(s.paths.roms, None);
        assert_eq!(
            s.joystick.up_down,
            Some(AxisBinding { index: 1, reverse: -1 })
        );
        assert_eq!(
            s.joystick.left_right,
            Some(AxisBinding { index: 0, reverse: 1 })
        );
    }

    #[test]
    fn sections_override_defaults() {
        let text = r#"
            [keys]
            up = 119
            view_modifier = 256

            [joystick]
            axis_up_down = 0
            axis_left_right = -3
            button_select = 5

            [delays]
            snapshot = 1000

            [paths]
            launch = "/usr/games/mame -rompath /roms %r"
            database = "/var/lib/arcade/games.db"
            roms = "roms"

            [style]
            background = [1, 2, 3]
        "#;
        let s = parse_config(text).unwrap().resolve(Path::new("/home/cab"));
        assert_eq!(s.keys.up, 119);
        assert_eq!(s.keys.down, SDLK_DOWN);
        assert_eq!(s.keys.view_modifier, 256);
        assert_eq!(s.joystick.up_down, None);
        assert_eq!(
            s.joystick.left_right,
            Some(AxisBinding { index: 2, reverse: -1 })
        );
        assert_eq!(s.joystick.select, 5);
        assert_eq!(s.joystick.back, 2);
        assert_eq!(s.delays.snapshot, Duration::from_secs(1));
        assert_eq!(s.paths.launch, "/usr/games/mame -rompath /roms %r");
        assert_eq!(s.paths.database, PathBuf::from("/var/lib/arcade/games.db"));
        assert_eq!(s.paths.roms, Some(PathBuf::from("/home/cab/roms")));
        assert_eq!(s.style.background, [1, 2, 3]);
        assert_eq!(s.style.banner_bg, [20, 20, 20]);
    }

    #[test]
    fn sample_config_parses() {
        let cfg = parse_config(include_str!("../config.sample.toml")).unwrap();
        let s = cfg.resolve(Path::new("."));
        assert!(s.paths.launch.contains(ROM_TOKEN));
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(parse_config("[keys]\nup = \"north\"").is_err());
    }

    #[test]
    fn load_writes_sample_on_first_run() {
        let dir = std::env::temp_dir().join(format!("arcade_launcher_cfg_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("config.toml");
        let s = load_settings(Some(&path));
        assert!(path.exists());
        assert_eq!(s.paths.database, dir.join("games.db"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn axis_binding_decoding() {
        assert_eq!(AxisBinding::from_config(0), None);
        assert_eq!(AxisBinding::from_config(1), Some(AxisBinding { index: 0, reverse: 1 }));
        assert_eq!(AxisBinding::from_config(-4), Some(AxisBinding { index: 3, reverse: -1 }));
        assert_eq!(AxisBinding::from_config(1000), None);
    }
}

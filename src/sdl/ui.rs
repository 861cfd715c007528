use std::path::{Path, PathBuf};

use sdl2::pixels::Color;
use sdl2::rect::Rect;
use sdl2::render::{TextureCreator, WindowCanvas};
use sdl2::surface::Surface;
use sdl2::ttf::{Font, Sdl2TtfContext};
use sdl2::video::WindowContext;
use sdl2::VideoSubsystem;

use crate::config::{Settings, Style};
use crate::render::Renderer;
use crate::tree::{Item, NodeId, Tree};

const TILE_H: i32 = 48;
const PADDING: i32 = 10;
const BANNER_H: i32 = 40;
const FONT_SIZE: u16 = 24;

const FONT_CANDIDATES: [&str; 3] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
];

struct UIColors {
    bg: Color,
    tile_selected: Color,
    tile_normal: Color,
    text_primary: Color,
    text_menu: Color,
    text_favorite: Color,
    text_broken: Color,
    banner_bg: Color,
    banner_text: Color,
}

impl UIColors {
    fn from_style(s: &Style) -> Self {
        let rgb = |c: [u8; 3]| Color::RGB(c[0], c[1], c[2]);
        UIColors {
            bg: rgb(s.background),
            tile_selected: rgb(s.tile_selected),
            tile_normal: rgb(s.tile_normal),
            text_primary: rgb(s.text_primary),
            text_menu: rgb(s.text_menu),
            text_favorite: rgb(s.text_favorite),
            text_broken: rgb(s.text_broken),
            banner_bg: rgb(s.banner_bg),
            banner_text: rgb(s.banner_text),
        }
    }
}

/// Fullscreen list renderer. The window only exists between
/// `setup_presentation` and `destroy_presentation`.
pub struct SdlRenderer<'ttf> {
    video: VideoSubsystem,
    font: Font<'ttf, 'static>,
    colors: UIColors,
    canvas: Option<WindowCanvas>,
    snapshot: Option<Surface<'static>>,
    visible: usize,
}

impl<'ttf> SdlRenderer<'ttf> {
    pub fn new(
        video: VideoSubsystem,
        ttf: &'ttf Sdl2TtfContext,
        settings: &Settings,
    ) -> Result<Self, String> {
        let font_path = find_font(settings.paths.font.as_deref()).ok_or_else(|| {
            "No TTF font found. Set paths.font in config, install DejaVu/FreeSans or set FONT_PATH."
                .to_string()
        })?;
        log::debug!("Using font {}", font_path.display());
        let font = ttf.load_font(&font_path, FONT_SIZE)?;

        let mut renderer = SdlRenderer {
            video,
            font,
            colors: UIColors::from_style(&settings.style),
            canvas: None,
            snapshot: None,
            visible: 1,
        };
        renderer.setup_presentation()?;
        Ok(renderer)
    }

    fn draw(&mut self, tree: &Tree, current: NodeId) -> Result<(), String> {
        let Some(canvas) = self.canvas.as_mut() else {
            return Ok(());
        };
        let creator = canvas.texture_creator();
        let (w, h) = canvas.output_size()?;
        let (w, h) = (w as i32, h as i32);
        let colors = &self.colors;
        let font = &self.font;

        canvas.set_draw_color(colors.bg);
        canvas.clear();

        let list_w = if self.snapshot.is_some() { w * 3 / 5 } else { w };
        let tile_w = list_w - PADDING * 2;
        let start_y = BANNER_H + PADDING;
        let available_h = h - start_y - PADDING;
        self.visible = (available_h / (TILE_H + PADDING)).max(1) as usize;

        let children = tree.menu(current).map(|m| m.children()).unwrap_or(&[]);
        let selected = tree.menu(current).and_then(|m| m.selected_index());
        let offset = scroll_offset(selected.unwrap_or(0), children.len(), self.visible);

        for (i, &child) in children.iter().enumerate().skip(offset).take(self.visible) {
            let y = start_y + ((i - offset) as i32) * (TILE_H + PADDING);
            let rect = Rect::new(PADDING, y, tile_w as u32, TILE_H as u32);
            if Some(i) == selected {
                canvas.set_draw_color(colors.tile_selected);
            } else {
                canvas.set_draw_color(colors.tile_normal);
            }
            canvas.fill_rect(rect)?;

            let node = tree.node(child);
            let (label, color) = match node.item() {
                Item::Menu(_) => (format!("{} >", node.text()), colors.text_menu),
                Item::Game(g) if g.broken => (node.text().to_string(), colors.text_broken),
                Item::Game(g) if g.favorite => {
                    (format!("* {}", node.text()), colors.text_favorite)
                }
                Item::Game(_) => (node.text().to_string(), colors.text_primary),
            };
            let label = fit_text(font, &label, (tile_w - 16).max(0) as u32);
            draw_text(
                canvas,
                &creator,
                font,
                &label,
                color,
                PADDING + 8,
                y + TILE_H / 2,
                false,
            )?;
        }

        // banner
        canvas.set_draw_color(colors.banner_bg);
        canvas.fill_rect(Rect::new(0, 0, w as u32, BANNER_H as u32))?;
        let title = format!("{} ({})", tree.text(current), children.len());
        let title = fit_text(font, &title, (w - 24).max(0) as u32);
        draw_text(
            canvas,
            &creator,
            font,
            &title,
            colors.banner_text,
            w / 2,
            BANNER_H / 2,
            true,
        )?;

        if let Some(snap) = self.snapshot.as_ref() {
            let tex = creator
                .create_texture_from_surface(snap)
                .map_err(|e| e.to_string())?;
            let area = Rect::new(
                list_w,
                start_y,
                (w - list_w - PADDING) as u32,
                available_h as u32,
            );
            canvas.copy(&tex, None, fit_rect(snap.width(), snap.height(), area))?;
        }

        canvas.present();
        Ok(())
    }
}

impl Renderer for SdlRenderer<'_> {
    fn render(&mut self, tree: &Tree, current: NodeId) {
        if let Err(e) = self.draw(tree, current) {
            log::warn!("render failed: {}", e);
        }
    }

    fn destroy_presentation(&mut self) {
        log::debug!("Closing window");
        self.canvas = None;
    }

    fn setup_presentation(&mut self) -> Result<(), String> {
        let mode = self.video.desktop_display_mode(0)?;
        let window = self
            .video
            .window("Arcade Launcher", mode.w as u32, mode.h as u32)
            .position_centered()
            .fullscreen_desktop()
            .build()
            .map_err(|e| e.to_string())?;
        let canvas = window
            .into_canvas()
            .accelerated()
            .present_vsync()
            .build()
            .map_err(|e| e.to_string())?;
        self.canvas = Some(canvas);
        Ok(())
    }

    fn show_snapshot(&mut self, image: Option<&Path>) {
        self.snapshot = image.and_then(|p| match Surface::load_bmp(p) {
            Ok(s) => Some(s),
            Err(e) => {
                log::warn!("Failed to load snapshot {}: {}", p.display(), e);
                None
            }
        });
    }

    fn page_size(&self) -> usize {
        self.visible
    }
}

fn find_font(configured: Option<&Path>) -> Option<PathBuf> {
    configured
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os("FONT_PATH").map(PathBuf::from))
        .or_else(|| {
            FONT_CANDIDATES
                .iter()
                .map(PathBuf::from)
                .find(|p| p.exists())
        })
}

/// First entry shown so that `selected` stays roughly centred.
fn scroll_offset(selected: usize, len: usize, visible: usize) -> usize {
    selected
        .saturating_sub(visible / 2)
        .min(len.saturating_sub(visible))
}

/// Largest rect with the image's aspect ratio centred inside `area`.
fn fit_rect(img_w: u32, img_h: u32, area: Rect) -> Rect {
    if img_w == 0 || img_h == 0 {
        return area;
    }
    let scale = f64::min(
        area.width() as f64 / img_w as f64,
        area.height() as f64 / img_h as f64,
    );
    let w = (img_w as f64 * scale) as u32;
    let h = (img_h as f64 * scale) as u32;
    let x = area.x() + (area.width() as i32 - w as i32) / 2;
    let y = area.y() + (area.height() as i32 - h as i32) / 2;
    Rect::new(x, y, w, h)
}

/// Truncates `text` with an ellipsis until it fits in `max_w` pixels.
fn fit_text(font: &Font, text: &str, max_w: u32) -> String {
    let width_of = |s: &str| -> u32 { font.size_of(s).map(|(w, _)| w).unwrap_or(0) };
    if width_of(text) <= max_w {
        return text.to_string();
    }
    let ell = "...";
    let chars: Vec<char> = text.chars().collect();
    let mut lo = 0usize;
    let mut hi = chars.len();
    while lo < hi {
        let mid = (lo + hi + 1) / 2;
        let cand: String = chars.iter().take(mid).collect::<String>() + ell;
        if width_of(&cand) <= max_w {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    chars.iter().take(lo).collect::<String>() + ell
}

/// Draws `text` vertically centred on `y`, left-aligned at `x` or centred on it.
#[allow(clippy::too_many_arguments)]
fn draw_text(
    canvas: &mut WindowCanvas,
    creator: &TextureCreator<WindowContext>,
    font: &Font,
    text: &str,
    color: Color,
    x: i32,
    y: i32,
    centered: bool,
) -> Result<(), String> {
    if text.is_empty() {
        return Ok(());
    }
    let surface = font.render(text).blended(color).map_err(|e| e.to_string())?;
    let tex = creator
        .create_texture_from_surface(&surface)
        .map_err(|e| e.to_string())?;
    let q = tex.query();
    let dst_x = if centered { x - q.width as i32 / 2 } else { x };
    let dst_y = y - q.height as i32 / 2;
    canvas.copy(&tex, None, Rect::new(dst_x, dst_y, q.width, q.height))
}

use crate::app::Scene;
use crossterm::{
    cursor, execute, queue,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use digipet::model::{LifeStage, Mood, PetState, Stat};
use digipet::sim::{derive_mood, Action};
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
    pub(crate) bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
            bold: false,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub(crate) fn clear(&mut self, bg: Color) {
        for c in &mut self.cells {
            *c = Cell {
                bg,
                ..Cell::default()
            };
        }
    }
}

pub(crate) struct Terminal {
    out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    prev: CellBuffer,
    pub(crate) cur: CellBuffer,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        queue!(self.out, Clear(ClearType::All))?;
        Ok(true)
    }

    pub(crate) fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;
        let mut last_bold = false;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }
                if last_bold != c.bold {
                    let attr = if c.bold {
                        Attribute::Bold
                    } else {
                        Attribute::NormalIntensity
                    };
                    queue!(self.out, SetAttribute(attr))?;
                    last_bold = c.bold;
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/* -----------------------------
   Text helpers
------------------------------ */

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(
            xx,
            y,
            Cell {
                ch,
                fg,
                bg,
                bold: false,
            },
        );
    }
}

fn bar(value01: f64, width: usize) -> String {
    let v = value01.clamp(0.0, 1.0);
    let fill = (v * width as f64 + 0.5) as usize;
    let mut s = String::with_capacity(width + 2);
    s.push('[');
    for i in 0..width {
        s.push(if i < fill { '█' } else { ' ' });
    }
    s.push(']');
    s
}

fn level_color(value: f64, color: bool) -> Color {
    if !color {
        Color::White
    } else if value > 50.0 {
        Color::Green
    } else if value > 25.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

pub(crate) fn draw_box(buf: &mut CellBuffer, title: &str, body: &str) {
    let fg = Color::White;
    let bg = Color::Black;

    let bw = 60u16.min(buf.w.saturating_sub(4));
    let bh = 14u16.min(buf.h.saturating_sub(4));
    if bw < 4 || bh < 4 {
        return;
    }
    let x0 = (buf.w - bw) / 2;
    let y0 = (buf.h - bh) / 2;

    for y in y0..y0 + bh {
        for x in x0..x0 + bw {
            let edge_x = x == x0 || x == x0 + bw - 1;
            let edge_y = y == y0 || y == y0 + bh - 1;
            let ch = match (edge_x, edge_y) {
                (true, true) => match (x == x0, y == y0) {
                    (true, true) => '┌',
                    (false, true) => '┐',
                    (true, false) => '└',
                    (false, false) => '┘',
                },
                (true, false) => '│',
                (false, true) => '─',
                (false, false) => ' ',
            };
            buf.set(x, y, Cell { ch, fg, bg, bold: false });
        }
    }

    draw_text(buf, x0 + 2, y0 + 1, title, Color::Yellow, bg);
    for (i, line) in body.lines().enumerate() {
        let yy = y0 + 3 + i as u16;
        if yy >= y0 + bh - 1 {
            break;
        }
        draw_text(buf, x0 + 2, yy, line, fg, bg);
    }
}

/* -----------------------------
   Main panel
------------------------------ */

pub(crate) struct View<'a> {
    pub(crate) pet: &'a PetState,
    pub(crate) scene: &'a Scene,
    pub(crate) message: &'a str,
    pub(crate) banner: Option<&'a str>,
    pub(crate) color: bool,
}

const ACTION_KEYS: [(Action, &str); 4] = [
    (Action::Feed, "f feed"),
    (Action::Play, "p play"),
    (Action::Clean, "c clean"),
    (Action::ToggleSleep, "s sleep"),
];

pub(crate) fn ui_overlay(buf: &mut CellBuffer, view: &View<'_>) {
    let bg = Color::Black;
    let fg = Color::White;
    let pet = view.pet;

    let title = format!(
        "Digipet  |  {} ({:.1} days)  |  Mood: {:?}{}",
        pet.stage().as_str(),
        pet.age(),
        derive_mood(pet),
        if pet.is_sleeping() { "  |  zzz" } else { "" }
    );
    draw_text(buf, 1, 0, &title, fg, bg);

    for (i, stat) in Stat::ALL.iter().enumerate() {
        let val = pet.stat(*stat);
        let s = format!("{:<11} {} {:>5.1}", stat.label(), bar(val / 100.0, 14), val);
        draw_text(buf, 1, 2 + i as u16, &s, level_color(val, view.color), bg);
    }

    let stars = pet.milestones_achieved();
    if stars > 0 {
        let s = format!(
            "{} {} milestone{}",
            "*".repeat(stars.min(20) as usize),
            stars,
            if stars == 1 { "" } else { "s" }
        );
        draw_text(buf, 1, 7, &s, Color::Yellow, bg);
    }

    let mut x = 1u16;
    for (action, label) in ACTION_KEYS {
        let label = if action == Action::ToggleSleep && pet.is_sleeping() {
            "s wake"
        } else {
            label
        };
        let enabled = action.check(pet).is_ok();
        let color = if enabled { fg } else { Color::DarkGrey };
        draw_text(buf, x, 9, label, color, bg);
        x += label.chars().count() as u16 + 3;
    }

    draw_text(buf, 1, 11, mood_line(pet), Color::Magenta, bg);
    draw_text(buf, 1, 12, view.message, Color::Cyan, bg);
    if let Some(banner) = view.banner {
        draw_text(buf, 1, 13, banner, Color::Red, bg);
    }

    let help = match view.scene {
        Scene::Main => "Keys: f feed | p play | c clean | s sleep/wake | r reset | h help | q quit",
        Scene::Help => "Help: esc back | h close | q quit",
        Scene::ConfirmReset => "Reset: y confirm | n cancel",
        Scene::Recap(_) => "Recap: any key to continue",
        Scene::Dead => "Dead: n new pet | q quit",
    };
    draw_text(buf, 1, buf.h.saturating_sub(1), help, Color::DarkGrey, bg);
}

/// What the pet says about itself.
pub(crate) fn mood_line(pet: &PetState) -> &'static str {
    if !pet.is_alive() {
        return "Your pet has passed away... Reset to start over.";
    }
    if pet.stage() == LifeStage::Egg {
        return "I'm still an egg! Keep taking care of me!";
    }
    match derive_mood(pet) {
        Mood::Happy => "I'm so happy! Thank you for taking good care of me!",
        Mood::Hungry => "I'm really hungry... Can I have some food?",
        Mood::Tired => "I'm feeling very tired... I need some rest.",
        Mood::Sleeping => "Zzz... I'm sleeping peacefully.",
        Mood::Dirty => "I feel dirty and uncomfortable... Can you clean me?",
        Mood::Default if pet.happiness() > 70.0 => "I'm having a great day! Thanks for being awesome!",
        Mood::Default if pet.energy() > 80.0 => "I'm full of energy! Let's do something fun!",
        Mood::Default => "Hello! I'm doing okay today!",
    }
}

/* -----------------------------
   Pet sprite
------------------------------ */

fn sprite(stage: LifeStage) -> [&'static str; 6] {
    match stage {
        LifeStage::Egg => [
            "     ___     ",
            "   /     \\   ",
            "  /  . .  \\  ",
            " |  .   .  | ",
            "  \\   .   /  ",
            "   `-----'   ",
        ],
        LifeStage::Baby => [
            "             ",
            "    .---.    ",
            "   ( o o )   ",
            "   (  -  )   ",
            "    `---'    ",
            "             ",
        ],
        LifeStage::Teen => [
            "    _____    ",
            "   /     \\   ",
            "  |  o o  |  ",
            "  |   -   |  ",
            "   \\_____/   ",
            "    /   \\    ",
        ],
        LifeStage::Adult => [
            "   _______   ",
            "  /       \\  ",
            " |   o o   | ",
            " |    -    | ",
            "  \\_______/  ",
            "   /|   |\\   ",
        ],
    }
}

fn face(mood: Mood) -> (&'static str, &'static str) {
    match mood {
        Mood::Sleeping => ("- -", "o"),
        Mood::Hungry => ("o o", "O"),
        Mood::Tired => ("= =", "~"),
        Mood::Dirty => ("x x", "~"),
        Mood::Happy => ("^ ^", "v"),
        Mood::Default => ("o o", "-"),
    }
}

pub(crate) fn draw_pet_ascii(buf: &mut CellBuffer, pet: &PetState, cx: i32, cy: i32, color: bool) {
    let bg = Color::Black;
    let mood = derive_mood(pet);
    let fg = match (color, pet.is_alive(), mood) {
        (false, _, _) => Color::White,
        (true, false, _) => Color::DarkGrey,
        (true, true, Mood::Happy) => Color::Green,
        (true, true, Mood::Hungry | Mood::Tired | Mood::Dirty) => Color::Yellow,
        (true, true, Mood::Sleeping) => Color::Blue,
        (true, true, Mood::Default) => Color::White,
    };

    let (eyes, mouth) = if pet.is_alive() { face(mood) } else { ("x x", "_") };
    let grid = sprite(pet.stage());
    let w = grid[0].chars().count() as i32;
    let x0 = cx - w / 2;
    let y0 = cy - grid.len() as i32 / 2;

    for (yy, line) in grid.iter().enumerate() {
        let line = match (pet.stage(), yy) {
            (LifeStage::Egg, _) => line.to_string(),
            (_, 2) => line.replacen("o o", eyes, 1),
            (_, 3) => line.replacen('-', mouth, 1),
            _ => line.to_string(),
        };
        let y = y0 + yy as i32;
        if y < 0 || y >= buf.h as i32 {
            continue;
        }
        for (i, ch) in line.chars().enumerate() {
            let x = x0 + i as i32;
            if x >= 0 && x < buf.w as i32 {
                buf.set(x as u16, y as u16, Cell { ch, fg, bg, bold: false });
            }
        }
    }

    if pet.is_sleeping() && pet.is_alive() {
        draw_text(buf, (x0 + w).max(0) as u16, y0.max(0) as u16, "z Z", Color::Blue, bg);
    }
}

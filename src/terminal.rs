// Copyright (c) 2026 rezky_nightky

use std::io::{stdout, Result, Stdout, Write};

use crossterm::{
    cursor, event,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal, ExecutableCommand, QueueableCommand,
};

use crate::canvas::Canvas;
use crate::grid::Viewport;

#[derive(Default)]
struct Pen {
    fg: Option<Option<Color>>,
    bg: Option<Option<Color>>,
    bold: Option<bool>,
    pos: Option<(u16, u16)>,
}

pub struct Terminal {
    stdout: Stdout,
    run_buf: String,
    mouse: bool,
    focus: bool,
}

impl Terminal {
    pub fn new() -> Result<Self> {
        let mut out = stdout();
        terminal::enable_raw_mode()?;
        let init_res: Result<()> = (|| {
            out.execute(terminal::EnterAlternateScreen)?;
            out.execute(cursor::Hide)?;
            let _ = out.execute(terminal::DisableLineWrap);
            out.execute(SetAttribute(Attribute::Reset))?;
            out.execute(ResetColor)?;
            out.execute(terminal::Clear(terminal::ClearType::All))?;
            out.flush()?;
            Ok(())
        })();
        if let Err(e) = init_res {
            restore_terminal_best_effort();
            return Err(e);
        }
        Ok(Self {
            stdout: out,
            run_buf: String::with_capacity(64),
            mouse: false,
            focus: false,
        })
    }

    pub fn viewport(&self) -> Result<Viewport> {
        match terminal::window_size() {
            Ok(ws) => Ok(Viewport::new(
                ws.columns,
                ws.rows,
                (ws.width as u32, ws.height as u32),
            )),
            Err(_) => {
                let (cols, rows) = terminal::size()?;
                Ok(Viewport::new(cols, rows, (0, 0)))
            }
        }
    }

    pub fn poll_event(timeout: std::time::Duration) -> Result<bool> {
        event::poll(timeout)
    }

    pub fn read_event() -> Result<event::Event> {
        event::read()
    }

    pub fn set_mouse_capture(&mut self, on: bool) -> Result<()> {
        if self.mouse == on {
            return Ok(());
        }
        if on {
            self.stdout.execute(event::EnableMouseCapture)?;
        } else {
            self.stdout.execute(event::DisableMouseCapture)?;
        }
        self.mouse = on;
        Ok(())
    }

    pub fn set_focus_reports(&mut self, on: bool) -> Result<()> {
        if self.focus == on {
            return Ok(());
        }
        if on {
            self.stdout.execute(event::EnableFocusChange)?;
        } else {
            self.stdout.execute(event::DisableFocusChange)?;
        }
        self.focus = on;
        Ok(())
    }

    fn queue_style(&mut self, pen: &mut Pen, fg: Option<Color>, bg: Option<Color>, bold: bool) -> Result<()> {
        if pen.fg != Some(fg) {
            self.stdout
                .queue(SetForegroundColor(fg.unwrap_or(Color::Reset)))?;
            pen.fg = Some(fg);
        }
        if pen.bg != Some(bg) {
            self.stdout
                .queue(SetBackgroundColor(bg.unwrap_or(Color::Reset)))?;
            pen.bg = Some(bg);
        }
        if pen.bold != Some(bold) {
            self.stdout.queue(SetAttribute(if bold {
                Attribute::Bold
            } else {
                Attribute::NormalIntensity
            }))?;
            pen.bold = Some(bold);
        }
        Ok(())
    }

    /// Writes the cells that differ from what is on screen, coalescing
    /// horizontal runs that share a style into one print.
    pub fn present(&mut self, canvas: &mut Canvas) -> Result<()> {
        if canvas.is_stale() {
            self.stdout
                .queue(terminal::Clear(terminal::ClearType::All))?;
        }

        let changed = canvas.changed();
        if changed.is_empty() {
            return Ok(());
        }

        let width = canvas.width as usize;
        let mut pen = Pen::default();
        let mut i = 0usize;
        while i < changed.len() {
            let idx0 = changed[i];
            let cell0 = canvas.cell_at_index(idx0);
            let x0 = (idx0 % width) as u16;
            let y0 = (idx0 / width) as u16;

            self.run_buf.clear();
            self.run_buf.push(cell0.ch);
            let mut run_len: u16 = 1;
            let mut j = i + 1;
            while j < changed.len() {
                let idx1 = changed[j];
                if idx1 != changed[j - 1] + 1 || idx1 % width == 0 {
                    break;
                }
                let cell1 = canvas.cell_at_index(idx1);
                if cell1.fg != cell0.fg || cell1.bg != cell0.bg || cell1.bold != cell0.bold {
                    break;
                }
                self.run_buf.push(cell1.ch);
                run_len = run_len.saturating_add(1);
                j += 1;
            }

            if pen.pos != Some((x0, y0)) {
                self.stdout.queue(cursor::MoveTo(x0, y0))?;
            }
            self.queue_style(&mut pen, cell0.fg, cell0.bg, cell0.bold)?;
            self.stdout.queue(Print(self.run_buf.as_str()))?;

            let next_x = x0.saturating_add(run_len);
            pen.pos = (next_x < canvas.width).then_some((next_x, y0));
            i = j;
        }

        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        self.stdout.queue(ResetColor)?;
        self.stdout.flush()?;
        canvas.commit();
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.mouse {
            let _ = self.stdout.execute(event::DisableMouseCapture);
        }
        if self.focus {
            let _ = self.stdout.execute(event::DisableFocusChange);
        }
        let _ = self.stdout.execute(SetAttribute(Attribute::Reset));
        let _ = self.stdout.execute(ResetColor);
        let _ = self.stdout.execute(cursor::Show);
        let _ = self.stdout.execute(terminal::EnableLineWrap);
        let _ = self.stdout.execute(terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
        let _ = self.stdout.flush();
    }
}

pub fn restore_terminal_best_effort() {
    let mut out = stdout();
    let _ = out.execute(event::DisableMouseCapture);
    let _ = out.execute(SetAttribute(Attribute::Reset));
    let _ = out.execute(ResetColor);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::EnableLineWrap);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = out.flush();
}

//! Line-oriented command shell over the sync engine.
//!
//! DESIGN
//! ======
//! `parse_command` is pure and turns one input line into a `Command`.
//! `Shell` owns the current drawing style and executes commands against the
//! active board, writing human-readable results to any `Write`. Canvas
//! output (clears and draws) goes through the engine's render sink, not
//! through the shell.
//!
//! Drawing commands replay a pointer gesture: the first point is the press,
//! the last point is the release, everything in between is movement.

#[cfg(test)]
#[path = "shell_test.rs"]
mod tests;

use std::io::Write;

use crate::board::{BoardError, BoardId};
use crate::config::ConfigError;
use crate::error::ErrorCode;
use crate::shape::{Gesture, Point, ShapeError, Style, Tool};
use crate::store::StoreError;
use crate::sync::{LoadOutcome, SyncEngine, SyncError};

pub const HELP: &str = "\
commands:
  line|rect|circle X1 Y1 X2 Y2   draw a two-point shape
  squiggle X Y X Y ...           draw a freehand path
  erase X Y X Y ...              erase along a path
  color C                        set stroke color
  width N                        set stroke width
  undo | redo                    step through history
  new                            create a board and switch to it
  switch ID                      switch to a known board
  boards                         list boards (* marks the active one)
  clear                          delete every shape on the active board
  show                           print the active board
  help | quit";

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("usage: {command} {expected}")]
    Arity { command: String, expected: &'static str },
    #[error("not a number: {0}")]
    BadNumber(String),
    #[error(transparent)]
    Board(#[from] BoardError),
}

impl ErrorCode for ParseError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownCommand(_) => "E_UNKNOWN_COMMAND",
            Self::Arity { .. } => "E_BAD_ARGUMENTS",
            Self::BadNumber(_) => "E_BAD_NUMBER",
            Self::Board(e) => e.error_code(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl ErrorCode for CliError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Parse(e) => e.error_code(),
            Self::Shape(e) => e.error_code(),
            Self::Sync(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
            Self::Io(_) => "E_IO",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Sync(e) => e.retryable(),
            Self::Store(e) => e.retryable(),
            _ => false,
        }
    }
}

// =============================================================================
// PARSING
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Draw { tool: Tool, points: Vec<Point> },
    Color(String),
    Width(u32),
    Undo,
    Redo,
    New,
    Switch(BoardId),
    Boards,
    Clear,
    Show,
    Help,
    Quit,
}

/// Parse one input line. Blank lines and `#` comments yield `None`.
///
/// # Errors
///
/// Returns a `ParseError` for unknown commands, wrong argument counts,
/// unparseable numbers and invalid board ids.
pub fn parse_command(line: &str) -> Result<Option<Command>, ParseError> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };
    if name.starts_with('#') {
        return Ok(None);
    }
    let args: Vec<&str> = words.collect();

    let command = match name {
        "color" => Command::Color(single(name, &args, "COLOR")?.to_owned()),
        "width" => {
            let raw = single(name, &args, "N")?;
            Command::Width(raw.parse().map_err(|_| ParseError::BadNumber(raw.to_owned()))?)
        }
        "switch" => Command::Switch(BoardId::parse(single(name, &args, "BOARD_ID")?)?),
        "undo" => bare(name, &args, Command::Undo)?,
        "redo" => bare(name, &args, Command::Redo)?,
        "new" => bare(name, &args, Command::New)?,
        "boards" => bare(name, &args, Command::Boards)?,
        "clear" => bare(name, &args, Command::Clear)?,
        "show" => bare(name, &args, Command::Show)?,
        "help" | "?" => bare(name, &args, Command::Help)?,
        "quit" | "exit" => bare(name, &args, Command::Quit)?,
        other => {
            let tool: Tool = other.parse().map_err(|_| ParseError::UnknownCommand(other.to_owned()))?;
            Command::Draw { tool, points: points(name, tool, &args)? }
        }
    };
    Ok(Some(command))
}

fn single<'a>(name: &str, args: &[&'a str], expected: &'static str) -> Result<&'a str, ParseError> {
    match args {
        [value] => Ok(value),
        _ => Err(ParseError::Arity { command: name.to_owned(), expected }),
    }
}

fn bare(name: &str, args: &[&str], command: Command) -> Result<Command, ParseError> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(ParseError::Arity { command: name.to_owned(), expected: "(no arguments)" })
    }
}

fn points(name: &str, tool: Tool, args: &[&str]) -> Result<Vec<Point>, ParseError> {
    let numbers = args
        .iter()
        .map(|raw| raw.parse::<f64>().map_err(|_| ParseError::BadNumber((*raw).to_owned())))
        .collect::<Result<Vec<_>, _>>()?;

    let (valid, expected) = if tool.is_freehand() {
        (!numbers.is_empty() && numbers.len() % 2 == 0, "X Y [X Y ...]")
    } else {
        (numbers.len() == 4, "X1 Y1 X2 Y2")
    };
    if !valid {
        return Err(ParseError::Arity { command: name.to_owned(), expected });
    }
    Ok(numbers.chunks_exact(2).map(|xy| Point::new(xy[0], xy[1])).collect())
}

// =============================================================================
// EXECUTION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Shell<W> {
    engine: SyncEngine,
    style: Style,
    out: W,
}

impl<W: Write> Shell<W> {
    #[must_use]
    pub fn new(engine: SyncEngine, style: Style, out: W) -> Self {
        Self { engine, style, out }
    }

    #[must_use]
    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Parse and execute one input line.
    ///
    /// # Errors
    ///
    /// Returns the parse error or the error of the executed command.
    pub async fn run_line(&mut self, line: &str) -> Result<Flow, CliError> {
        match parse_command(line)? {
            Some(command) => self.execute(command).await,
            None => Ok(Flow::Continue),
        }
    }

    /// # Errors
    ///
    /// Returns the engine's error, a `ShapeError` for a drawing that
    /// yields no shape, or an I/O error writing output.
    pub async fn execute(&mut self, command: Command) -> Result<Flow, CliError> {
        let board = self.engine.active_board().await;
        match command {
            Command::Draw { tool, points } => self.draw(&board, tool, points).await?,
            Command::Color(color) => {
                self.style.color = color;
                writeln!(self.out, "color {}", self.style.color)?;
            }
            Command::Width(0) => return Err(ShapeError::ZeroStrokeWidth.into()),
            Command::Width(width) => {
                self.style.stroke_width = width;
                writeln!(self.out, "width {width}")?;
            }
            Command::Undo => match self.engine.undo(&board).await? {
                Some(shape) => writeln!(self.out, "undid {}", shape.id)?,
                None => writeln!(self.out, "nothing to undo")?,
            },
            Command::Redo => match self.engine.redo(&board).await? {
                Some(shape) => writeln!(self.out, "redid {}", shape.id)?,
                None => writeln!(self.out, "nothing to redo")?,
            },
            Command::New => {
                let created = self.engine.create_board().await;
                self.switch(&created).await?;
            }
            Command::Switch(target) => self.switch(&target).await?,
            Command::Boards => {
                for id in self.engine.boards().await {
                    let marker = if id == board { '*' } else { ' ' };
                    writeln!(self.out, "{marker} {id}")?;
                }
            }
            Command::Clear => {
                self.engine.clear_board(&board).await?;
                writeln!(self.out, "cleared {board}")?;
            }
            Command::Show => {
                let snapshot = self.engine.snapshot(&board).await?;
                writeln!(
                    self.out,
                    "board {}: {} shape(s), {} redoable",
                    snapshot.board,
                    snapshot.undo.len(),
                    snapshot.redo.len()
                )?;
                for shape in &snapshot.undo {
                    writeln!(self.out, "  {shape}")?;
                }
            }
            Command::Help => writeln!(self.out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    async fn draw(&mut self, board: &BoardId, tool: Tool, points: Vec<Point>) -> Result<(), CliError> {
        let count = points.len();
        let mut points = points.into_iter();
        let (Some(first), Some(last)) = (points.next(), points.next_back()) else {
            return Err(ShapeError::DegeneratePath { points: count }.into());
        };
        let mut gesture = Gesture::begin(tool, first, self.style.clone());
        for point in points {
            gesture.extend(point);
        }
        if tool.is_freehand() {
            gesture.extend(last);
        }
        let shape = gesture.finish(last).ok_or(ShapeError::DegeneratePath { points: count })?;
        let stored = self.engine.commit_shape(board, shape).await?;
        writeln!(self.out, "committed {}", stored.id)?;
        Ok(())
    }

    async fn switch(&mut self, target: &BoardId) -> Result<(), CliError> {
        match self.engine.switch_board(target).await? {
            LoadOutcome::Applied { shapes } => writeln!(self.out, "switched to {target} ({shapes} shape(s))")?,
            LoadOutcome::Discarded => writeln!(self.out, "switch to {target} was superseded")?,
        }
        Ok(())
    }
}

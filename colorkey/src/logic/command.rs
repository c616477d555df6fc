//! Interactive commands
//!
//! Each line read from a [`CommandSource`] maps to one session action.
//! Failures are reported through the decision sink and the loop carries on.

use super::{
    session::{Mode, NavigationSession},
    sink::{CommandSource, DecisionSink, DisplaySink},
};
use image::Rgb;
use std::str::FromStr;

pub const HELP: &str = "\
commands:
  next | n              show the next image of the group
  prev | p              show the previous image of the group
  tol <0-100>           set the tolerance
  color [r g b|#rrggbb] set the key color, prompts when no value is given
  save                  save the displayed image into a group
  commit                write edited color/tolerance of the current image
  delete                delete the current image from the catalog
  load                  load a group from the catalog
  open                  open a file or a catalog group
  status                show the session state
  help                  show this help
  quit | q              exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Next,
    Previous,
    Tolerance(u8),
    Color(Option<Rgb<u8>>),
    Save,
    Commit,
    Delete,
    Load,
    Open,
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, args) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let args = args.trim();

        let command = match name.to_lowercase().as_str() {
            "next" | "n" => Command::Next,
            "prev" | "previous" | "p" => Command::Previous,
            "tol" | "tolerance" => match args.parse::<u8>() {
                Ok(v) => Command::Tolerance(v),
                Err(_) => return Err(format!("Invalid tolerance: '{args}'")),
            },
            "color" | "colour" if args.is_empty() => Command::Color(None),
            "color" | "colour" => match parse_rgb(args) {
                Some(color) => Command::Color(Some(color)),
                None => return Err(format!("Invalid color: '{args}'")),
            },
            "save" => Command::Save,
            "commit" => Command::Commit,
            "delete" | "del" => Command::Delete,
            "load" => Command::Load,
            "open" => Command::Open,
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            _ => return Err(format!("Unknown command: '{name}'. Type 'help'.")),
        };

        Ok(command)
    }
}

/// Parse `r g b`, `r,g,b` or `#rrggbb`
pub fn parse_rgb(text: &str) -> Option<Rgb<u8>> {
    let text = text.trim();

    if let Some(hex) = text.strip_prefix('#') {
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        return Some(Rgb([channel(0)?, channel(2)?, channel(4)?]));
    }

    let channels = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u8>().ok())
        .collect::<Option<Vec<u8>>>()?;

    match channels[..] {
        [r, g, b] => Some(Rgb([r, g, b])),
        _ => None,
    }
}

impl<D: DisplaySink, U: DecisionSink> NavigationSession<D, U> {
    /// Run one command, returns `false` when the session should end
    pub async fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Next => {
                let result = self.next().await;
                self.report(result);
            }
            Command::Previous => {
                let result = self.previous().await;
                self.report(result);
            }
            Command::Tolerance(value) => {
                let result = self.set_tolerance(value).await;
                self.report(result);
            }
            Command::Color(Some(color)) => {
                let result = self.set_target_color(color).await;
                self.report(result);
            }
            Command::Color(None) => self.change_color().await,
            Command::Save => self.save_dialog().await,
            Command::Commit => {
                let result = self.commit_current().await;
                self.report(result);
            }
            Command::Delete => self.confirm_and_delete_current().await,
            Command::Load => self.choose_and_load_group().await,
            Command::Open => self.open().await,
            Command::Status => {
                let status = self.status();
                self.ui_mut().report_message(&status);
            }
            Command::Help => self.ui_mut().report_message(HELP),
            Command::Quit => return false,
        }

        true
    }

    /// Human readable summary of the session
    pub fn status(&self) -> String {
        let [r, g, b] = self.target_color().0;
        let (current, total) = self.position();

        let mode = match self.mode() {
            Mode::Idle => "idle",
            Mode::SingleFile => "single file",
            Mode::Catalog => "catalog",
        };

        let path = self
            .current_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string());

        let unsaved = self
            .working_set()
            .current()
            .is_some_and(|entry| entry.is_dirty());

        format!(
            "mode: {mode}\nimage: {current}/{total}\nfile: {path}\nkey color: {r} {g} {b}\ntolerance: {}{}",
            self.tolerance(),
            if unsaved { "\nunsaved changes: yes" } else { "" }
        )
    }
}

/// Read and run commands until `quit` or end of input
pub async fn run<D, U>(session: &mut NavigationSession<D, U>)
where
    D: DisplaySink,
    U: DecisionSink + CommandSource,
{
    while let Some(line) = session.ui_mut().next_command() {
        if line.is_empty() {
            continue;
        }

        match line.parse::<Command>() {
            Ok(command) => {
                log::debug!("command: {command:?}");
                if !session.handle(command).await {
                    break;
                }
            }
            Err(e) => session.ui_mut().report_warning(&e),
        }
    }
}

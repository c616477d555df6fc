//! Terminal front-end
//!
//! [`TerminalDecisions`] asks its questions on a line-based text stream and
//! [`PreviewDisplay`] writes every frame to a PNG file that any image viewer
//! can keep open.

use super::{
    command::parse_rgb,
    sink::{CommandSource, Decision, DecisionSink, DisplaySink, Source},
};
use image::{Rgb, RgbaImage};
use std::{
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};

pub struct TerminalDecisions<R: BufRead, W: Write> {
    input: R,
    output: W,
}

impl TerminalDecisions<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalDecisions<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    fn say(&mut self, text: &str) {
        if let Err(e) = writeln!(self.output, "{text}") {
            log::warn!("write to terminal failed: {e}");
        }
    }

    /// Prompt and read one trimmed line, `None` at end of input
    fn ask(&mut self, prompt: &str) -> Option<String> {
        _ = write!(self.output, "{prompt}");
        _ = self.output.flush();

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_string()),
            Err(e) => {
                log::warn!("read from terminal failed: {e}");
                None
            }
        }
    }
}

impl<R: BufRead, W: Write> DecisionSink for TerminalDecisions<R, W> {
    fn choose_file_or_catalog(&mut self) -> Decision<Source> {
        self.say("Load an image from:");
        self.say("  [1] a file");
        self.say("  [2] the catalog");

        match self.ask("choice> ").as_deref() {
            Some("1" | "file") => Decision::Confirmed(Source::File),
            Some("2" | "catalog") => Decision::Confirmed(Source::Catalog),
            _ => Decision::Cancelled,
        }
    }

    fn choose_file(&mut self) -> Decision<PathBuf> {
        let extensions = chroma_key::SUPPORTED_EXTENSIONS.join(", ");

        match self.ask(&format!("image file ({extensions})> ")) {
            Some(path) if !path.is_empty() => Decision::Confirmed(PathBuf::from(path)),
            _ => Decision::Cancelled,
        }
    }

    fn choose_group_name(&mut self, groups: &[String], allow_new: bool) -> Decision<String> {
        if !groups.is_empty() {
            self.say("Existing groups:");
            for (i, group) in groups.iter().enumerate() {
                self.say(&format!("  [{}] {group}", i + 1));
            }
        }

        let prompt = if allow_new {
            "group number or new name> "
        } else {
            "group number> "
        };

        let Some(answer) = self.ask(prompt) else {
            return Decision::Cancelled;
        };

        if answer.is_empty() {
            return Decision::Cancelled;
        }

        if let Ok(n) = answer.parse::<usize>() {
            if let Some(group) = n.checked_sub(1).and_then(|i| groups.get(i)) {
                return Decision::Confirmed(group.clone());
            }
        }

        if allow_new || groups.contains(&answer) {
            Decision::Confirmed(answer)
        } else {
            self.say(&format!("Unknown group: {answer}"));
            Decision::Cancelled
        }
    }

    fn choose_color(&mut self, initial: Rgb<u8>) -> Decision<Rgb<u8>> {
        let [r, g, b] = initial.0;
        let Some(answer) = self.ask(&format!("key color as 'r g b' or #rrggbb [{r} {g} {b}]> "))
        else {
            return Decision::Cancelled;
        };

        if answer.is_empty() {
            return Decision::Cancelled;
        }

        match parse_rgb(&answer) {
            Some(color) => Decision::Confirmed(color),
            None => {
                self.say(&format!("Invalid color: {answer}"));
                Decision::Cancelled
            }
        }
    }

    fn confirm(&mut self, question: &str) -> bool {
        self.say(question);
        matches!(
            self.ask("[y/N]> ").map(|a| a.to_lowercase()).as_deref(),
            Some("y" | "yes")
        )
    }

    fn report_message(&mut self, text: &str) {
        self.say(text);
    }

    fn report_warning(&mut self, text: &str) {
        self.say(&format!("warning: {text}"));
    }

    fn report_error(&mut self, text: &str) {
        self.say(&format!("error: {text}"));
    }
}

impl<R: BufRead, W: Write> CommandSource for TerminalDecisions<R, W> {
    fn next_command(&mut self) -> Option<String> {
        self.ask("colorkey> ")
    }
}

/// Writes the current frame to a PNG file
#[derive(Debug)]
pub struct PreviewDisplay {
    path: PathBuf,
    position: (usize, usize),
    tolerance: Option<u8>,
}

impl PreviewDisplay {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            position: (0, 0),
            tolerance: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn position(&self) -> (usize, usize) {
        self.position
    }

    pub fn tolerance(&self) -> Option<u8> {
        self.tolerance
    }
}

impl DisplaySink for PreviewDisplay {
    fn display(&mut self, image: &RgbaImage) {
        match image.save_with_format(&self.path, image::ImageFormat::Png) {
            Ok(_) => log::info!(
                "preview {}x{} written to {}",
                image.width(),
                image.height(),
                self.path.display()
            ),
            Err(e) => log::warn!("write preview {} failed: {e}", self.path.display()),
        }
    }

    fn clear(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(_) => log::info!("preview cleared"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => (),
            Err(e) => log::warn!("remove preview {} failed: {e}", self.path.display()),
        }
    }

    fn show_position(&mut self, current: usize, total: usize) {
        self.position = (current, total);
        log::info!("image {current}/{total}");
    }

    fn show_tolerance(&mut self, tolerance: u8) {
        self.tolerance = Some(tolerance);
        log::info!("tolerance: {tolerance}");
    }
}

//! Collaborator interfaces of the session
//!
//! The session never draws or asks anything itself. Rendered frames go to a
//! [`DisplaySink`], and every question or notification goes to a
//! [`DecisionSink`]. Both are called synchronously and the session waits for
//! their answer.

use image::{Rgb, RgbaImage};
use std::path::PathBuf;

/// Outcome of a user choice
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision<T> {
    Confirmed(T),
    Cancelled,
}

impl<T> Decision<T> {
    pub fn confirmed(self) -> Option<T> {
        match self {
            Decision::Confirmed(value) => Some(value),
            Decision::Cancelled => None,
        }
    }
}

/// Where the next image comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    File,
    Catalog,
}

pub trait DisplaySink {
    /// Present a keyed frame; scaling is up to the sink
    fn display(&mut self, image: &RgbaImage);

    fn clear(&mut self);

    /// 1-based position of the shown entry, `0/0` when nothing is selected
    fn show_position(&mut self, current: usize, total: usize);

    fn show_tolerance(&mut self, tolerance: u8);
}

pub trait DecisionSink {
    fn choose_file_or_catalog(&mut self) -> Decision<Source>;

    fn choose_file(&mut self) -> Decision<PathBuf>;

    /// Pick one of `groups`, or type a new name when `allow_new` is set
    fn choose_group_name(&mut self, groups: &[String], allow_new: bool) -> Decision<String>;

    fn choose_color(&mut self, initial: Rgb<u8>) -> Decision<Rgb<u8>>;

    fn confirm(&mut self, question: &str) -> bool;

    fn report_message(&mut self, text: &str);

    fn report_warning(&mut self, text: &str);

    fn report_error(&mut self, text: &str);
}

/// Line-oriented command input for interactive front-ends
pub trait CommandSource {
    /// `None` once the input is exhausted
    fn next_command(&mut self) -> Option<String>;
}

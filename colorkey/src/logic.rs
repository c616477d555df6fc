//! Session logic and its collaborators
//!
//! The navigation session drives the color key renderer and the catalog
//! store. Front-ends plug in through the sink traits.

mod error;
mod session;
mod sink;
mod working_set;

pub mod command;
pub mod terminal;

pub use error::{Result, SessionError};
pub use session::{Mode, NavigationSession};
pub use sink::{CommandSource, Decision, DecisionSink, DisplaySink, Source};
pub use working_set::{WorkingEntry, WorkingSet};

//! Navigation session
//!
//! Owns the working set of the selected group, the current key settings and
//! the cursor. Every change to those ends in a re-render that is handed to
//! the display sink. Catalog writes go through [`CatalogStore`] first and are
//! mirrored into memory only once they succeeded.

use super::{
    error::{Result, SessionError},
    sink::{DecisionSink, DisplaySink, Source},
    working_set::{WorkingEntry, WorkingSet},
};
use chroma_key::{ChromaKeyConfig, MAX_TOLERANCE, load_rgba, render};
use image::Rgb;
use sqldb::{CatalogStore, ImageEntry, NewImageEntry};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Nothing loaded yet
    Idle,
    SingleFile,
    Catalog,
}

pub struct NavigationSession<D: DisplaySink, U: DecisionSink> {
    store: CatalogStore,
    display: D,
    ui: U,
    mode: Mode,
    working_set: WorkingSet,
    key: ChromaKeyConfig,
    current_path: Option<PathBuf>,
}

impl<D: DisplaySink, U: DecisionSink> NavigationSession<D, U> {
    /// `key` holds the color and tolerance used until an entry provides its own
    pub fn new(store: CatalogStore, display: D, ui: U, key: ChromaKeyConfig) -> Self {
        Self {
            store,
            display,
            ui,
            mode: Mode::Idle,
            working_set: WorkingSet::default(),
            key,
            current_path: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn working_set(&self) -> &WorkingSet {
        &self.working_set
    }

    pub fn current_index(&self) -> i64 {
        self.working_set.current_index()
    }

    pub fn position(&self) -> (usize, usize) {
        self.working_set.position()
    }

    pub fn target_color(&self) -> Rgb<u8> {
        self.key.target()
    }

    pub fn tolerance(&self) -> u8 {
        self.key.tolerance()
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut U {
        &mut self.ui
    }

    /// Show a single file outside the catalog
    ///
    /// The file is decoded before any state changes, so a failed load
    /// leaves the previous image on screen.
    pub fn load_single_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let image = load_rgba(path)?;
        let rendered = render(&image, self.key.target(), self.key.tolerance())?;

        self.mode = Mode::SingleFile;
        self.working_set = WorkingSet::default();
        self.current_path = Some(path.to_path_buf());

        log::info!("showing {}", path.display());
        self.display.display(&rendered);
        self.display.show_tolerance(self.key.tolerance());
        self.display.show_position(0, 0);
        Ok(())
    }

    /// Replace the working set with the entries of `group_name`
    ///
    /// An empty group is reported as a validation error and nothing changes.
    pub async fn load_group(&mut self, group_name: &str) -> Result<()> {
        let entries = self.store.list_by_group(group_name).await?;
        if entries.is_empty() {
            return Err(SessionError::validation(format!(
                "No images found for '{group_name}'."
            )));
        }

        log::info!("loaded {} images of '{group_name}'", entries.len());

        self.mode = Mode::Catalog;
        self.working_set = WorkingSet::from_entries(entries);
        self.display_current().await
    }

    /// Render the selected entry with its own key settings
    ///
    /// An entry whose file cannot be loaded starts the missing file recovery.
    /// When the user removes it, the entry that takes its slot is shown next.
    pub async fn display_current(&mut self) -> Result<()> {
        loop {
            let Some(current) = self.working_set.current() else {
                self.clear_display();
                return Ok(());
            };
            let entry = current.entry.clone();

            match load_rgba(&entry.image_path) {
                Ok(image) => {
                    self.key = self
                        .key
                        .with_target(Rgb(entry.target_rgb))
                        .with_tolerance(entry.tolerance);
                    let rendered = render(&image, self.key.target(), self.key.tolerance())?;

                    self.current_path = Some(PathBuf::from(&entry.image_path));
                    self.display.display(&rendered);
                    self.display.show_tolerance(self.key.tolerance());
                    let (current, total) = self.working_set.position();
                    self.display.show_position(current, total);
                    return Ok(());
                }
                Err(e) => {
                    if !self.recover_missing_file(&entry, &e).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Ask whether an unloadable entry should leave the catalog
    ///
    /// Returns `true` when the entry was removed. A declined or failed
    /// removal only clears the display; the entry stays and asks again on
    /// the next visit.
    async fn recover_missing_file(
        &mut self,
        entry: &ImageEntry,
        cause: &chroma_key::Error,
    ) -> Result<bool> {
        log::warn!("image {} unavailable: {cause}", entry.id);

        let question = format!(
            "Image file '{}' could not be loaded.\nRemove this image from the catalog?",
            entry.image_path
        );

        if !self.ui.confirm(&question) {
            self.clear_display();
            return Ok(false);
        }

        if let Err(e) = self.store.delete_by_id(entry.id).await {
            self.clear_display();
            return Err(e.into());
        }
        self.working_set.remove_current();
        log::info!("removed missing image {} from the catalog", entry.id);

        Ok(true)
    }

    fn clear_display(&mut self) {
        self.current_path = None;
        self.display.clear();
        let (current, total) = self.working_set.position();
        self.display.show_position(current, total);
    }

    pub async fn next(&mut self) -> Result<()> {
        self.require_navigable()?;
        self.working_set.advance();
        self.display_current().await
    }

    pub async fn previous(&mut self) -> Result<()> {
        self.require_navigable()?;
        self.working_set.retreat();
        self.display_current().await
    }

    fn require_navigable(&self) -> Result<()> {
        if self.mode != Mode::Catalog || self.working_set.is_empty() {
            return Err(SessionError::validation("There are no images to navigate."));
        }
        Ok(())
    }

    /// Change the tolerance used for the current image
    ///
    /// In catalog mode the selected entry is updated in memory only;
    /// `commit_current` writes it back.
    pub async fn set_tolerance(&mut self, tolerance: u8) -> Result<()> {
        if tolerance > MAX_TOLERANCE {
            return Err(SessionError::validation(format!(
                "Tolerance must be between 0 and {MAX_TOLERANCE}."
            )));
        }

        self.key = self.key.with_tolerance(tolerance);
        self.display.show_tolerance(tolerance);

        if self.mode == Mode::Catalog {
            if let Some(current) = self.working_set.current_mut() {
                current.set_tolerance(tolerance);
            }
        }

        self.refresh().await
    }

    /// Change the key color, see `set_tolerance` for catalog behaviour
    pub async fn set_target_color(&mut self, color: Rgb<u8>) -> Result<()> {
        self.key = self.key.with_target(color);

        if self.mode == Mode::Catalog {
            if let Some(current) = self.working_set.current_mut() {
                current.set_target_color(color);
            }
        }

        self.refresh().await
    }

    /// Re-render whatever is currently on screen
    async fn refresh(&mut self) -> Result<()> {
        let Some(path) = self.current_path.clone() else {
            return Ok(());
        };

        match self.mode {
            Mode::Catalog => self.display_current().await,
            Mode::SingleFile => self.load_single_file(path),
            Mode::Idle => Ok(()),
        }
    }

    /// Store the displayed image with the current key settings under `group_name`
    ///
    /// The working set is left as it is, even when saving into the loaded group.
    pub async fn save_current_to_catalog(&mut self, group_name: &str) -> Result<i64> {
        let Some(path) = self.current_path.as_ref() else {
            return Err(SessionError::validation("No image is displayed."));
        };

        let group_name = group_name.trim();
        if group_name.is_empty() {
            return Err(SessionError::validation("No group name was selected or entered."));
        }

        let id = self
            .store
            .insert(&NewImageEntry {
                group_name: group_name.to_string(),
                image_path: path.to_string_lossy().to_string(),
                target_rgb: self.key.target().0,
                tolerance: self.key.tolerance(),
            })
            .await?;

        self.ui
            .report_message(&format!("Saved the image to '{group_name}'."));
        Ok(id)
    }

    /// Remove the selected entry from the catalog and from the working set
    pub async fn delete_current(&mut self) -> Result<()> {
        self.remove_selected().await?;
        self.display_current().await
    }

    async fn remove_selected(&mut self) -> Result<()> {
        let id = self.selected()?.entry.id;

        self.store.delete_by_id(id).await?;
        self.working_set.remove_current();
        log::info!("deleted image {id}");
        Ok(())
    }

    /// Write the in-memory edits of the selected entry to the catalog
    pub async fn commit_current(&mut self) -> Result<()> {
        let current = self.selected()?;
        if !current.is_dirty() {
            return Err(SessionError::validation("The current image has no unsaved changes."));
        }

        let (id, target_rgb, tolerance) = (
            current.entry.id,
            current.entry.target_rgb,
            current.entry.tolerance,
        );
        self.store.update_key(id, target_rgb, tolerance).await?;

        if let Some(current) = self.working_set.current_mut() {
            current.mark_clean();
        }

        self.ui.report_message("Saved the key settings of the current image.");
        Ok(())
    }

    fn selected(&self) -> Result<&WorkingEntry> {
        match (self.mode, self.working_set.current()) {
            (Mode::Catalog, Some(current)) => Ok(current),
            _ => Err(SessionError::validation("No image is selected.")),
        }
    }

    /// Report a failed operation through the decision sink
    pub fn report<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("{e}");
                e.report(&mut self.ui);
                None
            }
        }
    }

    /// Let the user pick between a file and a catalog group
    pub async fn open(&mut self) {
        match self.ui.choose_file_or_catalog().confirmed() {
            Some(Source::File) => self.open_file().await,
            Some(Source::Catalog) => self.choose_and_load_group().await,
            None => (),
        }
    }

    pub async fn open_file(&mut self) {
        if let Some(path) = self.ui.choose_file().confirmed() {
            let result = self.load_single_file(path);
            self.report(result);
        }
    }

    pub async fn choose_and_load_group(&mut self) {
        let Some(groups) = self.list_groups_reported().await else {
            return;
        };

        if groups.is_empty() {
            self.ui
                .report_message("No groups are registered in the catalog.");
            return;
        }

        let Some(name) = self.ui.choose_group_name(&groups, false).confirmed() else {
            return;
        };

        let result = if name.trim().is_empty() {
            Err(SessionError::validation("No group was selected."))
        } else {
            self.load_group(name.trim()).await
        };
        self.report(result);
    }

    pub async fn save_dialog(&mut self) {
        if self.current_path.is_none() {
            self.ui.report_warning("No image is displayed.");
            return;
        }

        let Some(groups) = self.list_groups_reported().await else {
            return;
        };

        if let Some(name) = self.ui.choose_group_name(&groups, true).confirmed() {
            let result = self.save_current_to_catalog(&name).await;
            self.report(result);
        }
    }

    pub async fn change_color(&mut self) {
        if let Some(color) = self.ui.choose_color(self.key.target()).confirmed() {
            let result = self.set_target_color(color).await;
            self.report(result);
        }
    }

    pub async fn confirm_and_delete_current(&mut self) {
        let question = self.selected().ok().map(|current| {
            format!(
                "Delete the current image (group '{}', file '{}') from the catalog?\nThis cannot be undone.",
                current.entry.group_name,
                Path::new(&current.entry.image_path)
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
            )
        });

        let Some(question) = question else {
            self.ui.report_warning("No image is selected for deletion.");
            return;
        };

        if !self.ui.confirm(&question) {
            return;
        }

        let result = self.remove_selected().await;
        if self.report(result).is_none() {
            return;
        }
        self.ui.report_message("Deleted the image from the catalog.");

        let result = self.display_current().await;
        self.report(result);
    }

    async fn list_groups_reported(&mut self) -> Option<Vec<String>> {
        let result = self.store.list_groups().await.map_err(SessionError::from);
        self.report(result)
    }
}

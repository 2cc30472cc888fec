//! Templates store.
//!
//! System templates are read-only: every mutation below refuses them and
//! returns `false` without scheduling anything. Deleting one is a successful
//! no-op.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;

use crate::db::{templates, DbError, SqlValue, StoreHandle};
use crate::scheduler::SaveScheduler;
use crate::types::{SectionPatch, Template, TemplateSection};
use crate::util::{new_id, now_ms};

use super::selection_after_delete;

#[derive(Default)]
struct TemplatesState {
    /// System templates first, then user templates oldest first.
    templates: Vec<Template>,
    selected: Option<String>,
}

pub struct TemplatesStore {
    store: Arc<dyn StoreHandle>,
    state: Mutex<TemplatesState>,
    saves: SaveScheduler<Template>,
}

impl TemplatesStore {
    pub fn new(store: Arc<dyn StoreHandle>, save_delay: Duration, runtime: Handle) -> Self {
        Self {
            saves: SaveScheduler::new(Arc::clone(&store), save_delay, runtime),
            store,
            state: Mutex::new(TemplatesState::default()),
        }
    }

    /// Replace memory with every template in the database.
    ///
    /// A failed query leaves the store empty. A row whose section blob is
    /// malformed still loads, with no sections.
    pub async fn load(&self) -> Result<usize, DbError> {
        let rows = match self.store.select(templates::SELECT_ALL, Vec::new()).await {
            Ok(rows) => rows,
            Err(e) => {
                log::warn!("Failed to load templates: {}", e);
                *self.state.lock() = TemplatesState::default();
                return Err(e);
            }
        };

        let loaded: Vec<Template> = rows
            .iter()
            .filter_map(|row| match templates::template_from_row(row) {
                Ok(template) => Some(template),
                Err(e) => {
                    log::warn!("Skipping unreadable template row: {}", e);
                    None
                }
            })
            .collect();

        let count = loaded.len();
        *self.state.lock() = TemplatesState {
            templates: loaded,
            selected: None,
        };
        log::info!("Loaded {} templates", count);
        Ok(count)
    }

    /// Create an empty user template, append it and select it.
    pub async fn create(&self, title: &str) -> Result<Template, DbError> {
        self.insert(Template::user(new_id(), title, now_ms())).await
    }

    /// Copy template `id` (system or user) into a new user template titled
    /// `"<title> (copy)"` with fresh section ids. `Ok(None)` if `id` is unknown.
    pub async fn duplicate(&self, id: &str) -> Result<Option<Template>, DbError> {
        let Some(source) = self.get(id) else {
            return Ok(None);
        };

        let now = now_ms();
        let mut copy = Template::user(new_id(), format!("{} (copy)", source.title), now);
        copy.description = source.description;
        copy.general_instructions = source.general_instructions;
        copy.sections = source
            .sections
            .into_iter()
            .map(|section| TemplateSection {
                id: new_id(),
                ..section
            })
            .collect();

        self.insert(copy).await.map(Some)
    }

    async fn insert(&self, template: Template) -> Result<Template, DbError> {
        self.store
            .execute(templates::INSERT, templates::template_params(&template))
            .await?;

        let mut state = self.state.lock();
        state.templates.push(template.clone());
        state.selected = Some(template.id.clone());
        log::info!("Created template {} ({})", template.id, template.title);
        Ok(template)
    }

    /// Delete user template `id`. System templates are left in place and
    /// `Ok(false)` is returned; so is an id not present in memory.
    pub async fn delete(&self, id: &str) -> Result<bool, DbError> {
        if self.is_system(id) {
            log::debug!("Refusing to delete system template {}", id);
            return Ok(false);
        }

        self.saves.cancel(id);
        self.store
            .execute(templates::DELETE, vec![SqlValue::Text(id.to_string())])
            .await?;
        self.saves.cancel(id);

        let mut state = self.state.lock();
        let Some(index) = state.templates.iter().position(|t| t.id == id) else {
            return Ok(false);
        };
        state.templates.remove(index);
        if state.selected.as_deref() == Some(id) {
            state.selected = selection_after_delete(&state.templates, index, |t| t.id.as_str());
        }
        log::info!("Deleted template {}", id);
        Ok(true)
    }

    fn is_system(&self, id: &str) -> bool {
        self.state
            .lock()
            .templates
            .iter()
            .any(|t| t.id == id && t.is_system)
    }

    /// Apply `edit` to user template `id`. `edit` returns whether it changed
    /// anything; only then is `updated_at` bumped and a save scheduled.
    fn mutate(&self, id: &str, edit: impl FnOnce(&mut Template) -> bool) -> bool {
        let snapshot = {
            let mut state = self.state.lock();
            let Some(template) = state.templates.iter_mut().find(|t| t.id == id) else {
                log::debug!("Ignoring edit for unknown template {}", id);
                return false;
            };
            if template.is_system {
                log::debug!("Ignoring edit for system template {}", id);
                return false;
            }
            if !edit(template) {
                return false;
            }
            template.touch(now_ms());
            template.clone()
        };
        self.saves.schedule(snapshot);
        true
    }

    pub fn update_title(&self, id: &str, title: &str) -> bool {
        self.mutate(id, |t| {
            t.title = title.to_string();
            true
        })
    }

    pub fn update_description(&self, id: &str, description: &str) -> bool {
        self.mutate(id, |t| {
            t.description = description.to_string();
            true
        })
    }

    pub fn update_general_instructions(&self, id: &str, instructions: &str) -> bool {
        self.mutate(id, |t| {
            t.general_instructions = instructions.to_string();
            true
        })
    }

    /// Append a new Paragraph/Normal section. Returns its id.
    pub fn add_section(&self, template_id: &str, title: &str) -> Option<String> {
        let section = TemplateSection::new(title);
        let section_id = section.id.clone();
        self.mutate(template_id, |t| {
            t.sections.push(section);
            true
        })
        .then_some(section_id)
    }

    pub fn update_section(&self, template_id: &str, section_id: &str, patch: SectionPatch) -> bool {
        self.mutate(template_id, |t| match t.section_index(section_id) {
            Some(idx) => {
                patch.apply(&mut t.sections[idx]);
                true
            }
            None => false,
        })
    }

    pub fn remove_section(&self, template_id: &str, section_id: &str) -> bool {
        self.mutate(template_id, |t| match t.section_index(section_id) {
            Some(idx) => {
                t.sections.remove(idx);
                true
            }
            None => false,
        })
    }

    /// Move the section at `from` so it ends up at index `to`.
    pub fn move_section(&self, template_id: &str, from: usize, to: usize) -> bool {
        self.mutate(template_id, |t| {
            let len = t.sections.len();
            if from == to || from >= len || to >= len {
                return false;
            }
            let section = t.sections.remove(from);
            t.sections.insert(to, section);
            true
        })
    }

    pub fn select(&self, id: Option<&str>) -> bool {
        let mut state = self.state.lock();
        match id {
            None => {
                state.selected = None;
                true
            }
            Some(id) if state.templates.iter().any(|t| t.id == id) => {
                state.selected = Some(id.to_string());
                true
            }
            Some(_) => false,
        }
    }

    pub fn selected_id(&self) -> Option<String> {
        self.state.lock().selected.clone()
    }

    pub fn selected(&self) -> Option<Template> {
        let state = self.state.lock();
        let id = state.selected.as_deref()?;
        state.templates.iter().find(|t| t.id == id).cloned()
    }

    pub fn get(&self, id: &str) -> Option<Template> {
        self.state.lock().templates.iter().find(|t| t.id == id).cloned()
    }

    /// The first system template in display order.
    pub fn first_system(&self) -> Option<Template> {
        self.state
            .lock()
            .templates
            .iter()
            .find(|t| t.is_system)
            .cloned()
    }

    pub fn list(&self) -> Vec<Template> {
        self.state.lock().templates.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub async fn flush(&self) -> usize {
        self.saves.flush().await
    }
}

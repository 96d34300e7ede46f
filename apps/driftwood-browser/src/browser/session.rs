use super::*;

impl Session {
    pub(super) fn new() -> Self {
        Self {
            tabs: Vec::new(),
            active: None,
            next_tab_id: 1,
        }
    }

    /// Appends a tab owning `view` and makes it the active one.
    pub(super) fn open_tab(&mut self, view: Box<dyn EngineView>) -> TabId {
        let id = TabId(self.next_tab_id);
        self.next_tab_id = self.next_tab_id.saturating_add(1);
        self.tabs.push(Tab {
            id,
            view,
            preview: String::new(),
            pending_preview: None,
        });
        self.active = Some(self.tabs.len().saturating_sub(1));
        id
    }

    /// Removes the tab at `index`, destroying its view. The active index
    /// stays on the tab that slid into the gap, or moves to the new last
    /// tab. Closing the only tab leaves the session empty.
    pub(super) fn close_tab(&mut self, index: usize) {
        if index >= self.tabs.len() {
            return;
        }

        self.tabs.remove(index);

        if self.tabs.is_empty() {
            self.active = None;
            return;
        }

        if let Some(active) = self.active {
            let shifted = if index < active { active - 1 } else { active };
            self.active = Some(shifted.min(self.tabs.len().saturating_sub(1)));
        }
    }

    pub(super) fn close_active_tab(&mut self) {
        if let Some(active) = self.active {
            self.close_tab(active);
        }
    }

    pub(super) fn activate(&mut self, index: usize) {
        if index < self.tabs.len() {
            self.active = Some(index);
        }
    }

    /// Moves the active index by `step`, wrapping at both ends.
    pub(super) fn cycle_active(&mut self, step: isize) {
        let count = self.len();
        if count == 0 {
            return;
        }

        let current = self.active.unwrap_or(0) as isize;
        let next = (current + step).rem_euclid(count as isize);
        self.active = Some(next as usize);
    }

    pub(super) fn active_tab(&self) -> Option<&Tab> {
        self.active.and_then(|index| self.tabs.get(index))
    }

    pub(super) fn active_tab_mut(&mut self) -> Option<&mut Tab> {
        let index = self.active?;
        self.tabs.get_mut(index)
    }

    pub(super) fn tab_by_id_mut(&mut self, id: TabId) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|tab| tab.id == id)
    }

    pub(super) fn len(&self) -> usize {
        self.tabs.len()
    }

    pub(super) fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}

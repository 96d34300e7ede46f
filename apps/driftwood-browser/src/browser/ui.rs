use super::navigation::normalize_input_url;
use super::navigation::tab_display_title;
use super::*;

impl Default for DriftwoodApp {
    fn default() -> Self {
        let view_factory: Box<dyn Fn() -> Box<dyn EngineView>> =
            Box::new(|| Box::new(LocalDocumentEngine::default()));
        Self::new(view_factory, DEFAULT_URL)
    }
}

impl DriftwoodApp {
    pub(super) fn new(
        view_factory: Box<dyn Fn() -> Box<dyn EngineView>>,
        initial_url: &str,
    ) -> Self {
        let mut app = Self {
            session: Session::new(),
            view_factory,
            address_input: String::new(),
            status_line: "Ready".to_owned(),
            last_error: None,
            pending_pagination: None,
            focus_location_bar: false,
            synced_tab: None,
            window_title: String::new(),
        };
        app.open_tab_with_url(initial_url);
        app
    }

    fn open_tab(&mut self) {
        self.open_tab_with_url(DEFAULT_URL);
    }

    fn open_tab_with_url(&mut self, url: &str) {
        let view = (self.view_factory)();
        let id = self.session.open_tab(view);
        if let Some(tab) = self.session.tab_by_id_mut(id) {
            tab.view.load(url);
        }
        self.address_input = url.to_owned();
        self.status_line = format!("Loading {url}...");
        self.last_error = None;
        self.synced_tab = Some(id);
    }

    fn close_active_tab(&mut self) {
        self.session.close_active_tab();
        self.drop_orphaned_pagination();
    }

    fn close_tab_at(&mut self, index: usize) {
        self.session.close_tab(index);
        self.drop_orphaned_pagination();
    }

    fn drop_orphaned_pagination(&mut self) {
        let orphaned = self.pending_pagination.as_ref().is_some_and(|pending| {
            self.session.tabs.iter().all(|tab| tab.id != pending.tab_id)
        });
        if orphaned {
            self.pending_pagination = None;
        }
    }

    /// Loads location-bar input in the active tab. Empty input is a no-op.
    fn navigate_active_tab(&mut self, raw_input: &str) {
        let Some(url) = normalize_input_url(raw_input) else {
            return;
        };

        let Some(tab) = self.session.active_tab_mut() else {
            self.status_line = "No open tabs".to_owned();
            return;
        };

        tab.view.load(&url);
        self.address_input = url.clone();
        self.status_line = format!("Loading {url}...");
        self.last_error = None;
    }

    fn go_back(&mut self) {
        if let Some(tab) = self.session.active_tab_mut() {
            tab.view.go_back();
        }
    }

    fn go_forward(&mut self) {
        if let Some(tab) = self.session.active_tab_mut() {
            tab.view.go_forward();
        }
    }

    fn stop_active_tab(&mut self) {
        let Some(tab) = self.session.active_tab_mut() else {
            return;
        };
        tab.view.stop();
        self.address_input = tab.view.current_url().unwrap_or_default().to_owned();
    }

    fn reload_active_tab(&mut self) {
        let Some(tab) = self.session.active_tab_mut() else {
            return;
        };
        tab.view.reload();
        let current = tab.view.current_url().unwrap_or_default().to_owned();
        if !current.is_empty() {
            self.status_line = format!("Loading {current}...");
        }
    }

    /// Snapshots the active tab's HTML and records the lookup. The link
    /// search itself runs when the snapshot event comes back.
    fn start_pagination(&mut self, relation: PageRelation) {
        let Some(tab) = self.session.active_tab_mut() else {
            return;
        };

        let Some(page_url) = tab.view.current_url().map(str::to_owned) else {
            self.status_line = "No page to paginate".to_owned();
            return;
        };

        let snapshot_id = tab.view.request_html();
        self.pending_pagination = Some(PendingPagination {
            snapshot_id,
            tab_id: tab.id,
            page_url,
            relation,
        });
        self.status_line = format!("Looking for a {} link...", relation_label(relation));
    }

    /// Drains every tab's event queue. Returns true if any event was
    /// handled, so the caller can schedule another frame.
    fn poll_engine_events(&mut self) -> bool {
        let active_id = self.session.active_tab().map(|tab| tab.id);

        let mut handled = false;
        let mut address_rewrite: Option<String> = None;
        let mut pagination_target: Option<(TabId, String)> = None;

        for tab in &mut self.session.tabs {
            while let Some(event) = tab.view.poll_event() {
                handled = true;
                match event {
                    EngineEvent::UrlChanged { url } => {
                        if Some(tab.id) == active_id {
                            address_rewrite = Some(url);
                        }
                    }
                    EngineEvent::TitleChanged { .. } => {
                        // Titles are re-read from the view every frame.
                    }
                    EngineEvent::LoadFinished { result } => match result {
                        Ok(()) => {
                            tab.pending_preview = Some(tab.view.request_html());
                            if Some(tab.id) == active_id {
                                let url = tab.view.current_url().unwrap_or_default();
                                self.status_line = format!("Loaded {url}");
                                self.last_error = None;
                            }
                        }
                        Err(error) => {
                            if Some(tab.id) == active_id {
                                self.status_line = "Load failed".to_owned();
                                self.last_error = Some(error);
                            }
                        }
                    },
                    EngineEvent::RequestBlocked { url } => {
                        if Some(tab.id) == active_id {
                            self.status_line = format!("Blocked {url}");
                        }
                    }
                    EngineEvent::HtmlSnapshot { id, html } => {
                        let matches_pagination =
                            self.pending_pagination.as_ref().is_some_and(|pending| {
                                pending.snapshot_id == id && pending.tab_id == tab.id
                            });

                        if matches_pagination {
                            let Some(pending) = self.pending_pagination.take() else {
                                continue;
                            };
                            if tab.view.current_url() != Some(pending.page_url.as_str()) {
                                // The tab moved on while the snapshot was in
                                // flight, so the lookup no longer applies.
                                continue;
                            }
                            match find_pagination_link_with_defaults(
                                &html,
                                pending.relation,
                                &pending.page_url,
                            ) {
                                Some(link) => {
                                    pagination_target = Some((tab.id, link));
                                }
                                None => {
                                    if Some(tab.id) == active_id {
                                        self.status_line = format!(
                                            "No {} link found",
                                            relation_label(pending.relation)
                                        );
                                    }
                                }
                            }
                        } else if tab.pending_preview == Some(id) {
                            tab.pending_preview = None;
                            tab.preview = Document::parse(&html).text_preview(PREVIEW_MAX_CHARS);
                        }
                        // Snapshots matching neither ticket belong to
                        // superseded requests and are dropped.
                    }
                }
            }
        }

        if let Some(url) = address_rewrite {
            self.address_input = url;
        }

        if let Some((tab_id, link)) = pagination_target {
            if Some(tab_id) == active_id {
                self.status_line = format!("Loading {link}...");
            }
            if let Some(tab) = self.session.tab_by_id_mut(tab_id) {
                tab.view.load(&link);
            }
        }

        handled
    }

    /// Rewrites the location bar when the active tab changes.
    fn sync_active_tab(&mut self) {
        let (id, url) = match self.session.active_tab() {
            Some(tab) => (
                Some(tab.id),
                tab.view.current_url().unwrap_or_default().to_owned(),
            ),
            None => (None, String::new()),
        };

        if self.synced_tab != id {
            self.synced_tab = id;
            self.address_input = url;
        }
    }

    fn apply_window_title(&mut self, ctx: &egui::Context) {
        let title = self
            .session
            .active_tab()
            .and_then(|tab| tab.view.title())
            .filter(|title| !title.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| APP_NAME.to_owned());

        if title != self.window_title {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title.clone()));
            self.window_title = title;
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let ctrl_shift = egui::Modifiers::COMMAND | egui::Modifiers::SHIFT;

        if ctx.input_mut(|input| input.consume_key(egui::Modifiers::COMMAND, egui::Key::T)) {
            self.open_tab();
        }
        if ctx.input_mut(|input| input.consume_key(egui::Modifiers::COMMAND, egui::Key::W)) {
            self.close_active_tab();
        }
        if ctx.input_mut(|input| input.consume_key(egui::Modifiers::COMMAND, egui::Key::L))
            || ctx.input_mut(|input| input.consume_key(egui::Modifiers::ALT, egui::Key::D))
        {
            self.focus_location_bar = true;
        }
        if ctx.input_mut(|input| input.consume_key(egui::Modifiers::ALT, egui::Key::ArrowLeft)) {
            self.go_back();
        }
        if ctx.input_mut(|input| input.consume_key(egui::Modifiers::ALT, egui::Key::ArrowRight)) {
            self.go_forward();
        }
        if ctx.input_mut(|input| input.consume_key(ctrl_shift, egui::Key::ArrowLeft)) {
            self.start_pagination(PageRelation::Previous);
        }
        if ctx.input_mut(|input| input.consume_key(ctrl_shift, egui::Key::ArrowRight)) {
            self.start_pagination(PageRelation::Next);
        }
        if ctx.input_mut(|input| input.consume_key(egui::Modifiers::COMMAND, egui::Key::R))
            || ctx.input_mut(|input| input.consume_key(egui::Modifiers::NONE, egui::Key::F5))
        {
            self.reload_active_tab();
        }
        if ctx.input_mut(|input| input.consume_key(egui::Modifiers::NONE, egui::Key::Escape)) {
            self.stop_active_tab();
        }
        if ctx.input_mut(|input| input.consume_key(ctrl_shift, egui::Key::Tab)) {
            self.session.cycle_active(-1);
        } else if ctx.input_mut(|input| input.consume_key(egui::Modifiers::COMMAND, egui::Key::Tab))
        {
            self.session.cycle_active(1);
        }
    }

    fn render_viewport(&self, ui: &mut egui::Ui) {
        if self.session.is_empty() {
            ui.label("No open tabs. Ctrl+T opens one.");
            return;
        }

        let Some(tab) = self.session.active_tab() else {
            return;
        };

        if let Some(title) = tab.view.title() {
            ui.label(format!("Title: {title}"));
            ui.separator();
        }

        if tab.preview.is_empty() {
            ui.label("Nothing to show for this page.");
            return;
        }

        egui::ScrollArea::vertical()
            .id_salt("viewport_text_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.label(egui::RichText::new(tab.preview.as_str()).size(14.0));
            });
    }
}

fn relation_label(relation: PageRelation) -> &'static str {
    match relation {
        PageRelation::Next => "next",
        PageRelation::Previous => "previous",
    }
}

impl eframe::App for DriftwoodApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_engine_events();
        self.handle_shortcuts(ctx);
        self.sync_active_tab();

        if self.session.tabs.iter().any(|tab| tab.view.is_loading()) {
            ctx.request_repaint_after(Duration::from_millis(50));
        }

        egui::TopBottomPanel::top("toolbar_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let (can_back, can_forward, is_loading) = match self.session.active_tab() {
                    Some(tab) => (
                        tab.view.can_go_back(),
                        tab.view.can_go_forward(),
                        tab.view.is_loading(),
                    ),
                    None => (false, false, false),
                };

                if ui.button("Previous").clicked() {
                    self.start_pagination(PageRelation::Previous);
                }
                if ui
                    .add_enabled(can_back, egui::Button::new("Back"))
                    .clicked()
                {
                    self.go_back();
                }
                if ui
                    .add_enabled(can_forward, egui::Button::new("Forward"))
                    .clicked()
                {
                    self.go_forward();
                }
                if ui.button("Next").clicked() {
                    self.start_pagination(PageRelation::Next);
                }
                if ui
                    .add_enabled(is_loading, egui::Button::new("Stop"))
                    .clicked()
                {
                    self.stop_active_tab();
                }
                if ui.button("Reload").clicked() {
                    self.reload_active_tab();
                }

                let width = (ui.available_width() - 60.0).max(200.0);
                let response = ui.add_sized(
                    [width, 28.0],
                    egui::TextEdit::singleline(&mut self.address_input).hint_text("Enter URL"),
                );

                if self.focus_location_bar {
                    response.request_focus();
                    if let Some(mut state) = egui::TextEdit::load_state(ui.ctx(), response.id) {
                        let end = egui::text::CCursor::new(self.address_input.chars().count());
                        state.cursor.set_char_range(Some(egui::text::CCursorRange::two(
                            egui::text::CCursor::new(0),
                            end,
                        )));
                        state.store(ui.ctx(), response.id);
                    }
                    self.focus_location_bar = false;
                }

                let pressed_enter = response.lost_focus()
                    && ui.input(|input| input.key_pressed(egui::Key::Enter));
                if pressed_enter || ui.button("Go").clicked() {
                    let input = self.address_input.clone();
                    self.navigate_active_tab(&input);
                }
            });

            ui.horizontal(|ui| {
                let mut select: Option<usize> = None;
                let mut close: Option<usize> = None;

                for (index, tab) in self.session.tabs.iter().enumerate() {
                    let selected = Some(index) == self.session.active;
                    if ui
                        .selectable_label(selected, tab_display_title(tab.view.title()))
                        .clicked()
                    {
                        select = Some(index);
                    }
                    if ui.small_button("x").clicked() {
                        close = Some(index);
                    }
                }

                if ui.button("+").clicked() {
                    self.open_tab();
                }

                if let Some(index) = select {
                    self.session.activate(index);
                }
                if let Some(index) = close {
                    self.close_tab_at(index);
                }
            });
        });

        egui::TopBottomPanel::bottom("status_panel").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                ui.label(&self.status_line);
                if let Some(error) = &self.last_error {
                    ui.colored_label(
                        egui::Color32::from_rgb(200, 65, 65),
                        format!("Error: {error}"),
                    );
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_viewport(ui);
        });

        if self.poll_engine_events() {
            ctx.request_repaint();
        }
        self.apply_window_title(ctx);
    }
}

#[cfg(test)]
include!("tests.rs");

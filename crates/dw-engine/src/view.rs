//! View trait and events at the engine boundary.

/// Ticket identifying one asynchronous HTML snapshot request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotId(u64);

impl SnapshotId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Event emitted by an engine view, delivered on the control thread via
/// [`EngineView::poll_event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    UrlChanged { url: String },
    TitleChanged { title: String },
    /// A load reached its end. `Err` carries a short human-readable reason.
    LoadFinished { result: Result<(), String> },
    /// Request interception rejected this request before any transfer.
    RequestBlocked { url: String },
    /// Answer to [`EngineView::request_html`], tagged with its ticket.
    HtmlSnapshot { id: SnapshotId, html: String },
}

/// One embedded engine view, owned by exactly one tab.
///
/// Commands never block: their outcomes surface later as [`EngineEvent`]s.
/// The shell drains events once per frame and must tolerate events for
/// loads it no longer cares about.
pub trait EngineView {
    /// Starts loading `url`, replacing the current page.
    fn load(&mut self, url: &str);

    /// Stops the load in progress, if any.
    fn stop(&mut self);

    /// Loads the current page again without touching history.
    fn reload(&mut self);

    fn go_back(&mut self);

    fn go_forward(&mut self);

    fn current_url(&self) -> Option<&str>;

    fn title(&self) -> Option<&str>;

    fn is_loading(&self) -> bool;

    fn can_go_back(&self) -> bool;

    fn can_go_forward(&self) -> bool;

    /// Asks for an HTML snapshot of the current page. The snapshot arrives
    /// later as [`EngineEvent::HtmlSnapshot`] carrying the returned ticket;
    /// callers match tickets to drop answers they no longer want.
    fn request_html(&mut self) -> SnapshotId;

    /// Takes the next pending event, oldest first.
    fn poll_event(&mut self) -> Option<EngineEvent>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TabId(u64);

/// One browser tab. A tab always owns exactly one engine view; there is no
/// "tab without a page" state to check for at runtime.
struct Tab {
    id: TabId,
    view: Box<dyn EngineView>,
    preview: String,
    pending_preview: Option<SnapshotId>,
}

struct Session {
    tabs: Vec<Tab>,
    active: Option<usize>,
    next_tab_id: u64,
}

/// A pagination lookup waiting for its HTML snapshot. The snapshot is only
/// honored while the ticket, the tab, and the tab's URL all still match.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingPagination {
    snapshot_id: SnapshotId,
    tab_id: TabId,
    page_url: String,
    relation: PageRelation,
}

struct DriftwoodApp {
    session: Session,
    view_factory: Box<dyn Fn() -> Box<dyn EngineView>>,
    address_input: String,
    status_line: String,
    last_error: Option<String>,
    pending_pagination: Option<PendingPagination>,
    focus_location_bar: bool,
    synced_tab: Option<TabId>,
    window_title: String,
}

const APP_NAME: &str = "Driftwood";
const DEFAULT_URL: &str = "about:blank";
const DEFAULT_HOSTS_PATH: &str = "hosts";
const UNTITLED_TAB_TITLE: &str = "(Untitled)";
const TAB_TITLE_MAX_CHARS: usize = 24;
const PREVIEW_MAX_CHARS: usize = 2400;

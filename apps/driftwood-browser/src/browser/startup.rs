use super::navigation::normalize_input_url;
use super::*;

pub(super) struct LaunchConfig {
    pub(super) hosts_path: PathBuf,
    pub(super) initial_url: Option<String>,
}

pub(crate) fn run() -> Result<(), eframe::Error> {
    let config = match parse_launch_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Driftwood startup error: {error}");
            return Ok(());
        }
    };

    let blocklist = Arc::new(Blocklist::from_hosts_path(&config.hosts_path));
    let view_factory: Box<dyn Fn() -> Box<dyn EngineView>> = Box::new(move || {
        Box::new(LocalDocumentEngine::new(Box::new(BlocklistInterceptor::new(
            Arc::clone(&blocklist),
        ))))
    });

    let initial_url = config
        .initial_url
        .as_deref()
        .and_then(normalize_input_url)
        .unwrap_or_else(|| DEFAULT_URL.to_owned());

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(APP_NAME)
            .with_inner_size([1320.0, 840.0])
            .with_min_inner_size([960.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        APP_NAME,
        native_options,
        Box::new(move |_cc| Ok(Box::new(DriftwoodApp::new(view_factory, &initial_url)))),
    )
}

pub(super) fn parse_launch_args(
    mut args: impl Iterator<Item = String>,
) -> Result<LaunchConfig, String> {
    let mut hosts_path = PathBuf::from(DEFAULT_HOSTS_PATH);
    let mut initial_url = None;

    while let Some(arg) = args.next() {
        if arg == "--hosts-file" {
            let value = args
                .next()
                .ok_or_else(|| "missing path after --hosts-file".to_owned())?;
            hosts_path = PathBuf::from(value);
        } else if arg.starts_with("--") {
            return Err(format!("unsupported flag `{arg}`"));
        } else if initial_url.is_none() {
            initial_url = Some(arg);
        } else {
            return Err(format!("unexpected extra argument `{arg}`"));
        }
    }

    Ok(LaunchConfig {
        hosts_path,
        initial_url,
    })
}

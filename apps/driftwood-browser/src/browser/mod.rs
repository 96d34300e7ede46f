use dw_blocklist::Blocklist;
use dw_engine::BlocklistInterceptor;
use dw_engine::EngineEvent;
use dw_engine::EngineView;
use dw_engine::LocalDocumentEngine;
use dw_engine::SnapshotId;
use dw_html::Document;
use dw_paging::PageRelation;
use dw_paging::find_pagination_link_with_defaults;
use eframe::egui;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

include!("constants.rs");
include!("types.rs");

mod navigation;
mod session;
mod startup;
mod ui;

pub(crate) use startup::run;

use std::sync::Arc;

use wsrun_core::api::{OutputRendererPlugin, ProcessAdapter};

use crate::renderers::{JsonlRendererPlugin, TextRendererPlugin};
use crate::runner::ProcessRunnerPlugin;

pub fn build_runner() -> Arc<dyn ProcessAdapter> {
    Arc::new(ProcessRunnerPlugin::new())
}

pub fn build_renderer(format: &str, ascii_only: bool) -> Arc<dyn OutputRendererPlugin> {
    match format {
        "jsonl" => Arc::new(JsonlRendererPlugin::new(false)),
        // Anything other than jsonl behaves like text.
        _ => Arc::new(TextRendererPlugin::new(ascii_only)),
    }
}

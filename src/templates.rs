use std::collections::HashMap;

use tera::Tera;

use crate::config::{
    UiConfig, COMMIT_DISPLAY_LEN, ELLIPSIS, SERVER_TIME_FORMAT, VALUE_DISPLAY_KEEP,
    VALUE_DISPLAY_MAX,
};
use crate::error::AppError;
use crate::snapshot::StatusSnapshot;

pub const STATUS_TEMPLATE: &str = "status.html";

/// Initialize the Tera template engine with the built-in status page
pub fn init_templates() -> Result<Tera, AppError> {
    let mut tera = Tera::default();
    tera.add_raw_template(STATUS_TEMPLATE, include_str!("../templates/status.html"))?;

    tera.register_filter("truncate_display", truncate_display_filter);
    tera.register_filter("short_commit", short_commit_filter);

    Ok(tera)
}

/// Render the status page for one snapshot.
pub fn render_status_page(
    tera: &Tera,
    ui: &UiConfig,
    snapshot: &StatusSnapshot,
) -> Result<String, AppError> {
    let mut context = tera::Context::new();
    context.insert("config", ui);
    context.insert("snapshot", snapshot);
    context.insert(
        "server_time",
        &snapshot.server_time.format(SERVER_TIME_FORMAT).to_string(),
    );

    Ok(tera.render(STATUS_TEMPLATE, &context)?)
}

/// Values over 60 characters keep their first 57 plus an ellipsis.
pub fn truncate_display(value: &str) -> String {
    if value.chars().count() <= VALUE_DISPLAY_MAX {
        return value.to_string();
    }
    let mut truncated: String = value.chars().take(VALUE_DISPLAY_KEEP).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

/// Commits over 12 characters are cut to 12, no marker.
pub fn short_commit(commit: &str) -> String {
    commit.chars().take(COMMIT_DISPLAY_LEN).collect()
}

fn truncate_display_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("truncate_display filter expects a string"))?;
    Ok(tera::Value::String(truncate_display(s)))
}

fn short_commit_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("short_commit filter expects a string"))?;
    Ok(tera::Value::String(short_commit(s)))
}

//! HTML rendering for both embed modes.

use askama::Template;

use crate::embed::{ATTR_HOST, ATTR_MODE, ATTR_TENANT, EmbedConfig, WidgetError, WidgetMode};
use crate::modal::ModalState;

#[derive(Template)]
#[template(path = "widget/iframe.html")]
struct IframeTemplate<'a> {
    src: &'a str,
}

#[derive(Template)]
#[template(path = "widget/modal.html")]
struct ModalTemplate<'a> {
    src: &'a str,
    overlay_display: &'a str,
}

#[derive(Template)]
#[template(path = "widget/script_tag.html")]
struct ScriptTagTemplate<'a> {
    loader: &'a str,
    attr_tenant: &'a str,
    attr_host: &'a str,
    attr_mode: &'a str,
    tenant: &'a str,
    host: &'a str,
    mode: &'a str,
}

/// Markup the loader inserts in place of its script tag.
pub fn render(config: &EmbedConfig) -> Result<String, WidgetError> {
    let src = config.widget_url();
    let html = match config.mode {
        WidgetMode::Iframe => IframeTemplate { src: &src }.render()?,
        WidgetMode::Modal => ModalTemplate {
            src: &src,
            overlay_display: ModalState::new().overlay_display(),
        }
        .render()?,
    };
    tracing::debug!(tenant = %config.tenant, mode = %config.mode, "rendered widget markup");
    Ok(html)
}

/// Snippet a merchant pastes into their site.
pub fn script_tag(config: &EmbedConfig) -> Result<String, WidgetError> {
    let loader = config.loader_url();
    let html = ScriptTagTemplate {
        loader: &loader,
        attr_tenant: ATTR_TENANT,
        attr_host: ATTR_HOST,
        attr_mode: ATTR_MODE,
        tenant: config.tenant.as_str(),
        host: &config.host,
        mode: config.mode.as_str(),
    }
    .render()?;
    Ok(html)
}

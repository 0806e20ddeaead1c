//! Shadow root creation and style injection, run once per instance on first mount.

use crate::css::stylesheet::{CompiledStylesheet, StyleScope};
use crate::dom::NodeId;
use crate::element::definition::RenderTarget;
use crate::element::instance::InstanceId;
use crate::runtime::{Runtime, RuntimeError};

/// Attribute marking document-level styles injected for light-DOM components.
pub const SCOPE_ATTRIBUTE: &str = "data-petal-scope";

impl Runtime {
    /// Decide the render root and attach styles.
    pub(crate) fn mount_instance(&mut self, id: InstanceId) -> Result<(), RuntimeError> {
        let Some(instance) = self.instances.get(id) else {
            return Ok(());
        };
        let host = instance.host;
        let definition = instance.definition.clone();
        let tag = definition.tag();

        let root = match definition.target() {
            RenderTarget::Shadow(mode) if self.config.capabilities.shadow_dom => {
                let root = match self.dom.shadow_root(host) {
                    Some(existing) => existing,
                    None => self
                        .dom
                        .attach_shadow(host, mode.unwrap_or(self.config.default_shadow_mode))?,
                };
                if let Some(sheet) = definition.styles() {
                    let compiled = self.styles.get_or_compile(tag, sheet, StyleScope::Shadow);
                    if self.config.capabilities.constructable_stylesheets {
                        self.dom.adopt_stylesheet(root, compiled)?;
                    } else {
                        tracing::warn!(tag, "constructable stylesheets unavailable, inserting <style>");
                        let style = self.insert_shadow_style(root, &compiled)?;
                        if let Some(instance) = self.instances.get_mut(id) {
                            instance.style_node = Some(style);
                        }
                    }
                }
                root
            }
            target => {
                if matches!(target, RenderTarget::Shadow(_)) {
                    tracing::warn!(tag, "shadow DOM unavailable, rendering into light DOM");
                }
                if let Some(sheet) = definition.styles() {
                    let compiled = self.styles.get_or_compile(tag, sheet, StyleScope::Light);
                    if self.styles.mark_injected(tag) {
                        self.inject_document_style(&compiled)?;
                    }
                }
                host
            }
        };

        if let Some(instance) = self.instances.get_mut(id) {
            instance.render_root = Some(root);
        }
        Ok(())
    }

    fn insert_shadow_style(
        &mut self,
        root: NodeId,
        sheet: &CompiledStylesheet,
    ) -> Result<NodeId, RuntimeError> {
        let style = self.style_element(sheet)?;
        let first = self.dom.children(root).first().copied();
        self.dom.insert_before(root, style, first)?;
        Ok(style)
    }

    fn inject_document_style(&mut self, sheet: &CompiledStylesheet) -> Result<NodeId, RuntimeError> {
        let style = self.style_element(sheet)?;
        self.dom.set_attribute(style, SCOPE_ATTRIBUTE, sheet.tag())?;
        let head = self.dom.head();
        self.dom.append_child(head, style)?;
        tracing::debug!(tag = sheet.tag(), "scoped stylesheet injected into document");
        Ok(style)
    }

    fn style_element(&mut self, sheet: &CompiledStylesheet) -> Result<NodeId, RuntimeError> {
        let style = self.dom.create_element("style");
        let text = self.dom.create_text(sheet.css_text());
        self.dom.append_child(style, text)?;
        Ok(style)
    }
}

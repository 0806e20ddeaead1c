//! Attribute/state binding: field writes, reflection, attribute callbacks.
//!
//! A field write stores the value, marks the instance dirty and, for fields
//! bound to an attribute, mirrors the value onto the host. That write happens
//! under the instance's `reflecting` guard so the attribute callback it
//! triggers is ignored, which is what keeps field and attribute from
//! ping-ponging.

use crate::dom::NodeId;
use crate::element::field::FieldValue;
use crate::element::instance::{AttributeChange, InstanceId};
use crate::element::lifecycle::HookPhase;
use crate::runtime::{ElementContext, Runtime, RuntimeError};

impl Runtime {
    // ── Fields ───────────────────────────────────────────────────────

    /// Last committed value of a field.
    pub fn field(&self, host: NodeId, name: &str) -> Result<FieldValue, RuntimeError> {
        let id = self.instance_id(host)?;
        let instance = &self.instances[id];
        instance
            .field(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownField {
                tag: instance.tag().to_owned(),
                field: name.to_owned(),
            })
    }

    /// Whether `host` is a component declaring field `name`.
    pub fn has_field(&self, host: NodeId, name: &str) -> bool {
        self.instance(host)
            .is_some_and(|i| i.definition.field(name).is_some())
    }

    /// Write a field.
    ///
    /// An equal value is a no-op returning `false`. Otherwise the instance is
    /// marked dirty, the attribute reflected when the field asks for it, and a
    /// render scheduled if the element is mounted and connected.
    pub fn set_field(
        &mut self,
        host: NodeId,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<bool, RuntimeError> {
        let id = self.instance_id(host)?;
        let value = value.into();
        let instance = &mut self.instances[id];
        let Some(spec) = instance.definition.field(name) else {
            return Err(RuntimeError::UnknownField {
                tag: instance.tag().to_owned(),
                field: name.to_owned(),
            });
        };
        if instance.fields.get(name) == Some(&value) {
            return Ok(false);
        }
        let reflect_to = spec.reflects().then(|| spec.attribute_name()).flatten().map(str::to_owned);
        tracing::trace!(tag = instance.tag(), field = name, ?value, "field written");
        instance.fields.insert(name.to_owned(), value.clone());
        instance.dirty = true;

        if let Some(attribute) = reflect_to {
            self.reflect(id, host, &attribute, &value)?;
        }
        self.schedule_instance(id);
        Ok(true)
    }

    /// Write a field from its current value.
    pub fn update_field(
        &mut self,
        host: NodeId,
        name: &str,
        f: impl FnOnce(&FieldValue) -> FieldValue,
    ) -> Result<bool, RuntimeError> {
        let current = self.field(host, name)?;
        self.set_field(host, name, f(&current))
    }

    fn reflect(
        &mut self,
        id: InstanceId,
        host: NodeId,
        attribute: &str,
        value: &FieldValue,
    ) -> Result<(), RuntimeError> {
        let desired = value.to_attribute();
        if self.dom.get_attribute(host, attribute) == desired.as_deref() {
            return Ok(());
        }
        if let Some(instance) = self.instances.get_mut(id) {
            instance.reflecting = true;
        }
        let result = match desired {
            Some(text) => self.set_attribute(host, attribute, &text),
            None => self.remove_attribute(host, attribute),
        };
        if let Some(instance) = self.instances.get_mut(id) {
            instance.reflecting = false;
        }
        result
    }

    // ── Attributes ───────────────────────────────────────────────────

    /// Set an attribute. Observed attributes of component hosts are delivered
    /// to [`attribute_changed_callback`](Self::attribute_changed_callback).
    pub fn set_attribute(&mut self, el: NodeId, name: &str, value: &str) -> Result<(), RuntimeError> {
        let name = name.to_ascii_lowercase();
        let old = self.dom.set_attribute(el, &name, value)?;
        self.notify_attribute(el, &name, old.as_deref(), Some(value))
    }

    /// Remove an attribute. Removing an absent attribute does nothing.
    pub fn remove_attribute(&mut self, el: NodeId, name: &str) -> Result<(), RuntimeError> {
        let name = name.to_ascii_lowercase();
        match self.dom.remove_attribute(el, &name)? {
            Some(old) => self.notify_attribute(el, &name, Some(&old), None),
            None => Ok(()),
        }
    }

    fn notify_attribute(
        &mut self,
        el: NodeId,
        name: &str,
        old: Option<&str>,
        new: Option<&str>,
    ) -> Result<(), RuntimeError> {
        let observed = self
            .instance(el)
            .is_some_and(|i| i.definition.field_for_attribute(name).is_some());
        if observed {
            self.attribute_changed_callback(el, name, old, new)
        } else {
            Ok(())
        }
    }

    /// Deliver an attribute change to the component hosted by `host`.
    ///
    /// Ignored while the runtime itself is reflecting a field. Otherwise the
    /// bound field (if any) takes the converted value when the attribute no
    /// longer reads as the field's current value, and the component's
    /// `attribute_changed` hook runs. If that component is busy in one of its
    /// own hooks, the call is queued and delivered once the hook returns.
    pub fn attribute_changed_callback(
        &mut self,
        host: NodeId,
        name: &str,
        old: Option<&str>,
        new: Option<&str>,
    ) -> Result<(), RuntimeError> {
        let id = self.instance_id(host)?;
        let instance = &mut self.instances[id];
        if instance.reflecting {
            tracing::trace!(tag = instance.tag(), attribute = name, "reflected write ignored");
            return Ok(());
        }

        let mut changed = false;
        if let Some(spec) = instance.definition.field_for_attribute(name) {
            let field = spec.name().to_owned();
            let unchanged = instance
                .fields
                .get(&field)
                .is_some_and(|current| spec.matches_attribute(current, new));
            if !unchanged {
                let value = spec.from_attribute(new);
                tracing::trace!(tag = instance.tag(), attribute = name, ?value, "attribute applied to field");
                instance.fields.insert(field, value);
                instance.dirty = true;
                changed = true;
            }
        }
        if changed {
            self.schedule_instance(id);
        }
        self.run_attribute_hook(id, name, old, new)
    }

    fn run_attribute_hook(
        &mut self,
        id: InstanceId,
        name: &str,
        old: Option<&str>,
        new: Option<&str>,
    ) -> Result<(), RuntimeError> {
        let Some(instance) = self.instances.get_mut(id) else {
            return Ok(());
        };
        if instance.component.is_none() {
            tracing::trace!(tag = instance.tag(), attribute = name, "attribute hook deferred");
            instance.deferred_attribute_hooks.push_back(AttributeChange {
                name: name.to_owned(),
                old: old.map(str::to_owned),
                new: new.map(str::to_owned),
            });
            return Ok(());
        }

        let result = self.with_component(id, |component, rt, host| {
            let mut cx = ElementContext::new(rt, host);
            component.attribute_changed(&mut cx, name, old, new)
        });
        let mut errors = Vec::new();
        if let Some(Err(source)) = result {
            let tag = self.tag_of(id);
            tracing::error!(%tag, attribute = name, error = %source, "attribute hook failed");
            errors.push(RuntimeError::Component {
                tag,
                phase: HookPhase::AttributeChanged,
                source,
            });
        }
        if let Err(e) = self.run_deferred_attribute_hooks(id) {
            errors.push(e);
        }
        RuntimeError::collect(errors)
    }

    /// Deliver attribute hooks queued while the component was busy.
    pub(crate) fn run_deferred_attribute_hooks(&mut self, id: InstanceId) -> Result<(), RuntimeError> {
        let mut errors = Vec::new();
        loop {
            let Some(instance) = self.instances.get_mut(id) else {
                break;
            };
            if instance.component.is_none() {
                break;
            }
            let Some(change) = instance.deferred_attribute_hooks.pop_front() else {
                break;
            };
            if let Err(e) =
                self.run_attribute_hook(id, &change.name, change.old.as_deref(), change.new.as_deref())
            {
                errors.push(e);
            }
        }
        RuntimeError::collect(errors)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::dom::MutationRecord;
    use crate::element::{Component, ComponentDefinition, ComponentError, FieldSpec, FieldValue};
    use crate::jsx::Child;
    use crate::runtime::{ElementContext, RenderContext, Runtime, RuntimeError};
    use pretty_assertions::assert_eq;

    struct Icon;

    impl Component for Icon {
        fn render(&self, cx: &mut RenderContext<'_>) -> Result<Child, ComponentError> {
            Ok(cx.field("size").into())
        }

        fn attribute_changed(
            &mut self,
            _cx: &mut ElementContext<'_>,
            _name: &str,
            _old: Option<&str>,
            new: Option<&str>,
        ) -> Result<(), ComponentError> {
            if new == Some("explode") {
                return Err(ComponentError::msg("bad size"));
            }
            Ok(())
        }
    }

    fn icon_runtime() -> (Runtime, crate::dom::NodeId) {
        let mut rt = Runtime::new();
        rt.define(
            ComponentDefinition::builder("x-icon")
                .field(FieldSpec::new("size").default(16).attribute())
                .field(FieldSpec::new("spin").default(false).attribute())
                .field(FieldSpec::new("label").attribute().reflect(false))
                .field(FieldSpec::new("data"))
                .light()
                .build(|| Icon)
                .unwrap(),
        )
        .unwrap();
        let el = rt.create_element("x-icon");
        let body = rt.body();
        rt.append_child(body, el).unwrap();
        rt.dom.take_mutations();
        (rt, el)
    }

    fn attribute_writes(rt: &mut Runtime) -> Vec<(String, Option<String>)> {
        rt.dom
            .take_mutations()
            .into_iter()
            .filter_map(|m| match m {
                MutationRecord::Attribute { name, old_value, .. } => Some((name, old_value)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn equal_write_is_noop() {
        let (mut rt, el) = icon_runtime();
        assert!(!rt.set_field(el, "size", 16).unwrap());
        assert!(!rt.has_pending_microtasks());
        assert!(!rt.instance(el).unwrap().is_dirty());
    }

    #[test]
    fn write_reflects_once_without_reentry() {
        let (mut rt, el) = icon_runtime();
        assert!(rt.set_field(el, "size", 32).unwrap());
        assert_eq!(rt.dom().get_attribute(el, "size"), Some("32"));
        assert_eq!(attribute_writes(&mut rt), vec![("size".to_owned(), None)]);
        assert_eq!(rt.field(el, "size").unwrap(), FieldValue::Int(32));
        assert_eq!(rt.run_microtasks().unwrap(), 1);
        assert!(attribute_writes(&mut rt).is_empty());
    }

    #[test]
    fn boolean_field_reflects_presence() {
        let (mut rt, el) = icon_runtime();
        rt.set_field(el, "spin", true).unwrap();
        assert_eq!(rt.dom().get_attribute(el, "spin"), Some(""));
        rt.set_field(el, "spin", false).unwrap();
        assert_eq!(rt.dom().get_attribute(el, "spin"), None);
    }

    #[test]
    fn attribute_sets_string_field_and_renders_once() {
        let (mut rt, el) = icon_runtime();
        rt.set_attribute(el, "size", "32").unwrap();
        assert_eq!(rt.field(el, "size").unwrap(), FieldValue::from("32"));
        assert_eq!(rt.run_microtasks().unwrap(), 1);
        assert_eq!(rt.dom().text_content(el), "32");
        assert_eq!(attribute_writes(&mut rt), vec![("size".to_owned(), None)]);
    }

    #[test]
    fn removing_attribute_nulls_field() {
        let (mut rt, el) = icon_runtime();
        rt.set_attribute(el, "size", "8").unwrap();
        rt.remove_attribute(el, "size").unwrap();
        assert_eq!(rt.field(el, "size").unwrap(), FieldValue::Null);
        rt.set_attribute(el, "spin", "").unwrap();
        assert_eq!(rt.field(el, "spin").unwrap(), FieldValue::Bool(true));
    }

    #[test]
    fn observed_but_not_reflected() {
        let (mut rt, el) = icon_runtime();
        rt.set_field(el, "label", "hi").unwrap();
        assert_eq!(rt.dom().get_attribute(el, "label"), None);
        rt.set_attribute(el, "label", "yo").unwrap();
        assert_eq!(rt.field(el, "label").unwrap(), FieldValue::from("yo"));
    }

    #[test]
    fn unknown_field_errors() {
        let (mut rt, el) = icon_runtime();
        assert!(matches!(
            rt.set_field(el, "nope", 1),
            Err(RuntimeError::UnknownField { ref field, .. }) if field == "nope"
        ));
        assert!(rt.field(el, "nope").is_err());
        assert!(rt.has_field(el, "data"));
        assert!(!rt.has_field(el, "nope"));
    }

    #[test]
    fn plain_elements_are_not_components() {
        let mut rt = Runtime::new();
        let div = rt.create_element("div");
        assert!(matches!(rt.set_field(div, "x", 1), Err(RuntimeError::NotAComponent)));
        rt.set_attribute(div, "Title", "t").unwrap();
        assert_eq!(rt.dom().get_attribute(div, "title"), Some("t"));
    }

    #[test]
    fn update_field_reads_current_value() {
        let (mut rt, el) = icon_runtime();
        rt.update_field(el, "size", |v| FieldValue::Int(v.as_i64().unwrap_or(0) * 2))
            .unwrap();
        assert_eq!(rt.field(el, "size").unwrap(), FieldValue::Int(32));
    }

    #[test]
    fn hook_error_is_returned_after_field_update() {
        let (mut rt, el) = icon_runtime();
        let err = rt.set_attribute(el, "size", "explode").unwrap_err();
        assert!(matches!(err, RuntimeError::Component { ref tag, .. } if tag == "x-icon"));
        assert_eq!(rt.field(el, "size").unwrap(), FieldValue::from("explode"));
    }

    #[test]
    fn direct_callback_ignored_while_reflecting() {
        let (mut rt, el) = icon_runtime();
        let id = rt.instance_id(el).unwrap();
        rt.instances[id].reflecting = true;
        rt.attribute_changed_callback(el, "size", None, Some("99")).unwrap();
        assert_eq!(rt.field(el, "size").unwrap(), FieldValue::Int(16));
    }

    #[test]
    fn matching_attribute_keeps_typed_field_and_skips_render() {
        let (mut rt, el) = icon_runtime();
        rt.set_field(el, "size", 32).unwrap();
        assert_eq!(rt.run_microtasks().unwrap(), 1);
        let renders = rt.render_count(el);

        rt.set_attribute(el, "size", "32").unwrap();
        assert_eq!(rt.field(el, "size").unwrap(), FieldValue::Int(32));
        assert!(!rt.instance(el).unwrap().is_dirty());
        assert_eq!(rt.run_microtasks().unwrap(), 0);
        assert_eq!(rt.render_count(el), renders);

        rt.set_field(el, "spin", true).unwrap();
        rt.run_microtasks().unwrap();
        rt.set_attribute(el, "spin", "spin").unwrap();
        assert_eq!(rt.field(el, "spin").unwrap(), FieldValue::Bool(true));
        assert_eq!(rt.run_microtasks().unwrap(), 0);
    }

    struct Status {
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl Component for Status {
        fn render(&self, cx: &mut RenderContext<'_>) -> Result<Child, ComponentError> {
            Ok(cx.field("mode").into())
        }

        fn connected(&mut self, cx: &mut ElementContext<'_>) -> Result<(), ComponentError> {
            let host = cx.host();
            cx.set_attribute(host, "mode", "ready")?;
            self.calls.borrow_mut().push("connected".into());
            Ok(())
        }

        fn attribute_changed(
            &mut self,
            _cx: &mut ElementContext<'_>,
            name: &str,
            old: Option<&str>,
            new: Option<&str>,
        ) -> Result<(), ComponentError> {
            self.calls.borrow_mut().push(format!("{name}: {old:?} -> {new:?}"));
            Ok(())
        }
    }

    #[test]
    fn own_attribute_write_inside_hook_is_delivered_after_it() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let log = calls.clone();
        let mut rt = Runtime::new();
        rt.define(
            ComponentDefinition::builder("x-status")
                .field(FieldSpec::new("mode").default("idle").attribute().reflect(false))
                .light()
                .build(move || Status { calls: log.clone() })
                .unwrap(),
        )
        .unwrap();
        let el = rt.create_element("x-status");
        let body = rt.body();
        rt.append_child(body, el).unwrap();

        assert_eq!(
            *calls.borrow(),
            vec!["connected".to_owned(), "mode: None -> Some(\"ready\")".to_owned()]
        );
        assert_eq!(rt.field(el, "mode").unwrap(), FieldValue::from("ready"));
        assert!(rt.instance(el).unwrap().deferred_attribute_hooks.is_empty());
        rt.run_microtasks().unwrap();
        assert_eq!(rt.dom().text_content(el), "ready");
    }
}

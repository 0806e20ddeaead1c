//! History-API style navigation and a path-matching outlet element.
//!
//! [`History`] is the runtime's session history. [`Runtime::navigate`],
//! [`Runtime::back`] and [`Runtime::forward`] move through it and dispatch
//! `popstate` on the window. A [`Router`] maps path patterns to element tags
//! and installs an outlet component that renders the matching element.

use std::rc::Rc;

use crate::element::{Component, ComponentDefinition, ComponentError, ComponentRef};
use crate::event::Event;
use crate::jsx::{Child, Jsx, Props};
use crate::runtime::{ElementContext, RenderContext, Runtime, RuntimeError};

/// Event type dispatched on the window whenever the location changes.
pub const POPSTATE: &str = "popstate";

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// A linear stack of visited paths with a cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    entries: Vec<String>,
    index: usize,
}

impl History {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: vec![initial.into()],
            index: 0,
        }
    }

    pub fn current(&self) -> &str {
        &self.entries[self.index]
    }

    /// Push a new entry, discarding everything forward of the cursor.
    pub fn push(&mut self, path: impl Into<String>) {
        self.entries.truncate(self.index + 1);
        self.entries.push(path.into());
        self.index += 1;
    }

    /// Replace the current entry in place.
    pub fn replace(&mut self, path: impl Into<String>) {
        self.entries[self.index] = path.into();
    }

    pub fn back(&mut self) -> bool {
        if self.can_go_back() {
            self.index -= 1;
            true
        } else {
            false
        }
    }

    pub fn forward(&mut self) -> bool {
        if self.can_go_forward() {
            self.index += 1;
            true
        } else {
            false
        }
    }

    pub fn can_go_back(&self) -> bool {
        self.index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Runtime {
    /// The current location path.
    pub fn location(&self) -> &str {
        self.history.current()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Push `path` onto the history and dispatch `popstate`.
    pub fn navigate(&mut self, path: &str) -> Result<(), RuntimeError> {
        tracing::debug!(path, "navigate");
        self.history.push(path);
        self.notify_location()
    }

    /// Replace the current entry and dispatch `popstate`.
    pub fn replace_location(&mut self, path: &str) -> Result<(), RuntimeError> {
        self.history.replace(path);
        self.notify_location()
    }

    /// Step back one entry. Returns `false` at the start of history.
    pub fn back(&mut self) -> Result<bool, RuntimeError> {
        if !self.history.back() {
            return Ok(false);
        }
        self.notify_location()?;
        Ok(true)
    }

    /// Step forward one entry. Returns `false` at the end of history.
    pub fn forward(&mut self) -> Result<bool, RuntimeError> {
        if !self.history.forward() {
            return Ok(false);
        }
        self.notify_location()?;
        Ok(true)
    }

    fn notify_location(&mut self) -> Result<(), RuntimeError> {
        let window = self.window();
        let event = Event::new(POPSTATE).detail(self.location().to_owned());
        self.dispatch_event(window, event).map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// RoutePattern
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
    Rest,
}

/// A path pattern such as `/users/:id` or `/docs/*`.
///
/// `:name` captures one segment. A trailing `*` matches any remainder,
/// including nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    source: String,
    segments: Vec<Segment>,
}

/// Captured `:param` values in pattern order.
pub type RouteParams = Vec<(String, String)>;

fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    path[..end].split('/').filter(|s| !s.is_empty())
}

impl RoutePattern {
    pub fn parse(pattern: &str) -> Self {
        let mut segments: Vec<Segment> = path_segments(pattern)
            .map(|seg| match seg.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_owned()),
                None if seg == "*" => Segment::Rest,
                None => Segment::Static(seg.to_owned()),
            })
            .collect();
        // `*` only means "rest" at the end.
        if let Some(pos) = segments.iter().position(|s| *s == Segment::Rest) {
            if pos + 1 != segments.len() {
                segments[pos] = Segment::Static("*".to_owned());
            }
        }
        Self {
            source: pattern.to_owned(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Match `path` (query and fragment ignored), returning the captures.
    pub fn matches(&self, path: &str) -> Option<RouteParams> {
        let mut parts = path_segments(path);
        let mut params = RouteParams::new();
        for segment in &self.segments {
            match segment {
                Segment::Rest => return Some(params),
                Segment::Static(expected) => {
                    if parts.next()? != expected.as_str() {
                        return None;
                    }
                }
                Segment::Param(name) => params.push((name.clone(), parts.next()?.to_owned())),
            }
        }
        parts.next().is_none().then_some(params)
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// An ordered route table. The first matching pattern wins.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<(RoutePattern, String)>,
    fallback: Option<String>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `tag` when the location matches `pattern` (builder).
    pub fn route(mut self, pattern: &str, tag: impl Into<String>) -> Self {
        self.routes.push((RoutePattern::parse(pattern), tag.into()));
        self
    }

    /// Render `tag` when nothing matches (builder).
    pub fn fallback(mut self, tag: impl Into<String>) -> Self {
        self.fallback = Some(tag.into());
        self
    }

    /// The tag and params for `path`, if any route or the fallback applies.
    pub fn resolve(&self, path: &str) -> Option<(&str, RouteParams)> {
        self.routes
            .iter()
            .find_map(|(pattern, tag)| pattern.matches(path).map(|params| (tag.as_str(), params)))
            .or_else(|| self.fallback.as_deref().map(|tag| (tag, RouteParams::new())))
    }

    /// Define `outlet_tag` as a light-DOM element rendering the current route.
    pub fn install(self, rt: &mut Runtime, outlet_tag: &str) -> Result<ComponentRef, RuntimeError> {
        let router = Rc::new(self);
        let definition = ComponentDefinition::builder(outlet_tag)
            .light()
            .build(move || Outlet {
                router: router.clone(),
            })?;
        rt.define(definition)
    }
}

struct Outlet {
    router: Rc<Router>,
}

impl Component for Outlet {
    fn render(&self, cx: &mut RenderContext<'_>) -> Result<Child, ComponentError> {
        let location = cx.location().to_owned();
        let Some((tag, params)) = self.router.resolve(&location) else {
            tracing::trace!(%location, "no route");
            return Ok(Child::Empty);
        };
        let mut props = Props::new();
        for (name, value) in params {
            props.insert(name, value);
        }
        Ok(cx.h(tag, props, Vec::new())?.into())
    }

    fn connected(&mut self, cx: &mut ElementContext<'_>) -> Result<(), ComponentError> {
        let host = cx.host();
        cx.listen_window(POPSTATE, move |rt, _| {
            rt.schedule_render(host)?;
            Ok(())
        })?;
        Ok(())
    }
}

//! Page controls: the status text, the enter-VR button and the XR icon
//!
//! Click handlers push into [`PendingUiEvents`], which Bevy systems drain.
//! The enter-VR button is looked up every frame until it exists, so markup
//! added after startup is picked up. The XR icon is created when a VR
//! session starts and removed when it ends; it is only looked up while the
//! session runs.

use bevy::prelude::*;
use glade_core::vr::{VrState, VrTrigger};
use glade_core::ViewerError;
use glade_scene::StatusLine;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::xr::VrControl;

/// A click on one of the page controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    EnterVr,
    XrIcon,
}

/// UI events queued from DOM listeners
#[derive(Resource, Default, Clone)]
pub struct PendingUiEvents(pub Arc<Mutex<VecDeque<UiEvent>>>);

impl PendingUiEvents {
    pub fn push(&self, event: UiEvent) {
        if let Ok(mut queue) = self.0.lock() {
            queue.push_back(event);
        }
    }

    pub fn drain(&self) -> Vec<UiEvent> {
        match self.0.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// What the status element should show
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView {
    pub text: String,
    pub color: &'static str,
    pub display: &'static str,
}

impl StatusView {
    pub fn from_status(status: &StatusLine) -> Self {
        Self {
            text: status.message.text.clone(),
            color: status.message.color(),
            display: if status.visible { "block" } else { "none" },
        }
    }
}

/// What the enter-VR button should show
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonView {
    pub label: &'static str,
    pub display: &'static str,
    pub disabled: bool,
}

impl ButtonView {
    pub fn from_trigger(trigger: &VrTrigger) -> Self {
        Self {
            label: trigger.label(),
            display: if trigger.is_visible() { "block" } else { "none" },
            disabled: !trigger.is_enabled(),
        }
    }
}

/// Attaches a click listener to a page element, returning false when the
/// element is not there
pub type BindFn = Box<dyn Fn(&str, &PendingUiEvents, UiEvent) -> bool + Send + Sync>;

/// How page controls are found and bound
#[derive(Resource)]
pub struct ControlBinder {
    /// Look up by element id
    pub by_id: BindFn,
    /// Look up the first element with a class
    pub by_class: BindFn,
}

impl Default for ControlBinder {
    fn default() -> Self {
        Self {
            by_id: Box::new(js_interop::bind_click_by_id),
            by_class: Box::new(js_interop::bind_click_by_class),
        }
    }
}

/// Add the XR icon to the page
pub fn show_xr_icon(class: &str) {
    if !js_interop::create_xr_icon(class) {
        tracing::debug!("XR icon .{} not created", class);
    }
}

/// Remove the XR icon from the page
pub fn hide_xr_icon(class: &str) {
    js_interop::remove_xr_icon(class);
}

/// Which controls have listeners attached, and what was last written
#[derive(Resource, Default)]
struct PageBindings {
    vr_button: bool,
    xr_icon: bool,
    reported_missing: bool,
    status: Option<StatusView>,
    button: Option<ButtonView>,
}

pub struct PagePlugin;

impl Plugin for PagePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PendingUiEvents>()
            .init_resource::<PageBindings>()
            .init_resource::<ControlBinder>()
            .add_systems(Update, (bind_controls, sync_status, sync_vr_button));
    }
}

fn bind_controls(
    mut bindings: ResMut<PageBindings>,
    binder: Res<ControlBinder>,
    control: Res<VrControl>,
    settings: Res<glade_scene::ViewerSettings>,
    pending: Res<PendingUiEvents>,
) {
    if !bindings.vr_button {
        let id = &settings.dom.vr_button;
        if (binder.by_id)(id.as_str(), &*pending, UiEvent::EnterVr) {
            tracing::info!("Bound VR button #{}", id);
            bindings.vr_button = true;
        } else if !bindings.reported_missing {
            let error = ViewerError::ElementNotFound(format!("#{}", id));
            tracing::warn!("{}; waiting for it", error);
            bindings.reported_missing = true;
        }
    }
    // The icon only exists during a session; a new session gets a new icon
    if control.trigger.state() != VrState::Active {
        bindings.xr_icon = false;
        return;
    }
    if !bindings.xr_icon {
        let class = &settings.dom.xr_icon_class;
        if (binder.by_class)(class.as_str(), &*pending, UiEvent::XrIcon) {
            tracing::info!("Bound XR icon .{}", class);
            bindings.xr_icon = true;
        }
    }
}

fn sync_status(
    status: Res<StatusLine>,
    settings: Res<glade_scene::ViewerSettings>,
    mut bindings: ResMut<PageBindings>,
) {
    let view = StatusView::from_status(&status);
    if bindings.status.as_ref() == Some(&view) {
        return;
    }
    if js_interop::apply_status(&settings.dom.status, &view) {
        bindings.status = Some(view);
    }
}

fn sync_vr_button(
    control: Res<VrControl>,
    settings: Res<glade_scene::ViewerSettings>,
    mut bindings: ResMut<PageBindings>,
) {
    let view = ButtonView::from_trigger(&control.trigger);
    if bindings.button.as_ref() == Some(&view) {
        return;
    }
    if js_interop::apply_button(&settings.dom.vr_button, &view) {
        bindings.button = Some(view);
    }
}

#[cfg(target_arch = "wasm32")]
mod js_interop {
    use super::*;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use web_sys::{Document, Element, HtmlButtonElement, HtmlElement};

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn listen(element: &Element, pending: &PendingUiEvents, event: UiEvent) -> bool {
        let queue = pending.clone();
        let closure = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            queue.push(event);
        }) as Box<dyn FnMut(web_sys::Event)>);

        let result =
            element.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to attach click listener: {:?}", e);
                false
            }
        }
    }

    /// Attach a click listener to the element with `id`. Returns false if it is not there yet.
    pub fn bind_click_by_id(id: &str, pending: &PendingUiEvents, event: UiEvent) -> bool {
        match document().and_then(|d| d.get_element_by_id(id)) {
            Some(element) => listen(&element, pending, event),
            None => false,
        }
    }

    /// Attach a click listener to the first element with `class`
    pub fn bind_click_by_class(class: &str, pending: &PendingUiEvents, event: UiEvent) -> bool {
        match document().and_then(|d| d.get_elements_by_class_name(class).item(0)) {
            Some(element) => listen(&element, pending, event),
            None => false,
        }
    }

    pub fn create_xr_icon(class: &str) -> bool {
        let Some(document) = document() else {
            return false;
        };
        if document.get_elements_by_class_name(class).length() > 0 {
            return true;
        }
        let (Ok(icon), Some(body)) = (document.create_element("div"), document.body()) else {
            return false;
        };
        icon.set_class_name(class);
        icon.set_text_content(Some("XR"));
        let _ = icon.set_attribute("title", "XR state");
        body.append_child(&icon).is_ok()
    }

    pub fn remove_xr_icon(class: &str) {
        let Some(document) = document() else {
            return;
        };
        let icons = document.get_elements_by_class_name(class);
        while let Some(icon) = icons.item(0) {
            icon.remove();
        }
    }

    pub fn apply_status(id: &str, view: &StatusView) -> bool {
        let Some(element) = document()
            .and_then(|d| d.get_element_by_id(id))
            .and_then(|e| e.dyn_into::<HtmlElement>().ok())
        else {
            return false;
        };

        element.set_text_content(Some(&view.text));
        let style = element.style();
        let _ = style.set_property("color", view.color);
        let _ = style.set_property("display", view.display);
        true
    }

    pub fn apply_button(id: &str, view: &ButtonView) -> bool {
        let Some(element) = document()
            .and_then(|d| d.get_element_by_id(id))
            .and_then(|e| e.dyn_into::<HtmlElement>().ok())
        else {
            return false;
        };

        element.set_text_content(Some(view.label));
        let _ = element.style().set_property("display", view.display);
        if let Some(button) = element.dyn_ref::<HtmlButtonElement>() {
            button.set_disabled(view.disabled);
        }
        true
    }
}

// Non-WASM stubs
#[cfg(not(target_arch = "wasm32"))]
mod js_interop {
    use super::*;

    pub fn bind_click_by_id(_id: &str, _pending: &PendingUiEvents, _event: UiEvent) -> bool {
        false
    }

    pub fn bind_click_by_class(_class: &str, _pending: &PendingUiEvents, _event: UiEvent) -> bool {
        false
    }

    pub fn create_xr_icon(_class: &str) -> bool {
        false
    }

    pub fn remove_xr_icon(_class: &str) {}

    pub fn apply_status(_id: &str, _view: &StatusView) -> bool {
        false
    }

    pub fn apply_button(_id: &str, _view: &ButtonView) -> bool {
        false
    }
}

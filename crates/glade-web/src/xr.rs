//! Entering immersive VR through WebXR
//!
//! The enter-VR button drives a [`VrTrigger`]. A click starts one
//! `navigator.xr.requestSession` call; its result comes back through
//! [`PendingXrEvents`] and moves the trigger on.

use bevy::prelude::*;
use glade_core::{LoadOutcome, StatusMessage, ViewerError, VrError, VrTrigger, XrSessionOptions};
use glade_scene::loading::ModelLoadSet;
use glade_scene::{LoadFinished, StatusLine, Teleportation, ViewerSettings};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::dom::{hide_xr_icon, show_xr_icon, PendingUiEvents, UiEvent};

/// Session mode requested from the browser
pub const SESSION_MODE: &str = "immersive-vr";

/// State of the enter-VR control
#[derive(Resource, Debug, Default)]
pub struct VrControl {
    pub trigger: VrTrigger,
    /// Options of the last session request
    pub options: Option<XrSessionOptions>,
}

/// Result of an XR session request, or a change in a running session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XrEvent {
    Started,
    Failed(String),
    Ended,
}

/// XR events queued from promise callbacks
#[derive(Resource, Default, Clone)]
pub struct PendingXrEvents(pub Arc<Mutex<VecDeque<XrEvent>>>);

impl PendingXrEvents {
    pub fn push(&self, event: XrEvent) {
        if let Ok(mut queue) = self.0.lock() {
            queue.push_back(event);
        }
    }

    fn drain(&self) -> Vec<XrEvent> {
        match self.0.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }
}

pub struct XrPlugin;

impl Plugin for XrPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<VrControl>()
            .init_resource::<PendingXrEvents>()
            .add_systems(
                Update,
                (reveal_on_load, handle_ui_events, process_xr_events)
                    .chain()
                    .after(ModelLoadSet),
            );
    }
}

/// Session options for the current floor setup
pub fn session_options(teleportation: &Teleportation, settings: &ViewerSettings) -> XrSessionOptions {
    let floor = (!teleportation.floors.is_empty()).then_some(settings.floor.renamed_to.as_str());
    XrSessionOptions::with_floor(floor, !teleportation.enabled)
}

fn reveal_on_load(mut finished: MessageReader<LoadFinished>, mut control: ResMut<VrControl>) {
    for LoadFinished(outcome) in finished.read() {
        if matches!(outcome, LoadOutcome::Loaded(_)) {
            control.trigger.reveal();
            tracing::info!("VR button enabled");
        }
    }
}

fn handle_ui_events(
    ui_events: Res<PendingUiEvents>,
    mut control: ResMut<VrControl>,
    mut status: ResMut<StatusLine>,
    teleportation: Res<Teleportation>,
    settings: Res<ViewerSettings>,
    xr_events: Res<PendingXrEvents>,
) {
    for event in ui_events.drain() {
        match event {
            UiEvent::EnterVr => match control.trigger.begin() {
                Ok(()) => {
                    let options = session_options(&teleportation, &settings);
                    tracing::info!(
                        "Requesting {} session, features {:?}",
                        SESSION_MODE,
                        options.optional_features()
                    );
                    status.set(StatusMessage::vr_starting());
                    js_interop::request_session(&options, xr_events.clone());
                    control.options = Some(options);
                }
                Err(VrError::SceneNotReady) => {
                    let error = ViewerError::SceneNotReady;
                    tracing::warn!("{}", error);
                    status.set(StatusMessage::from(&error));
                }
                Err(e) => {
                    tracing::debug!("Ignoring VR button click: {}", e);
                }
            },
            UiEvent::XrIcon => log_xr_state(&control, &teleportation),
        }
    }
}

fn process_xr_events(
    xr_events: Res<PendingXrEvents>,
    mut control: ResMut<VrControl>,
    mut status: ResMut<StatusLine>,
    settings: Res<ViewerSettings>,
) {
    for event in xr_events.drain() {
        match event {
            XrEvent::Started => {
                control.trigger.succeed();
                status.hide();
                show_xr_icon(&settings.dom.xr_icon_class);
                tracing::info!("{}", session_started_note(control.options.as_ref()));
            }
            XrEvent::Failed(message) => {
                control.trigger.fail();
                let error = ViewerError::VrSessionFailure(message);
                tracing::error!("{}", error);
                status.set(StatusMessage::from(&error));
            }
            XrEvent::Ended => {
                control.trigger.end();
                hide_xr_icon(&settings.dom.xr_icon_class);
                tracing::info!("VR session ended");
            }
        }
    }
}

/// Log line for a started session. In-headset teleport is not driven
/// from here, so a requested floor is reported as such.
pub fn session_started_note(options: Option<&XrSessionOptions>) -> &'static str {
    if options.is_some_and(|o| o.teleportation_enabled()) {
        "VR session started; floor teleport requested, in-headset teleport not wired"
    } else {
        "VR session started"
    }
}

/// Diagnostics for the XR icon
fn log_xr_state(control: &VrControl, teleportation: &Teleportation) {
    let Some(options) = control.options.as_ref() else {
        tracing::info!("XR not initialized");
        return;
    };
    tracing::info!("XR state: {:?}", control.trigger.state());
    tracing::info!("Teleportation available: {}", options.teleportation_enabled());
    tracing::info!("Floor meshes: {:?}", options.teleportation_floor_meshes);
    tracing::info!("Teleportation enabled: {}", teleportation.enabled);
}

#[cfg(target_arch = "wasm32")]
mod js_interop {
    use super::*;
    use js_sys::{Array, Function, Object, Promise, Reflect};
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::{spawn_local, JsFuture};

    /// Human-readable message of a rejected promise
    fn error_message(error: &JsValue) -> String {
        Reflect::get(error, &"message".into())
            .ok()
            .and_then(|m| m.as_string())
            .unwrap_or_else(|| format!("{:?}", error))
    }

    fn session_promise(options: &XrSessionOptions) -> Result<Promise, String> {
        let navigator = web_sys::window().ok_or("no window")?.navigator();
        let xr = Reflect::get(&navigator, &"xr".into()).map_err(|e| error_message(&e))?;
        if xr.is_undefined() || xr.is_null() {
            return Err("WebXR is not available in this browser".to_string());
        }

        let request = Reflect::get(&xr, &"requestSession".into())
            .map_err(|e| error_message(&e))?
            .dyn_into::<Function>()
            .map_err(|_| "navigator.xr.requestSession is not a function".to_string())?;

        let features: Array = options
            .optional_features()
            .into_iter()
            .map(JsValue::from)
            .collect();
        let init = Object::new();
        Reflect::set(&init, &"optionalFeatures".into(), &features)
            .map_err(|e| error_message(&e))?;

        request
            .call2(&xr, &SESSION_MODE.into(), &init)
            .map_err(|e| error_message(&e))?
            .dyn_into::<Promise>()
            .map_err(|_| "requestSession did not return a promise".to_string())
    }

    fn listen_for_end(session: &JsValue, pending: PendingXrEvents) {
        let Some(target) = session.dyn_ref::<web_sys::EventTarget>() else {
            return;
        };
        let closure = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            pending.push(XrEvent::Ended);
        }) as Box<dyn FnMut(web_sys::Event)>);

        if let Err(e) = target.add_event_listener_with_callback("end", closure.as_ref().unchecked_ref()) {
            tracing::warn!("Failed to watch XR session end: {:?}", e);
        }
        closure.forget();
    }

    pub fn request_session(options: &XrSessionOptions, pending: PendingXrEvents) {
        let promise = match session_promise(options) {
            Ok(promise) => promise,
            Err(message) => {
                pending.push(XrEvent::Failed(message));
                return;
            }
        };

        spawn_local(async move {
            match JsFuture::from(promise).await {
                Ok(session) => {
                    listen_for_end(&session, pending.clone());
                    pending.push(XrEvent::Started);
                }
                Err(e) => pending.push(XrEvent::Failed(error_message(&e))),
            }
        });
    }
}

// Non-WASM stubs
#[cfg(not(target_arch = "wasm32"))]
mod js_interop {
    use super::*;

    pub fn request_session(_options: &XrSessionOptions, pending: PendingXrEvents) {
        pending.push(XrEvent::Failed(
            "WebXR is not available on this platform".to_string(),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glade_core::{SceneSummary, ViewerConfig};

    fn app() -> App {
        let mut app = App::new();
        app.add_message::<LoadFinished>()
            .insert_resource(ViewerSettings(ViewerConfig::default()))
            .init_resource::<StatusLine>()
            .init_resource::<Teleportation>()
            .init_resource::<PendingUiEvents>()
            .add_plugins(XrPlugin);
        app
    }

    #[test]
    fn test_session_options_from_teleportation() {
        let settings = ViewerSettings(ViewerConfig::default());
        let mut teleportation = Teleportation::default();

        let none = session_options(&teleportation, &settings);
        assert!(none.floor_meshes.is_empty());
        assert!(!none.teleportation_enabled());

        let floor = World::new().spawn_empty().id();
        teleportation.enabled = true;
        teleportation.add_floor_mesh(floor);
        let with_floor = session_options(&teleportation, &settings);
        assert_eq!(with_floor.floor_meshes, vec!["grass".to_string()]);
        assert_eq!(with_floor.teleportation_floor_meshes, vec!["grass".to_string()]);
        assert!(with_floor.teleportation_enabled());
    }

    #[test]
    fn test_session_started_note() {
        assert_eq!(session_started_note(None), "VR session started");

        let no_floor = XrSessionOptions::with_floor(None, false);
        assert_eq!(session_started_note(Some(&no_floor)), "VR session started");

        let floor = XrSessionOptions::with_floor(Some("grass"), false);
        let note = session_started_note(Some(&floor));
        assert!(note.contains("in-headset teleport not wired"));
        assert!(!note.contains("configured"));
    }

    #[test]
    fn test_click_before_load_reports_not_ready() {
        let mut app = app();
        app.world().resource::<PendingUiEvents>().push(UiEvent::EnterVr);
        app.update();

        let status = app.world().resource::<StatusLine>();
        assert_eq!(status.message.text, "Wait for the model to load");
        assert!(status.message.is_error());
    }

    #[test]
    fn test_failed_session_reenables_button() {
        let mut app = app();
        app.world_mut()
            .write_message(LoadFinished(LoadOutcome::Loaded(SceneSummary { mesh_count: 2 })));
        app.update();
        assert!(app.world().resource::<VrControl>().trigger.is_enabled());

        // The native stub fails every request
        app.world().resource::<PendingUiEvents>().push(UiEvent::EnterVr);
        app.world().resource::<PendingUiEvents>().push(UiEvent::EnterVr);
        app.update();

        let control = app.world().resource::<VrControl>();
        assert!(control.trigger.is_enabled());
        let status = app.world().resource::<StatusLine>();
        assert_eq!(
            status.message.text,
            "VR error: WebXR is not available on this platform"
        );
    }

    #[test]
    fn test_session_start_and_end() {
        let mut app = app();
        app.world_mut()
            .write_message(LoadFinished(LoadOutcome::Loaded(SceneSummary { mesh_count: 2 })));
        app.update();

        let mut control = app.world_mut().resource_mut::<VrControl>();
        control.trigger.begin().unwrap();
        app.world().resource::<PendingXrEvents>().push(XrEvent::Started);
        app.update();

        let control = app.world().resource::<VrControl>();
        assert_eq!(control.trigger.label(), "VR active");
        assert!(!app.world().resource::<StatusLine>().visible);

        app.world().resource::<PendingXrEvents>().push(XrEvent::Ended);
        app.update();
        assert!(app.world().resource::<VrControl>().trigger.is_enabled());
    }
}

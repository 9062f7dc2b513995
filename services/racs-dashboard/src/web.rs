//! Browser host: `WebDom` over `web-sys` and the in-page dashboard driver

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use gloo_net::http::Request;
use gloo_timers::callback::{Interval, Timeout};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    AbortController, Document, Element, Event, FormData, HtmlFormElement, HtmlInputElement,
    HtmlSelectElement, Node,
};

use crate::app::{Dashboard, LogSession, Platform};
use crate::cell::TextCell;
use crate::components::{Action, ActionQueue};
use crate::config::Config;
use crate::dom::{Dom, DomEvent, Listener};
use crate::log_tail::{fetch_timeout, lock, FetchRequest, LogChunk, TailHandle};
use crate::model::{BuildRequest, Project, ProjectForm, TASK_STATE_HEADER};
use crate::routes::Route;
use crate::DashboardError;

/// How often queued actions are handled and bound text is refreshed
const FRAME_INTERVAL: Duration = Duration::from_millis(100);

fn js_err(e: JsValue) -> DashboardError {
    DashboardError::Dom(format!("{:?}", e))
}

fn http_err(e: gloo_net::Error) -> DashboardError {
    DashboardError::Http(e.to_string())
}

fn millis(interval: Duration) -> u32 {
    u32::try_from(interval.as_millis()).unwrap_or(u32::MAX)
}

struct Registration {
    node: Node,
    event: String,
    listener: Listener,
    closure: Closure<dyn FnMut(Event)>,
}

#[derive(Default)]
struct Registry {
    listeners: Vec<Registration>,
    /// Removed closures; dropped on the next prune since one may be running
    retired: Vec<Closure<dyn FnMut(Event)>>,
    cells: Vec<(Node, TextCell)>,
    classes: Vec<(Node, TextCell)>,
}

/// [`Dom`] over the live browser document
#[derive(Clone)]
pub struct WebDom {
    document: Document,
    registry: Rc<RefCell<Registry>>,
}

impl WebDom {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            registry: Rc::default(),
        }
    }

    /// Forget listeners and cells of nodes no longer in the document
    pub fn prune(&self) {
        let mut registry = self.registry.borrow_mut();
        registry.retired.clear();
        registry.listeners.retain(|r| r.node.is_connected());
        registry.cells.retain(|(node, _)| node.is_connected());
        registry.classes.retain(|(node, _)| node.is_connected());
    }

    fn element<'a>(&self, node: &'a Node) -> crate::Result<&'a Element> {
        node.dyn_ref::<Element>()
            .ok_or_else(|| DashboardError::Dom("node is not an element".to_string()))
    }
}

fn to_dom_event(event: &Event) -> DomEvent {
    let mut out = DomEvent::new(event.type_());
    let Some(target) = event.target() else {
        return out;
    };
    if let Some(input) = target.dyn_ref::<HtmlInputElement>() {
        out.value = Some(input.value());
    } else if let Some(select) = target.dyn_ref::<HtmlSelectElement>() {
        out.value = Some(select.value());
    }
    if out.kind == "submit" {
        event.prevent_default();
        if let Some(form) = target.dyn_ref::<Element>() {
            out.form = form_fields(form);
        }
    }
    out
}

fn form_fields(form: &Element) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    let Ok(controls) = form.query_selector_all("input[name], select[name]") else {
        return fields;
    };
    for i in 0..controls.length() {
        let Some(control) = controls.get(i) else {
            continue;
        };
        let Some(element) = control.dyn_ref::<Element>() else {
            continue;
        };
        let Some(name) = element.get_attribute("name") else {
            continue;
        };
        let value = if let Some(input) = control.dyn_ref::<HtmlInputElement>() {
            input.value()
        } else if let Some(select) = control.dyn_ref::<HtmlSelectElement>() {
            select.value()
        } else {
            String::new()
        };
        fields.push((name, value));
    }
    fields
}

impl Dom for WebDom {
    type Node = Node;

    fn create_element(&self, tag: &str) -> crate::Result<Node> {
        self.document
            .create_element(tag)
            .map(Node::from)
            .map_err(js_err)
    }

    fn create_text_node(&self, text: &str) -> Node {
        self.document.create_text_node(text).into()
    }

    fn tag_name(&self, node: &Node) -> Option<String> {
        node.dyn_ref::<Element>().map(|e| e.tag_name().to_lowercase())
    }

    fn set_attribute(&self, node: &Node, name: &str, value: &str) -> crate::Result<()> {
        self.element(node)?
            .set_attribute(name, value)
            .map_err(js_err)?;
        // The attribute only seeds a control; the live value is a property.
        if name == "value" {
            if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
                if input.type_() != "file" {
                    input.set_value(value);
                }
            } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
                select.set_value(value);
            }
        }
        Ok(())
    }

    fn attribute(&self, node: &Node, name: &str) -> Option<String> {
        node.dyn_ref::<Element>()?.get_attribute(name)
    }

    fn add_class(&self, node: &Node, class: &str) -> crate::Result<()> {
        self.element(node)?.class_list().add_1(class).map_err(js_err)
    }

    fn remove_class(&self, node: &Node, class: &str) -> crate::Result<()> {
        self.element(node)?
            .class_list()
            .remove_1(class)
            .map_err(js_err)
    }

    fn toggle_class(&self, node: &Node, class: &str) -> crate::Result<bool> {
        self.element(node)?
            .class_list()
            .toggle(class)
            .map_err(js_err)
    }

    fn classes(&self, node: &Node) -> Vec<String> {
        let Some(element) = node.dyn_ref::<Element>() else {
            return Vec::new();
        };
        let list = element.class_list();
        (0..list.length()).filter_map(|i| list.item(i)).collect()
    }

    fn parent(&self, node: &Node) -> Option<Node> {
        node.parent_node()
    }

    fn first_child(&self, node: &Node) -> Option<Node> {
        node.first_child()
    }

    fn next_sibling(&self, node: &Node) -> Option<Node> {
        node.next_sibling()
    }

    fn child_nodes(&self, node: &Node) -> Vec<Node> {
        let list = node.child_nodes();
        (0..list.length()).filter_map(|i| list.get(i)).collect()
    }

    fn append_child(&self, parent: &Node, child: &Node) -> crate::Result<()> {
        parent.append_child(child).map(|_| ()).map_err(js_err)
    }

    fn insert_before(
        &self,
        parent: &Node,
        child: &Node,
        reference: Option<&Node>,
    ) -> crate::Result<()> {
        parent
            .insert_before(child, reference)
            .map(|_| ())
            .map_err(js_err)
    }

    fn remove_child(&self, parent: &Node, child: &Node) -> crate::Result<()> {
        parent.remove_child(child).map(|_| ()).map_err(js_err)
    }

    fn replace_child(
        &self,
        parent: &Node,
        new_child: &Node,
        old_child: &Node,
    ) -> crate::Result<()> {
        parent
            .replace_child(new_child, old_child)
            .map(|_| ())
            .map_err(js_err)
    }

    fn text_content(&self, node: &Node) -> String {
        node.text_content().unwrap_or_default()
    }

    fn set_text(&self, node: &Node, text: &str) -> crate::Result<()> {
        node.set_text_content(Some(text));
        Ok(())
    }

    fn add_event_listener(
        &self,
        node: &Node,
        event: &str,
        listener: &Listener,
    ) -> crate::Result<()> {
        let mut registry = self.registry.borrow_mut();
        let known = registry.listeners.iter().any(|r| {
            r.node == *node && r.event == event && Rc::ptr_eq(&r.listener, listener)
        });
        if known {
            return Ok(());
        }

        let handler = Rc::clone(listener);
        let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            handler(&to_dom_event(&event));
        });
        node.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            .map_err(js_err)?;
        registry.listeners.push(Registration {
            node: node.clone(),
            event: event.to_string(),
            listener: Rc::clone(listener),
            closure,
        });
        Ok(())
    }

    fn remove_event_listener(
        &self,
        node: &Node,
        event: &str,
        listener: &Listener,
    ) -> crate::Result<()> {
        let mut registry = self.registry.borrow_mut();
        let Some(index) = registry.listeners.iter().position(|r| {
            r.node == *node && r.event == event && Rc::ptr_eq(&r.listener, listener)
        }) else {
            return Ok(());
        };
        let registration = registry.listeners.remove(index);
        node.remove_event_listener_with_callback(
            event,
            registration.closure.as_ref().unchecked_ref(),
        )
        .map_err(js_err)?;
        registry.retired.push(registration.closure);
        Ok(())
    }

    fn bind_text(&self, node: &Node, cell: TextCell) {
        let mut registry = self.registry.borrow_mut();
        registry.cells.retain(|(n, _)| n != node);
        registry.cells.push((node.clone(), cell));
    }

    fn text_cell(&self, node: &Node) -> Option<TextCell> {
        self.registry
            .borrow()
            .cells
            .iter()
            .find(|(n, _)| n == node)
            .map(|(_, cell)| cell.clone())
    }

    fn bind_class(&self, node: &Node, cell: TextCell) {
        let mut registry = self.registry.borrow_mut();
        registry.classes.retain(|(n, _)| n != node);
        registry.classes.push((node.clone(), cell));
    }

    fn class_cell(&self, node: &Node) -> Option<TextCell> {
        self.registry
            .borrow()
            .classes
            .iter()
            .find(|(n, _)| n == node)
            .map(|(_, cell)| cell.clone())
    }
}

/// Fetch one log chunk, aborting the request once `timeout` passes
async fn fetch_log(
    base_url: &str,
    subject: &str,
    offset: u64,
    timeout: Duration,
) -> crate::Result<LogChunk> {
    let url = format!("{}/task/logs", base_url);
    let controller = AbortController::new().map_err(js_err)?;
    let signal = controller.signal();
    let _deadline = Timeout::new(millis(timeout), move || controller.abort());
    let failed = |e: gloo_net::Error| {
        if signal.aborted() {
            DashboardError::Http(format!(
                "log fetch for '{}' at offset {} timed out after {:?}",
                subject, offset, timeout
            ))
        } else {
            http_err(e)
        }
    };

    let from = offset.to_string();
    let response = Request::get(&url)
        .query([("id", subject), ("offset", from.as_str())])
        .abort_signal(Some(&signal))
        .send()
        .await
        .map_err(failed)?;
    if !response.ok() {
        return Err(DashboardError::Status {
            url,
            status: response.status(),
        });
    }
    let task_state = response.headers().get(TASK_STATE_HEADER);
    let bytes = response.binary().await.map_err(failed)?;
    Ok(LogChunk { bytes, task_state })
}

fn spawn_fetch(base_url: String, tail: TailHandle, request: FetchRequest, timeout: Duration) {
    spawn_local(async move {
        let result = fetch_log(&base_url, &request.subject, request.offset, timeout).await;
        lock(&tail).complete(request.seq, result);
    });
}

/// Timer-driven tail of one subject
pub struct WebSession {
    tail: TailHandle,
    timer: Option<Interval>,
}

impl LogSession for WebSession {
    fn stop(&mut self) {
        // dropping the interval clears it
        if self.timer.take().is_some() {
            lock(&self.tail).unbind();
        }
    }

    fn is_running(&self) -> bool {
        self.timer.is_some()
    }
}

impl Drop for WebSession {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Browser side of the dashboard: gloo timers and fetches against the page's
/// origin, with the location hash following the route
#[derive(Debug, Clone)]
pub struct WebPlatform {
    base_url: String,
}

impl Platform for WebPlatform {
    type Session = WebSession;

    fn start_session(&self, tail: TailHandle, subject: &str, interval: Duration) -> WebSession {
        let timeout = fetch_timeout(interval);
        let first = lock(&tail).bind(subject);
        spawn_fetch(self.base_url.clone(), TailHandle::clone(&tail), first, timeout);

        let timer_tail = TailHandle::clone(&tail);
        let base_url = self.base_url.clone();
        let timer = Interval::new(millis(interval), move || {
            let request = lock(&timer_tail).tick();
            if let Some(request) = request {
                let tail = TailHandle::clone(&timer_tail);
                spawn_fetch(base_url.clone(), tail, request, timeout);
            }
        });
        WebSession {
            tail,
            timer: Some(timer),
        }
    }

    fn route_changed(&self, route: &Route) {
        if let Some(window) = web_sys::window() {
            if let Err(e) = window.location().set_hash(&format!("!{}", route)) {
                tracing::warn!("Failed to update location: {:?}", e);
            }
        }
    }
}

type AppHandle = Rc<RefCell<Dashboard<WebDom, WebPlatform>>>;

async fn post_build(base_url: String, request: BuildRequest) -> crate::Result<()> {
    let url = format!("{}/project/build", base_url);
    let response = Request::post(&url)
        .json(&request)
        .map_err(http_err)?
        .send()
        .await
        .map_err(http_err)?;
    if !response.ok() {
        return Err(DashboardError::Status {
            url,
            status: response.status(),
        });
    }
    Ok(())
}

async fn post_form(url: String, body: FormData) -> crate::Result<()> {
    let response = Request::post(&url)
        .body(body)
        .map_err(http_err)?
        .send()
        .await
        .map_err(http_err)?;
    if !response.ok() {
        return Err(DashboardError::Status {
            url,
            status: response.status(),
        });
    }
    Ok(())
}

fn project_form_data(form: &ProjectForm) -> crate::Result<FormData> {
    let data = FormData::new().map_err(js_err)?;
    for (name, value) in [
        ("name", &form.name),
        ("url", &form.url),
        ("branch", &form.branch),
        ("labels", &form.labels),
    ] {
        data.append_with_str(name, value).map_err(js_err)?;
    }
    Ok(data)
}

/// The upload form currently on the page, file input included
fn upload_form_data(document: &Document) -> crate::Result<FormData> {
    let form = document
        .query_selector("form")
        .map_err(js_err)?
        .and_then(|e| e.dyn_into::<HtmlFormElement>().ok())
        .ok_or_else(|| DashboardError::Dom("no upload form on page".to_string()))?;
    FormData::new_with_form(&form).map_err(js_err)
}

/// Send a request action. Creating and uploading queue a return to the
/// project list once the server accepts them.
fn send(
    base_url: String,
    actions: ActionQueue,
    document: &Document,
    action: Action,
) -> crate::Result<()> {
    match action {
        // applied in place by `Dashboard::handle`
        Action::Navigate(_) => {}
        Action::Build { id, stage } => {
            spawn_local(async move {
                if let Err(e) = post_build(base_url, BuildRequest { id, stage }).await {
                    tracing::warn!("Build of project {} failed to start: {}", id, e);
                }
            });
        }
        Action::CreateProject(form) => {
            let body = project_form_data(&form)?;
            spawn_local(async move {
                match post_form(format!("{}/project/create", base_url), body).await {
                    Ok(()) => actions
                        .borrow_mut()
                        .push_back(Action::Navigate(Route::Projects)),
                    Err(e) => tracing::warn!("Failed to create project '{}': {}", form.name, e),
                }
            });
        }
        Action::Upload { id, name, .. } => {
            let body = upload_form_data(document)?;
            spawn_local(async move {
                match post_form(format!("{}/project/upload", base_url), body).await {
                    Ok(()) => actions
                        .borrow_mut()
                        .push_back(Action::Navigate(Route::Projects)),
                    Err(e) => tracing::warn!("Failed to upload '{}' to {}: {}", name, id, e),
                }
            });
        }
    }
    Ok(())
}

fn frame(app: &AppHandle, document: &Document) {
    let pending = app.borrow().take_actions();
    for action in pending {
        let Some(request) = app.borrow_mut().handle(action) else {
            continue;
        };
        let (base_url, actions) = {
            let app = app.borrow();
            (app.platform().base_url.clone(), Rc::clone(app.actions()))
        };
        if let Err(e) = send(base_url, actions, document, request) {
            tracing::warn!("Action failed: {}", e);
        }
    }

    let app = app.borrow();
    app.dom().prune();
    if let Err(e) = app.refresh_text() {
        tracing::warn!("Text refresh failed: {}", e);
    }
}

fn refresh_projects(app: &AppHandle) {
    let app = Rc::clone(app);
    spawn_local(async move {
        let url = format!("{}/project/list", app.borrow().platform().base_url);
        let result = async {
            let response = Request::get(&url).send().await.map_err(http_err)?;
            if !response.ok() {
                return Err(DashboardError::Status {
                    url: url.clone(),
                    status: response.status(),
                });
            }
            response.json::<Vec<Project>>().await.map_err(http_err)
        }
        .await;

        let outcome = result.and_then(|projects| app.borrow_mut().set_projects(projects));
        if let Err(e) = outcome {
            tracing::warn!("Failed to load projects: {}", e);
        }
    });
}

/// Route named by the location hash; an unknown hash shows the default route
fn location_route(window: &web_sys::Window) -> Route {
    let hash = window.location().hash().unwrap_or_default();
    hash.parse().unwrap_or_else(|e| {
        tracing::warn!("Ignoring location {:?}: {}", hash, e);
        Route::default()
    })
}

fn mount() -> crate::Result<()> {
    let window = web_sys::window().ok_or_else(|| DashboardError::Dom("no window".to_string()))?;
    let document = window
        .document()
        .ok_or_else(|| DashboardError::Dom("no document".to_string()))?;
    let body: Node = document
        .body()
        .ok_or_else(|| DashboardError::Dom("no body".to_string()))?
        .into();
    let base_url = window.location().origin().map_err(js_err)?;
    let config = Config::default();

    let app: AppHandle = Rc::new(RefCell::new(Dashboard::new(
        WebDom::new(document.clone()),
        body,
        WebPlatform { base_url },
        &config,
    )));
    app.borrow_mut().navigate(location_route(&window))?;
    refresh_projects(&app);

    // Back, forward and edited URLs; a link click's own hash change is
    // dropped as a repeat of the route already shown.
    let queue = Rc::clone(app.borrow().actions());
    let hash_window = window.clone();
    let on_hash_change = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
        let route = location_route(&hash_window);
        queue.borrow_mut().push_back(Action::Navigate(route));
    });
    window
        .add_event_listener_with_callback("hashchange", on_hash_change.as_ref().unchecked_ref())
        .map_err(js_err)?;
    on_hash_change.forget();

    let projects_app = Rc::clone(&app);
    Interval::new(millis(config.polling.project_interval()), move || {
        refresh_projects(&projects_app)
    })
    .forget();

    let frame_app = Rc::clone(&app);
    Interval::new(millis(FRAME_INTERVAL), move || frame(&frame_app, &document)).forget();

    tracing::info!("Dashboard mounted");
    Ok(())
}

/// Entry point called by the page's loader script
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
    if let Err(e) = mount() {
        tracing::error!("Failed to start dashboard: {}", e);
    }
}

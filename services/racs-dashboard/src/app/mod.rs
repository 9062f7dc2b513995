//! Dashboard: routing, rendering and action handling over a host document
//!
//! [`Dashboard`] owns everything a mounted page has: the route, the project
//! list, the log tail and the session feeding it. It is generic over the
//! host [`Dom`] and over a [`Platform`] that starts log sessions, so the
//! browser and the tokio client share one route lifecycle.

#[cfg(not(target_arch = "wasm32"))]
mod native;

#[cfg(not(target_arch = "wasm32"))]
pub use native::{read_upload, TokioPlatform};

use std::time::Duration;

use crate::cell;
use crate::components::{self, new_action_queue, Action, ActionQueue};
use crate::config::Config;
use crate::dom::{Dom, DomExt};
use crate::log_tail::{new_tail_handle, TailHandle};
use crate::model::Project;
use crate::routes::Route;

/// A running log poller. Stopping must unbind its tail.
pub trait LogSession {
    fn stop(&mut self);
    fn is_running(&self) -> bool;
}

/// What the surrounding runtime supplies to a [`Dashboard`]
pub trait Platform {
    type Session: LogSession;

    /// Bind `tail` to `subject` and poll it every `interval`
    fn start_session(&self, tail: TailHandle, subject: &str, interval: Duration)
        -> Self::Session;

    /// Called after every navigation with the route now shown
    fn route_changed(&self, _route: &Route) {}
}

/// The dashboard mounted on one root node
pub struct Dashboard<D: Dom, P: Platform> {
    dom: D,
    root: D::Node,
    platform: P,
    log_interval: Duration,
    route: Route,
    projects: Vec<Project>,
    tail: TailHandle,
    session: Option<P::Session>,
    actions: ActionQueue,
}

impl<D: Dom, P: Platform> std::fmt::Debug for Dashboard<D, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("route", &self.route)
            .field("projects", &self.projects.len())
            .field("tailing", &self.is_tailing())
            .finish()
    }
}

impl<D: Dom, P: Platform> Dashboard<D, P> {
    pub fn new(dom: D, root: D::Node, platform: P, config: &Config) -> Self {
        Self {
            dom,
            root,
            platform,
            log_interval: config.polling.log_interval(),
            route: Route::default(),
            projects: Vec::new(),
            tail: new_tail_handle(),
            session: None,
            actions: new_action_queue(),
        }
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn tail(&self) -> &TailHandle {
        &self.tail
    }

    pub fn actions(&self) -> &ActionQueue {
        &self.actions
    }

    /// Whether a log session is currently polling
    pub fn is_tailing(&self) -> bool {
        self.session.as_ref().is_some_and(LogSession::is_running)
    }

    /// Switch to `route`: stop the current view's session, start one for a
    /// task route, then render.
    pub fn navigate(&mut self, route: Route) -> crate::Result<()> {
        tracing::info!("Navigating from {} to {}", self.route, route);
        self.stop_session();

        if let Some(subject) = route.log_subject() {
            self.session = Some(self.platform.start_session(
                TailHandle::clone(&self.tail),
                subject,
                self.log_interval,
            ));
        }

        self.route = route;
        self.platform.route_changed(&self.route);
        self.render()
    }

    /// Discard the root's children and rebuild the current route's page
    pub fn render(&self) -> crate::Result<()> {
        self.dom.remove_children(&self.root)?;
        let page = components::page(
            &self.dom,
            &self.route,
            &self.projects,
            &self.tail,
            &self.actions,
        )?;
        self.dom.append_child(&self.root, &page)
    }

    /// Re-derive all bound text and classes under the root. Returns the
    /// number of nodes that changed.
    pub fn refresh_text(&self) -> crate::Result<usize> {
        cell::refresh(&self.dom, &self.root)
    }

    /// Replace the project list; re-renders when the project table is shown
    pub fn set_projects(&mut self, projects: Vec<Project>) -> crate::Result<()> {
        self.projects = projects;
        if self.route == Route::Projects {
            self.render()?;
        }
        Ok(())
    }

    /// Drain the action queue, oldest first
    pub fn take_actions(&self) -> Vec<Action> {
        self.actions.borrow_mut().drain(..).collect()
    }

    /// Apply a navigation in place and return anything else for the platform
    /// to send. A navigation to the route already shown is dropped, so a
    /// link click and the location change it causes bind the view once.
    pub fn handle(&mut self, action: Action) -> Option<Action> {
        match action {
            Action::Navigate(route) if route == self.route => {
                tracing::debug!("Already showing {}", route);
                None
            }
            Action::Navigate(route) => {
                if let Err(e) = self.navigate(route) {
                    tracing::warn!("Navigation failed: {}", e);
                }
                None
            }
            other => Some(other),
        }
    }

    fn stop_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.stop();
        }
    }
}

impl<D: Dom, P: Platform> Drop for Dashboard<D, P> {
    fn drop(&mut self) {
        self.stop_session();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{DomEvent, MemoryDom, NodeId};
    use crate::log_tail::{lock, FetchRequest, LogChunk};
    use crate::model::{Stage, Task};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct Record {
        started: Vec<String>,
        requests: Vec<FetchRequest>,
        stopped: usize,
        shown: Vec<String>,
    }

    /// Platform whose sessions only bind the tail and record what happened
    #[derive(Default)]
    struct RecordingPlatform {
        record: Rc<RefCell<Record>>,
    }

    struct RecordingSession {
        tail: TailHandle,
        running: bool,
        record: Rc<RefCell<Record>>,
    }

    impl LogSession for RecordingSession {
        fn stop(&mut self) {
            if self.running {
                self.running = false;
                lock(&self.tail).unbind();
                self.record.borrow_mut().stopped += 1;
            }
        }

        fn is_running(&self) -> bool {
            self.running
        }
    }

    impl Platform for RecordingPlatform {
        type Session = RecordingSession;

        fn start_session(
            &self,
            tail: TailHandle,
            subject: &str,
            _interval: Duration,
        ) -> RecordingSession {
            let request = lock(&tail).bind(subject);
            let mut record = self.record.borrow_mut();
            record.started.push(subject.to_string());
            record.requests.push(request);
            drop(record);
            RecordingSession {
                tail,
                running: true,
                record: Rc::clone(&self.record),
            }
        }

        fn route_changed(&self, route: &Route) {
            self.record.borrow_mut().shown.push(route.to_string());
        }
    }

    fn dashboard() -> (
        MemoryDom,
        NodeId,
        Rc<RefCell<Record>>,
        Dashboard<MemoryDom, RecordingPlatform>,
    ) {
        let dom = MemoryDom::new();
        let root = dom.create_element("body").unwrap();
        let platform = RecordingPlatform::default();
        let record = Rc::clone(&platform.record);
        let dashboard = Dashboard::new(dom.clone(), root, platform, &Config::default());
        (dom, root, record, dashboard)
    }

    fn task_route(id: &str) -> Route {
        Route::Task { id: id.to_string() }
    }

    #[test]
    fn task_route_binds_one_session_and_leaving_stops_it() {
        let (_dom, _root, record, mut dashboard) = dashboard();

        dashboard.navigate(task_route("11")).unwrap();
        assert!(dashboard.is_tailing());
        assert_eq!(record.borrow().started, vec!["11"]);

        dashboard.navigate(Route::ProjectCreate).unwrap();
        assert!(!dashboard.is_tailing());
        assert_eq!(record.borrow().stopped, 1);
        assert_eq!(record.borrow().shown, vec!["/task/11", "/project/create"]);
    }

    #[test]
    fn switching_tasks_rebinds_the_tail() {
        let (_dom, _root, record, mut dashboard) = dashboard();

        dashboard.navigate(task_route("1")).unwrap();
        dashboard.navigate(task_route("2")).unwrap();

        assert_eq!(record.borrow().started, vec!["1", "2"]);
        assert_eq!(record.borrow().stopped, 1);
        assert_eq!(lock(dashboard.tail()).subject(), Some("2"));
    }

    #[test]
    fn repeated_navigation_to_shown_route_is_dropped() {
        let (_dom, _root, record, mut dashboard) = dashboard();

        // A link click queues the route, then the location change does too.
        assert_eq!(dashboard.handle(Action::Navigate(task_route("5"))), None);
        assert_eq!(dashboard.handle(Action::Navigate(task_route("5"))), None);

        assert_eq!(record.borrow().started, vec!["5"]);
        assert_eq!(record.borrow().stopped, 0);
        assert!(dashboard.is_tailing());
    }

    #[test]
    fn handle_returns_requests_for_the_platform() {
        let (_dom, _root, _record, mut dashboard) = dashboard();
        let build = Action::Build {
            id: 3,
            stage: Stage::Push,
        };

        assert_eq!(dashboard.handle(build.clone()), Some(build));
        assert_eq!(dashboard.route(), &Route::Projects);
    }

    #[test]
    fn clicked_link_is_queued_then_applied() {
        let (dom, root, _record, mut dashboard) = dashboard();
        dashboard.render().unwrap();

        // sidebar "Create" link
        let columns = dom.first_child(&root).unwrap();
        let aside = dom.first_child(&dom.first_child(&columns).unwrap()).unwrap();
        let list = dom.child_nodes(&aside)[1];
        let create = dom.first_child(&dom.child_nodes(&list)[1]).unwrap();
        dom.dispatch(&create, &DomEvent::new("click"));

        let pending = dashboard.take_actions();
        assert_eq!(pending, vec![Action::Navigate(Route::ProjectCreate)]);
        for action in pending {
            assert_eq!(dashboard.handle(action), None);
        }
        assert_eq!(dashboard.route(), &Route::ProjectCreate);
        assert!(dashboard.take_actions().is_empty());
    }

    #[test]
    fn set_projects_renders_only_the_project_view() {
        let (dom, root, _record, mut dashboard) = dashboard();
        let alpha = Project {
            id: 1,
            name: "alpha".to_string(),
            labels: String::new(),
            url: String::new(),
            branch: "main".to_string(),
            state: "BUILD_SUCCESS".to_string(),
            version: 0,
            protected: false,
            tag_repo: false,
            tasks: vec![Task {
                id: 11,
                kind: "BUILDING".to_string(),
                state: "RUNNING".to_string(),
                time: String::new(),
            }],
        };

        dashboard.navigate(Route::ProjectCreate).unwrap();
        dashboard.set_projects(vec![alpha.clone()]).unwrap();
        assert!(!dom.text_content(&root).contains("alpha"));

        dashboard.navigate(Route::Projects).unwrap();
        assert!(dom.text_content(&root).contains("alpha"));
        assert_eq!(dom.child_nodes(&root).len(), 1);
    }

    #[test]
    fn refresh_text_follows_the_tail() {
        let (dom, root, record, mut dashboard) = dashboard();
        dashboard.navigate(task_route("9")).unwrap();

        let seq = record.borrow().requests[0].seq;
        lock(dashboard.tail()).complete(
            seq,
            Ok::<_, String>(LogChunk::new("compiling\n").with_task_state("SUCCESS")),
        );

        // log text, state text, state color
        assert_eq!(dashboard.refresh_text().unwrap(), 3);
        let page = dom.text_content(&root);
        assert!(page.contains("compiling\n"));
        assert!(page.contains("SUCCESS"));
    }

    #[test]
    fn drop_stops_the_session() {
        let (_dom, _root, record, mut dashboard) = dashboard();
        dashboard.navigate(task_route("4")).unwrap();
        drop(dashboard);
        assert_eq!(record.borrow().stopped, 1);
    }
}

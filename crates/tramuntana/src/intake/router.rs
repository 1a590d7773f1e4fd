// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch for parsed chat updates (spec §4.6). Slash-commands, plain
//! text, callbacks, and topic-close events all funnel through one
//! `Router::dispatch` call per update; everything downstream of "what did
//! the update mean" (inline keyboards, long-poll mechanics) stays an
//! external collaborator's concern (spec §1).

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::warn;

use crate::delivery::task::DeliveryTask;
use crate::delivery::DeliveryQueue;
use crate::ids::{ChatID, ProjectID, TopicID, UserID, WindowID};
use crate::mux_client::Multiplexer;
use crate::poller::StatusPoller;
use crate::registry::model::WindowState;
use crate::registry::Registry;

use super::bash_mode::{send_bang_sequence, run_capture_worker, BashModeTracker};
use super::catalog::{ProjectCatalog, ProjectSummary};
use super::event::IntakeEvent;
use super::picker::{self, PickerState};

pub struct Router<M: Multiplexer> {
    mux: Arc<M>,
    registry: Arc<Registry>,
    delivery: Arc<DeliveryQueue>,
    poller: Arc<Mutex<StatusPoller<M>>>,
    catalog: Arc<dyn ProjectCatalog>,
    picker: Arc<PickerState>,
    bash_mode: Arc<BashModeTracker>,
    session_name: String,
    agent_command: String,
    allowed_users: HashSet<UserID>,
}

impl<M: Multiplexer + 'static> Router<M> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        mux: Arc<M>,
        registry: Arc<Registry>,
        delivery: Arc<DeliveryQueue>,
        poller: Arc<Mutex<StatusPoller<M>>>,
        catalog: Arc<dyn ProjectCatalog>,
        picker: Arc<PickerState>,
        bash_mode: Arc<BashModeTracker>,
        session_name: String,
        agent_command: String,
        allowed_users: HashSet<UserID>,
    ) -> Self {
        Self {
            mux,
            registry,
            delivery,
            poller,
            catalog,
            picker,
            bash_mode,
            session_name,
            agent_command,
            allowed_users,
        }
    }

    pub async fn dispatch(&self, event: IntakeEvent) {
        if !self.is_authorized(&event) {
            warn!("rejected update from unauthorized user");
            return;
        }
        match event {
            IntakeEvent::Command { user, chat_id, topic, name, args } => {
                self.handle_command(user, chat_id, topic, name, args).await;
            }
            IntakeEvent::Text { user, chat_id, topic, text } => {
                self.handle_text(user, chat_id, topic, text).await;
            }
            IntakeEvent::Callback { user, chat_id, topic, data } => {
                self.handle_callback(user, chat_id, topic, data).await;
            }
            IntakeEvent::TopicClosed { chat_id, topic } => {
                self.handle_topic_closed(chat_id, topic).await;
            }
        }
    }

    fn is_authorized(&self, event: &IntakeEvent) -> bool {
        if self.allowed_users.is_empty() {
            return true;
        }
        let user = match event {
            IntakeEvent::Command { user, .. }
            | IntakeEvent::Text { user, .. }
            | IntakeEvent::Callback { user, .. } => Some(user),
            IntakeEvent::TopicClosed { .. } => None,
        };
        match user {
            Some(u) => self.allowed_users.contains(u),
            None => true,
        }
    }

    async fn handle_command(&self, user: UserID, chat_id: ChatID, topic: TopicID, name: String, args: String) {
        match name.as_str() {
            "new" => self.handle_new(user, chat_id, topic, args).await,
            "kill" => self.handle_kill(user, chat_id, topic).await,
            "projects" => self.handle_projects(user, chat_id, topic).await,
            other => {
                self.reply(user, chat_id, topic, format!("Unknown command: /{other}")).await;
            }
        }
    }

    async fn handle_new(&self, user: UserID, chat_id: ChatID, topic: TopicID, args: String) {
        let trimmed = args.trim();
        if trimmed.is_empty() {
            self.open_picker(user, chat_id, topic).await;
            return;
        }
        match self.find_project(trimmed).await {
            Some(project) => self.bind_project(user, chat_id, topic, project).await,
            None => {
                self.reply(user.clone(), chat_id, topic.clone(), format!("No project matches {trimmed:?}.")).await;
                self.open_picker(user, chat_id, topic).await;
            }
        }
    }

    async fn handle_kill(&self, user: UserID, chat_id: ChatID, topic: TopicID) {
        let Some(window) = self.registry.lookup(&user, &topic).await else {
            self.reply(user, chat_id, topic, "Nothing bound in this topic.".to_string()).await;
            return;
        };
        if let Err(e) = self.mux.kill_window(&self.session_name, window.as_str()).await {
            warn!(window = %window, error = %e, "kill_window failed during /kill");
        }
        self.registry.unbind(&user, &topic).await;
        self.registry.remove_chat_id(&user, &topic).await;
        if self.registry.users_for_window(&window).await.is_empty() {
            self.registry.remove_window_state(&window).await;
        }
        self.reply(user, chat_id, topic, "Session killed.".to_string()).await;
    }

    async fn handle_projects(&self, user: UserID, chat_id: ChatID, topic: TopicID) {
        match self.catalog.list().await {
            Ok(projects) if projects.is_empty() => {
                self.reply(user, chat_id, topic, "No projects configured.".to_string()).await;
            }
            Ok(projects) => {
                let listing = format_projects(&projects);
                self.reply(user, chat_id, topic, listing).await;
            }
            Err(e) => {
                self.reply(user, chat_id, topic, format!("Could not list projects: {e}")).await;
            }
        }
    }

    async fn handle_text(&self, user: UserID, chat_id: ChatID, topic: TopicID, text: String) {
        let Some(window) = self.registry.lookup(&user, &topic).await else {
            self.open_picker(user, chat_id, topic).await;
            return;
        };
        self.bash_mode.cancel(&user, &topic).await;

        if let Some(remainder) = text.strip_prefix('!') {
            let token = self.bash_mode.start(user.clone(), topic.clone()).await;
            if let Err(e) = send_bang_sequence(self.mux.as_ref(), &self.session_name, &window, remainder.trim()).await {
                warn!(window = %window, error = %e, "bash-mode send failed");
                return;
            }
            tokio::spawn(run_capture_worker(
                self.mux.clone(),
                self.delivery.clone(),
                token,
                self.session_name.clone(),
                window,
                user,
                topic,
                chat_id,
            ));
            return;
        }

        if let Err(e) = self
            .mux
            .send_keys_with_delay(&self.session_name, window.as_str(), &text, 500)
            .await
        {
            warn!(window = %window, error = %e, "send_keys_with_delay failed");
        }
    }

    async fn handle_callback(&self, user: UserID, chat_id: ChatID, topic: TopicID, data: String) {
        if let Some(project_id) = picker::parse_selection(&data) {
            match self.picker.resolve(&user, &topic, &project_id).await {
                Some(project) => self.bind_project(user, chat_id, topic, project).await,
                None => {
                    self.reply(user, chat_id, topic, "That picker has expired, try again.".to_string()).await;
                }
            }
            return;
        }

        let Some(window) = self.registry.lookup(&user, &topic).await else {
            return;
        };
        self.poller.lock().await.handle_navigation(&user, &topic, &window, &data).await;
    }

    /// Topic-close teardown (spec §4.6): removes every binding, chat-id,
    /// and project binding this topic holds for any user, and kills the
    /// window once no other topic still references it.
    async fn handle_topic_closed(&self, _chat_id: ChatID, topic: TopicID) {
        let users = self.registry.users_for_topic(&topic).await;
        let mut windows = HashSet::new();
        for user in &users {
            if let Some(window) = self.registry.lookup(user, &topic).await {
                windows.insert(window);
            }
            self.registry.remove_topic(user, &topic).await;
        }
        for window in windows {
            if self.registry.users_for_window(&window).await.is_empty() {
                if let Err(e) = self.mux.kill_window(&self.session_name, window.as_str()).await {
                    warn!(window = %window, error = %e, "kill_window failed during topic close");
                }
                self.registry.remove_window_state(&window).await;
            }
        }
    }

    async fn open_picker(&self, user: UserID, chat_id: ChatID, topic: TopicID) {
        match self.catalog.list().await {
            Ok(projects) if projects.is_empty() => {
                self.reply(user, chat_id, topic, "No projects configured.".to_string()).await;
            }
            Ok(projects) => {
                let listing = format_projects(&projects);
                self.picker.open(user.clone(), topic.clone(), projects).await;
                self.reply(user, chat_id, topic, format!("Pick a project:\n{listing}")).await;
            }
            Err(e) => {
                self.reply(user, chat_id, topic, format!("Could not list projects: {e}")).await;
            }
        }
    }

    async fn bind_project(&self, user: UserID, chat_id: ChatID, topic: TopicID, project: ProjectSummary) {
        if let Err(e) = self.mux.ensure_session(&self.session_name).await {
            self.reply(user, chat_id, topic, format!("Could not start session: {e}")).await;
            return;
        }
        let window_id = match self
            .mux
            .new_window(&self.session_name, &project.name, &project.cwd, &self.agent_command)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                self.reply(user, chat_id, topic, format!("Could not open a window: {e}")).await;
                return;
            }
        };
        let window = WindowID::from(window_id);
        self.registry.bind(user.clone(), topic.clone(), window.clone()).await;
        self.registry.set_chat_id(user.clone(), topic.clone(), chat_id).await;
        self.registry
            .set_window_state(window.clone(), WindowState { session_id: None, cwd: project.cwd.clone() })
            .await;
        self.registry.set_display_name(window, project.name.clone()).await;
        self.registry.set_project_binding(topic.clone(), project.id.clone()).await;
        self.reply(user, chat_id, topic, format!("Bound to {}.", project.name)).await;
    }

    async fn find_project(&self, needle: &str) -> Option<ProjectSummary> {
        let projects = self.catalog.list().await.ok()?;
        if let Some(exact) = projects.iter().find(|p| p.id == ProjectID::from(needle)) {
            return Some(exact.clone());
        }
        projects.into_iter().find(|p| p.name.eq_ignore_ascii_case(needle))
    }

    async fn reply(&self, user: UserID, chat_id: ChatID, topic: TopicID, text: String) {
        let window = self.registry.lookup(&user, &topic).await.unwrap_or_else(|| WindowID::from(""));
        self.delivery
            .enqueue(DeliveryTask::content(user, topic, chat_id, window, text))
            .await;
    }
}

fn format_projects(projects: &[ProjectSummary]) -> String {
    projects
        .iter()
        .map(|p| format!("{} ({})", p.name, p.id))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;

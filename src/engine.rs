//! Event-driven profile engine.
//!
//! URL-change events are queued and handled one cycle at a time by a single
//! worker task that owns the [`StateReconciler`]. Readers get consistent
//! post-cycle snapshots through a watch channel.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::SwitcherConfig;
use crate::error::ConfigError;
use crate::management::ExtensionManager;
use crate::options::ProfileSettings;
use crate::reconciler::{ReconcileReport, StateReconciler};
use crate::types::ProfileMatchState;

enum EngineCommand {
    UrlChanged {
        url: String,
        reply: Option<oneshot::Sender<ReconcileReport>>,
    },
    /// 配置变化后按最近一次的URL重新匹配
    UpdateSettings {
        settings: ProfileSettings,
        reply: Option<oneshot::Sender<ReconcileReport>>,
    },
    Shutdown,
}

pub struct ProfileEngine {
    sender: mpsc::Sender<EngineCommand>,
    state_rx: watch::Receiver<ProfileMatchState>,
    worker: JoinHandle<ProfileMatchState>,
}

impl ProfileEngine {
    /// Must be called inside a tokio runtime.
    pub fn spawn(
        config: SwitcherConfig,
        manager: Arc<dyn ExtensionManager>,
        settings: ProfileSettings,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;

        let (sender, receiver) = mpsc::channel(config.queue_capacity);
        let (state_tx, state_rx) = watch::channel(ProfileMatchState::default());
        let reconciler = StateReconciler::new(&config);

        info!(
            "🚀 Profile engine started ({} profiles, toggles <= {})",
            settings.profile_groups.len(),
            config.max_concurrent_toggles
        );

        let worker = tokio::spawn(run_worker(reconciler, settings, manager, receiver, state_tx));

        Ok(Self {
            sender,
            state_rx,
            worker,
        })
    }

    /// Queue a URL change. Returns once queued, not once handled.
    pub async fn url_changed(&self, url: impl Into<String>) -> Result<()> {
        self.send(EngineCommand::UrlChanged {
            url: url.into(),
            reply: None,
        })
        .await
    }

    /// Queue a URL change and wait for its cycle to finish.
    pub async fn url_changed_and_wait(&self, url: impl Into<String>) -> Result<ReconcileReport> {
        let (tx, rx) = oneshot::channel();
        self.send(EngineCommand::UrlChanged {
            url: url.into(),
            reply: Some(tx),
        })
        .await?;
        rx.await.map_err(|_| anyhow!("profile engine stopped before replying"))
    }

    pub async fn update_settings(&self, settings: ProfileSettings) -> Result<ReconcileReport> {
        let (tx, rx) = oneshot::channel();
        self.send(EngineCommand::UpdateSettings {
            settings,
            reply: Some(tx),
        })
        .await?;
        rx.await.map_err(|_| anyhow!("profile engine stopped before replying"))
    }

    /// 最近一轮结束后的状态快照
    pub fn snapshot(&self) -> ProfileMatchState {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ProfileMatchState> {
        self.state_rx.clone()
    }

    /// Finishes queued events, restores any active profile, and stops the worker.
    pub async fn shutdown(self) -> Result<ProfileMatchState> {
        self.send(EngineCommand::Shutdown).await?;
        let state = self.worker.await?;
        info!("👋 Profile engine stopped");
        Ok(state)
    }

    async fn send(&self, command: EngineCommand) -> Result<()> {
        self.sender
            .send(command)
            .await
            .map_err(|_| anyhow!("profile engine is not running"))
    }
}

async fn run_worker(
    mut reconciler: StateReconciler,
    mut settings: ProfileSettings,
    manager: Arc<dyn ExtensionManager>,
    mut receiver: mpsc::Receiver<EngineCommand>,
    state_tx: watch::Sender<ProfileMatchState>,
) -> ProfileMatchState {
    while let Some(command) = receiver.recv().await {
        match command {
            EngineCommand::UrlChanged { url, reply } => {
                let report = reconciler.reconcile(&url, &settings, manager.as_ref()).await;
                state_tx.send_replace(reconciler.state().clone());
                if let Some(reply) = reply {
                    let _ = reply.send(report);
                }
            }
            EngineCommand::UpdateSettings {
                settings: new_settings,
                reply,
            } => {
                settings = new_settings;
                let report = match reconciler.state().last_matched_url.clone() {
                    Some(url) => reconciler.reconcile(&url, &settings, manager.as_ref()).await,
                    None if !settings.profiles_enabled => reconciler.deactivate(manager.as_ref()).await,
                    None => ReconcileReport::default(),
                };
                state_tx.send_replace(reconciler.state().clone());
                if let Some(reply) = reply {
                    let _ = reply.send(report);
                }
            }
            EngineCommand::Shutdown => {
                debug!("Shutdown requested");
                break;
            }
        }
    }

    reconciler.deactivate(manager.as_ref()).await;
    state_tx.send_replace(reconciler.state().clone());
    reconciler.into_state()
}

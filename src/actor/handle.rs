//! Handle for sending work to the edit worker.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use super::messages::SessionMsg;
use crate::session::{AppDeploy, EditEvent};
use crate::syntax::SyntaxNode;
use crate::transport::DeviceId;

#[derive(Debug, Error)]
#[error("edit session stopped")]
pub struct SessionClosed;

/// Cloneable sender side of the edit worker.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionMsg>,
}

impl SessionHandle {
    pub(super) fn new(tx: mpsc::Sender<SessionMsg>) -> Self {
        Self { tx }
    }

    pub async fn send(&self, msg: SessionMsg) -> Result<(), SessionClosed> {
        self.tx.send(msg).await.map_err(|_| SessionClosed)
    }

    pub async fn edit(&self, event: EditEvent) -> Result<(), SessionClosed> {
        self.send(SessionMsg::Edit(event)).await
    }

    pub async fn open_file(&self, unit: impl Into<String>, tree: SyntaxNode) -> Result<(), SessionClosed> {
        self.send(SessionMsg::OpenFile {
            unit: unit.into(),
            tree: Box::new(tree),
        })
        .await
    }

    pub async fn deploy(&self, deploy: AppDeploy) -> Result<(), SessionClosed> {
        self.send(SessionMsg::Deploy(Box::new(deploy))).await
    }

    pub async fn refresh(&self, device: impl Into<DeviceId>) -> Result<(), SessionClosed> {
        self.send(SessionMsg::Refresh(device.into())).await
    }

    pub async fn execution(&self, devices: Vec<DeviceId>) -> Result<(), SessionClosed> {
        self.send(SessionMsg::Execution(devices)).await
    }

    pub async fn trigger(&self) -> Result<(), SessionClosed> {
        self.send(SessionMsg::Trigger).await
    }

    /// Wait until every message sent before has been handled.
    pub async fn flush(&self) -> Result<(), SessionClosed> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionMsg::Flush(tx)).await?;
        rx.await.map_err(|_| SessionClosed)
    }

    pub async fn shutdown(&self) -> Result<(), SessionClosed> {
        self.send(SessionMsg::Shutdown).await
    }
}

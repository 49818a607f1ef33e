use std::sync::mpsc::{self, Sender};
use std::thread;

use tokio::sync::oneshot;

use crate::store::StorageError;

use super::channel::{Command, Reply};
use super::dispatcher::run_memory_worker;

/// Owns the engine thread. Every request is one command in, one reply out.
pub(super) struct MemoryWorker {
    sender: Sender<Command>,
}

impl MemoryWorker {
    pub(super) fn spawn() -> Result<Self, StorageError> {
        let (sender, receiver) = mpsc::channel::<Command>();
        thread::Builder::new()
            .name("websql-memory-engine".into())
            .spawn(move || run_memory_worker(&receiver))
            .map_err(|err| {
                StorageError::worker_closed(&format!("failed to spawn memory engine thread: {err}"))
            })?;
        Ok(Self { sender })
    }

    pub(super) fn send_command(&self, command: Command) -> Result<(), StorageError> {
        self.sender
            .send(command)
            .map_err(|_| StorageError::worker_closed("memory engine worker closed"))
    }

    /// Send a command that carries no reply; a closed worker has nothing left to update.
    pub(super) fn notify(&self, command: Command) {
        let _ = self.sender.send(command);
    }

    pub(super) async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> Command,
        drop_message: &'static str,
    ) -> Result<T, StorageError> {
        let (tx, rx) = oneshot::channel();
        self.send_command(build(tx))?;
        rx.await
            .map_err(|_| StorageError::worker_closed(drop_message))?
    }
}

impl Drop for MemoryWorker {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
    }
}

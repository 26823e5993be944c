use std::thread;

use crossbeam_channel::{Receiver, Sender};

use crate::detection::domain::detector::DetectorFactory;
use crate::detection::domain::model_provider::{ModelEntry, ModelProvider};
use crate::worker::dispatcher::Dispatcher;
use crate::worker::messages::{Command, Response};

/// Controller-side endpoint of a worker's task channel.
///
/// Commands and responses are FIFO per direction. Sends are
/// fire-and-forget: if the worker is gone, the message is dropped and no
/// error is surfaced to the sender. Dropping the handle closes the command
/// channel and lets the worker thread exit.
pub struct WorkerHandle {
    commands: Sender<Command>,
    responses: Receiver<Response>,
}

impl WorkerHandle {
    pub fn send(&self, command: Command) {
        let _ = self.commands.send(command);
    }

    /// Blocks for the next response; `None` once the worker has exited
    /// and drained.
    pub fn recv(&self) -> Option<Response> {
        self.responses.recv().ok()
    }

    /// The raw response receiver, for select loops in a UI thread.
    pub fn responses(&self) -> &Receiver<Response> {
        &self.responses
    }
}

/// Spawn a background detection worker. Returns the controller handle.
///
/// The worker processes one command at a time: a long model load or
/// detection suspends further command handling until it resolves, so
/// responses come back in command order.
pub fn spawn(
    provider: Box<dyn ModelProvider>,
    factory: Box<dyn DetectorFactory>,
    manifest: Vec<ModelEntry>,
) -> WorkerHandle {
    let (command_tx, command_rx) = crossbeam_channel::unbounded::<Command>();
    let (response_tx, response_rx) = crossbeam_channel::unbounded::<Response>();

    thread::spawn(move || {
        let mut dispatcher = Dispatcher::new(provider, factory, manifest);
        for command in command_rx {
            let response = dispatcher.handle(command);
            if response_tx.send(response).is_err() {
                // Controller hung up; responses have nowhere to go.
                break;
            }
        }
        log::debug!("worker: command channel closed, exiting");
    });

    WorkerHandle {
        commands: command_tx,
        responses: response_rx,
    }
}

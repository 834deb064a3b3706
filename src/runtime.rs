use std::sync::mpsc::{self, Receiver, RecvError, Sender};
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

use crate::judge::{RunError, RunOutcome, RunTicket};

/// Unified event type consumed by the app loop.
#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    Resize,
    Tick,
    RunDone(RunMessage),
}

/// Result of a compile/run worker, tagged so stale responses can be
/// rejected after navigation.
#[derive(Debug)]
pub struct RunMessage {
    pub ticket: RunTicket,
    pub result: Result<RunOutcome, RunError>,
}

/// Fan-in hub: the ticker thread, the terminal reader thread and any run
/// workers all feed one channel that the app loop drains.
pub struct Events {
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl Events {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    /// Handle for producers (run workers, tests).
    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    pub fn spawn_ticker(&self, interval: Duration) {
        let tx = self.sender();
        thread::spawn(move || loop {
            if tx.send(Event::Tick).is_err() {
                break;
            }
            thread::sleep(interval);
        });
    }

    pub fn spawn_terminal_reader(&self) {
        let tx = self.sender();
        thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if tx.send(Event::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(Event::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });
    }

    /// Blocks for the next event.
    pub fn next(&self) -> Result<Event, RecvError> {
        self.rx.recv()
    }
}

impl Default for Events {
    fn default() -> Self {
        Self::new()
    }
}

//! Test doubles for code that drives an [`OmeroAdapter`].
//!
//! [`ScriptedAdapter`] records every command it receives and answers from a
//! caller-supplied rule instead of spawning the connector.
//!
//! ```ignore
//! let adapter = ScriptedAdapter::succeeding()
//!     .fail_when(|command| matches!(command, AdapterCommand::CheckCredentials));
//! let bridge = OmeroBridge::connect(&adapter, Credentials::new("ana", "pw"));
//! assert!(!bridge.logged_in());
//! assert_eq!(adapter.call_count(), 1);
//! ```

use std::cell::RefCell;
use std::fmt;

use crate::adapter::{AdapterError, AdapterReply, OmeroAdapter};
use crate::command::AdapterCommand;
use crate::credentials::Credentials;

type Responder = Box<dyn Fn(&AdapterCommand) -> AdapterReply>;

pub struct ScriptedAdapter {
    responder: Responder,
    calls: RefCell<Vec<AdapterCommand>>,
    users: RefCell<Vec<String>>,
}

impl ScriptedAdapter {
    /// Answers every command with exit code 0 and one line naming the command.
    pub fn succeeding() -> Self {
        Self::with_responder(|command| AdapterReply::new(Some(0), vec![command.name().to_string()]))
    }

    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&AdapterCommand) -> AdapterReply + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: RefCell::new(Vec::new()),
            users: RefCell::new(Vec::new()),
        }
    }

    /// Wraps the current rule so matching commands exit with code 1.
    pub fn fail_when<P>(self, predicate: P) -> Self
    where
        P: Fn(&AdapterCommand) -> bool + 'static,
    {
        let previous = self.responder;
        Self {
            responder: Box::new(move |command| {
                if predicate(command) {
                    AdapterReply::new(Some(1), vec![format!("{} refused", command.name())])
                } else {
                    previous(command)
                }
            }),
            calls: self.calls,
            users: self.users,
        }
    }

    pub fn calls(&self) -> Vec<AdapterCommand> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// User names seen on each call, in order.
    pub fn users(&self) -> Vec<String> {
        self.users.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
        self.users.borrow_mut().clear();
    }
}

impl fmt::Debug for ScriptedAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedAdapter")
            .field("calls", &self.calls.borrow().len())
            .finish()
    }
}

impl OmeroAdapter for ScriptedAdapter {
    fn invoke(
        &self,
        credentials: &Credentials,
        command: &AdapterCommand,
    ) -> Result<AdapterReply, AdapterError> {
        self.calls.borrow_mut().push(command.clone());
        self.users.borrow_mut().push(credentials.user().to_string());
        Ok((self.responder)(command))
    }
}

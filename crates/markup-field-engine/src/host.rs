//! Boundaries to the host application.
//!
//! The engine never talks to the user or the server directly. It notifies
//! through a [`Notifier`], looks up strings through a
//! [`Localizer`](crate::l10n::Localizer) and hands form submissions to a
//! [`RequestLayer`].

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shows a blocking message to the user.
pub trait Notifier {
    fn notify(&self, message: &str);
}

/// A notifier that keeps every message. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct NotificationLog(Rc<RefCell<Vec<String>>>);

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.0.borrow().last().cloned()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl Notifier for NotificationLog {
    fn notify(&self, message: &str) {
        self.0.borrow_mut().push(message.to_string());
    }
}

/// Values of a form, ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSubmission {
    /// Id of the submitted form, if it has one.
    pub form: Option<String>,
    pub action: String,
    pub method: String,
    pub values: Vec<(String, String)>,
}

impl FormSubmission {
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Error)]
#[error("request to {url} failed: {reason}")]
pub struct RequestError {
    pub url: String,
    pub reason: String,
}

/// Sends form submissions to the server and returns the response body.
pub trait RequestLayer {
    fn submit(&mut self, submission: &FormSubmission) -> Result<String, RequestError>;
}

//! One-shot user notices and post-submit navigation.

use crate::models::Resource;
use serde::Serialize;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
}

/// A transient message shown once after an action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Holds at most one notice until it is read.
#[derive(Clone, Debug, Default)]
pub struct Flash {
    slot: Option<Notice>,
}

impl Flash {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `notice`, replacing any notice that was never shown.
    pub fn put(&mut self, notice: Notice) {
        self.slot = Some(notice);
    }

    /// Read the notice. A second call returns `None`.
    pub fn take(&mut self) -> Option<Notice> {
        self.slot.take()
    }
}

/// A screen the client can navigate to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Route {
    pub resource: Resource,
}

impl Route {
    /// The index screen listing `resource`.
    pub const fn index(resource: Resource) -> Self {
        Self { resource }
    }

    pub fn path(&self) -> String {
        self.resource.collection_path()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Where a successful action sends the user, and what they are told on arrival.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Redirect {
    pub route: Route,
    pub notice: Notice,
}

impl Redirect {
    pub fn to_index(resource: Resource, notice: Notice) -> Self {
        Self {
            route: Route::index(resource),
            notice,
        }
    }

    /// Deliver the redirect's notice into the destination's flash slot.
    pub fn deliver(self, flash: &mut Flash) -> Route {
        flash.put(self.notice);
        self.route
    }
}

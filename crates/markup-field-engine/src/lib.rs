//! Structured rich-text form fields.
//!
//! A field turns a container element inside a form into an editable region
//! that accepts a fixed set of inline markup. Whatever editing substrate the
//! host offers, the value posted with the form is the same: the output
//! pipeline's rendering of the content, plus the indent and alignment in
//! hidden inputs.
//!
//! Start with [`FieldRegistry`]: create fields on a [`Page`], feed it host
//! events and submit forms through it.

pub mod annotation;
pub mod bookmark;
pub mod commands;
pub mod dom;
pub mod engine;
pub mod field;
pub mod filters;
pub mod host;
pub mod keymap;
pub mod l10n;
pub mod page;
pub mod popup;
pub mod postback;
pub mod scheduler;
pub mod toolbar;

// Re-export key types for easier usage
pub use annotation::{Annotation, AnnotationKind};
pub use bookmark::Bookmark;
pub use commands::{Binding, Command};
pub use dom::{Dom, NodeId, Position, Range};
pub use engine::{
    EngineAdapter, EngineError, EngineKind, EngineState, HostCapabilities, RetryPolicy,
};
pub use field::{DefaultHooks, Field, FieldError, FieldHooks, FieldRegistry, HookContext};
pub use filters::{Pipeline, PipelineKind, Pipelines};
pub use host::{FormSubmission, NotificationLog, Notifier, RequestError, RequestLayer};
pub use keymap::{Dispatch, KeyEvent, Keymap, codes};
pub use l10n::{Lexicon, Localizer};
pub use page::Page;
pub use popup::{LinkForm, LinkOutcome, PopupHost, PopupKind, PopupManager};
pub use postback::{Alignment, Postback};
pub use markup_field_config::{ConfigLayer, FieldConfig, FieldType};

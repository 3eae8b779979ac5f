//! Conversation core: timeline, escalation workflow and the reducer tying
//! them to the ticket store.

pub mod conversation;
pub mod demo;
pub mod effect;
pub mod escalation;
pub mod event;
pub mod message;
pub mod notification;
pub mod timeline;

pub use conversation::{ChatSettings, Conversation};
pub use effect::Effect;
pub use escalation::{EscalationRequest, EscalationState, EscalationWorkflow, FormField};
pub use event::{AppEvent, RequestId};
pub use message::{Feedback, Message, MessageId, Role};
pub use notification::{Notification, NotificationKind};
pub use timeline::Timeline;

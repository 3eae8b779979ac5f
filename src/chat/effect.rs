use tokio_util::sync::CancellationToken;

use super::event::RequestId;
use super::notification::Notification;
use crate::agent::InvokeRequest;

/// Side effects that should be executed outside the reducer.
#[derive(Debug)]
pub enum Effect {
    /// Issue a backend call; its completion comes back as `AppEvent::BackendCompleted`
    Invoke {
        request_id: RequestId,
        request: InvokeRequest,
    },
    /// Start the stuck-request timer; cancelling `guard` disarms it
    ArmTimeout {
        request_id: RequestId,
        guard: CancellationToken,
    },
    /// Surface a transient notification
    Notify(Notification),
}

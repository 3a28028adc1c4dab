//! Shared handler state.

use karotz_app::dispatcher::ActionDispatcher;
use karotz_app::rfid_machine::RfidMachine;

/// Everything the handlers need, wired once at startup.
///
/// Generic over the adapter implementations so tests can plug in the
/// virtual gateway and in-memory stores without touching the handlers.
pub struct AppState<H, S, R, N> {
    pub dispatcher: ActionDispatcher<H, S, N>,
    pub rfid: RfidMachine<H, S, R, N>,
}

// Derived Clone would require H/S/R/N: Clone; every field already clones
// through shared handles.
impl<H, S, R, N> Clone for AppState<H, S, R, N> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            rfid: self.rfid.clone(),
        }
    }
}

use crate::query::{Mutation, QueryKey};

/// This is a message sent to the Overlord. Anything that talks to the
/// backend is handled by the Overlord in this way. There is no return value,
/// the results land in `GLOBALS.queries` and the UI picks them up on a
/// later frame. Such an architecture works best with an immediate-mode
/// renderer.
#[derive(Debug, Clone)]
pub enum ToOverlordMessage {
    /// Calls [mutate](crate::Overlord::mutate)
    Mutate(Mutation),

    /// Reload every query currently cached
    RefreshAll,

    /// Calls [resolve](crate::Overlord::resolve)
    Resolve(QueryKey),

    /// Persist `GLOBALS.settings`
    SaveSettings,

    /// Calls [sign_in](crate::Overlord::sign_in)
    SignIn(String),

    /// Calls [sign_out](crate::Overlord::sign_out)
    SignOut,

    Shutdown,
}

//! Action enum — all user-initiated intents and internal events.

/// Unique identifier for a focusable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    NowPlaying,
    ChannelGrid,
    Schedule,
    HelpOverlay,
}

/// All actions that can flow through the system.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Navigation ───────────────────────────────────────────────────────────
    FocusNext,
    FocusPrev,
    FocusPane(ComponentId),

    // ── Selection ────────────────────────────────────────────────────────────
    /// Watch a channel live.
    SelectChannel(String),
    /// Watch one program of a channel (live or catch-up).
    PinProgram {
        channel_id: String,
        program_id: String,
    },
    /// Return the active channel to whatever is on air.
    GoLive,

    // ── Schedule ─────────────────────────────────────────────────────────────
    Refresh,
    ToggleAutoUpdate,
    /// The tracker published a new snapshot (already in `AppState`).
    LiveUpdated,

    // ── UI ───────────────────────────────────────────────────────────────────
    /// Show the user-facing message for an error code.
    Notify(&'static str),
    ToggleHelp,
    Quit,
}

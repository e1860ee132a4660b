pub mod channel_grid;
pub mod help_overlay;
pub mod now_playing;
pub mod schedule_list;

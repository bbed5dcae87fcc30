pub mod hud_message;
pub mod text_input;
pub mod viewport;

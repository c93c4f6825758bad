mod footer_bar;

pub use footer_bar::{FooterBar, FooterBarStyle, KeyHint, step_color};

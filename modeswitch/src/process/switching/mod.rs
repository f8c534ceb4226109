use super::*;

pub mod effect;
mod switcher;

pub use switcher::ModeSwitcher;

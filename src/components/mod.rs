pub mod details;
pub mod dialog;
pub mod search_bar;
pub mod status_bar;
pub mod tree;

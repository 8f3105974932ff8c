pub mod buy;
pub mod portfolio;
pub mod ui;
pub mod view;

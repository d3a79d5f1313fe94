pub mod app;
pub mod appsettings;
pub mod delivery;

pub mod api;
pub mod controller;
pub mod health;
pub mod session;
pub mod storage;
pub mod types;
#[cfg(any(feature = "desktop", feature = "web", feature = "mobile"))]
pub mod ui;
#[cfg(any(feature = "desktop", feature = "web", feature = "mobile"))]
pub mod views;

pub mod camera;
pub mod config;
pub mod driver;
pub mod env;
pub mod field;
pub mod gpu;
pub mod march;
pub mod math;
pub mod panel;
pub mod raygen;
pub mod shade;

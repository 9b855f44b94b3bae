pub mod app;
pub mod audio;
pub mod behavior;
pub mod config;
pub mod gesture;
pub mod input;
pub mod logging;
pub mod noise;
pub mod orchestrator;
pub mod overlay;
pub mod render;
pub mod scene;
pub mod settings;
pub mod terminal;
pub mod world;

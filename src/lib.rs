pub mod analyser;
pub mod animation;
pub mod app;
pub mod audio;
pub mod blend;
pub mod color;
pub mod compose;
pub mod config;
pub mod controls;
pub mod layout;
pub mod render;
pub mod scene;
pub mod scheduler;
pub mod terminal;
pub mod visualizer;
pub mod wave;

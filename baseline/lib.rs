#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

pub mod aggregate;
pub mod config;
pub mod metadata;
pub mod pipeline;
pub mod prior;
pub mod recording;
pub mod score;
pub mod submission;
pub mod table;
pub mod types;

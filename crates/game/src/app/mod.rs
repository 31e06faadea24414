mod audio;
mod bootstrap;
mod gameplay;
mod loop_runner;
mod menu;
mod settings;
mod shell;

pub(crate) use loop_runner::run;

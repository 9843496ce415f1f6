mod bootstrap;
mod gameplay;
mod loop_runner;
mod menu;
mod profile;

pub(crate) use loop_runner::run;

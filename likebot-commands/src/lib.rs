pub mod config;
pub mod like;

use likebot_core::{Data, Error};

pub struct CommandMeta {
    pub name: &'static str,
    pub desc: &'static str,
    pub category: &'static str,
    pub usage: &'static str,
}

pub const COMMANDS: &[CommandMeta] = &[like::META, config::setlikechannel::META];

pub fn commands() -> Vec<poise::Command<Data, Error>> {
    vec![like::like(), config::setlikechannel::setlikechannel()]
}

/// Usage line for a registered command, by name.
pub fn usage_for(name: &str) -> Option<&'static str> {
    COMMANDS
        .iter()
        .find(|command| command.name == name)
        .map(|command| command.usage)
}

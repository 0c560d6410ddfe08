/// Deferred deletion of transient messages.
pub mod cleanup;
/// Embed colours and builders shared across commands.
pub mod embed;
/// Single source of truth for the message-command prefix.
pub const COMMAND_PREFIX: char = '!';
/// Pure parser helpers.
pub mod parse;

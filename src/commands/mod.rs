mod arguments;
mod santa;

use crate::{draw_service::DrawError, BotState};

pub use santa::santa;

type CommandResult = Result<(), CommandError>;
type Context<'a> = poise::Context<'a, BotState, CommandError>;

#[derive(thiserror::Error, Debug)]
pub enum CommandError {
    #[error("{message}")]
    User { message: String },
    #[error("{message}")]
    Internal { message: String },
    #[error(transparent)]
    Serenity(#[from] serenity::Error),
}

pub fn user_err(message: impl Into<String>) -> CommandError {
    CommandError::User {
        message: message.into(),
    }
}

pub fn internal_err(message: impl Into<String>) -> CommandError {
    CommandError::Internal {
        message: message.into(),
    }
}

/// Rejections go back to the user as they are, storage trouble is an internal error.
pub fn draw_err(error: DrawError) -> CommandError {
    match error {
        DrawError::Persistence(err) => internal_err(format!("Could not draw names: {err}")),
        rejection => user_err(format!("**Can't draw names:** {rejection}")),
    }
}

pub mod callback;
pub mod general_message;
pub mod message;

use teloxide::{
    dispatching::{dialogue, dialogue::InMemStorage, UpdateHandler},
    prelude::*,
};

use crate::bot::commands::Command;
use crate::bot::AppContext;

/// What every dispatcher endpoint returns
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;

pub struct BotHandler {
    pub ctx: AppContext,
}

impl BotHandler {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    /// Commands first, then buttons and free text, then inline button presses
    pub fn schema(&self) -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
        let ctx_command = self.ctx.clone();
        let ctx_text = self.ctx.clone();
        let ctx_callback = self.ctx.clone();

        dialogue::enter::<Update, InMemStorage<()>, (), _>()
            .branch(
                Update::filter_message()
                    .filter_command::<Command>()
                    .endpoint(move |bot, msg, cmd| {
                        let ctx = ctx_command.clone();
                        async move { message::command_handler(bot, msg, cmd, ctx).await }
                    }),
            )
            .branch(Update::filter_message().endpoint(move |bot, msg| {
                let ctx = ctx_text.clone();
                async move { message::text_handler(bot, msg, ctx).await }
            }))
            .branch(Update::filter_callback_query().endpoint(move |bot, q| {
                let ctx = ctx_callback.clone();
                async move { callback::callback_handler(bot, q, ctx).await }
            }))
    }
}

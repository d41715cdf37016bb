use std::sync::Arc;

use chrono::{Duration, Utc};
use teloxide::{prelude::*, types::PreCheckoutQuery};
use tracing::{error, info};

use orb_core::{domain::UserId, formatting};

use crate::router::AppState;

/// Telegram Stars currency code, shared by the invoice and the charge row.
pub(crate) const STARS_CURRENCY: &str = "XTR";

/// Telegram requires an answer within 10 seconds or the payment fails.
/// The actual upgrade happens on the successful-payment message, so this
/// always approves.
pub async fn handle_pre_checkout(
    bot: Bot,
    q: PreCheckoutQuery,
    _state: Arc<AppState>,
) -> ResponseResult<()> {
    bot.answer_pre_checkout_query(q.id, true).await?;
    Ok(())
}

pub async fn handle_successful_payment(
    bot: Bot,
    msg: Message,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Some(payment) = msg.successful_payment() else {
        return Ok(());
    };

    let user_id = UserId(user.id.0 as i64);
    let end_date = Utc::now() + Duration::days(state.cfg.subscription_days);

    info!(
        user_id = user_id.0,
        charge_id = %payment.telegram_payment_charge_id,
        amount = payment.total_amount,
        "payment settled"
    );

    match state
        .chat
        .confirm_payment(
            user_id,
            &payment.telegram_payment_charge_id,
            payment.total_amount as i64,
            STARS_CURRENCY,
            end_date,
        )
        .await
    {
        Ok(()) => {
            bot.send_message(msg.chat.id, formatting::upgrade_thanks())
                .await?;
        }
        Err(err) => {
            // The user has been charged; surface it loudly in the logs.
            error!(
                user_id = user_id.0,
                charge_id = %payment.telegram_payment_charge_id,
                error = %err,
                "paid upgrade failed to apply"
            );
            bot.send_message(
                msg.chat.id,
                "⚠️ Your payment went through but the upgrade failed to apply. \
                 Please contact support with your payment receipt.",
            )
            .await?;
        }
    }

    Ok(())
}

use crate::model::Instrument;

/// A parsed bot command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Price {
        instrument: Instrument,
    },
    Alert {
        instrument: Instrument,
        target_price: f64,
    },
}

/// A recognized command whose arguments cannot be used as typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidCommand {
    PriceUsage,
    AlertUsage,
    TargetPriceNotANumber,
    TargetPriceNotPositive,
}

impl InvalidCommand {
    /// Reply text sent back to the subscriber. The registry is never
    /// touched for an invalid command.
    pub fn reply(self) -> &'static str {
        match self {
            Self::PriceUsage => "Usage: /price <crypto_id>",
            Self::AlertUsage => "Usage: /alert <crypto_id> <target_price>",
            Self::TargetPriceNotANumber => "Target price must be a number.",
            Self::TargetPriceNotPositive => "Target price must be a positive number.",
        }
    }
}

/// Parse one message line.
///
/// Returns `None` for plain chatter and commands the bot does not know;
/// those are ignored rather than answered.
pub fn parse(text: &str) -> Option<Result<Command, InvalidCommand>> {
    let mut tokens = text.split_whitespace();
    let command = tokens.next()?;
    if !command.starts_with('/') {
        return None;
    }
    // "/price@MyPriceBot" is how group members address a specific bot
    let name = command.split('@').next().unwrap_or(command);
    let args: Vec<&str> = tokens.collect();

    match name {
        "/start" => Some(Ok(Command::Start)),
        "/price" => Some(parse_price(&args)),
        "/alert" => Some(parse_alert(&args)),
        _ => None,
    }
}

fn parse_price(args: &[&str]) -> Result<Command, InvalidCommand> {
    let &[instrument] = args else {
        return Err(InvalidCommand::PriceUsage);
    };
    Ok(Command::Price {
        instrument: Instrument::new(instrument),
    })
}

fn parse_alert(args: &[&str]) -> Result<Command, InvalidCommand> {
    let &[instrument, target] = args else {
        return Err(InvalidCommand::AlertUsage);
    };
    let Ok(target_price) = target.parse::<f64>() else {
        return Err(InvalidCommand::TargetPriceNotANumber);
    };
    if !target_price.is_finite() || target_price <= 0.0 {
        return Err(InvalidCommand::TargetPriceNotPositive);
    }
    Ok(Command::Alert {
        instrument: Instrument::new(instrument),
        target_price,
    })
}

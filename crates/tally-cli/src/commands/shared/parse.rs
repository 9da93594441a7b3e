use anyhow::{Context, bail};
use tally_core::draft::ArgumentInput;
use tally_core::validation::{Weight, validate_argument_text};

/// Parse `WEIGHT:TEXT` (`+8:Better salary`, `-3:rent`).
pub fn parse_argument(raw: &str) -> anyhow::Result<ArgumentInput> {
    let Some((weight, text)) = raw.split_once(':') else {
        bail!("argument '{raw}' must look like WEIGHT:TEXT");
    };
    let weight = Weight::parse(weight).with_context(|| format!("argument '{raw}'"))?;
    let text = text.trim().to_string();
    validate_argument_text(&text).with_context(|| format!("argument '{raw}'"))?;
    Ok(ArgumentInput { text, weight })
}

/// Parse `WEIGHT[:TEXT]`; a bare weight gets a placeholder text.
pub fn parse_scored_argument(raw: &str, position: usize) -> anyhow::Result<ArgumentInput> {
    if raw.contains(':') {
        parse_argument(raw)
    } else {
        let weight = Weight::parse(raw).with_context(|| format!("argument '{raw}'"))?;
        Ok(ArgumentInput {
            text: format!("argument {}", position + 1),
            weight,
        })
    }
}

pub fn parse_arguments(raw: &[String]) -> anyhow::Result<Vec<ArgumentInput>> {
    raw.iter().map(|a| parse_argument(a)).collect()
}

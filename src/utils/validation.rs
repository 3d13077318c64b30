use crate::error::InputError;

/// Longest plan text accepted, in characters.
pub const MAX_PLAN_TEXT_CHARS: usize = 1000;

/// Checks a free-text plan description. The text is kept as typed;
/// only blank or oversized input is rejected.
pub fn validate_plan_text(text: &str) -> Result<(), InputError> {
    if text.trim().is_empty() {
        return Err(InputError::EmptyPlanText);
    }

    if text.chars().count() > MAX_PLAN_TEXT_CHARS {
        return Err(InputError::PlanTextTooLong { max: MAX_PLAN_TEXT_CHARS });
    }

    Ok(())
}

/// Parses a 1-based plan number and checks it against a listing of `len` plans.
/// Only plain ASCII digits are accepted; a number too big for `usize` is out of
/// range rather than malformed.
pub fn parse_plan_index(text: &str, len: usize) -> Result<usize, InputError> {
    let digits = text.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InputError::IndexFormat);
    }

    let out_of_range = || InputError::IndexOutOfRange { index: digits.to_string(), len };
    let index: usize = digits.parse().map_err(|_| out_of_range())?;

    if index == 0 || index > len {
        return Err(out_of_range());
    }

    Ok(index)
}

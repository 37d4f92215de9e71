use crate::error::InputError;

/// Reads a target typed by a person into cents.
///
/// Digits only are already cents (`6867467`). Anything else is read as
/// reais: optional `R$`, `.` for thousands and `,` for the decimal part,
/// e.g. `68674,67` or `R$ 68.674,67`.
pub fn parse_target_to_cents(input: &str) -> Result<u64, InputError> {
    let s = input.trim();
    let invalid = || InputError::InvalidAmount(s.to_string());

    let cents = if !s.is_empty() && is_digits(s) {
        s.parse::<u64>().map_err(|_| invalid())?
    } else {
        let rest = match s.get(..2) {
            Some(prefix) if prefix.eq_ignore_ascii_case("r$") => s[2..].trim_start(),
            _ => s,
        };
        let rest = rest.replace('.', "");
        let (units, fraction) = rest.split_once(',').unwrap_or((rest.as_str(), ""));

        if units.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if fraction.len() > 2 || !is_digits(units) || !is_digits(fraction) {
            return Err(invalid());
        }

        let units = if units.is_empty() {
            0
        } else {
            units.parse::<u64>().map_err(|_| invalid())?
        };
        let fraction = format!("{fraction:0<2}").parse::<u64>().map_err(|_| invalid())?;

        units
            .checked_mul(100)
            .and_then(|c| c.checked_add(fraction))
            .ok_or_else(invalid)?
    };

    if cents == 0 {
        return Err(InputError::NonPositiveTarget);
    }

    Ok(cents)
}

fn is_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

/// `6867467` -> `R$ 68674,67`
pub fn format_cents(cents: u64) -> String {
    format!("R$ {},{:02}", cents / 100, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cents() {
        assert_eq!(parse_target_to_cents("6867467"), Ok(6867467));
        assert_eq!(parse_target_to_cents("  42 "), Ok(42));
    }

    #[test]
    fn test_parse_reais() {
        assert_eq!(parse_target_to_cents("68674,67"), Ok(6867467));
        assert_eq!(parse_target_to_cents("R$ 68.674,67"), Ok(6867467));
        assert_eq!(parse_target_to_cents("r$68.674,67"), Ok(6867467));
        assert_eq!(parse_target_to_cents("68.674,67"), Ok(6867467));
        assert_eq!(parse_target_to_cents("1,5"), Ok(150));
        assert_eq!(parse_target_to_cents(",05"), Ok(5));
        assert_eq!(parse_target_to_cents("1.000"), Ok(100000));
        assert_eq!(parse_target_to_cents("R$ 12"), Ok(1200));
    }

    #[test]
    fn test_parse_rejects() {
        for input in ["", "abc", "R$", "1,234", "1,2,3", "-5,00", "12 34", "1e5", "R$ ,"] {
            assert!(
                matches!(parse_target_to_cents(input), Err(InputError::InvalidAmount(_))),
                "{input:?}"
            );
        }
        assert_eq!(parse_target_to_cents("0"), Err(InputError::NonPositiveTarget));
        assert_eq!(parse_target_to_cents("0,00"), Err(InputError::NonPositiveTarget));
    }

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(6867467), "R$ 68674,67");
        assert_eq!(format_cents(5), "R$ 0,05");
        assert_eq!(format_cents(100), "R$ 1,00");
    }
}

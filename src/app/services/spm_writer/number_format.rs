//! Number rendering compatible with existing SPM batch scripts
//!
//! Downstream MATLAB batch code and analysts' diff tooling expect numbers in
//! the shape Python prints them: shortest round-trip digits, a trailing `.0`
//! on integral floats, `1e-05` style exponents and `[a, b]` lists.

/// Render a float the way Python's `repr` does
pub fn python_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    // Shortest round-trip digits in scientific form, e.g. "-1.2345e3"
    let scientific = format!("{:e}", value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return scientific;
    };

    let sign = if mantissa.starts_with('-') { "-" } else { "" };
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();

    if (-4..16).contains(&exponent) {
        format!("{}{}", sign, positional(&digits, exponent))
    } else {
        let mantissa = if digits.len() == 1 {
            digits
        } else {
            format!("{}.{}", &digits[..1], &digits[1..])
        };
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        format!("{}{}e{}{:02}", sign, mantissa, exp_sign, exponent.abs())
    }
}

/// Place the decimal point in a digit string with a base-10 exponent
fn positional(digits: &str, exponent: i32) -> String {
    if exponent < 0 {
        let zeros = "0".repeat((-exponent - 1) as usize);
        return format!("0.{}{}", zeros, digits);
    }

    let int_len = exponent as usize + 1;
    if digits.len() <= int_len {
        format!("{}{}.0", digits, "0".repeat(int_len - digits.len()))
    } else {
        format!("{}.{}", &digits[..int_len], &digits[int_len..])
    }
}

/// Render a list of floats as a Python list: `[1.0, 2.5]`
pub fn python_list(values: &[f64]) -> String {
    let items: Vec<String> = values.iter().map(|&v| python_float(v)).collect();
    format!("[{}]", items.join(", "))
}

/// Render a list of integers as a Python list: `[1, 2]`
pub fn python_int_list(values: &[i64]) -> String {
    let items: Vec<String> = values.iter().map(i64::to_string).collect();
    format!("[{}]", items.join(", "))
}

/// Round half away from zero to `digits` decimals
pub fn round_half_away(value: f64, digits: i32) -> f64 {
    if digits == 0 {
        return value.round();
    }
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

/// `%1.1f` of a value first rounded half away from zero to one decimal
pub fn one_decimal(value: f64) -> String {
    format!("{:.1}", round_half_away(value, 1))
}

/// `%0.3f`, printing NaN the way Python does
pub fn fixed3(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else {
        format!("{:.3}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_float_positional() {
        assert_eq!(python_float(12.0), "12.0");
        assert_eq!(python_float(0.5), "0.5");
        assert_eq!(python_float(-0.33), "-0.33");
        assert_eq!(python_float(123.456), "123.456");
        assert_eq!(python_float(0.0001), "0.0001");
        assert_eq!(python_float(1e15), "1000000000000000.0");
        assert_eq!(python_float(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(python_float(0.0), "0.0");
    }

    #[test]
    fn test_python_float_exponent() {
        assert_eq!(python_float(1e-5), "1e-05");
        assert_eq!(python_float(1.5e-7), "1.5e-07");
        assert_eq!(python_float(1e16), "1e+16");
        assert_eq!(python_float(-2.5e20), "-2.5e+20");
    }

    #[test]
    fn test_python_float_special() {
        assert_eq!(python_float(f64::NAN), "nan");
        assert_eq!(python_float(f64::INFINITY), "inf");
        assert_eq!(python_float(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn test_python_lists() {
        assert_eq!(python_list(&[]), "[]");
        assert_eq!(python_list(&[1.0, 2.5]), "[1.0, 2.5]");
        assert_eq!(python_int_list(&[1, 2, 1]), "[1, 2, 1]");
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round_half_away(2.5, 0), 3.0);
        assert_eq!(round_half_away(-2.5, 0), -3.0);
        assert_eq!(round_half_away(1.25, 1), 1.3);
        assert_eq!(round_half_away(0.666, 2), 0.67);
        assert_eq!(one_decimal(4.25), "4.3");
        assert_eq!(one_decimal(2.0), "2.0");
        assert_eq!(fixed3(0.5), "0.500");
        assert_eq!(fixed3(f64::NAN), "nan");
    }
}

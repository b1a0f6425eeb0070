//! Interpreter for the `%`-style `Format` strings carried by Field widgets.
//!
//! Supports the subset the display format uses: flags `-`, `+`, `0`, space;
//! a width; a precision; conversions `d i u f F e E x X o s %`. A malformed
//! format is a [`FormatError`] that surfaces from the digest — a wrong value
//! silently rendered on a telemetry console is worse than a visible failure.

use opsview_model::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("format string ends inside a % directive: '{0}'")]
    Truncated(String),

    #[error("unsupported conversion '%{0}'")]
    UnsupportedConversion(char),

    #[error("value '{value}' is not numeric (needed by '%{conversion}')")]
    NotNumeric { value: String, conversion: char },
}

#[derive(Debug, Default)]
struct Directive {
    left_justify: bool,
    zero_pad: bool,
    plus_sign: bool,
    space_sign: bool,
    width: usize,
    precision: Option<usize>,
}

/// Render `value` through the format string.
pub fn format_value(format: &str, value: &Value) -> Result<String, FormatError> {
    let mut out = String::new();
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut directive = Directive::default();
        loop {
            match chars.peek() {
                Some('-') => directive.left_justify = true,
                Some('0') => directive.zero_pad = true,
                Some('+') => directive.plus_sign = true,
                Some(' ') => directive.space_sign = true,
                _ => break,
            }
            chars.next();
        }
        while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
            directive.width = directive.width * 10 + d as usize;
            chars.next();
        }
        if chars.peek() == Some(&'.') {
            chars.next();
            let mut precision = 0usize;
            while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
                precision = precision * 10 + d as usize;
                chars.next();
            }
            directive.precision = Some(precision);
        }

        let conversion = chars
            .next()
            .ok_or_else(|| FormatError::Truncated(format.to_string()))?;
        out.push_str(&convert(&directive, conversion, value)?);
    }

    Ok(out)
}

fn convert(d: &Directive, conversion: char, value: &Value) -> Result<String, FormatError> {
    let numeric = || {
        value.as_f64().ok_or_else(|| FormatError::NotNumeric {
            value: value.to_string(),
            conversion,
        })
    };

    let body = match conversion {
        '%' => return Ok("%".to_string()),
        's' => value.to_string(),
        'd' | 'i' => sign_prefix(d, numeric()?) + &format!("{}", numeric()?.abs() as i64),
        'u' => format!("{}", numeric()?.max(0.0) as u64),
        'f' | 'F' => {
            let precision = d.precision.unwrap_or(6);
            sign_prefix(d, numeric()?) + &format!("{:.*}", precision, numeric()?.abs())
        }
        'e' | 'E' => {
            let precision = d.precision.unwrap_or(6);
            let s = format!("{:.*e}", precision, numeric()?.abs());
            let s = if conversion == 'E' { s.to_uppercase() } else { s };
            sign_prefix(d, numeric()?) + &s
        }
        'x' => format!("{:x}", numeric()? as i64),
        'X' => format!("{:X}", numeric()? as i64),
        'o' => format!("{:o}", numeric()? as i64),
        other => return Err(FormatError::UnsupportedConversion(other)),
    };

    Ok(pad(d, body))
}

fn sign_prefix(d: &Directive, v: f64) -> String {
    if v < 0.0 {
        "-".to_string()
    } else if d.plus_sign {
        "+".to_string()
    } else if d.space_sign {
        " ".to_string()
    } else {
        String::new()
    }
}

fn pad(d: &Directive, body: String) -> String {
    if body.len() >= d.width {
        return body;
    }
    let fill = d.width - body.len();
    if d.left_justify {
        body + &" ".repeat(fill)
    } else if d.zero_pad {
        // zero padding goes between the sign and the digits
        if let Some(rest) = body.strip_prefix(['-', '+', ' ']) {
            let sign = &body[..body.len() - rest.len()];
            format!("{}{}{}", sign, "0".repeat(fill), rest)
        } else {
            format!("{}{}", "0".repeat(fill), body)
        }
    } else {
        " ".repeat(fill) + &body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(format: &str, v: f64) -> Result<String, FormatError> {
        format_value(format, &Value::Float(v))
    }

    #[test]
    fn test_fixed_decimal() {
        assert_eq!(fmt("%.2f", 3.14159).unwrap(), "3.14");
        assert_eq!(fmt("%.0f", 2.71).unwrap(), "3");
        assert_eq!(fmt("%f", 1.5).unwrap(), "1.500000");
    }

    #[test]
    fn test_width_and_flags() {
        assert_eq!(fmt("%8.2f", -3.14159).unwrap(), "   -3.14");
        assert_eq!(fmt("%08.2f", -3.14159).unwrap(), "-0003.14");
        assert_eq!(fmt("%-6d", 42.0).unwrap(), "42    ");
        assert_eq!(fmt("%+d", 42.0).unwrap(), "+42");
    }

    #[test]
    fn test_integer_and_hex() {
        assert_eq!(fmt("%d", 42.9).unwrap(), "42");
        assert_eq!(fmt("%x", 255.0).unwrap(), "ff");
        assert_eq!(fmt("%X", 255.0).unwrap(), "FF");
        assert_eq!(fmt("%o", 8.0).unwrap(), "10");
    }

    #[test]
    fn test_literals_and_percent() {
        assert_eq!(fmt("V=%.1f V", 12.35).unwrap(), "V=12.3 V");
        assert_eq!(fmt("%d%%", 50.0).unwrap(), "50%");
    }

    #[test]
    fn test_string_conversion() {
        let v = Value::Text("SAFE".into());
        assert_eq!(format_value("mode %s", &v).unwrap(), "mode SAFE");
    }

    #[test]
    fn test_malformed_formats() {
        assert!(matches!(fmt("%.2", 1.0), Err(FormatError::Truncated(_))));
        assert!(matches!(
            fmt("%q", 1.0),
            Err(FormatError::UnsupportedConversion('q'))
        ));
        let text = Value::Text("N/A".into());
        assert!(matches!(
            format_value("%.1f", &text),
            Err(FormatError::NotNumeric { .. })
        ));
    }
}

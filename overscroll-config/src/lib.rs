#[macro_use]
extern crate tracing;

use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use knuffel::errors::DecodeError;
use miette::{Context as _, IntoDiagnostic as _};

pub const DEFAULT_FRICTION_RATE: f64 = 0.25;
pub const DEFAULT_BOUNCE_ACCELERATION: f64 = 0.1;
pub const DEFAULT_SLOW_DOWN_DECELERATION: f64 = 0.3;

#[derive(knuffel::Decode, Debug, Default, Clone, PartialEq)]
pub struct Config {
    #[knuffel(child, default)]
    pub overscroll: Overscroll,
}

/// Tuning constants of the over-scroll gesture.
///
/// Accelerations are in offset units per millisecond squared.
#[derive(knuffel::Decode, Debug, Clone, Copy, PartialEq)]
pub struct Overscroll {
    #[knuffel(child, unwrap(argument), default = FloatOrInt(DEFAULT_FRICTION_RATE))]
    pub friction_rate: FloatOrInt<0, 1>,
    #[knuffel(child, unwrap(argument), default = FloatOrInt(DEFAULT_BOUNCE_ACCELERATION))]
    pub bounce_acceleration: FloatOrInt<0, 1000>,
    #[knuffel(child, unwrap(argument), default = FloatOrInt(DEFAULT_SLOW_DOWN_DECELERATION))]
    pub slow_down_deceleration: FloatOrInt<0, 1000>,
}

impl Default for Overscroll {
    fn default() -> Self {
        Self {
            friction_rate: FloatOrInt(DEFAULT_FRICTION_RATE),
            bounce_acceleration: FloatOrInt(DEFAULT_BOUNCE_ACCELERATION),
            slow_down_deceleration: FloatOrInt(DEFAULT_SLOW_DOWN_DECELERATION),
        }
    }
}

/// A float that can also be written as an integer in the config.
///
/// Accepted values lie in `(MIN, MAX]`, so every tuning constant is strictly positive.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FloatOrInt<const MIN: i32, const MAX: i32>(pub f64);

impl Config {
    pub fn parse(filename: &str, text: &str) -> Result<Self, knuffel::Error> {
        knuffel::parse(filename, text)
    }

    pub fn load(path: &Path) -> miette::Result<Self> {
        let contents = fs::read_to_string(path)
            .into_diagnostic()
            .with_context(|| format!("error reading {path:?}"))?;

        let filename = path
            .file_name()
            .and_then(OsStr::to_str)
            .unwrap_or("config.kdl");
        let config = Self::parse(filename, &contents).context("error parsing")?;
        debug!("loaded config from {path:?}");

        Ok(config)
    }
}

impl<S: knuffel::traits::ErrorSpan, const MIN: i32, const MAX: i32> knuffel::DecodeScalar<S>
    for FloatOrInt<MIN, MAX>
{
    fn type_check(
        type_name: &Option<knuffel::span::Spanned<knuffel::ast::TypeName, S>>,
        ctx: &mut knuffel::decode::Context<S>,
    ) {
        if let Some(type_name) = &type_name {
            ctx.emit_error(DecodeError::unexpected(
                type_name,
                "type name",
                "no type name expected for this node",
            ));
        }
    }

    fn raw_decode(
        val: &knuffel::span::Spanned<knuffel::ast::Literal, S>,
        ctx: &mut knuffel::decode::Context<S>,
    ) -> Result<Self, DecodeError<S>> {
        match &**val {
            knuffel::ast::Literal::Int(ref value) => match value.try_into() {
                Ok(v) => {
                    let v: i32 = v;
                    if MIN < v && v <= MAX {
                        Ok(FloatOrInt(f64::from(v)))
                    } else {
                        ctx.emit_error(DecodeError::conversion(
                            val,
                            format!("value must be greater than {MIN} and at most {MAX}"),
                        ));
                        Ok(FloatOrInt::default())
                    }
                }
                Err(e) => {
                    ctx.emit_error(DecodeError::conversion(val, e));
                    Ok(FloatOrInt::default())
                }
            },
            knuffel::ast::Literal::Decimal(ref value) => match value.try_into() {
                Ok(v) => {
                    let v: f64 = v;
                    if f64::from(MIN) < v && v <= f64::from(MAX) {
                        Ok(FloatOrInt(v))
                    } else {
                        ctx.emit_error(DecodeError::conversion(
                            val,
                            format!("value must be greater than {MIN} and at most {MAX}"),
                        ));
                        Ok(FloatOrInt::default())
                    }
                }
                Err(e) => {
                    ctx.emit_error(DecodeError::conversion(val, e));
                    Ok(FloatOrInt::default())
                }
            },
            _ => {
                ctx.emit_error(DecodeError::scalar_kind(
                    knuffel::decode::Kind::Decimal,
                    val,
                ));
                Ok(FloatOrInt::default())
            }
        }
    }
}

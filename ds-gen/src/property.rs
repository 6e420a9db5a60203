//! Synthesis of a single property value from its schema fragment.
//!
//! The schema language is loose: a fragment may declare a primitive `type`, a `oneOf`/`anyOf`
//! union, an `enum`, or nothing but a description. Fragments are classified into one shape
//! before any value is produced, and union branches are classified individually so that
//! relationship-shaped branches are never mistaken for something we can fill in here.
use chrono::{
    DateTime,
    SecondsFormat,
};
use ds_core::jsonutils::{
    contains_text,
    is_mixed_type,
    recursive_keys,
};
use md5::{
    Digest,
    Md5,
};
use rand::seq::SliceRandom;
use regex_syntax::hir::{
    Capture,
    Class,
    ClassUnicode,
    ClassUnicodeRange,
    Hir,
    HirKind,
    Repetition,
};
use regex_syntax::ParserBuilder;
use rand::Rng;
use serde_json::Value;
use tracing::debug;

use crate::errors::SimError;

/// Property that always receives an md5-style hex digest.
pub const CHECKSUM_PROPERTY: &str = "md5sum";

/// Description text marking a property as a timestamp.
const DATETIME_HINT: &str = "date and time of day";

/// Upper bound on repetitions when sampling `*`/`+` in a pattern.
const PATTERN_MAX_REPEAT: u32 = 8;

const STRING_LEN: usize = 10;
const DEFAULT_MIN: f64 = 0.0;
const DEFAULT_SPAN: f64 = 100.0;
const MAX_ARRAY_LEN: usize = 3;

// 2000-01-01T00:00:00Z .. 2030-01-01T00:00:00Z
const DATETIME_RANGE: std::ops::Range<i64> = 946_684_800..1_893_456_000;

/// Primitive JSON types the synthesizer can produce directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveType {
    /// A string, optionally constrained by a `pattern`.
    String,
    /// An integral number.
    Integer,
    /// A floating-point number.
    Number,
    /// `true` or `false`.
    Boolean,
}

impl PrimitiveType {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }
}

/// Classification of one `oneOf`/`anyOf` branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Branch {
    /// Looks like a reference to another record; those come from link resolution instead.
    LinkReference,
    /// Declares a primitive type.
    Primitive(PrimitiveType),
    /// Anything else.
    Unsupported,
}

impl Branch {
    /// Classify a union branch.
    pub fn classify(branch: &Value) -> Self {
        let keys = recursive_keys(branch);
        if ["id", "pattern", "term"].iter().all(|k| keys.contains(k)) {
            return Self::LinkReference;
        }
        match branch.get("type").and_then(declared_primitive) {
            Some(primitive) => Self::Primitive(primitive),
            None => Self::Unsupported,
        }
    }
}

/// Result of synthesizing one property.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// A value satisfying the fragment.
    Value(Value),
    /// Nothing in the fragment tells us how to build a value.
    Unsynthesizable,
    /// The fragment itself is defective (mixed-type enum, unusable pattern, ...).
    Defect(SimError),
}

/// Produce a value for `property` of `entity` from its schema fragment.
///
/// Rules are tried in order and the first applicable one wins: checksum name, declared
/// `type`, `oneOf`/`anyOf` union, `enum`, date-time description. A declared `type` that is
/// not primitive (and not an array of primitives) falls through to the later rules.
pub fn synthesize<R: Rng + ?Sized>(entity: &str, property: &str, schema: &Value, rng: &mut R) -> Outcome {
    if property == CHECKSUM_PROPERTY {
        return Outcome::Value(checksum(rng).into());
    }

    if let Some(declared) = schema.get("type") {
        if let Some(primitive) = declared_primitive(declared) {
            return primitive_value(entity, property, primitive, schema, rng);
        }
        if declared_names(declared).any(|t| t == "array") {
            if let Some(items) = schema.get("items") {
                return array_value(entity, property, items, rng);
            }
        }
    }

    if let Some(branches) = schema.get("oneOf").or_else(|| schema.get("anyOf")).and_then(Value::as_array) {
        for branch in branches {
            match Branch::classify(branch) {
                Branch::Primitive(primitive) => return primitive_value(entity, property, primitive, branch, rng),
                Branch::LinkReference => debug!(entity, property, "skipping link-shaped union branch"),
                Branch::Unsupported => (),
            }
        }
        return Outcome::Unsynthesizable;
    }

    if let Some(values) = schema.get("enum").and_then(Value::as_array) {
        return enum_value(entity, property, values, rng);
    }

    if is_datetime(schema) {
        return Outcome::Value(datetime(rng).into());
    }

    Outcome::Unsynthesizable
}

fn declared_names(declared: &Value) -> impl Iterator<Item = &str> {
    let names: Vec<&str> = match declared {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => vec![],
    };
    names.into_iter().filter(|name| *name != "null")
}

// `type` may be a single name or a list such as `["string", "null"]`.
fn declared_primitive(declared: &Value) -> Option<PrimitiveType> {
    declared_names(declared).next().and_then(PrimitiveType::parse)
}

fn is_datetime(schema: &Value) -> bool {
    schema.get("format").and_then(Value::as_str) == Some("date-time") || contains_text(schema, DATETIME_HINT)
}

fn primitive_value<R: Rng + ?Sized>(
    entity: &str,
    property: &str,
    primitive: PrimitiveType,
    schema: &Value,
    rng: &mut R,
) -> Outcome {
    match primitive {
        PrimitiveType::String => {
            if let Some(pattern) = schema.get("pattern").and_then(Value::as_str) {
                return match pattern_value(pattern, rng) {
                    Ok(s) => Outcome::Value(s.into()),
                    Err(err) => Outcome::Defect(SimError::schema(
                        entity,
                        format!("cannot generate `{property}` from pattern `{pattern}`: {err}"),
                    )),
                };
            }
            if is_datetime(schema) {
                return Outcome::Value(datetime(rng).into());
            }
            Outcome::Value(random_token(rng, STRING_LEN).into())
        },
        PrimitiveType::Integer | PrimitiveType::Number => {
            let Some((min, max)) = numeric_bounds(schema) else {
                return Outcome::Defect(SimError::schema(
                    entity,
                    format!("`{property}` has minimum above maximum in {schema}"),
                ));
            };
            if primitive == PrimitiveType::Integer {
                #[allow(clippy::cast_possible_truncation)]
                let (lo, hi) = (min.ceil() as i64, max.floor() as i64);
                if lo > hi {
                    return Outcome::Unsynthesizable;
                }
                Outcome::Value(rng.gen_range(lo..=hi).into())
            } else {
                Outcome::Value(number_value(min, max, rng).into())
            }
        },
        PrimitiveType::Boolean => Outcome::Value(rng.gen_bool(0.5).into()),
    }
}

// A single declared bound anchors a default-width range on its side. Only two declared,
// inverted bounds are unsatisfiable.
fn numeric_bounds(schema: &Value) -> Option<(f64, f64)> {
    let min = schema.get("minimum").and_then(Value::as_f64);
    let max = schema.get("maximum").and_then(Value::as_f64);
    let (min, max) = match (min, max) {
        (Some(min), Some(max)) => (min, max),
        (Some(min), None) => (min, min + DEFAULT_SPAN),
        (None, Some(max)) => (max - DEFAULT_SPAN, max),
        (None, None) => (DEFAULT_MIN, DEFAULT_MIN + DEFAULT_SPAN),
    };
    (min <= max).then_some((min, max))
}

fn number_value<R: Rng + ?Sized>(min: f64, max: f64, rng: &mut R) -> f64 {
    // `max - min` can overflow for bounds near f64::MAX; sample the halved range instead.
    let x = if (max - min).is_finite() {
        rng.gen_range(min..=max)
    } else {
        rng.gen_range(min / 2.0..=max / 2.0) * 2.0
    };
    let rounded = (x * 100.0).round() / 100.0;
    if rounded.is_finite() {
        rounded.clamp(min, max)
    } else {
        x
    }
}

fn array_value<R: Rng + ?Sized>(entity: &str, property: &str, items: &Value, rng: &mut R) -> Outcome {
    let len = rng.gen_range(1..=MAX_ARRAY_LEN);
    let mut values = Vec::with_capacity(len);
    for _ in 0..len {
        match synthesize(entity, property, items, rng) {
            Outcome::Value(v) => values.push(v),
            other => return other,
        }
    }
    Outcome::Value(Value::Array(values))
}

fn enum_value<R: Rng + ?Sized>(entity: &str, property: &str, values: &[Value], rng: &mut R) -> Outcome {
    if is_mixed_type(values) {
        return Outcome::Defect(SimError::schema(
            entity,
            format!("`{property}` has mixed datatype enum {}", Value::Array(values.to_vec())),
        ));
    }

    // `null` only says the property may be left out, so never pick it.
    let candidates: Vec<&Value> = values.iter().filter(|v| !v.is_null()).collect();
    match candidates.choose(rng) {
        Some(v) => Outcome::Value((*v).clone()),
        None => Outcome::Unsynthesizable,
    }
}

fn pattern_value<R: Rng + ?Sized>(pattern: &str, rng: &mut R) -> Result<String, String> {
    let mut body = pattern.strip_prefix('^').unwrap_or(pattern);
    if body.ends_with('$') && !body.ends_with("\\$") {
        body = &body[..body.len() - 1];
    }
    let hir = ParserBuilder::new().build().parse(body).map_err(|err| err.to_string())?;
    let generator = rand_regex::Regex::with_hir(printable_ascii(hir), PATTERN_MAX_REPEAT).map_err(|err| err.to_string())?;
    Ok(rng.sample::<String, _>(&generator))
}

// Dictionary patterns follow JSON Schema, where `\d` and `\w` are ASCII-only. Narrow every class
// to printable ASCII so generated values also match under those rules; a class with no ASCII
// members is kept as written.
fn printable_ascii(hir: Hir) -> Hir {
    match hir.into_kind() {
        HirKind::Class(Class::Unicode(class)) => {
            let mut narrowed = class.clone();
            narrowed.intersect(&ClassUnicode::new([ClassUnicodeRange::new(' ', '~')]));
            if narrowed.ranges().is_empty() {
                Hir::class(Class::Unicode(class))
            } else {
                Hir::class(Class::Unicode(narrowed))
            }
        },
        HirKind::Repetition(rep) => Hir::repetition(Repetition { sub: Box::new(printable_ascii(*rep.sub)), ..rep }),
        HirKind::Capture(cap) => Hir::capture(Capture { sub: Box::new(printable_ascii(*cap.sub)), ..cap }),
        HirKind::Concat(subs) => Hir::concat(subs.into_iter().map(printable_ascii).collect()),
        HirKind::Alternation(subs) => Hir::alternation(subs.into_iter().map(printable_ascii).collect()),
        HirKind::Class(class @ Class::Bytes(_)) => Hir::class(class),
        HirKind::Literal(lit) => Hir::literal(lit.0),
        HirKind::Look(look) => Hir::look(look),
        HirKind::Empty => Hir::empty(),
    }
}

/// Random alphanumeric token of `len` characters.
pub fn random_token<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len).map(|_| char::from(rng.sample(rand::distributions::Alphanumeric))).collect()
}

fn checksum<R: Rng + ?Sized>(rng: &mut R) -> String {
    let digest = Md5::digest(random_token(rng, 32).as_bytes());
    format!("{digest:x}")
}

fn datetime<R: Rng + ?Sized>(rng: &mut R) -> String {
    let secs = rng.gen_range(DATETIME_RANGE);
    DateTime::from_timestamp(secs, 0)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

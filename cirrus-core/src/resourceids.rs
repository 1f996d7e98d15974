//! Resource IDs - Formatting and parsing ARM resource paths
//!
//! Every ARM resource type has a fixed path template made of literal markers
//! (`resourceGroups`, `Microsoft.DBforMySQL`, `flexibleServers`) and
//! user-specified values. An ID type lists its template once as
//! [`ResourceIdentifier::SEGMENTS`] and gets `parse`/`id`/`validate` for free.
//!
//! Literal markers are matched case-sensitively. [`ResourceIdentifier::parse_insensitively`]
//! is the only entry point that tolerates casing drift, for IDs echoed back by
//! APIs that are known to rewrite them.

use std::collections::HashMap;

/// One segment of a resource ID template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// Literal marker such as `resourceGroups`
    Static(&'static str),
    /// Resource provider namespace such as `Microsoft.DBforMySQL`
    Provider(&'static str),
    /// Value supplied by the user
    User {
        /// Key of the value, e.g. `flexibleServerName`
        name: &'static str,
        /// Label used in descriptions, e.g. `Flexible Server Name`
        label: &'static str,
    },
}

impl Segment {
    pub const fn user(name: &'static str, label: &'static str) -> Self {
        Segment::User { name, label }
    }

    fn literal(&self) -> Option<&'static str> {
        match self {
            Segment::Static(value) | Segment::Provider(value) => Some(value),
            Segment::User { .. } => None,
        }
    }
}

/// Template rendered with placeholders, e.g. `/subscriptions/{subscriptionId}`
pub fn template(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        out.push('/');
        match segment {
            Segment::Static(value) | Segment::Provider(value) => out.push_str(value),
            Segment::User { name, .. } => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
        }
    }
    out
}

/// Why an input did not match a template
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseFailure {
    #[error("the ID was empty")]
    Empty,

    #[error("expected the segment {expected:?} at position {position} but got {found:?}")]
    UnexpectedSegment {
        position: usize,
        expected: &'static str,
        found: String,
    },

    #[error(
        "the segment {found:?} at position {position} only matches {expected:?} ignoring case, and segment names are case-sensitive"
    )]
    CaseMismatch {
        position: usize,
        expected: &'static str,
        found: String,
    },

    #[error("the segment {expected:?} was missing")]
    MissingSegment { expected: &'static str },

    #[error("the value for {name:?} was missing")]
    MissingValue { name: &'static str },

    #[error("the value for {name:?} was empty")]
    EmptyValue { name: &'static str },

    #[error("the segment {marker:?} appeared more than once")]
    DuplicateSegment { marker: &'static str },

    #[error("unexpected trailing segments {extra:?}")]
    TrailingSegments { extra: String },
}

/// Error returned when a string is not a valid ID of a given type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("parsing {input:?} as a {id_type} ID: {reason} (expected {template})")]
pub struct ResourceIdError {
    pub id_type: &'static str,
    pub input: String,
    pub template: String,
    pub reason: ParseFailure,
}

/// User-specified values extracted by a successful parse
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseResult {
    values: HashMap<&'static str, String>,
}

impl ParseResult {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Remove and return a value; every user segment is present after a successful parse
    pub fn take(&mut self, name: &str) -> String {
        self.values.remove(name).unwrap_or_default()
    }
}

/// Match `input` against `segments`
pub fn parse_segments(
    segments: &[Segment],
    input: &str,
    insensitively: bool,
) -> Result<ParseResult, ParseFailure> {
    if input.is_empty() {
        return Err(ParseFailure::Empty);
    }

    let trimmed = input.strip_prefix('/').unwrap_or(input);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    let parts: Vec<&str> = trimmed.split('/').collect();

    let mut result = ParseResult::default();
    for (position, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Static(expected) | Segment::Provider(expected) => {
                let Some(found) = parts.get(position) else {
                    return Err(ParseFailure::MissingSegment { expected });
                };
                if found == expected {
                    continue;
                }
                if found.eq_ignore_ascii_case(expected) {
                    if insensitively {
                        continue;
                    }
                    return Err(ParseFailure::CaseMismatch {
                        position,
                        expected,
                        found: found.to_string(),
                    });
                }
                return Err(ParseFailure::UnexpectedSegment {
                    position,
                    expected,
                    found: found.to_string(),
                });
            }
            Segment::User { name, .. } => match parts.get(position) {
                None => return Err(ParseFailure::MissingValue { name }),
                Some(value) if value.is_empty() => {
                    return Err(ParseFailure::EmptyValue { name });
                }
                Some(value) => {
                    result.values.insert(name, value.to_string());
                }
            },
        }
    }

    if parts.len() > segments.len() {
        let extra = &parts[segments.len()..];
        let repeated = segments.iter().filter_map(Segment::literal).find(|marker| {
            extra.iter().any(|part| {
                if insensitively {
                    part.eq_ignore_ascii_case(marker)
                } else {
                    part == marker
                }
            })
        });
        if let Some(marker) = repeated {
            return Err(ParseFailure::DuplicateSegment { marker });
        }
        return Err(ParseFailure::TrailingSegments {
            extra: extra.join("/"),
        });
    }

    Ok(result)
}

/// Render `values` (user segments, in template order) into an ID string
pub fn format_segments(segments: &[Segment], values: &[&str]) -> String {
    let mut out = String::new();
    let mut values = values.iter();
    for segment in segments {
        out.push('/');
        match segment.literal() {
            Some(literal) => out.push_str(literal),
            None => out.push_str(values.next().copied().unwrap_or_default()),
        }
    }
    out
}

/// A typed ARM resource ID
pub trait ResourceIdentifier: Sized {
    /// Human-readable type name, e.g. `Flexible Server`
    const ID_TYPE: &'static str;
    /// Path template
    const SEGMENTS: &'static [Segment];

    fn from_parse_result(parsed: ParseResult) -> Self;

    /// User-specified values in template order
    fn segment_values(&self) -> Vec<&str>;

    /// The ARM path for this ID
    fn id(&self) -> String {
        format_segments(Self::SEGMENTS, &self.segment_values())
    }

    fn parse(input: &str) -> Result<Self, ResourceIdError> {
        parse_as(input, false)
    }

    /// Parse tolerating casing differences in literal markers
    fn parse_insensitively(input: &str) -> Result<Self, ResourceIdError> {
        parse_as(input, true)
    }

    fn validate(input: &str) -> Result<(), ResourceIdError> {
        Self::parse(input).map(|_| ())
    }

    /// e.g. `Flexible Server (Subscription: "..", Resource Group Name: "..")`
    fn description(&self) -> String {
        let labels = Self::SEGMENTS.iter().filter_map(|segment| match segment {
            Segment::User { label, .. } => Some(*label),
            _ => None,
        });
        let fields: Vec<String> = labels
            .zip(self.segment_values())
            .map(|(label, value)| format!("{}: {:?}", label, value))
            .collect();
        format!("{} ({})", Self::ID_TYPE, fields.join(", "))
    }
}

fn parse_as<T: ResourceIdentifier>(input: &str, insensitively: bool) -> Result<T, ResourceIdError> {
    parse_segments(T::SEGMENTS, input, insensitively)
        .map(T::from_parse_result)
        .map_err(|reason| ResourceIdError {
            id_type: T::ID_TYPE,
            input: input.to_string(),
            template: template(T::SEGMENTS),
            reason,
        })
}

/// Defines an ID struct and its [`ResourceIdentifier`] impl
///
/// Fields are listed in the order their user segments appear in `segments`.
#[macro_export]
macro_rules! define_resource_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($id_type:literal) {
            $( $field:ident: $key:literal ),+ $(,)?
        }
        segments = [ $( $segment:expr ),+ $(,)? ];
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name {
            $( pub $field: String, )+
        }

        impl $name {
            #[allow(clippy::too_many_arguments)]
            pub fn new($( $field: impl Into<String> ),+) -> Self {
                Self {
                    $( $field: $field.into(), )+
                }
            }
        }

        impl $crate::resourceids::ResourceIdentifier for $name {
            const ID_TYPE: &'static str = $id_type;
            const SEGMENTS: &'static [$crate::resourceids::Segment] = &[ $( $segment ),+ ];

            fn from_parse_result(mut parsed: $crate::resourceids::ParseResult) -> Self {
                Self {
                    $( $field: parsed.take($key), )+
                }
            }

            fn segment_values(&self) -> Vec<&str> {
                vec![ $( self.$field.as_str() ),+ ]
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(&$crate::resourceids::ResourceIdentifier::id(self))
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::resourceids::ResourceIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <Self as $crate::resourceids::ResourceIdentifier>::parse(s)
            }
        }
    };
}

//! Parsing of the `mount` and `reserved` directives found in block name tags.
//!
//! ```text
//! mount <type>:<piece> <instance> [D:<dir>] [A:<x>:<y>:<z>] [AR:<rule>]
//!       [R:<nx>:<ny>:<nz>:<px>:<py>:<pz>] [shared] [optional]
//! reserved [NE:<x>:<y>:<z>] [PE:<x>:<y>:<z>] [shared] [optional]
//! ```
//!
//! Keywords and flags are case-insensitive; names are kept as written.

use alloc::string::{String, ToString as _};
use alloc::vec::Vec;

use arcstr::ArcStr;

use crate::descriptor::Extents;
use crate::math::{Face6, GridCoordinate, GridSizeCoord, GridVector};
use crate::part::AdjacencyRule;

/// A problem with one name tag or one token of it.
///
/// These are never fatal to loading a part: the offending token, mount block, or
/// reserved zone is skipped and the problem logged.
#[derive(Clone, Debug, displaydoc::Display, Eq, PartialEq)]
#[non_exhaustive]
pub enum TagError {
    /// mount tag has no `<type>:<piece>` token
    MissingMountType,
    /// `{0}` is not of the form `<type>:<piece>`
    MalformedMountType(String),
    /// mount tag has no instance name
    MissingInstance,
    /// unrecognized token `{0}`
    UnknownToken(String),
    /// malformed value in token `{0}`
    MalformedValue(String),
    /// unknown direction `{0}`
    UnknownDirection(String),
    /// mount {mount} has {count} anchor blocks, more than the maximum of {max}
    TooManyAnchors {
        /// Name of the mount.
        mount: String,
        /// How many blocks were found.
        count: usize,
        /// The maximum allowed.
        max: usize,
    },
    /// reserved zone has no extents and the block has no sensor field
    NoExtents,
}

impl core::error::Error for TagError {}

/// A parsed directive.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Directive {
    Mount(MountTag),
    Reserved(ReservedTag),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct MountTag {
    pub mount_type: ArcStr,
    pub piece: ArcStr,
    pub instance: ArcStr,
    pub direction: Option<Direction>,
    pub anchor_offset: Option<GridVector>,
    pub adjacency: AdjacencyRule,
    pub reserved: Option<Extents>,
    pub shared: bool,
    pub optional: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ReservedTag {
    pub negative: Option<[GridSizeCoord; 3]>,
    pub positive: Option<[GridSizeCoord; 3]>,
    pub shared: bool,
    pub optional: bool,
}

/// A facing override: either in the part's frame, or in the block's own frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Direction {
    Absolute(Face6),
    Relative(Face6),
}

/// Parses a name tag.
///
/// Returns `Ok(None)` if the tag is not a directive at all. Problems with individual
/// optional tokens are pushed to `ignored` and do not prevent a result.
pub(crate) fn parse_tag(
    tag: &str,
    ignored: &mut Vec<TagError>,
) -> Result<Option<Directive>, TagError> {
    let mut tokens = tag.split_whitespace();
    let Some(prefix) = tokens.next() else {
        return Ok(None);
    };
    if prefix.eq_ignore_ascii_case("mount") {
        parse_mount(tokens, ignored).map(|m| Some(Directive::Mount(m)))
    } else if prefix.eq_ignore_ascii_case("reserved") {
        Ok(Some(Directive::Reserved(parse_reserved(tokens, ignored))))
    } else {
        Ok(None)
    }
}

fn parse_mount<'a>(
    mut tokens: impl Iterator<Item = &'a str>,
    ignored: &mut Vec<TagError>,
) -> Result<MountTag, TagError> {
    let type_piece = tokens.next().ok_or(TagError::MissingMountType)?;
    let (mount_type, piece) = type_piece
        .split_once(':')
        .filter(|(t, p)| !t.is_empty() && !p.is_empty())
        .ok_or_else(|| TagError::MalformedMountType(type_piece.to_string()))?;
    let instance = tokens.next().ok_or(TagError::MissingInstance)?;

    let mut mount = MountTag {
        mount_type: mount_type.into(),
        piece: piece.into(),
        instance: instance.into(),
        direction: None,
        anchor_offset: None,
        adjacency: AdjacencyRule::Any,
        reserved: None,
        shared: false,
        optional: false,
    };

    for token in tokens {
        let (key, arg) = split_key(token);
        let result = match (key.as_str(), arg) {
            ("d", Some(value)) => parse_direction(value).map(|d| mount.direction = Some(d)),
            ("a", Some(value)) => parse_numbers::<GridCoordinate, 3>(token, value)
                .map(|[x, y, z]| mount.anchor_offset = Some(GridVector::new(x, y, z))),
            ("ar", Some(value)) => parse_adjacency(token, value).map(|r| mount.adjacency = r),
            ("r", Some(value)) => parse_numbers::<GridSizeCoord, 6>(token, value).map(
                |[nx, ny, nz, px, py, pz]| {
                    mount.reserved = Some(Extents {
                        negative: [nx, ny, nz],
                        positive: [px, py, pz],
                    });
                },
            ),
            ("shared", None) => {
                mount.shared = true;
                Ok(())
            }
            ("optional", None) => {
                mount.optional = true;
                Ok(())
            }
            _ => Err(TagError::UnknownToken(token.to_string())),
        };
        if let Err(e) = result {
            ignored.push(e);
        }
    }
    Ok(mount)
}

fn parse_reserved<'a>(
    tokens: impl Iterator<Item = &'a str>,
    ignored: &mut Vec<TagError>,
) -> ReservedTag {
    let mut reserved = ReservedTag::default();
    for token in tokens {
        let (key, arg) = split_key(token);
        let result = match (key.as_str(), arg) {
            ("ne", Some(value)) => {
                parse_numbers::<GridSizeCoord, 3>(token, value).map(|v| reserved.negative = Some(v))
            }
            ("pe", Some(value)) => {
                parse_numbers::<GridSizeCoord, 3>(token, value).map(|v| reserved.positive = Some(v))
            }
            ("shared", None) => {
                reserved.shared = true;
                Ok(())
            }
            ("optional", None) => {
                reserved.optional = true;
                Ok(())
            }
            _ => Err(TagError::UnknownToken(token.to_string())),
        };
        if let Err(e) = result {
            ignored.push(e);
        }
    }
    reserved
}

/// Splits `KEY:rest` into the lowercased key and the rest, or a flag into itself and
/// [`None`].
fn split_key(token: &str) -> (String, Option<&str>) {
    match token.split_once(':') {
        Some((key, value)) => (key.to_ascii_lowercase(), Some(value)),
        None => (token.to_ascii_lowercase(), None),
    }
}

fn parse_numbers<T: core::str::FromStr + Copy + Default, const N: usize>(
    token: &str,
    value: &str,
) -> Result<[T; N], TagError> {
    let malformed = || TagError::MalformedValue(token.to_string());
    let mut out = [T::default(); N];
    let mut parts = value.split(':');
    for slot in &mut out {
        *slot = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(malformed)?;
    }
    if parts.next().is_some() {
        return Err(malformed());
    }
    Ok(out)
}

fn parse_direction(value: &str) -> Result<Direction, TagError> {
    let relative = match value.to_ascii_lowercase().as_str() {
        "forward" => Some(Face6::NZ),
        "backward" => Some(Face6::PZ),
        "up" => Some(Face6::PY),
        "down" => Some(Face6::NY),
        "left" => Some(Face6::NX),
        "right" => Some(Face6::PX),
        _ => None,
    };
    if let Some(face) = relative {
        return Ok(Direction::Relative(face));
    }
    value
        .parse::<Face6>()
        .map(Direction::Absolute)
        .map_err(|_| TagError::UnknownDirection(value.to_string()))
}

fn parse_adjacency(token: &str, value: &str) -> Result<AdjacencyRule, TagError> {
    match value.to_ascii_lowercase().as_str() {
        "any" => Ok(AdjacencyRule::Any),
        "self-part" => Ok(AdjacencyRule::ExcludeSelfPart),
        "self-mount" => Ok(AdjacencyRule::ExcludeSelfMount),
        _ => Err(TagError::MalformedValue(token.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(tag: &str) -> (Result<Option<Directive>, TagError>, Vec<TagError>) {
        let mut ignored = Vec::new();
        let result = parse_tag(tag, &mut ignored);
        (result, ignored)
    }

    #[test]
    fn not_a_directive() {
        assert_eq!(parse("Cargo Container 3"), (Ok(None), vec![]));
        assert_eq!(parse(""), (Ok(None), vec![]));
    }

    #[test]
    fn minimal_mount() {
        let (result, ignored) = parse("mount dock:A 1");
        assert_eq!(ignored, vec![]);
        let Ok(Some(Directive::Mount(m))) = result else {
            panic!("{result:?}");
        };
        assert_eq!(
            (m.mount_type.as_str(), m.piece.as_str(), m.instance.as_str()),
            ("dock", "A", "1")
        );
        assert_eq!(m.direction, None);
        assert_eq!(m.adjacency, AdjacencyRule::Any);
    }

    #[test]
    fn full_mount() {
        let (result, ignored) = parse(
            "MOUNT corridor:male north D:up A:0:-1:2 AR:self-part R:1:2:3:4:5:6 shared optional",
        );
        assert_eq!(ignored, vec![]);
        assert_eq!(
            result,
            Ok(Some(Directive::Mount(MountTag {
                mount_type: "corridor".into(),
                piece: "male".into(),
                instance: "north".into(),
                direction: Some(Direction::Relative(Face6::PY)),
                anchor_offset: Some(GridVector::new(0, -1, 2)),
                adjacency: AdjacencyRule::ExcludeSelfPart,
                reserved: Some(Extents {
                    negative: [1, 2, 3],
                    positive: [4, 5, 6],
                }),
                shared: true,
                optional: true,
            })))
        );
    }

    #[test]
    fn absolute_direction() {
        let (result, _) = parse("mount dock:A 1 d:NX");
        let Ok(Some(Directive::Mount(m))) = result else {
            panic!("{result:?}");
        };
        assert_eq!(m.direction, Some(Direction::Absolute(Face6::NX)));
    }

    #[test]
    fn bad_tokens_are_ignored() {
        let (result, ignored) = parse("mount dock:A 1 A:1:2 D:sideways bogus AR:never");
        assert!(matches!(result, Ok(Some(Directive::Mount(_)))));
        assert_eq!(
            ignored,
            vec![
                TagError::MalformedValue("A:1:2".into()),
                TagError::UnknownDirection("sideways".into()),
                TagError::UnknownToken("bogus".into()),
                TagError::MalformedValue("AR:never".into()),
            ]
        );
    }

    #[test]
    fn malformed_mount_is_an_error() {
        assert_eq!(parse("mount").0, Err(TagError::MissingMountType));
        assert_eq!(
            parse("mount dock 1").0,
            Err(TagError::MalformedMountType("dock".into()))
        );
        assert_eq!(parse("mount dock:A").0, Err(TagError::MissingInstance));
    }

    #[test]
    fn reserved() {
        let (result, ignored) = parse("reserved NE:1:0:2 shared");
        assert_eq!(ignored, vec![]);
        assert_eq!(
            result,
            Ok(Some(Directive::Reserved(ReservedTag {
                negative: Some([1, 0, 2]),
                positive: None,
                shared: true,
                optional: false,
            })))
        );
    }
}

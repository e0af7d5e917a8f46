use core::ops::Range;

use nom::error::Error;
use nom::IResult;

/// A trait for frames that can be parsed out of a frame body.
pub trait FrameParse<'a>: Sized {
    /// Parse a frame body, without its length prefix.
    ///
    /// This is always run against exactly one whole body.
    fn parse_body(input: &'a [u8]) -> IResult<&'a [u8], Self>;
}

/// A possible result from [frame_parse()].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParseResult<I, O, E = Error<I>> {
    /// Frame parse result, alongside range where whole frame was located.
    Ok(Range<usize>, O),
    /// Range for full frame, original frame body, Error.
    ParseErr(Range<usize>, I, E),
    /// Not enough input for a whole frame yet.
    None,
}

impl<I, O, E> ParseResult<I, O, E> {
    pub fn ok(self) -> Option<O> {
        match self {
            Self::Ok(_, o) => Some(o),
            Self::ParseErr(_, _, _) => None,
            Self::None => None,
        }
    }

    pub fn range(&self) -> Option<&Range<usize>> {
        match self {
            Self::Ok(r, _) => Some(r),
            Self::ParseErr(r, _, _) => Some(r),
            Self::None => None,
        }
    }

    pub fn map<F, Op>(self, f: F) -> ParseResult<I, Op, E>
    where
        F: FnOnce(O) -> Op,
    {
        match self {
            Self::Ok(r, o) => ParseResult::Ok(r, f(o)),
            Self::ParseErr(r, body, err) => ParseResult::ParseErr(r, body, err),
            Self::None => ParseResult::None,
        }
    }
}

/// Take one length-prefixed frame body off the front of the input.
///
/// Streaming: short input is [nom::Err::Incomplete], never an error.
pub fn frame(input: &[u8]) -> IResult<&[u8], &[u8]> {
    nom::multi::length_data(nom::number::streaming::u8)(input)
}

/// Find a frame and parse its body.
///
/// Returns number of consumed bytes and Ok(..) on successful parse,
/// ParseErr(..) if the body didn't parse, and None if there is not yet a
/// complete frame. A frame handed to the body parser is always consumed,
/// whether or not it parsed.
pub fn frame_parse<'a, M>(input: &'a [u8]) -> (usize, ParseResult<&'a [u8], M>)
where
    M: FrameParse<'a>,
{
    let (rest, body) = match frame(input) {
        Ok(v) => v,
        // length_data on a complete slice can only be incomplete
        Err(_) => return (0, ParseResult::None),
    };

    let consumed = input.len() - rest.len();
    let r = 0..consumed;

    match nom::combinator::all_consuming(M::parse_body)(body) {
        Ok((_, result)) => (consumed, ParseResult::Ok(r, result)),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            (consumed, ParseResult::ParseErr(r, body, e))
        }
        Err(nom::Err::Incomplete(_)) => (
            consumed,
            ParseResult::ParseErr(
                r,
                body,
                Error {
                    input: body,
                    code: nom::error::ErrorKind::Complete,
                },
            ),
        ),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn frame_takes_prefix() {
        assert_eq!(frame(b"\x02abc"), Ok((&b"c"[..], &b"ab"[..])));
    }

    #[test]
    fn frame_empty_body() {
        assert_eq!(frame(b"\x00"), Ok((&b""[..], &b""[..])));
    }

    #[test]
    fn frame_incomplete() {
        assert!(matches!(frame(b""), Err(nom::Err::Incomplete(_))));
        assert!(matches!(frame(b"\x03ab"), Err(nom::Err::Incomplete(_))));
    }
}

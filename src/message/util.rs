use nom::error::{ErrorKind, ParseError};
use nom::{Err, IResult, InputLength, Parser};
use tinyvec::{Array, ArrayVec};

/// Apply `f` one or more times into a fixed-capacity ArrayVec.
#[inline(always)]
pub fn many1<I, O, E, F, A>(mut f: F) -> impl FnMut(I) -> IResult<I, ArrayVec<A>, E>
where
    I: Clone + InputLength,
    F: Parser<I, O, E>,
    E: ParseError<I>,
    A: Array<Item = O>,
{
    move |mut i: I| match f.parse(i.clone()) {
        Err(Err::Error(err)) => Err(Err::Error(E::append(i, ErrorKind::Many1, err))),
        Err(e) => Err(e),
        Ok((i1, o)) => {
            let mut acc = ArrayVec::default();
            acc.push(o);
            i = i1;

            loop {
                let len = i.input_len();
                match f.parse(i.clone()) {
                    Err(Err::Error(_)) => return Ok((i, acc)),
                    Err(e) => return Err(e),
                    Ok((i1, o)) => {
                        // infinite loop check: the parser must always consume
                        if i1.input_len() == len {
                            return Err(Err::Error(E::from_error_kind(i, ErrorKind::Many1)));
                        }

                        i = i1;
                        acc.push(o);
                    }
                }
            }
        }
    }
}

/// Big-endian 24-bit length field, as used throughout the handshake layer.
pub fn be_u24(input: &[u8]) -> IResult<&[u8], u32> {
    if input.len() < 3 {
        return Err(Err::Error(nom::error::Error::new(input, ErrorKind::Eof)));
    }
    let value = u32::from_be_bytes([0, input[0], input[1], input[2]]);
    Ok((&input[3..], value))
}

/// Append a big-endian 24-bit length field.
pub fn put_u24(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes()[1..]);
}

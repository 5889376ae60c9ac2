use nom::bytes::complete::take;
use nom::IResult;
use smallvec::SmallVec;

/// The Finished body: 12 bytes of PRF output proving possession of the
/// master secret and agreement on the transcript (RFC 5246 §7.4.9).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finished {
    pub verify_data: SmallVec<[u8; 12]>,
}

impl Finished {
    pub fn new(verify_data: &[u8]) -> Self {
        Finished {
            verify_data: SmallVec::from_slice(verify_data),
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], Finished> {
        let (input, verify_data) = take(12_usize)(input)?;
        Ok((
            input,
            Finished {
                verify_data: SmallVec::from_slice(verify_data),
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&self.verify_data);
    }
}

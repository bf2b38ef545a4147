use crate::error::InvalidMessage;
use crate::msgs::codec::{Codec, Reader};

/// The payload of a ChangeCipherSpec record: the single byte `1`.
#[derive(Debug)]
pub struct ChangeCipherSpecPayload;

impl Codec<'_> for ChangeCipherSpecPayload {
    fn encode(&self, bytes: &mut Vec<u8>) {
        bytes.push(0x01);
    }

    fn read(r: &mut Reader<'_>) -> Result<Self, InvalidMessage> {
        match (u8::read(r)?, r.any_left()) {
            (0x01, false) => Ok(Self),
            (0x01, true) => Err(InvalidMessage::TrailingData("ChangeCipherSpecPayload")),
            _ => Err(InvalidMessage::InvalidCcs),
        }
    }
}

use crate::enums::{AlertDescription, AlertLevel};
use crate::error::InvalidMessage;
use crate::msgs::codec::{Codec, Reader};

/// The two bytes of an alert record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertMessagePayload {
    pub level: AlertLevel,
    pub description: AlertDescription,
}

impl AlertMessagePayload {
    /// Whether this alert ends the connection.
    ///
    /// `close_notify` does, whatever level it is sent at.
    pub fn is_fatal(&self) -> bool {
        self.level != AlertLevel::Warning || self.description == AlertDescription::CloseNotify
    }
}

impl Codec<'_> for AlertMessagePayload {
    fn encode(&self, bytes: &mut Vec<u8>) {
        bytes.extend([u8::from(self.level), u8::from(self.description)]);
    }

    fn read(r: &mut Reader<'_>) -> Result<Self, InvalidMessage> {
        let alert = Self {
            level: AlertLevel::read(r)?,
            description: AlertDescription::read(r)?,
        };
        r.expect_empty("AlertMessagePayload")?;
        Ok(alert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(bytes: &[u8]) -> Result<AlertMessagePayload, InvalidMessage> {
        AlertMessagePayload::read(&mut Reader::init(bytes))
    }

    #[test]
    fn warnings_other_than_close_notify_are_not_fatal() {
        assert!(!alert(&[1, 100]).unwrap().is_fatal());
        assert!(alert(&[1, 0]).unwrap().is_fatal());
        assert!(alert(&[2, 40]).unwrap().is_fatal());
    }

    #[test]
    fn alerts_are_exactly_two_bytes() {
        assert!(alert(&[2]).is_err());
        assert!(alert(&[2, 40, 0]).is_err());
    }
}

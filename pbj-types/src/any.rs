use pbj::buffer::SliceCursor;
use pbj::error::{ParseFail, EncodeFail};
use pbj::message::Message;

use crate::{Any, Name};

use super::type_url::TypeUrl;

impl Any {
    /// Serializes the given message type `M` as [`Any`].
    pub fn from_msg<M>(msg: &M) -> Result<Self, EncodeFail>
    where
        M: Message + Name,
    {
        let type_url = M::type_url();
        let value = msg.to_bytes()?.to_vec();
        Ok(Any { type_url, value })
    }

    /// Decodes the given message type `M` from [`Any`], validating that it has the expected type
    /// URL.
    pub fn to_msg<M>(&self) -> Result<M, ParseFail>
    where
        M: Message + Name,
    {
        let expected_type_url = M::type_url();

        if let (Some(expected), Some(actual)) = (
            TypeUrl::new(&expected_type_url),
            TypeUrl::new(&self.type_url),
        ) {
            if expected == actual {
                let mut cursor = SliceCursor::new(self.value.clone().into());
                return M::parse(&mut cursor);
            }
        }

        Err(pbj::error::parse_fail_kind::Malformed::new(format!(
            "expected type URL \"{}\" (got: \"{}\")",
            expected_type_url, &self.type_url
        ))
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Duration, Timestamp};

    #[test]
    fn check_any_serialization() {
        let message = Timestamp::date(2000, 1, 1).unwrap();
        let any = Any::from_msg(&message).unwrap();
        assert_eq!(
            &any.type_url,
            "type.googleapis.com/google.protobuf.Timestamp"
        );

        let message2 = any.to_msg::<Timestamp>().unwrap();
        assert_eq!(message, message2);

        assert!(any.to_msg::<Duration>().is_err());
    }
}

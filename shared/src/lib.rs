pub mod game_state;
pub mod handshake;
pub mod peer_msg;

#[cfg(test)]
#[macro_export]
macro_rules! assert_encodes {
    ($message:expr, $expected:expr $(,)?) => {
        assert_eq!(String::from($message), $expected)
    };
}

#[cfg(test)]
#[macro_export]
macro_rules! assert_reads {
    ($input:expr, $expected:expr $(,)?) => {
        assert_eq!(
            $crate::peer_msg::MessageReader::new($input.as_bytes())
                .read_message()
                .unwrap(),
            $expected
        )
    };
}

#[cfg(test)]
#[macro_export]
macro_rules! assert_encode_and_back {
    ($message:expr $(,)?) => {
        assert_eq!(
            $crate::peer_msg::MessageReader::new(String::from($message.clone()).as_bytes())
                .read_message()
                .unwrap(),
            $message
        )
    };
}

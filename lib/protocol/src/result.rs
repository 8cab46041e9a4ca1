/// Outcome carried on nearly every server-to-client reply.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ResultCode {
    Ok = 0,
    Fail = 1,
    AuthFail = 2,
    Invalid = 3,
    NotFound = 4,
    Already = 5,
    ServerError = 6,
}

impl ResultCode {
    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn from_u8(v: u8) -> Option<ResultCode> {
        Some(match v {
            0 => ResultCode::Ok,
            1 => ResultCode::Fail,
            2 => ResultCode::AuthFail,
            3 => ResultCode::Invalid,
            4 => ResultCode::NotFound,
            5 => ResultCode::Already,
            6 => ResultCode::ServerError,
            _ => return None,
        })
    }
}

//! Packet catalog: type codes and payload structs for every message exchanged
//! between client and server.

use crate::result::ResultCode;
use crate::wire::{DecodeResult, Reader, Writer};

macro_rules! packet_type_table {
    ($($name:ident = $code:expr),+ $(,)?) => {
        /// Wire type code for every packet kind.
        #[derive(Debug, Clone, Copy, Eq, PartialEq)]
        pub enum PacketType {
            $($name),+
        }

        impl PacketType {
            #[inline]
            pub fn code(self) -> u16 {
                match self {
                    $(PacketType::$name => $code),+
                }
            }

            #[inline]
            pub fn from_code(code: u16) -> Option<PacketType> {
                match code {
                    $($code => Some(PacketType::$name)),+,
                    _ => None,
                }
            }
        }
    };
}

packet_type_table! {
    C2SRegister = 0x0101,
    S2CRegisterResult = 0x0102,
    C2SLogin = 0x0103,
    S2CLoginResult = 0x0104,
    C2SLogout = 0x0105,
    S2CLogoutAck = 0x0106,

    C2SCreateRoom = 0x0201,
    S2CCreateRoomResult = 0x0202,
    C2SLeaveRoom = 0x0203,
    S2CLeaveRoomAck = 0x0204,
    S2CPlayerLeftNotification = 0x0205,
    C2SRequestOnlineList = 0x0206,
    S2COnlineList = 0x0207,
    C2SKickPlayer = 0x0208,
    S2CKickResult = 0x0209,

    C2SSendInvite = 0x0301,
    S2CInviteReceived = 0x0302,
    C2SRespondInvite = 0x0303,
    S2CInviteResponse = 0x0304,

    C2SSetReady = 0x0401,
    S2CPlayerReadyUpdate = 0x0402,
    C2SStartGame = 0x0403,
    S2CGameStart = 0x0404,

    C2SGuessChar = 0x0501,
    S2CGuessCharResult = 0x0502,
    C2SGuessWord = 0x0503,
    S2CGuessWordResult = 0x0504,
    C2SRequestDraw = 0x0505,
    S2CDrawRequest = 0x0506,
    C2SEndGame = 0x0507,
    S2CGameEnd = 0x0508,
    C2SRequestSummary = 0x0509,
    S2CGameSummary = 0x050A,

    C2SRequestHistory = 0x0601,
    S2CHistoryList = 0x0602,
    C2SRequestLeaderboard = 0x0603,
    S2CLeaderboard = 0x0604,

    S2CError = 0x0FFE,
    S2CAck = 0x0FFF,
}

/// A packet that knows its own wire type and how to encode/decode its payload.
pub trait Packet: Sized {
    const TYPE: PacketType;

    fn encode_payload(&self, w: &mut Writer);
    fn decode_payload(r: &mut Reader) -> DecodeResult<Self>;

    fn encode(&self) -> (u16, Vec<u8>) {
        let mut w = Writer::new();
        self.encode_payload(&mut w);
        (Self::TYPE.code(), w.into_bytes())
    }

    fn decode(payload: &[u8]) -> DecodeResult<Self> {
        let mut r = Reader::new(payload);
        Self::decode_payload(&mut r)
    }
}

#[inline]
fn rc(code: u8) -> ResultCode {
    ResultCode::from_u8(code).unwrap_or(ResultCode::ServerError)
}

// ---- 0x01xx: auth ----

#[derive(Debug, Clone, PartialEq)]
pub struct C2SRegister {
    pub username: String,
    pub password: String,
}

impl Packet for C2SRegister {
    const TYPE: PacketType = PacketType::C2SRegister;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_str(&self.username).put_str(&self.password);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(C2SRegister {
            username: r.get_str()?,
            password: r.get_str()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct S2CRegisterResult {
    pub code: ResultCode,
    pub message: String,
}

impl Packet for S2CRegisterResult {
    const TYPE: PacketType = PacketType::S2CRegisterResult;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_u8(self.code.as_u8()).put_str(&self.message);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(S2CRegisterResult {
            code: rc(r.get_u8()?),
            message: r.get_str()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct C2SLogin {
    pub username: String,
    pub password: String,
}

impl Packet for C2SLogin {
    const TYPE: PacketType = PacketType::C2SLogin;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_str(&self.username).put_str(&self.password);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(C2SLogin {
            username: r.get_str()?,
            password: r.get_str()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct S2CLoginResult {
    pub code: ResultCode,
    pub message: String,
    pub session_token: String,
    pub num_of_wins: u32,
    pub total_points: u32,
}

impl Packet for S2CLoginResult {
    const TYPE: PacketType = PacketType::S2CLoginResult;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_u8(self.code.as_u8())
            .put_str(&self.message)
            .put_str(&self.session_token)
            .put_u32(self.num_of_wins)
            .put_u32(self.total_points);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(S2CLoginResult {
            code: rc(r.get_u8()?),
            message: r.get_str()?,
            session_token: r.get_str()?,
            num_of_wins: r.get_u32()?,
            total_points: r.get_u32()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct C2SLogout {
    pub session_token: String,
}

impl Packet for C2SLogout {
    const TYPE: PacketType = PacketType::C2SLogout;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_str(&self.session_token);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(C2SLogout {
            session_token: r.get_str()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct S2CLogoutAck {
    pub code: ResultCode,
    pub message: String,
}

impl Packet for S2CLogoutAck {
    const TYPE: PacketType = PacketType::S2CLogoutAck;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_u8(self.code.as_u8()).put_str(&self.message);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(S2CLogoutAck {
            code: rc(r.get_u8()?),
            message: r.get_str()?,
        })
    }
}

// ---- 0x02xx: rooms ----

#[derive(Debug, Clone, PartialEq)]
pub struct C2SCreateRoom {
    pub token: String,
    pub room_name: String,
}

impl Packet for C2SCreateRoom {
    const TYPE: PacketType = PacketType::C2SCreateRoom;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_str(&self.token).put_str(&self.room_name);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(C2SCreateRoom {
            token: r.get_str()?,
            room_name: r.get_str()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct S2CCreateRoomResult {
    pub code: ResultCode,
    pub message: String,
    pub room_id: u32,
}

impl Packet for S2CCreateRoomResult {
    const TYPE: PacketType = PacketType::S2CCreateRoomResult;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_u8(self.code.as_u8())
            .put_str(&self.message)
            .put_u32(self.room_id);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(S2CCreateRoomResult {
            code: rc(r.get_u8()?),
            message: r.get_str()?,
            room_id: r.get_u32()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct C2SLeaveRoom {
    pub token: String,
    pub room_id: u32,
}

impl Packet for C2SLeaveRoom {
    const TYPE: PacketType = PacketType::C2SLeaveRoom;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_str(&self.token).put_u32(self.room_id);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(C2SLeaveRoom {
            token: r.get_str()?,
            room_id: r.get_u32()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct S2CLeaveRoomAck {
    pub code: ResultCode,
    pub message: String,
}

impl Packet for S2CLeaveRoomAck {
    const TYPE: PacketType = PacketType::S2CLeaveRoomAck;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_u8(self.code.as_u8()).put_str(&self.message);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(S2CLeaveRoomAck {
            code: rc(r.get_u8()?),
            message: r.get_str()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct S2CPlayerLeftNotification {
    pub username: String,
    pub is_new_host: bool,
    pub message: String,
}

impl Packet for S2CPlayerLeftNotification {
    const TYPE: PacketType = PacketType::S2CPlayerLeftNotification;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_str(&self.username)
            .put_bool(self.is_new_host)
            .put_str(&self.message);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(S2CPlayerLeftNotification {
            username: r.get_str()?,
            is_new_host: r.get_bool()?,
            message: r.get_str()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct C2SRequestOnlineList {
    pub token: String,
}

impl Packet for C2SRequestOnlineList {
    const TYPE: PacketType = PacketType::C2SRequestOnlineList;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_str(&self.token);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(C2SRequestOnlineList {
            token: r.get_str()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct S2COnlineList {
    pub usernames: Vec<String>,
}

impl Packet for S2COnlineList {
    const TYPE: PacketType = PacketType::S2COnlineList;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_list(&self.usernames, |w, item| {
            w.put_str(item);
        });
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(S2COnlineList {
            usernames: r.get_list(|r| r.get_str())?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct C2SKickPlayer {
    pub token: String,
    pub room_id: u32,
    pub target_username: String,
}

impl Packet for C2SKickPlayer {
    const TYPE: PacketType = PacketType::C2SKickPlayer;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_str(&self.token)
            .put_u32(self.room_id)
            .put_str(&self.target_username);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(C2SKickPlayer {
            token: r.get_str()?,
            room_id: r.get_u32()?,
            target_username: r.get_str()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct S2CKickResult {
    pub code: ResultCode,
    pub message: String,
    pub target_username: String,
}

impl Packet for S2CKickResult {
    const TYPE: PacketType = PacketType::S2CKickResult;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_u8(self.code.as_u8())
            .put_str(&self.message)
            .put_str(&self.target_username);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(S2CKickResult {
            code: rc(r.get_u8()?),
            message: r.get_str()?,
            target_username: r.get_str()?,
        })
    }
}

// ---- 0x03xx: invites ----

#[derive(Debug, Clone, PartialEq)]
pub struct C2SSendInvite {
    pub token: String,
    pub target_username: String,
    pub room_id: u32,
}

impl Packet for C2SSendInvite {
    const TYPE: PacketType = PacketType::C2SSendInvite;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_str(&self.token)
            .put_str(&self.target_username)
            .put_u32(self.room_id);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(C2SSendInvite {
            token: r.get_str()?,
            target_username: r.get_str()?,
            room_id: r.get_u32()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct S2CInviteReceived {
    pub from_username: String,
    pub room_id: u32,
    pub room_name: String,
}

impl Packet for S2CInviteReceived {
    const TYPE: PacketType = PacketType::S2CInviteReceived;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_str(&self.from_username)
            .put_u32(self.room_id)
            .put_str(&self.room_name);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(S2CInviteReceived {
            from_username: r.get_str()?,
            room_id: r.get_u32()?,
            room_name: r.get_str()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct C2SRespondInvite {
    pub token: String,
    pub from_username: String,
    pub accept: bool,
}

impl Packet for C2SRespondInvite {
    const TYPE: PacketType = PacketType::C2SRespondInvite;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_str(&self.token)
            .put_str(&self.from_username)
            .put_bool(self.accept);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(C2SRespondInvite {
            token: r.get_str()?,
            from_username: r.get_str()?,
            accept: r.get_bool()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct S2CInviteResponse {
    pub to_username: String,
    pub accepted: bool,
    pub message: String,
}

impl Packet for S2CInviteResponse {
    const TYPE: PacketType = PacketType::S2CInviteResponse;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_str(&self.to_username)
            .put_bool(self.accepted)
            .put_str(&self.message);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(S2CInviteResponse {
            to_username: r.get_str()?,
            accepted: r.get_bool()?,
            message: r.get_str()?,
        })
    }
}

// ---- 0x04xx: readiness / start ----

#[derive(Debug, Clone, PartialEq)]
pub struct C2SSetReady {
    pub token: String,
    pub room_id: u32,
    pub ready: bool,
}

impl Packet for C2SSetReady {
    const TYPE: PacketType = PacketType::C2SSetReady;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_str(&self.token).put_u32(self.room_id).put_bool(self.ready);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(C2SSetReady {
            token: r.get_str()?,
            room_id: r.get_u32()?,
            ready: r.get_bool()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct S2CPlayerReadyUpdate {
    pub username: String,
    pub ready: bool,
}

impl Packet for S2CPlayerReadyUpdate {
    const TYPE: PacketType = PacketType::S2CPlayerReadyUpdate;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_str(&self.username).put_bool(self.ready);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(S2CPlayerReadyUpdate {
            username: r.get_str()?,
            ready: r.get_bool()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct C2SStartGame {
    pub token: String,
    pub room_id: u32,
}

impl Packet for C2SStartGame {
    const TYPE: PacketType = PacketType::C2SStartGame;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_str(&self.token).put_u32(self.room_id);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(C2SStartGame {
            token: r.get_str()?,
            room_id: r.get_u32()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct S2CGameStart {
    pub room_id: u32,
    pub opponent_username: String,
    pub word_length: u32,
    pub current_round: u8,
}

impl Packet for S2CGameStart {
    const TYPE: PacketType = PacketType::S2CGameStart;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_u32(self.room_id)
            .put_str(&self.opponent_username)
            .put_u32(self.word_length)
            .put_u8(self.current_round);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(S2CGameStart {
            room_id: r.get_u32()?,
            opponent_username: r.get_str()?,
            word_length: r.get_u32()?,
            current_round: r.get_u8()?,
        })
    }
}

// ---- 0x05xx: match play ----

#[derive(Debug, Clone, PartialEq)]
pub struct C2SGuessChar {
    pub token: String,
    pub room_id: u32,
    pub match_id: u32,
    pub ch: u8,
}

impl Packet for C2SGuessChar {
    const TYPE: PacketType = PacketType::C2SGuessChar;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_str(&self.token)
            .put_u32(self.room_id)
            .put_u32(self.match_id)
            .put_u8(self.ch);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(C2SGuessChar {
            token: r.get_str()?,
            room_id: r.get_u32()?,
            match_id: r.get_u32()?,
            ch: r.get_u8()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct S2CGuessCharResult {
    pub correct: bool,
    pub exposed_pattern: String,
    pub remaining_attempts: u8,
    pub score_gained: u32,
    pub total_score: u32,
    pub current_round: u8,
    pub is_your_turn: bool,
}

impl Packet for S2CGuessCharResult {
    const TYPE: PacketType = PacketType::S2CGuessCharResult;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_bool(self.correct)
            .put_str(&self.exposed_pattern)
            .put_u8(self.remaining_attempts)
            .put_u32(self.score_gained)
            .put_u32(self.total_score)
            .put_u8(self.current_round)
            .put_bool(self.is_your_turn);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(S2CGuessCharResult {
            correct: r.get_bool()?,
            exposed_pattern: r.get_str()?,
            remaining_attempts: r.get_u8()?,
            score_gained: r.get_u32()?,
            total_score: r.get_u32()?,
            current_round: r.get_u8()?,
            is_your_turn: r.get_bool()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct C2SGuessWord {
    pub token: String,
    pub room_id: u32,
    pub match_id: u32,
    pub word: String,
}

impl Packet for C2SGuessWord {
    const TYPE: PacketType = PacketType::C2SGuessWord;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_str(&self.token)
            .put_u32(self.room_id)
            .put_u32(self.match_id)
            .put_str(&self.word);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(C2SGuessWord {
            token: r.get_str()?,
            room_id: r.get_u32()?,
            match_id: r.get_u32()?,
            word: r.get_str()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct S2CGuessWordResult {
    pub correct: bool,
    pub message: String,
    pub remaining_attempts: u8,
    pub score_gained: u32,
    pub total_score: u32,
    pub current_round: u8,
    pub round_complete: bool,
    pub next_word_pattern: String,
    pub is_your_turn: bool,
}

impl Packet for S2CGuessWordResult {
    const TYPE: PacketType = PacketType::S2CGuessWordResult;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_bool(self.correct)
            .put_str(&self.message)
            .put_u8(self.remaining_attempts)
            .put_u32(self.score_gained)
            .put_u32(self.total_score)
            .put_u8(self.current_round)
            .put_bool(self.round_complete)
            .put_str(&self.next_word_pattern)
            .put_bool(self.is_your_turn);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(S2CGuessWordResult {
            correct: r.get_bool()?,
            message: r.get_str()?,
            remaining_attempts: r.get_u8()?,
            score_gained: r.get_u32()?,
            total_score: r.get_u32()?,
            current_round: r.get_u8()?,
            round_complete: r.get_bool()?,
            next_word_pattern: r.get_str()?,
            is_your_turn: r.get_bool()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct C2SRequestDraw {
    pub token: String,
    pub room_id: u32,
    pub match_id: u32,
}

impl Packet for C2SRequestDraw {
    const TYPE: PacketType = PacketType::C2SRequestDraw;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_str(&self.token).put_u32(self.room_id).put_u32(self.match_id);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(C2SRequestDraw {
            token: r.get_str()?,
            room_id: r.get_u32()?,
            match_id: r.get_u32()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct S2CDrawRequest {
    pub from_username: String,
    pub match_id: u32,
}

impl Packet for S2CDrawRequest {
    const TYPE: PacketType = PacketType::S2CDrawRequest;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_str(&self.from_username).put_u32(self.match_id);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(S2CDrawRequest {
            from_username: r.get_str()?,
            match_id: r.get_u32()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct C2SEndGame {
    pub token: String,
    pub room_id: u32,
    pub match_id: u32,
    pub result_code: u8,
    pub message: String,
}

impl Packet for C2SEndGame {
    const TYPE: PacketType = PacketType::C2SEndGame;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_str(&self.token)
            .put_u32(self.room_id)
            .put_u32(self.match_id)
            .put_u8(self.result_code)
            .put_str(&self.message);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(C2SEndGame {
            token: r.get_str()?,
            room_id: r.get_u32()?,
            match_id: r.get_u32()?,
            result_code: r.get_u8()?,
            message: r.get_str()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct S2CGameEnd {
    pub match_id: u32,
    pub result_code: u8,
    pub summary: String,
}

impl Packet for S2CGameEnd {
    const TYPE: PacketType = PacketType::S2CGameEnd;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_u32(self.match_id).put_u8(self.result_code).put_str(&self.summary);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(S2CGameEnd {
            match_id: r.get_u32()?,
            result_code: r.get_u8()?,
            summary: r.get_str()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct C2SRequestSummary {
    pub token: String,
    pub room_id: u32,
    pub match_id: u32,
}

impl Packet for C2SRequestSummary {
    const TYPE: PacketType = PacketType::C2SRequestSummary;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_str(&self.token).put_u32(self.room_id).put_u32(self.match_id);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(C2SRequestSummary {
            token: r.get_str()?,
            room_id: r.get_u32()?,
            match_id: r.get_u32()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct S2CGameSummary {
    pub match_id: u32,
    pub player1: String,
    pub player2: String,
    pub r1_p1: u32,
    pub r2_p1: u32,
    pub r3_p1: u32,
    pub r1_p2: u32,
    pub r2_p2: u32,
    pub r3_p2: u32,
    pub total_p1: u32,
    pub total_p2: u32,
    /// Empty when the match ended in a draw.
    pub winner_username: String,
}

impl Packet for S2CGameSummary {
    const TYPE: PacketType = PacketType::S2CGameSummary;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_u32(self.match_id)
            .put_str(&self.player1)
            .put_str(&self.player2)
            .put_u32(self.r1_p1)
            .put_u32(self.r2_p1)
            .put_u32(self.r3_p1)
            .put_u32(self.r1_p2)
            .put_u32(self.r2_p2)
            .put_u32(self.r3_p2)
            .put_u32(self.total_p1)
            .put_u32(self.total_p2)
            .put_str(&self.winner_username);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(S2CGameSummary {
            match_id: r.get_u32()?,
            player1: r.get_str()?,
            player2: r.get_str()?,
            r1_p1: r.get_u32()?,
            r2_p1: r.get_u32()?,
            r3_p1: r.get_u32()?,
            r1_p2: r.get_u32()?,
            r2_p2: r.get_u32()?,
            r3_p2: r.get_u32()?,
            total_p1: r.get_u32()?,
            total_p2: r.get_u32()?,
            winner_username: r.get_str()?,
        })
    }
}

// ---- 0x06xx: history / leaderboard ----

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub datetime: String,
    pub opponent: String,
    /// 0 = lose, 1 = win, 2 = draw.
    pub result: u8,
    pub r1: u32,
    pub r2: u32,
    pub r3: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct C2SRequestHistory {
    pub token: String,
}

impl Packet for C2SRequestHistory {
    const TYPE: PacketType = PacketType::C2SRequestHistory;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_str(&self.token);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(C2SRequestHistory {
            token: r.get_str()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct S2CHistoryList {
    pub entries: Vec<HistoryEntry>,
}

impl Packet for S2CHistoryList {
    const TYPE: PacketType = PacketType::S2CHistoryList;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_list(&self.entries, |w, e| {
            w.put_str(&e.datetime)
                .put_str(&e.opponent)
                .put_u8(e.result)
                .put_u32(e.r1)
                .put_u32(e.r2)
                .put_u32(e.r3);
        });
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(S2CHistoryList {
            entries: r.get_list(|r| {
                Ok(HistoryEntry {
                    datetime: r.get_str()?,
                    opponent: r.get_str()?,
                    result: r.get_u8()?,
                    r1: r.get_u32()?,
                    r2: r.get_u32()?,
                    r3: r.get_u32()?,
                })
            })?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardRow {
    pub username: String,
    pub wins: u32,
    pub total_points: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct C2SRequestLeaderboard {
    pub token: String,
}

impl Packet for C2SRequestLeaderboard {
    const TYPE: PacketType = PacketType::C2SRequestLeaderboard;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_str(&self.token);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(C2SRequestLeaderboard {
            token: r.get_str()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct S2CLeaderboard {
    pub rows: Vec<LeaderboardRow>,
}

impl Packet for S2CLeaderboard {
    const TYPE: PacketType = PacketType::S2CLeaderboard;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_list(&self.rows, |w, row| {
            w.put_str(&row.username).put_u32(row.wins).put_u32(row.total_points);
        });
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(S2CLeaderboard {
            rows: r.get_list(|r| {
                Ok(LeaderboardRow {
                    username: r.get_str()?,
                    wins: r.get_u32()?,
                    total_points: r.get_u32()?,
                })
            })?,
        })
    }
}

// ---- generic ----

#[derive(Debug, Clone, PartialEq)]
pub struct S2CAck {
    pub ack_for_type: u16,
    pub code: ResultCode,
    pub message: String,
}

impl Packet for S2CAck {
    const TYPE: PacketType = PacketType::S2CAck;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_u16(self.ack_for_type)
            .put_u8(self.code.as_u8())
            .put_str(&self.message);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(S2CAck {
            ack_for_type: r.get_u16()?,
            code: rc(r.get_u8()?),
            message: r.get_str()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct S2CError {
    pub for_type: u16,
    pub message: String,
}

impl Packet for S2CError {
    const TYPE: PacketType = PacketType::S2CError;

    fn encode_payload(&self, w: &mut Writer) {
        w.put_u16(self.for_type).put_str(&self.message);
    }

    fn decode_payload(r: &mut Reader) -> DecodeResult<Self> {
        Ok(S2CError {
            for_type: r.get_u16()?,
            message: r.get_str()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_result_round_trips() {
        let pkt = S2CLoginResult {
            code: ResultCode::Ok,
            message: "welcome".into(),
            session_token: "alice_1700000000_123456".into(),
            num_of_wins: 4,
            total_points: 120,
        };
        let (code, bytes) = pkt.encode();
        assert_eq!(code, PacketType::S2CLoginResult.code());
        let decoded = S2CLoginResult::decode(&bytes).unwrap();
        assert_eq!(decoded, pkt);
    }

    #[test]
    fn guess_char_result_round_trips() {
        let pkt = S2CGuessCharResult {
            correct: true,
            exposed_pattern: "G _ M E".into(),
            remaining_attempts: 5,
            score_gained: 10,
            total_score: 10,
            current_round: 1,
            is_your_turn: false,
        };
        let bytes = pkt.encode().1;
        assert_eq!(S2CGuessCharResult::decode(&bytes).unwrap(), pkt);
    }

    #[test]
    fn type_code_round_trips() {
        assert_eq!(
            PacketType::from_code(PacketType::C2SGuessWord.code()),
            Some(PacketType::C2SGuessWord)
        );
        assert_eq!(PacketType::from_code(0xDEAD), None);
    }
}

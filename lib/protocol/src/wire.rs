//! Big-endian primitive encode/decode helpers shared by every packet payload.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Cursor};

pub type DecodeResult<T> = Result<T, DecodeError>;

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("unexpected end of payload")]
    Truncated,
    #[error("payload contained invalid utf-8")]
    InvalidUtf8,
}

impl From<io::Error> for DecodeError {
    fn from(_: io::Error) -> Self {
        DecodeError::Truncated
    }
}

pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    #[inline]
    pub fn new() -> Writer {
        Writer { buf: Vec::new() }
    }

    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    #[inline]
    pub fn put_u8(&mut self, v: u8) -> &mut Self {
        self.buf.write_u8(v).unwrap();
        self
    }

    #[inline]
    pub fn put_bool(&mut self, v: bool) -> &mut Self {
        self.put_u8(v as u8)
    }

    #[inline]
    pub fn put_u16(&mut self, v: u16) -> &mut Self {
        self.buf.write_u16::<BigEndian>(v).unwrap();
        self
    }

    #[inline]
    pub fn put_u32(&mut self, v: u32) -> &mut Self {
        self.buf.write_u32::<BigEndian>(v).unwrap();
        self
    }

    #[inline]
    pub fn put_str(&mut self, v: &str) -> &mut Self {
        let bytes = v.as_bytes();
        self.put_u16(bytes.len() as u16);
        self.buf.extend_from_slice(bytes);
        self
    }

    #[inline]
    pub fn put_list<T, F: Fn(&mut Writer, &T)>(&mut self, items: &[T], write_item: F) -> &mut Self {
        self.put_u16(items.len() as u16);
        for item in items {
            write_item(self, item);
        }
        self
    }
}

impl Default for Writer {
    fn default() -> Self {
        Writer::new()
    }
}

pub struct Reader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> Reader<'a> {
    #[inline]
    pub fn new(payload: &'a [u8]) -> Reader<'a> {
        Reader {
            cursor: Cursor::new(payload),
        }
    }

    #[inline]
    pub fn get_u8(&mut self) -> DecodeResult<u8> {
        Ok(self.cursor.read_u8()?)
    }

    #[inline]
    pub fn get_bool(&mut self) -> DecodeResult<bool> {
        Ok(self.get_u8()? != 0)
    }

    #[inline]
    pub fn get_u16(&mut self) -> DecodeResult<u16> {
        Ok(self.cursor.read_u16::<BigEndian>()?)
    }

    #[inline]
    pub fn get_u32(&mut self) -> DecodeResult<u32> {
        Ok(self.cursor.read_u32::<BigEndian>()?)
    }

    #[inline]
    pub fn get_str(&mut self) -> DecodeResult<String> {
        let len = self.get_u16()? as usize;
        let pos = self.cursor.position() as usize;
        let data = *self.cursor.get_ref();
        if pos + len > data.len() {
            return Err(DecodeError::Truncated);
        }
        let slice = &data[pos..pos + len];
        let s = std::str::from_utf8(slice)
            .map_err(|_| DecodeError::InvalidUtf8)?
            .to_owned();
        self.cursor.set_position((pos + len) as u64);
        Ok(s)
    }

    #[inline]
    pub fn get_list<T, F: Fn(&mut Reader) -> DecodeResult<T>>(
        &mut self,
        read_item: F,
    ) -> DecodeResult<Vec<T>> {
        let count = self.get_u16()? as usize;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(read_item(self)?);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_primitives() {
        let mut w = Writer::new();
        w.put_u8(7).put_bool(true).put_u16(1000).put_u32(70000).put_str("hi");
        let bytes = w.into_bytes();

        let mut r = Reader::new(&bytes);
        assert_eq!(r.get_u8().unwrap(), 7);
        assert_eq!(r.get_bool().unwrap(), true);
        assert_eq!(r.get_u16().unwrap(), 1000);
        assert_eq!(r.get_u32().unwrap(), 70000);
        assert_eq!(r.get_str().unwrap(), "hi");
    }

    #[test]
    fn round_trips_list() {
        let mut w = Writer::new();
        w.put_list(&["a".to_string(), "bb".to_string()], |w, item| {
            w.put_str(item);
        });
        let bytes = w.into_bytes();

        let mut r = Reader::new(&bytes);
        let items = r.get_list(|r| r.get_str()).unwrap();
        assert_eq!(items, vec!["a".to_string(), "bb".to_string()]);
    }

    #[test]
    fn truncated_string_errors() {
        let mut w = Writer::new();
        w.put_u16(10);
        let bytes = w.into_bytes();
        let mut r = Reader::new(&bytes);
        assert_eq!(r.get_str(), Err(DecodeError::Truncated));
    }
}

//! # 分帧策略模块
//!
//! 分帧决定了变长负载如何在定长的位通道中划定边界：
//!
//! * [`Terminated`]：负载之后追加 8 位终止符 `11111111`，用于隐藏任意长度的文本消息。
//! * [`LengthPrefixed`]：负载之前写入 8 位长度字段，用于隐藏较短的凭据字符串。
//!
//! 两种策略都只依赖 [`BitReader`]，不了解图像的解码与存储。

use std::fmt;

use tracing::debug;

use super::channel::{BitReader, BluePixel};
use crate::constants::{
    BITS_PER_BYTE, LENGTH_FIELD_BITS, MAX_PAYLOAD_LEN, TERMINATOR, TERMINATOR_BITS,
};
use crate::error::{Result, StegoError};

/// 由负载生成、由位通道消费的有序位序列。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitStream {
    bits: Vec<bool>,
}

impl BitStream {
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bits: Vec::with_capacity(bits),
        }
    }

    /// 以高位在前的顺序追加一个字节。
    pub fn push_byte(&mut self, byte: u8) {
        self.bits
            .extend((0..BITS_PER_BYTE).rev().map(|shift| (byte >> shift) & 1 == 1));
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }
}

/// 以 `0`/`1` 输出位流，每 8 位之间用空格分隔。
impl fmt::Display for BitStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, bit) in self.iter().enumerate() {
            if index > 0 && index % BITS_PER_BYTE == 0 {
                f.write_str(" ")?;
            }
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// 分帧策略：如何把负载包装成位流，以及如何从位通道中把它取回。
///
/// 容量检查、网格复制与逐位写入由 [`embed`](super::embed) 统一完成，
/// 各策略只负责位流的格式。
pub trait Framing {
    /// 解码得到的负载类型。
    type Output;

    /// 分帧引入的额外位数。
    const OVERHEAD_BITS: usize;

    /// 单个负载允许的最大字节数。
    const PAYLOAD_LIMIT: usize = usize::MAX;

    /// 将负载包装成完整的位流。
    fn frame(&self, payload: &[u8]) -> Result<BitStream>;

    /// 从位通道起点读取并解析负载。
    fn unframe<P: BluePixel>(&self, reader: &mut BitReader<'_, P>) -> Result<Self::Output>;

    /// 容量为 `capacity` 位的网格最多能承载的负载字节数。
    fn max_payload_len(&self, capacity: usize) -> usize {
        (capacity.saturating_sub(Self::OVERHEAD_BITS) / BITS_PER_BYTE).min(Self::PAYLOAD_LIMIT)
    }
}

/// 终止符分帧：`字节 × n` 之后跟随 `11111111`。
///
/// 解码时每凑满 8 位就与终止符比较一次。负载本身若在字节边界上包含 `0xFF`
/// 会被误认为终止符而提前截断；UTF-8 文本不会出现该字节，任意二进制数据请使用
/// [`LengthPrefixed`]。
#[derive(Debug, Clone, Copy, Default)]
pub struct Terminated;

impl Framing for Terminated {
    type Output = String;

    const OVERHEAD_BITS: usize = TERMINATOR_BITS;

    fn frame(&self, payload: &[u8]) -> Result<BitStream> {
        let mut stream = BitStream::with_capacity(payload.len() * BITS_PER_BYTE + TERMINATOR_BITS);
        payload.iter().for_each(|&byte| stream.push_byte(byte));
        stream.push_byte(TERMINATOR);
        Ok(stream)
    }

    fn unframe<P: BluePixel>(&self, reader: &mut BitReader<'_, P>) -> Result<String> {
        let mut bytes = Vec::new();
        loop {
            let Some(byte) = reader.read_byte() else {
                return Err(StegoError::TerminatorNotFound {
                    scanned: reader.position(),
                });
            };
            if byte == TERMINATOR {
                break;
            }
            bytes.push(byte);
        }
        debug!(bytes = bytes.len(), bits = reader.position(), "terminator found");

        String::from_utf8(bytes).map_err(|err| StegoError::DecodeFormat(err.utf8_error()))
    }
}

/// 长度前缀分帧：8 位长度字段，随后是对应数量的字节。
#[derive(Debug, Clone, Copy, Default)]
pub struct LengthPrefixed;

impl Framing for LengthPrefixed {
    type Output = Vec<u8>;

    const OVERHEAD_BITS: usize = LENGTH_FIELD_BITS;

    const PAYLOAD_LIMIT: usize = MAX_PAYLOAD_LEN;

    fn frame(&self, payload: &[u8]) -> Result<BitStream> {
        let len = u8::try_from(payload.len()).map_err(|_| StegoError::PayloadTooLarge {
            len: payload.len(),
            max: MAX_PAYLOAD_LEN,
        })?;

        let mut stream = BitStream::with_capacity(LENGTH_FIELD_BITS + payload.len() * BITS_PER_BYTE);
        stream.push_byte(len);
        payload.iter().for_each(|&byte| stream.push_byte(byte));
        Ok(stream)
    }

    fn unframe<P: BluePixel>(&self, reader: &mut BitReader<'_, P>) -> Result<Vec<u8>> {
        let Some(length) = reader.read_byte() else {
            return Err(StegoError::InvalidLength { length: 0, max: 0 });
        };
        let length = usize::from(length);
        let max = (reader.remaining() / BITS_PER_BYTE).min(MAX_PAYLOAD_LEN);
        if length == 0 || length > max {
            return Err(StegoError::InvalidLength { length, max });
        }

        let bytes = (0..length)
            .map(|_| reader.read_byte())
            .collect::<Option<Vec<u8>>>()
            .ok_or(StegoError::InvalidLength { length, max })?;
        debug!(length, "length-prefixed payload read");

        std::str::from_utf8(&bytes)?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steganography::channel::{Grid, write_bit};
    use image::{ImageBuffer, Rgb};

    fn grid_with(stream: &BitStream, width: u32, height: u32) -> Grid<Rgb<u8>> {
        let mut grid = ImageBuffer::from_pixel(width, height, Rgb([10, 20, 30]));
        stream
            .iter()
            .enumerate()
            .for_each(|(index, bit)| write_bit(&mut grid, index, bit));
        grid
    }

    #[test]
    fn terminated_frame_appends_sentinel() {
        let stream = Terminated.frame(b"hi").unwrap();
        assert_eq!(stream.to_string(), "01101000 01101001 11111111");
    }

    #[test]
    fn length_prefixed_frame_starts_with_length() {
        let stream = LengthPrefixed.frame(b"AB").unwrap();
        assert_eq!(stream.to_string(), "00000010 01000001 01000010");
    }

    #[test]
    fn length_prefixed_rejects_oversized_payload() {
        let payload = vec![b'x'; MAX_PAYLOAD_LEN + 1];
        assert_eq!(
            LengthPrefixed.frame(&payload),
            Err(StegoError::PayloadTooLarge {
                len: 256,
                max: 255
            })
        );
        assert_eq!(LengthPrefixed.frame(&payload[1..]).unwrap().len(), 8 + 255 * 8);
    }

    #[test]
    fn terminated_unframe_stops_at_first_sentinel() {
        let mut stream = Terminated.frame("héllo".as_bytes()).unwrap();
        stream.push_byte(b'!');
        let grid = grid_with(&stream, 10, 10);

        let mut reader = BitReader::new(&grid);
        assert_eq!(Terminated.unframe(&mut reader).unwrap(), "héllo");
        assert_eq!(reader.position(), 7 * 8);
    }

    #[test]
    fn terminated_unframe_truncates_on_embedded_ff() {
        let stream = Terminated.frame(&[b'a', 0xFF, b'b']).unwrap();
        let grid = grid_with(&stream, 8, 4);
        assert_eq!(Terminated.unframe(&mut BitReader::new(&grid)).unwrap(), "a");
    }

    #[test]
    fn terminated_unframe_without_sentinel_fails() {
        let mut stream = BitStream::default();
        (0..4).for_each(|_| stream.push_byte(b'z'));
        let grid = grid_with(&stream, 7, 5);

        assert_eq!(
            Terminated.unframe(&mut BitReader::new(&grid)),
            Err(StegoError::TerminatorNotFound { scanned: 32 })
        );
    }

    #[test]
    fn terminated_unframe_rejects_invalid_utf8() {
        let stream = Terminated.frame(&[0xC3, 0x28]).unwrap();
        let grid = grid_with(&stream, 6, 4);
        assert!(matches!(
            Terminated.unframe(&mut BitReader::new(&grid)),
            Err(StegoError::DecodeFormat(_))
        ));
    }

    #[test]
    fn length_prefixed_unframe_validates_length() {
        let mut zero = BitStream::default();
        zero.push_byte(0);
        let grid = grid_with(&zero, 8, 8);
        assert_eq!(
            LengthPrefixed.unframe(&mut BitReader::new(&grid)),
            Err(StegoError::InvalidLength { length: 0, max: 7 })
        );

        let mut too_long = BitStream::default();
        too_long.push_byte(9);
        let grid = grid_with(&too_long, 8, 8);
        assert_eq!(
            LengthPrefixed.unframe(&mut BitReader::new(&grid)),
            Err(StegoError::InvalidLength { length: 9, max: 7 })
        );

        let tiny: Grid<Rgb<u8>> = ImageBuffer::new(2, 3);
        assert_eq!(
            LengthPrefixed.unframe(&mut BitReader::new(&tiny)),
            Err(StegoError::InvalidLength { length: 0, max: 0 })
        );
    }

    #[test]
    fn length_prefixed_unframe_rejects_invalid_utf8() {
        let stream = LengthPrefixed.frame(&[0xFF, 0xFE]).unwrap();
        let grid = grid_with(&stream, 6, 4);
        assert!(matches!(
            LengthPrefixed.unframe(&mut BitReader::new(&grid)),
            Err(StegoError::DecodeFormat(_))
        ));
    }

    #[test]
    fn max_payload_len_accounts_for_overhead() {
        assert_eq!(Terminated.max_payload_len(100), 11);
        assert_eq!(Terminated.max_payload_len(7), 0);
        assert_eq!(LengthPrefixed.max_payload_len(100), 11);
        assert_eq!(LengthPrefixed.max_payload_len(1_000_000), 255);
    }
}

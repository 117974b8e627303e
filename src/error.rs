//! # 错误类型模块
//!
//! 隐写编解码器返回的所有错误。每种错误都可以由调用方恢复，编解码器内部从不重试。

use thiserror::Error;

/// 隐写编解码过程中可能出现的错误。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StegoError {
    /// 分帧后的位流超过了图像容量。在修改任何像素之前检测。
    #[error("payload needs {required} bits but the image only holds {available}")]
    Capacity { required: usize, available: usize },

    /// 负载超出了 8 位长度字段能表示的范围。
    #[error("payload of {len} bytes exceeds the {max}-byte limit of the length field")]
    PayloadTooLarge { len: usize, max: usize },

    /// 扫描完整个图像容量仍未找到终止符。
    #[error("no message terminator found after scanning {scanned} bits")]
    TerminatorNotFound { scanned: usize },

    /// 长度前缀为 0，或超出了图像实际能容纳的字节数。
    #[error("hidden length {length} is outside the accepted range 1..={max}")]
    InvalidLength { length: usize, max: usize },

    /// 恢复出的字节不是合法的 UTF-8 文本。
    #[error("recovered bytes are not valid UTF-8: {0}")]
    DecodeFormat(#[from] std::str::Utf8Error),
}

impl StegoError {
    /// 面向用户的诊断说明，用于区分“没有隐藏消息”“有损格式”和“编码后被破坏”。
    pub fn diagnosis(&self) -> &'static str {
        match self {
            StegoError::Capacity { .. } => {
                "The image is too small for this payload. Use a larger image or a shorter message."
            }
            StegoError::PayloadTooLarge { .. } => {
                "Length-prefixed payloads are limited to 255 bytes. Use the terminated framing for longer text."
            }
            StegoError::TerminatorNotFound { .. } => {
                "The image does not appear to contain a hidden message, or it was re-compressed after hiding."
            }
            StegoError::InvalidLength { .. } => {
                "The image was not produced by this encoder, or it was modified after the payload was hidden."
            }
            StegoError::DecodeFormat(_) => {
                "The hidden bits are damaged. The image was probably saved in a lossy format such as JPEG."
            }
        }
    }
}

/// 编解码器使用的结果别名。
pub type Result<T> = std::result::Result<T, StegoError>;

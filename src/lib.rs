//! # blue_lsb 库
//!
//! 本库包含蓝色通道 LSB 隐写工具的核心逻辑：位通道、两种分帧策略，
//! 以及命令行前端所需的图像读写与命令处理。

// 声明库包含的所有模块。

pub mod cli;
pub mod constants;
pub mod error;
pub mod handler;
pub mod image_io;
pub mod steganography;

pub use error::{Result, StegoError};
pub use steganography::channel::{BluePixel, Grid};
pub use steganography::framing::{BitStream, Framing, LengthPrefixed, Terminated};
pub use steganography::{decode_bytes, decode_text, embed, encode_bytes, encode_text, extract};

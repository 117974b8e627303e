//! # 隐写编解码模块
//!
//! 在像素网格蓝色通道的最低有效位中隐藏或恢复负载。每个像素承载 1 位，
//! 网格容量为 `width × height` 位。
//!
//! 编码从不修改调用方传入的网格，而是返回一份新的网格；只有被位流覆盖到的像素
//! 的蓝色最低位可能改变，其余通道与之后的像素保持原样。
//!
//! 结果必须以无损格式 (如 PNG, BMP) 保存，任何有损的重新编码都会破坏隐藏的数据。

pub mod channel;
pub mod framing;

use tracing::debug;

use crate::error::{Result, StegoError};
use channel::{BitReader, BluePixel, Grid};
use framing::{Framing, LengthPrefixed, Terminated};

/// 使用给定的分帧策略将 `payload` 嵌入 `grid` 的副本中。
///
/// 容量在复制或修改任何像素之前检查，位流写完后立即停止。
///
/// # Errors
///
/// * 分帧失败时返回分帧策略给出的错误 (如 `PayloadTooLarge`)。
/// * 位流长度超过网格容量时返回 `StegoError::Capacity`。
pub fn embed<F, P>(grid: &Grid<P>, framing: &F, payload: &[u8]) -> Result<Grid<P>>
where
    F: Framing,
    P: BluePixel,
{
    let stream = framing.frame(payload)?;
    let available = channel::capacity(grid);
    if stream.len() > available {
        return Err(StegoError::Capacity {
            required: stream.len(),
            available,
        });
    }

    let mut doctored = grid.clone();
    stream
        .iter()
        .enumerate()
        .for_each(|(index, bit)| channel::write_bit(&mut doctored, index, bit));

    debug!(bits = stream.len(), available, "payload embedded");
    Ok(doctored)
}

/// 使用给定的分帧策略从 `grid` 中恢复负载。
pub fn extract<F, P>(grid: &Grid<P>, framing: &F) -> Result<F::Output>
where
    F: Framing,
    P: BluePixel,
{
    framing.unframe(&mut BitReader::new(grid))
}

/// 以终止符分帧隐藏一段文本。
pub fn encode_text<P: BluePixel>(grid: &Grid<P>, message: &str) -> Result<Grid<P>> {
    embed(grid, &Terminated, message.as_bytes())
}

/// 恢复以终止符分帧隐藏的文本。
pub fn decode_text<P: BluePixel>(grid: &Grid<P>) -> Result<String> {
    extract(grid, &Terminated)
}

/// 以长度前缀分帧隐藏最多 255 字节的负载。
pub fn encode_bytes<P: BluePixel>(grid: &Grid<P>, payload: &[u8]) -> Result<Grid<P>> {
    embed(grid, &LengthPrefixed, payload)
}

/// 恢复以长度前缀分帧隐藏的负载。负载必须是合法的 UTF-8 文本。
pub fn decode_bytes<P: BluePixel>(grid: &Grid<P>) -> Result<Vec<u8>> {
    extract(grid, &LengthPrefixed)
}

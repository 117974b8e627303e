//! # 位通道模块
//!
//! 将线性位索引映射到像素坐标，并读写该像素蓝色通道的最低有效位。
//! 遍历顺序为行优先：每行从左到右，行从上到下，起点为 (0, 0)。
//!
//! 本模块不做边界检查之外的任何假设，也不知道负载长度；
//! 越界检查由上层的分帧逻辑在调用前完成。

use image::{ImageBuffer, Pixel, Rgb, Rgba};

use crate::constants::BITS_PER_BYTE;

/// 蓝色通道在 RGB / RGBA 像素中的下标。
const BLUE: usize = 2;

/// 隐写所用的像素网格。
pub type Grid<P> = ImageBuffer<P, Vec<u8>>;

/// 可以承载隐写位的像素：拥有 8 位蓝色通道的 RGB 或 RGBA 像素。
pub trait BluePixel: Pixel<Subpixel = u8> {
    fn blue(&self) -> u8 {
        self.channels()[BLUE]
    }

    fn blue_mut(&mut self) -> &mut u8 {
        &mut self.channels_mut()[BLUE]
    }
}

impl BluePixel for Rgb<u8> {}
impl BluePixel for Rgba<u8> {}

/// 网格可承载的总位数，即 `width × height`。
pub fn capacity<P: BluePixel>(grid: &Grid<P>) -> usize {
    grid.width() as usize * grid.height() as usize
}

/// 将位索引映射为 `(x, y)` 坐标。`width` 必须大于 0。
pub fn coordinate(width: u32, index: usize) -> (u32, u32) {
    let width = width as usize;
    ((index % width) as u32, (index / width) as u32)
}

/// 将 `bit` 写入第 `index` 个像素蓝色通道的最低位，其余通道保持不变。
///
/// # Panics
///
/// 当 `index >= capacity(grid)` 时 panic。
pub fn write_bit<P: BluePixel>(grid: &mut Grid<P>, index: usize, bit: bool) {
    let (x, y) = coordinate(grid.width(), index);
    let blue = grid.get_pixel_mut(x, y).blue_mut();
    *blue = (*blue & 0xFE) | u8::from(bit);
}

/// 读取第 `index` 个像素蓝色通道的最低位。
///
/// # Panics
///
/// 当 `index >= capacity(grid)` 时 panic。
pub fn read_bit<P: BluePixel>(grid: &Grid<P>, index: usize) -> bool {
    let (x, y) = coordinate(grid.width(), index);
    grid.get_pixel(x, y).blue() & 1 == 1
}

/// 按遍历顺序逐位读取网格的游标。
///
/// 读取永远不会越过网格容量：数据耗尽时返回 `None`。
pub struct BitReader<'a, P: BluePixel> {
    grid: &'a Grid<P>,
    cursor: usize,
    capacity: usize,
}

impl<'a, P: BluePixel> BitReader<'a, P> {
    pub fn new(grid: &'a Grid<P>) -> Self {
        Self {
            grid,
            cursor: 0,
            capacity: capacity(grid),
        }
    }

    /// 已经读取的位数。
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// 尚未读取的位数。
    pub fn remaining(&self) -> usize {
        self.capacity - self.cursor
    }

    pub fn read_bit(&mut self) -> Option<bool> {
        if self.cursor >= self.capacity {
            return None;
        }
        let bit = read_bit(self.grid, self.cursor);
        self.cursor += 1;
        Some(bit)
    }

    /// 读取 8 位并按高位在前组装成一个字节。
    /// 剩余不足 8 位时返回 `None` 且不移动游标。
    pub fn read_byte(&mut self) -> Option<u8> {
        if self.remaining() < BITS_PER_BYTE {
            return None;
        }
        let mut byte = 0u8;
        for _ in 0..BITS_PER_BYTE {
            let bit = self.read_bit()?;
            byte = (byte << 1) | u8::from(bit);
        }
        Some(byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> Grid<Rgba<u8>> {
        ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([x as u8, y as u8, (x * 7 + y * 13) as u8, 200])
        })
    }

    #[test]
    fn coordinate_is_row_major() {
        assert_eq!(coordinate(4, 0), (0, 0));
        assert_eq!(coordinate(4, 3), (3, 0));
        assert_eq!(coordinate(4, 4), (0, 1));
        assert_eq!(coordinate(4, 11), (3, 2));
    }

    #[test]
    fn capacity_is_one_bit_per_pixel() {
        assert_eq!(capacity(&gradient(10, 10)), 100);
        assert_eq!(capacity(&gradient(7, 3)), 21);
    }

    #[test]
    fn write_bit_touches_only_blue_lsb() {
        let original = gradient(5, 5);
        let mut grid = original.clone();

        write_bit(&mut grid, 7, true);
        write_bit(&mut grid, 8, false);

        for (index, (before, after)) in original.pixels().zip(grid.pixels()).enumerate() {
            assert_eq!(before[0], after[0]);
            assert_eq!(before[1], after[1]);
            assert_eq!(before[3], after[3]);
            assert_eq!(before[2] & 0xFE, after[2] & 0xFE);
            match index {
                7 => assert_eq!(after[2] & 1, 1),
                8 => assert_eq!(after[2] & 1, 0),
                _ => assert_eq!(before[2], after[2]),
            }
        }
    }

    #[test]
    fn read_bit_follows_write_bit() {
        let mut grid: Grid<Rgb<u8>> = ImageBuffer::from_pixel(3, 2, Rgb([9, 9, 0xFF]));
        write_bit(&mut grid, 4, false);
        assert!(read_bit(&grid, 3));
        assert!(!read_bit(&grid, 4));
        assert_eq!(grid.get_pixel(1, 1)[2], 0xFE);
    }

    #[test]
    fn reader_assembles_bytes_msb_first_and_stops_at_capacity() {
        let mut grid: Grid<Rgb<u8>> = ImageBuffer::new(5, 2);
        for (index, bit) in [0, 1, 0, 0, 0, 0, 0, 1].into_iter().enumerate() {
            write_bit(&mut grid, index, bit == 1);
        }

        let mut reader = BitReader::new(&grid);
        assert_eq!(reader.read_byte(), Some(b'A'));
        assert_eq!(reader.remaining(), 2);
        assert_eq!(reader.read_byte(), None);
        assert_eq!(reader.position(), 8);
        assert_eq!(reader.read_bit(), Some(false));
        assert_eq!(reader.read_bit(), Some(false));
        assert_eq!(reader.read_bit(), None);
    }
}

/// 每个字节占用的隐写位数。每个像素只承载 1 位，因此一个字节需要 8 个像素。
pub const BITS_PER_BYTE: usize = 8;

/// 终止符分帧的结束标记 `11111111`。
/// 合法的 UTF-8 文本中不会出现 `0xFF` 字节，因此文本消息不会被提前截断。
pub const TERMINATOR: u8 = 0b1111_1111;

/// 终止符占用的位数。
pub const TERMINATOR_BITS: usize = BITS_PER_BYTE;

/// 长度前缀占用的位数。长度字段是一个无符号 8 位整数。
pub const LENGTH_FIELD_BITS: usize = BITS_PER_BYTE;

/// 长度前缀分帧所能承载的最大负载字节数，与长度字段的宽度一致。
pub const MAX_PAYLOAD_LEN: usize = u8::MAX as usize;

/// 未指定输出路径时，隐写结果图像文件名的前缀。
pub const HIDDEN_PREFIX: &str = "doctored_";

/// 未指定输出路径时，恢复文本文件名的前缀。
pub const RECOVERED_PREFIX: &str = "recovered_";

/// 隐写结果图像的默认扩展名。PNG 是无损格式，能够完整保留最低有效位。
pub const DEFAULT_IMAGE_EXTENSION: &str = "png";

/// 恢复文本的默认扩展名。
pub const DEFAULT_TEXT_EXTENSION: &str = "txt";
